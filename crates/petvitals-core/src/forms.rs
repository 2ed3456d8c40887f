//! Form definitions served to clients that render the observation form.
//!
//! Numeric limits come from [`crate::validate`], so a form filled within its
//! own bounds always passes validation.

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  observation::{
    Aggression, Appetite, CoatCondition, EnergyLevel, HydrationStatus,
    MucousMembraneColor,
  },
  pet::Species,
  validate::{
    AGE_MONTHS, DIASTOLIC_MMHG, HEART_RATE_BPM, RESPIRATORY_RATE, SYSTOLIC_MMHG,
    TEMPERATURE_C, WEIGHT_KG,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
  Number,
  Select,
  Checkbox,
  Textarea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormOption {
  pub value: String,
  pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
  pub name:        &'static str,
  pub label:       String,
  #[serde(rename = "type")]
  pub field_type:  FieldType,
  pub required:    bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min:         Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max:         Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub step:        Option<f64>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub options:     Vec<FormOption>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub help:        Option<&'static str>,
}

impl FormField {
  fn new(name: &'static str, label: impl Into<String>, field_type: FieldType) -> Self {
    Self {
      name,
      label: label.into(),
      field_type,
      required: matches!(field_type, FieldType::Number | FieldType::Select),
      min: None,
      max: None,
      step: None,
      options: Vec::new(),
      placeholder: None,
      help: None,
    }
  }

  fn number(name: &'static str, label: &str, (min, max): (f64, f64)) -> Self {
    Self { min: Some(min), max: Some(max), ..Self::new(name, label, FieldType::Number) }
  }

  fn step(self, step: f64) -> Self {
    Self { step: Some(step), ..self }
  }

  fn select(name: &'static str, label: &str, options: Vec<FormOption>) -> Self {
    Self { options, ..Self::new(name, label, FieldType::Select) }
  }

  fn checkbox(name: &'static str, label: &str) -> Self {
    Self::new(name, label, FieldType::Checkbox)
  }

  fn textarea(name: &'static str, label: &str) -> Self {
    Self::new(name, label, FieldType::Textarea)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSection {
  pub section: &'static str,
  pub fields:  Vec<FormField>,
}

/// Breed choices offered for `species`. Always ends with `Other`.
pub fn breed_options(species: Species) -> Vec<FormOption> {
  let breeds: &[&str] = match species {
    Species::Cat => &[
      "Maine Coon",
      "Persian",
      "Siamese",
      "Bengal",
      "Ragdoll",
      "Scottish Fold",
      "Sphynx",
      "Domestic Shorthair",
      "Other",
    ],
    Species::Dog => &[
      "Labrador Retriever",
      "Golden Retriever",
      "German Shepherd",
      "French Bulldog",
      "Bulldog",
      "Poodle",
      "Beagle",
      "Other",
    ],
  };
  breeds
    .iter()
    .map(|b| FormOption { value: (*b).to_owned(), label: (*b).to_owned() })
    .collect()
}

/// `mild_dehydration` -> `Mild Dehydration`.
fn title_case(snake: &str) -> String {
  snake
    .split('_')
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn enum_options<E: IntoEnumIterator + AsRef<str>>() -> Vec<FormOption> {
  E::iter()
    .map(|v| FormOption { value: v.as_ref().to_owned(), label: title_case(v.as_ref()) })
    .collect()
}

/// The sectioned form for `species`.
pub fn form_definitions(species: Species) -> Vec<FormSection> {
  let (bcs_min, bcs_max) = species.body_condition_range();

  let mut clinical = vec![
    FormField::number(
      "body_condition_score",
      &format!("Body Condition Score ({bcs_min}-{bcs_max})"),
      (f64::from(bcs_min), f64::from(bcs_max)),
    ),
    FormField::select("hydration_status", "Hydration Status", enum_options::<HydrationStatus>()),
    FormField::select(
      "mucous_membrane_color",
      "Mucous Membrane Color",
      enum_options::<MucousMembraneColor>(),
    ),
  ];
  if species == Species::Cat {
    clinical.push(FormField::select(
      "coat_condition",
      "Coat Condition",
      enum_options::<CoatCondition>(),
    ));
  }

  let (_, max_weight) = WEIGHT_KG;

  vec![
    FormSection {
      section: "Basic Information",
      fields:  vec![
        FormField::select("breed", "Breed", breed_options(species)),
        FormField::number("age_in_months", "Age (months)", AGE_MONTHS),
        FormField::number("weight_kg", "Weight (kg)", (0.1, max_weight)).step(0.1),
      ],
    },
    FormSection {
      section: "Vital Signs",
      fields:  vec![
        FormField::number("temperature", "Temperature (°C)", TEMPERATURE_C).step(0.1),
        FormField::number("heart_rate", "Heart Rate (bpm)", HEART_RATE_BPM),
        FormField::number(
          "respiratory_rate",
          "Respiratory Rate (breaths/min)",
          RESPIRATORY_RATE,
        ),
        FormField::number(
          "blood_pressure_systolic",
          "Blood Pressure Systolic (mmHg)",
          SYSTOLIC_MMHG,
        ),
        FormField::number(
          "blood_pressure_diastolic",
          "Blood Pressure Diastolic (mmHg)",
          DIASTOLIC_MMHG,
        ),
      ],
    },
    FormSection { section: "Clinical Assessment", fields: clinical },
    FormSection {
      section: "Behavioral & Symptoms",
      fields:  vec![
        FormField::select("appetite", "Appetite", enum_options::<Appetite>()),
        FormField::select("energy_level", "Energy Level", enum_options::<EnergyLevel>()),
        FormField::select("aggression", "Aggression Level", enum_options::<Aggression>()),
        FormField::checkbox("vomiting", "Vomiting"),
        FormField::checkbox("diarrhea", "Diarrhea"),
        FormField::checkbox("coughing", "Coughing"),
        FormField::checkbox("limping", "Limping"),
      ],
    },
    FormSection {
      section: "Medical History",
      fields:  vec![
        FormField {
          placeholder: Some("e.g., Fish Protein, Pollen"),
          ..FormField::textarea("allergies", "Allergies (comma-separated)")
        },
        FormField {
          placeholder: Some("e.g., Diabetes, Kidney Disease"),
          ..FormField::textarea("chronic_conditions", "Chronic Conditions (comma-separated)")
        },
        FormField {
          placeholder: Some("e.g., Amoxicillin - 250mg - twice daily"),
          ..FormField::textarea("prescriptions", "Current Prescriptions (comma-separated)")
        },
        FormField {
          help: Some(r#"JSON format: [{"vaccine_name": "Rabies", "status": "up_to_date"}]"#),
          ..FormField::textarea("vaccinations", "Vaccination Status")
        },
      ],
    },
  ]
}
