//! SQL schema for the petvitals SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Message raised by the write-once triggers.
pub const IMMUTABLE: &str = "health records are immutable";

/// Message raised when an envelope names a missing detail record.
pub const DANGLING: &str = "referenced species health record does not exist";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pets (
    pet_id        TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    species       TEXT NOT NULL CHECK (species IN ('cat', 'dog')),
    breed         TEXT,
    date_of_birth TEXT NOT NULL,   -- YYYY-MM-DD
    created_at    TEXT NOT NULL
);

-- Species detail records. One table per discriminator value.
CREATE TABLE IF NOT EXISTS cat_health_records (
    record_id     TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    metrics_json  TEXT NOT NULL,   -- CatMetrics
    clinical_json TEXT NOT NULL    -- ClinicalSnapshot
);

CREATE TABLE IF NOT EXISTS dog_health_records (
    record_id     TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    metrics_json  TEXT NOT NULL,   -- DogMetrics
    clinical_json TEXT NOT NULL
);

-- Envelopes. The (id, model) pair is a polymorphic reference into one of
-- the detail tables above.
CREATE TABLE IF NOT EXISTS common_health_records (
    record_id                   TEXT PRIMARY KEY,
    pet_id                      TEXT NOT NULL REFERENCES pets(pet_id),
    created_by                  TEXT NOT NULL,
    created_by_type             TEXT NOT NULL,
    species_type                TEXT NOT NULL,
    species_health_record_id    TEXT NOT NULL UNIQUE,
    species_health_record_model TEXT NOT NULL,
    visit_date                  TEXT NOT NULL,
    created_at                  TEXT NOT NULL,
    CHECK (
        (species_type = 'cat' AND species_health_record_model = 'CatHealthRecord')
     OR (species_type = 'dog' AND species_health_record_model = 'DogHealthRecord')
    )
);

CREATE INDEX IF NOT EXISTS common_pet_visit_idx
    ON common_health_records(pet_id, visit_date);

-- Detail before envelope.
CREATE TRIGGER IF NOT EXISTS common_requires_detail
BEFORE INSERT ON common_health_records
WHEN NOT EXISTS (
    SELECT 1 FROM cat_health_records
     WHERE NEW.species_health_record_model = 'CatHealthRecord'
       AND record_id = NEW.species_health_record_id
    UNION ALL
    SELECT 1 FROM dog_health_records
     WHERE NEW.species_health_record_model = 'DogHealthRecord'
       AND record_id = NEW.species_health_record_id
)
BEGIN
    SELECT RAISE(ABORT, 'referenced species health record does not exist');
END;

-- Write-once.
CREATE TRIGGER IF NOT EXISTS common_no_update
BEFORE UPDATE ON common_health_records
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS common_no_delete
BEFORE DELETE ON common_health_records
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS cat_no_update
BEFORE UPDATE ON cat_health_records
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS dog_no_update
BEFORE UPDATE ON dog_health_records
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

-- Only unreferenced (orphaned) detail records may be deleted.
CREATE TRIGGER IF NOT EXISTS cat_delete_only_orphans
BEFORE DELETE ON cat_health_records
WHEN EXISTS (
    SELECT 1 FROM common_health_records
     WHERE species_health_record_model = 'CatHealthRecord'
       AND species_health_record_id = OLD.record_id
)
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS dog_delete_only_orphans
BEFORE DELETE ON dog_health_records
WHEN EXISTS (
    SELECT 1 FROM common_health_records
     WHERE species_health_record_model = 'DogHealthRecord'
       AND species_health_record_id = OLD.record_id
)
BEGIN
    SELECT RAISE(ABORT, 'health records are immutable');
END;

PRAGMA user_version = 1;
";
