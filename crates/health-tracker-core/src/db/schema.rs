//! SQLite schema definition.

/// Complete database schema for the health tracker.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Medication Stock
-- ============================================================================

CREATE TABLE IF NOT EXISTS medication_stock (
    stock_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    refill_date TEXT NOT NULL,                   -- YYYY-MM-DD
    total_units INTEGER NOT NULL CHECK (total_units >= 0),
    dose_per_day TEXT NOT NULL CHECK (CAST(dose_per_day AS REAL) > 0), -- exact decimal string
    note TEXT,
    version INTEGER NOT NULL DEFAULT 1,          -- bumped on every dose update
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_stock_name ON medication_stock(name);

-- ============================================================================
-- Health Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_records (
    record_id TEXT PRIMARY KEY,
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    time_period TEXT NOT NULL CHECK (time_period IN ('morning', 'noon', 'evening')),
    took_medication INTEGER NOT NULL,
    medication TEXT,
    meal_timing TEXT NOT NULL CHECK (meal_timing IN ('before_meal', 'after_meal')),
    dose TEXT,
    systolic INTEGER NOT NULL,
    diastolic INTEGER NOT NULL,
    pulse INTEGER NOT NULL,
    bp_status TEXT NOT NULL,
    bp_note TEXT,
    glucose_mmol TEXT NOT NULL,                  -- exact decimal string
    glucose_status TEXT NOT NULL,
    glucose_note TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_date ON health_records(date);
"#;
