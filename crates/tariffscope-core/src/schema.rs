/// Arrow schema definitions for tariff-schedule data.
pub mod schedule {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Column holding the schedule code (dotted or canonical).
    pub const CODE: &str = "code";
    /// Column holding the official legal description of the entry.
    pub const DESCRIPTION: &str = "description";
    /// Column holding the base (general) duty-rate text.
    pub const DUTY_RATE: &str = "duty_rate";

    /// Schema for one row per schedule entry.
    pub fn schedule_schema() -> Schema {
        Schema::new(vec![
            Field::new(CODE, DataType::Utf8, false),
            Field::new(DESCRIPTION, DataType::Utf8, false),
            Field::new(DUTY_RATE, DataType::Utf8, true),
        ])
    }

    /// Schema for the assumption audit trail written by persistence layers.
    pub fn assumption_log_schema() -> Schema {
        Schema::new(vec![
            Field::new("branch_prefix", DataType::Utf8, false),
            Field::new("likely_code", DataType::Utf8, true),
            Field::new("variable_id", DataType::Utf8, false),
            Field::new("variable_name", DataType::Utf8, false),
            Field::new("assumed_value", DataType::Utf8, false),
            Field::new("rationale", DataType::Utf8, false),
        ])
    }
}
