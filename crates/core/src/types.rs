/// Regulation schema keys are PostgreSQL SERIAL / INTEGER columns.
pub type DbId = i32;

/// Load timestamps are UTC wall-clock values stored in `TIMESTAMP` columns.
pub type Timestamp = chrono::NaiveDateTime;
