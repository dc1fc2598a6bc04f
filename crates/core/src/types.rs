/// Backend primary keys are opaque strings (UUIDs rendered as text).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (cycle and objective windows) carry no time zone.
pub type Date = chrono::NaiveDate;
