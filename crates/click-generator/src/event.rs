//! The click event and its key/value record mapping.

use click_schema::{FieldValue, Record};

/// Error rebuilding a [`ClickEvent`] from decoded records.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EventError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' has type {actual}, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Key id '{key}' does not match value id '{value}'")]
    KeyMismatch { key: String, value: String },
}

/// A single synthetic ad click.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub id: String,
    pub impression_id: String,
    pub creative_id: String,
    pub placement_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub user_agent: String,
    pub ip: String,
    pub referrer: String,
    pub cost: f64,
}

impl ClickEvent {
    /// The message key: only the click id.
    pub fn key_record(&self) -> Record {
        Record::new().with("id", self.id.as_str())
    }

    pub fn value_record(&self) -> Record {
        Record::new()
            .with("id", self.id.as_str())
            .with("impression_id", self.impression_id.as_str())
            .with("creative_id", self.creative_id.as_str())
            .with("placement_id", self.placement_id.as_str())
            .with("timestamp", self.timestamp)
            .with("user_agent", self.user_agent.as_str())
            .with("ip", self.ip.as_str())
            .with("referrer", self.referrer.as_str())
            .with("cost", self.cost)
    }

    /// Rebuild an event from its key and value records.
    pub fn from_records(key: &Record, value: &Record) -> Result<Self, EventError> {
        let key_id = string_field(key, "id")?;
        let event = Self {
            id: string_field(value, "id")?,
            impression_id: string_field(value, "impression_id")?,
            creative_id: string_field(value, "creative_id")?,
            placement_id: string_field(value, "placement_id")?,
            timestamp: long_field(value, "timestamp")?,
            user_agent: string_field(value, "user_agent")?,
            ip: string_field(value, "ip")?,
            referrer: string_field(value, "referrer")?,
            cost: double_field(value, "cost")?,
        };

        if key_id != event.id {
            return Err(EventError::KeyMismatch {
                key: key_id,
                value: event.id,
            });
        }
        Ok(event)
    }
}

fn field<'a>(record: &'a Record, name: &'static str) -> Result<&'a FieldValue, EventError> {
    match record.get(name) {
        None | Some(FieldValue::Null) => Err(EventError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn string_field(record: &Record, name: &'static str) -> Result<String, EventError> {
    let value = field(record, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or(EventError::WrongType {
            field: name,
            expected: "string",
            actual: value.type_name(),
        })
}

fn long_field(record: &Record, name: &'static str) -> Result<i64, EventError> {
    let value = field(record, name)?;
    value.as_i64().ok_or(EventError::WrongType {
        field: name,
        expected: "long",
        actual: value.type_name(),
    })
}

fn double_field(record: &Record, name: &'static str) -> Result<f64, EventError> {
    let value = field(record, name)?;
    value.as_f64().ok_or(EventError::WrongType {
        field: name,
        expected: "double",
        actual: value.type_name(),
    })
}
