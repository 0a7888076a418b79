//! Schema descriptors.
//!
//! A [`Schema`] wraps a parsed Avro record schema together with the
//! information the encoder needs without walking the Avro tree on every call:
//! the record's full name, its 64-bit Rabin fingerprint, and an ordered list of
//! [`FieldDefinition`]s.

use apache_avro::rabin::Rabin;
use apache_avro::Schema as AvroSchema;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema loading.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema artifact does not exist
    #[error("Schema '{identifier}' not found at {path:?}")]
    NotFound { identifier: String, path: PathBuf },

    /// Error reading the schema artifact
    #[error("Failed to read schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not valid Avro schema JSON
    #[error("Failed to parse Avro schema: {0}")]
    Parse(#[from] apache_avro::Error),

    /// Top-level schema is not a record
    #[error("Schema '{0}' is not a record schema")]
    NotARecord(String),

    /// Field uses a type the encoder cannot produce
    #[error("Field '{field}' has unsupported type: {kind}")]
    UnsupportedFieldType { field: String, kind: String },
}

// ============================================================================
// Field Definitions
// ============================================================================

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    /// `long` with logical type `timestamp-millis`
    TimestampMillis,
    /// `string` with logical type `uuid`
    Uuid,
}

impl FieldType {
    fn from_avro(schema: &AvroSchema) -> Option<Self> {
        match schema {
            AvroSchema::Boolean => Some(FieldType::Boolean),
            AvroSchema::Int => Some(FieldType::Int),
            AvroSchema::Long => Some(FieldType::Long),
            AvroSchema::Float => Some(FieldType::Float),
            AvroSchema::Double => Some(FieldType::Double),
            AvroSchema::String => Some(FieldType::String),
            AvroSchema::Bytes => Some(FieldType::Bytes),
            AvroSchema::TimestampMillis => Some(FieldType::TimestampMillis),
            AvroSchema::Uuid => Some(FieldType::Uuid),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Boolean => "boolean",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::TimestampMillis => "timestamp-millis",
            FieldType::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A single field of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,

    /// Declared type (the non-null branch for optional fields)
    pub field_type: FieldType,

    /// Required fields must be present and non-null
    pub required: bool,
}

// ============================================================================
// Schema
// ============================================================================

/// Reference to a bound schema, carried by every produced message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    pub name: String,
    pub fingerprint: u64,
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:016x}", self.name, self.fingerprint)
    }
}

/// An immutable, loaded record schema.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fingerprint: u64,
    fields: Vec<FieldDefinition>,
    avro: AvroSchema,
}

impl Schema {
    /// Parse an Avro schema from its JSON text.
    pub fn parse_str(source: &str) -> Result<Self, SchemaError> {
        let avro = AvroSchema::parse_str(source)?;
        Self::from_avro(avro)
    }

    /// Build a descriptor from an already parsed Avro schema.
    ///
    /// Only records are accepted. Each field must be one of the supported
    /// primitive/logical types, or a two-branch union of `null` and one of
    /// those types (which makes the field optional).
    pub fn from_avro(avro: AvroSchema) -> Result<Self, SchemaError> {
        let record = match &avro {
            AvroSchema::Record(record) => record,
            other => return Err(SchemaError::NotARecord(format!("{other:?}"))),
        };

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let (field_type, required) = match &field.schema {
                AvroSchema::Union(union) => {
                    let non_null: Vec<&AvroSchema> = union
                        .variants()
                        .iter()
                        .filter(|v| !matches!(v, AvroSchema::Null))
                        .collect();
                    match (union.is_nullable(), non_null.as_slice()) {
                        (true, [inner]) => (FieldType::from_avro(inner), false),
                        _ => (None, false),
                    }
                }
                other => (FieldType::from_avro(other), true),
            };

            let field_type = field_type.ok_or_else(|| SchemaError::UnsupportedFieldType {
                field: field.name.clone(),
                kind: format!("{:?}", field.schema),
            })?;

            fields.push(FieldDefinition {
                name: field.name.clone(),
                field_type,
                required,
            });
        }

        let fingerprint = fingerprint_of(&avro);
        Ok(Self {
            name: record.name.fullname(None),
            fingerprint,
            fields,
            avro,
        })
    }

    /// Fully qualified record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CRC-64-AVRO fingerprint of the parsing canonical form.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn avro(&self) -> &AvroSchema {
        &self.avro
    }

    pub fn canonical_form(&self) -> String {
        self.avro.canonical_form()
    }

    pub fn reference(&self) -> SchemaRef {
        SchemaRef {
            name: self.name.clone(),
            fingerprint: self.fingerprint,
        }
    }
}

fn fingerprint_of(avro: &AvroSchema) -> u64 {
    // Rabin digests are 8 bytes, little-endian
    avro.fingerprint::<Rabin>()
        .bytes
        .iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}
