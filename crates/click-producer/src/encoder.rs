//! Avro encoder for records to wire format.
//!
//! Records are checked against the bound [`Schema`] first, so conformance
//! failures name the offending field. The record is then written by
//! apache-avro's single-object writer, which frames the datum like this:
//!
//! ```text
//! +------+------+------------------------+----------------------+
//! | 0xC3 | 0x01 | fingerprint (8 B, LE)  | Avro binary datum    |
//! +------+------+------------------------+----------------------+
//! ```
//!
//! The fingerprint identifies the writer schema, so a consumer can resolve it
//! without out-of-band metadata.

use crate::error::EncodingError;
use apache_avro::types::Value;
use apache_avro::{GenericSingleObjectReader, GenericSingleObjectWriter};
use click_schema::{FieldType, FieldValue, Record, Schema};

/// Result type for encoder operations.
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Single-object encoding marker.
pub const SINGLE_OBJECT_MAGIC: [u8; 2] = [0xC3, 0x01];

/// Length of the marker plus fingerprint.
pub const HEADER_LEN: usize = 10;

/// Encode `record` against `schema`.
///
/// Fails when a required field is absent or null, when a field value does
/// not match its declared type, or when the record carries a field the schema
/// does not declare. Identical input produces identical bytes.
pub fn encode(record: &Record, schema: &Schema) -> Result<Vec<u8>> {
    check_conformance(record, schema)?;

    let fields = schema
        .fields()
        .iter()
        .map(|field| {
            let value = record.get(&field.name).map_or(Value::Null, to_avro_value);
            (field.name.clone(), value)
        })
        .collect();

    // resolve() wraps optional values in their union branch and maps longs
    // onto logical types
    let value = Value::Record(fields).resolve(schema.avro())?;

    let mut writer = GenericSingleObjectWriter::new_with_capacity(schema.avro(), 64)?;
    let mut buffer = Vec::new();
    writer.write_value(value, &mut buffer)?;
    Ok(buffer)
}

/// Decode bytes written by [`encode`] with the same schema.
///
/// The header is checked up front so a foreign payload reports which
/// fingerprint it carries.
pub fn decode(bytes: &[u8], schema: &Schema) -> Result<Record> {
    if bytes.len() < HEADER_LEN || bytes[..2] != SINGLE_OBJECT_MAGIC {
        return Err(EncodingError::InvalidHeader);
    }

    let mut fingerprint = [0u8; 8];
    fingerprint.copy_from_slice(&bytes[2..HEADER_LEN]);
    let actual = u64::from_le_bytes(fingerprint);
    if actual != schema.fingerprint() {
        return Err(EncodingError::FingerprintMismatch {
            expected: schema.fingerprint(),
            actual,
        });
    }

    let reader = GenericSingleObjectReader::new(schema.avro().clone())?;
    let mut input = bytes;
    match reader.read_value(&mut input)? {
        Value::Record(fields) => fields
            .into_iter()
            .map(|(name, value)| Ok((name, from_avro_value(value)?)))
            .collect(),
        other => Err(EncodingError::UnexpectedValue(format!("{other:?}"))),
    }
}

fn check_conformance(record: &Record, schema: &Schema) -> Result<()> {
    for field in schema.fields() {
        match record.get(&field.name) {
            None | Some(FieldValue::Null) => {
                if field.required {
                    return Err(EncodingError::MissingField {
                        schema: schema.name().to_string(),
                        field: field.name.clone(),
                    });
                }
            }
            Some(value) => {
                if !conforms(field.field_type, value) {
                    return Err(EncodingError::TypeMismatch {
                        field: field.name.clone(),
                        expected: field.field_type,
                        actual: value.type_name(),
                    });
                }
            }
        }
    }

    if let Some((name, _)) = record.iter().find(|(name, _)| schema.field(name).is_none()) {
        return Err(EncodingError::UnknownField {
            schema: schema.name().to_string(),
            field: name.clone(),
        });
    }

    Ok(())
}

fn conforms(field_type: FieldType, value: &FieldValue) -> bool {
    matches!(
        (field_type, value),
        (FieldType::Boolean, FieldValue::Boolean(_))
            | (FieldType::Int, FieldValue::Int(_))
            | (
                FieldType::Long | FieldType::TimestampMillis,
                FieldValue::Int(_) | FieldValue::Long(_)
            )
            | (FieldType::Float, FieldValue::Float(_))
            | (FieldType::Double, FieldValue::Float(_) | FieldValue::Double(_))
            | (FieldType::String | FieldType::Uuid, FieldValue::String(_))
            | (FieldType::Bytes, FieldValue::Bytes(_))
    )
}

fn to_avro_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Boolean(b) => Value::Boolean(*b),
        FieldValue::Int(i) => Value::Int(*i),
        FieldValue::Long(i) => Value::Long(*i),
        FieldValue::Float(f) => Value::Float(*f),
        FieldValue::Double(f) => Value::Double(*f),
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Bytes(b) => Value::Bytes(b.clone()),
    }
}

fn from_avro_value(value: Value) -> Result<FieldValue> {
    Ok(match value {
        Value::Union(_, inner) => return from_avro_value(*inner),
        Value::Null => FieldValue::Null,
        Value::Boolean(b) => FieldValue::Boolean(b),
        Value::Int(i) => FieldValue::Int(i),
        Value::Long(i) | Value::TimestampMillis(i) => FieldValue::Long(i),
        Value::Float(f) => FieldValue::Float(f),
        Value::Double(f) => FieldValue::Double(f),
        Value::String(s) => FieldValue::String(s),
        Value::Uuid(u) => FieldValue::String(u.to_string()),
        Value::Bytes(b) => FieldValue::Bytes(b),
        other => return Err(EncodingError::UnexpectedValue(format!("{other:?}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use click_schema::{BuiltinSchemaProvider, SchemaProvider};

    fn value_schema() -> Schema {
        BuiltinSchemaProvider.load("clicks_value_v1").unwrap()
    }

    fn key_schema() -> Schema {
        BuiltinSchemaProvider.load("clicks_key_v1").unwrap()
    }

    fn value_record() -> Record {
        Record::new()
            .with("id", "0b7c6a4e-6d1f-4c55-9f0e-6b7e0c6f1a11")
            .with("impression_id", "4f5e3d2c-1b0a-4c9d-8e7f-6a5b4c3d2e1f")
            .with("creative_id", "a1b2c3d4")
            .with("placement_id", "e5f6a7b8")
            .with("timestamp", 1_700_000_000_123i64)
            .with("user_agent", "Roku4640X/DVP-7.70 (297.70E04154A)")
            .with("ip", "192.168.0.17")
            .with("referrer", "cnn.com")
            .with("cost", 0.37)
    }

    #[test]
    fn test_encode_writes_single_object_header() {
        let schema = key_schema();
        let encoded = encode(&Record::new().with("id", "abc"), &schema).unwrap();

        assert_eq!(&encoded[..2], &SINGLE_OBJECT_MAGIC);
        assert_eq!(&encoded[2..HEADER_LEN], &schema.fingerprint().to_le_bytes());
        // zig-zag length 3 followed by the utf-8 bytes
        assert_eq!(&encoded[HEADER_LEN..], &[0x06, b'a', b'b', b'c']);
    }

    #[test]
    fn test_payload_readable_by_avro_single_object_reader() {
        let schema = value_schema();
        let encoded = encode(&value_record(), &schema).unwrap();

        let reader = GenericSingleObjectReader::new(schema.avro().clone()).unwrap();
        let value = reader.read_value(&mut encoded.as_slice()).unwrap();
        assert!(matches!(value, Value::Record(ref fields) if fields.len() == 9));
    }

    #[test]
    fn test_round_trip() {
        let schema = value_schema();
        let record = value_record();

        let decoded = decode(&encode(&record, &schema).unwrap(), &schema).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let schema = value_schema();
        let a = encode(&value_record(), &schema).unwrap();
        let b = encode(&value_record(), &schema).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_optional_field_may_be_null_or_absent() {
        let schema = value_schema();

        let mut absent = value_record();
        absent.remove("referrer");
        let decoded = decode(&encode(&absent, &schema).unwrap(), &schema).unwrap();
        assert_eq!(decoded.get("referrer"), Some(&FieldValue::Null));

        let explicit = value_record().with("referrer", None::<String>);
        assert!(encode(&explicit, &schema).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let schema = value_schema();
        let mut record = value_record();
        record.remove("ip");

        match encode(&record, &schema) {
            Err(EncodingError::MissingField { field, .. }) => assert_eq!(field, "ip"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_null_required_field() {
        let schema = value_schema();
        let record = value_record().with("cost", FieldValue::Null);

        assert!(matches!(
            encode(&record, &schema),
            Err(EncodingError::MissingField { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let schema = value_schema();
        let record = value_record().with("cost", "cheap");

        match encode(&record, &schema) {
            Err(EncodingError::TypeMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "cost");
                assert_eq!(expected, FieldType::Double);
                assert_eq!(actual, "string");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field() {
        let schema = key_schema();
        let record = Record::new().with("id", "abc").with("extra", 1i64);

        assert!(matches!(
            encode(&record, &schema),
            Err(EncodingError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_int_widens_to_long() {
        let schema = value_schema();
        let record = value_record().with("timestamp", 5i32);

        let decoded = decode(&encode(&record, &schema).unwrap(), &schema).unwrap();
        assert_eq!(decoded.get("timestamp"), Some(&FieldValue::Long(5)));
    }

    #[test]
    fn test_decode_rejects_other_schema() {
        let encoded = encode(&Record::new().with("id", "abc"), &key_schema()).unwrap();

        assert!(matches!(
            decode(&encoded, &value_schema()),
            Err(EncodingError::FingerprintMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_missing_header() {
        let schema = key_schema();
        assert!(matches!(
            decode(&[0x06, b'a', b'b', b'c'], &schema),
            Err(EncodingError::InvalidHeader)
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_datum() {
        let schema = value_schema();
        let encoded = encode(&value_record(), &schema).unwrap();

        assert!(decode(&encoded[..encoded.len() - 4], &schema).is_err());
    }
}
