//! Encoded payloads decode back to the events they came from.

use crate::{binding, generator, SEED};
use click_generator::ClickEvent;
use click_producer::encoder::{SINGLE_OBJECT_MAGIC, HEADER_LEN};
use click_producer::{decode, encode, EncodingError};

#[test]
fn test_generated_events_round_trip() {
    let binding = binding();

    for click in generator(SEED).take(100) {
        let key = encode(&click.key_record(), &binding.key).unwrap();
        let value = encode(&click.value_record(), &binding.value).unwrap();

        let decoded_key = decode(&key, &binding.key).unwrap();
        let decoded_value = decode(&value, &binding.value).unwrap();
        assert_eq!(decoded_key, click.key_record());
        assert_eq!(decoded_value, click.value_record());
        assert_eq!(
            ClickEvent::from_records(&decoded_key, &decoded_value).unwrap(),
            click
        );
    }
}

#[test]
fn test_payload_carries_schema_fingerprint() {
    let binding = binding();
    let click = generator(SEED).next_event();

    let value = encode(&click.value_record(), &binding.value).unwrap();
    assert_eq!(&value[..2], &SINGLE_OBJECT_MAGIC);
    assert_eq!(
        u64::from_le_bytes(value[2..HEADER_LEN].try_into().unwrap()),
        binding.value.fingerprint()
    );

    // a value payload is not a key payload
    assert!(matches!(
        decode(&value, &binding.key),
        Err(EncodingError::FingerprintMismatch { .. })
    ));
}
