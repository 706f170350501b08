//! End-to-end tests driving the core through script values

use desfsh_core::prelude::*;
use desfsh_core::{AccessKey, diversify_values};
use hex_literal::hex;
use tracing_subscriber::EnvFilter;

/// Route `RUST_LOG=desfsh=trace` output through the test harness
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn master_literal() -> Value {
    Value::record([
        ("t", Value::from("AES")),
        ("k", Value::from("00112233445566778899aabbccddeeff")),
        ("v", Value::Integer(1)),
    ])
}

#[test]
fn test_diversify_and_describe() {
    init_tracing();
    let derived = diversify_values(
        &master_literal(),
        &Value::Sequence(
            hex!("04782e21801d80")
                .iter()
                .map(|&b| Value::from(b))
                .collect(),
        ),
        &Value::Integer(0x3042f5),
        &Value::Integer(2),
        &Value::Nil,
    )
    .unwrap();

    let key = KeyMaterial::try_from(&derived).unwrap();
    assert_eq!(
        key.describe(),
        "AES:43c6c20ddd419b3730d7d11ad54ba603 (V:001)"
    );
}

#[test]
fn test_derived_key_feeds_cmac() {
    init_tracing();
    let master = KeyMaterial::try_from(&master_literal()).unwrap();
    let derived = Diversification::new(master, ByteBuffer::from_hex("04782E21801D80").unwrap())
        .derive()
        .unwrap();
    assert_eq!(derived.as_bytes(), hex!("fd92f08ed6a2ad98b47bc28e1c719cf0"));

    let message = ByteBuffer::concat_values(&[Value::from("0102"), Value::from("0304")])
        .unwrap()
        .unwrap();
    let first = cmac("AES-128-CBC", &message, derived.buffer()).unwrap();
    let second = cmac("aes128", &message, derived.buffer()).unwrap();
    assert_eq!(first.len(), 16);
    assert_eq!(first, second);
}

#[test]
fn test_buffer_literals_round_trip() {
    init_tracing();
    let buffer = ByteBuffer::try_from(&Value::from("DEADbeef")).unwrap();
    let as_sequence = buffer.to_value();
    assert_eq!(ByteBuffer::try_from(&as_sequence).unwrap(), buffer);
    assert_eq!(buffer.to_string(), "deadbeef");
    assert_eq!(
        buffer.to_hexdump(),
        "00000000  de ad be ef               |....    |"
    );

    trace_buffer(Direction::Out, "BUF", &buffer, 0);

    let joined = &buffer + &ByteBuffer::from_ascii("OK").unwrap();
    assert_eq!(joined.as_bytes()[4..], *b"OK");
}

#[test]
fn test_error_messages_name_arguments() {
    let err = ByteBuffer::concat_values(&[Value::from("00"), Value::from("0g")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #2 (buffer: invalid character 'g' at index 1)"
    );

    let err = hmac("whirlpool", &ByteBuffer::new(), &ByteBuffer::new()).unwrap_err();
    assert_eq!(err.to_string(), "message digest 'whirlpool' unknown");

    let err = cmac("rc2-cbc", &ByteBuffer::new(), &ByteBuffer::new()).unwrap_err();
    assert_eq!(err.to_string(), "cipher 'rc2-cbc' unknown");
}

#[test]
fn test_card_parameters() {
    let rights = AccessRights::from_value(&Value::record([
        ("rd", Value::Integer(1)),
        ("wr", Value::Integer(2)),
        ("rw", Value::Integer(0x0e)),
        ("ca", Value::Integer(0)),
    ]))
    .unwrap();
    assert_eq!(rights.to_u16(), 0x12e0);
    assert_eq!(rights.read_write, AccessKey::Free);
    assert_eq!(rights.to_string(), "RD:01 WR:02 RW:** CA:00");

    assert_eq!(
        CommMode::from_value(&Value::from("mac")).unwrap().to_byte(),
        0x01
    );
}

#[cfg(feature = "serde")]
#[test]
fn test_key_literal_from_json() {
    let value: Value =
        serde_json::from_str(r#"{"t": "aes", "k": "00112233445566778899aabbccddeeff"}"#).unwrap();
    let key = KeyMaterial::from_value(&value).unwrap();
    assert_eq!(key.key_type(), KeyType::Aes);
    assert_eq!(key.version(), 0);
}
