use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::UploadError;

/// Text encoding for part payloads: standard base64 with padding.
pub struct PartEncoder;

impl PartEncoder {
    pub fn encode(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    pub fn decode(payload: &str) -> Result<Vec<u8>, UploadError> {
        Ok(STANDARD.decode(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        assert_eq!(PartEncoder::encode(&[]), "");
        assert!(PartEncoder::decode("").unwrap().is_empty());
    }

    #[test]
    fn test_binary_content_survives() {
        let bytes: Vec<u8> = (0..=255u8).chain([0, 0, 0xff, 0x80]).collect();
        let encoded = PartEncoder::encode(&bytes);
        assert!(encoded.is_ascii());
        assert_eq!(PartEncoder::decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_known_value() {
        assert_eq!(PartEncoder::encode(b"PK\x03\x04"), "UEsDBA==");
    }

    #[test]
    fn test_invalid_payload_is_decode_error() {
        let err = PartEncoder::decode("not base64!").unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
    }
}
