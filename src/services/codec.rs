//! Participant id <-> QR token codec
//!
//! Tokens look like `<scheme>://attendance/<payload>` where the payload is
//! the id's bytes XORed with a repeating key and base64 encoded. This is
//! obfuscation only: there is no integrity check, so a token produced with a
//! different key decodes to garbage, which the UUID shape check rejects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use uuid::Uuid;

use crate::config::QrConfig;
use crate::utils::errors::{CodecError, CodecResult, EventPassError, Result};

#[derive(Debug, Clone)]
pub struct QrCodec {
    key: Vec<u8>,
    prefix: String,
    pattern: Regex,
}

impl QrCodec {
    /// Build a codec for the given key and URI scheme
    pub fn new(key: &str, scheme: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(EventPassError::Config("QR encryption key must not be empty".to_string()));
        }

        let prefix = format!("{}://attendance/", scheme);
        let pattern = Regex::new(&format!("^{}(.+)$", regex::escape(&prefix)))
            .map_err(|e| EventPassError::Config(format!("Invalid QR scheme: {}", e)))?;

        Ok(Self {
            key: key.as_bytes().to_vec(),
            prefix,
            pattern,
        })
    }

    pub fn from_config(config: &QrConfig) -> Result<Self> {
        Self::new(&config.encryption_key, &config.scheme)
    }

    /// Literal prefix every token starts with
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Turn a participant id into QR token data
    pub fn encode(&self, participant_id: Uuid) -> String {
        let payload = self.xor(participant_id.to_string().as_bytes());
        format!("{}{}", self.prefix, STANDARD.encode(payload))
    }

    /// Recover the participant id from QR token data
    pub fn decode(&self, token: &str) -> CodecResult<Uuid> {
        let payload = self
            .pattern
            .captures(token.trim())
            .and_then(|captures| captures.get(1))
            .ok_or(CodecError::InvalidFormat)?
            .as_str();

        let bytes = STANDARD.decode(payload).map_err(|_| CodecError::InvalidToken)?;
        let raw = String::from_utf8(self.xor(&bytes)).map_err(|_| CodecError::InvalidToken)?;

        Uuid::parse_str(&raw).map_err(|_| CodecError::InvalidToken)
    }

    /// Whether the value carries the token prefix
    pub fn is_token(&self, value: &str) -> bool {
        value.trim().starts_with(&self.prefix)
    }

    /// Accept either QR token data or a bare participant id, as scanners send both
    pub fn resolve_participant_id(&self, value: &str) -> CodecResult<Uuid> {
        if self.is_token(value) {
            self.decode(value)
        } else {
            Uuid::parse_str(value.trim()).map_err(|_| CodecError::InvalidToken)
        }
    }

    fn xor(&self, input: &[u8]) -> Vec<u8> {
        input
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, key)| byte ^ key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QrCodec {
        QrCodec::new("eventpass-test-key", "eventpass").unwrap()
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.encode(id);

        assert!(token.starts_with("eventpass://attendance/"));
        assert_eq!(codec.decode(&token).unwrap(), id);
    }

    #[test]
    fn test_token_does_not_expose_raw_id() {
        let codec = codec();
        let id = Uuid::new_v4();
        assert!(!codec.encode(id).contains(&id.to_string()));
    }

    #[test]
    fn test_wrong_prefix_is_format_error() {
        let codec = codec();
        let token = codec.encode(Uuid::new_v4()).replace("eventpass://", "other://");
        assert_eq!(codec.decode(&token), Err(CodecError::InvalidFormat));
        assert_eq!(codec.decode("eventpass://attendance/"), Err(CodecError::InvalidFormat));
        assert_eq!(codec.decode(""), Err(CodecError::InvalidFormat));
    }

    #[test]
    fn test_garbage_payload_is_token_error() {
        let codec = codec();
        assert_eq!(codec.decode("eventpass://attendance/!!!not-base64"), Err(CodecError::InvalidToken));
        assert_eq!(codec.decode("eventpass://attendance/aGVsbG8="), Err(CodecError::InvalidToken));
    }

    #[test]
    fn test_other_key_does_not_recover_id() {
        let id = Uuid::new_v4();
        let token = QrCodec::new("first-key", "eventpass").unwrap().encode(id);
        let decoded = QrCodec::new("second-key", "eventpass").unwrap().decode(&token);
        assert_ne!(decoded, Ok(id));
    }

    #[test]
    fn test_resolve_accepts_raw_id_and_token() {
        let codec = codec();
        let id = Uuid::new_v4();

        assert_eq!(codec.resolve_participant_id(&id.to_string()).unwrap(), id);
        assert_eq!(codec.resolve_participant_id(&codec.encode(id)).unwrap(), id);
        assert_eq!(codec.resolve_participant_id("not-an-id"), Err(CodecError::InvalidToken));
    }

    #[test]
    fn test_scheme_is_escaped() {
        let codec = QrCodec::new("key", "a.b").unwrap();
        let id = Uuid::new_v4();
        let token = codec.encode(id).replace("a.b://", "axb://");
        assert_eq!(codec.decode(&token), Err(CodecError::InvalidFormat));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(QrCodec::new("", "eventpass").is_err());
    }
}
