use crate::domain::Sample;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request verb understood by the trapper listener.
pub const SENDER_DATA_REQUEST: &str = "sender data";

/// Binary header newer servers put in front of the JSON reply:
/// `ZBXD`, a flags byte and an 8-byte little-endian length.
const PROTOCOL_SIGNATURE: &[u8] = b"ZBXD";
const PROTOCOL_HEADER_LEN: usize = 13;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Response contains no JSON object")]
    MissingPayload,
    #[error("Malformed response payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Serialize)]
pub struct SenderRequest<'a> {
    pub request: &'a str,
    pub data: &'a [Sample],
}

impl<'a> SenderRequest<'a> {
    pub fn new(data: &'a [Sample]) -> Self {
        Self {
            request: SENDER_DATA_REQUEST,
            data,
        }
    }
}

/// Acknowledgment returned by the trapper listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderResponse {
    pub response: String,
    #[serde(default)]
    pub info: String,
}

impl SenderResponse {
    pub fn is_success(&self) -> bool {
        self.response == "success"
    }

    /// Looks up one `name: value` pair of the `info` string, e.g.
    /// `processed: 3; failed: 0; total: 3; seconds spent: 0.000055`.
    pub fn info_field(&self, name: &str) -> Option<&str> {
        self.info.split(';').find_map(|part| {
            let (key, value) = part.split_once(':')?;
            (key.trim() == name).then(|| value.trim())
        })
    }

    pub fn processed(&self) -> Option<u64> {
        self.info_field("processed")?.parse().ok()
    }

    pub fn failed(&self) -> Option<u64> {
        self.info_field("failed")?.parse().ok()
    }

    pub fn total(&self) -> Option<u64> {
        self.info_field("total")?.parse().ok()
    }

    pub fn seconds_spent(&self) -> Option<f64> {
        self.info_field("seconds spent")?.parse().ok()
    }
}

/// Encodes a batch as the compact `{"request":"sender data","data":[...]}` envelope.
pub fn encode_request(samples: &[Sample]) -> Result<Vec<u8>, SerializationError> {
    let request = SenderRequest::new(samples);
    Ok(serde_json::to_vec(&request)?)
}

/// Decodes a reply buffer, skipping any header before the first `{`.
///
/// Bytes after the first complete JSON object (zero padding of the read
/// buffer, a second frame) are ignored.
pub fn decode_response(buffer: &[u8]) -> Result<SenderResponse, SerializationError> {
    let body = if buffer.starts_with(PROTOCOL_SIGNATURE) && buffer.len() >= PROTOCOL_HEADER_LEN {
        &buffer[PROTOCOL_HEADER_LEN..]
    } else {
        buffer
    };

    let text = String::from_utf8_lossy(body);
    let start = text.find('{').ok_or(SerializationError::MissingPayload)?;

    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<SenderResponse>()
        .next()
        .ok_or(SerializationError::MissingPayload)?
        .map_err(|e| SerializationError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_request_envelope() {
        let samples = vec![
            Sample::new("web01", "svc-requests", 3u64),
            Sample::new("web01", "HealthStatus.db", true),
        ];
        let bytes = encode_request(&samples).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"request":"sender data","data":[{"host":"web01","key":"svc-requests","value":3},{"host":"web01","key":"HealthStatus.db","value":true}]}"#
        );
    }

    #[test]
    fn test_encode_empty_batch() {
        let bytes = encode_request(&[]).unwrap();
        assert_eq!(bytes, br#"{"request":"sender data","data":[]}"#);
    }

    #[test]
    fn test_decode_plain_response() {
        let response =
            decode_response(br#"{"response":"success","info":"processed: 3; failed: 0; total: 3; seconds spent: 0.000055"}"#)
                .unwrap();
        assert!(response.is_success());
        assert_eq!(response.processed(), Some(3));
        assert_eq!(response.failed(), Some(0));
        assert_eq!(response.total(), Some(3));
        assert_eq!(response.seconds_spent(), Some(0.000055));
    }

    #[test]
    fn test_decode_skips_binary_header() {
        let payload = br#"{"response":"success","info":"processed: 1"}"#;
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"ZBXD\x01");
        // Length byte 0x7b is '{' and must not be mistaken for the payload start.
        buffer.extend_from_slice(&[0x7b, 0, 0, 0, 0, 0, 0, 0]);
        buffer.extend_from_slice(payload);

        let response = decode_response(&buffer).unwrap();
        assert!(response.is_success());
        assert_eq!(response.processed(), Some(1));
    }

    #[test]
    fn test_decode_skips_textual_prefix_and_padding() {
        let mut buffer = b"garbage-prefix".to_vec();
        buffer.extend_from_slice(br#"{"response":"failed","info":"processed: 0; failed: 2"}"#);
        buffer.resize(1024, 0);

        let response = decode_response(&buffer).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.failed(), Some(2));
    }

    #[test]
    fn test_decode_without_object_fails() {
        assert!(matches!(
            decode_response(b"ZBXD\x01 no json here"),
            Err(SerializationError::MissingPayload)
        ));
    }

    #[test]
    fn test_decode_truncated_object_fails() {
        assert!(matches!(
            decode_response(br#"{"response":"succ"#),
            Err(SerializationError::MalformedPayload(_))
        ));
    }
}
