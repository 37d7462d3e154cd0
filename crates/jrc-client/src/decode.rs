//! Structured decoding of collected payloads

use jrc_json_rpc::JsonRpcResponse;

use crate::dispatch::RawPayload;
use crate::error::DecodeError;

/// Decode one payload as a JSON array of responses
pub fn decode_payload(payload: &RawPayload) -> Result<Vec<JsonRpcResponse>, DecodeError> {
    match payload {
        RawPayload::Body(body) => {
            serde_json::from_slice(body).map_err(|source| DecodeError::Malformed {
                source,
                payload: String::from_utf8_lossy(body).into_owned(),
            })
        }
        RawPayload::TransportFailed(message) => Err(DecodeError::TransportFailed {
            message: message.clone(),
        }),
    }
}

/// Decode every payload and flatten the responses, keeping payload order.
///
/// Stops at the first payload that fails; no partial result is returned.
pub fn decode_payloads(payloads: &[RawPayload]) -> Result<Vec<JsonRpcResponse>, DecodeError> {
    let mut responses = Vec::new();
    for payload in payloads {
        responses.extend(decode_payload(payload)?);
    }
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn body(text: &'static str) -> RawPayload {
        RawPayload::Body(Bytes::from_static(text.as_bytes()))
    }

    fn ids(responses: &[JsonRpcResponse]) -> Vec<i64> {
        responses.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_flattens_in_payload_order() {
        let payloads = vec![
            body(r#"[{"jsonrpc":"2.0","id":4,"result":"0x4"},{"jsonrpc":"2.0","id":5,"result":"0x5"}]"#),
            body(r#"[{"jsonrpc":"2.0","id":1,"result":"0x1"}]"#),
        ];

        let responses = decode_payloads(&payloads).unwrap();
        assert_eq!(ids(&responses), vec![4, 5, 1]);
        assert_eq!(responses[2].raw_result(), Some("\"0x1\""));
    }

    #[test]
    fn test_grouping_does_not_change_flat_sequence() {
        let encoded: Vec<String> = (0..7)
            .map(|i| format!(r#"{{"jsonrpc":"2.0","id":{i},"result":{{"n":{i}}}}}"#))
            .collect();

        for group in 1..=7 {
            let payloads: Vec<RawPayload> = encoded
                .chunks(group)
                .map(|chunk| RawPayload::Body(Bytes::from(format!("[{}]", chunk.join(",")))))
                .collect();
            let responses = decode_payloads(&payloads).unwrap();
            assert_eq!(ids(&responses), (0..7).collect::<Vec<_>>(), "group size {group}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_payloads(&[]).unwrap().is_empty());
        assert!(decode_payloads(&[body("[]")]).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_carries_raw_text() {
        let payloads = vec![
            body(r#"[{"jsonrpc":"2.0","id":1,"result":true}]"#),
            body("<html>502 Bad Gateway</html>"),
            body(r#"[{"jsonrpc":"2.0","id":2,"result":true}]"#),
        ];

        match decode_payloads(&payloads) {
            Err(DecodeError::Malformed { payload, .. }) => {
                assert_eq!(payload, "<html>502 Bad Gateway</html>");
            }
            other => panic!("Expected malformed payload error, got: {:?}", other),
        }
    }

    #[test]
    fn test_single_object_is_not_a_batch() {
        let err = decode_payloads(&[body(r#"{"jsonrpc":"2.0","id":1,"result":true}"#)]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_transport_failure_is_reported_as_such() {
        let payloads = vec![RawPayload::TransportFailed("Connection failed: refused".to_string())];

        let err = decode_payloads(&payloads).unwrap_err();
        assert!(matches!(err, DecodeError::TransportFailed { .. }));
        assert_eq!(err.payload_text(), "Connection failed: refused");
    }

    #[test]
    fn test_error_responses_pass_through() {
        let responses = decode_payloads(&[body(
            r#"[{"jsonrpc":"2.0","id":3,"error":{"code":-32000,"message":"header not found"}}]"#,
        )])
        .unwrap();

        assert!(responses[0].is_error());
        assert_eq!(responses[0].error.as_ref().unwrap().message, "header not found");
    }
}
