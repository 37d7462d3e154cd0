use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::error::JsonRpcErrorObject;
use crate::types::{RequestId, nullable_id};

/// A JSON-RPC response with the `result` member left undecoded.
///
/// Per JSON-RPC 2.0 exactly one of `result` and `error` is populated. That is not
/// enforced here: whatever the server sent is passed through. A `"result": null`
/// is kept as the raw text `null`; only an absent member leaves `result` empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc", default)]
    pub version: String,
    #[serde(default, deserialize_with = "nullable_id")]
    pub id: RequestId,
    #[serde(
        default,
        deserialize_with = "present_raw",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The raw JSON text of the result, `Some("null")` for an explicit null
    pub fn raw_result(&self) -> Option<&str> {
        self.result.as_deref().map(RawValue::get)
    }

    /// Decode the result into `T`.
    ///
    /// A server error takes precedence over a result. A response with neither
    /// decodes as JSON `null`.
    pub fn decode_result<T: DeserializeOwned>(&self) -> Result<T, ResultError> {
        if let Some(error) = &self.error {
            return Err(ResultError::Rpc(error.clone()));
        }
        let raw = self.raw_result().unwrap_or("null");
        serde_json::from_str(raw).map_err(ResultError::Decode)
    }
}

/// `Some` whenever the member is present, including a JSON `null`
fn present_raw<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// Failure to turn a response into a typed result
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    #[error(transparent)]
    Rpc(JsonRpcErrorObject),

    #[error("failed to decode result: {0}")]
    Decode(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_string};

    #[test]
    fn test_success_response_keeps_raw_result() {
        let response: JsonRpcResponse =
            from_str(r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x10", "hash":null}}"#).unwrap();

        assert_eq!(response.id, 1);
        assert!(!response.is_error());
        assert_eq!(response.raw_result(), Some(r#"{"number":"0x10", "hash":null}"#));

        let decoded: serde_json::Value = response.decode_result().unwrap();
        assert_eq!(decoded, json!({"number": "0x10", "hash": null}));
    }

    #[test]
    fn test_error_response() {
        let response: JsonRpcResponse = from_str(
            r#"{"jsonrpc":"2.0","id":9,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();

        assert!(response.is_error());
        assert!(response.result.is_none());
        match response.decode_result::<String>() {
            Err(ResultError::Rpc(error)) => assert_eq!(error.code, -32601),
            other => panic!("Expected rpc error, got: {:?}", other),
        }
    }

    #[test]
    fn test_null_id_maps_to_zero() {
        let response: JsonRpcResponse = from_str(
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
        )
        .unwrap();
        assert_eq!(response.id, 0);
    }

    #[test]
    fn test_response_serialization_omits_absent_members() {
        let response: JsonRpcResponse = from_str(r#"{"jsonrpc":"2.0","id":4,"result":"0x1"}"#).unwrap();
        assert_eq!(to_string(&response).unwrap(), r#"{"jsonrpc":"2.0","id":4,"result":"0x1"}"#);

        let decoded: String = response.decode_result().unwrap();
        assert_eq!(decoded, "0x1");
    }

    #[test]
    fn test_decode_result_type_mismatch() {
        let response: JsonRpcResponse = from_str(r#"{"jsonrpc":"2.0","id":5,"result":"0x1"}"#).unwrap();
        assert!(matches!(response.decode_result::<u64>(), Err(ResultError::Decode(_))));
    }

    #[test]
    fn test_null_result_is_distinct_from_absent() {
        let null_result: JsonRpcResponse =
            from_str(r#"{"jsonrpc":"2.0","id":6,"result":null}"#).unwrap();
        assert_eq!(null_result.raw_result(), Some("null"));
        assert_eq!(null_result.decode_result::<Option<String>>().unwrap(), None);
        assert_eq!(to_string(&null_result).unwrap(), r#"{"jsonrpc":"2.0","id":6,"result":null}"#);

        let absent: JsonRpcResponse = from_str(r#"{"jsonrpc":"2.0","id":7}"#).unwrap();
        assert_eq!(absent.raw_result(), None);
    }
}
