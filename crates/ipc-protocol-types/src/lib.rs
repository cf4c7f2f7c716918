//! IPC protocol definitions for the quantumd control channel.
//!
//! Uses a JSON-RPC-like protocol over Unix domain sockets: one request per
//! line, one response per line. The operation selector is carried as a plain
//! string so that unrecognized selectors survive parsing and can be rejected
//! by the command dispatcher itself rather than by serde.

use serde::{Deserialize, Serialize};

/// Operation selectors understood by the daemon.
///
/// The `quantum.*` and `caller.*` names are control commands executed by the
/// dispatcher; `health` and `shutdown` are served by the daemon directly.
pub mod ops {
    pub const HEALTH: &str = "health";
    pub const SHUTDOWN: &str = "shutdown";

    pub const QUANTUM_RESET: &str = "quantum.reset";
    pub const QUANTUM_SET: &str = "quantum.set";
    pub const QUANTUM_TELL: &str = "quantum.tell";
    pub const QUANTUM_GET: &str = "quantum.get";
    pub const QUANTUM_QUERY: &str = "quantum.query";
    pub const QUANTUM_EXCHANGE: &str = "quantum.exchange";
    pub const QUANTUM_SHIFT: &str = "quantum.shift";
    pub const CALLER_IDENTIFY: &str = "caller.identify";
}

/// IPC request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation.
    pub id: String,
    /// Operation to invoke.
    pub op: String,
    /// Operation argument (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request with auto-generated ID.
    pub fn new(op: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            op: op.to_string(),
            arg: None,
        }
    }

    /// Create a new request with an argument.
    pub fn with_arg(op: &str, arg: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            op: op.to_string(),
            arg: Some(arg),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// IPC response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID for correlation.
    pub id: String,
    /// Result data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Error information in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    /// Create a successful response.
    pub fn success(id: &str, result: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: &str, code: i32, message: &str) -> Self {
        Self {
            id: id.to_string(),
            result: None,
            error: Some(ErrorInfo {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// Standard error codes
pub mod error_codes {
    /// Request line was not valid JSON or not a valid request shape.
    pub const PARSE_ERROR: i32 = -32700;
    /// Request was structurally valid JSON but not a usable request.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Operation selector is not a recognized command.
    pub const INVALID_COMMAND: i32 = -32601;
    /// Argument region is missing, mis-typed, or the wrong size.
    pub const INVALID_ARG_REGION: i32 = -32602;
    /// Internal failure while executing a recognized command.
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(ops::HEALTH);
        let json = request.to_json().unwrap();

        assert!(json.contains("\"op\":\"health\""));
        assert!(json.contains("\"id\":"));
        // No arg means no arg key on the wire
        assert!(!json.contains("\"arg\""));
    }

    #[test]
    fn test_request_with_arg() {
        let request = Request::with_arg(ops::QUANTUM_SET, serde_json::json!(8192));
        let json = request.to_json().unwrap();

        assert!(json.contains("\"op\":\"quantum.set\""));
        assert!(json.contains("\"arg\":8192"));
    }

    #[test]
    fn test_response_success() {
        let response = Response::success("123", serde_json::json!({ "status": "ok" }));
        let json = response.to_json().unwrap();

        assert!(json.contains("\"id\":\"123\""));
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_response_error() {
        let response = Response::error("123", error_codes::INVALID_COMMAND, "Unknown operation");
        let json = response.to_json().unwrap();

        assert!(json.contains("\"id\":\"123\""));
        assert!(json.contains("\"code\":-32601"));
        assert!(json.contains("\"message\":\"Unknown operation\""));
        assert!(!json.contains("\"result\""));
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"id":"abc","op":"quantum.query"}"#;
        let request: Request = Request::from_json(json).unwrap();

        assert_eq!(request.id, "abc");
        assert_eq!(request.op, ops::QUANTUM_QUERY);
        assert!(request.arg.is_none());
    }

    #[test]
    fn test_unknown_op_still_parses() {
        // Unknown selectors must survive parsing so the dispatcher can
        // reject them with InvalidCommand rather than a parse error.
        let json = r#"{"id":"abc","op":"no.such.command","arg":7}"#;
        let request: Request = Request::from_json(json).unwrap();

        assert_eq!(request.op, "no.such.command");
        assert_eq!(request.arg, Some(serde_json::json!(7)));
    }

    #[test]
    fn test_all_command_ops_roundtrip() {
        let names = [
            ops::HEALTH,
            ops::SHUTDOWN,
            ops::QUANTUM_RESET,
            ops::QUANTUM_SET,
            ops::QUANTUM_TELL,
            ops::QUANTUM_GET,
            ops::QUANTUM_QUERY,
            ops::QUANTUM_EXCHANGE,
            ops::QUANTUM_SHIFT,
            ops::CALLER_IDENTIFY,
        ];

        for name in names {
            let request = Request::new(name);
            let json = request.to_json().unwrap();
            assert!(
                json.contains(&format!("\"op\":\"{}\"", name)),
                "op {} should serialize verbatim",
                name
            );
            let parsed = Request::from_json(&json).unwrap();
            assert_eq!(parsed.op, name);
        }
    }

    #[test]
    fn test_error_info_serialization() {
        let error = ErrorInfo {
            code: error_codes::INTERNAL_ERROR,
            message: "Something went wrong".to_string(),
            data: Some(serde_json::json!({"details": "more info"})),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":-32603"));
        assert!(json.contains("\"message\":\"Something went wrong\""));
        assert!(json.contains("\"details\":\"more info\""));
    }

    #[test]
    fn test_response_is_success() {
        let success = Response::success("1", serde_json::json!({}));
        assert!(success.is_success());

        let error = Response::error("1", error_codes::INTERNAL_ERROR, "Error");
        assert!(!error.is_success());
    }

    #[test]
    fn test_request_from_json_invalid() {
        // Invalid JSON
        let result = Request::from_json("not json");
        assert!(result.is_err());

        // Missing required fields
        let result = Request::from_json(r#"{"id":"123"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_to_json_roundtrip() {
        let response = Response::success("test-id", serde_json::json!({"value": 4000}));
        let json = response.to_json().unwrap();

        let parsed: Response = Response::from_json(&json).unwrap();
        assert_eq!(parsed.id, "test-id");
        assert!(parsed.is_success());
        assert_eq!(parsed.result, Some(serde_json::json!({"value": 4000})));
    }

    #[test]
    fn test_error_codes_values() {
        // Standard JSON-RPC numbering with the protocol errors in the
        // method/params slots
        assert_eq!(error_codes::PARSE_ERROR, -32700);
        assert_eq!(error_codes::INVALID_REQUEST, -32600);
        assert_eq!(error_codes::INVALID_COMMAND, -32601);
        assert_eq!(error_codes::INVALID_ARG_REGION, -32602);
        assert_eq!(error_codes::INTERNAL_ERROR, -32603);
    }

    #[test]
    fn test_request_id_uniqueness() {
        let req1 = Request::new(ops::HEALTH);
        let req2 = Request::new(ops::HEALTH);

        // IDs should be unique (UUIDs)
        assert_ne!(req1.id, req2.id);
        assert!(!req1.id.is_empty());
        assert!(!req2.id.is_empty());
    }
}
