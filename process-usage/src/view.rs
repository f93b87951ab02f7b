//! Response envelope shared by every endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessView<T> {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<T>,
}

pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred with the API.";

pub fn success<T>(data: T, message: &str) -> ProcessView<T> {
    ProcessView {
        status: Status::Success,
        message: message.to_string(),
        data: Some(data),
    }
}

pub fn error(message: &str) -> ProcessView<()> {
    ProcessView {
        status: Status::Error,
        message: message.to_string(),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_value(error("boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(success(vec![1, 2], "listed")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "listed");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
