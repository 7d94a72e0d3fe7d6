use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the default path of the host's Unix socket.
pub fn socket_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("esc-trigger/host.sock")
}

/// Notification classes a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationClass {
    CustomEscapeSequence,
    NewSession,
    TerminateSession,
}

impl fmt::Display for NotificationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CustomEscapeSequence => "custom_escape_sequence",
            Self::NewSession => "new_session",
            Self::TerminateSession => "terminate_session",
        };
        f.write_str(name)
    }
}

/// Event pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notification", rename_all = "snake_case")]
pub enum Notification {
    /// A terminal session received `OSC 1337 ; Custom=id=<identity>:<payload>`.
    CustomEscapeSequence {
        session_id: String,
        sender_identity: String,
        payload: String,
    },
    NewSession {
        session_id: String,
    },
    TerminateSession {
        session_id: String,
    },
}

impl Notification {
    pub const fn class(&self) -> NotificationClass {
        match self {
            Self::CustomEscapeSequence { .. } => NotificationClass::CustomEscapeSequence,
            Self::NewSession { .. } => NotificationClass::NewSession,
            Self::TerminateSession { .. } => NotificationClass::TerminateSession,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::CustomEscapeSequence { session_id, .. }
            | Self::NewSession { session_id }
            | Self::TerminateSession { session_id } => session_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Reply to a [`Request`], correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub status: Status,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// Messages sent from the host to the client, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Response(Response),
    Notification(Notification),
}

/// Operations the client asks the host to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Method {
    GetApp,
    Subscribe {
        notification: NotificationClass,
    },
    CreateWindow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        profile: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
}

impl Method {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetApp => "get_app",
            Self::Subscribe { .. } => "subscribe",
            Self::CreateWindow { .. } => "create_window",
        }
    }
}

/// Request sent from the client to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub method: Method,
}

/// Result of `get_app`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_custom_escape_notification_from_host_line() {
        let line = r#"{"type":"notification","notification":"custom_escape_sequence","session_id":"w0t0p0","sender_identity":"shared-secret","payload":"create-window"}"#;
        let msg: Message = serde_json::from_str(line).unwrap();
        let Message::Notification(notification) = msg else {
            panic!("expected a notification");
        };
        assert_eq!(notification.class(), NotificationClass::CustomEscapeSequence);
        assert_eq!(notification.session_id(), "w0t0p0");
    }

    #[test]
    fn test_response_without_result_defaults_to_null() {
        let msg: Message = serde_json::from_str(r#"{"type":"response","id":3,"status":"ok"}"#).unwrap();
        assert_eq!(
            msg,
            Message::Response(Response {
                id: 3,
                status: Status::Ok,
                result: Value::Null,
                error: None,
            })
        );
    }

    #[test]
    fn test_subscribe_request_is_flat() {
        let request = Request {
            id: 2,
            method: Method::Subscribe {
                notification: NotificationClass::CustomEscapeSequence,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"id": 2, "method": "subscribe", "notification": "custom_escape_sequence"})
        );
    }

    #[test]
    fn test_create_window_omits_unset_fields() {
        let request = Request {
            id: 7,
            method: Method::CreateWindow {
                profile: None,
                command: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"id": 7, "method": "create_window"})
        );
    }
}
