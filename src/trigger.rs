//! Reacting to the `create-window` custom escape sequence.

use crate::{app::App, error::Result, host_ipc::Notification};

pub const SHARED_SECRET: &str = "shared-secret";
pub const CREATE_WINDOW: &str = "create-window";

/// Identity and payload a custom escape sequence must carry to fire.
/// Both are compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub identity: String,
    pub payload: String,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            identity: SHARED_SECRET.to_string(),
            payload: CREATE_WINDOW.to_string(),
        }
    }
}

impl Trigger {
    pub fn matches(&self, notification: &Notification) -> bool {
        match notification {
            Notification::CustomEscapeSequence {
                sender_identity,
                payload,
                ..
            } => *sender_identity == self.identity && *payload == self.payload,
            _ => false,
        }
    }

    /// Handler that opens a window for every matching notification.
    pub fn into_handler(self) -> impl FnMut(&App, &Notification) -> Result<()> + Send + 'static {
        move |app: &App, notification: &Notification| {
            tracing::info!(
                "Received a custom escape sequence from session {}",
                notification.session_id()
            );
            if !self.matches(notification) {
                tracing::debug!("Ignoring {notification:?}");
                return Ok(());
            }
            let id = app.create_window()?;
            tracing::info!("Requested a new window (#{id})");
            Ok(())
        }
    }
}
