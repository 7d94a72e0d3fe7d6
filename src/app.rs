//! Handle to the host's application object.

use crate::{
    error::{ConnectionError, Result},
    host_ipc::{AppInfo, Connection, Method, Outbox},
};

/// Application handle, fetched once after connecting and passed to every
/// notification handler.
#[derive(Clone)]
pub struct App {
    info: AppInfo,
    outbox: Outbox,
}

impl App {
    /// Ask the host for its application object.
    pub async fn fetch(connection: &mut Connection) -> Result<Self> {
        let result = connection.call(Method::GetApp).await?;
        if !result.is_object() {
            let msg = format!("get_app returned {result}");
            return Err(ConnectionError::UnexpectedResponse(msg).into());
        }
        let info: AppInfo = serde_json::from_value(result)?;
        tracing::info!("Attached to {} {}", info.name, info.version);
        Ok(Self {
            info,
            outbox: connection.outbox(),
        })
    }

    pub const fn info(&self) -> &AppInfo {
        &self.info
    }

    /// Ask the host to open a new window with the default profile.
    /// Returns the request id; the host's reply is only logged.
    pub fn create_window(&self) -> Result<u64> {
        self.outbox.send(Method::CreateWindow {
            profile: None,
            command: None,
        })
    }
}
