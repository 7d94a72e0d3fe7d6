use std::collections::HashMap;

use super::{
    connection::Connection,
    protocol::{Method, Notification, NotificationClass},
};
use crate::{
    app::App,
    error::{ConnectionError, Result},
};

type Handler = Box<dyn FnMut(&App, &Notification) -> Result<()> + Send>;

/// A listener only exists once connected; `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Terminated,
}

/// Dispatches host notifications to at most one handler per class.
pub struct Listener {
    connection: Connection,
    app: App,
    handlers: HashMap<NotificationClass, Handler>,
    state: ConnectionState,
}

impl Listener {
    pub fn new(connection: Connection, app: App) -> Self {
        Self {
            connection,
            app,
            handlers: HashMap::new(),
            state: ConnectionState::Connected,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Register `handler` for `class` and ask the host to start sending it.
    pub async fn subscribe<F>(&mut self, class: NotificationClass, handler: F) -> Result<()>
    where
        F: FnMut(&App, &Notification) -> Result<()> + Send + 'static,
    {
        if self.state == ConnectionState::Terminated {
            return Err(ConnectionError::Closed.into());
        }
        if self.handlers.contains_key(&class) {
            return Err(ConnectionError::AlreadySubscribed(class).into());
        }

        if let Err(e) = self
            .connection
            .call(Method::Subscribe { notification: class })
            .await
        {
            self.state = ConnectionState::Terminated;
            return Err(e);
        }

        tracing::info!("Subscribed to {class}");
        self.handlers.insert(class, Box::new(handler));
        Ok(())
    }

    /// Deliver notifications one at a time until the host disconnects.
    ///
    /// Never returns `Ok`: the loop ends with [`ConnectionError::Closed`] when
    /// the socket closes, or with the first error a handler returns.
    pub async fn run_forever(&mut self) -> Result<()> {
        loop {
            let notification = match self.connection.next_notification().await {
                Ok(notification) => notification,
                Err(e) => {
                    self.state = ConnectionState::Terminated;
                    return Err(e);
                }
            };

            let class = notification.class();
            let Some(handler) = self.handlers.get_mut(&class) else {
                tracing::debug!("No handler for {class}");
                continue;
            };

            if let Err(e) = handler(&self.app, &notification) {
                self.state = ConnectionState::Terminated;
                return Err(e);
            }
        }
    }

    /// Hand every request the handlers queued to the host before letting go
    /// of the socket.
    pub async fn shutdown(self) {
        self.connection.close().await;
    }
}
