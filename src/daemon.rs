//! Long-running listener: connect, attach, subscribe, dispatch.

use std::path::Path;

use crate::{
    app::App,
    error::Result,
    host_ipc::{Connection, Listener, NotificationClass},
    trigger::Trigger,
};

/// Run until the host closes the connection. Always ends with an error;
/// [`crate::error::Error::is_closed`] tells a host shutdown apart from a failure.
pub async fn run(socket: &Path, trigger: Trigger) -> Result<()> {
    let mut connection = Connection::connect(socket).await?;
    let app = App::fetch(&mut connection).await?;

    let host = app.info().name.clone();
    let mut listener = Listener::new(connection, app);
    tracing::info!(
        "Waiting for Custom=id={}:{}",
        trigger.identity,
        trigger.payload
    );
    listener
        .subscribe(NotificationClass::CustomEscapeSequence, trigger.into_handler())
        .await?;

    let result = listener.run_forever().await;
    let state = listener.state();
    listener.shutdown().await;
    tracing::info!("Listener for {host} stopped ({state:?})");
    result
}
