use std::time::Duration;

use uploader_core::ConnectionSpec;
use uploader_logging::uploader_info;

use crate::{ConnectError, EngineError, ProtocolClient};

/// Opens a session, reads the remote home directory and closes again.
pub async fn test_connection(
    client: &dyn ProtocolClient,
    spec: &ConnectionSpec,
    timeout: Duration,
) -> Result<Option<String>, ConnectError> {
    let mut session = tokio::time::timeout(timeout, client.connect(spec))
        .await
        .map_err(|_| ConnectError::Timeout(timeout))??;
    let home = session.remote_home();
    session.close().await;
    uploader_info!("Connection to {} OK (home {:?})", spec.address(), home);
    Ok(home)
}

/// Blocking form of [`test_connection`] for callers without a runtime.
pub fn test_connection_blocking(
    client: &dyn ProtocolClient,
    spec: &ConnectionSpec,
    timeout: Duration,
) -> Result<Option<String>, EngineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(test_connection(client, spec, timeout));
    runtime.shutdown_background();
    Ok(result?)
}
