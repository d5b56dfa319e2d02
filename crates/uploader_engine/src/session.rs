use uploader_core::{ConnectionSpec, TransferItem};

use crate::{ConnectError, UploadError};

/// Opens authenticated sessions to the remote server.
#[async_trait::async_trait]
pub trait ProtocolClient: Send + Sync {
    async fn connect(
        &self,
        spec: &ConnectionSpec,
    ) -> Result<Box<dyn ProtocolSession>, ConnectError>;
}

/// One live connection. Owned by a single orchestrator; calls never overlap.
#[async_trait::async_trait]
pub trait ProtocolSession: Send {
    /// Remote working directory right after login, when the server reports one.
    fn remote_home(&self) -> Option<String> {
        None
    }

    /// Writes the item to its remote path, creating missing parent
    /// directories. A re-upload overwrites any partial remote file.
    /// Implementations bound every network operation with their own timeout.
    async fn upload(&mut self, item: &TransferItem) -> Result<(), UploadError>;

    /// Cheap round trip used to tell a slow session from a dead one. A
    /// session still busy with a transfer counts as alive.
    async fn is_alive(&mut self) -> bool;

    async fn close(&mut self);
}
