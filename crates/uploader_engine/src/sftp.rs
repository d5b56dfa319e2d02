use std::fs::File;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;

use uploader_core::{AuthMode, ConnectionSpec, TransferItem};
use uploader_logging::{uploader_debug, uploader_info};

use crate::{ConnectError, ProtocolClient, ProtocolSession, UploadError};

// libssh2 error codes.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const SSH_FX_PERMISSION_DENIED: i32 = 3;

#[derive(Debug, Clone)]
pub struct SftpSettings {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for SftpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            io_timeout: Duration::from_secs(60),
        }
    }
}

/// SFTP over libssh2. Blocking calls run on tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct SftpClient {
    settings: SftpSettings,
}

impl SftpClient {
    pub fn new(settings: SftpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl ProtocolClient for SftpClient {
    async fn connect(
        &self,
        spec: &ConnectionSpec,
    ) -> Result<Box<dyn ProtocolSession>, ConnectError> {
        let spec = spec.clone();
        let settings = self.settings.clone();
        let session = tokio::task::spawn_blocking(move || open_session(&spec, &settings))
            .await
            .map_err(|err| ConnectError::Protocol(err.to_string()))??;
        Ok(Box::new(session))
    }
}

struct Connection {
    session: ssh2::Session,
    sftp: ssh2::Sftp,
}

pub struct SftpSession {
    connection: Arc<Mutex<Connection>>,
    home: Option<String>,
    io_timeout: Duration,
}

impl SftpSession {
    async fn with_connection<T, F>(&self, op: F) -> Result<T, UploadError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, UploadError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| UploadError::Remote("session lock poisoned".into()))?;
            op(&guard)
        })
        .await
        .map_err(|err| UploadError::Remote(err.to_string()))?
    }
}

#[async_trait::async_trait]
impl ProtocolSession for SftpSession {
    fn remote_home(&self) -> Option<String> {
        self.home.clone()
    }

    async fn upload(&mut self, item: &TransferItem) -> Result<(), UploadError> {
        let remote_path = item.remote_path.clone();
        let item = item.clone();
        let io_timeout = self.io_timeout;
        let bytes = self
            .with_connection(move |connection| put_file(&connection.sftp, &item, io_timeout))
            .await?;
        uploader_debug!("wrote {} bytes to {}", bytes, remote_path);
        Ok(())
    }

    async fn is_alive(&mut self) -> bool {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let alive = match connection.try_lock() {
                Ok(guard) => guard.sftp.stat(Path::new(".")).is_ok(),
                // A transfer still owns the channel: slow, not dead.
                Err(TryLockError::WouldBlock) => true,
                Err(TryLockError::Poisoned(_)) => false,
            };
            alive
        })
        .await
        .unwrap_or(false)
    }

    async fn close(&mut self) {
        let _ = self
            .with_connection(|connection| {
                let _ = connection
                    .session
                    .disconnect(None, "batch upload finished", None);
                Ok(())
            })
            .await;
    }
}

fn open_session(spec: &ConnectionSpec, settings: &SftpSettings) -> Result<SftpSession, ConnectError> {
    let addrs: Vec<SocketAddr> = (spec.host.as_str(), spec.port)
        .to_socket_addrs()
        .map_err(|err| ConnectError::Unreachable(format!("{}: {err}", spec.address())))?
        .collect();
    let tcp = connect_any(&addrs, spec, settings.connect_timeout)?;

    let mut session =
        ssh2::Session::new().map_err(|err| ConnectError::Protocol(err.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(millis(settings.connect_timeout));
    session
        .handshake()
        .map_err(|err| map_connect_error(err, settings.connect_timeout))?;
    authenticate(&session, spec)?;

    session.set_timeout(millis(settings.io_timeout));
    session.set_keepalive(true, 30);
    let sftp = session
        .sftp()
        .map_err(|err| map_connect_error(err, settings.io_timeout))?;
    let home = sftp
        .realpath(Path::new("."))
        .ok()
        .map(|path| path.to_string_lossy().into_owned());
    uploader_info!(
        "SFTP session open on {} (home {:?})",
        spec.address(),
        home
    );

    Ok(SftpSession {
        connection: Arc::new(Mutex::new(Connection { session, sftp })),
        home,
        io_timeout: settings.io_timeout,
    })
}

fn connect_any(
    addrs: &[SocketAddr],
    spec: &ConnectionSpec,
    timeout: Duration,
) -> Result<TcpStream, ConnectError> {
    let mut last_error = ConnectError::Unreachable(format!("{}: no addresses", spec.address()));
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                last_error = ConnectError::Timeout(timeout);
            }
            Err(err) => {
                last_error = ConnectError::Unreachable(format!("{addr}: {err}"));
            }
        }
    }
    Err(last_error)
}

fn authenticate(session: &ssh2::Session, spec: &ConnectionSpec) -> Result<(), ConnectError> {
    let result = match &spec.auth {
        AuthMode::Password { password } => session.userauth_password(&spec.username, password),
        AuthMode::Key {
            key_path,
            passphrase,
        } => {
            if !key_path.is_file() {
                return Err(ConnectError::KeyFile {
                    path: key_path.display().to_string(),
                    message: "file not found".into(),
                });
            }
            session.userauth_pubkey_file(&spec.username, None, key_path, passphrase.as_deref())
        }
    };
    result.map_err(|err| ConnectError::AuthFailed {
        username: spec.username.clone(),
        message: err.message().to_string(),
    })?;
    if !session.authenticated() {
        return Err(ConnectError::AuthFailed {
            username: spec.username.clone(),
            message: "server did not accept credentials".into(),
        });
    }
    Ok(())
}

/// Returns the number of bytes written.
fn put_file(sftp: &ssh2::Sftp, item: &TransferItem, io_timeout: Duration) -> Result<u64, UploadError> {
    let mut local = File::open(&item.local_path).map_err(|err| {
        UploadError::LocalRead(format!("{}: {err}", item.local_path.display()))
    })?;
    let remote = Path::new(&item.remote_path);
    if let Some(parent) = remote.parent() {
        ensure_remote_dir(sftp, parent, io_timeout)?;
    }
    let mut file = sftp
        .create(remote)
        .map_err(|err| map_upload_error(err, io_timeout))?;
    let bytes = io::copy(&mut local, &mut file).map_err(|err| match err.kind() {
        io::ErrorKind::TimedOut => UploadError::Timeout(io_timeout),
        _ => UploadError::Remote(format!("{}: {err}", item.remote_path)),
    })?;
    Ok(bytes)
}

/// `mkdir -p` for the remote side.
fn ensure_remote_dir(sftp: &ssh2::Sftp, dir: &Path, io_timeout: Duration) -> Result<(), UploadError> {
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        if !matches!(component, Component::Normal(_)) {
            continue;
        }
        if sftp.stat(&current).is_ok() {
            continue;
        }
        if let Err(err) = sftp.mkdir(&current, 0o755) {
            // Another writer may have created it in the meantime.
            if sftp.stat(&current).is_err() {
                return Err(map_upload_error(err, io_timeout));
            }
        }
    }
    Ok(())
}

fn map_connect_error(err: ssh2::Error, timeout: Duration) -> ConnectError {
    match err.code() {
        ssh2::ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => ConnectError::Timeout(timeout),
        _ => ConnectError::Protocol(err.message().to_string()),
    }
}

fn map_upload_error(err: ssh2::Error, timeout: Duration) -> UploadError {
    match err.code() {
        ssh2::ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => UploadError::Timeout(timeout),
        ssh2::ErrorCode::SFTP(SSH_FX_PERMISSION_DENIED) => {
            UploadError::PermissionDenied(err.message().to_string())
        }
        _ => UploadError::Remote(err.message().to_string()),
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
