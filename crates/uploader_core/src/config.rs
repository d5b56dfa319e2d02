use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// How the session authenticates. Resolved once when connecting.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    Password {
        password: String,
    },
    Key {
        key_path: PathBuf,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Password { .. } => f
                .debug_struct("Password")
                .field("password", &"<redacted>")
                .finish(),
            AuthMode::Key {
                key_path,
                passphrase,
            } => f
                .debug_struct("Key")
                .field("key_path", key_path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Fully resolved connection parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMode,
    pub remote_dir: String,
}

impl ConnectionSpec {
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMode) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            auth,
            remote_dir: String::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_remote_dir(mut self, remote_dir: impl Into<String>) -> Self {
        self.remote_dir = remote_dir.into();
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.host.trim().is_empty() {
            return Err(SpecError::MissingHost);
        }
        if self.username.trim().is_empty() {
            return Err(SpecError::MissingUsername);
        }
        if self.port == 0 {
            return Err(SpecError::InvalidPort);
        }
        if let AuthMode::Key { key_path, .. } = &self.auth {
            if key_path.as_os_str().is_empty() {
                return Err(SpecError::MissingKeyPath);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecError {
    MissingHost,
    MissingUsername,
    InvalidPort,
    MissingKeyPath,
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::MissingHost => write!(f, "host is required"),
            SpecError::MissingUsername => write!(f, "username is required"),
            SpecError::InvalidPort => write!(f, "port must be between 1 and 65535"),
            SpecError::MissingKeyPath => write!(f, "key authentication needs a key file"),
        }
    }
}

impl Error for SpecError {}

/// Pacing options for one run. A zero `test_batch_size` disables the
/// checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunConfig {
    pub inter_item_delay_secs: u64,
    pub test_batch_size: usize,
    pub start_delay_minutes: u64,
}

impl RunConfig {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_secs(self.inter_item_delay_secs)
    }

    /// Saturates instead of overflowing for absurdly long delays.
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_minutes.saturating_mul(60))
    }

    pub fn checkpoint_enabled(&self) -> bool {
        self.test_batch_size > 0
    }
}
