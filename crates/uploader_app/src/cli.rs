use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Batch-upload files to an SFTP server, one at a time, with pacing.
#[derive(Parser)]
#[command(name = "sftp-batch", version, about, long_about = None)]
pub struct Cli {
    /// Append diagnostics to this log file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Mirror debug diagnostics to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload files or folders to the remote directory.
    Upload(UploadArgs),
    /// Connect once and report the remote home directory.
    Test(ConnectionArgs),
    /// Manage saved connection presets.
    #[command(subcommand)]
    Preset(PresetCommand),
}

#[derive(Args, Clone, Default)]
pub struct ConnectionArgs {
    /// Preset to start from. Without one, the default preset is used when
    /// no --host is given.
    #[arg(long)]
    pub preset: Option<String>,

    /// Preset store location.
    #[arg(long, default_value = "sftp_presets.ron")]
    pub presets_file: PathBuf,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, short)]
    pub user: Option<String>,

    #[arg(long, env = "SFTP_BATCH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Private key file; switches to key authentication.
    #[arg(long)]
    pub key: Option<PathBuf>,

    #[arg(long, env = "SFTP_BATCH_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Remote directory; created when missing.
    #[arg(long)]
    pub remote_dir: Option<String>,
}

#[derive(Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Seconds to wait between files.
    #[arg(long, default_value_t = 0)]
    pub delay: u64,

    /// Pause for confirmation after this many files (0 disables).
    #[arg(long, default_value_t = 0)]
    pub test_batch: usize,

    /// Minutes to wait before connecting.
    #[arg(long, default_value_t = 0)]
    pub start_delay: u64,

    /// Skip the confirmation for start delays over 30 minutes.
    #[arg(long)]
    pub yes: bool,

    /// File extensions picked up from folders.
    #[arg(long = "ext", default_values_t = vec!["csv".to_string()])]
    pub extensions: Vec<String>,

    /// Print events as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,

    /// Files and folders to upload, in order.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum PresetCommand {
    /// Save the given connection settings under a name.
    Save {
        name: String,
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Store the password in the preset file (plain text).
        #[arg(long)]
        store_password: bool,
    },
    /// List saved presets.
    List {
        #[arg(long, default_value = "sftp_presets.ron")]
        presets_file: PathBuf,
    },
    /// Delete a preset.
    Delete {
        name: String,
        #[arg(long, default_value = "sftp_presets.ron")]
        presets_file: PathBuf,
    },
    /// Make a preset the default.
    Default {
        name: String,
        #[arg(long, default_value = "sftp_presets.ron")]
        presets_file: PathBuf,
    },
}
