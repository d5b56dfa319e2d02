use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use uploader_core::{AuthMode, ConnectionSpec, Phase, RunConfig, SpecError, TransferQueue};
use uploader_engine::{
    test_connection_blocking, EngineSettings, SftpClient, SftpSettings, UploadHandle,
    LONG_START_DELAY_MINUTES,
};
use uploader_logging::uploader_info;

use crate::cli::{ConnectionArgs, PresetCommand, UploadArgs};
use crate::console;
use crate::exit_codes::exit;
use crate::files::collect_files;
use crate::presets::{Preset, PresetAuth, PresetStore};

/// Builds the connection for a run: preset values first (the named preset,
/// or the default one when no host is given), then command-line overrides.
pub fn resolve_connection(args: &ConnectionArgs, store: &PresetStore) -> Result<ConnectionSpec> {
    let base: Option<&Preset> = match &args.preset {
        Some(name) => Some(
            store
                .get(name)
                .with_context(|| format!("no preset named {name:?}"))?,
        ),
        None if args.host.is_none() => store.default_preset().map(|(_, preset)| preset),
        None => None,
    };

    let host = args
        .host
        .clone()
        .or_else(|| base.map(|p| p.host.clone()))
        .context("no host given and no default preset")?;
    let username = args
        .user
        .clone()
        .or_else(|| base.map(|p| p.username.clone()))
        .context("no username given")?;
    let port = args
        .port
        .or_else(|| base.map(|p| p.port))
        .unwrap_or(uploader_core::DEFAULT_SSH_PORT);
    let remote_dir = args
        .remote_dir
        .clone()
        .or_else(|| base.map(|p| p.remote_dir.clone()))
        .unwrap_or_default();

    let key_path = args.key.clone().or_else(|| match base {
        Some(p) if p.auth == PresetAuth::Key => p.key_path.clone(),
        _ => None,
    });
    let key_wanted = args.key.is_some()
        || (args.password.is_none() && base.map(|p| p.auth) == Some(PresetAuth::Key));

    let auth = if key_wanted {
        let key_path = key_path.context("key authentication needs --key")?;
        AuthMode::Key {
            key_path,
            passphrase: args.passphrase.clone().filter(|p| !p.is_empty()),
        }
    } else {
        let password = args
            .password
            .clone()
            .or_else(|| base.and_then(|p| p.password.clone()))
            .context("no password given (use --password or SFTP_BATCH_PASSWORD)")?;
        AuthMode::Password { password }
    };

    let spec = ConnectionSpec::new(host.trim(), username.trim(), auth)
        .with_port(port)
        .with_remote_dir(remote_dir.trim());
    spec.validate()?;
    Ok(spec)
}

pub fn upload(args: UploadArgs) -> Result<i32> {
    let store = PresetStore::load(&args.connection.presets_file);
    let spec = resolve_connection(&args.connection, &store)?;

    let files = collect_files(&args.paths, &args.extensions)?;
    if files.is_empty() {
        bail!("no files to upload");
    }

    if args.start_delay > LONG_START_DELAY_MINUTES && !args.yes {
        let hours = args.start_delay as f64 / 60.0;
        let question = format!(
            "Start delay is {} minutes ({hours:.1} h). Continue?",
            args.start_delay
        );
        if !console::confirm(&question) {
            println!("Not started.");
            return Ok(exit::CANCELLED);
        }
    }

    let queue = TransferQueue::from_paths(files, &spec.remote_dir);
    let total = queue.len();
    let config = RunConfig {
        inter_item_delay_secs: args.delay,
        test_batch_size: args.test_batch,
        start_delay_minutes: args.start_delay,
    };
    let settings = EngineSettings::default();
    let client = Arc::new(SftpClient::new(SftpSettings {
        connect_timeout: settings.connect_timeout,
        ..SftpSettings::default()
    }));

    let handle = UploadHandle::start(client, spec, queue, config, settings)?;
    let report = console::follow_run(handle, total, args.json)?;
    uploader_info!("Run ended in phase {}: {}", report.phase, report.summary);

    Ok(exit_code_for(report.phase))
}

pub fn exit_code_for(phase: Phase) -> i32 {
    match phase {
        Phase::Completed => exit::SUCCESS,
        Phase::Cancelled => exit::CANCELLED,
        _ => exit::RUN_FAILED,
    }
}

pub fn test_connection(args: ConnectionArgs) -> Result<i32> {
    let store = PresetStore::load(&args.presets_file);
    let spec = resolve_connection(&args, &store)?;
    let settings = EngineSettings::default();
    let client = SftpClient::new(SftpSettings {
        connect_timeout: settings.connect_timeout,
        io_timeout: settings.liveness_timeout,
    });

    println!("Connecting to {} as {}...", spec.address(), spec.username);
    match test_connection_blocking(&client, &spec, connect_budget(&settings)) {
        Ok(home) => {
            let home = home.unwrap_or_else(|| "(unknown)".to_string());
            println!("Connection OK. Remote home: {home}");
            Ok(exit::SUCCESS)
        }
        Err(err) => {
            println!("Connection failed: {err}");
            Ok(exit::RUN_FAILED)
        }
    }
}

fn connect_budget(settings: &EngineSettings) -> Duration {
    settings.connect_timeout + settings.liveness_timeout
}

pub fn preset(command: PresetCommand) -> Result<i32> {
    match command {
        PresetCommand::Save {
            name,
            connection,
            store_password,
        } => {
            let path = connection.presets_file.clone();
            let mut store = PresetStore::load(&path);
            let preset = preset_from_args(&connection, &store, store_password)?;
            store.upsert(&name, preset)?;
            save(&store, &path)?;
            println!("Saved preset {name:?}.");
        }
        PresetCommand::List { presets_file } => {
            let store = PresetStore::load(&presets_file);
            if store.presets.is_empty() {
                println!("No presets in {}.", presets_file.display());
            }
            for (name, preset) in &store.presets {
                let marker = if store.default.as_deref() == Some(name.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {name}: {}", preset.describe());
            }
        }
        PresetCommand::Delete { name, presets_file } => {
            let mut store = PresetStore::load(&presets_file);
            store.remove(&name)?;
            save(&store, &presets_file)?;
            println!("Deleted preset {name:?}.");
        }
        PresetCommand::Default { name, presets_file } => {
            let mut store = PresetStore::load(&presets_file);
            store.set_default(&name)?;
            save(&store, &presets_file)?;
            println!("Default preset is now {name:?}.");
        }
    }
    Ok(exit::SUCCESS)
}

/// Builds a preset from command-line values layered over `--preset`.
/// Unlike a run, no password is required.
pub fn preset_from_args(
    args: &ConnectionArgs,
    store: &PresetStore,
    keep_password: bool,
) -> Result<Preset> {
    let base = match &args.preset {
        Some(name) => Some(
            store
                .get(name)
                .with_context(|| format!("no preset named {name:?}"))?,
        ),
        None => None,
    };

    let host = args
        .host
        .clone()
        .or_else(|| base.map(|p| p.host.clone()))
        .context("--host is required")?;
    let username = args
        .user
        .clone()
        .or_else(|| base.map(|p| p.username.clone()))
        .context("--user is required")?;
    let port = args
        .port
        .or_else(|| base.map(|p| p.port))
        .unwrap_or(uploader_core::DEFAULT_SSH_PORT);
    let remote_dir = args
        .remote_dir
        .clone()
        .or_else(|| base.map(|p| p.remote_dir.clone()))
        .unwrap_or_default();

    let auth = if args.key.is_some() {
        PresetAuth::Key
    } else if args.password.is_some() {
        PresetAuth::Password
    } else {
        base.map(|p| p.auth).unwrap_or_default()
    };

    let preset = match auth {
        PresetAuth::Key => Preset {
            host: host.trim().to_string(),
            port,
            username: username.trim().to_string(),
            auth,
            password: None,
            key_path: Some(
                args.key
                    .clone()
                    .or_else(|| base.and_then(|p| p.key_path.clone()))
                    .context("key authentication needs --key")?,
            ),
            remote_dir: remote_dir.trim().to_string(),
        },
        PresetAuth::Password => Preset {
            host: host.trim().to_string(),
            port,
            username: username.trim().to_string(),
            auth,
            password: if keep_password {
                args.password
                    .clone()
                    .or_else(|| base.and_then(|p| p.password.clone()))
            } else {
                None
            },
            key_path: None,
            remote_dir: remote_dir.trim().to_string(),
        },
    };

    if preset.host.is_empty() {
        return Err(SpecError::MissingHost.into());
    }
    if preset.username.is_empty() {
        return Err(SpecError::MissingUsername.into());
    }
    if preset.port == 0 {
        return Err(SpecError::InvalidPort.into());
    }
    if preset
        .key_path
        .as_ref()
        .is_some_and(|path| path.as_os_str().is_empty())
    {
        return Err(SpecError::MissingKeyPath.into());
    }
    Ok(preset)
}

fn save(store: &PresetStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("failed to write presets to {}", path.display()))
}
