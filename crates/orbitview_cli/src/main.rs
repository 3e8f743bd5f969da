//! `orbitview`: terminal client for the OrbitView preset store.
//!
//! Every invocation loads the local snapshot, runs one client operation and
//! exits; the snapshot file carries state between invocations.

mod console;
mod scene_args;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use console::{format_preset_row, ConsoleNotifier};
use log::info;
use orbitview_core::config::{LoggingConfig, ENV_CONFIG};
use orbitview_core::{
    apply_preset, init_stderr_logging, ClientPreset, FileSnapshotStore, HttpPresetRemote,
    LocalId, OrbitViewConfig, PresetSync, SceneState, EXPORT_FILE_NAME,
};
use scene_args::SceneArgs;
use std::path::PathBuf;

type CliSync = PresetSync<HttpPresetRemote, FileSnapshotStore, ConsoleNotifier>;

#[derive(Parser)]
#[command(name = "orbitview")]
#[command(author, version, about = "OrbitView camera preset client", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Current user id; saving and syncing require one
    #[arg(long, global = true, env = "ORBITVIEW_USER")]
    user: Option<String>,

    /// Log level for stderr output; defaults to `logging.level` from config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a view and save it to the store
    Save {
        /// Preset label; defaults to "Preset N"
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        scene: SceneArgs,
    },

    /// List presets in the local snapshot
    List,

    /// Replace local presets with the store's list for the current user
    Sync,

    /// Delete a preset by local id prefix or store id
    Delete { id: String },

    /// Write all presets to a JSON file ("-" for stdout)
    Export {
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },

    /// Add presets from an exported JSON file
    Import { file: PathBuf },

    /// Print the camera view a preset would apply
    Apply { id: String },

    /// Remove every local preset and the snapshot file
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        OrbitViewConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let logging = if config.logging.log_dir.is_some() {
        config.logging.init()
    } else {
        init_stderr_logging(stderr_log_level(cli.log_level.as_deref(), &config.logging))
    };
    logging.map_err(|err| anyhow!("failed to initialize logging: {err}"))?;

    let mut sync = open_sync(&config, cli.user)?;
    let command = cli.command.name();

    match cli.command {
        Commands::Save { name, scene } => {
            let scene = scene.into_scene()?;
            let saved = sync.save(name.as_deref(), &scene)?;
            println!("{}", format_preset_row(&saved));
        }
        Commands::List => {
            if sync.presets().is_empty() {
                println!("(no presets)");
            }
            for preset in sync.presets() {
                println!("{}", format_preset_row(preset));
            }
        }
        Commands::Sync => {
            let count = sync.reconcile()?;
            println!("{count} preset(s)");
        }
        Commands::Delete { id } => {
            let local_id = resolve_preset(sync.presets(), &id)?;
            sync.delete(local_id)?;
        }
        Commands::Export { out } => {
            let document = sync.export()?;
            if out.as_os_str() == "-" {
                println!("{document}");
            } else {
                std::fs::write(&out, document)
                    .with_context(|| format!("failed to write `{}`", out.display()))?;
                println!(
                    "Exported {} preset(s) to {}",
                    sync.presets().len(),
                    out.display()
                );
            }
        }
        Commands::Import { file } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let added = sync.import(&document)?;
            println!("{added} preset(s) added");
        }
        Commands::Apply { id } => {
            let local_id = resolve_preset(sync.presets(), &id)?;
            let preset = sync
                .find(local_id)
                .ok_or_else(|| anyhow!("preset `{id}` disappeared"))?;
            let mut scene = SceneState::default();
            apply_preset(preset, &mut scene);
            println!("{}", serde_json::to_string_pretty(&scene.view)?);
        }
        Commands::Clear => {
            sync.clear()?;
            println!("Local presets cleared");
        }
    }

    info!(
        "event=cli_command module=cli status=ok command={} count={}",
        command,
        sync.presets().len()
    );
    Ok(())
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::List => "list",
            Self::Sync => "sync",
            Self::Delete { .. } => "delete",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Apply { .. } => "apply",
            Self::Clear => "clear",
        }
    }
}

/// An explicit `--log-level` wins over the configured (or env-overridden) level.
fn stderr_log_level<'a>(flag: Option<&'a str>, logging: &'a LoggingConfig) -> &'a str {
    flag.unwrap_or(logging.level.as_str())
}

fn open_sync(config: &OrbitViewConfig, user: Option<String>) -> Result<CliSync> {
    let remote = HttpPresetRemote::new(config.client.base_url(), config.client.request_timeout());
    let snapshot = FileSnapshotStore::new(config.client.resolve_snapshot_path()?);

    let mut sync = PresetSync::new(remote, snapshot, ConsoleNotifier);
    sync.set_user(user);
    sync.load();
    Ok(sync)
}

/// Finds the one preset whose local id starts with `query` or whose store id equals it.
fn resolve_preset(presets: &[ClientPreset], query: &str) -> Result<LocalId> {
    let query = query.trim();
    if query.is_empty() {
        bail!("preset id cannot be empty");
    }

    let mut matches = presets.iter().filter(|preset| {
        preset.store_id() == Some(query) || preset.local_id().to_string().starts_with(query)
    });
    match (matches.next(), matches.next()) {
        (Some(preset), None) => Ok(preset.local_id()),
        (Some(_), Some(_)) => bail!("preset id `{query}` is ambiguous; use more characters"),
        (None, _) => bail!("no preset matches `{query}`"),
    }
}
