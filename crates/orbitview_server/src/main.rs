use anyhow::{anyhow, Context, Result};
use log::info;
use orbitview_core::config::ENV_CONFIG;
use orbitview_core::db::open_db;
use orbitview_core::{OrbitViewConfig, PresetService, SqlitePresetRepository};
use orbitview_server::serve_requests;
use std::path::PathBuf;
use tiny_http::Server;

fn main() -> Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(ENV_CONFIG))
        .map(PathBuf::from);
    let config =
        OrbitViewConfig::load(config_path.as_deref()).context("failed to load configuration")?;

    config
        .logging
        .init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;

    let conn = open_db(&config.server.db_path).with_context(|| {
        format!(
            "failed to open preset database `{}`",
            config.server.db_path.display()
        )
    })?;
    let repo = SqlitePresetRepository::try_new(&conn).context("preset database is not ready")?;
    let service = PresetService::new(repo);

    let server = Server::http(config.server.bind.as_str())
        .map_err(|err| anyhow!("failed to bind `{}`: {err}", config.server.bind))?;
    info!(
        "event=server_start module=server status=ok bind={} db_path={}",
        config.server.bind,
        config.server.db_path.display()
    );

    serve_requests(&server, &service);
    Ok(())
}
