mod config;
mod db;
mod engine;
mod error;
mod logging;
mod models;
mod run;
mod store;
mod ui;

use anyhow::{Context, Result};
use std::path::PathBuf;

use config::{AppDirs, Config, DB_ENV_VAR};
use engine::{PlanScope, PlanningSession, SystemClock};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let dirs = AppDirs::discover()?;
    logging::init_tracing(&dirs.log_file())?;

    let config_path = dirs.config_file();
    Config::write_default_if_missing(&config_path)?;
    let config = Config::load(&config_path)?;

    let env_db = std::env::var_os(DB_ENV_VAR).map(PathBuf::from);
    let db_path = config.database_path(&dirs.data_dir, env_db);
    let db = db::Database::open(&db_path)?;
    tracing::info!(db = %db_path.display(), "database opened");

    let mut session = PlanningSession::open(
        db,
        SystemClock,
        config.sync_settings(),
        PlanScope::live(config.start_year()),
    )
    .context("Failed to load budget data")?;

    match args.len() {
        1 => run::as_tui(&mut session),
        2.. => run::as_cli(&args, &mut session),
        _ => {
            eprintln!("Usage: budgetplan [command]");
            Ok(())
        }
    }
}
