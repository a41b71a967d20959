//! ATM inventory server.
//!
//! # Usage
//!
//! ```bash
//! ATM_DB_PATH=/var/lib/atm/cash.db cargo run -p atm_server
//! ```
//!
//! See `config` for the full list of environment variables.

use atm_core::db::open_db;
use atm_core::init_logging;
use atm_server::{router, AppState, ServerConfig};
use log::info;
use std::error::Error;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    let log_dir = config.log_dir.to_string_lossy().into_owned();
    init_logging(&config.log_level, &log_dir)?;

    let conn = open_db(&config.db_path)?;
    info!(
        "event=server_start module=server status=start bind_addr={} db_path={}",
        config.bind_addr,
        config.db_path.display()
    );

    let app = router(AppState::new(conn));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=server status=ok bind_addr={}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
