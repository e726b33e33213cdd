use anyhow::{Context, Result};

use deckpress_lib::server;

use crate::app::App;

pub fn run(app: App, bind: Option<String>) -> Result<()> {
    let mut config = app.config;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let bind = config.server.bind.clone();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(server::serve(config))
        .with_context(|| format!("Server on {} failed", bind))
}
