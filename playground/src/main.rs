use std::sync::Arc;

use navi_common::config::{config_source, CONFIG};
use navi_common::macros::set_error_sink;
use navi_common::{ok_or_break, tracing_init};
use navi_core::gateway_handler::spawn_handle_message;
use navi_core::settings::{CachedSettings, MemorySettings};
use navi_core::{Navi, ThreadSafeNavi};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, trace};

use crate::console::ConsoleClient;
use crate::silenced::{Silenced, SilencedUsers};

mod commands;
mod console;
mod silenced;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_init(&CONFIG.logging.filter);
    info!("Initialising ({})", config_source());

    set_error_sink(Box::new(|message| eprintln!("[reported] {message}")));

    let client = Arc::new(ConsoleClient::new());
    let settings = Arc::new(CachedSettings::new(MemorySettings::new()));
    let mut navi = Navi::new(CONFIG.clone(), client.clone(), settings)?;

    let silenced = SilencedUsers::default();
    navi.register_middleware(Silenced(silenced.clone()));
    commands::register_all(&mut navi, silenced)?;

    let navi: ThreadSafeNavi = Arc::new(navi);
    info!("Reading messages from stdin, as `name: message` or `dm name: message`");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = ok_or_break!(lines.next_line().await) else {
            break;
        };
        trace!("got line: {line}");

        match client.parse_line(&line) {
            Some(message) => {
                spawn_handle_message(navi.clone(), message);
            },
            None if line.trim().is_empty() => {},
            None => eprintln!("expected `name: message`"),
        }
    }

    info!(
        "stdin closed, {} commands in the last minute",
        navi.metrics_handler.get_commands_rate()
    );
    Ok(())
}
