use anyhow::Result;
use clap::{value_parser, Arg, Command};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc, time::Duration};

use viewport_ruler::{
    init_logging, ScrollPosition, SettingsStore, TerminalHost, ViewportRect, ViewportRuler,
    ViewportSize,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeometryReport {
    size: ViewportSize,
    rect: ViewportRect,
    scroll: ScrollPosition,
}

fn report(ruler: &ViewportRuler) -> Result<()> {
    let report = GeometryReport {
        size: ruler.viewport_size(),
        rect: ruler.viewport_rect(),
        scroll: ruler.viewport_scroll_position(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("viewport-watch")
        .about("Prints the terminal viewport as JSON whenever it is resized")
        .arg(
            Arg::new("debounce")
                .long("debounce")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Debounce window in milliseconds"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .help("Settings file (defaults to $VIEWPORT_RULER_SETTINGS or ./viewport-ruler.json)"),
        )
        .get_matches();

    let store = match matches.get_one::<String>("settings") {
        Some(path) => SettingsStore::new(PathBuf::from(path))?,
        None => SettingsStore::from_env()?,
    };
    let debounce = matches
        .get_one::<u64>("debounce")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or_else(|| store.watch().debounce());

    let host = Arc::new(TerminalHost::spawn()?);
    let ruler = ViewportRuler::new(Arc::clone(&host));
    report(&ruler)?;

    let mut changes = ruler.change(debounce).subscribe()?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            next = changes.next() => match next {
                Some(_) => report(&ruler)?,
                None => break,
            },
            _ = &mut shutdown => {
                log::info!("interrupted, shutting down");
                break;
            }
        }
    }

    changes.unsubscribe();
    host.shutdown();
    Ok(())
}
