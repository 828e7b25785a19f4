//! Example submitting a download and polling its status until it terminates.
//!
//! ```text
//! RUST_LOG=persevere=debug cargo run --example submit_and_poll -- <url> [name]
//! ```

use color_eyre::eyre::eyre;
use color_eyre::Result;
use persevere::download::State;
use persevere::downloader::DownloaderBuilder;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "https://httpbin.org/bytes/262144".to_string());
    let name = args.next().unwrap_or_else(|| "payload.bin".to_string());

    let downloader = DownloaderBuilder::visible()
        .directory(PathBuf::from("downloads"))
        .on_complete(|summary| {
            println!(
                "{} terminated after {} attempt(s): {:?}",
                summary.id(),
                summary.attempts(),
                summary.status()
            );
        })
        .build()?;

    let id = downloader.submit(&name, &url)?;
    let status = loop {
        let status = downloader.status(&id).await;
        if status.state != State::Running {
            break status;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    };

    match status.state {
        State::Successful => {
            println!("Saved to {:?}", downloader.directory().join(id.as_str()));
            Ok(())
        }
        state => Err(eyre!("{} ended as {}", id, state)),
    }
}
