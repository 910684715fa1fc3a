//! Background download worker.
//!
//! [`spawn`] moves a single download onto its own tokio task so the caller
//! stays responsive. The task reports back through three kinds of
//! [`DownloadEvent`] and shares nothing else with the caller.

use std::{path::PathBuf, time::Duration};

use reqwest::Client;
use tokio::{
    fs::File,
    io::AsyncWriteExt,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::utils;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Integer percentage, only sent when the size is known and the value changed.
    Progress(u8),
    Finished(PathBuf),
    Failed(String),
}

pub struct DownloadHandle {
    events: UnboundedReceiver<DownloadEvent>,
}

impl DownloadHandle {
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Drains events until the download finishes or fails.
    pub async fn wait(mut self, mut on_progress: impl FnMut(u8)) -> Result<PathBuf, String> {
        while let Some(event) = self.next_event().await {
            match event {
                DownloadEvent::Progress(p) => on_progress(p),
                DownloadEvent::Finished(path) => return Ok(path),
                DownloadEvent::Failed(e) => return Err(e),
            }
        }
        Err("download worker stopped without reporting".to_string())
    }
}

/// HTTP client for audio downloads: no overall timeout, only a connect timeout.
pub fn client() -> Result<Client, reqwest::Error> {
    Client::builder().connect_timeout(CONNECT_TIMEOUT).build()
}

pub fn spawn(http: Client, url: String, output: PathBuf) -> DownloadHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let event = match fetch_to_file(&http, &url, &output, &tx).await {
            Ok(()) => DownloadEvent::Finished(output),
            Err(e) => DownloadEvent::Failed(e),
        };
        // receiver may be gone, nothing left to report to
        let _ = tx.send(event);
    });

    DownloadHandle { events: rx }
}

async fn fetch_to_file(
    http: &Client,
    url: &str,
    output: &PathBuf,
    tx: &UnboundedSender<DownloadEvent>,
) -> Result<(), String> {
    let mut response = http.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("server answered {}", status));
    }

    let total = response.content_length().unwrap_or(0);

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }
    let mut file = File::create(output).await.map_err(|e| e.to_string())?;

    let mut downloaded: u64 = 0;
    let mut last_percent: Option<u8> = None;
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        file.write_all(&chunk).await.map_err(|e| e.to_string())?;
        downloaded += chunk.len() as u64;

        if total > 0 {
            let p = utils::percent(downloaded, total);
            if last_percent != Some(p) {
                let _ = tx.send(DownloadEvent::Progress(p));
                last_percent = Some(p);
            }
        }
    }

    file.flush().await.map_err(|e| e.to_string())?;
    Ok(())
}
