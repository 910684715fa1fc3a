//! Playback of finished tracks.
//!
//! A track is only played once it is staged on disk: [`prepare_track`]
//! checks the status, resolves the audio location and downloads it through the
//! background worker. [`play_file`] then hands the file to `rodio` when built
//! with the `audio` feature, or to the system's default player otherwise.

use std::{fmt, path::Path, path::PathBuf};

use crate::{
    suno::{SunoClient, download},
    types::Clip,
};

pub const DEFAULT_VOLUME: u8 = 70;

#[derive(Debug)]
pub enum PlaybackError {
    NotReady { title: String, status: String },
    NoAudio(String),
    Download(String),
    Audio(String),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::NotReady { title, status } => {
                write!(f, "'{}' is not ready yet (status: {})", title, status)
            }
            PlaybackError::NoAudio(id) => write!(f, "No audio URL found for clip {}", id),
            PlaybackError::Download(e) => write!(f, "Download error: {}", e),
            PlaybackError::Audio(e) => write!(f, "Playback error: {}", e),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Rejects anything but a finished track. Makes no request.
pub fn ensure_ready(clip: &Clip) -> Result<(), PlaybackError> {
    if clip.is_ready() {
        return Ok(());
    }
    Err(PlaybackError::NotReady {
        title: clip.title.clone(),
        status: clip.status.to_string(),
    })
}

/// Audio location of `clip`, fetched from the clip detail endpoint.
pub async fn resolve_audio_url(client: &SunoClient, clip: &Clip) -> Result<String, PlaybackError> {
    ensure_ready(clip)?;

    client
        .clip(&clip.id)
        .await
        .and_then(|detail| detail.audio_url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| PlaybackError::NoAudio(clip.id.clone()))
}

/// Downloads the audio of `clip` to `target`, reporting percentages to `on_progress`.
pub async fn prepare_track(
    client: &SunoClient,
    clip: &Clip,
    target: PathBuf,
    on_progress: impl FnMut(u8),
) -> Result<PathBuf, PlaybackError> {
    let url = resolve_audio_url(client, clip).await?;
    let http = download::client().map_err(|e| PlaybackError::Download(e.to_string()))?;

    download::spawn(http, url, target)
        .wait(on_progress)
        .await
        .map_err(PlaybackError::Download)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    TogglePause,
    Stop,
    VolumeUp,
    VolumeDown,
    Volume(u8),
}

pub fn parse_transport(line: &str) -> Option<TransportCommand> {
    match line.trim() {
        "p" | "pause" | "" => Some(TransportCommand::TogglePause),
        "s" | "stop" | "q" | "quit" => Some(TransportCommand::Stop),
        "+" => Some(TransportCommand::VolumeUp),
        "-" => Some(TransportCommand::VolumeDown),
        other => other
            .parse::<u8>()
            .ok()
            .filter(|v| *v <= 100)
            .map(TransportCommand::Volume),
    }
}

pub fn apply_volume_step(volume: u8, command: TransportCommand) -> u8 {
    match command {
        TransportCommand::VolumeUp => volume.saturating_add(10).min(100),
        TransportCommand::VolumeDown => volume.saturating_sub(10),
        TransportCommand::Volume(v) => v.min(100),
        _ => volume,
    }
}

#[cfg(feature = "audio")]
pub async fn play_file(path: &Path, volume: u8) -> Result<(), PlaybackError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || rodio_backend::play_blocking(&path, volume))
        .await
        .map_err(|e| PlaybackError::Audio(e.to_string()))?
}

/// Without the `audio` feature the file is handed to the desktop's default player.
#[cfg(not(feature = "audio"))]
pub async fn play_file(path: &Path, _volume: u8) -> Result<(), PlaybackError> {
    let target = path.to_string_lossy().to_string();
    webbrowser::open(&target).map_err(|e| PlaybackError::Audio(e.to_string()))
}

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::{
        fs::File,
        io::{self, BufRead, BufReader},
        path::Path,
        sync::mpsc::{self, RecvTimeoutError},
        thread,
        time::Duration,
    };

    use rodio::{Decoder, OutputStreamBuilder, Sink};

    use super::{PlaybackError, TransportCommand, apply_volume_step, parse_transport};
    use crate::info;

    pub(super) fn play_blocking(path: &Path, volume: u8) -> Result<(), PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::Audio(e.to_string()))?;
        stream.log_on_drop(false);

        let file = File::open(path).map_err(|e| PlaybackError::Audio(e.to_string()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Audio(e.to_string()))?;

        let sink = Sink::connect_new(stream.mixer());
        let mut volume = volume.min(100);
        sink.set_volume(volume as f32 / 100.0);
        sink.append(source);

        info!("Controls: p = pause/resume, s = stop, +/- = volume, 0-100 = set volume");

        // stdin is read on its own thread so the sink can be polled for the end of the track
        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        while !sink.empty() {
            let line = match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => continue,
                // stdin closed, nothing can control playback anymore
                Err(RecvTimeoutError::Disconnected) => {
                    sink.sleep_until_end();
                    break;
                }
            };

            match parse_transport(&line) {
                Some(TransportCommand::TogglePause) => {
                    if sink.is_paused() {
                        sink.play();
                        info!("Playing");
                    } else {
                        sink.pause();
                        info!("Paused");
                    }
                }
                Some(TransportCommand::Stop) => {
                    sink.stop();
                    break;
                }
                Some(cmd) => {
                    volume = apply_volume_step(volume, cmd);
                    sink.set_volume(volume as f32 / 100.0);
                    info!("Volume {}", volume);
                }
                None => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClipStatus;

    #[test]
    fn test_parse_transport() {
        assert_eq!(parse_transport("p"), Some(TransportCommand::TogglePause));
        assert_eq!(parse_transport(" stop "), Some(TransportCommand::Stop));
        assert_eq!(parse_transport("+"), Some(TransportCommand::VolumeUp));
        assert_eq!(parse_transport("55"), Some(TransportCommand::Volume(55)));
        assert_eq!(parse_transport("101"), None);
        assert_eq!(parse_transport("hello"), None);
    }

    #[test]
    fn test_apply_volume_step_clamps() {
        assert_eq!(apply_volume_step(95, TransportCommand::VolumeUp), 100);
        assert_eq!(apply_volume_step(5, TransportCommand::VolumeDown), 0);
        assert_eq!(apply_volume_step(70, TransportCommand::Volume(20)), 20);
        assert_eq!(apply_volume_step(70, TransportCommand::Stop), 70);
    }

    #[test]
    fn test_ensure_ready() {
        let mut clip = Clip {
            id: "c1".to_string(),
            title: "Song".to_string(),
            status: ClipStatus::Queued,
            created_at: String::new(),
            duration: None,
            audio_url: None,
        };
        assert!(matches!(
            ensure_ready(&clip),
            Err(PlaybackError::NotReady { .. })
        ));

        clip.status = ClipStatus::Success;
        assert!(ensure_ready(&clip).is_ok());
    }
}
