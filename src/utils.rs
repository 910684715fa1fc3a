use std::{cmp::Ordering, path::Path, path::PathBuf};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;

use crate::types::{Clip, ClipTableRow};

/// Decodes the claims segment of a JWT without verifying its signature.
pub fn decode_jwt_claims(token: &str) -> Result<Value, String> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => return Err("token is not a JWT".to_string()),
    };

    // some issuers keep the padding, the URL-safe engine must not see it
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| format!("invalid JWT payload: {}", e))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid JWT claims: {}", e))?;

    if claims.is_object() {
        Ok(claims)
    } else {
        Err("JWT claims are not an object".to_string())
    }
}

/// Strips a leading `Bearer ` from a pasted token.
pub fn strip_bearer_prefix(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
        .unwrap_or(raw)
}

/// Keeps alphanumerics, spaces, dashes and underscores, then trims trailing whitespace.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Target file for downloading `clip` into `dir`.
///
/// Falls back to the clip id when nothing of the title survives sanitizing.
pub fn download_path(dir: &Path, clip: &Clip) -> PathBuf {
    let mut name = sanitize_filename(&clip.title);
    if name.is_empty() {
        name = sanitize_filename(&clip.id);
    }
    dir.join(format!("{}.mp3", name))
}

/// Date part of an ISO-8601 timestamp.
pub fn format_created(created_at: &str) -> String {
    created_at.split('T').next().unwrap_or_default().to_string()
}

pub fn format_duration(duration: Option<f64>) -> String {
    match duration {
        Some(d) if d > 0.0 => {
            if d.fract() == 0.0 {
                format!("{}s", d as u64)
            } else {
                format!("{:.1}s", d)
            }
        }
        _ => "N/A".to_string(),
    }
}

pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done.min(total) * 100) / total) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSort {
    #[default]
    Index,
    Title,
    Status,
    Created,
    Duration,
}

pub fn parse_clip_sort(s: &str) -> Result<ClipSort, String> {
    match s.to_lowercase().as_str() {
        "index" | "#" => Ok(ClipSort::Index),
        "title" => Ok(ClipSort::Title),
        "status" => Ok(ClipSort::Status),
        "created" | "date" => Ok(ClipSort::Created),
        "duration" => Ok(ClipSort::Duration),
        other => Err(format!(
            "unknown sort column '{}': use index, title, status, created or duration",
            other
        )),
    }
}

pub fn parse_volume(s: &str) -> Result<u8, String> {
    let v: u8 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number between 0 and 100", s))?;
    if v > 100 {
        return Err(format!("volume {} is above 100", v));
    }
    Ok(v)
}

/// Builds table rows for `clips`, keeping the listing position as the `#` column.
pub fn clip_table_rows(clips: &[Clip], sort: ClipSort) -> Vec<ClipTableRow> {
    let mut indexed: Vec<(usize, &Clip)> =
        clips.iter().enumerate().map(|(i, c)| (i + 1, c)).collect();
    sort_indexed_clips(&mut indexed, sort);

    indexed
        .into_iter()
        .map(|(index, clip)| ClipTableRow {
            index,
            title: if clip.title.is_empty() {
                "N/A".to_string()
            } else {
                clip.title.clone()
            },
            status: clip.status.to_string(),
            created: format_created(&clip.created_at),
            duration: format_duration(clip.duration),
        })
        .collect()
}

fn sort_indexed_clips(clips: &mut Vec<(usize, &Clip)>, sort: ClipSort) {
    clips.sort_by(|(ia, a), (ib, b)| {
        let primary = match sort {
            ClipSort::Index => Ordering::Equal,
            ClipSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            ClipSort::Status => a.status.to_string().cmp(&b.status.to_string()),
            // newest first, like the web app
            ClipSort::Created => b.created_at.cmp(&a.created_at),
            ClipSort::Duration => a
                .duration
                .unwrap_or(0.0)
                .partial_cmp(&b.duration.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        };
        primary.then(ia.cmp(ib))
    });
}

/// Picks the clip shown at 1-based row `index` of a listing.
pub fn select_clip(clips: &[Clip], index: usize) -> Result<&Clip, String> {
    if clips.is_empty() {
        return Err("This workspace has no tracks".to_string());
    }
    index
        .checked_sub(1)
        .and_then(|i| clips.get(i))
        .ok_or_else(|| format!("Track #{} does not exist (1-{})", index, clips.len()))
}
