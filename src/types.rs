use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tabled::Tabled;

use crate::utils;

/// Tokens shorter than this are rejected without further checks.
pub const MIN_TOKEN_LENGTH: usize = 100;

/// Bearer token used to authenticate against the Suno studio API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Longer than [`MIN_TOKEN_LENGTH`]. A token of exactly that length is rejected.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() > MIN_TOKEN_LENGTH
    }

    /// Expiry embedded in the token's `exp` claim.
    ///
    /// The signature is not verified. Returns `Err` when the token is not a
    /// decodable JWT and `Ok(None)` when it carries no `exp` claim.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, String> {
        let claims = utils::decode_jwt_claims(&self.0)?;
        match claims.get("exp").and_then(|exp| exp.as_f64()) {
            Some(exp) => Utc
                .timestamp_opt(exp as i64, 0)
                .single()
                .map(Some)
                .ok_or_else(|| format!("exp claim out of range: {}", exp)),
            None => Ok(None),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Result<bool, String> {
        Ok(self.expires_at()?.is_some_and(|exp| exp < now))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "Credential({}…, {} chars)", prefix, self.0.len())
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// On-disk record of the cached token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clip_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspacesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Workspace>,
}

#[derive(Tabled)]
pub struct WorkspaceTableRow {
    #[tabled(rename = "#")]
    pub index: usize,
    pub id: String,
    pub name: String,
    pub clips: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClipStatus {
    Success,
    Queued,
    Other(String),
}

impl From<String> for ClipStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => ClipStatus::Success,
            "queued" => ClipStatus::Queued,
            _ => ClipStatus::Other(value),
        }
    }
}

impl From<ClipStatus> for String {
    fn from(value: ClipStatus) -> Self {
        value.to_string()
    }
}

impl Default for ClipStatus {
    fn default() -> Self {
        ClipStatus::Other("unknown".to_string())
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipStatus::Success => write!(f, "success"),
            ClipStatus::Queued => write!(f, "queued"),
            ClipStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ClipStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Clip {
    pub fn is_ready(&self) -> bool {
        self.status == ClipStatus::Success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub clips: Vec<Clip>,
}

#[derive(Tabled)]
pub struct ClipTableRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "Duration")]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionInfo {
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }
}
