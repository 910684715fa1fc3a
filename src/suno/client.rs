use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, header::ACCEPT};
use serde::de::DeserializeOwned;

use crate::{
    auth::LivenessProbe,
    config::Settings,
    types::{Clip, ClipsResponse, Credential, SessionInfo, Workspace, WorkspacesResponse},
    warning,
};

pub const WORKSPACE_PAGE_LIMIT: u32 = 50;
pub const CLIP_PAGE_LIMIT: u32 = 100;
const SESSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CLIP_PAGES: u32 = 100;
const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug)]
pub enum ApiError {
    Request(reqwest::Error),
    Status(StatusCode),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Request(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request(e) => write!(f, "request failed: {}", e),
            ApiError::Status(s) => write!(f, "server answered {}", s),
        }
    }
}

impl std::error::Error for ApiError {}

fn authorized(request: RequestBuilder, credential: &Credential, device_id: &str) -> RequestBuilder {
    request
        .bearer_auth(credential.as_str())
        .header("Device-Id", device_id)
        .header(ACCEPT, "*/*")
}

/// Authenticated client for the Suno studio API.
///
/// The `fetch_*` methods report failures as [`ApiError`]. The shorter
/// methods (`workspaces`, `clips`, `clip`, `session`) log the failure and
/// hand back an empty value instead, which is what the interactive commands use.
#[derive(Debug, Clone)]
pub struct SunoClient {
    http: Client,
    base_url: String,
    device_id: String,
    credential: Credential,
}

impl SunoClient {
    pub fn new(settings: &Settings, credential: Credential) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(SunoClient {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            device_id: settings.device_id.clone(),
            credential,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let request = authorized(self.http.get(&url), &self.credential, &self.device_id);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn fetch_workspaces(&self, page: u32, limit: u32) -> Result<Vec<Workspace>, ApiError> {
        let path = format!("/api/project/me?page={}&limit={}", page, limit);
        let res: WorkspacesResponse = self.get_json(&path).await?;
        Ok(res.projects)
    }

    pub async fn fetch_clips(
        &self,
        project_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Clip>, ApiError> {
        let path = format!(
            "/api/project/{}/clips?page={}&limit={}",
            project_id, page, limit
        );
        let res: ClipsResponse = self.get_json(&path).await?;
        Ok(res.clips)
    }

    pub async fn fetch_clip(&self, clip_id: &str) -> Result<Clip, ApiError> {
        self.get_json(&format!("/api/clip/{}", clip_id)).await
    }

    pub async fn fetch_session(&self) -> Result<SessionInfo, ApiError> {
        self.get_json("/api/session/").await
    }

    pub async fn workspaces(&self, page: u32, limit: u32) -> Vec<Workspace> {
        self.fetch_workspaces(page, limit).await.unwrap_or_else(|e| {
            warning!("Error fetching workspaces: {}", e);
            Vec::new()
        })
    }

    pub async fn clips(&self, project_id: &str, page: u32, limit: u32) -> Vec<Clip> {
        self.fetch_clips(project_id, page, limit)
            .await
            .unwrap_or_else(|e| {
                warning!("Error fetching clips: {}", e);
                Vec::new()
            })
    }

    /// Every clip of a workspace, walking pages until a short one.
    ///
    /// A failing page ends the walk with whatever was collected so far.
    pub async fn all_clips(&self, project_id: &str) -> Vec<Clip> {
        let mut all = Vec::new();

        for page in 1..=MAX_CLIP_PAGES {
            let clips = match self.fetch_clips(project_id, page, CLIP_PAGE_LIMIT).await {
                Ok(clips) => clips,
                Err(e) => {
                    warning!("Error fetching clips (page {}): {}", page, e);
                    break;
                }
            };

            let short_page = clips.len() < CLIP_PAGE_LIMIT as usize;
            all.extend(clips);
            if short_page {
                break;
            }
        }

        all
    }

    pub async fn clip(&self, clip_id: &str) -> Option<Clip> {
        match self.fetch_clip(clip_id).await {
            Ok(clip) => Some(clip),
            Err(e) => {
                warning!("Error fetching clip details: {}", e);
                None
            }
        }
    }

    pub async fn session(&self) -> Option<SessionInfo> {
        match self.fetch_session().await {
            Ok(session) => Some(session),
            Err(e) => {
                warning!("Error fetching session: {}", e);
                None
            }
        }
    }
}

/// Liveness check against `/api/session/` for an arbitrary credential.
#[derive(Debug, Clone)]
pub struct SessionProbe {
    http: Client,
    base_url: String,
    device_id: String,
}

impl SessionProbe {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(SESSION_PROBE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(SessionProbe {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            device_id: settings.device_id.clone(),
        })
    }
}

#[async_trait]
impl LivenessProbe for SessionProbe {
    async fn is_accepted(&self, credential: &Credential) -> bool {
        let url = format!("{}/api/session/", self.base_url);
        let request = authorized(self.http.get(&url), credential, &self.device_id);

        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                warning!("Token invalid (API answered {})", resp.status());
                false
            }
            Err(e) => {
                warning!("Token validation error: {}", e);
                false
            }
        }
    }
}
