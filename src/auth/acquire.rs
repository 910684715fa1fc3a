use std::{
    fmt,
    io::{self, BufRead, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;

use crate::{config::Settings, info, success, types::Credential, utils, warning};

use super::webdriver::WebDriverSession;

/// Local storage key the Suno web app keeps its session JWT under.
pub const TOKEN_STORAGE_KEY: &str = "__clerk_db_jwt";

fn token_script() -> String {
    format!(
        "try {{ return window.localStorage.getItem('{}'); }} catch (e) {{ return null; }}",
        TOKEN_STORAGE_KEY
    )
}

#[derive(Debug)]
pub enum AcquireError {
    Request(reqwest::Error),
    WebDriver(String),
    Io(io::Error),
}

impl From<reqwest::Error> for AcquireError {
    fn from(err: reqwest::Error) -> Self {
        AcquireError::Request(err)
    }
}

impl From<io::Error> for AcquireError {
    fn from(err: io::Error) -> Self {
        AcquireError::Io(err)
    }
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Request(e) => write!(f, "WebDriver request failed: {}", e),
            AcquireError::WebDriver(e) => write!(f, "WebDriver error: {}", e),
            AcquireError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AcquireError {}

/// One way of obtaining a fresh token.
///
/// `Ok(None)` means the backend ran but came back empty handed.
#[async_trait]
pub trait TokenAcquisitionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError>;
}

/// Tries each backend once, in order, until one yields a token.
pub struct Acquirer {
    backends: Vec<Box<dyn TokenAcquisitionBackend>>,
}

impl Acquirer {
    pub fn new(backends: Vec<Box<dyn TokenAcquisitionBackend>>) -> Self {
        Acquirer { backends }
    }

    /// Browser sign-in first, then a pasted token from stdin.
    pub fn standard(settings: &Settings) -> Result<Self, AcquireError> {
        Ok(Acquirer::new(vec![
            Box::new(BrowserBackend::new(settings)?),
            Box::new(ManualBackend::stdin(settings.create_url.clone())),
        ]))
    }

    pub async fn acquire(&self) -> Option<Credential> {
        for backend in &self.backends {
            match backend.acquire().await {
                Ok(Some(credential)) => return Some(credential),
                Ok(None) => warning!("{} sign-in produced no token", backend.name()),
                Err(e) => warning!("{} sign-in failed: {}", backend.name(), e),
            }
        }
        None
    }
}

/// How often and how long the browser's storage is polled.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollPolicy {
    /// Every 5 seconds for up to 5 minutes.
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(5),
            attempts: 60,
        }
    }
}

impl PollPolicy {
    pub fn ceiling(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Drives a real browser through WebDriver and waits for the user to sign in.
pub struct BrowserBackend {
    http: Client,
    webdriver_url: String,
    create_url: String,
    headless: bool,
    poll: PollPolicy,
}

impl BrowserBackend {
    pub fn new(settings: &Settings) -> Result<Self, AcquireError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(BrowserBackend {
            http,
            webdriver_url: settings.webdriver_url.clone(),
            create_url: settings.create_url.clone(),
            headless: settings.headless,
            poll: PollPolicy::default(),
        })
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn wait_for_token(&self, session: &WebDriverSession) -> Result<Option<Credential>, AcquireError> {
        session.navigate(&self.create_url).await?;
        info!(
            "Please login with your Suno account (waiting max {} seconds)...",
            self.poll.ceiling().as_secs()
        );

        let script = token_script();
        for attempt in 0..self.poll.attempts {
            // script failures happen while the page is navigating, keep polling
            if let Ok(Value::String(token)) = session.execute(&script).await {
                let token = token.trim();
                if !token.is_empty() {
                    success!("Token captured from browser!");
                    return Ok(Some(Credential::new(token)));
                }
            }

            if attempt > 0 && attempt % 6 == 0 {
                info!(
                    "Still waiting... ({} seconds)",
                    (self.poll.interval * attempt).as_secs()
                );
            }
            sleep(self.poll.interval).await;
        }

        warning!("Timeout: could not capture token from the browser");
        Ok(None)
    }
}

#[async_trait]
impl TokenAcquisitionBackend for BrowserBackend {
    fn name(&self) -> &str {
        "Browser"
    }

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError> {
        info!("Opening {} in a browser...", self.create_url);
        let session = WebDriverSession::start(&self.http, &self.webdriver_url, self.headless).await?;

        let result = self.wait_for_token(&session).await;

        if let Err(e) = session.quit().await {
            warning!("Failed to close browser session: {}", e);
        }
        result
    }
}

/// Asks the user to paste a token copied from the browser's developer tools.
pub struct ManualBackend {
    create_url: String,
    input: Arc<Mutex<Box<dyn BufRead + Send>>>,
}

impl ManualBackend {
    pub fn new(create_url: String, input: Box<dyn BufRead + Send>) -> Self {
        ManualBackend {
            create_url,
            input: Arc::new(Mutex::new(input)),
        }
    }

    pub fn stdin(create_url: String) -> Self {
        ManualBackend::new(create_url, Box::new(io::BufReader::new(io::stdin())))
    }

    fn print_instructions(&self) {
        info!("Manual token entry");
        println!("  1. Open {} and sign in", self.create_url);
        println!("  2. Open the developer tools (F12) and switch to the Network tab");
        println!("  3. Reload the page and pick a request to 'api/project/me'");
        println!("  4. Copy the value of the 'Authorization: Bearer ...' request header");
        println!();
    }
}

#[async_trait]
impl TokenAcquisitionBackend for ManualBackend {
    fn name(&self) -> &str {
        "Manual"
    }

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError> {
        self.print_instructions();
        print!("Paste your Bearer Token: ");
        io::stdout().flush()?;

        // reading stdin blocks, keep it off the async workers
        let input = Arc::clone(&self.input);
        let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut input = input
                .lock()
                .map_err(|_| io::Error::other("token input poisoned"))?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(io::Error::other)??;

        let token = utils::strip_bearer_prefix(&line);
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credential::new(token)))
    }
}
