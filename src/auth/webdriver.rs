//! Minimal W3C WebDriver client.
//!
//! Only the four commands the browser sign-in needs: new session, navigate,
//! execute a synchronous script, delete session. Talks JSON to a running
//! driver such as `chromedriver --port=9515`.

use reqwest::{Client, Response};
use serde_json::{Value, json};

use super::AcquireError;

pub struct WebDriverSession {
    http: Client,
    base_url: String,
    id: String,
}

fn chrome_capabilities(headless: bool) -> Value {
    let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
    if headless {
        args.push("--headless=new");
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

/// Pulls `value` out of a WebDriver reply, turning error payloads into `AcquireError`.
async fn unwrap_value(response: Response) -> Result<Value, AcquireError> {
    let status = response.status();
    let body: Value = response.json().await?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value["error"].as_str().unwrap_or("unknown error");
        let message = value["message"].as_str().unwrap_or_default();
        return Err(AcquireError::WebDriver(format!(
            "{} ({}): {}",
            error, status, message
        )));
    }
    Ok(value)
}

impl WebDriverSession {
    pub async fn start(http: &Client, base_url: &str, headless: bool) -> Result<Self, AcquireError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{}/session", base_url))
            .json(&chrome_capabilities(headless))
            .send()
            .await?;

        let value = unwrap_value(response).await?;
        let id = value["sessionId"]
            .as_str()
            .ok_or_else(|| AcquireError::WebDriver("new session reply has no sessionId".to_string()))?
            .to_string();

        Ok(WebDriverSession {
            http: http.clone(),
            base_url,
            id,
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.id, command)
    }

    pub async fn navigate(&self, url: &str) -> Result<(), AcquireError> {
        let response = self
            .http
            .post(self.endpoint("url"))
            .json(&json!({ "url": url }))
            .send()
            .await?;
        unwrap_value(response).await.map(|_| ())
    }

    pub async fn execute(&self, script: &str) -> Result<Value, AcquireError> {
        let response = self
            .http
            .post(self.endpoint("execute/sync"))
            .json(&json!({ "script": script, "args": [] }))
            .send()
            .await?;
        unwrap_value(response).await
    }

    /// Ends the session, closing the browser window.
    pub async fn quit(self) -> Result<(), AcquireError> {
        let response = self
            .http
            .delete(format!("{}/session/{}", self.base_url, self.id))
            .send()
            .await?;
        unwrap_value(response).await.map(|_| ())
    }
}
