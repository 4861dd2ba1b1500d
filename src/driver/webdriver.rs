// W3C WebDriver adapter
//
// Drives a browser through a WebDriver server (chromedriver, geckodriver)
// over its JSON wire protocol:
//
//   POST   /session                              → { value: { sessionId } }
//   POST   /session/{id}/url                     { url }
//   POST   /session/{id}/element                 { using, value } → element ref
//   POST   /session/{id}/elements                { using, value } → [element ref]
//   POST   /session/{id}/element/{eid}/element   { using, value } → element ref
//   POST   /session/{id}/element/{eid}/click
//   POST   /session/{id}/element/{eid}/clear
//   POST   /session/{id}/element/{eid}/value     { text }
//   GET    /session/{id}/screenshot              → base64 PNG
//   DELETE /session/{id}
//
// Selectors prefixed with `text=` match the innermost element containing
// that text, `xpath=` is passed through as XPath, anything else is CSS.

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{DriverError, ElementHandle, SessionDriver, SessionFactory};

/// Key under which WebDriver returns element references
const ELEMENT_KEY: &str = "element-6066-11e4-a23a-4f65f6fd9a0a";

const REQUEST_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Locator {
    using: &'static str,
    value: String,
}

impl Locator {
    fn from_selector(selector: &str) -> Self {
        if let Some(text) = selector.strip_prefix("text=") {
            let literal = xpath_literal(text.trim());
            Self {
                using: "xpath",
                value: format!(
                    "//*[contains(normalize-space(.), {lit})][not(*[contains(normalize-space(.), {lit})])]",
                    lit = literal
                ),
            }
        } else if let Some(xpath) = selector.strip_prefix("xpath=") {
            Self {
                using: "xpath",
                value: xpath.to_string(),
            }
        } else {
            Self {
                using: "css selector",
                value: selector.to_string(),
            }
        }
    }

    /// XPath relative to a context element
    fn scoped(mut self) -> Self {
        if self.using == "xpath" && self.value.starts_with('/') {
            self.value = format!(".{}", self.value);
        }
        self
    }
}

fn xpath_literal(text: &str) -> String {
    match (text.contains('\''), text.contains('"')) {
        (false, _) => format!("'{}'", text),
        (true, false) => format!("\"{}\"", text),
        (true, true) => {
            // XPath 1.0 has no escapes; split on single quotes and concat
            let parts: Vec<String> = text
                .split('\'')
                .map(|part| format!("'{}'", part))
                .collect();
            format!("concat({})", parts.join(", \"'\", "))
        }
    }
}

/// Shared HTTP plumbing for session and element commands
#[derive(Clone)]
struct Wire {
    http: Client,
    session_url: String,
}

impl Wire {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let url = format!("{}{}", self.session_url, path);
        send(&self.http, method, &url, body).await
    }

    async fn find(&self, path: &str, locator: &Locator) -> Result<Option<String>, DriverError> {
        match self.command(Method::POST, path, Some(json!(locator))).await {
            Ok(value) => element_id(&value).map(Some),
            Err(DriverError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn element(&self, id: String) -> WebElement {
        WebElement {
            wire: self.clone(),
            id,
        }
    }
}

async fn send(http: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value, DriverError> {
    let has_body = method == Method::POST;
    let mut request = http.request(method, url);
    if has_body {
        // POST commands without parameters still require an empty JSON object
        request = request.json(&body.unwrap_or_else(|| json!({})));
    }

    let resp = request
        .send()
        .await
        .map_err(|e| DriverError::Session(format!("WebDriver unreachable: {}", e)))?;

    let status = resp.status();
    let payload: Value = resp
        .json()
        .await
        .map_err(|e| DriverError::Session(format!("Invalid WebDriver response ({}): {}", status, e)))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value["error"].as_str().unwrap_or("unknown error");
    let message = value["message"].as_str().unwrap_or_default().to_string();
    Err(match error {
        "no such element" => DriverError::ElementNotFound(message),
        // the remote bound is not echoed back; navigate() stamps its page-load timeout
        "timeout" | "script timeout" => DriverError::Timeout {
            selector: url.to_string(),
            timeout: Duration::ZERO,
        },
        _ => DriverError::Session(format!("{}: {}", error, message)),
    })
}

fn element_id(value: &Value) -> Result<String, DriverError> {
    value[ELEMENT_KEY]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DriverError::Session("Element reference missing from response".to_string()))
}

/// Starts browser sessions on a WebDriver server
pub struct WebDriverFactory {
    http: Client,
    endpoint: String,
    headless: bool,
}

impl WebDriverFactory {
    pub fn new(endpoint: impl Into<String>, headless: bool) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headless,
        })
    }

    fn capabilities(&self) -> Value {
        let args: Vec<&str> = if self.headless {
            vec!["--headless=new", "--window-size=1280,900"]
        } else {
            vec!["--window-size=1280,900"]
        };
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Driver = WebDriverSession;

    async fn open(&self) -> Result<WebDriverSession, DriverError> {
        let url = format!("{}/session", self.endpoint);
        let value = send(&self.http, Method::POST, &url, Some(self.capabilities())).await?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| DriverError::Session("Session id missing from response".to_string()))?;
        debug!(session = session_id, "WebDriver session started");

        Ok(WebDriverSession {
            wire: Wire {
                http: self.http.clone(),
                session_url: format!("{}/session/{}", self.endpoint, session_id),
            },
        })
    }
}

/// One browser session
pub struct WebDriverSession {
    wire: Wire,
}

impl WebDriverSession {
    async fn require(&self, selector: &str) -> Result<WebElement, DriverError> {
        self.query(selector)
            .await?
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }
}

#[async_trait]
impl SessionDriver for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let navigation_error = |e: DriverError| match e {
            DriverError::Timeout { .. } => DriverError::Timeout {
                selector: url.to_string(),
                timeout,
            },
            e => DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            },
        };

        self.wire
            .command(
                Method::POST,
                "/timeouts",
                Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
            )
            .await
            .map_err(navigation_error)?;
        self.wire
            .command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(navigation_error)?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let element = self.require(selector).await?;
        let base = format!("/element/{}", element.id);
        self.wire
            .command(Method::POST, &format!("{}/clear", base), None)
            .await?;
        self.wire
            .command(
                Method::POST,
                &format!("{}/value", base),
                Some(json!({ "text": value })),
            )
            .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.require(selector).await?.click().await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let started = Instant::now();
        loop {
            if self.query(selector).await?.is_some() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query(&self, selector: &str) -> Result<Option<WebElement>, DriverError> {
        let locator = Locator::from_selector(selector);
        Ok(self
            .wire
            .find("/element", &locator)
            .await?
            .map(|id| self.wire.element(id)))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<WebElement>, DriverError> {
        let locator = Locator::from_selector(selector);
        let value = self
            .wire
            .command(Method::POST, "/elements", Some(json!(locator)))
            .await?;

        value
            .as_array()
            .map(|items| items.iter().map(element_id).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|ids| ids.into_iter().map(|id| self.wire.element(id)).collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let value = self.wire.command(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| DriverError::Session("Screenshot missing from response".to_string()))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| DriverError::Session(format!("Invalid screenshot encoding: {}", e)))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.wire.command(Method::DELETE, "", None).await?;
        debug!("WebDriver session closed");
        Ok(())
    }
}

/// Element reference inside a session
pub struct WebElement {
    wire: Wire,
    id: String,
}

#[async_trait]
impl ElementHandle for WebElement {
    async fn query(&self, selector: &str) -> Result<Option<Self>, DriverError> {
        let locator = Locator::from_selector(selector).scoped();
        let path = format!("/element/{}/element", self.id);
        Ok(self
            .wire
            .find(&path, &locator)
            .await?
            .map(|id| self.wire.element(id)))
    }

    async fn click(&self) -> Result<(), DriverError> {
        self.wire
            .command(Method::POST, &format!("/element/{}/click", self.id), None)
            .await?;
        Ok(())
    }
}
