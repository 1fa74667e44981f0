//! WebDriver-backed browser session

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::{BrowserError, BrowserResult, BrowserSession};
use crate::infrastructure::config::BrowserConfig;

const SCROLL_SCRIPT: &str = "window.scrollBy(0, document.body.scrollHeight);";
const HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";

/// Interval between window list polls while a detail window opens
const WINDOW_POLL: Duration = Duration::from_millis(100);

pub struct WebDriverSession {
    client: Client,
    /// Listing window while a detail window is open
    listing_window: Mutex<Option<WindowHandle>>,
}

impl WebDriverSession {
    /// Open a new session against the configured WebDriver endpoint.
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        info!("Connecting to WebDriver at {} ({})", config.webdriver_url, config.browser);

        let client = ClientBuilder::native()
            .capabilities(capabilities(config))
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| BrowserError::Connect {
                url: config.webdriver_url.clone(),
                message: e.to_string(),
            })?;

        info!("WebDriver session ready");
        Ok(Self {
            client,
            listing_window: Mutex::new(None),
        })
    }

    async fn new_window(&self, known: &[WindowHandle], timeout: Duration) -> BrowserResult<WindowHandle> {
        let started = Instant::now();
        loop {
            let windows = self
                .client
                .windows()
                .await
                .map_err(|e| BrowserError::command("windows", e))?;

            if let Some(handle) = windows.into_iter().find(|w| !known.contains(w)) {
                return Ok(handle);
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::DetailTimeout(timeout));
            }
            tokio::time::sleep(WINDOW_POLL).await;
        }
    }
}

fn capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let chrome = config.browser.eq_ignore_ascii_case("chrome");
    let args: &[&str] = match (chrome, config.headless) {
        (true, true) => &["--headless=new", "--disable-gpu"],
        (false, true) => &["-headless"],
        (_, false) => &[],
    };

    let mut caps = Map::new();
    if chrome {
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    } else {
        caps.insert("browserName".to_string(), json!("firefox"));
        caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
    }
    caps
}

fn is_absent(error: &CmdError) -> bool {
    error.is_no_such_element() || matches!(error, CmdError::WaitTimeout)
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await.map_err(|e| BrowserError::command("goto", e))
    }

    async fn scroll_by_page(&self) -> BrowserResult<()> {
        self.client
            .execute(SCROLL_SCRIPT, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::command("execute", e))
    }

    async fn content_height(&self) -> BrowserResult<i64> {
        let value = self
            .client
            .execute(HEIGHT_SCRIPT, Vec::new())
            .await
            .map_err(|e| BrowserError::command("execute", e))?;

        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h.round() as i64))
            .ok_or_else(|| BrowserError::UnexpectedScriptResult {
                script: HEIGHT_SCRIPT,
                value: value.to_string(),
            })
    }

    async fn click(&self, selector: &str) -> BrowserResult<bool> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(element) => {
                element.click().await.map_err(|e| BrowserError::command("click", e))?;
                Ok(true)
            }
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(BrowserError::command("find", e)),
        }
    }

    async fn page_source(&self) -> BrowserResult<String> {
        self.client.source().await.map_err(|e| BrowserError::command("source", e))
    }

    async fn open_detail(&self, selector: &str, index: usize, timeout: Duration) -> BrowserResult<()> {
        let current = self.client.window().await.map_err(|e| BrowserError::command("window", e))?;
        let known = self.client.windows().await.map_err(|e| BrowserError::command("windows", e))?;

        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| BrowserError::command("find_all", e))?;
        let element = elements.get(index).ok_or_else(|| BrowserError::MissingElement {
            selector: selector.to_string(),
            index,
        })?;
        element.click().await.map_err(|e| BrowserError::command("click", e))?;

        let detail = self.new_window(&known, timeout).await?;
        self.client
            .switch_to_window(detail)
            .await
            .map_err(|e| BrowserError::command("switch_to_window", e))?;

        *self.listing_window.lock().await = Some(current);
        debug!("Opened detail window for element {}", index);
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<bool> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(BrowserError::command("wait", e)),
        }
    }

    async fn close_detail(&self) -> BrowserResult<()> {
        let Some(listing) = self.listing_window.lock().await.take() else {
            warn!("close_detail called without an open detail window");
            return Ok(());
        };

        self.client
            .close_window()
            .await
            .map_err(|e| BrowserError::command("close_window", e))?;
        self.client
            .switch_to_window(listing)
            .await
            .map_err(|e| BrowserError::command("switch_to_window", e))
    }

    async fn close_stray_windows(&self) -> BrowserResult<usize> {
        let listing = self.client.window().await.map_err(|e| BrowserError::command("window", e))?;
        let windows = self.client.windows().await.map_err(|e| BrowserError::command("windows", e))?;

        let mut closed = 0;
        for handle in windows.into_iter().filter(|w| *w != listing) {
            self.client
                .switch_to_window(handle)
                .await
                .map_err(|e| BrowserError::command("switch_to_window", e))?;
            self.client
                .close_window()
                .await
                .map_err(|e| BrowserError::command("close_window", e))?;
            closed += 1;
        }

        if closed > 0 {
            self.client
                .switch_to_window(listing)
                .await
                .map_err(|e| BrowserError::command("switch_to_window", e))?;
            debug!("Closed {} stray windows", closed);
        }
        Ok(closed)
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        info!("Closing WebDriver session");
        self.client.clone().close().await.map_err(|e| BrowserError::command("close", e))
    }
}
