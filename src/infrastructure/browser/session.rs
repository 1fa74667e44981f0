//! Browser session seam

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to connect to WebDriver at {url}: {message}")]
    Connect { url: String, message: String },

    #[error("WebDriver command '{command}' failed: {message}")]
    Command { command: &'static str, message: String },

    #[error("No element matches '{selector}' at index {index}")]
    MissingElement { selector: String, index: usize },

    #[error("Detail window did not open within {0:?}")]
    DetailTimeout(Duration),

    #[error("Script '{script}' returned an unexpected value: {value}")]
    UnexpectedScriptResult { script: &'static str, value: String },
}

impl BrowserError {
    pub fn command(command: &'static str, error: impl ToString) -> Self {
        Self::Command {
            command,
            message: error.to_string(),
        }
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// One live browser tab plus at most one detail window.
///
/// A session is used by one run at a time. Opening a detail window switches
/// the session into it until [`close_detail`](BrowserSession::close_detail)
/// returns to the listing.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> BrowserResult<()>;

    /// Scroll down by one document height to trigger lazy loading.
    async fn scroll_by_page(&self) -> BrowserResult<()>;

    /// Current `document.body.scrollHeight`.
    async fn content_height(&self) -> BrowserResult<i64>;

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Click the first element matching `selector`. `Ok(false)` when absent.
    async fn click(&self, selector: &str) -> BrowserResult<bool>;

    async fn page_source(&self) -> BrowserResult<String>;

    /// Click the `index`-th element matching `selector` and switch to the
    /// window it opens.
    async fn open_detail(&self, selector: &str, index: usize, timeout: Duration) -> BrowserResult<()>;

    /// Wait up to `timeout` for `selector` to appear. `Ok(false)` on timeout.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<bool>;

    /// Close the detail window and switch back to the listing.
    async fn close_detail(&self) -> BrowserResult<()>;

    /// Close every window other than the current one and return how many
    /// were closed. Used after a detail window failed to open in time, since
    /// it may still open later.
    async fn close_stray_windows(&self) -> BrowserResult<usize>;

    /// End the WebDriver session.
    async fn shutdown(&self) -> BrowserResult<()>;
}
