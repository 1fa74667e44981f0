//! Browser automation for the listing and detail pages
//!
//! - [`session`] defines the [`BrowserSession`] seam and its error type
//! - [`webdriver`] implements it over a WebDriver endpoint with `fantoccini`
//! - [`navigator`] drives lazy-load scrolling and overlay dismissal

pub mod navigator;
pub mod session;
pub mod webdriver;

pub use navigator::{ScrollSummary, dismiss_banner, scroll_until_stable};
pub use session::{BrowserError, BrowserResult, BrowserSession};
pub use webdriver::WebDriverSession;
