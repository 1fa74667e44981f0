//! Lazy-load scrolling and overlay handling for the listing page

#![allow(clippy::uninlined_format_args)]

use tracing::{debug, info, warn};

use super::session::{BrowserResult, BrowserSession};
use crate::domain::ProgressSink;
use crate::infrastructure::config::{BrowserConfig, ScrollConfig};
use crate::infrastructure::config::yep_savings::selectors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollSummary {
    pub iterations: u32,
    pub final_height: i64,
    /// Whether the height stopped growing before the iteration cap
    pub stabilized: bool,
}

/// Scroll until the content height stops growing or the cap is reached.
///
/// A non-growing height is counted on consecutive iterations and the loop
/// stops once that count reaches `stable_iterations`. Progress is reported as
/// `iteration * 100 / max_iterations`, ending at 100.
pub async fn scroll_until_stable(
    session: &dyn BrowserSession,
    config: &ScrollConfig,
    progress: &dyn ProgressSink,
) -> BrowserResult<ScrollSummary> {
    let mut summary = ScrollSummary::default();
    let mut previous: Option<i64> = None;
    let mut stable = 0;

    for iteration in 1..=config.max_iterations {
        session.scroll_by_page().await?;
        session.pause(config.pause()).await;
        let height = session.content_height().await?;

        if previous.is_some_and(|p| height <= p) {
            stable += 1;
        } else {
            stable = 0;
        }
        previous = Some(height);
        summary.iterations = iteration;
        summary.final_height = height;

        let percent = (u64::from(iteration) * 100 / u64::from(config.max_iterations)).min(100);
        progress.report(u8::try_from(percent).unwrap_or(100));
        debug!("Scroll {}: height {} (stable {})", iteration, height, stable);

        if stable >= config.stable_iterations {
            summary.stabilized = true;
            break;
        }
    }

    progress.report(100);
    info!(
        "Scrolling finished after {} iterations at height {} (stabilized: {})",
        summary.iterations, summary.final_height, summary.stabilized
    );
    Ok(summary)
}

/// Close the subscription overlay if it is shown. Never fails the run.
pub async fn dismiss_banner(session: &dyn BrowserSession, config: &BrowserConfig) {
    match session.click(selectors::BANNER_CLOSE).await {
        Ok(true) => {
            debug!("Dismissed subscription banner");
            session.pause(config.banner_settle()).await;
        }
        Ok(false) => debug!("No subscription banner shown"),
        Err(e) => warn!("Could not dismiss subscription banner: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::browser::session::BrowserError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Session whose content height follows a script; the last value repeats.
    struct ScriptedHeights {
        heights: Mutex<VecDeque<i64>>,
        scrolls: AtomicUsize,
        banner: Option<bool>,
    }

    impl ScriptedHeights {
        fn new(heights: &[i64]) -> Self {
            Self {
                heights: Mutex::new(heights.iter().copied().collect()),
                scrolls: AtomicUsize::new(0),
                banner: Some(false),
            }
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedHeights {
        async fn goto(&self, _url: &str) -> BrowserResult<()> {
            Ok(())
        }
        async fn scroll_by_page(&self) -> BrowserResult<()> {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn content_height(&self) -> BrowserResult<i64> {
            let mut heights = self.heights.lock().unwrap();
            let height = if heights.len() > 1 { heights.pop_front() } else { heights.front().copied() };
            Ok(height.unwrap_or(0))
        }
        async fn pause(&self, _duration: Duration) {}
        async fn click(&self, _selector: &str) -> BrowserResult<bool> {
            self.banner.ok_or_else(|| BrowserError::command("click", "stale element"))
        }
        async fn page_source(&self) -> BrowserResult<String> {
            Ok(String::new())
        }
        async fn open_detail(&self, _selector: &str, _index: usize, _timeout: Duration) -> BrowserResult<()> {
            Ok(())
        }
        async fn wait_for(&self, _selector: &str, _timeout: Duration) -> BrowserResult<bool> {
            Ok(false)
        }
        async fn close_detail(&self) -> BrowserResult<()> {
            Ok(())
        }
        async fn close_stray_windows(&self) -> BrowserResult<usize> {
            Ok(0)
        }
        async fn shutdown(&self) -> BrowserResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorded(Mutex<Vec<u8>>);

    impl ProgressSink for Recorded {
        fn report(&self, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    fn scroll_config(max_iterations: u32, stable_iterations: u32) -> ScrollConfig {
        ScrollConfig {
            max_iterations,
            stable_iterations,
            pause_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_stops_after_consecutive_stable_heights() {
        let session = ScriptedHeights::new(&[1000, 2000, 3000, 3000, 3000, 3000]);
        let progress = Recorded::default();

        let summary = scroll_until_stable(&session, &scroll_config(20, 3), &progress).await.unwrap();

        assert!(summary.stabilized);
        assert_eq!(summary.iterations, 6);
        assert_eq!(summary.final_height, 3000);
        assert_eq!(session.scrolls.load(Ordering::SeqCst), 6);
        assert_eq!(*progress.0.lock().unwrap().last().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_growth_resets_the_stable_count() {
        let session = ScriptedHeights::new(&[1000, 1000, 2000, 2000, 2000]);
        let summary = scroll_until_stable(&session, &scroll_config(20, 2), &Recorded::default())
            .await
            .unwrap();

        assert_eq!(summary.iterations, 5);
        assert!(summary.stabilized);
    }

    #[tokio::test]
    async fn test_iteration_cap_bounds_scrolling() {
        let session = ScriptedHeights::new(&(1..=100).map(|i| i * 500).collect::<Vec<_>>());
        let progress = Recorded::default();

        let summary = scroll_until_stable(&session, &scroll_config(4, 3), &progress).await.unwrap();

        assert!(!summary.stabilized);
        assert_eq!(summary.iterations, 4);
        assert_eq!(*progress.0.lock().unwrap(), vec![25, 50, 75, 100, 100]);
    }

    #[tokio::test]
    async fn test_banner_dismissal_never_fails() {
        let config = BrowserConfig::default();
        let mut session = ScriptedHeights::new(&[0]);
        dismiss_banner(&session, &config).await;

        session.banner = Some(true);
        dismiss_banner(&session, &config).await;

        session.banner = None;
        dismiss_banner(&session, &config).await;
    }
}
