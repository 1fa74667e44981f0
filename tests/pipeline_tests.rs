//! End-to-end runs against a scripted browser session and an in-memory store
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

use warehouse_deals_lib::application::{DealWorkflow, LastUpdate, UpsertEngine};
use warehouse_deals_lib::domain::{Location, PriceText, ProductRepository};
use warehouse_deals_lib::infrastructure::browser::{BrowserError, BrowserResult, BrowserSession};
use warehouse_deals_lib::infrastructure::config::{BrowserConfig, ScrollConfig};
use warehouse_deals_lib::infrastructure::{DatabaseConnection, SnapshotStore, SqliteProductRepository};

const LISTING: &str = r#"
<html><body>
  <div class="flex items-center"><span>Updates</span><span>Mon Apr 7, 2025</span></div>
  <div id="productDesc-111111">
    <img src="/img/111111.jpg">
    <div class="absolute left-0 top-0 min-w-fit">
      <p>111111</p><p>Paper Towels 12pk</p><p>$14.99</p><p>-$3.00</p><p>$11.99</p>
      <p>PRICE AT REGISTER</p><p>EXP. 12/31</p>
    </div>
  </div>
  <div id="productDesc-222222">
    <div class="absolute left-0 top-0 min-w-fit"><p>222222</p><p>Desk Lamp</p><p>24.97</p></div>
  </div>
  <div id="productDesc-333333">
    <div class="absolute left-0 top-0 min-w-fit">
      <p>333333</p><p>Tide Pods 104ct</p><p>LESS IN-STORE REBATE</p><p>$6.00</p>
    </div>
  </div>
</body></html>
"#;

const DETAIL_WITH_HISTORY: &str = r#"
<html><body><table><tbody>
  <tr><td>Date</td><td>Item</td><td>Savings</td><td>Price</td></tr>
  <tr><td>2025-03-01</td><td>Paper Towels</td><td>$3.00</td><td>$12.99</td></tr>
  <tr><td>2025-03-15</td><td>Paper Towels</td><td>-</td><td>$13.49</td></tr>
</tbody></table></body></html>
"#;

const DETAIL_HEADER_ONLY: &str = r#"
<html><body><table><tbody>
  <tr><td>Date</td><td>Item</td><td>Savings</td><td>Price</td></tr>
</tbody></table></body></html>
"#;

#[derive(Default)]
struct Calls {
    gotos: Vec<String>,
    opened: Vec<usize>,
    closes: usize,
    stray_closes: usize,
    shutdowns: usize,
}

/// Browser session replaying a fixed listing and per-container detail pages.
struct ScriptedSession {
    listing: String,
    details: HashMap<usize, String>,
    /// Detail pages whose window only appears after the open timeout
    late_details: HashMap<usize, String>,
    /// Late window that has appeared but was never switched to
    pending_late: Mutex<Option<usize>>,
    heights: Mutex<VecDeque<i64>>,
    fail_navigation: bool,
    current_detail: Mutex<Option<usize>>,
    calls: Mutex<Calls>,
}

impl ScriptedSession {
    fn new() -> Self {
        Self {
            listing: LISTING.to_string(),
            details: HashMap::from([(0, DETAIL_WITH_HISTORY.to_string()), (1, DETAIL_HEADER_ONLY.to_string())]),
            late_details: HashMap::new(),
            pending_late: Mutex::new(None),
            heights: Mutex::new(VecDeque::from([1000, 2000, 3000, 3000, 3000, 3000])),
            fail_navigation: false,
            current_detail: Mutex::new(None),
            calls: Mutex::new(Calls::default()),
        }
    }

    /// The first product's detail window opens late, after the second click.
    fn slow_first_detail() -> Self {
        Self {
            details: HashMap::from([(1, DETAIL_HEADER_ONLY.to_string())]),
            late_details: HashMap::from([(0, DETAIL_WITH_HISTORY.to_string())]),
            ..Self::new()
        }
    }

    fn failing_navigation() -> Self {
        Self {
            fail_navigation: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        self.calls.lock().unwrap().gotos.push(url.to_string());
        if self.fail_navigation {
            return Err(BrowserError::command("goto", "net::ERR_NAME_NOT_RESOLVED"));
        }
        Ok(())
    }

    async fn scroll_by_page(&self) -> BrowserResult<()> {
        Ok(())
    }

    async fn content_height(&self) -> BrowserResult<i64> {
        let mut heights = self.heights.lock().unwrap();
        let height = if heights.len() > 1 { heights.pop_front() } else { heights.front().copied() };
        Ok(height.unwrap_or(0))
    }

    async fn pause(&self, _duration: Duration) {}

    async fn click(&self, _selector: &str) -> BrowserResult<bool> {
        Ok(false)
    }

    async fn page_source(&self) -> BrowserResult<String> {
        let current = *self.current_detail.lock().unwrap();
        Ok(match current {
            Some(index) => self
                .details
                .get(&index)
                .or_else(|| self.late_details.get(&index))
                .cloned()
                .unwrap_or_default(),
            None => self.listing.clone(),
        })
    }

    async fn open_detail(&self, _selector: &str, index: usize, timeout: Duration) -> BrowserResult<()> {
        // A window left over from an earlier click is the first new window seen.
        let late = self.pending_late.lock().unwrap().take();
        if let Some(late) = late {
            self.calls.lock().unwrap().opened.push(late);
            *self.current_detail.lock().unwrap() = Some(late);
            return Ok(());
        }
        if self.late_details.contains_key(&index) {
            *self.pending_late.lock().unwrap() = Some(index);
            return Err(BrowserError::DetailTimeout(timeout));
        }
        if !self.details.contains_key(&index) {
            return Err(BrowserError::DetailTimeout(timeout));
        }
        self.calls.lock().unwrap().opened.push(index);
        *self.current_detail.lock().unwrap() = Some(index);
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> BrowserResult<bool> {
        let current = *self.current_detail.lock().unwrap();
        Ok(current
            .and_then(|index| self.details.get(&index).or_else(|| self.late_details.get(&index)))
            .is_some_and(|html| html.contains(&format!("<{selector}>"))))
    }

    async fn close_detail(&self) -> BrowserResult<()> {
        self.calls.lock().unwrap().closes += 1;
        *self.current_detail.lock().unwrap() = None;
        Ok(())
    }

    async fn close_stray_windows(&self) -> BrowserResult<usize> {
        let closed = usize::from(self.pending_late.lock().unwrap().take().is_some());
        self.calls.lock().unwrap().stray_closes += 1;
        Ok(closed)
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        self.calls.lock().unwrap().shutdowns += 1;
        Ok(())
    }
}

struct Harness {
    repository: Arc<SqliteProductRepository>,
    workflow: DealWorkflow,
    snapshot_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn harness() -> Result<Harness> {
    let database = DatabaseConnection::new("sqlite::memory:").await?;
    database.migrate().await?;
    let repository = Arc::new(SqliteProductRepository::new(database.pool().clone()));

    let dir = tempdir()?;
    let snapshot_path = dir.path().join("lastScrape.json");
    let scroll = ScrollConfig {
        max_iterations: 10,
        stable_iterations: 3,
        pause_ms: 0,
    };

    let workflow = DealWorkflow::new(
        Arc::new(UpsertEngine::new(repository.clone())),
        SnapshotStore::new(snapshot_path.clone()),
        BrowserConfig::default(),
        scroll,
    );

    Ok(Harness {
        repository,
        workflow,
        snapshot_path,
        _dir: dir,
    })
}

#[tokio::test]
async fn first_run_creates_products_and_backfills_history() -> Result<()> {
    let h = harness().await?;
    let session = Arc::new(ScriptedSession::new());
    let mut history_progress = h.workflow.progress().subscribe_history();

    let report = h.workflow.run(session.clone(), Location::TorontoWardenAve).await?;

    assert_eq!(report.last_update, LastUpdate::Captured("Updates Mon Apr 7, 2025".into()));
    assert_eq!(report.items.len(), 3);
    assert_eq!(report.summary.created, 3);
    assert_eq!(report.summary.backfilled, 2);
    assert_eq!(report.summary.recorded, 3);
    assert!(report.scroll.stabilized);

    assert!(history_progress.has_changed()?);
    assert_eq!(*history_progress.borrow_and_update(), 100);
    assert_eq!(*h.workflow.progress().subscribe_scan().borrow(), 100);

    let calls = session.calls.lock().unwrap();
    assert_eq!(calls.gotos.len(), 1);
    assert!(calls.gotos[0].ends_with(Location::TorontoWardenAve.slug()));
    assert_eq!(calls.opened, vec![0, 1]);
    assert_eq!(calls.closes, 2);
    assert_eq!(calls.stray_closes, 1);
    assert_eq!(calls.shutdowns, 1);
    drop(calls);

    let towels = h
        .repository
        .find_product("111111", Location::TorontoWardenAve)
        .await?
        .expect("product created");
    assert_eq!(towels.name, "Paper Towels 12pk");
    let observations = h.repository.observations_for(towels.id).await?;
    assert_eq!(observations.len(), 3);
    assert_eq!(observations[0].final_price, Some(Decimal::new(1299, 2)));
    assert_eq!(observations[0].full_price, Some(Decimal::new(1599, 2)));
    assert_eq!(observations[2].final_price, Some(Decimal::new(1199, 2)));
    assert_eq!(observations[2].discount, Some(Decimal::new(3, 0)));

    let rebate = &report.items[2];
    assert_eq!(rebate.final_price, PriceText::AtRegister);
    assert_eq!(rebate.discount, PriceText::shown("$6.00"));
    assert_eq!(report.items[0].image_url.as_deref(), Some("https://yepsavings.com/img/111111.jpg"));
    Ok(())
}

#[tokio::test]
async fn late_detail_window_is_closed_before_the_next_product() -> Result<()> {
    let h = harness().await?;
    let session = Arc::new(ScriptedSession::slow_first_detail());

    let report = h.workflow.run(session.clone(), Location::TorontoWardenAve).await?;

    assert_eq!(report.summary.created, 3);
    assert_eq!(report.summary.backfilled, 0);

    let calls = session.calls.lock().unwrap();
    assert_eq!(calls.opened, vec![1]);
    assert_eq!(calls.stray_closes, 2);
    drop(calls);

    let lamp = h
        .repository
        .find_product("222222", Location::TorontoWardenAve)
        .await?
        .expect("product created");
    assert_eq!(h.repository.observations_for(lamp.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn second_run_with_same_prices_inserts_nothing() -> Result<()> {
    let h = harness().await?;
    h.workflow
        .run(Arc::new(ScriptedSession::new()), Location::TorontoWardenAve)
        .await?;

    let session = Arc::new(ScriptedSession::new());
    let report = h.workflow.run(session.clone(), Location::TorontoWardenAve).await?;

    assert_eq!(report.summary.created, 0);
    assert_eq!(report.summary.inserted(), 0);
    assert_eq!(report.summary.unchanged, 3);
    assert!(session.calls.lock().unwrap().opened.is_empty());
    Ok(())
}

#[tokio::test]
async fn same_ids_at_another_location_are_separate_products() -> Result<()> {
    let h = harness().await?;
    h.workflow
        .run(Arc::new(ScriptedSession::new()), Location::TorontoWardenAve)
        .await?;
    let report = h
        .workflow
        .run(Arc::new(ScriptedSession::new()), Location::OttawaGloucester)
        .await?;

    assert_eq!(report.summary.created, 3);
    assert_eq!(h.repository.products_for_location(Location::OttawaGloucester).await?.len(), 3);
    assert_eq!(h.repository.products_for_location(Location::TorontoWardenAve).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn snapshot_is_written_after_a_successful_run() -> Result<()> {
    let h = harness().await?;
    let report = h
        .workflow
        .run(Arc::new(ScriptedSession::new()), Location::TorontoWardenAve)
        .await?;

    let saved = SnapshotStore::new(h.snapshot_path.clone()).load().await;
    assert_eq!(saved, report.items);
    assert_eq!(h.workflow.engine().last_scraped().len(), 3);
    Ok(())
}

#[tokio::test]
async fn navigation_failure_aborts_and_still_shuts_down() -> Result<()> {
    let h = harness().await?;
    let session = Arc::new(ScriptedSession::failing_navigation());

    let result = h.workflow.run(session.clone(), Location::TorontoWardenAve).await;

    assert!(result.is_err());
    assert_eq!(session.calls.lock().unwrap().shutdowns, 1);
    assert!(!h.snapshot_path.exists());
    assert!(h.repository.products_for_location(Location::TorontoWardenAve).await?.is_empty());
    Ok(())
}
