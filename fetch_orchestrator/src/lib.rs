use async_trait::async_trait;
use config_manager::SystemConfig;
use lifi_client::{LifiClient, LifiConfig, LifiError, TransfersPage};
use retry_utils::RetryPolicy;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use transfer_core::{
    aggregate_transfers, Aggregate, CoreError, RecordFilter, TimestampWindow, TransferRecord,
};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Fetch cycle failed: {0}")]
    CycleFailed(#[from] LifiError),
    #[error("{0}")]
    Window(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Seam between the fetch cycle and the HTTP client so that pagination and
/// cancellation behavior can be exercised against scripted page sources.
#[async_trait]
pub trait TransferPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        window: TimestampWindow,
        cursor: Option<&str>,
    ) -> std::result::Result<TransfersPage, LifiError>;
}

#[async_trait]
impl TransferPageSource for LifiClient {
    async fn fetch_page(
        &self,
        window: TimestampWindow,
        cursor: Option<&str>,
    ) -> std::result::Result<TransfersPage, LifiError> {
        LifiClient::fetch_page(self, window, cursor).await
    }
}

/// Lifecycle of the most recent fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleState {
    Idle,
    Running,
    Completed,
    Aborted,
    Failed,
}

/// Why pagination stopped. Only `Exhausted` is the normal end; the other two
/// are defensive stops that still complete the cycle with whatever was
/// accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationCause {
    /// Empty page or the server signalled no further pages
    Exhausted,
    /// The server returned the same cursor twice in a row
    CursorRepeat,
    /// The per-cycle page cap was hit
    PageCap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed {
        pages: u32,
        records: usize,
        termination: TerminationCause,
    },
    /// A newer cycle superseded this one; nothing was published
    Aborted,
}

/// Published view of the session: the aggregate of the last completed cycle
/// plus progress metadata for the consumer.
#[derive(Debug, Clone, Serialize)]
pub struct DataSnapshot {
    pub analysis: Option<Aggregate>,
    pub fetched_count: usize,
    pub fetching: bool,
    pub error: Option<String>,
    pub total_loaded: usize,
    pub filtered_count: usize,
    pub state: CycleState,
}

#[derive(Debug)]
struct SessionState {
    window: TimestampWindow,
    filter: RecordFilter,
    raw_records: Vec<TransferRecord>,
    analysis: Option<Aggregate>,
    last_error: Option<String>,
    cycle_state: CycleState,
}

enum PageRun {
    Superseded,
    Finished {
        records: Vec<TransferRecord>,
        pages: u32,
        termination: TerminationCause,
    },
}

/// Orchestrates full pagination runs over the transfer feed.
///
/// One logical thread of control: pages are fetched strictly sequentially and
/// the only concurrency concern is cycle overlap. Each cycle owns a
/// monotonically increasing generation token; the token is compared against
/// the current one after every suspension point, and a stale cycle discards
/// its work without touching shared state ("last request wins").
pub struct FetchOrchestrator<S: TransferPageSource> {
    source: Arc<S>,
    max_pages: u32,
    generation: AtomicU64,
    fetched_count: AtomicUsize,
    fetching: AtomicBool,
    state: Mutex<SessionState>,
}

impl FetchOrchestrator<LifiClient> {
    /// Build an orchestrator backed by the real LI.FI client
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let lifi_config = LifiConfig {
            api_base_url: config.lifi.api_base_url.clone(),
            timeout_seconds: config.lifi.request_timeout_seconds,
            page_limit: config.lifi.page_limit,
            retry: RetryPolicy {
                max_attempts: config.lifi.retry_max_attempts,
                delay_ms: config.lifi.retry_delay_ms,
            },
        };
        let client = LifiClient::with_config(lifi_config)?;
        let filter = if config.system.btc_filter_default {
            RecordFilter::BtcOnly
        } else {
            RecordFilter::All
        };

        Ok(Self::new(Arc::new(client), config.fetch.max_pages, filter))
    }
}

impl<S: TransferPageSource> FetchOrchestrator<S> {
    pub fn new(source: Arc<S>, max_pages: u32, filter: RecordFilter) -> Self {
        Self {
            source,
            max_pages,
            generation: AtomicU64::new(0),
            fetched_count: AtomicUsize::new(0),
            fetching: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                window: TimestampWindow::today(),
                filter,
                raw_records: Vec::new(),
                analysis: None,
                last_error: None,
                cycle_state: CycleState::Idle,
            }),
        }
    }

    /// Run one full pagination cycle for the window.
    ///
    /// Starting a cycle invalidates any cycle still in flight. On completion
    /// the raw dataset, filter result and aggregate are published atomically;
    /// a superseded cycle returns `Aborted` and publishes nothing, including
    /// its errors.
    pub async fn run_cycle(&self, window: TimestampWindow) -> Result<CycleOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            state.window = window;
            state.last_error = None;
            state.cycle_state = CycleState::Running;
        }
        self.fetched_count.store(0, Ordering::SeqCst);
        self.fetching.store(true, Ordering::SeqCst);
        info!(
            "🔄 Fetch cycle {} started for window {}..{}",
            generation, window.from, window.to
        );

        match self.paginate(generation, window).await {
            Ok(PageRun::Superseded) => {
                debug!("Fetch cycle {} superseded, discarding", generation);
                Ok(CycleOutcome::Aborted)
            }
            Ok(PageRun::Finished {
                records,
                pages,
                termination,
            }) => {
                let mut state = self.state.lock().await;
                if !self.is_current(generation) {
                    debug!("Fetch cycle {} superseded before commit", generation);
                    return Ok(CycleOutcome::Aborted);
                }

                let record_count = records.len();
                state.raw_records = records;
                let filtered = state.filter.apply(&state.raw_records);
                let filtered_count = filtered.len();
                let analysis = aggregate_transfers(filtered);
                state.analysis = Some(analysis);
                state.cycle_state = CycleState::Completed;
                self.fetching.store(false, Ordering::SeqCst);

                info!(
                    "✅ Fetch cycle {} completed: {} pages, {} records ({} pass filter), {:?}",
                    generation, pages, record_count, filtered_count, termination
                );
                Ok(CycleOutcome::Completed {
                    pages,
                    records: record_count,
                    termination,
                })
            }
            Err(e) => {
                let mut state = self.state.lock().await;
                if !self.is_current(generation) {
                    // Only the active generation's failure is surfaced
                    debug!("Stale cycle {} failed, swallowing: {}", generation, e);
                    return Ok(CycleOutcome::Aborted);
                }

                // The previously completed aggregate stays visible next to
                // the error indicator
                state.last_error = Some(e.to_string());
                state.cycle_state = CycleState::Failed;
                self.fetching.store(false, Ordering::SeqCst);
                Err(OrchestratorError::CycleFailed(e))
            }
        }
    }

    /// Parse a `YYYY-MM-DD` date and run a cycle for that day. A malformed
    /// date is rejected before any network activity.
    pub async fn set_date(&self, date: &str) -> Result<CycleOutcome> {
        let window = TimestampWindow::for_date(date)?;
        self.run_cycle(window).await
    }

    /// Re-run the cycle on the current window
    pub async fn refresh(&self) -> Result<CycleOutcome> {
        let window = self.state.lock().await.window;
        self.run_cycle(window).await
    }

    /// Swap the record filter and re-aggregate the last completed dataset.
    /// Synchronous with respect to the feed: no network round trip.
    pub async fn set_filter(&self, filter: RecordFilter) {
        let mut state = self.state.lock().await;
        state.filter = filter;
        if state.analysis.is_some() {
            let filtered = state.filter.apply(&state.raw_records);
            let analysis = aggregate_transfers(filtered);
            state.analysis = Some(analysis);
        }
    }

    pub async fn filter(&self) -> RecordFilter {
        self.state.lock().await.filter
    }

    /// Running count of records fetched by the active cycle. The one value
    /// allowed to update incrementally mid-cycle.
    pub fn fetched_count(&self) -> usize {
        self.fetched_count.load(Ordering::SeqCst)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// Consistent view of the published aggregate and progress metadata
    pub async fn snapshot(&self) -> DataSnapshot {
        let state = self.state.lock().await;
        let filtered_count = state
            .raw_records
            .iter()
            .filter(|r| state.filter.matches(r))
            .count();

        DataSnapshot {
            analysis: state.analysis.clone(),
            fetched_count: self.fetched_count(),
            fetching: self.is_fetching(),
            error: state.last_error.clone(),
            total_loaded: state.raw_records.len(),
            filtered_count,
            state: state.cycle_state,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn paginate(
        &self,
        generation: u64,
        window: TimestampWindow,
    ) -> std::result::Result<PageRun, LifiError> {
        let mut accumulated: Vec<TransferRecord> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            if !self.is_current(generation) {
                return Ok(PageRun::Superseded);
            }
            if pages >= self.max_pages {
                warn!(
                    "Page cap ({}) reached, stopping with {} records",
                    self.max_pages,
                    accumulated.len()
                );
                return Ok(PageRun::Finished {
                    records: accumulated,
                    pages,
                    termination: TerminationCause::PageCap,
                });
            }

            pages += 1;
            let page = self.source.fetch_page(window, cursor.as_deref()).await?;
            if !self.is_current(generation) {
                return Ok(PageRun::Superseded);
            }

            if page.data.is_empty() {
                debug!("Page {}: empty, pagination exhausted", pages);
                return Ok(PageRun::Finished {
                    records: accumulated,
                    pages,
                    termination: TerminationCause::Exhausted,
                });
            }

            accumulated.extend(page.data);
            self.fetched_count.store(accumulated.len(), Ordering::SeqCst);

            let previous = cursor.take();
            cursor = page.next.clone();
            let has_more = page.has_next == Some(true);
            debug!(
                "Page {}: {} records total, hasNext={:?}",
                pages,
                accumulated.len(),
                page.has_next
            );

            if !has_more {
                return Ok(PageRun::Finished {
                    records: accumulated,
                    pages,
                    termination: TerminationCause::Exhausted,
                });
            }

            // Same cursor twice means the server would replay this page forever
            if cursor.is_some() && cursor == previous {
                warn!("Cursor unchanged after page {}, stopping pagination", pages);
                return Ok(PageRun::Finished {
                    records: accumulated,
                    pages,
                    termination: TerminationCause::CursorRepeat,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;
    use transfer_core::{TokenInfo, TransferLeg};

    fn rec(id: &str, symbol: &str, amount: &str) -> TransferRecord {
        let leg = |symbol: &str| TransferLeg {
            token: Some(TokenInfo {
                symbol: symbol.to_string(),
                logo_uri: None,
            }),
            chain_id: 1,
            amount_usd: Some(amount.to_string()),
            timestamp: None,
            included_steps: vec![],
        };
        TransferRecord {
            transaction_id: id.to_string(),
            sending: leg(symbol),
            receiving: leg("USDC"),
            tool: Some("hop".to_string()),
            metadata: None,
            lifi_explorer_link: None,
        }
    }

    fn page(ids: &[&str], next: Option<&str>, has_next: bool) -> TransfersPage {
        TransfersPage {
            data: ids.iter().map(|id| rec(id, "ETH", "10")).collect(),
            next: next.map(str::to_string),
            has_next: Some(has_next),
            previous: None,
        }
    }

    /// Scripted page source: pops one prepared response per call, serving an
    /// empty page once the script runs out.
    struct ScriptedSource {
        pages: Mutex<VecDeque<std::result::Result<TransfersPage, u16>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(pages: Vec<std::result::Result<TransfersPage, u16>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferPageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _window: TimestampWindow,
            _cursor: Option<&str>,
        ) -> std::result::Result<TransfersPage, LifiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.lock().await.pop_front() {
                Some(Ok(page)) => Ok(page),
                Some(Err(status)) => Err(LifiError::Api {
                    status,
                    body: "scripted failure".to_string(),
                }),
                None => Ok(TransfersPage::default()),
            }
        }
    }

    fn orchestrator(
        source: ScriptedSource,
        max_pages: u32,
    ) -> FetchOrchestrator<ScriptedSource> {
        FetchOrchestrator::new(Arc::new(source), max_pages, RecordFilter::All)
    }

    fn window() -> TimestampWindow {
        TimestampWindow::for_date("2024-01-15").unwrap()
    }

    #[tokio::test]
    async fn test_empty_page_terminates() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a1", "a2"], Some("c1"), true)),
            Ok(page(&["a3"], Some("c2"), true)),
            Ok(page(&[], None, false)),
        ]);
        let orch = orchestrator(source, 100);

        let outcome = orch.run_cycle(window()).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                pages: 3,
                records: 3,
                termination: TerminationCause::Exhausted,
            }
        );

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.total_loaded, 3);
        assert_eq!(snapshot.state, CycleState::Completed);
        assert!(!snapshot.fetching);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.analysis.unwrap().total_txs, 3);
    }

    #[tokio::test]
    async fn test_has_next_false_terminates() {
        let source = ScriptedSource::new(vec![Ok(page(&["a1"], Some("c1"), false))]);
        let orch = orchestrator(source, 100);

        let outcome = orch.run_cycle(window()).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                pages: 1,
                records: 1,
                termination: TerminationCause::Exhausted,
            }
        );
        assert_eq!(orch.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_repeated_cursor_halts_pagination() {
        // Page 5 returns page 4's cursor; pagination must stop at page 5
        // with pages 1-5 accumulated, never fetching page 6.
        let source = ScriptedSource::new(vec![
            Ok(page(&["a1"], Some("c1"), true)),
            Ok(page(&["a2"], Some("c2"), true)),
            Ok(page(&["a3"], Some("c3"), true)),
            Ok(page(&["a4"], Some("c4"), true)),
            Ok(page(&["a5"], Some("c4"), true)),
            Ok(page(&["a6"], Some("c5"), true)),
        ]);
        let orch = orchestrator(source, 100);

        let outcome = orch.run_cycle(window()).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                pages: 5,
                records: 5,
                termination: TerminationCause::CursorRepeat,
            }
        );
        assert_eq!(orch.source.calls(), 5);
    }

    #[tokio::test]
    async fn test_page_cap_stops_with_warning_not_error() {
        let pages: Vec<std::result::Result<TransfersPage, u16>> = (0..10)
            .map(|i| {
                let id = format!("a{}", i);
                let cursor = format!("c{}", i);
                Ok(page(&[id.as_str()], Some(cursor.as_str()), true))
            })
            .collect();
        let orch = orchestrator(ScriptedSource::new(pages), 3);

        let outcome = orch.run_cycle(window()).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                pages: 3,
                records: 3,
                termination: TerminationCause::PageCap,
            }
        );
        assert_eq!(orch.source.calls(), 3);
        assert!(orch.snapshot().await.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_page_fails_cycle() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a1"], Some("c1"), true)),
            Err(502),
        ]);
        let orch = orchestrator(source, 100);

        let result = orch.run_cycle(window()).await;
        assert!(result.is_err());

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.state, CycleState::Failed);
        assert!(snapshot.error.unwrap().contains("502"));
        assert!(!snapshot.fetching);
        // No cycle ever completed, so nothing is published
        assert!(snapshot.analysis.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_aggregate_visible() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a1", "a2"], None, false)),
            Err(500),
            Err(500),
        ]);
        let orch = orchestrator(source, 100);

        orch.run_cycle(window()).await.unwrap();
        let result = orch.refresh().await;
        assert!(result.is_err());

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.state, CycleState::Failed);
        assert!(snapshot.error.is_some());
        // The aggregate from the completed cycle is still there
        assert_eq!(snapshot.analysis.unwrap().total_txs, 2);
    }

    #[tokio::test]
    async fn test_filter_toggle_reaggregates_without_refetch() {
        let source = ScriptedSource::new(vec![Ok(TransfersPage {
            data: vec![
                rec("a1", "WBTC", "100"),
                rec("a2", "ETH", "50"),
                rec("a3", "tBTC", "25"),
            ],
            next: None,
            has_next: Some(false),
            previous: None,
        })]);
        let orch = orchestrator(source, 100);

        orch.run_cycle(window()).await.unwrap();
        let calls_after_cycle = orch.source.calls();
        assert_eq!(orch.snapshot().await.analysis.unwrap().total_txs, 3);

        orch.set_filter(RecordFilter::BtcOnly).await;
        let first = orch.snapshot().await;
        assert_eq!(first.analysis.as_ref().unwrap().total_txs, 2);
        assert_eq!(first.filtered_count, 2);
        assert_eq!(first.total_loaded, 3);

        // Idempotent: applying the same filter again changes nothing
        orch.set_filter(RecordFilter::BtcOnly).await;
        let second = orch.snapshot().await;
        assert_eq!(first.analysis, second.analysis);

        assert_eq!(orch.source.calls(), calls_after_cycle);
    }

    #[tokio::test]
    async fn test_invalid_date_rejected_before_fetch() {
        let source = ScriptedSource::new(vec![Ok(page(&["a1"], None, false))]);
        let orch = orchestrator(source, 100);

        let result = orch.set_date("2024-13-45").await;
        assert!(matches!(result, Err(OrchestratorError::Window(_))));
        assert_eq!(orch.source.calls(), 0);
    }

    /// Page source whose dataset can be switched mid-flight: dataset 0 serves
    /// an endless stream of slow "a" pages, dataset 1 serves one final "b"
    /// page. Models the upstream changing under two overlapping cycles.
    struct SwitchSource {
        dataset: AtomicUsize,
        counter: AtomicUsize,
        delay_ms: u64,
    }

    #[async_trait]
    impl TransferPageSource for SwitchSource {
        async fn fetch_page(
            &self,
            _window: TimestampWindow,
            _cursor: Option<&str>,
        ) -> std::result::Result<TransfersPage, LifiError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            if self.dataset.load(Ordering::SeqCst) == 0 {
                Ok(TransfersPage {
                    data: vec![rec(&format!("a{}", n), "ETH", "10")],
                    next: Some(format!("cursor-{}", n)),
                    has_next: Some(true),
                    previous: None,
                })
            } else {
                Ok(TransfersPage {
                    data: vec![rec("b1", "WBTC", "77"), rec("b2", "ETH", "33")],
                    next: None,
                    has_next: Some(false),
                    previous: None,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_newer_cycle_supersedes_older() {
        let source = Arc::new(SwitchSource {
            dataset: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
            delay_ms: 20,
        });
        let orch = Arc::new(FetchOrchestrator::new(
            Arc::clone(&source),
            1000,
            RecordFilter::All,
        ));

        // Cycle A: endless slow pages
        let orch_a = Arc::clone(&orch);
        let handle_a = tokio::spawn(async move { orch_a.run_cycle(window()).await });

        // Let A get a page or two in flight, then start B on fresh data
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.dataset.store(1, Ordering::SeqCst);
        let outcome_b = orch.run_cycle(window()).await.unwrap();
        let outcome_a = handle_a.await.unwrap().unwrap();

        assert_eq!(outcome_a, CycleOutcome::Aborted);
        assert!(matches!(outcome_b, CycleOutcome::Completed { records: 2, .. }));

        // The published aggregate reflects only B's dataset
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.state, CycleState::Completed);
        assert_eq!(snapshot.total_loaded, 2);
        let analysis = snapshot.analysis.unwrap();
        assert_eq!(analysis.total_txs, 2);
        assert_eq!(analysis.total_volume, 110.0);
        let ids: Vec<&str> = analysis
            .top_transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }
}
