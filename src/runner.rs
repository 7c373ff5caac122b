//! One full pass over the basket, ending in exactly one artifact.
//!
//! Browser sessions are scoped: each is released before the artifact is
//! written, on every path out of the collection phase, including a session
//! that never opened. A panic inside one item is that item's failure; a
//! panic anywhere else ends collection early.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::archiver;
use crate::browser::Browser;
use crate::config::Config;
use crate::error::{ArchiveError, BrowserError, FetchError, RunFatal};
use crate::fetcher::{ItemFetcher, ItemOutcome, panic_message};
use crate::models::{ProductQuery, RunRecord};

#[derive(Debug)]
pub struct ItemFailure {
    pub query: String,
    pub error: FetchError,
}

#[derive(Debug)]
pub struct RunReport {
    pub artifact: PathBuf,
    pub record: RunRecord,
    /// Basket entries without a record, in basket order.
    pub misses: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub fatal: Vec<RunFatal>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty() && self.fatal.is_empty()
    }
}

/// Releases the browser when dropped.
struct Session<B: Browser> {
    browser: B,
}

impl<B: Browser> Drop for Session<B> {
    fn drop(&mut self) {
        self.browser.release();
    }
}

/// Collects every basket item and writes the run artifact.
///
/// `open` is called once per session: once for a sequential run, once per
/// worker when `config.workers > 1`. Misses, item failures, and session
/// failures are reported, never raised; only a failed write is an error.
///
/// # Errors
///
/// Returns `ArchiveError` if the artifact cannot be serialized or written.
pub fn run<B, F>(config: &Config, run_date: NaiveDate, open: F) -> Result<RunReport, ArchiveError>
where
    B: Browser,
    F: Fn() -> Result<B, BrowserError> + Sync,
{
    let fetcher = ItemFetcher {
        search_url: &config.search_url,
        settle: config.settle,
        profile: &config.site,
    };
    let basket = config.basket.as_slice();

    info!(
        source = %config.source_name,
        date = %run_date,
        items = basket.len(),
        workers = config.workers,
        "run started"
    );

    let mut outcomes: Vec<Option<ItemOutcome>> = (0..basket.len()).map(|_| None).collect();
    let mut fatal = Vec::new();

    let collected = panic::catch_unwind(AssertUnwindSafe(|| {
        if config.workers > 1 {
            collect_pooled(&fetcher, basket, config, &open, &mut outcomes, &mut fatal);
        } else {
            collect_sequential(&fetcher, basket, config.pacing, &open, &mut outcomes, &mut fatal);
        }
    }));
    if let Err(payload) = collected {
        let reason = panic_message(payload.as_ref());
        error!("run aborted: {reason}");
        fatal.push(RunFatal::Panicked(reason));
    }

    info!("finalizing run");
    let mut record = RunRecord::new(run_date, config.source_name.clone());
    let mut failures = Vec::new();
    for (query, outcome) in basket.iter().zip(outcomes) {
        match outcome {
            Some(ItemOutcome::Hit(item)) => record.push(item),
            Some(ItemOutcome::Failed(error)) => failures.push(ItemFailure {
                query: query.query_term.clone(),
                error,
            }),
            Some(ItemOutcome::Miss) | None => {}
        }
    }
    let misses = record.misses(basket).into_iter().map(str::to_owned).collect();

    let artifact = archiver::save_run(&record, &config.output_dir)?;
    info!(
        source = record.source_name(),
        path = %artifact.display(),
        captured = record.items().len(),
        requested = basket.len(),
        "run done"
    );

    Ok(RunReport {
        artifact,
        record,
        misses,
        failures,
        fatal,
    })
}

fn collect_sequential<B, F>(
    fetcher: &ItemFetcher<'_>,
    basket: &[ProductQuery],
    pacing: Duration,
    open: &F,
    outcomes: &mut [Option<ItemOutcome>],
    fatal: &mut Vec<RunFatal>,
) where
    B: Browser,
    F: Fn() -> Result<B, BrowserError>,
{
    let mut session = match open() {
        Ok(browser) => Session { browser },
        Err(e) => {
            error!("could not start browser session: {e}");
            fatal.push(RunFatal::Session(e));
            return;
        }
    };

    for (i, query) in basket.iter().enumerate() {
        if i > 0 {
            pace(pacing);
        }
        outcomes[i] = Some(fetcher.fetch(&mut session.browser, query));
    }
}

enum WorkerEvent {
    Outcome(usize, ItemOutcome),
    Fatal(BrowserError),
}

/// Spreads the basket over `config.workers` threads, each with its own
/// session. Queries are claimed from a shared counter, so a worker whose
/// session fails to open leaves its share to the others.
fn collect_pooled<B, F>(
    fetcher: &ItemFetcher<'_>,
    basket: &[ProductQuery],
    config: &Config,
    open: &F,
    outcomes: &mut [Option<ItemOutcome>],
    fatal: &mut Vec<RunFatal>,
) where
    B: Browser,
    F: Fn() -> Result<B, BrowserError> + Sync,
{
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for worker in 0..config.workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || {
                let mut session = match open() {
                    Ok(browser) => Session { browser },
                    Err(e) => {
                        error!(worker, "could not start browser session: {e}");
                        let _ = tx.send(WorkerEvent::Fatal(e));
                        return;
                    }
                };
                let mut first = true;
                loop {
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    let Some(query) = basket.get(i) else { break };
                    if !first {
                        pace(config.pacing);
                    }
                    first = false;
                    let outcome = fetcher.fetch(&mut session.browser, query);
                    if tx.send(WorkerEvent::Outcome(i, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for event in rx {
            match event {
                WorkerEvent::Outcome(i, outcome) => outcomes[i] = Some(outcome),
                WorkerEvent::Fatal(e) => fatal.push(RunFatal::Session(e)),
            }
        }
    });

    let unclaimed = outcomes.iter().filter(|o| o.is_none()).count();
    if unclaimed > 0 {
        warn!(unclaimed, "no worker session was available for some items");
    }
}

fn pace(pacing: Duration) {
    if !pacing.is_zero() {
        thread::sleep(pacing);
    }
}
