use crate::fetch::{fetch_with_timeout, FetchText};
use crate::model::TestCase;
use crate::report::{Diagnostic, RunSummary, TestOutcome, TestResult};
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};
use xmlwf_api::oracle::Oracle;
use xmlwf_probe::{classify_bytes, Verdict};

pub const DEFAULT_CONCURRENCY: usize = 16;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Checks the classification of `source`, the content of the fixture of `test`.
///
/// A well-formed test passes only if the classifier tree serializes exactly like
/// the direct parse of the fixture by the oracle.
pub fn evaluate_test<O: Oracle + ?Sized>(
    oracle: &O,
    test: &TestCase,
    source: &[u8],
) -> TestOutcome {
    let source_xml = String::from_utf8_lossy(source).into_owned();
    let reference_serialization = oracle
        .parse(&source_xml)
        .ok()
        .map(|document| oracle.serialize(&document));
    let failure = |message: String| {
        TestOutcome::Failed(Diagnostic {
            href: test.url.clone(),
            message,
            expected_wellformed: test.expected_wellformed,
            source_xml: Some(source_xml.clone()),
            reference_serialization: reference_serialization.clone(),
        })
    };

    match (test.expected_wellformed, classify_bytes(oracle, source)) {
        (false, Verdict::Malformed) => TestOutcome::Passed,
        (false, Verdict::WellFormed(_)) => {
            failure("the document is classified well-formed".to_owned())
        }
        (true, Verdict::Malformed) => {
            failure("the document is classified malformed".to_owned())
        }
        (true, Verdict::WellFormed(document)) => {
            let serialization = oracle.serialize(&document);
            if reference_serialization.as_ref() == Some(&serialization) {
                TestOutcome::Passed
            } else {
                failure(format!(
                    "the classified tree serializes differently: {}",
                    serialization
                ))
            }
        }
    }
}

/// Runs tests concurrently.
///
/// Each task owns a clone of the oracle, fetches its fixture and evaluates it.
/// Failures, including fetch errors and panics, are contained in the test they
/// happen in.
pub struct TestRunner<O, F> {
    oracle: O,
    fetcher: Arc<F>,
    concurrency: usize,
    timeout: Duration,
}

impl<O, F> TestRunner<O, F>
where
    O: Oracle + Clone + Send + 'static,
    F: FetchText + 'static,
{
    pub fn new(oracle: O, fetcher: F) -> Self {
        Self {
            oracle,
            fetcher: Arc::new(fetcher),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Maximal number of tests evaluated at the same time.
    ///
    /// `1` evaluates them one after the other.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Maximal duration of a fixture fetch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, tests: Vec<TestCase>) -> RunSummary {
        let started_at = Utc::now();
        let total = tests.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        for test in tests {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let oracle = self.oracle.clone();
            let timeout = self.timeout;
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let evaluation = {
                    let test = test.clone();
                    tokio::spawn(async move {
                        match fetch_with_timeout(fetcher.as_ref(), &test.url, timeout).await {
                            Ok(source) => evaluate_test(&oracle, &test, &source),
                            Err(error) => {
                                TestOutcome::Failed(Diagnostic::reduced(&test, error.to_string()))
                            }
                        }
                    })
                };
                let outcome = evaluation.await.unwrap_or_else(|error| {
                    TestOutcome::Failed(Diagnostic::reduced(&test, join_error_message(error)))
                });
                TestResult {
                    test,
                    outcome,
                    date: Utc::now(),
                }
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    match &result.outcome {
                        TestOutcome::Passed => debug!(test = %result.test.url, "passed"),
                        TestOutcome::Failed(diagnostic) => {
                            warn!(
                                test = %result.test.url,
                                message = %diagnostic.message,
                                "failed"
                            )
                        }
                    }
                    results.push(result);
                }
                Err(error) => warn!(%error, "a test task did not complete"),
            }
        }
        results.sort_by(|a, b| a.test.url.cmp(&b.test.url));

        let passed = results
            .iter()
            .filter(|result| result.outcome.is_pass())
            .count();
        let summary = RunSummary {
            total,
            passed,
            results,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            passed = summary.passed,
            total = summary.total,
            elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
            "run finished"
        );
        summary
    }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_panic() {
        panic_message(error.into_panic().as_ref())
    } else {
        error.to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic".to_owned()
    }
}
