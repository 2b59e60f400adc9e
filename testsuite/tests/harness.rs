use async_trait::async_trait;
use oxiri::Iri;
use std::time::Duration;
use xmlwf_api::model::Document;
use xmlwf_api::oracle::{ErrorMarker, FailureMode, Oracle, OracleError};
use xmlwf_testsuite::evaluator::TestRunner;
use xmlwf_testsuite::exclusions::{default_predicate, Exclusions};
use xmlwf_testsuite::fetch::{FetchError, FetchText, Fetcher};
use xmlwf_testsuite::model::TestCase;
use xmlwf_testsuite::report::{RunSummary, TestOutcome};
use xmlwf_testsuite::suite::{load_suites, regression_suite, Suite, SuiteSource};
use xmlwf_xml::DomOracle;

const TIMEOUT: Duration = Duration::from_secs(10);

fn fixtures_base() -> Iri<String> {
    Iri::parse(format!(
        "file://{}/tests/fixtures/",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn fixture(path: &str) -> String {
    fixtures_base().resolve(path).unwrap().into_inner()
}

fn attribute_suite() -> Suite {
    Suite {
        name: "fixtures",
        source: SuiteSource::Attributes(&["manifest.xml"]),
        exclusions: Exclusions::new(&["not-wf/denied.xml"], default_predicate),
    }
}

fn fragment_suite() -> Suite {
    Suite {
        name: "fragments",
        source: SuiteSource::Fragments(&["fragments.xml"]),
        exclusions: Exclusions::default(),
    }
}

fn assert_all_passed(summary: &RunSummary) {
    let failures = summary
        .diagnostics()
        .map(|d| d.to_string())
        .collect::<Vec<_>>();
    assert!(failures.is_empty(), "\n{}\n", failures.join("\n"));
    assert_eq!(summary.total, summary.passed);
}

#[tokio::test]
async fn attribute_manifest() {
    let tests = attribute_suite()
        .load(&fixtures_base(), &Fetcher::default(), TIMEOUT)
        .await;
    assert_eq!(
        vec![
            TestCase::new(fixture("wf/simple.xml"), true),
            TestCase::new(fixture("wf/namespaces.xml"), true),
            TestCase::new(fixture("wf/marker.xml"), true),
            TestCase::new(fixture("wf/pi-trailer.xml"), true),
            TestCase::new(fixture("wf/bom.xml"), true),
            TestCase::new(fixture("not-wf/unclosed.xml"), false),
            TestCase::new(fixture("not-wf/unbound-prefix.xml"), false),
            TestCase::new(fixture("not-wf/xmlns-default.xml"), false),
            TestCase::new(fixture("not-wf/two-roots.xml"), false),
            TestCase::new(fixture("not-wf/latin1.xml"), false),
        ],
        tests
    );
}

#[tokio::test]
async fn fragment_manifest() {
    let tests = fragment_suite()
        .load(&fixtures_base(), &Fetcher::default(), TIMEOUT)
        .await;
    assert_eq!(
        vec![
            TestCase::new(fixture("wf/simple.xml"), true),
            TestCase::new(fixture("not-wf/unclosed.xml"), false),
            TestCase::new(fixture("not-wf/unbound-prefix.xml"), false),
        ],
        tests
    );
}

#[tokio::test]
async fn broken_or_missing_manifests_give_no_test() {
    let suites = [
        Suite {
            name: "broken",
            source: SuiteSource::Attributes(&["broken.xml", "missing.xml"]),
            exclusions: Exclusions::default(),
        },
        Suite {
            name: "missing fragments",
            source: SuiteSource::Fragments(&["missing.xml"]),
            exclusions: Exclusions::default(),
        },
    ];
    let tests = load_suites(&suites, &fixtures_base(), &Fetcher::default(), TIMEOUT).await;
    assert!(tests.is_empty());
}

#[tokio::test]
async fn static_suite() {
    let suite = Suite {
        name: "static",
        source: SuiteSource::Static(&[("wf/simple.xml", true), ("not-wf/denied.xml", false)]),
        exclusions: Exclusions::new(&["not-wf/denied.xml"], default_predicate),
    };
    let tests = suite
        .load(&fixtures_base(), &Fetcher::default(), TIMEOUT)
        .await;
    assert_eq!(vec![TestCase::new(fixture("wf/simple.xml"), true)], tests);
}

#[tokio::test]
async fn fixtures_pass_in_every_mode() {
    let fetcher = Fetcher::default();
    let tests = load_suites(
        &[attribute_suite(), fragment_suite()],
        &fixtures_base(),
        &fetcher,
        TIMEOUT,
    )
    .await;
    assert_eq!(13, tests.len());
    for mode in [FailureMode::Discard, FailureMode::Splice, FailureMode::Throw] {
        let summary = TestRunner::new(DomOracle::new(mode), fetcher.clone())
            .run(tests.clone())
            .await;
        assert_all_passed(&summary);
        assert_eq!(13, summary.total);
        assert_eq!("13/13 tests passed", summary.to_string());
    }
}

#[tokio::test]
async fn regressions_pass() {
    let base = Iri::parse(format!(
        "file://{}/regressions/",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let fetcher = Fetcher::default();
    let tests = regression_suite().load(&base, &fetcher, TIMEOUT).await;
    assert_eq!(7, tests.len());
    let summary = TestRunner::new(DomOracle::default(), fetcher)
        .run(tests)
        .await;
    assert_all_passed(&summary);
}

#[tokio::test]
async fn concurrency_does_not_change_results() {
    let fetcher = Fetcher::default();
    let tests = load_suites(
        &[attribute_suite(), fragment_suite()],
        &fixtures_base(),
        &fetcher,
        TIMEOUT,
    )
    .await;
    let verdicts = |summary: RunSummary| {
        summary
            .results
            .into_iter()
            .map(|result| (result.test, result.outcome))
            .collect::<Vec<_>>()
    };
    let sequential = TestRunner::new(DomOracle::default(), fetcher).with_concurrency(1);
    let sequential_summary = sequential.run(tests.clone()).await;
    let concurrent_summary = sequential.with_concurrency(8).run(tests).await;
    assert_eq!(sequential_summary.passed, concurrent_summary.passed);
    assert_eq!(verdicts(sequential_summary), verdicts(concurrent_summary));
}

#[tokio::test]
async fn failures_are_reported() {
    let tests = vec![
        TestCase::new(fixture("wf/simple.xml"), false),
        TestCase::new(fixture("not-wf/unclosed.xml"), true),
        TestCase::new(fixture("wf/missing.xml"), true),
        TestCase::new(fixture("wf/pi-trailer.xml"), true),
    ];
    let summary = TestRunner::new(DomOracle::default(), Fetcher::default())
        .run(tests)
        .await;
    assert_eq!(4, summary.total);
    assert_eq!(1, summary.passed);
    assert_eq!(3, summary.failed());
    assert_eq!("1/4 tests passed", summary.to_string());

    let diagnostics = summary.diagnostics().collect::<Vec<_>>();
    assert_eq!(3, diagnostics.len());
    // Sorted by URL: not-wf/unclosed.xml, wf/missing.xml, wf/simple.xml
    assert_eq!(fixture("not-wf/unclosed.xml"), diagnostics[0].href);
    assert_eq!("the document is classified malformed", diagnostics[0].message);
    assert_eq!(Some("<doc>\n"), diagnostics[0].source_xml.as_deref());

    assert_eq!(fixture("wf/missing.xml"), diagnostics[1].href);
    assert!(diagnostics[1].expected_wellformed);
    assert_eq!(None, diagnostics[1].source_xml);
    assert_eq!(None, diagnostics[1].reference_serialization);

    assert_eq!(fixture("wf/simple.xml"), diagnostics[2].href);
    assert_eq!("the document is classified well-formed", diagnostics[2].message);
    assert_eq!(
        Some("<doc>Hello</doc>"),
        diagnostics[2].reference_serialization.as_deref()
    );
}

/// Never answers for URLs containing "slow".
#[derive(Clone)]
struct SlowFetcher;

#[async_trait]
impl FetchText for SlowFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.contains("slow") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(b"<doc/>".to_vec())
    }
}

#[tokio::test]
async fn fetch_timeouts_fail_the_test_only() {
    let tests = vec![
        TestCase::new("http://example.com/slow.xml", true),
        TestCase::new("http://example.com/fast.xml", true),
    ];
    let summary = TestRunner::new(DomOracle::default(), SlowFetcher)
        .with_timeout(Duration::from_millis(50))
        .run(tests)
        .await;
    assert_eq!(2, summary.total);
    assert_eq!(1, summary.passed);
    let diagnostic = summary.diagnostics().next().unwrap();
    assert_eq!("http://example.com/slow.xml", diagnostic.href);
    assert!(diagnostic.message.contains("was not retrieved"));
}

/// Panics on documents containing "panic".
#[derive(Clone, Copy)]
struct PanickingOracle;

impl Oracle for PanickingOracle {
    fn parse(&self, source: &str) -> Result<Document, OracleError> {
        if source.contains("panic") {
            panic!("the oracle crashed");
        }
        DomOracle::default().parse(source)
    }

    fn serialize(&self, document: &Document) -> String {
        DomOracle::default().serialize(document)
    }

    fn error_marker(&self) -> ErrorMarker {
        ErrorMarker::XHTML
    }
}

/// Serves its URL as the document.
#[derive(Clone)]
struct EchoFetcher;

#[async_trait]
impl FetchText for EchoFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(format!("<{}/>", url.trim_start_matches("urn:")).into_bytes())
    }
}

#[tokio::test]
async fn panics_fail_the_test_only() {
    let tests = vec![
        TestCase::new("urn:panic", true),
        TestCase::new("urn:fine", true),
    ];
    let summary = TestRunner::new(PanickingOracle, EchoFetcher)
        .run(tests)
        .await;
    assert_eq!(2, summary.total);
    assert_eq!(1, summary.passed);
    assert!(matches!(
        &summary.results[1].outcome,
        TestOutcome::Failed(diagnostic) if diagnostic.message == "panic: the oracle crashed"
    ));
}

/// Panics for URLs containing "boom".
#[derive(Clone)]
struct ExplodingFetcher;

#[async_trait]
impl FetchText for ExplodingFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.contains("boom") {
            panic!("the transport crashed");
        }
        Ok(b"<doc/>".to_vec())
    }
}

#[tokio::test]
async fn fetch_panics_fail_the_test_only() {
    let tests = vec![
        TestCase::new("http://example.com/boom.xml", true),
        TestCase::new("http://example.com/fine.xml", true),
    ];
    let summary = TestRunner::new(DomOracle::default(), ExplodingFetcher)
        .run(tests)
        .await;
    assert_eq!(2, summary.total);
    assert_eq!(summary.total, summary.results.len());
    assert_eq!(1, summary.passed);
    assert_eq!(summary.failed(), summary.diagnostics().count());
    let diagnostic = summary.diagnostics().next().unwrap();
    assert_eq!("http://example.com/boom.xml", diagnostic.href);
    assert_eq!("panic: the transport crashed", diagnostic.message);
    assert_eq!(None, diagnostic.source_xml);
}
