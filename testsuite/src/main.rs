use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xmlwf_testsuite::config::HarnessConfig;
use xmlwf_testsuite::evaluator::TestRunner;
use xmlwf_testsuite::fetch::Fetcher;
use xmlwf_testsuite::suite::{load_suites, regression_suite, xmlconf_suites};
use xmlwf_xml::DomOracle;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let (corpus_base, regressions_base) =
        match (config.corpus_base_iri(), config.regressions_base_iri()) {
            (Ok(corpus), Ok(regressions)) => (corpus, regressions),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "invalid configuration");
                return ExitCode::FAILURE;
            }
        };
    info!(
        corpus = corpus_base.as_str(),
        mode = %config.oracle_mode,
        concurrency = config.concurrency,
        "loading the test suites"
    );

    let client = match reqwest::Client::builder()
        .user_agent(concat!("xmlwf_testsuite/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "the HTTP client could not be built");
            return ExitCode::FAILURE;
        }
    };
    let fetcher = Fetcher::new(client);
    let mut tests = load_suites(
        &xmlconf_suites(),
        &corpus_base,
        &fetcher,
        config.fetch_timeout,
    )
    .await;
    tests.extend(
        regression_suite()
            .load(&regressions_base, &fetcher, config.fetch_timeout)
            .await,
    );

    let summary = TestRunner::new(DomOracle::new(config.oracle_mode), fetcher)
        .with_concurrency(config.concurrency)
        .with_timeout(config.fetch_timeout)
        .run(tests)
        .await;
    for diagnostic in summary.diagnostics() {
        println!("{}", diagnostic);
    }
    println!("{}", summary);
    if summary.failed() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
