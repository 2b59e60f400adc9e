use crate::model::TestCase;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone)]
pub struct TestResult {
    pub test: TestCase,
    pub outcome: TestOutcome,
    pub date: DateTime<Utc>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TestOutcome {
    Passed,
    Failed(Diagnostic),
}

impl TestOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            TestOutcome::Passed => None,
            TestOutcome::Failed(diagnostic) => Some(diagnostic),
        }
    }
}

/// What is known about a failed test.
///
/// When the fixture could not be fetched, `source_xml` and `reference_serialization` are `None`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Diagnostic {
    pub href: String,
    pub message: String,
    pub expected_wellformed: bool,
    pub source_xml: Option<String>,
    pub reference_serialization: Option<String>,
}

impl Diagnostic {
    /// A diagnostic without the fixture content.
    pub fn reduced(test: &TestCase, message: impl Into<String>) -> Self {
        Self {
            href: test.url.clone(),
            message: message.into(),
            expected_wellformed: test.expected_wellformed,
            source_xml: None,
            reference_serialization: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (expected {})",
            self.href,
            self.message,
            if self.expected_wellformed {
                "well-formed"
            } else {
                "malformed"
            }
        )?;
        if let Some(source) = &self.source_xml {
            write!(f, "\nsource:\n{}", source)?;
        }
        if let Some(reference) = &self.reference_serialization {
            write!(f, "\nreference serialization:\n{}", reference)?;
        }
        Ok(())
    }
}

/// The results of a run, sorted by test URL.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub results: Vec<TestResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.results
            .iter()
            .filter_map(|result| result.outcome.diagnostic())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} tests passed", self.passed, self.total)
    }
}
