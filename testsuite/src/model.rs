use std::fmt;

/// A conformance test: a fixture and whether it should be classified well-formed.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct TestCase {
    /// Absolute IRI of the fixture.
    pub url: String,
    pub expected_wellformed: bool,
}

impl TestCase {
    pub fn new(url: impl Into<String>, expected_wellformed: bool) -> Self {
        Self {
            url: url.into(),
            expected_wellformed,
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected_wellformed {
            write!(f, "well-formed test {}", self.url)
        } else {
            write!(f, "not well-formed test {}", self.url)
        }
    }
}
