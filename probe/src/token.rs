use std::fmt;
use uuid::Uuid;

/// A processing instruction target very unlikely to appear in real content.
///
/// ```
/// use xmlwf_probe::SentinelToken;
///
/// let token = SentinelToken::generate();
/// assert!(token.as_str().starts_with("wf"));
/// assert_ne!(token, SentinelToken::generate());
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SentinelToken(String);

impl SentinelToken {
    pub fn generate() -> Self {
        // The prefix keeps it a valid name that does not start with "xml"
        Self(format!("wf{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SentinelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
