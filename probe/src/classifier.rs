use crate::differential::differential_probe;
use crate::sentinel::sentinel_probe;
use std::str;
use tracing::debug;
use xmlwf_api::model::Document;
use xmlwf_api::oracle::Oracle;

/// The outcome of the classification of an input.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Verdict {
    /// The input is well-formed. The tree is the oracle parse of the input.
    WellFormed(Document),
    Malformed,
}

impl Verdict {
    pub fn is_well_formed(&self) -> bool {
        matches!(self, Verdict::WellFormed(_))
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            Verdict::WellFormed(document) => Some(document),
            Verdict::Malformed => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Verdict::WellFormed(document) => Some(document),
            Verdict::Malformed => None,
        }
    }
}

/// Decides if `source` is a well-formed XML document using only `oracle`.
///
/// The sentinel probe catches oracles discarding the document and the differential probe
/// catches oracles splicing an error marker into it.
///
/// ```
/// use xmlwf_api::oracle::{FailureMode, Oracle};
/// use xmlwf_probe::classify;
/// use xmlwf_xml::DomOracle;
///
/// for mode in [FailureMode::Discard, FailureMode::Splice, FailureMode::Throw] {
///     let oracle = DomOracle::new(mode);
///     let verdict = classify(&oracle, "<a>b</a>");
///     assert_eq!(Some("<a>b</a>".to_owned()), verdict.document().map(|d| oracle.serialize(d)));
///     assert!(!classify(&oracle, "<a>b</c>").is_well_formed());
/// }
/// ```
pub fn classify<O: Oracle + ?Sized>(oracle: &O, source: &str) -> Verdict {
    match sentinel_probe(oracle, source) {
        Some(document) => differential_probe(oracle, source, document),
        None => Verdict::Malformed,
    }
}

/// Same as [`classify`](fn.classify.html) for raw bytes.
///
/// Only UTF-8 is supported: other inputs are malformed. A leading byte order mark is ignored.
pub fn classify_bytes<O: Oracle + ?Sized>(oracle: &O, source: &[u8]) -> Verdict {
    let source = source.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(source);
    match str::from_utf8(source) {
        Ok(source) => classify(oracle, source),
        Err(error) => {
            debug!(%error, "the input is not valid UTF-8");
            Verdict::Malformed
        }
    }
}

/// An oracle bundled with the well-formedness classification.
///
/// ```
/// use xmlwf_probe::Classifier;
/// use xmlwf_xml::DomOracle;
///
/// let classifier = Classifier::new(DomOracle::default());
/// assert!(classifier.classify("<doc/>").is_well_formed());
/// assert!(!classifier.classify_bytes(b"<doc>\xFF</doc>").is_well_formed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Classifier<O: Oracle> {
    oracle: O,
}

impl<O: Oracle> Classifier<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn classify(&self, source: &str) -> Verdict {
        classify(&self.oracle, source)
    }

    pub fn classify_bytes(&self, source: &[u8]) -> Verdict {
        classify_bytes(&self.oracle, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_accessors() {
        let verdict = Verdict::WellFormed(Document::default());
        assert!(verdict.is_well_formed());
        assert_eq!(Some(&Document::default()), verdict.document());
        assert_eq!(Some(Document::default()), verdict.into_document());
        assert!(!Verdict::Malformed.is_well_formed());
        assert_eq!(None, Verdict::Malformed.into_document());
    }
}
