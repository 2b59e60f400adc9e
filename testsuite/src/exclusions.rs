//! Tests the oracle is known not to support.

use std::fmt;

/// The `TEST` element attributes exclusion predicates look at.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Hash)]
pub struct TestAttributes<'a> {
    pub id: Option<&'a str>,
    pub uri: &'a str,
    pub kind: Option<&'a str>,
    pub entities: Option<&'a str>,
    pub version: Option<&'a str>,
    pub edition: Option<&'a str>,
}

/// A predicate returning `true` for the tests to exclude.
pub type ExclusionPredicate = fn(&TestAttributes<'_>) -> bool;

/// Per suite exclusions: a denylist of test URIs, as written in the manifest, and a predicate.
///
/// ```
/// use xmlwf_testsuite::exclusions::{default_predicate, Exclusions, TestAttributes};
///
/// let exclusions = Exclusions::new(&["valid/sa/012.xml"], default_predicate);
/// assert!(exclusions.excludes(&TestAttributes { uri: "valid/sa/012.xml", ..TestAttributes::default() }));
/// assert!(exclusions.excludes(&TestAttributes { uri: "a.xml", version: Some("1.1"), ..TestAttributes::default() }));
/// assert!(!exclusions.excludes(&TestAttributes { uri: "a.xml", kind: Some("not-wf"), ..TestAttributes::default() }));
/// ```
#[derive(Clone, Copy)]
pub struct Exclusions {
    pub uris: &'static [&'static str],
    pub predicate: ExclusionPredicate,
}

impl Exclusions {
    /// Excludes nothing.
    pub const NONE: Exclusions = Exclusions::new(&[], keep_all);

    pub const fn new(uris: &'static [&'static str], predicate: ExclusionPredicate) -> Self {
        Self { uris, predicate }
    }

    pub fn excludes(&self, test: &TestAttributes<'_>) -> bool {
        self.uris.iter().any(|uri| *uri == test.uri) || (self.predicate)(test)
    }
}

impl Default for Exclusions {
    fn default() -> Self {
        Self::new(&[], default_predicate)
    }
}

impl fmt::Debug for Exclusions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exclusions")
            .field("uris", &self.uris)
            .finish_non_exhaustive()
    }
}

/// Excludes the tests a non-validating XML 1.0 fifth edition parser that does not read
/// external entities can't pass:
/// * `TYPE="error"`: the behavior is up to the parser. `invalid` documents are kept, they are well-formed.
/// * `ENTITIES="parameter"` or `ENTITIES="both"`: they rely on external parameter entities.
/// * `VERSION="1.1"`.
/// * `EDITION` lists without the fifth edition.
pub fn default_predicate(test: &TestAttributes<'_>) -> bool {
    matches!(test.kind, Some("error"))
        || matches!(test.entities, Some("parameter") | Some("both"))
        || test.version == Some("1.1")
        || test
            .edition
            .map_or(false, |edition| !edition.split_whitespace().any(|e| e == "5"))
}

pub fn keep_all(_: &TestAttributes<'_>) -> bool {
    false
}
