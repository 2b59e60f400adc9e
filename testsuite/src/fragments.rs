//! Scanner for test lists that are sequences of `TEST` elements without any enclosing document.
//!
//! Such lists are not well-formed XML documents as a whole, so each `TEST` fragment is cut out of
//! the raw text and read on its own as an attribute manifest.

use crate::exclusions::Exclusions;
use crate::manifest::parse_attribute_manifest;
use crate::model::TestCase;
use oxiri::Iri;
use tracing::warn;

/// Iterator on the `<TEST ...>...</TEST>` and `<TEST .../>` fragments of a text.
///
/// The scan stops at the first `TEST` start tag without an end.
///
/// ```
/// use xmlwf_testsuite::fragments::TestFragments;
///
/// let text = "<TEST URI='a.xml'>A</TEST>\n<TESTCASES/><TEST URI='b.xml'/><TEST URI='c.xml'>";
/// assert_eq!(
///     vec!["<TEST URI='a.xml'>A</TEST>", "<TEST URI='b.xml'/>"],
///     TestFragments::new(text).collect::<Vec<_>>()
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TestFragments<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> TestFragments<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    fn next_start(&self) -> Option<usize> {
        let mut from = self.position;
        loop {
            let start = from + self.text[from..].find("<TEST")?;
            let after = start + "<TEST".len();
            match self.text[after..].chars().next() {
                Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => return Some(start),
                Some(_) => from = after,
                None => return None,
            }
        }
    }
}

impl<'a> Iterator for TestFragments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.next_start();
        let end = start.and_then(|start| fragment_end(self.text, start));
        match (start, end) {
            (Some(start), Some(end)) => {
                self.position = end;
                Some(&self.text[start..end])
            }
            _ => {
                self.position = self.text.len();
                None
            }
        }
    }
}

/// Byte position after the fragment starting at `start`.
fn fragment_end(text: &str, start: usize) -> Option<usize> {
    let mut quote = None;
    let mut tag_end = None;
    for (i, c) in text[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => (),
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => {
                tag_end = Some(start + i);
                break;
            }
            (None, _) => (),
        }
    }
    let tag_end = tag_end?;
    if text[..tag_end].ends_with('/') {
        return Some(tag_end + 1);
    }
    let mut from = tag_end + 1;
    loop {
        let close = from + text[from..].find("</TEST")?;
        let after = close + "</TEST".len();
        let rest = &text[after..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with('>') {
            return Some(after + (rest.len() - trimmed.len()) + 1);
        }
        from = after;
    }
}

/// Reads the tests of a concatenation of `TEST` fragments.
///
/// Fragments that are not well-formed are skipped.
pub fn parse_fragment_manifest(
    content: &str,
    base: &Iri<String>,
    exclusions: &Exclusions,
) -> Vec<TestCase> {
    let mut tests = Vec::default();
    for fragment in TestFragments::new(content) {
        match parse_attribute_manifest(fragment, base, exclusions) {
            Ok(fragment_tests) => tests.extend(fragment_tests),
            Err(error) => warn!(%error, fragment, base = base.as_str(), "skipping a TEST fragment"),
        }
    }
    tests
}
