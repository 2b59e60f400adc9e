//! Detection of oracles discarding the whole document.
//!
//! A processing instruction appended after all the content of a well-formed document is part
//! of the document by the XML grammar. If it is not the last child of the parsed tree,
//! the oracle threw away what it read.

use crate::token::SentinelToken;
use tracing::{debug, trace};
use xmlwf_api::model::{Document, Node};
use xmlwf_api::oracle::Oracle;

/// Parses `source` followed by a `<?TOKEN?>` trailer with a fresh token.
///
/// Returns the tree without the trailer, or `None` if the trailer did not survive the parsing.
pub fn sentinel_probe<O: Oracle + ?Sized>(oracle: &O, source: &str) -> Option<Document> {
    sentinel_probe_with_token(oracle, source, &SentinelToken::generate())
}

pub fn sentinel_probe_with_token<O: Oracle + ?Sized>(
    oracle: &O,
    source: &str,
    token: &SentinelToken,
) -> Option<Document> {
    let mut document = match oracle.parse(&format!("{}<?{}?>", source, token)) {
        Ok(document) => document,
        Err(error) => {
            debug!(%error, "the oracle failed during the sentinel probe");
            return None;
        }
    };
    let has_trailer = matches!(
        document.last_child(),
        Some(Node::ProcessingInstruction(pi)) if pi.target == token.as_str() && pi.data.is_empty()
    );
    if !has_trailer {
        trace!(%token, "the sentinel trailer is missing");
        return None;
    }
    document.remove_last_child();
    Some(document)
}
