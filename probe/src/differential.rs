//! Detection of oracles splicing an error marker into an otherwise intact tree.
//!
//! Oracles insert at most one marker per parse. Parsing the input again with a deliberately
//! broken trailer tells apart a document that already carries the marker of its own error
//! (same number of markers) from a clean document that only contains marker-like elements
//! (one more marker).

use crate::classifier::Verdict;
use tracing::debug;
use xmlwf_api::model::Document;
use xmlwf_api::oracle::{ErrorMarker, Oracle};

/// An unterminated processing instruction.
const BROKEN_TRAILER: &str = "<?";

/// Decides on `document`, the tree the sentinel probe got for `source`.
pub fn differential_probe<O: Oracle + ?Sized>(
    oracle: &O,
    source: &str,
    document: Document,
) -> Verdict {
    let marker = oracle.error_marker();
    let markers = count_error_markers(&document, marker);
    if markers == 0 {
        return Verdict::WellFormed(document);
    }

    let reference_markers = match oracle.parse(&format!("{}{}", source, BROKEN_TRAILER)) {
        Ok(reference) => count_error_markers(&reference, marker),
        // Same as a discarded document
        Err(_) => 0,
    };
    debug!(
        markers,
        reference_markers, "error markers found during the differential probe"
    );
    if markers == reference_markers {
        Verdict::Malformed
    } else {
        Verdict::WellFormed(document)
    }
}

/// Counts the marker elements strictly inside the document element.
///
/// ```
/// use xmlwf_api::model::{Document, Element};
/// use xmlwf_api::oracle::ErrorMarker;
/// use xmlwf_probe::count_error_markers;
///
/// let marker = Element::new("parsererror", Some(ErrorMarker::XHTML.namespace.to_owned()));
/// let mut root = marker.clone();
/// root.children.push(marker.into());
/// assert_eq!(1, count_error_markers(&Document::new(vec![root.into()]), ErrorMarker::XHTML));
/// ```
pub fn count_error_markers(document: &Document, marker: ErrorMarker) -> usize {
    document.document_element().map_or(0, |root| {
        root.descendants()
            .filter(|element| marker.matches(element))
            .count()
    })
}
