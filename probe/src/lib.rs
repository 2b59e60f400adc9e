//! Well-formedness detection for XML documents on top of an opaque parser.
//!
//! The only information available is what an [`Oracle`](../xmlwf_api/oracle/trait.Oracle.html)
//! returns for a given input: a tree, possibly carrying an error marker element, or an error.
//! Two probes are combined to turn that into a binary verdict:
//! * the [sentinel probe](fn.sentinel_probe.html) appends a unique processing instruction to the
//!   input and checks that it is the last node of the returned tree. It catches oracles
//!   discarding or truncating the document.
//! * the [differential probe](fn.differential_probe.html) counts error markers in the tree and
//!   compares with a parse of the input followed by a broken trailer. It catches oracles splicing
//!   a marker into an otherwise intact tree while accepting documents that contain marker-like
//!   elements on their own.
//!
//! ```
//! use xmlwf_api::oracle::FailureMode;
//! use xmlwf_probe::{classify, Verdict};
//! use xmlwf_xml::DomOracle;
//!
//! let oracle = DomOracle::new(FailureMode::Splice);
//! assert_eq!(Verdict::Malformed, classify(&oracle, "<a xmlns:p=''/>"));
//! assert!(classify(&oracle, "<a xmlns='http://www.w3.org/1999/xhtml'><parsererror/></a>").is_well_formed());
//! ```
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_qualifications
)]
#![doc(test(attr(deny(warnings))))]

mod classifier;
mod differential;
mod sentinel;
mod token;

pub use classifier::{classify, classify_bytes, Classifier, Verdict};
pub use differential::{count_error_markers, differential_probe};
pub use sentinel::{sentinel_probe, sentinel_probe_with_token};
pub use token::SentinelToken;
