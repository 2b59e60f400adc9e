//! This crate provides the document tree and the oracle interface shared by the XML well-formedness probes.
//!
//! It is currently used by the [`xmlwf_xml`](../xmlwf_xml/index.html) oracle binding and the
//! [`xmlwf_probe`](../xmlwf_probe/index.html) classifier.
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

pub mod formatter;
pub mod model;
pub mod oracle;
