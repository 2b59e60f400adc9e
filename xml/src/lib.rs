//! Implementation of a namespace-aware XML tree builder and serializer usable as a well-formedness oracle.
//!
//! How to parse a document and serialize it back:
//! ```
//! use xmlwf_api::oracle::{FailureMode, Oracle};
//! use xmlwf_xml::DomOracle;
//!
//! let oracle = DomOracle::new(FailureMode::Discard);
//! let document = oracle.parse("<?xml version='1.0'?>\n<doc a='1'><e/>text</doc>").unwrap();
//! assert_eq!("<doc a=\"1\"><e/>text</doc>", oracle.serialize(&document));
//! ```
//!
//! The oracle can mimic the two ways parsers usually report malformed input, see [`DomOracle`](struct.DomOracle.html).
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

mod error;
mod formatter;
mod oracle;
mod parser;

pub use error::{TextPosition, XmlError};
pub use formatter::XmlFormatter;
pub use oracle::DomOracle;
pub use parser::{DomParser, ParsedDocument, XMLNS_NAMESPACE, XML_NAMESPACE};
