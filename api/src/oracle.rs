//! The interface to an opaque XML parser used as a well-formedness oracle.
//!
//! An oracle never says in a uniform way that its input was malformed.
//! Depending on its [`FailureMode`](enum.FailureMode.html) it might discard the tree and return
//! a synthetic error document, splice an error marker element into an otherwise intact tree,
//! or fail with an [`OracleError`](struct.OracleError.html).

use crate::model::{Document, Element};
use std::error::Error;
use std::fmt;

/// A black-box XML parser and serializer.
pub trait Oracle {
    /// Parses `source` into a document tree.
    ///
    /// Returning an error is equivalent to discarding the document.
    fn parse(&self, source: &str) -> Result<Document, OracleError>;

    /// Serializes a tree returned by [`parse`](#tymethod.parse).
    ///
    /// It must be total and deterministic.
    fn serialize(&self, document: &Document) -> String;

    /// The synthetic element this oracle uses to report errors.
    fn error_marker(&self) -> ErrorMarker;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn parse(&self, source: &str) -> Result<Document, OracleError> {
        (**self).parse(source)
    }

    fn serialize(&self, document: &Document) -> String {
        (**self).serialize(document)
    }

    fn error_marker(&self) -> ErrorMarker {
        (**self).error_marker()
    }
}

/// How an oracle signals a malformed input.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum FailureMode {
    /// The whole tree is replaced by a document made of a single error report element.
    Discard,
    /// One error marker element is inserted as the first child of the document element,
    /// the rest of the tree is kept.
    Splice,
    /// [`Oracle::parse`](trait.Oracle.html#tymethod.parse) returns an error.
    Throw,
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureMode::Discard => write!(f, "discard"),
            FailureMode::Splice => write!(f, "splice"),
            FailureMode::Throw => write!(f, "throw"),
        }
    }
}

/// The expanded name of the element an oracle uses to report errors.
///
/// ```
/// use xmlwf_api::model::Element;
/// use xmlwf_api::oracle::ErrorMarker;
///
/// let marker = Element::new("parsererror", Some("http://www.w3.org/1999/xhtml".to_owned()));
/// assert!(ErrorMarker::XHTML.matches(&marker));
/// assert!(!ErrorMarker::MOZILLA.matches(&marker));
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ErrorMarker {
    pub namespace: &'static str,
    pub local_name: &'static str,
}

impl ErrorMarker {
    /// The marker of parsers that replace the whole document on error.
    pub const MOZILLA: ErrorMarker = ErrorMarker {
        namespace: "http://www.mozilla.org/newlayout/xml/parsererror.xml",
        local_name: "parsererror",
    };

    /// The marker of parsers that splice the error report into the document element.
    pub const XHTML: ErrorMarker = ErrorMarker {
        namespace: "http://www.w3.org/1999/xhtml",
        local_name: "parsererror",
    };

    pub fn matches(&self, element: &Element) -> bool {
        element.namespace.as_deref() == Some(self.namespace)
            && element.local_name() == self.local_name
    }
}

impl fmt::Display for ErrorMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// Error returned by an oracle that gave up on its input.
#[derive(Debug, Clone)]
pub struct OracleError {
    message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for OracleError {}
