use std::error::Error;
use std::fmt;

/// Error met while building a document tree.
///
/// Namespace errors are distinguished from the other ones: a parser might recover from them
/// and keep building the tree.
#[derive(Debug)]
pub struct XmlError {
    pub(crate) kind: XmlErrorKind,
    pub(crate) position: TextPosition,
}

#[derive(Debug)]
pub enum XmlErrorKind {
    Xml(quick_xml::Error),
    Namespace(String),
    Other(String),
}

/// A 1-based line and byte column in the parsed source.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub(crate) fn from_offset(source: &str, offset: usize) -> Self {
        let before = &source.as_bytes()[..offset.min(source.len())];
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);
        Self {
            line: before.iter().filter(|b| **b == b'\n').count() + 1,
            column: before.len() - line_start + 1,
        }
    }
}

impl XmlError {
    pub(crate) fn new(kind: XmlErrorKind, source: &str, offset: usize) -> Self {
        Self {
            kind,
            position: TextPosition::from_offset(source, offset),
        }
    }

    /// Namespace constraint violations. The tree is complete when such an error is reported.
    pub fn is_namespace_error(&self) -> bool {
        matches!(self.kind, XmlErrorKind::Namespace(_))
    }

    pub fn position(&self) -> TextPosition {
        self.position
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error on line {} at column {}: ",
            self.position.line, self.position.column
        )?;
        match &self.kind {
            XmlErrorKind::Xml(error) => write!(f, "{}", error),
            XmlErrorKind::Namespace(message) => write!(f, "Namespace error: {}", message),
            XmlErrorKind::Other(message) => write!(f, "{}", message),
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            XmlErrorKind::Xml(quick_xml::Error::Io(error)) => Some(error),
            XmlErrorKind::Xml(quick_xml::Error::Utf8(error)) => Some(error),
            _ => None,
        }
    }
}
