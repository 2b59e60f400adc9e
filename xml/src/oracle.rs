use crate::error::XmlError;
use crate::formatter::XmlFormatter;
use crate::parser::{DomParser, ParsedDocument, XMLNS_NAMESPACE};
use xmlwf_api::formatter::DocumentFormatter;
use xmlwf_api::model::{Attribute, Document, Element, Node};
use xmlwf_api::oracle::{ErrorMarker, FailureMode, Oracle, OracleError};

/// An [`Oracle`](../xmlwf_api/oracle/trait.Oracle.html) built on top of [`DomParser`](struct.DomParser.html)
/// and [`XmlFormatter`](struct.XmlFormatter.html).
///
/// It reports malformed inputs following its [`FailureMode`](../xmlwf_api/oracle/enum.FailureMode.html):
/// * `Discard`: the result is a document made of a single `parsererror` element in the
///   `http://www.mozilla.org/newlayout/xml/parsererror.xml` namespace.
/// * `Splice`: parsing goes on after namespace errors and stops after any other error.
///   One `parsererror` element in the XHTML namespace is then inserted as the first child
///   of the document element of what has been read.
/// * `Throw`: `parse` returns an error.
///
/// ```
/// use xmlwf_api::oracle::{ErrorMarker, FailureMode, Oracle};
/// use xmlwf_xml::DomOracle;
///
/// let oracle = DomOracle::new(FailureMode::Splice);
/// let document = oracle.parse("<a><p:b/></a>").unwrap();
/// let root = document.document_element().unwrap();
/// assert!(ErrorMarker::XHTML.matches(root.children[0].as_element().unwrap()));
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct DomOracle {
    mode: FailureMode,
}

impl DomOracle {
    pub fn new(mode: FailureMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FailureMode {
        self.mode
    }
}

impl Default for DomOracle {
    fn default() -> Self {
        Self::new(FailureMode::Splice)
    }
}

impl Oracle for DomOracle {
    fn parse(&self, source: &str) -> Result<Document, OracleError> {
        let ParsedDocument { document, error } = DomParser::new(source).parse();
        let error = match error {
            Some(error) => error,
            None => return Ok(document),
        };
        match self.mode {
            FailureMode::Discard => Ok(error_document(&error, source)),
            FailureMode::Splice => Ok(splice_error_marker(document, &error)),
            FailureMode::Throw => Err(OracleError::new(error.to_string())),
        }
    }

    fn serialize(&self, document: &Document) -> String {
        let mut formatter = XmlFormatter::new(Vec::default());
        // Writing into a Vec does not fail
        if formatter.format(document).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&formatter.finish()).into_owned()
    }

    fn error_marker(&self) -> ErrorMarker {
        match self.mode {
            FailureMode::Discard => ErrorMarker::MOZILLA,
            FailureMode::Splice | FailureMode::Throw => ErrorMarker::XHTML,
        }
    }
}

fn error_document(error: &XmlError, source: &str) -> Document {
    let namespace = ErrorMarker::MOZILLA.namespace;
    let mut report = marker_element(ErrorMarker::MOZILLA);
    report
        .children
        .push(Node::Text(format!("XML Parsing Error: {}", error)));
    let mut source_text = Element::new("sourcetext", Some(namespace.to_owned()));
    if let Some(line) = source.lines().nth(error.position().line - 1) {
        source_text.children.push(Node::Text(line.to_owned()));
    }
    report.children.push(source_text.into());
    Document::new(vec![report.into()])
}

fn splice_error_marker(mut document: Document, error: &XmlError) -> Document {
    let namespace = Some(ErrorMarker::XHTML.namespace.to_owned());
    let mut marker = marker_element(ErrorMarker::XHTML);
    let mut title = Element::new("h3", namespace.clone());
    title.children.push(Node::Text(
        "This page contains the following errors:".to_owned(),
    ));
    let mut message = Element::new("div", namespace.clone());
    message.children.push(Node::Text(format!("{}\n", error)));
    let mut footer = Element::new("h3", namespace);
    footer.children.push(Node::Text(
        "Below is a rendering of the page up to the first error.".to_owned(),
    ));
    marker.children = vec![title.into(), message.into(), footer.into()];

    match document.document_element_mut() {
        Some(root) => {
            root.children.insert(0, marker.into());
            document
        }
        // Nothing to splice the marker into
        None => Document::new(vec![marker.into()]),
    }
}

fn marker_element(marker: ErrorMarker) -> Element {
    let mut element = Element::new(marker.local_name, Some(marker.namespace.to_owned()));
    element.attributes.push(Attribute {
        name: "xmlns".to_owned(),
        namespace: Some(XMLNS_NAMESPACE.to_owned()),
        value: marker.namespace.to_owned(),
    });
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_replaces_the_document() {
        let oracle = DomOracle::new(FailureMode::Discard);
        let document = oracle.parse("<a>\n<b></a>").unwrap();
        assert_eq!(1, document.children.len());
        let root = document.document_element().unwrap();
        assert!(ErrorMarker::MOZILLA.matches(root));
        let source_text = root.children[1].as_element().unwrap();
        assert_eq!("sourcetext", source_text.name);
        assert_eq!(vec![Node::Text("<b></a>".to_owned())], source_text.children);
    }

    #[test]
    fn splice_keeps_the_partial_tree() {
        let oracle = DomOracle::new(FailureMode::Splice);
        let document = oracle.parse("<a><b>text</b><c>").unwrap();
        let root = document.document_element().unwrap();
        assert_eq!("a", root.name);
        assert!(ErrorMarker::XHTML.matches(root.children[0].as_element().unwrap()));
        assert_eq!("b", root.children[1].as_element().unwrap().name);
    }

    #[test]
    fn splice_without_document_element() {
        let oracle = DomOracle::new(FailureMode::Splice);
        let document = oracle.parse("not xml").unwrap();
        assert_eq!(1, document.children.len());
        assert!(ErrorMarker::XHTML.matches(document.document_element().unwrap()));
    }

    #[test]
    fn throw_returns_an_error() {
        let oracle = DomOracle::new(FailureMode::Throw);
        let error = oracle.parse("<a>").unwrap_err();
        assert!(error.message().contains("Premature end of data"));
        assert!(oracle.parse("<a/>").is_ok());
    }

    #[test]
    fn markers_depend_on_the_mode() {
        assert_eq!(
            ErrorMarker::MOZILLA,
            DomOracle::new(FailureMode::Discard).error_marker()
        );
        assert_eq!(ErrorMarker::XHTML, DomOracle::default().error_marker());
    }
}
