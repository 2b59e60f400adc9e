use quick_xml::events::*;
use quick_xml::Writer;
use std::io;
use std::io::Write;
use xmlwf_api::formatter::DocumentFormatter;
use xmlwf_api::model::{Document, Element, Node};

/// A serializer for document trees.
///
/// It implements the `DocumentFormatter` trait.
/// Elements without children are written as empty element tags, attributes keep their order
/// and no XML declaration is added.
///
/// Write a document into a `Vec` buffer:
/// ```
/// use xmlwf_api::formatter::DocumentFormatter;
/// use xmlwf_api::model::{Document, Element, Node};
/// use xmlwf_xml::XmlFormatter;
///
/// let mut root = Element::new("root", None);
/// root.children.push(Node::Text("a < b".to_owned()));
/// let mut formatter = XmlFormatter::new(Vec::default());
/// formatter.format(&Document::new(vec![root.into()]))?;
/// assert_eq!("<root>a &lt; b</root>", String::from_utf8_lossy(&formatter.finish()));
/// # std::io::Result::Ok(())
/// ```
pub struct XmlFormatter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlFormatter<W> {
    /// Builds a new formatter from a `Write` implementation
    pub fn new(write: W) -> Self {
        Self {
            writer: Writer::new(write),
        }
    }

    /// Finishes writing and returns the underlying `Write`
    pub fn finish(self) -> W {
        self.writer.into_inner()
    }

    fn write_node(&mut self, node: &Node) -> Result<(), io::Error> {
        match node {
            Node::Element(element) => self.write_element(element)?,
            Node::Text(text) => {
                self.writer
                    .write_event(Event::Text(BytesText::from_plain_str(text)))
                    .map_err(map_err)?;
            }
            Node::CData(content) => {
                self.writer
                    .write_event(Event::CData(BytesText::from_escaped_str(content.as_str())))
                    .map_err(map_err)?;
            }
            Node::Comment(content) => {
                self.writer
                    .write_event(Event::Comment(BytesText::from_escaped_str(
                        content.as_str(),
                    )))
                    .map_err(map_err)?;
            }
            Node::ProcessingInstruction(pi) => {
                let content = if pi.data.is_empty() {
                    pi.target.clone()
                } else {
                    format!("{} {}", pi.target, pi.data)
                };
                self.writer
                    .write_event(Event::PI(BytesText::from_escaped_str(content)))
                    .map_err(map_err)?;
            }
            Node::DocumentType(content) => {
                self.writer
                    .write_event(Event::DocType(BytesText::from_escaped_str(format!(
                        " {}",
                        content
                    ))))
                    .map_err(map_err)?;
            }
        }
        Ok(())
    }

    fn write_element(&mut self, element: &Element) -> Result<(), io::Error> {
        let mut start = BytesStart::borrowed_name(element.name.as_bytes());
        for attribute in &element.attributes {
            start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
        }
        if element.children.is_empty() {
            self.writer
                .write_event(Event::Empty(start))
                .map_err(map_err)?;
            return Ok(());
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(map_err)?;
        for child in &element.children {
            self.write_node(child)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::borrowed(element.name.as_bytes())))
            .map_err(map_err)?;
        Ok(())
    }
}

impl<W: Write> DocumentFormatter for XmlFormatter<W> {
    type Error = io::Error;

    fn format(&mut self, document: &Document) -> Result<(), io::Error> {
        for node in &document.children {
            self.write_node(node)?;
        }
        Ok(())
    }
}

fn map_err(error: quick_xml::Error) -> io::Error {
    if let quick_xml::Error::Io(error) = error {
        error
    } else {
        io::Error::new(io::ErrorKind::Other, error)
    }
}
