//! Data structures for the document trees returned by XML parsers.
//!
//! They mirror the subset of the [DOM](https://dom.spec.whatwg.org/) node types an XML parser builds:
//! a document node owning elements, character data, comments, processing instructions and a document type.

use std::slice;

/// The document node, root of every tree.
///
/// ```
/// use xmlwf_api::model::{Document, Element, Node, ProcessingInstruction};
///
/// let mut document = Document::new(vec![
///     Node::Element(Element::new("root", None)),
///     Node::ProcessingInstruction(ProcessingInstruction::new("trailer", "")),
/// ]);
/// assert!(document.remove_last_child().is_some());
/// assert_eq!(Some("root"), document.document_element().map(|e| e.name.as_str()));
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default, Hash)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    /// Detaches the last child of the document node and returns it.
    pub fn remove_last_child(&mut self) -> Option<Node> {
        self.children.pop()
    }

    /// The first element child of the document node, if any.
    pub fn document_element(&self) -> Option<&Element> {
        self.children.iter().find_map(Node::as_element)
    }

    pub fn document_element_mut(&mut self) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// All the elements of the tree in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }
}

/// A node of a [`Document`](struct.Document.html).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Node {
    Element(Element),
    /// Character data, with entity and character references already expanded.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(ProcessingInstruction),
    /// The raw content of a `<!DOCTYPE ...>` declaration, without the keyword.
    DocumentType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_processing_instruction(&self) -> Option<&ProcessingInstruction> {
        match self {
            Node::ProcessingInstruction(pi) => Some(pi),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<ProcessingInstruction> for Node {
    fn from(pi: ProcessingInstruction) -> Self {
        Node::ProcessingInstruction(pi)
    }
}

/// An element.
///
/// `name` is the qualified name as written in the source.
/// Namespace declarations are kept in `attributes` like any other attribute.
///
/// ```
/// use xmlwf_api::model::Element;
///
/// let element = Element::new("h:table", Some("http://www.w3.org/1999/xhtml".to_owned()));
/// assert_eq!(Some("h"), element.prefix());
/// assert_eq!("table", element.local_name());
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::default(),
            children: Vec::default(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local_name)) => local_name,
            None => &self.name,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All the elements strictly inside this one in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

/// A processing instruction `<?target data?>`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ProcessingInstruction {
    pub target: String,
    pub data: String,
}

impl ProcessingInstruction {
    pub fn new(target: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            data: data.into(),
        }
    }
}

/// Pre-order iterator on elements.
///
/// Created with [`Document::descendants`](struct.Document.html#method.descendants)
/// or [`Element::descendants`](struct.Element.html#method.descendants).
pub struct Descendants<'a> {
    stack: Vec<slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        while let Some(current) = self.stack.last_mut() {
            match current.next() {
                Some(Node::Element(element)) => {
                    self.stack.push(element.children.iter());
                    return Some(element);
                }
                Some(_) => (),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut b = Element::new("b", None);
        b.children.push(Element::new("c", None).into());
        let mut a = Element::new("a", None);
        a.children.push(Node::Text("x".to_owned()));
        a.children.push(b.into());
        a.children.push(Element::new("d", None).into());
        Document::new(vec![
            Node::Comment(" head ".to_owned()),
            a.into(),
            ProcessingInstruction::new("end", "").into(),
        ])
    }

    #[test]
    fn descendants_are_in_document_order() {
        let document = sample();
        let names: Vec<_> = document.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn element_descendants_exclude_the_element() {
        let document = sample();
        let root = document.document_element().unwrap();
        let names: Vec<_> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn last_child_removal() {
        let mut document = sample();
        assert_eq!(
            Some("end"),
            document
                .last_child()
                .and_then(Node::as_processing_instruction)
                .map(|pi| pi.target.as_str())
        );
        document.remove_last_child();
        assert!(document.last_child().and_then(Node::as_element).is_some());
    }

    #[test]
    fn attribute_lookup_by_qualified_name() {
        let mut element = Element::new("a", None);
        element.attributes.push(Attribute {
            name: "p:b".to_owned(),
            namespace: Some("http://example.com/".to_owned()),
            value: "1".to_owned(),
        });
        assert_eq!(Some("1"), element.attribute("p:b"));
        assert_eq!(None, element.attribute("b"));
    }

    #[test]
    fn names_without_prefix() {
        let element = Element::new("root", None);
        assert_eq!(None, element.prefix());
        assert_eq!("root", element.local_name());
    }
}
