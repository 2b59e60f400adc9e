use crate::error::{XmlError, XmlErrorKind};
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::str;
use xmlwf_api::model::{Attribute, Document, Element, Node, ProcessingInstruction};

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A non-validating and namespace-aware XML tree builder.
///
/// It reads the whole source and returns the tree together with the first error met.
/// Namespace constraint violations do not stop the parsing: the tree is complete.
/// Any other error stops it and the tree only contains what was read before, with all open elements closed.
///
/// Only the predefined entities and character references are expanded.
/// The document type declaration is kept as is and never interpreted.
///
/// ```
/// use xmlwf_xml::DomParser;
///
/// let parsed = DomParser::new("<a xmlns='http://example.com/'><b/></a>").parse();
/// assert!(parsed.error.is_none());
/// let root = parsed.document.document_element().unwrap();
/// assert_eq!(Some("http://example.com/"), root.namespace.as_deref());
///
/// let parsed = DomParser::new("<a><p:b/></a>").parse();
/// assert!(parsed.error.unwrap().is_namespace_error());
/// assert_eq!(1, parsed.document.descendants().filter(|e| e.name == "p:b").count());
/// ```
pub struct DomParser<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    document: Vec<Node>,
    open_elements: Vec<OpenElement>,
    bindings: Vec<(String, String)>,
    seen_document_element: bool,
    namespace_error: Option<XmlError>,
}

struct OpenElement {
    element: Element,
    binding_count: usize,
}

/// The result of [`DomParser::parse`](struct.DomParser.html#method.parse).
#[derive(Debug)]
pub struct ParsedDocument {
    pub document: Document,
    /// The first error met while reading the source.
    pub error: Option<XmlError>,
}

impl<'a> DomParser<'a> {
    pub fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut reader = Reader::from_str(source);
        reader.check_end_names(true);
        reader.check_comments(true);
        reader.trim_text(false);
        reader.expand_empty_elements(false);
        Self {
            source,
            reader,
            document: Vec::default(),
            open_elements: Vec::default(),
            bindings: Vec::default(),
            seen_document_element: false,
            namespace_error: None,
        }
    }

    pub fn parse(mut self) -> ParsedDocument {
        let mut buffer = Vec::default();
        loop {
            let offset = self.reader.buffer_position();
            let event = match self.reader.read_event(&mut buffer) {
                Ok(event) => event,
                Err(error) => {
                    let error = self.error(XmlErrorKind::Xml(error), self.reader.buffer_position());
                    return self.abort(error);
                }
            };
            let result = match event {
                Event::Start(event) => self.parse_start_event(&event, offset),
                Event::Empty(event) => self
                    .parse_start_event(&event, offset)
                    .and_then(|()| self.parse_end_event(offset)),
                Event::End(_) => self.parse_end_event(offset),
                Event::Text(event) => self.parse_text_event(&event, offset),
                Event::CData(event) => self.parse_cdata_event(&event, offset),
                Event::Comment(event) => self.parse_comment_event(&event, offset),
                Event::PI(event) => self.parse_pi_event(&event, offset),
                Event::Decl(event) => self.parse_decl_event(&event, offset),
                Event::DocType(event) => self.parse_doctype_event(&event, offset),
                Event::Eof => break,
            };
            if let Err(error) = result {
                return self.abort(error);
            }
            buffer.clear();
        }

        match self.check_end() {
            Ok(()) => ParsedDocument {
                document: Document::new(self.document),
                error: self.namespace_error,
            },
            Err(error) => self.abort(error),
        }
    }

    fn parse_start_event(&mut self, event: &BytesStart<'_>, offset: usize) -> Result<(), XmlError> {
        if self.open_elements.is_empty() && self.seen_document_element {
            return Err(self.fatal("Extra content at the end of the document", offset));
        }

        let name = self.decode(event.name(), offset)?.to_owned();
        if !is_name(&name) {
            return Err(self.fatal(format!("'{}' is not a valid element name", name), offset));
        }
        self.check_qualified_name(&name, offset);

        let mut attributes = Vec::default();
        for attribute in event.attributes() {
            let attribute = attribute.map_err(|e| self.error(XmlErrorKind::Xml(e), offset))?;
            let key = self.decode(attribute.key, offset)?.to_owned();
            if !is_name(&key) {
                return Err(self.fatal(format!("'{}' is not a valid attribute name", key), offset));
            }
            if attribute.value.contains(&b'<') {
                return Err(self.fatal(
                    format!("Unescaped '<' not allowed in the value of attribute {}", key),
                    offset,
                ));
            }
            let value = attribute
                .unescape_and_decode_value(&self.reader)
                .map_err(|e| self.error(XmlErrorKind::Xml(e), offset))?;
            self.check_chars(&value, offset)?;
            self.check_qualified_name(&key, offset);
            attributes.push((key, value));
        }

        // Namespace declarations are in scope for the element carrying them
        let mut binding_count = 0;
        for (key, value) in &attributes {
            let prefix = if key == "xmlns" {
                ""
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                prefix
            } else {
                continue;
            };
            if let Some(message) = binding_error(prefix, value) {
                self.report_namespace_error(message, offset);
            }
            self.bindings.push((prefix.to_owned(), value.clone()));
            binding_count += 1;
        }

        let namespace = match name.split_once(':') {
            Some((prefix, _)) => {
                let namespace = self.lookup(prefix).map(str::to_owned);
                if namespace.is_none() {
                    self.report_namespace_error(
                        format!("Namespace prefix {} on {} is not defined", prefix, name),
                        offset,
                    );
                }
                namespace
            }
            None => self.lookup("").map(str::to_owned),
        };

        let mut element = Element::new(name, namespace);
        let mut expanded_names = HashSet::new();
        for (name, value) in attributes {
            let namespace = if name == "xmlns" || name.starts_with("xmlns:") {
                Some(XMLNS_NAMESPACE.to_owned())
            } else if let Some((prefix, _)) = name.split_once(':') {
                let namespace = self.lookup(prefix).map(str::to_owned);
                if namespace.is_none() {
                    self.report_namespace_error(
                        format!(
                            "Namespace prefix {} for attribute {} is not defined",
                            prefix, name
                        ),
                        offset,
                    );
                }
                namespace
            } else {
                None
            };
            let local_name = name
                .split_once(':')
                .map_or(name.as_str(), |(_, local_name)| local_name)
                .to_owned();
            if !expanded_names.insert((namespace.clone(), local_name)) {
                self.report_namespace_error(format!("Attribute {} redefined", name), offset);
            }
            element.attributes.push(Attribute {
                name,
                namespace,
                value,
            });
        }

        self.seen_document_element = true;
        self.open_elements.push(OpenElement {
            element,
            binding_count,
        });
        Ok(())
    }

    fn parse_end_event(&mut self, offset: usize) -> Result<(), XmlError> {
        match self.open_elements.pop() {
            Some(open) => {
                self.close(open);
                Ok(())
            }
            None => Err(self.fatal("Unexpected end tag", offset)),
        }
    }

    fn parse_text_event(&mut self, event: &BytesText<'_>, offset: usize) -> Result<(), XmlError> {
        let raw = event.escaped();
        if self.open_elements.is_empty() {
            if raw.iter().all(|b| is_whitespace(char::from(*b))) {
                return Ok(());
            }
            return Err(self.fatal(
                if self.seen_document_element {
                    "Extra content at the end of the document"
                } else {
                    "Start tag expected, '<' not found"
                },
                offset,
            ));
        }
        if raw.windows(3).any(|w| w == b"]]>") {
            return Err(self.fatal("Sequence ']]>' not allowed in content", offset));
        }
        let text = event
            .unescape_and_decode(&self.reader)
            .map_err(|e| self.error(XmlErrorKind::Xml(e), offset))?;
        self.check_chars(&text, offset)?;
        if text.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.open_elements.last_mut() {
            match parent.element.children.last_mut() {
                Some(Node::Text(previous)) => previous.push_str(&text),
                _ => parent.element.children.push(Node::Text(text)),
            }
        }
        Ok(())
    }

    fn parse_cdata_event(&mut self, event: &BytesText<'_>, offset: usize) -> Result<(), XmlError> {
        if self.open_elements.is_empty() {
            return Err(self.fatal("CDATA section outside of the document element", offset));
        }
        let content = self.decode(event.escaped(), offset)?;
        self.check_chars(content, offset)?;
        self.append(Node::CData(content.to_owned()));
        Ok(())
    }

    fn parse_comment_event(
        &mut self,
        event: &BytesText<'_>,
        offset: usize,
    ) -> Result<(), XmlError> {
        let content = self.decode(event.escaped(), offset)?;
        if content.contains("--") || content.ends_with('-') {
            return Err(self.fatal("Double hyphen within comment", offset));
        }
        self.check_chars(content, offset)?;
        self.append(Node::Comment(content.to_owned()));
        Ok(())
    }

    fn parse_pi_event(&mut self, event: &BytesText<'_>, offset: usize) -> Result<(), XmlError> {
        let content = self.decode(event.escaped(), offset)?;
        let (target, data) = match content.find(is_whitespace) {
            Some(i) => (&content[..i], content[i..].trim_start_matches(is_whitespace)),
            None => (content, ""),
        };
        if !is_name(target) {
            return Err(self.fatal(
                format!("'{}' is not a valid processing instruction target", target),
                offset,
            ));
        }
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.fatal(
                "XML declaration allowed only at the start of the document",
                offset,
            ));
        }
        if target.contains(':') {
            self.report_namespace_error(
                format!("colons are forbidden from PI names '{}'", target),
                offset,
            );
        }
        self.check_chars(data, offset)?;
        self.append(ProcessingInstruction::new(target, data).into());
        Ok(())
    }

    fn parse_decl_event(&mut self, event: &BytesDecl<'_>, offset: usize) -> Result<(), XmlError> {
        if offset != 0 {
            return Err(self.fatal(
                "XML declaration allowed only at the start of the document",
                offset,
            ));
        }
        match event.version() {
            Ok(version) if version.starts_with(b"1.") => Ok(()),
            Ok(version) => Err(self.fatal(
                format!("Unsupported version '{}'", String::from_utf8_lossy(&version)),
                offset,
            )),
            Err(error) => Err(self.error(XmlErrorKind::Xml(error), offset)),
        }
    }

    fn parse_doctype_event(
        &mut self,
        event: &BytesText<'_>,
        offset: usize,
    ) -> Result<(), XmlError> {
        if self.seen_document_element
            || self
                .document
                .iter()
                .any(|node| matches!(node, Node::DocumentType(_)))
        {
            return Err(self.fatal("Misplaced DOCTYPE declaration", offset));
        }
        let content = self.decode(event.escaped(), offset)?.trim_matches(is_whitespace);
        self.document.push(Node::DocumentType(content.to_owned()));
        Ok(())
    }

    fn check_end(&self) -> Result<(), XmlError> {
        let end = self.source.len();
        if let Some(open) = self.open_elements.last() {
            return Err(self.fatal(
                format!("Premature end of data in tag {}", open.element.name),
                end,
            ));
        }
        if !self.seen_document_element {
            return Err(self.fatal("Document is empty", end));
        }
        // The reader silently stops on a trailing '<'
        if !self.source.trim_end_matches(is_whitespace).ends_with('>') {
            return Err(self.fatal("Premature end of data", end));
        }
        Ok(())
    }

    fn abort(mut self, error: XmlError) -> ParsedDocument {
        while let Some(open) = self.open_elements.pop() {
            self.close(open);
        }
        ParsedDocument {
            document: Document::new(self.document),
            error: Some(error),
        }
    }

    fn close(&mut self, open: OpenElement) {
        let remaining = self.bindings.len() - open.binding_count;
        self.bindings.truncate(remaining);
        self.append(open.element.into());
    }

    fn append(&mut self, node: Node) {
        match self.open_elements.last_mut() {
            Some(parent) => parent.element.children.push(node),
            None => self.document.push(node),
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, namespace)| namespace.as_str())
            .filter(|namespace| !namespace.is_empty())
    }

    fn check_qualified_name(&mut self, name: &str, offset: usize) {
        let is_valid = match name.split_once(':') {
            Some((prefix, local_name)) => {
                !prefix.is_empty() && !local_name.is_empty() && !local_name.contains(':')
            }
            None => true,
        };
        if !is_valid {
            self.report_namespace_error(format!("Failed to parse QName '{}'", name), offset);
        }
    }

    fn check_chars(&self, text: &str, offset: usize) -> Result<(), XmlError> {
        match text.chars().find(|c| !is_char(*c)) {
            Some(c) => Err(self.fatal(
                format!("Char 0x{:X} out of allowed range", u32::from(c)),
                offset,
            )),
            None => Ok(()),
        }
    }

    fn report_namespace_error(&mut self, message: String, offset: usize) {
        if self.namespace_error.is_none() {
            self.namespace_error = Some(self.error(XmlErrorKind::Namespace(message), offset));
        }
    }

    fn decode<'b>(&self, bytes: &'b [u8], offset: usize) -> Result<&'b str, XmlError> {
        str::from_utf8(bytes)
            .map_err(|e| self.error(XmlErrorKind::Xml(quick_xml::Error::Utf8(e)), offset))
    }

    fn fatal(&self, message: impl Into<String>, offset: usize) -> XmlError {
        self.error(XmlErrorKind::Other(message.into()), offset)
    }

    fn error(&self, kind: XmlErrorKind, offset: usize) -> XmlError {
        XmlError::new(kind, self.source, offset)
    }
}

fn binding_error(prefix: &str, namespace: &str) -> Option<String> {
    if prefix == "xmlns" {
        Some("xmlns is a reserved prefix and must not be declared".to_owned())
    } else if prefix == "xml" && namespace != XML_NAMESPACE {
        Some(format!("xml prefix must be bound to {}", XML_NAMESPACE))
    } else if prefix != "xml" && namespace == XML_NAMESPACE {
        Some(format!("{} can only be bound to the xml prefix", XML_NAMESPACE))
    } else if namespace == XMLNS_NAMESPACE {
        Some(format!("{} must not be declared", XMLNS_NAMESPACE))
    } else if !prefix.is_empty() && namespace.is_empty() {
        Some(format!("the prefix {} cannot be undeclared", prefix))
    } else {
        None
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_char(c: char) -> bool {
    // #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_name(name: &str) -> bool {
    // NameStartChar (NameChar)*
    let mut c = name.chars();
    match c.next() {
        Some(c) if is_name_start_char(c) => (),
        _ => return false,
    };
    c.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    // ":" | [A-Z] | "_" | [a-z] | [#xC0-#xD6] | [#xD8-#xF6] | [#xF8-#x2FF] | [#x370-#x37D] | [#x37F-#x1FFF] | [#x200C-#x200D] | [#x2070-#x218F] | [#x2C00-#x2FEF] | [#x3001-#xD7FF] | [#xF900-#xFDCF] | [#xFDF0-#xFFFD] | [#x10000-#xEFFFF]
    matches!(c,
        ':'
        | 'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    // NameStartChar | "-" | "." | [0-9] | #xB7 | [#x0300-#x036F] | [#x203F-#x2040]
    match c {
        c if is_name_start_char(c) => true,
        '-' | '.' | '0'..='9' | '\u{B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}' => {
            true
        }
        _ => false,
    }
}
