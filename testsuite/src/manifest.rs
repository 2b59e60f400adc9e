//! Reader for manifests listing tests as `TEST` elements with `URI` and `TYPE` attributes.

use crate::exclusions::{Exclusions, TestAttributes};
use crate::model::TestCase;
use oxiri::{Iri, IriParseError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::error::Error;
use std::fmt;
use tracing::trace;

/// Reads the tests of an attribute manifest.
///
/// `TEST` elements are looked for at any depth. Their `URI` is resolved against `base`,
/// the location of the manifest, and only `TYPE="not-wf"` tests are expected to be malformed.
///
/// ```
/// use oxiri::Iri;
/// use xmlwf_testsuite::exclusions::Exclusions;
/// use xmlwf_testsuite::manifest::parse_attribute_manifest;
///
/// let base = Iri::parse("http://example.com/xmltest/xmltest.xml".to_owned())?;
/// let tests = parse_attribute_manifest(
///     "<TESTCASES><TEST TYPE='not-wf' URI='not-wf/sa/001.xml'>Description</TEST></TESTCASES>",
///     &base,
///     &Exclusions::default(),
/// )?;
/// assert_eq!("http://example.com/xmltest/not-wf/sa/001.xml", tests[0].url);
/// assert!(!tests[0].expected_wellformed);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn parse_attribute_manifest(
    content: &str,
    base: &Iri<String>,
    exclusions: &Exclusions,
) -> Result<Vec<TestCase>, ManifestError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    reader.check_end_names(true);
    let mut buffer = Vec::default();
    let mut tests = Vec::default();
    loop {
        let event = reader
            .read_event(&mut buffer)
            .map_err(|error| ManifestError::Xml {
                error,
                position: reader.buffer_position(),
            })?;
        match event {
            Event::Start(element) | Event::Empty(element) if element.name() == b"TEST" => {
                let test = RawTest::from_element(&element, &reader).map_err(|error| {
                    ManifestError::Xml {
                        error,
                        position: reader.buffer_position(),
                    }
                })?;
                if let Some(test) = test.into_test_case(base, exclusions)? {
                    tests.push(test);
                }
            }
            Event::Eof => return Ok(tests),
            _ => (),
        }
        buffer.clear();
    }
}

#[derive(Default)]
struct RawTest {
    id: Option<String>,
    uri: Option<String>,
    kind: Option<String>,
    entities: Option<String>,
    version: Option<String>,
    edition: Option<String>,
}

impl RawTest {
    fn from_element(
        element: &BytesStart<'_>,
        reader: &Reader<&[u8]>,
    ) -> Result<Self, quick_xml::Error> {
        let mut test = RawTest::default();
        for attribute in element.attributes() {
            let attribute = attribute?;
            let slot = match attribute.key {
                b"ID" => &mut test.id,
                b"URI" => &mut test.uri,
                b"TYPE" => &mut test.kind,
                b"ENTITIES" => &mut test.entities,
                b"VERSION" => &mut test.version,
                b"EDITION" => &mut test.edition,
                _ => continue,
            };
            *slot = Some(attribute.unescape_and_decode_value(reader)?);
        }
        Ok(test)
    }

    fn into_test_case(
        self,
        base: &Iri<String>,
        exclusions: &Exclusions,
    ) -> Result<Option<TestCase>, ManifestError> {
        let uri = match &self.uri {
            Some(uri) => uri,
            None => return Err(ManifestError::MissingUri { id: self.id }),
        };
        let attributes = TestAttributes {
            id: self.id.as_deref(),
            uri,
            kind: self.kind.as_deref(),
            entities: self.entities.as_deref(),
            version: self.version.as_deref(),
            edition: self.edition.as_deref(),
        };
        if exclusions.excludes(&attributes) {
            trace!(id = ?attributes.id, uri, "test excluded");
            return Ok(None);
        }
        let url = base
            .resolve(uri)
            .map_err(|error| ManifestError::InvalidUri {
                uri: uri.clone(),
                error,
            })?;
        Ok(Some(TestCase::new(
            url.into_inner(),
            attributes.kind != Some("not-wf"),
        )))
    }
}

/// Error returned when a manifest can't be read.
#[derive(Debug)]
pub enum ManifestError {
    Xml {
        error: quick_xml::Error,
        position: usize,
    },
    MissingUri {
        id: Option<String>,
    },
    InvalidUri {
        uri: String,
        error: IriParseError,
    },
    NotUtf8(std::string::FromUtf8Error),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Xml { error, position } => {
                write!(f, "error at byte {}: {}", position, error)
            }
            ManifestError::MissingUri { id: Some(id) } => {
                write!(f, "the test {} has no URI attribute", id)
            }
            ManifestError::MissingUri { id: None } => write!(f, "a test has no URI attribute"),
            ManifestError::InvalidUri { uri, error } => {
                write!(f, "invalid test URI '{}': {}", uri, error)
            }
            ManifestError::NotUtf8(error) => write!(f, "the manifest is not UTF-8: {}", error),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ManifestError::Xml { error, .. } => Some(error),
            ManifestError::InvalidUri { error, .. } => Some(error),
            ManifestError::NotUtf8(error) => Some(error),
            ManifestError::MissingUri { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::default_predicate;

    fn base() -> Iri<String> {
        Iri::parse("file:///xmlconf/suite/manifest.xml".to_owned()).unwrap()
    }

    #[test]
    fn nested_tests() {
        let manifest = r#"<?xml version="1.0"?>
<!DOCTYPE TESTCASES [ <!ENTITY e "entity"> ]>
<TESTCASES PROFILE="Suite">
  <TESTCASES PROFILE="Sub suite">
    <TEST TYPE="valid" ENTITIES="none" ID="v1" URI="valid/001.xml" SECTIONS="2.1">
      Uses &e; in <EM>its</EM> description.
    </TEST>
    <TEST TYPE="not-wf" ID="n1" URI="not-wf/001.xml"/>
  </TESTCASES>
  <TEST TYPE="invalid" ID="i1" URI="../other/invalid/001.xml"></TEST>
</TESTCASES>"#;
        let tests = parse_attribute_manifest(manifest, &base(), &Exclusions::default()).unwrap();
        assert_eq!(
            vec![
                TestCase::new("file:///xmlconf/suite/valid/001.xml", true),
                TestCase::new("file:///xmlconf/suite/not-wf/001.xml", false),
                TestCase::new("file:///xmlconf/other/invalid/001.xml", true),
            ],
            tests
        );
    }

    #[test]
    fn exclusions_are_applied() {
        let manifest = r#"<TESTCASES>
    <TEST TYPE="error" ID="e1" URI="error/001.xml"/>
    <TEST TYPE="valid" ENTITIES="both" ID="v1" URI="valid/001.xml"/>
    <TEST TYPE="not-wf" ID="n1" URI="not-wf/001.xml"/>
    <TEST TYPE="not-wf" ID="n2" URI="not-wf/002.xml"/>
</TESTCASES>"#;
        let exclusions = Exclusions::new(&["not-wf/002.xml"], default_predicate);
        let tests = parse_attribute_manifest(manifest, &base(), &exclusions).unwrap();
        assert_eq!(
            vec![TestCase::new("file:///xmlconf/suite/not-wf/001.xml", false)],
            tests
        );
    }

    #[test]
    fn errors() {
        let error = parse_attribute_manifest(
            "<TESTCASES><TEST TYPE='valid'/></TESTCASES>",
            &base(),
            &Exclusions::NONE,
        )
        .unwrap_err();
        assert!(matches!(error, ManifestError::MissingUri { id: None }));

        let error = parse_attribute_manifest(
            "<TESTCASES><TEST URI='a.xml'></TESTCASES>",
            &base(),
            &Exclusions::NONE,
        )
        .unwrap_err();
        assert!(matches!(error, ManifestError::Xml { .. }));
    }
}
