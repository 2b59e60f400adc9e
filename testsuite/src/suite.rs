//! The test suites of the conformance corpus and how to load them.

use crate::exclusions::{default_predicate, Exclusions};
use crate::fetch::{fetch_with_timeout, FetchText};
use crate::fragments::parse_fragment_manifest;
use crate::manifest::{parse_attribute_manifest, ManifestError};
use crate::model::TestCase;
use oxiri::Iri;
use std::time::Duration;
use tracing::{info, warn};

/// How a suite lists its tests.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SuiteSource {
    /// Manifests with `TEST` elements, relative to the corpus base.
    Attributes(&'static [&'static str]),
    /// Concatenations of `TEST` fragments that are not documents on their own.
    Fragments(&'static [&'static str]),
    /// Fixtures listed in code with their expected well-formedness.
    Static(&'static [(&'static str, bool)]),
}

#[derive(Debug, Clone, Copy)]
pub struct Suite {
    pub name: &'static str,
    pub source: SuiteSource,
    pub exclusions: Exclusions,
}

impl Suite {
    /// Loads the tests of the suite, resolving its paths against `base`.
    ///
    /// Manifests that can't be retrieved or read are logged and contribute no test.
    pub async fn load<F: FetchText + ?Sized>(
        &self,
        base: &Iri<String>,
        fetcher: &F,
        timeout: Duration,
    ) -> Vec<TestCase> {
        let tests = match self.source {
            SuiteSource::Attributes(manifests) | SuiteSource::Fragments(manifests) => {
                let mut tests = Vec::default();
                for manifest in manifests {
                    tests.extend(self.load_manifest(base, manifest, fetcher, timeout).await);
                }
                tests
            }
            SuiteSource::Static(cases) => cases
                .iter()
                .filter(|(path, _)| !self.exclusions.uris.contains(path))
                .filter_map(|(path, expected_wellformed)| match base.resolve(path) {
                    Ok(url) => Some(TestCase::new(url.into_inner(), *expected_wellformed)),
                    Err(error) => {
                        warn!(suite = self.name, path, %error, "invalid test path");
                        None
                    }
                })
                .collect(),
        };
        info!(suite = self.name, tests = tests.len(), "suite loaded");
        tests
    }

    async fn load_manifest<F: FetchText + ?Sized>(
        &self,
        base: &Iri<String>,
        path: &str,
        fetcher: &F,
        timeout: Duration,
    ) -> Vec<TestCase> {
        let url = match base.resolve(path) {
            Ok(url) => url,
            Err(error) => {
                warn!(suite = self.name, manifest = path, %error, "invalid manifest path");
                return Vec::default();
            }
        };
        let content = match fetch_with_timeout(fetcher, url.as_str(), timeout).await {
            Ok(content) => content,
            Err(error) => {
                warn!(suite = self.name, manifest = url.as_str(), %error, "manifest not loaded");
                return Vec::default();
            }
        };
        let content = match String::from_utf8(content) {
            Ok(content) => content,
            Err(error) => {
                let error = ManifestError::NotUtf8(error);
                warn!(suite = self.name, manifest = url.as_str(), %error, "manifest not loaded");
                return Vec::default();
            }
        };
        match self.source {
            SuiteSource::Fragments(_) => parse_fragment_manifest(&content, &url, &self.exclusions),
            _ => match parse_attribute_manifest(&content, &url, &self.exclusions) {
                Ok(tests) => tests,
                Err(error) => {
                    warn!(
                        suite = self.name,
                        manifest = url.as_str(),
                        %error,
                        "manifest not loaded"
                    );
                    Vec::default()
                }
            },
        }
    }
}

/// Loads all the tests of `suites`.
pub async fn load_suites<F: FetchText + ?Sized>(
    suites: &[Suite],
    base: &Iri<String>,
    fetcher: &F,
    timeout: Duration,
) -> Vec<TestCase> {
    let mut tests = Vec::default();
    for suite in suites {
        tests.extend(suite.load(base, fetcher, timeout).await);
    }
    tests
}

/// The suites of the W3C XML conformance corpus, relative to the `xmlconf` directory.
pub fn xmlconf_suites() -> Vec<Suite> {
    vec![
        Suite {
            name: "xmltest",
            source: SuiteSource::Attributes(&["xmltest/xmltest.xml"]),
            // Attribute named ":"
            exclusions: Exclusions::new(&["valid/sa/012.xml"], default_predicate),
        },
        Suite {
            name: "oasis",
            source: SuiteSource::Attributes(&["oasis/oasis.xml"]),
            // Names that are not qualified names
            exclusions: Exclusions::new(&["p05pass1.xml"], default_predicate),
        },
        Suite {
            name: "ibm",
            source: SuiteSource::Attributes(&[
                "ibm/ibm_oasis_invalid.xml",
                "ibm/ibm_oasis_not-wf.xml",
                "ibm/ibm_oasis_valid.xml",
            ]),
            exclusions: Exclusions::default(),
        },
        Suite {
            name: "eduni",
            source: SuiteSource::Attributes(&[
                "eduni/errata-2e/errata2e.xml",
                "eduni/errata-3e/errata3e.xml",
                "eduni/errata-4e/errata4e.xml",
                "eduni/namespaces/1.0/rmt-ns10.xml",
                "eduni/misc/ht-bh.xml",
            ]),
            exclusions: Exclusions::default(),
        },
        Suite {
            name: "japanese",
            source: SuiteSource::Attributes(&["japanese/japanese.xml"]),
            // Not UTF-8
            exclusions: Exclusions::new(
                &[
                    "pr-xml-euc-jp.xml",
                    "pr-xml-iso-2022-jp.xml",
                    "pr-xml-little-endian.xml",
                    "pr-xml-shift_jis.xml",
                    "pr-xml-utf-16.xml",
                    "weekly-euc-jp.xml",
                    "weekly-iso-2022-jp.xml",
                    "weekly-little-endian.xml",
                    "weekly-shift_jis.xml",
                    "weekly-utf-16.xml",
                ],
                default_predicate,
            ),
        },
        Suite {
            name: "sun",
            source: SuiteSource::Fragments(&[
                "sun/sun-error.xml",
                "sun/sun-invalid.xml",
                "sun/sun-not-wf.xml",
                "sun/sun-valid.xml",
            ]),
            exclusions: Exclusions::default(),
        },
    ]
}

/// Hand written fixtures for the oracle behaviors the classifier relies on.
pub fn regression_suite() -> Suite {
    Suite {
        name: "regressions",
        source: SuiteSource::Static(&[
            ("literal-parsererror.xml", true),
            ("mozilla-parsererror-root.xml", true),
            ("trailing-pi.xml", true),
            ("pi-target-colon.xml", false),
            ("prefix-undeclaration.xml", false),
            ("undeclared-prefix.xml", false),
            ("xmlns-default-namespace.xml", false),
        ]),
        exclusions: Exclusions::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::TestAttributes;

    fn suite(name: &str) -> Suite {
        xmlconf_suites()
            .into_iter()
            .find(|suite| suite.name == name)
            .unwrap()
    }

    #[test]
    fn japanese_suite_keeps_utf8_fixtures() {
        let japanese = suite("japanese");
        let valid = |uri: &'static str| TestAttributes {
            uri,
            kind: Some("valid"),
            ..TestAttributes::default()
        };
        assert!(!japanese.exclusions.excludes(&valid("pr-xml-utf-8.xml")));
        assert!(!japanese.exclusions.excludes(&valid("weekly-utf-8.xml")));
        assert!(japanese.exclusions.excludes(&valid("pr-xml-utf-16.xml")));
        assert!(japanese.exclusions.excludes(&valid("weekly-shift_jis.xml")));
    }

    #[test]
    fn regression_suite_has_no_exclusion() {
        let regressions = regression_suite();
        assert!(!regressions.exclusions.excludes(&TestAttributes::default()));
        assert!(matches!(regressions.source, SuiteSource::Static(cases) if cases.len() == 7));
    }
}
