#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlwf_api::oracle::{FailureMode, Oracle};
use xmlwf_probe::classify_bytes;
use xmlwf_xml::DomOracle;

fuzz_target!(|data: &[u8]| {
    for mode in [FailureMode::Discard, FailureMode::Splice, FailureMode::Throw] {
        let oracle = DomOracle::new(mode);
        if let Some(document) = classify_bytes(&oracle, data).into_document() {
            // Probing must not change the tree of well-formed documents
            let source = String::from_utf8_lossy(data);
            let reference = oracle.parse(&source).map(|d| oracle.serialize(&d));
            assert_eq!(Ok(oracle.serialize(&document)), reference.map_err(|_| ()));
        }
    }
});
