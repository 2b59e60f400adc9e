use criterion::{criterion_group, criterion_main, Criterion};
use xmlwf_api::oracle::FailureMode;
use xmlwf_probe::classify;
use xmlwf_xml::DomOracle;

fn sample_document(size: usize) -> String {
    let mut document = String::from("<catalog xmlns:p='http://example.com/'>");
    for i in 0..size {
        document.push_str(&format!(
            "<p:item id='{0}'><name>Item {0}</name><!-- comment --><![CDATA[<raw>]]></p:item>",
            i
        ));
    }
    document.push_str("</catalog>");
    document
}

fn bench_classify(c: &mut Criterion) {
    let well_formed = sample_document(100);
    let malformed = format!("{}<p:a/>", &well_formed[..well_formed.len() - "</catalog>".len()]);
    for mode in [FailureMode::Discard, FailureMode::Splice, FailureMode::Throw] {
        let oracle = DomOracle::new(mode);
        c.bench_function(&format!("classify well-formed ({})", mode), |b| {
            b.iter(|| classify(&oracle, &well_formed))
        });
        c.bench_function(&format!("classify malformed ({})", mode), |b| {
            b.iter(|| classify(&oracle, &malformed))
        });
    }
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
