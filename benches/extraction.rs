use complisense::extract::extract_result;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let filler = "The assistant rambles about data protection principles. ".repeat(50);
    let payload = format!(
        "{filler}{{\"compliance_status\":\"partial\",\"reason\":\"retention terms are vague\",\
         \"risk_level\":\"med\",\"confidence_score\":\"0.65\",\
         \"details\":{{\"articles\":[\"Article 5\"]}}}} {filler}"
    );

    c.bench_function("extraction", |b| {
        b.iter(|| extract_result(black_box(&payload)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
