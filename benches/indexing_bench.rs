use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use folio::{Document, FieldType, IndexHandle, SchemaDefinition};

const WORDS: &[&str] = &[
    "hello", "world", "moon", "rust", "crate", "future", "broken", "sesame", "index", "query",
    "engine", "writer", "commit", "schema", "field", "token",
];

fn schema() -> SchemaDefinition {
    SchemaDefinition::builder()
        .add_text_field("title", Some("en_stem"), true)
        .add_text_field("body", Some("en_stem"), false)
        .add_text_field("url", None, true)
        .add_numeric_field("year", FieldType::U64, true, true)
        .build()
        .unwrap()
}

fn generate_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let word = |k: usize| WORDS[k % WORDS.len()];
            let body: Vec<&str> = (0..24).map(|j| word(i * 7 + j * 3)).collect();
            Document::new()
                .add_text("title", format!("{} {}", word(i), word(i / 3)))
                .add_text("body", body.join(" "))
                .add_text("url", format!("doc:{i}"))
                .add_field("year", 1990 + (i % 35) as u64)
        })
        .collect()
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Indexing");
    group.sample_size(10);
    let schema = schema();

    for count in [1000usize, 5000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let documents = generate_documents(count);
            b.iter(|| {
                let index = IndexHandle::create_in_ram(&schema).unwrap();
                let mut writer = index.writer().unwrap();
                writer.add_documents(documents.clone()).unwrap();
                writer.commit().unwrap();
            })
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query");
    group.sample_size(10);

    // Setup index once
    let index = IndexHandle::create_in_ram(&schema()).unwrap();
    let mut writer = index.writer().unwrap();
    writer.add_documents(generate_documents(5000)).unwrap();
    writer.commit().unwrap();
    drop(writer);

    for query in ["hello", "title:moon", "rust AND future", "\"broken sesame\""] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, query| {
            b.iter(|| index.query_with_limit(query, 10).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indexing, bench_query);
criterion_main!(benches);
