use criterion::{black_box, criterion_group, criterion_main, Criterion};
use search_core::{process_queries, DocumentStatus, ExecutionMode, SearchServer};

const WORDS: &[&str] = &[
    "cat", "dog", "parrot", "white", "black", "fluffy", "tail", "collar", "eyes", "city", "river",
    "big", "small", "funny", "nasty", "rat", "curly", "hair", "sparrow", "groomed", "and", "with",
];

fn corpus_text(seed: usize, len: usize) -> String {
    (0..len)
        .map(|i| WORDS[(seed * 31 + i * 17 + seed / 7) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_server(documents: usize) -> SearchServer {
    let mut server = SearchServer::from_stop_words_text("and with").expect("valid stop words");
    for id in 0..documents {
        server
            .add_document(id as i32, &corpus_text(id, 20 + id % 50), DocumentStatus::Actual, &[1, 2, 3])
            .expect("valid document");
    }
    server
}

fn bench_find_top(c: &mut Criterion) {
    let server = build_server(10_000);
    let query = "fluffy white cat parrot river -nasty -rat curly hair";
    c.bench_function("find_top_sequential", |b| {
        b.iter(|| server.find_top_documents(black_box(query)))
    });
    c.bench_function("find_top_parallel", |b| {
        b.iter(|| {
            server.find_top_documents_with_mode(ExecutionMode::Parallel, black_box(query), |_, s, _| {
                s == DocumentStatus::Actual
            })
        })
    });
}

fn bench_process_queries(c: &mut Criterion) {
    let server = build_server(10_000);
    let queries: Vec<String> = (0..500).map(|i| corpus_text(i, 8)).collect();
    c.bench_function("process_queries_500", |b| b.iter(|| process_queries(&server, black_box(&queries))));
}

criterion_group!(benches, bench_find_top, bench_process_queries);
criterion_main!(benches);
