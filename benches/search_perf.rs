use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mbsearch::model::{EntityType, Hit, OutputFormat, ResultPage};
use mbsearch::render::{RenderOptions, artist};
use mbsearch::search::descriptor::{ARTIST, RELEASE};
use mbsearch::search::facade::{EntitySearch, SearchOptions};
use mbsearch::search::normalize::normalize;
use mbsearch::search::query::build;
use mbsearch::search::tantivy::GenerationWriter;

const QUERIES: &[&str] = &[
    "nirvana",
    "R.E.M. AND type:2",
    "\"smells like teen spirit\" OR artist:Beyoncé^2",
    "arid:5B11F4CE-A62D-471E-81FC-A69A8278C7DA",
    "坂本龍一 NOT live",
];

// =============================================================================
// Query pipeline
// =============================================================================

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for (i, q) in QUERIES.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), q, |b, q| {
            b.iter(|| black_box(normalize(q.as_bytes(), &RELEASE)))
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let normalized: Vec<String> = QUERIES
        .iter()
        .filter_map(|q| normalize(q.as_bytes(), &ARTIST).ok())
        .collect();
    c.bench_function("build_structured_queries", |b| {
        b.iter(|| {
            for q in &normalized {
                let _ = black_box(build(q, &ARTIST));
            }
        })
    });
}

// =============================================================================
// Rendering
// =============================================================================

fn bench_render_artist_page(c: &mut Criterion) {
    let hits: Vec<Hit> = (0..25)
        .map(|i| {
            Hit::new(100 - i)
                .with("arid", format!("00000000-0000-0000-0000-{i:012}"))
                .with("artist", format!("Artist & Friends #{i}"))
                .with("sortname", format!("Friends, Artist <{i}>"))
                .with("type", "group")
                .with("begin", "1990")
                .with("comment", "some disambiguation")
        })
        .collect();
    let page = ResultPage {
        hits,
        estimated_total: 1000,
        offset: 0,
    };
    let options = RenderOptions {
        tagger_port: 8000,
        link_timestamp: Some(0),
        ..Default::default()
    };
    c.bench_function("render_artist_html_25", |b| {
        b.iter(|| black_box(artist::html(&page, &options)))
    });
    c.bench_function("render_artist_xml_25", |b| {
        b.iter(|| black_box(artist::xml(&page, &options)))
    });
}

// =============================================================================
// End to end against a Tantivy generation
// =============================================================================

fn bench_facade_search(c: &mut Criterion) {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let mut writer = GenerationWriter::create(&tmp.path().join("artist"), &ARTIST).expect("writer");
    let words = ["blue", "black", "red", "sonic", "velvet", "silver", "echo", "river"];
    for i in 0..2_000usize {
        let mut record: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let name = format!("{} {} {i}", words[i % words.len()], words[(i / 8) % words.len()]);
        record.insert("artist".into(), vec![name]);
        record.insert("arid".into(), vec![format!("00000000-0000-0000-0000-{i:012}")]);
        record.insert("type".into(), vec![if i % 3 == 0 { "person" } else { "group" }.into()]);
        writer.add_record(&record).expect("add record");
    }
    writer.commit().expect("commit");

    let facade = EntitySearch::open(tmp.path(), EntityType::Artist, SearchOptions::default()).expect("open");
    let mut group = c.benchmark_group("facade_search");
    for q in ["velvet", "blue AND type:1", "silver OR echo", "riv*"] {
        group.bench_with_input(BenchmarkId::from_parameter(q), q, |b, q| {
            b.iter(|| black_box(facade.search(q.as_bytes(), 25, 0, OutputFormat::Html)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_build,
    bench_render_artist_page,
    bench_facade_search
);
criterion_main!(benches);
