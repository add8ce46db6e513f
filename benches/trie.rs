//! Performance benchmarks for the trie, tokenizer and crawler
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spotlight::index::{Crawler, IgnoreSet, IndexStore, Trie};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_names(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            let name = format!("Report_{:05}_Final.pdf", i);
            let path = format!("/home/user/Documents/{}/{}", i % 37, name);
            (name, path)
        })
        .collect()
}

fn filled_trie(count: usize) -> Trie {
    let mut trie = Trie::new();
    for (name, path) in sample_names(count) {
        trie.insert(&name, &path, "pdf");
    }
    trie
}

/// Create a directory tree with sample files for crawling
fn create_crawl_fixtures() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root_path = temp_dir.path().join("root");

    for d in 0..10 {
        let dir = root_path.join(format!("Project{}", d)).join("src");
        fs::create_dir_all(&dir).expect("Failed to create dir");
        for f in 0..50 {
            fs::write(dir.join(format!("moduleFile_{}.rs", f)), b"")
                .expect("Failed to write file");
        }
    }

    (temp_dir, root_path)
}

fn bench_trie_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_insert");
    for count in [1_000, 10_000] {
        let names = sample_names(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &names, |b, names| {
            b.iter(|| {
                let mut trie = Trie::new();
                for (name, path) in names {
                    trie.insert(black_box(name), path, "pdf");
                }
                trie
            })
        });
    }
    group.finish();
}

fn bench_prefix_search(c: &mut Criterion) {
    let trie = filled_trie(10_000);

    let mut group = c.benchmark_group("prefix_search");
    group.bench_function("all_matches", |b| {
        b.iter(|| trie.search_prefix(black_box("Report_001")))
    });
    group.bench_function("nearest_10", |b| {
        b.iter(|| trie.search_prefix_n(black_box("Report"), 10))
    });
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let trie = filled_trie(10_000);
    let mut bytes = Vec::new();
    trie.write_to(&mut bytes).expect("Failed to serialize");

    c.bench_function("snapshot_write", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            trie.write_to(&mut out).expect("Failed to serialize");
            out
        })
    });

    c.bench_function("snapshot_read", |b| {
        b.iter(|| Trie::read_from(&mut black_box(bytes.as_slice())))
    });
}

fn bench_tokenize(c: &mut Criterion) {
    let path = "/home/user/Documents/ProjectFiles/getUserById_v2.HTTPResponse.tar.gz";
    c.bench_function("tokenize_path", |b| {
        b.iter(|| spotlight::utils::tokenize(black_box(path)))
    });
}

fn bench_crawl(c: &mut Criterion) {
    let (temp_dir, root_path) = create_crawl_fixtures();
    let store = IndexStore::open(&temp_dir.path().join("crawl.db")).expect("Failed to open store");
    let crawler = Crawler::new(&root_path, store, IgnoreSet::default());

    let mut group = c.benchmark_group("crawl");
    group.sample_size(10);
    // The store keeps earlier rows, so later iterations measure the skip path
    group.bench_function("500_files", |b| {
        b.iter(|| {
            let mut trie = Trie::new();
            crawler.crawl(&mut trie).expect("Crawl failed")
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_trie_insert,
    bench_prefix_search,
    bench_snapshot,
    bench_tokenize,
    bench_crawl,
);

criterion_main!(benches);
