//! End-to-end tests: crawl a directory tree, then query through the searcher.

use spotlight::index::{Crawler, IgnoreSet, IndexStore, Trie};
use spotlight::query::Searcher;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Lay out a small tree with one visible file and two that must be skipped
fn create_fixture_tree(dir: &Path) -> PathBuf {
    let root = dir.join("root");
    for (sub, name) in [
        ("a", "Doc1.txt"),
        (".hidden", "Doc2.txt"),
        ("node_modules", "Doc3.txt"),
    ] {
        fs::create_dir_all(root.join(sub)).unwrap();
        fs::write(root.join(sub).join(name), b"contents").unwrap();
    }
    root
}

fn crawl_into(dir: &Path, root: &Path) -> Trie {
    let store = IndexStore::open(&dir.join("crawl.db")).unwrap();
    let crawler = Crawler::new(root, store, IgnoreSet::default());
    let mut trie = Trie::new();
    crawler.crawl(&mut trie).unwrap();
    trie.save(&dir.join("trie.dat")).unwrap();
    trie
}

fn open_searcher(dir: &Path) -> Searcher {
    let store = IndexStore::open(&dir.join("crawl.db")).unwrap();
    Searcher::new(store, dir.join("trie.dat"))
}

#[test]
fn test_crawl_skips_hidden_and_ignored_dirs() {
    let dir = TempDir::new().unwrap();
    let root = create_fixture_tree(dir.path());
    let trie = crawl_into(dir.path(), &root);
    assert_eq!(trie.len(), 1);

    let searcher = open_searcher(dir.path());

    let names: Vec<_> = searcher
        .trie_search("Doc", 10)
        .into_iter()
        .map(|f| f.filename)
        .collect();
    assert_eq!(names, vec!["Doc1.txt"]);

    let hits = searcher.index_search("doc", 0);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "Doc1.txt");
    assert_eq!(hits[0].extension, "txt");
    assert!(Path::new(&hits[0].absolute_path).is_absolute());
    assert!(hits[0].absolute_path.ends_with("Doc1.txt"));
}

#[test]
fn test_index_search_matches_directory_tokens() {
    let dir = TempDir::new().unwrap();
    let root = create_fixture_tree(dir.path());
    crawl_into(dir.path(), &root);

    let searcher = open_searcher(dir.path());
    // The parent directory "a" is part of the tokenized path
    assert!(searcher.index_search("a", 0).iter().any(|f| f.filename == "Doc1.txt"));
    assert!(searcher.index_search("hidden", 0).is_empty());
    assert!(searcher.index_search("node", 0).is_empty());
}

#[test]
fn test_snapshot_round_trip_through_searcher() {
    let dir = TempDir::new().unwrap();
    let root = create_fixture_tree(dir.path());
    fs::write(root.join("a").join("Docket.md"), b"").unwrap();
    let trie = crawl_into(dir.path(), &root);

    let searcher = open_searcher(dir.path());
    assert_eq!(searcher.trie().len(), trie.len());
    assert_eq!(
        searcher.trie().search_prefix("Doc"),
        trie.search_prefix("Doc")
    );
}

#[test]
fn test_recrawl_keeps_index_unique() {
    let dir = TempDir::new().unwrap();
    let root = create_fixture_tree(dir.path());
    crawl_into(dir.path(), &root);
    crawl_into(dir.path(), &root);

    let store = IndexStore::open(&dir.path().join("crawl.db")).unwrap();
    assert_eq!(store.file_count().unwrap(), 1);
}

#[test]
fn test_combined_search_lists_each_file_once() {
    let dir = TempDir::new().unwrap();
    let root = create_fixture_tree(dir.path());
    crawl_into(dir.path(), &root);

    let searcher = open_searcher(dir.path());
    let results = searcher.search("Doc");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "Doc1.txt");
}
