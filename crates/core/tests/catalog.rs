use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use archivist_core::catalog::{flatten, CatalogBuilder};
use archivist_core::embedding::LexiconEmbedder;
use tempfile::TempDir;

fn empty_embedder() -> Arc<LexiconEmbedder> {
    Arc::new(LexiconEmbedder::new(HashMap::new()))
}

fn roots(key: &str, path: PathBuf) -> BTreeMap<String, PathBuf> {
    let mut map = BTreeMap::new();
    map.insert(key.to_string(), path);
    map
}

/// Path depth relative to the root node: `/Root` is 0, `/Root/a` is 1.
fn depth_of(relative_path: &str) -> usize {
    relative_path.split('/').filter(|s| !s.is_empty()).count() - 1
}

#[tokio::test]
async fn depth_is_bounded_and_boundary_nodes_have_no_children() {
    let temp = TempDir::new().unwrap();
    let mut chain = temp.path().join("root");
    for level in 1..=10 {
        chain = chain.join(format!("level{level}"));
    }
    fs::create_dir_all(&chain).unwrap();

    let builder = CatalogBuilder::new(empty_embedder(), 6, &[]).unwrap();
    let nodes = builder.build(&roots("Root", temp.path().join("root"))).await;
    assert_eq!(nodes.len(), 1);
    let flat = flatten(&nodes);

    // Root plus level1..level6; level7 and deeper are excluded outright.
    assert_eq!(flat.len(), 7);
    for node in &flat {
        assert!(depth_of(&node.relative_path) <= 6);
        if depth_of(&node.relative_path) == 6 {
            assert!(node.children.is_empty());
        }
    }
}

#[tokio::test]
async fn hidden_and_excluded_directories_are_skipped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("kept")).unwrap();
    fs::create_dir_all(root.join(".hidden")).unwrap();
    fs::create_dir_all(root.join("skipme")).unwrap();
    fs::write(root.join("a-file.txt"), "not a directory").unwrap();

    let builder =
        CatalogBuilder::new(empty_embedder(), 6, &["**/skipme".to_string()]).unwrap();
    let flat = flatten(&builder.build(&roots("Root", root)).await);

    let paths: Vec<&str> = flat.iter().map(|n| n.relative_path.as_str()).collect();
    assert_eq!(paths, vec!["/Root", "/Root/kept"]);
}

#[tokio::test]
async fn unreadable_roots_are_skipped_not_fatal() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good");
    fs::create_dir_all(&good).unwrap();

    let mut map = BTreeMap::new();
    map.insert("Bad".to_string(), temp.path().join("missing"));
    map.insert("Good".to_string(), good);

    let builder = CatalogBuilder::new(empty_embedder(), 6, &[]).unwrap();
    let nodes = builder.build(&map).await;
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].relative_path, "/Good");
}

#[tokio::test]
async fn flatten_orders_parents_before_children() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("a").join("inner")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();

    let builder = CatalogBuilder::new(empty_embedder(), 6, &[]).unwrap();
    let flat = flatten(&builder.build(&roots("Root", root)).await);

    let position = |p: &str| flat.iter().position(|n| n.relative_path == p).unwrap();
    assert!(position("/Root") < position("/Root/a"));
    assert!(position("/Root/a") < position("/Root/a/inner"));
    assert!(position("/Root") < position("/Root/b"));
    assert_eq!(flat.len(), 4);
}

#[tokio::test]
async fn node_embeddings_come_from_name_and_path() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("invoices")).unwrap();
    fs::create_dir_all(root.join("unrelated")).unwrap();

    let mut vectors = HashMap::new();
    vectors.insert("invoices".to_string(), vec![1.0f32, 0.0]);
    let builder =
        CatalogBuilder::new(Arc::new(LexiconEmbedder::new(vectors)), 6, &[]).unwrap();
    let flat = flatten(&builder.build(&roots("Root", root)).await);

    let invoices = flat
        .iter()
        .find(|n| n.relative_path == "/Root/invoices")
        .unwrap();
    let unrelated = flat
        .iter()
        .find(|n| n.relative_path == "/Root/unrelated")
        .unwrap();
    assert!(!invoices.embedding.is_empty());
    assert!(unrelated.embedding.is_empty());
}
