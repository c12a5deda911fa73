//! Builds the in-memory tree of known destination folders, one embedding
//! per node, from the user's registered archive roots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::task::JoinSet;
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::embedding::TextEmbedder;

/// One known destination folder. `relative_path` is the join key consumed
/// by the move step; `source_path` is the resolved on-disk location.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub id: Uuid,
    pub display_name: String,
    /// Root-relative, `/`-separated, always starting with `/`.
    pub relative_path: String,
    pub source_path: PathBuf,
    pub children: Vec<DirectoryNode>,
    pub embedding: Vec<f32>,
}

pub struct CatalogBuilder {
    embedder: Arc<dyn TextEmbedder>,
    max_depth: usize,
    excludes: GlobSet,
}

impl CatalogBuilder {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        max_depth: usize,
        exclude_patterns: &[String],
    ) -> anyhow::Result<Self> {
        Ok(Self {
            embedder,
            max_depth,
            excludes: build_globset(exclude_patterns)?,
        })
    }

    /// Resolves every root concurrently. A root that is missing or
    /// unreadable is logged and skipped, never fatal to the catalog.
    /// Node order across roots is not guaranteed.
    pub async fn build(&self, roots: &BTreeMap<String, PathBuf>) -> Vec<DirectoryNode> {
        let mut walks = JoinSet::new();
        for (key, path) in roots {
            let embedder = Arc::clone(&self.embedder);
            let excludes = self.excludes.clone();
            let max_depth = self.max_depth;
            let key = key.clone();
            let path = path.clone();
            walks.spawn_blocking(move || {
                walk_root(&key, &path, max_depth, &excludes, embedder.as_ref())
            });
        }

        let mut nodes = Vec::new();
        while let Some(joined) = walks.join_next().await {
            match joined {
                Ok(Ok(node)) => nodes.push(node),
                Ok(Err(err)) => warn!(%err, "skipping unreadable archive root"),
                Err(err) => warn!(%err, "root walk task failed"),
            }
        }
        nodes
    }
}

/// Pre-order traversal: every node exactly once, parents before children.
pub fn flatten(nodes: &[DirectoryNode]) -> Vec<DirectoryNode> {
    fn visit(node: &DirectoryNode, output: &mut Vec<DirectoryNode>) {
        output.push(node.clone());
        for child in &node.children {
            visit(child, output);
        }
    }
    let mut output = Vec::new();
    for node in nodes {
        visit(node, &mut output);
    }
    output
}

/// Directories only, hidden entries skipped, depth capped: a node at the
/// cap is materialized with empty children even when subdirectories exist.
fn walk_root(
    key: &str,
    root: &Path,
    max_depth: usize,
    excludes: &GlobSet,
    embedder: &dyn TextEmbedder,
) -> anyhow::Result<DirectoryNode> {
    if !root.is_dir() {
        anyhow::bail!("root {} is not a readable directory", root.display());
    }

    // Ancestor stack; completed subtrees fold into their parents as the
    // walk moves past them.
    let mut stack: Vec<(usize, DirectoryNode)> = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || (e.file_type().is_dir() && should_descend(e.path(), excludes))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let depth = entry.depth();
        let relative_path = relative_path(key, root, entry.path());
        let display_name = entry.file_name().to_string_lossy().into_owned();
        let embedding = embedder.embed(&format!("{display_name} {relative_path}"));
        let node = DirectoryNode {
            id: Uuid::new_v4(),
            display_name,
            relative_path,
            source_path: entry.path().to_path_buf(),
            children: Vec::new(),
            embedding,
        };

        while stack.len() > depth {
            let Some((_, child)) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some((_, parent)) => parent.children.push(child),
                None => break,
            }
        }
        stack.push((depth, node));
    }

    while stack.len() > 1 {
        let Some((_, child)) = stack.pop() else {
            break;
        };
        if let Some((_, parent)) = stack.last_mut() {
            parent.children.push(child);
        }
    }

    match stack.pop() {
        Some((_, root_node)) => Ok(root_node),
        None => anyhow::bail!("root {} yielded no entries", root.display()),
    }
}

fn relative_path(key: &str, root: &Path, path: &Path) -> String {
    let mut rel = format!("/{key}");
    if let Ok(suffix) = path.strip_prefix(root) {
        for component in suffix.components() {
            let name = component.as_os_str().to_string_lossy();
            if !name.is_empty() {
                rel.push('/');
                rel.push_str(&name);
            }
        }
    }
    rel
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn should_descend(path: &Path, excludes: &GlobSet) -> bool {
    !is_hidden(path) && !is_excluded(path, excludes)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, excludes: &GlobSet) -> bool {
    excludes.is_match(path)
}
