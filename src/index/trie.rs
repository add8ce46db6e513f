//! Prefix trie over filenames for instant-typing autocomplete.
//!
//! Keys are the raw bytes of a filename, one edge per byte. Every node owns
//! its children outright, so dropping a node drops its whole subtree.

use crate::index::snapshot::{MAX_SNAPSHOT_DEPTH, NativeFormat, SnapshotFormat};
use crate::index::types::FileInfo;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Longest filename, in bytes, the trie accepts. Matches the deepest
/// nesting a snapshot may contain, so every stored tree can be reloaded.
pub const MAX_KEY_LEN: usize = MAX_SNAPSHOT_DEPTH;

/// One node of the trie. A node is a leaf exactly when it carries file info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    pub(crate) file_info: Option<FileInfo>,
    pub(crate) children: BTreeMap<u8, TrieNode>,
}

impl TrieNode {
    pub fn is_leaf(&self) -> bool {
        self.file_info.is_some()
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    pub fn children(&self) -> &BTreeMap<u8, TrieNode> {
        &self.children
    }

    fn child(&self, byte: u8) -> Option<&TrieNode> {
        self.children.get(&byte)
    }

    fn count_leaves(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                count += 1;
            }
            stack.extend(node.children.values());
        }
        count
    }
}

/// Filename trie. The root stands for the empty prefix and is never a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of filenames stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.len = 0;
    }

    /// Insert a filename, overwriting the file info if it is already present.
    /// Children of the terminal node are left untouched. Empty filenames and
    /// names longer than [`MAX_KEY_LEN`] bytes are ignored.
    pub fn insert(&mut self, filename: &str, absolute_path: &str, extension: &str) {
        if filename.is_empty() {
            return;
        }
        if filename.len() > MAX_KEY_LEN {
            log::warn!("Filename of {} bytes is too long to index: {}", filename.len(), absolute_path);
            return;
        }

        let mut current = &mut self.root;
        for &byte in filename.as_bytes() {
            current = current.children.entry(byte).or_default();
        }

        if current.file_info.is_none() {
            self.len += 1;
        }
        current.file_info = Some(FileInfo::new(filename, absolute_path, extension));
    }

    /// Exact membership test
    pub fn search(&self, filename: &str) -> bool {
        self.find(filename).is_some_and(TrieNode::is_leaf)
    }

    /// File info stored for an exact filename
    pub fn get(&self, filename: &str) -> Option<&FileInfo> {
        self.find(filename).and_then(TrieNode::file_info)
    }

    /// Every file whose name starts with `prefix`, collected depth-first.
    ///
    /// Output order is pre-order with children visited in byte order.
    pub fn search_prefix(&self, prefix: &str) -> Vec<FileInfo> {
        let mut results = Vec::new();
        let Some(start) = self.find(prefix) else {
            return results;
        };

        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if let Some(info) = &node.file_info {
                results.push(info.clone());
            }
            // Reverse so the smallest byte is popped first
            stack.extend(node.children.values().rev());
        }

        results
    }

    /// At most `n` files whose name starts with `prefix`, collected breadth-first
    /// so names closest in length to the prefix come first.
    pub fn search_prefix_n(&self, prefix: &str, n: usize) -> Vec<FileInfo> {
        let mut results = Vec::new();
        if n == 0 {
            return results;
        }
        let Some(start) = self.find(prefix) else {
            return results;
        };

        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if let Some(info) = &node.file_info {
                results.push(info.clone());
                if results.len() >= n {
                    break;
                }
            }
            queue.extend(node.children.values());
        }

        results
    }

    /// Remove an exact filename. Ancestors left with no leaf and no children
    /// are pruned. Returns false, without mutating, if the name is absent.
    pub fn remove(&mut self, filename: &str) -> bool {
        match remove_from(&mut self.root, filename.as_bytes()) {
            Some(_) => {
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Serialize the whole tree with the default snapshot format
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        NativeFormat.write_node(&self.root, out)
    }

    /// Decode a tree with the default snapshot format
    pub fn read_from<R: Read>(input: &mut R) -> std::io::Result<Self> {
        Self::read_with(&NativeFormat, input)
    }

    fn read_with<F: SnapshotFormat, R: Read>(format: &F, input: &mut R) -> std::io::Result<Self> {
        let root = format.read_node(input)?;
        if root.is_leaf() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "snapshot root is marked as a leaf",
            ));
        }
        let len = root.count_leaves();
        Ok(Self { root, len })
    }

    /// Persist the tree to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        self.save_with(&NativeFormat, path)
    }

    /// Persist the tree with an explicit format.
    ///
    /// The snapshot is written to a sibling temp file and renamed into place,
    /// so a concurrent reader sees either the old or the new file.
    pub fn save_with<F: SnapshotFormat>(&self, format: &F, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp_path = temp_path_for(path);
        let file = File::create(&tmp_path)
            .with_context(|| format!("Error opening file for writing: {}", tmp_path.display()))?;
        let mut out = BufWriter::new(file);
        format
            .write_node(&self.root, &mut out)
            .and_then(|_| out.flush())
            .with_context(|| format!("Failed to write trie snapshot {}", tmp_path.display()))?;
        drop(out);

        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;
        Ok(())
    }

    /// Replace the tree with the snapshot at `path`.
    ///
    /// Returns `Ok(false)` and keeps the current tree if the file cannot be
    /// opened. A malformed snapshot is an error and also keeps the current tree.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        self.load_with(&NativeFormat, path)
    }

    /// Replace the tree using an explicit format
    pub fn load_with<F: SnapshotFormat>(&mut self, format: &F, path: &Path) -> Result<bool> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("Error opening file for reading: {}: {}", path.display(), e);
                return Ok(false);
            }
        };

        let mut input = BufReader::new(file);
        let loaded = Self::read_with(format, &mut input)
            .with_context(|| format!("Malformed trie snapshot {}", path.display()))?;
        *self = loaded;
        Ok(true)
    }

    fn find(&self, key: &str) -> Option<&TrieNode> {
        let mut current = &self.root;
        for &byte in key.as_bytes() {
            current = current.child(byte)?;
        }
        Some(current)
    }
}

/// Returns `None` when `key` is not stored. Otherwise `Some(prune)`, where
/// `prune` tells the parent to drop this node.
fn remove_from(node: &mut TrieNode, key: &[u8]) -> Option<bool> {
    match key.split_first() {
        None => {
            node.file_info.take()?;
            Some(node.children.is_empty())
        }
        Some((byte, rest)) => {
            let child = node.children.get_mut(byte)?;
            if remove_from(child, rest)? {
                node.children.remove(byte);
            }
            Some(!node.is_leaf() && node.children.is_empty())
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
