//! On-disk trie snapshot formats.
//!
//! [`NativeFormat`] is the legacy layout: a depth-first, pre-order record per
//! node with no header, magic number or version tag.
//!
//! ```text
//! node    := is_leaf:u8 [info] child_count:usize child*
//! info    := str(filename) str(absolute_path) str(extension)
//! str     := len:usize bytes[len]
//! child   := edge:u8 node
//! ```
//!
//! `usize` is written in native width and byte order, so snapshots are only
//! portable between builds with the same pointer width and endianness.

use crate::index::trie::TrieNode;
use crate::index::types::FileInfo;
use crate::utils::encoding::{
    read_bool, read_len_prefixed, read_u8, read_usize_ne, write_bool, write_len_prefixed,
    write_u8, write_usize_ne,
};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};

/// Nesting deeper than this is treated as corruption rather than recursed into
pub const MAX_SNAPSHOT_DEPTH: usize = 1024;

/// Encoding of a trie node tree
pub trait SnapshotFormat {
    fn write_node<W: Write>(&self, node: &TrieNode, out: &mut W) -> io::Result<()>;
    fn read_node<R: Read>(&self, input: &mut R) -> io::Result<TrieNode>;
}

/// Legacy headerless format
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFormat;

impl SnapshotFormat for NativeFormat {
    fn write_node<W: Write>(&self, node: &TrieNode, out: &mut W) -> io::Result<()> {
        write_bool(out, node.is_leaf())?;

        if let Some(info) = &node.file_info {
            write_len_prefixed(out, info.filename.as_bytes())?;
            write_len_prefixed(out, info.absolute_path.as_bytes())?;
            write_len_prefixed(out, info.extension.as_bytes())?;
        }

        write_usize_ne(out, node.children.len())?;
        for (&edge, child) in &node.children {
            write_u8(out, edge)?;
            self.write_node(child, out)?;
        }

        Ok(())
    }

    fn read_node<R: Read>(&self, input: &mut R) -> io::Result<TrieNode> {
        read_node_at(input, 0)
    }
}

fn read_node_at<R: Read>(input: &mut R, depth: usize) -> io::Result<TrieNode> {
    if depth > MAX_SNAPSHOT_DEPTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("snapshot nesting exceeds {} levels", MAX_SNAPSHOT_DEPTH),
        ));
    }

    let is_leaf = read_bool(input)?;
    let file_info = if is_leaf {
        let filename = read_string(input)?;
        let absolute_path = read_string(input)?;
        let extension = read_string(input)?;
        Some(FileInfo {
            filename,
            absolute_path,
            extension,
        })
    } else {
        None
    };

    let child_count = read_usize_ne(input)?;
    let mut children = BTreeMap::new();
    for _ in 0..child_count {
        let edge = read_u8(input)?;
        let child = read_node_at(input, depth + 1)?;
        children.insert(edge, child);
    }

    Ok(TrieNode {
        file_info,
        children,
    })
}

fn read_string<R: Read>(input: &mut R) -> io::Result<String> {
    let bytes = read_len_prefixed(input)?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::trie::Trie;
    use std::io::Cursor;

    const USIZE: usize = std::mem::size_of::<usize>();

    #[test]
    fn test_empty_tree_layout() {
        let mut buf = Vec::new();
        NativeFormat.write_node(&TrieNode::default(), &mut buf).unwrap();

        let mut expected = vec![0u8];
        expected.extend_from_slice(&0usize.to_ne_bytes());
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_single_entry_layout() {
        let mut trie = Trie::new();
        trie.insert("a", "/a", "");

        let mut buf = Vec::new();
        trie.write_to(&mut buf).unwrap();

        let mut expected = vec![0u8];
        expected.extend_from_slice(&1usize.to_ne_bytes());
        expected.push(b'a');
        expected.push(1);
        for s in ["a", "/a", ""] {
            expected.extend_from_slice(&s.len().to_ne_bytes());
            expected.extend_from_slice(s.as_bytes());
        }
        expected.extend_from_slice(&0usize.to_ne_bytes());

        assert_eq!(buf, expected);
        assert_eq!(buf.len(), 1 + USIZE + 1 + 1 + 3 * USIZE + 1 + 2 + USIZE);
    }

    #[test]
    fn test_invalid_utf8_decoded_lossily() {
        let mut buf = vec![1u8];
        for s in [&b"\xff"[..], &b"/x"[..], &b""[..]] {
            buf.extend_from_slice(&s.len().to_ne_bytes());
            buf.extend_from_slice(s);
        }
        buf.extend_from_slice(&0usize.to_ne_bytes());

        let node = NativeFormat.read_node(&mut Cursor::new(buf)).unwrap();
        assert_eq!(node.file_info().unwrap().filename, "\u{fffd}");
    }

    #[test]
    fn test_excessive_nesting_rejected() {
        let mut buf = Vec::new();
        for _ in 0..=MAX_SNAPSHOT_DEPTH + 1 {
            buf.push(0u8);
            buf.extend_from_slice(&1usize.to_ne_bytes());
            buf.push(b'x');
        }

        let err = NativeFormat.read_node(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(NativeFormat.read_node(&mut Cursor::new(Vec::new())).is_err());
    }
}
