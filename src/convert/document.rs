//! ASDF file layout: header comments, YAML tree, binary blocks

use std::collections::HashMap;

use indexmap::IndexSet;
use thiserror::Error;

use crate::registry::VersionMap;
use crate::version::{AsdfVersion, VersionError};

/// First bytes of every standalone ASDF file
pub const ASDF_MAGIC: &[u8] = b"#ASDF ";

const STANDARD_COMMENT: &str = "#ASDF_STANDARD ";

/// First bytes of every binary block
pub const BLOCK_MAGIC: &[u8] = b"\xd3BLK";

const BLOCK_INDEX_HEADER: &[u8] = b"#ASDF BLOCK INDEX";

/// Size of the fixed block header after the magic and the size field
const BLOCK_HEADER_SIZE: u16 = 48;

const STREAMED_FLAG: u32 = 0x1;

/// Prefix of an ndarray `source` that points into a FITS HDU
pub const FITS_SOURCE_PREFIX: &str = "fits:";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document does not start with an #ASDF header")]
    MissingHeader,

    #[error("Header line is not valid text")]
    NotText,

    #[error("Invalid file format version in header: {0}")]
    Version(#[from] VersionError),

    #[error("YAML tree has no '...' end marker")]
    UnterminatedTree,

    #[error("YAML tree cannot be parsed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported block layout: {0}")]
    UnsupportedBlocks(String),
}

/// One binary block, borrowed from the input
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub flags: u32,
    /// The whole block: magic, header and allocated data
    pub bytes: &'a [u8],
}

impl Block<'_> {
    pub fn is_streamed(&self) -> bool {
        self.flags & STREAMED_FLAG != 0
    }
}

/// A parsed ASDF document that still borrows its input bytes
#[derive(Debug)]
pub struct AsdfDocument<'a> {
    pub file_format: AsdfVersion,
    pub standard_version: Option<AsdfVersion>,
    /// Header comment lines other than the two version lines
    pub comments: Vec<&'a str>,
    /// YAML text up to and including the end marker
    pub tree_text: Option<&'a str>,
    pub tree: Option<serde_yaml::Value>,
    pub blocks: Vec<Block<'a>>,
}

impl<'a> AsdfDocument<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DocumentError> {
        if !bytes.starts_with(ASDF_MAGIC) {
            return Err(DocumentError::MissingHeader);
        }

        let mut offset = 0;
        let mut file_format = None;
        let mut standard_version = None;
        let mut comments = Vec::new();
        while bytes.get(offset) == Some(&b'#') && !bytes[offset..].starts_with(BLOCK_INDEX_HEADER) {
            let end = find(&bytes[offset..], b"\n").map_or(bytes.len(), |i| offset + i + 1);
            let line = std::str::from_utf8(&bytes[offset..end])
                .map_err(|_| DocumentError::NotText)?
                .trim_end();
            offset = end;

            if file_format.is_none() {
                let version = line
                    .strip_prefix("#ASDF ")
                    .ok_or(DocumentError::MissingHeader)?;
                file_format = Some(AsdfVersion::parse(version.trim())?);
            } else if let Some(version) = line.strip_prefix(STANDARD_COMMENT) {
                standard_version = Some(AsdfVersion::parse(version.trim())?);
            } else {
                comments.push(line);
            }
        }
        let file_format = file_format.ok_or(DocumentError::MissingHeader)?;

        let rest = &bytes[offset..];
        let (tree_text, tree, rest) = if rest.starts_with(b"%YAML") || rest.starts_with(b"---") {
            let end = tree_end(rest).ok_or(DocumentError::UnterminatedTree)?;
            let text = std::str::from_utf8(&rest[..end]).map_err(|_| DocumentError::NotText)?;
            let tree: serde_yaml::Value = serde_yaml::from_str(text)?;
            (Some(text), Some(tree), &rest[end..])
        } else {
            (None, None, rest)
        };

        Ok(Self {
            file_format,
            standard_version,
            comments,
            tree_text,
            tree,
            blocks: parse_blocks(rest)?,
        })
    }

    pub fn has_streamed_block(&self) -> bool {
        self.blocks.iter().any(Block::is_streamed)
    }

    /// Distinct `fits:` array sources in the tree, in document order
    pub fn fits_references(&self) -> Vec<String> {
        self.tree.as_ref().map(fits_references_in).unwrap_or_default()
    }
}

/// Distinct `fits:` array sources anywhere in `tree`, in document order
pub fn fits_references_in(tree: &serde_yaml::Value) -> Vec<String> {
    let mut references = IndexSet::new();
    collect_fits_references(tree, &mut references);
    references.into_iter().collect()
}

fn collect_fits_references(value: &serde_yaml::Value, references: &mut IndexSet<String>) {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (key, value) in mapping {
                match (key.as_str(), value.as_str()) {
                    (Some("source"), Some(source)) if source.starts_with(FITS_SOURCE_PREFIX) => {
                        references.insert(source.to_string());
                    }
                    _ => collect_fits_references(value, references),
                }
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                collect_fits_references(item, references);
            }
        }
        serde_yaml::Value::Tagged(tagged) => collect_fits_references(&tagged.value, references),
        _ => {}
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Offset just past the `...` line that ends the tree
fn tree_end(text: &[u8]) -> Option<usize> {
    let marker = find(text, b"\n...\n")
        .map(|i| i + 5)
        .or_else(|| find(text, b"\n...\r\n").map(|i| i + 6));
    marker.or_else(|| text.ends_with(b"\n...").then_some(text.len()))
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn read_u64(bytes: &[u8], at: usize) -> Option<u64> {
    Some(u64::from_be_bytes(bytes.get(at..at + 8)?.try_into().ok()?))
}

fn is_padding(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| b.is_ascii_whitespace() || *b == 0)
}

/// Blocks following the tree; a trailing block index is dropped
fn parse_blocks(bytes: &[u8]) -> Result<Vec<Block<'_>>, DocumentError> {
    let Some(start) = find(bytes, BLOCK_MAGIC) else {
        let trailing = find(bytes, BLOCK_INDEX_HEADER).map_or(bytes, |i| &bytes[..i]);
        return if is_padding(trailing) {
            Ok(Vec::new())
        } else {
            Err(DocumentError::UnsupportedBlocks(
                "unexpected data after the tree".to_string(),
            ))
        };
    };
    if !is_padding(&bytes[..start]) {
        return Err(DocumentError::UnsupportedBlocks(
            "unexpected data before the first block".to_string(),
        ));
    }

    let mut blocks = Vec::new();
    let mut offset = start;
    while bytes[offset..].starts_with(BLOCK_MAGIC) {
        let block = &bytes[offset..];
        let malformed =
            || DocumentError::UnsupportedBlocks(format!("block {} has a malformed header", blocks.len()));

        let header_size = read_u16(block, 4).ok_or_else(malformed)?;
        if header_size < BLOCK_HEADER_SIZE {
            return Err(malformed());
        }
        let flags = read_u32(block, 6).ok_or_else(malformed)?;
        if flags & STREAMED_FLAG != 0 {
            blocks.push(Block { flags, bytes: block });
            offset = bytes.len();
            break;
        }

        let allocated = read_u64(block, 14)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(malformed)?;
        let len = (6 + usize::from(header_size))
            .checked_add(allocated)
            .filter(|len| *len <= block.len())
            .ok_or_else(|| {
                DocumentError::UnsupportedBlocks(format!("block {} is truncated", blocks.len()))
            })?;
        blocks.push(Block {
            flags,
            bytes: &block[..len],
        });
        offset += len;
    }

    let trailing = &bytes[offset..];
    if trailing.starts_with(BLOCK_INDEX_HEADER) || is_padding(trailing) {
        Ok(blocks)
    } else {
        Err(DocumentError::UnsupportedBlocks(format!(
            "unexpected data after block {}",
            blocks.len().saturating_sub(1)
        )))
    }
}

/// Encode `data` as an uncompressed block without a checksum
pub fn encode_block(data: &[u8]) -> Vec<u8> {
    let size = data.len() as u64;
    let mut block = Vec::with_capacity(6 + usize::from(BLOCK_HEADER_SIZE) + data.len());
    block.extend_from_slice(BLOCK_MAGIC);
    block.extend_from_slice(&BLOCK_HEADER_SIZE.to_be_bytes());
    block.extend_from_slice(&0u32.to_be_bytes());
    block.extend_from_slice(&[0; 4]);
    block.extend_from_slice(&size.to_be_bytes());
    block.extend_from_slice(&size.to_be_bytes());
    block.extend_from_slice(&size.to_be_bytes());
    block.extend_from_slice(&[0; 16]);
    block.extend_from_slice(data);
    block
}

const SOURCE_KEY: &str = "source:";

/// Whether `before` ends with a `source:` key, so the next scalar is its value
fn follows_source_key(before: &str) -> bool {
    let key = before.trim_end_matches([' ', '\t']);
    key.strip_suffix(SOURCE_KEY).is_some_and(|prefix| {
        prefix
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '{' | ',' | '-'))
    })
}

/// Replace the value `from` of every `source:` key in YAML text with `to`
///
/// Quoted values lose their quotes. Plain values are replaced only when they
/// form a whole scalar, so `fits:SCI,1` leaves `fits:SCI,10` alone. Other
/// scalars with the same text are left untouched.
pub fn replace_source(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(from) {
        let before = &rest[..pos];
        let after = &rest[pos + from.len()..];

        let quote = ['"', '\'']
            .into_iter()
            .find(|q| before.ends_with(*q) && after.starts_with(*q));
        if let Some(quote) = quote {
            let unquoted = &before[..before.len() - quote.len_utf8()];
            if follows_source_key(unquoted) {
                out.push_str(unquoted);
                out.push_str(to);
                rest = &after[quote.len_utf8()..];
                continue;
            }
        }

        let whole = quote.is_none()
            && follows_source_key(before)
            && after
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace() || matches!(c, ',' | '}'));
        out.push_str(before);
        out.push_str(if whole { to } else { from });
        rest = after;
    }
    out.push_str(rest);
    out
}

/// `tree` with every `fits:` source listed in `blocks` replaced by its block index
pub fn with_sources_moved(
    tree: &serde_yaml::Value,
    blocks: &HashMap<&str, usize>,
) -> serde_yaml::Value {
    use serde_yaml::Value;

    match tree {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(key, value)| {
                    let moved = match (key.as_str(), value.as_str()) {
                        (Some("source"), Some(source)) => blocks.get(source).copied(),
                        _ => None,
                    };
                    let value = match moved {
                        Some(index) => Value::from(index as u64),
                        None => with_sources_moved(value, blocks),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| with_sources_moved(item, blocks))
                .collect(),
        ),
        Value::Tagged(tagged) => Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
            tag: tagged.tag.clone(),
            value: with_sources_moved(&tagged.value, blocks),
        })),
        other => other.clone(),
    }
}

/// Render a standalone document for the standard version of `map`
///
/// `tree_text` replaces the original tree; its `%YAML` directive is set to the
/// map's YAML version. `blocks` are written in order after the tree.
pub fn render(
    map: &VersionMap,
    comments: &[&str],
    tree_text: Option<&str>,
    blocks: &[&[u8]],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("#ASDF {}\n", map.file_format()).as_bytes());
    out.extend_from_slice(format!("{}{}\n", STANDARD_COMMENT, map.standard_version()).as_bytes());
    for comment in comments {
        out.extend_from_slice(comment.as_bytes());
        out.push(b'\n');
    }

    if let Some(text) = tree_text {
        out.extend_from_slice(format!("%YAML {}\n", map.yaml_version()).as_bytes());
        let body = if text.starts_with("%YAML") {
            text.split_once('\n').map_or("", |(_, body)| body)
        } else {
            text
        };
        out.extend_from_slice(body.as_bytes());
    }

    for block in blocks {
        out.extend_from_slice(block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::get_version_map;
    use rstest::rstest;

    const TREE: &str = "%YAML 1.1\n%TAG ! tag:stsci.edu:asdf/\n--- !core/asdf-1.1.0\n\
data: !core/ndarray-1.0.0\n  source: fits:SCI,1\n  datatype: uint8\n  byteorder: big\n  shape: [4]\n\
mask: !core/ndarray-1.0.0\n  source: \"fits:SCI,10\"\n  datatype: uint8\n  byteorder: big\n  shape: [4]\n...\n";

    fn document(header: &str, tree: &str, blocks: &[u8]) -> Vec<u8> {
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(tree.as_bytes());
        bytes.extend_from_slice(blocks);
        bytes
    }

    #[test]
    fn parse_reads_header_versions_and_comments() {
        let bytes = document("#ASDF 1.0.0\n#ASDF_STANDARD 1.3.0\n#written by hand\n", TREE, b"");

        let doc = AsdfDocument::parse(&bytes).unwrap();

        assert_eq!(doc.file_format, "1.0.0");
        assert_eq!(doc.standard_version, Some(AsdfVersion::new(1, 3, 0)));
        assert_eq!(doc.comments, vec!["#written by hand"]);
        assert_eq!(doc.tree_text, Some(TREE));
        assert!(doc.blocks.is_empty());
    }

    #[test]
    fn parse_collects_distinct_fits_references_in_order() {
        let bytes = document("#ASDF 1.0.0\n", TREE, b"");

        let doc = AsdfDocument::parse(&bytes).unwrap();

        assert_eq!(doc.standard_version, None);
        assert_eq!(doc.fits_references(), vec!["fits:SCI,1", "fits:SCI,10"]);
    }

    #[test]
    fn parse_reads_blocks_and_drops_block_index() {
        let mut blocks = encode_block(b"abcd");
        blocks.extend(encode_block(b""));
        blocks.extend_from_slice(b"#ASDF BLOCK INDEX\n%YAML 1.1\n---\n- 123\n...\n");
        let bytes = document("#ASDF 1.0.0\n", TREE, &blocks);

        let doc = AsdfDocument::parse(&bytes).unwrap();

        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].bytes.len(), 54 + 4);
        assert!(doc.blocks[0].bytes.ends_with(b"abcd"));
        assert!(!doc.has_streamed_block());
    }

    #[rstest]
    #[case("ASDF 1.0.0\n", "%YAML 1.1\n---\n{}\n...\n")]
    #[case("#FITS 1.0.0\n", "%YAML 1.1\n---\n{}\n...\n")]
    fn parse_rejects_missing_header(#[case] header: &str, #[case] tree: &str) {
        assert!(matches!(
            AsdfDocument::parse(&document(header, tree, b"")),
            Err(DocumentError::MissingHeader)
        ));
    }

    #[test]
    fn parse_rejects_unterminated_tree() {
        let bytes = document("#ASDF 1.0.0\n", "%YAML 1.1\n---\nkey: value\n", b"");

        assert!(matches!(
            AsdfDocument::parse(&bytes),
            Err(DocumentError::UnterminatedTree)
        ));
    }

    #[test]
    fn parse_rejects_truncated_block() {
        let mut block = encode_block(b"abcdef");
        block.truncate(block.len() - 2);
        let bytes = document("#ASDF 1.0.0\n", "%YAML 1.1\n---\n{}\n...\n", &block);

        assert!(matches!(
            AsdfDocument::parse(&bytes),
            Err(DocumentError::UnsupportedBlocks(_))
        ));
    }

    #[rstest]
    #[case(b"\n\0\0".as_slice(), true)]
    #[case(b"junk\n".as_slice(), false)]
    #[case(b"\n- 1\n".as_slice(), false)]
    fn parse_checks_bytes_before_first_block(#[case] gap: &[u8], #[case] accepted: bool) {
        let mut blocks = gap.to_vec();
        blocks.extend(encode_block(b"abcd"));
        let bytes = document("#ASDF 1.0.0\n", "%YAML 1.1\n---\n{}\n...\n", &blocks);

        let parsed = AsdfDocument::parse(&bytes);

        if accepted {
            assert_eq!(parsed.unwrap().blocks.len(), 1);
        } else {
            assert!(matches!(parsed, Err(DocumentError::UnsupportedBlocks(_))));
        }
    }

    #[rstest]
    #[case("source: fits:SCI,1\n", "source: 0\n")]
    #[case("source: \"fits:SCI,1\"\n", "source: 0\n")]
    #[case("source: 'fits:SCI,1'\n", "source: 0\n")]
    #[case("source: fits:SCI,10\n", "source: fits:SCI,10\n")]
    #[case("source: fits:SCI,1", "source: 0")]
    #[case("data: {source: fits:SCI,1, shape: [4]}\n", "data: {source: 0, shape: [4]}\n")]
    #[case("note: see fits:SCI,1x\n", "note: see fits:SCI,1x\n")]
    #[case("origin: fits:SCI,1\n", "origin: fits:SCI,1\n")]
    #[case("origin: \"fits:SCI,1\"\n", "origin: \"fits:SCI,1\"\n")]
    #[case("- fits:SCI,1\n", "- fits:SCI,1\n")]
    #[case("datasource: fits:SCI,1\n", "datasource: fits:SCI,1\n")]
    fn replace_source_rewrites_source_values_only(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(replace_source(text, "fits:SCI,1", "0"), expected);
    }

    #[test]
    fn with_sources_moved_leaves_other_scalars_alone() {
        let tree: serde_yaml::Value =
            serde_yaml::from_str("data: {source: fits:SCI,1}\norigin: fits:SCI,1\n").unwrap();
        let blocks = HashMap::from([("fits:SCI,1", 0)]);

        let moved = with_sources_moved(&tree, &blocks);

        assert_eq!(moved["data"]["source"].as_u64(), Some(0));
        assert_eq!(moved["origin"].as_str(), Some("fits:SCI,1"));
    }

    #[test]
    fn render_uses_version_map_header_values() {
        let map = get_version_map("1.4.0").unwrap();
        let block = encode_block(b"xy");

        let bytes = render(map, &["#note"], Some("%YAML 1.2\n---\n{}\n...\n"), &[block.as_slice()]);

        let expected_head = "#ASDF 1.0.0\n#ASDF_STANDARD 1.4.0\n#note\n%YAML 1.1\n---\n{}\n...\n";
        assert!(bytes.starts_with(expected_head.as_bytes()));
        assert!(bytes.ends_with(&block));
    }
}
