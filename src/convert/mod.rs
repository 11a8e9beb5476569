//! ASDF-in-FITS to standalone ASDF conversion
//!
//! An ASDF-in-FITS file is a FITS file with an extension HDU named `ASDF`
//! whose data is a complete ASDF document. Arrays in that document may live
//! in other HDUs of the FITS file (`source: fits:SCI,1`); extraction copies
//! those into binary blocks so the output stands alone.
//!
//! # Modules
//!
//! - [`fits`]: FITS header cards and HDU boundaries
//! - [`document`]: ASDF header, tree and block layout

pub mod document;
pub mod fits;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CompatConfig;
use crate::registry::{RegistryError, VersionMapRegistry};
use crate::version::AsdfVersion;
use document::{ASDF_MAGIC, AsdfDocument, DocumentError, FITS_SOURCE_PREFIX};
use fits::{FitsError, Hdu};

/// `EXTNAME` (or non-standard `XTENSION`) of the HDU holding the document
pub const ASDF_EXTENSION_NAME: &str = "ASDF";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Given input file '{}' is not ASDF-in-FITS", .0.display())]
    NotEmbedded(PathBuf),

    #[error("Given input file '{}' is neither FITS nor ASDF", .0.display())]
    UnrecognizedFormat(PathBuf),

    #[error("Invalid FITS structure: {0}")]
    InvalidFits(#[from] FitsError),

    #[error("Given input file '{}' has no ASDF extension", .0.display())]
    MissingAsdfExtension(PathBuf),

    #[error("Invalid embedded ASDF document: {0}")]
    InvalidDocument(#[from] DocumentError),

    #[error("Array source '{0}' does not name an HDU with data")]
    UnresolvedFitsReference(String),

    #[error("Moving arrays into blocks would change other nodes of the tree")]
    TreeChanged,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What [`extract_file`] wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub standard_version: AsdfVersion,
    pub file_format: AsdfVersion,
    /// HDU arrays copied into new binary blocks
    pub moved_arrays: usize,
    /// Total binary blocks in the output
    pub blocks: usize,
    pub bytes_written: usize,
}

/// A standalone document ready to be written
#[derive(Debug)]
pub struct Extracted {
    pub bytes: Vec<u8>,
    pub summary: ExtractSummary,
}

/// HDU named by an ndarray `source`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitsReference {
    /// `fits:<index>`
    Index(usize),
    /// `fits:<EXTNAME>,<EXTVER>`
    Named { name: String, version: i64 },
}

impl FitsReference {
    pub fn parse(source: &str) -> Option<Self> {
        let target = source.strip_prefix(FITS_SOURCE_PREFIX)?.trim();
        match target.split_once(',') {
            Some((name, version)) => Some(FitsReference::Named {
                name: name.trim().to_string(),
                version: version.trim().parse().ok()?,
            }),
            None => target.parse().ok().map(FitsReference::Index),
        }
    }

    pub fn find<'h, 'a>(&self, hdus: &'h [Hdu<'a>]) -> Option<&'h Hdu<'a>> {
        match self {
            FitsReference::Index(index) => hdus.get(*index),
            FitsReference::Named { name, version } => hdus.iter().find(|hdu| {
                hdu.name().is_some_and(|n| n.eq_ignore_ascii_case(name)) && hdu.version() == *version
            }),
        }
    }
}

fn find_asdf_extension<'h, 'a>(hdus: &'h [Hdu<'a>]) -> Option<&'h Hdu<'a>> {
    fits::find_extension(hdus, ASDF_EXTENSION_NAME).or_else(|| {
        hdus.iter().filter(|hdu| !hdu.is_primary()).find(|hdu| {
            hdu.header
                .text("XTENSION")
                .is_some_and(|x| x.trim().eq_ignore_ascii_case(ASDF_EXTENSION_NAME))
        })
    })
}

/// Build the standalone document for an ASDF-in-FITS file held in memory
///
/// `input` only names the file in errors and logs.
pub fn extract_bytes(
    bytes: &[u8],
    input: &Path,
    registry: &VersionMapRegistry,
    config: &CompatConfig,
) -> Result<Extracted, ExtractError> {
    if bytes.starts_with(ASDF_MAGIC) {
        return Err(ExtractError::NotEmbedded(input.to_path_buf()));
    }
    if !fits::is_fits(bytes) {
        return Err(ExtractError::UnrecognizedFormat(input.to_path_buf()));
    }

    let hdus = fits::parse_hdus(bytes)?;
    debug!("{}: {} HDUs", input.display(), hdus.len());
    let asdf_hdu =
        find_asdf_extension(&hdus).ok_or_else(|| ExtractError::MissingAsdfExtension(input.to_path_buf()))?;
    let document = AsdfDocument::parse(asdf_hdu.data)?;

    let standard_version = match document.standard_version {
        Some(version) => version,
        None => {
            info!(
                "{}: no #ASDF_STANDARD header, assuming {}",
                input.display(),
                config.default_standard_version
            );
            config.default_standard_version
        }
    };
    let map = registry.get_version_map(&standard_version)?;

    let references = document.fits_references();
    if !references.is_empty() && document.has_streamed_block() {
        return Err(DocumentError::UnsupportedBlocks(
            "arrays cannot be appended after a streamed block".to_string(),
        )
        .into());
    }

    let mut tree_text = document.tree_text.map(str::to_string);
    let mut moved = Vec::with_capacity(references.len());
    let mut block_indices = HashMap::with_capacity(references.len());
    for (i, source) in references.iter().enumerate() {
        let hdu = FitsReference::parse(source)
            .and_then(|reference| reference.find(&hdus))
            .filter(|hdu| !hdu.data.is_empty())
            .ok_or_else(|| ExtractError::UnresolvedFitsReference(source.clone()))?;
        let block_index = document.blocks.len() + i;
        debug!("Moving {} ({} bytes) to block {}", source, hdu.data.len(), block_index);
        tree_text = tree_text
            .map(|text| document::replace_source(&text, source, &block_index.to_string()));
        block_indices.insert(source.as_str(), block_index);
        moved.push(document::encode_block(hdu.data));
    }

    let rewritten_tree = tree_text.as_deref().filter(|_| !moved.is_empty());
    if let (Some(text), Some(tree)) = (rewritten_tree, document.tree.as_ref()) {
        let rewritten: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(DocumentError::from)?;
        if let Some(source) = document::fits_references_in(&rewritten).into_iter().next() {
            warn!("Array source '{}' could not be rewritten", source);
            return Err(ExtractError::UnresolvedFitsReference(source));
        }
        if rewritten != document::with_sources_moved(tree, &block_indices) {
            warn!("Rewriting array sources changed other nodes of {}", input.display());
            return Err(ExtractError::TreeChanged);
        }
    }

    let blocks: Vec<&[u8]> = document
        .blocks
        .iter()
        .map(|block| block.bytes)
        .chain(moved.iter().map(Vec::as_slice))
        .collect();
    let bytes = document::render(map, &document.comments, tree_text.as_deref(), &blocks);

    Ok(Extracted {
        summary: ExtractSummary {
            standard_version,
            file_format: map.file_format(),
            moved_arrays: moved.len(),
            blocks: blocks.len(),
            bytes_written: bytes.len(),
        },
        bytes,
    })
}

/// Extract the ASDF document embedded in `input` into the standalone file `output`
///
/// The output is written to a temporary file next to `output` and renamed
/// into place, so a failed extraction never leaves a partial file behind.
pub fn extract_file(
    input: &Path,
    output: &Path,
    registry: &VersionMapRegistry,
    config: &CompatConfig,
) -> Result<ExtractSummary, ExtractError> {
    info!("Extracting {} to {}", input.display(), output.display());
    let bytes = std::fs::read(input).map_err(|source| ExtractError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let extracted = extract_bytes(&bytes, input, registry, config)?;
    write_atomically(output, &extracted.bytes)?;

    info!(
        "Wrote {} ({} bytes, ASDF Standard {}, {} arrays moved)",
        output.display(),
        extracted.summary.bytes_written,
        extracted.summary.standard_version,
        extracted.summary.moved_arrays
    );
    Ok(extracted.summary)
}

fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
    let write_error = |source| ExtractError::Write {
        path: output.to_path_buf(),
        source,
    };

    let dir = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.persist(output).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("fits:SCI,1", Some(FitsReference::Named { name: "SCI".to_string(), version: 1 }))]
    #[case("fits:sci, 2", Some(FitsReference::Named { name: "sci".to_string(), version: 2 }))]
    #[case("fits:3", Some(FitsReference::Index(3)))]
    #[case("fits:SCI", None)]
    #[case("fits:SCI,x", None)]
    #[case("file.fits", None)]
    fn fits_reference_parses_index_and_named_forms(
        #[case] source: &str,
        #[case] expected: Option<FitsReference>,
    ) {
        assert_eq!(FitsReference::parse(source), expected);
    }

    #[test]
    fn standalone_asdf_is_not_embedded() {
        let result = extract_bytes(
            b"#ASDF 1.0.0\n%YAML 1.1\n---\n{}\n...\n",
            Path::new("plain.asdf"),
            VersionMapRegistry::builtin(),
            &CompatConfig::default(),
        );

        let error = result.unwrap_err();
        assert!(matches!(error, ExtractError::NotEmbedded(_)));
        assert_eq!(
            error.to_string(),
            "Given input file 'plain.asdf' is not ASDF-in-FITS"
        );
    }

    #[test]
    fn other_formats_are_rejected() {
        assert!(matches!(
            extract_bytes(
                b"\x89PNG\r\n",
                Path::new("image.png"),
                VersionMapRegistry::builtin(),
                &CompatConfig::default(),
            ),
            Err(ExtractError::UnrecognizedFormat(_))
        ));
    }
}
