//! Built-in version maps for ASDF Standard 1.0.0 through 1.5.0

use crate::registry::version_map::VersionMap;
use crate::version::AsdfVersion;

pub const DEFAULT_STANDARD_VERSION: AsdfVersion = AsdfVersion::new(1, 5, 0);

struct VersionMapSource {
    standard: [u64; 3],
    file_format: [u64; 3],
    yaml_version: &'static str,
    tags: &'static [(&'static str, [u64; 3])],
}

const ASDF: &str = "tag:stsci.edu:asdf/core/asdf";
const COLUMN: &str = "tag:stsci.edu:asdf/core/column";
const COMPLEX: &str = "tag:stsci.edu:asdf/core/complex";
const CONSTANT: &str = "tag:stsci.edu:asdf/core/constant";
const EXTENSION_METADATA: &str = "tag:stsci.edu:asdf/core/extension_metadata";
const EXTERNALARRAY: &str = "tag:stsci.edu:asdf/core/externalarray";
const HISTORY_ENTRY: &str = "tag:stsci.edu:asdf/core/history_entry";
const INTEGER: &str = "tag:stsci.edu:asdf/core/integer";
const NDARRAY: &str = "tag:stsci.edu:asdf/core/ndarray";
const SOFTWARE: &str = "tag:stsci.edu:asdf/core/software";
const SUBCLASS_METADATA: &str = "tag:stsci.edu:asdf/core/subclass_metadata";
const TABLE: &str = "tag:stsci.edu:asdf/core/table";

const FITS: &str = "tag:stsci.edu:asdf/fits/fits";
const TIME: &str = "tag:stsci.edu:asdf/time/time";
const UNIT: &str = "tag:stsci.edu:asdf/unit/unit";
const DEFUNIT: &str = "tag:stsci.edu:asdf/unit/defunit";
const QUANTITY: &str = "tag:stsci.edu:asdf/unit/quantity";
const WCS: &str = "tag:stsci.edu:asdf/wcs/wcs";
const AFFINE: &str = "tag:stsci.edu:asdf/transform/affine";
const POLYNOMIAL: &str = "tag:stsci.edu:asdf/transform/polynomial";

const SOURCES: &[VersionMapSource] = &[
    VersionMapSource {
        standard: [1, 0, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 0, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 0, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 0, 0]),
            (WCS, [1, 0, 0]),
            (AFFINE, [1, 0, 0]),
            (POLYNOMIAL, [1, 0, 0]),
        ],
    },
    VersionMapSource {
        standard: [1, 1, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 1, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (EXTENSION_METADATA, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 1, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 1, 0]),
            (WCS, [1, 1, 0]),
            (AFFINE, [1, 1, 0]),
            (POLYNOMIAL, [1, 1, 0]),
        ],
    },
    VersionMapSource {
        standard: [1, 2, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 1, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (EXTENSION_METADATA, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (SUBCLASS_METADATA, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 1, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 1, 0]),
            (WCS, [1, 1, 0]),
            (AFFINE, [1, 2, 0]),
            (POLYNOMIAL, [1, 1, 0]),
        ],
    },
    VersionMapSource {
        standard: [1, 3, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 1, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (EXTENSION_METADATA, [1, 0, 0]),
            (EXTERNALARRAY, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (SUBCLASS_METADATA, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 1, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 1, 0]),
            (WCS, [1, 1, 0]),
            (AFFINE, [1, 2, 0]),
            (POLYNOMIAL, [1, 2, 0]),
        ],
    },
    VersionMapSource {
        standard: [1, 4, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 1, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (EXTENSION_METADATA, [1, 0, 0]),
            (EXTERNALARRAY, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (INTEGER, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (SUBCLASS_METADATA, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 1, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 1, 0]),
            (WCS, [1, 2, 0]),
            (AFFINE, [1, 3, 0]),
            (POLYNOMIAL, [1, 2, 0]),
        ],
    },
    VersionMapSource {
        standard: [1, 5, 0],
        file_format: [1, 0, 0],
        yaml_version: "1.1",
        tags: &[
            (ASDF, [1, 1, 0]),
            (COLUMN, [1, 0, 0]),
            (COMPLEX, [1, 0, 0]),
            (CONSTANT, [1, 0, 0]),
            (EXTENSION_METADATA, [1, 0, 0]),
            (EXTERNALARRAY, [1, 0, 0]),
            (HISTORY_ENTRY, [1, 0, 0]),
            (INTEGER, [1, 0, 0]),
            (NDARRAY, [1, 0, 0]),
            (SOFTWARE, [1, 0, 0]),
            (SUBCLASS_METADATA, [1, 0, 0]),
            (TABLE, [1, 0, 0]),
            (FITS, [1, 0, 0]),
            (TIME, [1, 2, 0]),
            (UNIT, [1, 0, 0]),
            (DEFUNIT, [1, 0, 0]),
            (QUANTITY, [1, 1, 0]),
            (WCS, [1, 2, 0]),
            (AFFINE, [1, 3, 0]),
            (POLYNOMIAL, [1, 2, 0]),
        ],
    },
];

pub(crate) fn version_maps() -> Vec<VersionMap> {
    SOURCES
        .iter()
        .map(|source| {
            VersionMap::new(
                AsdfVersion::from(source.standard),
                AsdfVersion::from(source.file_format),
                source.yaml_version,
                source
                    .tags
                    .iter()
                    .map(|(tag_base, tag_version)| (*tag_base, AsdfVersion::from(*tag_version))),
            )
        })
        .collect()
}
