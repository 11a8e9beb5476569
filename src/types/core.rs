//! Handlers for the `core` schema families

use std::sync::Arc;

use crate::types::extension::{Extension, ExtensionType, VersionedType};
use crate::version::AsdfVersion;

const V1_0_0: AsdfVersion = AsdfVersion::new(1, 0, 0);
const V1_1_0: AsdfVersion = AsdfVersion::new(1, 1, 0);

/// Handler families shipped for the core schemas: tag-base, type name, versions
const HANDLERS: &[(&str, &str, &[AsdfVersion])] = &[
    ("tag:stsci.edu:asdf/core/asdf", "AsdfObject", &[V1_0_0, V1_1_0]),
    ("tag:stsci.edu:asdf/core/column", "Column", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/complex", "Complex", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/constant", "Constant", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/extension_metadata", "ExtensionMetadata", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/externalarray", "ExternalArrayReference", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/history_entry", "HistoryEntry", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/integer", "IntegerType", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/ndarray", "NDArray", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/software", "Software", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/subclass_metadata", "SubclassMetadata", &[V1_0_0]),
    ("tag:stsci.edu:asdf/core/table", "Table", &[V1_0_0]),
];

/// The extension every reader ships with
///
/// Registers the core handler families this crate implements. The set is
/// fixed; a version map that names a core tag-version missing here shows up
/// as an integrity fault. Standard-category families come from other
/// extensions.
#[derive(Debug, Clone)]
pub struct CoreExtension {
    types: Vec<VersionedType>,
}

impl Default for CoreExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreExtension {
    pub fn new() -> Self {
        let types = HANDLERS
            .iter()
            .flat_map(|(tag_base, name, versions)| VersionedType::family(name, tag_base, versions))
            .collect();

        Self { types }
    }
}

impl Extension for CoreExtension {
    fn name(&self) -> &str {
        "core"
    }

    fn types(&self) -> Vec<Arc<dyn ExtensionType>> {
        self.types
            .iter()
            .cloned()
            .map(|handler| Arc::new(handler) as Arc<dyn ExtensionType>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoriesConfig;
    use crate::integrity::{IntegrityChecker, IntegrityFaultKind};
    use crate::registry::{SchemaCategory, VersionMap, VersionMapRegistry};
    use crate::schema::MockSchemaLoader;
    use crate::types::TypeIndex;

    fn checker_faults(tag_base: &str, version: AsdfVersion) -> Vec<IntegrityFaultKind> {
        let registry = VersionMapRegistry::new([VersionMap::new(
            AsdfVersion::new(9, 0, 0),
            V1_0_0,
            "1.1",
            [(tag_base, version)],
        )])
        .unwrap();
        let mut schemas = MockSchemaLoader::new();
        schemas
            .expect_load_schema()
            .returning(|tag| Ok(serde_json::json!({ "tag": tag })));
        let core = CoreExtension::new();
        let types = TypeIndex::from_extensions([&core as &dyn Extension]);
        let checker = IntegrityChecker::new(&registry, &schemas, &types, CategoriesConfig::default());

        checker
            .check_version_map_support(AsdfVersion::new(9, 0, 0), SchemaCategory::Core)
            .unwrap()
            .into_iter()
            .map(|fault| fault.kind)
            .collect()
    }

    #[test]
    fn bumped_core_tag_without_handler_is_a_fault() {
        let kinds = checker_faults("tag:stsci.edu:asdf/core/ndarray", V1_1_0);

        assert!(matches!(
            kinds.as_slice(),
            [IntegrityFaultKind::HandlerTagMismatch { declared }] if declared == "tag:stsci.edu:asdf/core/ndarray-1.0.0"
        ));
    }

    #[test]
    fn new_core_family_without_handler_is_missing() {
        let kinds = checker_faults("tag:stsci.edu:asdf/core/widget", V1_0_0);

        assert!(matches!(kinds.as_slice(), [IntegrityFaultKind::HandlerMissing]));
    }

    #[test]
    fn registers_both_asdf_object_versions() {
        let extension = CoreExtension::new();
        let tags: Vec<String> = extension
            .types()
            .iter()
            .filter(|handler| handler.type_name() == "AsdfObject")
            .map(|handler| handler.yaml_tag().to_string())
            .collect();

        assert_eq!(
            tags,
            vec![
                "tag:stsci.edu:asdf/core/asdf-1.0.0",
                "tag:stsci.edu:asdf/core/asdf-1.1.0",
            ]
        );
    }

    #[test]
    fn covers_every_core_tag_of_every_version_map() {
        let extension = CoreExtension::new();
        let declared: Vec<String> = extension
            .types()
            .iter()
            .map(|handler| handler.yaml_tag().to_string())
            .collect();

        for map in VersionMapRegistry::builtin().version_maps() {
            for tag in map.qualified_tags(SchemaCategory::Core) {
                assert!(declared.contains(&tag), "missing handler for {tag}");
            }
        }
    }

    #[test]
    fn registers_no_standard_handlers() {
        assert!(
            CoreExtension::new()
                .types()
                .iter()
                .all(|handler| SchemaCategory::of_tag(handler.yaml_tag()) == SchemaCategory::Core)
        );
    }
}
