//! Registry integrity checks
//!
//! For an ASDF Standard version and a schema category, every tag the version
//! map names must have a loadable schema and must resolve to a handler that
//! declares exactly that tag. A handler reached through version fallback is
//! usable for reading but still counts as a fault here.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CategoriesConfig, SupportLevel};
use crate::registry::{RegistryError, SchemaCategory, VersionMapRegistry};
use crate::schema::{SchemaError, SchemaLoader};
use crate::types::{ResolutionContext, TypeIndex};
use crate::version::AsdfVersion;

/// A tag required by a version map that the runtime cannot fully support
#[derive(Debug, Error)]
#[error("ASDF Standard version {standard_version} requires support for {tag}, but {kind}")]
pub struct IntegrityFault {
    pub standard_version: AsdfVersion,
    pub category: SchemaCategory,
    pub tag: String,
    #[source]
    pub kind: IntegrityFaultKind,
}

#[derive(Debug, Error)]
pub enum IntegrityFaultKind {
    #[error("the corresponding schema could not be loaded: {0}")]
    SchemaNotLoadable(#[source] SchemaError),

    #[error("no handler is registered for it")]
    HandlerMissing,

    #[error("the registered handler declares '{declared}'")]
    HandlerTagMismatch { declared: String },
}

/// Outcome of validating one or more standard versions
#[derive(Debug, Default)]
pub struct IntegrityReport {
    /// Number of (standard version, category) pairs checked
    pub checked: usize,
    /// Faults in categories whose support is required
    pub required: Vec<IntegrityFault>,
    /// Faults in categories supported on a best-effort basis
    pub best_effort: Vec<IntegrityFault>,
}

impl IntegrityReport {
    /// True when no required category has a fault
    pub fn is_ok(&self) -> bool {
        self.required.is_empty()
    }

    fn merge(&mut self, other: IntegrityReport) {
        self.checked += other.checked;
        self.required.extend(other.required);
        self.best_effort.extend(other.best_effort);
    }
}

/// Resolution context used while checking; fallbacks surface as faults
struct CheckContext {
    standard_version: AsdfVersion,
}

impl ResolutionContext for CheckContext {
    fn document_name(&self) -> Option<&str> {
        None
    }

    fn on_version_mismatch(&self, requested: &str, resolved: &str) {
        debug!(
            "ASDF Standard {}: '{}' resolves to '{}'",
            self.standard_version, requested, resolved
        );
    }
}

/// Checks version maps against the loaded schemas and registered handlers
pub struct IntegrityChecker<'a> {
    registry: &'a VersionMapRegistry,
    schemas: &'a dyn SchemaLoader,
    types: &'a TypeIndex,
    categories: CategoriesConfig,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(
        registry: &'a VersionMapRegistry,
        schemas: &'a dyn SchemaLoader,
        types: &'a TypeIndex,
        categories: CategoriesConfig,
    ) -> Self {
        Self {
            registry,
            schemas,
            types,
            categories,
        }
    }

    /// Every fault for `category` of the map for `standard_version`
    pub fn check_version_map_support(
        &self,
        standard_version: AsdfVersion,
        category: SchemaCategory,
    ) -> Result<Vec<IntegrityFault>, RegistryError> {
        let map = self.registry.get_version_map(&standard_version)?;
        let ctx = CheckContext { standard_version };

        let faults: Vec<IntegrityFault> = map
            .qualified_tags(category)
            .flat_map(|tag| {
                let mut kinds = Vec::new();
                if let Err(e) = self.schemas.load_schema(&tag) {
                    kinds.push(IntegrityFaultKind::SchemaNotLoadable(e));
                }
                match self.types.resolve(&tag, &ctx) {
                    None => kinds.push(IntegrityFaultKind::HandlerMissing),
                    Some(handler) if handler.yaml_tag() != tag => {
                        kinds.push(IntegrityFaultKind::HandlerTagMismatch {
                            declared: handler.yaml_tag().to_string(),
                        })
                    }
                    Some(_) => {}
                }
                kinds.into_iter().map(move |kind| IntegrityFault {
                    standard_version,
                    category,
                    tag: tag.clone(),
                    kind,
                })
            })
            .collect();

        debug!(
            "ASDF Standard {} {}: {} tags, {} faults",
            standard_version,
            category,
            map.category(category).len(),
            faults.len()
        );
        Ok(faults)
    }

    /// Check both categories of one standard version
    pub fn validate_version(
        &self,
        standard_version: AsdfVersion,
    ) -> Result<IntegrityReport, RegistryError> {
        let mut report = IntegrityReport::default();
        for category in SchemaCategory::ALL {
            let faults = self.check_version_map_support(standard_version, category)?;
            report.checked += 1;
            match self.categories.support(category) {
                SupportLevel::Required => report.required.extend(faults),
                level @ SupportLevel::BestEffort => {
                    for fault in &faults {
                        debug!("{} ({})", fault, level.as_str());
                    }
                    report.best_effort.extend(faults);
                }
            }
        }
        Ok(report)
    }

    /// Check every standard version in the registry
    pub fn validate_registry(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        for standard_version in self.registry.supported_versions() {
            match self.validate_version(standard_version) {
                Ok(version_report) => report.merge(version_report),
                Err(e) => warn!("Skipping ASDF Standard {}: {}", standard_version, e),
            }
        }
        info!(
            "Validated {} categories: {} required faults, {} best-effort faults",
            report.checked,
            report.required.len(),
            report.best_effort.len()
        );
        report
    }
}
