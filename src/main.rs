use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use asdf_compat::config::{self, CompatConfig};
use asdf_compat::convert::extract_file;
use asdf_compat::integrity::IntegrityChecker;
use asdf_compat::logging::{LoggingOptions, init_logging};
use asdf_compat::registry::VersionMapRegistry;
use asdf_compat::schema::{DirectorySchemaLoader, EmbeddedSchemas, SchemaLoader};
use asdf_compat::types::{CoreExtension, Extension, TypeIndex};
use asdf_compat::version::AsdfVersion;

#[derive(Parser)]
#[command(name = "asdf-compat")]
#[command(version, about = "ASDF Standard version compatibility tools")]
struct Cli {
    /// JSON config file (default: <data dir>/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Write logs to a file instead of stderr (default: <data dir>/asdf-compat.log)
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the ASDF extension of an ASDF-in-FITS file into a standalone ASDF file
    Extract {
        /// ASDF-in-FITS file containing the extension to extract
        infile: PathBuf,
        /// New standalone ASDF file
        outfile: PathBuf,
    },
    /// Check that every tag required by the version maps has a schema and an exact handler
    Check {
        /// Only check this ASDF Standard version
        #[arg(long)]
        standard_version: Option<AsdfVersion>,
        /// Read schemas from this directory instead of the embedded core schemas
        #[arg(long)]
        schemas: Option<PathBuf>,
    },
    /// List supported ASDF Standard versions
    Versions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(&LoggingOptions {
        verbosity: cli.verbose,
        json: cli.log_json,
        file: cli
            .log_file
            .clone()
            .map(|file| file.unwrap_or_else(config::log_path)),
    })?;
    let config = CompatConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let registry = VersionMapRegistry::builtin();

    match cli.command {
        Command::Extract { infile, outfile } => {
            let summary = extract_file(&infile, &outfile, registry, &config)
                .with_context(|| format!("Failed to extract {}", infile.display()))?;
            println!(
                "{} -> {} (ASDF Standard {}, {} blocks)",
                infile.display(),
                outfile.display(),
                summary.standard_version,
                summary.blocks
            );
        }
        Command::Check {
            standard_version,
            schemas,
        } => {
            let loader: Box<dyn SchemaLoader> = match schemas {
                Some(root) => Box::new(DirectorySchemaLoader::new(root)),
                None => Box::new(EmbeddedSchemas::core()),
            };
            let core = CoreExtension::new();
            let types = TypeIndex::from_extensions([&core as &dyn Extension]);
            let checker =
                IntegrityChecker::new(registry, loader.as_ref(), &types, config.categories.clone());

            let report = match standard_version {
                Some(version) => checker.validate_version(version)?,
                None => checker.validate_registry(),
            };
            for fault in &report.required {
                println!("error: {fault}");
            }
            for fault in &report.best_effort {
                println!("warning: {fault}");
            }
            println!(
                "{} categories checked: {} required faults, {} best-effort faults",
                report.checked,
                report.required.len(),
                report.best_effort.len()
            );
            if !report.is_ok() {
                bail!("{} required tags are not fully supported", report.required.len());
            }
        }
        Command::Versions => {
            let default = config.default_standard_version;
            for version in registry.supported_versions() {
                let map = registry.get_version_map(&version)?;
                let marker = if version == default { " (default)" } else { "" };
                println!(
                    "{version}{marker}  file format {}  YAML {}",
                    map.file_format(),
                    map.yaml_version()
                );
            }
            println!("config file: {}", config::config_path().display());
        }
    }

    Ok(())
}
