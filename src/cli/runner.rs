//! CLI runner - executes commands

use crate::catalog::{Registry, ResourceDescriptor};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::jss::Jss;
use crate::query::{QueryOptions, SearchArg};
use crate::resource::Resource;
use crate::summary::{QueryResult, SummarySet};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Types => self.types(),
            Commands::Get {
                kind,
                search,
                subset,
            } => self.get(kind, search.as_deref(), subset.as_deref()).await,
            Commands::Resolve {
                kind,
                search,
                subset,
            } => self.resolve(kind, search.as_deref(), subset.as_deref()).await,
            Commands::Snapshot { output, kinds } => self.snapshot(output, kinds.as_deref()).await,
            Commands::Copy { file } => self.copy(file).await,
        }
    }

    /// Load the configuration file
    fn load_config(&self) -> Result<ClientConfig> {
        let path = match &self.cli.config {
            Some(path) => path.clone(),
            None => ClientConfig::default_path().ok_or_else(|| {
                Error::config("No config directory found; pass a config file with --config")
            })?,
        };
        debug!("Loading config from {}", path.display());
        ClientConfig::load(path)
    }

    fn connect(&self) -> Result<Jss> {
        Jss::from_config(&self.load_config()?)
    }

    fn types(&self) -> Result<()> {
        let registry = Registry::builtin()?;
        match self.cli.format {
            OutputFormat::Table => {
                let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(4);
                for descriptor in registry.iter() {
                    let operations: Vec<&str> =
                        descriptor.operations.iter().map(|m| m.as_str()).collect();
                    println!(
                        "{:<width$}  {:<40}  {}",
                        descriptor.name,
                        descriptor.endpoint(),
                        operations.join(",")
                    );
                }
            }
            OutputFormat::Json => {
                let descriptors: Vec<&ResourceDescriptor> = registry.iter().map(|d| &**d).collect();
                self.output_message(&json!(descriptors));
            }
        }
        Ok(())
    }

    async fn get(&self, kind: &str, search: Option<&str>, subset: Option<&str>) -> Result<()> {
        let jss = self.connect()?;
        match jss.query(kind, search_arg(search), options(subset)).await? {
            QueryResult::Record(resource) => self.print_record(&resource),
            QueryResult::Records(set) => self.print_listing(&set),
        }
        Ok(())
    }

    async fn resolve(&self, kind: &str, search: Option<&str>, subset: Option<&str>) -> Result<()> {
        let jss = self.connect()?;
        let start = Instant::now();

        let resources = match jss.query(kind, search_arg(search), QueryOptions::new()).await? {
            QueryResult::Record(resource) => vec![*resource],
            QueryResult::Records(set) => set.resolve_all(options(subset)).await?,
        };

        match self.cli.format {
            OutputFormat::Table => {
                for resource in &resources {
                    self.print_record(resource);
                }
            }
            OutputFormat::Json => {
                let records: Vec<&Value> = resources.iter().map(|r| r.data().root()).collect();
                self.output_message(&json!(records));
            }
        }

        info!(
            "Resolved {} {kind} records in {:.1}s",
            resources.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    async fn snapshot(&self, output: &Path, kinds: Option<&str>) -> Result<()> {
        let jss = self.connect()?;
        let kinds: Vec<String> = kinds
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let snapshot = jss.snapshot(&kinds).await;
        snapshot.write_json(output).await?;

        self.output_message(&json!({
            "type": "SNAPSHOT",
            "output": output.display().to_string(),
            "records": snapshot.record_count(),
            "failures": snapshot.failures,
        }));

        if snapshot.is_complete() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} resource types failed",
                snapshot.failures.len()
            )))
        }
    }

    async fn copy(&self, file: &Path) -> Result<()> {
        if !file.is_file() {
            return Err(Error::FileNotFound {
                path: file.display().to_string(),
            });
        }

        let jss = self.connect()?;
        let points = jss.distribution_points();
        if points.is_empty() {
            return Err(Error::config("No distribution points configured under 'repos'"));
        }

        let report = points.copy(file).await;
        self.output_message(&json!({
            "type": "COPY",
            "file": file.display().to_string(),
            "succeeded": report.succeeded,
            "failed": report.failed,
        }));

        if report.is_complete() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Copy failed on {} of {} distribution points",
                report.failed.len(),
                points.len()
            )))
        }
    }

    fn print_record(&self, resource: &Resource) {
        match self.cli.format {
            OutputFormat::Table => println!("{resource}"),
            OutputFormat::Json => self.output_message(resource.data().root()),
        }
    }

    fn print_listing(&self, set: &SummarySet) {
        match self.cli.format {
            OutputFormat::Table => print!("{set}"),
            OutputFormat::Json => {
                let records: Vec<Value> = set
                    .iter()
                    .map(|record| {
                        let mut value = json!(record.fields());
                        if let Some(object) = value.as_object_mut() {
                            object.insert("id".to_string(), json!(record.id()));
                            object.insert("name".to_string(), json!(record.name()));
                        }
                        value
                    })
                    .collect();
                self.output_message(&json!(records));
            }
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Table => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn search_arg(search: Option<&str>) -> SearchArg {
    search.map_or(SearchArg::All, SearchArg::from)
}

fn options(subset: Option<&str>) -> QueryOptions {
    match subset {
        Some(sections) if !sections.trim().is_empty() => QueryOptions::new().subset_str(sections),
        _ => QueryOptions::new(),
    }
}
