//! cinedex-lookup: query the catalog through the read-through cache.
//!
//! Connection settings come from the `CINEDEX_*` environment variables.
//! Records are printed as JSON on stdout.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use cinedex_core::{CatalogError, EntityId, EntityKind, QuerySpec};
use cinedex_service::{
    init_tracing, CatalogConfig, ProductionContext, ServiceRegistry, TelemetryConfig,
    TelemetryError,
};
use cinedex_storage::{CacheBackend, SearchBackend};

#[derive(Parser, Debug)]
#[command(name = "cinedex-lookup", version, about = "Catalog lookups with read-through caching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one full record by id
    Get {
        /// movie, genre or person
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(value_parser = parse_id)]
        id: EntityId,
    },
    /// List one page of brief records
    List {
        /// movie, genre or person
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        /// Only records related to this id (e.g. movies of a genre)
        #[arg(long, value_parser = parse_id)]
        related: Option<EntityId>,
        /// Free-text match; overrides --related
        #[arg(long)]
        query: Option<String>,
        /// Sort field, prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
        #[arg(long)]
        page_number: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Printed,
    NotFound,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Printed => ExitCode::SUCCESS,
            Outcome::NotFound => ExitCode::from(2),
        }
    }
}

fn parse_kind(value: &str) -> Result<EntityKind, String> {
    value.parse().map_err(|e: cinedex_core::ValidationError| e.to_string())
}

fn parse_id(value: &str) -> Result<EntityId, String> {
    EntityId::parse(value).map_err(|e| e.to_string())
}

fn listing_spec(
    related: Option<EntityId>,
    query: Option<String>,
    sort: Option<String>,
    page_number: Option<u32>,
    page_size: Option<u32>,
) -> Result<QuerySpec, CatalogError> {
    let mut builder = QuerySpec::builder()
        .related_opt(related)
        .text_opt(query)
        .sort_opt(sort);
    if let Some(page_number) = page_number {
        builder = builder.page_number(page_number);
    }
    if let Some(page_size) = page_size {
        builder = builder.page_size(page_size);
    }
    Ok(builder.build()?)
}

/// Execute one command against `registry`, writing JSON to `out`.
async fn run<C, B, W>(
    registry: &ServiceRegistry<C, B>,
    command: Command,
    out: &mut W,
) -> Result<Outcome, CliError>
where
    C: CacheBackend,
    B: SearchBackend,
    W: Write,
{
    match command {
        Command::Get { kind, id } => match registry.get_by_id(kind, id).await? {
            Some(record) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
                Ok(Outcome::Printed)
            }
            None => {
                eprintln!("{} {} not found", kind, id);
                Ok(Outcome::NotFound)
            }
        },
        Command::List {
            kind,
            related,
            query,
            sort,
            page_number,
            page_size,
        } => {
            let spec = listing_spec(related, query, sort, page_number, page_size)?;
            let page = registry.list(kind, &spec).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
            Ok(Outcome::Printed)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    init_tracing(&TelemetryConfig::default())?;

    let config = CatalogConfig::from_env();
    let context = ProductionContext::connect(&config).await?;
    let registry = context.registry();

    // Every command error lands here so the context is always shut down.
    let outcome = run(&registry, cli.command, &mut io::stdout().lock()).await;

    drop(registry);
    context.shutdown();
    outcome.map(ExitCode::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cinedex_storage::{InMemoryCacheBackend, InMemorySearchBackend, ReadThroughCache};
    use serde_json::{json, Value};

    fn registry() -> ServiceRegistry<InMemoryCacheBackend, InMemorySearchBackend> {
        let search = Arc::new(InMemorySearchBackend::new());
        search.insert(
            "genres",
            json!({ "id": "0b105f87-e0a5-45dc-8ce7-f8632088f390", "name": "Western", "films": [] }),
        );
        search.create_index("movies");
        let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
        ServiceRegistry::new(cache, search)
    }

    #[test]
    fn test_parse_list_arguments() {
        let cli = Cli::try_parse_from([
            "cinedex-lookup",
            "list",
            "movie",
            "--sort",
            "-imdb_rating",
            "--page-size",
            "10",
        ])
        .unwrap();
        match cli.command {
            Command::List {
                kind,
                sort,
                page_size,
                page_number,
                ..
            } => {
                assert_eq!(kind, EntityKind::Movie);
                assert_eq!(sort.as_deref(), Some("-imdb_rating"));
                assert_eq!(page_size, Some(10));
                assert_eq!(page_number, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind_and_bad_id() {
        assert!(Cli::try_parse_from(["cinedex-lookup", "list", "studio"]).is_err());
        assert!(Cli::try_parse_from(["cinedex-lookup", "get", "movie", "not-a-uuid"]).is_err());
    }

    #[tokio::test]
    async fn test_get_prints_record() {
        let registry = registry();
        let mut out = Vec::new();
        let command = Command::Get {
            kind: EntityKind::Genre,
            id: EntityId::parse("0b105f87-e0a5-45dc-8ce7-f8632088f390").unwrap(),
        };

        let outcome = run(&registry, command, &mut out).await.unwrap();
        assert_eq!(outcome, Outcome::Printed);

        let printed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["name"], "Western");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_outcome() {
        let registry = registry();
        let mut out = Vec::new();
        let command = Command::Get {
            kind: EntityKind::Movie,
            id: EntityId::new_random(),
        };

        let outcome = run(&registry, command, &mut out).await.unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_listing_is_returned_not_raised() {
        let registry = registry();
        let mut out = Vec::new();
        let command = Command::List {
            kind: EntityKind::Genre,
            related: None,
            query: None,
            sort: None,
            page_number: Some(0),
            page_size: None,
        };

        let err = run(&registry, command, &mut out).await.unwrap_err();
        assert!(matches!(err, CliError::Catalog(CatalogError::Validation(_))));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned() {
        let registry = registry();
        let mut out = Vec::new();
        let command = Command::List {
            kind: EntityKind::Person,
            related: None,
            query: None,
            sort: None,
            page_number: None,
            page_size: None,
        };

        // No persons index.
        let err = run(&registry, command, &mut out).await.unwrap_err();
        assert!(matches!(err, CliError::Catalog(CatalogError::Backend(_))));
    }
}
