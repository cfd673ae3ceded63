use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use matchsql::sql::{ConverterConfig, Expr, Schema, SqlConverter};
use matchsql::{FilterConfig, FuzzyMatch, Registry};
use miette::{Context, IntoDiagnostic};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Compile fuzzy match filters to BigQuery SQL
#[derive(Parser, Debug)]
#[command(name = "matchsql", version, about)]
struct Cli {
    /// Path to a JSON filter document (reads from stdin if omitted)
    file: Option<PathBuf>,

    /// Emit literals as query parameters and print their values
    #[arg(long)]
    params: bool,

    /// Collation used by the case-insensitive functions
    #[arg(long, default_value = matchsql::config::DEFAULT_COLLATION)]
    collation: String,

    /// List the filter functions and their overloads
    #[arg(long)]
    list_functions: bool,
}

/// Input document: column types and the filter expression.
#[derive(Deserialize, Debug)]
struct Document {
    #[serde(default)]
    schema: Schema,
    filter: Expr,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    if cli.list_functions {
        list_functions();
        return Ok(());
    }

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("failed to read stdin")?;
            input
        }
    };

    let document: Document = serde_json::from_str(&input)
        .into_diagnostic()
        .wrap_err("invalid filter document")?;
    tracing::debug!("Loaded filter: {:?}", document.filter);

    let extension = FuzzyMatch::new(Some(FilterConfig {
        collation: cli.collation.into(),
    }));
    let mut converter = SqlConverter::new(
        document.schema,
        Some(ConverterConfig {
            parameterize: cli.params,
        }),
    )
    .with_extension(extension);

    let query = converter.convert(&document.filter)?;
    println!("{}", query.sql);

    if cli.params {
        for (i, value) in query.params.iter().enumerate() {
            println!("{} {}", format!("@p{}", i).cyan(), value);
        }
    }

    Ok(())
}

fn list_functions() {
    for decl in Registry::global().declarations() {
        println!("{}", decl.name.as_str().bold());
        for overload in decl.overloads {
            println!(
                "  {} ({}, {}) -> {}",
                overload.id.as_str().dimmed(),
                overload.target,
                overload.arg,
                overload.result
            );
        }
    }
}
