//! # scour CLI Application
//!
//! This module implements the command-line interface for the scour search
//! console.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands for the console's operations:
//!   - `console`: Interactive TUI-based search console (the default)
//!   - `search`: One-shot plain or filtered search
//!   - `similar`: One-shot more-like-this search seeded by a record id
//!   - `delete`: Delete a record, with an explicit confirmation step
//!
//! ## Features
//!
//! - Endpoint selection via flag or the SCOUR_ENDPOINT environment variable
//! - Filter rules on the command line as `field:operator:value`
//! - Both JSON and text output formats for the one-shot commands

mod tui;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scour::http::{DEFAULT_ENDPOINT, Hit, SearchClient};
use scour::query::{RuleSet, SearchRequest};
use scour::results;
use scour::schema::{self, Operator};

#[derive(Parser)]
#[command(author, version, about = "A terminal console for a remote post search service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive search console
    Console(ConsoleArgs),

    /// Run one search and print the hits
    Search(SearchArgs),

    /// Find posts similar to a record
    Similar(SimilarArgs),

    /// Delete a record by id
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct ConsoleArgs {
    /// Search service endpoint
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search query (optional when at least one filter is given)
    query: Option<String>,

    /// Filter rule as field:operator:value, e.g. num_likes:gte:10 (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Output format (text|json)
    #[arg(short = 'o', long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Search service endpoint
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[derive(Args, Debug)]
struct SimilarArgs {
    /// Seed record id
    id: String,

    /// Output format (text|json)
    #[arg(short = 'o', long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Search service endpoint
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    /// Record id to delete
    id: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    yes: bool,

    /// Search service endpoint
    #[arg(short, long)]
    endpoint: Option<String>,
}

/// Flag beats environment beats the well-known local default
fn resolve_endpoint(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("SCOUR_ENDPOINT").ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Some(Commands::Console(_)) | None);
    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    // Execute the appropriate command
    match cli.command {
        Some(Commands::Console(args)) => {
            // The terminal owns stdout, so logs go to a file
            tui::logging::setup_logging()?;
            tui::run(resolve_endpoint(args.endpoint)).await?;
        }
        None => {
            tui::logging::setup_logging()?;
            tui::run(resolve_endpoint(None)).await?;
        }
        Some(Commands::Search(args)) => {
            search_command(args).await?;
        }
        Some(Commands::Similar(args)) => {
            similar_command(args).await?;
        }
        Some(Commands::Delete(args)) => {
            delete_command(args).await?;
        }
    }

    Ok(())
}

async fn search_command(args: SearchArgs) -> anyhow::Result<()> {
    let mut rules = RuleSet::new();
    for spec in &args.filters {
        add_filter_rule(&mut rules, spec)?;
    }

    let query = args.query.unwrap_or_default();
    let Some(request) = SearchRequest::from_input(&query, rules.serialize_non_empty()) else {
        bail!("nothing to search for: give a query or at least one --filter");
    };

    let client = SearchClient::new(resolve_endpoint(args.endpoint))?;

    println!("Searching for: {}", request.subject());
    let hits = client.execute(&request).await?;
    print_hits(&hits, &args.format)
}

async fn similar_command(args: SimilarArgs) -> anyhow::Result<()> {
    let client = SearchClient::new(resolve_endpoint(args.endpoint))?;

    println!("Finding posts similar to {}...", args.id);
    let hits = client.similar(&args.id).await?;
    print_hits(&hits, &args.format)
}

async fn delete_command(args: DeleteArgs) -> anyhow::Result<()> {
    if !args.yes && !confirm_on_stdin(&args.id)? {
        println!("Aborted.");
        return Ok(());
    }

    let client = SearchClient::new(resolve_endpoint(args.endpoint))?;
    let message = client.delete(&args.id).await?;
    println!("{message}");
    Ok(())
}

/// Parse one `field:operator:value` spec into a builder rule
fn add_filter_rule(rules: &mut RuleSet, spec: &str) -> anyhow::Result<()> {
    let mut parts = spec.splitn(3, ':');
    let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("invalid filter {spec:?}: expected field:operator:value");
    };
    let Some((index, _)) = schema::field_by_id(field) else {
        bail!("unknown field {field:?}");
    };
    let Some(operator) = Operator::parse(operator) else {
        bail!("unknown operator {operator:?}: expected gte, lte, or is");
    };

    let id = rules.add_rule();
    rules.set_field(id, index);
    rules.set_operator(id, operator)?;
    rules.set_value(id, value);
    Ok(())
}

fn confirm_on_stdin(id: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("Delete post {id}? This action cannot be undone. [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Print hits the way the one-shot commands present them
fn print_hits(hits: &[Hit], format: &str) -> anyhow::Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(hits)?);
        }
        _ => {
            if hits.is_empty() {
                println!("No results found for your query.");
                return Ok(());
            }
            println!("Found {} results", hits.len());
            for (i, hit) in hits.iter().enumerate() {
                let card = results::summarize(hit);
                println!("{}. {} ({})", i + 1, card.title, card.score);
                println!("   {} | {} | id {}", card.kind, card.published, card.id);
                println!("   {}", card.snippet);
                println!();
            }
        }
    }
    Ok(())
}
