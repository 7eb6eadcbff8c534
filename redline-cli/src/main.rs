//! redline-cli — command-line client for a running redline-server
//!
//! Talks to the HTTP surface of the server.
//!
//! # Subcommands
//! - `status`                                               — show server health
//! - `query [--from D] [--to D] [-c CAT]... [--page N]`     — one page of filtered records
//! - `classify <score>`                                     — severity band for a 1..5 score
//! - `export [--from D] [--to D] [-c CAT]... [--format F]`  — download the filtered records

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8767";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "redline-cli",
    version,
    about = "Redline moderation dashboard — query, classify and export reviewed content"
)]
struct Cli {
    /// Redline HTTP server URL (overrides REDLINE_HTTP_URL env var)
    #[arg(long, env = "REDLINE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct FilterArgs {
    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Category to select; repeat for several (any match counts)
    #[arg(short = 'c', long = "category")]
    categories: Vec<String>,
}

impl FilterArgs {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "date_from": self.from,
            "date_to": self.to,
            "selected_categories": self.categories
                .iter()
                .map(|c| c.to_lowercase())
                .collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show Redline server status
    Status,

    /// List one page of records matching a filter
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Items per page (defaults to the server's size for the view)
        #[arg(long)]
        page_size: Option<usize>,

        /// Layout the page size is taken from: gallery or list
        #[arg(long)]
        view: Option<String>,

        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a 1..5 severity score
    Classify {
        score: i64,
    },

    /// Export all records matching a filter
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// csv or json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file (defaults to the server-suggested name)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

/// One record as returned by POST /records/query
#[derive(Debug, Deserialize)]
pub struct RecordView {
    pub id: String,
    pub created_at: String,
    pub content: serde_json::Value,
    pub assessment: serde_json::Value,
}

/// A page of records from POST /records/query
#[derive(Debug, Deserialize)]
pub struct PageView {
    pub page_number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<RecordView>,
}

// ============================================================================
// Formatting
// ============================================================================

/// One-line description of a record's content.
pub fn content_summary(content: &serde_json::Value) -> String {
    let text = match content["type"].as_str() {
        Some("image") => content["name"]
            .as_str()
            .or_else(|| content["url"].as_str())
            .unwrap_or(""),
        Some("prompt") => content["text"].as_str().unwrap_or(""),
        _ => "",
    };
    let first_line = text.lines().next().unwrap_or("");
    let mut summary: String = first_line.chars().take(60).collect();
    if first_line.chars().count() > 60 {
        summary.push('…');
    }
    summary
}

/// Lowest 1..5 score inside a severity band reported by the server.
pub fn band_min_score(band: &str) -> Option<i64> {
    match band {
        "safe" => Some(1),
        "low" => Some(2),
        "moderate" => Some(3),
        "elevated" => Some(4),
        "severe" => Some(5),
        _ => None,
    }
}

/// Categories that make a record stand out: flagged ones, or scores at or above `min_score`.
pub fn hit_categories(assessment: &serde_json::Value, min_score: i64) -> Vec<String> {
    let mut hits = Vec::new();
    match assessment["kind"].as_str() {
        Some("flagged") => {
            if let Some(flags) = assessment["flags"].as_object() {
                hits.extend(
                    flags
                        .iter()
                        .filter(|(_, v)| v.as_bool() == Some(true))
                        .map(|(k, _)| k.clone()),
                );
            }
        }
        Some("scored") => {
            if let Some(scores) = assessment["scores"].as_object() {
                hits.extend(
                    scores
                        .iter()
                        .filter(|(_, v)| v.as_i64().is_some_and(|s| s >= min_score))
                        .map(|(k, v)| format!("{}={}", k, v)),
                );
            }
        }
        _ => {}
    }
    hits
}

pub fn format_record(r: &RecordView, min_score: i64) -> String {
    let hits = hit_categories(&r.assessment, min_score);
    let total = r.assessment["total"]
        .as_i64()
        .map(|t| format!(" total={}", t))
        .unwrap_or_default();
    format!(
        "{}  {}  {}{}  [{}]",
        r.created_at,
        r.id,
        content_summary(&r.content),
        total,
        if hits.is_empty() { "-".to_string() } else { hits.join(", ") }
    )
}

pub fn format_page_footer(page: &PageView) -> String {
    format!(
        "Page {}/{} ({} records)",
        page.page_number, page.total_pages, page.total_items
    )
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST a JSON body and fail on any non-2xx status, surfacing the server's error message.
fn post_json(
    server: &str,
    path: &str,
    body: &serde_json::Value,
) -> anyhow::Result<reqwest::blocking::Response> {
    let url = format!("{}{}", server, path);
    let resp = client(30)?
        .post(&url)
        .json(body)
        .send()
        .map_err(|e| anyhow::anyhow!("connection failed to {}: {}", url, e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        anyhow::bail!(
            "server returned {}: {}",
            status,
            body["error"].as_str().unwrap_or("unknown error")
        );
    }
    Ok(resp)
}

fn get_health(server: &str) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}/health", server);
    let resp = client(10)?
        .get(&url)
        .send()
        .map_err(|e| anyhow::anyhow!("cannot reach {} — {}", url, e))?;

    if !resp.status().is_success() {
        anyhow::bail!("server unhealthy (HTTP {})", resp.status());
    }
    Ok(resp.json().unwrap_or_default())
}

/// The server's flag threshold as a minimum score.
fn fetch_min_score(server: &str) -> anyhow::Result<i64> {
    let health = get_health(server)?;
    let band = health["flag_threshold"].as_str().unwrap_or("?");
    band_min_score(band).ok_or_else(|| anyhow::anyhow!("server reported unknown flag threshold '{}'", band))
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let body = get_health(server)?;
    println!("Redline server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
    println!("Records:        {}", body["records"].as_u64().unwrap_or(0));
    println!("Flag threshold: {}", body["flag_threshold"].as_str().unwrap_or("?"));
    println!("Socket:         {}", body["socket"].as_str().unwrap_or("?"));
    Ok(())
}

fn do_query(
    server: &str,
    filter: &FilterArgs,
    page: i64,
    page_size: Option<usize>,
    view: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let body = serde_json::json!({
        "filter": filter.to_json(),
        "page": page,
        "page_size": page_size,
        "view": view,
    });
    let resp = post_json(server, "/records/query", &body)?;

    if json_output {
        let raw: serde_json::Value = resp.json()?;
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let page: PageView = resp.json()?;
    if page.items.is_empty() {
        eprintln!("No records match this filter.");
        return Ok(());
    }
    let min_score = fetch_min_score(server)?;
    for r in &page.items {
        println!("{}", format_record(r, min_score));
    }
    println!("\n{}", format_page_footer(&page));
    Ok(())
}

fn do_classify(server: &str, score: i64) -> anyhow::Result<()> {
    let resp = post_json(server, "/classify", &serde_json::json!({ "score": score }))?;
    let body: serde_json::Value = resp.json()?;
    println!(
        "{} → {} ({}){}",
        score,
        body["band"].as_str().unwrap_or("?"),
        body["emphasis"].as_str().unwrap_or("?"),
        if body["flagged"].as_bool() == Some(true) { " flagged" } else { "" }
    );
    Ok(())
}

fn do_export(
    server: &str,
    filter: &FilterArgs,
    format: &str,
    output: Option<String>,
) -> anyhow::Result<()> {
    let body = serde_json::json!({
        "filter": filter.to_json(),
        "format": format.to_lowercase(),
    });
    let resp = post_json(server, "/export", &body)?;

    let suggested = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(attachment_file_name);
    let path = output
        .or(suggested)
        .unwrap_or_else(|| format!("moderation-export.{}", format.to_lowercase()));

    let bytes = resp.bytes()?;
    std::fs::write(&path, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), path);
    Ok(())
}

/// File name from an `attachment; filename="..."` header value.
pub fn attachment_file_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::Query {
            filter,
            page,
            page_size,
            view,
            json,
        } => do_query(&server, &filter, page, page_size, view, json),
        Commands::Classify { score } => do_classify(&server, score),
        Commands::Export {
            filter,
            format,
            output,
        } => do_export(&server, &filter, &format, output),
    };

    if let Err(e) = result {
        eprintln!("redline-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
