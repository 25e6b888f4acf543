mod cli;
mod config;

use anyhow::Context as _;
use clap::Parser;
use cli::{Cli, Command, LogFormat};
use opendata_resilience::error::ErrorRecord;
use opendata_resilience::safety::SanitizedResult;
use opendata_upstream::g0v::DateRange;
use opendata_upstream::reports::{ReportKind, report_catalog};
use opendata_upstream::{Gateway, UpstreamError};
use owo_colors::OwoColorize as _;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(Ok(result)) => match serde_json::to_string_pretty(&result) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{} {e}", "error:".red().bold());
                ExitCode::FAILURE
            }
        },
        Ok(Err(record)) => {
            if let Ok(text) = serde_json::to_string_pretty(&record) {
                println!("{text}");
            }
            eprintln!(
                "{} {} (code {})",
                "error:".red().bold(),
                record.message,
                record.code.dimmed()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A subscriber installed earlier wins.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Outer error: the gateway could not be set up. Inner error: the operation failed.
async fn run(cli: Cli) -> anyhow::Result<Result<SanitizedResult, ErrorRecord>> {
    let path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut cfg = config::load_config(&path)?;
    info!(path = %path.display(), "loaded gateway config");
    if let Some(ua) = cli.user_agent {
        cfg.http.user_agent = ua;
    }
    let gateway = Gateway::from_config(&cfg).context("invalid gateway configuration")?;

    let tool = cli.command.tool_name();
    let rd = gateway.riksdagen();
    let g0v = gateway.g0v();
    let result = match cli.command {
        Command::Documents(args) => {
            let out = rd
                .paginated_documents(&args.query(), args.pages.request())
                .await;
            gateway.respond(tool, out)
        }
        Command::Document { dok_id, full_text } => {
            gateway.respond(tool, rd.document(&dok_id, full_text).await)
        }
        Command::Persons(args) => {
            gateway.respond(tool, rd.persons(&args.query(), args.page.paging()).await)
        }
        Command::Person { intressent_id } => {
            gateway.respond(tool, rd.person(&intressent_id).await)
        }
        Command::Speeches(args) => {
            let out = rd
                .paginated_speeches(&args.query(), args.pages.request())
                .await;
            gateway.respond(tool, out)
        }
        Command::Votes(args) => {
            gateway.respond(tool, rd.votes(&args.query(), args.page.paging()).await)
        }
        Command::VoteGroups(args) => {
            gateway.respond(tool, rd.vote_groups(&args.query(), args.page_size).await)
        }
        Command::BatchDocuments(args) => {
            let out = rd
                .batch_documents(&args.doktyp, &args.sessions, args.per_session)
                .await;
            gateway.respond(tool, out)
        }
        Command::Calendar(args) => {
            gateway.respond(tool, rd.calendar(&args.query(), args.limit).await)
        }
        Command::Report { kind, limit } => {
            let out = match kind.parse::<ReportKind>() {
                Ok(kind) => rd.report(kind, limit).await,
                Err(e) => Err(e),
            };
            gateway.respond(tool, out)
        }
        Command::Reports => gateway.respond(tool, Ok::<_, UpstreamError>(report_catalog())),
        Command::G0vTypes => gateway.respond(tool, Ok::<_, UpstreamError>(g0v.document_types())),
        Command::G0vDocuments(args) => {
            gateway.respond(tool, g0v.documents(&args.doc_type, &args.filter()).await)
        }
        Command::G0vSearch(args) => {
            gateway.respond(tool, g0v.search_all(&args.term, &args.options()).await)
        }
        Command::G0vContent { url } => gateway.respond(tool, g0v.document_content(&url).await),
        Command::G0vLatest => gateway.respond(tool, g0v.latest_update().await),
        Command::G0vCodes => gateway.respond(tool, g0v.category_codes().await),
        Command::G0vDepartments { date_from, date_to } => {
            let range = DateRange { date_from, date_to };
            gateway.respond(tool, g0v.analyze_by_department(&range).await)
        }
    };
    Ok(result)
}
