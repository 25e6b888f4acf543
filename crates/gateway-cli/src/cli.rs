use clap::{Args, Parser, Subcommand, ValueEnum};
use opendata_upstream::g0v::{DocumentFilter, SearchAllOptions};
use opendata_upstream::riksdagen::{
    CalendarQuery, DocumentQuery, PageRequest, Paging, PersonQuery, SpeechQuery, VoteGroupQuery,
    VoteQuery,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "opendata-gateway",
    version,
    about = "Query the Riksdagen API and the g0v.se document mirror through the open-data gateway"
)]
pub struct Cli {
    /// Gateway config file (YAML or JSON). Defaults to $XDG_CONFIG_HOME/opendata/gateway.yaml.
    #[arg(long, global = true, env = "OPENDATA_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. `info`, `opendata_upstream=debug`).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override the outbound User-Agent header.
    #[arg(long, global = true, env = "RIKSDAG_USER_AGENT")]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search parliamentary documents, one page or every page.
    Documents(DocumentsArgs),
    /// Fetch a single document by id.
    Document {
        dok_id: String,
        /// Attach the plain-text rendering of the document.
        #[arg(long)]
        full_text: bool,
    },
    /// Search members of parliament.
    Persons(PersonsArgs),
    /// Fetch a single member by intressent_id.
    Person { intressent_id: String },
    /// Search chamber speeches, one page or every page.
    Speeches(SpeechesArgs),
    /// Search individual votes.
    Votes(VotesArgs),
    /// Grouped vote tallies.
    VoteGroups(VoteGroupsArgs),
    /// First page of one document type for several sessions.
    BatchDocuments(BatchArgs),
    /// Chamber and committee calendar.
    Calendar(CalendarArgs),
    /// One statistical report (see `reports`).
    Report {
        kind: String,
        /// Result size for the document-list reports.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Available statistical reports.
    Reports,
    /// Known g0v.se document type aliases.
    G0vTypes,
    /// Documents of one g0v.se category.
    G0vDocuments(G0vDocumentsArgs),
    /// Title search across several g0v.se categories.
    G0vSearch(G0vSearchArgs),
    /// Markdown content of a government document.
    G0vContent { url: String },
    /// When the g0v.se mirror was last refreshed.
    G0vLatest,
    /// g0v.se category codes.
    G0vCodes,
    /// Press releases, propositions and speeches counted per ministry.
    G0vDepartments {
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
    },
}

impl Command {
    /// Name reported in error records.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Command::Documents(_) => "documents",
            Command::Document { .. } => "document",
            Command::Persons(_) => "persons",
            Command::Person { .. } => "person",
            Command::Speeches(_) => "speeches",
            Command::Votes(_) => "votes",
            Command::VoteGroups(_) => "vote-groups",
            Command::BatchDocuments(_) => "batch-documents",
            Command::Calendar(_) => "calendar",
            Command::Report { .. } => "report",
            Command::Reports => "reports",
            Command::G0vTypes => "g0v-types",
            Command::G0vDocuments(_) => "g0v-documents",
            Command::G0vSearch(_) => "g0v-search",
            Command::G0vContent { .. } => "g0v-content",
            Command::G0vLatest => "g0v-latest",
            Command::G0vCodes => "g0v-codes",
            Command::G0vDepartments { .. } => "g0v-departments",
        }
    }
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl PageArgs {
    pub fn paging(&self) -> Paging {
        Paging::page(self.page, self.page_size)
    }
}

#[derive(Debug, Args)]
pub struct MultiPageArgs {
    #[command(flatten)]
    pub page: PageArgs,
    /// Collect every page up to --max-pages.
    #[arg(long)]
    pub all: bool,
    #[arg(long)]
    pub max_pages: Option<u32>,
}

impl MultiPageArgs {
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page.page,
            page_size: self.page.page_size,
            fetch_all: self.all,
            max_pages: self.max_pages,
        }
    }
}

#[derive(Debug, Args)]
pub struct DocumentsArgs {
    /// Document type (mot, prop, bet, ...).
    #[arg(long)]
    pub doktyp: Option<String>,
    /// Free-text search.
    #[arg(long)]
    pub sok: Option<String>,
    /// Parliamentary session, e.g. 2024/25.
    #[arg(long)]
    pub rm: Option<String>,
    #[arg(long)]
    pub organ: Option<String>,
    #[arg(long)]
    pub bet: Option<String>,
    #[arg(long)]
    pub nummer: Option<String>,
    #[arg(long)]
    pub iid: Option<String>,
    #[arg(long)]
    pub parti: Option<String>,
    #[arg(long)]
    pub talare: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub tom: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub sortorder: Option<String>,
    #[command(flatten)]
    pub pages: MultiPageArgs,
}

impl DocumentsArgs {
    pub fn query(&self) -> DocumentQuery {
        DocumentQuery {
            doktyp: self.doktyp.clone(),
            sok: self.sok.clone(),
            rm: self.rm.clone(),
            organ: self.organ.clone(),
            bet: self.bet.clone(),
            nummer: self.nummer.clone(),
            iid: self.iid.clone(),
            parti: self.parti.clone(),
            talare: self.talare.clone(),
            from: self.from.clone(),
            tom: self.tom.clone(),
            status: self.status.clone(),
            sort: self.sort.clone(),
            sortorder: self.sortorder.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PersonsArgs {
    #[arg(long)]
    pub fnamn: Option<String>,
    #[arg(long)]
    pub enamn: Option<String>,
    #[arg(long)]
    pub parti: Option<String>,
    #[arg(long)]
    pub valkrets: Option<String>,
    #[arg(long)]
    pub rdlstatus: Option<String>,
    #[command(flatten)]
    pub page: PageArgs,
}

impl PersonsArgs {
    pub fn query(&self) -> PersonQuery {
        PersonQuery {
            fnamn: self.fnamn.clone(),
            enamn: self.enamn.clone(),
            parti: self.parti.clone(),
            valkrets: self.valkrets.clone(),
            rdlstatus: self.rdlstatus.clone(),
            iid: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct SpeechesArgs {
    #[arg(long)]
    pub sok: Option<String>,
    #[arg(long)]
    pub talare: Option<String>,
    #[arg(long)]
    pub parti: Option<String>,
    #[arg(long)]
    pub rm: Option<String>,
    #[command(flatten)]
    pub pages: MultiPageArgs,
}

impl SpeechesArgs {
    pub fn query(&self) -> SpeechQuery {
        SpeechQuery {
            sok: self.sok.clone(),
            talare: self.talare.clone(),
            parti: self.parti.clone(),
            rm: self.rm.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct VotesArgs {
    #[arg(long)]
    pub votering_id: Option<String>,
    #[arg(long)]
    pub rm: Option<String>,
    #[arg(long)]
    pub bet: Option<String>,
    #[arg(long)]
    pub punkt: Option<String>,
    #[arg(long)]
    pub iid: Option<String>,
    #[arg(long)]
    pub parti: Option<String>,
    #[arg(long)]
    pub valkrets: Option<String>,
    #[arg(long)]
    pub rost: Option<String>,
    #[arg(long)]
    pub avser: Option<String>,
    #[arg(long)]
    pub gruppering: Option<String>,
    #[command(flatten)]
    pub page: PageArgs,
}

impl VotesArgs {
    pub fn query(&self) -> VoteQuery {
        VoteQuery {
            votering_id: self.votering_id.clone(),
            rm: self.rm.clone(),
            bet: self.bet.clone(),
            punkt: self.punkt.clone(),
            iid: self.iid.clone(),
            parti: self.parti.clone(),
            valkrets: self.valkrets.clone(),
            rost: self.rost.clone(),
            avser: self.avser.clone(),
            gruppering: self.gruppering.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct VoteGroupsArgs {
    #[arg(long)]
    pub rm: Option<String>,
    #[arg(long)]
    pub bet: Option<String>,
    #[arg(long)]
    pub punkt: Option<String>,
    #[arg(long)]
    pub gruppering: Option<String>,
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl VoteGroupsArgs {
    pub fn query(&self) -> VoteGroupQuery {
        VoteGroupQuery {
            rm: self.rm.clone(),
            bet: self.bet.clone(),
            punkt: self.punkt.clone(),
            gruppering: self.gruppering.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub doktyp: String,
    /// Sessions to fetch, e.g. --rm 2023/24 --rm 2024/25.
    #[arg(long = "rm", required = true)]
    pub sessions: Vec<String>,
    #[arg(long)]
    pub per_session: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CalendarArgs {
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub tom: Option<String>,
    #[arg(long)]
    pub akt: Option<String>,
    #[arg(long)]
    pub org: Option<String>,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl CalendarArgs {
    pub fn query(&self) -> CalendarQuery {
        CalendarQuery {
            from: self.from.clone(),
            tom: self.tom.clone(),
            akt: self.akt.clone(),
            org: self.org.clone(),
            sort: self.sort.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct DateRangeArgs {
    /// Earliest publication date (YYYY-MM-DD).
    #[arg(long)]
    pub date_from: Option<String>,
    /// Latest publication date (YYYY-MM-DD).
    #[arg(long)]
    pub date_to: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct G0vDocumentsArgs {
    /// Category alias (see g0v-types) or listing slug.
    pub doc_type: String,
    #[arg(long)]
    pub search: Option<String>,
    #[command(flatten)]
    pub range: DateRangeArgs,
}

impl G0vDocumentsArgs {
    pub fn filter(&self) -> DocumentFilter {
        DocumentFilter {
            search: self.search.clone(),
            date_from: self.range.date_from.clone(),
            date_to: self.range.date_to.clone(),
            limit: self.range.limit,
        }
    }
}

#[derive(Debug, Args)]
pub struct G0vSearchArgs {
    pub term: String,
    /// Categories to search; repeat the flag. Defaults to the common categories.
    #[arg(long = "type")]
    pub types: Vec<String>,
    #[command(flatten)]
    pub range: DateRangeArgs,
}

impl G0vSearchArgs {
    pub fn options(&self) -> SearchAllOptions {
        SearchAllOptions {
            types: self.types.clone(),
            limit: self.range.limit,
            date_from: self.range.date_from.clone(),
            date_to: self.range.date_to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_flags_map_to_a_page_request() {
        let cli = Cli::try_parse_from([
            "opendata-gateway",
            "documents",
            "--rm",
            "2024/25",
            "--page",
            "3",
            "--page-size",
            "50",
        ])
        .unwrap();
        let Command::Documents(args) = cli.command else {
            panic!("expected documents command");
        };
        assert_eq!(args.query().rm.as_deref(), Some("2024/25"));
        let req = args.pages.request();
        assert_eq!((req.page, req.page_size, req.fetch_all), (3, Some(50), false));
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "opendata-gateway",
            "g0v-search",
            "budget",
            "--type",
            "sou",
            "--type",
            "ds",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.command.tool_name(), "g0v-search");
        let Command::G0vSearch(args) = cli.command else {
            panic!("expected g0v-search command");
        };
        assert_eq!(args.options().types, vec!["sou".to_string(), "ds".to_string()]);
    }

    #[test]
    fn document_text_and_reports_parse() {
        let cli = Cli::try_parse_from(["opendata-gateway", "document", "H901FiU1", "--full-text"])
            .unwrap();
        assert!(matches!(cli.command, Command::Document { full_text: true, .. }));

        let cli = Cli::try_parse_from([
            "opendata-gateway",
            "report",
            "ledamotsstatistik",
            "--limit",
            "25",
        ])
        .unwrap();
        assert_eq!(cli.command.tool_name(), "report");
        assert!(matches!(cli.command, Command::Report { limit: Some(25), .. }));
    }

    #[test]
    fn batch_requires_a_session() {
        assert!(
            Cli::try_parse_from(["opendata-gateway", "batch-documents", "--doktyp", "mot"]).is_err()
        );
    }
}
