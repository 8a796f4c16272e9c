use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::{
    catalog::Attribution,
    filter::Facet,
    ledger::TransactionKind,
    record::{DocumentStatus, TypeBucket},
    users::{UserRole, UserStatus},
};

#[derive(Debug, Parser)]
#[command(
    name = "cartorio",
    about = "Document and service catalog tooling for notary offices"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and manage stored documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
    /// Manage the service catalog
    Services {
        #[command(subcommand)]
        action: ServicesAction,
    },
    /// Browse the staff directory
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Browse the cash ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },
    /// Read or change office settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show data directory and record counts
    Status(StatusArgs),
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Documents --

#[derive(Debug, Subcommand)]
pub enum DocsAction {
    /// List documents matching a text query and facets
    List(ListDocsArgs),
    /// Show one document with its extracted text
    Show {
        /// Document id, `#short` id or unique id prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a file and register it as a document
    Upload(UploadArgs),
    /// Delete a document and its stored file
    Delete {
        /// Document id, `#short` id or unique id prefix
        id: String,
    },
    /// Import document rows from a JSON array export
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[derive(Debug, Parser)]
pub struct ListDocsArgs {
    /// Free-text query over name, client, service and content
    #[arg(short = 'q', long = "query", default_value = "")]
    pub query: String,

    /// Status facet: All, Concluído, Pendente or Processando
    #[arg(long, default_value = "All")]
    pub status: Facet<DocumentStatus>,

    /// Type facet: All, pdf, docx or jpg
    #[arg(long = "type", default_value = "All")]
    pub doc_type: Facet<TypeBucket>,

    /// Maximum number of rows to print
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Client the document belongs to
    #[arg(long)]
    pub client: Option<String>,

    /// Service the document was produced for
    #[arg(long)]
    pub service: Option<String>,

    /// Initial status
    #[arg(long, default_value = "Pendente")]
    pub status: DocumentStatus,

    /// Extracted text to store with the document
    #[arg(long)]
    pub content: Option<String>,
}

// -- Services --

#[derive(Debug, Subcommand)]
pub enum ServicesAction {
    /// List services, optionally filtered
    List {
        /// Match against the service name
        #[arg(short = 'q', long = "query", default_value = "")]
        query: String,
        /// Attribution facet (e.g. "Registro Civil"), or All
        #[arg(long, default_value = "All")]
        attribution: Facet<Attribution>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Register a new service
    Add {
        /// Service name
        name: String,
        /// Registry branch responsible for the service
        #[arg(long, default_value = "Tabelionato de Notas")]
        attribution: Attribution,
        /// Template or model used for the act
        #[arg(long, default_value = "")]
        model: String,
        /// Numbering scheme
        #[arg(long, default_value = "Automática")]
        numbering: String,
    },
    /// Remove a service
    Remove {
        /// Service id, `#short` id or unique id prefix
        id: String,
    },
    /// Import service rows from a JSON array export
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

// -- Users --

#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// List staff members, optionally filtered
    List {
        /// Match against name, e-mail or profile
        #[arg(short = 'q', long = "query", default_value = "")]
        query: String,
        /// Profile facet: All, Administrador, Atendente or Financeiro
        #[arg(long, default_value = "All")]
        role: Facet<UserRole>,
        /// Status facet: All, Ativo or Inativo
        #[arg(long, default_value = "All")]
        status: Facet<UserStatus>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import user rows from a JSON array export
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

// -- Ledger --

#[derive(Debug, Subcommand)]
pub enum LedgerAction {
    /// List ledger entries with income, expense and balance totals
    List {
        /// Match against description, method or notes
        #[arg(short = 'q', long = "query", default_value = "")]
        query: String,
        /// Entry type facet: All, Receita or Despesa
        #[arg(long = "type", default_value = "All")]
        kind: Facet<TransactionKind>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import ledger rows from a JSON array export
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

// -- Config --

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective value of a setting
    Get {
        /// Setting key (e.g. storage_bucket)
        key: String,
    },
    /// Persist a setting in records.redb
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// Clear a stored setting (revert to default)
    Unset {
        /// Setting key
        key: String,
    },
    /// List all settings with their effective values
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "cartorio",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_docs_list_defaults() {
        let cli = Cli::parse_from(["cartorio", "docs", "list"]);
        match cli.command {
            Command::Docs {
                action: DocsAction::List(args),
            } => {
                assert_eq!(args.query, "");
                assert_eq!(args.status, Facet::All);
                assert_eq!(args.doc_type, Facet::All);
                assert_eq!(args.limit, None);
                assert!(!args.json);
            }
            _ => panic!("expected docs list command"),
        }
    }

    #[test]
    fn parse_docs_list_facets() {
        let cli = Cli::parse_from([
            "cartorio",
            "docs",
            "list",
            "-q",
            "escritura",
            "--status",
            "Concluído",
            "--type",
            "docx",
        ]);
        match cli.command {
            Command::Docs {
                action: DocsAction::List(args),
            } => {
                assert_eq!(args.query, "escritura");
                assert_eq!(args.status, Facet::Only(DocumentStatus::Completed));
                assert_eq!(args.doc_type, Facet::Only(TypeBucket::Docx));
            }
            _ => panic!("expected docs list command"),
        }
    }

    #[test]
    fn invalid_facet_is_rejected() {
        let result =
            Cli::try_parse_from(["cartorio", "docs", "list", "--type", "gif"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_services_add_defaults() {
        let cli = Cli::parse_from(["cartorio", "services", "add", "Escritura"]);
        match cli.command {
            Command::Services {
                action:
                    ServicesAction::Add {
                        name,
                        attribution,
                        model,
                        numbering,
                    },
            } => {
                assert_eq!(name, "Escritura");
                assert_eq!(attribution, Attribution::Notary);
                assert_eq!(model, "");
                assert_eq!(numbering, "Automática");
            }
            _ => panic!("expected services add command"),
        }
    }

    #[test]
    fn parse_ledger_and_users_facets() {
        let cli = Cli::parse_from(["cartorio", "ledger", "list", "--type", "despesa"]);
        match cli.command {
            Command::Ledger {
                action: LedgerAction::List { kind, .. },
            } => assert_eq!(kind, Facet::Only(TransactionKind::Expense)),
            _ => panic!("expected ledger list command"),
        }

        let cli = Cli::parse_from([
            "cartorio", "users", "list", "-q", "mariana", "--role", "Financeiro",
        ]);
        match cli.command {
            Command::Users {
                action:
                    UsersAction::List {
                        query,
                        role,
                        status,
                        ..
                    },
            } => {
                assert_eq!(query, "mariana");
                assert_eq!(role, Facet::Only(UserRole::Finance));
                assert_eq!(status, Facet::All);
            }
            _ => panic!("expected users list command"),
        }
    }

    #[test]
    fn parse_config_set() {
        let cli =
            Cli::parse_from(["cartorio", "config", "set", "storage_bucket", "arquivo"]);
        match cli.command {
            Command::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "storage_bucket");
                assert_eq!(value, "arquivo");
            }
            _ => panic!("expected config set command"),
        }
    }

    #[test]
    fn docs_show_accepts_short_id() {
        let cli = Cli::parse_from(["cartorio", "docs", "show", "#012345"]);
        match cli.command {
            Command::Docs {
                action: DocsAction::Show { id, .. },
            } => assert_eq!(id, "#012345"),
            _ => panic!("expected docs show command"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
