use std::path::Path;

use cartorio::{
    DataDir,
    DocumentView,
    FilterCriteria,
    ObjectStorage,
    RecordStore,
    catalog::{NewService, ServiceFilter, filter_services},
    cli::{
        Cli,
        Command,
        ConfigAction,
        DocsAction,
        LedgerAction,
        ListDocsArgs,
        ServicesAction,
        UploadArgs,
        UsersAction,
    },
    error,
    format::{
        DocumentListing,
        document_detail,
        documents_summary,
        ledger_summary,
        services_summary,
        users_summary,
    },
    ingestion::{self, ImportReport, UploadRequest},
    ledger::{LedgerFilter, filter_transactions, totals},
    settings::{self, STORAGE_BUCKET},
    users::{UserFilter, filter_users},
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("CARTORIO_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(ref args) = cli.command {
        args.generate();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;

    if let Command::Mcp = cli.command {
        return cartorio::mcp::run_mcp(&data_dir);
    }

    let store = RecordStore::open(&data_dir.records_db())?;

    match cli.command {
        Command::Docs { action } => match action {
            DocsAction::List(args) => docs_list(&store, &args)?,
            DocsAction::Show { id, json } => docs_show(&store, &id, json)?,
            DocsAction::Upload(args) => {
                let storage = settings::open_storage(&store, &data_dir)?;
                docs_upload(&store, &storage, args)?;
            }
            DocsAction::Delete { id } => {
                let storage = settings::open_storage(&store, &data_dir)?;
                let doc = ingestion::delete_document(&store, &storage, &id)?;
                println!("Deleted document '{}'", doc.name);
            }
            DocsAction::Import { file } => {
                let json = read_json(&file)?;
                let report = ingestion::import_documents(&store, &json)?;
                print_report("document", report);
            }
        },
        Command::Services { action } => match action {
            ServicesAction::List {
                query,
                attribution,
                json,
            } => {
                let services = store.list_services()?;
                let filter = ServiceFilter { query, attribution };
                let matched = filter_services(&services, &filter);
                if json {
                    println!("{}", serde_json::to_string_pretty(&matched)?);
                } else {
                    println!("{}", services_summary(&matched));
                }
            }
            ServicesAction::Add {
                name,
                attribution,
                model,
                numbering,
            } => {
                let service = NewService {
                    name,
                    attribution,
                    model,
                    numbering,
                }
                .into_record()?;
                store.insert_service(&service)?;
                println!("Added service '{}' ({})", service.name, service.id);
            }
            ServicesAction::Remove { id } => {
                let id = store.resolve_service_id(&id)?;
                store.remove_service(&id)?;
                println!("Removed service '{id}'");
            }
            ServicesAction::Import { file } => {
                let json = read_json(&file)?;
                let report = ingestion::import_services(&store, &json)?;
                print_report("service", report);
            }
        },
        Command::Users { action } => match action {
            UsersAction::List {
                query,
                role,
                status,
                json,
            } => {
                let users = store.list_users()?;
                let filter = UserFilter {
                    query,
                    role,
                    status,
                };
                let matched = filter_users(&users, &filter);
                if json {
                    println!("{}", serde_json::to_string_pretty(&matched)?);
                } else {
                    println!("{}", users_summary(&matched));
                }
            }
            UsersAction::Import { file } => {
                let json = read_json(&file)?;
                let report = ingestion::import_users(&store, &json)?;
                print_report("user", report);
            }
        },
        Command::Ledger { action } => match action {
            LedgerAction::List { query, kind, json } => {
                let transactions = store.list_transactions()?;
                let filter = LedgerFilter { query, kind };
                let matched = filter_transactions(&transactions, &filter);
                if json {
                    let listing = serde_json::json!({
                        "totals": totals(matched.iter().copied()),
                        "resultCount": matched.len(),
                        "results": matched,
                    });
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                } else {
                    println!("{}", ledger_summary(&matched));
                }
            }
            LedgerAction::Import { file } => {
                let json = read_json(&file)?;
                let report = ingestion::import_transactions(&store, &json)?;
                print_report("transaction", report);
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key } => {
                println!("{}", settings::get(&store, &key)?);
            }
            ConfigAction::Set { key, value } => {
                settings::set(&store, &key, &value)?;
                println!("Set {key} = {}", value.trim());
            }
            ConfigAction::Unset { key } => {
                if settings::unset(&store, &key)? {
                    println!("Cleared {key}");
                } else {
                    println!("{key} was not set");
                }
            }
            ConfigAction::List { json } => {
                let entries = settings::list(&store)?;
                if json {
                    let map: serde_json::Map<String, serde_json::Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
                        .collect();
                    println!("{}", serde_json::Value::Object(map));
                } else {
                    for (key, value) in entries {
                        println!("{key} = {value}");
                    }
                }
            }
        },
        Command::Status(args) => cmd_status(&store, &data_dir, args.json)?,
        Command::Mcp | Command::Completions(_) => {}
    }

    Ok(())
}

fn docs_list(store: &RecordStore, args: &ListDocsArgs) -> error::Result<()> {
    let mut view = DocumentView::default();
    view.set_criteria(FilterCriteria {
        query: args.query.clone(),
        status: args.status,
        doc_type: args.doc_type,
    });
    view.refresh(store)?;

    let listing = DocumentListing::from_view(&view, args.limit);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("{}", documents_summary(&listing));
    }
    Ok(())
}

fn docs_show(
    store: &RecordStore,
    reference: &str,
    json: bool,
) -> error::Result<()> {
    let id = store.resolve_document_id(reference)?;
    let doc = store
        .get_document(&id)?
        .ok_or_else(|| error::Error::NotFound {
            kind: "document",
            name: id.clone(),
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{}", document_detail(&doc));
    }
    Ok(())
}

fn docs_upload(
    store: &RecordStore,
    storage: &ObjectStorage,
    args: UploadArgs,
) -> error::Result<()> {
    let request = UploadRequest {
        file: args.file,
        client: args.client,
        service: args.service,
        status: args.status,
        content: args.content,
    };
    let doc = ingestion::upload_document(store, storage, request)?;
    println!(
        "Uploaded '{}' as {} ({})",
        doc.name,
        doc.id,
        doc.size.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn read_json(path: &Path) -> error::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        error::Error::Config(format!("cannot read {}: {e}", path.display()))
    })
}

fn print_report(kind: &str, report: ImportReport) {
    println!("Imported {} {kind}(s), skipped {}", report.imported, report.skipped);
}

fn cmd_status(
    store: &RecordStore,
    data_dir: &DataDir,
    json: bool,
) -> error::Result<()> {
    let documents = store.document_count()?;
    let services = store.service_count()?;
    let users = store.user_count()?;
    let transactions = store.transaction_count()?;
    let bucket = settings::get(store, STORAGE_BUCKET)?;

    if json {
        let status = serde_json::json!({
            "data_dir": data_dir.root().display().to_string(),
            "bucket": bucket,
            "documents": documents,
            "services": services,
            "users": users,
            "transactions": transactions,
        });
        println!("{status}");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Storage bucket: {bucket}");
        println!("Documents: {documents}");
        println!("Services: {services}");
        println!("Users: {users}");
        println!("Transactions: {transactions}");
    }
    Ok(())
}
