//! cartorio - document and service catalog tooling for a notary office.
//!
//! Documents are stored in a local [redb](https://github.com/cberner/redb)
//! database with their files kept under a bucket directory. The document
//! screen is modelled by [`DocumentView`], which keeps the visible list in
//! sync with a text query and two facets and cuts excerpts around each
//! match. The service catalog, staff directory and cash ledger live in
//! the same store.
//!
//! # Quick start
//!
//! ```no_run
//! use cartorio::{DataDir, DocumentView, FilterCriteria, RecordStore};
//! use cartorio::format::{DocumentListing, documents_summary};
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let store = RecordStore::open(&data_dir.records_db()).unwrap();
//!
//! let mut view = DocumentView::new(
//!     store.list_documents().unwrap(),
//!     FilterCriteria::default(),
//! );
//! view.set_query("escritura");
//! view.set_status_filter("Concluído".parse().unwrap());
//!
//! let listing = DocumentListing::from_view(&view, Some(10));
//! println!("{}", documents_summary(&listing));
//! ```

pub mod catalog;
pub mod cli;
pub mod data_dir;
pub mod doc_id;
pub mod error;
pub mod filter;
pub mod format;
pub mod ingestion;
pub mod ledger;
pub mod mcp;
pub mod record;
pub mod settings;
pub mod snippet;
pub mod storage;
pub mod store;
pub mod users;
pub mod view;

pub use data_dir::DataDir;
pub use doc_id::RecordId;
pub use error::{Error, Result};
pub use filter::{Facet, FilterCriteria};
pub use record::DocumentRecord;
pub use storage::ObjectStorage;
pub use store::RecordStore;
pub use view::DocumentView;
