use std::path::Path;

use redb::{
    Database,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
    TableHandle,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    catalog::ServiceRecord,
    error::{Error, Result},
    ledger::Transaction,
    record::DocumentRecord,
    users::UserRecord,
};

type RowTable = TableDefinition<'static, &'static str, &'static [u8]>;

const DOCUMENTS: RowTable = TableDefinition::new("documents");
const SERVICES: RowTable = TableDefinition::new("services");
const USERS: RowTable = TableDefinition::new("users");
const TRANSACTIONS: RowTable = TableDefinition::new("transactions");
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// Record collections of the office: documents, services, the staff
/// directory, the ledger and settings.
///
/// Rows are stored as JSON; anything that fails to decode is logged and
/// skipped when listing.
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(DOCUMENTS)?;
        txn.open_table(SERVICES)?;
        txn.open_table(USERS)?;
        txn.open_table(TRANSACTIONS)?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Documents --

    /// Insert a new document. Fails if the id is already taken.
    pub fn insert_document(&self, doc: &DocumentRecord) -> Result<()> {
        self.insert_new(DOCUMENTS, "document", &doc.id, doc)
    }

    pub fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>> {
        self.get_row(DOCUMENTS, id)
    }

    pub fn remove_document(&self, id: &str) -> Result<bool> {
        self.remove_row(DOCUMENTS, id)
    }

    /// Resolve a full id, a `#short` display id or any unique id prefix to
    /// the stored document id.
    pub fn resolve_document_id(&self, reference: &str) -> Result<String> {
        self.resolve_id(DOCUMENTS, "document", reference)
    }

    /// All documents, newest first.
    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let mut docs: Vec<DocumentRecord> = self.list_rows(DOCUMENTS)?;
        docs.sort_by(|a, b| {
            b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.cmp(&b.id))
        });
        Ok(docs)
    }

    /// Upsert many documents in a single transaction.
    pub fn batch_insert_documents(
        &self,
        docs: &[DocumentRecord],
    ) -> Result<()> {
        self.upsert_rows(DOCUMENTS, docs.iter().map(|d| (d.id.as_str(), d)))
    }

    pub fn document_count(&self) -> Result<u64> {
        self.count(DOCUMENTS)
    }

    // -- Services --

    pub fn insert_service(&self, service: &ServiceRecord) -> Result<()> {
        self.insert_new(SERVICES, "service", &service.id, service)
    }

    pub fn get_service(&self, id: &str) -> Result<Option<ServiceRecord>> {
        self.get_row(SERVICES, id)
    }

    pub fn remove_service(&self, id: &str) -> Result<bool> {
        self.remove_row(SERVICES, id)
    }

    pub fn resolve_service_id(&self, reference: &str) -> Result<String> {
        self.resolve_id(SERVICES, "service", reference)
    }

    /// All services, ordered by name.
    pub fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        let mut services: Vec<ServiceRecord> = self.list_rows(SERVICES)?;
        services
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(services)
    }

    pub fn batch_insert_services(
        &self,
        services: &[ServiceRecord],
    ) -> Result<()> {
        self.upsert_rows(
            SERVICES,
            services.iter().map(|s| (s.id.as_str(), s)),
        )
    }

    pub fn service_count(&self) -> Result<u64> {
        self.count(SERVICES)
    }

    // -- Users --

    /// All staff members, ordered by name.
    pub fn list_users(&self) -> Result<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.list_rows(USERS)?;
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    pub fn batch_insert_users(&self, users: &[UserRecord]) -> Result<()> {
        self.upsert_rows(USERS, users.iter().map(|u| (u.id.as_str(), u)))
    }

    pub fn user_count(&self) -> Result<u64> {
        self.count(USERS)
    }

    // -- Ledger --

    /// All ledger entries, newest first.
    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let mut txs: Vec<Transaction> = self.list_rows(TRANSACTIONS)?;
        txs.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
        });
        Ok(txs)
    }

    pub fn batch_insert_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<()> {
        self.upsert_rows(
            TRANSACTIONS,
            transactions.iter().map(|t| (t.id.as_str(), t)),
        )
    }

    pub fn transaction_count(&self) -> Result<u64> {
        self.count(TRANSACTIONS)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Remove a setting, returning whether it was set.
    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    // -- Row helpers --

    fn insert_new<T: Serialize>(
        &self,
        def: RowTable,
        kind: &'static str,
        id: &str,
        row: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(row)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(def)?;
            if table.get(id)?.is_some() {
                return Err(Error::Config(format!(
                    "{kind} '{id}' already exists"
                )));
            }
            table.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn upsert_rows<'r, T: Serialize + 'r>(
        &self,
        def: RowTable,
        rows: impl Iterator<Item = (&'r str, &'r T)>,
    ) -> Result<()> {
        let encoded = rows
            .map(|(id, row)| -> Result<(&'r str, Vec<u8>)> {
                Ok((id, serde_json::to_vec(row)?))
            })
            .collect::<Result<Vec<_>>>()?;
        if encoded.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(def)?;
            for (id, bytes) in &encoded {
                table.insert(*id, bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        def: RowTable,
        id: &str,
    ) -> Result<Option<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        match table.get(id)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn remove_row(&self, def: RowTable, id: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(def)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    fn resolve_id(
        &self,
        def: RowTable,
        kind: &'static str,
        reference: &str,
    ) -> Result<String> {
        let reference = reference.trim();
        let prefix = reference.strip_prefix('#').unwrap_or(reference);
        let not_found = || Error::NotFound {
            kind,
            name: reference.to_string(),
        };
        if prefix.is_empty() {
            return Err(not_found());
        }

        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        if table.get(prefix)?.is_some() {
            return Ok(prefix.to_string());
        }

        let mut candidates = Vec::new();
        for entry in table.range(prefix..)? {
            let (k, _) = entry?;
            let id = k.value();
            if !id.starts_with(prefix) {
                break;
            }
            candidates.push(id.to_string());
        }

        match candidates.len() {
            0 => Err(not_found()),
            1 => Ok(candidates.remove(0)),
            count => Err(Error::AmbiguousId {
                kind,
                reference: reference.to_string(),
                count,
            }),
        }
    }

    fn list_rows<T: DeserializeOwned>(&self, def: RowTable) -> Result<Vec<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            match serde_json::from_slice(v.value()) {
                Ok(row) => result.push(row),
                Err(e) => tracing::warn!(
                    table = def.name(),
                    id = k.value(),
                    "skipping undecodable row: {e}"
                ),
            }
        }
        Ok(result)
    }

    fn count(&self, def: RowTable) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        Ok(table.len()?)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}
