use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{
    catalog::ServiceRecord,
    doc_id::RecordId,
    error::{Error, Result},
    ledger::Transaction,
    record::{
        DocumentRecord,
        DocumentStatus,
        DocumentType,
        UNKNOWN_CLIENT,
        UNKNOWN_SERVICE,
        format_size,
    },
    storage::ObjectStorage,
    store::RecordStore,
    users::UserRecord,
};

/// Extensions whose bytes are used directly as the document's text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// A file the user asked to store, plus the form fields around it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub client: Option<String>,
    pub service: Option<String>,
    pub status: DocumentStatus,
    /// Extracted text supplied by the caller; overrides extraction.
    pub content: Option<String>,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            client: None,
            service: None,
            status: DocumentStatus::default(),
            content: None,
        }
    }
}

/// Counts reported by the import commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Store a file's blob and its document record.
///
/// The blob goes first; if the record cannot be written the blob is
/// removed again so a failed upload leaves nothing behind.
pub fn upload_document(
    store: &RecordStore,
    storage: &ObjectStorage,
    request: UploadRequest,
) -> Result<DocumentRecord> {
    let bytes = std::fs::read(&request.file)?;
    let name = file_name(&request.file)?;
    let ext = request
        .file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let content = request
        .content
        .filter(|c| !c.trim().is_empty())
        .or_else(|| extract_text(&ext, &bytes));

    let uploaded_at = now_secs();
    let id = RecordId::now("document", &name);
    let key = format!("{}/{}", id.full, name);

    let doc = DocumentRecord {
        id: id.full.clone(),
        doc_type: DocumentType::from_extension(&ext),
        client: non_blank(request.client)
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
        service: non_blank(request.service)
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
        status: request.status,
        content,
        size: Some(format_size(bytes.len() as u64)),
        url: Some(storage.public_url(&key)?),
        path: Some(key.clone()),
        uploaded_at,
        name,
    };

    storage.upload(&key, &bytes)?;
    if let Err(e) = store.insert_document(&doc) {
        if let Err(cleanup) = storage.remove(&key) {
            tracing::warn!(key = %key, "could not remove orphaned object: {cleanup}");
        }
        return Err(e);
    }

    tracing::info!(id = %id, name = %doc.name, "uploaded document");
    Ok(doc)
}

/// Remove a document's blob and then its record. `reference` may be the
/// full id or a unique prefix such as the `#short` display id.
pub fn delete_document(
    store: &RecordStore,
    storage: &ObjectStorage,
    reference: &str,
) -> Result<DocumentRecord> {
    let id = store.resolve_document_id(reference)?;
    let id = id.as_str();
    let doc = store.get_document(id)?.ok_or_else(|| Error::NotFound {
        kind: "document",
        name: id.to_string(),
    })?;

    if let Some(ref key) = doc.path
        && !storage.remove(key)?
    {
        tracing::warn!(id, key = %key, "stored object was already missing");
    }
    store.remove_document(id)?;

    tracing::info!(id, name = %doc.name, "deleted document");
    Ok(doc)
}

/// Import a JSON array of raw document rows.
pub fn import_documents(store: &RecordStore, json: &str) -> Result<ImportReport> {
    let (docs, skipped) = map_rows(json, DocumentRecord::from_row)?;
    store.batch_insert_documents(&docs)?;
    Ok(ImportReport {
        imported: docs.len(),
        skipped,
    })
}

/// Import a JSON array of raw service rows.
pub fn import_services(store: &RecordStore, json: &str) -> Result<ImportReport> {
    let (services, skipped) = map_rows(json, ServiceRecord::from_row)?;
    store.batch_insert_services(&services)?;
    Ok(ImportReport {
        imported: services.len(),
        skipped,
    })
}

/// Import a JSON array of raw `app_users` rows.
pub fn import_users(store: &RecordStore, json: &str) -> Result<ImportReport> {
    let (users, skipped) = map_rows(json, UserRecord::from_row)?;
    store.batch_insert_users(&users)?;
    Ok(ImportReport {
        imported: users.len(),
        skipped,
    })
}

/// Import a JSON array of raw ledger rows.
pub fn import_transactions(
    store: &RecordStore,
    json: &str,
) -> Result<ImportReport> {
    let (txs, skipped) = map_rows(json, Transaction::from_row)?;
    store.batch_insert_transactions(&txs)?;
    Ok(ImportReport {
        imported: txs.len(),
        skipped,
    })
}

fn map_rows<T>(
    json: &str,
    from_row: impl Fn(&Value) -> Result<T>,
) -> Result<(Vec<T>, usize)> {
    let value: Value = serde_json::from_str(json)?;
    let rows = value.as_array().ok_or_else(|| {
        Error::Config("import file must contain a JSON array of rows".into())
    })?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (idx, row) in rows.iter().enumerate() {
        match from_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(row = idx, "skipping row: {e}");
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Simulated OCR: only text files yield content.
fn extract_text(ext: &str, bytes: &[u8]) -> Option<String> {
    if !TEXT_EXTENSIONS.contains(&ext) {
        return None;
    }
    std::str::from_utf8(bytes)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Config(format!("not a file path: {}", path.display()))
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DEFAULT_BUCKET;

    struct Fixture {
        tmp: tempfile::TempDir,
        store: RecordStore,
        storage: ObjectStorage,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let store = RecordStore::open(&tmp.path().join("records.redb")).unwrap();
        let storage =
            ObjectStorage::open(&tmp.path().join("storage"), DEFAULT_BUCKET)
                .unwrap();
        Fixture {
            tmp,
            store,
            storage,
        }
    }

    #[test]
    fn upload_text_file_extracts_content() {
        let f = fixture();
        let file = f.tmp.path().join("procuracao.txt");
        std::fs::write(&file, "PROCURAÇÃO AD JUDICIA ET EXTRA.\n").unwrap();

        let mut request = UploadRequest::new(&file);
        request.client = Some("João Santos".into());
        request.status = DocumentStatus::Completed;
        let doc = upload_document(&f.store, &f.storage, request).unwrap();

        assert_eq!(doc.name, "procuracao.txt");
        assert_eq!(doc.doc_type, DocumentType::Other);
        assert_eq!(doc.client, "João Santos");
        assert_eq!(doc.service, UNKNOWN_SERVICE);
        assert_eq!(
            doc.content.as_deref(),
            Some("PROCURAÇÃO AD JUDICIA ET EXTRA.\n")
        );
        assert!(doc.uploaded_at > 0);

        let key = doc.path.clone().unwrap();
        assert_eq!(key, format!("{}/procuracao.txt", doc.id));
        assert_eq!(
            f.storage.read(&key).unwrap(),
            std::fs::read(&file).unwrap()
        );
        assert_eq!(f.store.get_document(&doc.id).unwrap(), Some(doc));
    }

    #[test]
    fn upload_binary_has_no_content_unless_given() {
        let f = fixture();
        let file = f.tmp.path().join("Escritura.PDF");
        std::fs::write(&file, b"%PDF-1.4 \x00\x01").unwrap();

        let doc = upload_document(&f.store, &f.storage, UploadRequest::new(&file))
            .unwrap();
        assert_eq!(doc.doc_type, DocumentType::Pdf);
        assert_eq!(doc.content, None);
        assert_eq!(doc.client, UNKNOWN_CLIENT);
        assert_eq!(doc.size.as_deref(), Some("11 B"));

        let mut request = UploadRequest::new(&file);
        request.content = Some("ESCRITURA PÚBLICA".into());
        let doc = upload_document(&f.store, &f.storage, request).unwrap();
        assert_eq!(doc.content.as_deref(), Some("ESCRITURA PÚBLICA"));
    }

    #[test]
    fn upload_keeps_text_as_extracted() {
        let f = fixture();
        let padded = f.tmp.path().join("testamento.md");
        std::fs::write(&padded, "    TESTAMENTO PÚBLICO  ").unwrap();
        let doc =
            upload_document(&f.store, &f.storage, UploadRequest::new(&padded))
                .unwrap();
        assert_eq!(doc.content.as_deref(), Some("    TESTAMENTO PÚBLICO  "));

        let blank = f.tmp.path().join("vazio.txt");
        std::fs::write(&blank, " \n\t ").unwrap();
        let doc =
            upload_document(&f.store, &f.storage, UploadRequest::new(&blank))
                .unwrap();
        assert_eq!(doc.content, None);
    }

    #[test]
    fn upload_missing_file_fails_without_state() {
        let f = fixture();
        let request = UploadRequest::new(f.tmp.path().join("ghost.pdf"));

        assert!(upload_document(&f.store, &f.storage, request).is_err());
        assert_eq!(f.store.document_count().unwrap(), 0);
    }

    #[test]
    fn delete_removes_record_and_blob() {
        let f = fixture();
        let file = f.tmp.path().join("rg.jpg");
        std::fs::write(&file, b"\xff\xd8\xff").unwrap();
        let doc = upload_document(&f.store, &f.storage, UploadRequest::new(&file))
            .unwrap();
        let key = doc.path.clone().unwrap();

        let deleted = delete_document(&f.store, &f.storage, &doc.id).unwrap();
        assert_eq!(deleted.id, doc.id);
        assert_eq!(f.store.get_document(&doc.id).unwrap(), None);
        assert!(f.storage.read(&key).is_err());
    }

    #[test]
    fn delete_accepts_short_display_id() {
        let f = fixture();
        let file = f.tmp.path().join("certidao.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        let doc = upload_document(&f.store, &f.storage, UploadRequest::new(&file))
            .unwrap();

        let short = format!("#{}", &doc.id[..6]);
        let deleted = delete_document(&f.store, &f.storage, &short).unwrap();
        assert_eq!(deleted.id, doc.id);
        assert_eq!(f.store.document_count().unwrap(), 0);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let f = fixture();
        let err = delete_document(&f.store, &f.storage, "nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "document", .. }));
    }

    #[test]
    fn import_skips_invalid_rows() {
        let f = fixture();
        let json = r#"[
            {"id": "1", "name": "Escritura.pdf", "status": "Concluído"},
            {"id": "2", "name": ""},
            {"name": "sem-id.pdf"},
            {"id": 3, "name": "Contrato.docx", "client": null}
        ]"#;

        let report = import_documents(&f.store, json).unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 2,
                skipped: 2
            }
        );
        let doc = f.store.get_document("3").unwrap().unwrap();
        assert_eq!(doc.client, UNKNOWN_CLIENT);
        assert_eq!(doc.doc_type, DocumentType::Docx);
    }

    #[test]
    fn import_rejects_non_array() {
        let f = fixture();
        assert!(import_documents(&f.store, r#"{"id": "1"}"#).is_err());
        assert!(import_documents(&f.store, "not json").is_err());
    }

    #[test]
    fn import_services_rows() {
        let f = fixture();
        let json = r#"[
            {"id": "s1", "name": "Escritura", "attribution": "Tabelionato de Notas", "status": "Ativo"},
            {"id": "s2", "name": "Averbação", "attribution": "Registro Civil", "model": "Modelo A"}
        ]"#;

        let report = import_services(&f.store, json).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(f.store.list_services().unwrap()[0].name, "Averbação");
    }

    #[test]
    fn import_users_and_transactions() {
        let f = fixture();
        let users = r#"[
            {"id": "u1", "name": "Mariana", "email": "m@c.com", "role": "Administrador", "password": "x"},
            {"id": "u2", "name": "Paulo", "role": "Gerente"}
        ]"#;
        let report = import_users(&f.store, users).unwrap();
        assert_eq!((report.imported, report.skipped), (1, 1));

        let ledger = r#"[
            {"id": "t1", "description": "Certidão", "type": "Receita", "method": "PIX", "amount": 15.5},
            {"id": "t2", "description": "Energia", "type": "Despesa", "method": "Boleto", "amount": -350}
        ]"#;
        let report = import_transactions(&f.store, ledger).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(f.store.transaction_count().unwrap(), 2);
    }
}
