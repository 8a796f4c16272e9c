//! Document records and the mapping from raw backend rows.
//!
//! Rows arrive as loosely shaped JSON objects. [`DocumentRecord::from_row`]
//! validates and normalizes them once, so everything downstream works with
//! explicit types and never has to guard against missing fields.

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Placeholder stored when a row carries no client name.
pub const UNKNOWN_CLIENT: &str = "Cliente não informado";

/// Placeholder stored when a row carries no service label.
pub const UNKNOWN_SERVICE: &str = "Serviço não informado";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum DocumentStatus {
    #[serde(rename = "Concluído")]
    Completed,
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Processando")]
    Processing,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 3] =
        [Self::Completed, Self::Pending, Self::Processing];

    /// Label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Concluído",
            Self::Pending => "Pendente",
            Self::Processing => "Processando",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let alias = match wanted.as_str() {
            "concluido" | "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            _ => None,
        };
        alias
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|st| st.label().to_lowercase() == wanted)
            })
            .ok_or_else(|| {
                let expected: Vec<&str> =
                    Self::ALL.iter().map(|st| st.label()).collect();
                format!(
                    "unknown document status '{wanted}' (expected {})",
                    expected.join(", ")
                )
            })
    }
}

/// File-extension category of a stored document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Doc,
    Jpg,
    Jpeg,
    Png,
    #[default]
    Other,
}

impl DocumentType {
    /// Map a bare extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::Doc,
            "jpg" => Self::Jpg,
            "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            _ => Self::Other,
        }
    }

    pub fn from_file_name(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Other => "other",
        }
    }

    /// The coarse bucket this type is filtered under, if any.
    pub fn bucket(self) -> Option<TypeBucket> {
        match self {
            Self::Pdf => Some(TypeBucket::Pdf),
            Self::Docx | Self::Doc => Some(TypeBucket::Docx),
            Self::Jpg | Self::Jpeg | Self::Png => Some(TypeBucket::Image),
            Self::Other => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse type categories offered as a filter facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeBucket {
    /// `pdf`
    Pdf,
    /// `docx`, `doc`
    Docx,
    /// `jpg`, `jpeg`, `png`
    Image,
}

impl TypeBucket {
    pub fn contains(self, doc_type: DocumentType) -> bool {
        doc_type.bucket() == Some(self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "jpg",
        }
    }
}

impl fmt::Display for TypeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeBucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "doc" => Ok(Self::Docx),
            "jpg" | "jpeg" | "png" | "image" | "imagem" => Ok(Self::Image),
            other => Err(format!(
                "unknown document type '{other}' (expected pdf, docx or jpg)"
            )),
        }
    }
}

/// A stored document as held in memory by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    pub client: String,
    pub service: String,
    pub status: DocumentStatus,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub uploaded_at: u64,
}

impl DocumentRecord {
    /// Map a raw backend row into a validated record.
    pub fn from_row(row: &Value) -> Result<Self> {
        let obj = row_object(row)?;

        let id = required_id(obj)?;
        let name = optional_str(obj, "name").ok_or_else(|| {
            Error::InvalidRecord {
                field: "name",
                reason: "missing or empty".into(),
            }
        })?;

        let status = match optional_str(obj, "status") {
            Some(s) => s.parse().map_err(|reason| Error::InvalidRecord {
                field: "status",
                reason,
            })?,
            None => DocumentStatus::default(),
        };

        let doc_type = match optional_str(obj, "type") {
            Some(t) => DocumentType::from_extension(&t),
            None => DocumentType::from_file_name(&name),
        };

        Ok(Self {
            id,
            client: optional_str(obj, "client")
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            service: optional_str(obj, "service")
                .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
            status,
            doc_type,
            content: optional_text(obj, "content"),
            size: optional_str(obj, "size"),
            url: optional_str(obj, "url"),
            path: optional_str(obj, "path"),
            uploaded_at: timestamp_field(obj, "created_at"),
            name,
        })
    }

    /// Upload date as `dd/mm/YYYY`, or `-` when unknown.
    pub fn upload_date(&self) -> String {
        format_date(self.uploaded_at)
    }
}

/// Render a byte count the way the upload dialog does.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

pub(crate) fn format_date(secs: u64) -> String {
    if secs == 0 {
        return "-".to_string();
    }
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn row_object(row: &Value) -> Result<&Map<String, Value>> {
    row.as_object().ok_or_else(|| Error::InvalidRecord {
        field: "row",
        reason: "expected a JSON object".into(),
    })
}

pub(crate) fn required_id(obj: &Map<String, Value>) -> Result<String> {
    match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            Ok(s.trim().to_string())
        }
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::InvalidRecord {
            field: "id",
            reason: "missing or empty".into(),
        }),
    }
}

/// A trimmed, non-empty string field. Nulls, blanks and non-strings are
/// treated as absent.
pub(crate) fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A non-blank string field kept exactly as stored. Extracted text keeps
/// its spacing since snippet windows are counted over it.
pub(crate) fn optional_text(
    obj: &Map<String, Value>,
    key: &str,
) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Epoch seconds from a number, a digit string or an RFC 3339 timestamp;
/// `0` when absent or unparseable.
pub(crate) fn timestamp_field(obj: &Map<String, Value>, key: &str) -> u64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    chrono::DateTime::parse_from_rfc3339(s)
                        .ok()
                        .and_then(|dt| u64::try_from(dt.timestamp()).ok())
                })
                .unwrap_or_else(|| {
                    tracing::debug!(value = s, "unparseable {key}");
                    0
                })
        }
        _ => 0,
    }
}
