//! The service catalog: notarial acts offered by the office, grouped by
//! attribution (the registry branch responsible for them).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    doc_id::RecordId,
    error::{Error, Result},
    filter::Facet,
    record::{optional_str, required_id, row_object},
};

/// Numbering scheme assigned to new services unless one is given.
pub const DEFAULT_NUMBERING: &str = "Automática";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Attribution {
    #[default]
    #[serde(rename = "Tabelionato de Notas")]
    Notary,
    #[serde(rename = "Registro Civil")]
    CivilRegistry,
    #[serde(rename = "Registro de Imóveis")]
    RealEstateRegistry,
    #[serde(rename = "Títulos e Documentos")]
    DeedsAndDocuments,
    #[serde(rename = "Protesto")]
    Protest,
}

impl Attribution {
    pub const ALL: [Attribution; 5] = [
        Self::Notary,
        Self::CivilRegistry,
        Self::RealEstateRegistry,
        Self::DeedsAndDocuments,
        Self::Protest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Notary => "Tabelionato de Notas",
            Self::CivilRegistry => "Registro Civil",
            Self::RealEstateRegistry => "Registro de Imóveis",
            Self::DeedsAndDocuments => "Títulos e Documentos",
            Self::Protest => "Protesto",
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Attribution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        // Short names match the sidebar labels of the catalog screen.
        let short = match wanted.as_str() {
            "tabelionato" => Some(Self::Notary),
            "reg. civil" => Some(Self::CivilRegistry),
            "reg. imóveis" | "reg. imoveis" => Some(Self::RealEstateRegistry),
            "títulos" | "titulos" => Some(Self::DeedsAndDocuments),
            _ => None,
        };
        short
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|a| a.label().to_lowercase() == wanted)
            })
            .ok_or_else(|| format!("unknown attribution '{}'", s.trim()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum ServiceStatus {
    #[default]
    Ativo,
    Inativo,
}

impl ServiceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ativo => "Ativo",
            Self::Inativo => "Inativo",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ativo" | "active" => Ok(Self::Ativo),
            "inativo" | "inactive" => Ok(Self::Inativo),
            other => Err(format!("unknown service status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub attribution: Attribution,
    pub model: String,
    pub numbering: String,
    pub status: ServiceStatus,
}

impl ServiceRecord {
    /// Map a raw backend row into a validated service.
    pub fn from_row(row: &Value) -> Result<Self> {
        let obj = row_object(row)?;

        let id = required_id(obj)?;
        let name = optional_str(obj, "name").ok_or_else(|| {
            Error::InvalidRecord {
                field: "name",
                reason: "missing or empty".into(),
            }
        })?;
        let attribution = match optional_str(obj, "attribution") {
            Some(a) => a.parse().map_err(|reason| Error::InvalidRecord {
                field: "attribution",
                reason,
            })?,
            None => Attribution::default(),
        };
        let status = match optional_str(obj, "status") {
            Some(s) => s.parse().map_err(|reason| Error::InvalidRecord {
                field: "status",
                reason,
            })?,
            None => ServiceStatus::default(),
        };

        Ok(Self {
            id,
            name,
            attribution,
            model: optional_str(obj, "model").unwrap_or_else(|| "-".into()),
            numbering: optional_str(obj, "numbering")
                .unwrap_or_else(|| "-".into()),
            status,
        })
    }
}

/// Form input for registering a service.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub attribution: Attribution,
    pub model: String,
    pub numbering: String,
}

impl NewService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribution: Attribution::default(),
            model: String::new(),
            numbering: DEFAULT_NUMBERING.to_string(),
        }
    }

    /// Validate the form and build an active service with a fresh id.
    pub fn into_record(self) -> Result<ServiceRecord> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidRecord {
                field: "name",
                reason: "missing or empty".into(),
            });
        }

        let blank_to_dash = |s: String| {
            let s = s.trim().to_string();
            if s.is_empty() { "-".to_string() } else { s }
        };

        Ok(ServiceRecord {
            id: RecordId::now("service", &name).full,
            name,
            attribution: self.attribution,
            model: blank_to_dash(self.model),
            numbering: blank_to_dash(self.numbering),
            status: ServiceStatus::Ativo,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub query: String,
    pub attribution: Facet<Attribution>,
}

/// Case-insensitive name match plus the attribution facet.
pub fn matches_service(service: &ServiceRecord, filter: &ServiceFilter) -> bool {
    service
        .name
        .to_lowercase()
        .contains(&filter.query.to_lowercase())
        && filter
            .attribution
            .admits(|a| *a == service.attribution)
}

/// Stable filter over an already-fetched catalog.
pub fn filter_services<'a>(
    services: &'a [ServiceRecord],
    filter: &ServiceFilter,
) -> Vec<&'a ServiceRecord> {
    services
        .iter()
        .filter(|s| matches_service(s, filter))
        .collect()
}
