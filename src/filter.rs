use std::{fmt, str::FromStr};

use crate::record::{DocumentRecord, DocumentStatus, TypeBucket};

/// A filter criterion restricted to a small fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facet<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Facet<T> {
    /// `true` for `All`, otherwise whatever `pred` says about the selection.
    pub fn admits(&self, pred: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Self::All => true,
            Self::Only(value) => pred(value),
        }
    }
}

impl<T: FromStr<Err = String>> FromStr for Facet<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "todos" | "todas" => Ok(Self::All),
            _ => s.parse().map(Self::Only),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Facet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Query and facet selections of a document view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub query: String,
    pub status: Facet<DocumentStatus>,
    pub doc_type: Facet<TypeBucket>,
}

impl FilterCriteria {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Whether `doc` passes the text query and both facets.
pub fn matches(doc: &DocumentRecord, criteria: &FilterCriteria) -> bool {
    matches_text(doc, &criteria.query)
        && criteria.status.admits(|status| *status == doc.status)
        && criteria
            .doc_type
            .admits(|bucket| bucket.contains(doc.doc_type))
}

/// Case-insensitive substring match over name, client, service and content.
/// An empty query matches everything.
pub fn matches_text(doc: &DocumentRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let term = query.to_lowercase();
    [
        Some(doc.name.as_str()),
        Some(doc.client.as_str()),
        Some(doc.service.as_str()),
        doc.content.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&term))
}
