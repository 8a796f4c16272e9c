//! The view-state projector behind the document screen.
//!
//! A [`DocumentView`] owns the loaded collection and the current filter
//! criteria. Every mutation recomputes the visible list on the spot; there
//! is no deferred or partial state.

use crate::{
    error::Result,
    filter::{Facet, FilterCriteria, matches},
    record::{DocumentRecord, DocumentStatus, TypeBucket},
    snippet::extract_snippet,
    store::RecordStore,
};

/// Where a view re-fetches its collection from.
pub trait DocumentSource {
    fn fetch_documents(&self) -> Result<Vec<DocumentRecord>>;
}

impl DocumentSource for RecordStore {
    fn fetch_documents(&self) -> Result<Vec<DocumentRecord>> {
        self.list_documents()
    }
}

/// Documents of `docs` that pass `criteria`, in collection order.
pub fn project<'a>(
    docs: &'a [DocumentRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a DocumentRecord> {
    docs.iter().filter(|d| matches(d, criteria)).collect()
}

#[derive(Debug, Default)]
pub struct DocumentView {
    documents: Vec<DocumentRecord>,
    criteria: FilterCriteria,
    /// Indices into `documents` of the rows currently shown.
    visible: Vec<usize>,
}

impl DocumentView {
    pub fn new(documents: Vec<DocumentRecord>, criteria: FilterCriteria) -> Self {
        let mut view = Self {
            documents,
            criteria,
            visible: Vec::new(),
        };
        view.recompute();
        view
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn visible(&self) -> impl ExactSizeIterator<Item = &DocumentRecord> {
        self.visible.iter().map(|&i| &self.documents[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.criteria.query = query.into();
        self.recompute();
    }

    pub fn set_status_filter(&mut self, status: Facet<DocumentStatus>) {
        self.criteria.status = status;
        self.recompute();
    }

    pub fn set_type_filter(&mut self, doc_type: Facet<TypeBucket>) {
        self.criteria.doc_type = doc_type;
        self.recompute();
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.recompute();
    }

    pub fn replace_documents(&mut self, documents: Vec<DocumentRecord>) {
        self.documents = documents;
        self.recompute();
    }

    /// Show a freshly stored document at the top without re-fetching.
    pub fn insert_document(&mut self, doc: DocumentRecord) {
        self.documents.insert(0, doc);
        self.recompute();
    }

    /// Drop a deleted document without re-fetching. Returns whether a row
    /// with that id was present.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        let removed = self.documents.len() != before;
        if removed {
            self.recompute();
        }
        removed
    }

    /// Re-fetch the whole collection from `source`.
    ///
    /// On failure the last loaded collection stays in place and the error
    /// is handed back for the caller to report.
    pub fn refresh(&mut self, source: &impl DocumentSource) -> Result<()> {
        match source.fetch_documents() {
            Ok(documents) => {
                tracing::debug!(count = documents.len(), "loaded documents");
                self.replace_documents(documents);
                Ok(())
            }
            Err(e) => {
                tracing::error!("could not load documents: {e}");
                Err(e)
            }
        }
    }

    /// Excerpt of `doc` around the current query, if any.
    pub fn snippet(&self, doc: &DocumentRecord) -> Option<String> {
        extract_snippet(doc.content.as_deref(), &self.criteria.query)
    }

    fn recompute(&mut self) {
        self.visible = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, d)| matches(d, &self.criteria))
            .map(|(i, _)| i)
            .collect();
    }
}
