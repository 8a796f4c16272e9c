use serde::Serialize;

use crate::{
    catalog::ServiceRecord,
    doc_id::short_display,
    ledger::{LedgerTotals, Transaction, format_brl, totals},
    record::DocumentRecord,
    users::UserRecord,
    view::DocumentView,
};

/// One row of a document listing, as emitted in JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub id: String,
    pub name: String,
    pub client: String,
    pub service: String,
    pub status: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub upload_date: String,
    pub size: Option<String>,
    pub snippet: Option<String>,
}

impl DocumentItem {
    pub fn new(doc: &DocumentRecord, snippet: Option<String>) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            client: doc.client.clone(),
            service: doc.service.clone(),
            status: doc.status.to_string(),
            doc_type: doc.doc_type.to_string(),
            upload_date: doc.upload_date(),
            size: doc.size.clone(),
            snippet,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListing {
    pub query: String,
    pub result_count: usize,
    pub results: Vec<DocumentItem>,
}

impl DocumentListing {
    /// Snapshot of the visible rows of a view, with snippets.
    pub fn from_view(view: &DocumentView, limit: Option<usize>) -> Self {
        let results: Vec<DocumentItem> = view
            .visible()
            .take(limit.unwrap_or(usize::MAX))
            .map(|doc| DocumentItem::new(doc, view.snippet(doc)))
            .collect();
        Self {
            query: view.criteria().query.clone(),
            result_count: results.len(),
            results,
        }
    }
}

/// Plain-text summary of a listing.
pub fn documents_summary(listing: &DocumentListing) -> String {
    if listing.results.is_empty() {
        return "Nenhum documento encontrado.".to_string();
    }

    let mut lines = Vec::with_capacity(listing.results.len() * 2 + 2);
    for item in &listing.results {
        lines.push(format!(
            "#{} [{}] {} ({}) {} / {} {}",
            short_display(&item.id),
            item.status,
            item.name,
            item.doc_type,
            item.client,
            item.service,
            item.upload_date,
        ));
        if let Some(ref snippet) = item.snippet {
            lines.push(format!("     {snippet}"));
        }
    }
    lines.push(String::new());
    lines.push(format!("{} documento(s)", listing.result_count));
    lines.join("\n")
}

/// Full detail of a single document.
pub fn document_detail(doc: &DocumentRecord) -> String {
    let mut lines = vec![
        format!("id: {}", doc.id),
        format!("name: {}", doc.name),
        format!("client: {}", doc.client),
        format!("service: {}", doc.service),
        format!("status: {}", doc.status),
        format!("type: {}", doc.doc_type),
        format!("uploaded: {}", doc.upload_date()),
    ];
    for (label, value) in [
        ("size", &doc.size),
        ("path", &doc.path),
        ("url", &doc.url),
    ] {
        if let Some(v) = value {
            lines.push(format!("{label}: {v}"));
        }
    }
    if let Some(ref content) = doc.content {
        lines.push(String::new());
        lines.push(content.clone());
    }
    lines.join("\n")
}

pub fn services_summary(services: &[&ServiceRecord]) -> String {
    if services.is_empty() {
        return "Nenhum serviço encontrado.".to_string();
    }

    let mut lines: Vec<String> = services
        .iter()
        .map(|s| {
            format!(
                "#{} [{}] {}\t{}\t{}\t{}",
                short_display(&s.id),
                s.status,
                s.name,
                s.attribution,
                s.model,
                s.numbering
            )
        })
        .collect();
    lines.push(String::new());
    lines.push(format!("{} serviço(s)", services.len()));
    lines.join("\n")
}

pub fn users_summary(users: &[&UserRecord]) -> String {
    if users.is_empty() {
        return "Nenhum usuário encontrado.".to_string();
    }

    let mut lines: Vec<String> = users
        .iter()
        .map(|u| {
            format!(
                "#{} [{}] {}\t{}\t{}\t{}",
                short_display(&u.id),
                u.status,
                u.name,
                u.email,
                u.role,
                u.created_date()
            )
        })
        .collect();
    lines.push(String::new());
    lines.push(format!("{} usuário(s)", users.len()));
    lines.join("\n")
}

/// Ledger rows with their line items, followed by the totals.
pub fn ledger_summary(transactions: &[&Transaction]) -> String {
    if transactions.is_empty() {
        return "Nenhum lançamento encontrado.".to_string();
    }

    let mut lines = Vec::new();
    for tx in transactions {
        lines.push(format!(
            "#{} {} {} [{}] {}\t{}\t{}",
            short_display(&tx.id),
            tx.date(),
            tx.time(),
            tx.kind,
            tx.description,
            tx.method,
            format_brl(tx.amount_cents)
        ));
        for item in &tx.items {
            lines.push(format!(
                "     {}x {} {}",
                item.quantity,
                item.description,
                format_brl(item.total_cents())
            ));
        }
    }

    let LedgerTotals {
        income_cents,
        expense_cents,
        balance_cents,
    } = totals(transactions.iter().copied());
    lines.push(String::new());
    lines.push(format!("Receitas: {}", format_brl(income_cents)));
    lines.push(format!("Despesas: {}", format_brl(-expense_cents)));
    lines.push(format!("Saldo: {}", format_brl(balance_cents)));
    lines.push(format!("{} lançamento(s)", transactions.len()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{Attribution, ServiceStatus},
        filter::{FilterCriteria, tests::sample_docs},
    };

    #[test]
    fn listing_carries_snippets() {
        let view = DocumentView::new(
            sample_docs(),
            FilterCriteria::with_query("saibam"),
        );
        let listing = DocumentListing::from_view(&view, None);

        assert_eq!(listing.result_count, 1);
        let item = &listing.results[0];
        assert_eq!(item.status, "Concluído");
        assert_eq!(item.doc_type, "pdf");
        assert!(item.snippet.as_deref().unwrap().contains("Saibam"));

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["resultCount"], 1);
        assert_eq!(json["results"][0]["type"], "pdf");
        assert_eq!(json["results"][0]["uploadDate"], "-");
    }

    #[test]
    fn listing_respects_limit() {
        let view = DocumentView::new(sample_docs(), FilterCriteria::default());
        let listing = DocumentListing::from_view(&view, Some(2));
        assert_eq!(listing.result_count, 2);
    }

    #[test]
    fn empty_summaries() {
        let view = DocumentView::new(Vec::new(), FilterCriteria::default());
        let listing = DocumentListing::from_view(&view, None);
        assert_eq!(documents_summary(&listing), "Nenhum documento encontrado.");
        assert_eq!(services_summary(&[]), "Nenhum serviço encontrado.");
    }

    #[test]
    fn summary_lists_each_row() {
        let view = DocumentView::new(sample_docs(), FilterCriteria::default());
        let text = documents_summary(&DocumentListing::from_view(&view, None));
        assert!(text.contains("Contrato_Social_LTDA.docx"));
        assert!(text.ends_with("4 documento(s)"));
    }

    #[test]
    fn detail_includes_content() {
        let doc = &sample_docs()[0];
        let text = document_detail(doc);
        assert!(text.contains("status: Concluído"));
        assert!(text.contains("ESCRITURA PÚBLICA"));
        assert!(!text.contains("url:"));
    }

    #[test]
    fn services_summary_rows() {
        let s = ServiceRecord {
            id: "0123456789abcdef".into(),
            name: "Escritura".into(),
            attribution: Attribution::Notary,
            model: "-".into(),
            numbering: "Automática".into(),
            status: ServiceStatus::Ativo,
        };
        let text = services_summary(&[&s]);
        assert!(text.starts_with("#012345 [Ativo] Escritura"));
        assert!(text.ends_with("1 serviço(s)"));
    }

    #[test]
    fn users_summary_rows() {
        use crate::users::{UserRole, UserStatus};

        let u = UserRecord {
            id: "abcdef123456".into(),
            name: "Mariana Costa".into(),
            email: "mariana@cartorio.com".into(),
            role: UserRole::Administrator,
            status: UserStatus::Ativo,
            created_at: 0,
        };
        let text = users_summary(&[&u]);
        assert!(text.starts_with("#abcdef [Ativo] Mariana Costa"));
        assert!(text.contains("Administrador"));
        assert!(text.ends_with("1 usuário(s)"));
        assert_eq!(users_summary(&[]), "Nenhum usuário encontrado.");
    }

    #[test]
    fn ledger_summary_totals() {
        let rows = [
            serde_json::json!({
                "id": "t1", "description": "Procuração", "type": "Receita",
                "method": "Dinheiro", "amount": 280,
                "items": [{ "description": "Lavratura", "quantity": 1, "unitPrice": 280 }]
            }),
            serde_json::json!({
                "id": "t2", "description": "Energia", "type": "Despesa",
                "method": "Boleto", "amount": -350
            }),
        ];
        let txs: Vec<Transaction> = rows
            .iter()
            .map(|r| Transaction::from_row(r).unwrap())
            .collect();
        let refs: Vec<&Transaction> = txs.iter().collect();
        let text = ledger_summary(&refs);

        assert!(text.contains("[Receita] Procuração\tDinheiro\tR$ 280,00"));
        assert!(text.contains("     1x Lavratura R$ 280,00"));
        assert!(text.contains("Receitas: R$ 280,00"));
        assert!(text.contains("Despesas: - R$ 350,00"));
        assert!(text.contains("Saldo: - R$ 70,00"));
        assert!(text.ends_with("2 lançamento(s)"));
        assert_eq!(ledger_summary(&[]), "Nenhum lançamento encontrado.");
    }
}
