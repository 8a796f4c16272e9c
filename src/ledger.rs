//! The cash ledger: income and expense entries with their line items.
//!
//! Amounts are kept in centavos. Expenses are always negative and income
//! always positive, whatever sign the source row used.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    filter::Facet,
    record::{
        format_date,
        optional_str,
        required_id,
        row_object,
        timestamp_field,
    },
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum TransactionKind {
    #[default]
    #[serde(rename = "Receita")]
    Income,
    #[serde(rename = "Despesa")]
    Expense,
}

impl TransactionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Receita",
            Self::Expense => "Despesa",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receita" | "income" => Ok(Self::Income),
            "despesa" | "expense" => Ok(Self::Expense),
            other => Err(format!(
                "unknown transaction type '{other}' (expected Receita or Despesa)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn total_cents(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub method: String,
    /// Signed amount in centavos.
    pub amount_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

impl Transaction {
    /// Map a raw ledger row. A missing `type` is taken from the sign of
    /// `amount`.
    pub fn from_row(row: &Value) -> Result<Self> {
        let obj = row_object(row)?;

        let id = required_id(obj)?;
        let description = optional_str(obj, "description").ok_or_else(|| {
            Error::InvalidRecord {
                field: "description",
                reason: "missing or empty".into(),
            }
        })?;
        let amount = obj
            .get("amount")
            .and_then(cents)
            .ok_or_else(|| Error::InvalidRecord {
                field: "amount",
                reason: "missing or not a number".into(),
            })?;
        let kind = match optional_str(obj, "type") {
            Some(t) => t.parse().map_err(|reason| Error::InvalidRecord {
                field: "type",
                reason,
            })?,
            None if amount < 0 => TransactionKind::Expense,
            None => TransactionKind::Income,
        };
        let amount_cents = match kind {
            TransactionKind::Income => amount.abs(),
            TransactionKind::Expense => -amount.abs(),
        };

        Ok(Self {
            id,
            description,
            kind,
            method: optional_str(obj, "method").unwrap_or_else(|| "-".into()),
            amount_cents,
            notes: optional_str(obj, "notes"),
            items: line_items(obj)?,
            created_at: timestamp_field(obj, "created_at"),
        })
    }

    pub fn date(&self) -> String {
        format_date(self.created_at)
    }

    /// Time of day as `HH:MM`, or `-` when unknown.
    pub fn time(&self) -> String {
        if self.created_at == 0 {
            return "-".to_string();
        }
        i64::try_from(self.created_at)
            .ok()
            .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

fn line_items(obj: &Map<String, Value>) -> Result<Vec<LineItem>> {
    let rows = match obj.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(_) => {
            return Err(Error::InvalidRecord {
                field: "items",
                reason: "expected an array".into(),
            });
        }
    };

    rows.iter()
        .enumerate()
        .map(|(idx, item)| -> Result<LineItem> {
            let invalid = |what: &str| Error::InvalidRecord {
                field: "items",
                reason: format!("item {idx}: {what}"),
            };
            let item = item.as_object().ok_or_else(|| invalid("not an object"))?;
            Ok(LineItem {
                description: optional_str(item, "description")
                    .ok_or_else(|| invalid("missing description"))?,
                quantity: item
                    .get("quantity")
                    .and_then(Value::as_u64)
                    .and_then(|q| u32::try_from(q).ok())
                    .ok_or_else(|| invalid("bad quantity"))?,
                unit_price_cents: item
                    .get("unitPrice")
                    .and_then(cents)
                    .ok_or_else(|| invalid("bad unitPrice"))?,
            })
        })
        .collect()
}

/// Reais as a JSON number, or a string using `.` or `,` as the decimal
/// separator, converted to centavos.
fn cents(value: &Value) -> Option<i64> {
    let reais = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    reais
        .is_finite()
        .then(|| (reais * 100.0).round() as i64)
}

/// `R$ 15,50` for income, `- R$ 350,00` for expenses.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "- " } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}R$ {},{:02}", abs / 100, abs % 100)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Matches description, method and notes.
    pub query: String,
    pub kind: Facet<TransactionKind>,
}

pub fn matches_transaction(tx: &Transaction, filter: &LedgerFilter) -> bool {
    let term = filter.query.to_lowercase();
    let text_hit = term.is_empty()
        || [
            Some(tx.description.as_str()),
            Some(tx.method.as_str()),
            tx.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term));

    text_hit && filter.kind.admits(|k| *k == tx.kind)
}

pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &LedgerFilter,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| matches_transaction(t, filter))
        .collect()
}

/// Income, expense and balance over a set of entries, in centavos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub income_cents: i64,
    /// Sum of expenses as a positive number.
    pub expense_cents: i64,
    pub balance_cents: i64,
}

pub fn totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> LedgerTotals {
    let mut t = LedgerTotals::default();
    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => t.income_cents += tx.amount_cents,
            TransactionKind::Expense => t.expense_cents -= tx.amount_cents,
        }
    }
    t.balance_cents = t.income_cents - t.expense_cents;
    t
}
