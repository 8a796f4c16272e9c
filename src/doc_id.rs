use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::{SystemTime, UNIX_EPOCH},
};

/// Identifier assigned to records created locally (uploads, new services).
///
/// Imported rows keep whatever id the backend gave them; this is only for
/// records that originate here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId {
    /// Full 16-character hex form, used as the stored id.
    pub full: String,
    /// The short hex string for human display (e.g. "a1b2c3").
    pub short: String,
}

impl RecordId {
    /// Generate an id from a record kind, its display name and a timestamp
    /// in nanoseconds.
    pub fn new(kind: &str, name: &str, stamp_nanos: u128) -> Self {
        let numeric = Self::hash_parts(kind, name, stamp_nanos);
        Self {
            full: format!("{numeric:016x}"),
            short: Self::short_hex(numeric, 6),
        }
    }

    /// Generate an id stamped with the current time.
    pub fn now(kind: &str, name: &str) -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::new(kind, name, stamp)
    }

    fn hash_parts(kind: &str, name: &str, stamp_nanos: u128) -> u64 {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        name.hash(&mut hasher);
        stamp_nanos.hash(&mut hasher);
        hasher.finish()
    }

    fn short_hex(value: u64, len: usize) -> String {
        let full = format!("{value:016x}");
        full[..len].to_string()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.short)
    }
}

/// Abbreviate a stored id for terminal output.
pub fn short_display(id: &str) -> &str {
    match id.char_indices().nth(6) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
