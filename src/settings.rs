//! Office settings persisted in the record store.

use crate::{
    data_dir::DataDir,
    error::{Error, Result},
    storage::{DEFAULT_BUCKET, ObjectStorage, validate_bucket},
    store::RecordStore,
};

/// Bucket new uploads are written to.
pub const STORAGE_BUCKET: &str = "storage_bucket";

/// Every key `config` accepts, with its default value.
pub const KNOWN_SETTINGS: &[(&str, &str)] = &[(STORAGE_BUCKET, DEFAULT_BUCKET)];

fn default_for(key: &str) -> Result<&'static str> {
    KNOWN_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, default)| *default)
        .ok_or_else(|| {
            let known: Vec<&str> = KNOWN_SETTINGS.iter().map(|(k, _)| *k).collect();
            Error::Config(format!(
                "unknown setting '{key}' (known: {})",
                known.join(", ")
            ))
        })
}

/// Current value of `key`, falling back to its default.
pub fn get(store: &RecordStore, key: &str) -> Result<String> {
    let default = default_for(key)?;
    store.get_setting_or(key, default)
}

/// Validate and persist a setting.
pub fn set(store: &RecordStore, key: &str, value: &str) -> Result<()> {
    default_for(key)?;
    let value = value.trim();
    if key == STORAGE_BUCKET {
        validate_bucket(value)?;
    }
    store.set_setting(key, value)?;
    tracing::info!(key, value, "updated setting");
    Ok(())
}

/// Drop a stored value so the default applies again.
pub fn unset(store: &RecordStore, key: &str) -> Result<bool> {
    default_for(key)?;
    store.remove_setting(key)
}

/// All known settings with their effective values.
pub fn list(store: &RecordStore) -> Result<Vec<(&'static str, String)>> {
    KNOWN_SETTINGS
        .iter()
        .map(|(key, default)| -> Result<(&'static str, String)> {
            Ok((*key, store.get_setting_or(key, default)?))
        })
        .collect()
}

/// Object storage for the configured bucket.
pub fn open_storage(
    store: &RecordStore,
    data_dir: &DataDir,
) -> Result<ObjectStorage> {
    let bucket = get(store, STORAGE_BUCKET)?;
    ObjectStorage::open(&data_dir.storage_dir()?, &bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, DataDir, RecordStore) {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let store = RecordStore::open(&data_dir.records_db()).unwrap();
        (tmp, data_dir, store)
    }

    #[test]
    fn bucket_defaults_then_follows_setting() {
        let (_tmp, data_dir, store) = fixture();
        assert_eq!(get(&store, STORAGE_BUCKET).unwrap(), DEFAULT_BUCKET);
        assert_eq!(open_storage(&store, &data_dir).unwrap().bucket(), DEFAULT_BUCKET);

        set(&store, STORAGE_BUCKET, " arquivo ").unwrap();
        assert_eq!(get(&store, STORAGE_BUCKET).unwrap(), "arquivo");
        let storage = open_storage(&store, &data_dir).unwrap();
        assert_eq!(storage.bucket(), "arquivo");
        assert!(data_dir.root().join("storage/arquivo").is_dir());

        assert!(unset(&store, STORAGE_BUCKET).unwrap());
        assert_eq!(get(&store, STORAGE_BUCKET).unwrap(), DEFAULT_BUCKET);
    }

    #[test]
    fn invalid_values_are_not_stored() {
        let (_tmp, _data_dir, store) = fixture();
        assert!(set(&store, STORAGE_BUCKET, "../fora").is_err());
        assert!(set(&store, STORAGE_BUCKET, "   ").is_err());
        assert_eq!(store.get_setting(STORAGE_BUCKET).unwrap(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_tmp, _data_dir, store) = fixture();
        let err = set(&store, "theme", "dark").unwrap_err();
        assert!(err.to_string().contains("storage_bucket"));
        assert!(get(&store, "theme").is_err());
        assert!(unset(&store, "theme").is_err());
    }

    #[test]
    fn list_shows_effective_values() {
        let (_tmp, _data_dir, store) = fixture();
        set(&store, STORAGE_BUCKET, "arquivo").unwrap();
        assert_eq!(
            list(&store).unwrap(),
            vec![(STORAGE_BUCKET, "arquivo".to_string())]
        );
    }
}
