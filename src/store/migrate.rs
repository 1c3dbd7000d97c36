use crate::store::keys;
use crate::store::operations::attempts::Attempt;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_attempt_index", m002_attempt_index),
    ]
}

pub fn latest_version() -> u32 {
    migrations().len() as u32
}

/// Apply every migration newer than the stored version.
///
/// Each migration must be idempotent: a crash between the migration and the version write
/// re-runs it on the next start. Versions only move forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuild the attempt id -> attempt key index from primary attempt rows.
fn m002_attempt_index(store: &Store) -> Result<(), StoreError> {
    for item in store.attempts.iter() {
        let (key, value) = item?;
        let attempt: Attempt = Store::deserialize(&value)?;
        let index_key = keys::attempt_index_key(&attempt.school_id, &attempt.id)?;
        store.attempt_index.insert(index_key.as_bytes(), key)?;
    }
    Ok(())
}
