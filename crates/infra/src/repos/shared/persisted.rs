use crate::repos::kv::IKVRepo;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// The shape every store is persisted in
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub state: T,
    pub version: u32,
}

/// Upgrades a persisted state of the given version to the next version
pub type Migration = fn(Value) -> Value;

/// Loads the state stored at `key`.
///
/// `migrations[n]` upgrades version `n + 1` to `n + 2`, so a store at version
/// `current_version` has `current_version - 1` migrations. Returns `None` when
/// nothing usable is stored: the key is missing, the envelope is malformed or it
/// was written by a newer version.
pub async fn load_state<T: DeserializeOwned>(
    kv: &dyn IKVRepo,
    key: &str,
    current_version: u32,
    migrations: &[Migration],
) -> anyhow::Result<Option<T>> {
    let raw = match kv.get(key).await? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let envelope = match serde_json::from_str::<Envelope<Value>>(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Ignoring malformed persisted state at {}: {:?}", key, e);
            return Ok(None);
        }
    };

    if envelope.version > current_version {
        warn!(
            "Ignoring persisted state at {} with version {}, newer than the supported version {}",
            key, envelope.version, current_version
        );
        return Ok(None);
    }

    let mut state = envelope.state;
    for version in envelope.version.max(1)..current_version {
        match migrations.get(version as usize - 1) {
            Some(migrate) => state = migrate(state),
            None => {
                warn!("No migration from version {} of {}", version, key);
                return Ok(None);
            }
        }
    }

    match serde_json::from_value(state) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            warn!("Ignoring persisted state at {} that does not parse: {:?}", key, e);
            Ok(None)
        }
    }
}

pub async fn save_state<T: Serialize>(
    kv: &dyn IKVRepo,
    key: &str,
    version: u32,
    state: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(&Envelope { state, version })?;
    kv.set(key, &raw).await
}

/// Sets `field` to `value` on a persisted object unless it is already present
pub fn with_default(mut state: Value, field: &str, value: Value) -> Value {
    if let Value::Object(map) = &mut state {
        map.entry(field).or_insert(value);
    }
    state
}
