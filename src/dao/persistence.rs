//! Versioned JSON persistence on top of a [`KeyValueStore`].
//!
//! Writes never raise: failures are logged and reported as `false`. Reads fall back
//! to the caller's default whenever the stored value cannot be used.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::dao::{
    kv_store::KeyValueStore,
    migrations,
    models::{CURRENT_VERSION, StorageKey, Versioned},
    storage::{StorageError, StorageResult},
};

/// Handle used by services to persist their blobs.
#[derive(Clone)]
pub struct Persistence {
    backend: Arc<dyn KeyValueStore>,
}

impl Persistence {
    /// Wrap `backend` with versioned JSON handling.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Wrap `value` in a versioned envelope and write it under `key`.
    pub async fn store<T>(&self, key: StorageKey, value: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        let raw = match serde_json::to_string(&Versioned::current(value)) {
            Ok(raw) => raw,
            Err(err) => {
                error!(key = %key, error = %err, "failed to serialize value for storage");
                return false;
            }
        };

        match self.backend.put(key.as_str(), raw).await {
            Ok(()) => true,
            Err(err) => {
                log_storage_error(key, &err);
                false
            }
        }
    }

    /// Read the value stored under `key`, or `default` when it is missing or unusable.
    pub async fn retrieve<T>(&self, key: StorageKey, default: T) -> T
    where
        T: DeserializeOwned,
    {
        let raw = match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return default,
            Err(err) => {
                log_storage_error(key, &err);
                return default;
            }
        };

        let parsed = match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(key = %key, error = %err, "failed to parse stored data");
                return default;
            }
        };

        let data = match into_envelope(parsed) {
            Ok(envelope) if envelope.version != CURRENT_VERSION => {
                let migrated = migrations::migrate(envelope, key);
                self.write_back(key, &migrated).await;
                migrated.data
            }
            Ok(envelope) => envelope.data,
            // Values written without an envelope are decoded as-is.
            Err(unversioned) => unversioned,
        };

        match serde_json::from_value(data) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "stored data does not match the expected shape; using default");
                default
            }
        }
    }

    /// Delete the value stored under `key`.
    pub async fn remove(&self, key: StorageKey) -> bool {
        match self.backend.remove(key.as_str()).await {
            Ok(existed) => {
                debug!(key = %key, existed, "removed stored data");
                true
            }
            Err(err) => {
                log_storage_error(key, &err);
                false
            }
        }
    }

    /// Probe the underlying backend.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.backend.health_check().await
    }

    async fn write_back(&self, key: StorageKey, envelope: &Versioned<Value>) {
        let raw = match serde_json::to_string(envelope) {
            Ok(raw) => raw,
            Err(err) => {
                error!(key = %key, error = %err, "failed to serialize migrated data");
                return;
            }
        };
        if let Err(err) = self.backend.put(key.as_str(), raw).await {
            log_storage_error(key, &err);
        }
    }
}

/// Split a parsed blob into its envelope, or hand the raw value back when it is not one.
fn into_envelope(parsed: Value) -> Result<Versioned<Value>, Value> {
    let is_envelope = parsed
        .get("version")
        .is_some_and(|version| version.is_string())
        && parsed.get("data").is_some();
    if !is_envelope {
        return Err(parsed);
    }

    let Value::Object(mut fields) = parsed else {
        return Err(parsed);
    };
    let version = fields
        .remove("version")
        .and_then(|version| version.as_str().map(str::to_string))
        .unwrap_or_default();
    let data = fields.remove("data").unwrap_or(Value::Null);
    let timestamp = fields
        .remove("timestamp")
        .and_then(|timestamp| timestamp.as_u64())
        .unwrap_or_default();

    Ok(Versioned {
        version,
        data,
        timestamp,
    })
}

fn log_storage_error(key: StorageKey, err: &StorageError) {
    match err {
        StorageError::QuotaExceeded { .. } => {
            warn!(key = %key, error = %err, "storage quota exceeded; some data may not be saved")
        }
        StorageError::Unavailable { .. } => {
            error!(key = %key, error = %err, "storage error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            kv_store::memory::MemoryStore,
            models::{Theme, UserSettingsEntity},
        },
        state::game::{GameSettings, GameState, Player, Team},
    };
    use serde_json::json;

    fn persistence() -> (Persistence, MemoryStore) {
        let backend = MemoryStore::new();
        (Persistence::new(Arc::new(backend.clone())), backend)
    }

    fn sample_game() -> GameState {
        GameState::new(
            vec![Team {
                id: 1,
                name: "Team 1".into(),
                color: "#FF5733".into(),
                score: 3,
                players: vec![Player {
                    name: "Player 1".into(),
                }],
            }],
            GameSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let (persistence, backend) = persistence();
        let game = sample_game();

        assert!(persistence.store(StorageKey::CurrentGame, &game).await);
        let back: Option<GameState> = persistence.retrieve(StorageKey::CurrentGame, None).await;
        assert_eq!(back, Some(game));

        let raw = backend.get(StorageKey::CurrentGame.as_str()).await.unwrap().unwrap();
        let envelope: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["version"], CURRENT_VERSION);
        assert!(envelope["timestamp"].as_u64().unwrap() > 0);
        assert_eq!(envelope["data"]["teams"][0]["score"], 3);
    }

    #[tokio::test]
    async fn corrupt_json_yields_default() {
        let (persistence, backend) = persistence();
        backend
            .put(StorageKey::UserSettings.as_str(), "{not json".into())
            .await
            .unwrap();

        let settings = persistence
            .retrieve(StorageKey::UserSettings, UserSettingsEntity::default())
            .await;
        assert_eq!(settings, UserSettingsEntity::default());
    }

    #[tokio::test]
    async fn mismatched_shape_yields_default() {
        let (persistence, backend) = persistence();
        backend
            .put(
                StorageKey::UserSettings.as_str(),
                json!({"version": CURRENT_VERSION, "data": {"theme": 12}, "timestamp": 1}).to_string(),
            )
            .await
            .unwrap();

        let settings = persistence
            .retrieve(StorageKey::UserSettings, UserSettingsEntity::default())
            .await;
        assert_eq!(settings.theme, Theme::System);
    }

    #[tokio::test]
    async fn unversioned_values_are_decoded_directly() {
        let (persistence, backend) = persistence();
        backend
            .put(
                StorageKey::UserSettings.as_str(),
                json!({"theme": "dark", "soundEnabled": false, "notifications": true}).to_string(),
            )
            .await
            .unwrap();

        let settings = persistence
            .retrieve(StorageKey::UserSettings, UserSettingsEntity::default())
            .await;
        assert_eq!(settings.theme, Theme::Dark);
        assert!(!settings.sound_enabled);
    }

    #[tokio::test]
    async fn legacy_versions_are_migrated_and_written_back() {
        let (persistence, backend) = persistence();
        let mut legacy = serde_json::to_value(sample_game()).unwrap();
        legacy["teams"][0].as_object_mut().unwrap().remove("score");
        legacy.as_object_mut().unwrap().remove("currentPlayerIndex");
        backend
            .put(
                StorageKey::CurrentGame.as_str(),
                json!({"version": "0.9.0", "data": legacy, "timestamp": 5}).to_string(),
            )
            .await
            .unwrap();

        let game: Option<GameState> = persistence.retrieve(StorageKey::CurrentGame, None).await;
        let game = game.unwrap();
        assert_eq!(game.teams[0].score, 0);
        assert_eq!(game.current_player_index, 0);

        let raw = backend.get(StorageKey::CurrentGame.as_str()).await.unwrap().unwrap();
        let rewritten: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(rewritten["version"], CURRENT_VERSION);
    }

    #[tokio::test]
    async fn quota_failure_reports_false_without_panicking() {
        let backend = MemoryStore::with_quota(64);
        let persistence = Persistence::new(Arc::new(backend));

        assert!(!persistence.store(StorageKey::CurrentGame, &sample_game()).await);
        let missing: Option<GameState> = persistence.retrieve(StorageKey::CurrentGame, None).await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn remove_clears_value() {
        let (persistence, _backend) = persistence();
        assert!(persistence.store(StorageKey::AuthToken, "token").await);
        assert!(persistence.remove(StorageKey::AuthToken).await);

        let token: String = persistence
            .retrieve(StorageKey::AuthToken, String::new())
            .await;
        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn null_values_survive_a_round_trip() {
        let (persistence, backend) = persistence();
        assert!(persistence.store(StorageKey::AuthToken, &None::<u32>).await);
        let raw = backend.get(StorageKey::AuthToken.as_str()).await.unwrap().unwrap();
        assert!(raw.contains("\"data\":null"));

        let retrieved: Option<u32> = persistence.retrieve(StorageKey::AuthToken, Some(5)).await;
        assert_eq!(retrieved, None);
    }
}
