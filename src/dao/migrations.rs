//! Schema migrations for persisted blobs, keyed by storage key and stored version.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::dao::models::{CURRENT_VERSION, StorageKey, Versioned, timestamp_millis};

/// Reason a migration could not convert a stored value.
#[derive(Debug, Error)]
#[error("cannot migrate `{key}` from version {version}: {reason}")]
pub struct MigrationError {
    /// Key of the value being migrated.
    pub key: StorageKey,
    /// Version the value was stored at.
    pub version: String,
    /// Why the conversion failed.
    pub reason: String,
}

type Migration = fn(Value) -> Result<Value, String>;

/// Look up the migration converting `key` data written at `version`.
fn migration_for(key: StorageKey, version: &str) -> Option<Migration> {
    match (key, version) {
        (StorageKey::CurrentGame, "0.9.0") => Some(current_game_from_0_9_0),
        _ => None,
    }
}

/// Whether a dedicated migration exists for data stored at `version`.
#[cfg(test)]
fn has_migration(key: StorageKey, version: &str) -> bool {
    version != CURRENT_VERSION && migration_for(key, version).is_some()
}

/// Bring an envelope to [`CURRENT_VERSION`].
///
/// Without a dedicated migration the data passes through unchanged. A failing
/// migration keeps the original data, still tagged with the current version so the
/// same migration is not attempted on every read.
pub fn migrate(envelope: Versioned<Value>, key: StorageKey) -> Versioned<Value> {
    let Versioned {
        version,
        data,
        timestamp,
    } = envelope;

    let Some(migration) = migration_for(key, &version).filter(|_| version != CURRENT_VERSION)
    else {
        return Versioned {
            version: CURRENT_VERSION.to_string(),
            data,
            timestamp,
        };
    };

    match migration(data.clone()) {
        Ok(migrated) => {
            info!(key = %key, from = %version, to = CURRENT_VERSION, "migrated stored data");
            Versioned::current(migrated)
        }
        Err(reason) => {
            let err = MigrationError {
                key,
                version,
                reason,
            };
            error!(error = %err, "storage migration failed; keeping original data");
            Versioned {
                version: CURRENT_VERSION.to_string(),
                data,
                timestamp,
            }
        }
    }
}

/// Games saved by 0.9.0 lack per-team scores, the player rotation index, the
/// timer flag and the creation time.
fn current_game_from_0_9_0(data: Value) -> Result<Value, String> {
    let Value::Object(mut game) = data else {
        return Err("game state is not an object".into());
    };

    let teams = game
        .get_mut("teams")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| "game state has no team list".to_string())?;
    for team in teams.iter_mut() {
        let team: &mut Map<String, Value> = team
            .as_object_mut()
            .ok_or_else(|| "team entry is not an object".to_string())?;
        let score = team.get("score").and_then(Value::as_u64).unwrap_or(0);
        team.insert("score".into(), Value::from(score));
    }

    game.entry("currentPlayerIndex").or_insert(Value::from(0));
    game.entry("isTimerRunning").or_insert(Value::Bool(false));
    game.entry("createdAt")
        .or_insert_with(|| Value::from(timestamp_millis()));

    Ok(Value::Object(game))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(version: &str, data: Value) -> Versioned<Value> {
        Versioned {
            version: version.into(),
            data,
            timestamp: 42,
        }
    }

    #[test]
    fn migrates_legacy_game_state() {
        let legacy = envelope(
            "0.9.0",
            json!({
                "teams": [{"id": 1, "name": "A", "color": "#fff"}, {"id": 2, "name": "B", "color": "#000", "score": 4}],
                "currentTeamIndex": 1
            }),
        );

        assert!(has_migration(StorageKey::CurrentGame, "0.9.0"));
        let migrated = migrate(legacy, StorageKey::CurrentGame);

        assert_eq!(migrated.version, CURRENT_VERSION);
        assert_eq!(migrated.data["teams"][0]["score"], 0);
        assert_eq!(migrated.data["teams"][1]["score"], 4);
        assert_eq!(migrated.data["currentPlayerIndex"], 0);
        assert_eq!(migrated.data["isTimerRunning"], false);
        assert_eq!(migrated.data["currentTeamIndex"], 1);
        assert!(migrated.data["createdAt"].is_u64());
    }

    #[test]
    fn unknown_versions_pass_through_with_bumped_version() {
        let stored = envelope("0.5.0", json!({"theme": "dark"}));
        assert!(!has_migration(StorageKey::UserSettings, "0.5.0"));

        let migrated = migrate(stored, StorageKey::UserSettings);
        assert_eq!(migrated.version, CURRENT_VERSION);
        assert_eq!(migrated.data, json!({"theme": "dark"}));
        assert_eq!(migrated.timestamp, 42);
    }

    #[test]
    fn failed_migration_keeps_original_data() {
        let broken = envelope("0.9.0", json!(["not", "a", "game"]));
        let migrated = migrate(broken, StorageKey::CurrentGame);
        assert_eq!(migrated.version, CURRENT_VERSION);
        assert_eq!(migrated.data, json!(["not", "a", "game"]));
    }
}
