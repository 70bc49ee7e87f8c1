//! Canonical per-title daily record, as handed over by the snapshot loader.
//!
//! The loader parses raw run files into this shape; the EDR estimator is the
//! only consumer. Field resolution rules (player-count fallbacks, catalog
//! sizes) live in the estimator, so the record carries every source field it
//! may need.

use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UniverseId;

/// One entry of a monetization catalog (game pass or developer product).
///
/// Raw catalogs are noisy: entries may be malformed or carry prices as
/// strings. Deserialization never fails; a malformed entry simply has no
/// usable price and is skipped by the price-list extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CatalogEntry {
    /// Display name, when present.
    pub name: Option<String>,
    /// Numeric price, when present and parseable.
    pub price: Option<f64>,
}

impl CatalogEntry {
    /// Entry with a price only (test/construction convenience).
    pub fn priced(price: f64) -> Self {
        Self {
            name: None,
            price: Some(price),
        }
    }
}

impl<'de> Deserialize<'de> for CatalogEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return Ok(CatalogEntry::default()),
        };
        let name = obj.get("name").and_then(Value::as_str).map(String::from);
        let price = obj.get("price").and_then(numeric);
        Ok(CatalogEntry { name, price })
    }
}

/// Extract a number from a JSON value that may be a number or numeric string.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn de_universe_id<'de, D>(deserializer: D) -> Result<UniverseId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .map(UniverseId)
    .ok_or_else(|| DeError::custom(format!("invalid universe id: {value}")))
}

/// Canonical per-title record for one snapshot day.
///
/// All operational fields are optional; the estimator resolves documented
/// defaults. A record that cannot provide a universe id is malformed, which
/// makes the whole day's file malformed (the day is the atomic ingestion
/// unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TitleRecord {
    /// Title identity. Accepts `universeId`, `universe_id`, or `id`.
    #[serde(
        rename = "universeId",
        alias = "universe_id",
        alias = "id",
        deserialize_with = "de_universe_id"
    )]
    pub universe_id: UniverseId,

    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,

    // Player-count source fields; the estimator takes the first available.
    #[serde(default)]
    pub avg_ccu: Option<f64>,
    #[serde(default)]
    pub players: Option<f64>,
    #[serde(default)]
    pub playing: Option<f64>,
    #[serde(default)]
    pub ccu: Option<f64>,
    #[serde(default, rename = "concurrentPlayers")]
    pub concurrent_players: Option<f64>,

    // Engagement signals.
    #[serde(default)]
    pub visits: Option<f64>,
    #[serde(default)]
    pub favorites: Option<f64>,
    #[serde(default)]
    pub likes: Option<f64>,

    // Monetization: explicit counts take precedence over catalog sizes.
    #[serde(default)]
    pub monetization_count: Option<f64>,
    #[serde(default)]
    pub num_gamepasses: Option<f64>,
    #[serde(default)]
    pub num_devproducts: Option<f64>,

    #[serde(default)]
    pub game_passes: Vec<CatalogEntry>,
    #[serde(default)]
    pub dev_products: Vec<CatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_lenient() {
        let entries: Vec<CatalogEntry> = serde_json::from_str(
            r#"[{"name": "VIP", "price": 99}, {"price": "25"}, "garbage", {"price": null}]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].price, Some(99.0));
        assert_eq!(entries[0].name.as_deref(), Some("VIP"));
        assert_eq!(entries[1].price, Some(25.0));
        assert_eq!(entries[2].price, None);
        assert_eq!(entries[3].price, None);
    }

    #[test]
    fn test_universe_id_aliases() {
        let a: TitleRecord = serde_json::from_str(r#"{"universeId": 42}"#).unwrap();
        let b: TitleRecord = serde_json::from_str(r#"{"universe_id": 42}"#).unwrap();
        let c: TitleRecord = serde_json::from_str(r#"{"id": "42"}"#).unwrap();

        assert_eq!(a.universe_id, UniverseId(42));
        assert_eq!(b.universe_id, UniverseId(42));
        assert_eq!(c.universe_id, UniverseId(42));
    }

    #[test]
    fn test_missing_universe_id_is_error() {
        let result: Result<TitleRecord, _> = serde_json::from_str(r#"{"name": "Lost"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let record: TitleRecord =
            serde_json::from_str(r#"{"universeId": 7, "players": 120.5, "genre": "RPG"}"#).unwrap();
        assert_eq!(record.players, Some(120.5));
        assert_eq!(record.avg_ccu, None);
    }
}
