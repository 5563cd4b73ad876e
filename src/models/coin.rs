// ============================================================================
// Structure : CoinRecord
// ============================================================================
// Représente une crypto-monnaie du catalogue, telle que stockée dans le
// service clé-valeur sous la clé "coin:<identifiant>"
//
// CONCEPTS RUST :
// 1. Serde untagged : accepter plusieurs formes JSON pour un même champ
// 2. #[serde(flatten)] : conserver les champs inconnus sans les perdre
// 3. Validation à la frontière : JSON libre -> type Rust strict
// ============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::models::StoreEntry;

/// Identifiant métier d'une coin (champ `id`)
///
/// CONCEPT RUST : #[serde(untagged)]
/// - Le backend stocke tantôt des nombres (1), tantôt des chaînes ("bitcoin")
/// - Serde essaie chaque variant dans l'ordre
/// - Un nombre et une chaîne ne sont jamais égaux (1 != "1")
/// - Deux nombres sont comparés par valeur (1 == 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoinId {
    Number(serde_json::Number),
    Text(String),
}

impl PartialEq for CoinId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CoinId::Number(a), CoinId::Number(b)) => numbers_equal(a, b),
            (CoinId::Text(a), CoinId::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CoinId {}

impl Hash for CoinId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CoinId::Number(n) => {
                state.write_u8(0);
                // +0.0 et -0.0 sont égaux : même hash
                let value = n.as_f64().unwrap_or_default();
                let value = if value == 0.0 { 0.0 } else { value };
                value.to_bits().hash(state);
            }
            CoinId::Text(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

/// Égalité numérique : exacte entre entiers, sinon par valeur flottante
fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    a.as_f64() == b.as_f64()
}

impl From<i64> for CoinId {
    fn from(value: i64) -> Self {
        CoinId::Number(value.into())
    }
}

impl From<&str> for CoinId {
    fn from(value: &str) -> Self {
        CoinId::Text(value.to_string())
    }
}

impl From<String> for CoinId {
    fn from(value: String) -> Self {
        CoinId::Text(value)
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinId::Number(n) => write!(f, "{}", n),
            CoinId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Une coin du catalogue
///
/// L'identité d'une coin (filtrage, suppression des favoris) est son `id`,
/// jamais sa clé de stockage `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    /// Clé de stockage dans le service (ex: "coin:bitcoin")
    pub key: String,

    /// Identifiant métier (ex: 1 ou "bitcoin")
    pub id: CoinId,

    /// Nom affiché (ex: "Bitcoin")
    pub name: String,

    /// Symbole (ex: "BTC")
    pub symbol: String,

    /// Champs supplémentaires transmis tels quels (prix, rang, etc.)
    /// CONCEPT RUST : #[serde(flatten)]
    /// - Tous les champs JSON non reconnus atterrissent dans cette map
    /// - Ils sont réécrits à l'identique lors de la sérialisation
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CoinRecord {
    /// Crée une coin sans champs supplémentaires
    pub fn new(
        key: impl Into<String>,
        id: impl Into<CoinId>,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            extra: Map::new(),
        }
    }

    /// Construit une coin à partir d'une entrée brute du service
    ///
    /// Fusionne la clé de stockage avec les champs de la valeur. Si la valeur
    /// contient déjà un champ `key`, c'est lui qui l'emporte (même sémantique
    /// qu'un spread `{ key, ...value }`).
    ///
    /// # Erreurs
    /// `StoreError::MalformedRecord` si la valeur n'est pas un objet ou si
    /// `id`, `name` ou `symbol` manquent / ont un mauvais type.
    pub fn from_entry(entry: StoreEntry) -> Result<Self, StoreError> {
        let StoreEntry { key, value } = entry;

        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::malformed(
                    &key,
                    format!("expected a JSON object, got {}", json_kind(&other)),
                ))
            }
        };

        fields
            .entry("key".to_string())
            .or_insert_with(|| Value::String(key.clone()));

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| StoreError::malformed(&key, e.to_string()))
    }

    /// Formatte la coin pour l'affichage : "Bitcoin (BTC)"
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

/// Nom lisible du type d'une valeur JSON (pour les messages d'erreur)
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_entry_merges_key() {
        let entry = StoreEntry::new(
            "coin:bitcoin",
            json!({"id": 1, "name": "Bitcoin", "symbol": "BTC", "rank": 1}),
        );

        let coin = CoinRecord::from_entry(entry).unwrap();
        assert_eq!(coin.key, "coin:bitcoin");
        assert_eq!(coin.id, CoinId::from(1));
        assert_eq!(coin.name, "Bitcoin");
        assert_eq!(coin.extra.get("rank"), Some(&json!(1)));
    }

    #[test]
    fn test_from_entry_value_key_wins() {
        let entry = StoreEntry::new(
            "coin:eth",
            json!({"key": "legacy", "id": "ethereum", "name": "Ethereum", "symbol": "ETH"}),
        );

        let coin = CoinRecord::from_entry(entry).unwrap();
        assert_eq!(coin.key, "legacy");
        assert_eq!(coin.id, CoinId::from("ethereum"));
    }

    #[test]
    fn test_from_entry_rejects_non_object() {
        let err = CoinRecord::from_entry(StoreEntry::new("coin:x", json!([1, 2]))).unwrap_err();
        match err {
            StoreError::MalformedRecord { key, reason } => {
                assert_eq!(key, "coin:x");
                assert!(reason.contains("an array"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_entry_rejects_missing_name() {
        let err = CoinRecord::from_entry(StoreEntry::new("coin:x", json!({"id": 3, "symbol": "X"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord { .. }));
    }

    #[test]
    fn test_numeric_ids_compare_by_value() {
        let float_id: CoinId = serde_json::from_value(json!(1.0)).unwrap();
        assert_eq!(float_id, CoinId::from(1));
        assert_ne!(float_id, CoinId::from(2));

        let mut ids = std::collections::HashSet::new();
        ids.insert(CoinId::from(1));
        assert!(ids.contains(&float_id));
    }

    #[test]
    fn test_number_and_text_ids_differ() {
        assert_ne!(CoinId::from(1), CoinId::from("1"));
        assert_eq!(CoinId::from(1).to_string(), "1");
    }

    #[test]
    fn test_extra_fields_roundtrip_through_json() {
        let mut coin = CoinRecord::new("coin:sol", "solana", "Solana", "SOL");
        coin.extra.insert("price".to_string(), json!(142.5));

        let value = serde_json::to_value(&coin).unwrap();
        assert_eq!(value["price"], json!(142.5));
        assert_eq!(value["key"], json!("coin:sol"));
    }
}
