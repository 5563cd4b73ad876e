// ============================================================================
// Structure : FavoritesList
// ============================================================================
// Snapshot immuable de la liste de favoris
//
// CONCEPTS RUST :
// 1. Immutabilité : une mutation produit une NOUVELLE liste candidate,
//    l'ancienne n'est jamais modifiée en place
// 2. Révision locale : compteur incrémenté à chaque mutation appliquée,
//    permet à l'UI d'ignorer un snapshot plus ancien que celui affiché
// 3. Slices : &[CoinRecord] pour exposer les données sans copie
// ============================================================================

use serde_json::Value;

use crate::error::StoreError;
use crate::models::coin::json_kind;
use crate::models::{CoinId, CoinRecord};

/// Liste ordonnée des favoris (ordre d'insertion = ordre des favoris)
///
/// Les doublons par `id` ne sont pas empêchés à ce niveau.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FavoritesList {
    coins: Vec<CoinRecord>,
    revision: u64,
}

impl FavoritesList {
    /// Liste vide, révision 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Liste chargée depuis le service (révision 0)
    pub fn from_coins(coins: Vec<CoinRecord>) -> Self {
        Self { coins, revision: 0 }
    }

    /// Valide la valeur JSON stockée sous la clé des favoris
    ///
    /// La valeur doit être un tableau de CoinRecord complets (avec `key`).
    /// Une valeur `null` est traitée comme une liste vide.
    pub fn from_value(key: &str, value: Value) -> Result<Self, StoreError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::malformed(
                    key,
                    format!("expected a JSON array, got {}", json_kind(&other)),
                ))
            }
        };

        let coins = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<CoinRecord>(item)
                    .map_err(|e| StoreError::malformed(key, format!("entry {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_coins(coins))
    }

    /// Candidate = liste actuelle + `coin` ajoutée à la fin
    pub fn with_added(&self, coin: CoinRecord) -> Vec<CoinRecord> {
        let mut candidate = self.coins.clone();
        candidate.push(coin);
        candidate
    }

    /// Candidate = liste actuelle sans AUCUNE entrée d'identifiant `id`
    ///
    /// CONCEPT RUST : Iterator filter
    /// - Supprime toutes les occurrences, pas seulement la première,
    ///   puisque les favoris peuvent contenir des doublons
    pub fn without_id(&self, id: &CoinId) -> Vec<CoinRecord> {
        self.coins
            .iter()
            .filter(|coin| &coin.id != id)
            .cloned()
            .collect()
    }

    /// Produit le snapshot suivant après une écriture acquittée
    pub fn commit(&self, coins: Vec<CoinRecord>) -> Self {
        Self {
            coins,
            revision: self.revision + 1,
        }
    }

    pub fn coins(&self) -> &[CoinRecord] {
        &self.coins
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CoinRecord> {
        self.coins.get(index)
    }

    /// Vérifie si une coin d'identifiant `id` est déjà en favori
    pub fn contains(&self, id: &CoinId) -> bool {
        self.coins.iter().any(|coin| &coin.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CoinRecord> {
        self.coins.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bitcoin() -> CoinRecord {
        CoinRecord::new("coin:1", 1, "Bitcoin", "BTC")
    }

    fn ethereum() -> CoinRecord {
        CoinRecord::new("coin:2", 2, "Ethereum", "ETH")
    }

    #[test]
    fn test_with_added_appends_without_touching_snapshot() {
        let list = FavoritesList::from_coins(vec![bitcoin()]);
        let candidate = list.with_added(ethereum());

        assert_eq!(candidate.len(), 2);
        assert_eq!(candidate[1].name, "Ethereum");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_without_id_removes_every_duplicate() {
        let list = FavoritesList::from_coins(vec![bitcoin(), ethereum(), bitcoin()]);
        let candidate = list.without_id(&CoinId::from(1));

        assert_eq!(candidate, vec![ethereum()]);
    }

    #[test]
    fn test_without_id_ignores_storage_key() {
        let mut renamed = bitcoin();
        renamed.key = "coin:other".to_string();
        let list = FavoritesList::from_coins(vec![renamed]);

        assert!(list.without_id(&CoinId::from(1)).is_empty());
    }

    #[test]
    fn test_without_id_matches_float_encoded_id() {
        let value = json!([
            {"key": "coin:1", "id": 1.0, "name": "Bitcoin", "symbol": "BTC"},
            {"key": "coin:2", "id": 2, "name": "Ethereum", "symbol": "ETH"}
        ]);
        let list = FavoritesList::from_value("favorites", value).unwrap();

        let candidate = list.without_id(&CoinId::from(1));
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate[0].name, "Ethereum");
    }

    #[test]
    fn test_commit_bumps_revision() {
        let list = FavoritesList::new();
        let next = list.commit(list.with_added(bitcoin()));

        assert_eq!(list.revision(), 0);
        assert_eq!(next.revision(), 1);
        assert!(next.contains(&CoinId::from(1)));
    }

    #[test]
    fn test_from_value_accepts_stored_array() {
        let value = json!([
            {"key": "coin:1", "id": 1, "name": "Bitcoin", "symbol": "BTC"},
            {"key": "coin:2", "id": 2, "name": "Ethereum", "symbol": "ETH", "rank": 2}
        ]);

        let list = FavoritesList::from_value("favorites", value).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().extra.get("rank"), Some(&json!(2)));
    }

    #[test]
    fn test_from_value_null_is_empty() {
        let list = FavoritesList::from_value("favorites", Value::Null).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_from_value_rejects_object() {
        let err = FavoritesList::from_value("favorites", json!({"id": 1})).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord { .. }));
    }
}
