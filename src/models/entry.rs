// ============================================================================
// Structure : StoreEntry
// ============================================================================
// Une paire clé/valeur telle que renvoyée par le service clé-valeur
// (get / get_with_prefix). La valeur reste du JSON brut : c'est aux
// couches supérieures (catalogue, favoris) de la valider.
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entrée brute du service clé-valeur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    /// Clé de stockage (ex: "coin:bitcoin", "favorites")
    pub key: String,

    /// Valeur JSON associée
    pub value: Value,
}

impl StoreEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
