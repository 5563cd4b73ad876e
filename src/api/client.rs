// ============================================================================
// Trait : StoreClient
// ============================================================================
// Abstraction du service clé-valeur distant
//
// CONCEPTS RUST :
// 1. Traits : interface commune à plusieurs backends (HTTP, mémoire)
// 2. async-trait : méthodes async dans un trait (objet Arc<dyn StoreClient>)
// 3. Send + Sync : le client est partagé entre l'UI et le worker thread
//
// Contrat :
// - get / get_with_prefix : Ok(vec![]) signifie "introuvable", jamais Err
// - set : Ok(false) signifie "écriture refusée par le service"
// - Err(_) : panne (réseau, serveur, JSON illisible)
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::StoreEntry;

/// Préfixe des clés du catalogue ("coin:bitcoin", "coin:2", ...)
pub const COIN_PREFIX: &str = "coin:";

/// Clé unique sous laquelle la liste de favoris est stockée
pub const FAVORITES_KEY: &str = "favorites";

/// Client du service clé-valeur
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Récupère le(s) enregistrement(s) d'une clé exacte
    async fn get(&self, key: &str) -> Result<Vec<StoreEntry>, StoreError>;

    /// Récupère tous les enregistrements dont la clé commence par `prefix`
    async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError>;

    /// Écrase la valeur d'une clé ; renvoie si l'écriture a été acceptée
    async fn set(&self, key: &str, value: Value) -> Result<bool, StoreError>;
}
