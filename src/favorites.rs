// ============================================================================
// Favorites Store
// ============================================================================
// Détient la liste de favoris et la synchronise avec le service clé-valeur
//
// Règles :
// - Toute la liste est réécrite à chaque mutation (pas de diff)
// - La copie en mémoire n'est remplacée QU'APRÈS l'acquittement de l'écriture
// - Aucune mutation avant un load() réussi : après un échec de lecture,
//   la liste vide en mémoire n'est pas l'état du service
// - Les mutations sont sérialisées : le verrou est gardé pendant tout le
//   cycle lecture -> construction -> écriture -> application, donc deux
//   ajouts simultanés ne peuvent pas lire la même liste de départ
//
// CONCEPTS RUST :
// 1. tokio::sync::Mutex : verrou qui peut être gardé à travers un .await
//    (contrairement à std::sync::Mutex)
// 2. Arc<dyn StoreClient> : backend interchangeable (HTTP, mémoire, stub)
// 3. Closures FnOnce : add et remove ne diffèrent que par la candidate
// ============================================================================

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::{StoreClient, FAVORITES_KEY};
use crate::error::{FavoritesError, StoreError};
use crate::models::{CoinId, CoinRecord, FavoritesList};

/// Titre de la notification après un ajout réussi
pub const ADDED_TITLE: &str = "Added to favorites";

/// Titre de la notification après une suppression réussie
pub const REMOVED_TITLE: &str = "Removed from favorites";

/// Propriétaire unique de la liste de favoris
///
/// `current` vaut `None` tant qu'aucun `load()` n'a réussi.
pub struct FavoritesStore {
    client: Arc<dyn StoreClient>,
    current: Mutex<Option<FavoritesList>>,
}

impl FavoritesStore {
    /// Crée un store non chargé
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            current: Mutex::new(None),
        }
    }

    /// Dernier snapshot appliqué (liste vide si jamais chargé)
    pub async fn snapshot(&self) -> FavoritesList {
        self.current.lock().await.clone().unwrap_or_default()
    }

    /// Vrai si un `load()` a réussi au moins une fois
    pub async fn is_loaded(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Charge la liste depuis le service
    ///
    /// Si `get("favorites")` renvoie plusieurs entrées, seule la première
    /// est utilisée. Aucun résultat -> liste vide.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<FavoritesList, StoreError> {
        let mut current = self.current.lock().await;

        let entries = self.client.get(FAVORITES_KEY).await?;
        if entries.len() > 1 {
            warn!(count = entries.len(), "Store returned several favorites entries, using the first");
        }

        let loaded = match entries.into_iter().next() {
            Some(entry) => FavoritesList::from_value(&entry.key, entry.value)?,
            None => {
                debug!("No favorites stored yet");
                FavoritesList::new()
            }
        };

        // Nouvelle révision : un rechargement remplace toujours l'affichage
        let base = current.take().unwrap_or_default();
        let list = base.commit(loaded.coins().to_vec());
        info!(favorites = list.len(), revision = list.revision(), "Favorites loaded");

        *current = Some(list.clone());
        Ok(list)
    }

    /// Ajoute `coin` à la fin de la liste et persiste
    #[instrument(skip(self, coin), fields(id = %coin.id, name = %coin.name))]
    pub async fn add(&self, coin: CoinRecord) -> Result<FavoritesList, FavoritesError> {
        self.mutate(|list| list.with_added(coin)).await
    }

    /// Retire TOUTES les entrées d'identifiant `id` et persiste
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn remove(&self, id: &CoinId) -> Result<FavoritesList, FavoritesError> {
        self.mutate(|list| list.without_id(id)).await
    }

    /// Cycle commun : candidate -> set() -> application si acquitté
    ///
    /// En cas de refus ou d'erreur, la liste en mémoire reste inchangée.
    /// Refusé tant que la liste n'a pas été chargée.
    async fn mutate<F>(&self, build: F) -> Result<FavoritesList, FavoritesError>
    where
        F: FnOnce(&FavoritesList) -> Vec<CoinRecord>,
    {
        let mut guard = self.current.lock().await;
        let Some(current) = guard.as_mut() else {
            warn!("Favorites mutation refused, list was never loaded");
            return Err(FavoritesError::NotLoaded);
        };

        let candidate = build(current);
        let value = serde_json::to_value(&candidate).map_err(StoreError::from)?;

        debug!(before = current.len(), after = candidate.len(), "Persisting favorites");
        let accepted = self.client.set(FAVORITES_KEY, value).await?;

        if !accepted {
            warn!("Favorites write rejected, keeping previous list");
            return Err(FavoritesError::WriteRejected {
                key: FAVORITES_KEY.to_string(),
            });
        }

        *current = current.commit(candidate);
        info!(favorites = current.len(), revision = current.revision(), "Favorites updated");
        Ok(current.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::api::MemoryStore;
    use crate::models::StoreEntry;

    /// Backend de test : délai configurable, refus ou panne à la demande
    #[derive(Default)]
    struct ScriptedStore {
        inner: MemoryStore,
        reject_writes: AtomicBool,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        writes: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl StoreClient for ScriptedStore {
        async fn get(&self, key: &str) -> Result<Vec<StoreEntry>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Backend {
                    status: 503,
                    key: key.to_string(),
                });
            }
            self.inner.get(key).await
        }

        async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError> {
            self.inner.get_with_prefix(prefix).await
        }

        async fn set(&self, key: &str, value: Value) -> Result<bool, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;

            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Backend {
                    status: 503,
                    key: key.to_string(),
                });
            }
            if self.reject_writes.load(Ordering::SeqCst) {
                return Ok(false);
            }
            self.inner.set(key, value).await
        }
    }

    fn bitcoin() -> CoinRecord {
        CoinRecord::new("coin:btc", 1, "Bitcoin", "BTC")
    }

    fn ethereum() -> CoinRecord {
        CoinRecord::new("coin:eth", 2, "Ethereum", "ETH")
    }

    #[tokio::test]
    async fn test_load_missing_favorites_is_empty() {
        let store = FavoritesStore::new(Arc::new(MemoryStore::new()));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_twice_is_stable() {
        let backend = MemoryStore::with_entries(vec![StoreEntry::new(
            FAVORITES_KEY,
            json!([{"key": "coin:btc", "id": 1, "name": "Bitcoin", "symbol": "BTC"}]),
        )]);
        let store = FavoritesStore::new(Arc::new(backend));

        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();
        assert_eq!(first.coins(), second.coins());
        assert_eq!(first.coins(), &[bitcoin()]);
    }

    #[tokio::test]
    async fn test_load_malformed_favorites() {
        let backend = MemoryStore::with_entries(vec![StoreEntry::new(FAVORITES_KEY, json!("oops"))]);
        let store = FavoritesStore::new(Arc::new(backend));

        assert!(matches!(
            store.load().await.unwrap_err(),
            StoreError::MalformedRecord { .. }
        ));
    }

    #[tokio::test]
    async fn test_add_accepted_updates_list() {
        let store = FavoritesStore::new(Arc::new(MemoryStore::new()));
        store.load().await.unwrap();

        let list = store.add(bitcoin()).await.unwrap();
        assert_eq!(list.coins(), &[bitcoin()]);
        assert_eq!(store.snapshot().await, list);
    }

    #[tokio::test]
    async fn test_add_then_reload_contains_coin() {
        let backend = Arc::new(MemoryStore::new());
        let store = FavoritesStore::new(backend.clone());
        store.load().await.unwrap();
        store.add(ethereum()).await.unwrap();

        let fresh = FavoritesStore::new(backend);
        let loaded = fresh.load().await.unwrap();
        assert!(loaded.contains(&ethereum().id));
    }

    #[tokio::test]
    async fn test_add_rejected_keeps_list() {
        let backend = Arc::new(ScriptedStore::default());
        backend.reject_writes.store(true, Ordering::SeqCst);
        let store = FavoritesStore::new(backend.clone());
        store.load().await.unwrap();

        let err = store.add(bitcoin()).await.unwrap_err();
        assert!(matches!(err, FavoritesError::WriteRejected { .. }));
        assert!(store.snapshot().await.is_empty());
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_backend_failure_keeps_list() {
        let backend = Arc::new(ScriptedStore::default());
        let store = FavoritesStore::new(backend.clone());
        store.load().await.unwrap();
        store.add(bitcoin()).await.unwrap();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let err = store.add(ethereum()).await.unwrap_err();

        assert!(matches!(err, FavoritesError::Store(StoreError::Backend { status: 503, .. })));
        assert_eq!(store.snapshot().await.coins(), &[bitcoin()]);
    }

    #[tokio::test]
    async fn test_remove_drops_every_duplicate() {
        let backend = Arc::new(MemoryStore::new());
        let store = FavoritesStore::new(backend.clone());
        store.load().await.unwrap();
        store.add(bitcoin()).await.unwrap();
        store.add(ethereum()).await.unwrap();
        store.add(bitcoin()).await.unwrap();

        let list = store.remove(&CoinId::from(1)).await.unwrap();
        assert_eq!(list.coins(), &[ethereum()]);

        let persisted = backend.get(FAVORITES_KEY).await.unwrap();
        assert_eq!(persisted[0].value, serde_json::to_value(vec![ethereum()]).unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_updates() {
        let backend = Arc::new(ScriptedStore {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let store = Arc::new(FavoritesStore::new(backend.clone()));
        store.load().await.unwrap();

        let (a, b) = tokio::join!(store.add(bitcoin()), store.add(ethereum()));
        a.unwrap();
        b.unwrap();

        let fresh = FavoritesStore::new(backend);
        let loaded = fresh.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        // load = révision 1, puis un commit par ajout
        assert_eq!(store.snapshot().await.revision(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_blocks_mutations() {
        let backend = Arc::new(ScriptedStore::default());
        backend
            .inner
            .set(FAVORITES_KEY, serde_json::to_value(vec![bitcoin()]).unwrap())
            .await
            .unwrap();
        backend.fail_reads.store(true, Ordering::SeqCst);
        let store = FavoritesStore::new(backend.clone());

        assert!(store.load().await.is_err());
        assert!(!store.is_loaded().await);

        let err = store.add(ethereum()).await.unwrap_err();
        assert!(matches!(err, FavoritesError::NotLoaded));
        let err = store.remove(&CoinId::from(1)).await.unwrap_err();
        assert!(matches!(err, FavoritesError::NotLoaded));

        // Rien n'a été écrit : Bitcoin est toujours là
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
        let persisted = backend.inner.get(FAVORITES_KEY).await.unwrap();
        assert_eq!(persisted[0].value, serde_json::to_value(vec![bitcoin()]).unwrap());

        // Une fois le service revenu, le chargement débloque les mutations
        backend.fail_reads.store(false, Ordering::SeqCst);
        store.load().await.unwrap();
        let list = store.add(ethereum()).await.unwrap();
        assert_eq!(list.coins(), &[bitcoin(), ethereum()]);
    }
}
