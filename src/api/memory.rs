// ============================================================================
// Store en mémoire : MemoryStore
// ============================================================================
// Implémentation locale du StoreClient
// - Mode hors-ligne (pas d'URL de service configurée)
// - Tests des couches supérieures sans réseau
//
// Optionnellement persisté dans un fichier JSON (map clé -> valeur),
// réécrit en entier à chaque set().
//
// CONCEPTS RUST :
// 1. Arc<RwLock<...>> : état partagé, plusieurs lecteurs OU un écrivain
// 2. BTreeMap : clés triées, le scan par préfixe est un simple range()
// 3. tokio::fs : I/O fichier asynchrones
// ============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};

use crate::api::client::{StoreClient, COIN_PREFIX};
use crate::error::StoreError;
use crate::models::StoreEntry;

/// Store clé-valeur en mémoire
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
    file_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Store vide, non persisté
    pub fn new() -> Self {
        Self::default()
    }

    /// Store non persisté pré-rempli
    pub fn with_entries(entries: impl IntoIterator<Item = StoreEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(map)),
            file_path: None,
        }
    }

    /// Ouvre (ou crée) un store persisté dans `path`
    ///
    /// Un fichier absent est créé avec une map vide. Un fichier illisible
    /// est une erreur : on ne l'écrase pas silencieusement.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let map: BTreeMap<String, Value> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = ?file_path, "Creating new local store file");
                let empty = BTreeMap::new();
                fs::write(&file_path, serde_json::to_vec_pretty(&empty)?).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = ?file_path, entries = map.len(), "Local store opened");
        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
            file_path: Some(file_path),
        })
    }

    /// Nombre d'entrées stockées
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insère des entrées d'un coup puis persiste
    pub async fn seed(&self, entries: impl IntoIterator<Item = StoreEntry>) -> Result<(), StoreError> {
        self.update(|map| {
            for entry in entries {
                map.insert(entry.key, entry.value);
            }
        })
        .await
    }

    /// Applique `change` sur une copie, persiste la copie, puis la publie
    ///
    /// Le verrou d'écriture est gardé pendant la sauvegarde : si le fichier
    /// ne peut pas être écrit, la map en mémoire reste celle du disque.
    async fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let mut map = self.inner.write().await;

        let mut next = map.clone();
        change(&mut next);

        if let Some(path) = &self.file_path {
            save(path, &next).await?;
        }

        *map = next;
        Ok(())
    }
}

/// Réécrit le fichier de persistance via un fichier temporaire + rename
///
/// Le rename est atomique : une écriture interrompue ne laisse jamais un
/// fichier tronqué à la place du store.
async fn save(path: &Path, map: &BTreeMap<String, Value>) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(map)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, data).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        warn!(path = ?path, error = %e, "Failed to replace local store file");
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let map = self.inner.read().await;
        Ok(map
            .get(key)
            .map(|value| vec![StoreEntry::new(key, value.clone())])
            .unwrap_or_default())
    }

    async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError> {
        // CONCEPT : range() sur BTreeMap
        // - Démarre à la première clé >= prefix
        // - take_while s'arrête dès qu'une clé ne commence plus par prefix
        let map = self.inner.read().await;
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| StoreEntry::new(key.clone(), value.clone()))
            .collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        self.update(|map| {
            map.insert(key.to_string(), value);
        })
        .await?;
        Ok(true)
    }
}

/// Catalogue de démonstration écrit dans un store local vide
pub fn demo_entries() -> Vec<StoreEntry> {
    let coins = [
        (1, "Bitcoin", "BTC"),
        (2, "Ethereum", "ETH"),
        (3, "Tether", "USDT"),
        (4, "BNB", "BNB"),
        (5, "Solana", "SOL"),
        (6, "XRP", "XRP"),
        (7, "Cardano", "ADA"),
        (8, "Dogecoin", "DOGE"),
        (9, "Coin98", "C98"),
        (10, "Polkadot", "DOT"),
        (11, "Ethereum Classic", "ETC"),
        (12, "Litecoin", "LTC"),
    ];

    coins
        .iter()
        .map(|&(id, name, symbol)| {
            StoreEntry::new(
                format!("{}{}", COIN_PREFIX, symbol.to_lowercase()),
                json!({ "id": id, "name": name, "symbol": symbol }),
            )
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
