// ============================================================================
// API Client : service clé-valeur HTTP
// ============================================================================
// Parle au service CRUD distant en HTTP/JSON
//
// Correspondance des appels :
// - get(key)             -> GET {base}/kv/{key}          (404 = introuvable)
// - get_with_prefix(p)   -> GET {base}/kv?prefix={p}     (404 = introuvable)
// - set(key, value)      -> PUT {base}/kv/{key}  body = value
//                           2xx = accepté, 4xx = refusé, 5xx = panne
//
// CONCEPTS RUST :
// 1. async/await : appels réseau non-bloquants
// 2. thiserror + ? : les erreurs reqwest/serde deviennent des StoreError
// 3. #[instrument] : chaque appel a son span avec la clé en contexte
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::api::client::StoreClient;
use crate::error::StoreError;
use crate::models::StoreEntry;

/// Client HTTP du service clé-valeur
///
/// CONCEPT RUST : reqwest::Client est Clone et partage son pool de connexions
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreClient {
    /// Crée un client vers `base_url` avec un timeout par requête
    ///
    /// Une requête qui dépasse `timeout` échoue avec `StoreError::Transport`
    /// au lieu de bloquer l'action indéfiniment.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinfolio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Construit {base}/kv/{key}
    ///
    /// CONCEPT : path_segments_mut encode la clé (les "/" éventuels ne
    /// créent pas de sous-chemin)
    fn key_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("kv").push(key);
        }
        url
    }

    /// Construit {base}/kv?prefix={prefix}
    fn prefix_url(&self, prefix: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("kv");
        }
        url.query_pairs_mut().append_pair("prefix", prefix);
        url
    }

    /// Lit une réponse de type "liste d'entrées"
    ///
    /// - 404, corps vide ou `null` : liste vide (introuvable)
    /// - autre statut d'erreur : StoreError::Backend
    async fn read_entries(response: Response, key: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !status.is_success() {
            error!(status = %status, key = %key, "Store returned error status");
            return Err(StoreError::Backend {
                status: status.as_u16(),
                key: key.to_string(),
            });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let entries: Option<Vec<StoreEntry>> = serde_json::from_slice(&body)?;
        Ok(entries.unwrap_or_default())
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let url = self.key_url(key);
        debug!(url = %url, "Sending GET to store");

        let response = self.client.get(url).send().await?;
        let entries = Self::read_entries(response, key).await?;

        debug!(count = entries.len(), "Store lookup finished");
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let url = self.prefix_url(prefix);
        debug!(url = %url, "Sending prefix GET to store");

        let response = self.client.get(url).send().await?;
        let entries = Self::read_entries(response, prefix).await?;

        debug!(count = entries.len(), "Store prefix scan finished");
        Ok(entries)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        let url = self.key_url(key);
        debug!(url = %url, "Sending PUT to store");

        let response = self.client.put(url).json(&value).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(status = %status, "Store accepted write");
            Ok(true)
        } else if status.is_client_error() {
            warn!(status = %status, "Store rejected write");
            Ok(false)
        } else {
            error!(status = %status, "Store failed to write");
            Err(StoreError::Backend {
                status: status.as_u16(),
                key: key.to_string(),
            })
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// CONCEPT : mini serveur axum lancé sur un port éphémère (127.0.0.1:0)
// ============================================================================
