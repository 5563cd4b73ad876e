// ============================================================================
// Erreurs de la bibliothèque
// ============================================================================
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] génère Display
// - #[from] génère From<T>, ce qui permet d'utiliser ? directement
//
// "Introuvable" n'est PAS une erreur : un get() sans résultat renvoie une
// liste vide. Les erreurs ci-dessous sont toutes des pannes visibles.
// ============================================================================

use thiserror::Error;

/// Erreurs du Store Client et de la validation des enregistrements
#[derive(Debug, Error)]
pub enum StoreError {
    /// Échec réseau (connexion, timeout, lecture du corps)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Le service a répondu avec un statut d'erreur serveur
    #[error("backend returned HTTP {status} for '{key}'")]
    Backend { status: u16, key: String },

    /// Corps JSON illisible ou non sérialisable
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Enregistrement présent mais de forme inattendue
    #[error("malformed record '{key}': {reason}")]
    MalformedRecord { key: String, reason: String },

    /// Lecture/écriture du fichier de persistance locale
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn malformed(key: &str, reason: impl Into<String>) -> Self {
        StoreError::MalformedRecord {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Erreurs d'une mutation de la liste de favoris
#[derive(Debug, Error)]
pub enum FavoritesError {
    /// Le service a refusé l'écriture (set() a renvoyé false)
    #[error("the store rejected the write to '{key}'")]
    WriteRejected { key: String },

    /// Aucun chargement n'a encore réussi : la liste en mémoire n'est pas
    /// celle du service, l'écrire écraserait les favoris existants
    #[error("favorites have not been loaded yet")]
    NotLoaded,

    #[error(transparent)]
    Store(#[from] StoreError),
}
