// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le Store Client (service clé-valeur) et ses
// implémentations : HTTP pour le service distant, mémoire pour le mode
// hors-ligne et les tests
// ============================================================================

pub mod client; // Trait StoreClient + conventions de clés
pub mod http;   // Client HTTP (reqwest)
pub mod memory; // Store en mémoire, persistable dans un fichier JSON

// Re-export des types principaux
pub use client::{StoreClient, COIN_PREFIX, FAVORITES_KEY};
pub use http::HttpStoreClient;
pub use memory::MemoryStore;
