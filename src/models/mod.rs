// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod coin;         // CoinRecord + CoinId (fichier coin.rs)
pub mod entry;        // StoreEntry : paire clé/valeur brute
pub mod favorites;    // FavoritesList : snapshot des favoris
pub mod notification; // Notification : toast éphémère

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use coinfolio::models::coin::CoinRecord;
// On peut faire : use coinfolio::models::CoinRecord;
pub use coin::{CoinId, CoinRecord};
pub use entry::StoreEntry;
pub use favorites::FavoritesList;
pub use notification::{Notification, NotificationLevel};
