// ============================================================================
// Coinfolio - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Store Client : HTTP et mémoire
pub mod app;       // État de l'application (reducer)
pub mod catalog;   // Chargement du catalogue "coin:*"
pub mod config;    // Configuration par variables d'environnement
pub mod error;     // StoreError, FavoritesError
pub mod favorites; // Synchronisation de la liste de favoris
pub mod models;    // Structures de données
pub mod search;    // Filtre de recherche par nom
pub mod ui;        // Interface utilisateur
