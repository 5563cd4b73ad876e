// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Reducer : les résultats du worker passent TOUS par App::apply()
//
// PATTERN : flux unidirectionnel
// - L'event loop envoie des AppCommand au worker
// - Le worker renvoie des AppResult
// - apply() est le seul endroit où le catalogue et les favoris changent
// ============================================================================

use chrono::Utc;
use tracing::{debug, warn};

use crate::favorites::{ADDED_TITLE, REMOVED_TITLE};
use crate::models::{CoinId, CoinRecord, FavoritesList, Notification};
use crate::search;

// ============================================================================
// Commandes et résultats échangés avec le worker thread
// ============================================================================

/// Commandes envoyées au worker thread pour exécuter des tâches async
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// (Re)charger le catalogue et les favoris
    Reload,

    /// Ajouter une coin à la fin des favoris
    AddFavorite(CoinRecord),

    /// Retirer toutes les entrées d'un identifiant
    RemoveFavorite(CoinId),
}

/// Type de mutation des favoris (pour les messages d'erreur)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FavoriteAction {
    pub fn label(&self) -> &'static str {
        match self {
            FavoriteAction::Add => "add to favorites",
            FavoriteAction::Remove => "remove from favorites",
        }
    }
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
pub enum AppResult {
    /// Catalogue chargé (éventuellement vide)
    CatalogLoaded(Vec<CoinRecord>),

    /// Échec du chargement du catalogue (distinct de "catalogue vide")
    CatalogFailed(String),

    /// Favoris chargés
    FavoritesLoaded(FavoritesList),

    /// Échec du chargement des favoris
    FavoritesFailed(String),

    /// Écriture acquittée après un ajout
    FavoriteAdded(FavoritesList),

    /// Écriture acquittée après une suppression
    FavoriteRemoved(FavoritesList),

    /// Écriture refusée ou en échec : liste inchangée
    FavoriteFailed { action: FavoriteAction, error: String },
}

// ============================================================================
// Enums d'état
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Navigation dans les deux listes
    Browse,

    /// Saisie du terme de recherche
    /// CONCEPT : Modal input (Vim-like)
    /// - Chaque touche met à jour le filtre en direct
    /// - Enter valide, ESC efface et quitte
    Search,
}

/// Liste ayant le focus clavier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Catalog,
    Favorites,
}

/// État de chargement d'une liste
///
/// "Échec" et "vide" sont deux états différents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Catalogue complet (jamais filtré en place)
    pub catalog: Vec<CoinRecord>,

    /// Dernier snapshot de favoris appliqué
    pub favorites: FavoritesList,

    /// Terme de recherche (jamais persisté)
    pub search_term: String,

    pub current_screen: Screen,
    pub focus: Pane,

    /// Index sélectionné dans le catalogue FILTRÉ
    pub selected_catalog: usize,

    /// Index sélectionné dans les favoris
    pub selected_favorite: usize,

    pub catalog_state: LoadState,
    pub favorites_state: LoadState,

    /// Toast courant (disparaît après 2 secondes)
    pub notification: Option<Notification>,

    /// Two-step quit : première pression de 'q' -> true
    pub confirm_quit: bool,

    /// Two-step delete : première pression de 'd' -> true
    pub confirm_delete: bool,

    /// Indique si une commande est en cours dans le worker
    pub is_loading: bool,

    /// Message affiché pendant le chargement
    pub loading_message: Option<String>,
}

impl App {
    /// Crée une App vide, en attente du premier chargement
    pub fn new() -> Self {
        Self {
            running: true,
            catalog: Vec::new(),
            favorites: FavoritesList::new(),
            search_term: String::new(),
            current_screen: Screen::Browse,
            focus: Pane::Catalog,
            selected_catalog: 0,
            selected_favorite: 0,
            catalog_state: LoadState::Loading,
            favorites_state: LoadState::Loading,
            notification: None,
            confirm_quit: false,
            confirm_delete: false,
            is_loading: false,
            loading_message: None,
        }
    }

    // ========================================================================
    // Reducer
    // ========================================================================

    /// Applique un résultat du worker à l'état
    ///
    /// CONCEPT RUST : match exhaustif
    /// - Le compilateur force à traiter chaque variant de AppResult
    ///
    /// Un snapshot de favoris plus ancien que celui affiché est ignoré.
    pub fn apply(&mut self, result: AppResult) {
        match result {
            AppResult::CatalogLoaded(coins) => {
                debug!(coins = coins.len(), "Applying catalog");
                self.catalog = coins;
                self.catalog_state = LoadState::Loaded;
                self.clamp_selection();
            }
            AppResult::CatalogFailed(error) => {
                self.catalog.clear();
                self.notify(Notification::error(format!("Could not load coins: {}", error)));
                self.catalog_state = LoadState::Failed(error);
                self.clamp_selection();
            }
            AppResult::FavoritesLoaded(list) => {
                if self.accept_snapshot(&list) {
                    self.favorites = list;
                    self.favorites_state = LoadState::Loaded;
                    self.clamp_selection();
                }
            }
            AppResult::FavoritesFailed(error) => {
                self.notify(Notification::error(format!("Could not load favorites: {}", error)));
                self.favorites_state = LoadState::Failed(error);
            }
            AppResult::FavoriteAdded(list) => {
                if self.accept_snapshot(&list) {
                    self.favorites = list;
                    self.favorites_state = LoadState::Loaded;
                    self.clamp_selection();
                    self.notify(Notification::success(ADDED_TITLE));
                }
            }
            AppResult::FavoriteRemoved(list) => {
                if self.accept_snapshot(&list) {
                    self.favorites = list;
                    self.favorites_state = LoadState::Loaded;
                    self.clamp_selection();
                    self.notify(Notification::info(REMOVED_TITLE));
                }
            }
            AppResult::FavoriteFailed { action, error } => {
                self.notify(Notification::error(format!("Could not {}: {}", action.label(), error)));
            }
        }
    }

    /// Vérifie qu'un snapshot n'est pas plus ancien que celui affiché
    fn accept_snapshot(&self, list: &FavoritesList) -> bool {
        if list.revision() < self.favorites.revision() {
            warn!(
                incoming = list.revision(),
                current = self.favorites.revision(),
                "Ignoring stale favorites snapshot"
            );
            return false;
        }
        true
    }

    /// Affiche une notification (remplace la précédente)
    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    // ========================================================================
    // Vues dérivées
    // ========================================================================

    /// Catalogue filtré par le terme de recherche courant
    pub fn filtered_catalog(&self) -> Vec<&CoinRecord> {
        search::filter_refs(&self.catalog, &self.search_term)
    }

    /// Coin sélectionnée dans le catalogue filtré
    pub fn selected_coin(&self) -> Option<&CoinRecord> {
        self.filtered_catalog().get(self.selected_catalog).copied()
    }

    /// Favori sélectionné
    pub fn selected_favorite_coin(&self) -> Option<&CoinRecord> {
        self.favorites.get(self.selected_favorite)
    }

    /// Nombre d'éléments de la liste qui a le focus
    fn focused_len(&self) -> usize {
        match self.focus {
            Pane::Catalog => self.filtered_catalog().len(),
            Pane::Favorites => self.favorites.len(),
        }
    }

    /// Ramène les index dans les bornes après un changement de liste
    fn clamp_selection(&mut self) {
        let catalog_max = self.filtered_catalog().len().saturating_sub(1);
        self.selected_catalog = self.selected_catalog.min(catalog_max);

        let favorites_max = self.favorites.len().saturating_sub(1);
        self.selected_favorite = self.selected_favorite.min(favorites_max);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigue vers le haut dans la liste qui a le focus
    ///
    /// CONCEPT RUST : Saturating arithmetic
    /// - saturating_sub() ne descend pas en dessous de 0
    pub fn navigate_up(&mut self) {
        match self.focus {
            Pane::Catalog => self.selected_catalog = self.selected_catalog.saturating_sub(1),
            Pane::Favorites => self.selected_favorite = self.selected_favorite.saturating_sub(1),
        }
    }

    /// Navigue vers le bas dans la liste qui a le focus
    pub fn navigate_down(&mut self) {
        let max_index = self.focused_len().saturating_sub(1);
        match self.focus {
            Pane::Catalog => self.selected_catalog = (self.selected_catalog + 1).min(max_index),
            Pane::Favorites => self.selected_favorite = (self.selected_favorite + 1).min(max_index),
        }
    }

    /// Bascule le focus entre catalogue et favoris
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Catalog => Pane::Favorites,
            Pane::Favorites => Pane::Catalog,
        };
        self.confirm_delete = false;
    }

    pub fn is_catalog_focused(&self) -> bool {
        self.focus == Pane::Catalog
    }

    pub fn is_favorites_focused(&self) -> bool {
        self.focus == Pane::Favorites
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    /// Entre en mode recherche (le terme courant est conservé)
    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
        self.focus = Pane::Catalog;
    }

    /// Valide la recherche et retourne à la navigation
    pub fn finish_search(&mut self) {
        self.current_screen = Screen::Browse;
    }

    /// Efface le terme et retourne à la navigation
    pub fn cancel_search(&mut self) {
        self.search_term.clear();
        self.current_screen = Screen::Browse;
        self.clamp_selection();
    }

    /// Ajoute un caractère au terme (filtre mis à jour en direct)
    pub fn append_char(&mut self, c: char) {
        self.search_term.push(c);
        self.selected_catalog = 0;
    }

    /// Supprime le dernier caractère du terme
    pub fn backspace(&mut self) {
        self.search_term.pop();
        self.selected_catalog = 0;
    }

    pub fn is_searching(&self) -> bool {
        self.current_screen == Screen::Search
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Fait disparaître la notification expirée.
    pub fn tick(&mut self) {
        let now = Utc::now();
        if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notification = None;
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    /// Vérifie que les favoris peuvent être modifiés
    ///
    /// Tant que la liste n'est pas chargée, la liste affichée n'est pas celle
    /// du service : on refuse et on affiche pourquoi.
    pub fn ensure_favorites_editable(&mut self) -> bool {
        let reason = match &self.favorites_state {
            LoadState::Loaded => return true,
            LoadState::Loading => "Favorites are still loading".to_string(),
            LoadState::Failed(_) => "Favorites unavailable, press [r] to reload".to_string(),
        };

        warn!(state = ?self.favorites_state, "Favorites edit blocked");
        self.cancel_delete();
        self.notify(Notification::error(reason));
        false
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationLevel;

    fn bitcoin() -> CoinRecord {
        CoinRecord::new("coin:btc", 1, "Bitcoin", "BTC")
    }

    fn ethereum() -> CoinRecord {
        CoinRecord::new("coin:eth", 2, "Ethereum", "ETH")
    }

    fn loaded_app() -> App {
        let mut app = App::new();
        app.apply(AppResult::CatalogLoaded(vec![bitcoin(), ethereum()]));
        app.apply(AppResult::FavoritesLoaded(FavoritesList::new()));
        app
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.catalog.is_empty());
        assert_eq!(app.catalog_state, LoadState::Loading);
    }

    #[test]
    fn test_search_filters_catalog() {
        let mut app = loaded_app();
        app.start_search();
        for c in "eth".chars() {
            app.append_char(c);
        }

        let visible = app.filtered_catalog();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, CoinId::from(2));
        assert_eq!(app.selected_coin().map(|c| c.name.as_str()), Some("Ethereum"));

        app.cancel_search();
        assert_eq!(app.filtered_catalog().len(), 2);
        assert!(!app.is_searching());
    }

    #[test]
    fn test_favorite_added_shows_success() {
        let mut app = loaded_app();
        let list = FavoritesList::new().commit(vec![bitcoin()]);

        app.apply(AppResult::FavoriteAdded(list));
        assert_eq!(app.favorites.coins(), &[bitcoin()]);

        let toast = app.notification.as_ref().unwrap();
        assert_eq!(toast.title, ADDED_TITLE);
        assert_eq!(toast.level, NotificationLevel::Success);
    }

    #[test]
    fn test_favorite_failure_keeps_list_and_shows_error() {
        let mut app = loaded_app();
        app.apply(AppResult::FavoriteAdded(FavoritesList::new().commit(vec![bitcoin()])));
        app.notification = None;

        app.apply(AppResult::FavoriteFailed {
            action: FavoriteAction::Add,
            error: "the store rejected the write to 'favorites'".to_string(),
        });

        assert_eq!(app.favorites.coins(), &[bitcoin()]);
        let toast = app.notification.as_ref().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert!(toast.title.starts_with("Could not add to favorites"));
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let mut app = loaded_app();
        let first = FavoritesList::new().commit(vec![bitcoin()]);
        let second = first.commit(vec![bitcoin(), ethereum()]);

        app.apply(AppResult::FavoriteAdded(second.clone()));
        app.apply(AppResult::FavoriteAdded(first));

        assert_eq!(app.favorites, second);
    }

    #[test]
    fn test_removed_clamps_selection() {
        let mut app = loaded_app();
        let two = FavoritesList::new().commit(vec![bitcoin(), ethereum()]);
        app.apply(AppResult::FavoriteAdded(two.clone()));
        app.toggle_focus();
        app.navigate_down();
        assert_eq!(app.selected_favorite, 1);

        app.apply(AppResult::FavoriteRemoved(two.commit(vec![bitcoin()])));
        assert_eq!(app.selected_favorite, 0);
        assert_eq!(app.notification.as_ref().unwrap().title, REMOVED_TITLE);
    }

    #[test]
    fn test_catalog_failure_is_not_empty_state() {
        let mut app = App::new();
        app.apply(AppResult::CatalogFailed("transport error".to_string()));

        assert_eq!(app.catalog_state, LoadState::Failed("transport error".to_string()));
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Error);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut app = loaded_app();
        app.navigate_up();
        assert_eq!(app.selected_catalog, 0);

        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_catalog, 1);

        // Favoris vides : reste à 0
        app.toggle_focus();
        app.navigate_down();
        assert_eq!(app.selected_favorite, 0);
        assert!(app.selected_favorite_coin().is_none());
    }

    #[test]
    fn test_favorites_edit_blocked_until_loaded() {
        let mut app = App::new();
        app.apply(AppResult::CatalogLoaded(vec![bitcoin()]));
        assert!(!app.ensure_favorites_editable());

        app.apply(AppResult::FavoritesFailed("backend returned HTTP 503".to_string()));
        app.notification = None;
        assert!(!app.ensure_favorites_editable());
        let toast = app.notification.as_ref().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert!(toast.title.contains("reload"));

        app.apply(AppResult::FavoritesLoaded(FavoritesList::new().commit(vec![bitcoin()])));
        app.notification = None;
        assert!(app.ensure_favorites_editable());
        assert!(app.notification.is_none());
    }

    #[test]
    fn test_tick_expires_notification() {
        let mut app = App::new();
        let mut toast = Notification::success(ADDED_TITLE);
        toast.created_at = Utc::now() - chrono::Duration::seconds(3);
        app.notify(toast);

        app.tick();
        assert!(app.notification.is_none());
    }
}
