// ============================================================================
// Coinfolio - Coin98 Explorer
// ============================================================================
// Programme TUI : catalogue de crypto-monnaies + liste de favoris,
// synchronisés avec un service clé-valeur (distant ou local)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Worker thread + channels : les appels réseau ne bloquent pas l'UI
// 4. Single writer : le worker traite les commandes UNE PAR UNE
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use coinfolio::api::{memory::demo_entries, HttpStoreClient, MemoryStore, StoreClient};
use coinfolio::app::{App, AppCommand, AppResult, FavoriteAction};
use coinfolio::catalog::load_catalog;
use coinfolio::config::{Config, StoreBackend};
use coinfolio::favorites::FavoritesStore;
use coinfolio::ui::{events::EventHandler, render};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/coinfolio/logs/coinfolio.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=coinfolio=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir.clone();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "coinfolio.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // UI et worker dans des threads différents
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinfolio=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_env().context("Configuration invalide")?;

    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(offline = config.is_offline(), "Coinfolio starting up");

    // Runtime du worker : créé ici pour que l'échec soit une erreur propre
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let client = runtime.block_on(connect_store(&config))?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    // - Le worker met à jour l'indicateur de chargement
    // - L'UI lit tout le reste
    let app = Arc::new(Mutex::new(App::new()));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let favorites = Arc::new(FavoritesStore::new(client.clone()));
    spawn_background_worker(runtime, client, favorites, command_rx, result_tx, app.clone());

    // Chargement initial (catalogue + favoris)
    command_tx
        .send(AppCommand::Reload)
        .context("Le worker thread n'a pas démarré")?;

    let events = EventHandler::default();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Construit le Store Client selon la configuration
///
/// Mode hors-ligne : store local persisté, pré-rempli avec un catalogue
/// de démonstration s'il est vide.
async fn connect_store(config: &Config) -> Result<Arc<dyn StoreClient>> {
    match &config.backend {
        StoreBackend::Remote { base_url, timeout } => {
            info!(url = %base_url, ?timeout, "Using remote key-value store");
            println!("🌐 Service : {}", base_url);
            let client: Arc<dyn StoreClient> = Arc::new(
                HttpStoreClient::new(base_url.clone(), *timeout)
                    .context("Échec de la création du client HTTP")?,
            );
            Ok(client)
        }
        StoreBackend::Local { data_file } => {
            info!(path = ?data_file, "Using local key-value store");
            println!("💾 Mode hors-ligne : {}", data_file.display());
            let store = MemoryStore::open(data_file)
                .await
                .with_context(|| format!("Impossible d'ouvrir {}", data_file.display()))?;

            if store.is_empty().await {
                info!("Seeding local store with demo catalog");
                store.seed(demo_entries()).await.context("Échec de l'initialisation du store local")?;
            }

            let client: Arc<dyn StoreClient> = Arc::new(store);
            Ok(client)
        }
    }
}

/// Verrouille l'état partagé, même si un thread a paniqué en le tenant
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui traite les commandes async
// - Une commande à la fois : deux mutations des favoris ne se chevauchent
//   jamais (file d'attente à écrivain unique)
// ============================================================================

/// Worker thread qui exécute les appels au Store Client
///
/// # Arguments
/// * `runtime` - Runtime tokio déplacé dans le thread
/// * `client` - Store Client partagé
/// * `favorites` - Propriétaire de la liste de favoris
/// * `command_rx` - Receiver pour recevoir les commandes
/// * `result_tx` - Sender pour envoyer les résultats
/// * `app` - Accès à l'indicateur de chargement
fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    client: Arc<dyn StoreClient>,
    favorites: Arc<FavoritesStore>,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        // Channel fermé (UI terminée) : recv() échoue et on sort
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let message = match &command {
                AppCommand::Reload => "Loading coins...".to_string(),
                AppCommand::AddFavorite(coin) => format!("Adding {}...", coin.name),
                AppCommand::RemoveFavorite(id) => format!("Removing {}...", id),
            };
            lock_app(&app).start_loading(Some(message));

            let results = runtime.block_on(execute_command(command, client.as_ref(), &favorites));

            lock_app(&app).stop_loading();

            for result in results {
                if result_tx.send(result).is_err() {
                    warn!("UI is gone, dropping worker result");
                }
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande et produit le(s) résultat(s) pour le reducer
async fn execute_command(
    command: AppCommand,
    client: &dyn StoreClient,
    favorites: &FavoritesStore,
) -> Vec<AppResult> {
    match command {
        AppCommand::Reload => {
            // Les deux chargements sont indépendants : en parallèle
            let (catalog, loaded) = tokio::join!(load_catalog(client), favorites.load());

            let catalog = match catalog {
                Ok(coins) => AppResult::CatalogLoaded(coins),
                Err(e) => {
                    error!(error = %e, "Failed to load catalog");
                    AppResult::CatalogFailed(e.to_string())
                }
            };

            let loaded = match loaded {
                Ok(list) => AppResult::FavoritesLoaded(list),
                Err(e) => {
                    error!(error = %e, "Failed to load favorites");
                    AppResult::FavoritesFailed(e.to_string())
                }
            };

            vec![catalog, loaded]
        }

        AppCommand::AddFavorite(coin) => match favorites.add(coin).await {
            Ok(list) => vec![AppResult::FavoriteAdded(list)],
            Err(e) => {
                error!(error = %e, "Failed to add favorite");
                vec![AppResult::FavoriteFailed {
                    action: FavoriteAction::Add,
                    error: e.to_string(),
                }]
            }
        },

        AppCommand::RemoveFavorite(id) => match favorites.remove(&id).await {
            Ok(list) => vec![AppResult::FavoriteRemoved(list)],
            Err(e) => {
                error!(error = %e, "Failed to remove favorite");
                vec![AppResult::FavoriteFailed {
                    action: FavoriteAction::Remove,
                    error: e.to_string(),
                }]
            }
        },
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Appliquer les résultats du worker (reducer)
//   1. Dessiner l'interface (render)
//   2. Traiter un événement (input)
//   3. Mettre à jour l'état (tick)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // 0. RÉSULTATS : vide la file sans bloquer
        loop {
            match result_rx.try_recv() {
                Ok(result) => lock_app(&app).apply(result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| {
            let app_lock = lock_app(&app);
            render(frame, &app_lock);
        })?;

        // 2. INPUT
        match events.next() {
            Ok(event) => {
                let mut app_lock = lock_app(&app);
                handle_event(&mut app_lock, event, &command_tx);
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        lock_app(&app).tick();
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Envoie une commande au worker, en loggant si le worker a disparu
fn send_command(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if let Err(e) = command_tx.send(command) {
        error!(command = ?e.0, "Worker thread is gone, command dropped");
    }
}

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - En mode recherche, les touches sont du texte (même 'q', 'j', 'k')
/// - Hors recherche, ce sont des raccourcis
fn handle_event(app: &mut App, event: coinfolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use coinfolio::ui::events::{
        get_char_from_event, is_backspace_event, is_delete_event, is_down_event, is_enter_event,
        is_escape_event, is_favorite_event, is_quit_event, is_reload_event, is_search_char_event,
        is_search_event, is_tab_event, is_up_event, Event,
    };

    match event {
        // ========================================
        // Mode recherche
        // ========================================
        Event::Key(_) if app.is_searching() && is_escape_event(&event) => {
            debug!("User cleared search");
            app.cancel_search();
        }
        Event::Key(_) if app.is_searching() && is_enter_event(&event) => {
            info!(term = %app.search_term, "User applied search");
            app.finish_search();
        }
        Event::Key(_) if app.is_searching() && is_backspace_event(&event) => {
            app.backspace();
        }
        Event::Key(_) if app.is_searching() && is_search_char_event(&event) => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        // Flèches : on peut naviguer dans les résultats pendant la saisie
        Event::Key(_) if app.is_searching() && is_up_event(&event) => app.navigate_up(),
        Event::Key(_) if app.is_searching() && is_down_event(&event) => app.navigate_down(),
        Event::Key(_) if app.is_searching() => {}

        // ========================================
        // Navigation
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.cancel_delete();
                app.request_quit();
            }
        }

        Event::Key(_) if is_search_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            debug!("User opened search");
            app.start_search();
        }

        Event::Key(_) if is_tab_event(&event) => {
            app.cancel_quit();
            app.toggle_focus();
            debug!(focus = ?app.focus, "User switched pane");
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_down();
        }

        // 'f' ou Enter : ajouter la coin sélectionnée aux favoris
        Event::Key(_) if (is_favorite_event(&event) || is_enter_event(&event)) && app.is_catalog_focused() => {
            app.cancel_quit();
            if !app.ensure_favorites_editable() {
                return;
            }
            if let Some(coin) = app.selected_coin().cloned() {
                info!(id = %coin.id, name = %coin.name, "User added favorite");
                send_command(command_tx, AppCommand::AddFavorite(coin));
            }
        }

        // 'd' deux fois : retirer le favori sélectionné
        Event::Key(_) if is_delete_event(&event) && app.is_favorites_focused() => {
            app.cancel_quit();
            if !app.ensure_favorites_editable() {
                return;
            }
            let Some(id) = app.selected_favorite_coin().map(|coin| coin.id.clone()) else {
                return;
            };

            if app.is_awaiting_delete_confirmation() {
                info!(id = %id, "User confirmed favorite removal");
                app.cancel_delete();
                send_command(command_tx, AppCommand::RemoveFavorite(id));
            } else {
                info!(id = %id, "User requested favorite removal (awaiting confirmation)");
                app.request_delete();
            }
        }

        Event::Key(_) if is_reload_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            info!("User requested reload");
            send_command(command_tx, AppCommand::Reload);
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Toute autre touche : annule les confirmations si actives
            app.cancel_quit();
            app.cancel_delete();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
///
/// Appelé dans main() même en cas d'erreur de l'event loop.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
