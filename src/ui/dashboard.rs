// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// ┌──────────────── Coin98 Explorer ────────────────┐
// │ 🔍 Search for a coin...                          │
// ├───────── All Coins ──────┬──────── Favorites ────┤
// │ Bitcoin (BTC)            │ Ethereum (ETH)        │
// │ Ethereum (ETH)           │                       │
// ├──────────────────────────┴───────────────────────┤
// │ raccourcis / confirmation / notification          │
// └──────────────────────────────────────────────────┘
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, List)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, LoadState, Pane};
use crate::models::{CoinRecord, NotificationLevel};

const SEARCH_PLACEHOLDER: &str = "Search for a coin...";

/// Dessine l'interface complète
///
/// # Arguments
/// * `frame` - Surface de dessin ratatui
/// * `app` - État de l'application (lecture seule)
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_search_bar(frame, app, chunks[1]);
    render_lists(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

// ============================================================================
// Layout : Découpage de l'écran
// ============================================================================

/// Crée le layout principal (header, recherche, listes, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Barre de recherche
            Constraint::Min(0),    // Les deux listes
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec() // Convertit Rc<[Rect]> en Vec<Rect>
}

/// Dessine le header avec le titre
fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let title = Line::from(Span::styled(
        "Coin98 Explorer",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(title)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine la barre de recherche
///
/// En mode recherche : bordure verte et curseur clignotant.
/// Sinon : terme courant, ou placeholder grisé.
fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let border = if app.is_searching() { Color::Green } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" 🔍 Search ");

    let mut spans = Vec::new();
    if app.search_term.is_empty() && !app.is_searching() {
        spans.push(Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::styled(app.search_term.as_str(), Style::default().fg(Color::White)));
    }

    if app.is_searching() {
        spans.push(Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

// ============================================================================
// Listes : All Coins | Favorites
// ============================================================================

fn render_lists(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let visible = app.filtered_catalog();
    let catalog_title = if app.search_term.is_empty() {
        format!(" All Coins ({}) ", visible.len())
    } else {
        format!(" All Coins ({}/{}) ", visible.len(), app.catalog.len())
    };

    render_coin_list(
        frame,
        columns[0],
        &catalog_title,
        &visible,
        CoinListState {
            focused: app.focus == Pane::Catalog,
            selected: app.selected_catalog,
            load_state: &app.catalog_state,
            empty_message: if app.catalog.is_empty() {
                "No coins in the store"
            } else {
                "No coin matches the search"
            },
        },
    );

    let favorites: Vec<&CoinRecord> = app.favorites.iter().collect();
    render_coin_list(
        frame,
        columns[1],
        &format!(" ⭐ Favorites ({}) ", favorites.len()),
        &favorites,
        CoinListState {
            focused: app.focus == Pane::Favorites,
            selected: app.selected_favorite,
            load_state: &app.favorites_state,
            empty_message: "No favorites yet",
        },
    );
}

/// Paramètres d'affichage d'une liste de coins
struct CoinListState<'a> {
    focused: bool,
    selected: usize,
    load_state: &'a LoadState,
    empty_message: &'a str,
}

/// Dessine une liste de coins "Nom (SYMBOLE)"
///
/// CONCEPT RUST : Lifetimes
/// - `coins` emprunte les CoinRecord de App, sans copie
fn render_coin_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    coins: &[&CoinRecord],
    state: CoinListState<'_>,
) {
    let border = if state.focused { Color::Yellow } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title.to_string());

    // Message centré : chargement, échec ou liste vide
    let message = match state.load_state {
        LoadState::Loading => Some(("Loading...".to_string(), Color::Gray)),
        LoadState::Failed(error) => Some((format!("Load failed: {}", error), Color::Red)),
        LoadState::Loaded if coins.is_empty() => Some((state.empty_message.to_string(), Color::Gray)),
        LoadState::Loaded => None,
    };

    if let Some((text, color)) = message {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(text, Style::default().fg(color))),
        ])
        .block(block)
        .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = coins
        .iter()
        .map(|coin| ListItem::new(format!(" {}", coin.display())).style(Style::default().fg(Color::White)))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    // CONCEPT RATATUI : StatefulWidget
    // - ListState garde la sélection ET le décalage de défilement
    // - la ligne sélectionnée reste visible même si la liste dépasse la zone
    let mut list_state = ListState::default().with_selected(state.focused.then_some(state.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

// ============================================================================
// Footer : confirmations, notification ou raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let warning = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let blinking_key = Style::default()
        .fg(Color::Red)
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::SLOW_BLINK);
    let key = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);

    let line = if app.is_awaiting_delete_confirmation() {
        let name = app
            .selected_favorite_coin()
            .map(|coin| coin.name.as_str())
            .unwrap_or("?");

        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[d]", blinking_key),
            Span::styled(format!(" again to remove {} from favorites, any other key to cancel ⚠", name), warning),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[q]", blinking_key),
            Span::styled(" again to quit, any other key to cancel ⚠", warning),
        ])
    } else if let Some(toast) = &app.notification {
        let (icon, color) = match toast.level {
            NotificationLevel::Success => ("✓", Color::Green),
            NotificationLevel::Info => ("ℹ", Color::Cyan),
            NotificationLevel::Error => ("✗", Color::Red),
        };
        Line::from(Span::styled(
            format!("{} {}", icon, toast.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
    } else if let (true, Some(message)) = (app.is_loading_data(), &app.loading_message) {
        Line::from(Span::styled(format!("⏳ {}", message), Style::default().fg(Color::Gray)))
    } else if app.is_searching() {
        Line::from(vec![
            Span::styled("[Enter]", key(Color::Green)),
            Span::raw(" Keep filter  "),
            Span::styled("[ESC]", key(Color::Red)),
            Span::raw(" Clear"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key(Color::Yellow)),
            Span::raw(" Quit  "),
            Span::styled("[/]", key(Color::Yellow)),
            Span::raw(" Search  "),
            Span::styled("[Tab]", key(Color::Yellow)),
            Span::raw(" Switch  "),
            Span::styled("[↑↓ / j k]", key(Color::Yellow)),
            Span::raw(" Navigate  "),
            Span::styled("[f]", key(Color::Green)),
            Span::raw(" Favorite  "),
            Span::styled("[d]", key(Color::Red)),
            Span::raw(" Remove  "),
            Span::styled("[r]", key(Color::Yellow)),
            Span::raw(" Reload"),
        ])
    };

    let paragraph = Paragraph::new(line)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::app::AppResult;
    use crate::models::FavoritesList;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_lists_and_toast() {
        let mut app = App::new();
        app.apply(AppResult::CatalogLoaded(vec![
            CoinRecord::new("coin:btc", 1, "Bitcoin", "BTC"),
            CoinRecord::new("coin:eth", 2, "Ethereum", "ETH"),
        ]));
        app.apply(AppResult::FavoriteAdded(
            FavoritesList::new().commit(vec![CoinRecord::new("coin:eth", 2, "Ethereum", "ETH")]),
        ));

        let text = screen_text(&app);
        assert!(text.contains("Coin98 Explorer"));
        assert!(text.contains("Bitcoin (BTC)"));
        assert!(text.contains("Favorites (1)"));
        assert!(text.contains("Added to favorites"));
    }

    #[test]
    fn test_selected_row_stays_visible_in_long_list() {
        let mut app = App::new();
        let coins = (0..30i64)
            .map(|i| CoinRecord::new(format!("coin:c{:02}", i), i, format!("Coin{:02}", i), format!("C{:02}", i)))
            .collect();
        app.apply(AppResult::CatalogLoaded(coins));
        app.apply(AppResult::FavoritesLoaded(FavoritesList::new()));
        for _ in 0..25 {
            app.navigate_down();
        }
        assert_eq!(app.selected_catalog, 25);

        let text = screen_text(&app);
        assert!(text.contains("Coin25 (C25)"));
        assert!(!text.contains("Coin00 (C00)"));
    }

    #[test]
    fn test_render_load_failure() {
        let mut app = App::new();
        app.apply(AppResult::CatalogFailed("backend returned HTTP 503".to_string()));
        app.notification = None;

        let text = screen_text(&app);
        assert!(text.contains("Load failed"));
        assert!(text.contains(SEARCH_PLACEHOLDER));
    }
}
