// ============================================================================
// Gestion des événements
// ============================================================================
// Événements clavier + ticks réguliers
//
// CONCEPTS RUST :
// 1. Enums avec variants : Key(KeyEvent) ou Tick
// 2. Poll avec timeout : la boucle ne bloque jamais plus de 100 ms
//    (le debounce de la recherche et le polling du portfolio en dépendent)
// 3. Helpers is_*_event : prédicats purs, faciles à tester
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Intervalle maximal entre deux ticks
const TICK_RATE: Duration = Duration::from_millis(100);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (pas d'entrée utilisateur)
    Tick,
}

/// Gestionnaire d'événements
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant au plus TICK_RATE)
    pub fn next(&self) -> Result<Event> {
        if event::poll(TICK_RATE)? {
            match event::read()? {
                // Certains OS envoient Press ET Release : on ne garde que Press
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

// ============================================================================
// Helpers : KeyEvent -> action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' : quitter (confirmation en deux temps)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Ctrl+C : quitter immédiatement
pub fn is_force_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    } else {
        false
    }
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Tab : coche/décoche le token surligné dans le dialogue
pub fn is_toggle_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Tab))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J')))
}

/// Flèches seules (dans le dialogue, j/k sont du texte)
pub fn is_arrow_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up))
}

pub fn is_arrow_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down))
}

/// Page suivante : flèche droite ou 'n'
pub fn is_next_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right | KeyCode::Char('n') | KeyCode::Char('N')))
}

/// Page précédente : flèche gauche ou 'p'
pub fn is_previous_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left | KeyCode::Char('p') | KeyCode::Char('P')))
}

/// 'a' : ouvrir le dialogue d'ajout
pub fn is_add_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('a') | KeyCode::Char('A')))
}

/// 'd' : supprimer (confirmation en deux temps)
pub fn is_delete_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('d') | KeyCode::Char('D')))
}

/// 'e' : éditer les holdings
pub fn is_edit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('e') | KeyCode::Char('E')))
}

/// 'r' : rafraîchir les prix
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Chiffre ou point décimal (saisie des holdings)
pub fn is_numeric_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if c.is_ascii_digit() || c == '.')
}

/// Caractère imprimable (saisie de la recherche), hors raccourcis Ctrl
pub fn is_text_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        !key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char(c) if !c.is_control())
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_force_quit_requires_control() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(is_force_quit_event(&ctrl_c));
        assert!(!is_force_quit_event(&key(KeyCode::Char('c'))));
        assert!(!is_text_char_event(&ctrl_c));
    }

    #[test]
    fn test_paging_keys() {
        assert!(is_next_page_event(&key(KeyCode::Right)));
        assert!(is_next_page_event(&key(KeyCode::Char('n'))));
        assert!(is_previous_page_event(&key(KeyCode::Left)));
        assert!(is_previous_page_event(&key(KeyCode::Char('p'))));
    }

    #[test]
    fn test_numeric_chars() {
        assert!(is_numeric_char_event(&key(KeyCode::Char('7'))));
        assert!(is_numeric_char_event(&key(KeyCode::Char('.'))));
        assert!(!is_numeric_char_event(&key(KeyCode::Char('x'))));
        assert!(!is_numeric_char_event(&key(KeyCode::Char('-'))));
    }

    #[test]
    fn test_text_chars_and_arrows() {
        assert!(is_text_char_event(&key(KeyCode::Char('k'))));
        assert!(is_text_char_event(&key(KeyCode::Char(' '))));
        assert!(!is_arrow_up_event(&key(KeyCode::Char('k'))));
        assert!(is_arrow_up_event(&key(KeyCode::Up)));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('z'))), Some('z'));
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);
    }
}
