// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal (ratatui + crossterm)
// ============================================================================

pub mod dashboard;     // Rendu principal : portfolio, watchlist, footer
pub mod events;        // Événements clavier et ticks
pub mod format;        // Formatage pur : montants, sparklines, couleurs
pub mod search_dialog; // Overlay d'ajout de tokens

pub use dashboard::render;
pub use events::{Event, EventHandler};
