// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// ============================================================================

pub mod coin;      // Résultats de recherche / trending (fichier coin.rs)
pub mod token_row; // Lignes de la watchlist (fichier token_row.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use tokenfolio::models::token_row::TokenRow;
// On peut faire : use tokenfolio::models::TokenRow;
pub use coin::CoinLite;
pub use token_row::{MarketQuote, Sparkline, TokenRow};
