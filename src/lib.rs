// ============================================================================
// Tokenfolio - Library
// ============================================================================
// Cœur du suivi de portefeuille crypto :
// - api       : client CoinGecko (markets, search, trending)
// - storage   : persistance clé/valeur de la watchlist
// - notify    : signal "last updated" entre Store et vue Portfolio
// - store     : watchlist (init, refresh, ajout, édition, suppression)
// - portfolio : agrégation total / allocation
// - search    : dialogue de recherche (debounce, sélection)
// - app / ui  : état et rendu TUI
// ============================================================================

pub mod api;
pub mod app;
pub mod config;
pub mod models;
pub mod notify;
pub mod portfolio;
pub mod search;
pub mod storage;
pub mod store;
pub mod ui;
