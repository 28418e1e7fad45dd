// ============================================================================
// Structure : App
// ============================================================================
// État global de l'application TUI
//
// CONCEPTS RUST :
// 1. Généricité : App<S> fonctionne avec n'importe quel KeyValueStore
//    (FileStore en production, MemoryStore dans les tests)
// 2. Ownership : l'App possède le Store, la vue Portfolio et le dialogue ;
//    seul le thread UI les modifie, le worker ne fait que du réseau
// 3. Two-step confirmations (quit, delete) comme dans une UI Vim-like
// ============================================================================

use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::MarketsQuery;
use crate::models::{MarketQuote, TokenRow};
use crate::portfolio::PortfolioView;
use crate::search::{SearchDialog, SearchRequest, TrendingRequest};
use crate::storage::KeyValueStore;
use crate::store::WatchlistStore;

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Portfolio + watchlist
    Dashboard,

    /// Saisie des holdings de la ligne sélectionnée
    EditHoldings,

    /// Dialogue d'ajout de tokens (par-dessus le dashboard)
    Search,
}

/// Raison d'un appel `markets` : détermine comment appliquer la réponse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketsPurpose {
    /// Snapshot par défaut (aucune watchlist persistée)
    Initialize,

    /// Rafraîchissement des prix
    Refresh,

    /// Ajout de tokens choisis dans le dialogue
    Add,
}

/// État principal de l'application
pub struct App<S: KeyValueStore> {
    pub running: bool,

    pub store: WatchlistStore<S>,
    pub portfolio: PortfolioView<S>,
    pub search: SearchDialog,

    pub current_screen: Screen,

    /// Index de la ligne sélectionnée, relatif à la page courante
    pub selected_index: usize,

    pub confirm_quit: bool,
    pub confirm_delete: bool,

    /// Chargement du snapshot initial en cours
    pub is_loading: bool,
    pub loading_message: Option<String>,

    /// Buffer de saisie des holdings
    pub input_buffer: String,

    /// Dernier message affiché dans le footer (erreur ou info)
    pub status_message: Option<String>,

    /// Compteur de ticks (animation du spinner)
    pub tick_count: u64,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: WatchlistStore<S>, portfolio: PortfolioView<S>) -> Self {
        Self {
            running: true,
            store,
            portfolio,
            search: SearchDialog::new(),
            current_screen: Screen::Dashboard,
            selected_index: 0,
            confirm_quit: false,
            confirm_delete: false,
            is_loading: false,
            loading_message: None,
            input_buffer: String::new(),
            status_message: None,
            tick_count: 0,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_editing(&self) -> bool {
        self.current_screen == Screen::EditHoldings
    }

    pub fn is_searching(&self) -> bool {
        self.current_screen == Screen::Search
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.store.page_rows().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Ligne sélectionnée dans la page courante
    pub fn selected_row(&self) -> Option<&TokenRow> {
        self.store.page_rows().get(self.selected_index)
    }

    pub fn next_page(&mut self) {
        let before = self.store.pager().page();
        self.store.next_page();
        if self.store.pager().page() != before {
            self.selected_index = 0;
        }
    }

    pub fn previous_page(&mut self) {
        let before = self.store.pager().page();
        self.store.previous_page();
        if self.store.pager().page() != before {
            self.selected_index = 0;
        }
    }

    /// Garde la sélection dans les bornes de la page (la page a pu changer)
    fn clamp_selection(&mut self) {
        let max_index = self.store.page_rows().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    /// Réaligne la sélection après une mutation du Store
    ///
    /// Si la pagination est revenue à une autre page, l'ancien index ne
    /// désigne plus la même ligne : on repart du haut de la page.
    fn realign_selection(&mut self, page_before: usize) {
        if self.store.pager().page() != page_before {
            self.selected_index = 0;
        } else {
            self.clamp_selection();
        }
    }

    // ========================================================================
    // Confirmations two-step
    // ========================================================================

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

    /// Supprime la ligne sélectionnée (après confirmation)
    pub fn delete_selected(&mut self) {
        self.confirm_delete = false;

        // CONCEPT RUST : let-else
        // - Sort tôt si aucune ligne n'est sélectionnée (page vide)
        // - On clone l'id : self.store.remove() emprunte self en mutable
        let Some(id) = self.selected_row().map(|r| r.id.clone()) else {
            return;
        };

        let page_before = self.store.pager().page();
        match self.store.remove(&id) {
            Ok(_) => self.realign_selection(page_before),
            Err(e) => {
                warn!(id = %id, error = ?e, "Failed to remove token");
                self.set_status("Failed to save watchlist.");
            }
        }
    }

    // ========================================================================
    // Chargement et messages
    // ========================================================================

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    // ========================================================================
    // Édition des holdings
    // ========================================================================

    /// Passe la ligne sélectionnée en édition, buffer pré-rempli
    pub fn start_edit(&mut self) {
        let Some((id, holdings)) = self.selected_row().map(|r| (r.id.clone(), r.holdings)) else {
            return;
        };

        self.store.start_edit(&id);
        // Display de f64 : "2" pour 2.0, "0.0512" sinon (pas de zéros superflus)
        self.input_buffer = holdings.to_string();
        self.current_screen = Screen::EditHoldings;
        debug!(id = %id, "Editing holdings");
    }

    pub fn cancel_edit(&mut self) {
        self.store.cancel_edit();
        self.input_buffer.clear();
        self.current_screen = Screen::Dashboard;
    }

    /// Valide la saisie ; reste en édition si la valeur est refusée
    pub fn submit_edit(&mut self) {
        let Some(id) = self.store.editing().map(str::to_string) else {
            self.cancel_edit();
            return;
        };

        // Parsing en deux temps : texte -> f64 ici, puis validation
        // (fini, positif) dans le Store via StoreError
        let holdings = match self.input_buffer.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                self.set_status(format!("Invalid holdings: '{}'", self.input_buffer.trim()));
                return;
            }
        };

        match self.store.edit_holdings(&id, holdings) {
            Ok(_) => {
                self.clear_status();
                self.cancel_edit();
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Holdings edit rejected");
                self.set_status(e.to_string());
            }
        }
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    // ========================================================================
    // Dialogue de recherche
    // ========================================================================

    /// Ouvre le dialogue ; retourne la requête trending à envoyer au worker
    pub fn open_search(&mut self) -> TrendingRequest {
        self.current_screen = Screen::Search;
        self.search.open()
    }

    pub fn close_search(&mut self) {
        self.search.close();
        self.current_screen = Screen::Dashboard;
    }

    /// Valide la sélection ; retourne la requête `markets` des tokens choisis
    pub fn confirm_search(&mut self) -> Option<MarketsQuery> {
        // CONCEPT RUST : opérateur ? sur Option
        // - Rien de sélectionné : None, le dialogue reste ouvert
        let ids = self.search.confirm()?;
        self.current_screen = Screen::Dashboard;
        info!(count = ids.len(), "Adding selected tokens");
        WatchlistStore::<S>::add_query(&ids)
    }

    // ========================================================================
    // Résultats réseau
    // ========================================================================

    /// Démarre un refresh ; None si un refresh est déjà en cours
    pub fn request_refresh(&mut self) -> Option<MarketsQuery> {
        // Single-flight : le flag is_refreshing est posé par begin_refresh()
        // et levé par finish_refresh(), quel que soit le résultat
        if self.store.is_refreshing() {
            debug!("Refresh already in progress, ignoring");
            return None;
        }
        Some(self.store.begin_refresh())
    }

    /// Applique la réponse d'un appel `markets` selon sa raison
    pub fn apply_markets(&mut self, purpose: MarketsPurpose, result: Result<Vec<MarketQuote>>) {
        let page_before = self.store.pager().page();

        // CONCEPT RUST : Result::and_then
        // - Erreur réseau ou erreur de persistance : un seul bras Err
        // - Le Store n'est modifié que si la réponse est Ok
        match purpose {
            MarketsPurpose::Initialize => {
                self.stop_loading();
                match result.and_then(|quotes| self.store.adopt_snapshot(quotes)) {
                    Ok(()) => self.clear_status(),
                    Err(e) => {
                        warn!(error = ?e, "Initial market snapshot failed");
                        self.set_status("Failed to load market data. Press [r] to retry.");
                    }
                }
            }
            MarketsPurpose::Refresh => {
                if let Err(e) = self.store.finish_refresh(result) {
                    warn!(error = ?e, "Refresh failed");
                    self.set_status("Failed to refresh prices.");
                } else {
                    self.clear_status();
                }
            }
            MarketsPurpose::Add => match result.and_then(|quotes| self.store.merge_new_rows(quotes)) {
                Ok(added) => self.set_status(format!("Added {} token(s).", added)),
                Err(e) => {
                    warn!(error = ?e, "Adding tokens failed");
                    self.set_status("Failed to add tokens.");
                }
            },
        }

        self.sync_edit_screen();
        self.realign_selection(page_before);
    }

    /// Quitte l'écran d'édition si le Store a abandonné l'édition
    fn sync_edit_screen(&mut self) {
        if self.is_editing() && self.store.editing().is_none() {
            self.input_buffer.clear();
            self.current_screen = Screen::Dashboard;
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Appelé à chaque itération de la boucle
    ///
    /// Relit le portfolio si besoin et retourne la recherche à lancer
    /// quand le debounce est écoulé.
    pub fn tick(&mut self, now: Instant) -> Option<SearchRequest> {
        // wrapping_add : pas de panic en debug après u64::MAX ticks
        self.tick_count = self.tick_count.wrapping_add(1);

        // Un autre processus a pu réécrire le stockage : la vue relit

        if self.portfolio.poll() {
            debug!("Portfolio view refreshed");
        }

        self.sync_edit_screen();
        self.clamp_selection();
        self.search.poll_debounce(now)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
