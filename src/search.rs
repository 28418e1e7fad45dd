// ============================================================================
// Dialogue de recherche / sélection de tokens
// ============================================================================
// Machine à états :
//   Closed -> Trending (à l'ouverture, charge la liste "trending")
//          -> Searching (query non vide, après 350 ms de debounce)
//          -> Trending (si la query est vidée)
//
// CONCEPTS RUST :
// 1. Pas de timer ni de thread ici : le temps est passé en paramètre
//    (Instant), la boucle UI appelle poll_debounce() à chaque tick
// 2. Compteurs de génération : un résultat obsolète (query remplacée ou
//    dialogue fermé) est ignoré, sans annuler la requête réseau
// ============================================================================

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::CoinLite;

/// Délai entre la dernière frappe et l'envoi de la recherche
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(350);

pub const TRENDING_ERROR: &str = "Failed to load trending tokens.";
pub const SEARCH_ERROR: &str = "Search failed. Try again.";

/// État visible du dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Trending,
    Searching,
}

/// Requête "trending" à exécuter pour une session d'ouverture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingRequest {
    pub session: u64,
}

/// Requête de recherche à exécuter (après debounce)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub query: String,
}

/// Dialogue d'ajout de tokens
#[derive(Debug, Default)]
pub struct SearchDialog {
    open: bool,

    /// Incrémenté à chaque ouverture
    session: u64,

    /// Incrémenté à chaque changement de query et à la fermeture
    generation: u64,

    query: String,
    trending: Vec<CoinLite>,
    results: Vec<CoinLite>,

    /// Identifiants sélectionnés, dans l'ordre de sélection
    selected: Vec<String>,

    error: Option<String>,
    loading: bool,

    /// Échéance du debounce en cours
    deadline: Option<Instant>,

    /// Ligne surlignée dans la liste visible
    cursor: usize,
}

impl SearchDialog {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Ouverture / fermeture
    // ========================================================================

    /// Ouvre le dialogue (état remis à zéro) ; retourne la requête trending
    pub fn open(&mut self) -> TrendingRequest {
        self.reset();
        self.open = true;
        self.session += 1;
        debug!(session = self.session, "Search dialog opened");
        TrendingRequest {
            session: self.session,
        }
    }

    /// Ferme le dialogue ; tout résultat en vol sera ignoré
    pub fn close(&mut self) {
        self.open = false;
        self.generation += 1;
        self.reset();
        debug!("Search dialog closed");
    }

    fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selected.clear();
        self.error = None;
        self.loading = false;
        self.deadline = None;
        self.cursor = 0;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn phase(&self) -> DialogPhase {
        if !self.open {
            DialogPhase::Closed
        } else if self.query.trim().is_empty() {
            DialogPhase::Trending
        } else {
            DialogPhase::Searching
        }
    }

    // ========================================================================
    // Query et debounce
    // ========================================================================

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Remplace la query ; (re)lance le debounce si elle n'est pas vide
    pub fn set_query(&mut self, query: String, now: Instant) {
        if !self.open {
            return;
        }

        self.query = query;
        self.generation += 1;
        self.cursor = 0;

        if self.query.trim().is_empty() {
            // Retour à la liste trending, aucune requête ne partira
            self.deadline = None;
            self.results.clear();
            self.loading = false;
        } else {
            self.deadline = Some(now + SEARCH_DEBOUNCE);
        }
    }

    pub fn push_char(&mut self, c: char, now: Instant) {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(query, now);
    }

    pub fn backspace(&mut self, now: Instant) {
        let mut query = self.query.clone();
        query.pop();
        self.set_query(query, now);
    }

    /// Retourne la requête de recherche si le debounce est écoulé
    pub fn poll_debounce(&mut self, now: Instant) -> Option<SearchRequest> {
        let deadline = self.deadline?;
        if !self.open || now < deadline {
            return None;
        }

        self.deadline = None;
        self.loading = true;
        self.error = None;
        Some(SearchRequest {
            generation: self.generation,
            query: self.query.clone(),
        })
    }

    // ========================================================================
    // Résultats
    // ========================================================================

    /// Applique la réponse trending si elle concerne la session courante
    pub fn apply_trending(&mut self, request: TrendingRequest, result: Result<Vec<CoinLite>>) -> bool {
        if !self.open || request.session != self.session {
            debug!(session = request.session, "Discarding stale trending result");
            return false;
        }

        match result {
            Ok(coins) => {
                self.trending = coins;
                self.error = None;
            }
            Err(e) => {
                warn!(error = ?e, "Trending request failed");
                self.error = Some(TRENDING_ERROR.to_string());
            }
        }
        true
    }

    /// Applique la réponse de recherche si elle est la plus récente
    pub fn apply_search(&mut self, generation: u64, result: Result<Vec<CoinLite>>) -> bool {
        if !self.open || generation != self.generation {
            debug!(generation, current = self.generation, "Discarding superseded search result");
            return false;
        }

        self.loading = false;
        match result {
            Ok(coins) => {
                self.results = coins;
                self.error = None;
            }
            Err(e) => {
                warn!(error = ?e, "Search request failed");
                self.error = Some(SEARCH_ERROR.to_string());
            }
        }
        self.cursor = 0;
        true
    }

    /// Liste affichée : résultats de recherche, ou trending si query vide
    pub fn visible(&self) -> &[CoinLite] {
        match self.phase() {
            DialogPhase::Searching => &self.results,
            _ => &self.trending,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // ========================================================================
    // Navigation et sélection
    // ========================================================================

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        let max_index = self.visible().len().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(max_index);
    }

    /// Ajoute ou retire un identifiant de la sélection
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    /// Bascule la ligne surlignée
    pub fn toggle_highlighted(&mut self) {
        if let Some(id) = self.visible().get(self.cursor).map(|c| c.id.clone()) {
            self.toggle(&id);
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn can_confirm(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn confirm_label(&self) -> &'static str {
        if self.selected.len() > 1 {
            "Add Tokens"
        } else {
            "Add to Watchlist"
        }
    }

    /// Valide la sélection : retourne les identifiants et ferme le dialogue
    ///
    /// None si rien n'est sélectionné (le dialogue reste ouvert).
    pub fn confirm(&mut self) -> Option<Vec<String>> {
        if !self.open || self.selected.is_empty() {
            return None;
        }

        let ids = std::mem::take(&mut self.selected);
        self.close();
        Some(ids)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    fn coin(id: &str) -> CoinLite {
        CoinLite::new(id.to_string(), id.to_string(), id.to_string())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_open_loads_trending() {
        let mut dialog = SearchDialog::new();
        assert_eq!(dialog.phase(), DialogPhase::Closed);

        let req = dialog.open();
        assert_eq!(dialog.phase(), DialogPhase::Trending);
        assert!(dialog.apply_trending(req, Ok(vec![coin("pepe"), coin("sui")])));
        assert_eq!(dialog.visible().len(), 2);
    }

    #[test]
    fn test_debounce_issues_latest_query_only() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        dialog.open();

        dialog.push_char('e', t0);
        dialog.push_char('t', t0 + ms(100));
        assert_eq!(dialog.phase(), DialogPhase::Searching);
        assert!(dialog.poll_debounce(t0 + ms(400)).is_none());

        let req = dialog.poll_debounce(t0 + ms(450)).unwrap();
        assert_eq!(req.query, "et");
        assert!(dialog.is_loading());
        // Une seule requête par debounce
        assert!(dialog.poll_debounce(t0 + ms(900)).is_none());
    }

    #[test]
    fn test_cleared_query_never_issues_request() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        dialog.open();

        dialog.push_char('b', t0);
        dialog.backspace(t0 + ms(100));
        assert_eq!(dialog.phase(), DialogPhase::Trending);

        assert!(dialog.poll_debounce(t0 + ms(1_000)).is_none());
    }

    #[test]
    fn test_superseded_search_result_is_discarded() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        dialog.open();

        dialog.set_query("bt".into(), t0);
        let first = dialog.poll_debounce(t0 + ms(350)).unwrap();

        dialog.set_query("btc".into(), t0 + ms(400));
        let second = dialog.poll_debounce(t0 + ms(800)).unwrap();

        assert!(!dialog.apply_search(first.generation, Ok(vec![coin("old")])));
        assert!(dialog.apply_search(second.generation, Ok(vec![coin("bitcoin")])));
        assert_eq!(dialog.visible()[0].id, "bitcoin");
        assert!(!dialog.is_loading());
    }

    #[test]
    fn test_results_after_close_are_discarded() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        let trending = dialog.open();
        dialog.set_query("sol".into(), t0);
        let req = dialog.poll_debounce(t0 + ms(350)).unwrap();

        dialog.close();
        assert!(!dialog.apply_search(req.generation, Ok(vec![coin("solana")])));
        assert!(!dialog.apply_trending(trending, Ok(vec![coin("x")])));

        // Une nouvelle session ignore aussi la réponse trending précédente
        let fresh = dialog.open();
        assert!(!dialog.apply_trending(trending, Ok(vec![coin("x")])));
        assert!(dialog.apply_trending(fresh, Ok(vec![coin("y")])));
    }

    #[test]
    fn test_errors_are_reported_inline() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        let trending = dialog.open();

        dialog.apply_trending(trending, Err(anyhow!("503")));
        assert_eq!(dialog.error(), Some(TRENDING_ERROR));

        dialog.set_query("x".into(), t0);
        let req = dialog.poll_debounce(t0 + ms(350)).unwrap();
        assert!(dialog.error().is_none());
        dialog.apply_search(req.generation, Err(anyhow!("timeout")));
        assert_eq!(dialog.error(), Some(SEARCH_ERROR));
        assert!(!dialog.is_loading());
    }

    #[test]
    fn test_selection_and_confirm_resets() {
        let t0 = Instant::now();
        let mut dialog = SearchDialog::new();
        let req = dialog.open();
        dialog.apply_trending(req, Ok(vec![coin("a"), coin("b"), coin("c")]));

        assert!(!dialog.can_confirm());
        assert!(dialog.confirm().is_none());
        assert!(dialog.is_open());

        dialog.toggle_highlighted();
        dialog.cursor_down();
        dialog.cursor_down();
        dialog.toggle_highlighted();
        dialog.toggle("b");
        dialog.toggle("b");
        assert_eq!(dialog.confirm_label(), "Add Tokens");
        dialog.set_query("zz".into(), t0);

        let ids = dialog.confirm().unwrap();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
        assert!(!dialog.is_open());
        assert!(dialog.query().is_empty());
        assert!(dialog.selected().is_empty());
        assert!(dialog.poll_debounce(t0 + ms(1_000)).is_none());
    }
}
