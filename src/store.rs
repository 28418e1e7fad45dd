// ============================================================================
// Watchlist Store
// ============================================================================
// Collection ordonnée des lignes de la watchlist :
// - fusionne les données de marché avec les holdings locaux
// - dérive `value` pour chaque ligne
// - écrit dans le stockage après CHAQUE mutation, puis publie "last updated"
//
// CONCEPTS RUST :
// 1. Generics : WatchlistStore<S: KeyValueStore>
// 2. Commit atomique : on construit la nouvelle liste, on la persiste,
//    puis seulement on remplace la liste en mémoire (pas d'écriture partielle)
// 3. Opérations en deux moitiés : la partie réseau peut tourner ailleurs
//    (worker thread) pendant que le thread UI garde le Store
// ============================================================================

use std::collections::HashSet;
use std::ops::Range;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{MarketDataClient, MarketsQuery};
use crate::models::{MarketQuote, TokenRow};
use crate::notify::UpdateNotifier;
use crate::storage::{KeyValueStore, WatchlistStorage};

/// Holdings minimum assignés aléatoirement
pub const MIN_HOLDING: f64 = 0.05;

/// Holdings maximum assignés aléatoirement
pub const MAX_HOLDING: f64 = 400.0;

/// Nombre de lignes par page
pub const PAGE_SIZE: usize = 10;

/// Taille du snapshot initial (top N par capitalisation)
pub const DEFAULT_MARKET_COUNT: usize = 100;

/// Erreurs de validation des mutations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("les holdings doivent être un nombre fini et positif (reçu {0})")]
    InvalidHoldings(f64),
}

/// Tire une quantité aléatoire dans [MIN_HOLDING, MAX_HOLDING], arrondie à 4 décimales
pub fn random_holdings() -> f64 {
    let raw = rand::rng().random_range(MIN_HOLDING..=MAX_HOLDING);
    ((raw * 10_000.0).round() / 10_000.0).clamp(MIN_HOLDING, MAX_HOLDING)
}

// ============================================================================
// Pager : vue paginée (pure, n'affecte pas le stockage)
// ============================================================================

/// Pagination 1-indexée sur la collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Page courante (commence à 1)
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Nombre total de pages (au moins 1, même si la liste est vide)
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    pub fn has_next(&self, len: usize) -> bool {
        self.page < self.total_pages(len)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn next(&mut self, len: usize) {
        self.page = (self.page + 1).min(self.total_pages(len));
    }

    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Indices de la page courante dans la collection
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    /// "1–10 of 42 results"
    pub fn results_label(&self, len: usize) -> String {
        let range = self.range(len);
        let first = if len == 0 { 0 } else { range.start + 1 };
        format!("{}–{} of {} results", first, range.end, len)
    }

    /// "1 of 5 pages"
    pub fn pages_label(&self, len: usize) -> String {
        format!("{} of {} pages", self.page, self.total_pages(len))
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

// ============================================================================
// WatchlistStore
// ============================================================================

/// Store de la watchlist
pub struct WatchlistStore<S: KeyValueStore> {
    rows: Vec<TokenRow>,
    storage: WatchlistStorage<S>,
    notifier: UpdateNotifier,
    pager: Pager,

    /// Ligne en cours d'édition (identifiant)
    editing: Option<String>,

    /// Rafraîchissement des prix en cours
    refreshing: bool,

    /// Taille du snapshot par défaut
    default_count: usize,
}

impl<S: KeyValueStore> WatchlistStore<S> {
    /// Crée un Store vide (appeler `initialize` ou `hydrate_from_storage` ensuite)
    pub fn new(storage: WatchlistStorage<S>, notifier: UpdateNotifier) -> Self {
        Self {
            rows: Vec::new(),
            storage,
            notifier,
            pager: Pager::default(),
            editing: None,
            refreshing: false,
            default_count: DEFAULT_MARKET_COUNT,
        }
    }

    /// Change la taille du snapshot par défaut (au moins 1)
    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count.max(1);
        self
    }

    // ========================================================================
    // Lecture
    // ========================================================================

    pub fn rows(&self) -> &[TokenRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TokenRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    // ========================================================================
    // Pagination et édition en cours
    // ========================================================================

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Lignes de la page courante
    pub fn page_rows(&self) -> &[TokenRow] {
        &self.rows[self.pager.range(self.rows.len())]
    }

    pub fn next_page(&mut self) {
        self.pager.next(self.rows.len());
    }

    pub fn previous_page(&mut self) {
        self.pager.previous();
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Marque une ligne comme "en cours d'édition" (si elle existe)
    pub fn start_edit(&mut self, id: &str) {
        if self.contains(id) {
            self.editing = Some(id.to_string());
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    // ========================================================================
    // Initialisation
    // ========================================================================

    /// Adopte la watchlist persistée si elle existe et n'est pas vide
    ///
    /// Retourne false si un fetch du snapshot par défaut est nécessaire.
    pub fn hydrate_from_storage(&mut self) -> bool {
        let rows: Vec<TokenRow> = self.storage.load();
        if rows.is_empty() {
            debug!("No persisted watchlist, default snapshot required");
            return false;
        }

        info!(rows = rows.len(), "Hydrated watchlist from storage");
        self.rows = rows;
        self.reset_view();
        true
    }

    /// Requête du snapshot par défaut
    pub fn default_query(&self) -> MarketsQuery {
        MarketsQuery::top(self.default_count)
    }

    /// Remplace toute la collection par un snapshot frais (holdings aléatoires)
    pub fn adopt_snapshot(&mut self, quotes: Vec<MarketQuote>) -> Result<()> {
        // CONCEPT RUST : HashSet::insert retourne false si déjà présent
        // - filter() garde donc la première occurrence de chaque id
        // - les holdings viennent de l'ancienne ligne (self.get emprunte
        //   self en lecture, la collection n'est remplacée qu'au commit)
        let mut seen = HashSet::new();
        let next: Vec<TokenRow> = quotes
            .into_iter()
            .filter(|q| seen.insert(q.id.clone()))
            .map(|q| q.into_row(random_holdings()))
            .collect();

        info!(rows = next.len(), "Adopting fresh market snapshot");
        self.commit(next)?;
        self.reset_view();
        self.announce();
        Ok(())
    }

    /// Hydrate depuis le stockage, sinon fetch le top 100 du marché
    pub async fn initialize(&mut self, client: &dyn MarketDataClient) -> Result<()> {
        if self.hydrate_from_storage() {
            return Ok(());
        }

        let quotes = client.markets(&self.default_query()).await?;
        self.adopt_snapshot(quotes)
    }

    // ========================================================================
    // Refresh des prix
    // ========================================================================

    /// Début d'un refresh : active le flag busy et retourne la requête
    ///
    /// Liste vide : même requête que l'initialisation.
    pub fn begin_refresh(&mut self) -> MarketsQuery {
        self.refreshing = true;
        // Le découpage en lots de 250 ids est fait par le client API
        if self.rows.is_empty() {
            self.default_query()
        } else {
            let ids: Vec<String> = self.rows.iter().map(|r| r.id.clone()).collect();
            MarketsQuery::for_ids(&ids)
        }
    }

    /// Fin d'un refresh : le flag busy est désactivé quel que soit le résultat
    ///
    /// En cas d'erreur, la collection et le stockage restent intacts.
    pub fn finish_refresh(&mut self, result: Result<Vec<MarketQuote>>) -> Result<()> {
        self.refreshing = false;

        let quotes = match result {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(error = ?e, "Price refresh failed, keeping previous watchlist");
                return Err(e);
            }
        };

        if self.rows.is_empty() {
            return self.adopt_snapshot(quotes);
        }

        let mut seen = HashSet::new();
        let next: Vec<TokenRow> = quotes
            .into_iter()
            .filter(|q| seen.insert(q.id.clone()))
            .map(|q| {
                let holdings = match self.get(&q.id) {
                    Some(prev) => prev.holdings,
                    None => {
                        warn!(id = %q.id, "Refreshed token had no previous holdings");
                        random_holdings()
                    }
                };
                q.into_row(holdings)
            })
            .collect();

        info!(rows = next.len(), "Prices refreshed");
        self.commit(next)?;
        self.announce();
        Ok(())
    }

    /// Rafraîchit les prix de tous les tokens détenus
    pub async fn refresh_prices(&mut self, client: &dyn MarketDataClient) -> Result<()> {
        let query = self.begin_refresh();
        let result = client.markets(&query).await;
        self.finish_refresh(result)
    }

    // ========================================================================
    // Ajout de tokens
    // ========================================================================

    /// Requête pour les tokens à ajouter (None si rien à demander)
    pub fn add_query(ids: &[String]) -> Option<MarketsQuery> {
        if ids.is_empty() {
            None
        } else {
            Some(MarketsQuery::for_ids(ids))
        }
    }

    /// Ajoute les tokens fetchés qui ne sont pas déjà présents
    ///
    /// Les nouveaux tokens sont ajoutés à la fin, dans l'ordre de la réponse.
    /// Retourne le nombre de tokens réellement ajoutés.
    pub fn merge_new_rows(&mut self, quotes: Vec<MarketQuote>) -> Result<usize> {
        // Les ids déjà suivis sont "connus" d'avance : un token présent
        // garde ses holdings, un doublon dans la réponse est ignoré
        let mut known: HashSet<String> = self.rows.iter().map(|r| r.id.clone()).collect();

        // Travail sur une copie : en cas d'échec de persistance,
        // self.rows reste intact
        let mut next = self.rows.clone();
        next.extend(
            quotes
                .into_iter()
                .filter(|q| known.insert(q.id.clone()))
                .map(|q| q.into_row(random_holdings())),
        );

        let added = next.len() - self.rows.len();
        info!(added, total = next.len(), "Merging new tokens into watchlist");

        self.commit(next)?;
        self.announce();
        Ok(added)
    }

    /// Fetch puis ajoute les tokens demandés (ajout idempotent)
    pub async fn add_tokens(&mut self, client: &dyn MarketDataClient, ids: &[String]) -> Result<usize> {
        let Some(query) = Self::add_query(ids) else {
            return Ok(0);
        };

        let quotes = client.markets(&query).await?;
        self.merge_new_rows(quotes)
    }

    // ========================================================================
    // Édition / suppression
    // ========================================================================

    /// Remplace les holdings d'une ligne (et sa valeur)
    ///
    /// Retourne Ok(false) si l'identifiant est absent (no-op).
    pub fn edit_holdings(&mut self, id: &str, holdings: f64) -> Result<bool> {
        if !holdings.is_finite() || holdings < 0.0 {
            return Err(StoreError::InvalidHoldings(holdings).into());
        }

        let Some(index) = self.rows.iter().position(|r| r.id == id) else {
            debug!(id, "Edit on unknown token ignored");
            return Ok(false);
        };

        // set_holdings recalcule value dans le même appel
        let mut next = self.rows.clone();
        next[index].set_holdings(holdings);

        info!(id, holdings, "Holdings updated");
        self.commit(next)?;
        self.editing = None;
        self.announce();
        Ok(true)
    }

    /// Supprime une ligne ; Ok(false) si l'identifiant est absent
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if !self.contains(id) {
            debug!(id, "Remove on unknown token ignored");
            return Ok(false);
        }

        let next: Vec<TokenRow> = self.rows.iter().filter(|r| r.id != id).cloned().collect();

        info!(id, remaining = next.len(), "Token removed from watchlist");
        self.commit(next)?;
        self.announce();
        Ok(true)
    }

    // ========================================================================
    // Helpers internes
    // ========================================================================

    /// Persiste `next` puis l'adopte ; si la taille change, la vue est remise
    /// à zéro (page 1, pas d'édition en cours)
    fn commit(&mut self, next: Vec<TokenRow>) -> Result<()> {
        // Write-through : le disque d'abord, la mémoire ensuite
        // (le ? sort avant toute modification de self)
        self.storage.save(&next)?;

        let size_changed = next.len() != self.rows.len();
        self.rows = next;
        if size_changed {
            self.reset_view();
        }
        Ok(())
    }

    fn reset_view(&mut self) {
        self.pager.reset();
        self.editing = None;
    }

    fn announce(&self) {
        self.notifier.update_time(Utc::now());
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::models::token_row::sample_row;
    use crate::models::{CoinLite, Sparkline};
    use crate::storage::{MemoryStore, WATCHLIST_KEY};

    pub(crate) fn quote(id: &str, price: f64) -> MarketQuote {
        MarketQuote {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id.to_string(),
            image: String::new(),
            current_price: price,
            price_change_percentage_24h: Some(0.5),
            sparkline_in_7d: Sparkline::new(vec![price, price]),
        }
    }

    /// Faux client : répond avec un univers de quotes fixe
    pub(crate) struct FakeClient {
        universe: Vec<MarketQuote>,
        fail: bool,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_query: Mutex<Option<MarketsQuery>>,
    }

    impl FakeClient {
        pub(crate) fn new(universe: Vec<MarketQuote>) -> Self {
            Self {
                universe,
                fail: false,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Vec::new())
            }
        }
    }

    #[async_trait]
    impl MarketDataClient for FakeClient {
        async fn search(&self, _query: &str) -> Result<Vec<CoinLite>> {
            Ok(Vec::new())
        }

        async fn trending(&self) -> Result<Vec<CoinLite>> {
            Ok(Vec::new())
        }

        async fn markets(&self, query: &MarketsQuery) -> Result<Vec<MarketQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            if self.fail {
                return Err(anyhow!("network down"));
            }

            let quotes = match &query.ids {
                Some(ids) => self
                    .universe
                    .iter()
                    .filter(|q| ids.contains(&q.id))
                    .cloned()
                    .collect(),
                None => self.universe.iter().take(query.per_page).cloned().collect(),
            };
            Ok(quotes)
        }
    }

    fn universe(n: usize) -> Vec<MarketQuote> {
        (0..n).map(|i| quote(&format!("coin-{}", i), 1.0 + i as f64)).collect()
    }

    fn store_with(rows: Vec<TokenRow>) -> (WatchlistStore<MemoryStore>, MemoryStore) {
        let mem = MemoryStore::new();
        let storage = WatchlistStorage::new(mem.clone());
        storage.save(&rows).unwrap();
        let mut store = WatchlistStore::new(storage, UpdateNotifier::new());
        store.hydrate_from_storage();
        (store, mem)
    }

    fn persisted(mem: &MemoryStore) -> Vec<TokenRow> {
        WatchlistStorage::new(mem.clone()).load()
    }

    fn btc_eth() -> Vec<TokenRow> {
        vec![sample_row("btc", 2.0, 50_000.0), sample_row("eth", 10.0, 2_000.0)]
    }

    #[test]
    fn test_random_holdings_in_range() {
        for _ in 0..1_000 {
            let h = random_holdings();
            assert!((MIN_HOLDING..=MAX_HOLDING).contains(&h));
            assert_eq!((h * 10_000.0).round() / 10_000.0, h);
        }
    }

    #[tokio::test]
    async fn test_initialize_adopts_persisted_rows() {
        let (mut store, _mem) = store_with(btc_eth());
        let client = FakeClient::new(universe(5));

        store.initialize(&client).await.unwrap();
        assert_eq!(store.rows(), btc_eth().as_slice());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_with_malformed_storage_fetches_snapshot() {
        let mem = MemoryStore::new();
        mem.set(WATCHLIST_KEY, "not json at all").unwrap();
        let mut store = WatchlistStore::new(WatchlistStorage::new(mem.clone()), UpdateNotifier::new());
        let client = FakeClient::new(universe(150));

        store.initialize(&client).await.unwrap();

        assert_eq!(store.len(), DEFAULT_MARKET_COUNT);
        let query = client.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query, MarketsQuery::top(DEFAULT_MARKET_COUNT));
        for row in store.rows() {
            assert!((MIN_HOLDING..=MAX_HOLDING).contains(&row.holdings));
            assert_eq!(row.value, Some(row.holdings * row.current_price));
        }
        assert_eq!(persisted(&mem), store.rows());
    }

    #[tokio::test]
    async fn test_initialize_uses_configured_count() {
        let store = WatchlistStore::new(WatchlistStorage::new(MemoryStore::new()), UpdateNotifier::new());
        let mut store = store.with_default_count(7);
        let client = FakeClient::new(universe(50));

        store.initialize(&client).await.unwrap();
        assert_eq!(store.len(), 7);
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_store_empty() {
        let mem = MemoryStore::new();
        let mut store = WatchlistStore::new(WatchlistStorage::new(mem.clone()), UpdateNotifier::new());

        assert!(store.initialize(&FakeClient::failing()).await.is_err());
        assert!(store.is_empty());
        assert!(mem.get(WATCHLIST_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_tokens_skips_existing_ids() {
        let (mut store, mem) = store_with(btc_eth());
        let client = FakeClient::new(vec![quote("btc", 60_000.0), quote("sol", 150.0), quote("ada", 0.5)]);
        let mut updates = store.notifier().subscribe();

        let ids = vec!["btc".to_string(), "sol".to_string(), "ada".to_string()];
        let added = store.add_tokens(&client, &ids).await.unwrap();

        assert_eq!(added, 2);
        let ids: Vec<&str> = store.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["btc", "eth", "sol", "ada"]);
        // La ligne existante garde ses holdings et son prix
        assert_eq!(store.get("btc").unwrap().holdings, 2.0);
        assert_eq!(store.get("btc").unwrap().current_price, 50_000.0);
        assert_eq!(persisted(&mem).len(), 4);
        assert!(updates.take_changed());
    }

    #[tokio::test]
    async fn test_add_tokens_empty_ids_is_noop() {
        let (mut store, _mem) = store_with(btc_eth());
        let client = FakeClient::new(universe(3));

        assert_eq!(store.add_tokens(&client, &[]).await.unwrap(), 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_add_tokens_failure_keeps_state() {
        let (mut store, mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        let result = store.add_tokens(&FakeClient::failing(), &["sol".to_string()]).await;
        assert!(result.is_err());
        assert_eq!(store.rows(), btc_eth().as_slice());
        assert_eq!(persisted(&mem), btc_eth());
        assert!(!updates.take_changed());
    }

    #[test]
    fn test_merge_deduplicates_within_batch() {
        let (mut store, _mem) = store_with(btc_eth());
        let added = store
            .merge_new_rows(vec![quote("sol", 1.0), quote("sol", 2.0)])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_preserves_holdings() {
        let (mut store, mem) = store_with(btc_eth());
        let client = FakeClient::new(vec![quote("eth", 3_000.0), quote("btc", 60_000.0), quote("doge", 0.1)]);

        store.refresh_prices(&client).await.unwrap();

        let query = client.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.per_page, 2);
        assert_eq!(query.ids, Some(vec!["btc".to_string(), "eth".to_string()]));

        let btc = store.get("btc").unwrap();
        assert_eq!(btc.holdings, 2.0);
        assert_eq!(btc.value, Some(120_000.0));
        assert_eq!(store.get("eth").unwrap().value, Some(30_000.0));
        assert!(!store.contains("doge"));
        assert!(!store.is_refreshing());
        assert_eq!(persisted(&mem), store.rows());
    }

    #[test]
    fn test_refresh_and_snapshot_announce_update() {
        let (mut store, _mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        store.begin_refresh();
        store.finish_refresh(Err(anyhow!("timeout"))).unwrap_err();
        assert!(!updates.take_changed());

        store.begin_refresh();
        store.finish_refresh(Ok(vec![quote("btc", 1.0), quote("eth", 1.0)])).unwrap();
        assert!(updates.take_changed());

        let mut empty = WatchlistStore::new(WatchlistStorage::new(MemoryStore::new()), UpdateNotifier::new());
        let mut snapshot_updates = empty.notifier().subscribe();
        empty.adopt_snapshot(vec![quote("sol", 150.0)]).unwrap();
        assert!(snapshot_updates.take_changed());
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_busy_flag() {
        let (mut store, mem) = store_with(btc_eth());

        let query = store.begin_refresh();
        assert!(store.is_refreshing());
        assert_eq!(query.per_page, 2);

        let result = store.finish_refresh(Err(anyhow!("timeout")));
        assert!(result.is_err());
        assert!(!store.is_refreshing());
        assert_eq!(store.rows(), btc_eth().as_slice());
        assert_eq!(persisted(&mem), btc_eth());
    }

    #[tokio::test]
    async fn test_refresh_on_empty_store_fetches_default_snapshot() {
        let mem = MemoryStore::new();
        let mut store = WatchlistStore::new(WatchlistStorage::new(mem), UpdateNotifier::new());
        let client = FakeClient::new(universe(20));

        store.refresh_prices(&client).await.unwrap();
        assert_eq!(store.len(), 20);
        let query = client.last_query.lock().unwrap().clone().unwrap();
        assert!(query.ids.is_none());
    }

    #[test]
    fn test_edit_holdings_is_idempotent() {
        let (mut store, mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        assert!(store.edit_holdings("eth", 5.0).unwrap());
        let once = store.rows().to_vec();
        assert!(store.edit_holdings("eth", 5.0).unwrap());

        assert_eq!(store.rows(), once.as_slice());
        assert_eq!(store.get("eth").unwrap().value, Some(10_000.0));
        // L'ordre et les autres lignes ne bougent pas
        assert_eq!(store.rows()[0], btc_eth()[0]);
        assert_eq!(persisted(&mem), once);
        assert!(updates.take_changed());
    }

    #[test]
    fn test_edit_holdings_unknown_or_invalid() {
        let (mut store, _mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        assert!(!store.edit_holdings("doge", 1.0).unwrap());
        assert!(!updates.take_changed());

        let err = store.edit_holdings("btc", -1.0).unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::InvalidHoldings(-1.0)));
        assert!(store.edit_holdings("btc", f64::INFINITY).is_err());
        assert_eq!(store.get("btc").unwrap().holdings, 2.0);
    }

    #[test]
    fn test_edit_clears_edit_in_progress() {
        let (mut store, _mem) = store_with(btc_eth());
        store.start_edit("btc");
        assert_eq!(store.editing(), Some("btc"));

        store.edit_holdings("btc", 3.0).unwrap();
        assert!(store.editing().is_none());

        store.start_edit("unknown");
        assert!(store.editing().is_none());
    }

    #[test]
    fn test_remove_btc() {
        let (mut store, mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        assert!(store.remove("btc").unwrap());

        let expected = vec![btc_eth()[1].clone()];
        assert_eq!(store.rows(), expected.as_slice());
        assert_eq!(persisted(&mem), expected);
        assert!(updates.take_changed());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (mut store, _mem) = store_with(btc_eth());
        let mut updates = store.notifier().subscribe();

        assert!(!store.remove("doge").unwrap());
        assert_eq!(store.len(), 2);
        assert!(!updates.take_changed());
    }

    #[test]
    fn test_pagination_resets_on_size_change() {
        let rows: Vec<TokenRow> = (0..25).map(|i| sample_row(&format!("c{}", i), 1.0, 1.0)).collect();
        let (mut store, _mem) = store_with(rows);

        store.next_page();
        store.next_page();
        assert_eq!(store.pager().page(), 3);
        assert_eq!(store.page_rows().len(), 5);
        assert_eq!(store.page_rows()[0].id, "c20");

        store.next_page();
        assert_eq!(store.pager().page(), 3);

        store.start_edit("c21");
        store.remove("c21").unwrap();
        assert_eq!(store.pager().page(), 1);
        assert!(store.editing().is_none());
    }

    #[test]
    fn test_pagination_kept_on_edit() {
        let rows: Vec<TokenRow> = (0..15).map(|i| sample_row(&format!("c{}", i), 1.0, 1.0)).collect();
        let (mut store, _mem) = store_with(rows);

        store.next_page();
        store.edit_holdings("c12", 4.0).unwrap();
        assert_eq!(store.pager().page(), 2);
    }

    #[test]
    fn test_pager_labels() {
        let mut pager = Pager::default();
        assert_eq!(pager.results_label(0), "0–0 of 0 results");
        assert_eq!(pager.pages_label(0), "1 of 1 pages");

        assert_eq!(pager.results_label(42), "1–10 of 42 results");
        pager.next(42);
        pager.next(42);
        pager.next(42);
        pager.next(42);
        assert_eq!(pager.page(), 5);
        assert_eq!(pager.results_label(42), "41–42 of 42 results");
        assert_eq!(pager.pages_label(42), "5 of 5 pages");

        pager.previous();
        assert_eq!(pager.page(), 4);
        pager.reset();
        assert!(!pager.has_previous());
    }
}
