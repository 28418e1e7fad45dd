// ============================================================================
// Module : api
// ============================================================================
// Clients API pour récupérer les données de marché (CoinGecko)
//
// CONCEPT RUST : Trait async
// - MarketDataClient définit les 3 appels en lecture seule
// - CoinGeckoClient : implémentation HTTP réelle
// - Les tests utilisent un faux client qui implémente le même trait
// ============================================================================

pub mod coingecko; // Client API CoinGecko

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CoinLite, MarketQuote};

// Re-export des éléments principaux
pub use coingecko::{CoinGeckoClient, ParseError, DEFAULT_BASE_URL};

/// Nombre maximal de résultats que CoinGecko renvoie par page
pub const MAX_PER_PAGE: usize = 250;

/// Paramètres de l'appel `/coins/markets`
#[derive(Debug, Clone, PartialEq)]
pub struct MarketsQuery {
    /// Identifiants à filtrer (None = top du classement)
    pub ids: Option<Vec<String>>,

    /// Nombre de résultats par page
    pub per_page: usize,
}

impl MarketsQuery {
    /// Les `count` premiers tokens par capitalisation
    pub fn top(count: usize) -> Self {
        Self {
            ids: None,
            per_page: count,
        }
    }

    /// Exactement les tokens demandés
    pub fn for_ids(ids: &[String]) -> Self {
        Self {
            ids: Some(ids.to_vec()),
            per_page: ids.len(),
        }
    }

    /// Découpe la requête en lots d'au plus MAX_PER_PAGE identifiants
    ///
    /// Au-delà, l'API tronque silencieusement la réponse : les tokens
    /// manquants disparaîtraient de la watchlist au refresh suivant.
    /// Une requête "top N" est plafonnée à une seule page.
    pub fn batches(&self) -> Vec<MarketsQuery> {
        match &self.ids {
            Some(ids) if ids.len() > MAX_PER_PAGE => ids
                .chunks(MAX_PER_PAGE)
                .map(MarketsQuery::for_ids)
                .collect(),
            Some(_) => vec![self.clone()],
            None => vec![Self::top(self.per_page.min(MAX_PER_PAGE))],
        }
    }

    /// Paramètres de la query string
    ///
    /// vs_currency, order, page et sparkline sont fixes.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("vs_currency", "usd".to_string())];
        if let Some(ids) = &self.ids {
            params.push(("ids", ids.join(",")));
        }
        params.push(("order", "market_cap_desc".to_string()));
        params.push(("per_page", self.per_page.to_string()));
        params.push(("page", "1".to_string()));
        params.push(("sparkline", "true".to_string()));
        params
    }
}

/// Source de données de marché (lecture seule)
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Recherche de tokens par texte
    async fn search(&self, query: &str) -> Result<Vec<CoinLite>>;

    /// Tokens actuellement "trending"
    async fn trending(&self) -> Result<Vec<CoinLite>>;

    /// Snapshot de marché (prix, variation 24h, sparkline 7j)
    async fn markets(&self, query: &MarketsQuery) -> Result<Vec<MarketQuote>>;
}
