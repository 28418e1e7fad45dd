// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère recherche, trending et snapshots de marché depuis CoinGecko v3
//
// CONCEPTS RUST :
// 1. async/await : appels HTTP non-bloquants (reqwest)
// 2. Deux étapes : désérialisation "brute" (tout Option) puis validation
//    en types métier (MarketQuote / CoinLite) ou ParseError typée
// 3. thiserror : enum d'erreurs avec messages générés
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{MarketDataClient, MarketsQuery};
use crate::models::{CoinLite, MarketQuote, Sparkline};

/// Adresse de base de l'API publique
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

// ============================================================================
// Erreurs de validation
// ============================================================================

/// Une entrée de la réponse ne peut pas devenir une ligne valide
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("champ manquant : {0}")]
    MissingField(&'static str),

    #[error("prix invalide pour {id} : {price:?}")]
    InvalidPrice { id: String, price: Option<f64> },
}

// ============================================================================
// Structures pour parser la réponse JSON de CoinGecko
// ============================================================================
// Tout est Option : CoinGecko renvoie parfois null (ex: prix d'un token
// délisté). La validation décide ensuite ce qui est acceptable.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawMarketCoin {
    id: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    image: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    sparkline_in_7d: Option<RawSparkline>,
}

#[derive(Debug, Deserialize)]
struct RawSparkline {
    price: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct RawCoin {
    id: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    thumb: Option<String>,
    large: Option<String>,
    market_cap_rank: Option<u32>,
}

/// Réponse de `/search`
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<RawCoin>,
}

/// Réponse de `/search/trending` : chaque coin est enveloppé dans "item"
#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    item: RawCoin,
}

// ============================================================================
// Validation
// ============================================================================

impl TryFrom<RawMarketCoin> for MarketQuote {
    type Error = ParseError;

    fn try_from(raw: RawMarketCoin) -> std::result::Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ParseError::MissingField("id"))?;

        let current_price = match raw.current_price {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            price => return Err(ParseError::InvalidPrice { id, price }),
        };

        // Les échantillons null de la sparkline sont ignorés
        let price = raw
            .sparkline_in_7d
            .and_then(|s| s.price)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter(|p| p.is_finite())
            .collect();

        Ok(MarketQuote {
            name: raw.name.unwrap_or_else(|| id.clone()),
            symbol: raw.symbol.unwrap_or_default(),
            image: raw.image.unwrap_or_default(),
            current_price,
            price_change_percentage_24h: raw.price_change_percentage_24h,
            sparkline_in_7d: Sparkline::new(price),
            id,
        })
    }
}

impl TryFrom<RawCoin> for CoinLite {
    type Error = ParseError;

    fn try_from(raw: RawCoin) -> std::result::Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ParseError::MissingField("id"))?;

        Ok(CoinLite {
            name: raw.name.unwrap_or_else(|| id.clone()),
            symbol: raw.symbol.unwrap_or_default(),
            thumb: raw.thumb,
            large: raw.large,
            market_cap_rank: raw.market_cap_rank,
            id,
        })
    }
}

/// Valide chaque entrée ; les entrées invalides sont ignorées (et loggées)
fn validate_all<R, T>(raw: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = ParseError>,
{
    let total = raw.len();
    let mut skipped = 0;

    let valid: Vec<T> = raw
        .into_iter()
        .filter_map(|r| match T::try_from(r) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "Skipping invalid API entry");
                skipped += 1;
                None
            }
        })
        .collect();

    debug!(parsed = valid.len(), total, skipped, "Validated API entries");
    valid
}

/// Parse le corps JSON de `/coins/markets`
pub fn parse_markets(body: &str) -> Result<Vec<MarketQuote>> {
    let raw: Vec<RawMarketCoin> =
        serde_json::from_str(body).context("Réponse /coins/markets invalide")?;
    Ok(validate_all(raw))
}

/// Parse le corps JSON de `/search`
pub fn parse_search(body: &str) -> Result<Vec<CoinLite>> {
    let raw: SearchResponse = serde_json::from_str(body).context("Réponse /search invalide")?;
    Ok(validate_all(raw.coins))
}

/// Parse le corps JSON de `/search/trending`
pub fn parse_trending(body: &str) -> Result<Vec<CoinLite>> {
    let raw: TrendingResponse =
        serde_json::from_str(body).context("Réponse /search/trending invalide")?;
    Ok(validate_all(raw.coins.into_iter().map(|c| c.item).collect()))
}

// ============================================================================
// Client HTTP
// ============================================================================

/// Client CoinGecko avec une adresse de base fixe
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Crée un client vers `base_url` (sans slash final)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tokenfolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET + vérification du statut + lecture du corps
    async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = self.url(path);
        debug!(url = %url, ?params, "Sending HTTP request to CoinGecko");

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", url))?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, url = %url, "CoinGecko returned error status");
            anyhow::bail!("CoinGecko a retourné une erreur : HTTP {}", status);
        }

        response
            .text()
            .await
            .context("Échec de la lecture de la réponse CoinGecko")
    }

    async fn get_parsed<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
        parse: fn(&str) -> Result<T>,
    ) -> Result<T> {
        let body = self.get_text(path, params).await?;
        parse(&body)
    }
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<CoinLite>> {
        let params = [("query", query.to_string())];
        let coins = self.get_parsed("/search", &params, parse_search).await?;
        info!(results = coins.len(), "Search completed");
        Ok(coins)
    }

    #[instrument(skip(self))]
    async fn trending(&self) -> Result<Vec<CoinLite>> {
        let coins = self.get_parsed("/search/trending", &[], parse_trending).await?;
        info!(results = coins.len(), "Trending tokens fetched");
        Ok(coins)
    }

    #[instrument(skip(self))]
    async fn markets(&self, query: &MarketsQuery) -> Result<Vec<MarketQuote>> {
        // Un appel par lot de 250 ids au plus ; un lot en échec fait échouer
        // l'ensemble (pas de snapshot partiel)
        let mut quotes = Vec::new();
        for batch in query.batches() {
            let params = batch.to_params();
            let page = self.get_parsed("/coins/markets", &params, parse_markets).await?;
            debug!(requested = batch.per_page, received = page.len(), "Markets batch fetched");
            quotes.extend(page);
        }

        info!(rows = quotes.len(), "Market snapshot fetched");
        Ok(quotes)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
