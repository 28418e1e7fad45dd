// ============================================================================
// Structure : TokenRow
// ============================================================================
// Représente une ligne de la watchlist : données de marché + holdings locaux
//
// CONCEPTS RUST :
// 1. Composition : TokenRow = MarketQuote (données API) + holdings (local)
// 2. Option<f64> : `value` est dérivée, jamais considérée comme fiable
// 3. Serde : la watchlist complète est persistée en JSON
// ============================================================================

use serde::{Deserialize, Serialize};

/// Série de prix sur 7 jours (format CoinGecko : `{"price": [...]}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

impl Sparkline {
    pub fn new(price: Vec<f64>) -> Self {
        Self { price }
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }
}

/// Snapshot de marché validé pour un token (sans holdings ni value)
///
/// Produit par le client API après validation de la réponse JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub current_price: f64,
    pub price_change_percentage_24h: Option<f64>,
    pub sparkline_in_7d: Sparkline,
}

impl MarketQuote {
    /// Convertit le snapshot en ligne de watchlist avec les holdings donnés
    ///
    /// CONCEPT RUST : self par valeur
    /// - Le MarketQuote est consommé (move), pas de clone des Strings
    pub fn into_row(self, holdings: f64) -> TokenRow {
        TokenRow {
            id: self.id,
            name: self.name,
            symbol: self.symbol,
            image: self.image,
            current_price: self.current_price,
            price_change_percentage_24h: self.price_change_percentage_24h,
            sparkline_in_7d: self.sparkline_in_7d,
            holdings,
            value: Some(holdings * self.current_price),
        }
    }
}

/// Un token dans la watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRow {
    /// Identifiant CoinGecko (ex: "bitcoin"), unique dans la watchlist
    pub id: String,

    /// Nom complet (ex: "Bitcoin")
    #[serde(default)]
    pub name: String,

    /// Symbole (ex: "btc")
    #[serde(default)]
    pub symbol: String,

    /// URL de l'icône (affichage uniquement)
    #[serde(default)]
    pub image: String,

    /// Dernier prix connu en USD
    #[serde(default)]
    pub current_price: f64,

    /// Variation 24h en pourcentage (peut manquer)
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    /// Prix des 7 derniers jours
    #[serde(default)]
    pub sparkline_in_7d: Sparkline,

    /// Quantité possédée (assignée par l'utilisateur)
    #[serde(default)]
    pub holdings: f64,

    /// holdings × current_price (dérivée)
    #[serde(default)]
    pub value: Option<f64>,
}

impl TokenRow {
    /// Remplace les holdings et recalcule la valeur en même temps
    pub fn set_holdings(&mut self, holdings: f64) {
        self.holdings = holdings;
        self.value = Some(holdings * self.current_price);
    }

    /// Retourne la valeur stockée, ou la recalcule si elle est absente
    pub fn value_or_derived(&self) -> f64 {
        self.value
            .unwrap_or(self.holdings * self.current_price)
    }

    /// Variation 24h pour l'affichage : absente ou non finie => 0
    pub fn display_change_24h(&self) -> f64 {
        match self.price_change_percentage_24h {
            Some(change) if change.is_finite() => change,
            _ => 0.0,
        }
    }

    /// Retourne true si le token est en hausse sur 24h
    pub fn is_positive(&self) -> bool {
        self.display_change_24h() >= 0.0
    }

    /// Label d'affichage : "Bitcoin (BTC)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol.to_uppercase())
    }
}

#[cfg(test)]
pub(crate) fn sample_row(id: &str, holdings: f64, current_price: f64) -> TokenRow {
    MarketQuote {
        id: id.to_string(),
        name: id.to_string(),
        symbol: id.to_string(),
        image: String::new(),
        current_price,
        price_change_percentage_24h: Some(1.5),
        sparkline_in_7d: Sparkline::default(),
    }
    .into_row(holdings)
}

// ============================================================================
// Tests
// ============================================================================
