// ============================================================================
// Structure : CoinLite
// ============================================================================
// Résumé d'un token retourné par la recherche ou la liste "trending"
// ============================================================================

use serde::{Deserialize, Serialize};

/// Token trouvé par la recherche (affiché dans le dialogue d'ajout)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinLite {
    /// Identifiant CoinGecko (ex: "ethereum")
    pub id: String,

    pub name: String,

    pub symbol: String,

    /// Petite icône
    pub thumb: Option<String>,

    /// Grande icône (fallback si pas de thumb)
    pub large: Option<String>,

    pub market_cap_rank: Option<u32>,
}

impl CoinLite {
    pub fn new(id: String, name: String, symbol: String) -> Self {
        Self {
            id,
            name,
            symbol,
            thumb: None,
            large: None,
            market_cap_rank: None,
        }
    }

    /// Icône à afficher : thumb en priorité, sinon large
    pub fn icon(&self) -> Option<&str> {
        self.thumb.as_deref().or(self.large.as_deref())
    }

    /// Formatte le token pour la liste : "Ethereum (ETH)  #2"
    pub fn display(&self) -> String {
        let rank = self
            .market_cap_rank
            .map(|r| format!("  #{}", r))
            .unwrap_or_default();

        format!("{} ({}){}", self.name, self.symbol.to_uppercase(), rank)
    }
}
