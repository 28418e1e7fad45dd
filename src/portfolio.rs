// ============================================================================
// Portfolio : agrégation pour le dashboard
// ============================================================================
// Relit la watchlist persistée de façon INDÉPENDANTE du Store et calcule :
// - la valeur totale du portefeuille
// - la répartition top 5 + "Others" pour le graphique d'allocation
// - la légende (label, couleur, pourcentage)
//
// CONCEPTS RUST :
// 1. Fonction pure : summarize() ne dépend que de ses entrées
// 2. Tri stable : sort_by garde l'ordre d'origine en cas d'égalité
// 3. Lecture tolérante : HoldingRow a tous ses champs numériques optionnels
// ============================================================================

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::models::TokenRow;
use crate::notify::UpdateSubscriber;
use crate::storage::{parse_rows, KeyValueStore, WatchlistStorage};

/// Nombre de segments affichés individuellement
pub const TOP_SEGMENTS: usize = 5;

/// Palette des segments, attribuée par position
pub const PALETTE: [&str; 10] = [
    "#4ade80", "#60a5fa", "#f59e0b", "#a78bfa", "#f87171",
    "#34d399", "#fb923c", "#22d3ee", "#f472b6", "#93c5fd",
];

/// Couleur neutre du segment "Others"
pub const OTHERS_COLOR: &str = "#6b7280";

pub const OTHERS_ID: &str = "others";

/// Ligne persistée, lue sans faire confiance aux champs numériques
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HoldingRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub holdings: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl HoldingRow {
    /// Valeur stockée, sinon holdings × prix (champs manquants = 0)
    ///
    /// Les valeurs non finies ou négatives comptent pour 0.
    pub fn effective_value(&self) -> f64 {
        let value = self
            .value
            .unwrap_or_else(|| self.holdings.unwrap_or(0.0) * self.current_price.unwrap_or(0.0));

        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol.to_uppercase())
    }
}

impl From<&TokenRow> for HoldingRow {
    fn from(row: &TokenRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            symbol: row.symbol.clone(),
            current_price: Some(row.current_price),
            holdings: Some(row.holdings),
            value: row.value,
        }
    }
}

/// Segment du graphique d'allocation
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

/// Entrée de légende
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub id: String,
    pub label: String,
    pub color: &'static str,
    pub pct: f64,
}

/// Résultat de l'agrégation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSummary {
    pub total: f64,
    pub segments: Vec<Segment>,
    pub legend: Vec<LegendEntry>,
}

/// Calcule total, segments et légende à partir des lignes
///
/// Le total est la somme des segments (top 5 + reste), dans cet ordre :
/// la somme des segments retombe exactement sur le total.
pub fn summarize(rows: &[HoldingRow]) -> PortfolioSummary {
    let mut valued: Vec<(&HoldingRow, f64)> = rows.iter().map(|r| (r, r.effective_value())).collect();

    // Tri décroissant ; sort_by est stable
    valued.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let split = valued.len().min(TOP_SEGMENTS);
    let (top, rest) = valued.split_at(split);

    let mut segments: Vec<Segment> = top
        .iter()
        .enumerate()
        .map(|(i, (row, value))| Segment {
            id: row.id.clone(),
            label: row.label(),
            value: *value,
            color: PALETTE[i % PALETTE.len()],
        })
        .collect();

    let rest_sum: f64 = rest.iter().map(|(_, v)| v).sum();
    if rest_sum > 0.0 {
        segments.push(Segment {
            id: OTHERS_ID.to_string(),
            label: "Others".to_string(),
            value: rest_sum,
            color: OTHERS_COLOR,
        });
    }

    let top_sum: f64 = top.iter().map(|(_, v)| v).sum();
    let total = top_sum + rest_sum;

    let legend = segments
        .iter()
        .filter(|s| s.value > 0.0)
        .map(|s| LegendEntry {
            id: s.id.clone(),
            label: s.label.clone(),
            color: s.color,
            pct: if total > 0.0 { s.value / total * 100.0 } else { 0.0 },
        })
        .collect();

    PortfolioSummary {
        total,
        segments,
        legend,
    }
}

// ============================================================================
// PortfolioView : lecteur indépendant du stockage
// ============================================================================
// Relit le stockage :
// 1. au montage (new)
// 2. quand le signal "last updated" change
// 3. quand le contenu persisté a été modifié par un autre processus
// ============================================================================

/// Vue agrégée du portefeuille
pub struct PortfolioView<S: KeyValueStore> {
    storage: WatchlistStorage<S>,
    updates: UpdateSubscriber,
    last_raw: Option<String>,
    summary: PortfolioSummary,
}

impl<S: KeyValueStore> PortfolioView<S> {
    /// Crée la vue et lit immédiatement le stockage
    pub fn new(storage: WatchlistStorage<S>, updates: UpdateSubscriber) -> Self {
        let mut view = Self {
            storage,
            updates,
            last_raw: None,
            summary: PortfolioSummary::default(),
        };
        view.reload();
        view
    }

    /// Relit le stockage et recalcule le résumé
    pub fn reload(&mut self) {
        let raw = self.storage.raw();
        let rows: Vec<HoldingRow> = raw.as_deref().map(parse_rows::<HoldingRow>).unwrap_or_default();

        self.summary = summarize(&rows);
        self.last_raw = raw;
        debug!(rows = rows.len(), total = self.summary.total, "Portfolio summary recomputed");
    }

    /// Vérifie les déclencheurs ; retourne true si la vue a été recalculée
    ///
    /// Appelé à chaque tick de l'UI : la cohérence est éventuelle.
    pub fn poll(&mut self) -> bool {
        let notified = self.updates.take_changed();
        if notified || self.storage.raw() != self.last_raw {
            self.reload();
            return true;
        }
        false
    }

    pub fn summary(&self) -> &PortfolioSummary {
        &self.summary
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.updates.last_updated()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token_row::sample_row;
    use crate::notify::UpdateNotifier;
    use crate::storage::{MemoryStore, WATCHLIST_KEY};

    fn row(id: &str, holdings: f64, price: f64) -> HoldingRow {
        HoldingRow::from(&sample_row(id, holdings, price))
    }

    #[test]
    fn test_btc_eth_scenario() {
        let rows = vec![row("btc", 2.0, 50_000.0), row("eth", 10.0, 2_000.0)];
        let summary = summarize(&rows);

        assert_eq!(summary.total, 120_000.0);
        assert_eq!(summary.segments.len(), 2);
        assert_eq!(summary.segments[0].id, "btc");
        assert_eq!(summary.segments[0].value, 100_000.0);
        assert_eq!(summary.segments[1].value, 20_000.0);
        assert!(summary.segments.iter().all(|s| s.id != OTHERS_ID));

        assert!((summary.legend[0].pct - 83.333).abs() < 0.01);
        assert!((summary.legend[1].pct - 16.667).abs() < 0.01);
    }

    #[test]
    fn test_top_five_plus_others() {
        let rows: Vec<HoldingRow> = (1..=8).map(|i| row(&format!("c{}", i), 1.0, i as f64 * 10.0)).collect();
        let summary = summarize(&rows);

        assert_eq!(summary.segments.len(), 6);
        assert_eq!(summary.segments[0].id, "c8");
        assert_eq!(summary.segments[0].color, PALETTE[0]);
        assert_eq!(summary.segments[4].color, PALETTE[4]);

        let others = summary.segments.last().unwrap();
        assert_eq!(others.id, OTHERS_ID);
        assert_eq!(others.color, OTHERS_COLOR);
        assert_eq!(others.value, 30.0 + 20.0 + 10.0);
    }

    #[test]
    fn test_segments_sum_to_total_exactly() {
        for n in [0usize, 1, 4, 5, 6, 13, 100] {
            let rows: Vec<HoldingRow> = (0..n)
                .map(|i| row(&format!("c{}", i), 0.1 + i as f64 * 0.37, 1.0 / (i as f64 + 3.0)))
                .collect();
            let summary = summarize(&rows);

            let sum: f64 = summary.segments.iter().map(|s| s.value).sum();
            assert_eq!(sum, summary.total, "n = {}", n);

            if summary.total > 0.0 {
                let pct: f64 = summary.legend.iter().map(|l| l.pct).sum();
                assert!((pct - 100.0).abs() < 1e-9, "n = {}", n);
            }
        }
    }

    #[test]
    fn test_zero_total_has_no_legend() {
        let rows = vec![row("a", 0.0, 10.0), row("b", 5.0, 0.0)];
        let summary = summarize(&rows);

        assert_eq!(summary.total, 0.0);
        assert!(summary.legend.is_empty());
        assert!(summary.segments.iter().all(|s| s.value == 0.0));
        assert!(summarize(&[]).segments.is_empty());
    }

    #[test]
    fn test_missing_value_is_derived() {
        let rows = vec![
            HoldingRow {
                id: "x".into(),
                holdings: Some(3.0),
                current_price: Some(4.0),
                ..Default::default()
            },
            HoldingRow {
                id: "y".into(),
                holdings: None,
                current_price: Some(4.0),
                ..Default::default()
            },
        ];
        assert_eq!(summarize(&rows).total, 12.0);
    }

    #[test]
    fn test_view_reloads_on_notification_and_external_change() {
        let mem = MemoryStore::new();
        let storage = WatchlistStorage::new(mem.clone());
        let notifier = UpdateNotifier::new();

        storage.save(&[sample_row("btc", 2.0, 50_000.0)]).unwrap();
        let mut view = PortfolioView::new(storage.clone(), notifier.subscribe());
        assert_eq!(view.summary().total, 100_000.0);
        assert!(!view.poll());

        // Écriture + notification (même processus)
        storage
            .save(&[sample_row("btc", 2.0, 50_000.0), sample_row("eth", 10.0, 2_000.0)])
            .unwrap();
        notifier.update_time(Utc::now());
        assert!(view.poll());
        assert_eq!(view.summary().total, 120_000.0);
        assert!(view.last_updated().is_some());

        // Écriture par "un autre processus" : pas de notification
        mem.set(WATCHLIST_KEY, "garbage").unwrap();
        assert!(view.poll());
        assert_eq!(view.summary().total, 0.0);
        assert!(!view.poll());
    }
}
