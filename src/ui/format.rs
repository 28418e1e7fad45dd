// ============================================================================
// Helpers de formatage pour l'UI
// ============================================================================
// Fonctions pures (testables sans terminal) :
// montants, pourcentages, sparklines Unicode, couleurs hex, barre d'allocation
// ============================================================================

use chrono::{DateTime, Local, Utc};
use ratatui::style::Color;

use crate::portfolio::Segment;

/// Nombre max d'échantillons affichés dans une sparkline
const SPARKLINE_LIMIT: usize = 50;

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Insère des séparateurs de milliers : "1234567" -> "1,234,567"
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Montant en USD avec 2 décimales : "$1,234.56"
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }

    let formatted = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

/// Prix unitaire : 2 décimales au-dessus de 1$, jusqu'à 8 en dessous
pub fn format_price(price: f64) -> String {
    if !price.is_finite() || price == 0.0 {
        return "$0".to_string();
    }
    if price >= 1.0 {
        return format_usd(price);
    }

    let formatted = format!("{:.8}", price);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("${}", trimmed)
}

/// Variation en pourcentage : "+1.23%", "-0.50%", "0.00%"
pub fn format_change(pct: f64) -> String {
    if !pct.is_finite() {
        return "0.00%".to_string();
    }
    let sign = if pct > 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, pct)
}

/// Holdings sans zéros inutiles (4 décimales max) : "2", "0.05", "12.3456"
pub fn format_holdings(holdings: f64) -> String {
    let formatted = format!("{:.4}", holdings);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Sparkline Unicode sur `width` caractères (50 derniers échantillons)
pub fn sparkline_text(prices: &[f64], width: usize) -> String {
    if prices.is_empty() || width == 0 {
        return String::new();
    }

    let start = prices.len().saturating_sub(SPARKLINE_LIMIT);
    let samples = &prices[start..];

    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let points = width.min(samples.len());
    (0..points)
        .map(|i| {
            // Ré-échantillonnage : un point par colonne
            let idx = i * samples.len() / points;
            let level = if span > 0.0 {
                ((samples[idx] - min) / span * (SPARK_CHARS.len() - 1) as f64).round() as usize
            } else {
                SPARK_CHARS.len() / 2
            };
            SPARK_CHARS[level.min(SPARK_CHARS.len() - 1)]
        })
        .collect()
}

/// "#4ade80" -> Color::Rgb(0x4a, 0xde, 0x80) ; gris si invalide
pub fn hex_to_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return Color::Gray;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

/// Découpe `width` colonnes proportionnellement aux segments
///
/// La somme des largeurs vaut exactement `width` (plus grands restes).
pub fn allocation_widths(segments: &[Segment], total: f64, width: usize) -> Vec<usize> {
    if total <= 0.0 || segments.is_empty() {
        return vec![0; segments.len()];
    }

    let exact: Vec<f64> = segments
        .iter()
        .map(|s| s.value.max(0.0) / total * width as f64)
        .collect();
    let mut widths: Vec<usize> = exact.iter().map(|w| w.floor() as usize).collect();

    let assigned: usize = widths.iter().sum();
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    for &i in order.iter().take(width.saturating_sub(assigned)) {
        widths[i] += 1;
    }
    widths
}

/// Heure locale du dernier update, ou "—"
pub fn last_updated_label(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "—".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
