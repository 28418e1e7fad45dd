// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Zones (de haut en bas) :
// 1. Header : titre
// 2. Portfolio : total, "last updated", barre d'allocation + légende
// 3. Watchlist : table paginée (prix, 24h, sparkline 7j, holdings, valeur)
// 4. Footer : pagination, statut, raccourcis ou confirmation en cours
//
// Le dialogue de recherche est dessiné par-dessus (search_dialog.rs).
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::TokenRow;
use crate::storage::KeyValueStore;
use crate::ui::format::{
    allocation_widths, format_change, format_holdings, format_price, format_usd, hex_to_color,
    last_updated_label, sparkline_text,
};
use crate::ui::search_dialog::render_search_dialog;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Largeur de la colonne sparkline
const SPARKLINE_WIDTH: u16 = 24;

fn key_style(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Dessine l'interface complète
pub fn render<S: KeyValueStore>(frame: &mut Frame, app: &App<S>) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, chunks[0]);
    render_portfolio(frame, app, chunks[1]);
    render_watchlist(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.current_screen == Screen::Search {
        render_search_dialog(frame, &app.search, size);
    }
}

fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(10), // Portfolio
            Constraint::Min(6),     // Watchlist
            Constraint::Length(4),  // Footer : 2 lignes + bordures
        ])
        .split(area)
        .to_vec()
}

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        "◆ Token Portfolio",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Portfolio : total + allocation
// ============================================================================

fn render_portfolio<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Portfolio ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(inner);

    let summary = app.portfolio.summary();

    let total = vec![
        Line::from(Span::styled("Portfolio Total", Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(
            format_usd(summary.total),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Last updated: ", Style::default().fg(Color::Gray)),
            Span::raw(last_updated_label(app.portfolio.last_updated())),
        ]),
    ];
    frame.render_widget(Paragraph::new(total), columns[0]);

    // Barre d'allocation : une couleur par segment
    let bar_width = columns[1].width.saturating_sub(1) as usize;
    let widths = allocation_widths(&summary.segments, summary.total, bar_width);
    let bar: Vec<Span> = if summary.total > 0.0 {
        summary
            .segments
            .iter()
            .zip(widths)
            .filter(|(_, w)| *w > 0)
            .map(|(segment, w)| Span::styled("█".repeat(w), Style::default().fg(hex_to_color(segment.color))))
            .collect()
    } else {
        vec![Span::styled("░".repeat(bar_width), Style::default().fg(Color::DarkGray))]
    };

    let mut lines = vec![Line::from(bar), Line::from("")];
    if summary.legend.is_empty() {
        lines.push(Line::from(Span::styled(
            "No holdings yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend(summary.legend.iter().map(|entry| {
        Line::from(vec![
            Span::styled("■ ", Style::default().fg(hex_to_color(entry.color))),
            Span::raw(format!("{:<28}", entry.label)),
            Span::styled(format!("{:>6.1}%", entry.pct), Style::default().fg(Color::Gray)),
        ])
    }));
    frame.render_widget(Paragraph::new(lines), columns[1]);
}

// ============================================================================
// Watchlist : table paginée
// ============================================================================

fn render_watchlist<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let mut title = vec![Span::raw(" ★ Watchlist ")];
    if app.store.is_refreshing() {
        let frame_idx = (app.tick_count as usize) % SPINNER.len();
        title.push(Span::styled(
            format!("{} Refreshing… ", SPINNER[frame_idx]),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(title));

    if app.store.is_empty() {
        let message = if app.is_loading {
            app.loading_message.as_deref().unwrap_or("Loading…")
        } else {
            "Watchlist is empty. Press [a] to add tokens."
        };
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec!["Token", "Price", "24h %", "Sparkline (7d)", "Holdings", "Value"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .store
        .page_rows()
        .iter()
        .enumerate()
        .map(|(index, row)| token_row(app, row, index == app.selected_index))
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(SPARKLINE_WIDTH),
        Constraint::Length(12),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths).header(header).block(block).column_spacing(1);
    frame.render_widget(table, area);
}

fn token_row<'a, S: KeyValueStore>(app: &App<S>, row: &'a TokenRow, selected: bool) -> Row<'a> {
    let trend = if row.is_positive() { Color::Green } else { Color::Red };

    let editing = app.current_screen == Screen::EditHoldings && app.store.editing() == Some(row.id.as_str());
    let holdings = if editing {
        Cell::from(Line::from(vec![
            Span::styled(app.input_buffer.clone(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]))
        .style(Style::default().bg(Color::DarkGray))
    } else {
        Cell::from(format_holdings(row.holdings))
    };

    let cells = vec![
        Cell::from(row.label()),
        Cell::from(format_price(row.current_price)),
        Cell::from(format_change(row.display_change_24h())).style(Style::default().fg(trend)),
        Cell::from(sparkline_text(&row.sparkline_in_7d.price, SPARKLINE_WIDTH as usize))
            .style(Style::default().fg(trend)),
        holdings,
        Cell::from(format_usd(row.value_or_derived())),
    ];

    let style = if selected {
        Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default()
    };
    Row::new(cells).style(style)
}

// ============================================================================
// Footer : pagination, statut, raccourcis
// ============================================================================

fn render_footer<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.is_editing() { Color::Green } else { Color::Cyan }));

    let len = app.store.len();
    let pager = app.store.pager();
    let mut info = vec![
        Span::styled(pager.results_label(len), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        Span::styled(pager.pages_label(len), Style::default().fg(Color::Gray)),
    ];
    if let Some(status) = &app.status_message {
        info.push(Span::raw("   "));
        info.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(vec![Line::from(info), shortcuts_line(app)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn shortcuts_line<S: KeyValueStore>(app: &App<S>) -> Line<'static> {
    let warn = key_style(Color::Yellow);
    let blink = key_style(Color::Red).add_modifier(Modifier::SLOW_BLINK);

    if app.is_editing() {
        return Line::from(vec![
            Span::styled("[Enter]", key_style(Color::Green)),
            Span::raw(" Save  "),
            Span::styled("[Esc]", key_style(Color::Red)),
            Span::raw(" Cancel"),
        ]);
    }

    if app.is_awaiting_delete_confirmation() {
        let label = app.selected_row().map(|r| r.label()).unwrap_or_else(|| "?".to_string());
        return Line::from(vec![
            Span::styled("⚠  Press ", warn),
            Span::styled("[d]", blink),
            Span::styled(format!(" again to remove {}, any other key to cancel ⚠", label), warn),
        ]);
    }

    if app.is_awaiting_quit_confirmation() {
        return Line::from(vec![
            Span::styled("⚠  Press ", warn),
            Span::styled("[q]", blink),
            Span::styled(" again to quit, any other key to cancel ⚠", warn),
        ]);
    }

    let refresh_style = if app.store.is_refreshing() {
        Style::default().fg(Color::DarkGray)
    } else {
        key_style(Color::Yellow)
    };

    Line::from(vec![
        Span::styled("[q]", key_style(Color::Yellow)),
        Span::raw(" Quit  "),
        Span::styled("[↑↓]", key_style(Color::Yellow)),
        Span::raw(" Navigate  "),
        Span::styled("[←→]", key_style(Color::Yellow)),
        Span::raw(" Page  "),
        Span::styled("[r]", refresh_style),
        Span::raw(" Refresh  "),
        Span::styled("[e]", key_style(Color::Yellow)),
        Span::raw(" Edit  "),
        Span::styled("[a]", key_style(Color::Green)),
        Span::raw(" Add  "),
        Span::styled("[d]", key_style(Color::Red)),
        Span::raw(" Delete"),
    ])
}
