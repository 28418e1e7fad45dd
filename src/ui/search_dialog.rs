// ============================================================================
// Dialogue d'ajout de tokens (overlay)
// ============================================================================
// Popup centrée dessinée par-dessus le dashboard :
// - champ de recherche
// - liste "Trending" (query vide) ou résultats de recherche
// - cases cochées pour la sélection multiple
// - message d'erreur éventuel et bouton de validation
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::search::{DialogPhase, SearchDialog};

/// Rectangle centré de `percent_x` × `percent_y` de `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Dessine le dialogue s'il est ouvert
pub fn render_search_dialog(frame: &mut Frame, dialog: &SearchDialog, area: Rect) {
    if !dialog.is_open() {
        return;
    }

    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let title = if dialog.selected().is_empty() {
        " Add Token ".to_string()
    } else {
        format!(" Add Token · {} selected ", dialog.selected().len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Champ de recherche
            Constraint::Length(1), // Titre de section
            Constraint::Min(3),    // Liste
            Constraint::Length(1), // Erreur
            Constraint::Length(1), // Boutons
        ])
        .split(inner);

    render_query(frame, dialog, chunks[0]);

    let section = match dialog.phase() {
        DialogPhase::Searching if dialog.is_loading() => "Searching…",
        DialogPhase::Searching => "Results",
        _ => "Trending",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(section, Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD))),
        chunks[1],
    );

    render_list(frame, dialog, chunks[2]);

    if let Some(error) = dialog.error() {
        frame.render_widget(
            Paragraph::new(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
            chunks[3],
        );
    }

    render_actions(frame, dialog, chunks[4]);
}

fn render_query(frame: &mut Frame, dialog: &SearchDialog, area: Rect) {
    let line = if dialog.query().is_empty() {
        Line::from(vec![
            Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(" Search tokens…", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![
            Span::raw(dialog.query().to_string()),
            Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    };

    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(input, area);
}

fn render_list(frame: &mut Frame, dialog: &SearchDialog, area: Rect) {
    let coins = dialog.visible();

    if coins.is_empty() {
        let message = match dialog.phase() {
            DialogPhase::Searching if dialog.is_loading() => "",
            DialogPhase::Searching => "No results found.",
            _ if dialog.error().is_some() => "",
            _ => "Loading…",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray))),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = coins
        .iter()
        .map(|coin| {
            let selected = dialog.is_selected(&coin.id);
            let mark = if selected { "[x] " } else { "[ ] " };
            let style = if selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style.add_modifier(Modifier::BOLD)),
                Span::styled(coin.display(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");

    let mut state = ListState::default().with_selected(Some(dialog.cursor()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_actions(frame: &mut Frame, dialog: &SearchDialog, area: Rect) {
    let confirm_style = if dialog.can_confirm() {
        Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled("[↑↓]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" Move  "),
        Span::styled("[Tab]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" Select  "),
        Span::styled("[Esc]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel  "),
        Span::styled(format!(" [Enter] {} ", dialog.confirm_label()), confirm_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
