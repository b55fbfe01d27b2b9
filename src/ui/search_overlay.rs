//! City search overlay
//!
//! A centered modal with the query box and up to eight candidates.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use weatherdash::data::geocoding::MIN_QUERY_LEN;

use super::help_overlay::centered_rect;
use crate::app::SearchState;

/// Renders the search overlay on top of the dashboard
pub fn render(frame: &mut Frame, search: &SearchState) {
    let area = centered_rect(60, 14, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Add city ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Query
            Constraint::Min(1),    // Results
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let query = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(search.query.clone()),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
    ]);
    frame.render_widget(query, chunks[0]);

    frame.render_widget(Paragraph::new(result_lines(search)), chunks[1]);

    let hint = Paragraph::new(Span::styled(
        "↑↓ choose  Enter add  Esc cancel",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(hint, chunks[2]);
}

fn result_lines(search: &SearchState) -> Vec<Line<'static>> {
    let muted = Style::default().fg(Color::DarkGray);

    if let Some(error) = &search.error {
        return vec![Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))];
    }
    if search.query.trim().chars().count() < MIN_QUERY_LEN {
        return vec![Line::from(Span::styled(
            format!("Type at least {} characters", MIN_QUERY_LEN),
            muted,
        ))];
    }
    if search.pending {
        return vec![Line::from(Span::styled("Searching...", muted))];
    }
    if search.results.is_empty() {
        return vec![Line::from(Span::styled("No cities found", muted))];
    }

    search
        .results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            if index == search.selected {
                Line::from(Span::styled(
                    format!("\u{25B8} {}", result.display_name()),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {}", result.display_name()))
            }
        })
        .collect()
}
