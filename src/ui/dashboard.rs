//! Dashboard screen rendering
//!
//! Renders the header with the overall theme, one card per saved city, and a
//! footer with key hints and data freshness.

use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use weatherdash::data::{describe, CityConfig, WeatherResult, WeatherTheme};
use weatherdash::format::{
    format_humidity, format_local_time, format_temperature, format_wind_speed,
};
use weatherdash::store::StoreSnapshot;

use crate::app::App;

/// Lines per city card
const CARD_HEIGHT: usize = 3;

/// Theme to icon mapping
pub fn theme_icon(theme: WeatherTheme) -> &'static str {
    match theme {
        WeatherTheme::Sunny => "\u{2600}",   // ☀
        WeatherTheme::Cloudy => "\u{2601}",  // ☁
        WeatherTheme::Rainy => "\u{1F327}",  // 🌧
        WeatherTheme::Stormy => "\u{26C8}",  // ⛈
        WeatherTheme::Snowy => "\u{2744}",   // ❄
        WeatherTheme::Misty => "\u{1F32B}",  // 🌫
        WeatherTheme::Night => "\u{1F319}",  // 🌙
    }
}

/// Accent color for a theme
pub fn theme_color(theme: WeatherTheme) -> Color {
    match theme {
        WeatherTheme::Sunny => Color::Yellow,
        WeatherTheme::Cloudy => Color::Gray,
        WeatherTheme::Rainy => Color::Blue,
        WeatherTheme::Stormy => Color::Magenta,
        WeatherTheme::Snowy => Color::White,
        WeatherTheme::Misty => Color::DarkGray,
        WeatherTheme::Night => Color::LightBlue,
    }
}

/// Color for temperature (warmer = more red, cooler = more blue)
fn temperature_color(temp: i32) -> Color {
    if temp >= 30 {
        Color::Red
    } else if temp >= 25 {
        Color::LightRed
    } else if temp >= 20 {
        Color::Yellow
    } else if temp >= 15 {
        Color::Green
    } else if temp >= 5 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

/// Renders the dashboard
pub fn render(frame: &mut Frame, app: &App, snapshot: &StoreSnapshot) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(3),    // City cards
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, snapshot, chunks[0]);
    render_cards(frame, app, snapshot, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, snapshot: &StoreSnapshot, area: Rect) {
    let theme = weatherdash::data::dominant_theme(
        snapshot.weather_data.iter().filter_map(WeatherResult::data),
    );
    let time_str = Local::now().format("%a %b %d, %H:%M").to_string();

    let mut spans = vec![
        Span::styled(
            "WEATHERDASH",
            Style::default()
                .fg(theme_color(theme))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(time_str, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(
            format!("{} {}", theme_icon(theme), theme),
            Style::default().fg(theme_color(theme)),
        ),
    ];
    if snapshot.is_loading {
        spans.push(Span::styled(
            "  updating...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let separator = "─".repeat((area.width as usize).saturating_sub(2));
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(separator, Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_cards(frame: &mut Frame, app: &App, snapshot: &StoreSnapshot, area: Rect) {
    if snapshot.cities.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No cities yet. Press a to add one, or R to restore the defaults.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(snapshot.cities.len() * CARD_HEIGHT);
    for (index, city) in snapshot.cities.iter().enumerate() {
        let selected = index == app.selected_index;
        lines.extend(card_lines(city, App::result_for(snapshot, city), selected));
    }

    // Keep the selected card on screen
    let inner_height = area.height.saturating_sub(2) as usize;
    let selected_bottom = (app.selected_index + 1) * CARD_HEIGHT;
    let offset = selected_bottom.saturating_sub(inner_height);

    let block = Block::default()
        .title(format!(" Cities ({}) ", snapshot.cities.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((offset as u16, 0));
    frame.render_widget(paragraph, area);
}

/// Three lines for one city: title, conditions, blank spacer
fn card_lines(city: &CityConfig, result: Option<&WeatherResult>, selected: bool) -> Vec<Line<'static>> {
    let cursor = if selected { "\u{25B8} " } else { "  " }; // ▸ or space
    let name_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let mut title = vec![
        Span::styled(cursor, name_style),
        Span::styled(format!("{}, {}", city.name, city.country), name_style),
    ];

    let detail = match result {
        Some(WeatherResult::Success(data)) => {
            let theme = describe(data.weather_code).theme;
            title.push(Span::raw("  "));
            title.push(Span::styled(
                format_temperature(data.temperature),
                Style::default()
                    .fg(temperature_color(data.temperature))
                    .add_modifier(Modifier::BOLD),
            ));
            title.push(Span::raw(format!(" {}", theme_icon(theme))));

            let detail = Line::from(vec![
                Span::raw("    "),
                Span::styled(
                    data.weather_description.clone(),
                    Style::default().fg(theme_color(theme)),
                ),
                Span::styled(
                    format!(
                        "  feels {}  humidity {}  wind {}",
                        format_temperature(data.feels_like),
                        format_humidity(data.humidity),
                        format_wind_speed(data.wind_speed),
                    ),
                    Style::default().fg(Color::Gray),
                ),
            ]);
            let local = format_local_time(&data.timezone, Utc::now());
            if !local.is_empty() {
                title.push(Span::styled(
                    format!("  {}", local),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            detail
        }
        Some(WeatherResult::Failure { error, .. }) => {
            title.push(Span::styled("  unavailable", Style::default().fg(Color::Red)));
            Line::from(vec![
                Span::raw("    "),
                Span::styled(error.clone(), Style::default().fg(Color::Red)),
            ])
        }
        None => Line::from(vec![
            Span::raw("    "),
            Span::styled("Loading...", Style::default().fg(Color::DarkGray)),
        ]),
    };

    vec![Line::from(title), detail, Line::from("")]
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let freshness = app
        .last_refresh
        .map(|t| format!("Updated {}", t.format("%H:%M")))
        .unwrap_or_default();

    let mut spans = vec![Span::styled(
        "↑↓ select  J/K move  a add  d remove  r refresh  R reset  ? help  q quit",
        Style::default().fg(Color::DarkGray),
    )];
    if let Some(status) = &app.status {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }
    if !freshness.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(freshness, Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
