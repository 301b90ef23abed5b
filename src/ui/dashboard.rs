//! Dashboard screen rendering
//!
//! Renders the current conditions, the row of daily summary cards, and the
//! hourly detail table for the selected day. All values arrive pre-rounded
//! from the aggregation engine; this module only lays them out.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, AppState};
use crate::data::{DailySummary, ForecastBundle, WeatherCondition};
use crate::format;

/// Weather condition to icon mapping, keyed by the condition group name
fn condition_icon(condition: &WeatherCondition) -> &'static str {
    match condition.main.as_str() {
        "Clear" => "\u{2600}",        // ☀
        "Clouds" => "\u{2601}",       // ☁
        "Rain" => "\u{1F327}",        // 🌧
        "Drizzle" => "\u{1F326}",     // 🌦
        "Thunderstorm" => "\u{26C8}", // ⛈
        "Snow" => "\u{2744}",         // ❄
        "Mist" | "Fog" | "Haze" => "\u{1F32B}", // 🌫
        _ => "\u{26C5}",              // ⛅
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
    } else if temp >= 10 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

/// Renders the UI for the current application state
pub fn render(frame: &mut Frame, app: &App) {
    match &app.state {
        AppState::Loading => render_message(frame, "Loading forecast...", Color::Cyan),
        AppState::Failed(message) => render_message(frame, message, Color::Red),
        AppState::Dashboard => render_dashboard(frame, app),
    }
}

/// Renders a single centered message replacing the content area
fn render_message(frame: &mut Frame, message: &str, color: Color) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let text = Paragraph::new(message.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(text, chunks[1]);
}

/// Renders the full dashboard layout
fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header / search
            Constraint::Length(6), // current conditions
            Constraint::Length(7), // daily cards
            Constraint::Min(4),    // hourly detail
            Constraint::Length(2), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    if let Some(bundle) = &app.bundle {
        render_current(frame, app, bundle, chunks[1]);
        render_daily_cards(frame, app, bundle, chunks[2]);
        render_hourly_table(frame, app, bundle, chunks[3]);
    }
    render_footer(frame, app, chunks[4]);
}

/// Renders the title bar, or the search input while it is active
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.input_active {
        Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else if let Some(bundle) = &app.bundle {
        let local_now = format::local_time(bundle.current.timezone, app.now);
        Line::from(vec![
            Span::styled(
                format!("{}, {}", bundle.current.city, bundle.current.country),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format::format_time(&local_now, app.settings.time_format),
                Style::default().fg(Color::Gray),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Skycast",
            Style::default().add_modifier(Modifier::BOLD),
        ))
    };

    let header = Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Renders the current conditions block
fn render_current(frame: &mut Frame, app: &App, bundle: &ForecastBundle, area: Rect) {
    let current = &bundle.current;
    let unit = app.settings.unit;
    let time_format = app.settings.time_format;

    let sunrise = format::local_time(current.timezone, current.sunrise);
    let sunset = format::local_time(current.timezone, current.sunset);

    let lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", condition_icon(&current.condition))),
            Span::styled(
                format::format_temperature(current.temp, unit),
                Style::default()
                    .fg(temperature_color(current.temp))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}", current.condition.description)),
        ]),
        Line::from(format!(
            "Feels like {}   Humidity {}%   Wind {}",
            format::format_temperature(current.feels_like, unit),
            current.humidity,
            format::format_wind_speed(current.wind_speed, unit),
        )),
        Line::from(format!(
            "Sunrise {}   Sunset {}",
            format::format_time(&sunrise, time_format),
            format::format_time(&sunset, time_format),
        )),
    ];

    let block = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Now"));
    frame.render_widget(block, area);
}

/// Renders the row of daily summary cards
fn render_daily_cards(frame: &mut Frame, app: &App, bundle: &ForecastBundle, area: Rect) {
    if bundle.daily.is_empty() {
        return;
    }

    let constraints: Vec<Constraint> = bundle
        .daily
        .iter()
        .map(|_| Constraint::Ratio(1, bundle.daily.len() as u32))
        .collect();
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, day) in bundle.daily.iter().enumerate() {
        render_day_card(frame, app, day, i == app.selected_day, cards[i]);
    }
}

/// Renders one daily card
fn render_day_card(frame: &mut Frame, app: &App, day: &DailySummary, selected: bool, area: Rect) {
    let unit = app.settings.unit;
    let border_style = if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let lines = vec![
        Line::from(Span::styled(
            day.day_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{} {}", condition_icon(&day.condition), day.condition.main)),
        Line::from(vec![
            Span::styled(
                format::format_temperature(day.temp.max, unit),
                Style::default().fg(temperature_color(day.temp.max)),
            ),
            Span::raw(" / "),
            Span::styled(
                format::format_temperature(day.temp.min, unit),
                Style::default().fg(temperature_color(day.temp.min)),
            ),
        ]),
        Line::from(format!("Rain {}%", day.pop)),
        Line::from(format!("Wind {}", format::format_wind_speed(day.wind_speed, unit))),
    ];

    let card = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(day.date.format("%m-%d").to_string()),
    );
    frame.render_widget(card, area);
}

/// Renders the hourly detail table for the selected day
fn render_hourly_table(frame: &mut Frame, app: &App, bundle: &ForecastBundle, area: Rect) {
    let Some(day) = bundle.daily.get(app.selected_day) else {
        return;
    };
    let unit = app.settings.unit;
    let time_format = app.settings.time_format;
    let timezone = bundle.current.timezone;

    let header = Row::new(vec!["Time", "Temp", "Feels", "Humidity", "Wind", "Rain"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = day
        .hourly
        .iter()
        .map(|hour| {
            let local = format::local_time(timezone, hour.time);
            Row::new(vec![
                Cell::from(format::format_time(&local, time_format)),
                Cell::from(format::format_temperature(hour.temp, unit))
                    .style(Style::default().fg(temperature_color(hour.temp))),
                Cell::from(format::format_temperature(hour.feels_like, unit)),
                Cell::from(format!("{}%", hour.humidity)),
                Cell::from(format::format_wind_speed(hour.wind_speed, unit)),
                Cell::from(format!("{}%", hour.pop)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} hourly", day.day_name)),
    );
    frame.render_widget(table, area);
}

/// Renders keybinding hints and any inline message
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if let Some(message) = &app.inline_message {
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else if app.fetching {
        lines.push(Line::from(Span::styled(
            "Fetching...",
            Style::default().fg(Color::Cyan),
        )));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "/ search   g my location   u units   t time format   \u{2190}\u{2192} day   q quit",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(main: &str) -> WeatherCondition {
        WeatherCondition {
            id: 0,
            main: main.to_string(),
            description: String::new(),
            icon: String::new(),
        }
    }

    #[test]
    fn test_condition_icon_known_groups() {
        assert_eq!(condition_icon(&condition("Clear")), "\u{2600}");
        assert_eq!(condition_icon(&condition("Rain")), "\u{1F327}");
        assert_eq!(condition_icon(&condition("Snow")), "\u{2744}");
    }

    #[test]
    fn test_condition_icon_unknown_group_defaults() {
        assert_eq!(condition_icon(&condition("Sandstorm")), "\u{26C5}");
    }

    #[test]
    fn test_temperature_color_gradient() {
        assert_eq!(temperature_color(35), Color::Red);
        assert_eq!(temperature_color(22), Color::Yellow);
        assert_eq!(temperature_color(12), Color::Cyan);
        assert_eq!(temperature_color(-5), Color::Blue);
    }
}
