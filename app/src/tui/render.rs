//! Rendering: App state -> frame
//!
//! Pure view of the state object; no mutation happens here apart from
//! the ratatui table cursor, which is derived from the state each draw.

use crate::state::{App, Focus, InputMode, StatusLine};
use chrono::DateTime;
use coindeck_core::{format_currency_short, CoinRecord, SortDirection, SortKey, Tab};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
    Tabs,
};
use ratatui::Frame;

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(3), // Summary cards
        Constraint::Length(2), // Tabs + search
        Constraint::Min(10),   // Content
        Constraint::Length(1), // Status line
    ])
    .split(area);

    render_summary(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    render_content(frame, chunks[2], app);
    render_status(frame, chunks[3], app);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.summary {
        Some(s) => Line::from(vec![
            Span::raw("Market Cap "),
            Span::styled(
                format_currency_short(s.total_market_cap),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", fmt_percent(Some(s.average_change_24h))),
                Style::default().fg(change_color(Some(s.average_change_24h))),
            ),
            Span::raw("  |  24h Vol "),
            Span::styled(
                format_currency_short(s.total_volume_24h),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  BTC "),
            Span::styled(
                fmt_price(s.btc_price),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  Fear/Greed "),
            Span::styled(
                format!("{:.0}", s.fear_greed),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from("Loading market data..."),
    };

    let block = Block::default().borders(Borders::ALL).title(" coindeck ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);

    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.view.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(symbols::line::VERTICAL);
    frame.render_widget(tabs, rows[0]);

    let search = match app.input_mode {
        InputMode::Search => Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.input_buffer.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        InputMode::AddHolding => Line::from(vec![
            Span::styled("Add holding (coin amount): ", Style::default().fg(Color::Yellow)),
            Span::raw(app.input_buffer.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        InputMode::Normal if !app.view.query.is_empty() => Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.view.query.as_str()),
        ]),
        InputMode::Normal => Line::from(Span::styled(
            "/ to search",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(search), rows[1]);
}

fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    let columns =
        Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).split(area);
    render_market_table(frame, columns[0], app);

    let right =
        Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).split(columns[1]);
    render_chart(frame, right[0], app);
    render_portfolio(frame, right[1], app);
}

fn render_market_table(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Market;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Market ")
        .border_style(if focused {
            Style::default().fg(Color::Blue)
        } else {
            Style::default()
        });

    let rows_data = app.visible();
    if rows_data.is_empty() {
        let placeholder = if app.coins.is_empty() {
            "no data - waiting for market refresh"
        } else {
            "nothing matches the current filter"
        };
        frame.render_widget(
            Paragraph::new(placeholder)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from(" "),
        Cell::from(header_label("Name", SortKey::Name, app)),
        Cell::from(header_label("Price", SortKey::Price, app)),
        Cell::from(header_label("1h %", SortKey::Change1h, app)),
        Cell::from(header_label("24h %", SortKey::Change24h, app)),
        Cell::from(header_label("7d %", SortKey::Change7d, app)),
        Cell::from(header_label("Mkt Cap", SortKey::MarketCap, app)),
        Cell::from("Volume"),
    ])
    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, coin)| coin_row(i, coin, app))
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(2),
        Constraint::Min(14),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut cursor = TableState::default();
    cursor.select(Some(app.selected.min(rows_data.len().saturating_sub(1))));
    frame.render_stateful_widget(table, area, &mut cursor);
}

fn coin_row<'a>(index: usize, coin: &'a CoinRecord, app: &App) -> Row<'a> {
    let star = if app.favorites.contains(&coin.id) {
        Cell::from(Span::styled("*", Style::default().fg(Color::Yellow)))
    } else {
        Cell::from(" ")
    };

    Row::new(vec![
        Cell::from(format!("{}", index + 1)),
        star,
        Cell::from(format!("{} ({})", coin.name, coin.symbol.to_uppercase())),
        Cell::from(fmt_price(coin.price_or_zero())),
        change_cell(coin.change_1h),
        change_cell(coin.change_24h),
        change_cell(coin.change_7d),
        Cell::from(format_currency_short(coin.market_cap_or_zero())),
        Cell::from(format_currency_short(coin.volume_or_zero())),
    ])
}

fn change_cell<'a>(value: Option<f64>) -> Cell<'a> {
    Cell::from(Span::styled(
        fmt_percent(value),
        Style::default().fg(change_color(value)),
    ))
}

fn header_label(base: &str, key: SortKey, app: &App) -> String {
    match app.view.sort {
        Some((active, dir)) if active == key => match dir {
            SortDirection::Descending => format!("{base} v"),
            SortDirection::Ascending => format!("{base} ^"),
        },
        _ => base.to_string(),
    }
}

fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let title = match &app.chart.coin_id {
        Some(id) => format!(" Chart: {} ({}d) ", id, app.chart.days),
        None => " Chart ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if app.chart.loading {
        frame.render_widget(
            Paragraph::new("loading...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let points = &app.chart.chart.prices;
    if points.is_empty() {
        let hint = if app.chart.coin_id.is_some() {
            "no chart to draw"
        } else {
            "press Enter on a coin to load its chart"
        };
        frame.render_widget(
            Paragraph::new(hint)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let data: Vec<(f64, f64)> = points.iter().map(|p| (p.0, p.1)).collect();
    let (x_min, x_max) = (data[0].0, data[data.len() - 1].0);
    let (y_min, y_max) = app
        .chart
        .chart
        .price_bounds()
        .unwrap_or((0.0, 1.0));
    // Pad the y axis slightly so a flat series is still visible
    let pad = ((y_max - y_min) * 0.05).max(y_max.abs() * 0.001 + f64::EPSILON);

    let rising = data[data.len() - 1].1 >= data[0].1;
    let dataset = Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(if rising { Color::Green } else { Color::Red }))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![fmt_chart_date(x_min), fmt_chart_date(x_max)])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min - pad, y_max + pad])
                .labels(vec![fmt_price(y_min), fmt_price(y_max)])
                .style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(chart, area);
}

fn render_portfolio(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Portfolio;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            " Portfolio - total {} ",
            fmt_price(app.valuation.total)
        ))
        .border_style(if focused {
            Style::default().fg(Color::Blue)
        } else {
            Style::default()
        });

    if app.valuation.lines.is_empty() {
        frame.render_widget(
            Paragraph::new("empty - press 'a' to add a holding")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Coin", "Amount", "Price", "Value"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .valuation
        .lines
        .iter()
        .map(|line| {
            let price = match line.price {
                Some(p) => fmt_price(p),
                None => "-".to_string(),
            };
            Row::new(vec![
                Cell::from(line.coin.clone()),
                Cell::from(format!("{}", line.amount)),
                Cell::from(price),
                Cell::from(fmt_price(line.value)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(10),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut cursor = TableState::default();
    cursor.select(focused.then_some(
        app.portfolio_selected
            .min(app.valuation.lines.len().saturating_sub(1)),
    ));
    frame.render_stateful_widget(table, area, &mut cursor);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status {
        Some(StatusLine::Error(msg)) => {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Red)))
        }
        Some(StatusLine::Info(msg)) => {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Green)))
        }
        None => Line::from(Span::styled(
            "q quit | / search | a add | x remove | f fav | enter chart | d range | v focus | r refresh | n/p/m/1/2/7 sort",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

// Formatting helpers

fn fmt_price(value: f64) -> String {
    if value.abs() >= 1.0 || value == 0.0 {
        format!("${:.2}", value)
    } else {
        format!("${:.6}", value)
    }
}

fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("^ {:.2}%", v.abs()),
        Some(v) => format!("v {:.2}%", v.abs()),
        None => "-".to_string(),
    }
}

fn change_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v >= 0.0 => Color::Green,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    }
}

fn fmt_chart_date(timestamp_ms: f64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formatting_scales_precision() {
        assert_eq!(fmt_price(43250.1234), "$43250.12");
        assert_eq!(fmt_price(0.000001), "$0.000001");
        assert_eq!(fmt_price(0.0), "$0.00");
    }

    #[test]
    fn negative_axis_labels_keep_two_decimals() {
        // A padded y axis can dip below zero for cheap coins
        assert_eq!(fmt_price(-2.5), "$-2.50");
        assert_eq!(fmt_price(-0.25), "$-0.250000");
    }

    #[test]
    fn percent_formatting_handles_missing_values() {
        assert_eq!(fmt_percent(Some(2.045)), "^ 2.05%");
        assert_eq!(fmt_percent(Some(-0.87)), "v 0.87%");
        assert_eq!(fmt_percent(None), "-");
        assert_eq!(change_color(None), Color::DarkGray);
    }
}
