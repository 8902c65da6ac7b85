use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph};

use super::app::{DashboardApp, LogEntry};
use crate::harness::ChartSeries;
use crate::models::DeploymentScope;

/// Contiguous runs of present values as `(attempt, ms)` points.
///
/// Gaps split the line: no point is interpolated across a missing sample.
pub fn chart_segments(values: impl Iterator<Item = Option<u64>>) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for (i, value) in values.enumerate() {
        match value {
            Some(ms) => current.push(((i + 1) as f64, ms as f64)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Segments for both scopes of a chart
pub fn scope_segments(chart: &ChartSeries) -> Vec<(DeploymentScope, Vec<(f64, f64)>)> {
    DeploymentScope::ALL
        .into_iter()
        .flat_map(|scope| {
            chart_segments(chart.values(scope))
                .into_iter()
                .map(move |segment| (scope, segment))
        })
        .collect()
}

fn scope_color(scope: DeploymentScope) -> Color {
    match scope {
        DeploymentScope::Global => Color::Cyan,
        DeploymentScope::Regional => Color::Magenta,
    }
}

pub fn render_latency_chart<'a>(
    chart: &ChartSeries,
    segments: &'a [(DeploymentScope, Vec<(f64, f64)>)],
) -> Chart<'a> {
    let mut named = Vec::new();
    let datasets: Vec<Dataset<'a>> = segments
        .iter()
        .map(|(scope, points)| {
            let dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(scope_color(*scope)))
                .data(points);
            // One legend entry per scope
            if named.contains(scope) {
                dataset
            } else {
                named.push(*scope);
                dataset.name(scope.as_str())
            }
        })
        .collect();

    let attempts = chart.points.len().max(1);
    let max_ms = chart.max_value().unwrap_or(0).max(10) as f64 * 1.1;

    let x_labels: Vec<Span> = [
        chart.points.first().map(|p| p.attempt.clone()),
        chart.points.last().map(|p| p.attempt.clone()),
    ]
    .into_iter()
    .flatten()
    .map(Span::raw)
    .collect();

    Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} (ms)", chart.title)),
        )
        .x_axis(
            Axis::default()
                .title("attempt")
                .style(Style::default().fg(Color::Gray))
                .bounds([1.0, attempts as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_ms])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", max_ms / 2.0)),
                    Span::raw(format!("{:.0}", max_ms)),
                ]),
        )
}

pub fn render_form_panel(app: &DashboardApp) -> Paragraph<'static> {
    let key = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let checkbox = |enabled: bool| if enabled { "[x]" } else { "[ ]" };

    let backend = app
        .selected_backend()
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());

    let status_color = if app.running {
        Color::Yellow
    } else {
        Color::Green
    };

    let text = vec![
        Line::from(vec![
            Span::raw("Backend  "),
            Span::styled(format!("< {} >", backend), value),
            Span::styled("  ←/→", key),
        ]),
        Line::from(vec![
            Span::raw("Scopes   "),
            Span::styled(
                format!("{} global", checkbox(app.global_enabled)),
                Style::default().fg(scope_color(DeploymentScope::Global)),
            ),
            Span::styled(" (g)  ", key),
            Span::styled(
                format!("{} regional", checkbox(app.regional_enabled)),
                Style::default().fg(scope_color(DeploymentScope::Regional)),
            ),
            Span::styled(" (r)", key),
        ]),
        Line::from(vec![
            Span::raw("Queries  "),
            Span::styled(app.query_count.to_string(), value),
            Span::styled("  (c)", key),
        ]),
        Line::from(vec![
            Span::raw("Trials   "),
            Span::styled(app.trials.to_string(), value),
        ]),
        Line::from(vec![
            Span::raw("Status   "),
            Span::styled(app.status.clone(), Style::default().fg(status_color)),
        ]),
        Line::from(Span::styled("Enter: run   q: quit", key)),
    ];

    Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Run"))
}

pub fn render_log_panel(logs: &[LogEntry], scroll: usize) -> List<'static> {
    let items: Vec<ListItem> = logs
        .iter()
        .skip(scroll)
        .map(|entry| {
            let level_color = match entry.level {
                tracing::Level::ERROR => Color::Red,
                tracing::Level::WARN => Color::Yellow,
                tracing::Level::INFO => Color::Green,
                tracing::Level::DEBUG => Color::Blue,
                tracing::Level::TRACE => Color::Gray,
            };

            let content = Line::from(vec![
                Span::styled(
                    format!("[{}] ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:5} ", entry.level),
                    Style::default()
                        .fg(level_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(entry.message.clone()),
            ]);

            ListItem::new(content)
        })
        .collect();

    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Logs (↑/↓ to scroll)"),
    )
}
