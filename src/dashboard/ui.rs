use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use super::app::DashboardApp;
use super::widgets;

pub fn render(frame: &mut Frame, app: &DashboardApp) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(10),
        ])
        .split(size);

    frame.render_widget(widgets::render_form_panel(app), chunks[0]);
    render_charts(frame, app, chunks[1]);
    render_log_panel(frame, app, chunks[2]);
}

fn render_charts(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let chart_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let processing = app.processing_chart();
    let processing_segments = widgets::scope_segments(&processing);
    frame.render_widget(
        widgets::render_latency_chart(&processing, &processing_segments),
        chart_chunks[0],
    );

    let end_to_end = app.end_to_end_chart();
    let end_to_end_segments = widgets::scope_segments(&end_to_end);
    frame.render_widget(
        widgets::render_latency_chart(&end_to_end, &end_to_end_segments),
        chart_chunks[1],
    );
}

fn render_log_panel(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let log_entries: Vec<_> = match app.log_buffer.lock() {
        Ok(logs) => logs.iter().cloned().collect(),
        Err(_) => Vec::new(),
    };

    let log_panel = widgets::render_log_panel(&log_entries, app.log_scroll);
    frame.render_widget(log_panel, area);
}
