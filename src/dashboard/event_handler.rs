use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use super::app::DashboardApp;
use crate::models::DeploymentScope;

const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Requests the event loop acts on outside the form state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartRun,
}

pub fn handle_events(app: &mut DashboardApp) -> io::Result<Option<Action>> {
    if event::poll(POLL_TIMEOUT)? {
        if let Event::Key(key_event) = event::read()? {
            return Ok(handle_key_event(app, key_event));
        }
    }
    Ok(None)
}

fn handle_key_event(app: &mut DashboardApp, key: KeyEvent) -> Option<Action> {
    if key.kind != event::KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Enter | KeyCode::Char('s') => {
            if app.running {
                tracing::warn!("A run is already in progress; ignoring start");
            } else {
                return Some(Action::StartRun);
            }
        }
        KeyCode::Up => {
            app.log_scroll = app.log_scroll.saturating_sub(1);
        }
        KeyCode::Down => {
            app.log_scroll = app.log_scroll.saturating_add(1);
        }
        KeyCode::PageUp => {
            app.log_scroll = app.log_scroll.saturating_sub(10);
        }
        KeyCode::PageDown => {
            app.log_scroll = app.log_scroll.saturating_add(10);
        }
        KeyCode::Home => {
            app.log_scroll = 0;
        }
        // Form controls are frozen while a run is in progress
        _ if app.running => {}
        KeyCode::Right | KeyCode::Char('b') => app.next_backend(),
        KeyCode::Left => app.previous_backend(),
        KeyCode::Char('g') => app.toggle_scope(DeploymentScope::Global),
        KeyCode::Char('r') => app.toggle_scope(DeploymentScope::Regional),
        KeyCode::Char('c') => app.cycle_query_count(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::RunPlan;
    use crate::models::BackendId;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn create_test_app() -> DashboardApp {
        let log_buffer = Arc::new(Mutex::new(VecDeque::new()));
        DashboardApp::new(
            vec![BackendId::new("sqlite"), BackendId::new("turso")],
            &RunPlan::default(),
            log_buffer,
        )
    }

    fn press(app: &mut DashboardApp, code: KeyCode) -> Option<Action> {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_quit_key() {
        let mut app = create_test_app();
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));

        assert!(app.should_quit);
    }

    #[test]
    fn test_escape_key() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c() {
        let mut app = create_test_app();
        assert!(!app.should_quit);

        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_key_event(&mut app, key);

        assert!(app.should_quit);
        assert_eq!(app.query_count, 1);
    }

    #[test]
    fn test_enter_starts_run() {
        let mut app = create_test_app();
        assert_eq!(press(&mut app, KeyCode::Enter), Some(Action::StartRun));
        assert_eq!(press(&mut app, KeyCode::Char('s')), Some(Action::StartRun));
    }

    #[test]
    fn test_enter_ignored_while_running() {
        let mut app = create_test_app();
        app.running = true;

        assert_eq!(press(&mut app, KeyCode::Enter), None);
        assert_eq!(press(&mut app, KeyCode::Char('s')), None);
        assert!(app.running);
    }

    #[test]
    fn test_scope_toggles() {
        let mut app = create_test_app();

        press(&mut app, KeyCode::Char('g'));
        assert!(!app.global_enabled);

        press(&mut app, KeyCode::Char('r'));
        assert!(!app.regional_enabled);

        press(&mut app, KeyCode::Char('g'));
        assert!(app.global_enabled);
    }

    #[test]
    fn test_backend_and_count_keys() {
        let mut app = create_test_app();

        press(&mut app, KeyCode::Right);
        assert_eq!(app.selected_backend().unwrap().as_str(), "turso");
        press(&mut app, KeyCode::Left);
        assert_eq!(app.selected_backend().unwrap().as_str(), "sqlite");

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.query_count, 2);
    }

    #[test]
    fn test_form_frozen_while_running() {
        let mut app = create_test_app();
        app.running = true;

        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Right);

        assert!(app.global_enabled);
        assert_eq!(app.query_count, 1);
        assert_eq!(app.selected_backend().unwrap().as_str(), "sqlite");

        // Logs stay scrollable
        press(&mut app, KeyCode::Down);
        assert_eq!(app.log_scroll, 1);
    }

    #[test]
    fn test_scroll_up() {
        let mut app = create_test_app();
        app.log_scroll = 5;

        press(&mut app, KeyCode::Up);

        assert_eq!(app.log_scroll, 4);
    }

    #[test]
    fn test_scroll_up_at_zero() {
        let mut app = create_test_app();
        app.log_scroll = 0;

        press(&mut app, KeyCode::Up);

        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn test_page_up_and_down() {
        let mut app = create_test_app();
        app.log_scroll = 15;

        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.log_scroll, 5);

        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.log_scroll, 15);

        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn test_home_key() {
        let mut app = create_test_app();
        app.log_scroll = 100;

        press(&mut app, KeyCode::Home);

        assert_eq!(app.log_scroll, 0);
    }
}
