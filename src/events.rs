use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// File written by `e` on the query page.
pub const QUERY_EXPORT_PATH: &str = "query.json";
/// File written by `e` on the state page.
pub const STATE_EXPORT_PATH: &str = "twin_state.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits unless a search input wants it
    if key.code == KeyCode::Char('c')
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && !app.active_search().is_some_and(|s| s.is_active())
    {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Generated query overlay: export or close
    if app.query.generated.is_some() {
        if key.code == KeyCode::Char('e') {
            export_query(app);
        }
        app.query.generated = None;
        return;
    }

    // Search input captures keystrokes while active
    if app.active_search().is_some_and(|s| s.is_active()) {
        handle_search_input(app, key);
        return;
    }

    if app.current_view == View::Query && handle_query_key(app, key) {
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access
        KeyCode::Char('1') => app.set_view(View::Twins),
        KeyCode::Char('2') => app.set_view(View::Detail),
        KeyCode::Char('3') => app.set_view(View::Live),
        KeyCode::Char('4') => app.set_view(View::Query),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),

        KeyCode::Enter => match app.current_view {
            View::Twins => {
                if let Some(dt) = app.selected_twin() {
                    app.open_detail(&dt);
                }
            }
            View::Detail => app.open_selected_property(),
            _ => {}
        },

        // Live chart straight from the twin list
        KeyCode::Char('l') if app.current_view == View::Twins => {
            if let Some(dt) = app.selected_twin() {
                app.open_live(&dt, None);
            }
        }

        // Go back (Esc and Backspace)
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Chart window
        KeyCode::Char('+') | KeyCode::Char('=') if app.current_view == View::Live => {
            app.widen_window()
        }
        KeyCode::Char('-') if app.current_view == View::Live => app.narrow_window(),
        KeyCode::Char('0') if app.current_view == View::Live => app.reset_window(),

        // Reload
        KeyCode::Char('r') => {
            app.reload();
            app.set_status_message("Reloading...".to_string());
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Search
        KeyCode::Char('/') => {
            if let Some(search) = app.active_search_mut() {
                search.start();
            }
        }
        KeyCode::Char('c') => {
            let mut changed = false;
            if let Some(search) = app.active_search_mut() {
                if !search.value().is_empty() {
                    search.clear(|_| changed = true);
                }
            }
            if changed {
                app.search_changed();
            }
        }

        // Export
        KeyCode::Char('e') => match app.current_view {
            View::Detail => {
                let export_path = PathBuf::from(STATE_EXPORT_PATH);
                match app.export_state(&export_path) {
                    Ok(()) => {
                        app.set_status_message(format!("Exported to {}", export_path.display()));
                    }
                    Err(e) => {
                        app.set_status_message(format!("Export failed: {}", e));
                    }
                }
            }
            View::Query => export_query(app),
            _ => {}
        },

        _ => {}
    }
}

fn export_query(app: &mut App) {
    let export_path = PathBuf::from(QUERY_EXPORT_PATH);
    match app.export_query(&export_path) {
        Ok(()) => app.set_status_message(format!("Exported to {}", export_path.display())),
        Err(e) => app.set_status_message(format!("Export failed: {}", e)),
    }
}

/// Handle key input while a search input is active
fn handle_search_input(app: &mut App, key: KeyEvent) {
    let mut changed = false;
    if let Some(search) = app.active_search_mut() {
        search.handle_key(key, |_| changed = true);
    }
    if changed {
        app.search_changed();
    }
}

/// Handle keys specific to the query form.
///
/// Returns false if the key should fall through to the global bindings.
fn handle_query_key(app: &mut App, key: KeyEvent) -> bool {
    let editing = app.query_focus().is_text();

    match key.code {
        KeyCode::Up => app.query_focus_prev(),
        KeyCode::Down => app.query_focus_next(),
        KeyCode::Left => app.query_cycle(false),
        KeyCode::Right => app.query_cycle(true),
        KeyCode::Enter => app.query_activate(),
        KeyCode::Delete => app.query_remove_filter(),
        KeyCode::Char(' ') if !editing => app.query_activate(),
        KeyCode::Char(c) if editing && !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.query_input(c)
        }
        KeyCode::Backspace if editing => app.query_backspace(),
        _ => return false,
    }
    true
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        // Tab clicks (row 1, after header)
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            // Approximate tab positions: " 1:Twins " (0-9), " 2:State " (10-19), ...
            let view = match mouse.column {
                0..=9 => View::Twins,
                10..=19 => View::Detail,
                20..=28 => View::Live,
                _ => View::Query,
            };
            app.set_view(view);
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}
