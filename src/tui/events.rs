use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;

use crate::database::DatabaseError;
use crate::tui::app::{App, View};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::utils::parse_key_binding;

/// Guard that ensures terminal state is restored even on panic. A TUI
/// left in raw mode or the alternate screen makes the user's terminal
/// unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Manually restore terminal state (called on normal exit)
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Ignore errors, this is already a cleanup path
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check terminal size before entering the alternate screen so the
    // error lands in the normal terminal
    let (width, height) = terminal_size().map_err(TuiError::IoError)?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, minimum required: {}x{}.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        terminal.draw(|f| {
            let layout = Layout::calculate(f.area());
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only process Press events to avoid double-processing on Windows
        if event::poll(std::time::Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key_event) => {
                    if key_event.kind == KeyEventKind::Press
                        && handle_key_event(&mut app, key_event)
                    {
                        break;
                    }
                }
                Event::Resize(_, _) => {
                    // Layout is recalculated on the next draw
                }
                _ => {}
            }
        }
    }

    guard.restore()?;

    Ok(())
}

/// Compare a key event against a configured binding string
fn matches_binding(key: &KeyEvent, binding: &str) -> bool {
    match parse_key_binding(binding) {
        Ok(parsed) => {
            key.code == parsed.key_code
                && parsed.requires_ctrl == key.modifiers.contains(KeyModifiers::CONTROL)
        }
        Err(_) => false,
    }
}

/// Store failures abort the current operation but never the loop; they
/// surface on the status line instead
fn report(app: &mut App, result: Result<(), DatabaseError>) {
    if let Err(e) = result {
        app.set_status(format!("Error: {}", e));
    }
}

/// Translate one key press into a state transition. Returns true when the
/// user asked to quit.
fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    // Tag name capture grabs every key first
    if app.view == View::TagFilter && app.tag_input.is_some() {
        match key.code {
            KeyCode::Esc => app.cancel_tag_input(),
            KeyCode::Enter => {
                let result = app.tag_input_submit();
                report(app, result);
            }
            KeyCode::Backspace => app.tag_input_pop(),
            KeyCode::Char(c) => app.tag_input_push(c),
            _ => {}
        }
        return false;
    }

    let keys = app.config.key_bindings.clone();

    if matches_binding(&key, &keys.quit) {
        return true;
    }

    // Jump-to-today and jump-to-stats are direct transitions from any view
    if matches_binding(&key, &keys.today) {
        let result = app.jump_today();
        report(app, result);
        return false;
    }
    if matches_binding(&key, &keys.stats) && app.view != View::Stats {
        let result = app.open_stats();
        report(app, result);
        return false;
    }

    match app.view {
        View::Calendar => {
            if matches_binding(&key, &keys.select) {
                let result = app.enter_day();
                report(app, result);
            } else if matches_binding(&key, &keys.tag_filter) {
                let result = app.begin_tag_filter();
                report(app, result);
            } else if matches_binding(&key, &keys.prev_month) {
                let result = app.move_month(-1);
                report(app, result);
            } else if matches_binding(&key, &keys.next_month) {
                let result = app.move_month(1);
                report(app, result);
            } else {
                let result = match key.code {
                    KeyCode::Left => app.move_focus(-1),
                    KeyCode::Right => app.move_focus(1),
                    KeyCode::Up => app.move_focus(-7),
                    KeyCode::Down => app.move_focus(7),
                    _ => Ok(()),
                };
                report(app, result);
            }
        }
        View::DayDetail | View::TagFilter => {
            if matches_binding(&key, &keys.select) {
                let result = app.open_selected();
                report(app, result);
            } else if matches_binding(&key, &keys.delete) {
                let result = app.delete_selected();
                report(app, result);
            } else if matches_binding(&key, &keys.list_up) || key.code == KeyCode::Up {
                app.select_up();
            } else if matches_binding(&key, &keys.list_down) || key.code == KeyCode::Down {
                app.select_down();
            } else if key.code == KeyCode::Esc {
                let result = app.back();
                report(app, result);
            }
        }
        View::Stats => match key.code {
            KeyCode::Left => {
                let result = app.stats_year_delta(-1);
                report(app, result);
            }
            KeyCode::Right => {
                let result = app.stats_year_delta(1);
                report(app, result);
            }
            KeyCode::Esc => {
                let result = app.back();
                report(app, result);
            }
            _ => {}
        },
    }

    false
}
