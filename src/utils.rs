use chrono::NaiveDate;
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

fn app_name(profile: Profile) -> &'static str {
    match profile {
        Profile::Dev => "timemap-dev",
        Profile::Prod => "timemap",
    }
}

/// Get the configuration directory path for timemap
/// If profile is Dev, uses "timemap-dev" instead of "timemap"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "timemap", app_name(profile))
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for timemap
/// If profile is Dev, uses "timemap-dev" instead of "timemap"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "timemap", app_name(profile))
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Source of "today" and record timestamps. Injected into the store so
/// default-date operations stay deterministic under test.
pub trait Clock {
    /// Current calendar date
    fn today(&self) -> NaiveDate;

    /// Current timestamp as a `%Y-%m-%d %H:%M:%S` string
    fn timestamp(&self) -> String;

    /// Current date as an ISO 8601 string (YYYY-MM-DD)
    fn today_string(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }
}

/// Wall-clock implementation used everywhere outside tests
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn timestamp(&self) -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Clock pinned to a single instant
pub struct FixedClock {
    pub date: NaiveDate,
}

impl FixedClock {
    pub fn new(date_str: &str) -> Self {
        let date = parse_date(date_str).expect("FixedClock takes a valid YYYY-MM-DD date");
        Self { date }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn timestamp(&self) -> String {
        format!("{} 12:00:00", self.date.format("%Y-%m-%d"))
    }
}

/// Parsed key binding information
#[derive(Debug, Clone)]
pub struct ParsedKeyBinding {
    pub key_code: crossterm::event::KeyCode,
    pub requires_ctrl: bool,
}

/// Parse a key binding string from config into a ParsedKeyBinding
/// Supports: single keys ("q", "d", "j"), special keys ("Enter", "Esc"),
/// and modifiers ("Ctrl+e")
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();

    if let Some(key_part) = key_str.strip_prefix("Ctrl+") {
        let key_code = parse_key_code(key_part)?;
        return Ok(ParsedKeyBinding {
            key_code,
            requires_ctrl: true,
        });
    }

    let key_code = parse_key_code(key_str)?;
    Ok(ParsedKeyBinding {
        key_code,
        requires_ctrl: false,
    })
}

/// Parse a key code from a string (without modifiers)
fn parse_key_code(key_str: &str) -> Result<crossterm::event::KeyCode, String> {
    use crossterm::event::KeyCode;

    match key_str {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" | "Escape" => Ok(KeyCode::Esc),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "Space" | " " => Ok(KeyCode::Char(' ')),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "PageUp" => Ok(KeyCode::PageUp),
        "PageDown" => Ok(KeyCode::PageDown),
        "Delete" => Ok(KeyCode::Delete),
        _ => {
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso() {
        assert!(parse_date("2024-03-01").is_ok());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::new("2024-03-01");
        assert_eq!(clock.today_string(), "2024-03-01");
        assert_eq!(clock.timestamp(), "2024-03-01 12:00:00");
    }

    #[test]
    fn key_binding_parsing() {
        let plain = parse_key_binding("q").unwrap();
        assert_eq!(plain.key_code, crossterm::event::KeyCode::Char('q'));
        assert!(!plain.requires_ctrl);

        let ctrl = parse_key_binding("Ctrl+e").unwrap();
        assert_eq!(ctrl.key_code, crossterm::event::KeyCode::Char('e'));
        assert!(ctrl.requires_ctrl);

        assert!(parse_key_binding("NoSuchKey").is_err());
    }
}
