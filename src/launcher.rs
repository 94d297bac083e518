use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};

/// Collaborator that hands a path to an external opener. The engine only
/// depends on this seam; the OS-level wiring stays out here.
pub trait Launcher {
    fn open(&self, path: &str, preferred_app: Option<&str>) -> std::io::Result<()>;
}

/// Resolves an opener command and spawns it detached so the TUI never
/// blocks on the child. Resolution order: the item's preferred app, the
/// configured per-extension command, the platform opener.
pub struct CommandLauncher {
    open_with: HashMap<String, String>,
}

impl CommandLauncher {
    pub fn new(open_with: HashMap<String, String>) -> Self {
        Self { open_with }
    }

    fn resolve(&self, path: &str, preferred_app: Option<&str>) -> String {
        if let Some(app) = preferred_app {
            return app.to_string();
        }
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if let Some(cmd) = ext.and_then(|e| self.open_with.get(&e)) {
            return cmd.clone();
        }
        default_opener().to_string()
    }
}

impl Launcher for CommandLauncher {
    fn open(&self, path: &str, preferred_app: Option<&str>) -> std::io::Result<()> {
        let command = self.resolve(path, preferred_app);
        Command::new(command)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

fn default_opener() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "open"
    }
    #[cfg(not(target_os = "macos"))]
    {
        "xdg-open"
    }
}

/// Records open requests instead of spawning anything. The log handle is
/// shared so tests can inspect it after handing the launcher to an owner.
#[cfg(test)]
pub struct RecordingLauncher {
    opened: std::rc::Rc<std::cell::RefCell<Vec<(String, Option<String>)>>>,
}

#[cfg(test)]
impl RecordingLauncher {
    pub fn new() -> Self {
        Self {
            opened: std::rc::Rc::new(std::cell::RefCell::new(Vec::new())),
        }
    }

    pub fn log(&self) -> std::rc::Rc<std::cell::RefCell<Vec<(String, Option<String>)>>> {
        std::rc::Rc::clone(&self.opened)
    }
}

#[cfg(test)]
impl Launcher for RecordingLauncher {
    fn open(&self, path: &str, preferred_app: Option<&str>) -> std::io::Result<()> {
        self.opened
            .borrow_mut()
            .push((path.to_string(), preferred_app.map(|a| a.to_string())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_app_wins_over_extension_mapping() {
        let mut open_with = HashMap::new();
        open_with.insert("pdf".to_string(), "zathura".to_string());
        let launcher = CommandLauncher::new(open_with);

        assert_eq!(launcher.resolve("/tmp/a.pdf", Some("evince")), "evince");
        assert_eq!(launcher.resolve("/tmp/a.pdf", None), "zathura");
        assert_eq!(launcher.resolve("/tmp/a.PDF", None), "zathura");
        assert_eq!(launcher.resolve("/tmp/a.xyz", None), default_opener());
        assert_eq!(launcher.resolve("/tmp/noext", None), default_opener());
    }
}
