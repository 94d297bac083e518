use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{Item, ItemKind, ItemPayload};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("items of kind '{}' cannot be exported", .0.as_str())]
    UnsupportedKind(ItemKind),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Which exportable kinds an export run covers. Todos and file links are
/// structurally excluded: there is no variant that admits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Note,
    Diary,
    Both,
}

impl ExportKind {
    fn kinds(&self) -> &'static [ItemKind] {
        match self {
            ExportKind::Note => &[ItemKind::Note],
            ExportKind::Diary => &[ItemKind::Diary],
            ExportKind::Both => &[ItemKind::Note, ItemKind::Diary],
        }
    }
}

/// Markdown template plus the diary front-matter toggle. The body text is
/// opaque user configuration; see `config::load_template`.
#[derive(Debug, Clone)]
pub struct Template {
    pub body: String,
    pub front_matter: bool,
}

/// One rendered export file
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub date: String,
    pub contents: String,
}

/// Render one item through the template. Recognized placeholders are
/// {title}, {date}, {mood}, {tags}, {content}; anything else is left
/// verbatim so older templates keep working against newer versions.
pub fn render_item(item: &Item, template: &Template) -> Result<String, ExportError> {
    let (title, mood, content) = match &item.payload {
        ItemPayload::Diary {
            title,
            mood,
            content,
        } => (title.clone(), mood.as_str(), content.as_str()),
        ItemPayload::Note { content } => ("Note".to_string(), "", content.as_str()),
        _ => return Err(ExportError::UnsupportedKind(item.kind())),
    };

    let tags = item.tags.join(", ");
    let rendered = template
        .body
        .replace("{title}", &title)
        .replace("{date}", &item.date)
        .replace("{mood}", mood)
        .replace("{tags}", &tags)
        .replace("{content}", &paragraphs(content));

    // Diary entries get a YAML front-matter block when the toggle is on
    if template.front_matter && item.kind() == ItemKind::Diary {
        let mut fm = String::from("---\n");
        fm.push_str(&format!("title: {}\n", title));
        fm.push_str(&format!("date: {}\n", item.date));
        fm.push_str(&format!("mood: {}\n", mood));
        fm.push_str(&format!("tags: [{}]\n", tags));
        fm.push_str("---\n\n");
        fm.push_str(&rendered);
        return Ok(fm);
    }

    Ok(rendered)
}

/// Render every exportable item in the inclusive date range. Deleted
/// items never appear; the store query already excludes them. Filenames
/// are derived from date + kind + sanitized title; collisions within the
/// batch get -1, -2, ... suffixes in encounter order. Read-only over the
/// store.
pub fn export_range(
    db: &Database,
    start: &str,
    end: &str,
    kind_filter: ExportKind,
    template: &Template,
) -> Result<Vec<ExportFile>, ExportError> {
    let items = db.query(start, end, Some(kind_filter.kinds()), false)?;

    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut files = Vec::with_capacity(items.len());
    for item in &items {
        let contents = render_item(item, template)?;
        let base = base_filename(item);
        let filename = match seen.get_mut(&base) {
            Some(count) => {
                let name = format!("{}-{}.md", base, count);
                *count += 1;
                name
            }
            None => {
                seen.insert(base.clone(), 1);
                format!("{}.md", base)
            }
        };
        files.push(ExportFile {
            filename,
            date: item.date.clone(),
            contents,
        });
    }
    Ok(files)
}

/// Write rendered files under `base_dir`, optionally split into YYYY/MM/
/// subfolders. Returns the number of files written.
pub fn write_files(
    files: &[ExportFile],
    base_dir: &Path,
    split_folders: bool,
) -> Result<usize, ExportError> {
    for file in files {
        let target_dir = if split_folders {
            // date is validated ISO 8601, YYYY-MM-DD
            base_dir.join(&file.date[0..4]).join(&file.date[5..7])
        } else {
            base_dir.to_path_buf()
        };
        std::fs::create_dir_all(&target_dir)?;
        std::fs::write(target_dir.join(&file.filename), &file.contents)?;
    }
    Ok(files.len())
}

/// Filename stem without extension or collision suffix
fn base_filename(item: &Item) -> String {
    match &item.payload {
        ItemPayload::Diary { title, .. } => {
            let safe = sanitize_title(title);
            if safe.is_empty() {
                format!("{}+diary", item.date)
            } else {
                format!("{}+{}", item.date, safe)
            }
        }
        _ => format!("{}+note", item.date),
    }
}

/// Keep alphanumerics, spaces, underscores and dashes; spaces become
/// underscores
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_' || *c == '-')
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Single newlines become blank-line paragraph breaks in markdown
fn paragraphs(content: &str) -> String {
    content.replace('\n', "\n\n")
}

/// The default template written on first use
pub const DEFAULT_TEMPLATE: &str = "# {title}\n\n*{date}*\n\n{content}\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemPayload, Mood};
    use crate::utils::FixedClock;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("app.db");
        let db = Database::with_clock(
            path.to_str().expect("utf-8 temp path"),
            Box::new(FixedClock::new("2024-03-01")),
        )
        .expect("open db");
        (dir, db)
    }

    fn template(body: &str, front_matter: bool) -> Template {
        Template {
            body: body.to_string(),
            front_matter,
        }
    }

    fn diary(db: &Database, date: &str, title: &str) -> Item {
        db.create(
            Some(date),
            ItemPayload::Diary {
                title: title.to_string(),
                mood: Mood::Happy,
                content: "line one\nline two".to_string(),
            },
            &["work".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn render_fills_recognized_placeholders() {
        let (_dir, db) = test_db();
        let item = diary(&db, "2024-03-01", "Big Day");
        let out = render_item(&item, &template("{title} on {date}: {content}", false)).unwrap();
        assert_eq!(out, "Big Day on 2024-03-01: line one\n\nline two");
    }

    #[test]
    fn render_leaves_unrecognized_placeholders_verbatim() {
        let (_dir, db) = test_db();
        let item = diary(&db, "2024-03-01", "Big Day");
        let out = render_item(&item, &template("{title} {weather}", false)).unwrap();
        assert_eq!(out, "Big Day {weather}");
    }

    #[test]
    fn diary_gets_front_matter_when_enabled() {
        let (_dir, db) = test_db();
        let item = diary(&db, "2024-03-01", "Big Day");
        let out = render_item(&item, &template("{content}", true)).unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.contains("mood: happy\n"));
        assert!(out.contains("tags: [work]\n"));

        let note = db
            .create(
                Some("2024-03-01"),
                ItemPayload::Note {
                    content: "plain".to_string(),
                },
                &[],
            )
            .unwrap();
        let out = render_item(&note, &template("{content}", true)).unwrap();
        assert!(!out.starts_with("---"));
    }

    #[test]
    fn todos_and_file_links_are_unsupported() {
        let (dir, db) = test_db();
        let todo = db
            .create(
                None,
                ItemPayload::Todo {
                    content: "t".to_string(),
                    checked: false,
                },
                &[],
            )
            .unwrap();
        assert!(matches!(
            render_item(&todo, &template("{content}", false)),
            Err(ExportError::UnsupportedKind(ItemKind::Todo))
        ));

        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"x").unwrap();
        let link = db
            .create(
                None,
                ItemPayload::FileLink {
                    path: file.to_string_lossy().to_string(),
                    preferred_app: None,
                },
                &[],
            )
            .unwrap();
        assert!(matches!(
            render_item(&link, &template("{content}", false)),
            Err(ExportError::UnsupportedKind(ItemKind::FileLink))
        ));
    }

    #[test]
    fn export_excludes_todos_and_deleted_items() {
        let (_dir, db) = test_db();
        diary(&db, "2024-03-01", "Kept");
        db.create(
            Some("2024-03-01"),
            ItemPayload::Todo {
                content: "never exported".to_string(),
                checked: false,
            },
            &[],
        )
        .unwrap();
        let doomed = db
            .create(
                Some("2024-03-02"),
                ItemPayload::Note {
                    content: "trashed".to_string(),
                },
                &[],
            )
            .unwrap();
        db.soft_delete(doomed.id.unwrap()).unwrap();

        let files = export_range(
            &db,
            "2024-03-01",
            "2024-03-31",
            ExportKind::Both,
            &template("{content}", false),
        )
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "2024-03-01+Kept.md");
    }

    #[test]
    fn kind_filter_narrows_the_batch() {
        let (_dir, db) = test_db();
        diary(&db, "2024-03-01", "Entry");
        db.create(
            Some("2024-03-01"),
            ItemPayload::Note {
                content: "note".to_string(),
            },
            &[],
        )
        .unwrap();

        let tpl = template("{content}", false);
        let notes = export_range(&db, "2024-03-01", "2024-03-31", ExportKind::Note, &tpl).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].filename, "2024-03-01+note.md");

        let diaries =
            export_range(&db, "2024-03-01", "2024-03-31", ExportKind::Diary, &tpl).unwrap();
        assert_eq!(diaries.len(), 1);
        assert_eq!(diaries[0].filename, "2024-03-01+Entry.md");
    }

    #[test]
    fn colliding_filenames_get_numeric_suffixes() {
        let (_dir, db) = test_db();
        for text in ["first", "second", "third"] {
            db.create(
                Some("2024-03-01"),
                ItemPayload::Note {
                    content: text.to_string(),
                },
                &[],
            )
            .unwrap();
        }

        let files = export_range(
            &db,
            "2024-03-01",
            "2024-03-01",
            ExportKind::Note,
            &template("{content}", false),
        )
        .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "2024-03-01+note.md",
                "2024-03-01+note-1.md",
                "2024-03-01+note-2.md"
            ]
        );
    }

    #[test]
    fn sanitized_titles_drop_odd_characters() {
        let (_dir, db) = test_db();
        diary(&db, "2024-03-01", "Trip: to / the (sea)!");
        let files = export_range(
            &db,
            "2024-03-01",
            "2024-03-01",
            ExportKind::Diary,
            &template("{content}", false),
        )
        .unwrap();
        assert_eq!(files[0].filename, "2024-03-01+Trip_to__the_sea.md");
    }

    #[test]
    fn write_files_can_split_into_year_month_folders() {
        let (_dir, db) = test_db();
        diary(&db, "2024-03-01", "Entry");
        let files = export_range(
            &db,
            "2024-03-01",
            "2024-03-01",
            ExportKind::Diary,
            &template("{content}", false),
        )
        .unwrap();

        let out = TempDir::new().unwrap();
        let count = write_files(&files, out.path(), true).unwrap();
        assert_eq!(count, 1);
        assert!(out.path().join("2024/03/2024-03-01+Entry.md").exists());

        let flat = TempDir::new().unwrap();
        write_files(&files, flat.path(), false).unwrap();
        assert!(flat.path().join("2024-03-01+Entry.md").exists());
    }
}
