use serde::{Deserialize, Serialize};

/// Closed mood set for diary entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Neutral,
    Stormy,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Happy, Mood::Neutral, Mood::Stormy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Stormy => "stormy",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Neutral => "😐",
            Mood::Stormy => "🌧️",
        }
    }

    pub fn parse(s: &str) -> Option<Mood> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Some(Mood::Happy),
            "neutral" => Some(Mood::Neutral),
            "stormy" => Some(Mood::Stormy),
            _ => None,
        }
    }
}

/// Discriminant for the four item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    FileLink,
    Diary,
    Note,
    Todo,
}

impl ItemKind {
    /// Stable string stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::FileLink => "file",
            ItemKind::Diary => "diary",
            ItemKind::Note => "note",
            ItemKind::Todo => "todo",
        }
    }

    pub fn parse(s: &str) -> Option<ItemKind> {
        match s {
            "file" => Some(ItemKind::FileLink),
            "diary" => Some(ItemKind::Diary),
            "note" => Some(ItemKind::Note),
            "todo" => Some(ItemKind::Todo),
            _ => None,
        }
    }
}

/// Kind-specific fields of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemPayload {
    FileLink {
        path: String,
        preferred_app: Option<String>,
    },
    Diary {
        title: String,
        mood: Mood,
        content: String,
    },
    Note {
        content: String,
    },
    Todo {
        content: String,
        checked: bool,
    },
}

impl ItemPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemPayload::FileLink { .. } => ItemKind::FileLink,
            ItemPayload::Diary { .. } => ItemKind::Diary,
            ItemPayload::Note { .. } => ItemKind::Note,
            ItemPayload::Todo { .. } => ItemKind::Todo,
        }
    }
}

/// A dated record: common envelope plus a kind payload.
/// `id`, `date` and the kind are immutable once stored; moving an item to
/// another date is a delete + recreate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<i64>,
    pub date: String, // ISO 8601: YYYY-MM-DD
    pub tags: Vec<String>,
    pub deleted: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub payload: ItemPayload,
}

impl Item {
    pub fn new(date: String, payload: ItemPayload, now: String) -> Self {
        Self {
            id: None,
            date,
            tags: Vec::new(),
            deleted: false,
            deleted_at: None,
            created_at: now.clone(),
            updated_at: now,
            payload,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }

    /// Only notes and diary entries can be rendered to markdown
    pub fn is_exportable(&self) -> bool {
        matches!(self.kind(), ItemKind::Note | ItemKind::Diary)
    }

    /// Short text shown in list views and status messages
    pub fn summary(&self) -> &str {
        match &self.payload {
            ItemPayload::FileLink { path, .. } => path,
            ItemPayload::Diary { title, .. } => title,
            ItemPayload::Note { content } => content,
            ItemPayload::Todo { content, .. } => content,
        }
    }
}

/// Partial update applied through the store. Carries no date or kind
/// fields: those are immutable by construction.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub checked: Option<bool>,
    pub preferred_app: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.mood.is_none()
            && self.checked.is_none()
            && self.preferred_app.is_none()
            && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_parse_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(Mood::parse(mood.as_str()), Some(mood));
        }
        assert_eq!(Mood::parse("HAPPY"), Some(Mood::Happy));
        assert_eq!(Mood::parse("ecstatic"), None);
    }

    #[test]
    fn only_notes_and_diaries_export() {
        let note = Item::new(
            "2024-01-01".into(),
            ItemPayload::Note { content: "n".into() },
            "2024-01-01 12:00:00".into(),
        );
        let todo = Item::new(
            "2024-01-01".into(),
            ItemPayload::Todo { content: "t".into(), checked: false },
            "2024-01-01 12:00:00".into(),
        );
        assert!(note.is_exportable());
        assert!(!todo.is_exportable());
    }
}
