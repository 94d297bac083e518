use std::collections::BTreeMap;

use crate::database::{Database, DatabaseError};
use crate::models::{ItemPayload, Mood};

/// Yearly aggregates over non-deleted items. Recomputed on demand; the
/// store is personal-scale and a full-year scan is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySummary {
    pub year: i32,
    /// Count of items per month, January first
    pub monthly_item_counts: [u32; 12],
    /// Diary mood counts; every mood is present, zero or not
    pub mood_distribution: BTreeMap<Mood, u32>,
    pub todos_done: u32,
    pub todos_total: u32,
    /// done / total, 0.0 for a year without todos
    pub todo_completion_ratio: f64,
}

/// Pure read over the item store
pub fn yearly_summary(db: &Database, year: i32) -> Result<YearlySummary, DatabaseError> {
    let start = format!("{:04}-01-01", year);
    let end = format!("{:04}-12-31", year);
    let items = db.query(&start, &end, None, false)?;

    let mut monthly_item_counts = [0u32; 12];
    let mut mood_distribution: BTreeMap<Mood, u32> =
        Mood::ALL.iter().map(|m| (*m, 0)).collect();
    let mut todos_done = 0u32;
    let mut todos_total = 0u32;

    for item in &items {
        // dates are validated ISO 8601, so the month slice always parses
        if let Ok(month) = item.date[5..7].parse::<usize>() {
            if (1..=12).contains(&month) {
                monthly_item_counts[month - 1] += 1;
            }
        }
        match &item.payload {
            ItemPayload::Diary { mood, .. } => {
                *mood_distribution.entry(*mood).or_insert(0) += 1;
            }
            ItemPayload::Todo { checked, .. } => {
                todos_total += 1;
                if *checked {
                    todos_done += 1;
                }
            }
            _ => {}
        }
    }

    let todo_completion_ratio = if todos_total == 0 {
        0.0
    } else {
        f64::from(todos_done) / f64::from(todos_total)
    };

    Ok(YearlySummary {
        year,
        monthly_item_counts,
        mood_distribution,
        todos_done,
        todos_total,
        todo_completion_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemPayload;
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

    fn note(content: &str) -> ItemPayload {
        ItemPayload::Note {
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_year_has_zero_ratio_and_counts() {
        let (_dir, db) = test_db();
        let summary = yearly_summary(&db, 2024).unwrap();
        assert_eq!(summary.monthly_item_counts, [0; 12]);
        assert_eq!(summary.todo_completion_ratio, 0.0);
        assert_eq!(summary.mood_distribution.len(), 3);
        assert!(summary.mood_distribution.values().all(|c| *c == 0));
    }

    #[test]
    fn march_scenario_counts_items_and_moods() {
        let (_dir, db) = test_db();
        db.create(
            Some("2024-03-01"),
            ItemPayload::Diary {
                title: "Entry".to_string(),
                mood: Mood::Happy,
                content: "c".to_string(),
            },
            &["work".to_string()],
        )
        .unwrap();
        db.create(Some("2024-03-01"), note("n"), &["work".to_string()])
            .unwrap();

        let summary = yearly_summary(&db, 2024).unwrap();
        assert_eq!(summary.monthly_item_counts[2], 2); // March, 0-indexed
        assert_eq!(summary.mood_distribution[&Mood::Happy], 1);
        assert_eq!(summary.mood_distribution[&Mood::Stormy], 0);
    }

    #[test]
    fn completion_ratio_over_the_year() {
        let (_dir, db) = test_db();
        for (date, checked) in [
            ("2024-01-10", true),
            ("2024-06-15", false),
            ("2024-06-16", true),
            ("2024-12-31", true),
        ] {
            db.create(
                Some(date),
                ItemPayload::Todo {
                    content: "t".to_string(),
                    checked,
                },
                &[],
            )
            .unwrap();
        }
        // outside the year, must not count
        db.create(
            Some("2025-01-01"),
            ItemPayload::Todo {
                content: "t".to_string(),
                checked: true,
            },
            &[],
        )
        .unwrap();

        let summary = yearly_summary(&db, 2024).unwrap();
        assert_eq!(summary.todos_total, 4);
        assert_eq!(summary.todos_done, 3);
        assert_eq!(summary.todo_completion_ratio, 0.75);
    }

    #[test]
    fn deleted_items_do_not_count() {
        let (_dir, db) = test_db();
        let item = db.create(Some("2024-03-01"), note("n"), &[]).unwrap();
        db.soft_delete(item.id.unwrap()).unwrap();
        let summary = yearly_summary(&db, 2024).unwrap();
        assert_eq!(summary.monthly_item_counts, [0; 12]);
    }
}
