use chrono::{Datelike, Days, Duration, Months, NaiveDate};
use ratatui::widgets::ListState;
use std::collections::HashMap;
use std::time::Instant;

use crate::Config;
use crate::database::{Database, DatabaseError};
use crate::launcher::Launcher;
use crate::models::{Item, ItemPayload};
use crate::stats::{self, YearlySummary};
use crate::tags::normalize_tag;

/// The four navigation states. Calendar is the root; the others return
/// to it on Esc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Calendar,
    DayDetail,
    TagFilter,
    Stats,
}

#[derive(Debug, Clone)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

impl Default for StatusState {
    fn default() -> Self {
        Self {
            message: None,
            message_time: None,
        }
    }
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub database: Database,
    pub launcher: Box<dyn Launcher>,

    // Navigation state
    pub view: View,
    pub focused_date: NaiveDate,
    /// Item count per day-of-month for the focused month
    pub month_counts: HashMap<u32, usize>,

    // Selection state for DayDetail and TagFilter
    pub items: Vec<Item>,
    pub selected_index: usize,
    pub list_state: ListState,

    // Tag filter state; Some while the tag name is being typed
    pub tag_input: Option<String>,
    pub active_tag: String,
    /// Live tags snapshot shown while capturing a tag name
    pub known_tags: Vec<String>,

    // Stats state
    pub stats_year: i32,
    pub summary: Option<YearlySummary>,

    pub status: StatusState,
}

impl App {
    pub fn new(
        config: Config,
        database: Database,
        launcher: Box<dyn Launcher>,
    ) -> Result<Self, DatabaseError> {
        let focused_date = database.today();
        let mut app = Self {
            config,
            database,
            launcher,
            view: View::Calendar,
            focused_date,
            month_counts: HashMap::new(),
            items: Vec::new(),
            selected_index: 0,
            list_state: ListState::default(),
            tag_input: None,
            active_tag: String::new(),
            known_tags: Vec::new(),
            stats_year: focused_date.year(),
            summary: None,
            status: StatusState::default(),
        };
        app.refresh_month()?;
        Ok(app)
    }

    /// Focused date as the stored ISO string
    pub fn focused_date_string(&self) -> String {
        self.focused_date.format("%Y-%m-%d").to_string()
    }

    /// Recount items per day for the focused month
    pub fn refresh_month(&mut self) -> Result<(), DatabaseError> {
        let first = self.focused_date.with_day(1).unwrap_or(self.focused_date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .unwrap_or(self.focused_date);

        let items = self.database.query(
            &first.format("%Y-%m-%d").to_string(),
            &last.format("%Y-%m-%d").to_string(),
            None,
            false,
        )?;

        self.month_counts.clear();
        for item in &items {
            if let Ok(day) = item.date[8..10].parse::<u32>() {
                *self.month_counts.entry(day).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    /// Shift the focused date by a number of days (±1 for left/right,
    /// ±7 for up/down)
    pub fn move_focus(&mut self, days: i64) -> Result<(), DatabaseError> {
        if let Some(date) = self.focused_date.checked_add_signed(Duration::days(days)) {
            let month_changed =
                (date.year(), date.month()) != (self.focused_date.year(), self.focused_date.month());
            self.focused_date = date;
            if month_changed {
                self.refresh_month()?;
            }
        }
        Ok(())
    }

    /// Jump a whole month, keeping the day where possible
    pub fn move_month(&mut self, delta: i32) -> Result<(), DatabaseError> {
        let date = if delta >= 0 {
            self.focused_date.checked_add_months(Months::new(delta as u32))
        } else {
            self.focused_date
                .checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        if let Some(date) = date {
            self.focused_date = date;
            self.refresh_month()?;
        }
        Ok(())
    }

    /// Enter DayDetail for the focused date. An empty day is a no-op,
    /// never a fault.
    pub fn enter_day(&mut self) -> Result<(), DatabaseError> {
        let items = self.database.items_on(&self.focused_date_string())?;
        if items.is_empty() {
            self.set_status(format!("No items on {}", self.focused_date_string()));
            return Ok(());
        }
        self.items = items;
        self.selected_index = 0;
        self.view = View::DayDetail;
        self.sync_list_state();
        Ok(())
    }

    /// Cursor up; clamps at the first entry (no wrap)
    pub fn select_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
        self.sync_list_state();
    }

    /// Cursor down; clamps at the last entry (no wrap)
    pub fn select_down(&mut self) {
        if !self.items.is_empty() {
            self.selected_index = (self.selected_index + 1).min(self.items.len() - 1);
        }
        self.sync_list_state();
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected_index)
    }

    /// "Open" the selection: file links go to the launcher, todos toggle,
    /// notes and diary entries show their content in the status line
    pub fn open_selected(&mut self) -> Result<(), DatabaseError> {
        let Some(item) = self.selected_item() else {
            return Ok(());
        };
        let id = item.id.unwrap_or_default();

        match item.payload.clone() {
            ItemPayload::FileLink {
                path,
                preferred_app,
            } => match self.launcher.open(&path, preferred_app.as_deref()) {
                Ok(()) => self.set_status(format!("Opening {}", path)),
                Err(e) => self.set_status(format!("Failed to open {}: {}", path, e)),
            },
            ItemPayload::Todo { .. } => {
                let toggled = self.database.toggle_todo(id)?;
                let label = match toggled.payload {
                    ItemPayload::Todo { checked: true, .. } => "done",
                    _ => "todo",
                };
                self.refresh_items()?;
                self.set_status(format!("Marked as {}", label));
            }
            ItemPayload::Note { content } => self.set_status(content),
            ItemPayload::Diary { title, content, .. } => {
                self.set_status(format!("{}: {}", title, content))
            }
        }
        Ok(())
    }

    /// Soft-delete the selection and clamp the cursor back into bounds
    pub fn delete_selected(&mut self) -> Result<(), DatabaseError> {
        let Some(item) = self.selected_item() else {
            return Ok(());
        };
        let id = item.id.unwrap_or_default();
        let summary = item.summary().to_string();

        self.database.soft_delete(id)?;
        self.refresh_items()?;
        self.set_status(format!("Moved to trash: {}", summary));
        Ok(())
    }

    /// Reload the current list after a mutation and clamp the cursor
    fn refresh_items(&mut self) -> Result<(), DatabaseError> {
        self.items = match self.view {
            View::DayDetail => self.database.items_on(&self.focused_date_string())?,
            View::TagFilter => self.database.items_with_tag(&self.active_tag, false)?,
            _ => Vec::new(),
        };
        if !self.items.is_empty() {
            self.selected_index = self.selected_index.min(self.items.len() - 1);
        } else {
            self.selected_index = 0;
        }
        self.sync_list_state();
        Ok(())
    }

    /// Open the tag filter and start capturing the tag name
    pub fn begin_tag_filter(&mut self) -> Result<(), DatabaseError> {
        self.view = View::TagFilter;
        self.tag_input = Some(String::new());
        self.active_tag.clear();
        self.known_tags = self.database.all_tags()?;
        self.items.clear();
        self.selected_index = 0;
        self.sync_list_state();
        Ok(())
    }

    pub fn tag_input_push(&mut self, c: char) {
        if let Some(input) = self.tag_input.as_mut() {
            input.push(c);
        }
    }

    pub fn tag_input_pop(&mut self) {
        if let Some(input) = self.tag_input.as_mut() {
            input.pop();
        }
    }

    /// Finish tag capture and list the matching items
    pub fn tag_input_submit(&mut self) -> Result<(), DatabaseError> {
        let Some(input) = self.tag_input.clone() else {
            return Ok(());
        };
        let tag = normalize_tag(&input);
        if tag.is_empty() {
            self.set_status("Tag must not be empty".to_string());
            return Ok(());
        }
        self.items = self.database.items_with_tag(&tag, false)?;
        self.active_tag = tag;
        self.tag_input = None;
        self.selected_index = 0;
        self.sync_list_state();
        Ok(())
    }

    pub fn cancel_tag_input(&mut self) {
        self.tag_input = None;
        self.view = View::Calendar;
    }

    /// Direct transition available from any view
    pub fn jump_today(&mut self) -> Result<(), DatabaseError> {
        self.focused_date = self.database.today();
        self.view = View::Calendar;
        self.tag_input = None;
        self.refresh_month()
    }

    /// Direct transition available from any view
    pub fn open_stats(&mut self) -> Result<(), DatabaseError> {
        self.stats_year = self.focused_date.year();
        self.summary = Some(stats::yearly_summary(&self.database, self.stats_year)?);
        self.tag_input = None;
        self.view = View::Stats;
        Ok(())
    }

    pub fn stats_year_delta(&mut self, delta: i32) -> Result<(), DatabaseError> {
        self.stats_year += delta;
        self.summary = Some(stats::yearly_summary(&self.database, self.stats_year)?);
        Ok(())
    }

    /// Esc: back to the calendar from any of the leaf views
    pub fn back(&mut self) -> Result<(), DatabaseError> {
        if self.view != View::Calendar {
            self.view = View::Calendar;
            self.tag_input = None;
            // deletes in the leaf views change the day markers
            self.refresh_month()?;
        }
        Ok(())
    }

    fn sync_list_state(&mut self) {
        if self.items.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    /// Clear the status line a few seconds after it was set
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= 4 {
                self.status.message = None;
                self.status.message_time = None;
            }
        }
    }
}
