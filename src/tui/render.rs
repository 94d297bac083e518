use chrono::{Datelike, Days, Months, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::models::{Item, ItemPayload};
use crate::tui::app::{App, View};
use crate::tui::layout::Layout;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("TIMEMAP")
        .title_alignment(Alignment::Center);
    f.render_widget(outer_block, f.area());

    render_header(f, layout.header_area, app);

    match app.view {
        View::Calendar => {
            render_calendar(f, layout.calendar_area, app);
            render_day_summary(f, layout.side_area, app);
        }
        View::DayDetail => {
            render_calendar(f, layout.calendar_area, app);
            render_item_list(f, layout.side_area, app, "Items");
        }
        View::TagFilter => {
            if app.tag_input.is_some() {
                render_tag_prompt(f, layout.content_area, app);
            } else {
                render_item_list(f, layout.content_area, app, "Tagged items");
            }
        }
        View::Stats => {
            render_stats(f, layout.content_area, app);
        }
    }

    render_status_bar(f, layout.status_area, app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let text = match app.view {
        View::Calendar | View::DayDetail => app.focused_date.format("%B %Y").to_string(),
        View::TagFilter => {
            if app.active_tag.is_empty() {
                "Filter by tag".to_string()
            } else {
                format!("Tag: {}", app.active_tag)
            }
        }
        View::Stats => format!("Statistics {}", app.stats_year),
    };
    let header = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(header, area);
}

fn render_calendar(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    lines.push(Line::from(Span::styled(
        " Mo  Tu  We  Th  Fr  Sa  Su",
        Style::default().add_modifier(Modifier::UNDERLINED),
    )));

    let focused_day = app.focused_date.day();
    for week in calendar_weeks(app.focused_date) {
        let mut spans = Vec::with_capacity(7);
        for slot in week {
            match slot {
                Some(day) => {
                    let marker = if app.month_counts.contains_key(&day) {
                        "·"
                    } else {
                        " "
                    };
                    let mut style = Style::default();
                    if app.month_counts.contains_key(&day) {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    if day == focused_day {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    spans.push(Span::styled(format!(" {:>2}{}", day, marker), style));
                }
                None => spans.push(Span::raw("    ")),
            }
        }
        lines.push(Line::from(spans));
    }

    let calendar = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(calendar, area);
}

/// Month grid, Monday-first, None for leading/trailing blanks
fn calendar_weeks(date: NaiveDate) -> Vec<[Option<u32>; 7]> {
    let first = date.with_day(1).unwrap_or(date);
    let days = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .map(|d| d.day())
        .unwrap_or(28);

    let mut weeks = Vec::with_capacity(6);
    let mut week = [None; 7];
    let mut slot = first.weekday().num_days_from_monday() as usize;
    for day in 1..=days {
        week[slot] = Some(day);
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [None; 7];
            slot = 0;
        }
    }
    if week.iter().any(|d| d.is_some()) {
        weeks.push(week);
    }
    weeks
}

fn render_day_summary(f: &mut Frame, area: Rect, app: &App) {
    let count = app
        .month_counts
        .get(&app.focused_date.day())
        .copied()
        .unwrap_or(0);
    let text = if count == 0 {
        format!("No items on {}.", app.focused_date_string())
    } else {
        format!(
            "{} item(s) on {}.\n\nPress {} to view.",
            count,
            app.focused_date_string(),
            app.config.key_bindings.select
        )
    };
    let panel = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Day"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn render_item_list(f: &mut Frame, area: Rect, app: &mut App, title: &str) {
    if app.items.is_empty() {
        let empty = Paragraph::new("No items.")
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        f.render_widget(empty, area);
        return;
    }

    let max_width = area.width.saturating_sub(4) as usize;
    let show_date = app.view == View::TagFilter;
    let entries: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| ListItem::new(item_line(item, show_date, max_width)))
        .collect();

    let list = List::new(entries)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ({})", title, app.items.len())),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn item_line(item: &Item, show_date: bool, max_width: usize) -> String {
    let icon = match &item.payload {
        ItemPayload::FileLink { .. } => "📁",
        ItemPayload::Note { .. } => "📝",
        ItemPayload::Diary { mood, .. } => mood.icon(),
        ItemPayload::Todo { checked: true, .. } => "☑",
        ItemPayload::Todo { checked: false, .. } => "☐",
    };

    let mut line = if show_date {
        // Tag results span dates, so each row carries its own
        format!("{}  {} {}", item.date, icon, item.summary())
    } else {
        format!("{} {}", icon, item.summary())
    };
    if !item.tags.is_empty() {
        line.push_str(&format!("  [{}]", item.tags.join(", ")));
    }

    if line.chars().count() > max_width {
        line = line.chars().take(max_width.saturating_sub(3)).collect::<String>() + "...";
    }
    line
}

fn render_tag_prompt(f: &mut Frame, area: Rect, app: &App) {
    let input = app.tag_input.as_deref().unwrap_or("");
    let mut lines = vec![
        Line::from(format!("Tag: {}_", input)),
        Line::from(""),
    ];
    if app.known_tags.is_empty() {
        lines.push(Line::from("No tags yet."));
    } else {
        lines.push(Line::from(Span::styled(
            "Known tags:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for tag in &app.known_tags {
            lines.push(Line::from(format!("  {}", tag)));
        }
    }

    let prompt = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Filter by tag"));
    f.render_widget(prompt, area);
}

fn render_stats(f: &mut Frame, area: Rect, app: &App) {
    let Some(summary) = &app.summary else {
        let empty = Paragraph::new("No statistics loaded.")
            .block(Block::default().borders(Borders::ALL).title("Statistics"));
        f.render_widget(empty, area);
        return;
    };

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let max_count = summary.monthly_item_counts.iter().max().copied().unwrap_or(0);

    let mut lines = Vec::with_capacity(17);
    for (i, count) in summary.monthly_item_counts.iter().enumerate() {
        let bar_len = if max_count == 0 {
            0
        } else {
            (*count as usize * 20).div_ceil(max_count as usize)
        };
        lines.push(Line::from(format!(
            "{}  {:<20}  {}",
            MONTHS[i],
            "█".repeat(bar_len),
            count
        )));
    }

    lines.push(Line::from(""));
    let moods = summary
        .mood_distribution
        .iter()
        .map(|(mood, count)| format!("{} {}", mood.icon(), count))
        .collect::<Vec<_>>()
        .join("   ");
    lines.push(Line::from(format!("Moods: {}", moods)));

    let percent = (summary.todo_completion_ratio * 100.0).round() as u32;
    lines.push(Line::from(format!(
        "Todos: {}/{} done ({}%)",
        summary.todos_done, summary.todos_total, percent
    )));

    let stats = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Statistics {}", summary.year)),
    );
    f.render_widget(stats, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let keys = &app.config.key_bindings;
    let (content, style) = if let Some(msg) = &app.status.message {
        let mut msg = msg.clone();
        let max_width = area.width as usize;
        if msg.chars().count() > max_width {
            msg = msg.chars().take(max_width.saturating_sub(3)).collect::<String>() + "...";
        }
        (msg, Style::default().add_modifier(Modifier::REVERSED))
    } else {
        let hints = match app.view {
            View::Calendar => format!(
                "arrows: move • {}: open day • {}/{}: month • {}: tag • {}: stats • {}: today • {}: quit",
                keys.select, keys.prev_month, keys.next_month, keys.tag_filter, keys.stats,
                keys.today, keys.quit
            ),
            View::DayDetail => format!(
                "{}/{}: select • {}: open • {}: trash • Esc: back",
                keys.list_up, keys.list_down, keys.select, keys.delete
            ),
            View::TagFilter => {
                if app.tag_input.is_some() {
                    "type a tag • Enter: filter • Esc: cancel".to_string()
                } else {
                    format!(
                        "{}/{}: select • {}: open • {}: trash • Esc: back",
                        keys.list_up, keys.list_down, keys.select, keys.delete
                    )
                }
            }
            View::Stats => "←/→: change year • Esc: back".to_string(),
        };
        (hints, Style::default())
    };

    let paragraph = Paragraph::new(content).style(style);
    f.render_widget(paragraph, area);
}
