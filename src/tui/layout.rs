use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub header_area: Rect,
    pub content_area: Rect, // Full-width area used by the stats view
    pub calendar_area: Rect,
    pub side_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Width: 7 calendar columns of 4 chars + side panel; Height: header,
    /// 6 calendar weeks + weekday row, status line, borders
    pub const MIN_WIDTH: u16 = 48;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        // Inner area accounts for the outer border, 1 char on each side
        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header (month / view title)
                Constraint::Min(1),    // Content (calendar + side panel)
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        // Calendar left, day/tag panel right, as in the original layout
        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(vertical[1]);

        Self {
            inner_area,
            header_area: vertical[0],
            content_area: vertical[1],
            calendar_area: horizontal[0],
            side_area: horizontal[1],
            status_area: vertical[2],
        }
    }
}
