// services/guard-dash/src/components/mod.rs
//
// Terminal panels for the door-access dashboard
//

pub mod connection;
pub mod door;
pub mod gallery;
pub mod header;
pub mod log;

use ratatui::prelude::*;
use ratatui::widgets::Block;

pub use connection::ConnectionPanel;
pub use door::DoorPanel;

use crate::controller::Controller;

// Color palette: Red, White, Silver, Gold
pub mod colors {
    use ratatui::style::Color;

    pub const RED: Color = Color::Rgb(220, 50, 47);
    pub const DARK_RED: Color = Color::Rgb(139, 0, 0);
    pub const WHITE: Color = Color::Rgb(253, 246, 227);
    pub const SILVER: Color = Color::Rgb(147, 161, 161);
    pub const GOLD: Color = Color::Rgb(255, 193, 37);
    pub const DARK_GOLD: Color = Color::Rgb(184, 134, 11);
    pub const BLUE: Color = Color::Rgb(38, 139, 210);
    pub const BG_DARK: Color = Color::Rgb(0, 20, 30);
    pub const BG_PANEL: Color = Color::Rgb(7, 30, 41);
    pub const SUCCESS: Color = Color::Rgb(133, 153, 0);
}

pub fn draw_ui(frame: &mut Frame, controller: &Controller) {
    let state = controller.state();
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(colors::BG_DARK)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(12), // Door + connection
            Constraint::Min(8),     // Gallery + activity
            Constraint::Length(3),  // Footer
        ])
        .split(area);

    header::draw_header(frame, chunks[0], state, controller.source().name());

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    DoorPanel::from_state(state).draw(frame, panels[0]);
    ConnectionPanel::new(state, controller.source()).draw(frame, panels[1]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);

    gallery::draw_gallery(frame, main[0], state);
    log::draw_activity_panel(frame, main[1], state);
    log::draw_footer(frame, chunks[3], state);

    if state.expanded_image().is_some() {
        gallery::draw_expanded(frame, area, state);
    }
}
