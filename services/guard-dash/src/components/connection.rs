// services/guard-dash/src/components/connection.rs
//
// Connection status panel

use ratatui::prelude::*;
use ratatui::widgets::*;

use super::colors;
use crate::source::DataSource;
use crate::state::DashboardState;

const POLL_ENDPOINTS: [&str; 3] = [
    "/images - GET endpoint to list all captured images",
    "/uploads/{filename} - GET endpoint to serve image files",
    "/door-control - POST endpoint to control the door lock",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPanel<'a> {
    pub is_connected: bool,
    pub url: &'a str,
    pub is_preview: bool,
    /// Which strategy feeds the dashboard ("poll", "push", "demo")
    pub source: &'a str,
}

impl<'a> ConnectionPanel<'a> {
    pub fn new(state: &DashboardState, source: &'a dyn DataSource) -> Self {
        Self {
            is_connected: state.connected,
            url: source.endpoint(),
            is_preview: state.demo_mode,
            source: source.name(),
        }
    }

    /// The reconnect action is offered only when genuinely disconnected.
    pub fn reconnect_available(&self) -> bool {
        !self.is_connected && !self.is_preview
    }

    pub fn headline(&self) -> &'static str {
        match (self.is_preview, self.is_connected, self.source) {
            (true, _, _) => "Preview Mode Active",
            (false, true, "push") => "WebSocket Connection Established",
            (false, false, "push") => "WebSocket Connection Failed",
            (false, true, _) => "Backend Reachable",
            (false, false, _) => "Backend Unreachable",
        }
    }

    pub fn description(&self) -> &'static str {
        if self.is_preview {
            "Running in preview mode with sample data. No backend connection is established."
        } else if self.is_connected {
            "Images will appear here as they are captured."
        } else {
            "Unable to reach the door system. Check that the device is online and the address is correct."
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let (badge, badge_color) = if self.is_connected {
            (" Connected ", colors::SUCCESS)
        } else {
            (" Disconnected ", colors::RED)
        };

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" CONNECTION STATUS ", Style::default().fg(colors::WHITE).bold()),
                Span::styled(badge, Style::default().fg(colors::BG_DARK).bg(badge_color)),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::SILVER))
            .border_type(BorderType::Rounded)
            .style(Style::default().bg(colors::BG_PANEL));

        let headline_color = if self.is_preview {
            colors::BLUE
        } else if self.is_connected {
            colors::SUCCESS
        } else {
            colors::RED
        };

        let mut lines = vec![
            Line::from(Span::styled(self.headline(), Style::default().fg(headline_color).bold())),
            Line::from(Span::styled(self.description(), Style::default().fg(colors::WHITE))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Server: ", Style::default().fg(colors::SILVER)),
                Span::styled(self.url, Style::default().fg(colors::GOLD)),
            ]),
        ];

        if self.reconnect_available() {
            lines.push(Line::from(vec![
                Span::styled(" [C] ", Style::default().fg(colors::BG_DARK).bg(colors::GOLD)),
                Span::styled(" Reconnect ", Style::default().fg(colors::SILVER)),
            ]));
        }

        if self.source == "poll" {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Required backend endpoints:",
                Style::default().fg(colors::DARK_GOLD),
            )));
            for endpoint in POLL_ENDPOINTS {
                lines.push(Line::from(Span::styled(
                    format!("  {}", endpoint),
                    Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
                )));
            }
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
        frame.render_widget(paragraph, area);
    }
}
