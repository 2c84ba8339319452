// services/guard-dash/src/components/door.rs
//
// Door control panel

use ratatui::prelude::*;
use ratatui::widgets::*;

use super::colors;
use crate::state::DashboardState;

/// Everything the door panel renders is derived from these fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorPanel {
    pub is_locked: bool,
    pub is_connected: bool,
    pub is_preview: bool,
    /// Lock state requested over the push channel, not yet confirmed by the device
    pub awaiting: Option<bool>,
}

impl DoorPanel {
    pub fn from_state(state: &DashboardState) -> Self {
        Self {
            is_locked: state.door_locked,
            is_connected: state.connected,
            is_preview: state.demo_mode,
            awaiting: state.pending_door,
        }
    }

    /// Manual control is blocked only when genuinely disconnected outside demo mode.
    pub fn toggle_enabled(&self) -> bool {
        self.is_connected || self.is_preview
    }

    pub fn status_text(&self) -> &'static str {
        if self.is_locked {
            "Door is currently Locked"
        } else {
            "Door is currently Unlocked"
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_locked {
            "Unlock Door"
        } else {
            "Lock Door"
        }
    }

    pub fn awaiting_text(&self) -> Option<&'static str> {
        match self.awaiting {
            Some(locked) if locked != self.is_locked => Some(if locked {
                "Awaiting confirmation: locking..."
            } else {
                "Awaiting confirmation: unlocking..."
            }),
            _ => None,
        }
    }

    pub fn banner(&self) -> Option<&'static str> {
        if self.is_preview {
            Some("In preview mode, door control is simulated and not connected to actual hardware.")
        } else if !self.is_connected {
            Some("Door control unavailable while disconnected from the system")
        } else {
            None
        }
    }

    fn state_color(&self) -> Color {
        if self.is_locked {
            colors::RED
        } else {
            colors::SUCCESS
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let mut title = vec![Span::styled(
            " DOOR CONTROL ",
            Style::default().fg(colors::WHITE).bold(),
        )];
        if self.is_preview {
            title.push(Span::styled("[PREVIEW] ", Style::default().fg(colors::GOLD)));
        }

        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.state_color()))
            .border_type(BorderType::Rounded)
            .style(Style::default().bg(colors::BG_PANEL));

        let icon = if self.is_locked { "[ LOCKED ]" } else { "[ UNLOCKED ]" };
        let (button_style, key_hint) = if self.toggle_enabled() {
            (
                Style::default().fg(colors::BG_DARK).bg(if self.is_locked { colors::SUCCESS } else { colors::RED }),
                " [SPACE] ",
            )
        } else {
            (
                Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM | Modifier::CROSSED_OUT),
                " [disabled] ",
            )
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(icon, Style::default().fg(self.state_color()).bold())),
            Line::from(""),
            Line::from(Span::styled(self.status_text(), Style::default().fg(colors::WHITE))),
            Line::from(""),
            Line::from(vec![
                Span::styled(format!(" {} ", self.button_label()), button_style),
                Span::styled(key_hint, Style::default().fg(colors::SILVER)),
            ]),
        ];

        if let Some(awaiting) = self.awaiting_text() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(awaiting, Style::default().fg(colors::GOLD).italic())));
        }

        if let Some(banner) = self.banner() {
            let color = if self.is_preview { colors::BLUE } else { colors::GOLD };
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(banner, Style::default().fg(color))));
        }

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
    }
}
