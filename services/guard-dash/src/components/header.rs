// services/guard-dash/src/components/header.rs

use ratatui::prelude::*;
use ratatui::widgets::*;

use super::colors;
use crate::state::DashboardState;

/// DEMO / LIVE / DISCONNECTED badge.
pub fn mode_badge(state: &DashboardState) -> (&'static str, Color) {
    if state.demo_mode {
        ("DEMO", colors::GOLD)
    } else if state.connected {
        ("LIVE", colors::SUCCESS)
    } else {
        ("DISCONNECTED", colors::RED)
    }
}

pub fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState, source_name: &str) {
    let (mode_text, mode_color) = mode_badge(state);

    let (lock_text, lock_color) = if state.door_locked {
        ("[LOCKED]", colors::RED)
    } else {
        ("[UNLOCKED]", colors::SUCCESS)
    };

    let mut spans = vec![
        Span::styled(
            " FACE RECOGNITION SYSTEM ",
            Style::default().fg(colors::WHITE).bg(colors::DARK_RED).bold(),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", mode_text), Style::default().fg(mode_color).bold()),
        Span::raw("  "),
        Span::styled(lock_text, Style::default().fg(lock_color).bold()),
        Span::raw("  "),
        Span::styled(state.image_count_label(), Style::default().fg(colors::SILVER)),
        Span::raw("  "),
        Span::styled(format!("via {}", source_name), Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM)),
    ];

    if state.loading {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("refreshing...", Style::default().fg(colors::GOLD)));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(colors::DARK_RED))
                .style(Style::default().bg(colors::BG_DARK)),
        );

    frame.render_widget(header, area);
}
