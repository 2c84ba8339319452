// services/guard-dash/src/components/log.rs
//
// Activity log and key help footer

use ratatui::prelude::*;
use ratatui::widgets::*;

use super::colors;
use crate::state::DashboardState;

pub fn draw_activity_panel(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(Span::styled(
            " ACTIVITY LOG ",
            Style::default().fg(colors::WHITE).bold(),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let logs: Vec<Line> = state
        .activity_log
        .iter()
        .rev()
        .take(20)
        .map(|entry| {
            let (prefix, color) = match entry.level.as_str() {
                "ERROR" => ("[ERR]", colors::RED),
                "WARN" => ("[WRN]", colors::GOLD),
                "INFO" => ("[INF]", colors::SUCCESS),
                _ => ("[---]", colors::SILVER),
            };

            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
                ),
                Span::styled(format!("{} ", prefix), Style::default().fg(color)),
                Span::styled(entry.message.as_str(), Style::default().fg(colors::WHITE)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(logs)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

pub fn draw_footer(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let mut help = vec![
        Span::styled(" [Q] ", Style::default().fg(colors::BG_DARK).bg(colors::RED)),
        Span::styled(" Quit ", Style::default().fg(colors::SILVER)),
        Span::raw("  "),
        Span::styled(" [SPACE] ", Style::default().fg(colors::BG_DARK).bg(colors::GOLD)),
        Span::styled(" Lock/Unlock ", Style::default().fg(colors::SILVER)),
        Span::raw("  "),
        Span::styled(" [ENTER] ", Style::default().fg(colors::BG_DARK).bg(colors::WHITE)),
        Span::styled(" Expand ", Style::default().fg(colors::SILVER)),
        Span::raw("  "),
        Span::styled(" [D] ", Style::default().fg(colors::BG_DARK).bg(colors::WHITE)),
        Span::styled(" Download ", Style::default().fg(colors::SILVER)),
        Span::raw("  "),
        Span::styled(" [R] ", Style::default().fg(colors::BG_DARK).bg(colors::SILVER)),
        Span::styled(" Refresh ", Style::default().fg(colors::SILVER)),
    ];

    if let Some(notice) = &state.notice {
        help.push(Span::raw("  "));
        help.push(Span::styled(notice.as_str(), Style::default().fg(colors::GOLD)));
    }

    let footer = Paragraph::new(Line::from(help))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(colors::DARK_RED))
                .style(Style::default().bg(colors::BG_DARK)),
        );

    frame.render_widget(footer, area);
}
