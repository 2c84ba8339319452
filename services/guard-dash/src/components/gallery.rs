// services/guard-dash/src/components/gallery.rs
//
// Captured faces: card list plus the expanded overlay

use ratatui::prelude::*;
use ratatui::widgets::*;

use guardkit::ImageRecord;

use super::colors;
use crate::gallery::{display_source, format_date, format_time};
use crate::state::DashboardState;

fn name_color(record: &ImageRecord) -> Color {
    if record.is_recognized() {
        colors::SUCCESS
    } else {
        colors::GOLD
    }
}

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .title(Span::styled(title, Style::default().fg(colors::WHITE).bold()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL))
}

pub fn draw_gallery(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = panel_block(format!(" CAPTURED FACES ({}) ", state.image_count_label()));

    if state.images.is_empty() {
        let (headline, detail) = if state.loading {
            ("Loading images...", "")
        } else {
            (
                "No images captured yet",
                "Images will appear here when the system detects faces",
            )
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(headline, Style::default().fg(colors::WHITE).bold())),
            Line::from(Span::styled(detail, Style::default().fg(colors::SILVER))),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = state
        .images
        .iter()
        .map(|record| {
            let unavailable = state.unavailable.contains(&record.id);
            let source_style = if unavailable {
                Style::default().fg(colors::RED)
            } else {
                Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM)
            };

            Row::new(vec![
                Cell::from(Span::styled(
                    record.display_name().to_string(),
                    Style::default().fg(name_color(record)).bold(),
                )),
                Cell::from(Span::styled(format_date(&record.timestamp), Style::default().fg(colors::WHITE))),
                Cell::from(Span::styled(format_time(&record.timestamp), Style::default().fg(colors::WHITE))),
                Cell::from(Span::styled(display_source(record, unavailable).to_string(), source_style)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec![
            Cell::from(Span::styled("NAME", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("DATE", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("TIME", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("IMAGE", Style::default().fg(colors::GOLD).bold())),
        ])
        .bottom_margin(1),
    )
    .block(block)
    .row_highlight_style(Style::default().bg(colors::BG_DARK).fg(colors::GOLD))
    .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Centered overlay for the expanded capture.
pub fn draw_expanded(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let Some(record) = state.expanded_image() else {
        return;
    };
    let unavailable = state.unavailable.contains(&record.id);

    let popup = centered_rect(70, 50, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from(vec![
            Span::styled("Image: ", Style::default().fg(colors::SILVER)),
            Span::styled(display_source(record, unavailable).to_string(), Style::default().fg(colors::WHITE)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Captured on ", Style::default().fg(colors::SILVER)),
            Span::styled(format_date(&record.timestamp), Style::default().fg(colors::WHITE)),
            Span::styled(" at ", Style::default().fg(colors::SILVER)),
            Span::styled(format_time(&record.timestamp), Style::default().fg(colors::WHITE)),
        ]),
        Line::from(vec![
            Span::styled("Identity: ", Style::default().fg(colors::SILVER)),
            Span::styled(
                record.display_name().to_string(),
                Style::default().fg(name_color(record)).bold(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [ENTER/ESC] ", Style::default().fg(colors::BG_DARK).bg(colors::SILVER)),
            Span::styled(" Close ", Style::default().fg(colors::SILVER)),
            Span::raw("  "),
            Span::styled(" [D] ", Style::default().fg(colors::BG_DARK).bg(colors::GOLD)),
            Span::styled(" Download ", Style::default().fg(colors::SILVER)),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(" EXPANDED VIEW ", Style::default().fg(colors::GOLD).bold()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::DARK_GOLD))
        .border_type(BorderType::Double)
        .style(Style::default().bg(colors::BG_PANEL));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
