use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use super::kind_color;
use crate::{
    progress::StepStatus,
    recipe::Recipe,
    session::SessionRecord,
    util::truncate_width,
};

const DESCRIPTION_WIDTH: usize = 50;

/// Every step with a done/current/upcoming marker
pub fn timeline<'a>(recipe: &'a Recipe, record: Option<&SessionRecord>) -> List<'a> {
    let items: Vec<ListItem> = recipe
        .steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let status = StepStatus::of(idx, record);
            let (marker, style) = match status {
                StepStatus::Done => ("✓", Style::default().fg(Color::Green)),
                StepStatus::Current => (
                    "▶",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                StepStatus::Upcoming => ("○", Style::default().add_modifier(Modifier::DIM)),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::styled(
                    format!(
                        "Step {}: {}",
                        idx + 1,
                        truncate_width(&step.description, DESCRIPTION_WIDTH)
                    ),
                    style,
                ),
                Span::styled(
                    format!("  {}m ", step.duration_minutes),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::styled(
                    format!("[{}]", step.kind),
                    Style::default().fg(kind_color(step.kind)),
                ),
            ]))
        })
        .collect();

    List::new(items).block(Block::default().borders(Borders::ALL).title("Timeline"))
}
