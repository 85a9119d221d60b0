pub mod timeline;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::{
    app::{CookState, CookingApp},
    progress::SessionProgress,
    recipe::StepKind,
    store::RecipeStore,
    util::{format_clock, format_minutes},
};

const HORIZONTAL_MARGIN: u16 = 2;

impl<S: RecipeStore> Widget for &CookingApp<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(4), // header
                Constraint::Length(7), // active step
                Constraint::Length(3), // overall progress
                Constraint::Min(3),    // timeline
                Constraint::Length(2), // status + keys
            ])
            .split(area);

        let recipe = &self.recipe;
        let progress = self.progress();

        // header
        let mut title = vec![Span::styled(recipe.title.clone(), bold_style)];
        if recipe.is_favorite {
            title.push(Span::styled(" ♥", Style::default().fg(Color::Red)));
        }
        let mut facts = vec![
            recipe.difficulty.to_string(),
            format_minutes(recipe.total_minutes()),
            format!("{} steps", recipe.steps.len()),
        ];
        if let Some(cuisine) = &recipe.cuisine {
            facts.insert(0, cuisine.clone());
        }
        Paragraph::new(vec![Line::from(title), Line::styled(facts.join(" · "), dim_style)])
            .block(Block::default().borders(Borders::ALL))
            .render(chunks[0], buf);

        match &progress {
            Some(p) => render_active_step(self, p, chunks[1], buf),
            None => render_idle(self, chunks[1], buf),
        }

        if let Some(p) = &progress {
            Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Overall Progress"))
                .gauge_style(Style::default().fg(Color::Cyan))
                .percent(p.overall_percent)
                .label(format!(
                    "remaining {} · {}%",
                    format_clock(p.overall_remaining_secs),
                    p.overall_percent
                ))
                .render(chunks[2], buf);
        }

        timeline::timeline(recipe, self.record()).render(chunks[3], buf);

        let keys = match self.state {
            CookState::Cooking => {
                "(space) pause/resume  (n) end step  (f) favorite  (q) quit"
            }
            CookState::Ready | CookState::Completed => "(enter) start  (f) favorite  (q) quit",
        };
        let mut footer = Vec::new();
        if let Some(status) = &self.status {
            footer.push(Line::styled(status.clone(), Style::default().fg(Color::Yellow)));
        }
        footer.push(Line::styled(keys, dim_style.add_modifier(Modifier::ITALIC)));
        Paragraph::new(footer)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

fn render_active_step<S: RecipeStore>(
    app: &CookingApp<S>,
    p: &SessionProgress,
    area: Rect,
    buf: &mut Buffer,
) {
    let title = if p.is_running {
        p.step_label()
    } else {
        format!("{} · PAUSED", p.step_label())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let Some(step) = app.recipe.steps.get(p.step_index) else {
        return;
    };
    Paragraph::new(step.description.as_str())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rows[0], buf);

    let mut details = vec![Span::styled(
        step.kind.to_string(),
        Style::default().fg(kind_color(step.kind)),
    )];
    if let (StepKind::Cooking, Some(settings)) = (step.kind, &step.cooking_settings) {
        details.push(Span::raw(format!(
            "  ·  Temperature: {}°C  ·  Speed: {}",
            settings.temperature, settings.speed
        )));
    }
    Paragraph::new(Line::from(details))
        .alignment(Alignment::Center)
        .render(rows[1], buf);

    let color = if p.is_running { Color::Green } else { Color::Yellow };
    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .percent(p.step_percent)
        .label(format_clock(p.step_remaining_secs))
        .render(rows[2], buf);
}

pub(crate) fn kind_color(kind: StepKind) -> Color {
    match kind {
        StepKind::Cooking => Color::LightRed,
        StepKind::Instruction => Color::Blue,
    }
}

fn render_idle<S: RecipeStore>(app: &CookingApp<S>, area: Rect, buf: &mut Buffer) {
    let headline = match app.state {
        CookState::Completed => "Recipe completed!",
        _ => "Ready to start cooking?",
    };
    let recipe = &app.recipe;
    Paragraph::new(vec![
        Line::styled(
            headline,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Line::from(format!(
            "{} steps · {}",
            recipe.steps.len(),
            format_minutes(recipe.total_minutes())
        )),
        Line::from(""),
        Line::styled("press enter to start", Style::default().add_modifier(Modifier::DIM)),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Command;
    use crate::book::RecipeBook;
    use crate::recipe::RecipeId;
    use crate::session::AdvancePolicy;
    use crate::store::MemoryRecipeStore;
    use chrono::{Duration, TimeZone, Utc};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> CookingApp<MemoryRecipeStore> {
        let book = RecipeBook::open_seeded(MemoryRecipeStore::default(), true).unwrap();
        CookingApp::new(book, &RecipeId::from("sample-1"), AdvancePolicy::Cascade).unwrap()
    }

    fn screen(app: &CookingApp<MemoryRecipeStore>) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(app, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_render_ready_screen() {
        let content = screen(&app());
        assert!(content.contains("Classic Pasta Carbonara"));
        assert!(content.contains("Ready to start cooking?"));
        assert!(content.contains("23m"));
    }

    #[test]
    fn test_render_cooking_screen() {
        let mut app = app();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        app.handle_command(Command::Start, t0);
        app.on_tick(t0 + Duration::seconds(90));

        let content = screen(&app);
        assert!(content.contains("Step 1 of 6"));
        assert!(content.contains("01:30"));
        assert!(content.contains("Temperature: 100°C"));
        assert!(content.contains("Speed: 1"));
        assert!(content.contains("Overall Progress"));
    }

    #[test]
    fn test_render_paused_marker() {
        let mut app = app();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        app.handle_command(Command::Start, t0);
        app.handle_command(Command::TogglePause, t0);

        assert!(screen(&app).contains("PAUSED"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let app = app();
        let backend = TestBackend::new(10, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();
    }

    #[test]
    fn test_instruction_step_shows_no_settings() {
        let mut app = app();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        app.handle_command(Command::Start, t0);
        app.handle_command(Command::StopStep, t0);

        let content = screen(&app);
        assert!(content.contains("Step 2 of 6"));
        assert!(!content.contains("Temperature:"));
    }
}
