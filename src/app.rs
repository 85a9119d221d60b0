use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::book::RecipeBook;
use crate::progress::SessionProgress;
use crate::recipe::{Recipe, RecipeId};
use crate::runtime::CookEvent;
use crate::session::{AdvancePolicy, SessionRecord, SessionTable, StopOutcome, TickOutcome};
use crate::store::RecipeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookState {
    /// No session yet, or the last one was stopped
    Ready,
    Cooking,
    Completed,
}

/// What the user asked for, independent of the key that asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    TogglePause,
    StopStep,
    ToggleFavorite,
    Quit,
}

impl Command {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(Command::Start),
            KeyCode::Char(' ') => Some(Command::TogglePause),
            KeyCode::Char('n') => Some(Command::StopStep),
            KeyCode::Char('f') => Some(Command::ToggleFavorite),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }
}

/// One recipe's cooking screen: the session table plus the UI-side state
/// the engine deliberately knows nothing about.
#[derive(Debug)]
pub struct CookingApp<S: RecipeStore> {
    pub recipe: Recipe,
    pub sessions: SessionTable,
    pub state: CookState,
    pub status: Option<String>,
    pub should_quit: bool,
    book: RecipeBook<S>,
}

impl<S: RecipeStore> CookingApp<S> {
    /// `None` if the book has no such recipe.
    pub fn new(book: RecipeBook<S>, recipe_id: &RecipeId, policy: AdvancePolicy) -> Option<Self> {
        let recipe = book.get(recipe_id)?.clone();
        Some(Self {
            recipe,
            sessions: SessionTable::with_policy(policy),
            state: CookState::Ready,
            status: None,
            should_quit: false,
            book,
        })
    }

    pub fn book(&self) -> &RecipeBook<S> {
        &self.book
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.sessions.get(&self.recipe.id)
    }

    pub fn progress(&self) -> Option<SessionProgress> {
        self.record()
            .map(|r| SessionProgress::project(r, &self.recipe.step_durations()))
    }

    /// Feeds one runtime event. A closed event source quits the screen.
    pub fn handle_event(&mut self, event: &CookEvent, now: DateTime<Utc>) {
        match event {
            CookEvent::Tick => {
                self.on_tick(now);
            }
            CookEvent::Key(key) => self.handle_key(key, now),
            CookEvent::Resize => {}
            CookEvent::Closed => {
                warn!(recipe = %self.recipe.id, "terminal input closed, leaving cooking screen");
                self.handle_command(Command::Quit, now);
            }
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, now: DateTime<Utc>) {
        if let Some(cmd) = Command::from_key(key) {
            self.handle_command(cmd, now);
        }
    }

    pub fn handle_command(&mut self, cmd: Command, now: DateTime<Utc>) {
        let durations = self.recipe.step_durations();
        match cmd {
            Command::Start => {
                if self.state == CookState::Cooking {
                    return;
                }
                match self.sessions.start(&self.recipe.id, &durations, now) {
                    Ok(()) => {
                        info!(recipe = %self.recipe.id, "cooking started");
                        self.state = CookState::Cooking;
                        self.status = None;
                    }
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            Command::TogglePause => match self.record().map(|r| r.is_running) {
                Some(true) => {
                    self.sessions.pause(&self.recipe.id);
                }
                Some(false) => {
                    self.sessions.resume(&self.recipe.id, now);
                }
                None => {}
            },
            Command::StopStep => {
                match self
                    .sessions
                    .stop_current_step(&self.recipe.id, &durations, now)
                {
                    StopOutcome::Advanced { step_index } => {
                        self.status = Some(format!("Step ended, on to step {}", step_index + 1));
                    }
                    StopOutcome::Ended => {
                        self.state = CookState::Ready;
                        self.status = Some("Step ended, session finished".to_string());
                    }
                    StopOutcome::NoSession => {}
                }
            }
            Command::ToggleFavorite => match self.book.toggle_favorite(&self.recipe.id) {
                Ok(Some(favorite)) => self.recipe.is_favorite = favorite,
                Ok(None) => {}
                Err(e) => {
                    warn!(recipe = %self.recipe.id, error = %e, "failed to save favorite");
                    self.status = Some(format!("Could not save favorite: {e}"));
                }
            },
            Command::Quit => {
                self.sessions.end(&self.recipe.id);
                self.should_quit = true;
            }
        }
    }

    /// Advances the timer and ends the session once the last step runs out.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let durations = self.recipe.step_durations();
        let before = self.record().map(|r| r.current_step_index);
        let outcome = self.sessions.tick(&self.recipe.id, &durations, now);

        if let (TickOutcome::StepAdvanced { step_index, .. }, Some(before)) = (outcome, before) {
            self.status = Some(advance_message(before, step_index));
        }

        let finished = self
            .record()
            .is_some_and(|r| r.is_running && r.is_complete(durations.len()));
        if finished {
            self.sessions.end(&self.recipe.id);
            self.state = CookState::Completed;
            self.status = Some("Recipe completed!".to_string());
            info!(recipe = %self.recipe.id, "cooking completed");
        }

        outcome
    }
}

/// Status line after the timer moved from step `from` to step `to` (0-based)
fn advance_message(from: usize, to: usize) -> String {
    match to.saturating_sub(from) {
        1 => format!("Step {} done, on to step {}", from + 1, to + 1),
        n => format!("{n} steps done, skipped to step {}", to + 1),
    }
}
