//! Cooking session engine.
//!
//! A [`SessionTable`] holds at most one active session and a record per
//! started recipe. Every command is a pure in-memory transition; the caller
//! supplies the step durations (minutes) from the recipe and the current
//! wall-clock instant, so the engine never reads the clock on its own.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::error::StartError;
use crate::recipe::RecipeId;

const SECS_PER_MINUTE: u64 = 60;

/// Full length of step `index` in seconds, `None` past the last step
fn step_secs(step_durations: &[u32], index: usize) -> Option<u64> {
    step_durations
        .get(index)
        .map(|minutes| u64::from(*minutes) * SECS_PER_MINUTE)
}

/// Whole seconds between two instants, 0 if the clock went backwards
fn whole_secs_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> u64 {
    u64::try_from((later - earlier).num_milliseconds()).map_or(0, |ms| ms / 1000)
}

/// How a tick that exhausts the current step moves through the recipe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdvancePolicy {
    /// At most one step per tick; surplus seconds are dropped.
    Single,
    /// Surplus seconds carry into following steps until spent.
    #[default]
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub current_step_index: usize,
    pub is_running: bool,
    pub step_remaining_secs: u64,
    pub overall_remaining_secs: u64,
    /// Present only while running
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    fn new(first_step_secs: u64, overall_secs: u64, now: DateTime<Utc>) -> Self {
        Self {
            current_step_index: 0,
            is_running: true,
            step_remaining_secs: first_step_secs,
            overall_remaining_secs: overall_secs,
            last_tick_at: Some(now),
        }
    }

    pub fn is_on_last_step(&self, step_count: usize) -> bool {
        self.current_step_index + 1 >= step_count
    }

    /// Last step with nothing left on it
    pub fn is_complete(&self, step_count: usize) -> bool {
        self.is_on_last_step(step_count) && self.step_remaining_secs == 0
    }

    /// Moves onto the next step if the current one has run out.
    fn advance_if_exhausted(&mut self, step_durations: &[u32]) -> bool {
        if self.step_remaining_secs > 0 {
            return false;
        }
        let next = self.current_step_index + 1;
        match step_secs(step_durations, next) {
            Some(secs) => {
                self.current_step_index = next;
                self.step_remaining_secs = secs;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session for the recipe, or it is paused
    Idle,
    Elapsed { delta_secs: u64 },
    StepAdvanced { step_index: usize, delta_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NoSession,
    Advanced { step_index: usize },
    /// The final step was stopped and the session removed
    Ended,
}

#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    active_recipe_id: Option<RecipeId>,
    by_recipe_id: HashMap<RecipeId, SessionRecord>,
    policy: AdvancePolicy,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AdvancePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    pub fn active_recipe_id(&self) -> Option<&RecipeId> {
        self.active_recipe_id.as_ref()
    }

    pub fn get(&self, recipe_id: &RecipeId) -> Option<&SessionRecord> {
        self.by_recipe_id.get(recipe_id)
    }

    pub fn len(&self) -> usize {
        self.by_recipe_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_recipe_id.is_empty()
    }

    /// Starts (or restarts) the session for `recipe_id`.
    ///
    /// Rejected while a different recipe's session is active.
    pub fn start(
        &mut self,
        recipe_id: &RecipeId,
        step_durations: &[u32],
        now: DateTime<Utc>,
    ) -> Result<(), StartError> {
        if let Some(active) = &self.active_recipe_id {
            if active != recipe_id {
                return Err(StartError::AnotherSessionActive {
                    active: active.clone(),
                });
            }
        }

        let first_step_secs = step_secs(step_durations, 0).ok_or(StartError::NoSteps)?;
        let overall_secs = step_durations
            .iter()
            .map(|minutes| u64::from(*minutes) * SECS_PER_MINUTE)
            .sum();

        self.by_recipe_id.insert(
            recipe_id.clone(),
            SessionRecord::new(first_step_secs, overall_secs, now),
        );
        self.active_recipe_id = Some(recipe_id.clone());

        debug!(
            recipe = %recipe_id,
            steps = step_durations.len(),
            overall_secs,
            "session started"
        );
        Ok(())
    }

    /// Freezes remaining time. Returns false if there is no session.
    pub fn pause(&mut self, recipe_id: &RecipeId) -> bool {
        let Some(record) = self.by_recipe_id.get_mut(recipe_id) else {
            return false;
        };
        record.is_running = false;
        record.last_tick_at = None;
        debug!(recipe = %recipe_id, step = record.current_step_index, "session paused");
        true
    }

    pub fn resume(&mut self, recipe_id: &RecipeId, now: DateTime<Utc>) -> bool {
        let Some(record) = self.by_recipe_id.get_mut(recipe_id) else {
            return false;
        };
        record.is_running = true;
        record.last_tick_at = Some(now);
        debug!(recipe = %recipe_id, step = record.current_step_index, "session resumed");
        true
    }

    /// Deducts the whole seconds elapsed since the previous tick and stamps
    /// `now`. A session never ends here, even when the last step reaches zero.
    pub fn tick(
        &mut self,
        recipe_id: &RecipeId,
        step_durations: &[u32],
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let policy = self.policy;
        let Some(record) = self.by_recipe_id.get_mut(recipe_id) else {
            return TickOutcome::Idle;
        };
        if !record.is_running {
            return TickOutcome::Idle;
        }

        let delta_secs = record
            .last_tick_at
            .map_or(1, |last| whole_secs_between(last, now));
        record.last_tick_at = Some(now);

        let mut surplus = delta_secs.saturating_sub(record.step_remaining_secs);
        record.step_remaining_secs = record.step_remaining_secs.saturating_sub(delta_secs);
        record.overall_remaining_secs = record.overall_remaining_secs.saturating_sub(delta_secs);

        let advanced = match policy {
            AdvancePolicy::Single => record.advance_if_exhausted(step_durations),
            AdvancePolicy::Cascade => {
                let mut advanced = false;
                while record.advance_if_exhausted(step_durations) {
                    advanced = true;
                    let spent = surplus.min(record.step_remaining_secs);
                    record.step_remaining_secs -= spent;
                    surplus -= spent;
                }
                advanced
            }
        };

        trace!(
            recipe = %recipe_id,
            delta_secs,
            step_remaining = record.step_remaining_secs,
            overall_remaining = record.overall_remaining_secs,
            "tick"
        );

        if advanced {
            debug!(recipe = %recipe_id, step = record.current_step_index, "step auto-advanced");
            TickOutcome::StepAdvanced {
                step_index: record.current_step_index,
                delta_secs,
            }
        } else {
            TickOutcome::Elapsed { delta_secs }
        }
    }

    /// Abandons the rest of the current step.
    ///
    /// The skipped remainder is taken off the overall time. On the final step
    /// the session is removed instead.
    pub fn stop_current_step(
        &mut self,
        recipe_id: &RecipeId,
        step_durations: &[u32],
        now: DateTime<Utc>,
    ) -> StopOutcome {
        let Some(record) = self.by_recipe_id.get_mut(recipe_id) else {
            return StopOutcome::NoSession;
        };

        let next = record.current_step_index + 1;
        match step_secs(step_durations, next) {
            Some(secs) => {
                record.overall_remaining_secs = record
                    .overall_remaining_secs
                    .saturating_sub(record.step_remaining_secs);
                record.current_step_index = next;
                record.step_remaining_secs = secs;
                if record.is_running {
                    record.last_tick_at = Some(now);
                }
                debug!(recipe = %recipe_id, step = next, "step stopped, moved on");
                StopOutcome::Advanced { step_index: next }
            }
            None => {
                self.end(recipe_id);
                StopOutcome::Ended
            }
        }
    }

    /// Removes the session. Returns false if there was none.
    pub fn end(&mut self, recipe_id: &RecipeId) -> bool {
        let removed = self.by_recipe_id.remove(recipe_id).is_some();
        if self.active_recipe_id.as_ref() == Some(recipe_id) {
            self.active_recipe_id = None;
        }
        if removed {
            debug!(recipe = %recipe_id, "session ended");
        }
        removed
    }
}
