use crate::session::SessionRecord;

/// Rounded percentage of `elapsed` over `duration`, 0 for an empty duration
pub fn percent(elapsed: u64, duration: u64) -> u16 {
    if duration == 0 {
        return 0;
    }
    let pct = (elapsed as f64 / duration as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u16
}

/// Where a step sits relative to the running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Current,
    Upcoming,
}

impl StepStatus {
    pub fn of(index: usize, record: Option<&SessionRecord>) -> Self {
        match record {
            Some(r) if index < r.current_step_index => StepStatus::Done,
            Some(r) if index == r.current_step_index => StepStatus::Current,
            _ => StepStatus::Upcoming,
        }
    }
}

/// Read-only view of one session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub step_index: usize,
    pub step_count: usize,
    pub is_running: bool,
    pub step_remaining_secs: u64,
    pub overall_remaining_secs: u64,
    pub step_percent: u16,
    pub overall_percent: u16,
}

impl SessionProgress {
    pub fn project(record: &SessionRecord, step_durations: &[u32]) -> Self {
        let step_duration_secs = step_durations
            .get(record.current_step_index)
            .map_or(0, |m| u64::from(*m) * 60);
        let total_secs: u64 = step_durations.iter().map(|m| u64::from(*m) * 60).sum();

        let step_elapsed = step_duration_secs.saturating_sub(record.step_remaining_secs);
        let overall_elapsed = total_secs.saturating_sub(record.overall_remaining_secs);

        Self {
            step_index: record.current_step_index,
            step_count: step_durations.len(),
            is_running: record.is_running,
            step_remaining_secs: record.step_remaining_secs,
            overall_remaining_secs: record.overall_remaining_secs,
            step_percent: percent(step_elapsed, step_duration_secs),
            overall_percent: percent(overall_elapsed, total_secs),
        }
    }

    /// 1-based label, e.g. "Step 2 of 6"
    pub fn step_label(&self) -> String {
        format!("Step {} of {}", self.step_index + 1, self.step_count)
    }
}
