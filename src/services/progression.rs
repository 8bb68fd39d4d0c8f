//! Step-progression gate.
//!
//! Projects move through five ordered steps. A step opens only once the one
//! before it has been approved; the functions here are the single place that
//! rule lives. They are pure so both the API layer and the review service
//! can consult them without touching the database.

use crate::types::db::project_step::{self, StepStatus};

/// Number of steps in a project.
pub const STEP_COUNT: usize = 5;

/// Display titles, indexed by step_number - 1.
pub const STEP_TITLES: [&str; STEP_COUNT] = [
    "Research",
    "Design Brief",
    "Planning",
    "Implementation",
    "Archival Record",
];

/// Per-step state as the gate sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepState {
    pub status: StepStatus,
    pub due_date: Option<i64>,
}

/// Which view a step should render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepRoute {
    /// Instructional/index view: the student is still working.
    Index,
    /// Upload/status view: submission state and teacher feedback.
    Status,
}

impl StepRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepRoute::Index => "index",
            StepRoute::Status => "status",
        }
    }
}

/// Build the ordered step array from the project's step rows.
///
/// Rows may arrive in any order; a missing row reads as `Not Started`.
pub fn states_from_rows(rows: &[project_step::Model]) -> [StepState; STEP_COUNT] {
    let mut states: [StepState; STEP_COUNT] = std::array::from_fn(|_| StepState {
        status: StepStatus::NotStarted,
        due_date: None,
    });

    for row in rows {
        if (1..=STEP_COUNT as i32).contains(&row.step_number) {
            states[(row.step_number - 1) as usize] = StepState {
                status: row.status,
                due_date: row.due_date,
            };
        }
    }

    states
}

/// Whether the student may currently reach this step.
///
/// Step 1 is always open; step N > 1 opens exactly when step N-1 has been
/// approved. Out-of-range step numbers are never accessible.
pub fn is_step_accessible(steps: &[StepState; STEP_COUNT], step_number: i32) -> bool {
    match step_number {
        1 => true,
        n if (2..=STEP_COUNT as i32).contains(&n) => {
            steps[(n - 2) as usize].status == StepStatus::Approved
        }
        _ => false,
    }
}

/// Which view an accessible step renders; `None` when the gate refuses.
pub fn step_route(steps: &[StepState; STEP_COUNT], step_number: i32) -> Option<StepRoute> {
    if !is_step_accessible(steps, step_number) {
        return None;
    }

    let state = &steps[(step_number - 1) as usize];
    match state.status {
        StepStatus::NotStarted | StepStatus::InProgress => Some(StepRoute::Index),
        StepStatus::Submitted | StepStatus::Approved => Some(StepRoute::Status),
    }
}

/// Whether a new upload is accepted for this step. Approved steps are
/// closed for good.
pub fn uploads_allowed(steps: &[StepState; STEP_COUNT], step_number: i32) -> bool {
    is_step_accessible(steps, step_number)
        && steps[(step_number - 1) as usize].status != StepStatus::Approved
}

/// The furthest step the student can reach right now.
pub fn highest_accessible_step(steps: &[StepState; STEP_COUNT]) -> i32 {
    let approved_prefix = steps
        .iter()
        .take_while(|s| s.status == StepStatus::Approved)
        .count();

    (approved_prefix + 1).min(STEP_COUNT) as i32
}
