use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::error::ProgressError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ProgressUpdate {
    /// Unique ids in completion order
    pub completed_modules: Vec<Uuid>,
    /// Rounded percentage, 0..=100
    pub progress: i16,
    pub completed: bool,
}

/// Recomputes derived enrollment progress.
///
/// `module_id` is the module which was just finished, if any. Adding an id
/// which is already completed changes nothing. Ids of modules which are no
/// longer part of the course are dropped. A course without modules yields
/// zero progress and is never completed.
pub fn recompute_progress(
    completed: &[Uuid],
    course_modules: &[Uuid],
    module_id: Option<Uuid>,
) -> Result<ProgressUpdate, ProgressError> {
    let known: HashSet<&Uuid> = course_modules.iter().collect();

    if let Some(id) = module_id.as_ref() {
        if !known.contains(id) {
            return Err(ProgressError::UnknownModule(*id));
        }
    }

    let mut seen = HashSet::with_capacity(completed.len() + 1);
    let completed_modules: Vec<Uuid> = completed
        .iter()
        .chain(module_id.as_ref())
        .filter(|id| known.contains(id) && seen.insert(**id))
        .copied()
        .collect();

    let total = known.len();
    if total == 0 {
        return Ok(ProgressUpdate {
            completed_modules,
            progress: 0,
            completed: false,
        });
    }

    let count = completed_modules.len();
    let progress = (100.0 * count as f64 / total as f64).round() as i16;

    Ok(ProgressUpdate {
        completed_modules,
        progress,
        completed: count == total,
    })
}
