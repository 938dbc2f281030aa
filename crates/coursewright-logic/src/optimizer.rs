//! Course optimization — the best layout for a level and proficiency.
//!
//! Given a catalog, a level and a proficiency, [`optimal_course`] builds the
//! viable-choice set for every unlocked tier, enumerates every layout and
//! keeps the one with the strictly greatest reward per second. Ties keep
//! the layout found first. [`optimal_course_sweep`] repeats this for an
//! ordered list of requests.
//!
//! ```
//! use coursewright_logic::catalog::{Action, Catalog};
//! use coursewright_logic::optimizer::optimal_course;
//!
//! let catalog = Catalog::new(
//!     "melvorD:Agility",
//!     vec![0],
//!     vec![Action::new("slow", 0, 10.0, 10000.0), Action::new("fast", 0, 10.0, 5000.0)],
//! )
//! .unwrap();
//! let course = optimal_course(&catalog, 1, 1).unwrap();
//! assert_eq!(course.actions[0].id, "fast");
//! assert_eq!(course.rate, 2.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ActionCatalog;
use crate::combinations::{layout_count, layouts};
use crate::evaluation::{evaluate_layout, CourseEvaluation, EvaluatedAction};
use crate::modifiers::AggregatedModifiers;
use crate::selection::select_candidates;
use crate::sweep::{clamp_proficiency, LevelPair};

/// Why no course could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CourseError {
    /// The level is below every tier's unlock threshold.
    #[error("no tiers are unlocked at level {level}")]
    NoTiersUnlocked { level: u32 },
    /// An unlocked tier has no action to fill it.
    #[error("tier {tier} is unlocked at level {level} but has no viable action")]
    IncompleteTier { level: u32, tier: usize },
}

/// The best layout found for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalCourse {
    pub level: u32,
    pub proficiency: u32,
    /// One entry per unlocked tier, in tier order.
    pub actions: Vec<EvaluatedAction>,
    pub modifiers: AggregatedModifiers,
    pub total_reward: f64,
    pub total_seconds: f64,
    /// Reward per second.
    pub rate: f64,
    pub layouts_evaluated: usize,
}

impl OptimalCourse {
    fn from_evaluation(
        level: u32,
        proficiency: u32,
        evaluation: CourseEvaluation,
        layouts_evaluated: usize,
    ) -> Self {
        let rate = evaluation.rate();
        Self {
            level,
            proficiency,
            actions: evaluation.actions,
            modifiers: evaluation.modifiers,
            total_reward: evaluation.total_reward,
            total_seconds: evaluation.total_seconds,
            rate,
            layouts_evaluated,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.id.as_str()).collect()
    }
}

/// Find the highest-rate course for `level` at `proficiency`.
///
/// Proficiency is clamped to 1–99. A best course with a zero rate is still
/// returned as `Ok`.
pub fn optimal_course<C: ActionCatalog + ?Sized>(
    catalog: &C,
    level: u32,
    proficiency: u32,
) -> Result<OptimalCourse, CourseError> {
    let proficiency = clamp_proficiency(proficiency);
    let choices = select_candidates(catalog, level, proficiency);

    if choices.is_empty() {
        return Err(CourseError::NoTiersUnlocked { level });
    }
    if let Some(empty) = choices.iter().find(|c| c.is_empty()) {
        return Err(CourseError::IncompleteTier {
            level,
            tier: empty.tier,
        });
    }

    log::debug!(
        "level {level} proficiency {proficiency}: {} tiers, {} layouts",
        choices.len(),
        layout_count(&choices)
    );

    let mut best: Option<(f64, CourseEvaluation)> = None;
    let mut evaluated = 0usize;
    for layout in layouts(&choices) {
        evaluated += 1;
        let evaluation = evaluate_layout(catalog, &layout, proficiency);
        let rate = evaluation.rate();
        if best.as_ref().map_or(true, |(best_rate, _)| rate > *best_rate) {
            best = Some((rate, evaluation));
        }
    }

    // Every tier is non-empty, so at least one layout was scored.
    let (_, evaluation) = best.ok_or(CourseError::NoTiersUnlocked { level })?;
    Ok(OptimalCourse::from_evaluation(
        level,
        proficiency,
        evaluation,
        evaluated,
    ))
}

/// Run [`optimal_course`] for each request, preserving input order.
pub fn optimal_course_sweep<C: ActionCatalog + ?Sized>(
    catalog: &C,
    pairs: &[LevelPair],
) -> Vec<Result<OptimalCourse, CourseError>> {
    pairs
        .iter()
        .map(|pair| optimal_course(catalog, pair.level, pair.proficiency))
        .collect()
}
