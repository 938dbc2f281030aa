//! Rate evaluation — effective reward and interval for a course layout.
//!
//! Every modifier-granting action in a layout contributes its own granted
//! modifiers to a layout-wide total, and that total is applied to every
//! action in the layout (the granters included). Proficiency shortens
//! intervals in steps of 3% per 10 levels, capped at 99.

use serde::{Deserialize, Serialize};

use crate::catalog::{Action, ActionCatalog};
use crate::combinations::CourseLayout;
use crate::constants::proficiency;
use crate::modifiers::{combine, AggregatedModifiers, ModifierGroup};

/// An action's reward and interval after modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedAction {
    pub id: String,
    pub reward: f64,
    pub interval_ms: f64,
}

impl EvaluatedAction {
    /// Reward per second; zero for a non-positive interval.
    pub fn rate(&self) -> f64 {
        if self.interval_ms > 0.0 {
            self.reward / (self.interval_ms / 1000.0)
        } else {
            0.0
        }
    }
}

/// A scored layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEvaluation {
    pub actions: Vec<EvaluatedAction>,
    /// Layout-wide modifiers that were applied.
    pub modifiers: AggregatedModifiers,
    pub total_reward: f64,
    pub total_seconds: f64,
}

impl CourseEvaluation {
    /// Total reward per second; zero when the total time is not positive.
    pub fn rate(&self) -> f64 {
        if self.total_seconds > 0.0 {
            self.total_reward / self.total_seconds
        } else {
            0.0
        }
    }
}

/// Interval percent contributed by proficiency alone: −3% per full 10 levels.
pub fn proficiency_interval_percent(proficiency_level: u32) -> f64 {
    let steps = proficiency_level.min(proficiency::MAX) / proficiency::LEVELS_PER_STEP;
    proficiency::INTERVAL_PERCENT_PER_STEP * steps as f64
}

/// Apply layout-wide modifiers and proficiency to one action.
pub fn evaluate_action<C: ActionCatalog + ?Sized>(
    catalog: &C,
    action: &Action,
    proficiency_level: u32,
    modifiers: &AggregatedModifiers,
) -> EvaluatedAction {
    let reward = action.base_reward * (1.0 + modifiers.value(ModifierGroup::RewardPercent) / 100.0);
    let interval_percent =
        proficiency_interval_percent(proficiency_level) + modifiers.value(ModifierGroup::TimePercent);
    let interval_ms = catalog.round_to_tick(
        action.base_interval_ms * (1.0 + interval_percent / 100.0)
            + modifiers.value(ModifierGroup::TimeFlat),
    );

    if reward < 0.0 || interval_ms < 0.0 {
        log::warn!(
            "anomalous evaluation for '{}': reward {reward}, interval {interval_ms}ms",
            action.id
        );
    }

    EvaluatedAction {
        id: action.id.clone(),
        reward,
        interval_ms,
    }
}

/// Score a complete layout.
pub fn evaluate_layout<C: ActionCatalog + ?Sized>(
    catalog: &C,
    layout: &CourseLayout<'_>,
    proficiency_level: u32,
) -> CourseEvaluation {
    let modifiers = combine(layout.candidates().iter().map(|c| c.modifiers.as_ref()));
    let actions: Vec<EvaluatedAction> = layout
        .candidates()
        .iter()
        .map(|c| evaluate_action(catalog, c.action, proficiency_level, &modifiers))
        .collect();
    let total_reward = actions.iter().map(|a| a.reward).sum();
    let total_seconds = actions.iter().map(|a| a.interval_ms).sum::<f64>() / 1000.0;

    CourseEvaluation {
        actions,
        modifiers,
        total_reward,
        total_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::selection::Candidate;

    fn catalog() -> Catalog {
        Catalog::new("melvorD:Agility", vec![0, 10], vec![]).unwrap()
    }

    #[test]
    fn proficiency_staircase() {
        assert_eq!(proficiency_interval_percent(1), 0.0);
        assert_eq!(proficiency_interval_percent(9), 0.0);
        assert_eq!(proficiency_interval_percent(10), -3.0);
        assert_eq!(proficiency_interval_percent(50), -15.0);
        assert_eq!(proficiency_interval_percent(99), -27.0);
        // Clamped at the cap.
        assert_eq!(proficiency_interval_percent(250), -27.0);
    }

    #[test]
    fn no_modifiers_low_proficiency_is_base() {
        let action = Action::new("a", 0, 10.0, 5000.0);
        let eval = evaluate_action(&catalog(), &action, 1, &AggregatedModifiers::default());
        assert_eq!(eval.reward, 10.0);
        assert_eq!(eval.interval_ms, 5000.0);
        assert_eq!(eval.rate(), 2.0);
    }

    #[test]
    fn modifiers_and_proficiency_combine() {
        let action = Action::new("a", 0, 10.0, 5000.0);
        let mods = AggregatedModifiers {
            time_percent: Some(-5.0),
            time_flat: Some(-120.0),
            reward_percent: Some(20.0),
        };
        // 5000 × (1 − 0.20) − 120 = 3880 → nearest 50ms tick is 3900.
        let eval = evaluate_action(&catalog(), &action, 50, &mods);
        assert_eq!(eval.reward, 12.0);
        assert_eq!(eval.interval_ms, 3900.0);
    }

    #[test]
    fn negative_results_are_reported_not_fatal() {
        let action = Action::new("a", 0, 10.0, 1000.0);
        let mods = AggregatedModifiers {
            time_flat: Some(-5000.0),
            reward_percent: Some(-200.0),
            ..Default::default()
        };
        let eval = evaluate_action(&catalog(), &action, 1, &mods);
        assert!(eval.reward < 0.0);
        assert!(eval.interval_ms < 0.0);
        assert_eq!(eval.rate(), 0.0);
    }

    #[test]
    fn layout_modifiers_apply_to_every_action() {
        let granter = Action::new("g", 1, 8.0, 6000.0);
        let neutral = Action::new("n", 0, 10.0, 5000.0);
        let granted = AggregatedModifiers {
            reward_percent: Some(50.0),
            ..Default::default()
        };
        let layout = CourseLayout::new(vec![
            Candidate {
                action: &neutral,
                modifiers: None,
            },
            Candidate {
                action: &granter,
                modifiers: Some(granted),
            },
        ]);
        let eval = evaluate_layout(&catalog(), &layout, 1);
        assert_eq!(eval.actions[0].reward, 15.0);
        assert_eq!(eval.actions[1].reward, 12.0);
        assert_eq!(eval.total_reward, 27.0);
        assert_eq!(eval.total_seconds, 11.0);
        assert_eq!(eval.modifiers, granted);
    }

    #[test]
    fn zero_time_layout_has_zero_rate() {
        let eval = CourseEvaluation {
            actions: vec![],
            modifiers: AggregatedModifiers::default(),
            total_reward: 5.0,
            total_seconds: 0.0,
        };
        assert_eq!(eval.rate(), 0.0);
    }
}
