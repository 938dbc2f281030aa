//! Candidate selection — the viable actions per unlocked tier.
//!
//! A neutral action (one granting no recognized modifiers) only affects its
//! own slot, so only the best neutral action per tier can ever be part of an
//! optimal course. Modifier-granting actions change every other slot and
//! must all be considered.

use crate::catalog::{Action, ActionCatalog};
use crate::evaluation::evaluate_action;
use crate::modifiers::{aggregate, AggregatedModifiers};

/// An action together with the modifiers it grants to the whole course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub action: &'a Action,
    /// `None` for neutral actions.
    pub modifiers: Option<AggregatedModifiers>,
}

impl Candidate<'_> {
    pub fn grants_modifiers(&self) -> bool {
        self.modifiers.is_some()
    }
}

/// Viable choices for one included tier.
#[derive(Debug, Clone)]
pub struct TierChoices<'a> {
    pub tier: usize,
    /// Highest-rate neutral action, if the tier has any.
    pub baseline: Option<&'a Action>,
    /// Modifier-granting actions in catalog order, then the baseline.
    pub candidates: Vec<Candidate<'a>>,
}

impl TierChoices<'_> {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Tiers whose unlock threshold is at or below `level`, ascending.
pub fn included_tiers<C: ActionCatalog + ?Sized>(catalog: &C, level: u32) -> Vec<usize> {
    catalog
        .tier_unlock_levels()
        .iter()
        .enumerate()
        .filter(|&(_, &threshold)| threshold <= level)
        .map(|(tier, _)| tier)
        .collect()
}

/// Reward per second of an action on its own, with no modifiers applied.
pub fn base_rate<C: ActionCatalog + ?Sized>(
    catalog: &C,
    action: &Action,
    proficiency_level: u32,
) -> f64 {
    evaluate_action(
        catalog,
        action,
        proficiency_level,
        &AggregatedModifiers::default(),
    )
    .rate()
}

/// Highest base-rate action among `neutral`. Ties keep the earliest.
pub fn best_neutral<'a, C, I>(catalog: &C, neutral: I, proficiency_level: u32) -> Option<&'a Action>
where
    C: ActionCatalog + ?Sized,
    I: IntoIterator<Item = &'a Action>,
{
    let mut best: Option<(&'a Action, f64)> = None;
    for action in neutral {
        let rate = base_rate(catalog, action, proficiency_level);
        if best.map_or(true, |(_, best_rate)| rate > best_rate) {
            best = Some((action, rate));
        }
    }
    best.map(|(action, _)| action)
}

/// Build the viable-choice set for every tier unlocked at `level`.
///
/// Tiers are returned in ascending order. A tier with no actions yields an
/// empty set; callers decide how to treat it.
pub fn select_candidates<C: ActionCatalog + ?Sized>(
    catalog: &C,
    level: u32,
    proficiency_level: u32,
) -> Vec<TierChoices<'_>> {
    included_tiers(catalog, level)
        .into_iter()
        .map(|tier| {
            let tier_actions = catalog.actions().iter().filter(|a| a.tier == tier);
            let (granting, neutral): (Vec<Candidate<'_>>, Vec<Candidate<'_>>) = tier_actions
                .map(|action| Candidate {
                    action,
                    modifiers: aggregate(action.modifiers.as_ref(), catalog, proficiency_level),
                })
                .partition(Candidate::grants_modifiers);

            let baseline = best_neutral(catalog, neutral.iter().map(|c| c.action), proficiency_level);

            let mut candidates = granting;
            if let Some(action) = baseline {
                if !candidates.iter().any(|c| c.action.id == action.id) {
                    candidates.push(Candidate {
                        action,
                        modifiers: None,
                    });
                }
            }

            TierChoices {
                tier,
                baseline,
                candidates,
            }
        })
        .collect()
}
