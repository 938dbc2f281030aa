//! Sweep plans — the ordered (level, proficiency) pairs to optimize.
//!
//! The default plan covers every tier unlock at proficiency 50. Proficiency
//! can be set for the whole plan from user text; input that does not parse
//! as a number leaves the plan as it was.
//!
//! ```
//! use coursewright_logic::sweep::SweepPlan;
//!
//! let mut plan = SweepPlan::default();
//! assert!(plan.set_proficiency("120"));
//! assert!(plan.pairs().iter().all(|p| p.proficiency == 99));
//! assert!(!plan.set_proficiency("lots"));
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{proficiency, DEFAULT_SWEEP_LEVELS};

/// One optimization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPair {
    pub level: u32,
    pub proficiency: u32,
}

impl LevelPair {
    pub fn new(level: u32, proficiency_level: u32) -> Self {
        Self {
            level,
            proficiency: clamp_proficiency(proficiency_level),
        }
    }
}

/// Clamp a proficiency level into the accepted range.
pub fn clamp_proficiency(level: u32) -> u32 {
    level.clamp(proficiency::MIN, proficiency::MAX)
}

/// Parse user-supplied proficiency text, clamped to the accepted range.
///
/// Accepts integers and decimals (truncated). Returns `None` for anything
/// non-numeric.
pub fn parse_proficiency(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
            f.trunc() as i64
        }
    };
    let clamped = value.clamp(proficiency::MIN as i64, proficiency::MAX as i64);
    Some(clamped as u32)
}

/// Ordered list of optimization requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    pairs: Vec<LevelPair>,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_SWEEP_LEVELS
                .iter()
                .map(|&level| LevelPair::new(level, proficiency::DEFAULT))
                .collect(),
        }
    }
}

impl SweepPlan {
    pub fn new(pairs: Vec<LevelPair>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|p| LevelPair::new(p.level, p.proficiency))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let plan: SweepPlan = serde_json::from_str(json)?;
        Ok(Self::new(plan.pairs))
    }

    pub fn pairs(&self) -> &[LevelPair] {
        &self.pairs
    }

    /// Set every pair's proficiency from text. Returns `false` and changes
    /// nothing if the text is not numeric.
    pub fn set_proficiency(&mut self, input: &str) -> bool {
        let Some(level) = parse_proficiency(input) else {
            log::debug!("ignoring non-numeric proficiency {input:?}");
            return false;
        };
        for pair in &mut self.pairs {
            pair.proficiency = level;
        }
        true
    }

    /// Set one pair's proficiency. Returns `false` if `index` is out of range.
    pub fn set_pair_proficiency(&mut self, index: usize, proficiency_level: u32) -> bool {
        match self.pairs.get_mut(index) {
            Some(pair) => {
                pair.proficiency = clamp_proficiency(proficiency_level);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_covers_every_unlock() {
        let plan = SweepPlan::default();
        assert_eq!(plan.pairs().len(), DEFAULT_SWEEP_LEVELS.len());
        assert_eq!(plan.pairs()[0], LevelPair::new(1, 50));
        assert_eq!(plan.pairs().last().map(|p| p.level), Some(118));
    }

    #[test]
    fn parse_accepts_numbers_and_clamps() {
        assert_eq!(parse_proficiency("75"), Some(75));
        assert_eq!(parse_proficiency(" 42 "), Some(42));
        assert_eq!(parse_proficiency("60.9"), Some(60));
        assert_eq!(parse_proficiency("0"), Some(1));
        assert_eq!(parse_proficiency("-5"), Some(1));
        assert_eq!(parse_proficiency("1000"), Some(99));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert_eq!(parse_proficiency(""), None);
        assert_eq!(parse_proficiency("max"), None);
        assert_eq!(parse_proficiency("NaN"), None);
    }

    #[test]
    fn invalid_input_leaves_plan_unchanged() {
        let mut plan = SweepPlan::default();
        assert!(plan.set_proficiency("80"));
        let before = plan.clone();
        assert!(!plan.set_proficiency("eighty"));
        assert_eq!(plan, before);
        assert!(plan.pairs().iter().all(|p| p.proficiency == 80));
    }

    #[test]
    fn single_pair_can_be_adjusted() {
        let mut plan = SweepPlan::default();
        assert!(plan.set_pair_proficiency(2, 99));
        assert_eq!(plan.pairs()[2].proficiency, 99);
        assert_eq!(plan.pairs()[1].proficiency, 50);
        assert!(!plan.set_pair_proficiency(500, 99));
    }

    #[test]
    fn json_plan_is_clamped_on_load() {
        let plan = SweepPlan::from_json_str(
            r#"{ "pairs": [ { "level": 30, "proficiency": 0 }, { "level": 1, "proficiency": 500 } ] }"#,
        )
        .unwrap();
        assert_eq!(plan.pairs(), &[LevelPair::new(30, 1), LevelPair::new(1, 99)]);
    }
}
