//! Course layout enumeration — lazy Cartesian product of tier choices.
//!
//! [`Layouts`] walks the product like an odometer: the last tier varies
//! fastest, so layouts come out in the same order a depth-first expansion
//! over tiers would produce them. Nothing is materialized up front.

use crate::selection::{Candidate, TierChoices};

/// One chosen action per included tier, in tier order.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseLayout<'a> {
    picks: Vec<Candidate<'a>>,
}

impl<'a> CourseLayout<'a> {
    pub fn new(picks: Vec<Candidate<'a>>) -> Self {
        Self { picks }
    }

    pub fn candidates(&self) -> &[Candidate<'a>] {
        &self.picks
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.picks.iter().map(|c| c.action.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// Number of layouts the choice sets expand to.
///
/// Zero if there are no tiers or any tier has no choices. Saturates at
/// `usize::MAX`.
pub fn layout_count(choices: &[TierChoices<'_>]) -> usize {
    if choices.is_empty() {
        return 0;
    }
    choices
        .iter()
        .try_fold(1usize, |acc, tier| match tier.len() {
            0 => Err(0),
            n => Ok(acc.saturating_mul(n)),
        })
        .unwrap_or_else(|zero| zero)
}

/// Lazy iterator over every [`CourseLayout`].
pub struct Layouts<'s, 'a> {
    choices: &'s [TierChoices<'a>],
    /// Index into each tier's candidates; `None` once exhausted.
    cursor: Option<Vec<usize>>,
    remaining: usize,
}

/// Enumerate all layouts of `choices`.
pub fn layouts<'s, 'a>(choices: &'s [TierChoices<'a>]) -> Layouts<'s, 'a> {
    let remaining = layout_count(choices);
    Layouts {
        choices,
        cursor: (remaining > 0).then(|| vec![0; choices.len()]),
        remaining,
    }
}

impl<'a> Iterator for Layouts<'_, 'a> {
    type Item = CourseLayout<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let layout = CourseLayout::new(
            cursor
                .iter()
                .zip(self.choices)
                .map(|(&i, tier)| tier.candidates[i])
                .collect(),
        );

        // Advance: bump the last tier, carrying leftwards.
        let mut exhausted = true;
        for (slot, tier) in cursor.iter_mut().zip(self.choices).rev() {
            *slot += 1;
            if *slot < tier.len() {
                exhausted = false;
                break;
            }
            *slot = 0;
        }
        if exhausted {
            self.cursor = None;
        }
        self.remaining = self.remaining.saturating_sub(1);

        Some(layout)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Action;

    fn tier<'a>(index: usize, actions: &'a [Action]) -> TierChoices<'a> {
        TierChoices {
            tier: index,
            baseline: None,
            candidates: actions
                .iter()
                .map(|action| Candidate {
                    action,
                    modifiers: None,
                })
                .collect(),
        }
    }

    fn actions(prefix: &str, n: usize) -> Vec<Action> {
        (0..n)
            .map(|i| Action::new(&format!("{prefix}{i}"), 0, 1.0, 1000.0))
            .collect()
    }

    #[test]
    fn count_is_product_of_sizes() {
        let (a, b, c) = (actions("a", 2), actions("b", 3), actions("c", 4));
        let choices = vec![tier(0, &a), tier(1, &b), tier(2, &c)];
        assert_eq!(layout_count(&choices), 24);
        let all: Vec<_> = layouts(&choices).collect();
        assert_eq!(all.len(), 24);
        assert!(all.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn last_tier_varies_fastest() {
        let (a, b) = (actions("a", 2), actions("b", 2));
        let choices = vec![tier(0, &a), tier(1, &b)];
        let order: Vec<Vec<&str>> = layouts(&choices).map(|l| l.ids()).collect();
        assert_eq!(
            order,
            vec![
                vec!["a0", "b0"],
                vec!["a0", "b1"],
                vec!["a1", "b0"],
                vec!["a1", "b1"],
            ]
        );
    }

    #[test]
    fn every_layout_is_distinct_and_keeps_tier_order() {
        let (a, b, c) = (actions("a", 3), actions("b", 1), actions("c", 2));
        let choices = vec![tier(0, &a), tier(1, &b), tier(2, &c)];
        let all: Vec<Vec<&str>> = layouts(&choices).map(|l| l.ids()).collect();
        let unique: std::collections::HashSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), all.len());
        for ids in &all {
            assert!(ids[0].starts_with('a'));
            assert!(ids[1].starts_with('b'));
            assert!(ids[2].starts_with('c'));
        }
    }

    #[test]
    fn empty_tier_yields_nothing() {
        let (a, none) = (actions("a", 3), Vec::new());
        let choices = vec![tier(0, &a), tier(1, &none)];
        assert_eq!(layout_count(&choices), 0);
        assert_eq!(layouts(&choices).count(), 0);
    }

    #[test]
    fn no_tiers_yields_nothing() {
        assert_eq!(layout_count(&[]), 0);
        assert_eq!(layouts(&[]).next(), None);
    }

    #[test]
    fn size_hint_counts_down() {
        let (a, b) = (actions("a", 2), actions("b", 2));
        let choices = vec![tier(0, &a), tier(1, &b)];
        let mut iter = layouts(&choices);
        assert_eq!(iter.size_hint(), (4, Some(4)));
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
    }

    #[test]
    fn many_tiers_do_not_recurse() {
        let single = actions("x", 1);
        let choices: Vec<_> = (0..10_000).map(|i| tier(i, &single)).collect();
        let mut iter = layouts(&choices);
        assert_eq!(iter.next().map(|l| l.len()), Some(10_000));
        assert!(iter.next().is_none());
    }
}
