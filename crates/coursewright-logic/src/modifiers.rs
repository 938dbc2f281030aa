//! Modifier aggregation — collapses declared modifiers into per-group totals.
//!
//! Actions may declare modifiers that apply globally to every action in a
//! course. Only a closed set of kinds ([`ModifierKind`]) affects the rate;
//! each kind belongs to one [`ModifierGroup`] and carries a sign. Scoped
//! kinds are expressed per activity and only entries matching the catalog's
//! activity count.
//!
//! ```
//! use coursewright_logic::catalog::Catalog;
//! use coursewright_logic::modifiers::{aggregate, ModifierDeclaration, ModifierKind};
//!
//! let catalog = Catalog::new("melvorD:Agility", vec![0], vec![]).unwrap();
//! let decl = ModifierDeclaration::new().with_scalar(ModifierKind::IncreasedGlobalSkillXP, 5.0);
//! let agg = aggregate(Some(&decl), &catalog, 50).unwrap();
//! assert_eq!(agg.reward_percent, Some(5.0));
//! assert!(aggregate(None, &catalog, 50).is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ActionCatalog;
use crate::constants::proficiency;

/// The three effect groups a recognized modifier can contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierGroup {
    /// Percent change to interval.
    TimePercent,
    /// Flat millisecond change to interval.
    TimeFlat,
    /// Percent change to reward.
    RewardPercent,
}

impl ModifierGroup {
    pub const ALL: [ModifierGroup; 3] = [
        ModifierGroup::TimePercent,
        ModifierGroup::TimeFlat,
        ModifierGroup::RewardPercent,
    ];
}

/// Modifier kinds that influence reward-per-time. All other names are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierKind {
    IncreasedSkillIntervalPercent,
    DecreasedSkillIntervalPercent,
    IncreasedSkillInterval,
    DecreasedSkillInterval,
    IncreasedSkillXP,
    DecreasedSkillXP,
    IncreasedGlobalSkillXP,
    DecreasedGlobalSkillXP,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 8] = [
        ModifierKind::IncreasedSkillIntervalPercent,
        ModifierKind::DecreasedSkillIntervalPercent,
        ModifierKind::IncreasedSkillInterval,
        ModifierKind::DecreasedSkillInterval,
        ModifierKind::IncreasedSkillXP,
        ModifierKind::DecreasedSkillXP,
        ModifierKind::IncreasedGlobalSkillXP,
        ModifierKind::DecreasedGlobalSkillXP,
    ];

    /// Name as it appears in catalog modifier declarations.
    pub fn name(self) -> &'static str {
        match self {
            ModifierKind::IncreasedSkillIntervalPercent => "increasedSkillIntervalPercent",
            ModifierKind::DecreasedSkillIntervalPercent => "decreasedSkillIntervalPercent",
            ModifierKind::IncreasedSkillInterval => "increasedSkillInterval",
            ModifierKind::DecreasedSkillInterval => "decreasedSkillInterval",
            ModifierKind::IncreasedSkillXP => "increasedSkillXP",
            ModifierKind::DecreasedSkillXP => "decreasedSkillXP",
            ModifierKind::IncreasedGlobalSkillXP => "increasedGlobalSkillXP",
            ModifierKind::DecreasedGlobalSkillXP => "decreasedGlobalSkillXP",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn group(self) -> ModifierGroup {
        match self {
            ModifierKind::IncreasedSkillIntervalPercent
            | ModifierKind::DecreasedSkillIntervalPercent => ModifierGroup::TimePercent,
            ModifierKind::IncreasedSkillInterval | ModifierKind::DecreasedSkillInterval => {
                ModifierGroup::TimeFlat
            }
            ModifierKind::IncreasedSkillXP
            | ModifierKind::DecreasedSkillXP
            | ModifierKind::IncreasedGlobalSkillXP
            | ModifierKind::DecreasedGlobalSkillXP => ModifierGroup::RewardPercent,
        }
    }

    /// +1.0 for "increased" kinds, -1.0 for "decreased" kinds.
    pub fn sign(self) -> f64 {
        match self {
            ModifierKind::IncreasedSkillIntervalPercent
            | ModifierKind::IncreasedSkillInterval
            | ModifierKind::IncreasedSkillXP
            | ModifierKind::IncreasedGlobalSkillXP => 1.0,
            _ => -1.0,
        }
    }

    /// Scoped kinds are declared as a list of per-activity magnitudes.
    pub fn is_scoped(self) -> bool {
        !matches!(
            self,
            ModifierKind::IncreasedGlobalSkillXP | ModifierKind::DecreasedGlobalSkillXP
        )
    }

    /// Built-in `isNegative` metadata: slower actions and less reward are negative.
    pub fn default_is_negative(self) -> bool {
        matches!(
            self,
            ModifierKind::IncreasedSkillIntervalPercent
                | ModifierKind::IncreasedSkillInterval
                | ModifierKind::DecreasedSkillXP
                | ModifierKind::DecreasedGlobalSkillXP
        )
    }
}

/// One per-activity entry of a scoped modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedMagnitude {
    pub scope: String,
    pub value: f64,
}

/// A declared modifier magnitude, resolved once when the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Scalar(f64),
    Scoped(Vec<ScopedMagnitude>),
}

impl ModifierValue {
    /// Resolve a raw JSON value. Returns `None` for any other shape.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(ModifierValue::Scalar),
            serde_json::Value::Array(entries) => entries
                .iter()
                .map(|entry| serde_json::from_value::<ScopedMagnitude>(entry.clone()).ok())
                .collect::<Option<Vec<_>>>()
                .map(ModifierValue::Scoped),
            _ => None,
        }
    }
}

/// All modifiers an action declares, keyed by declared name.
///
/// Unrecognized names are kept so catalogs can be audited, but they never
/// contribute to aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModifierDeclaration {
    entries: BTreeMap<String, ModifierValue>,
}

impl ModifierDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, kind: ModifierKind, value: f64) -> Self {
        self.entries
            .insert(kind.name().to_string(), ModifierValue::Scalar(value));
        self
    }

    pub fn with_scoped(mut self, kind: ModifierKind, scope: &str, value: f64) -> Self {
        let entry = ScopedMagnitude {
            scope: scope.to_string(),
            value,
        };
        let slot = self
            .entries
            .entry(kind.name().to_string())
            .or_insert_with(|| ModifierValue::Scoped(Vec::new()));
        match slot {
            ModifierValue::Scoped(list) => list.push(entry),
            other => *other = ModifierValue::Scoped(vec![entry]),
        }
        self
    }

    /// Insert a value under an arbitrary name (used by the catalog loader).
    pub fn insert(&mut self, name: impl Into<String>, value: ModifierValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ModifierValue> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Signed per-group totals. A `None` field means the group has no effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedModifiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_flat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_percent: Option<f64>,
}

impl AggregatedModifiers {
    pub fn get(&self, group: ModifierGroup) -> Option<f64> {
        match group {
            ModifierGroup::TimePercent => self.time_percent,
            ModifierGroup::TimeFlat => self.time_flat,
            ModifierGroup::RewardPercent => self.reward_percent,
        }
    }

    /// Group total with a missing key read as zero.
    pub fn value(&self, group: ModifierGroup) -> f64 {
        self.get(group).unwrap_or(0.0)
    }

    fn slot(&mut self, group: ModifierGroup) -> &mut Option<f64> {
        match group {
            ModifierGroup::TimePercent => &mut self.time_percent,
            ModifierGroup::TimeFlat => &mut self.time_flat,
            ModifierGroup::RewardPercent => &mut self.reward_percent,
        }
    }

    pub fn is_empty(&self) -> bool {
        ModifierGroup::ALL.iter().all(|g| self.get(*g).is_none())
    }
}

/// Magnitude of one kind in a declaration, after scope matching and dampening.
fn kind_magnitude(
    declaration: &ModifierDeclaration,
    kind: ModifierKind,
    activity_id: &str,
    dampen: bool,
) -> Option<f64> {
    let multiplier = if dampen {
        proficiency::NEGATIVE_DAMPENING
    } else {
        1.0
    };
    match (kind.is_scoped(), declaration.get(kind.name())?) {
        (false, ModifierValue::Scalar(value)) => Some(value * multiplier),
        (true, ModifierValue::Scoped(entries)) => {
            let sum: f64 = entries
                .iter()
                .filter(|e| e.scope == activity_id)
                .map(|e| e.value)
                .sum();
            (sum != 0.0).then_some(sum * multiplier)
        }
        (scoped, _) => {
            log::debug!(
                "ignoring {} declared with the wrong shape (expected {})",
                kind.name(),
                if scoped { "scoped list" } else { "scalar" }
            );
            None
        }
    }
}

/// Aggregate one action's declared modifiers at the given proficiency.
///
/// Returns `None` when nothing relevant remains, never a zero-filled value.
pub fn aggregate<C: ActionCatalog + ?Sized>(
    declaration: Option<&ModifierDeclaration>,
    catalog: &C,
    proficiency_level: u32,
) -> Option<AggregatedModifiers> {
    let declaration = declaration?;
    let at_cap = proficiency_level >= proficiency::MAX;
    let mut result = AggregatedModifiers::default();

    for group in ModifierGroup::ALL {
        let total: f64 = ModifierKind::ALL
            .into_iter()
            .filter(|k| k.group() == group)
            .filter_map(|k| {
                let dampen = at_cap && catalog.is_negative(k);
                kind_magnitude(declaration, k, catalog.activity_id(), dampen)
                    .map(|m| m * k.sign())
            })
            .sum();
        if total != 0.0 {
            *result.slot(group) = Some(total);
        }
    }

    (!result.is_empty()).then_some(result)
}

/// Sum several aggregation results key by key, treating missing keys as zero.
pub fn combine<'a, I>(parts: I) -> AggregatedModifiers
where
    I: IntoIterator<Item = Option<&'a AggregatedModifiers>>,
{
    let mut total = AggregatedModifiers::default();
    for part in parts.into_iter().flatten() {
        for group in ModifierGroup::ALL {
            if let Some(v) = part.get(group) {
                let slot = total.slot(group);
                *slot = Some(slot.unwrap_or(0.0) + v);
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const AGILITY: &str = "melvorD:Agility";

    fn catalog() -> Catalog {
        Catalog::new(AGILITY, vec![0], vec![]).unwrap()
    }

    #[test]
    fn no_declaration_is_absent() {
        assert!(aggregate(None, &catalog(), 50).is_none());
    }

    #[test]
    fn empty_declaration_is_absent_not_zero_filled() {
        let decl = ModifierDeclaration::new();
        assert_eq!(aggregate(Some(&decl), &catalog(), 50), None);
    }

    #[test]
    fn unrecognized_names_are_ignored() {
        let mut decl = ModifierDeclaration::new();
        decl.insert("increasedGPGlobal", ModifierValue::Scalar(10.0));
        assert!(aggregate(Some(&decl), &catalog(), 50).is_none());
    }

    #[test]
    fn signs_follow_kind() {
        let decl = ModifierDeclaration::new()
            .with_scoped(ModifierKind::DecreasedSkillIntervalPercent, AGILITY, 4.0)
            .with_scoped(ModifierKind::IncreasedSkillInterval, AGILITY, 200.0)
            .with_scalar(ModifierKind::DecreasedGlobalSkillXP, 3.0);
        let agg = aggregate(Some(&decl), &catalog(), 50).unwrap();
        assert_eq!(agg.time_percent, Some(-4.0));
        assert_eq!(agg.time_flat, Some(200.0));
        assert_eq!(agg.reward_percent, Some(-3.0));
    }

    #[test]
    fn scoped_entries_for_other_activities_do_not_count() {
        let decl = ModifierDeclaration::new()
            .with_scoped(ModifierKind::IncreasedSkillXP, "melvorD:Woodcutting", 10.0)
            .with_scoped(ModifierKind::IncreasedSkillXP, AGILITY, 2.0);
        let agg = aggregate(Some(&decl), &catalog(), 50).unwrap();
        assert_eq!(agg.reward_percent, Some(2.0));

        let other_only = ModifierDeclaration::new().with_scoped(
            ModifierKind::IncreasedSkillXP,
            "melvorD:Woodcutting",
            10.0,
        );
        assert!(aggregate(Some(&other_only), &catalog(), 50).is_none());
    }

    #[test]
    fn net_zero_group_is_omitted() {
        let decl = ModifierDeclaration::new()
            .with_scalar(ModifierKind::IncreasedGlobalSkillXP, 5.0)
            .with_scalar(ModifierKind::DecreasedGlobalSkillXP, 5.0)
            .with_scoped(ModifierKind::IncreasedSkillInterval, AGILITY, 100.0);
        let agg = aggregate(Some(&decl), &catalog(), 50).unwrap();
        assert_eq!(agg.reward_percent, None);
        assert_eq!(agg.time_flat, Some(100.0));
    }

    #[test]
    fn shape_mismatch_contributes_nothing() {
        let mut decl = ModifierDeclaration::new();
        // Global kind declared as a list, scoped kind declared as a scalar.
        decl.insert(
            "increasedGlobalSkillXP",
            ModifierValue::Scoped(vec![ScopedMagnitude {
                scope: AGILITY.into(),
                value: 5.0,
            }]),
        );
        decl.insert("increasedSkillXP", ModifierValue::Scalar(5.0));
        assert!(aggregate(Some(&decl), &catalog(), 50).is_none());
    }

    #[test]
    fn negative_modifiers_halved_at_max_proficiency() {
        let decl = ModifierDeclaration::new()
            .with_scoped(ModifierKind::IncreasedSkillIntervalPercent, AGILITY, 10.0)
            .with_scalar(ModifierKind::IncreasedGlobalSkillXP, 8.0);
        let at_98 = aggregate(Some(&decl), &catalog(), 98).unwrap();
        let at_99 = aggregate(Some(&decl), &catalog(), 99).unwrap();
        assert_eq!(at_98.time_percent, Some(10.0));
        assert_eq!(at_99.time_percent, Some(5.0));
        // Positive modifiers are untouched.
        assert_eq!(at_98.reward_percent, at_99.reward_percent);
    }

    #[test]
    fn from_json_resolves_both_shapes() {
        let scalar = serde_json::json!(3);
        assert_eq!(
            ModifierValue::from_json(&scalar),
            Some(ModifierValue::Scalar(3.0))
        );
        let scoped = serde_json::json!([{ "scope": AGILITY, "value": 2 }]);
        assert!(matches!(
            ModifierValue::from_json(&scoped),
            Some(ModifierValue::Scoped(ref v)) if v.len() == 1 && v[0].value == 2.0
        ));
        assert_eq!(ModifierValue::from_json(&serde_json::json!("5")), None);
        assert_eq!(ModifierValue::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(ModifierValue::from_json(&serde_json::json!({ "v": 1 })), None);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ModifierKind::ALL {
            assert_eq!(ModifierKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ModifierKind::from_name("increasedGPGlobal"), None);
    }

    #[test]
    fn combine_sums_per_key() {
        let a = AggregatedModifiers {
            reward_percent: Some(5.0),
            time_percent: Some(-2.0),
            ..Default::default()
        };
        let b = AggregatedModifiers {
            reward_percent: Some(3.0),
            time_flat: Some(-100.0),
            ..Default::default()
        };
        let total = combine([Some(&a), None, Some(&b)]);
        assert_eq!(total.reward_percent, Some(8.0));
        assert_eq!(total.time_percent, Some(-2.0));
        assert_eq!(total.time_flat, Some(-100.0));
    }

    #[test]
    fn combine_of_nothing_is_empty() {
        let total = combine(std::iter::empty::<Option<&AggregatedModifiers>>());
        assert!(total.is_empty());
        assert_eq!(total.value(ModifierGroup::RewardPercent), 0.0);
    }

    #[test]
    fn serializes_only_present_keys() {
        let agg = AggregatedModifiers {
            time_flat: Some(-50.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&agg).unwrap();
        assert_eq!(json, r#"{"timeFlat":-50.0}"#);
    }
}
