//! Action catalog — the read-only data source the optimizer is handed.
//!
//! [`ActionCatalog`] is the seam: the optimizer never reaches for global
//! state, it reads actions, tier thresholds, tick rounding and modifier
//! metadata through this trait. [`Catalog`] is the in-memory implementation,
//! built directly or loaded from JSON.
//!
//! ```
//! use coursewright_logic::catalog::{Action, ActionCatalog, Catalog};
//!
//! let catalog = Catalog::new(
//!     "melvorD:Agility",
//!     vec![0, 10],
//!     vec![Action::new("log", 0, 10.0, 5000.0), Action::new("rope", 1, 12.0, 6000.0)],
//! )
//! .unwrap();
//! assert_eq!(catalog.action("rope").map(|a| a.tier), Some(1));
//! assert_eq!(catalog.round_to_tick(5024.0), 5000.0);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_ACTIVITY_ID, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIER_UNLOCK_LEVELS};
use crate::modifiers::{ModifierDeclaration, ModifierKind, ModifierValue};

/// A single repeatable action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub name: String,
    /// 0-based tier index into the unlock table.
    pub tier: usize,
    pub base_reward: f64,
    pub base_interval_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<ModifierDeclaration>,
}

impl Action {
    /// Create an action with no modifiers. The name defaults to the id.
    pub fn new(id: &str, tier: usize, base_reward: f64, base_interval_ms: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            tier,
            base_reward,
            base_interval_ms,
            modifiers: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifierDeclaration) -> Self {
        self.modifiers = Some(modifiers);
        self
    }
}

/// Read-only view of everything the optimizer needs from the outside world.
pub trait ActionCatalog {
    /// All actions, in stable catalog order.
    fn actions(&self) -> &[Action];

    fn action(&self, id: &str) -> Option<&Action> {
        self.actions().iter().find(|a| a.id == id)
    }

    /// Minimum level per tier, ascending, index = tier.
    fn tier_unlock_levels(&self) -> &[u32];

    /// Scope that scoped modifiers must name to apply.
    fn activity_id(&self) -> &str;

    /// Round an interval to the nearest valid tick boundary.
    fn round_to_tick(&self, interval_ms: f64) -> f64;

    /// `isNegative` metadata for a recognized modifier kind.
    fn is_negative(&self, kind: ModifierKind) -> bool;
}

/// Errors raised while building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("tier unlock table is empty")]
    EmptyUnlockTable,

    #[error("tier unlock table is not ascending at tier {0}")]
    UnlockTableNotAscending(usize),

    #[error("tick interval must be positive, got {0}")]
    InvalidTickInterval(f64),

    #[error("duplicate action id: {0}")]
    DuplicateId(String),

    #[error("action '{id}' has tier {tier} but only {tiers} tiers exist")]
    TierOutOfRange { id: String, tier: usize, tiers: usize },

    #[error("action '{id}' has non-positive interval {interval_ms}")]
    InvalidInterval { id: String, interval_ms: f64 },

    #[error("action '{id}' has negative reward {reward}")]
    NegativeReward { id: String, reward: f64 },
}

/// In-memory catalog with an id index and modifier metadata.
#[derive(Debug, Clone)]
pub struct Catalog {
    activity_id: String,
    tick_interval_ms: f64,
    tier_unlock_levels: Vec<u32>,
    actions: Vec<Action>,
    index: HashMap<String, usize>,
    /// `isNegative` overrides; kinds not listed use their built-in flag.
    negative_overrides: BTreeMap<ModifierKind, bool>,
}

impl Catalog {
    /// Build and validate a catalog using the default tick interval and metadata.
    pub fn new(
        activity_id: &str,
        tier_unlock_levels: Vec<u32>,
        actions: Vec<Action>,
    ) -> Result<Self, CatalogError> {
        Self::build(
            activity_id.to_string(),
            DEFAULT_TICK_INTERVAL_MS,
            tier_unlock_levels,
            actions,
            BTreeMap::new(),
        )
    }

    fn build(
        activity_id: String,
        tick_interval_ms: f64,
        tier_unlock_levels: Vec<u32>,
        actions: Vec<Action>,
        overrides: BTreeMap<ModifierKind, bool>,
    ) -> Result<Self, CatalogError> {
        if tier_unlock_levels.is_empty() {
            return Err(CatalogError::EmptyUnlockTable);
        }
        if let Some(i) = tier_unlock_levels.windows(2).position(|w| w[0] > w[1]) {
            return Err(CatalogError::UnlockTableNotAscending(i + 1));
        }
        if !(tick_interval_ms.is_finite() && tick_interval_ms > 0.0) {
            return Err(CatalogError::InvalidTickInterval(tick_interval_ms));
        }

        let mut index = HashMap::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            if action.tier >= tier_unlock_levels.len() {
                return Err(CatalogError::TierOutOfRange {
                    id: action.id.clone(),
                    tier: action.tier,
                    tiers: tier_unlock_levels.len(),
                });
            }
            if action.base_interval_ms.is_nan() || action.base_interval_ms <= 0.0 {
                return Err(CatalogError::InvalidInterval {
                    id: action.id.clone(),
                    interval_ms: action.base_interval_ms,
                });
            }
            if action.base_reward < 0.0 {
                return Err(CatalogError::NegativeReward {
                    id: action.id.clone(),
                    reward: action.base_reward,
                });
            }
            if index.insert(action.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(action.id.clone()));
            }
        }

        Ok(Self {
            activity_id,
            tick_interval_ms,
            tier_unlock_levels,
            actions,
            index,
            negative_overrides: overrides,
        })
    }

    /// Override the tick granularity.
    pub fn with_tick_interval(mut self, tick_interval_ms: f64) -> Result<Self, CatalogError> {
        if !(tick_interval_ms.is_finite() && tick_interval_ms > 0.0) {
            return Err(CatalogError::InvalidTickInterval(tick_interval_ms));
        }
        self.tick_interval_ms = tick_interval_ms;
        Ok(self)
    }

    /// Override the `isNegative` flag of one modifier kind.
    pub fn with_negative(mut self, kind: ModifierKind, is_negative: bool) -> Self {
        self.negative_overrides.insert(kind, is_negative);
        self
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        raw.into_catalog()
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval_ms
    }

    pub fn tier_count(&self) -> usize {
        self.tier_unlock_levels.len()
    }

    /// Every distinct modifier name declared by any action, sorted.
    ///
    /// Includes names the optimizer ignores.
    pub fn declared_modifier_names(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|a| a.modifiers.as_ref())
            .flat_map(|m| m.names())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl ActionCatalog for Catalog {
    fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn action(&self, id: &str) -> Option<&Action> {
        self.index.get(id).map(|&i| &self.actions[i])
    }

    fn tier_unlock_levels(&self) -> &[u32] {
        &self.tier_unlock_levels
    }

    fn activity_id(&self) -> &str {
        &self.activity_id
    }

    fn round_to_tick(&self, interval_ms: f64) -> f64 {
        (interval_ms / self.tick_interval_ms).round() * self.tick_interval_ms
    }

    fn is_negative(&self, kind: ModifierKind) -> bool {
        self.negative_overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_is_negative())
    }
}

// ── JSON form ──────────────────────────────────────────────────────────

fn default_activity_id() -> String {
    DEFAULT_ACTIVITY_ID.to_string()
}

fn default_tick_interval() -> f64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_unlock_levels() -> Vec<u32> {
    DEFAULT_TIER_UNLOCK_LEVELS.to_vec()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    #[serde(default = "default_activity_id")]
    activity_id: String,
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: f64,
    #[serde(default = "default_unlock_levels")]
    tier_unlock_levels: Vec<u32>,
    #[serde(default)]
    modifier_metadata: BTreeMap<String, RawModifierMeta>,
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModifierMeta {
    is_negative: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    id: String,
    #[serde(default)]
    name: Option<String>,
    tier: usize,
    base_reward: f64,
    base_interval_ms: f64,
    #[serde(default)]
    modifiers: Option<serde_json::Value>,
}

impl RawAction {
    fn into_action(self) -> Action {
        let modifiers = self.modifiers.and_then(|raw| resolve_declaration(&self.id, raw));
        Action {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            tier: self.tier,
            base_reward: self.base_reward,
            base_interval_ms: self.base_interval_ms,
            modifiers,
        }
    }
}

/// Resolve a raw `modifiers` object. Malformed values are dropped.
fn resolve_declaration(action_id: &str, raw: serde_json::Value) -> Option<ModifierDeclaration> {
    let serde_json::Value::Object(map) = raw else {
        log::debug!("action '{action_id}': modifiers is not an object, ignoring");
        return None;
    };
    let mut declaration = ModifierDeclaration::new();
    for (name, value) in &map {
        match ModifierValue::from_json(value) {
            Some(v) => declaration.insert(name.clone(), v),
            None => log::debug!("action '{action_id}': malformed value for {name}, ignoring"),
        }
    }
    (!declaration.is_empty()).then_some(declaration)
}

impl RawCatalog {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let mut overrides = BTreeMap::new();
        for (name, meta) in self.modifier_metadata {
            match ModifierKind::from_name(&name) {
                Some(kind) => {
                    overrides.insert(kind, meta.is_negative);
                }
                None => log::debug!("metadata for unrecognized modifier {name}, ignoring"),
            }
        }
        let actions = self.actions.into_iter().map(RawAction::into_action).collect();
        Catalog::build(
            self.activity_id,
            self.tick_interval_ms,
            self.tier_unlock_levels,
            actions,
            overrides,
        )
    }
}
