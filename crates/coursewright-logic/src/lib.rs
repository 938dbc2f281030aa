//! Pure course optimization logic for Coursewright.
//!
//! This crate contains the engine that picks, for a level and a proficiency,
//! one action per unlocked tier so that total reward per second is
//! maximized. Functions take a read-only catalog plus plain parameters and
//! return fresh values, making them unit-testable and free of global state.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Action catalog trait, JSON loader, tick rounding, modifier metadata |
//! | [`combinations`] | Lazy Cartesian product of per-tier choices into layouts |
//! | [`constants`] | Tick granularity, proficiency bounds, default tables |
//! | [`evaluation`] | Effective reward/interval for a layout, rate calculation |
//! | [`modifiers`] | Recognized modifier kinds, per-group aggregation, combining |
//! | [`optimizer`] | Best course per request, ordered sweeps |
//! | [`selection`] | Unlocked tiers, best neutral pick, viable-choice sets |
//! | [`sweep`] | Sweep plans of (level, proficiency) pairs, proficiency parsing |

pub mod catalog;
pub mod combinations;
pub mod constants;
pub mod evaluation;
pub mod modifiers;
pub mod optimizer;
pub mod selection;
pub mod sweep;
