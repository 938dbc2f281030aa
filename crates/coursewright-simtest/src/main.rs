//! Coursewright Headless Optimization Harness
//!
//! Validates engine properties against an action catalog, then runs a
//! sweep of (level, proficiency) requests and reports or exports the
//! optimal courses. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p coursewright-simtest
//!   cargo run -p coursewright-simtest -- --verbose
//!   cargo run -p coursewright-simtest -- --level 60 --proficiency 99
//!   cargo run -p coursewright-simtest -- --catalog my_catalog.json --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use coursewright_logic::catalog::{ActionCatalog, Catalog};
use coursewright_logic::combinations::{layout_count, layouts};
use coursewright_logic::constants::proficiency;
use coursewright_logic::modifiers::{aggregate, ModifierDeclaration, ModifierKind};
use coursewright_logic::optimizer::{optimal_course_sweep, CourseError, OptimalCourse};
use coursewright_logic::selection::{base_rate, included_tiers, select_candidates};
use coursewright_logic::sweep::{parse_proficiency, LevelPair, SweepPlan};
use serde::Serialize;

// ── Bundled data (same JSON the tests use) ──────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/agility_catalog.json");

#[derive(Parser)]
#[command(
    name = "coursewright-simtest",
    about = "Validate a course catalog and report reward-per-second optimal courses",
    version
)]
struct Cli {
    /// Catalog JSON file (default: bundled sample catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Sweep plan JSON file (default: every tier unlock at proficiency 50)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Optimize a single level instead of the whole plan
    #[arg(long)]
    level: Option<u32>,

    /// Proficiency for every request; non-numeric values are ignored
    #[arg(long)]
    proficiency: Option<String>,

    /// Print sweep results as JSON on stdout
    #[arg(long, short = 'j')]
    json: bool,

    /// Show passing checks too
    #[arg(long, short = 'v')]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: impl Into<String>, passed: bool, detail: String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepEntry<'a> {
    request: LevelPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    course: Option<&'a OptimalCourse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::from_json_str(CATALOG_JSON).context("loading bundled catalog")?,
    };
    let plan = build_plan(&cli)?;

    log::info!(
        "catalog '{}': {} actions over {} tiers, {} requests",
        catalog.activity_id(),
        catalog.actions().len(),
        catalog.tier_count(),
        plan.pairs().len()
    );

    let mut results = Vec::new();
    results.extend(validate_catalog(&catalog));
    results.extend(validate_tier_unlocks(&catalog));
    results.extend(validate_baselines(&catalog, &plan));
    results.extend(validate_enumeration(&catalog, &plan));
    results.extend(validate_dampening(&catalog));

    let sweep = optimal_course_sweep(&catalog, plan.pairs());
    results.extend(validate_sweep(&catalog, &plan, &sweep));

    if cli.json {
        let entries: Vec<SweepEntry<'_>> = plan
            .pairs()
            .iter()
            .zip(&sweep)
            .map(|(pair, result)| SweepEntry {
                request: *pair,
                course: result.as_ref().ok(),
                error: result.as_ref().err().map(CourseError::to_string),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("serializing sweep")?
        );
    } else {
        report_sweep(&catalog, &plan, &sweep, cli.level.is_some());
    }

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    for r in &results {
        if !r.passed {
            log::error!("✗ {}: {}", r.name, r.detail);
        } else if cli.verbose {
            log::info!("✓ {}: {}", r.name, r.detail);
        }
    }
    log::info!(
        "=== RESULT: {}/{} checks passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn build_plan(cli: &Cli) -> Result<SweepPlan> {
    let mut plan = match &cli.plan {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading plan {}", path.display()))?;
            SweepPlan::from_json_str(&json)
                .with_context(|| format!("parsing plan {}", path.display()))?
        }
        None => SweepPlan::default(),
    };

    if let Some(level) = cli.level {
        let p = cli
            .proficiency
            .as_deref()
            .and_then(parse_proficiency)
            .unwrap_or(proficiency::DEFAULT);
        plan = SweepPlan::new(vec![LevelPair::new(level, p)]);
    }
    if let Some(input) = &cli.proficiency {
        if !plan.set_proficiency(input) {
            log::warn!("proficiency {input:?} is not a number; keeping the plan's values");
        }
    }
    Ok(plan)
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog) -> Vec<TestResult> {
    let mut results = Vec::new();

    for tier in 0..catalog.tier_count() {
        let count = catalog.actions().iter().filter(|a| a.tier == tier).count();
        results.push(TestResult::check(
            format!("tier_{tier}_has_actions"),
            count > 0,
            format!("{count} actions"),
        ));
    }

    let ignored: Vec<String> = catalog
        .declared_modifier_names()
        .into_iter()
        .filter(|name| ModifierKind::from_name(name).is_none())
        .collect();
    if !ignored.is_empty() {
        log::info!("modifiers without rate effect: {}", ignored.join(", "));
    }

    let granting = catalog
        .actions()
        .iter()
        .filter(|a| aggregate(a.modifiers.as_ref(), catalog, proficiency::DEFAULT).is_some())
        .count();
    log::info!(
        "{granting} of {} actions grant modifiers at proficiency {}",
        catalog.actions().len(),
        proficiency::DEFAULT
    );

    results
}

// ── 2. Tier unlocks ─────────────────────────────────────────────────────

fn validate_tier_unlocks(catalog: &Catalog) -> Vec<TestResult> {
    // Inclusion only changes at a threshold, so the levels on either side
    // of each one are enough.
    let mut levels: Vec<u32> = catalog
        .tier_unlock_levels()
        .iter()
        .flat_map(|&t| [t.saturating_sub(1), t])
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut violations = 0;
    for pair in levels.windows(2) {
        let lower = included_tiers(catalog, pair[0]);
        let higher = included_tiers(catalog, pair[1]);
        if !lower.iter().all(|t| higher.contains(t)) {
            violations += 1;
        }
    }
    for (tier, &threshold) in catalog.tier_unlock_levels().iter().enumerate() {
        let unlocked = included_tiers(catalog, threshold).contains(&tier);
        let early = threshold > 0 && included_tiers(catalog, threshold - 1).contains(&tier);
        if !unlocked || early {
            violations += 1;
        }
    }
    vec![TestResult::check(
        "included_tiers_monotonic",
        violations == 0,
        format!("{violations} violations over {} boundary levels", levels.len()),
    )]
}

// ── 3. Baseline picks ───────────────────────────────────────────────────

fn validate_baselines(catalog: &Catalog, plan: &SweepPlan) -> Vec<TestResult> {
    let mut violations = 0;
    for pair in plan.pairs() {
        for choices in select_candidates(catalog, pair.level, pair.proficiency) {
            let Some(baseline) = choices.baseline else {
                continue;
            };
            let best = base_rate(catalog, baseline, pair.proficiency);
            violations += catalog
                .actions()
                .iter()
                .filter(|a| a.tier == choices.tier)
                .filter(|a| aggregate(a.modifiers.as_ref(), catalog, pair.proficiency).is_none())
                .filter(|a| base_rate(catalog, a, pair.proficiency) > best)
                .count();
        }
    }
    vec![TestResult::check(
        "baseline_is_tier_maximum",
        violations == 0,
        format!("{violations} neutral actions beat their tier's baseline"),
    )]
}

// ── 4. Enumeration ──────────────────────────────────────────────────────

fn validate_enumeration(catalog: &Catalog, plan: &SweepPlan) -> Vec<TestResult> {
    let mut results = Vec::new();
    for pair in plan.pairs() {
        let choices = select_candidates(catalog, pair.level, pair.proficiency);
        if choices.iter().any(|c| c.is_empty()) {
            continue;
        }
        let expected: usize = choices.iter().map(|c| c.len()).product();
        let mut produced = 0usize;
        let mut complete = true;
        for layout in layouts(&choices) {
            produced += 1;
            complete &= layout.len() == choices.len();
        }
        results.push(TestResult::check(
            format!("enumeration_level_{}", pair.level),
            produced == expected && produced == layout_count(&choices) && complete,
            format!("{produced} layouts, expected {expected}"),
        ));
    }
    results
}

// ── 5. Negative dampening ───────────────────────────────────────────────

fn validate_dampening(catalog: &Catalog) -> Vec<TestResult> {
    let mut checked = 0;
    let mut violations = 0;
    for action in catalog.actions() {
        let Some(declaration) = action.modifiers.as_ref() else {
            continue;
        };
        for kind in ModifierKind::ALL {
            let Some(value) = declaration.get(kind.name()) else {
                continue;
            };
            let mut single = ModifierDeclaration::new();
            single.insert(kind.name(), value.clone());
            let group = kind.group();
            let below = aggregate(Some(&single), catalog, proficiency::MAX - 1)
                .map_or(0.0, |m| m.value(group));
            let at_cap = aggregate(Some(&single), catalog, proficiency::MAX)
                .map_or(0.0, |m| m.value(group));
            let factor = if catalog.is_negative(kind) {
                proficiency::NEGATIVE_DAMPENING
            } else {
                1.0
            };
            checked += 1;
            if at_cap != below * factor {
                log::debug!(
                    "'{}' {}: {below} below cap, {at_cap} at cap",
                    action.id,
                    kind.name()
                );
                violations += 1;
            }
        }
    }
    vec![TestResult::check(
        "negative_dampening_at_cap",
        violations == 0,
        format!("{checked} declared modifiers checked, {violations} scaled wrongly at cap"),
    )]
}

// ── 6. Sweep ────────────────────────────────────────────────────────────

fn validate_sweep(
    catalog: &Catalog,
    plan: &SweepPlan,
    sweep: &[Result<OptimalCourse, CourseError>],
) -> Vec<TestResult> {
    let mut results = vec![TestResult::check(
        "sweep_len_matches_plan",
        sweep.len() == plan.pairs().len(),
        format!("{} results for {} requests", sweep.len(), plan.pairs().len()),
    )];

    let again = optimal_course_sweep(catalog, plan.pairs());
    results.push(TestResult::check(
        "sweep_idempotent",
        again.as_slice() == sweep,
        "second sweep compared with first".to_string(),
    ));

    for (pair, result) in plan.pairs().iter().zip(sweep) {
        let name = format!("course_level_{}_prof_{}", pair.level, pair.proficiency);
        let tiers = included_tiers(catalog, pair.level);
        let empty_tier = tiers
            .iter()
            .copied()
            .find(|&t| catalog.actions().iter().all(|a| a.tier != t));
        let check = match result {
            Ok(course) => TestResult::check(
                name,
                !tiers.is_empty()
                    && empty_tier.is_none()
                    && course.actions.len() == tiers.len()
                    && course.level == pair.level
                    && course.proficiency == pair.proficiency,
                format!("{} actions for {} tiers", course.actions.len(), tiers.len()),
            ),
            Err(e @ CourseError::NoTiersUnlocked { .. }) => {
                TestResult::check(name, tiers.is_empty(), e.to_string())
            }
            Err(e @ CourseError::IncompleteTier { tier, .. }) => {
                TestResult::check(name, empty_tier == Some(*tier), e.to_string())
            }
        };
        results.push(check);
    }
    results
}

// ── Report ──────────────────────────────────────────────────────────────

fn report_sweep(
    catalog: &Catalog,
    plan: &SweepPlan,
    sweep: &[Result<OptimalCourse, CourseError>],
    breakdown: bool,
) {
    for (pair, result) in plan.pairs().iter().zip(sweep) {
        match result {
            Ok(course) => {
                let names: Vec<&str> = course
                    .actions
                    .iter()
                    .map(|a| catalog.action(&a.id).map_or(a.id.as_str(), |x| x.name.as_str()))
                    .collect();
                log::info!(
                    "level {:>3} prof {:>2}: {:.4}/s ({:.2}s, {:.2} reward, {} layouts) [{}]",
                    pair.level,
                    pair.proficiency,
                    course.rate,
                    course.total_seconds,
                    course.total_reward,
                    course.layouts_evaluated,
                    names.join(", ")
                );
                if breakdown {
                    for line in breakdown_lines(catalog, course) {
                        log::info!("{line}");
                    }
                }
            }
            Err(e) => log::warn!("level {:>3} prof {:>2}: {e}", pair.level, pair.proficiency),
        }
    }
}

/// One line per chosen action: name, reward, seconds and reward per second.
fn breakdown_lines(catalog: &Catalog, course: &OptimalCourse) -> Vec<String> {
    course
        .actions
        .iter()
        .enumerate()
        .map(|(tier, a)| {
            let name = catalog.action(&a.id).map_or(a.id.as_str(), |x| x.name.as_str());
            format!(
                "  tier {tier:>2} {name:<24} {:>9.2} reward {:>7.2}s {:>9.4}/s",
                a.reward,
                a.interval_ms / 1000.0,
                a.rate()
            )
        })
        .collect()
}
