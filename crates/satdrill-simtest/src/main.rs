//! SatDrill Headless Validation Harness
//!
//! Drives scripted training scenarios through the validation engine and
//! performance tracker without any server, storage, or transport. Runs
//! entirely in-process.
//!
//! Usage:
//!   cargo run -p satdrill-simtest
//!   cargo run -p satdrill-simtest -- --verbose

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use satdrill_core::{
    validate_step, CommandOutcome, ErrorSeverity, PerformanceTracker, SessionMetricsStore,
    SessionState, StepDefinition, StepPath, ValidationEngine,
};
use satdrill_logic::command::{CommandRecord, CommandStatus};
use satdrill_logic::scoring::{self, PerformanceTier, ScoreBreakdown};
use satdrill_logic::telemetry::TelemetrySnapshot;

// ── Scenario content (same JSON the content pipeline ships) ─────────────
const SCENARIO_JSON: &str = include_str!("../../../data/commissioning_scenario.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== SatDrill Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Scenario content validation
    results.extend(validate_scenario_content(verbose));

    // 2. Nominal commissioning run end to end
    results.extend(run_nominal_commissioning(verbose));

    // 3. Step-graph routing (recovery and terminal failure)
    results.extend(validate_routing(verbose));

    // 4. Fail-closed behavior on bad content
    results.extend(validate_fail_closed(verbose));

    // 5. Scoring formula sweep
    results.extend(validate_scoring(verbose));

    // 6. Seeded randomized determinism sweep
    results.extend(validate_randomized_determinism(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_scenario() -> Vec<StepDefinition> {
    serde_json::from_str(SCENARIO_JSON).expect("scenario JSON parses")
}

fn telemetry(charge: f64, beacons: u32, downlink: f64) -> TelemetrySnapshot {
    TelemetrySnapshot::new(json!({
        "power": { "currentCharge_percent": charge },
        "communications": { "beaconCount": beacons, "dataDownlinked_mb": downlink },
        "orbit": { "altitude_km": 550.0, "semiMajorAxis_km": 6921.0, "eccentricity": 0.001 },
        "propulsion": { "fuelRemaining_kg": 45.0 },
        "payload": { "mode": "imaging" },
    }))
}

// ── 1. Scenario content ─────────────────────────────────────────────────

fn validate_scenario_content(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario Content ---");
    let mut results = Vec::new();

    let steps: Vec<StepDefinition> = match serde_json::from_str(SCENARIO_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult::new(
                "scenario_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return results;
        }
    };

    results.push(TestResult::new(
        "scenario_step_count",
        steps.len() == 10,
        format!("{} steps loaded", steps.len()),
    ));

    let mut author_errors = Vec::new();
    for step in &steps {
        for err in validate_step(step) {
            author_errors.push(format!("step {}: {err}", step.order));
        }
    }
    results.push(TestResult::new(
        "scenario_authoring_clean",
        author_errors.is_empty(),
        if author_errors.is_empty() {
            "no authoring errors".to_string()
        } else {
            author_errors.join("; ")
        },
    ));

    let checkpoints = steps.iter().filter(|s| s.is_checkpoint).count();
    results.push(TestResult::new(
        "scenario_has_checkpoints",
        checkpoints >= 2,
        format!("{} checkpoint steps", checkpoints),
    ));

    if verbose {
        for step in &steps {
            println!("    step {}: {}", step.order, step.title);
        }
    }
    results
}

// ── 2. Nominal run ──────────────────────────────────────────────────────

fn run_nominal_commissioning(_verbose: bool) -> Vec<TestResult> {
    println!("--- Nominal Commissioning Run ---");
    let mut results = Vec::new();

    let engine = ValidationEngine::new();
    let steps = load_scenario();
    let mut session = SessionState::new();
    let mut tracker = PerformanceTracker::new(SessionMetricsStore::new());
    // Steps 1–7 plus 9 and 10 are the nominal path; 8 is recovery-only.
    tracker.initialize_session("nominal", 9, 100.0, 100.0);

    session.telemetry = telemetry(45.0, 0, 0.0);

    let issue = |session: &mut SessionState,
                     tracker: &mut PerformanceTracker,
                     name: &str,
                     at: f64| {
        session.record_command(CommandRecord::new(name, CommandStatus::Ok, at));
        tracker.record_command(
            "nominal",
            &CommandOutcome {
                name: name.to_string(),
                correct: true,
                redundant: false,
                at_s: at,
            },
        );
        tracker.record_response_time("nominal", 8.0);
    };

    let mut completed = Vec::new();
    let mut clock = 0.0;
    for step in steps.iter().filter(|s| s.order != 8) {
        session.begin_step();

        // Host-side actions that satisfy each step.
        match step.order {
            1 => issue(&mut session, &mut tracker, "DEPLOY_SOLAR_PANELS", 20.0),
            2 => session.telemetry = telemetry(85.0, 0, 0.0),
            3 => {
                issue(&mut session, &mut tracker, "ENABLE_TRACKING", 150.0);
                issue(&mut session, &mut tracker, "DEPLOY_ANTENNA", 160.0);
            }
            4 => session.telemetry = telemetry(85.0, 2, 10.0),
            5 => {} // payload mode already "imaging" in telemetry
            6 => {} // orbit already inside the target band
            7 => session.advance_time(30.0),
            9 => {
                session.advance_time(15.0);
                session.confirm_step(step.order);
            }
            10 => {
                session.telemetry = telemetry(85.0, 4, 120.0);
                session.current_score = tracker.summary("nominal").map(|s| s.overall_score);
            }
            _ => unreachable!("recovery step filtered out"),
        }

        clock += step.expected_duration_s.min(60.0);
        let verdict = engine.evaluate_step(step, &session);
        if verdict.passed {
            session.complete_step(step.order);
            tracker.record_step_completion("nominal", step.order, true, 30.0, clock);
            completed.push(step.order);
        } else {
            results.push(TestResult::new(
                &format!("nominal_step_{}", step.order),
                false,
                verdict.message.clone(),
            ));
        }
    }

    results.push(TestResult::new(
        "nominal_all_steps_pass",
        completed.len() == 9,
        format!("{}/9 steps passed", completed.len()),
    ));

    tracker.complete_session("nominal", clock);
    match tracker.summary("nominal") {
        None => results.push(TestResult::new("nominal_summary", false, "summary missing")),
        Some(summary) => {
            results.push(TestResult::new(
                "nominal_summary",
                summary.completion_ratio == 1.0 && summary.tier == PerformanceTier::Excellent,
                format!(
                    "score {} tier {} ratio {:.2}",
                    summary.overall_score,
                    summary.tier.label(),
                    summary.completion_ratio
                ),
            ));
            results.push(TestResult::new(
                "nominal_achievements",
                summary.achievement_count >= 2,
                format!("{} achievements unlocked", summary.achievement_count),
            ));
        }
    }

    results
}

// ── 3. Routing ──────────────────────────────────────────────────────────

fn validate_routing(_verbose: bool) -> Vec<TestResult> {
    println!("--- Step-Graph Routing ---");
    let mut results = Vec::new();

    let engine = ValidationEngine::new();
    let steps = load_scenario();
    let mut session = SessionState::new();
    session.telemetry = telemetry(30.0, 0, 0.0); // battery too low for step 2

    let verdict = engine.evaluate_step(&steps[1], &session);
    results.push(TestResult::new(
        "low_battery_routes_to_recovery",
        verdict.path == StepPath::Recovery && verdict.next_step == Some(8),
        format!("path {:?}, next {:?}", verdict.path, verdict.next_step),
    ));

    // A failing step with no recovery branch is terminal.
    let verdict = engine.evaluate_step(&steps[0], &session);
    results.push(TestResult::new(
        "missing_command_is_terminal",
        verdict.path == StepPath::Failed && verdict.next_step.is_none(),
        format!("path {:?}", verdict.path),
    ));

    // Sequence order matters: antenna before tracking stalls step 3.
    session.record_command(CommandRecord::new("DEPLOY_ANTENNA", CommandStatus::Ok, 10.0));
    session.record_command(CommandRecord::new("ENABLE_TRACKING", CommandStatus::Ok, 20.0));
    let verdict = engine.evaluate_step(&steps[2], &session);
    results.push(TestResult::new(
        "sequence_order_enforced",
        !verdict.passed,
        format!("out-of-order sequence verdict: {}", verdict.message),
    ));

    results
}

// ── 4. Fail-closed ──────────────────────────────────────────────────────

fn validate_fail_closed(_verbose: bool) -> Vec<TestResult> {
    println!("--- Fail-Closed Behavior ---");
    let mut results = Vec::new();

    let engine = ValidationEngine::new();
    let session = SessionState::new();

    let unknown: StepDefinition = serde_json::from_value(json!({
        "order": 42,
        "title": "Future step",
        "instructions": "",
        "condition": { "kind": "laser_crosslink_lock", "targets": 2 },
        "expected_duration_s": 60.0,
    }))
    .expect("unknown kind deserializes to the fallback");
    let verdict = engine.evaluate_step(&unknown, &session);
    results.push(TestResult::new(
        "unknown_kind_fails_closed",
        !verdict.passed && verdict.path == StepPath::Failed && !verdict.checks.is_empty(),
        verdict.message.clone(),
    ));

    let malformed: StepDefinition = serde_json::from_value(json!({
        "order": 43,
        "title": "Empty sequence",
        "instructions": "",
        "condition": { "kind": "command_sequence", "commands": [] },
        "expected_duration_s": 60.0,
    }))
    .expect("malformed config still deserializes");
    let verdict = engine.evaluate_step(&malformed, &session);
    results.push(TestResult::new(
        "malformed_config_fails_closed",
        !verdict.passed && verdict.path == StepPath::Failed,
        verdict.message.clone(),
    ));

    results.push(TestResult::new(
        "authoring_catches_malformed_config",
        !validate_step(&malformed).is_empty(),
        "validate_step flags the empty sequence",
    ));

    results
}

// ── 5. Scoring sweep ────────────────────────────────────────────────────

fn validate_scoring(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scoring Formulas ---");
    let mut results = Vec::new();

    results.push(TestResult::new(
        "response_decay",
        scoring::response_time_score(Some(20.0)) == 90.0
            && scoring::response_time_score(Some(2.0)) == 80.0
            && scoring::response_time_score(None) == 100.0,
        "window/haste/decay behavior",
    ));

    results.push(TestResult::new(
        "accuracy_redundancy_cap",
        scoring::command_accuracy_score(10, 10, 10) == 80.0,
        "redundancy penalty capped at 0.2",
    ));

    let breakdown = ScoreBreakdown {
        command_accuracy: 90.0,
        response_time: 80.0,
        resource_management: 100.0,
        completion_time: 60.0,
        error_avoidance: 100.0,
    };
    results.push(TestResult::new(
        "overall_weighted_sum",
        scoring::overall_score(&breakdown) == 87.0,
        "0.30/0.20/0.25/0.15/0.10 weights",
    ));

    results.push(TestResult::new(
        "tier_boundaries",
        PerformanceTier::from_score(90.0) == PerformanceTier::Excellent
            && PerformanceTier::from_score(89.9) == PerformanceTier::Good
            && PerformanceTier::from_score(59.9) == PerformanceTier::NeedsImprovement,
        "threshold scan highest-first",
    ));

    results
}

// ── 6. Randomized determinism ───────────────────────────────────────────

fn validate_randomized_determinism(verbose: bool) -> Vec<TestResult> {
    println!("--- Randomized Determinism Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(1977);

    let mut out_of_bounds = 0u32;
    let mut nondeterministic = 0u32;
    const RUNS: u32 = 200;

    for run in 0..RUNS {
        let id = format!("sweep-{run}");
        let mut tracker = PerformanceTracker::new(SessionMetricsStore::new());
        let total_steps = rng.gen_range(1..=12);
        tracker.initialize_session(&id, total_steps, 100.0, 100.0);

        for i in 0..rng.gen_range(0..25) {
            tracker.record_command(
                &id,
                &CommandOutcome {
                    name: "PING".to_string(),
                    correct: rng.gen_bool(0.8),
                    redundant: rng.gen_bool(0.1),
                    at_s: f64::from(i) * rng.gen_range(1.0..20.0),
                },
            );
        }
        for _ in 0..rng.gen_range(0..8) {
            tracker.record_response_time(&id, rng.gen_range(0.5..60.0));
        }
        for _ in 0..rng.gen_range(0..4) {
            let severity = match rng.gen_range(0..3) {
                0 => ErrorSeverity::Critical,
                1 => ErrorSeverity::Warning,
                _ => ErrorSeverity::Minor,
            };
            tracker.record_error(&id, "sweep", severity);
        }
        tracker.record_resource_snapshot(
            &id,
            rng.gen_range(0.0..120.0),
            rng.gen_range(0.0..100.0),
        );
        let completed = rng.gen_range(0..=total_steps);
        for step in 1..=completed {
            tracker.record_step_completion(&id, step, true, 30.0, f64::from(step) * 60.0);
        }
        tracker.complete_session(&id, f64::from(total_steps) * 60.0);

        let summary = tracker.summary(&id).expect("session is live");
        let scores = [
            summary.overall_score,
            summary.breakdown.command_accuracy,
            summary.breakdown.response_time,
            summary.breakdown.resource_management,
            summary.breakdown.completion_time,
            summary.breakdown.error_avoidance,
        ];
        if scores.iter().any(|s| !(0.0..=100.0).contains(s)) {
            out_of_bounds += 1;
            if verbose {
                println!("    run {run}: score out of bounds: {scores:?}");
            }
        }

        let before = summary.overall_score;
        if let Some(metrics) = tracker.store().get(&id) {
            let mut again = metrics.clone();
            again.recompute();
            if again.overall_score.to_bits() != before.to_bits() {
                nondeterministic += 1;
            }
        }
    }

    results.push(TestResult::new(
        "scores_within_bounds",
        out_of_bounds == 0,
        format!("{out_of_bounds}/{RUNS} runs out of bounds"),
    ));
    results.push(TestResult::new(
        "recompute_deterministic",
        nondeterministic == 0,
        format!("{nondeterministic}/{RUNS} runs drifted on recompute"),
    ));

    results
}
