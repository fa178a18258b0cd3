//! Pure validation and scoring logic for SatDrill.
//!
//! This crate contains all decision logic that is independent of any
//! database, transport, or runtime. Functions take plain data and return
//! results, making them unit-testable and portable between the training
//! server, replay tools, and the headless simtest harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`achievements`] | Achievement ids and detection predicates |
//! | [`check`] | Per-check outcome type and deterministic number formatting |
//! | [`command`] | Command records, statuses, history scans |
//! | [`condition`] | Step completion conditions (closed tagged union) |
//! | [`constants`] | Planetary radius, critical commands, score weights |
//! | [`evaluate`] | One pure evaluator per condition kind, plus dispatch |
//! | [`orbital`] | Apoapsis/periapsis derivation from orbital elements |
//! | [`scoring`] | Five sub-score formulas, weighted overall, tiers |
//! | [`telemetry`] | Nested telemetry snapshot with dotted-path lookup |

pub mod achievements;
pub mod check;
pub mod command;
pub mod condition;
pub mod constants;
pub mod evaluate;
pub mod orbital;
pub mod scoring;
pub mod telemetry;
