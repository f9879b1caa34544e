// SPDX-License-Identifier: GPL-3.0

//! Reinitialization probing for upgradeable contracts.
//!
//! A probe replays an attack-shaped call sequence against a fork session:
//! auxiliary deploys and calls first, then the target's initializer, then a
//! marker call that only an attacker-controlled contract would answer. The
//! verdict is read off observable state, not off call success: a probe only
//! reports a reachable initializer when the marker ran through it and the
//! target's code or watched storage actually changed.
//!
//! Call sequences are described by JSON scripts ([`CallScript`]), executed
//! in order by the [`Sequencer`], judged by [`probe::run`] and rendered by
//! [`report`]. The [`survey`] module is the reconnaissance counterpart: it
//! reads raw storage slots straight from the ledger, no session involved.

pub mod abi;
mod artifact;
pub mod error;
pub mod probe;
pub mod report;
mod script;
mod sequencer;
pub mod survey;
#[cfg(test)]
mod testing;

pub use error::{ConfigError, ProbeError, SequencerError, StepFailedError, SurveyError};
pub use probe::{Evidence, ProbeOutcome, ProbeVerdict, Verdict};
pub use report::ReportContext;
pub use script::{CallScript, CallStep, CallTarget, StepAction};
pub use sequencer::{CallResult, Sequencer, StepRecord};
pub use survey::{SlotQuery, SlotRow, SlotSurvey};
