//! Solver configuration.
//!
//! Loaded from TOML or built in code. Every field has a default so a
//! partial file is valid:
//!
//! ```toml
//! working_days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
//! max_backtracks_per_requirement = 128
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ScheduleError;
use crate::models::Day;

/// Tunables for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Days sessions may be placed on, in week order.
    pub working_days: Vec<Day>,
    /// Consecutive slots per lab block.
    pub lab_block_slots: usize,
    /// Dead ends tolerated per requirement before it is marked unresolved.
    pub max_backtracks_per_requirement: usize,
    /// Shuffles equal-ranked candidates reproducibly when set.
    pub seed: Option<u64>,
    /// Enables the workload balancer's redistribution pass.
    pub rebalance: bool,
    /// Penalty per preferred-rule violation.
    pub preferred_weight: u32,
    /// Penalty per optional-rule violation.
    pub optional_weight: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            working_days: Day::WEEKDAYS.to_vec(),
            lab_block_slots: 2,
            max_backtracks_per_requirement: 64,
            seed: None,
            rebalance: true,
            preferred_weight: 10,
            optional_weight: 1,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ScheduleError> {
        let config: Self = toml::from_str(s).map_err(|e| ScheduleError::Config(e.to_string()))?;
        config.checked()
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_working_days(mut self, days: impl IntoIterator<Item = Day>) -> Self {
        self.working_days = days.into_iter().collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_backtracks(mut self, budget: usize) -> Self {
        self.max_backtracks_per_requirement = budget;
        self
    }

    pub fn with_rebalance(mut self, rebalance: bool) -> Self {
        self.rebalance = rebalance;
        self
    }

    pub fn with_lab_block_slots(mut self, slots: usize) -> Self {
        self.lab_block_slots = slots;
        self
    }

    /// Sorts and dedups working days, rejects unusable values.
    pub fn checked(mut self) -> Result<Self, ScheduleError> {
        self.working_days.sort();
        self.working_days.dedup();
        if self.working_days.is_empty() {
            return Err(ScheduleError::Config("working_days is empty".into()));
        }
        if self.lab_block_slots == 0 {
            return Err(ScheduleError::Config("lab_block_slots must be at least 1".into()));
        }
        Ok(self)
    }

    /// Penalty for one violation at the given priority.
    pub fn weight(&self, priority: crate::models::ConstraintPriority) -> u32 {
        use crate::models::ConstraintPriority::*;
        match priority {
            Mandatory => 0,
            Preferred => self.preferred_weight,
            Optional => self.optional_weight,
        }
    }
}
