//! Run reports: the published winners of a run, saved as JSON.

use crate::arena::{History, Published};
use crate::artifact::{Composition, Relation};
use crate::error::{Error, Result};
use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Current report file version.
const REPORT_VERSION: u32 = 1;

/// Everything a run published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report format version for compatibility checking.
    pub version: u32,

    /// Master seed, when the run was seeded.
    pub seed: Option<u64>,

    /// Rounds completed.
    pub rounds: usize,

    pub relations: Vec<Published<Relation>>,

    pub compositions: Vec<Published<Composition>>,
}

impl RunReport {
    pub fn from_history(history: &History, rounds: usize, seed: Option<u64>) -> Self {
        Self {
            version: REPORT_VERSION,
            seed,
            rounds,
            relations: history.relations().to_vec(),
            compositions: history.compositions().to_vec(),
        }
    }

    /// Snapshot a simulation's history.
    pub fn new(simulation: &Simulation) -> Self {
        Self::from_history(
            simulation.history(),
            simulation.round(),
            simulation.config().seed,
        )
    }

    /// Save to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let report: Self = serde_json::from_str(&content)?;

        if report.version != REPORT_VERSION {
            return Err(Error::Config(format!(
                "report version mismatch: expected {REPORT_VERSION}, found {}",
                report.version
            )));
        }

        Ok(report)
    }
}
