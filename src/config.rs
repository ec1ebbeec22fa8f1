//! Configuration for the extraction pipeline and task orchestration.

use serde::{Deserialize, Serialize};

/// Confidence scoring policy.
///
/// The weights are a heuristic ranking aid, not a calibrated probability —
/// they exist so downstream consumers can filter low-trust extractions.
/// Defaults mirror long-standing production values; override per deployment
/// if labeled data ever says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Starting score for every claim.
    pub base: f32,
    /// Bonus when the claim text reaches `min_length` characters
    /// (signal the extraction was not truncated).
    pub length_bonus: f32,
    /// Bonus when type/reference consistency holds: dependent claims have
    /// references, independent claims have none.
    pub consistency_bonus: f32,
    /// Bonus when the text ends in sentence-terminal punctuation
    /// (signal the span boundary was found, not cut mid-sentence).
    pub terminal_bonus: f32,
    /// Character threshold for `length_bonus`.
    pub min_length: usize,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            length_bonus: 0.2,
            consistency_bonus: 0.2,
            terminal_bonus: 0.1,
            min_length: 20,
        }
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Checkpoint every `total_cells / checkpoint_divisor` cells.
    pub checkpoint_divisor: usize,
    /// Lower bound on the checkpoint interval so large inputs are not
    /// snapshotted on every cell. Runs shorter than the interval still
    /// checkpoint once, right before their final cell.
    pub min_checkpoint_interval: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            checkpoint_divisor: 10,
            min_checkpoint_interval: 5,
        }
    }
}

impl OrchestratorConfig {
    /// Effective checkpoint interval for a run over `total_cells`.
    pub fn checkpoint_interval(&self, total_cells: usize) -> usize {
        (total_cells / self.checkpoint_divisor.max(1)).max(self.min_checkpoint_interval.max(1))
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub score: ScoreWeights,
    pub orchestrator: OrchestratorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_production_values() {
        let w = ScoreWeights::default();
        assert_eq!(w.base, 0.5);
        assert_eq!(w.length_bonus, 0.2);
        assert_eq!(w.consistency_bonus, 0.2);
        assert_eq!(w.terminal_bonus, 0.1);
        assert_eq!(w.min_length, 20);
    }

    #[test]
    fn checkpoint_interval_scales_with_input() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.checkpoint_interval(1000), 100);
        assert_eq!(cfg.checkpoint_interval(100), 10);
    }

    #[test]
    fn checkpoint_interval_has_floor_for_tiny_inputs() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.checkpoint_interval(3), 5);
        assert_eq!(cfg.checkpoint_interval(0), 5);
    }
}
