use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use crate::{BlockHash, Evidence, TimeDiff, Timestamp};

/// Consensus parameters bounding how long evidence stays actionable.
#[derive(Clone, Copy, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceParams {
    /// Evidence older than this many blocks may be pruned.
    pub max_age_num_blocks: u64,
    /// Evidence older than this duration may be pruned.
    pub max_age_duration: TimeDiff,
}

impl EvidenceParams {
    /// Creates a new set of evidence parameters.
    pub fn new(max_age_num_blocks: u64, max_age_duration: TimeDiff) -> Self {
        EvidenceParams {
            max_age_num_blocks,
            max_age_duration,
        }
    }
}

impl Default for EvidenceParams {
    fn default() -> Self {
        EvidenceParams {
            max_age_num_blocks: 100_000,
            max_age_duration: TimeDiff::from_seconds(48 * 60 * 60),
        }
    }
}

/// A snapshot of the chain as of the last committed block.
#[derive(Clone, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainState {
    /// Height of the last committed block.
    pub last_block_height: u64,
    /// Time of the last committed block.
    pub last_block_time: Timestamp,
    /// Evidence age limits in force.
    pub evidence_params: EvidenceParams,
}

impl ChainState {
    /// Creates a new chain state snapshot.
    pub fn new(
        last_block_height: u64,
        last_block_time: Timestamp,
        evidence_params: EvidenceParams,
    ) -> Self {
        ChainState {
            last_block_height,
            last_block_time,
            evidence_params,
        }
    }

    /// Returns `true` if evidence from the given height and time is too old to act on.
    ///
    /// Evidence only expires once it is too old both in blocks and in wall-clock time.
    pub fn is_expired(&self, height: u64, time: Timestamp) -> bool {
        let age_blocks = self.last_block_height.saturating_sub(height);
        let age_duration = self.last_block_time.saturating_diff(time);
        age_blocks > self.evidence_params.max_age_num_blocks
            && age_duration > self.evidence_params.max_age_duration
    }
}

impl Display for ChainState {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "chain state at height {} ({})",
            self.last_block_height, self.last_block_time
        )
    }
}

/// Header data of a stored block.
#[derive(Clone, Copy, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockMeta {
    /// Height of the block.
    pub height: u64,
    /// Hash of the block.
    pub block_hash: BlockHash,
    /// Time of the block.
    pub time: Timestamp,
}

/// A committed block's evidence section, as kept by block storage.
#[derive(Clone, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    /// Height of the committed block.
    pub height: u64,
    /// Hash of the committed block.
    pub block_hash: BlockHash,
    /// Time of the committed block.
    pub timestamp: Timestamp,
    /// Evidence included in the block.
    pub evidence: Vec<Evidence>,
}
