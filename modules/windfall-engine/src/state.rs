//! Mutable state of one campaign run. Explicit struct, threaded through the
//! orchestrator; nothing about a run lives in globals.

/// Sticky conditions latch for the rest of the run once raised and fold
/// into the aggregate status reported to the outer loop.
#[derive(Debug, Default)]
pub struct RunState {
    /// The platform flagged the account mid-run (comment or like anomaly).
    pub flagged: bool,
    /// The follow cap was hit; entries that still need a follow are skipped.
    pub follow_capped: bool,
    /// Entries processed so far, drives the filler-post cadence.
    pub processed: u32,
}

impl RunState {
    /// Aggregate status for the outer loop: sticky conditions dominate,
    /// otherwise the last entry status stands. Soft per-entry statuses
    /// normalize to success; a run that merely ended on retryable noise
    /// is not a failed run.
    pub fn aggregate(&self, last_status: u32) -> u32 {
        if self.flagged {
            return statuses::FLAGGED;
        }
        if self.follow_capped {
            return statuses::FOLLOW_CAPPED;
        }
        if statuses::SOFT.contains(&last_status) {
            return statuses::OK;
        }
        last_status
    }
}

/// Per-entry status numbering: operation base plus outcome detail.
/// Comment 1000s, follow 2000s, group move 3001, like 4000s, repost 5000s.
pub mod statuses {
    pub const OK: u32 = 0;

    pub const COMMENT_BASE: u32 = 1000;
    pub const FOLLOW_BASE: u32 = 2000;
    pub const GROUP_MOVE_FAILED: u32 = 3001;
    pub const LIKE_BASE: u32 = 4000;
    pub const REPOST_BASE: u32 = 5000;

    /// Sticky account-flag statuses.
    pub const FLAGGED: u32 = 2004;
    pub const LIKE_FLAGGED: u32 = 4005;
    /// Sticky follow-cap status.
    pub const FOLLOW_CAPPED: u32 = 2005;

    /// Statuses that end the run immediately.
    pub const HARD_STOPS: [u32; 5] = [1001, 1004, 1010, 2001, 5001];

    /// Statuses tolerated as ordinary per-entry noise.
    pub const SOFT: [u32; 19] = [
        1002, 1003, 1005, 1006, 1007, 1008, 1009, 1011, 2002, 2003, 3001, 4001, 4002, 4003,
        4004, 5002, 5003, 5004, 5005,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_flags_dominate_the_aggregate() {
        let mut state = RunState::default();
        assert_eq!(state.aggregate(0), 0);

        state.follow_capped = true;
        assert_eq!(state.aggregate(0), statuses::FOLLOW_CAPPED);

        state.flagged = true;
        assert_eq!(state.aggregate(0), statuses::FLAGGED);
    }

    #[test]
    fn soft_trailing_statuses_normalize_to_success() {
        let state = RunState::default();
        for soft in statuses::SOFT {
            assert_eq!(state.aggregate(soft), 0, "status {soft}");
        }
        // unknown codes pass through untouched
        assert_eq!(state.aggregate(9999), 9999);
    }
}
