/*!
 * Revenue projection over aggregated procedure groups
 *
 * A projection answers "what would N additional occurrences of this
 * procedure be worth?" by multiplying a group's historical average payment by
 * an operator-supplied volume.
 */

use crate::data_types::{ProcedureKey, ProjectionOutcome, SummaryTable};

/// Project revenue for a selected procedure at a given volume
///
/// Looks the key up among the procedure groups (the rollup is a separate
/// variant and can never match). No match returns
/// [`ProjectionOutcome::NoData`], a normal outcome when a selection is stale
/// relative to a changed date range. A match returns `avg_paid * volume`
/// with no further rounding beyond the one applied at aggregation time.
pub fn project(table: &SummaryTable, key: &ProcedureKey, volume: u64) -> ProjectionOutcome {
    match table.group(key) {
        Some(group) => ProjectionOutcome::Revenue(group.avg_paid * volume as f64),
        None => ProjectionOutcome::NoData,
    }
}

/// Default projection volume for a selected procedure
///
/// The group's claim count from the current selection, floored at 1. Keys
/// absent from the table also default to 1.
pub fn default_volume(table: &SummaryTable, key: &ProcedureKey) -> u64 {
    table
        .group(key)
        .map(|group| (group.claim_count as u64).max(1))
        .unwrap_or(1)
}
