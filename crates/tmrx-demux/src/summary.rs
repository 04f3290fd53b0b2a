use serde::Serialize;

use crate::counters::RunCounters;
use crate::state::DemuxState;

/// End-of-run report for operational postmortems.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub elapsed_secs: f64,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub images_archived: u64,
    pub catalogs_closed: u64,
    pub catalogs_archived: u64,
    pub crc_failures: u64,
    pub anomalies: u64,
    pub final_state: &'static str,
    pub exit_reason: String,
}

impl RunSummary {
    pub(crate) fn from_counters(
        counters: &RunCounters,
        state: DemuxState,
        exit_reason: String,
    ) -> Self {
        Self {
            elapsed_secs: counters.health.elapsed().as_secs_f64(),
            packets_received: counters.packets_received,
            bytes_received: counters.bytes_received,
            images_archived: counters.images_archived,
            catalogs_closed: counters.catalogs_closed,
            catalogs_archived: counters.catalogs_archived,
            crc_failures: counters.health.crc_failures(),
            anomalies: counters.anomalies,
            final_state: state.as_str(),
            exit_reason,
        }
    }
}
