//! Run report
//!
//! Per-dataset tally of what a run collected and what it had to skip.

use serde::Serialize;
use tracing::{info, warn};

use crate::camara::client::{Collected, RequestStatsSnapshot};
use crate::camara::flatten::Flattened;
use crate::dataset::DatasetKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub dataset: DatasetKind,
    /// File stem the dataset was stored under
    pub stored_as: String,
    pub records: usize,
    pub pages: u32,
    /// Items dropped for lacking an id
    pub rejected: usize,
    /// Requests that produced no data (failed pages or failed parents)
    pub failed_fetches: usize,
    pub sink_error: Option<String>,
}

impl StageReport {
    pub fn new(dataset: DatasetKind, stored_as: &str, records: usize) -> Self {
        Self {
            dataset,
            stored_as: stored_as.to_string(),
            records,
            pages: 0,
            rejected: 0,
            failed_fetches: 0,
            sink_error: None,
        }
    }

    pub fn from_collected(dataset: DatasetKind, stored_as: &str, collected: &Collected) -> Self {
        Self {
            pages: collected.pages,
            rejected: collected.rejected,
            failed_fetches: usize::from(collected.failure.is_some()),
            ..Self::new(dataset, stored_as, collected.items.len())
        }
    }

    pub fn from_flattened<J>(dataset: DatasetKind, stored_as: &str, flattened: &Flattened<J>) -> Self {
        Self {
            failed_fetches: flattened.failed_parents.len(),
            ..Self::new(dataset, stored_as, flattened.joins.len())
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_fetches == 0 && self.rejected == 0 && self.sink_error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    pub requests: RequestStatsSnapshot,
}

impl RunReport {
    pub fn push(&mut self, stage: StageReport) {
        self.stages.push(stage);
    }

    pub fn stage(&self, dataset: DatasetKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.dataset == dataset)
    }

    pub fn failed_fetches(&self) -> usize {
        self.stages.iter().map(|s| s.failed_fetches).sum()
    }

    pub fn sink_errors(&self) -> usize {
        self.stages.iter().filter(|s| s.sink_error.is_some()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.stages.iter().all(StageReport::is_clean)
    }

    /// Log one line per stage plus totals
    pub fn log_summary(&self) {
        for stage in &self.stages {
            if stage.is_clean() {
                info!(dataset = %stage.dataset, records = stage.records, "Collected");
            } else {
                warn!(
                    dataset = %stage.dataset,
                    records = stage.records,
                    failed_fetches = stage.failed_fetches,
                    rejected = stage.rejected,
                    sink_error = stage.sink_error.as_deref().unwrap_or("-"),
                    "Collected with gaps"
                );
            }
        }
        info!(
            stages = self.stages.len(),
            requests = self.requests.attempts,
            rate_limited = self.requests.rate_limited,
            failed_requests = self.requests.failures,
            "Harvest finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camara::types::EntityRecord;
    use crate::error::FetchFailure;
    use serde_json::json;

    #[test]
    fn test_stage_from_partial_collection() {
        let collected = Collected {
            items: vec![EntityRecord::from_value(json!({"id": 1})).unwrap()],
            pages: 1,
            rejected: 2,
            failure: Some(FetchFailure::RateLimited { attempts: 3 }),
        };

        let stage = StageReport::from_collected(DatasetKind::Deputies, "deputados", &collected);

        assert_eq!(stage.records, 1);
        assert_eq!(stage.failed_fetches, 1);
        assert_eq!(stage.rejected, 2);
        assert!(!stage.is_clean());
    }

    #[test]
    fn test_report_totals() {
        let mut report = RunReport::default();
        report.push(StageReport::new(DatasetKind::Parties, "partidos", 30));
        let mut votes = StageReport::new(DatasetKind::Votes, "votos", 0);
        votes.failed_fetches = 4;
        votes.sink_error = Some("disk full".to_string());
        report.push(votes);

        assert_eq!(report.failed_fetches(), 4);
        assert_eq!(report.sink_errors(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.stage(DatasetKind::Parties).unwrap().records, 30);
        assert!(report.stage(DatasetKind::Bodies).is_none());
    }
}
