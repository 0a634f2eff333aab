//! Harvest orchestration
//!
//! Runs the collection stages in a fixed order, fanning out into the optional
//! enrichment stages and handing each dataset to the sink as soon as it is
//! complete. Nothing in a run is fatal: failed fetches and sink errors are
//! recorded in the [`RunReport`] and the next stage starts regardless.

pub mod report;

pub use report::{RunReport, StageReport};

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::camara::client::{Collected, Detail};
use crate::camara::collectors::{EntityCollector, EntityKind};
use crate::camara::flatten::{self, flatten, Flattened};
use crate::camara::types::EntityRecord;
use crate::dataset::{Dataset, DatasetKind, RunResult};
use crate::sink::PersistenceSink;

pub const DEFAULT_RUN_PROPOSALS: usize = 3000;
pub const DEFAULT_RUN_VOTINGS: usize = 500;
const SMOKE_DEPUTIES: usize = 10;
const SMOKE_FRONTS: usize = 5;

/// Which optional stages a full run performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    pub deputy_details: bool,
    pub front_members: bool,
    pub proposal_authors: bool,
    pub voting_votes: bool,
    /// Committee membership; not part of the standard run
    pub body_members: bool,
    pub max_proposals: usize,
    pub max_votings: usize,
    /// Keep only fronts of this legislature
    pub legislature: Option<i64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::full()
    }
}

impl RunOptions {
    pub fn full() -> Self {
        Self {
            deputy_details: true,
            front_members: true,
            proposal_authors: true,
            voting_votes: true,
            body_members: false,
            max_proposals: DEFAULT_RUN_PROPOSALS,
            max_votings: DEFAULT_RUN_VOTINGS,
            legislature: None,
        }
    }

    /// Everything except the per-deputy detail lookups
    pub fn quick() -> Self {
        Self {
            deputy_details: false,
            ..Self::full()
        }
    }

    /// Only the top-level collections
    pub fn collections_only() -> Self {
        Self {
            deputy_details: false,
            front_members: false,
            proposal_authors: false,
            voting_votes: false,
            body_members: false,
            ..Self::full()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RunMode {
    /// Every stage
    Full,
    /// Skip deputy details
    Quick,
    /// Parties plus a handful of deputies and fronts
    Smoke,
}

/// Datasets and report of one run
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub result: RunResult,
    pub report: RunReport,
}

pub struct Harvester {
    collector: EntityCollector,
    sink: Arc<dyn PersistenceSink>,
}

impl Harvester {
    pub fn new(collector: EntityCollector, sink: Arc<dyn PersistenceSink>) -> Self {
        Self { collector, sink }
    }

    pub fn collector(&self) -> &EntityCollector {
        &self.collector
    }

    pub async fn run_mode(&self, mode: RunMode, options: RunOptions) -> Harvest {
        match mode {
            RunMode::Full => self.run(&options).await,
            RunMode::Quick => {
                self.run(&RunOptions {
                    deputy_details: false,
                    ..options
                })
                .await
            }
            RunMode::Smoke => self.smoke().await,
        }
    }

    /// Full collection run
    pub async fn run(&self, options: &RunOptions) -> Harvest {
        info!(?options, "Starting harvest");
        let mut harvest = Harvest::default();
        let collector = &self.collector;

        let parties = collector.parties().await;
        self.store_collected(&mut harvest, DatasetKind::Parties, parties)
            .await;

        let deputies = collector.deputies().await;
        let deputies = self
            .store_collected(&mut harvest, DatasetKind::Deputies, deputies)
            .await;

        if options.deputy_details {
            self.deputy_details_stage(&mut harvest, &deputies).await;
        }

        let fronts = collector.fronts(options.legislature).await;
        let fronts = self
            .store_collected(&mut harvest, DatasetKind::Fronts, fronts)
            .await;

        if options.front_members {
            info!(fronts = fronts.len(), "Collecting front members");
            let joins = flatten(
                &fronts,
                |id| async move { collector.front_members(&id).await },
                flatten::front_membership,
            )
            .await;
            self.store_flattened(&mut harvest, DatasetKind::FrontMembers, joins)
                .await;
        }

        let proposals = collector.proposals(options.max_proposals).await;
        let proposals = self
            .store_collected(&mut harvest, DatasetKind::Proposals, proposals)
            .await;

        if options.proposal_authors {
            info!(proposals = proposals.len(), "Collecting proposal authors");
            let joins = flatten(
                &proposals,
                |id| async move { collector.proposal_authors(&id).await },
                flatten::proposal_authorship,
            )
            .await;
            self.store_flattened(&mut harvest, DatasetKind::ProposalAuthors, joins)
                .await;
        }

        let votings = collector.votings(options.max_votings).await;
        let votings = self
            .store_collected(&mut harvest, DatasetKind::Votings, votings)
            .await;

        if options.voting_votes {
            info!(votings = votings.len(), "Collecting individual votes");
            let joins = flatten(
                &votings,
                |id| async move { collector.voting_votes(&id).await },
                flatten::individual_vote,
            )
            .await;
            self.store_flattened(&mut harvest, DatasetKind::Votes, joins)
                .await;
        }

        let bodies = collector.bodies().await;
        let bodies = self
            .store_collected(&mut harvest, DatasetKind::Bodies, bodies)
            .await;

        if options.body_members {
            info!(bodies = bodies.len(), "Collecting body members");
            let joins = flatten(
                &bodies,
                |id| async move { collector.body_members(&id).await },
                flatten::body_membership,
            )
            .await;
            self.store_flattened(&mut harvest, DatasetKind::BodyMembers, joins)
                .await;
        }

        harvest.report.requests = collector.client().stats();
        harvest.report.log_summary();
        harvest
    }

    /// Minimal run to check connectivity: stored under `*_teste` names
    pub async fn smoke(&self) -> Harvest {
        info!("Starting smoke run");
        let mut harvest = Harvest::default();

        let parties = self.collector.parties().await;
        self.store_collected(&mut harvest, DatasetKind::Parties, parties)
            .await;

        let deputies = self
            .collector
            .collect(EntityKind::Deputy, Some(SMOKE_DEPUTIES))
            .await;
        self.store_collected_as(&mut harvest, DatasetKind::Deputies, "deputados_teste", deputies)
            .await;

        let mut fronts = self.collector.fronts(None).await;
        fronts.items.truncate(SMOKE_FRONTS);
        self.store_collected_as(&mut harvest, DatasetKind::Fronts, "frentes_teste", fronts)
            .await;

        harvest.report.requests = self.collector.client().stats();
        harvest.report.log_summary();
        harvest
    }

    async fn deputy_details_stage(&self, harvest: &mut Harvest, deputies: &[EntityRecord]) {
        info!(deputies = deputies.len(), "Collecting deputy details");
        let mut details = Vec::with_capacity(deputies.len());
        let mut failed = 0;

        for deputy in deputies {
            match self.collector.deputy_details(&deputy.id).await {
                Detail::Found(record) => details.push(record),
                Detail::Unavailable(failure) => {
                    warn!(deputy = %deputy.id, error = %failure, "Skipping deputy details");
                    failed += 1;
                }
            }
        }

        let kind = DatasetKind::DeputyDetails;
        let stage = StageReport {
            failed_fetches: failed,
            ..StageReport::new(kind, kind.name(), details.len())
        };
        self.persist(harvest, kind, kind.name(), Dataset::from(details), stage)
            .await;
    }

    async fn store_collected(
        &self,
        harvest: &mut Harvest,
        kind: DatasetKind,
        collected: Collected,
    ) -> Vec<EntityRecord> {
        self.store_collected_as(harvest, kind, kind.name(), collected)
            .await
    }

    /// Persist a collection and hand its items back for fan-out
    async fn store_collected_as(
        &self,
        harvest: &mut Harvest,
        kind: DatasetKind,
        stored_as: &str,
        collected: Collected,
    ) -> Vec<EntityRecord> {
        let stage = StageReport::from_collected(kind, stored_as, &collected);
        let items = collected.items;
        self.persist(harvest, kind, stored_as, Dataset::from(items.clone()), stage)
            .await;
        items
    }

    async fn store_flattened<J>(&self, harvest: &mut Harvest, kind: DatasetKind, flattened: Flattened<J>)
    where
        Vec<J>: Into<Dataset>,
    {
        let stage = StageReport::from_flattened(kind, kind.name(), &flattened);
        self.persist(harvest, kind, kind.name(), flattened.joins.into(), stage)
            .await;
    }

    async fn persist(
        &self,
        harvest: &mut Harvest,
        kind: DatasetKind,
        stored_as: &str,
        dataset: Dataset,
        mut stage: StageReport,
    ) {
        if let Err(e) = self.sink.store(stored_as, &dataset).await {
            error!(dataset = %kind, error = %e, "Failed to persist dataset");
            stage.sink_error = Some(e.to_string());
        }
        harvest.result.insert(kind, dataset);
        harvest.report.push(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camara::client::CamaraClient;
    use crate::camara::collectors::DateRange;
    use crate::camara::test_support::*;
    use crate::camara::types::EntityId;
    use crate::config::CollectorConfig;
    use crate::error::SinkError;
    use crate::sink::MemorySink;
    use async_trait::async_trait;

    fn harvester(script: Vec<Scripted>, sink: Arc<dyn PersistenceSink>) -> Harvester {
        let client = CamaraClient::with_transport(
            &CollectorConfig::default(),
            Arc::new(ScriptedTransport::new(script)),
            Arc::new(RecordingSleeper::default()),
        );
        Harvester::new(
            EntityCollector::new(Arc::new(client), DateRange::default()),
            sink,
        )
    }

    struct FailingSink;

    #[async_trait]
    impl PersistenceSink for FailingSink {
        async fn store(&self, name: &str, _dataset: &Dataset) -> Result<(), SinkError> {
            Err(SinkError::Io {
                path: format!("{}.json", name),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    fn collections_script() -> Vec<Scripted> {
        vec![
            ok(page_body(&[1], false)),  // partidos
            ok(page_body(&[10], false)), // deputados
            ok(page_body(&[20], false)), // frentes
            ok(page_body(&[30], false)), // proposicoes
            ok(page_body(&[40], false)), // votacoes
            ok(page_body(&[50], false)), // orgaos
        ]
    }

    #[tokio::test]
    async fn test_disabled_stages_leave_keys_absent() {
        let sink = Arc::new(MemorySink::new());
        let harvester = harvester(collections_script(), sink.clone());

        let harvest = harvester.run(&RunOptions::collections_only()).await;

        let kinds: Vec<_> = harvest.result.kinds().collect();
        assert_eq!(
            kinds,
            vec![
                DatasetKind::Parties,
                DatasetKind::Deputies,
                DatasetKind::Fronts,
                DatasetKind::Proposals,
                DatasetKind::Votings,
                DatasetKind::Bodies,
            ]
        );
        assert!(!harvest.result.contains(DatasetKind::DeputyDetails));
        assert!(!harvest.result.contains(DatasetKind::Votes));
        assert!(!harvest.result.contains(DatasetKind::BodyMembers));
        assert_eq!(
            sink.stored_names().await,
            vec!["partidos", "deputados", "frentes", "proposicoes", "votacoes", "orgaos"]
        );
        assert!(harvest.report.is_clean());
    }

    #[tokio::test]
    async fn test_body_members_stored_after_bodies() {
        let mut script = collections_script();
        script.pop();
        script.push(ok(page_body(&[50, 51], false))); // orgaos
        script.push(ok(data_body(serde_json::json!([
            {"id": 204554, "nome": "Ana", "titulo": "Titular"},
            {"id": 204555, "nome": "Bruno"}
        ]))));
        script.extend((0..3).map(|_| status(500))); // orgaos/51/membros
        let sink = Arc::new(MemorySink::new());
        let harvester = harvester(script, sink.clone());

        let harvest = harvester
            .run(&RunOptions {
                body_members: true,
                ..RunOptions::collections_only()
            })
            .await;

        assert_eq!(
            sink.stored_names().await,
            vec![
                "partidos",
                "deputados",
                "frentes",
                "proposicoes",
                "votacoes",
                "orgaos",
                "membros_orgaos"
            ]
        );
        assert_eq!(
            harvest.result.get(DatasetKind::BodyMembers).map(Dataset::len),
            Some(2)
        );
        let stage = harvest.report.stage(DatasetKind::BodyMembers).unwrap();
        assert_eq!(stage.records, 2);
        assert_eq!(stage.failed_fetches, 1);
        assert_eq!(harvest.report.failed_fetches(), 1);

        match harvest.result.get(DatasetKind::BodyMembers) {
            Some(Dataset::BodyMembers(members)) => {
                assert_eq!(members[0].role, "Titular");
                assert_eq!(members[1].role, "Membro");
                assert!(members.iter().all(|m| m.body_id == EntityId::Number(50)));
            }
            other => panic!("unexpected dataset: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sink_errors_do_not_abort_run() {
        let harvester = harvester(collections_script(), Arc::new(FailingSink));

        let harvest = harvester.run(&RunOptions::collections_only()).await;

        assert_eq!(harvest.result.len(), 6);
        assert_eq!(harvest.report.sink_errors(), 6);
        assert_eq!(harvest.result.entities(DatasetKind::Bodies).len(), 1);
    }

    #[tokio::test]
    async fn test_quick_mode_skips_deputy_details() {
        let mut script = collections_script();
        // membros_frentes, autores_proposicoes, votos
        script.insert(3, ok(data_body(serde_json::json!([{"id": 10, "nome": "D"}]))));
        script.insert(5, ok(data_body(serde_json::json!([]))));
        script.insert(7, ok(data_body(serde_json::json!([]))));
        let sink = Arc::new(MemorySink::new());
        let harvester = harvester(script, sink.clone());

        let harvest = harvester.run_mode(RunMode::Quick, RunOptions::full()).await;

        assert!(!harvest.result.contains(DatasetKind::DeputyDetails));
        assert_eq!(harvest.result.front_members().len(), 1);
        assert_eq!(
            harvest.result.get(DatasetKind::ProposalAuthors).map(Dataset::len),
            Some(0)
        );
        assert!(harvest.report.is_clean());
    }

    #[tokio::test]
    async fn test_smoke_run_uses_test_names() {
        let sink = Arc::new(MemorySink::new());
        let harvester = harvester(
            vec![
                ok(page_body(&[1, 2], false)),
                ok(page_body(&(1..=12).collect::<Vec<_>>(), true)),
                ok(page_body(&[1, 2, 3, 4, 5, 6, 7], false)),
            ],
            sink.clone(),
        );

        let harvest = harvester.smoke().await;

        assert_eq!(
            sink.stored_names().await,
            vec!["partidos", "deputados_teste", "frentes_teste"]
        );
        assert_eq!(harvest.result.entities(DatasetKind::Deputies).len(), 10);
        assert_eq!(harvest.result.entities(DatasetKind::Fronts).len(), 5);
    }
}
