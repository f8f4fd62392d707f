pub mod align;
pub mod compare;
pub mod finalize;
pub mod resolve;

pub use align::{align_result_sets, AlignedItem, AlignmentResult};
pub use compare::text_similarity;
pub use resolve::select_best;

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::model::ItemReport;
use crate::core::{ConsensusError, ConsensusResult, Result, ResultSet, Selection};
use crate::extract::ProcessingStrategy;
use crate::store::ResultStore;

/// Reconciles the result sets of several engines into one text per item.
///
/// For each item the candidate with the highest average similarity to the
/// other engines' candidates wins. The choice approximates agreement; it is
/// not a correctness guarantee when engines have no majority.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    store: ResultStore,
    strategy: ProcessingStrategy,
}

impl ConsensusEngine {
    pub fn new(store: ResultStore) -> Self {
        Self {
            store,
            strategy: ProcessingStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ProcessingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Loads one result set per engine and checks they describe the same items.
    pub fn load<S: AsRef<str>>(&self, engine_names: &[S]) -> Result<Vec<ResultSet>> {
        let sets = engine_names
            .iter()
            .map(|name| self.store.load_results(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        align_result_sets(&sets)?;
        Ok(sets)
    }

    pub fn run<S: AsRef<str>>(&self, engine_names: &[S]) -> Result<Vec<ConsensusResult>> {
        Ok(self.run_with_report(engine_names)?.0)
    }

    /// Like [`run`](Self::run), also returning the per-item score breakdown.
    pub fn run_with_report<S: AsRef<str>>(
        &self,
        engine_names: &[S],
    ) -> Result<(Vec<ConsensusResult>, Vec<ItemReport>)> {
        let sets = engine_names
            .iter()
            .map(|name| self.store.load_results(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.reconcile(&sets)
    }

    /// Runs consensus and writes `ocr_results.json`, plus the report when
    /// `with_report` is set.
    pub fn run_and_persist<S: AsRef<str>>(
        &self,
        engine_names: &[S],
        with_report: bool,
    ) -> Result<PathBuf> {
        let (results, report) = self.run_with_report(engine_names)?;
        let path = self.store.save_consensus(&results)?;
        if with_report {
            let report_path = self.store.save_report(&report)?;
            info!(path = %report_path.display(), "saved consensus report");
        }
        Ok(path)
    }

    /// Aligns already-loaded result sets and selects one text per item.
    pub fn reconcile(&self, sets: &[ResultSet]) -> Result<(Vec<ConsensusResult>, Vec<ItemReport>)> {
        let aligned = align_result_sets(sets)?;
        let parallel = self.strategy.should_use_parallel(aligned.items.len());
        info!(
            engines = ?aligned.engines,
            items = aligned.items.len(),
            parallel,
            "consensus started"
        );

        let selections: Vec<Result<Selection>> = if parallel {
            aligned.items.par_iter().map(select_item).collect()
        } else {
            aligned.items.iter().map(select_item).collect()
        };

        let mut results = Vec::with_capacity(aligned.items.len());
        let mut report = Vec::with_capacity(aligned.items.len());
        for (item, selection) in aligned.items.iter().zip(selections) {
            let selection = selection?;
            debug!(
                item = %item.item_id,
                engine = %aligned.engines[selection.index],
                agreement = selection.score(),
                "selected candidate"
            );
            results.push(finalize::to_consensus(item, &selection));
            report.push(finalize::to_report(&aligned.engines, item, &selection));
        }

        info!(items = results.len(), "consensus finished");
        Ok((results, report))
    }
}

fn select_item(item: &AlignedItem) -> Result<Selection> {
    select_best(&item.candidates).map_err(|err| match err {
        ConsensusError::InsufficientCandidates { .. } => ConsensusError::InsufficientCandidates {
            item_id: Some(item.item_id.clone()),
        },
        other => other,
    })
}
