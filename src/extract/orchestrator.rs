use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::{ConsensusError, ExtractionResult, Result, ResultSet};
use crate::extract::{Extractor, InputItem};
use crate::store::ResultStore;

/// How items are spread over threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProcessingStrategy {
    #[default]
    Sequential,
    Parallel,
    /// Parallel only when there are more items than the threshold.
    Auto(usize),
}

impl ProcessingStrategy {
    pub fn should_use_parallel(&self, item_count: usize) -> bool {
        match self {
            ProcessingStrategy::Sequential => false,
            ProcessingStrategy::Parallel => true,
            ProcessingStrategy::Auto(threshold) => item_count > *threshold,
        }
    }
}

/// Runs one engine over every input item and persists the result set.
#[derive(Debug, Clone)]
pub struct ExtractionOrchestrator {
    store: ResultStore,
    strategy: ProcessingStrategy,
}

impl ExtractionOrchestrator {
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

    /// Extracts every item, in input order.
    ///
    /// The first failing item (in input order) aborts the run: a result set
    /// with a hole in it could not be reconciled against the other engines.
    pub fn process<E: Extractor + ?Sized>(
        &self,
        extractor: &E,
        items: &[InputItem],
    ) -> Result<ResultSet> {
        let engine = extractor.name();
        let parallel = self.strategy.should_use_parallel(items.len());
        info!(engine, items = items.len(), parallel, "extraction started");
        let started = Instant::now();

        let outcomes: Vec<Result<ExtractionResult>> = if parallel {
            items
                .par_iter()
                .map(|item| extract_one(extractor, item))
                .collect()
        } else {
            items.iter().map(|item| extract_one(extractor, item)).collect()
        };
        let results = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        info!(
            engine,
            items = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction finished"
        );
        Ok(ResultSet::new(engine, results))
    }

    pub fn persist(&self, set: &ResultSet) -> Result<PathBuf> {
        self.store.save_results(set)
    }

    pub fn run<E: Extractor + ?Sized>(&self, extractor: &E, items: &[InputItem]) -> Result<PathBuf> {
        let set = self.process(extractor, items)?;
        self.persist(&set)
    }
}

fn extract_one<E: Extractor + ?Sized>(extractor: &E, item: &InputItem) -> Result<ExtractionResult> {
    debug!(engine = extractor.name(), image = %item.path.display(), "processing image");
    let text = extractor
        .extract(&item.path)
        .map_err(|e| ConsensusError::Extraction {
            engine: extractor.name().to_string(),
            item_id: item.item_id.clone(),
            source: e.into(),
        })?;
    Ok(ExtractionResult::new(item.item_id.clone(), text))
}
