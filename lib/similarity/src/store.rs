//! Shared, refreshable table handle
//!
//! Queries hold the read lock for their whole run, so many can proceed at
//! once. A refresh preprocesses outside the lock and only takes the write
//! lock to swap the finished table in.

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::sync::Arc;

use stattwin_core::{NormalizedFeatureTable, PlayerSeasonRecord, RecordKey, Result};
use stattwin_preprocess::{preprocess, PreprocessConfig, PreprocessReport};

use crate::explain::SimilarityResult;
use crate::query::SimilarityQuery;
use crate::rank::{rank_all_against_all, similar_to_query};

#[derive(Debug, Default)]
struct Loaded {
    table: NormalizedFeatureTable,
    report: Option<PreprocessReport>,
}

/// Cloneable handle to the currently loaded table
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    inner: Arc<RwLock<Loaded>>,
}

impl TableStore {
    pub fn new(table: NormalizedFeatureTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Loaded {
                table,
                report: None,
            })),
        }
    }

    /// Preprocess `records` and load the result
    pub fn load(records: Vec<PlayerSeasonRecord>, cfg: &PreprocessConfig) -> Result<Self> {
        let store = Self::default();
        store.refresh(records, cfg)?;
        Ok(store)
    }

    pub fn similar(&self, query: &SimilarityQuery) -> Result<SimilarityResult> {
        let loaded = self.inner.read();
        similar_to_query(&loaded.table, query)
    }

    pub fn rank_all(&self, template: &SimilarityQuery) -> Result<BTreeMap<RecordKey, SimilarityResult>> {
        let loaded = self.inner.read();
        rank_all_against_all(&loaded.table, template)
    }

    /// Swap in a new table, returning the old one. Clears the report.
    pub fn replace(&self, table: NormalizedFeatureTable) -> NormalizedFeatureTable {
        let mut loaded = self.inner.write();
        loaded.report = None;
        std::mem::replace(&mut loaded.table, table)
    }

    /// Rebuild from raw records. On error the current table stays loaded.
    pub fn refresh(
        &self,
        records: Vec<PlayerSeasonRecord>,
        cfg: &PreprocessConfig,
    ) -> Result<PreprocessReport> {
        let (table, report) = preprocess(records, cfg)?;
        {
            let mut loaded = self.inner.write();
            loaded.table = table;
            loaded.report = Some(report.clone());
        }
        tracing::info!(rows = report.output_rows, "table refreshed");
        Ok(report)
    }

    /// Read access to the loaded table; blocks refreshes while held
    pub fn table(&self) -> MappedRwLockReadGuard<'_, NormalizedFeatureTable> {
        RwLockReadGuard::map(self.inner.read(), |loaded| &loaded.table)
    }

    /// Report of the last refresh, if the table came from one
    pub fn report(&self) -> Option<PreprocessReport> {
        self.inner.read().report.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
