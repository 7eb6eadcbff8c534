//! Query entry point shared by every dashboard view.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{PagingConfig, RedlineConfig};
use crate::error::RedlineError;
use crate::filter::{FilterSpec, RecordFilter, ReviewFilter};
use crate::models::{Category, CategoryScoreSet, ModerationRecord};
use crate::paginate::{paginate, Page, View};
use crate::severity::{categories_above, Classifier, SeverityBand};
use crate::store::RecordStore;

pub struct ModerationEngine {
    store: RecordStore,
    classifier: Classifier,
    paging: PagingConfig,
}

impl ModerationEngine {
    pub fn new(classifier: Classifier, paging: PagingConfig) -> Self {
        Self {
            store: RecordStore::new(),
            classifier,
            paging,
        }
    }

    pub fn from_config(config: &RedlineConfig) -> Self {
        Self::new(
            Classifier::new(config.classifier.flag_threshold),
            config.paging.clone(),
        )
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn insert(&self, record: ModerationRecord) -> Result<(), RedlineError> {
        self.store.insert(record)
    }

    pub fn classify(&self, score: i64) -> Result<SeverityBand, RedlineError> {
        self.classifier.classify(score)
    }

    pub fn categories_above(&self, set: &CategoryScoreSet, band: SeverityBand) -> BTreeSet<Category> {
        categories_above(set, band)
    }

    pub fn page_size_for(&self, view: View) -> usize {
        match view {
            View::Gallery => self.paging.gallery_page_size,
            View::List => self.paging.list_page_size,
        }
    }

    /// Every record passing `spec`, in insertion order.
    pub fn filtered(&self, spec: &FilterSpec) -> Vec<Arc<ModerationRecord>> {
        let filter = ReviewFilter::new(&self.classifier);
        let snapshot = self.store.all();
        let matched: Vec<Arc<ModerationRecord>> = snapshot
            .iter()
            .filter(|record| filter.matches(record, spec))
            .cloned()
            .collect();
        tracing::debug!(
            "Filter matched {} of {} records",
            matched.len(),
            snapshot.len()
        );
        matched
    }

    pub fn query_records(
        &self,
        spec: &FilterSpec,
        page_number: usize,
        page_size: usize,
    ) -> Page<Arc<ModerationRecord>> {
        paginate(self.filtered(spec), page_number, page_size)
    }

    pub fn query_view(
        &self,
        spec: &FilterSpec,
        page_number: usize,
        view: View,
    ) -> Page<Arc<ModerationRecord>> {
        self.query_records(spec, page_number, self.page_size_for(view))
    }
}

impl Default for ModerationEngine {
    fn default() -> Self {
        Self::new(Classifier::default(), PagingConfig::default())
    }
}
