//! Append-only, insertion-ordered record store.
//!
//! One ingestion writer, many readers. Records are built before the write lock
//! is taken and published as an `Arc`, so a reader only ever sees whole records.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::RedlineError;
use crate::models::{ModerationRecord, RecordId};

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Arc<ModerationRecord>>,
    ids: HashSet<RecordId>,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    inner: RwLock<Inner>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. A duplicate id leaves the store untouched.
    pub fn insert(&self, record: ModerationRecord) -> Result<(), RedlineError> {
        let record = Arc::new(record);
        let mut inner = self.inner.write();
        if inner.ids.contains(record.id()) {
            tracing::warn!("Rejected duplicate record id {}", record.id());
            return Err(RedlineError::DuplicateId(record.id().to_string()));
        }
        inner.ids.insert(record.id().clone());
        inner.records.push(Arc::clone(&record));
        tracing::info!(
            "Inserted record {} ({} total)",
            record.id(),
            inner.records.len()
        );
        Ok(())
    }

    /// Point-in-time view of every record in insertion order.
    pub fn all(&self) -> Snapshot {
        Snapshot {
            records: self.inner.read().records.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.inner.read().ids.contains(id)
    }
}

/// Read-only view returned by [`RecordStore::all`].
///
/// Iterating it is lazy and can be restarted any number of times; later
/// inserts into the store do not show up in an existing snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Vec<Arc<ModerationRecord>>,
}

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModerationRecord>> + '_ {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Arc<ModerationRecord>;
    type IntoIter = std::slice::Iter<'a, Arc<ModerationRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
