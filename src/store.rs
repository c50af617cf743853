//! In-memory report store
//!
//! Maps report ids to immutable [`AuditRecord`]s for the life of the process.
//! There is no eviction and no deletion.

use crate::types::AuditRecord;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Report id → audit record
#[derive(Default)]
pub struct ReportStore {
    reports: RwLock<HashMap<String, Arc<AuditRecord>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. An existing id is never overwritten; the stored
    /// record is returned either way.
    pub fn put(&self, record: AuditRecord) -> Arc<AuditRecord> {
        let mut reports = self.reports.write().unwrap_or_else(|e| e.into_inner());
        let id = record.id.clone();
        if let Some(existing) = reports.get(&id) {
            tracing::warn!(report_id = %id, "Report id already stored, keeping original");
            return existing.clone();
        }
        let record = Arc::new(record);
        reports.insert(id, record.clone());
        record
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Option<Arc<AuditRecord>> {
        self.reports
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let store = ReportStore::new();
        let record = AuditRecord::degraded("https://a.dev", "boom");
        let id = record.id.clone();

        store.put(record);
        let found = store.get(&id).unwrap();
        assert_eq!(found.url, "https://a.dev");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_unknown() {
        let store = ReportStore::new();
        assert!(store.get("rpt-missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_never_overwrites() {
        let store = ReportStore::new();
        let first = AuditRecord::degraded("https://first.dev", "a");
        let mut second = AuditRecord::degraded("https://second.dev", "b");
        second.id = first.id.clone();
        let id = first.id.clone();

        store.put(first);
        let kept = store.put(second);
        assert_eq!(kept.url, "https://first.dev");
        assert_eq!(store.get(&id).unwrap().url, "https://first.dev");
        assert_eq!(store.len(), 1);
    }
}
