//! Per-region records and their reduction across sessions.
//!
//! Each [`Session`](crate::Session) owns one [`Storage`]. Sessions running on
//! different threads (or in different processes, after transport by the
//! caller) are combined with [`Storage::merge`] or [`reduce`].

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::statistics::Statistics;

/// Statistics for one metric within one region.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    /// Component label.
    pub label: String,
    /// Display unit name.
    pub unit: String,
    /// Component description.
    pub description: String,
    /// Values recorded at each region close.
    #[serde(serialize_with = "serialize_stats")]
    pub stats: Statistics,
}

/// Everything recorded for one region path.
#[derive(Debug, Clone, Serialize)]
pub struct RegionRecord {
    /// `/`-joined region names from the outermost region.
    pub path: String,
    /// Innermost region name.
    pub name: String,
    /// Nesting depth; 0 for top-level regions.
    pub depth: usize,
    /// Number of times the region was closed.
    pub laps: u64,
    /// Metrics in first-recorded order.
    pub metrics: Vec<MetricRecord>,
}

impl RegionRecord {
    fn new(path: &str, name: &str, depth: usize) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            depth,
            laps: 0,
            metrics: Vec::new(),
        }
    }

    /// Look up a metric by label.
    pub fn metric(&self, label: &str) -> Option<&MetricRecord> {
        self.metrics.iter().find(|m| m.label == label)
    }

    /// Add one value for `label`.
    ///
    /// # Errors
    ///
    /// [`Error::UnitMismatch`] if `label` was already recorded in another unit.
    pub fn record(&mut self, label: &str, unit: &str, description: &str, value: f64) -> Result<()> {
        match self.metrics.iter_mut().find(|m| m.label == label) {
            Some(metric) => {
                check_unit(label, &metric.unit, unit)?;
                metric.stats.push(value);
            }
            None => {
                let mut stats = Statistics::new();
                stats.push(value);
                self.metrics.push(MetricRecord {
                    label: label.to_string(),
                    unit: unit.to_string(),
                    description: description.to_string(),
                    stats,
                });
            }
        }
        Ok(())
    }
}

fn check_unit(label: &str, left: &str, right: &str) -> Result<()> {
    if left != right {
        return Err(Error::UnitMismatch {
            label: label.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsSummary {
    count: u64,
    sum: f64,
    mean: f64,
    min: f64,
    max: f64,
    stddev: f64,
}

fn serialize_stats<S: Serializer>(stats: &Statistics, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    StatsSummary {
        count: stats.count(),
        sum: stats.sum(),
        mean: stats.mean(),
        min: stats.min(),
        max: stats.max(),
        stddev: stats.stddev(),
    }
    .serialize(serializer)
}

/// Region records in first-insertion order, indexed by path.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    records: Vec<RegionRecord>,
    index: HashMap<String, usize>,
}

impl Storage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `path`, created if absent.
    pub fn entry(&mut self, path: &str, name: &str, depth: usize) -> &mut RegionRecord {
        let idx = match self.index.get(path) {
            Some(&idx) => idx,
            None => {
                self.records.push(RegionRecord::new(path, name, depth));
                let idx = self.records.len() - 1;
                self.index.insert(path.to_string(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    /// Record for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&RegionRecord> {
        self.index.get(path).map(|&idx| &self.records[idx])
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionRecord> {
        self.records.iter()
    }

    /// Number of distinct region paths.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fold `other` into this storage.
    ///
    /// Shared paths have their laps summed and metric statistics merged;
    /// paths only in `other` are appended in `other`'s order. Nothing is
    /// modified if any shared metric disagrees on its unit.
    pub fn merge(&mut self, other: &Storage) -> Result<()> {
        for theirs in &other.records {
            if let Some(ours) = self.get(&theirs.path) {
                for metric in &theirs.metrics {
                    if let Some(existing) = ours.metric(&metric.label) {
                        check_unit(&metric.label, &existing.unit, &metric.unit)?;
                    }
                }
            }
        }

        for theirs in &other.records {
            let ours = self.entry(&theirs.path, &theirs.name, theirs.depth);
            ours.laps += theirs.laps;
            for metric in &theirs.metrics {
                match ours.metrics.iter_mut().find(|m| m.label == metric.label) {
                    Some(existing) => existing.stats.merge(&metric.stats),
                    None => ours.metrics.push(metric.clone()),
                }
            }
        }

        tracing::debug!(
            regions = self.records.len(),
            merged = other.records.len(),
            "merged storage"
        );
        Ok(())
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}

/// Combine partial storages into one, in iteration order.
pub fn reduce<I>(parts: I) -> Result<Storage>
where
    I: IntoIterator<Item = Storage>,
{
    let mut parts = parts.into_iter();
    let mut total = parts.next().unwrap_or_default();
    for part in parts {
        total.merge(&part)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(path: &str, values: &[f64]) -> Storage {
        let mut storage = Storage::new();
        let name = path.rsplit('/').next().unwrap_or(path);
        let depth = path.matches('/').count();
        for v in values {
            let rec = storage.entry(path, name, depth);
            rec.laps += 1;
            rec.record("wall_clock", "msec", "wall", *v).unwrap();
        }
        storage
    }

    #[test]
    fn test_entry_is_reused() {
        let mut storage = Storage::new();
        storage.entry("main", "main", 0).laps += 1;
        storage.entry("main", "main", 0).laps += 1;
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("main").unwrap().laps, 2);
    }

    #[test]
    fn test_unit_mismatch_on_record() {
        let mut storage = Storage::new();
        let rec = storage.entry("a", "a", 0);
        rec.record("wall_clock", "msec", "", 1.0).unwrap();
        let err = rec.record("wall_clock", "sec", "", 1.0).unwrap_err();
        assert!(matches!(err, Error::UnitMismatch { .. }));
    }

    #[test]
    fn test_merge_shared_and_new_paths() {
        let mut left = sample("main", &[1.0, 2.0]);
        let mut right = sample("main", &[3.0]);
        right.merge(&sample("main/inner", &[5.0])).unwrap();

        left.merge(&right).unwrap();
        let paths: Vec<_> = left.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["main", "main/inner"]);

        let main = left.get("main").unwrap();
        assert_eq!(main.laps, 3);
        let stats = &main.metric("wall_clock").unwrap().stats;
        assert_eq!(stats.count(), 3);
        assert_eq!(stats.max(), 3.0);
        assert_eq!(left.get("main/inner").unwrap().depth, 1);
    }

    #[test]
    fn test_merge_unit_mismatch_leaves_storage_untouched() {
        let mut left = sample("main", &[1.0]);
        let mut right = Storage::new();
        right
            .entry("main", "main", 0)
            .record("wall_clock", "sec", "", 9.0)
            .unwrap();
        right.entry("other", "other", 0).laps += 1;

        assert!(left.merge(&right).is_err());
        assert_eq!(left.len(), 1);
        assert_eq!(left.get("main").unwrap().metric("wall_clock").unwrap().stats.count(), 1);
    }

    #[test]
    fn test_reduce() {
        let total = reduce(vec![
            sample("main", &[1.0]),
            sample("main", &[2.0]),
            sample("main", &[3.0]),
        ])
        .unwrap();
        let stats = &total.get("main").unwrap().metric("wall_clock").unwrap().stats;
        assert_eq!(stats.count(), 3);
        assert_eq!(stats.sum(), 6.0);
    }

    #[test]
    fn test_reduce_empty() {
        assert!(reduce(Vec::new()).unwrap().is_empty());
    }
}
