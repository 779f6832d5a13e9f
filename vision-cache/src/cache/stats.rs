//! Cache statistics tracking and reporting.

use crate::cache::types::TierKind;
use std::time::Instant;

/// Per-tier counters.
///
/// Every tier keeps one of these behind its own lock, separate from the
/// lock guarding its data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierMetrics {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    /// Current entry count (not monotonic)
    pub size: usize,
    /// Operational failures that were logged and swallowed
    pub errors: u64,
    /// Writes refused because the value was too large
    pub rejections: u64,
}

impl TierMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate hit rate (0.0 to 1.0), zero before any access.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_eviction(&mut self, count: u64) {
        self.evictions += count;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    /// Update the current entry count.
    pub fn update_size(&mut self, size: usize) {
        self.size = size;
    }
}

/// Counters kept by the hierarchy itself, independent of the tiers.
#[derive(Debug, Clone, Default)]
pub struct HierarchyCounters {
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub l3_hits: u64,
    pub misses: u64,
    pub promotions: u64,
}

impl HierarchyCounters {
    /// Record a hit served by the given tier.
    pub fn record_hit(&mut self, kind: TierKind) {
        match kind {
            TierKind::Memory => self.l1_hits += 1,
            TierKind::Network => self.l2_hits += 1,
            TierKind::Persistent => self.l3_hits += 1,
        }
    }

    pub fn total_hits(&self) -> u64 {
        self.l1_hits + self.l2_hits + self.l3_hits
    }

    /// Fraction of lookups answered by any tier.
    pub fn overall_hit_rate(&self) -> f64 {
        let hits = self.total_hits();
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Snapshot of hierarchy statistics for reporting.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    /// Metrics of every enabled tier, in lookup order
    pub tiers: Vec<(TierKind, TierMetrics)>,
    pub counters: HierarchyCounters,
    pub overall_hit_rate_percent: f64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Create a statistics snapshot.
    pub fn new(
        tiers: Vec<(TierKind, TierMetrics)>,
        counters: HierarchyCounters,
        started_at: Instant,
    ) -> Self {
        Self {
            overall_hit_rate_percent: counters.overall_hit_rate() * 100.0,
            tiers,
            counters,
            uptime_secs: started_at.elapsed().as_secs(),
        }
    }

    /// Metrics for one tier, if it is enabled.
    pub fn tier(&self, kind: TierKind) -> Option<&TierMetrics> {
        self.tiers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, metrics)| metrics)
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        let mut out = String::from("Vision Cache Statistics\n");

        for (kind, m) in &self.tiers {
            out.push_str(&format!(
                r#"
{}
  Entries:     {}
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Sets:        {}
  Deletes:     {}
  Evictions:   {}
  Errors:      {}
  Rejections:  {}
"#,
                kind.to_string().to_uppercase(),
                m.size,
                m.hits,
                m.misses,
                m.hit_rate() * 100.0,
                m.sets,
                m.deletes,
                m.evictions,
                m.errors,
                m.rejections,
            ));
        }

        out.push_str(&format!(
            r#"
OVERALL
  L1 Hits:     {}
  L2 Hits:     {}
  L3 Hits:     {}
  Misses:      {}
  Promotions:  {}
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            self.counters.l1_hits,
            self.counters.l2_hits,
            self.counters.l3_hits,
            self.counters.misses,
            self.counters.promotions,
            self.overall_hit_rate_percent,
            self.uptime_secs,
        ));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_metrics_default() {
        let metrics = TierMetrics::default();
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 0);
        assert_eq!(metrics.evictions, 0);
        assert_eq!(metrics.size, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(TierMetrics::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = TierMetrics::new();
        metrics.hits = 75;
        metrics.misses = 25;
        assert_eq!(metrics.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_operations() {
        let mut metrics = TierMetrics::new();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_miss();
        metrics.record_set();
        metrics.record_delete();
        metrics.record_eviction(3);
        metrics.record_error();
        metrics.record_rejection();
        metrics.update_size(7);

        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 2);
        assert_eq!(metrics.sets, 1);
        assert_eq!(metrics.deletes, 1);
        assert_eq!(metrics.evictions, 3);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.rejections, 1);
        assert_eq!(metrics.size, 7);
    }

    #[test]
    fn test_hierarchy_counters_overall_hit_rate() {
        let mut counters = HierarchyCounters::default();
        for _ in 0..70 {
            counters.record_hit(TierKind::Memory);
        }
        for _ in 0..15 {
            counters.record_hit(TierKind::Network);
        }
        for _ in 0..5 {
            counters.record_hit(TierKind::Persistent);
        }
        counters.misses = 10;

        assert_eq!(counters.total_hits(), 90);
        assert_eq!(counters.overall_hit_rate(), 0.9);
    }

    #[test]
    fn test_statistics_lookup_and_format() {
        let mut memory = TierMetrics::new();
        memory.hits = 9;
        memory.misses = 1;
        memory.size = 50;

        let stats = CacheStatistics::new(
            vec![
                (TierKind::Memory, memory),
                (TierKind::Persistent, TierMetrics::new()),
            ],
            HierarchyCounters::default(),
            Instant::now(),
        );

        assert_eq!(stats.tier(TierKind::Memory).unwrap().hits, 9);
        assert!(stats.tier(TierKind::Network).is_none());

        let formatted = stats.format();
        assert!(formatted.contains("L1 (MEMORY)"));
        assert!(formatted.contains("L3 (PERSISTENT)"));
        assert!(formatted.contains("Entries:     50"));
        assert!(formatted.contains("Hit Rate:    90.0%"));
        assert!(formatted.contains("OVERALL"));
    }
}
