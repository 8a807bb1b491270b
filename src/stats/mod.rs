//! Analysis history and the dashboard summary computed from it.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::result::ExecutionResult;
use crate::store::{SharedStore, StoreError};

pub const ANALYSIS_HISTORY_KEY: &str = "rca_analysis_history";
pub const EXECUTION_HISTORY_KEY: &str = "rca_execution_history";

const CHART_DAYS: usize = 7;

/// One submission, as appended by the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub timestamp: String,
    pub success: bool,
    #[serde(default)]
    pub status: u16,
    /// Milliseconds from request to response.
    #[serde(default)]
    pub processing_time: f64,
}

/// Per-day aggregate, written by external tooling. Every field is read
/// leniently: a missing, null or mistyped value counts as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub analyses: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub success: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub failed: u64,
    #[serde(default, deserialize_with = "lenient_times", skip_serializing_if = "Option::is_none")]
    pub processing_times: Option<Vec<f64>>,
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

// non-negative whole part of any finite number; everything else is 0
fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    })
}

fn lenient_times<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<f64>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(items.iter().filter_map(Value::as_f64).collect()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: String,
    pub analyses: u64,
    pub success: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub last_analysis: Option<String>,
    pub avg_processing_ms: f64,
    pub recent_days: Vec<DaySummary>,
}

impl DashboardStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Clone)]
pub struct AnalysisHistory {
    store: SharedStore,
    length: usize,
}

impl AnalysisHistory {
    pub fn new(store: SharedStore, length: usize) -> Self {
        Self { store, length: length.max(1) }
    }

    /// Entries are decoded one by one; a bad entry is skipped, not the whole list.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.store.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => match serde_json::from_str::<Vec<Value>>(&raw) {
                Ok(entries) => entries
                    .into_iter()
                    .filter_map(|entry| {
                        serde_json::from_value(entry)
                            .map_err(|err| warn!(key, error = %err, "skipping unreadable history entry"))
                            .ok()
                    })
                    .collect(),
                Err(err) => {
                    warn!(key, error = %err, "history is unreadable; ignoring");
                    Vec::new()
                }
            },
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "history store unreadable");
                Vec::new()
            }
        }
    }

    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.read_list(ANALYSIS_HISTORY_KEY)
    }

    pub fn daily_logs(&self) -> Vec<DailyLog> {
        self.read_list(EXECUTION_HISTORY_KEY)
    }

    /// Appends a record, dropping the oldest entries beyond the configured length.
    pub fn append(&self, record: AnalysisRecord) -> Result<(), StoreError> {
        let mut records = self.records();
        records.push(record);
        if records.len() > self.length {
            let over = records.len() - self.length;
            records.drain(..over);
        }
        self.store.set(ANALYSIS_HISTORY_KEY, &serde_json::to_string(&records)?)
    }

    pub fn stats(&self, last: Option<&ExecutionResult>) -> DashboardStats {
        compute(&self.daily_logs(), &self.records(), last)
    }
}

#[derive(Default)]
struct Tally {
    total: u64,
    success: u64,
    failed: u64,
    times: Vec<f64>,
}

/// Daily aggregates win when they hold any analyses; otherwise the per-run log is counted.
pub fn compute(daily: &[DailyLog], records: &[AnalysisRecord], last: Option<&ExecutionResult>) -> DashboardStats {
    let from_daily = daily.iter().fold(Tally::default(), |mut acc, d| {
        acc.total += d.analyses;
        acc.success += d.success;
        acc.failed += d.failed;
        if let Some(times) = &d.processing_times {
            acc.times.extend(times.iter().copied().filter(|t| t.is_finite()));
        }
        acc
    });
    let from_records = records.iter().fold(Tally::default(), |mut acc, r| {
        acc.total += 1;
        if r.success {
            acc.success += 1;
        } else {
            acc.failed += 1;
        }
        if r.processing_time.is_finite() {
            acc.times.push(r.processing_time);
        }
        acc
    });
    let base = if from_daily.total > 0 { from_daily } else { from_records };

    let avg_processing_ms = if base.times.is_empty() {
        0.0
    } else {
        base.times.iter().sum::<f64>() / base.times.len() as f64
    };

    let last_analysis = last
        .and_then(|r| r.timestamp.clone())
        .or_else(|| records.last().map(|r| r.timestamp.clone()));

    let recent_days = if daily.is_empty() {
        (1..=CHART_DAYS)
            .map(|i| DaySummary { day: format!("Day {i}"), analyses: 0, success: 0, failed: 0 })
            .collect()
    } else {
        daily[daily.len().saturating_sub(CHART_DAYS)..]
            .iter()
            .map(|d| DaySummary {
                day: d.date.get(5..).unwrap_or_default().to_string(),
                analyses: d.analyses,
                success: d.success,
                failed: d.failed,
            })
            .collect()
    };

    DashboardStats {
        total: base.total,
        successful: base.success,
        failed: base.failed,
        last_analysis,
        avg_processing_ms,
        recent_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    fn record(success: bool, ms: f64) -> AnalysisRecord {
        AnalysisRecord {
            timestamp: format!("2025-03-0{}T10:00:00.000Z", if success { 1 } else { 2 }),
            success,
            status: if success { 200 } else { 0 },
            processing_time: ms,
        }
    }

    #[test]
    fn empty_history_gives_zeroed_chart() {
        let stats = compute(&[], &[], None);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.recent_days.len(), CHART_DAYS);
        assert_eq!(stats.last_analysis, None);
    }

    #[test]
    fn records_are_counted_without_daily_logs() {
        let stats = compute(&[], &[record(true, 100.0), record(false, 300.0), record(true, 200.0)], None);
        assert_eq!((stats.total, stats.successful, stats.failed), (3, 2, 1));
        assert_eq!(stats.avg_processing_ms, 200.0);
        assert_eq!(stats.last_analysis.as_deref(), Some("2025-03-01T10:00:00.000Z"));
    }

    #[test]
    fn daily_logs_take_precedence() {
        let daily = vec![
            DailyLog { date: "2025-03-01".into(), analyses: 4, success: 3, failed: 1, processing_times: Some(vec![10.0, 30.0]) },
            DailyLog { date: "2025-03-02".into(), analyses: 1, success: 1, failed: 0, processing_times: None },
        ];
        let stats = compute(&daily, &[record(false, 1.0)], None);
        assert_eq!((stats.total, stats.successful, stats.failed), (5, 4, 1));
        assert_eq!(stats.avg_processing_ms, 20.0);
        assert_eq!(stats.recent_days.len(), 2);
        assert_eq!(stats.recent_days[0].day, "03-01");
    }

    #[test]
    fn append_prunes_oldest() {
        let history = AnalysisHistory::new(MemoryStore::shared(), 2);
        history.append(record(true, 1.0)).unwrap();
        history.append(record(false, 2.0)).unwrap();
        history.append(record(true, 3.0)).unwrap();
        let kept = history.records();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].processing_time, 2.0);
    }

    #[test]
    fn daily_counters_are_read_leniently() {
        let store = MemoryStore::shared();
        store
            .set(
                EXECUTION_HISTORY_KEY,
                r#"[
                    {"date":"2025-03-01","analyses":3,"success":3,"failed":0,"processingTimes":[10.0,null,20.0]},
                    {"date":"2025-03-02","analyses":null,"success":1.0,"failed":"2"},
                    {"date":null,"analyses":2.7,"success":-1}
                ]"#,
            )
            .unwrap();
        let history = AnalysisHistory::new(store, 10);

        let daily = history.daily_logs();
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].processing_times, Some(vec![10.0, 20.0]));
        assert_eq!((daily[1].analyses, daily[1].success, daily[1].failed), (0, 1, 0));
        assert_eq!((daily[2].date.as_str(), daily[2].analyses, daily[2].success), ("", 2, 0));

        let stats = history.stats(None);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.successful, 4);
        assert_eq!(stats.avg_processing_ms, 15.0);
    }

    #[test]
    fn unreadable_entry_is_skipped_alone() {
        let store = MemoryStore::shared();
        store
            .set(
                ANALYSIS_HISTORY_KEY,
                r#"[{"timestamp":"2025-03-01T10:00:00.000Z","success":true},"garbage",{"success":false}]"#,
            )
            .unwrap();
        let records = AnalysisHistory::new(store, 10).records();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
    }

    #[test]
    fn corrupt_history_reads_empty() {
        let store = MemoryStore::shared();
        store.set(ANALYSIS_HISTORY_KEY, "{oops").unwrap();
        assert!(AnalysisHistory::new(store, 10).records().is_empty());
    }
}
