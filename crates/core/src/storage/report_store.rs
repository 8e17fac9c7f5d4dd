use crate::domain::contract::{normalize_ticker, validate_record};
use crate::domain::{Report, ValidationError};
use crate::storage::error::{IngestError, StoreError};
use crate::summary::PortfolioSummary;
use crate::time::timestamp::DEFAULT_NAIVE_UTC_OFFSET_SECS;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

type Snapshot = Arc<BTreeMap<String, Arc<Report>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Reject the whole batch if any record fails validation.
    pub strict: bool,
    pub naive_utc_offset_secs: i32,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            strict: false,
            naive_utc_offset_secs: DEFAULT_NAIVE_UTC_OFFSET_SECS,
        }
    }
}

impl IngestOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// Counts for one applied batch.
///
/// `accepted` are inserts for a ticker the store did not hold yet, `replaced`
/// swapped in a newer snapshot, and `stale` records lost the latest-timestamp
/// rule (equal timestamps keep the record already stored).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub batch_id: Uuid,
    pub received: usize,
    pub accepted: usize,
    pub replaced: usize,
    pub stale: usize,
    pub rejected: usize,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Most recently updated first, ties by ticker ascending.
    #[default]
    TimestampDesc,
    TickerAsc,
    /// Best performer first, ties by ticker ascending.
    ProfitLossDesc,
}

impl FromStr for ListOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "timestamp_desc" => Ok(ListOrder::TimestampDesc),
            "ticker_asc" => Ok(ListOrder::TickerAsc),
            "profit_loss_desc" => Ok(ListOrder::ProfitLossDesc),
            other => Err(format!(
                "unknown order {other:?} (expected timestamp_desc, ticker_asc or profit_loss_desc)"
            )),
        }
    }
}

/// Ordered view of the store as of the `list` call. Can be iterated any number of times.
#[derive(Debug, Clone)]
pub struct ReportList {
    reports: Arc<[Arc<Report>]>,
}

impl ReportList {
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Report>> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.iter().map(|r| r.ticker.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ReportList {
    type Item = &'a Arc<Report>;
    type IntoIter = std::slice::Iter<'a, Arc<Report>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for ReportList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|r| r.as_ref()))
    }
}

/// In-memory store holding the latest validated [`Report`] per ticker.
///
/// Ingestions are serialized and publish a fresh snapshot atomically, so
/// readers never observe a half-applied batch.
#[derive(Debug, Default)]
pub struct ReportStore {
    ingest_lock: Mutex<()>,
    current: RwLock<Snapshot>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts either a JSON array of records or an object with a `reports` array.
    pub fn ingest_value(
        &self,
        batch: &Value,
        options: IngestOptions,
    ) -> Result<IngestOutcome, IngestError> {
        match batch {
            Value::Array(records) => self.ingest(records, options),
            Value::Object(obj) => match obj.get("reports") {
                Some(Value::Array(records)) => self.ingest(records, options),
                _ => Err(IngestError::Malformed {
                    detail: "expected an array of reports or an object with a `reports` array"
                        .to_string(),
                }),
            },
            _ => Err(IngestError::Malformed {
                detail: "expected an array of reports".to_string(),
            }),
        }
    }

    pub fn ingest(
        &self,
        records: &[Value],
        options: IngestOptions,
    ) -> Result<IngestOutcome, IngestError> {
        let _guard = self.ingest_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let batch_id = Uuid::new_v4();

        let mut valid = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        let mut rejected = 0;
        for (index, raw) in records.iter().enumerate() {
            match validate_record(index, raw, options.naive_utc_offset_secs) {
                Ok(report) => valid.push(report),
                Err(record_errors) => {
                    rejected += 1;
                    for e in &record_errors {
                        tracing::warn!(
                            %batch_id,
                            index = e.index,
                            ticker = e.ticker.as_deref().unwrap_or("-"),
                            field = %e.field,
                            reason = %e.reason,
                            "report record rejected"
                        );
                    }
                    errors.extend(record_errors);
                }
            }
        }

        if options.strict && !errors.is_empty() {
            tracing::warn!(
                %batch_id,
                received = records.len(),
                rejected,
                "strict ingest: batch rejected"
            );
            return Err(IngestError::Strict { errors });
        }

        let mut next: BTreeMap<String, Arc<Report>> = (*self.snapshot()).clone();
        let (mut accepted, mut replaced, mut stale) = (0, 0, 0);
        for report in valid {
            match next.get(&report.ticker) {
                Some(existing) if existing.timestamp >= report.timestamp => {
                    stale += 1;
                    tracing::debug!(
                        %batch_id,
                        ticker = %report.ticker,
                        stored = %existing.timestamp,
                        incoming = %report.timestamp,
                        "stale report discarded"
                    );
                }
                Some(_) => {
                    replaced += 1;
                    next.insert(report.ticker.clone(), Arc::new(report));
                }
                None => {
                    accepted += 1;
                    next.insert(report.ticker.clone(), Arc::new(report));
                }
            }
        }

        if accepted + replaced > 0 {
            *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        }

        tracing::info!(
            %batch_id,
            received = records.len(),
            accepted,
            replaced,
            stale,
            rejected,
            "report batch ingested"
        );

        Ok(IngestOutcome {
            batch_id,
            received: records.len(),
            accepted,
            replaced,
            stale,
            rejected,
            errors,
        })
    }

    pub fn list(&self, order: ListOrder) -> ReportList {
        let snapshot = self.snapshot();
        let mut reports: Vec<Arc<Report>> = snapshot.values().cloned().collect();
        match order {
            ListOrder::TimestampDesc => reports.sort_by(|a, b| {
                b.timestamp
                    .cmp(&a.timestamp)
                    .then_with(|| a.ticker.cmp(&b.ticker))
            }),
            // BTreeMap iteration is already ticker-ascending.
            ListOrder::TickerAsc => {}
            ListOrder::ProfitLossDesc => reports.sort_by(|a, b| {
                b.basic_info
                    .profit_loss
                    .total_cmp(&a.basic_info.profit_loss)
                    .then_with(|| a.ticker.cmp(&b.ticker))
            }),
        }
        ReportList {
            reports: reports.into(),
        }
    }

    pub fn get(&self, ticker: &str) -> Result<Arc<Report>, StoreError> {
        let not_found = || StoreError::NotFound {
            ticker: ticker.trim().to_string(),
        };
        let key = normalize_ticker(ticker).map_err(|_| not_found())?;
        self.snapshot().get(&key).cloned().ok_or_else(not_found)
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_reports(self.snapshot().values().map(|r| r.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}
