//! Batched reference enrichment
//!
//! Transaction rows are grouped by administrative scope and each group costs one
//! round trip per reference table:
//! - apartment/villa appraisal prices, keyed by `(lot, floor, area)` within a legal dong
//! - officetel standard prices, keyed the same way within a district
//! - unit (dong/ho) labels, keyed by zero-padded lot parts, floor class and exact area text
//!
//! Rows that fail normalization are skipped with a reason, scopes the region index
//! cannot resolve produce an empty batch, and unit lookups that time out degrade to
//! the empty unit summary. Only infrastructure failures are returned as errors.

use jeonse_keys::{
    apartment_reference_key, officetel_reference_key, ApartmentValuation, CanonicalKey,
    OfficetelValuation, PriceRowKey, SkipReason, UnitKey, UnitSummary,
};
use jeonse_region::RegionIndex;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    hash::Hash,
    sync::Arc,
    time::Duration,
};

use crate::{
    config::EnrichmentConfig,
    db::{ReferenceStore, UnitScope},
    models::{TransactionRecord, TransactionRow},
    Error, Result,
};

/// How a batch ended, for logs and tests. Callers see only the entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The reference query ran; `entries` may still be empty.
    Resolved,
    /// `(district, neighborhood)` has no legal-dong code.
    AdminCodeNotFound,
    /// Every row was skipped during normalization.
    NoValidRows,
    /// The unit-identity query hit its deadline.
    TimedOut,
}

/// Result of one price batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBatch<V> {
    pub entries: HashMap<CanonicalKey, V>,
    /// Input positions that were left out of the query, and why.
    pub skipped: Vec<(usize, SkipReason)>,
    pub status: BatchStatus,
    /// Keys for which later reference rows disagreed with the first one.
    pub ambiguous: usize,
}

impl<V> PriceBatch<V> {
    fn empty(status: BatchStatus, skipped: Vec<(usize, SkipReason)>) -> Self {
        Self {
            entries: HashMap::new(),
            skipped,
            status,
            ambiguous: 0,
        }
    }

    /// Entry for a transaction row, if its key normalizes and matched.
    pub fn lookup(&self, row: &TransactionRow) -> Option<&V> {
        let key = PriceRowKey::parse(row.lot(), row.floor(), row.area()).ok()?;
        self.entries.get(&key.canonical())
    }
}

/// Result of one unit-identity batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitBatch {
    pub entries: HashMap<UnitKey, UnitSummary>,
    pub skipped: Vec<(usize, SkipReason)>,
    pub status: BatchStatus,
}

impl UnitBatch {
    /// Summary for a transaction row; the empty form when nothing matched.
    pub fn summary_for(&self, row: &TransactionRow) -> UnitSummary {
        UnitKey::parse(row.lot(), row.floor(), row.area())
            .ok()
            .and_then(|key| self.entries.get(&key).cloned())
            .unwrap_or_else(UnitSummary::empty)
    }
}

/// Outcome of a single-row unit lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitLookup {
    Found(UnitSummary),
    NoMatch,
    Skipped(SkipReason),
    AdminCodeNotFound,
    TimedOut,
}

impl UnitLookup {
    /// What the caller shows: the matched summary or the empty form.
    pub fn summary(&self) -> UnitSummary {
        match self {
            UnitLookup::Found(summary) => summary.clone(),
            _ => UnitSummary::empty(),
        }
    }
}

/// Normalize every row, keeping the first occurrence of each key.
fn collect_keys<K, F>(rows: &[TransactionRow], normalize: F) -> (Vec<K>, Vec<(usize, SkipReason)>)
where
    K: Clone + Eq + Hash,
    F: Fn(&TransactionRow) -> std::result::Result<K, SkipReason>,
{
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut skipped = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match normalize(row) {
            Ok(key) => {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
            Err(reason) => skipped.push((i, reason)),
        }
    }
    (keys, skipped)
}

fn skip_counts(skipped: &[(usize, SkipReason)]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for (_, reason) in skipped {
        *counts.entry(reason.as_str()).or_insert(0) += 1;
    }
    counts
}

/// First value wins; a later, different value only bumps the ambiguity count.
fn insert_first<V: PartialEq>(
    entries: &mut HashMap<CanonicalKey, V>,
    key: CanonicalKey,
    value: V,
    ambiguous: &mut HashSet<CanonicalKey>,
) {
    match entries.get(&key) {
        Some(existing) if *existing != value => {
            ambiguous.insert(key);
        }
        Some(_) => {}
        None => {
            entries.insert(key, value);
        }
    }
}

pub struct EnrichmentService {
    store: Arc<dyn ReferenceStore>,
    regions: Arc<RegionIndex>,
    config: EnrichmentConfig,
}

impl EnrichmentService {
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        regions: Arc<RegionIndex>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            store,
            regions,
            config,
        }
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.config.unit_query_timeout_seconds)
    }

    /// Appraisal prices for apartment/villa rows of one `(district, neighborhood)` scope.
    pub async fn apartment_prices(
        &self,
        district_code: &str,
        neighborhood: &str,
        rows: &[TransactionRow],
    ) -> Result<PriceBatch<ApartmentValuation>> {
        let (keys, skipped) =
            collect_keys(rows, |r| PriceRowKey::parse(r.lot(), r.floor(), r.area()));

        let Some(admin_code) = self.regions.find_admin_code(district_code, neighborhood) else {
            tracing::debug!(district_code, neighborhood, "No legal-dong code, skipping appraisal batch");
            return Ok(PriceBatch::empty(BatchStatus::AdminCodeNotFound, skipped));
        };
        if keys.is_empty() {
            return Ok(PriceBatch::empty(BatchStatus::NoValidRows, skipped));
        }

        let reference_rows = self
            .store
            .apartment_prices(admin_code.as_str(), &keys)
            .await?;

        let mut entries = HashMap::new();
        let mut ambiguous = HashSet::new();
        for r in &reference_rows {
            let (Some(main), Some(sub), Some(floor), Some(area), Some(price)) =
                (&r.main, &r.sub, &r.floor, r.area, r.price)
            else {
                continue;
            };
            let Ok(key) = apartment_reference_key(main, sub, floor, area) else {
                continue;
            };
            if let Some(valuation) = ApartmentValuation::from_reference(price) {
                insert_first(&mut entries, key, valuation, &mut ambiguous);
            }
        }

        tracing::debug!(
            admin_code = admin_code.as_str(),
            rows = rows.len(),
            conditions = keys.len(),
            reference_rows = reference_rows.len(),
            matched = entries.len(),
            ambiguous = ambiguous.len(),
            skipped = ?skip_counts(&skipped),
            "Appraisal price batch"
        );

        Ok(PriceBatch {
            entries,
            skipped,
            status: BatchStatus::Resolved,
            ambiguous: ambiguous.len(),
        })
    }

    /// Standard prices for officetel rows of one district.
    pub async fn officetel_prices(
        &self,
        district_code: &str,
        rows: &[TransactionRow],
    ) -> Result<PriceBatch<OfficetelValuation>> {
        let (keys, skipped) =
            collect_keys(rows, |r| PriceRowKey::parse(r.lot(), r.floor(), r.area()));
        if keys.is_empty() {
            return Ok(PriceBatch::empty(BatchStatus::NoValidRows, skipped));
        }

        let district_code = district_code.trim();
        let reference_rows = self.store.officetel_prices(district_code, &keys).await?;

        let mut entries = HashMap::new();
        let mut ambiguous = HashSet::new();
        for r in &reference_rows {
            let (Some(bunji), Some(ho), Some(marker), Some(floor_address), Some(exclusive)) = (
                &r.bunji,
                &r.ho,
                &r.floor_marker,
                &r.floor_address,
                r.exclusive_area,
            ) else {
                continue;
            };
            let Ok(key) = officetel_reference_key(bunji, ho, marker, floor_address, exclusive)
            else {
                continue;
            };
            let (Some(unit_price), Some(shared)) = (r.unit_price, r.shared_area) else {
                continue;
            };
            if let Some(valuation) = OfficetelValuation::compute(unit_price, exclusive, shared) {
                insert_first(&mut entries, key, valuation, &mut ambiguous);
            }
        }

        tracing::debug!(
            district_code,
            rows = rows.len(),
            conditions = keys.len(),
            reference_rows = reference_rows.len(),
            matched = entries.len(),
            ambiguous = ambiguous.len(),
            skipped = ?skip_counts(&skipped),
            "Officetel price batch"
        );

        Ok(PriceBatch {
            entries,
            skipped,
            status: BatchStatus::Resolved,
            ambiguous: ambiguous.len(),
        })
    }

    /// Unit labels for rows of one `(district, neighborhood)` scope.
    pub async fn unit_identities(
        &self,
        district_code: &str,
        neighborhood: &str,
        rows: &[TransactionRow],
    ) -> Result<UnitBatch> {
        let (keys, skipped) = collect_keys(rows, |r| UnitKey::parse(r.lot(), r.floor(), r.area()));
        let (status, entries) = self.lookup_units(district_code, neighborhood, &keys).await?;

        tracing::debug!(
            district_code,
            neighborhood,
            rows = rows.len(),
            conditions = keys.len(),
            matched = entries.len(),
            status = ?status,
            skipped = ?skip_counts(&skipped),
            "Unit identity batch"
        );

        Ok(UnitBatch {
            entries,
            skipped,
            status,
        })
    }

    /// Unit labels for one row given as raw request fields.
    pub async fn unit_identity(
        &self,
        district_code: &str,
        neighborhood: &str,
        lot: &str,
        floor: &str,
        area: &str,
    ) -> Result<UnitLookup> {
        let key = match UnitKey::parse(lot, floor, area) {
            Ok(key) => key,
            Err(reason) => return Ok(UnitLookup::Skipped(reason)),
        };
        let (status, mut entries) = self
            .lookup_units(district_code, neighborhood, std::slice::from_ref(&key))
            .await?;

        Ok(match status {
            BatchStatus::AdminCodeNotFound => UnitLookup::AdminCodeNotFound,
            BatchStatus::TimedOut => UnitLookup::TimedOut,
            BatchStatus::Resolved | BatchStatus::NoValidRows => match entries.remove(&key) {
                Some(summary) => UnitLookup::Found(summary),
                None => UnitLookup::NoMatch,
            },
        })
    }

    async fn lookup_units(
        &self,
        district_code: &str,
        neighborhood: &str,
        keys: &[UnitKey],
    ) -> Result<(BatchStatus, HashMap<UnitKey, UnitSummary>)> {
        let Some(admin_code) = self.regions.find_admin_code(district_code, neighborhood) else {
            tracing::debug!(district_code, neighborhood, "No legal-dong code, skipping unit batch");
            return Ok((BatchStatus::AdminCodeNotFound, HashMap::new()));
        };
        if keys.is_empty() {
            return Ok((BatchStatus::NoValidRows, HashMap::new()));
        }

        let scope = UnitScope {
            district_code: admin_code.district().to_string(),
            neighborhood_part: admin_code.neighborhood_part().to_string(),
        };
        let rows_per_key = i64::from(self.config.unit_rows_per_condition.max(1));
        let timeout = self.unit_timeout();

        let query = self.store.unit_identities(&scope, keys, rows_per_key, timeout);
        let rows = match tokio::time::timeout(timeout, query).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(Error::QueryTimeout(context))) => {
                tracing::warn!(admin_code = admin_code.as_str(), %context, "Unit identity query cancelled by statement timeout");
                return Ok((BatchStatus::TimedOut, HashMap::new()));
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::warn!(
                    admin_code = admin_code.as_str(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Unit identity query timed out"
                );
                return Ok((BatchStatus::TimedOut, HashMap::new()));
            }
        };

        let mut labels: HashMap<UnitKey, Vec<String>> = HashMap::new();
        for r in &rows {
            let (Some(main), Some(sub), Some(floor_code), Some(floor_no), Some(area)) =
                (&r.main, &r.sub, &r.floor_code, &r.floor_no, &r.area)
            else {
                continue;
            };
            let Some(key) = UnitKey::from_reference(main, sub, floor_code, floor_no, area) else {
                continue;
            };
            if let Some(label) = jeonse_keys::unit_label(r.dong.as_deref(), r.ho.as_deref()) {
                labels.entry(key).or_default().push(label);
            }
        }

        let limit = self.config.unit_display_limit;
        let entries = labels
            .into_iter()
            .map(|(key, labels)| (key, UnitSummary::from_labels(labels, limit)))
            .filter(|(_, summary)| !summary.is_empty())
            .collect();
        Ok((BatchStatus::Resolved, entries))
    }

    /// A record carrying the province abbreviation and district name, blank when unknown.
    pub fn with_region_names(&self, row: TransactionRow) -> TransactionRecord {
        let mut record = TransactionRecord::new(row);
        if let Some((province, district)) = self.regions.display_names(record.row.district_code())
        {
            record.province = province;
            record.district = district.to_string();
        }
        record
    }

    /// Attach region names and every applicable enrichment to `rows`, keeping order.
    pub async fn enrich(&self, rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>> {
        let mut appraisal_groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        let mut officetel_groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut unit_groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();

        for (i, row) in rows.iter().enumerate() {
            let Some(property_type) = row.property_type() else {
                continue;
            };
            let district = row.district_code();
            let neighborhood = row.neighborhood();
            if district.is_empty() {
                continue;
            }
            let scope = (district.to_string(), neighborhood.to_string());
            if property_type.uses_appraisal_price() && !neighborhood.is_empty() {
                appraisal_groups.entry(scope.clone()).or_default().push(i);
            }
            if property_type.uses_officetel_price() {
                officetel_groups
                    .entry(district.to_string())
                    .or_default()
                    .push(i);
            }
            if property_type.has_units() && !neighborhood.is_empty() {
                unit_groups.entry(scope).or_default().push(i);
            }
        }

        let mut records: Vec<TransactionRecord> = rows
            .into_iter()
            .map(|row| {
                let mut record = self.with_region_names(row);
                record.units = Some(UnitSummary::empty().into());
                record
            })
            .collect();

        for ((district, neighborhood), indices) in &appraisal_groups {
            let group = collect_rows(&records, indices);
            let batch = self.apartment_prices(district, neighborhood, &group).await?;
            for &i in indices {
                if let Some(v) = batch.lookup(&records[i].row) {
                    records[i].appraisal = Some((*v).into());
                }
            }
        }

        for (district, indices) in &officetel_groups {
            let group = collect_rows(&records, indices);
            let batch = self.officetel_prices(district, &group).await?;
            for &i in indices {
                if let Some(v) = batch.lookup(&records[i].row) {
                    records[i].officetel_price = Some((*v).into());
                }
            }
        }

        for ((district, neighborhood), indices) in &unit_groups {
            let group = collect_rows(&records, indices);
            let batch = self.unit_identities(district, neighborhood, &group).await?;
            for &i in indices {
                records[i].units = Some(batch.summary_for(&records[i].row).into());
            }
        }

        Ok(records)
    }
}

fn collect_rows(records: &[TransactionRecord], indices: &[usize]) -> Vec<TransactionRow> {
    indices.iter().map(|&i| records[i].row.clone()).collect()
}
