//! Legal-dong (법정동) administrative code index.
//!
//! Built once from the national code list (`lawd_code.csv`) and read-only
//! afterwards. Besides forward lookups for the location pickers it provides the
//! reverse lookup `(district code, neighborhood name) -> 10-digit code` that the
//! reference-price tables are keyed on.

mod error;
mod province;

pub use error::{Error, Result};
pub use province::abbreviate_province;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A 10-digit legal-dong code: 2 province + 3 district + 5 neighborhood digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AdminCode(String);

impl AdminCode {
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 10 && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn province(&self) -> &str {
        &self.0[..2]
    }

    /// First five digits (시군구 code).
    pub fn district(&self) -> &str {
        &self.0[..5]
    }

    /// Last five digits, the part the unit-identity table stores as `법정동_코드`.
    pub fn neighborhood_part(&self) -> &str {
        &self.0[5..]
    }

    fn is_province(&self) -> bool {
        &self.0[2..] == "00000000"
    }

    fn is_district(&self) -> bool {
        self.neighborhood_part() == "00000"
    }
}

impl fmt::Display for AdminCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the source code list.
#[derive(Debug, Clone, Default)]
pub struct RegionRecord {
    pub code: String,
    pub province: String,
    pub district: String,
    pub neighborhood: String,
    pub ri: String,
    /// Non-empty when the code has been retired.
    pub deleted_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct District {
    pub code: String,
    pub name: String,
    pub province: String,
    pub province_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighborhood {
    pub code: AdminCode,
    pub name: String,
    pub ri_name: String,
    pub district: String,
    pub province: String,
    pub district_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    provinces: BTreeMap<String, String>,
    districts: BTreeMap<String, District>,
    neighborhoods: BTreeMap<AdminCode, Neighborhood>,
    reverse: HashMap<(String, String), AdminCode>,
}

const COLUMNS: [&str; 6] = ["법정동코드", "시도명", "시군구명", "읍면동명", "리명", "삭제일자"];

impl RegionIndex {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read the code list. A leading UTF-8 BOM is tolerated; the `리명` and
    /// `삭제일자` columns are optional.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = csv
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let code_idx = position(COLUMNS[0]).ok_or(Error::MissingColumn(COLUMNS[0]))?;
        let province_idx = position(COLUMNS[1]).ok_or(Error::MissingColumn(COLUMNS[1]))?;
        let district_idx = position(COLUMNS[2]).ok_or(Error::MissingColumn(COLUMNS[2]))?;
        let neighborhood_idx = position(COLUMNS[3]).ok_or(Error::MissingColumn(COLUMNS[3]))?;
        let ri_idx = position(COLUMNS[4]);
        let deleted_idx = position(COLUMNS[5]);

        let mut records = Vec::new();
        for row in csv.records() {
            let row = row?;
            let field = |idx: Option<usize>| {
                idx.and_then(|i| row.get(i))
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default()
            };
            records.push(RegionRecord {
                code: field(Some(code_idx)),
                province: field(Some(province_idx)),
                district: field(Some(district_idx)),
                neighborhood: field(Some(neighborhood_idx)),
                ri: field(ri_idx),
                deleted_on: field(deleted_idx),
            });
        }

        Ok(Self::from_records(records))
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        let mut index = Self::default();
        let mut skipped = 0usize;

        for record in records {
            if !record.deleted_on.is_empty() {
                continue;
            }
            let Some(code) = AdminCode::parse(&record.code) else {
                skipped += 1;
                continue;
            };

            if code.is_province() && !record.province.is_empty() {
                index
                    .provinces
                    .insert(code.province().to_string(), record.province.clone());
            }

            if code.is_district() && !record.district.is_empty() {
                index.districts.insert(
                    code.district().to_string(),
                    District {
                        code: code.district().to_string(),
                        name: record.district.clone(),
                        province: record.province.clone(),
                        province_code: code.province().to_string(),
                    },
                );
            }

            if !code.is_district() && !record.neighborhood.is_empty() {
                index.insert_neighborhood(Neighborhood {
                    code: code.clone(),
                    name: record.neighborhood,
                    ri_name: record.ri,
                    district: record.district,
                    province: record.province,
                    district_code: code.district().to_string(),
                });
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Ignored region rows with malformed codes");
        }
        index
    }

    fn insert_neighborhood(&mut self, neighborhood: Neighborhood) {
        let key = (
            neighborhood.district_code.clone(),
            neighborhood.name.clone(),
        );
        // Several 리 share one 읍/면 name; the lowest code wins.
        let replace = self
            .reverse
            .get(&key)
            .map_or(true, |existing| neighborhood.code < *existing);
        if replace {
            self.reverse.insert(key, neighborhood.code.clone());
        }
        self.neighborhoods
            .insert(neighborhood.code.clone(), neighborhood);
    }

    /// Reverse lookup `(district code, neighborhood name) -> 10-digit code`.
    pub fn find_admin_code(&self, district_code: &str, neighborhood: &str) -> Option<&AdminCode> {
        self.reverse
            .get(&(district_code.trim().to_string(), neighborhood.trim().to_string()))
    }

    pub fn province_name(&self, province_code: &str) -> Option<&str> {
        self.provinces.get(province_code).map(String::as_str)
    }

    pub fn district(&self, district_code: &str) -> Option<&District> {
        self.districts.get(district_code)
    }

    pub fn neighborhood(&self, code: &AdminCode) -> Option<&Neighborhood> {
        self.neighborhoods.get(code)
    }

    /// `(code, name)` of every province in code order.
    pub fn provinces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.provinces
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
    }

    /// Distinct province names, sorted.
    pub fn province_names(&self) -> Vec<&str> {
        self.provinces
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct district names of a province (by full name), sorted.
    pub fn district_names(&self, province: &str) -> Vec<&str> {
        self.districts
            .values()
            .filter(|d| d.province == province)
            .map(|d| d.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// District codes carrying `name`, optionally restricted to one province.
    /// District names are not unique nationally ("중구").
    pub fn district_codes_by_name(&self, name: &str, province: Option<&str>) -> Vec<&str> {
        self.districts
            .values()
            .filter(|d| d.name == name)
            .filter(|d| province.map_or(true, |p| p.is_empty() || d.province == p))
            .map(|d| d.code.as_str())
            .collect()
    }

    /// District codes under a 2-digit province code, ascending.
    pub fn district_codes_in_province(&self, province_code: &str) -> Vec<&str> {
        self.districts
            .values()
            .filter(|d| d.province_code == province_code.trim())
            .map(|d| d.code.as_str())
            .collect()
    }

    /// Distinct neighborhood names of one district, sorted.
    pub fn neighborhood_names(&self, district_code: &str) -> Vec<&str> {
        self.neighborhoods
            .values()
            .filter(|n| n.district_code == district_code)
            .map(|n| n.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `(province abbreviation, district name)` for a result row.
    pub fn display_names(&self, district_code: &str) -> Option<(String, &str)> {
        self.district(district_code)
            .map(|d| (abbreviate_province(&d.province), d.name.as_str()))
    }

    pub fn stats(&self) -> RegionStats {
        RegionStats {
            provinces: self.provinces.len(),
            districts: self.districts.len(),
            neighborhoods: self.neighborhoods.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    pub provinces: usize,
    pub districts: usize,
    pub neighborhoods: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, province: &str, district: &str, neighborhood: &str) -> RegionRecord {
        RegionRecord {
            code: code.into(),
            province: province.into(),
            district: district.into(),
            neighborhood: neighborhood.into(),
            ..Default::default()
        }
    }

    fn gangnam() -> RegionIndex {
        RegionIndex::from_records(vec![
            record("1100000000", "서울특별시", "", ""),
            record("1168000000", "서울특별시", "강남구", ""),
            record("1168011800", "서울특별시", "강남구", "도곡동"),
            record("1168010300", "서울특별시", "강남구", "개포동"),
            RegionRecord {
                deleted_on: "19880423".into(),
                ..record("1168099900", "서울특별시", "강남구", "폐지동")
            },
        ])
    }

    // --- admin codes ---

    #[test]
    fn admin_code_parts() {
        let code = AdminCode::parse("1168011800").unwrap();
        assert_eq!(code.province(), "11");
        assert_eq!(code.district(), "11680");
        assert_eq!(code.neighborhood_part(), "11800");
        assert!(AdminCode::parse("11680").is_none());
        assert!(AdminCode::parse("11680118OO").is_none());
    }

    // --- reverse lookup ---

    #[test]
    fn finds_admin_code() {
        let index = gangnam();
        assert_eq!(
            index.find_admin_code("11680", "도곡동").map(AdminCode::as_str),
            Some("1168011800")
        );
        assert!(index.find_admin_code("11680", "없는동").is_none());
        assert!(index.find_admin_code("11650", "도곡동").is_none());
    }

    #[test]
    fn deleted_codes_are_ignored() {
        let index = gangnam();
        assert!(index.find_admin_code("11680", "폐지동").is_none());
        assert_eq!(index.stats().neighborhoods, 2);
    }

    #[test]
    fn lowest_code_wins_for_shared_names() {
        let index = RegionIndex::from_records(vec![
            RegionRecord {
                ri: "읍내리".into(),
                ..record("4182025021", "경기도", "가평군", "가평읍")
            },
            record("4182025000", "경기도", "가평군", "가평읍"),
        ]);
        assert_eq!(
            index.find_admin_code("41820", "가평읍").map(AdminCode::as_str),
            Some("4182025000")
        );
    }

    // --- forward lookups ---

    #[test]
    fn forward_lookups() {
        let index = gangnam();
        assert_eq!(index.province_name("11"), Some("서울특별시"));
        assert_eq!(index.province_names(), vec!["서울특별시"]);
        assert_eq!(index.district_codes_in_province("11"), vec!["11680"]);
        assert!(index.district_codes_in_province("26").is_empty());
        assert_eq!(index.district_names("서울특별시"), vec!["강남구"]);
        assert_eq!(index.district_codes_by_name("강남구", None), vec!["11680"]);
        assert!(index
            .district_codes_by_name("강남구", Some("부산광역시"))
            .is_empty());
        assert_eq!(index.neighborhood_names("11680"), vec!["개포동", "도곡동"]);
        assert_eq!(
            index.display_names("11680"),
            Some(("서울".to_string(), "강남구"))
        );
    }
}
