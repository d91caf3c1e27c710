//! Land ownership lookup through the VWorld possession API

use jeonse_keys::{pad_lot_part, split_lot};
use jeonse_region::RegionIndex;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{config::OwnerInfoConfig, Error, Result};

pub const DISABLED_ERROR: &str = "소유자 정보 조회 기능이 일시적으로 비활성화되었습니다.";
pub const DISABLED_MESSAGE: &str = "API 안정화 작업 중입니다.";
pub const MISSING_PARAMETERS: &str = "필수 파라미터가 누락되었습니다.";
pub const ADMIN_CODE_NOT_FOUND: &str = "법정동코드를 찾을 수 없습니다.";
pub const NO_OWNERS: &str = "소유자 정보가 없습니다.";

const DEFAULT_DOMAIN: &str = "http://127.0.0.1";
const UNSET_PART: &str = "0000";

/// 19-digit parcel number: district(5) + neighborhood(5) + land type '1' + main(4) + sub(4).
pub fn parcel_number(district_code: &str, neighborhood_part: &str, lot: &str) -> String {
    let (main, sub) = split_lot(lot);
    format!(
        "{}{}1{}{}",
        district_code,
        neighborhood_part,
        pad_lot_part(main),
        pad_lot_part(sub.unwrap_or(UNSET_PART))
    )
}

/// Children of every `<field>` element as `tag -> text`.
pub fn parse_fields(xml: &str) -> std::result::Result<Vec<HashMap<String, String>>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut fields = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut tag: Option<String> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match current.as_mut() {
                    None if name == "field" => current = Some(HashMap::new()),
                    Some(item) => {
                        item.entry(name.clone()).or_default();
                        tag = Some(name);
                    }
                    None => {}
                }
            }
            Event::Empty(e) => {
                if let Some(item) = current.as_mut() {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    item.entry(name).or_default();
                }
            }
            Event::Text(t) => {
                if let (Some(item), Some(name)) = (current.as_mut(), tag.as_ref()) {
                    item.entry(name.clone()).or_default().push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let (Some(item), Some(name)) = (current.as_mut(), tag.as_ref()) {
                    item.entry(name.clone())
                        .or_default()
                        .push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                if tag.take().is_none() && e.local_name().as_ref() == b"field" {
                    if let Some(item) = current.take() {
                        fields.push(item);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(fields)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    pub posesn_se_code_nm: String,
    pub resdnc_se_code_nm: String,
    pub ownship_chg_de: String,
    pub ownship_chg_cause_code_nm: String,
    pub cnrs_psn_co: String,
    pub buld_dong_nm: String,
    pub buld_ho_nm: String,
}

fn building_part(value: Option<&String>) -> String {
    value
        .filter(|v| !v.is_empty() && v.as_str() != UNSET_PART)
        .cloned()
        .unwrap_or_default()
}

impl OwnerRecord {
    fn from_field(field: &HashMap<String, String>) -> Self {
        let or = |key: &str, default: &str| {
            field
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            posesn_se_code_nm: or("posesnSeCodeNm", "-"),
            resdnc_se_code_nm: or("resdncSeCodeNm", "-"),
            ownship_chg_de: or("ownshipChgDe", "-"),
            ownship_chg_cause_code_nm: or("ownshipChgCauseCodeNm", "-"),
            cnrs_psn_co: or("cnrsPsnCo", "0"),
            buld_dong_nm: building_part(field.get("buldDongNm")),
            buld_ho_nm: building_part(field.get("buldHoNm")),
        }
    }

    /// `"101동 1203호"`, `"101동"`, `"1203호"`, or `"토지"` for the land itself.
    pub fn group(&self) -> String {
        match (self.buld_dong_nm.as_str(), self.buld_ho_nm.as_str()) {
            ("", "") => "토지".to_string(),
            (dong, "") => format!("{}동", dong),
            ("", ho) => format!("{}호", ho),
            (dong, ho) => format!("{}동 {}호", dong, ho),
        }
    }
}

/// Records grouped by building unit, groups in order of first appearance.
pub fn group_owners(fields: &[HashMap<String, String>]) -> Map<String, Value> {
    let mut groups: Vec<(String, Vec<OwnerRecord>)> = Vec::new();
    for field in fields {
        let record = OwnerRecord::from_field(field);
        let key = record.group();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, records)) => records.push(record),
            None => groups.push((key, vec![record])),
        }
    }
    groups
        .into_iter()
        .map(|(key, records)| {
            let records = records
                .into_iter()
                .filter_map(|r| serde_json::to_value(r).ok())
                .collect();
            (key, Value::Array(records))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerInfo {
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub struct OwnerInfoService {
    client: reqwest::Client,
    regions: Arc<RegionIndex>,
    config: OwnerInfoConfig,
}

impl OwnerInfoService {
    pub fn new(regions: Arc<RegionIndex>, config: OwnerInfoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            regions,
            config,
        })
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn lookup(
        &self,
        district_code: Option<&str>,
        neighborhood: Option<&str>,
        lot: Option<&str>,
    ) -> Result<OwnerInfo> {
        if !self.config.enabled {
            return Err(Error::FeatureDisabled(DISABLED_ERROR.into()));
        }
        let (Some(district_code), Some(neighborhood), Some(lot)) = (district_code, neighborhood, lot)
        else {
            return Err(Error::Validation(MISSING_PARAMETERS.into()));
        };
        let admin_code = self
            .regions
            .find_admin_code(district_code, neighborhood)
            .ok_or_else(|| {
                tracing::debug!(district_code, neighborhood, "No legal-dong code for ownership lookup");
                Error::NotFound(ADMIN_CODE_NOT_FOUND.into())
            })?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("owner_info.api_key is not set".into()))?;

        let pnu = parcel_number(district_code, admin_code.neighborhood_part(), lot);
        tracing::debug!(pnu = %pnu, "Requesting ownership records");

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("pnu", pnu.as_str()),
                ("format", "xml"),
                ("numOfRows", "1000"),
                ("pageNo", "1"),
                ("key", api_key),
                ("domain", self.config.domain.as_deref().unwrap_or(DEFAULT_DOMAIN)),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(pnu = %pnu, "Ownership API timed out");
                    Error::UpstreamTimeout
                } else {
                    Error::Internal(format!("API 요청 실패: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Ownership API call failed");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("API 호출 실패 (상태코드: {})", status.as_u16()),
            });
        }
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::UpstreamTimeout
            } else {
                Error::Internal(format!("API 요청 실패: {e}"))
            }
        })?;

        let fields = parse_fields(&body).map_err(|e| {
            tracing::error!(error = %e, "Ownership API returned malformed XML");
            Error::Internal("API 응답 파싱 실패".into())
        })?;
        if fields.is_empty() {
            return Ok(OwnerInfo {
                data: Map::new(),
                message: Some(NO_OWNERS),
            });
        }
        tracing::info!(records = fields.len(), "Ownership records fetched");
        Ok(OwnerInfo {
            data: group_owners(&fields),
            message: None,
        })
    }
}
