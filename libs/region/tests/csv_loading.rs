use jeonse_region::{AdminCode, Error, RegionIndex};
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/lawd_code.csv")
}

#[test]
fn loads_fixture_with_bom() {
    let index = RegionIndex::from_csv_path(fixture()).expect("fixture loads");
    let stats = index.stats();
    assert_eq!(stats.provinces, 3);
    assert_eq!(stats.districts, 4);
    // 개포동, 도곡동, 무교동, 영주동, 가평읍, 가평읍 읍내리
    assert_eq!(stats.neighborhoods, 6);
}

#[test]
fn reverse_lookup_from_file() {
    let index = RegionIndex::from_csv_path(fixture()).unwrap();
    assert_eq!(
        index.find_admin_code("11680", "도곡동").map(AdminCode::as_str),
        Some("1168011800")
    );
    assert_eq!(
        index.find_admin_code("41820", "가평읍").map(AdminCode::as_str),
        Some("4182025000")
    );
    assert!(index.find_admin_code("41820", "폐지읍").is_none());
}

#[test]
fn same_district_name_in_two_provinces() {
    let index = RegionIndex::from_csv_path(fixture()).unwrap();
    let mut all = index.district_codes_by_name("중구", None);
    all.sort();
    assert_eq!(all, vec!["11140", "26110"]);
    assert_eq!(
        index.district_codes_by_name("중구", Some("부산광역시")),
        vec!["26110"]
    );
}

#[test]
fn missing_column_is_reported() {
    let csv = "코드,시도명\n1100000000,서울특별시\n";
    let err = RegionIndex::from_reader(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn("법정동코드")));
}

#[test]
fn missing_file_is_io_error() {
    let err = RegionIndex::from_csv_path("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
