pub mod property;
pub mod query;
pub mod request;
pub mod transaction;

pub use property::PropertyType;
pub use query::{BuildingCandidate, Bounds, ContractEnd, RegionScope, TransactionFilter};
pub use request::{
    scalar_text, BuildingSearchQuery, BuildingTransactionsRequest, LegacySearchRequest,
    OwnerInfoRequest, SearchRequest, SigunguQuery, UnitInfoRequest,
};
pub use transaction::{
    AppraisalFields, OfficetelPriceFields, TransactionRecord, TransactionRow, UnitFields,
};
