//! Database access

pub mod maintenance;
pub mod reference;
pub mod traits;
pub mod transactions;

pub use reference::PostgresReferenceStore;
pub use traits::{
    ApartmentPriceRow, OfficetelPriceRow, ReferenceStore, TransactionSource, UnitIdentityRow,
    UnitScope,
};
pub use transactions::PostgresTransactionSource;
