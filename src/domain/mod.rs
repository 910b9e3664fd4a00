//! Domain logic - pure functions over chain data
//!
//! Nothing in here touches the network or the store.

pub mod address;
pub mod analysis;
pub mod resource;
pub mod types;
pub mod unwrap;

pub use address::{
    format_address_for_display, format_hash_for_display, is_valid_address_format, normalize_address,
    normalize_transaction_hash, strip_leading_zeros,
};
pub use analysis::{analyze_account, extract_balance};
pub use resource::{
    categorize_resource_types, resource_type_index, resource_type_to_slug, slug_to_resource_type,
    ResourceCategory,
};
pub use types::{
    Account, AccountInfo, AccountKind, BlockchainStats, ExtendedData, LedgerInfo, Resource,
    Transaction, TransactionDetail, TxStatus, VouchingStatus,
};
pub use unwrap::unwrap_value;
