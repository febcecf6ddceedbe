//! Data access: provider contract, Parquet store, in-memory and synthetic sources

pub mod memory;
pub mod provider;
pub mod store;
pub mod synthetic;

pub use memory::MemoryProvider;
pub use provider::{Calendar, DataError, DataProvider, Dataset, DatasetKind};
pub use store::ParquetStore;
pub use synthetic::{generate_market, SyntheticConfig, SyntheticMarket};

/// Calendar dates (`yyyymmdd`), one row per date.
pub const DATE: &str = "date";
/// Symbol names, one row per symbol.
pub const SYMBOL: &str = "symbol";
/// Daily closing price.
pub const CLOSE: &str = "close";
/// 60-day average dollar volume, used for universe selection.
pub const LIQUIDITY: &str = "adv60";
pub const SECTOR: &str = "sector";
pub const INDUSTRY: &str = "industry";
pub const SUBINDUSTRY: &str = "subindustry";
