pub mod cache;
pub mod config;
pub mod fetch;
pub mod process;
pub mod processor;
pub mod query;
pub mod schema;

pub use cache::CacheError;
pub use config::{ProcessorConfig, SourceConfig};
pub use fetch::{FetchError, Fetched, RecordFetcher};
pub use process::{clean, CleaningError, RawRecord, RawTable, RawValue};
pub use processor::{HousingProcessor, Strategy};
pub use query::{HeatmapCell, Summary, TownMonth};
pub use schema::HousingTable;
