pub mod cache_policy;
pub mod config;
pub mod error;
pub mod spa;

pub use cache_policy::CachePolicy;
pub use config::Config;
pub use error::{EntryDocumentError, StartupError};
pub use spa::SpaAssets;
