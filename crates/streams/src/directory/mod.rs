pub mod client;
pub mod error;
pub mod loader;
pub mod matching;
pub mod model;
pub mod source;

pub use client::{HttpConfig, ProxyConfig, create_client};
pub use error::DirectoryError;
pub use loader::{DEFAULT_CACHE_TTL, DirectoryCache, DirectoryLoader};
pub use model::{CountryEntry, DEFAULT_SUGGESTIONS, Directory, DirectoryIssue};
pub use source::{DirectorySource, LocalSource, RemoteSource};
