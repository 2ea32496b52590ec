pub mod error;
pub mod resolver;
pub mod tool;
pub mod youtube;

pub use error::{ExtractionError, ResolveError};
pub use resolver::{RetryPolicy, StreamResolver};
pub use tool::{FormatPreference, MediaMetadata, StreamExtractor, YtDlp, YtDlpConfig};
