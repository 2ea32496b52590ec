pub mod channel;
pub mod formats;
pub mod resolved;

pub use channel::{ChannelDescriptor, ChannelKind};
pub use formats::{StreamFormat, is_direct_media_url};
pub use resolved::{PlaybackMode, ResolutionMethod, ResolvedStream};
