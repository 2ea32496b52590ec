//! Channel directory loading and stream resolution for TV channel players.
//!
//! The [`directory`] module loads the country-to-channels mapping (remote
//! first, bundled copy as fallback). The [`extractor`] module turns a
//! channel's source url into something a player can open, delegating the
//! heavy lifting to `yt-dlp`.

pub mod directory;
pub mod extractor;
pub mod media;
