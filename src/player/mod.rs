//! Operations against the player widgets of the host page.

pub mod quality;
pub mod restriction;
pub mod theater;

/// Entries of the quality picker, rendered best first.
pub const QUALITY_LIST: &str = ".player-videotype-list li";

/// Label of the quality currently playing.
pub const CURRENT_QUALITY: &str = ".player-videotype-cur";

/// Control toggling the enlarged viewing layout.
pub const THEATER_BUTTON: &str = "#player-fullpage-btn";

/// Class the theater control carries once the enlarged layout is active.
pub const NARROW_PAGE_CLASS: &str = "player-narrowpage";
