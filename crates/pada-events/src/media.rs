#![forbid(unsafe_code)]

use std::fmt;

/// Media type of an adaptation set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    /// Text tracks, thumbnails and anything else with its own bitrate ladder.
    Other,
}

impl MediaKind {
    /// Number of distinct kinds; sizes fixed per-kind tables.
    pub const COUNT: usize = 3;

    pub const ALL: [MediaKind; Self::COUNT] = [MediaKind::Video, MediaKind::Audio, MediaKind::Other];

    /// Dense index in `0..COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Video => 0,
            Self::Audio => 1,
            Self::Other => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
