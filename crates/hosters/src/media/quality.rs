use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    #[default]
    Unknown,
    Cam,
    Ts,
    Sd,
    Hd720,
    Hd1080,
    Uhd4k,
}

impl Quality {
    pub fn as_str(&self) -> &str {
        match self {
            Quality::Unknown => "unknown",
            Quality::Cam => "cam",
            Quality::Ts => "ts",
            Quality::Sd => "sd",
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::Uhd4k => "2160p",
        }
    }

    /// Best-effort guess from a host-provided label or file name, e.g.
    /// "x264.1080p.WEB" or "movie_720.mp4". Falls back to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("2160") || label.contains("4k") || label.contains("uhd") {
            Quality::Uhd4k
        } else if label.contains("1080") {
            Quality::Hd1080
        } else if label.contains("720") {
            Quality::Hd720
        } else if label.contains("480") || label.contains("360") || label.contains("sd") {
            Quality::Sd
        } else if label.contains("telesync") || label.contains(".ts.") {
            Quality::Ts
        } else if label.contains("cam") {
            Quality::Cam
        } else {
            Quality::Unknown
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(Quality::Unknown),
            "cam" => Ok(Quality::Cam),
            "ts" => Ok(Quality::Ts),
            "sd" | "480p" => Ok(Quality::Sd),
            "720p" | "hd" => Ok(Quality::Hd720),
            "1080p" | "fhd" => Ok(Quality::Hd1080),
            "2160p" | "4k" => Ok(Quality::Uhd4k),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(Quality::from_label("Movie.2024.1080p.WEB.mp4"), Quality::Hd1080);
        assert_eq!(Quality::from_label("clip_720.mp4"), Quality::Hd720);
        assert_eq!(Quality::from_label("old.480p.avi"), Quality::Sd);
        assert_eq!(Quality::from_label("something.else"), Quality::Unknown);
    }

    #[test]
    fn test_round_trip() {
        for q in [
            Quality::Unknown,
            Quality::Cam,
            Quality::Ts,
            Quality::Sd,
            Quality::Hd720,
            Quality::Hd1080,
            Quality::Uhd4k,
        ] {
            assert_eq!(q.as_str().parse::<Quality>().unwrap(), q);
        }
    }
}
