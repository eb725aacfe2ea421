use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AtomError;

/// Output resolution selected for a render
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub enum SizeTier {
    #[serde(rename = "Mini HD")]
    MiniHd,
    #[default]
    #[serde(rename = "Full HD")]
    FullHd,
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl SizeTier {
    pub const ALL: [SizeTier; 5] = [
        SizeTier::MiniHd,
        SizeTier::FullHd,
        SizeTier::OneK,
        SizeTier::TwoK,
        SizeTier::FourK,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::MiniHd => "Mini HD",
            SizeTier::FullHd => "Full HD",
            SizeTier::OneK => "1K",
            SizeTier::TwoK => "2K",
            SizeTier::FourK => "4K",
        }
    }

    /// Sizes the free tier may request
    #[inline]
    pub fn is_free_tier_size(&self) -> bool {
        matches!(self, SizeTier::MiniHd | SizeTier::FullHd)
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeTier {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "mini hd" | "minihd" | "mini" => Ok(SizeTier::MiniHd),
            "full hd" | "fullhd" | "full" => Ok(SizeTier::FullHd),
            "1k" => Ok(SizeTier::OneK),
            "2k" => Ok(SizeTier::TwoK),
            "4k" => Ok(SizeTier::FourK),
            other => Err(AtomError::invalid(format!("unknown size tier '{}'", other))),
        }
    }
}

/// Service level of the model used for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Free,
    Pro,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Free => "free",
            ModelTier::Pro => "pro",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" | "basic" => Ok(ModelTier::Free),
            "pro" => Ok(ModelTier::Pro),
            other => Err(AtomError::invalid(format!("unknown model tier '{}'", other))),
        }
    }
}

/// Whether a request creates a new image or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Create,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Widescreen),
            "4:3" => Ok(AspectRatio::Standard),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(AtomError::invalid(format!("unknown aspect ratio '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_tier_wire_names() {
        assert_eq!(serde_json::to_string(&SizeTier::MiniHd).unwrap(), "\"Mini HD\"");
        assert_eq!(serde_json::to_string(&SizeTier::TwoK).unwrap(), "\"2K\"");
        let parsed: SizeTier = serde_json::from_str("\"Full HD\"").unwrap();
        assert_eq!(parsed, SizeTier::FullHd);
    }

    #[test]
    fn test_size_tier_parsing() {
        assert_eq!("full-hd".parse::<SizeTier>().unwrap(), SizeTier::FullHd);
        assert_eq!("Mini HD".parse::<SizeTier>().unwrap(), SizeTier::MiniHd);
        assert_eq!("4k".parse::<SizeTier>().unwrap(), SizeTier::FourK);
        assert!("8K".parse::<SizeTier>().is_err());
    }

    #[test]
    fn test_free_tier_sizes() {
        let allowed: Vec<_> = SizeTier::ALL
            .iter()
            .filter(|s| s.is_free_tier_size())
            .collect();
        assert_eq!(allowed, vec![&SizeTier::MiniHd, &SizeTier::FullHd]);
    }

    #[test]
    fn test_model_tier_and_aspect_ratio() {
        assert_eq!(serde_json::to_string(&ModelTier::Pro).unwrap(), "\"pro\"");
        assert_eq!("PRO".parse::<ModelTier>().unwrap(), ModelTier::Pro);
        assert_eq!("4:3".parse::<AspectRatio>().unwrap(), AspectRatio::Standard);
        assert_eq!(AspectRatio::default().to_string(), "16:9");
    }
}
