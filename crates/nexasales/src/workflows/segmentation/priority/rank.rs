use serde::{Deserialize, Serialize};

/// Five ordinal bands, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityRank {
    #[serde(rename = "最優先")]
    Top,
    #[serde(rename = "高優先")]
    High,
    #[serde(rename = "中優先")]
    Medium,
    #[serde(rename = "低優先")]
    Low,
    #[serde(rename = "最低優先")]
    Lowest,
}

impl PriorityRank {
    pub const fn ordered() -> [Self; 5] {
        [Self::Top, Self::High, Self::Medium, Self::Low, Self::Lowest]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Top => "最優先",
            Self::High => "高優先",
            Self::Medium => "中優先",
            Self::Low => "低優先",
            Self::Lowest => "最低優先",
        }
    }

    /// Inclusive lower bound of the band; `Lowest` has none.
    pub const fn threshold(self) -> Option<f64> {
        match self {
            Self::Top => Some(0.8),
            Self::High => Some(0.6),
            Self::Medium => Some(0.4),
            Self::Low => Some(0.2),
            Self::Lowest => None,
        }
    }

    /// First band whose threshold the score reaches, checked from the top.
    pub fn from_score(score: f64) -> Self {
        Self::ordered()
            .into_iter()
            .find(|rank| rank.threshold().is_some_and(|threshold| score >= threshold))
            .unwrap_or(Self::Lowest)
    }
}
