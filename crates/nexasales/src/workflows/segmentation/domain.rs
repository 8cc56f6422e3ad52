use serde::{Deserialize, Serialize};

/// Qualitative high/low rating used for value potential and implementation ease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    High,
    Low,
}

impl Rating {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "高",
            Self::Low => "低",
        }
    }

    /// Anything other than an explicit "high" marker reads as low.
    pub fn parse_lenient(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        if value == "high" || value.starts_with('高') {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Enterprise/value flags fixed at segment creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentTraits {
    pub is_enterprise: bool,
    pub is_high_value: bool,
}

impl SegmentTraits {
    /// Reads `s<digits>` identifiers: enterprise when n <= 2, high value when n is odd.
    pub fn from_id(id: &str) -> Option<Self> {
        let digits = id.trim().strip_prefix('s')?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let number: u32 = digits.parse().ok()?;
        Some(Self {
            is_enterprise: number <= 2,
            is_high_value: number % 2 == 1,
        })
    }

    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        Self {
            is_enterprise: label.contains("大企業") || lowered.contains("enterprise"),
            is_high_value: label.contains("高価値")
                || lowered.contains("high-value")
                || lowered.contains("high value"),
        }
    }

    pub fn derive(id: &str, label: &str) -> Self {
        Self::from_id(id).unwrap_or_else(|| Self::from_label(label))
    }

    pub const fn segment_type(self) -> SegmentType {
        match (self.is_enterprise, self.is_high_value) {
            (true, true) => SegmentType::HighValueLowBarrier,
            (false, true) => SegmentType::HighValueHighBarrier,
            (true, false) => SegmentType::LowValueLowBarrier,
            (false, false) => SegmentType::LowValueHighBarrier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    HighValueLowBarrier,
    HighValueHighBarrier,
    LowValueLowBarrier,
    LowValueHighBarrier,
}

impl SegmentType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::HighValueLowBarrier,
            Self::HighValueHighBarrier,
            Self::LowValueLowBarrier,
            Self::LowValueHighBarrier,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighValueLowBarrier => "高価値・低障壁",
            Self::HighValueHighBarrier => "高価値・高障壁",
            Self::LowValueLowBarrier => "低価値・低障壁",
            Self::LowValueHighBarrier => "低価値・高障壁",
        }
    }

    /// Conventional segment name for the type.
    pub const fn segment_name(self) -> &'static str {
        match self {
            Self::HighValueLowBarrier => "大企業・高価値",
            Self::HighValueHighBarrier => "中小企業・高価値",
            Self::LowValueLowBarrier => "大企業・低価値",
            Self::LowValueHighBarrier => "中小企業・低価値",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BantBudget {
    pub range: String,
    pub cycle: String,
    pub decision_maker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BantAuthority {
    pub final_decision_maker: String,
    pub champion: String,
    pub process: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BantTimeline {
    pub consideration_period: String,
    pub cycle: String,
    pub urgency: String,
}

/// Budget/Authority/Need/Timeline qualification block. Absent fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bant {
    pub budget: BantBudget,
    pub authority: BantAuthority,
    pub need: Vec<String>,
    pub timeline: BantTimeline,
}

impl Bant {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Additional context attached during formula design.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentEnrichment {
    pub industry_categories: Vec<String>,
    pub example_companies: Vec<String>,
    pub bant: Option<Bant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub value_potential: Rating,
    pub implementation_ease: Rating,
    pub characteristics: Vec<String>,
    pub industry_categories: Vec<String>,
    pub example_companies: Vec<String>,
    pub bant: Bant,
    pub market_size_hint: Option<u64>,
    pub acquisition_probability_hint: Option<f64>,
    traits: SegmentTraits,
}

impl Segment {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        value_potential: Rating,
        implementation_ease: Rating,
    ) -> Self {
        let id = id.into();
        let name = name.into();
        let traits = SegmentTraits::derive(&id, &name);
        Self {
            id,
            name,
            description: String::new(),
            value_potential,
            implementation_ease,
            characteristics: Vec::new(),
            industry_categories: Vec::new(),
            example_companies: Vec::new(),
            bant: Bant::default(),
            market_size_hint: None,
            acquisition_probability_hint: None,
            traits,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_characteristics<I, S>(mut self, characteristics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.characteristics = characteristics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_market_hint(mut self, market_size: u64, acquisition_probability: f64) -> Self {
        self.market_size_hint = Some(market_size);
        self.acquisition_probability_hint = Some(acquisition_probability);
        self
    }

    pub(crate) fn with_traits(mut self, traits: SegmentTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn traits(&self) -> SegmentTraits {
        self.traits
    }

    pub fn segment_type(&self) -> SegmentType {
        self.traits.segment_type()
    }

    /// Appends enrichment without touching identity or traits.
    pub fn enrich(mut self, enrichment: SegmentEnrichment) -> Self {
        append_unique(&mut self.industry_categories, enrichment.industry_categories);
        append_unique(&mut self.example_companies, enrichment.example_companies);
        if let Some(bant) = enrichment.bant {
            self.bant = bant;
        }
        self
    }
}

fn append_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !item.trim().is_empty() && !target.contains(&item) {
            target.push(item);
        }
    }
}

/// The four conventional segments used when upstream text yields none.
pub struct SegmentCatalog;

impl SegmentCatalog {
    pub fn standard() -> Vec<Segment> {
        vec![
            Segment::new("s1", "大企業・高価値", Rating::High, Rating::High)
                .with_description("大企業で価値創出ポテンシャルが高く、実現も容易なセグメント")
                .with_characteristics(["予算が豊富", "意思決定が迅速", "ITリテラシーが高い"])
                .with_market_hint(1000, 0.30),
            Segment::new("s2", "大企業・低価値", Rating::Low, Rating::High)
                .with_description("大企業だが価値創出ポテンシャルが低いセグメント")
                .with_characteristics(["予算が豊富", "既存システムへの依存度が高い"])
                .with_market_hint(2000, 0.15),
            Segment::new("s3", "中小企業・高価値", Rating::High, Rating::Low)
                .with_description("中小企業で価値創出ポテンシャルが高いが実現が難しいセグメント")
                .with_characteristics(["コスト意識が高い", "意思決定が迅速", "リソースが限られている"])
                .with_market_hint(5000, 0.20),
            Segment::new("s4", "中小企業・低価値", Rating::Low, Rating::Low)
                .with_description("中小企業で価値創出ポテンシャルが低く実現も難しいセグメント")
                .with_characteristics(["予算が限られている", "ITリテラシーが低い"])
                .with_market_hint(8000, 0.05),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_follow_numeric_suffix() {
        let expected = [
            ("s1", true, true),
            ("s2", true, false),
            ("s3", false, true),
            ("s4", false, false),
            ("s12", false, false),
        ];
        for (id, enterprise, high_value) in expected {
            let traits = SegmentTraits::from_id(id).expect("numeric id");
            assert_eq!(traits.is_enterprise, enterprise, "{id}");
            assert_eq!(traits.is_high_value, high_value, "{id}");
        }
    }

    #[test]
    fn label_markers_apply_when_id_is_not_numeric() {
        let traits = SegmentTraits::derive("enterprise-core", "大企業・高価値");
        assert!(traits.is_enterprise);
        assert!(traits.is_high_value);

        let traits = SegmentTraits::derive("x", "SMB low spenders");
        assert!(!traits.is_enterprise);
        assert!(!traits.is_high_value);

        assert!(SegmentTraits::from_id("s").is_none());
        assert!(SegmentTraits::from_id("s1a").is_none());
    }

    #[test]
    fn catalog_types_cover_every_quadrant() {
        let types: Vec<SegmentType> = SegmentCatalog::standard()
            .iter()
            .map(Segment::segment_type)
            .collect();
        assert_eq!(
            types,
            vec![
                SegmentType::HighValueLowBarrier,
                SegmentType::LowValueLowBarrier,
                SegmentType::HighValueHighBarrier,
                SegmentType::LowValueHighBarrier,
            ]
        );
    }

    #[test]
    fn enrich_keeps_traits_and_dedupes() {
        let segment = SegmentCatalog::standard().remove(0);
        let traits = segment.traits();
        let enriched = segment.enrich(SegmentEnrichment {
            industry_categories: vec!["製造業".into(), "製造業".into(), " ".into()],
            example_companies: vec!["トヨタ自動車".into()],
            bant: Some(Bant {
                need: vec!["業務効率化".into()],
                ..Bant::default()
            }),
        });
        assert_eq!(enriched.traits(), traits);
        assert_eq!(enriched.industry_categories, vec!["製造業".to_string()]);
        assert_eq!(enriched.example_companies.len(), 1);
        assert_eq!(enriched.bant.need, vec!["業務効率化".to_string()]);
    }

    #[test]
    fn lenient_rating_defaults_to_low() {
        assert_eq!(Rating::parse_lenient("High"), Rating::High);
        assert_eq!(Rating::parse_lenient("高"), Rating::High);
        assert_eq!(Rating::parse_lenient("medium"), Rating::Low);
    }
}
