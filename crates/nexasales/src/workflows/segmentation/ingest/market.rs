use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_object, looks_like_json, number};

/// Growth figures pulled from the market data text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    pub market_growth_rate: Option<f64>,
    pub segment_growth_rates: BTreeMap<String, f64>,
    /// Set when the text could not be read at all.
    #[serde(skip)]
    pub degraded: bool,
}

impl MarketSignals {
    /// Segment override, then the market-wide rate, then `fallback`, then 0.
    pub fn growth_for(&self, segment_id: &str, fallback: Option<f64>) -> f64 {
        self.segment_growth_rates
            .get(segment_id)
            .copied()
            .or(self.market_growth_rate)
            .or(fallback)
            .unwrap_or(0.0)
    }
}

pub fn parse_market_data(text: &str) -> MarketSignals {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return MarketSignals::default();
    }

    if looks_like_json(trimmed) {
        return match json_object(trimmed) {
            Some(object) => {
                let market_growth_rate = object
                    .get("market_growth_rate")
                    .or_else(|| object.get("growth_rate"))
                    .and_then(number)
                    .filter(|rate| *rate >= 0.0);
                let segment_growth_rates = match object.get("segments") {
                    Some(Value::Object(segments)) => segments
                        .iter()
                        .filter_map(|(id, segment)| {
                            let rate = segment.get("growth_rate").and_then(number)?;
                            (rate >= 0.0).then(|| (id.clone(), rate))
                        })
                        .collect(),
                    _ => BTreeMap::new(),
                };
                MarketSignals {
                    market_growth_rate,
                    segment_growth_rates,
                    degraded: false,
                }
            }
            None => MarketSignals {
                degraded: true,
                ..MarketSignals::default()
            },
        };
    }

    let market_growth_rate = trimmed
        .lines()
        .filter(|line| line.contains("成長率") || line.to_lowercase().contains("growth"))
        .find_map(first_percentage);

    MarketSignals {
        market_growth_rate,
        segment_growth_rates: BTreeMap::new(),
        degraded: false,
    }
}

/// Finds the first `<number>%` (or full-width `％`) in a line, as a fraction.
fn first_percentage(line: &str) -> Option<f64> {
    let chars: Vec<char> = line.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        if !chars[index].is_ascii_digit() {
            index += 1;
            continue;
        }
        let start = index;
        while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.') {
            index += 1;
        }
        let digits: String = chars[start..index].iter().collect();
        let mut cursor = index;
        while cursor < chars.len() && chars[cursor].is_whitespace() {
            cursor += 1;
        }
        if matches!(chars.get(cursor), Some('%') | Some('％')) {
            if let Ok(value) = digits.trim_end_matches('.').parse::<f64>() {
                return Some(value / 100.0);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_growth_from_prose() {
        let signals = parse_market_data(
            "市場規模: 2024年に1兆円\n年間成長率は約12.5%と予測される\n競合は5社",
        );
        assert_eq!(signals.market_growth_rate, Some(0.125));
        assert_eq!(signals.growth_for("s1", None), 0.125);
    }

    #[test]
    fn ignores_percentages_on_unrelated_lines() {
        let signals = parse_market_data("シェア 30%\nMarket growth: steady at 8 %");
        assert_eq!(signals.market_growth_rate, Some(0.08));
    }

    #[test]
    fn json_segment_rates_override_market_rate() {
        let signals = parse_market_data(
            r#"{"market_growth_rate": 0.15, "segments": {"s3": {"growth_rate": 0.2}}}"#,
        );
        assert_eq!(signals.growth_for("s3", None), 0.2);
        assert_eq!(signals.growth_for("s1", Some(0.05)), 0.15);
    }

    #[test]
    fn falls_back_to_configured_rate_then_zero() {
        let signals = parse_market_data("no figures here");
        assert!(!signals.degraded);
        assert_eq!(signals.growth_for("s1", Some(0.07)), 0.07);
        assert_eq!(signals.growth_for("s1", None), 0.0);

        let broken = parse_market_data("{\"market_growth_rate\": ");
        assert!(broken.degraded);
    }
}
