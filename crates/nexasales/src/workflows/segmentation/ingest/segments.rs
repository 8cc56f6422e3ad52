use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::{json_value, looks_like_json, number, string_list};
use crate::workflows::segmentation::domain::{Rating, Segment, SegmentTraits};

/// Reads segments from JSON (`{"segments": [...]}` or a bare array) or from
/// the `### セグメント:` listing. Returns an empty list when nothing parses.
///
/// Ids are unique in the result. The first draft claiming an `sN` id keeps it;
/// drafts with a duplicate or non-`sN` id get the lowest free `sN`.
pub fn extract_segments(text: &str) -> Vec<Segment> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut drafts = if looks_like_json(trimmed) {
        json_drafts(trimmed)
    } else {
        listing_drafts(trimmed)
    };
    drafts.retain(|draft| !draft.name.trim().is_empty());

    let mut taken = BTreeSet::new();
    let claims: Vec<bool> = drafts
        .iter()
        .map(|draft| {
            let id = draft.id.trim();
            SegmentTraits::from_id(id).is_some() && taken.insert(id.to_string())
        })
        .collect();

    let mut next = 1;
    drafts
        .into_iter()
        .zip(claims)
        .map(|(draft, claimed)| {
            if claimed {
                return draft.into_segment(None);
            }
            while taken.contains(&format!("s{next}")) {
                next += 1;
            }
            let id = format!("s{next}");
            taken.insert(id.clone());
            draft.into_segment(Some(id))
        })
        .collect()
}

#[derive(Default)]
struct SegmentDraft {
    id: String,
    name: String,
    description: String,
    value_potential: String,
    implementation_ease: String,
    characteristics: Vec<String>,
    market_size: Option<u64>,
    acquisition_probability: Option<f64>,
}

impl SegmentDraft {
    /// `renumbered` replaces the draft's own id.
    fn into_segment(self, renumbered: Option<String>) -> Segment {
        let relabel = renumbered.is_some();
        let id = renumbered.unwrap_or_else(|| self.id.trim().to_string());

        let mut segment = Segment::new(
            id,
            self.name.trim(),
            Rating::parse_lenient(&self.value_potential),
            Rating::parse_lenient(&self.implementation_ease),
        )
        .with_description(self.description.trim())
        .with_characteristics(self.characteristics);
        if relabel {
            // A positional id says nothing about the segment; read the label instead.
            let traits = SegmentTraits::from_label(&segment.name);
            segment = segment.with_traits(traits);
        }
        segment.market_size_hint = self.market_size;
        segment.acquisition_probability_hint = self
            .acquisition_probability
            .filter(|rate| (0.0..=1.0).contains(rate));
        segment
    }
}

fn json_drafts(text: &str) -> Vec<SegmentDraft> {
    let items = match json_value(text) {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut object)) => match object.remove("segments") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| SegmentDraft {
            id: read(object, &["segment_id", "id"]),
            name: read(object, &["name", "segment_name"]),
            description: read(object, &["description"]),
            value_potential: read(object, &["value_potential"]),
            implementation_ease: read(object, &["implementation_ease"]),
            characteristics: string_list(object.get("characteristics")),
            market_size: object
                .get("market_size")
                .and_then(number)
                .filter(|size| *size >= 0.0)
                .map(|size| size as u64),
            acquisition_probability: object.get("acquisition_probability").and_then(number),
        })
        .collect()
}

fn read(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn field<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    labels.iter().find_map(|label| {
        let rest = line.strip_prefix(label)?.trim_start();
        let rest = rest
            .strip_prefix('：')
            .or_else(|| rest.strip_prefix(':'))?;
        Some(rest.trim())
    })
}

fn listing_drafts(text: &str) -> Vec<SegmentDraft> {
    let mut drafts: Vec<SegmentDraft> = Vec::new();
    let mut in_characteristics = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = line.strip_prefix('#') {
            in_characteristics = false;
            let heading = heading.trim_start_matches('#').trim();
            if let Some(name) = field(heading, &["セグメント", "Segment"]) {
                drafts.push(SegmentDraft {
                    name: name.to_string(),
                    ..SegmentDraft::default()
                });
            }
            continue;
        }

        let Some(draft) = drafts.last_mut() else {
            continue;
        };

        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("・")) {
            if in_characteristics {
                let item = item.trim();
                if !item.is_empty() {
                    draft.characteristics.push(item.to_string());
                }
            }
            continue;
        }

        in_characteristics = false;
        if let Some(id) = field(line, &["セグメントID", "Segment ID"]) {
            draft.id = id.to_string();
        } else if let Some(value) = field(line, &["価値創出ポテンシャル", "Value potential"]) {
            draft.value_potential = value.to_string();
        } else if let Some(value) = field(line, &["実現容易性", "Implementation ease"]) {
            draft.implementation_ease = value.to_string();
        } else if let Some(value) = field(line, &["説明", "Description"]) {
            draft.description = value.to_string();
        } else if let Some(value) = field(line, &["特性", "Characteristics"]) {
            in_characteristics = true;
            draft.characteristics.extend(string_list(Some(&Value::String(value.to_string()))));
        }
    }

    drafts
}
