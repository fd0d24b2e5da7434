//! Conversion of `<ref>`/`<point>` tagged pointing data into annotation samples.
//!
//! Source items look like
//! `{"image": "a.jpg", "conversations": [{"value": "Point at the <ref>cup</ref>"},
//! {"value": "<ref>cup</ref> <point>[[100, 200], [300, 400]]</point>"}]}`.

use crate::{common::*, AnnotationRecord, Region, Sample};

pub const DEFAULT_LABEL: &str = "object";

static REF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<ref>(.*?)</ref>").expect("invalid ref pattern"));
static POINT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<point>(.*?)</point>").expect("invalid point pattern"));
static ABSENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)absent|\bnot\b").expect("invalid absence pattern"));

/// Why an item was left out of the converted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    IncompleteConversation,
    ObjectAbsent,
    NoPoints,
    Malformed(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteConversation => f.write_str("incomplete conversation"),
            Self::ObjectAbsent => f.write_str("object absent"),
            Self::NoPoints => f.write_str("no points found"),
            Self::Malformed(msg) => write!(f, "malformed: {}", msg),
        }
    }
}

/// The standard question asked for a pointing sample.
pub fn prompt_for(label: &str) -> String {
    format!(
        "<image>\nLocate all {} in this image and return points in JSON format.",
        label
    )
}

/// Extracts the text between `<ref>` tags, trimmed.
pub fn extract_label(text: &str) -> Option<&str> {
    REF_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Extracts `[[x, y], ...]` from `<point>` tags.
///
/// Float coordinates are rounded half to even, so `300.5` becomes `300`.
/// Entries that are not a pair of non-negative numbers are dropped with a warning.
pub fn extract_points(text: &str) -> Result<Vec<[u32; 2]>, Skip> {
    let inner = match POINT_REGEX.captures(text).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str(),
        None => return Ok(vec![]),
    };
    let items: Vec<Value> =
        serde_json::from_str(inner.trim()).map_err(|err| Skip::Malformed(err.to_string()))?;

    let points = items
        .iter()
        .filter_map(|item| {
            let point = item.as_array().and_then(|pair| match pair.as_slice() {
                [x, y] => Some([x.as_f64()?, y.as_f64()?]),
                _ => None,
            });
            match point {
                Some([x, y]) if x >= 0.0 && y >= 0.0 => Some([
                    rounding::round_f64(x.round_ties_even(), u32::MAX),
                    rounding::round_f64(y.round_ties_even(), u32::MAX),
                ]),
                _ => {
                    warn!("skipping invalid point {}", item);
                    None
                }
            }
        })
        .collect();
    Ok(points)
}

/// Converts one pointing item into a sample whose regions are in `system` units.
pub fn convert_item(item: &Value, system: CoordinateSystem) -> Result<Sample, Skip> {
    let turns = item
        .get("conversations")
        .and_then(Value::as_array)
        .filter(|turns| turns.len() >= 2)
        .ok_or(Skip::IncompleteConversation)?;
    let text_of = |turn: &Value| {
        turn.get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let question = text_of(&turns[0]);
    let answer = text_of(&turns[1]);

    let label = extract_label(&question)
        .or_else(|| extract_label(&answer))
        .unwrap_or(DEFAULT_LABEL)
        .to_string();

    if ABSENT_REGEX.is_match(&answer) {
        return Err(Skip::ObjectAbsent);
    }

    let points = extract_points(&answer)?;
    if points.is_empty() {
        return Err(Skip::NoPoints);
    }

    let regions = points
        .into_iter()
        .map(|xy| Region::point(xy, system, label.as_str()))
        .collect::<Result<Vec<_>>>()
        .map_err(|err| Skip::Malformed(err.to_string()))?;

    let image = item
        .get("image")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let record = AnnotationRecord::new(image, regions).with_prompt(prompt_for(&label));
    Sample::from_record(&record).map_err(|err| Skip::Malformed(err.to_string()))
}

/// The result of converting a batch of items.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub samples: Vec<Sample>,
    /// Skipped source items with the reason.
    pub skipped: Vec<(Value, Skip)>,
}

/// Converts all items, collecting skipped ones instead of failing.
pub fn convert_items(items: &[Value], system: CoordinateSystem) -> Conversion {
    let mut conversion = Conversion::default();
    for item in items {
        match convert_item(item, system) {
            Ok(sample) => conversion.samples.push(sample),
            Err(skip) => {
                let id = item.get("id").map(|id| id.to_string());
                info!(
                    "skipping item {}: {}",
                    id.as_deref().unwrap_or("unknown"),
                    skip
                );
                conversion.skipped.push((item.clone(), skip));
            }
        }
    }
    conversion
}
