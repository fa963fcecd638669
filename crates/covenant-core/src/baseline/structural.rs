//! Structural snapshots and structural drift.
//!
//! A snapshot is captured from a template description (canvas size,
//! element geometry, font and color palette, layout patterns) plus the
//! document under test (headings and section layout). Comparison splits
//! differences into strict violations and tolerated drift:
//!
//! | Change | Classification |
//! |--------|----------------|
//! | canvas size, layout id, font or color value | strict |
//! | geometry delta ≤ tolerance | tolerated |
//! | geometry delta > tolerance | strict |
//! | heading, section, element or pattern removed | strict |
//! | heading, section, element or pattern added | tolerated |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::contract::{DriftThresholds, PipelineConfig};
use crate::tree;
use crate::types::Verdict;

/// Slack for float error when a delta sits exactly on the tolerance.
const GEOMETRY_EPSILON: f64 = 1e-9;

pub const CATEGORY_SLIDE_DIMENSIONS: &str = "slide-dimensions";
pub const CATEGORY_GEOMETRY: &str = "geometry";
pub const CATEGORY_ELEMENT: &str = "element";
pub const CATEGORY_FONT: &str = "font";
pub const CATEGORY_COLOR: &str = "color";
pub const CATEGORY_HEADING: &str = "heading";
pub const CATEGORY_SLIDE_COUNT: &str = "slide-count";
pub const CATEGORY_SECTION: &str = "section";
pub const CATEGORY_PATTERN: &str = "pattern";
pub const CATEGORY_LAYOUT_ID: &str = "layout-id";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlideDimensions {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
}

impl Geometry {
    fn from_value(value: &Value) -> Self {
        let num = |keys: [&str; 2]| keys.iter().find_map(|k| value.get(*k).and_then(Value::as_f64));
        Self {
            x: num(["x", "left"]),
            y: num(["y", "top"]),
            w: num(["w", "width"]),
            h: num(["h", "height"]),
        }
    }

    fn fields(&self) -> [(&'static str, Option<f64>); 4] {
        [("x", self.x), ("y", self.y), ("w", self.w), ("h", self.h)]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextInvariants {
    pub headings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub present: bool,
    pub sub_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePattern {
    pub id: Value,
    pub layout_id: Value,
    pub slide_ids: Vec<Value>,
    pub element_keys: Vec<String>,
}

/// Structural properties of one rendering setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuralSnapshot {
    pub slide_dimensions: SlideDimensions,
    pub geometry_invariants: BTreeMap<String, Geometry>,
    pub text_invariants: TextInvariants,
    pub font_specifications: BTreeMap<String, Value>,
    pub color_specifications: BTreeMap<String, Value>,
    pub section_structure: BTreeMap<String, SectionLayout>,
    pub template_structure: BTreeMap<String, TemplatePattern>,
}

/// Derives snapshots from a template description and a document.
pub struct StructuralCapture<'a> {
    config: &'a PipelineConfig,
}

impl<'a> StructuralCapture<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn capture(&self, template: &Value, document: &Value) -> StructuralSnapshot {
        let mut geometry = BTreeMap::new();
        for (name, value) in named_entries(template.get("elements")) {
            geometry.insert(name, Geometry::from_value(value));
        }

        let mut patterns = BTreeMap::new();
        for (key, pattern) in named_entries(template.get("patterns")) {
            let mut element_keys = Vec::new();
            for (name, value) in named_entries(pattern.get("elements")) {
                geometry.insert(format!("{}.{}", key, name), Geometry::from_value(value));
                element_keys.push(name);
            }
            element_keys.sort();
            patterns.insert(
                key.clone(),
                TemplatePattern {
                    id: pattern.get("id").cloned().unwrap_or(Value::String(key)),
                    layout_id: pattern.get("layoutId").cloned().unwrap_or(Value::Null),
                    slide_ids: pattern
                        .get("slideIds")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default(),
                    element_keys,
                },
            );
        }

        let snapshot = StructuralSnapshot {
            slide_dimensions: dimensions(template),
            geometry_invariants: geometry,
            text_invariants: TextInvariants {
                headings: self.headings(template, document),
                slide_count: template.get("slideCount").and_then(Value::as_u64),
            },
            font_specifications: palette(template, "fonts"),
            color_specifications: palette(template, "colors"),
            section_structure: self.sections(document),
            template_structure: patterns,
        };

        tracing::debug!(
            elements = snapshot.geometry_invariants.len(),
            patterns = snapshot.template_structure.len(),
            sections = snapshot.section_structure.len(),
            "Structural snapshot captured"
        );
        snapshot
    }

    /// Template headings plus `title`/`heading` strings directly under each
    /// top-level section of the document.
    fn headings(&self, template: &Value, document: &Value) -> Vec<String> {
        let mut out = BTreeSet::new();
        if let Some(list) = template.get("headings").and_then(Value::as_array) {
            out.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
        }
        if let Some(root) = document.as_object() {
            for section in root.values().filter_map(Value::as_object) {
                for key in ["title", "heading"] {
                    if let Some(text) = section.get(key).and_then(Value::as_str) {
                        out.insert(text.to_string());
                    }
                }
            }
        }
        out.into_iter().collect()
    }

    /// Presence and sub-keys for every declared section of the document's
    /// shape, plus any other top-level object section.
    fn sections(&self, document: &Value) -> BTreeMap<String, SectionLayout> {
        let empty = Map::new();
        let root = document.as_object().unwrap_or(&empty);
        let schema = self.config.schema_for(self.config.shape_of(document));

        let layout = |value: Option<&Value>| match value {
            Some(Value::Object(map)) => {
                let mut sub_keys: Vec<String> = map.keys().cloned().collect();
                sub_keys.sort();
                SectionLayout {
                    present: true,
                    sub_keys,
                }
            }
            Some(Value::Null) | None => SectionLayout::default(),
            Some(_) => SectionLayout {
                present: true,
                sub_keys: Vec::new(),
            },
        };

        let mut out = BTreeMap::new();
        for name in schema.section_names() {
            out.insert(name.to_string(), layout(root.get(name)));
        }
        for (key, value) in root {
            if value.is_object()
                && !out.contains_key(key)
                && !self.config.is_meta_key(key)
                && !self.config.is_internal_key(key)
            {
                out.insert(key.clone(), layout(Some(value)));
            }
        }
        out
    }
}

/// `(name, value)` pairs from an object keyed by name, or from an array of
/// objects carrying `name` or `id`.
fn named_entries(value: Option<&Value>) -> Vec<(String, &Value)> {
    match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let name = ["name", "id"]
                    .iter()
                    .find_map(|k| match item.get(*k) {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| i.to_string());
                (name, item)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn dimensions(template: &Value) -> SlideDimensions {
    let nested = template.get("slideDimensions").or_else(|| template.get("slide"));
    let read = |nested_key: &str, flat_key: &str| {
        nested
            .and_then(|d| d.get(nested_key))
            .and_then(Value::as_f64)
            .or_else(|| template.get(flat_key).and_then(Value::as_f64))
    };
    SlideDimensions {
        width: read("width", "slideWidth"),
        height: read("height", "slideHeight"),
    }
}

fn palette(template: &Value, key: &str) -> BTreeMap<String, Value> {
    match template.get(key) {
        Some(value @ Value::Object(_)) => tree::flatten_leaves(value, |_, v| !v.is_null()),
        _ => BTreeMap::new(),
    }
}

/// One structural difference.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriftItem {
    pub category: String,
    pub path: String,
    pub baseline: Value,
    pub current: Value,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuralDriftReport {
    pub baseline_found: bool,
    pub strict_violations: Vec<DriftItem>,
    pub tolerated_drift: Vec<DriftItem>,
    pub total_drift_items: usize,
    pub verdict: Verdict,
}

impl StructuralDriftReport {
    /// Report for a comparison whose baseline does not exist.
    pub fn missing() -> Self {
        Self {
            baseline_found: false,
            strict_violations: Vec::new(),
            tolerated_drift: Vec::new(),
            total_drift_items: 0,
            verdict: Verdict::Pass,
        }
    }
}

#[derive(Default)]
struct Collector {
    strict: Vec<DriftItem>,
    tolerated: Vec<DriftItem>,
}

impl Collector {
    fn push(&mut self, strict: bool, category: &str, path: &str, baseline: Value, current: Value, message: String) {
        let item = DriftItem {
            category: category.to_string(),
            path: path.to_string(),
            baseline,
            current,
            message,
        };
        if strict {
            self.strict.push(item);
        } else {
            self.tolerated.push(item);
        }
    }

    /// Keyed comparison: removals strict, additions tolerated, changed
    /// values compared by `changed`.
    fn keyed<T, F>(&mut self, category: &str, before: &BTreeMap<String, T>, after: &BTreeMap<String, T>, mut changed: F)
    where
        T: Serialize,
        F: FnMut(&mut Self, &str, &T, &T),
    {
        for (key, old) in before {
            match after.get(key) {
                Some(new) => changed(self, key.as_str(), old, new),
                None => self.push(
                    true,
                    category,
                    key,
                    to_value(old),
                    Value::Null,
                    format!("{} '{}' was removed", category, key),
                ),
            }
        }
        for (key, new) in after {
            if !before.contains_key(key) {
                self.push(
                    false,
                    category,
                    key,
                    Value::Null,
                    to_value(new),
                    format!("{} '{}' was added", category, key),
                );
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn opt_num(x: Option<f64>) -> Value {
    x.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Compare a current snapshot against its baseline.
pub fn compare(
    baseline: &StructuralSnapshot,
    current: &StructuralSnapshot,
    thresholds: &DriftThresholds,
) -> StructuralDriftReport {
    let mut c = Collector::default();

    for (axis, old, new) in [
        ("width", baseline.slide_dimensions.width, current.slide_dimensions.width),
        ("height", baseline.slide_dimensions.height, current.slide_dimensions.height),
    ] {
        if old != new {
            c.push(
                true,
                CATEGORY_SLIDE_DIMENSIONS,
                &tree::join("slideDimensions", axis),
                opt_num(old),
                opt_num(new),
                format!("Slide {} changed from {:?} to {:?}", axis, old, new),
            );
        }
    }

    let tolerance = thresholds.geometry_tolerance;
    c.keyed(
        CATEGORY_ELEMENT,
        &baseline.geometry_invariants,
        &current.geometry_invariants,
        |c, name, old, new| {
            for ((field, a), (_, b)) in old.fields().into_iter().zip(new.fields()) {
                let path = tree::join(name, field);
                match (a, b) {
                    (Some(a), Some(b)) if a != b => {
                        let delta = (b - a).abs();
                        c.push(
                            delta > tolerance + GEOMETRY_EPSILON,
                            CATEGORY_GEOMETRY,
                            &path,
                            opt_num(Some(a)),
                            opt_num(Some(b)),
                            format!("{} moved by {:.4} (tolerance {})", path, delta, tolerance),
                        );
                    }
                    (Some(a), None) => c.push(
                        true,
                        CATEGORY_GEOMETRY,
                        &path,
                        opt_num(Some(a)),
                        Value::Null,
                        format!("{} is no longer specified", path),
                    ),
                    (None, Some(b)) => c.push(
                        false,
                        CATEGORY_GEOMETRY,
                        &path,
                        Value::Null,
                        opt_num(Some(b)),
                        format!("{} is newly specified", path),
                    ),
                    _ => {}
                }
            }
        },
    );

    for (category, before, after) in [
        (CATEGORY_FONT, &baseline.font_specifications, &current.font_specifications),
        (CATEGORY_COLOR, &baseline.color_specifications, &current.color_specifications),
    ] {
        c.keyed(category, before, after, |c, key, old, new| {
            if old != new {
                c.push(
                    true,
                    category,
                    key,
                    old.clone(),
                    new.clone(),
                    format!("{} '{}' changed from {} to {}", category, key, old, new),
                );
            }
        });
    }

    let heading_set = |list: &[String]| -> BTreeMap<String, bool> {
        list.iter().map(|h| (h.clone(), true)).collect()
    };
    c.keyed(
        CATEGORY_HEADING,
        &heading_set(&baseline.text_invariants.headings),
        &heading_set(&current.text_invariants.headings),
        |_, _, _, _| {},
    );

    if let (Some(old), Some(new)) = (baseline.text_invariants.slide_count, current.text_invariants.slide_count) {
        if old != new {
            c.push(
                new < old,
                CATEGORY_SLIDE_COUNT,
                "textInvariants.slideCount",
                Value::from(old),
                Value::from(new),
                format!("Slide count changed from {} to {}", old, new),
            );
        }
    }

    let present_sections = |map: &BTreeMap<String, SectionLayout>| -> BTreeMap<String, SectionLayout> {
        map.iter()
            .filter(|(_, s)| s.present)
            .map(|(k, s)| (k.clone(), s.clone()))
            .collect()
    };
    c.keyed(
        CATEGORY_SECTION,
        &present_sections(&baseline.section_structure),
        &present_sections(&current.section_structure),
        |c, name, old, new| {
            let removed: Vec<&String> = old.sub_keys.iter().filter(|k| !new.sub_keys.contains(k)).collect();
            let added: Vec<&String> = new.sub_keys.iter().filter(|k| !old.sub_keys.contains(k)).collect();
            for key in removed {
                c.push(
                    true,
                    CATEGORY_SECTION,
                    &tree::join(name, key),
                    Value::String(key.clone()),
                    Value::Null,
                    format!("Sub-key '{}' was removed from section '{}'", key, name),
                );
            }
            for key in added {
                c.push(
                    false,
                    CATEGORY_SECTION,
                    &tree::join(name, key),
                    Value::Null,
                    Value::String(key.clone()),
                    format!("Sub-key '{}' was added to section '{}'", key, name),
                );
            }
        },
    );

    c.keyed(
        CATEGORY_PATTERN,
        &baseline.template_structure,
        &current.template_structure,
        |c, name, old, new| {
            if old.layout_id != new.layout_id {
                c.push(
                    true,
                    CATEGORY_LAYOUT_ID,
                    &tree::join(name, "layoutId"),
                    old.layout_id.clone(),
                    new.layout_id.clone(),
                    format!("Pattern '{}' layout changed", name),
                );
            }
            if old.slide_ids != new.slide_ids {
                c.push(
                    false,
                    CATEGORY_PATTERN,
                    &tree::join(name, "slideIds"),
                    Value::Array(old.slide_ids.clone()),
                    Value::Array(new.slide_ids.clone()),
                    format!("Pattern '{}' is backed by different slides", name),
                );
            }
            for key in old.element_keys.iter().filter(|k| !new.element_keys.contains(k)) {
                c.push(
                    true,
                    CATEGORY_PATTERN,
                    &tree::join(name, key),
                    Value::String(key.clone()),
                    Value::Null,
                    format!("Pattern '{}' lost element '{}'", name, key),
                );
            }
            for key in new.element_keys.iter().filter(|k| !old.element_keys.contains(k)) {
                c.push(
                    false,
                    CATEGORY_PATTERN,
                    &tree::join(name, key),
                    Value::Null,
                    Value::String(key.clone()),
                    format!("Pattern '{}' gained element '{}'", name, key),
                );
            }
        },
    );

    let verdict = Verdict::from_counts(c.strict.len(), c.tolerated.len());
    StructuralDriftReport {
        baseline_found: true,
        total_drift_items: c.strict.len() + c.tolerated.len(),
        strict_violations: c.strict,
        tolerated_drift: c.tolerated,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Value {
        json!({
            "slideWidth": 13.3333,
            "slideHeight": 7.5,
            "slideCount": 12,
            "headings": ["Market Overview"],
            "elements": {
                "title": { "x": 0.5, "y": 0.3, "w": 12.3, "h": 0.8 },
                "body": { "x": 0.5, "y": 1.3, "w": 12.3, "h": 5.5 }
            },
            "patterns": [
                {
                    "id": "chart-left",
                    "layoutId": 4,
                    "slideIds": [3, 7],
                    "elements": [ { "name": "chart", "x": 0.5, "y": 1.4, "w": 6.0, "h": 4.5 } ]
                }
            ],
            "fonts": { "title": { "family": "Segoe UI", "size": 24 }, "body": { "family": "Segoe UI", "size": 12 } },
            "colors": { "primary": "#1F4E79", "accent": "#F2A900" }
        })
    }

    fn document() -> Value {
        json!({
            "policy": { "title": "Regulatory Landscape", "foundationalActs": [] },
            "market": { "marketSize": "USD 1bn" },
            "summary": { "overview": ["x"] },
            "appendix": { "notes": "extra" }
        })
    }

    fn snapshot(template: &Value, document: &Value) -> StructuralSnapshot {
        let config = PipelineConfig::default();
        StructuralCapture::new(&config).capture(template, document)
    }

    fn drift(current_template: Value) -> StructuralDriftReport {
        let baseline = snapshot(&template(), &document());
        let current = snapshot(&current_template, &document());
        compare(&baseline, &current, &DriftThresholds::default())
    }

    #[test]
    fn test_capture() {
        let snap = snapshot(&template(), &document());
        assert_eq!(snap.slide_dimensions.width, Some(13.3333));
        assert_eq!(snap.geometry_invariants.len(), 3);
        assert_eq!(snap.geometry_invariants["chart-left.chart"].w, Some(6.0));
        assert_eq!(snap.font_specifications["title.family"], json!("Segoe UI"));
        assert_eq!(snap.color_specifications.len(), 2);
        assert_eq!(snap.text_invariants.headings, vec!["Market Overview", "Regulatory Landscape"]);
        assert_eq!(snap.text_invariants.slide_count, Some(12));

        assert!(snap.section_structure["policy"].present);
        assert_eq!(snap.section_structure["policy"].sub_keys, vec!["foundationalActs", "title"]);
        assert!(!snap.section_structure["competitors"].present);
        assert!(snap.section_structure.contains_key("appendix"));

        let pattern = &snap.template_structure["chart-left"];
        assert_eq!(pattern.layout_id, json!(4));
        assert_eq!(pattern.element_keys, vec!["chart"]);
    }

    #[test]
    fn test_identical_snapshots_pass() {
        let report = drift(template());
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.total_drift_items, 0);
    }

    #[test]
    fn test_slide_width_change_is_strict() {
        let mut current = template();
        current["slideWidth"] = json!(13.0);
        let report = drift(current);
        assert_eq!(report.strict_violations.len(), 1);
        assert_eq!(report.strict_violations[0].category, CATEGORY_SLIDE_DIMENSIONS);
        assert!(report.tolerated_drift.is_empty());
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn test_new_font_leaf_is_tolerated() {
        let mut current = template();
        current["fonts"]["caption"] = json!({ "family": "Segoe UI" });
        let report = drift(current);
        assert!(report.strict_violations.is_empty());
        assert_eq!(report.tolerated_drift.len(), 1);
        assert_eq!(report.verdict, Verdict::Warn);
    }

    #[test]
    fn test_geometry_tolerance() {
        let mut current = template();
        current["elements"]["title"]["x"] = json!(0.53);
        current["elements"]["body"]["y"] = json!(1.5);
        let report = drift(current);
        assert_eq!(report.tolerated_drift.len(), 1);
        assert_eq!(report.tolerated_drift[0].path, "title.x");
        assert_eq!(report.strict_violations.len(), 1);
        assert_eq!(report.strict_violations[0].path, "body.y");
    }

    #[test]
    fn test_geometry_delta_equal_to_tolerance_is_tolerated() {
        let mut current = template();
        current["elements"]["title"]["x"] = json!(0.55);
        current["elements"]["body"]["h"] = json!(5.45);
        let report = drift(current);
        assert!(report.strict_violations.is_empty());
        assert_eq!(report.tolerated_drift.len(), 2);
        assert_eq!(report.verdict, Verdict::Warn);

        let mut current = template();
        current["elements"]["title"]["x"] = json!(0.5501);
        let report = drift(current);
        assert_eq!(report.strict_violations.len(), 1);
        assert_eq!(report.strict_violations[0].path, "title.x");
    }

    #[test]
    fn test_removals_strict_additions_tolerated() {
        let mut current = template();
        current["elements"].as_object_mut().unwrap().remove("body");
        current["elements"]["footer"] = json!({ "x": 0.5, "y": 7.0, "w": 12.3, "h": 0.3 });
        current["colors"]["primary"] = json!("#000000");
        current["patterns"][0]["layoutId"] = json!(5);
        current["patterns"][0]["slideIds"] = json!([3, 8]);

        let report = drift(current);
        let strict: Vec<(&str, &str)> = report
            .strict_violations
            .iter()
            .map(|d| (d.category.as_str(), d.path.as_str()))
            .collect();
        assert!(strict.contains(&(CATEGORY_ELEMENT, "body")));
        assert!(strict.contains(&(CATEGORY_COLOR, "primary")));
        assert!(strict.contains(&(CATEGORY_LAYOUT_ID, "chart-left.layoutId")));
        assert_eq!(report.strict_violations.len(), 3);

        let tolerated: Vec<&str> = report.tolerated_drift.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(tolerated, vec!["footer", "chart-left.slideIds"]);
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn test_section_shrink_is_strict() {
        let baseline = snapshot(&template(), &document());
        let mut shrunk = document();
        shrunk.as_object_mut().unwrap().remove("market");
        shrunk["summary"]["keyInsights"] = json!([]);
        let current = snapshot(&template(), &shrunk);

        let report = compare(&baseline, &current, &DriftThresholds::default());
        assert!(report
            .strict_violations
            .iter()
            .any(|d| d.category == CATEGORY_SECTION && d.path == "market"));
        assert!(report
            .tolerated_drift
            .iter()
            .any(|d| d.path == "summary.keyInsights"));
    }

    #[test]
    fn test_snapshot_serializes_to_baseline_shape() {
        let value = serde_json::to_value(snapshot(&template(), &document())).unwrap();
        for key in [
            "slideDimensions",
            "geometryInvariants",
            "textInvariants",
            "fontSpecifications",
            "colorSpecifications",
            "sectionStructure",
            "templateStructure",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        let back: StructuralSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back.geometry_invariants.len(), 3);
    }
}
