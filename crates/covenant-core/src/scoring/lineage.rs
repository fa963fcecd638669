//! Insight lineage enforcement.
//!
//! Every key insight must trace back to evidence. An insight whose
//! evidence field (`data`, or the legacy `evidence`) is missing or blank is
//! orphaned. Non-object entries are orphaned too.

use serde::Serialize;
use serde_json::Value;

use crate::contract::PipelineConfig;
use crate::gates::signals;
use crate::tree;
use crate::types::DocumentShape;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedInsight {
    pub index: usize,
    pub title: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineageReport {
    pub valid: bool,
    pub orphaned_insights: Vec<OrphanedInsight>,
    pub total_insights: usize,
    pub insights_with_data: usize,
    /// Unrounded percentage of insights backed by evidence; 0 when there are none
    pub source_coverage: f64,
}

pub struct LineageEnforcer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> LineageEnforcer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Where the insight list lives for this document's shape.
    pub fn insights_path(&self, document: &Value) -> &'static str {
        match self.config.shape_of(document) {
            DocumentShape::SingleEntity => "keyInsights",
            DocumentShape::MultiEntity => "summary.keyInsights",
        }
    }

    pub fn enforce(&self, document: &Value) -> LineageReport {
        let path = self.insights_path(document);
        let list = path
            .split('.')
            .try_fold(document, |node, key| node.get(key))
            .and_then(Value::as_array);

        let mut orphaned = Vec::new();
        let mut with_data = 0;
        let items = list.map(Vec::as_slice).unwrap_or_default();

        for (index, item) in items.iter().enumerate() {
            match item.as_object() {
                Some(insight) if signals::insight_has_data(insight) => with_data += 1,
                other => orphaned.push(OrphanedInsight {
                    index,
                    title: other
                        .and_then(|i| i.get("title"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    path: tree::index(path, index),
                }),
            }
        }

        let total = items.len();
        let source_coverage = if total == 0 {
            0.0
        } else {
            with_data as f64 / total as f64 * 100.0
        };

        if !orphaned.is_empty() {
            tracing::warn!(
                orphaned = orphaned.len(),
                total,
                "Insights without supporting evidence"
            );
        }

        LineageReport {
            valid: orphaned.is_empty(),
            orphaned_insights: orphaned,
            total_insights: total,
            insights_with_data: with_data,
            source_coverage,
        }
    }
}
