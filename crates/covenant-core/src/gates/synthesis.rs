//! Synthesis-quality gate.
//!
//! Two scoring variants, selected by document shape. Every section score is
//! 0–100; the overall score is the section mean weighted by
//! `quality_weight` plus an industry-relevance bonus.
//!
//! Multi-entity (pass ≥ 40), each criterion worth 50:
//! - policy: enough foundational acts, enough with name and year
//! - market: enough numeric chart sub-sections, market size populated
//! - competitors: enough named players, long enough descriptions
//! - summary: enough data-backed insights, enough opportunities
//!
//! Single-entity (pass ≥ 60) grades executive summary paragraphs, market
//! opportunity, competitive positioning, key insights and the roadmap,
//! and reports macro-data padding.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::patterns::{self, text_of, MACRO_INDICATOR};
use super::signals;
use super::{Gate, GateOutcome, ERROR_TYPE_EXCEPTION};
use crate::contract::{GateThresholds, PipelineConfig};
use crate::tree;
use crate::types::{DocumentShape, Issue, IssueCode};

const CRITERION_POINTS: f64 = 50.0;
const INSIGHT_BASE_POINTS: f64 = 70.0;
const PENALTY_POINTS: f64 = 10.0;
const MACRO_PADDING_MENTIONS: usize = 2;

/// Single-entity sections where macro-economic figures are incidental.
const MACRO_SCAN_SECTIONS: [&str; 4] = [
    "executiveSummary",
    "competitivePositioning",
    "keyInsights",
    "nextSteps",
];

/// Incidental macro-economic mentions in a single-entity document.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroPadding {
    pub flagged: bool,
    pub mentions: usize,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResult {
    pub pass: bool,
    pub overall: f64,
    pub variant: DocumentShape,
    pub scores: BTreeMap<String, f64>,
    pub industry_relevance: f64,
    pub failures: Vec<Issue>,
    pub warnings: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_padding: Option<MacroPadding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl GateOutcome for SynthesisResult {
    fn passed(&self) -> bool {
        self.pass
    }

    fn exception(message: String) -> Self {
        let mut result = SynthesisResult::rejected(
            DocumentShape::MultiEntity,
            Issue::new(IssueCode::Exception, message),
        );
        result.error_type = Some(ERROR_TYPE_EXCEPTION.to_string());
        result
    }
}

impl SynthesisResult {
    fn rejected(variant: DocumentShape, issue: Issue) -> Self {
        SynthesisResult {
            pass: false,
            overall: 0.0,
            variant,
            scores: BTreeMap::new(),
            industry_relevance: 0.0,
            failures: vec![issue],
            warnings: Vec::new(),
            macro_padding: None,
            error_type: None,
        }
    }
}

#[derive(Default)]
struct Findings {
    failures: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl Findings {
    fn fail(&mut self, code: IssueCode, path: &str, message: String) {
        self.failures.push(Issue::at(code, path, message));
    }

    fn warn(&mut self, code: IssueCode, path: &str, message: String) {
        self.warnings.push(Issue::at(code, path, message));
    }

    /// Award the criterion's points, or record why not.
    fn criterion(&mut self, met: bool, code: IssueCode, path: &str, message: impl FnOnce() -> String) -> f64 {
        if met {
            CRITERION_POINTS
        } else {
            self.fail(code, path, message());
            0.0
        }
    }
}

/// Scores canonical documents for content depth.
pub struct SynthesisGate<'a> {
    config: &'a PipelineConfig,
    industry: Option<String>,
}

impl<'a> SynthesisGate<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            industry: None,
        }
    }

    /// Override the industry term otherwise read from the document.
    pub fn with_industry(mut self, industry: Option<String>) -> Self {
        self.industry = industry.filter(|s| !s.trim().is_empty());
        self
    }

    fn thresholds(&self) -> &GateThresholds {
        &self.config.gates
    }

    /// 3 points per industry mention across the serialized document, capped.
    fn industry_relevance(&self, document: &Value) -> f64 {
        let industry = self
            .industry
            .clone()
            .or_else(|| document.get("industry").and_then(Value::as_str).map(str::to_string));
        let Some(industry) = industry else {
            return 0.0;
        };
        let mentions = patterns::count_mentions(
            &document.to_string(),
            &industry,
            self.config.relevance_matching,
        );
        let t = self.thresholds();
        (mentions as f64 * t.relevance_points_per_match).min(t.relevance_cap)
    }

    fn score_multi(&self, doc: &Map<String, Value>, f: &mut Findings) -> BTreeMap<String, f64> {
        let t = self.thresholds();
        let mut scores = BTreeMap::new();

        let policy = present_section(doc, "policy", f);
        let score = policy.map_or(0.0, |policy| {
            let acts = signals::foundational_acts(Some(policy));
            for (name, year) in &acts.implausible_years {
                f.warn(
                    IssueCode::BoundaryValues,
                    "policy.foundationalActs",
                    format!("Act '{}' has implausible year {}", name, year),
                );
            }
            f.criterion(acts.count >= t.min_acts, IssueCode::InsufficientDepth, "policy.foundationalActs", || {
                format!("Policy lists {} foundational acts, needs {}", acts.count, t.min_acts)
            }) + f.criterion(
                acts.named_with_year >= t.min_acts,
                IssueCode::InsufficientDepth,
                "policy.foundationalActs",
                || {
                    format!(
                        "Only {} foundational acts carry both name and year, needs {}",
                        acts.named_with_year, t.min_acts
                    )
                },
            )
        });
        scores.insert("policy".to_string(), score);

        let market = present_section(doc, "market", f);
        let score = market.map_or(0.0, |market| {
            negative_chart_values("market", market, f);
            let charts = signals::chart_sections(Some(market));
            f.criterion(charts >= t.min_chart_sections, IssueCode::ChartDataIssues, "market", || {
                format!(
                    "Only {} market sub-sections carry numeric chart series, needs {}",
                    charts, t.min_chart_sections
                )
            }) + f.criterion(
                signals::is_populated(market.get("marketSize")),
                IssueCode::EmptyData,
                "market.marketSize",
                || "Market size is not populated".to_string(),
            )
        });
        scores.insert("market".to_string(), score);

        let competitors = present_section(doc, "competitors", f);
        let score = competitors.map_or(0.0, |section| {
            let players = signals::players(Some(section), "players");
            let named = signals::named_count(&players);
            let words = signals::average_description_words(&players);
            f.criterion(named >= t.min_players_multi, IssueCode::InsufficientDepth, "competitors.players", || {
                format!("Only {} named competitors, needs {}", named, t.min_players_multi)
            }) + f.criterion(
                words >= t.competitor_words_multi as f64,
                IssueCode::InsufficientDepth,
                "competitors.players",
                || {
                    format!(
                        "Competitor descriptions average {:.1} words, needs {}",
                        words, t.competitor_words_multi
                    )
                },
            )
        });
        scores.insert("competitors".to_string(), score);

        let summary = present_section(doc, "summary", f);
        let score = summary.map_or(0.0, |summary| {
            let insights = signals::insights(summary.get("keyInsights"));
            let backed = insights.iter().filter(|i| signals::insight_has_data(i)).count();
            let opportunities = signals::list_len(summary.get("opportunities"));
            f.criterion(backed >= t.min_insights, IssueCode::InsufficientDepth, "summary.keyInsights", || {
                format!("Only {} insights are backed by data, needs {}", backed, t.min_insights)
            }) + f.criterion(
                opportunities >= t.min_opportunities,
                IssueCode::InsufficientDepth,
                "summary.opportunities",
                || format!("Only {} opportunities listed, needs {}", opportunities, t.min_opportunities),
            )
        });
        scores.insert("summary".to_string(), score);

        scores
    }

    fn score_single(&self, doc: &Map<String, Value>, f: &mut Findings) -> BTreeMap<String, f64> {
        let t = self.thresholds();
        let mut scores = BTreeMap::new();

        let score = present_section(doc, "executiveSummary", f).map_or(0.0, |summary| {
            let paragraphs = signals::substantial_paragraphs(Some(summary), t.paragraph_words);
            if paragraphs < 3 {
                f.fail(
                    IssueCode::InsufficientDepth,
                    "executiveSummary",
                    format!(
                        "Executive summary has {} paragraphs of {}+ words, needs 3",
                        paragraphs, t.paragraph_words
                    ),
                );
            }
            match paragraphs {
                0 => 0.0,
                1 => 30.0,
                2 => 60.0,
                _ => 100.0,
            }
        });
        scores.insert("executiveSummary".to_string(), score);

        let score = present_section(doc, "marketOpportunityAssessment", f).map_or(0.0, |market| {
            let tam = market.get("totalAddressableMarket").map(text_of).unwrap_or_default();
            let secondary = ["serviceableMarket", "growthTrajectory", "timingConsiderations"]
                .iter()
                .any(|k| signals::is_populated(market.get(*k)));
            f.criterion(
                patterns::DIGIT.is_match(&tam),
                IssueCode::EmptyData,
                "marketOpportunityAssessment.totalAddressableMarket",
                || "Total addressable market carries no figure".to_string(),
            ) + f.criterion(secondary, IssueCode::EmptyData, "marketOpportunityAssessment", || {
                "No serviceable market, growth trajectory or timing is populated".to_string()
            })
        });
        scores.insert("marketOpportunityAssessment".to_string(), score);

        let score = present_section(doc, "competitivePositioning", f).map_or(0.0, |section| {
            let players = signals::players(Some(section), "keyCompetitors");
            let named = signals::named_count(&players);
            let words = signals::average_description_words(&players);
            let mut score = f.criterion(
                named >= t.min_players_single,
                IssueCode::InsufficientDepth,
                "competitivePositioning.keyCompetitors",
                || format!("Only {} named competitors, needs {}", named, t.min_players_single),
            ) + f.criterion(
                words >= t.competitor_words_single as f64,
                IssueCode::InsufficientDepth,
                "competitivePositioning.keyCompetitors",
                || {
                    format!(
                        "Competitor descriptions average {:.1} words, needs {}",
                        words, t.competitor_words_single
                    )
                },
            );
            for player in &players {
                let description = signals::description_of(player);
                if patterns::word_count(description) >= t.long_description_words
                    && !patterns::has_metric(description)
                {
                    score -= PENALTY_POINTS;
                    f.warn(
                        IssueCode::SemanticEmpty,
                        "competitivePositioning.keyCompetitors",
                        format!(
                            "Description of '{}' is long but cites no figure, share or founding year",
                            signals::name_of(player).unwrap_or("unnamed")
                        ),
                    );
                }
            }
            score.max(0.0)
        });
        scores.insert("competitivePositioning".to_string(), score);

        let score = present_section(doc, "keyInsights", f).map_or(0.0, |list| {
            let insights = signals::insights(Some(list));
            let complete = insights.iter().filter(|i| signals::insight_complete(i)).count();
            let mut score = if complete < t.min_insights {
                f.fail(
                    IssueCode::InsufficientDepth,
                    "keyInsights",
                    format!(
                        "Only {} insights carry both data and implication, needs {}",
                        complete, t.min_insights
                    ),
                );
                0.0
            } else if complete as f64 >= insights.len() as f64 * t.insight_completeness_ratio {
                100.0
            } else {
                INSIGHT_BASE_POINTS
            };
            for (i, insight) in insights.iter().enumerate() {
                let timing = insight.get("timing").map(text_of).unwrap_or_default();
                if !patterns::has_year_or_quarter(&timing) {
                    score -= PENALTY_POINTS;
                    f.warn(
                        IssueCode::SemanticEmpty,
                        &tree::index("keyInsights", i),
                        "Insight timing names no year or quarter".to_string(),
                    );
                }
            }
            score.max(0.0)
        });
        scores.insert("keyInsights".to_string(), score);

        let roadmap = signals::phases(doc.get("implementation"));
        let score = if roadmap.phases == 0 {
            f.fail(
                IssueCode::MissingSection,
                "implementation",
                "No implementation roadmap phases".to_string(),
            );
            0.0
        } else if roadmap.with_activities == roadmap.phases && roadmap.with_investment == roadmap.phases {
            100.0
        } else if roadmap.with_activities == roadmap.phases {
            f.warn(
                IssueCode::EmptyData,
                "implementation.phases",
                format!(
                    "{} of {} phases have no investment figure",
                    roadmap.phases - roadmap.with_investment,
                    roadmap.phases
                ),
            );
            50.0
        } else {
            f.warn(
                IssueCode::EmptyData,
                "implementation.phases",
                format!(
                    "{} of {} phases have no activities",
                    roadmap.phases - roadmap.with_activities,
                    roadmap.phases
                ),
            );
            25.0
        };
        scores.insert("implementation".to_string(), score);

        scores
    }
}

impl Gate for SynthesisGate<'_> {
    type Outcome = SynthesisResult;

    fn name(&self) -> &'static str {
        "synthesis"
    }

    fn evaluate(&self, document: &Value) -> SynthesisResult {
        let t = self.thresholds();
        let variant = self.config.shape_of(document);
        let mut findings = Findings::default();

        let Some(doc) = document.as_object() else {
            return SynthesisResult::rejected(
                variant,
                Issue::at(
                    IssueCode::WrongType,
                    "$",
                    "Document must be an object to score synthesis quality",
                ),
            );
        };

        let (scores, threshold, macro_padding) = match variant {
            DocumentShape::MultiEntity => (self.score_multi(doc, &mut findings), t.multi_entity_pass, None),
            DocumentShape::SingleEntity => {
                let scores = self.score_single(doc, &mut findings);
                let padding = macro_padding(doc);
                if padding.flagged {
                    findings.warn(
                        IssueCode::SemanticEmpty,
                        "$",
                        format!(
                            "{} incidental macro-economic mentions ({})",
                            padding.mentions,
                            padding.terms.join(", ")
                        ),
                    );
                }
                (scores, t.single_entity_pass, Some(padding))
            }
        };

        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.values().sum::<f64>() / scores.len() as f64
        };
        let industry_relevance = self.industry_relevance(document);
        let overall = round1(mean * t.quality_weight + industry_relevance);

        tracing::debug!(
            variant = variant.as_str(),
            overall,
            industry_relevance,
            failures = findings.failures.len(),
            "Synthesis scored"
        );

        SynthesisResult {
            pass: overall >= threshold,
            overall,
            variant,
            scores,
            industry_relevance,
            failures: findings.failures,
            warnings: findings.warnings,
            macro_padding,
            error_type: None,
        }
    }
}

/// The section value when it is populated; otherwise records a
/// missing-section failure.
fn present_section<'d>(doc: &'d Map<String, Value>, name: &str, f: &mut Findings) -> Option<&'d Value> {
    match doc.get(name) {
        Some(value) if !patterns::is_blank(Some(value)) => Some(value),
        _ => {
            f.fail(
                IssueCode::MissingSection,
                name,
                format!("Section '{}' is missing or empty", name),
            );
            None
        }
    }
}

fn negative_chart_values(prefix: &str, section: &Value, f: &mut Findings) {
    let Some(map) = section.as_object() else {
        return;
    };
    for (key, sub) in map {
        let Some(chart) = sub.get("chartData") else {
            continue;
        };
        let negatives = signals::chart_series(chart)
            .iter()
            .flat_map(|s| s.iter())
            .filter(|v| v.as_f64().is_some_and(|n| n < 0.0))
            .count();
        if negatives > 0 {
            f.warn(
                IssueCode::BoundaryValues,
                &tree::join(prefix, key),
                format!("{} negative chart values", negatives),
            );
        }
    }
}

fn macro_padding(doc: &Map<String, Value>) -> MacroPadding {
    let mut mentions = 0;
    let mut terms = BTreeSet::new();
    for section in MACRO_SCAN_SECTIONS {
        let Some(value) = doc.get(section) else {
            continue;
        };
        let text = text_of(value);
        for m in MACRO_INDICATOR.find_iter(&text) {
            mentions += 1;
            terms.insert(m.as_str().to_lowercase());
        }
    }
    MacroPadding {
        flagged: mentions >= MACRO_PADDING_MENTIONS,
        mentions,
        terms: terms.into_iter().collect(),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
