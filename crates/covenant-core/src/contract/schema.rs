//! Declarative document schemas.
//!
//! A schema is a list of top-level sections, each a recursive `FieldSpec`
//! describing the expected shape class, required sub-fields and array item
//! shape. The coercer, validator and quarantine all read the same tables.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime shape class of a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Object,
    Array,
    #[default]
    Scalar,
}

impl Shape {
    /// Shape of a value; `None` for null.
    pub fn of(value: &Value) -> Option<Shape> {
        match value {
            Value::Null => None,
            Value::Object(_) => Some(Shape::Object),
            Value::Array(_) => Some(Shape::Array),
            _ => Some(Shape::Scalar),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Object => "object",
            Shape::Array => "array",
            Shape::Scalar => "scalar",
        }
    }
}

/// Expected shape of one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSpec {
    pub shape: Shape,

    pub required: bool,

    /// Declared sub-fields of an object, in canonical order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NamedField>,

    /// Shape of each element of an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,

    /// Key to wrap a bare array under when an object is expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_key: Option<String>,

    /// A string here is narrative text to split into paragraphs
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub narrative: bool,

    /// This array is an insight list (placeholder filter, field renames)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub insights: bool,
}

/// A field spec with its key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedField {
    pub name: String,

    #[serde(flatten)]
    pub spec: FieldSpec,
}

impl FieldSpec {
    pub fn object(children: Vec<NamedField>) -> Self {
        Self {
            shape: Shape::Object,
            children,
            ..Default::default()
        }
    }

    pub fn array() -> Self {
        Self {
            shape: Shape::Array,
            ..Default::default()
        }
    }

    pub fn scalar() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn items(mut self, items: FieldSpec) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn wrap(mut self, key: &str) -> Self {
        self.wrap_key = Some(key.to_string());
        self
    }

    pub fn narrative(mut self) -> Self {
        self.narrative = true;
        self
    }

    pub fn insights(mut self) -> Self {
        self.insights = true;
        self
    }

    pub fn named(self, name: &str) -> NamedField {
        NamedField {
            name: name.to_string(),
            spec: self,
        }
    }

    /// Declared child by name.
    pub fn child(&self, name: &str) -> Option<&FieldSpec> {
        self.children.iter().find(|c| c.name == name).map(|c| &c.spec)
    }

    /// Whether sub-keys of this object are constrained.
    pub fn is_closed(&self) -> bool {
        self.shape == Shape::Object && !self.children.is_empty()
    }
}

/// Schema for one document shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentSchema {
    pub sections: Vec<NamedField>,
}

impl DocumentSchema {
    pub fn section(&self, name: &str) -> Option<&FieldSpec> {
        self.sections.iter().find(|s| s.name == name).map(|s| &s.spec)
    }

    pub fn is_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Default schema for multi-entity (country/market) documents.
    pub fn multi_entity() -> Self {
        let chart_section = || FieldSpec::object(vec![]);
        let act = FieldSpec::object(vec![
            FieldSpec::scalar().required().named("name"),
            FieldSpec::scalar().named("year"),
        ]);
        let player = FieldSpec::object(vec![
            FieldSpec::scalar().required().named("name"),
            FieldSpec::scalar().named("description"),
        ]);

        Self {
            sections: vec![
                FieldSpec::object(vec![
                    FieldSpec::array().items(act).named("foundationalActs"),
                    FieldSpec::object(vec![]).named("nationalPolicy"),
                    FieldSpec::object(vec![]).named("investmentRestrictions"),
                    FieldSpec::array().narrative().named("regulatorySummary"),
                ])
                .required()
                .named("policy"),
                FieldSpec::object(vec![
                    FieldSpec::scalar().named("marketSize"),
                    chart_section().named("marketSizeAndGrowth"),
                    chart_section().named("supplyAndDemand"),
                    chart_section().named("pricing"),
                    chart_section().named("segments"),
                    chart_section().named("infrastructure"),
                    chart_section().named("trends"),
                ])
                .required()
                .named("market"),
                FieldSpec::object(vec![
                    FieldSpec::array().required().items(player).named("players"),
                    FieldSpec::scalar().named("landscapeSummary"),
                    FieldSpec::scalar().named("marketConcentration"),
                    FieldSpec::object(vec![]).named("caseStudy"),
                ])
                .wrap("players")
                .required()
                .named("competitors"),
                FieldSpec::object(vec![
                    FieldSpec::object(vec![]).named("dealEconomics"),
                    FieldSpec::object(vec![]).named("partnerAssessment"),
                    FieldSpec::object(vec![]).named("entryStrategy"),
                    implementation().named("implementation"),
                ])
                .named("depth"),
                FieldSpec::object(vec![
                    FieldSpec::array().narrative().named("overview"),
                    FieldSpec::array().items(insight()).insights().named("keyInsights"),
                    FieldSpec::array().named("opportunities"),
                    FieldSpec::array().named("obstacles"),
                    FieldSpec::scalar().named("recommendation"),
                ])
                .required()
                .named("summary"),
            ],
        }
    }

    /// Default schema for single-entity (one company) documents.
    pub fn single_entity() -> Self {
        let player = FieldSpec::object(vec![
            FieldSpec::scalar().required().named("name"),
            FieldSpec::scalar().named("description"),
        ]);

        Self {
            sections: vec![
                FieldSpec::array().narrative().required().named("executiveSummary"),
                FieldSpec::object(vec![
                    FieldSpec::scalar().named("totalAddressableMarket"),
                    FieldSpec::scalar().named("serviceableMarket"),
                    FieldSpec::scalar().named("growthTrajectory"),
                    FieldSpec::scalar().named("timingConsiderations"),
                ])
                .required()
                .named("marketOpportunityAssessment"),
                FieldSpec::object(vec![
                    FieldSpec::array().items(player).named("keyCompetitors"),
                    FieldSpec::array().named("whiteSpaces"),
                    FieldSpec::array().named("companyAdvantages"),
                ])
                .wrap("keyCompetitors")
                .required()
                .named("competitivePositioning"),
                FieldSpec::array()
                    .items(insight())
                    .insights()
                    .required()
                    .named("keyInsights"),
                FieldSpec::array().narrative().named("nextSteps"),
                implementation().named("implementation"),
            ],
        }
    }
}

fn insight() -> FieldSpec {
    FieldSpec::object(vec![
        FieldSpec::scalar().required().named("title"),
        FieldSpec::scalar().named("data"),
        FieldSpec::scalar().named("implication"),
        FieldSpec::scalar().named("timing"),
    ])
}

fn implementation() -> FieldSpec {
    let phase = FieldSpec::object(vec![
        FieldSpec::scalar().named("name"),
        FieldSpec::array().narrative().named("activities"),
        FieldSpec::scalar().named("investment"),
    ]);
    FieldSpec::object(vec![
        FieldSpec::array().items(phase).named("phases"),
        FieldSpec::scalar().named("totalInvestment"),
        FieldSpec::scalar().named("timeline"),
    ])
}
