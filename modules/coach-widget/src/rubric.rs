use ai_client::last_json_object;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest value any rubric dimension can take.
pub const MAX_DIMENSION_SCORE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Accuracy,
    Compliance,
    Discovery,
    Objection,
    Value,
    Empathy,
    Clarity,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Accuracy,
        Dimension::Compliance,
        Dimension::Discovery,
        Dimension::Objection,
        Dimension::Value,
        Dimension::Empathy,
        Dimension::Clarity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Accuracy => "accuracy",
            Dimension::Compliance => "compliance",
            Dimension::Discovery => "discovery",
            Dimension::Objection => "objection",
            Dimension::Value => "value",
            Dimension::Empathy => "empathy",
            Dimension::Clarity => "clarity",
        }
    }

    /// A zero on these dimensions raises the compliance-risk banner.
    pub fn is_hard_fail(self) -> bool {
        matches!(self, Dimension::Accuracy | Dimension::Compliance)
    }
}

/// Per-turn rubric, every dimension in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rubric {
    pub accuracy: u8,
    pub compliance: u8,
    pub discovery: u8,
    pub objection: u8,
    pub value: u8,
    pub empathy: u8,
    pub clarity: u8,
}

impl Rubric {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Accuracy => self.accuracy,
            Dimension::Compliance => self.compliance,
            Dimension::Discovery => self.discovery,
            Dimension::Objection => self.objection,
            Dimension::Value => self.value,
            Dimension::Empathy => self.empathy,
            Dimension::Clarity => self.clarity,
        }
    }

    pub fn compliance_risk(&self) -> bool {
        Dimension::ALL
            .iter()
            .any(|d| d.is_hard_fail() && self.get(*d) == 0)
    }
}

/// Dimension weights. Defaults to accuracy 3, compliance 3, discovery 2,
/// objection 2, value 2, empathy 1, clarity 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricWeights {
    pub accuracy: u32,
    pub compliance: u32,
    pub discovery: u32,
    pub objection: u32,
    pub value: u32,
    pub empathy: u32,
    pub clarity: u32,
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            accuracy: 3,
            compliance: 3,
            discovery: 2,
            objection: 2,
            value: 2,
            empathy: 1,
            clarity: 1,
        }
    }
}

impl RubricWeights {
    pub fn get(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Accuracy => self.accuracy,
            Dimension::Compliance => self.compliance,
            Dimension::Discovery => self.discovery,
            Dimension::Objection => self.objection,
            Dimension::Value => self.value,
            Dimension::Empathy => self.empathy,
            Dimension::Clarity => self.clarity,
        }
    }

    pub fn total(&self) -> u32 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }

    /// Weighted turn score on a 0–10 scale, rounded to one decimal.
    pub fn turn_score(&self, rubric: &Rubric) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u32 = Dimension::ALL
            .iter()
            .map(|d| self.get(*d) * u32::from(rubric.get(*d)))
            .sum();
        round1(f64::from(weighted) / (f64::from(MAX_DIMENSION_SCORE) * f64::from(total)) * 10.0)
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean of every turn score so far, one decimal.
pub fn running_average(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(round1(scores.iter().sum::<f64>() / scores.len() as f64))
}

/// Scored turn as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnScore {
    pub rubric: Rubric,
    pub score: f64,
    pub average: f64,
    pub turns: usize,
    pub compliance_risk: bool,
    pub feedback: Option<String>,
}

// =============================================================================
// Model output
// =============================================================================

/// Rubric object as the evaluator model returns it.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct RubricReport {
    /// Medical and factual accuracy of the rep's statements (0-5)
    pub accuracy: f64,
    /// Stays on-label, fair balance, no off-label promotion (0-5)
    pub compliance: f64,
    /// Asks open questions that uncover the counterpart's needs (0-5)
    pub discovery: f64,
    /// Acknowledges and resolves objections (0-5)
    pub objection: f64,
    /// Links the product to value for this counterpart (0-5)
    pub value: f64,
    /// Shows empathy and listens (0-5)
    pub empathy: f64,
    /// Clear, concise, jargon-free (0-5)
    pub clarity: f64,
    /// One or two sentences of coaching feedback
    #[serde(default)]
    pub feedback: Option<String>,
}

impl RubricReport {
    /// Round and clamp every dimension into `0..=5`.
    pub fn rubric(&self) -> Rubric {
        fn clamp(v: f64) -> u8 {
            v.round().clamp(0.0, f64::from(MAX_DIMENSION_SCORE)) as u8
        }
        Rubric {
            accuracy: clamp(self.accuracy),
            compliance: clamp(self.compliance),
            discovery: clamp(self.discovery),
            objection: clamp(self.objection),
            value: clamp(self.value),
            empathy: clamp(self.empathy),
            clarity: clamp(self.clarity),
        }
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RubricParseError {
    #[error("no JSON object in evaluator response")]
    NoObject,

    #[error("invalid rubric object: {0}")]
    Invalid(String),
}

/// Parse the last top-level JSON object in a free-text evaluator response.
pub fn parse_rubric(raw: &str) -> Result<RubricReport, RubricParseError> {
    let object = last_json_object(raw).ok_or(RubricParseError::NoObject)?;
    serde_json::from_str(object).map_err(|e| RubricParseError::Invalid(e.to_string()))
}
