//! Weighted scoring formulas and the table of named built-ins.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ScoringError;
use crate::models::MetricMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Reward,
    Penalty,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Reward => 1.0,
            Sign::Penalty => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    #[default]
    Exact,
    /// Halves round toward positive infinity.
    Nearest,
    Floor,
    Tenths,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Exact => value,
            Rounding::Nearest => (value + 0.5).floor(),
            Rounding::Floor => value.floor(),
            Rounding::Tenths => (value * 10.0 + 0.5).floor() / 10.0,
        }
    }
}

fn default_per() -> f64 {
    1.0
}

/// One `(metric, weight, sign)` term. The metric is shifted down by `offset`,
/// divided by `per` and clamped to `floor..=cap` before weighting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Term {
    pub metric: Cow<'static, str>,
    pub weight: f64,
    pub sign: Sign,
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_per")]
    pub per: f64,
    #[serde(default)]
    pub floor: Option<f64>,
    #[serde(default)]
    pub cap: Option<f64>,
}

impl Term {
    pub const fn reward(metric: &'static str, weight: f64) -> Self {
        Self {
            metric: Cow::Borrowed(metric),
            weight,
            sign: Sign::Reward,
            offset: 0.0,
            per: 1.0,
            floor: None,
            cap: None,
        }
    }

    pub const fn penalty(metric: &'static str, weight: f64) -> Self {
        Self {
            metric: Cow::Borrowed(metric),
            weight,
            sign: Sign::Penalty,
            offset: 0.0,
            per: 1.0,
            floor: None,
            cap: None,
        }
    }

    pub const fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub const fn per(mut self, per: f64) -> Self {
        self.per = per;
        self
    }

    pub const fn clamped(mut self, floor: f64, cap: f64) -> Self {
        self.floor = Some(floor);
        self.cap = Some(cap);
        self
    }

    pub fn contribution(&self, metrics: &MetricMap) -> f64 {
        let mut value = (metrics.get(&self.metric) - self.offset) / self.per;
        if let Some(floor) = self.floor {
            value = value.max(floor);
        }
        if let Some(cap) = self.cap {
            value = value.min(cap);
        }
        self.sign.factor() * self.weight * value
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Formula {
    pub name: Cow<'static, str>,
    #[serde(default)]
    pub base: f64,
    pub terms: Cow<'static, [Term]>,
    #[serde(default)]
    pub rounding: Rounding,
}

const NUTRITION_TERMS: &[Term] = &[
    Term::reward("protein", 0.5),
    Term::penalty("fat", 0.2),
    Term::penalty("calories", 0.1).per(100.0),
];

const COMPOSITE_TERMS: &[Term] = &[
    Term::reward("wellness_score", 0.7),
    Term::reward("food_score", 0.3),
];

const INDEX_TERMS: &[Term] = &[
    Term::reward("step_count", 1.0).per(100.0),
    Term::reward("hrv", 1.0).per(10.0),
];

// Lunch is a flat 10 in the base. Sleep scores 0 at 5h up to 10 at 9h;
// steps score up to 10 at 10k.
const SURVIVAL_TERMS: &[Term] = &[
    Term::reward("sleep_hours", 10.0)
        .offset(5.0)
        .per(4.0)
        .clamped(0.0, 1.0),
    Term::reward("step_count", 1.0).per(1000.0).clamped(0.0, 10.0),
];

const DAILY_TERMS: &[Term] = &[Term::reward("wellness_score", 1.0).per(10.0)];

pub const NUTRITION_POINTS: Formula = Formula {
    name: Cow::Borrowed("nutrition-points"),
    base: 100.0,
    terms: Cow::Borrowed(NUTRITION_TERMS),
    rounding: Rounding::Nearest,
};

pub const COMPOSITE_WELLNESS: Formula = Formula {
    name: Cow::Borrowed("composite-wellness"),
    base: 0.0,
    terms: Cow::Borrowed(COMPOSITE_TERMS),
    rounding: Rounding::Nearest,
};

pub const WELLNESS_INDEX: Formula = Formula {
    name: Cow::Borrowed("wellness-index"),
    base: 0.0,
    terms: Cow::Borrowed(INDEX_TERMS),
    rounding: Rounding::Floor,
};

pub const SURVIVAL: Formula = Formula {
    name: Cow::Borrowed("survival"),
    base: 10.0,
    terms: Cow::Borrowed(SURVIVAL_TERMS),
    rounding: Rounding::Tenths,
};

pub const DAILY_POINTS: Formula = Formula {
    name: Cow::Borrowed("daily-points"),
    base: 0.0,
    terms: Cow::Borrowed(DAILY_TERMS),
    rounding: Rounding::Exact,
};

pub const BUILTIN_FORMULAS: [Formula; 5] = [
    NUTRITION_POINTS,
    COMPOSITE_WELLNESS,
    WELLNESS_INDEX,
    SURVIVAL,
    DAILY_POINTS,
];

impl Formula {
    /// Identity formula over a single metric.
    pub fn single(metric: &str) -> Self {
        Self {
            name: Cow::Owned(metric.to_string()),
            base: 0.0,
            terms: Cow::Owned(vec![Term {
                metric: Cow::Owned(metric.to_string()),
                weight: 1.0,
                sign: Sign::Reward,
                offset: 0.0,
                per: 1.0,
                floor: None,
                cap: None,
            }]),
            rounding: Rounding::Exact,
        }
    }

    pub fn raw_score(&self, metrics: &MetricMap) -> f64 {
        self.base
            + self
                .terms
                .iter()
                .map(|term| term.contribution(metrics))
                .sum::<f64>()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.name.trim().is_empty() {
            return Err(ScoringError::InvalidFormula("formula name is empty".into()));
        }
        if !self.base.is_finite() {
            return Err(ScoringError::InvalidFormula(format!(
                "{}: base must be finite",
                self.name
            )));
        }
        for term in self.terms.iter() {
            if term.metric.trim().is_empty() {
                return Err(ScoringError::InvalidFormula(format!(
                    "{}: term with empty metric name",
                    self.name
                )));
            }
            if !term.weight.is_finite() || term.weight < 0.0 {
                return Err(ScoringError::InvalidFormula(format!(
                    "{}: weight for {} must be a non-negative number",
                    self.name, term.metric
                )));
            }
            if !term.per.is_finite() || term.per <= 0.0 {
                return Err(ScoringError::InvalidFormula(format!(
                    "{}: divisor for {} must be positive",
                    self.name, term.metric
                )));
            }
            if !term.offset.is_finite()
                || term.floor.is_some_and(|floor| !floor.is_finite())
                || term.cap.is_some_and(|cap| !cap.is_finite())
            {
                return Err(ScoringError::InvalidFormula(format!(
                    "{}: offset, floor and cap for {} must be finite",
                    self.name, term.metric
                )));
            }
            if let (Some(floor), Some(cap)) = (term.floor, term.cap) {
                if floor > cap {
                    return Err(ScoringError::InvalidFormula(format!(
                        "{}: floor {floor} for {} is above its cap {cap}",
                        self.name, term.metric
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Score `metrics` with `formula`, applying the formula's rounding policy.
/// A non-finite result (overflowing weights) scores as zero.
pub fn compute_score(metrics: &MetricMap, formula: &Formula) -> f64 {
    let score = formula.rounding.apply(formula.raw_score(metrics));
    if score.is_finite() {
        score
    } else {
        tracing::warn!(formula = %formula.name, "score is not finite, using zero");
        0.0
    }
}

/// Named formulas available to the CLI: the built-ins plus any loaded from config.
#[derive(Debug, Clone)]
pub struct FormulaBook {
    formulas: BTreeMap<String, Formula>,
}

impl Default for FormulaBook {
    fn default() -> Self {
        let formulas = BUILTIN_FORMULAS
            .into_iter()
            .map(|formula| (formula.name.to_string(), formula))
            .collect();
        Self { formulas }
    }
}

impl FormulaBook {
    pub fn insert(&mut self, formula: Formula) -> Result<(), ScoringError> {
        formula.validate()?;
        self.formulas.insert(formula.name.to_string(), formula);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Formula, ScoringError> {
        self.formulas
            .get(name)
            .ok_or_else(|| ScoringError::UnknownEntity(format!("formula {name}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.formulas.values()
    }
}
