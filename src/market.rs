use serde::Serialize;

use crate::aggregate::{aggregate, group_by};
use crate::error::ScoringError;
use crate::formula::{compute_score, Formula, Rounding};
use crate::models::EntityRecord;
use crate::rank::Scored;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStock {
    pub ticker: String,
    pub team: String,
    pub price: f64,
    pub members: usize,
}

impl Scored for TeamStock {
    fn score(&self) -> f64 {
        self.price
    }
}

pub fn ticker_for(team: &str) -> String {
    team.chars().take(3).collect::<String>().to_uppercase()
}

/// One share per team, priced at the rounded team average of `formula`.
pub fn team_stocks(
    entities: &[EntityRecord],
    formula: &Formula,
) -> Result<Vec<TeamStock>, ScoringError> {
    let groups = aggregate(entities, group_by("team_name"), |entity| {
        compute_score(&entity.metrics, formula)
    })?;

    Ok(groups
        .into_iter()
        .map(|group| TeamStock {
            ticker: ticker_for(&group.key),
            price: Rounding::Nearest.apply(group.average),
            members: group.count,
            team: group.key,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub ticker: String,
    pub shares: u32,
    pub avg_price: f64,
}

impl Holding {
    pub fn value(&self, price: f64) -> f64 {
        f64::from(self.shares) * price
    }

    pub fn cost_basis(&self) -> f64 {
        f64::from(self.shares) * self.avg_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainLoss {
    pub gain: f64,
    pub percent: f64,
}

pub fn gain_loss(holding: &Holding, price: f64) -> GainLoss {
    let basis = holding.cost_basis();
    let gain = holding.value(price) - basis;
    let percent = if basis == 0.0 { 0.0 } else { gain / basis * 100.0 };
    GainLoss { gain, percent }
}
