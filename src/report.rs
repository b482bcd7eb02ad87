use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{aggregate, group_by};
use crate::error::ScoringError;
use crate::formula::{compute_score, Formula, Rounding, DAILY_POINTS, WELLNESS_INDEX};
use crate::market;
use crate::models::{Direction, EntityRecord, ScoredEntity};
use crate::rank::{medal, rank, Medal};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub players: usize,
    pub total_points: f64,
    pub top_scorer: Option<ScoredEntity>,
    pub points_today: f64,
}

pub fn score_entities(entities: &[EntityRecord], formula: &Formula) -> Vec<ScoredEntity> {
    entities
        .iter()
        .map(|entity| ScoredEntity {
            id: entity.id.clone(),
            name: entity.name.clone(),
            score: compute_score(&entity.metrics, formula),
        })
        .collect()
}

pub fn summarize(entities: &[EntityRecord], formula: &Formula) -> DashboardSummary {
    let scored = score_entities(entities, formula);
    let total_points = scored.iter().map(|entity| entity.score).sum();
    let top_scorer = rank(&scored, Direction::Desc)
        .into_iter()
        .next()
        .map(|entry| entry.item);
    let points_today = Rounding::Nearest.apply(
        entities
            .iter()
            .map(|entity| compute_score(&entity.metrics, &DAILY_POINTS))
            .sum(),
    );

    DashboardSummary {
        players: entities.len(),
        total_points,
        top_scorer,
        points_today,
    }
}

pub fn medal_label(rank: usize) -> String {
    match medal(rank) {
        Some(Medal::Gold) => "🥇".to_string(),
        Some(Medal::Silver) => "🥈".to_string(),
        Some(Medal::Bronze) => "🥉".to_string(),
        None => format!("#{rank}"),
    }
}

pub fn build_report(
    entities: &[EntityRecord],
    formula: &Formula,
    group_field: &str,
    generated_on: NaiveDate,
) -> Result<String, ScoringError> {
    let summary = summarize(entities, formula);
    let leaderboard = rank(&score_entities(entities, formula), Direction::Desc);
    let teams = rank(
        &aggregate(entities, group_by(group_field), |entity| {
            compute_score(&entity.metrics, formula)
        })?,
        Direction::Desc,
    );
    let stocks = rank(
        &market::team_stocks(entities, &WELLNESS_INDEX)?,
        Direction::Desc,
    );

    let mut output = String::new();

    let _ = writeln!(output, "# Wellness Leaderboard Report");
    let _ = writeln!(
        output,
        "Generated {} using {} across {} players",
        generated_on, formula.name, summary.players
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Dashboard");
    let _ = writeln!(output, "- Total points: {:.0}", summary.total_points);
    match &summary.top_scorer {
        Some(top) => {
            let _ = writeln!(output, "- Top scorer: {} ({:.0} pts)", top.name, top.score);
        }
        None => {
            let _ = writeln!(output, "- Top scorer: none yet");
        }
    }
    let _ = writeln!(output, "- Points today: {:.0}", summary.points_today);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Individual Leaderboard");
    if leaderboard.is_empty() {
        let _ = writeln!(output, "No players recorded.");
    } else {
        for entry in leaderboard.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} {} ({}) {:.0} pts",
                medal_label(entry.rank),
                entry.item.name,
                entry.item.id,
                entry.item.score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Leaderboard");
    if teams.is_empty() {
        let _ = writeln!(output, "No teams recorded.");
    } else {
        for entry in &teams {
            let _ = writeln!(
                output,
                "- {} {}: avg {:.0} across {} members",
                medal_label(entry.rank),
                entry.item.key,
                Rounding::Nearest.apply(entry.item.average),
                entry.item.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Stocks");
    if stocks.is_empty() {
        let _ = writeln!(output, "No team stocks listed.");
    } else {
        for entry in &stocks {
            let _ = writeln!(
                output,
                "- {} ({}) ${:.2}",
                entry.item.ticker, entry.item.team, entry.item.price
            );
        }
    }

    Ok(output)
}
