//! Head-to-head challenges between players or teams.
//!
//! Base scores are deterministic: a player's raw metric, or a team's average
//! of it. Simulated "AI" uncertainty is layered on top by [`AiVariance`],
//! which owns its own random source so callers can seed it.

use rand::Rng;

use crate::aggregate::{aggregate, group_by};
use crate::error::ScoringError;
use crate::formula::{compute_score, Formula};
use crate::models::{Direction, EntityRecord};
use crate::rank::{compare_two, Matchup, Scored};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub id: u8,
    pub name: &'static str,
    pub points: u32,
    pub metric: &'static str,
    pub direction: Direction,
}

pub const CHALLENGES: [Challenge; 5] = [
    Challenge {
        id: 1,
        name: "Run 5km",
        points: 100,
        metric: "step_count",
        direction: Direction::Desc,
    },
    Challenge {
        id: 2,
        name: "Drink 2L Water",
        points: 50,
        metric: "calories_burned",
        direction: Direction::Desc,
    },
    Challenge {
        id: 3,
        name: "30min Meditation",
        points: 75,
        metric: "hrv",
        direction: Direction::Desc,
    },
    Challenge {
        id: 4,
        name: "Healthy Lunch Choice",
        points: 30,
        metric: "bmi",
        direction: Direction::Asc,
    },
    Challenge {
        id: 5,
        name: "Complete Training Course",
        points: 200,
        metric: "wellness_score",
        direction: Direction::Desc,
    },
];

pub fn challenge(id: u8) -> Option<&'static Challenge> {
    CHALLENGES.iter().find(|challenge| challenge.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contender<'a> {
    /// Matched against record id first, then display name.
    Player(&'a str),
    /// Matched against the `team_name` field.
    Team(&'a str),
}

impl<'a> Contender<'a> {
    pub fn new(name: &'a str, team: bool) -> Self {
        if team {
            Contender::Team(name)
        } else {
            Contender::Player(name)
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Contender::Player(name) | Contender::Team(name) => name,
        }
    }
}

pub fn base_score(
    entities: &[EntityRecord],
    contender: Contender<'_>,
    metric: &str,
) -> Result<f64, ScoringError> {
    let formula = Formula::single(metric);
    match contender {
        Contender::Player(who) => entities
            .iter()
            .find(|entity| entity.id == who)
            .or_else(|| entities.iter().find(|entity| entity.name == who))
            .map(|entity| {
                if !entity.metrics.contains(metric) {
                    tracing::debug!(player = %entity.name, metric, "metric missing, scoring zero");
                }
                compute_score(&entity.metrics, &formula)
            })
            .ok_or_else(|| ScoringError::UnknownEntity(format!("player {who}"))),
        Contender::Team(team) => {
            let members: Vec<EntityRecord> = entities
                .iter()
                .filter(|entity| entity.field("team_name") == Some(team))
                .cloned()
                .collect();
            aggregate(&members, group_by("team_name"), |entity| {
                compute_score(&entity.metrics, &formula)
            })?
            .into_iter()
            .next()
            .map(|group| group.average)
            .ok_or_else(|| ScoringError::UnknownEntity(format!("team {team}")))
        }
    }
}

/// Random performance swing applied to otherwise deterministic base scores.
#[derive(Debug)]
pub struct AiVariance<R: Rng> {
    rng: R,
}

impl<R: Rng> AiVariance<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Perturb `base`. With a `rival` score a trailing result is nudged up
    /// and a leading one nudged down.
    pub fn apply(&mut self, base: f64, rival: Option<f64>) -> f64 {
        let intelligence = self.rng.gen_range(0.9..1.1);
        let steadiness = if base + 100.0 == 0.0 {
            0.0
        } else {
            base / (base + 100.0)
        };
        let consistency = 1.0 + steadiness * self.rng.gen_range(-0.05..0.05);
        let mut score = base * intelligence * consistency;

        if let Some(rival) = rival {
            if score < rival {
                score *= self.rng.gen_range(1.02..1.08);
            } else if score > rival {
                score *= self.rng.gen_range(0.95..1.0);
            }
        }
        score
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contestant {
    pub name: String,
    pub score: f64,
}

impl Scored for Contestant {
    fn score(&self) -> f64 {
        self.score
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeOutcome {
    pub challenge: &'static str,
    pub points: u32,
    pub left: Contestant,
    pub right: Contestant,
    /// `None` on a tie.
    pub winner: Option<String>,
}

pub fn run_challenge<R: Rng>(
    entities: &[EntityRecord],
    challenge: &'static Challenge,
    left: Contender<'_>,
    right: Contender<'_>,
    variance: Option<&mut AiVariance<R>>,
) -> Result<ChallengeOutcome, ScoringError> {
    let mut left_score = base_score(entities, left, challenge.metric)?;
    let mut right_score = base_score(entities, right, challenge.metric)?;

    if let Some(variance) = variance {
        left_score = variance.apply(left_score, None);
        right_score = variance.apply(right_score, Some(left_score));
    }

    let left = Contestant {
        name: left.label().to_string(),
        score: left_score,
    };
    let right = Contestant {
        name: right.label().to_string(),
        score: right_score,
    };
    let winner = match compare_two(&left, &right, challenge.direction) {
        Matchup::Winner(contestant) => Some(contestant.name.clone()),
        Matchup::Tie => None,
    };

    tracing::debug!(
        challenge = challenge.name,
        left = left.score,
        right = right.score,
        winner = winner.as_deref().unwrap_or("tie"),
        "challenge resolved"
    );

    Ok(ChallengeOutcome {
        challenge: challenge.name,
        points: challenge.points,
        left,
        right,
        winner,
    })
}

pub fn solo_score<R: Rng>(
    entities: &[EntityRecord],
    challenge: &Challenge,
    player: &str,
    variance: Option<&mut AiVariance<R>>,
) -> Result<f64, ScoringError> {
    let base = base_score(entities, Contender::Player(player), challenge.metric)?;
    Ok(match variance {
        Some(variance) => variance.apply(base, None),
        None => base,
    })
}
