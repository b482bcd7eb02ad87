use std::cmp::Ordering;

use crate::models::{Direction, GroupAggregate, RankedEntry, ScoredEntity};

/// Anything carrying a precomputed score the ranker can order.
pub trait Scored {
    fn score(&self) -> f64;
}

impl Scored for f64 {
    fn score(&self) -> f64 {
        *self
    }
}

impl Scored for ScoredEntity {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Teams rank by their average.
impl Scored for GroupAggregate {
    fn score(&self) -> f64 {
        self.average
    }
}

/// Total order over scores, so a stray NaN cannot scramble the sort.
fn ordering(a: f64, b: f64, direction: Direction) -> Ordering {
    let ordering = if a == b { Ordering::Equal } else { a.total_cmp(&b) };
    match direction {
        Direction::Desc => ordering.reverse(),
        Direction::Asc => ordering,
    }
}

/// Stable sort by score, then number the result 1..=N. Equal scores keep
/// their input order.
pub fn rank<T: Scored + Clone>(items: &[T], direction: Direction) -> Vec<RankedEntry<T>> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| ordering(a.score(), b.score(), direction));
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, item)| RankedEntry {
            rank: index + 1,
            item,
        })
        .collect()
}

#[derive(Debug, PartialEq)]
pub enum Matchup<'a, T> {
    Winner(&'a T),
    Tie,
}

pub fn compare_two<'a, T: Scored>(a: &'a T, b: &'a T, direction: Direction) -> Matchup<'a, T> {
    match ordering(a.score(), b.score(), direction) {
        Ordering::Less => Matchup::Winner(a),
        Ordering::Greater => Matchup::Winner(b),
        Ordering::Equal => Matchup::Tie,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

pub fn medal(rank: usize) -> Option<Medal> {
    match rank {
        1 => Some(Medal::Gold),
        2 => Some(Medal::Silver),
        3 => Some(Medal::Bronze),
        _ => None,
    }
}

pub fn badge(survival_score: f64) -> &'static str {
    if survival_score >= 25.0 {
        "Nocturnal Master"
    } else if survival_score >= 20.0 {
        "Shadow Explorer"
    } else if survival_score >= 15.0 {
        "Storm Survivor"
    } else {
        "Jungle Rookie"
    }
}
