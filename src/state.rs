//! Shop, cart, points and trading state, advanced one [`Command`] at a time.
//!
//! [`reduce`] never mutates its input: a rejected command leaves the caller
//! holding the previous state unchanged.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::market::Holding;
use crate::models::EntityRecord;

pub const CALORIE_TARGET: f64 = 2500.0;
pub const STARTING_STORE_POINTS: i64 = 2500;
pub const STARTING_COINS: f64 = 1250.0;

pub const AWARD_PRESETS: [(&str, i64); 5] = [
    ("Daily Login", 10),
    ("Task Complete", 50),
    ("Weekly Goal", 100),
    ("Team Challenge", 200),
    ("Monthly Bonus", 500),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: i64,
}

pub const STORE_ITEMS: [StoreItem; 4] = [
    StoreItem {
        id: "firewood",
        name: "Firewood",
        price: 100,
    },
    StoreItem {
        id: "shelter",
        name: "Shelter",
        price: 250,
    },
    StoreItem {
        id: "water",
        name: "Fresh Water",
        price: 75,
    },
    StoreItem {
        id: "food",
        name: "Jungle Fruit",
        price: 150,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPoints {
    pub id: String,
    pub name: String,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    pub dish: String,
    pub calories: f64,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub players: Vec<PlayerPoints>,
    pub cart: Vec<CartItem>,
    pub orders: usize,
    pub store_points: i64,
    pub owned_items: BTreeSet<String>,
    pub coins: f64,
    pub holdings: Vec<Holding>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            cart: Vec::new(),
            orders: 0,
            store_points: STARTING_STORE_POINTS,
            owned_items: BTreeSet::new(),
            coins: STARTING_COINS,
            holdings: Vec::new(),
        }
    }
}

impl GameState {
    /// Seed player balances from a roster, using `points_metric` as the opening balance.
    pub fn from_roster(entities: &[EntityRecord], points_metric: &str) -> Self {
        let players = entities
            .iter()
            .map(|entity| PlayerPoints {
                id: entity.id.clone(),
                name: entity.name.clone(),
                points: entity.metric(points_metric).trunc() as i64,
            })
            .collect();
        Self {
            players,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AwardPoints {
        player: String,
        points: i64,
        #[serde(default)]
        reason: String,
    },
    AwardPreset {
        player: String,
        preset: String,
    },
    AddToCart {
        dish: String,
        calories: f64,
        points: f64,
    },
    RemoveFromCart {
        dish: String,
    },
    Checkout,
    Purchase {
        item: String,
    },
    Buy {
        ticker: String,
        price: f64,
        quantity: u32,
    },
    Sell {
        ticker: String,
        price: f64,
        quantity: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    pub calories: f64,
    pub points: f64,
    pub within_target: bool,
}

pub fn cart_totals(state: &GameState) -> CartTotals {
    let calories: f64 = state.cart.iter().map(|item| item.calories).sum();
    let points: f64 = state.cart.iter().map(|item| item.points).sum();
    CartTotals {
        calories,
        points,
        within_target: calories <= CALORIE_TARGET,
    }
}

/// Shuffle `dishes` and greedily pick those that still fit under
/// [`CALORIE_TARGET`], stopping once the meal reaches 90% of it.
pub fn recommend_meal<'a, R: Rng + ?Sized>(
    dishes: &'a [EntityRecord],
    rng: &mut R,
) -> Vec<&'a EntityRecord> {
    let mut shuffled: Vec<&EntityRecord> = dishes.iter().collect();
    shuffled.shuffle(rng);

    let mut total = 0.0;
    let mut meal = Vec::new();
    for dish in shuffled {
        let calories = dish.metric("calories");
        if calories > 0.0 && total + calories <= CALORIE_TARGET {
            total += calories;
            meal.push(dish);
        }
        if total >= CALORIE_TARGET * 0.9 {
            break;
        }
    }
    meal
}

pub fn survival_condition(owned: usize) -> &'static str {
    match owned {
        0 => "Struggling to survive",
        1 => "First Steps",
        2 => "Making Progress",
        3 => "Doing Really Well",
        _ => "Thriving in Paradise",
    }
}

pub fn preset_points(label: &str) -> Option<i64> {
    AWARD_PRESETS
        .iter()
        .find(|(name, _)| {
            name.eq_ignore_ascii_case(label) || name.replace(' ', "-").eq_ignore_ascii_case(label)
        })
        .map(|(_, points)| *points)
}

fn rejected(message: impl Into<String>) -> ScoringError {
    ScoringError::Rejected(message.into())
}

pub fn reduce(state: &GameState, command: &Command) -> Result<GameState, ScoringError> {
    let mut next = state.clone();

    match command {
        Command::AwardPoints {
            player,
            points,
            reason,
        } => {
            if *points <= 0 {
                return Err(rejected("awarded points must be positive"));
            }
            let target = next
                .players
                .iter_mut()
                .find(|candidate| candidate.id == *player || candidate.name == *player)
                .ok_or_else(|| ScoringError::UnknownEntity(format!("player {player}")))?;
            target.points = target
                .points
                .checked_add(*points)
                .ok_or_else(|| rejected(format!("{} cannot hold more points", target.name)))?;
            tracing::info!(player = %target.name, points, reason = %reason, "points awarded");
        }
        Command::AwardPreset { player, preset } => {
            let points = preset_points(preset)
                .ok_or_else(|| ScoringError::UnknownEntity(format!("award preset {preset}")))?;
            return reduce(
                state,
                &Command::AwardPoints {
                    player: player.clone(),
                    points,
                    reason: preset.clone(),
                },
            );
        }
        Command::AddToCart {
            dish,
            calories,
            points,
        } => {
            next.cart.push(CartItem {
                dish: dish.clone(),
                calories: *calories,
                points: *points,
            });
        }
        Command::RemoveFromCart { dish } => {
            let before = next.cart.len();
            next.cart.retain(|item| item.dish != *dish);
            if next.cart.len() == before {
                return Err(rejected(format!("{dish} is not in the cart")));
            }
        }
        Command::Checkout => {
            if next.cart.is_empty() {
                return Err(rejected("cart is empty"));
            }
            let totals = cart_totals(&next);
            if !totals.within_target {
                tracing::warn!(
                    calories = totals.calories,
                    target = CALORIE_TARGET,
                    "order exceeds calorie target"
                );
            }
            next.cart.clear();
            next.orders += 1;
        }
        Command::Purchase { item } => {
            let entry = STORE_ITEMS
                .iter()
                .find(|candidate| candidate.id == item)
                .ok_or_else(|| ScoringError::UnknownEntity(format!("store item {item}")))?;
            if next.owned_items.contains(entry.id) {
                return Err(rejected(format!("{} already owned", entry.name)));
            }
            if next.store_points < entry.price {
                return Err(rejected(format!(
                    "{} costs {} but only {} points remain",
                    entry.name, entry.price, next.store_points
                )));
            }
            next.store_points -= entry.price;
            next.owned_items.insert(entry.id.to_string());
        }
        Command::Buy {
            ticker,
            price,
            quantity,
        } => {
            if *quantity == 0 || !price.is_finite() || *price < 0.0 {
                return Err(rejected("trade needs a positive quantity and a valid price"));
            }
            let amount = price * f64::from(*quantity);
            if next.coins < amount {
                return Err(rejected(format!("buying {quantity} {ticker} needs {amount:.2} coins")));
            }
            next.coins -= amount;
            match next.holdings.iter_mut().find(|holding| holding.ticker == *ticker) {
                Some(holding) => {
                    let shares = holding
                        .shares
                        .checked_add(*quantity)
                        .ok_or_else(|| rejected(format!("{ticker} position is too large")))?;
                    holding.avg_price = (holding.cost_basis() + amount) / f64::from(shares);
                    holding.shares = shares;
                }
                None => next.holdings.push(Holding {
                    ticker: ticker.clone(),
                    shares: *quantity,
                    avg_price: *price,
                }),
            }
        }
        Command::Sell {
            ticker,
            price,
            quantity,
        } => {
            if *quantity == 0 || !price.is_finite() || *price < 0.0 {
                return Err(rejected("trade needs a positive quantity and a valid price"));
            }
            let index = next
                .holdings
                .iter()
                .position(|holding| holding.ticker == *ticker)
                .ok_or_else(|| rejected(format!("no {ticker} shares held")))?;
            let held = next.holdings[index].shares;
            if *quantity > held {
                return Err(rejected(format!("only {held} {ticker} shares held")));
            }
            next.coins += price * f64::from(*quantity);
            if *quantity == held {
                next.holdings.remove(index);
            } else {
                next.holdings[index].shares = held - quantity;
            }
        }
    }

    Ok(next)
}
