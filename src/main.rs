use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod aggregate;
mod config;
mod error;
mod formula;
mod load;
mod market;
mod models;
mod rank;
mod report;
mod rivals;
mod state;

use crate::formula::{compute_score, Formula, Sign, SURVIVAL};
use crate::models::{Direction, EntityRecord};
use crate::rivals::Contender;

#[derive(Parser)]
#[command(name = "wellness-leaderboard")]
#[command(about = "Leaderboards, team rankings and points for workplace wellness data", long_about = None)]
struct Cli {
    /// Employee or dish records (CSV, or JSON by extension)
    #[arg(long, global = true, env = "WELLNESS_DATA")]
    data: Option<PathBuf>,
    /// Extra formulas in TOML, overriding built-ins of the same name
    #[arg(long, global = true, env = "WELLNESS_FORMULAS")]
    formulas: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank individual players
    Leaderboard {
        #[arg(long, default_value = "composite-wellness")]
        formula: String,
        #[arg(long, value_enum, default_value_t = Direction::Desc)]
        direction: Direction,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Rank teams (or any other field) by average score
    Teams {
        #[arg(long, default_value = "team_name")]
        group_by: String,
        #[arg(long, default_value = "composite-wellness")]
        formula: String,
        #[arg(long, value_enum, default_value_t = Direction::Desc)]
        direction: Direction,
        /// Average only each group's best N members
        #[arg(long)]
        top: Option<usize>,
    },
    /// Score dishes for the food court
    Foods {
        #[arg(long, default_value = "nutrition-points")]
        formula: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Also suggest a meal under the daily calorie target
        #[arg(long)]
        recommend: bool,
        /// Seed for a reproducible recommendation
        #[arg(long, requires = "recommend")]
        seed: Option<u64>,
    },
    /// Price one share per team
    Market {
        #[arg(long, default_value = "wellness-index")]
        formula: String,
    },
    /// Run a head-to-head challenge
    Challenge {
        #[arg(long)]
        id: u8,
        #[arg(long)]
        left: String,
        /// Omit for a solo challenge
        #[arg(long)]
        right: Option<String>,
        /// Treat contenders as team names
        #[arg(long, requires = "right")]
        teams: bool,
        /// Seed for reproducible AI variance
        #[arg(long, conflicts_with = "exact")]
        seed: Option<u64>,
        /// Compare raw scores without AI variance
        #[arg(long)]
        exact: bool,
    },
    /// Apply a JSON script of shop, points and trading commands
    Simulate {
        #[arg(long)]
        commands: PathBuf,
        /// Metric used as each player's opening balance
        #[arg(long, default_value = "wellness_score")]
        points_metric: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "composite-wellness")]
        formula: String,
        #[arg(long, default_value = "team_name")]
        group_by: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List available formulas
    Formulas,
}

fn records(data: Option<&Path>) -> anyhow::Result<Vec<EntityRecord>> {
    let path = data.context("no data file: pass --data or set WELLNESS_DATA")?;
    load::load_records(path)
}

fn log_portfolio(current: &state::GameState, roster: &[EntityRecord], formula: &Formula) {
    let stocks = match market::team_stocks(roster, formula) {
        Ok(stocks) => stocks,
        Err(err) => {
            tracing::warn!(%err, "cannot price holdings");
            return;
        }
    };
    for holding in &current.holdings {
        match stocks.iter().find(|stock| stock.ticker == holding.ticker) {
            Some(stock) => {
                let result = market::gain_loss(holding, stock.price);
                tracing::info!(
                    ticker = %holding.ticker,
                    value = holding.value(stock.price),
                    gain = result.gain,
                    percent = result.percent,
                    "holding valued"
                );
            }
            None => tracing::warn!(ticker = %holding.ticker, "no team trades under this ticker"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wellness_leaderboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let book = config::load_formula_book(cli.formulas.as_deref())?;
    let data = cli.data.as_deref();

    match cli.command {
        Commands::Leaderboard {
            formula,
            direction,
            limit,
        } => {
            let formula = book.get(&formula)?;
            let entities = records(data)?;
            let ranked = rank::rank(&report::score_entities(&entities, formula), direction);

            if ranked.is_empty() {
                println!("No players found.");
                return Ok(());
            }

            println!("Top players by {}:", formula.name);
            let with_badges = formula.name == SURVIVAL.name;
            for entry in ranked.iter().take(limit) {
                let badge = if with_badges {
                    format!(" [{}]", rank::badge(entry.item.score))
                } else {
                    String::new()
                };
                println!(
                    "{} {} ({}) {} pts{}",
                    report::medal_label(entry.rank),
                    entry.item.name,
                    entry.item.id,
                    entry.item.score,
                    badge
                );
            }
        }
        Commands::Teams {
            group_by,
            formula,
            direction,
            top,
        } => {
            let formula = book.get(&formula)?;
            let entities = records(data)?;
            let groups = aggregate::aggregate_top(
                &entities,
                aggregate::group_by(&group_by),
                |entity| compute_score(&entity.metrics, formula),
                top,
            )?;

            println!("Teams by average {} ({}):", formula.name, group_by);
            let scope = if top.is_some() { "top" } else { "across" };
            for entry in rank::rank(&groups, direction) {
                println!(
                    "{} {}: avg {:.1}, total {:.1} {} {} members",
                    report::medal_label(entry.rank),
                    entry.item.key,
                    entry.item.average,
                    entry.item.sum,
                    scope,
                    entry.item.count
                );
            }
        }
        Commands::Foods {
            formula,
            limit,
            recommend,
            seed,
        } => {
            let formula = book.get(&formula)?;
            let dishes = load::servable_dishes(records(data)?);
            let ranked = rank::rank(&report::score_entities(&dishes, formula), Direction::Desc);

            println!("Dishes by {}:", formula.name);
            for entry in ranked.iter().take(limit) {
                let calories = dishes
                    .iter()
                    .find(|dish| dish.id == entry.item.id)
                    .map(|dish| dish.metric("calories"))
                    .unwrap_or_default();
                println!(
                    "{} {} {} pts ({} kcal)",
                    report::medal_label(entry.rank),
                    entry.item.name,
                    entry.item.score,
                    calories
                );
            }

            if recommend {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let meal = state::recommend_meal(&dishes, &mut rng);
                let total: f64 = meal.iter().map(|dish| dish.metric("calories")).sum();
                println!("Recommended meal ({} of {} kcal):", total, state::CALORIE_TARGET);
                for dish in meal {
                    println!(
                        "- {} ({} kcal, {} pts)",
                        dish.name,
                        dish.metric("calories"),
                        compute_score(&dish.metrics, formula)
                    );
                }
            }
        }
        Commands::Market { formula } => {
            let formula = book.get(&formula)?;
            let entities = records(data)?;
            let stocks = market::team_stocks(&entities, formula)?;

            println!("Team stocks:");
            for entry in rank::rank(&stocks, Direction::Desc) {
                println!(
                    "{} {} ({}, {} members) ${:.2}",
                    report::medal_label(entry.rank),
                    entry.item.ticker,
                    entry.item.team,
                    entry.item.members,
                    entry.item.price
                );
            }
        }
        Commands::Challenge {
            id,
            left,
            right,
            teams,
            seed,
            exact,
        } => {
            let challenge = rivals::challenge(id)
                .with_context(|| format!("unknown challenge {id}; expected 1-5"))?;
            let entities = records(data)?;
            let mut variance = (!exact).then(|| {
                rivals::AiVariance::new(match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                })
            });

            match right {
                None => {
                    let score =
                        rivals::solo_score(&entities, challenge, &left, variance.as_mut())?;
                    println!(
                        "Solo challenge: {} scored {:.0} in {}",
                        left, score, challenge.name
                    );
                }
                Some(right) => {
                    let outcome = rivals::run_challenge(
                        &entities,
                        challenge,
                        Contender::new(&left, teams),
                        Contender::new(&right, teams),
                        variance.as_mut(),
                    )?;
                    println!(
                        "{}: {} ({:.0}) vs {} ({:.0}). Winner: {} ({} pts at stake)",
                        outcome.challenge,
                        outcome.left.name,
                        outcome.left.score,
                        outcome.right.name,
                        outcome.right.score,
                        outcome.winner.as_deref().unwrap_or("Tie"),
                        outcome.points
                    );
                }
            }
        }
        Commands::Simulate {
            commands,
            points_metric,
        } => {
            let roster = match data {
                Some(path) => load::load_records(path)?,
                None => Vec::new(),
            };
            let mut current = if roster.is_empty() {
                state::GameState::default()
            } else {
                state::GameState::from_roster(&roster, &points_metric)
            };
            let text = std::fs::read_to_string(&commands)
                .with_context(|| format!("failed to read {}", commands.display()))?;
            let script: Vec<state::Command> = serde_json::from_str(&text)
                .with_context(|| format!("invalid command script {}", commands.display()))?;

            for (step, command) in script.iter().enumerate() {
                match state::reduce(&current, command) {
                    Ok(next) => current = next,
                    Err(err) => tracing::warn!(step = step + 1, %err, "command rejected"),
                }
            }

            let totals = state::cart_totals(&current);
            tracing::info!(
                condition = state::survival_condition(current.owned_items.len()),
                cart_calories = totals.calories,
                within_target = totals.within_target,
                "simulation finished"
            );
            if !current.holdings.is_empty() && !roster.is_empty() {
                log_portfolio(&current, &roster, book.get("wellness-index")?);
            }
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        Commands::Report {
            formula,
            group_by,
            out,
        } => {
            let formula = book.get(&formula)?;
            let entities = records(data)?;
            let markdown = report::build_report(
                &entities,
                formula,
                &group_by,
                chrono::Utc::now().date_naive(),
            )?;
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Formulas => {
            for formula in book.iter() {
                let terms: Vec<String> = formula
                    .terms
                    .iter()
                    .map(|term| {
                        let sign = match term.sign {
                            Sign::Reward => '+',
                            Sign::Penalty => '-',
                        };
                        let shifted = if term.offset == 0.0 {
                            term.metric.to_string()
                        } else {
                            format!("({} - {})", term.metric, term.offset)
                        };
                        let scaled = if term.per == 1.0 {
                            shifted
                        } else {
                            format!("{shifted}/{}", term.per)
                        };
                        let clamped = match (term.floor, term.cap) {
                            (Some(floor), Some(cap)) => format!("clamp({scaled}, {floor}, {cap})"),
                            (Some(floor), None) => format!("max({scaled}, {floor})"),
                            (None, Some(cap)) => format!("min({scaled}, {cap})"),
                            (None, None) => scaled,
                        };
                        format!("{sign} {} * {clamped}", term.weight)
                    })
                    .collect();
                println!(
                    "{}: {} {} ({:?})",
                    formula.name,
                    formula.base,
                    terms.join(" "),
                    formula.rounding
                );
            }
        }
    }

    Ok(())
}
