use std::collections::HashMap;

use crate::error::ScoringError;
use crate::models::{EntityRecord, GroupAggregate};

/// Key function reading a record field such as `team_name` or `role`.
pub fn group_by(field: &str) -> impl Fn(&EntityRecord) -> Option<&str> + '_ {
    move |entity| entity.field(field)
}

/// Partition `entities` by `key_fn` and reduce each partition to its sum and
/// average of `score_fn`. Groups come back in first-seen key order.
pub fn aggregate<K, S>(
    entities: &[EntityRecord],
    key_fn: K,
    score_fn: S,
) -> Result<Vec<GroupAggregate>, ScoringError>
where
    K: Fn(&EntityRecord) -> Option<&str>,
    S: Fn(&EntityRecord) -> f64,
{
    aggregate_top(entities, key_fn, score_fn, None)
}

/// Like [`aggregate`], but with `top = Some(n)` each group is reduced over its
/// `n` highest scores only; `count` is then the number of scores averaged.
pub fn aggregate_top<K, S>(
    entities: &[EntityRecord],
    key_fn: K,
    score_fn: S,
    top: Option<usize>,
) -> Result<Vec<GroupAggregate>, ScoringError>
where
    K: Fn(&EntityRecord) -> Option<&str>,
    S: Fn(&EntityRecord) -> f64,
{
    if top == Some(0) {
        return Err(ScoringError::InvalidInput(
            "top-N aggregation needs at least one member".into(),
        ));
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();

    for entity in entities {
        let key = key_fn(entity)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ScoringError::InvalidInput(format!("{} ({}) has no group key", entity.name, entity.id))
            })?;

        let score = score_fn(entity);
        match positions.get(key) {
            Some(&index) => groups[index].1.push(score),
            None => {
                positions.insert(key.to_string(), groups.len());
                groups.push((key.to_string(), vec![score]));
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, mut scores)| {
            if let Some(n) = top {
                scores.sort_by(|a, b| b.total_cmp(a));
                scores.truncate(n);
            }
            let count = scores.len();
            assert!(count > 0, "group {key} materialized without members");
            let sum: f64 = scores.iter().sum();
            GroupAggregate {
                key,
                count,
                sum,
                average: sum / count as f64,
            }
        })
        .collect())
}
