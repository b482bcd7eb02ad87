use std::collections::BTreeMap;

/// Named numeric metrics of one record. Lookups of absent metrics read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricMap(BTreeMap<String, f64>);

impl MetricMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.0.insert(name.into(), value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetricMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut metrics = MetricMap::new();
        for (name, value) in iter {
            metrics.insert(name, value);
        }
        metrics
    }
}

/// One scoreable subject (employee, player or dish) after ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub fields: BTreeMap<String, String>,
    pub metrics: MetricMap,
}

impl EntityRecord {
    /// Raw field value, `None` when the column is absent or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    /// Higher score is better.
    #[default]
    Desc,
    /// Lower score is better (e.g. BMI).
    Asc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub id: String,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub key: String,
    pub count: usize,
    pub sum: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<T> {
    pub rank: usize,
    pub item: T,
}
