use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

use crate::models::{EntityRecord, MetricMap};

const ID_COLUMNS: &[&str] = &["employee_id", "id"];
const NAME_COLUMNS: &[&str] = &["name", "dish_name"];
const METRIC_ALIASES: [(&str, &str); 1] = [("fats", "fat")];

/// `"Team Name"` -> `"team_name"`, `"Fats (g)"` -> `"fat"`. A trailing
/// parenthesized unit is dropped and a few column aliases are folded in.
pub fn normalize_header(header: &str) -> String {
    let mut header = header.trim();
    if let Some(open) = header.rfind('(').filter(|_| header.ends_with(')')) {
        let stem = header[..open].trim_end();
        if !stem.is_empty() {
            header = stem;
        }
    }

    let normalized: String = header
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    METRIC_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Lenient numeric read: anything that is not a finite number is `None`.
pub fn parse_metric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Build a typed record from one raw row. Returns `None` for blank rows.
pub fn record_from_fields(raw: BTreeMap<String, String>) -> Option<EntityRecord> {
    let fields: BTreeMap<String, String> = raw
        .into_iter()
        .map(|(header, value)| (normalize_header(&header), value.trim().to_string()))
        .collect();

    if fields.values().all(|value| value.is_empty()) {
        return None;
    }

    let metrics: MetricMap = fields
        .iter()
        .filter_map(|(name, value)| parse_metric(value).map(|number| (name.clone(), number)))
        .collect();

    let first_of = |columns: &[&str]| {
        columns
            .iter()
            .filter_map(|column| fields.get(*column))
            .find(|value| !value.is_empty())
            .cloned()
    };

    let id = first_of(ID_COLUMNS).unwrap_or_else(|| format!("row-{}", Uuid::new_v4()));
    let name = first_of(NAME_COLUMNS).unwrap_or_else(|| id.clone());

    Some(EntityRecord {
        id,
        name,
        fields,
        metrics,
    })
}

fn finish(rows: Vec<BTreeMap<String, String>>, source: &Path) -> Vec<EntityRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let Some(record) = record_from_fields(row) else {
            tracing::warn!(row = index + 1, source = %source.display(), "skipping blank row");
            continue;
        };
        if !seen.insert(record.id.clone()) {
            tracing::warn!(id = %record.id, source = %source.display(), "duplicate record id");
        }
        records.push(record);
    }

    tracing::debug!(count = records.len(), source = %source.display(), "records loaded");
    records
}

pub fn load_csv(path: &Path) -> anyhow::Result<Vec<EntityRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<BTreeMap<String, String>>() {
        rows.push(result.with_context(|| format!("malformed row in {}", path.display()))?);
    }

    Ok(finish(rows, path))
}

pub fn load_json(path: &Path) -> anyhow::Result<Vec<EntityRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let values: Vec<BTreeMap<String, serde_json::Value>> = serde_json::from_str(&text)
        .with_context(|| format!("{} must hold an array of objects", path.display()))?;

    let rows = values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::String(text) => text,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect()
        })
        .collect();

    Ok(finish(rows, path))
}

/// Keep dishes that can be served: named, with positive calories.
pub fn servable_dishes(records: Vec<EntityRecord>) -> Vec<EntityRecord> {
    let before = records.len();
    let dishes: Vec<EntityRecord> = records
        .into_iter()
        .filter(|record| {
            NAME_COLUMNS.iter().any(|column| record.field(column).is_some())
                && record.metric("calories") > 0.0
        })
        .collect();
    if dishes.len() < before {
        tracing::debug!(dropped = before - dishes.len(), "unnamed or zero-calorie dishes skipped");
    }
    dishes
}

/// Load records from a `.json` file, or CSV for anything else.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<EntityRecord>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        load_json(path)
    } else {
        load_csv(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn headers_are_normalized() {
        assert_eq!(normalize_header(" Team_Name "), "team_name");
        assert_eq!(normalize_header("Step Count"), "step_count");
        assert_eq!(normalize_header("Calories-Burned"), "calories_burned");
        assert_eq!(normalize_header("Fats"), "fat");
        assert_eq!(normalize_header("Fats (g)"), "fat");
        assert_eq!(normalize_header("Calories (kcal)"), "calories");
        assert_eq!(normalize_header("(Notes)"), "(notes)");
    }

    #[test]
    fn nutrition_headers_with_units_score() {
        use crate::formula::{compute_score, NUTRITION_POINTS};

        let record = record_from_fields(row(&[
            ("Dish Name", "Dal Tadka"),
            ("Calories (kcal)", "300"),
            ("Protein (g)", "10"),
            ("Fats (g)", "5"),
            ("Carbohydrates (g)", "40"),
        ]))
        .unwrap();
        assert_eq!(record.name, "Dal Tadka");
        assert_eq!(record.metric("carbohydrates"), 40.0);
        assert_eq!(compute_score(&record.metrics, &NUTRITION_POINTS), 104.0);
    }

    #[test]
    fn unnamed_and_zero_calorie_dishes_are_not_served() {
        let records = [
            row(&[("Dish Name", "Chai"), ("Calories (kcal)", "90")]),
            row(&[("Dish Name", "Water"), ("Calories (kcal)", "0")]),
            row(&[("Dish Name", ""), ("Calories (kcal)", "250")]),
            row(&[("Dish Name", "Mystery"), ("Calories (kcal)", "n/a")]),
        ]
        .into_iter()
        .filter_map(record_from_fields)
        .collect();

        let dishes = servable_dishes(records);
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name, "Chai");
    }

    #[test]
    fn numbers_are_coerced_leniently() {
        assert_eq!(parse_metric(" 42 "), Some(42.0));
        assert_eq!(parse_metric("3.5"), Some(3.5));
        assert_eq!(parse_metric("abc"), None);
        assert_eq!(parse_metric(""), None);
        assert_eq!(parse_metric("NaN"), None);
    }

    #[test]
    fn record_reads_identity_and_metrics() {
        let record = record_from_fields(row(&[
            ("Employee_ID", "E001"),
            ("Name", "Maya Neon"),
            ("Team_Name", "Ops"),
            ("Wellness_Score", "85"),
            ("HRV", "n/a"),
        ]))
        .unwrap();

        assert_eq!(record.id, "E001");
        assert_eq!(record.name, "Maya Neon");
        assert_eq!(record.field("team_name"), Some("Ops"));
        assert_eq!(record.metric("wellness_score"), 85.0);
        assert_eq!(record.metric("hrv"), 0.0);
        assert!(!record.metrics.contains("hrv"));
    }

    #[test]
    fn dishes_without_ids_get_generated_ones() {
        let record =
            record_from_fields(row(&[("Dish_Name", "Lentil Soup"), ("Protein", "18")])).unwrap();
        assert!(record.id.starts_with("row-"));
        assert_eq!(record.name, "Lentil Soup");
    }

    #[test]
    fn blank_rows_are_dropped() {
        assert!(record_from_fields(row(&[("Name", " "), ("Team_Name", "")])).is_none());
    }

    #[test]
    fn loads_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Employee_ID,Name,Team_Name,Wellness_Score,Food_Score").unwrap();
        writeln!(file, "E1,Avery Lee,Ops,80,70").unwrap();
        writeln!(file, ",,,,").unwrap();
        writeln!(file, "E2,Jules Moreno,Dev,not-a-number,90").unwrap();
        file.flush().unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].metric("wellness_score"), 0.0);
        assert_eq!(records[1].metric("food_score"), 90.0);
    }

    #[test]
    fn loads_json_file_with_mixed_value_types() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"Employee_ID": "E9", "Name": "Kiara Patel", "Step_Count": 9120, "BMI": "22.4", "Role": null}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metric("step_count"), 9120.0);
        assert_eq!(records[0].metric("bmi"), 22.4);
        assert_eq!(records[0].field("role"), None);
    }
}
