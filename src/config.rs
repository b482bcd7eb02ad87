use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::formula::{Formula, FormulaBook};

#[derive(Debug, Default, Deserialize)]
struct FormulaFile {
    #[serde(default, rename = "formula")]
    formulas: Vec<Formula>,
}

pub fn parse_formulas(text: &str) -> anyhow::Result<Vec<Formula>> {
    let file: FormulaFile = toml::from_str(text).context("formula file is not valid TOML")?;
    for formula in &file.formulas {
        formula.validate()?;
    }
    Ok(file.formulas)
}

/// Built-in formulas, overlaid with those defined in `path` when given.
pub fn load_formula_book(path: Option<&Path>) -> anyhow::Result<FormulaBook> {
    let mut book = FormulaBook::default();
    let Some(path) = path else {
        return Ok(book);
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read formulas from {}", path.display()))?;
    let formulas = parse_formulas(&text)
        .with_context(|| format!("invalid formulas in {}", path.display()))?;

    for formula in formulas {
        tracing::info!(name = %formula.name, terms = formula.terms.len(), "formula loaded");
        book.insert(formula)?;
    }
    Ok(book)
}
