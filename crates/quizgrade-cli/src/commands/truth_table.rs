//! The `quizgrade truth-table` command.

use anyhow::{Context, Result};

use quizgrade_core::expression::{truth_table, Expression, ExpressionFormat};

pub fn execute(text: String, variables: Option<String>, symbolic: bool) -> Result<()> {
    let expression = Expression::parse(&text).context("failed to parse expression")?;

    let variables: Vec<String> = match variables {
        Some(list) => list
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        None => expression.variables(),
    };

    let rows = truth_table(&expression, &variables)?;

    let format = if symbolic {
        ExpressionFormat::Symbolic
    } else {
        ExpressionFormat::Keyword
    };
    println!("{}", expression.render(format));

    use comfy_table::{Cell, Table};
    let mut table = Table::new();
    let mut header: Vec<String> = variables.clone();
    header.push("Result".to_string());
    table.set_header(header);

    let bit = |b: bool| if b { "T" } else { "F" };
    for row in &rows {
        let mut cells: Vec<Cell> = variables
            .iter()
            .map(|v| Cell::new(bit(row.inputs.get(v).copied().unwrap_or(false))))
            .collect();
        cells.push(Cell::new(bit(row.output)));
        table.add_row(cells);
    }

    println!("{table}");
    Ok(())
}
