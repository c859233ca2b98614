//! SPARQL query command handler

use anyhow::{Context, Result};
use colored::*;
use std::collections::BTreeSet;
use std::fs;
use std::time::Instant;

use super::{OutputFormat, QueryCommands};
use crate::cli::commands::common::{Project, connect};
use ontosync::api::{Binding, KnowledgeBaseAdapter};

pub async fn handle_query_command(args: QueryCommands) -> Result<()> {
    if args.query.is_none() && args.file.is_none() {
        anyhow::bail!("Either provide a query string or use --file to specify a query file");
    }
    if args.query.is_some() && args.file.is_some() {
        anyhow::bail!("Cannot specify both query string and --file option");
    }

    let query_text = match (&args.query, &args.file) {
        (Some(query), _) => query.clone(),
        (None, Some(file_path)) => {
            if !file_path.exists() {
                anyhow::bail!("Query file does not exist: {}", file_path.display());
            }
            let content = fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read query file: {}", file_path.display()))?;
            content.trim().to_string()
        }
        (None, None) => unreachable!("validated above"),
    };
    if query_text.trim().is_empty() {
        anyhow::bail!("Query is empty");
    }

    let project = Project::load(args.connection.config.as_deref())?;
    let adapter = connect(&project, &args.connection).await?;

    let start = Instant::now();
    let bindings = adapter
        .query(&query_text)
        .await
        .context("Failed to execute query")?;
    log::info!(
        "{} results in {:.2}ms",
        bindings.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let formatted = format_output(&bindings, args.format)?;

    match args.output {
        Some(output_path) => {
            fs::write(&output_path, &formatted)
                .with_context(|| format!("Failed to write output to: {}", output_path.display()))?;
            println!(
                "Results saved to: {}",
                output_path.display().to_string().bright_green()
            );
        }
        None => print!("{}", formatted),
    }

    Ok(())
}

/// Every variable bound in any row, sorted by name.
/// Bindings are ordered maps, so the query's projection order is not kept.
fn columns(bindings: &[Binding]) -> Vec<String> {
    bindings
        .iter()
        .flat_map(|binding| binding.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn format_output(bindings: &[Binding], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(bindings).context("Failed to format JSON output")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => to_csv(bindings),
        OutputFormat::Table => Ok(to_table(bindings)),
    }
}

fn to_csv(bindings: &[Binding]) -> Result<String> {
    let columns = columns(bindings);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&columns).context("Failed to write CSV header")?;
    for binding in bindings {
        writer
            .write_record(columns.iter().map(|c| binding.get(c).map(String::as_str).unwrap_or("")))
            .context("Failed to write CSV row")?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn to_table(bindings: &[Binding]) -> String {
    if bindings.is_empty() {
        return "No results\n".to_string();
    }

    let columns = columns(bindings);
    let widths: Vec<usize> = columns
        .iter()
        .map(|c| {
            bindings
                .iter()
                .filter_map(|b| b.get(c))
                .map(|v| v.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    out.push_str(&header.join("  ").bold().to_string());
    out.push('\n');

    for binding in bindings {
        let row: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", binding.get(c).map(String::as_str).unwrap_or(""), w = *w))
            .collect();
        out.push_str(row.join("  ").trim_end());
        out.push('\n');
    }

    out.push_str(&format!("{} rows\n", bindings.len()).dimmed().to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(pairs: &[(&str, &str)]) -> Binding {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_csv_fills_missing_columns() {
        let rows = vec![
            binding(&[("item", "Q1"), ("label", "Cat, domestic")]),
            binding(&[("item", "Q2")]),
        ];

        let csv = to_csv(&rows).unwrap();
        assert_eq!(csv, "item,label\nQ1,\"Cat, domestic\"\nQ2,\n");
    }

    #[test]
    fn test_columns_are_sorted_union() {
        let rows = vec![
            binding(&[("label", "Cat"), ("item", "Q1")]),
            binding(&[("description", "pet"), ("item", "Q2")]),
        ];

        assert_eq!(columns(&rows), vec!["description", "item", "label"]);
    }

    #[test]
    fn test_table_lists_every_row() {
        colored::control::set_override(false);
        let rows = vec![binding(&[("item", "Q1")]), binding(&[("item", "Q22")])];

        let table = to_table(&rows);
        assert!(table.starts_with("item"));
        assert!(table.contains("Q22"));
        assert!(table.ends_with("2 rows\n"));
    }
}
