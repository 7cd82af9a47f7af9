//! Machine-readable output: CSV, TSV and pretty JSON with nulls omitted.
//!
//! Text output is command specific and printed by each command.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn is_text(self) -> bool {
        self == OutputFormat::Text
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn write_delimited<T: Serialize>(records: &[T], delimiter: u8, out: &mut dyn Write) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    for record in records {
        writer.serialize(record).context("failed to write record")?;
    }
    writer.flush().context("failed to flush output")?;
    Ok(())
}

/// Write `records` in a machine-readable format. Does nothing for
/// [`OutputFormat::Text`].
pub fn write_records<T: Serialize>(
    format: OutputFormat,
    records: &[T],
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Text => Ok(()),
        OutputFormat::Csv => write_delimited(records, b',', out),
        OutputFormat::Tsv => write_delimited(records, b'\t', out),
        OutputFormat::Json => {
            let value = strip_nulls(serde_json::to_value(records).context("failed to encode JSON")?);
            serde_json::to_writer_pretty(&mut *out, &value).context("failed to write JSON")?;
            writeln!(out)?;
            Ok(())
        }
    }
}

/// Print `records` to stdout in `format`; text mode renders a table.
pub fn print_records<T: Serialize + Tabled>(format: OutputFormat, records: &[T]) -> Result<()> {
    if format.is_text() {
        if !records.is_empty() {
            let mut table = Table::new(records);
            table.with(Style::rounded());
            println!("{table}");
        }
        return Ok(());
    }
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_records(format, records, &mut lock)
}

pub fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
