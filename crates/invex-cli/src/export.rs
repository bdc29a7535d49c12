//! Output formats for extraction results.

use invex_core::{extract_line_items, Amount, ExtractionResult, LineItem};

/// Output format for a single result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full result as JSON
    Json,
    /// Line items as CSV
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => line_items_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// Line items from the structured record when it has any, else from the text scanner.
pub fn line_items(result: &ExtractionResult) -> Vec<LineItem> {
    result
        .llm_parsed
        .as_ref()
        .and_then(|record| record.line_items.clone())
        .filter(|items| !items.is_empty())
        .unwrap_or_else(|| extract_line_items(&result.raw_text))
}

pub fn line_items_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["description", "qty", "unit_price", "total"])?;

    for item in line_items(result) {
        wtr.write_record([
            item.description.clone().unwrap_or_default(),
            amount(&item.qty),
            amount(&item.unit_price),
            amount(&item.total),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn amount(value: &Option<Amount>) -> String {
    value.as_ref().map(|a| a.to_string()).unwrap_or_default()
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

pub fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();
    let basic = &result.parsed_basic;

    output.push_str(&format!("{}\n", result.message));
    output.push_str(&format!(
        "Pages: {}{}\n",
        result.page_count,
        if result.scanned { " (scanned)" } else { "" }
    ));
    output.push('\n');

    output.push_str("Baseline:\n");
    output.push_str(&format!("  Invoice number: {}\n", field(&basic.invoice_number)));
    output.push_str(&format!("  Invoice date:   {}\n", field(&basic.invoice_date)));
    output.push_str(&format!("  Total amount:   {}\n", field(&basic.total_amount)));

    if let Some(record) = &result.llm_parsed {
        output.push('\n');
        output.push_str("Model:\n");
        output.push_str(&format!("  Invoice number: {}\n", field(&record.invoice_number)));
        output.push_str(&format!("  Invoice date:   {}\n", field(&record.invoice_date)));
        output.push_str(&format!(
            "  Total amount:   {}\n",
            record
                .total_amount
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
        output.push_str(&format!("  Currency:       {}\n", field(&record.currency)));
        output.push_str(&format!("  Vendor:         {}\n", field(&record.vendor)));
        output.push_str(&format!("  Customer:       {}\n", field(&record.customer)));
    }

    if let Some(failure) = &result.llm_error {
        output.push_str(&format!("\nModel error ({}): {}\n", failure.error, failure.detail));
    }

    let items = line_items(result);
    if !items.is_empty() {
        output.push_str(&format!("\nLine items ({}):\n", items.len()));
        for item in &items {
            output.push_str(&format!(
                "  {} x{} = {}\n",
                field(&item.description),
                amount(&item.qty),
                amount(&item.total)
            ));
        }
    }

    for warning in &result.warnings {
        match warning.page {
            Some(page) => output.push_str(&format!("\nWarning (page {}): {}", page, warning.detail)),
            None => output.push_str(&format!("\nWarning: {}", warning.detail)),
        }
    }
    if !result.warnings.is_empty() {
        output.push('\n');
    }

    output
}
