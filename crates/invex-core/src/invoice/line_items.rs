//! Heuristic line-item scanner for layouts with column gaps.

use super::rules::patterns::{COLUMN_GAP, CURRENCY_CHARS, LINE_ITEM_ROW};
use crate::models::record::{Amount, LineItem};

/// Scan `text` for table rows.
///
/// A row is a line containing a `number whitespace number` run; its columns are
/// separated by two or more spaces. With four or more columns the third is the unit
/// price and the last the row total; with three the last is the total.
pub fn extract_line_items(text: &str) -> Vec<LineItem> {
    text.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<LineItem> {
    if !LINE_ITEM_ROW.is_match(line) {
        return None;
    }

    let columns: Vec<&str> = COLUMN_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    if columns.len() < 2 {
        return None;
    }

    let text = |s: &str| Some(Amount::Text(s.to_string()));
    let (unit_price, total) = match columns.len() {
        2 => (None, None),
        3 => (None, total_column(columns[2])),
        n => (text(columns[2]), total_column(columns[n - 1])),
    };

    Some(LineItem {
        description: Some(columns[0].to_string()),
        qty: text(columns[1]),
        unit_price,
        total,
        ..Default::default()
    })
}

/// The column as a total, if it is a plain amount once currency marks are removed.
fn total_column(column: &str) -> Option<Amount> {
    let bare = CURRENCY_CHARS.replace_all(column, "");
    bare.parse::<f64>()
        .is_ok()
        .then(|| Amount::Text(column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Option<Amount> {
        Some(Amount::Text(s.to_string()))
    }

    #[test]
    fn test_four_column_rows() {
        let items = extract_line_items(
            "Description    Qty    Price    Amount\n\
             Widget A    2    10.00    20.00\n\
             Consulting hours    5    1,200.00    ₹6,000.00\n",
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description.as_deref(), Some("Widget A"));
        assert_eq!(items[0].qty, text("2"));
        assert_eq!(items[0].unit_price, text("10.00"));
        assert_eq!(items[0].total, text("20.00"));
        assert_eq!(items[1].total, text("₹6,000.00"));
    }

    #[test]
    fn test_three_column_row() {
        let items = extract_line_items("Setup fee  1  150");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, None);
        assert_eq!(items[0].total, text("150"));
    }

    #[test]
    fn test_non_numeric_total_is_dropped() {
        let items = extract_line_items("Box of 12 5  units  n/a");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total, None);
    }

    #[test]
    fn test_prose_is_ignored() {
        assert!(extract_line_items("Thank you for your business").is_empty());
        assert!(extract_line_items("Invoice Number: INV-1").is_empty());
        assert!(extract_line_items("").is_empty());
    }
}
