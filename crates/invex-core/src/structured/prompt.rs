//! Extraction prompt construction.

/// Markers around the embedded document text.
pub const TEXT_BEGIN: &str = "<<<INVOICE_TEXT_BEGIN>>>";
pub const TEXT_END: &str = "<<<INVOICE_TEXT_END>>>";

/// Target fields and their expected JSON types, in prompt order.
pub const TARGET_FIELDS: &[(&str, &str)] = &[
    ("invoice_number", "string or null"),
    ("invoice_date", "string or null"),
    ("total_amount", "number or string or null"),
    ("currency", "string or null"),
    ("vendor", "string or null"),
    ("customer", "string or null"),
    ("tax_amount", "number or string or null"),
    (
        "line_items",
        "array of objects with keys description, qty, unit_price, total; or null",
    ),
];

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the instruction prompt for one document.
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let mut prompt = String::from(
        "You are an invoice extraction assistant. Extract the following fields from the \
         invoice text and return ONLY one valid JSON object with exactly these keys:\n\n",
    );

    for (name, kind) in TARGET_FIELDS {
        prompt.push_str(&format!("- {} ({})\n", name, kind));
    }

    prompt.push_str(
        "\nUse null for any field that is not present in the text. Do not wrap the JSON in \
         markdown code fences and do not add any commentary before or after it.\n\n",
    );
    prompt.push_str("Invoice text:\n");
    prompt.push_str(TEXT_BEGIN);
    prompt.push('\n');
    prompt.push_str(truncate_chars(text, max_chars));
    prompt.push('\n');
    prompt.push_str(TEXT_END);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_field() {
        let prompt = build_prompt("Invoice Number: 7", 40_000);
        for (name, _) in TARGET_FIELDS {
            assert!(prompt.contains(&format!("- {} (", name)), "missing {}", name);
        }
        assert!(prompt.contains("null"));
        assert!(prompt.contains("markdown"));
    }

    #[test]
    fn test_text_between_markers() {
        let prompt = build_prompt("line one\nline two", 40_000);
        let begin = prompt.find(TEXT_BEGIN).unwrap() + TEXT_BEGIN.len();
        let end = prompt.find(TEXT_END).unwrap();
        assert_eq!(prompt[begin..end].trim(), "line one\nline two");
    }

    #[test]
    fn test_truncation_is_char_safe() {
        assert_eq!(truncate_chars("złoty€€", 3), "zło");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");

        let long = "é".repeat(50);
        let prompt = build_prompt(&long, 10);
        assert!(prompt.contains(&"é".repeat(10)));
        assert!(!prompt.contains(&"é".repeat(11)));
    }
}
