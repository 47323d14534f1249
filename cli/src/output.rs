use std::io::{self, Write};

use pocket_core::{SavedItem, SavedItems};

/// One line per item: title, URL and when it was saved.
pub fn format_item(item: &SavedItem) -> String {
    let url = item.display_url().unwrap_or("-");
    let added = item
        .added_at()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("Title: {}, URL: {url}, Added: {added}", item.display_title())
}

pub fn print_items(out: &mut impl Write, items: &SavedItems) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No saved items.");
    }
    for item in items.iter() {
        writeln!(out, "{}", format_item(item))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: serde_json::Value) -> SavedItem {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn formats_title_url_and_date() {
        let line = format_item(&item(serde_json::json!({
            "resolved_title": "A",
            "resolved_url": "u1",
            "time_added": "100"
        })));
        assert_eq!(line, "Title: A, URL: u1, Added: 1970-01-01 00:01:40 UTC");
    }

    #[test]
    fn missing_fields_have_placeholders() {
        let line = format_item(&item(serde_json::json!({})));
        assert_eq!(line, "Title: Untitled, URL: -, Added: unknown");
    }

    #[test]
    fn empty_collection_says_so() {
        let mut out = Vec::new();
        print_items(&mut out, &SavedItems::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No saved items.\n");
    }
}
