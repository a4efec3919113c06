use crate::record::ImageRecord;
use serde_json::json;
use std::fmt::Write;
use std::path::Path;

pub fn format_list_text(records: &[&ImageRecord], show_captions: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "LIST matched {} image{}",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );

    if records.is_empty() {
        let _ = writeln!(out, "No matching images found.");
        return out;
    }
    out.push('\n');

    for record in records {
        let dimensions = if record.width == 0 && record.height == 0 {
            "?x?".to_string()
        } else {
            format!("{}x{}", record.width, record.height)
        };
        let modified = record
            .modified
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:>9}  {:>2}★ {:>3} tags  {}  {}",
            dimensions,
            record.stars,
            record.tag_count(),
            modified,
            record.path
        );
        if show_captions {
            let caption = if record.has_caption() {
                record.caption.replace('\n', "\\n")
            } else {
                "<no caption>".to_string()
            };
            let _ = writeln!(out, "           {caption}");
        }
    }

    out
}

pub fn format_list_json(
    dir: &Path,
    filter_source: Option<&str>,
    records: &[&ImageRecord],
) -> String {
    serde_json::to_string_pretty(&json!({
        "list": {
            "dir": dir.display().to_string(),
            "filter": filter_source,
            "matches": records.len(),
            "records": records,
        }
    }))
    .unwrap_or_else(|_| "{\"list\":{\"error\":\"failed to serialize list output\"}}".into())
}
