use crate::record::ImageRecord;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

/// Counts how many records carry each tag, most frequent first; ties break
/// alphabetically.
pub fn tag_frequencies(records: &[&ImageRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for tag in &record.tags {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }
    let mut frequencies: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequencies
}

pub fn format_stats_text(records: &[&ImageRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "DATASET SUMMARY: {} image{}",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );

    if records.is_empty() {
        let _ = writeln!(out, "No images found.");
        return out;
    }

    let captioned = records.iter().filter(|r| r.has_caption()).count();
    let with_markings = records.iter().filter(|r| !r.markings.is_empty()).count();
    let distinct_tags = tag_frequencies(records).len();
    let total_tags: usize = records.iter().map(|r| r.tag_count()).sum();
    let total_chars: usize = records.iter().map(|r| r.caption_chars()).sum();
    let count = records.len() as f64;

    out.push('\n');
    let mut overview = create_styled_table(&["Metric", "Value"]);
    overview.add_row(vec![Cell::new("Images"), Cell::new(records.len())]);
    overview.add_row(vec![Cell::new("Captioned"), Cell::new(captioned)]);
    overview.add_row(vec![
        Cell::new("Without caption"),
        Cell::new(records.len() - captioned),
    ]);
    overview.add_row(vec![Cell::new("With markings"), Cell::new(with_markings)]);
    overview.add_row(vec![Cell::new("Distinct tags"), Cell::new(distinct_tags)]);
    overview.add_row(vec![
        Cell::new("Avg tags per image"),
        Cell::new(format!("{:.1}", total_tags as f64 / count)),
    ]);
    overview.add_row(vec![
        Cell::new("Avg caption chars"),
        Cell::new(format!("{:.1}", total_chars as f64 / count)),
    ]);
    let _ = writeln!(out, "{overview}");

    // Star ratings
    let max_stars = records.iter().map(|r| r.stars).max().unwrap_or(0).max(5);
    let mut stars_table = create_styled_table(&["Stars", "Images"]);
    for stars in 0..=max_stars {
        let matching = records.iter().filter(|r| r.stars == stars).count();
        if matching > 0 || stars <= 5 {
            stars_table.add_row(vec![Cell::new(stars), Cell::new(matching)]);
        }
    }
    let _ = writeln!(out, "\nSTAR RATINGS");
    let _ = writeln!(out, "{stars_table}");

    // Most common pixel dimensions
    let mut dimension_counts: HashMap<(u32, u32), usize> = HashMap::new();
    for record in records {
        *dimension_counts
            .entry((record.width, record.height))
            .or_insert(0) += 1;
    }
    let mut dimensions: Vec<((u32, u32), usize)> = dimension_counts.into_iter().collect();
    dimensions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut dims_table = create_styled_table(&["Size", "Images"]);
    for ((width, height), dim_count) in dimensions.iter().take(10) {
        let label = if *width == 0 && *height == 0 {
            "unreadable".to_string()
        } else {
            format!("{width}x{height}")
        };
        dims_table.add_row(vec![Cell::new(label), Cell::new(dim_count)]);
    }
    let _ = writeln!(out, "\nDIMENSIONS (top 10)");
    let _ = writeln!(out, "{dims_table}");

    // Marking labels with their crop outcomes
    if with_markings > 0 {
        let mut label_counts: HashMap<&str, (usize, usize, usize)> = HashMap::new();
        for record in records {
            for marking in &record.markings {
                let entry = label_counts.entry(&marking.label).or_insert((0, 0, 0));
                entry.0 += 1;
                if marking.will_be_cropped_out {
                    entry.1 += 1;
                }
                if marking.remains_visible_after_crop {
                    entry.2 += 1;
                }
            }
        }
        let mut labels: Vec<(&str, (usize, usize, usize))> =
            label_counts.into_iter().collect();
        labels.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));
        let mut markings_table =
            create_styled_table(&["Label", "Count", "Cropped out", "Visible"]);
        for (label, (total, cropped, visible)) in labels {
            markings_table.add_row(vec![
                Cell::new(label),
                Cell::new(total),
                Cell::new(cropped),
                Cell::new(visible),
            ]);
        }
        let _ = writeln!(out, "\nMARKINGS");
        let _ = writeln!(out, "{markings_table}");
    }

    out
}

pub fn format_stats_json(dir: &Path, filter_source: Option<&str>, records: &[&ImageRecord]) -> String {
    let captioned = records.iter().filter(|r| r.has_caption()).count();
    let with_markings = records.iter().filter(|r| !r.markings.is_empty()).count();
    let frequencies = tag_frequencies(records);
    let total_tags: usize = records.iter().map(|r| r.tag_count()).sum();

    let mut star_counts: HashMap<u32, usize> = HashMap::new();
    for record in records {
        *star_counts.entry(record.stars).or_insert(0) += 1;
    }
    let mut stars: Vec<(u32, usize)> = star_counts.into_iter().collect();
    stars.sort_by_key(|(rating, _)| *rating);

    serde_json::to_string_pretty(&json!({
        "stats": {
            "dir": dir.display().to_string(),
            "filter": filter_source,
            "images": records.len(),
            "captioned": captioned,
            "with_markings": with_markings,
            "distinct_tags": frequencies.len(),
            "total_tags": total_tags,
            "stars": stars
                .iter()
                .map(|(rating, count)| json!({"rating": rating, "images": count}))
                .collect::<Vec<_>>(),
        }
    }))
    .unwrap_or_else(|_| "{\"stats\":{\"error\":\"failed to serialize stats output\"}}".into())
}

pub fn format_tags_text(records: &[&ImageRecord], top: usize) -> String {
    let frequencies = tag_frequencies(records);
    let shown = displayed_count(frequencies.len(), top);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "TAGS: {} distinct tag{} across {} image{}",
        frequencies.len(),
        if frequencies.len() == 1 { "" } else { "s" },
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );

    if frequencies.is_empty() {
        return out;
    }
    out.push('\n');

    let mut table = create_styled_table(&["Tag", "Images", "%"]);
    for (tag, count) in frequencies.iter().take(shown) {
        let percent = *count as f64 / records.len() as f64 * 100.0;
        table.add_row(vec![
            Cell::new(tag),
            Cell::new(count),
            Cell::new(format!("{percent:.1}")),
        ]);
    }
    let _ = writeln!(out, "{table}");

    if shown < frequencies.len() {
        let _ = writeln!(
            out,
            "... {} more tag{} hidden by --top {}",
            frequencies.len() - shown,
            if frequencies.len() - shown == 1 { "" } else { "s" },
            top
        );
    }

    out
}

pub fn format_tags_json(dir: &Path, records: &[&ImageRecord], top: usize) -> String {
    let frequencies = tag_frequencies(records);
    let shown = displayed_count(frequencies.len(), top);

    serde_json::to_string_pretty(&json!({
        "tags": {
            "dir": dir.display().to_string(),
            "images": records.len(),
            "distinct": frequencies.len(),
            "shown": shown,
            "frequencies": frequencies
                .iter()
                .take(shown)
                .map(|(tag, count)| json!({"tag": tag, "images": count}))
                .collect::<Vec<_>>(),
        }
    }))
    .unwrap_or_else(|_| "{\"tags\":{\"error\":\"failed to serialize tags output\"}}".into())
}

fn displayed_count(total: usize, top: usize) -> usize {
    if top == 0 { total } else { top.min(total) }
}
