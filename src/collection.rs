use crate::config::CuratorConfig;
use crate::filter::CompiledFilter;
use crate::record::{ImageRecord, Marking};
use chrono::{DateTime, Local};
use indicatif::ProgressBar;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Dataset directory '{path}' does not exist or is not a directory")]
    NotADirectory { path: String },

    #[error("Failed to walk dataset directory '{path}': {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Optional sidecar metadata stored next to the image as
/// `<stem>.<metadata_extension>`. Everything the filter engine reads about
/// markings (labels, kinds, confidence, crop facts) comes from here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SidecarMetadata {
    stars: u32,
    markings: Vec<Marking>,
}

/// Walks the dataset directory and builds one record per image file, in
/// path order. Unreadable captions, metadata or image headers degrade to
/// empty values; only a failed directory walk aborts the scan.
pub fn scan_dataset(
    root: &Path,
    config: &CuratorConfig,
    show_progress: bool,
) -> Result<Vec<ImageRecord>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.display().to_string(),
        });
    }

    let mut walker = WalkDir::new(root).sort_by_file_name();
    if !config.dataset.recursive {
        walker = walker.max_depth(1);
    }

    let mut image_paths: Vec<PathBuf> = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: root.display().to_string(),
            source,
        })?;
        if entry.file_type().is_file()
            && has_image_extension(entry.path(), &config.dataset.image_extensions)
        {
            image_paths.push(entry.into_path());
        }
    }

    let progress = if show_progress {
        ProgressBar::new(image_paths.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(image_paths.len());
    for path in &image_paths {
        records.push(load_record(path, config));
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(records)
}

/// Applies a compiled filter, preserving the scan order. `None` keeps every
/// record, matching the behavior of an empty filter box.
pub fn apply_filter<'a>(
    records: &'a [ImageRecord],
    filter: Option<&CompiledFilter>,
) -> Vec<&'a ImageRecord> {
    match filter {
        None => records.iter().collect(),
        Some(filter) => records.iter().filter(|r| filter.matches(r)).collect(),
    }
}

/// Splits a caption into distinct tags, preserving first-seen order.
pub fn split_tags(caption: &str, separator: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut tags = Vec::new();
    for part in caption.split(separator) {
        let tag = part.trim();
        if !tag.is_empty() && seen.insert(tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|known| known == &ext))
}

fn load_record(path: &Path, config: &CuratorConfig) -> ImageRecord {
    let caption = read_caption(path, &config.dataset.caption_extension);
    let tags = split_tags(&caption, &config.dataset.tag_separator);
    let (width, height) = read_dimensions(path);
    let metadata = read_sidecar_metadata(path, &config.dataset.metadata_extension);
    let modified = fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Local>::from);

    ImageRecord {
        path: path.display().to_string(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        directory: path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        caption,
        tags,
        width,
        height,
        stars: metadata.stars,
        markings: metadata.markings,
        modified,
    }
}

fn read_caption(image_path: &Path, extension: &str) -> String {
    let caption_path = image_path.with_extension(extension);
    fs::read_to_string(&caption_path)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn read_sidecar_metadata(image_path: &Path, extension: &str) -> SidecarMetadata {
    let metadata_path = image_path.with_extension(extension);
    let Ok(raw) = fs::read_to_string(&metadata_path) else {
        return SidecarMetadata::default();
    };
    match serde_json::from_str(&raw) {
        Ok(metadata) => metadata,
        Err(e) => {
            eprintln!(
                "Warning: ignoring malformed metadata file '{}': {}",
                metadata_path.display(),
                e
            );
            SidecarMetadata::default()
        }
    }
}

fn read_dimensions(path: &Path) -> (u32, u32) {
    image::ImageReader::open(path)
        .ok()
        .and_then(|reader| reader.with_guessed_format().ok())
        .and_then(|reader| reader.into_dimensions().ok())
        .unwrap_or((0, 0))
}
