use dataset_curator::collection::{apply_filter, scan_dataset, split_tags};
use dataset_curator::config::CuratorConfig;
use dataset_curator::filter::compile;
use std::fs;
use std::path::Path;

fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
    let image = image::RgbaImage::new(width, height);
    image.save(dir.join(name)).unwrap();
}

fn write_caption(dir: &Path, stem: &str, caption: &str) {
    fs::write(dir.join(format!("{stem}.txt")), caption).unwrap();
}

#[test]
fn scan_builds_records_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "b.png", 4, 3);
    write_image(dir.path(), "a.png", 2, 2);
    write_caption(dir.path(), "a", "cat, orange");
    write_caption(dir.path(), "b", "dog");

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "a.png");
    assert_eq!(records[1].name, "b.png");
    assert_eq!(records[0].tags, vec!["cat", "orange"]);
    assert_eq!(records[0].caption, "cat, orange");
    assert_eq!((records[0].width, records[0].height), (2, 2));
    assert_eq!((records[1].width, records[1].height), (4, 3));
}

#[test]
fn missing_caption_gives_an_empty_record() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "lonely.png", 2, 2);

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].caption, "");
    assert!(records[0].tags.is_empty());
    assert!(!records[0].has_caption());
}

#[test]
fn sidecar_metadata_supplies_stars_and_markings() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "rated.png", 2, 2);
    write_caption(dir.path(), "rated", "cat");
    fs::write(
        dir.path().join("rated.json"),
        r#"{
            "stars": 4,
            "markings": [
                {"label": "face", "kind": "include", "confidence": 0.92,
                 "remains_visible_after_crop": true},
                {"label": "watermark", "kind": "exclude",
                 "will_be_cropped_out": true}
            ]
        }"#,
    )
    .unwrap();

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records[0].stars, 4);
    assert_eq!(records[0].markings.len(), 2);

    let filter = compile("marking:face:>=0.9 AND crops:watermark AND stars:>=4").unwrap();
    assert!(filter.matches(&records[0]));
}

#[test]
fn malformed_metadata_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "broken.png", 2, 2);
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].stars, 0);
    assert!(records[0].markings.is_empty());
}

#[test]
fn unreadable_image_keeps_zero_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("junk.png"), b"not an image").unwrap();

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!((records[0].width, records[0].height), (0, 0));

    // Still usable by the filter engine: absent data is false, not an error.
    let filter = compile("size:512:512").unwrap();
    assert!(!filter.matches(&records[0]));
}

#[test]
fn recursive_scan_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "top.png", 2, 2);
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_image(&sub, "nested.png", 2, 2);

    let recursive = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(recursive.len(), 2);

    let mut config = CuratorConfig::default();
    config.dataset.recursive = false;
    let flat = scan_dataset(dir.path(), &config, false).unwrap();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].name, "top.png");
}

#[test]
fn non_image_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "img.png", 2, 2);
    fs::write(dir.path().join("notes.txt"), "not a caption for anything").unwrap();
    fs::write(dir.path().join("script.py"), "print()").unwrap();

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "img.png");
}

#[test]
fn apply_filter_keeps_scan_order() {
    let dir = tempfile::tempdir().unwrap();
    for (name, caption) in [("a.png", "cat"), ("b.png", "dog"), ("c.png", "cat, dog")] {
        write_image(dir.path(), name, 2, 2);
        write_caption(dir.path(), name.trim_end_matches(".png"), caption);
    }

    let records = scan_dataset(dir.path(), &CuratorConfig::default(), false).unwrap();
    let filter = compile("tag:cat").unwrap();
    let matched = apply_filter(&records, Some(&filter));
    let names: Vec<&str> = matched.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "c.png"]);

    let all = apply_filter(&records, None);
    assert_eq!(all.len(), 3);
}

#[test]
fn custom_tag_separator_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "img.png", 2, 2);
    write_caption(dir.path(), "img", "orange cat; sleeping; couch");

    let mut config = CuratorConfig::default();
    config.dataset.tag_separator = ";".to_string();
    let records = scan_dataset(dir.path(), &config, false).unwrap();
    assert_eq!(records[0].tags, vec!["orange cat", "sleeping", "couch"]);

    let filter = compile("tag:\"orange cat\"").unwrap();
    assert!(filter.matches(&records[0]));
}

#[test]
fn split_tags_is_distinct_and_ordered() {
    assert_eq!(
        split_tags("cat, dog, cat, bird", ","),
        vec!["cat", "dog", "bird"]
    );
}
