//! Regression cases for filter strings that exercised bugs or ambiguous
//! corners of the grammar.

use dataset_curator::ImageRecord;
use dataset_curator::filter::{Compiler, FilterError, LexError, ParseError, compile};

fn record(tags: &[&str]) -> ImageRecord {
    ImageRecord {
        path: "/data/set/img_001.png".to_string(),
        name: "img_001.png".to_string(),
        directory: "/data/set".to_string(),
        caption: tags.join(", "),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        width: 768,
        height: 1024,
        stars: 3,
        markings: Vec::new(),
        modified: None,
    }
}

#[test]
fn keywords_inside_quotes_are_literal_values() {
    let filter = compile("tag:\"black AND white\"").unwrap();
    assert!(filter.matches(&record(&["black AND white"])));
    assert!(!filter.matches(&record(&["black", "white"])));
}

#[test]
fn quoted_bare_keyword_is_a_default_field_pattern() {
    // An unquoted AND alone is a dangling operator; quoting it searches for
    // the literal text instead.
    assert!(compile("AND").is_err());
    let filter = compile("\"AND\"").unwrap();
    assert!(filter.matches(&record(&["sand AND gravel"])));
}

#[test]
fn operator_names_embedded_in_words_are_not_keywords() {
    // "android" starts with "and"; it must lex as one term, not an operator.
    let filter = compile("tag:robot OR android").unwrap();
    assert!(filter.matches(&record(&["android", "phone"])));
}

#[test]
fn missing_operator_position_points_at_the_second_term() {
    match compile("tag:cat tag:dog") {
        Err(FilterError::Parse(ParseError::MissingOperator { position })) => {
            assert_eq!(position, 8);
        }
        other => panic!("expected MissingOperator, got {other:?}"),
    }
}

#[test]
fn not_chains_toggle() {
    let filter = compile("NOT NOT tag:cat").unwrap();
    assert!(filter.matches(&record(&["cat"])));
    assert!(!filter.matches(&record(&["dog"])));
}

#[test]
fn parenthesized_not_applies_to_the_group() {
    let filter = compile("NOT (tag:cat OR tag:dog)").unwrap();
    assert!(filter.matches(&record(&["bird"])));
    assert!(!filter.matches(&record(&["cat"])));
    assert!(!filter.matches(&record(&["dog"])));
}

#[test]
fn comma_decimal_confidence_literals_work() {
    let filter = compile("marking:face:>=0,85").unwrap();
    let mut r = record(&["cat"]);
    r.markings.push(dataset_curator::Marking {
        label: "face".to_string(),
        kind: dataset_curator::MarkingKind::Include,
        confidence: Some(0.9),
        will_be_cropped_out: false,
        remains_visible_after_crop: true,
    });
    assert!(filter.matches(&r));
}

#[test]
fn confidence_literal_written_as_integer_compares_as_float() {
    let filter = compile("marking:face:>=1").unwrap();
    let mut r = record(&[]);
    r.markings.push(dataset_curator::Marking {
        label: "face".to_string(),
        kind: dataset_curator::MarkingKind::Include,
        confidence: Some(1.0),
        will_be_cropped_out: false,
        remains_visible_after_crop: false,
    });
    assert!(filter.matches(&r));
}

#[test]
fn glob_metacharacters_in_tags_do_not_break_matching() {
    let filter = compile("tag:c++").unwrap();
    assert!(filter.matches(&record(&["c++"])));
    assert!(!filter.matches(&record(&["cpp"])));

    let filter = compile("tag:1.5x").unwrap();
    assert!(filter.matches(&record(&["1.5x"])));
    assert!(!filter.matches(&record(&["135x"])));
}

#[test]
fn unicode_captions_and_tags() {
    let filter = compile("tag:猫").unwrap();
    assert!(filter.matches(&record(&["猫", "オレンジ"])));

    let filter = compile("caption:猫").unwrap();
    assert!(filter.matches(&record(&["黒い猫"])));

    let filter = compile("chars:=4").unwrap();
    let mut r = record(&[]);
    r.caption = "猫と犬".to_string();
    assert!(!filter.matches(&r));
    r.caption = "猫と犬と".to_string();
    assert!(filter.matches(&r));
}

#[test]
fn whitespace_only_filter_is_empty_expression() {
    assert!(matches!(
        compile("   \t "),
        Err(FilterError::Parse(ParseError::EmptyExpression))
    ));
}

#[test]
fn error_positions_survive_multibyte_prefixes() {
    // The lex error position is a byte offset that must stay on a char
    // boundary of the original string.
    let text = "tag:猫 AND stars:>cat";
    match compile(text) {
        Err(FilterError::Lex(LexError::MalformedNumber { position, .. })) => {
            assert!(text.is_char_boundary(position));
        }
        other => panic!("expected MalformedNumber, got {other:?}"),
    }
}

#[test]
fn size_accepts_x_separator() {
    let filter = compile("size:768x1024").unwrap();
    assert!(filter.matches(&record(&[])));
    assert!(compile("size:768x1024x2").is_err());
}

#[test]
fn stale_filter_stays_in_effect_on_error() {
    // Compilation failure returns an error without producing a partial
    // filter; the caller keeps using the previous one.
    let previous = compile("tag:cat").unwrap();
    let next = Compiler::new().compile("tag:cat AND (");
    assert!(next.is_err());
    assert!(previous.matches(&record(&["cat"])));
}

#[test]
fn case_insensitivity_defaults_everywhere() {
    assert!(compile("TAG:CAT").unwrap().matches(&record(&["cat"])));
    assert!(compile("not tag:dog").unwrap().matches(&record(&["cat"])));
    assert!(
        compile("caption:ORANGE")
            .unwrap()
            .matches(&record(&["orange cat"]))
    );
    let mut r = record(&[]);
    r.markings.push(dataset_curator::Marking {
        label: "Face".to_string(),
        kind: dataset_curator::MarkingKind::Hint,
        confidence: None,
        will_be_cropped_out: false,
        remains_visible_after_crop: false,
    });
    assert!(compile("marking:face").unwrap().matches(&r));
}
