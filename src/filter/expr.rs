use super::matcher::{Comparator, Pattern};
use crate::record::{ImageRecord, TokenCounter};

/// Immutable expression tree built once per filter string and reused for
/// every record until the text changes.
#[derive(Debug, Clone)]
pub enum FilterExpression {
    Not(Box<FilterExpression>),
    And(Box<FilterExpression>, Box<FilterExpression>),
    Or(Box<FilterExpression>, Box<FilterExpression>),
    Predicate(Predicate),
}

/// Leaf test against one aspect of an image record, one variant per prefix
/// family. Unknown prefixes never reach evaluation; the parser rejects them.
#[derive(Debug, Clone)]
pub enum Predicate {
    Text {
        field: TextField,
        pattern: Pattern,
    },
    Numeric {
        metric: Metric,
        op: Comparator,
        value: f64,
    },
    Marking {
        scope: MarkingScope,
        label: Pattern,
        confidence: Option<ConfidenceFilter>,
    },
    Size {
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Tag,
    Caption,
    Name,
    Path,
    /// A bare term with no prefix; matches when caption or path matches.
    Default,
}

/// Derived per-record quantity a numeric predicate compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TagCount,
    Chars,
    Tokens,
    Stars,
    Width,
    Height,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkingScope {
    /// Any marking with a matching label.
    Marking,
    /// Matching markings that the crop removes.
    Crops,
    /// Matching markings that stay visible after the crop.
    Visible,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFilter {
    pub op: Comparator,
    pub value: f64,
}

impl FilterExpression {
    /// Evaluates the tree against one record. Pure and total: a predicate
    /// whose data is absent on the record is false, never an error.
    pub fn matches(&self, record: &ImageRecord, tokens: &dyn TokenCounter) -> bool {
        match self {
            FilterExpression::Not(child) => !child.matches(record, tokens),
            FilterExpression::And(left, right) => {
                left.matches(record, tokens) && right.matches(record, tokens)
            }
            FilterExpression::Or(left, right) => {
                left.matches(record, tokens) || right.matches(record, tokens)
            }
            FilterExpression::Predicate(predicate) => predicate.matches(record, tokens),
        }
    }
}

impl Predicate {
    pub fn matches(&self, record: &ImageRecord, tokens: &dyn TokenCounter) -> bool {
        match self {
            Predicate::Text { field, pattern } => match field {
                TextField::Tag => record.tags.iter().any(|tag| pattern.matches(tag)),
                TextField::Caption => pattern.matches(&record.caption),
                TextField::Name => pattern.matches(&record.name),
                TextField::Path => pattern.matches(&record.path),
                TextField::Default => {
                    pattern.matches(&record.caption) || pattern.matches(&record.path)
                }
            },
            Predicate::Numeric { metric, op, value } => {
                op.compare(metric_value(*metric, record, tokens), *value)
            }
            Predicate::Marking {
                scope,
                label,
                confidence,
            } => record.markings.iter().any(|marking| {
                if !label.matches(&marking.label) {
                    return false;
                }
                let in_scope = match scope {
                    MarkingScope::Marking => true,
                    MarkingScope::Crops => marking.will_be_cropped_out,
                    MarkingScope::Visible => marking.remains_visible_after_crop,
                };
                if !in_scope {
                    return false;
                }
                match confidence {
                    None => true,
                    // Markings without a confidence value never satisfy a
                    // confidence-filtered predicate.
                    Some(filter) => marking
                        .confidence
                        .is_some_and(|c| filter.op.compare(c, filter.value)),
                }
            }),
            Predicate::Size { width, height } => {
                record.width == *width && record.height == *height
            }
        }
    }
}

fn metric_value(metric: Metric, record: &ImageRecord, tokens: &dyn TokenCounter) -> f64 {
    match metric {
        Metric::TagCount => record.tag_count() as f64,
        Metric::Chars => record.caption_chars() as f64,
        Metric::Tokens => tokens.count(&record.caption) as f64,
        Metric::Stars => f64::from(record.stars),
        Metric::Width => f64::from(record.width),
        Metric::Height => f64::from(record.height),
        Metric::Area => record.area() as f64,
    }
}
