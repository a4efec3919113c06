//! Filter expression compilation and matching
//!
//! This module implements the filter language typed into the image filter
//! box. A filter string is compiled once into an immutable expression tree
//! and then applied to each image record.
//!
//! # Syntax
//!
//! ```text
//! prefix:value          Test one field of the record
//! value                 No prefix: matches caption or path
//! NOT a, a AND b, a OR b    Boolean connectives (case-insensitive)
//! ( ... )               Grouping; AND binds tighter than OR
//! ```
//!
//! # Prefixes
//!
//! - `tag:` - whole-tag match against any of the image's tags
//! - `caption:` / `name:` / `path:` - substring match on that field
//! - `marking:label[:<cmp><number>]` - marking with a matching label and,
//!   optionally, a detection confidence satisfying the comparison
//! - `crops:label` / `visible:label` - matching marking that the crop
//!   removes / leaves visible
//! - `tags:` `chars:` `tokens:` `stars:` `width:` `height:` `area:` -
//!   numeric comparison, e.g. `tags:>=10`; comparators are
//!   `=`, `==`, `!=`, `<`, `>`, `<=`, `>=`
//! - `size:W:H` - exact pixel dimensions
//!
//! Values with spaces or operator-looking text can be quoted with single or
//! double quotes; the other quote kind passes through verbatim and the same
//! kind is escaped with a backslash. `*` matches any run of characters and
//! `?` exactly one, anywhere in a value.
//!
//! # Examples
//!
//! ```text
//! tag:cat AND (tag:orange OR tag:white)
//! NOT tag:blurry AND stars:>=4
//! marking:face:>=0.8 AND size:1024:1024
//! caption:"orange cat" OR name:*.png
//! ```

pub mod error;
pub mod expr;
pub mod matcher;
pub mod parser;
pub mod token;

pub use error::{FilterError, LexError, ParseError};
pub use expr::{
    ConfidenceFilter, FilterExpression, MarkingScope, Metric, Predicate, TextField,
};
pub use matcher::{Comparator, Pattern};

use crate::record::{ApproxTokenCounter, ImageRecord, TokenCounter};
use std::fmt;
use std::sync::Arc;

/// Compiles a filter string with the default settings: case-insensitive
/// tag matching and the approximate token counter.
pub fn compile(filter_text: &str) -> Result<CompiledFilter, FilterError> {
    Compiler::new().compile(filter_text)
}

/// Configures and compiles filters. Settings are fixed at compile time so
/// one compiled filter behaves consistently across a whole evaluation pass.
pub struct Compiler {
    case_sensitive_tags: bool,
    token_counter: Arc<dyn TokenCounter>,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            case_sensitive_tags: false,
            token_counter: Arc::new(ApproxTokenCounter),
        }
    }

    /// Make `tag:` tests match case-sensitively.
    pub fn case_sensitive_tags(mut self, value: bool) -> Self {
        self.case_sensitive_tags = value;
        self
    }

    /// Count `tokens:` with the given counter instead of the approximate
    /// default, typically the tokenizer of the captioning model.
    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    pub fn compile(&self, filter_text: &str) -> Result<CompiledFilter, FilterError> {
        let tokens = token::tokenize(filter_text)?;
        let expression = parser::parse(&tokens, self.case_sensitive_tags)?;
        Ok(CompiledFilter {
            source: filter_text.to_string(),
            expression,
            token_counter: Arc::clone(&self.token_counter),
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled filter: the expression tree plus the settings it was built
/// with. Immutable and shareable across threads; applying it to a record
/// never fails and never mutates anything.
#[derive(Clone)]
pub struct CompiledFilter {
    source: String,
    expression: FilterExpression,
    token_counter: Arc<dyn TokenCounter>,
}

impl CompiledFilter {
    /// True when the record satisfies the filter expression.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        self.expression
            .matches(record, self.token_counter.as_ref())
    }

    /// The filter string this filter was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &FilterExpression {
        &self.expression
    }
}

impl fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("source", &self.source)
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}
