use super::error::ParseError;
use super::expr::{
    ConfidenceFilter, FilterExpression, MarkingScope, Metric, Predicate, TextField,
};
use super::matcher::{self, Comparator, Pattern};
use super::token::{Term, TermValue, Token, TokenKind};

/// Nesting bound for `(`/`NOT` chains. Deeply nested input is rejected with
/// a structured error instead of risking call-stack exhaustion.
const MAX_NESTING_DEPTH: usize = 128;

/// Builds the expression tree from the token stream.
///
/// Grammar, lowest precedence first:
///
/// ```text
/// expr    := orExpr
/// orExpr  := andExpr ( "OR" andExpr )*      left-associative
/// andExpr := notExpr ( "AND" notExpr )*     left-associative
/// notExpr := "NOT" notExpr | atom
/// atom    := "(" expr ")" | predicate
/// ```
pub fn parse(
    tokens: &[Token],
    case_sensitive_tags: bool,
) -> Result<FilterExpression, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        case_sensitive_tags,
    };
    let expr = parser.parse_or(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(match &token.kind {
            TokenKind::CloseParen => ParseError::UnbalancedParens {
                position: token.position,
            },
            kind if starts_atom(kind) => ParseError::MissingOperator {
                position: token.position,
            },
            _ => ParseError::TrailingTokens {
                position: token.position,
            },
        }),
    }
}

fn starts_atom(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Term(_) | TokenKind::OpenParen | TokenKind::Not
    )
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    case_sensitive_tags: bool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Position reported when input ends where more is expected.
    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.position)
    }

    fn parse_or(&mut self, depth: usize) -> Result<FilterExpression, ParseError> {
        let mut left = self.parse_and(depth)?;
        while let Some(token) = self.peek()
            && token.kind == TokenKind::Or
        {
            self.advance();
            let right = self.parse_and(depth)?;
            left = FilterExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self, depth: usize) -> Result<FilterExpression, ParseError> {
        let mut left = self.parse_not(depth)?;
        while let Some(token) = self.peek()
            && token.kind == TokenKind::And
        {
            self.advance();
            let right = self.parse_not(depth)?;
            left = FilterExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// NOT binds only the single following atom (or a nested NOT), never a
    /// whole AND/OR chain.
    fn parse_not(&mut self, depth: usize) -> Result<FilterExpression, ParseError> {
        if let Some(token) = self.peek()
            && token.kind == TokenKind::Not
        {
            if depth >= MAX_NESTING_DEPTH {
                return Err(ParseError::TooDeep {
                    position: token.position,
                });
            }
            self.advance();
            let inner = self.parse_not(depth + 1)?;
            return Ok(FilterExpression::Not(Box::new(inner)));
        }
        self.parse_atom(depth)
    }

    fn parse_atom(&mut self, depth: usize) -> Result<FilterExpression, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::ExpectedPredicate {
                position: self.end_position(),
            });
        };
        match &token.kind {
            TokenKind::OpenParen => {
                if depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::TooDeep {
                        position: token.position,
                    });
                }
                let open_position = token.position;
                self.advance();
                let expr = self.parse_or(depth + 1)?;
                match self.peek() {
                    Some(next) if next.kind == TokenKind::CloseParen => {
                        self.advance();
                        Ok(expr)
                    }
                    Some(next) if starts_atom(&next.kind) => Err(ParseError::MissingOperator {
                        position: next.position,
                    }),
                    Some(next) => Err(ParseError::TrailingTokens {
                        position: next.position,
                    }),
                    None => Err(ParseError::UnbalancedParens {
                        position: open_position,
                    }),
                }
            }
            TokenKind::CloseParen => Err(ParseError::UnbalancedParens {
                position: token.position,
            }),
            TokenKind::Term(term) => {
                let predicate = self.classify(term, token.position)?;
                self.advance();
                Ok(FilterExpression::Predicate(predicate))
            }
            TokenKind::Not | TokenKind::And | TokenKind::Or => {
                Err(ParseError::ExpectedPredicate {
                    position: token.position,
                })
            }
        }
    }

    /// Maps a term's prefix onto the closed predicate families. The match
    /// is exhaustive; anything else is rejected here rather than silently
    /// mismatching at evaluation time.
    fn classify(&self, term: &Term, position: usize) -> Result<Predicate, ParseError> {
        let Some(prefix) = &term.prefix else {
            return Ok(Predicate::Text {
                field: TextField::Default,
                pattern: Pattern::substring(term.value_text(), false),
            });
        };

        match prefix.to_lowercase().as_str() {
            "tag" => Ok(Predicate::Text {
                field: TextField::Tag,
                pattern: Pattern::whole(term.value_text(), self.case_sensitive_tags),
            }),
            "caption" => Ok(Predicate::Text {
                field: TextField::Caption,
                pattern: Pattern::substring(term.value_text(), false),
            }),
            "name" => Ok(Predicate::Text {
                field: TextField::Name,
                pattern: Pattern::substring(term.value_text(), false),
            }),
            "path" => Ok(Predicate::Text {
                field: TextField::Path,
                pattern: Pattern::substring(term.value_text(), false),
            }),
            "marking" => Ok(marking_predicate(MarkingScope::Marking, term)),
            "crops" => Ok(marking_predicate(MarkingScope::Crops, term)),
            "visible" => Ok(marking_predicate(MarkingScope::Visible, term)),
            "tags" => self.numeric(Metric::TagCount, term, prefix, position),
            "chars" => self.numeric(Metric::Chars, term, prefix, position),
            "tokens" => self.numeric(Metric::Tokens, term, prefix, position),
            "stars" => self.numeric(Metric::Stars, term, prefix, position),
            "width" => self.numeric(Metric::Width, term, prefix, position),
            "height" => self.numeric(Metric::Height, term, prefix, position),
            "area" => self.numeric(Metric::Area, term, prefix, position),
            "size" => size_predicate(term, position),
            _ => Err(ParseError::UnknownPrefix {
                prefix: prefix.clone(),
                position,
            }),
        }
    }

    fn numeric(
        &self,
        metric: Metric,
        term: &Term,
        prefix: &str,
        position: usize,
    ) -> Result<Predicate, ParseError> {
        match &term.value {
            TermValue::Comparison { op, value, .. } => Ok(Predicate::Numeric {
                metric,
                op: *op,
                value: *value,
            }),
            TermValue::Text { .. } => Err(ParseError::MissingComparator {
                prefix: prefix.to_string(),
                position,
            }),
        }
    }
}

/// A marking value is `label` or `label:<cmp><number>`. The confidence
/// filter is split off at the last colon; when the tail is not a
/// comparison (or the value was quoted) the whole value is the label.
fn marking_predicate(scope: MarkingScope, term: &Term) -> Predicate {
    let value = term.value_text();
    if !term.is_quoted()
        && let Some(idx) = value.rfind(':')
        && let Some((op, rest)) = Comparator::split_leading(&value[idx + 1..])
        && let Some(number) = matcher::parse_number(rest)
    {
        return Predicate::Marking {
            scope,
            label: Pattern::whole(&value[..idx], false),
            confidence: Some(ConfidenceFilter { op, value: number }),
        };
    }
    Predicate::Marking {
        scope,
        label: Pattern::whole(value, false),
        confidence: None,
    }
}

/// A size value is two integers separated by `:` or `x`, e.g. `512:512`.
fn size_predicate(term: &Term, position: usize) -> Result<Predicate, ParseError> {
    let value = term.value_text();
    let normalized = value.replace('x', ":");
    let mut parts = normalized.split(':');
    if let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next())
        && let (Ok(width), Ok(height)) = (first.parse::<u32>(), second.parse::<u32>())
    {
        return Ok(Predicate::Size { width, height });
    }
    Err(ParseError::InvalidSize {
        value: value.to_string(),
        position,
    })
}
