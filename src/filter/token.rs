use super::error::LexError;
use super::matcher::Comparator;
use std::iter::Peekable;
use std::str::CharIndices;

/// A single lexical token with its byte offset in the filter string.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Not,
    And,
    Or,
    OpenParen,
    CloseParen,
    Term(Term),
}

/// A filter term: an optional `prefix:` followed by a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub prefix: Option<String>,
    pub value: TermValue,
}

impl Term {
    /// The value as literal text, using the original spelling for values
    /// that were lexed as comparisons.
    pub fn value_text(&self) -> &str {
        match &self.value {
            TermValue::Text { text, .. } => text,
            TermValue::Comparison { raw, .. } => raw,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self.value, TermValue::Text { quoted: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TermValue {
    /// A plain or quoted text value. Wildcard characters are preserved
    /// verbatim; `quoted` records whether any part of the value was quoted.
    Text { text: String, quoted: bool },
    /// A `<comparator><number>` pair such as `>=10`. Only lexed for
    /// prefixed, unquoted values that start with a comparator character.
    /// `raw` keeps the original spelling for prefixes that treat the value
    /// as text.
    Comparison {
        op: Comparator,
        value: f64,
        raw: String,
    },
}

/// Splits a filter string into tokens.
///
/// Whitespace separates terms unless it appears inside quotes. Parentheses
/// are always standalone tokens, even when glued to other characters. The
/// keywords NOT, AND and OR are recognized case-insensitively when they
/// appear as whole unquoted words.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            chars.next();
            tokens.push(Token {
                kind: TokenKind::OpenParen,
                position: pos,
            });
            continue;
        }
        if c == ')' {
            chars.next();
            tokens.push(Token {
                kind: TokenKind::CloseParen,
                position: pos,
            });
            continue;
        }
        tokens.push(scan_term(&mut chars, pos)?);
    }

    Ok(tokens)
}

/// Reads one term starting at `start`, stopping at unquoted whitespace or a
/// parenthesis.
fn scan_term(
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<Token, LexError> {
    let mut prefix: Option<String> = None;
    let mut current = String::new();
    let mut saw_quote = false;
    let mut value_start = start;

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => break,
            '(' | ')' => break,
            '"' | '\'' => {
                saw_quote = true;
                chars.next();
                read_quoted(chars, pos, c, &mut current)?;
            }
            // The prefix is everything before the first unescaped, unquoted
            // colon. An empty or quoted head is part of the value instead.
            ':' if prefix.is_none() && !current.is_empty() && !saw_quote => {
                chars.next();
                prefix = Some(std::mem::take(&mut current));
                value_start = pos + 1;
            }
            '\\' => {
                chars.next();
                if let Some(&(_, ':')) = chars.peek() {
                    current.push(':');
                    chars.next();
                } else {
                    current.push('\\');
                }
            }
            _ => {
                current.push(c);
                chars.next();
            }
        }
    }

    if let Some(p) = &prefix
        && current.is_empty()
        && !saw_quote
    {
        return Err(LexError::EmptyTerm {
            prefix: p.clone(),
            position: start,
        });
    }

    if prefix.is_none() && !saw_quote {
        let keyword = match current.to_lowercase().as_str() {
            "not" => Some(TokenKind::Not),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            _ => None,
        };
        if let Some(kind) = keyword {
            return Ok(Token {
                kind,
                position: start,
            });
        }
    }

    let value = if prefix.is_some()
        && !saw_quote
        && current.starts_with(['=', '!', '<', '>'])
    {
        lex_comparison(&current, value_start)?
    } else {
        TermValue::Text {
            text: current,
            quoted: saw_quote,
        }
    };

    Ok(Token {
        kind: TokenKind::Term(Term { prefix, value }),
        position: start,
    })
}

/// Consumes a quoted run up to the matching close quote. A quote of the
/// other kind passes through verbatim; the same kind (and a backslash) can
/// be escaped with a backslash.
fn read_quoted(
    chars: &mut Peekable<CharIndices<'_>>,
    open_pos: usize,
    quote: char,
    out: &mut String,
) -> Result<(), LexError> {
    loop {
        match chars.next() {
            Some((_, '\\')) => match chars.peek() {
                Some(&(_, next)) if next == quote || next == '\\' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            Some((_, c)) if c == quote => return Ok(()),
            Some((_, c)) => out.push(c),
            None => {
                return Err(LexError::UnterminatedQuote { position: open_pos });
            }
        }
    }
}

/// Lexes a `<comparator><number>` value such as `>=0.8`.
fn lex_comparison(text: &str, position: usize) -> Result<TermValue, LexError> {
    let Some((op, rest)) = Comparator::split_leading(text) else {
        return Err(LexError::MalformedComparator {
            text: text.to_string(),
            position,
        });
    };
    let value = super::matcher::parse_number(rest).ok_or_else(|| {
        LexError::MalformedNumber {
            text: rest.trim().to_string(),
            position,
        }
    })?;
    Ok(TermValue::Comparison {
        op,
        value,
        raw: text.to_string(),
    })
}
