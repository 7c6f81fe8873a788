//! Evaluator for the predicate expressions the search core emits.
//!
//! The core hands the host expression *strings* such as
//! `"owner" LIKE '%佐藤%' OR "code" = 12` and the host evaluates them. This
//! module gives the in-memory host that evaluator: a lexer, a
//! recursive-descent parser over exactly the emitted grammar, and
//! evaluation against a feature's attributes.
//!
//! Supported forms: `"field" LIKE '…'`, `"field" = literal`,
//! `"field" in (…)`, `regexp_match("field", '…')`,
//! `replace("field", array(…), array(…)) LIKE '…'`, combined with
//! `AND`/`OR` and parentheses. Anything else is an evaluation error.

use std::{iter::Peekable, str::Chars};

use regex::Regex;
use thiserror::Error;

use crate::types::{AttrValue, Feature, FieldDef};

/// Errors from parsing or evaluating a predicate expression.
#[derive(Debug, Error)]
pub enum ExprError {
    /// The expression could not be tokenized.
    #[error("lex error at {position}: {message}")]
    Lex {
        /// Description of the problem.
        message: String,
        /// Character offset in the input.
        position: usize,
    },

    /// The token stream did not match the predicate grammar.
    #[error("parse error at {position}: {message}")]
    Parse {
        /// Description of the problem.
        message: String,
        /// Character offset in the input.
        position: usize,
    },

    /// A predicate referenced a field the layer does not have.
    #[error("unknown field: {name}")]
    UnknownField {
        /// The unresolved field name.
        name: String,
    },

    /// A `regexp_match` pattern failed to compile.
    #[error("invalid regex '{pattern}': {source}")]
    Regex {
        /// The offending pattern.
        pattern: String,
        /// Compilation error.
        source: regex::Error,
    },
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    /// Quoted string.
    Text(String),
    /// Numeric constant.
    Number(f64),
}

/// The text source of a LIKE comparison: a bare field or a field run
/// through a `replace(…)` folding table.
#[derive(Debug, Clone)]
enum TextSource {
    /// Field value as-is.
    Field(String),
    /// Field value with each `from[i]` replaced by `to[i]`, in order.
    Replace {
        /// Field name.
        field: String,
        /// Substrings to replace.
        from: Vec<String>,
        /// Replacements, parallel to `from`.
        to: Vec<String>,
    },
}

impl TextSource {
    /// The referenced field name.
    fn field(&self) -> &str {
        match self {
            Self::Field(name) | Self::Replace { field: name, .. } => name,
        }
    }
}

/// A parsed predicate, ready for evaluation.
#[derive(Debug)]
pub struct Predicate {
    /// Root node.
    root: Node,
}

/// Predicate tree node.
#[derive(Debug)]
enum Node {
    /// At least one branch must match.
    Or(Vec<Node>),
    /// All branches must match.
    And(Vec<Node>),
    /// SQL-style LIKE with `%` wildcards.
    Like {
        /// Text to match against.
        source: TextSource,
        /// Pattern with `%` wildcards.
        pattern: String,
    },
    /// Equality against a literal.
    Eq {
        /// Field name.
        field: String,
        /// Right-hand side.
        value: Literal,
    },
    /// Membership in a literal list.
    InList {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Literal>,
    },
    /// Regular-expression match, compiled at parse time.
    RegexpMatch {
        /// Field name.
        field: String,
        /// Compiled pattern.
        regex: Regex,
    },
}

/// One lexed token.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Double-quoted field reference.
    Field(String),
    /// Single-quoted string literal.
    Str(String),
    /// Numeric literal.
    Number(f64),
    /// Bare word: keyword or function name.
    Word(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `=`
    Eq,
}

/// Tokenizes a predicate string.
struct Lexer<'a> {
    /// Character stream with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current character offset.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`.
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Consumes one character.
    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Tokenizes the whole input, recording each token's start offset.
    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, ExprError> {
        let mut tokens = Vec::new();
        while let Some(&ch) = self.chars.peek() {
            let start = self.position;
            match ch {
                ch if ch.is_whitespace() => {
                    self.advance();
                }
                '(' => {
                    self.advance();
                    tokens.push((Token::LParen, start));
                }
                ')' => {
                    self.advance();
                    tokens.push((Token::RParen, start));
                }
                ',' => {
                    self.advance();
                    tokens.push((Token::Comma, start));
                }
                '=' => {
                    self.advance();
                    tokens.push((Token::Eq, start));
                }
                '"' => tokens.push((Token::Field(self.read_quoted('"')?), start)),
                '\'' => tokens.push((Token::Str(self.read_quoted('\'')?), start)),
                ch if ch.is_ascii_digit() || ch == '-' || ch == '.' => {
                    tokens.push((Token::Number(self.read_number()?), start));
                }
                ch if ch.is_alphabetic() || ch == '_' => {
                    tokens.push((Token::Word(self.read_word()), start));
                }
                other => {
                    return Err(ExprError::Lex {
                        message: format!("unexpected character {other:?}"),
                        position: start,
                    });
                }
            }
        }
        Ok(tokens)
    }

    /// Reads a quoted run, consuming the delimiters.
    fn read_quoted(&mut self, quote: char) -> Result<String, ExprError> {
        let start = self.position;
        self.advance();
        let mut content = String::new();
        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(content),
                Some(ch) => content.push(ch),
                None => {
                    return Err(ExprError::Lex {
                        message: format!("unclosed {quote} quote"),
                        position: start,
                    });
                }
            }
        }
    }

    /// Reads a numeric literal.
    fn read_number(&mut self) -> Result<f64, ExprError> {
        let start = self.position;
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || ch == '.' || ch == '-' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text.parse().map_err(|_| ExprError::Lex {
            message: format!("invalid number {text:?}"),
            position: start,
        })
    }

    /// Reads a bare word (keyword or function name).
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }
}

/// Recursive-descent parser over the token stream.
struct Parser {
    /// Lexed tokens with their offsets.
    tokens: Vec<(Token, usize)>,
    /// Cursor into `tokens`.
    index: usize,
}

impl Parser {
    /// The next token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(token, _)| token)
    }

    /// The offset of the current token, or the end of input.
    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map_or(0, |(_, position)| *position)
    }

    /// Consumes and returns the next token.
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(token, _)| token.clone());
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Builds a parse error at the current position.
    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::Parse {
            message: message.into(),
            position: self.position(),
        }
    }

    /// Consumes a specific token or errors.
    fn expect(&mut self, want: &Token, what: &str) -> Result<(), ExprError> {
        match self.next() {
            Some(token) if token == *want => Ok(()),
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    /// True when the next token is the given keyword (case-insensitive).
    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword))
    }

    /// `or_expr := and_expr (OR and_expr)*`
    fn parse_or(&mut self) -> Result<Node, ExprError> {
        let mut branches = vec![self.parse_and()?];
        while self.at_keyword("or") {
            self.next();
            branches.push(self.parse_and()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or(Node::Or(Vec::new()))
        } else {
            Node::Or(branches)
        })
    }

    /// `and_expr := atom (AND atom)*`
    fn parse_and(&mut self) -> Result<Node, ExprError> {
        let mut branches = vec![self.parse_atom()?];
        while self.at_keyword("and") {
            self.next();
            branches.push(self.parse_atom()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or(Node::And(Vec::new()))
        } else {
            Node::And(branches)
        })
    }

    /// Parses a single comparison or a parenthesized expression.
    fn parse_atom(&mut self) -> Result<Node, ExprError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Field(field)) => self.parse_comparison(TextSource::Field(field)),
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("regexp_match") => {
                self.parse_regexp_match()
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("replace") => {
                let source = self.parse_replace()?;
                self.parse_comparison(source)
            }
            other => Err(self.error(format!("expected a comparison, found {other:?}"))),
        }
    }

    /// Parses the operator following a field or replace() source.
    fn parse_comparison(&mut self, source: TextSource) -> Result<Node, ExprError> {
        if self.at_keyword("like") {
            self.next();
            let pattern = match self.next() {
                Some(Token::Str(text)) => text,
                other => return Err(self.error(format!("expected LIKE pattern, got {other:?}"))),
            };
            return Ok(Node::Like { source, pattern });
        }

        // = and IN only apply to bare fields.
        let TextSource::Field(field) = source else {
            return Err(self.error("replace() source only supports LIKE"));
        };
        match self.next() {
            Some(Token::Eq) => {
                let value = self.parse_literal()?;
                Ok(Node::Eq { field, value })
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("in") => {
                self.expect(&Token::LParen, "'('")?;
                let mut values = vec![self.parse_literal()?];
                while self.peek() == Some(&Token::Comma) {
                    self.next();
                    values.push(self.parse_literal()?);
                }
                self.expect(&Token::RParen, "')'")?;
                Ok(Node::InList { field, values })
            }
            other => Err(self.error(format!("expected LIKE, = or in, found {other:?}"))),
        }
    }

    /// Parses a string or number literal.
    fn parse_literal(&mut self) -> Result<Literal, ExprError> {
        match self.next() {
            Some(Token::Str(text)) => Ok(Literal::Text(text)),
            Some(Token::Number(number)) => Ok(Literal::Number(number)),
            other => Err(self.error(format!("expected a literal, found {other:?}"))),
        }
    }

    /// `regexp_match("field", 'pattern')`
    fn parse_regexp_match(&mut self) -> Result<Node, ExprError> {
        self.expect(&Token::LParen, "'('")?;
        let field = match self.next() {
            Some(Token::Field(field)) => field,
            other => return Err(self.error(format!("expected a field, found {other:?}"))),
        };
        self.expect(&Token::Comma, "','")?;
        let pattern = match self.next() {
            Some(Token::Str(pattern)) => pattern,
            other => return Err(self.error(format!("expected a pattern, found {other:?}"))),
        };
        self.expect(&Token::RParen, "')'")?;
        let regex = Regex::new(&pattern).map_err(|source| ExprError::Regex { pattern, source })?;
        Ok(Node::RegexpMatch { field, regex })
    }

    /// `replace("field", array('a', …), array('b', …))`
    fn parse_replace(&mut self) -> Result<TextSource, ExprError> {
        self.expect(&Token::LParen, "'('")?;
        let field = match self.next() {
            Some(Token::Field(field)) => field,
            other => return Err(self.error(format!("expected a field, found {other:?}"))),
        };
        self.expect(&Token::Comma, "','")?;
        let from = self.parse_array()?;
        self.expect(&Token::Comma, "','")?;
        let to = self.parse_array()?;
        self.expect(&Token::RParen, "')'")?;
        if from.len() != to.len() {
            return Err(self.error("replace() arrays differ in length"));
        }
        Ok(TextSource::Replace { field, from, to })
    }

    /// `array('a', 'b', …)`
    fn parse_array(&mut self) -> Result<Vec<String>, ExprError> {
        match self.next() {
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("array") => {}
            other => return Err(self.error(format!("expected array(…), found {other:?}"))),
        }
        self.expect(&Token::LParen, "'('")?;
        let mut items = Vec::new();
        loop {
            match self.next() {
                Some(Token::Str(text)) => items.push(text),
                other => return Err(self.error(format!("expected a string, found {other:?}"))),
            }
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(items),
                other => return Err(self.error(format!("expected ',' or ')', found {other:?}"))),
            }
        }
    }
}

impl Predicate {
    /// Parses a predicate string.
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser { tokens, index: 0 };
        let root = parser.parse_or()?;
        if parser.peek().is_some() {
            return Err(parser.error("trailing tokens after expression"));
        }
        Ok(Self { root })
    }

    /// Evaluates the predicate against one feature.
    ///
    /// `fields` is the layer's field list, parallel to `feature.attrs`.
    pub fn matches(&self, fields: &[FieldDef], feature: &Feature) -> Result<bool, ExprError> {
        eval(&self.root, fields, feature)
    }
}

/// Looks up a field's attribute value on a feature.
fn attr<'a>(
    fields: &[FieldDef],
    feature: &'a Feature,
    name: &str,
) -> Result<&'a AttrValue, ExprError> {
    let index = fields
        .iter()
        .position(|field| field.name == name)
        .ok_or_else(|| ExprError::UnknownField {
            name: name.to_string(),
        })?;
    Ok(feature.attrs.get(index).unwrap_or(&AttrValue::Null))
}

/// Evaluates one node.
fn eval(node: &Node, fields: &[FieldDef], feature: &Feature) -> Result<bool, ExprError> {
    match node {
        Node::Or(branches) => {
            for branch in branches {
                if eval(branch, fields, feature)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Node::And(branches) => {
            for branch in branches {
                if !eval(branch, fields, feature)? {
                    return Ok(false);
                }
            }
            Ok(!branches.is_empty())
        }
        Node::Like { source, pattern } => {
            let Some(mut text) = attr(fields, feature, source.field())?.render() else {
                return Ok(false);
            };
            if let TextSource::Replace { from, to, .. } = source {
                for (needle, replacement) in from.iter().zip(to) {
                    text = text.replace(needle, replacement);
                }
            }
            Ok(like_match(pattern, &text))
        }
        Node::Eq { field, value } => Ok(literal_eq(attr(fields, feature, field)?, value)),
        Node::InList { field, values } => {
            let actual = attr(fields, feature, field)?;
            Ok(values.iter().any(|value| literal_eq(actual, value)))
        }
        Node::RegexpMatch { field, regex } => {
            let Some(text) = attr(fields, feature, field)?.render() else {
                return Ok(false);
            };
            Ok(regex.is_match(&text))
        }
    }
}

/// Compares an attribute against a literal, numerically when both sides
/// are numbers.
fn literal_eq(actual: &AttrValue, literal: &Literal) -> bool {
    match literal {
        Literal::Number(number) => match actual.as_number() {
            Some(value) => value == *number,
            None => actual
                .render()
                .and_then(|text| text.parse::<f64>().ok())
                .is_some_and(|value| value == *number),
        },
        Literal::Text(text) => actual.render().as_deref() == Some(text),
    }
}

/// SQL LIKE with `%` wildcards, case-sensitive.
fn like_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let first = parts[0];
    if !text.starts_with(first) {
        return false;
    }
    let mut offset = first.len();

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[offset..].find(part) {
            Some(found) => offset += found + part.len(),
            None => return false,
        }
    }

    let last = parts[parts.len() - 1];
    if last.is_empty() {
        return true;
    }
    text.len() >= offset + last.len() && text.ends_with(last)
}
