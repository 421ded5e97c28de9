//! LookML text parser
//!
//! Produces the same document shape [`crate::dump`] consumes: repeated keys
//! are collected under their plural form, block names are stored under
//! `name`, and `;;`-terminated values are kept as trimmed strings.

use dbtea_core::{DbteaError, Result};
use serde_json::{Map, Value};

use crate::syntax::{is_expression_key, plural_of};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Literal(String),
    Quoted(String),
    Expression(String),
    Colon,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn syntax_error(line: usize, message: impl std::fmt::Display) -> DbteaError {
    DbteaError::invalid_input(
        "invalid-lookml-syntax",
        "Invalid LookML",
        format!("line {}: {}", line, message),
    )
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token { kind, line: self.line });
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Whether the token just emitted is `<expression key>:`
    fn expects_expression(&self) -> bool {
        match self.tokens.as_slice() {
            [.., key, colon] => {
                colon.kind == TokenKind::Colon
                    && matches!(&key.kind, TokenKind::Literal(k) if is_expression_key(k))
            }
            _ => false,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        while let Some(&c) = self.chars.peek() {
            match c {
                _ if c.is_whitespace() => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                ':' => {
                    self.bump();
                    self.push(TokenKind::Colon);
                    if self.expects_expression() {
                        self.expression()?;
                    }
                }
                '{' => {
                    self.bump();
                    self.push(TokenKind::LeftBrace);
                }
                '}' => {
                    self.bump();
                    self.push(TokenKind::RightBrace);
                }
                '[' => {
                    self.bump();
                    self.push(TokenKind::LeftBracket);
                }
                ']' => {
                    self.bump();
                    self.push(TokenKind::RightBracket);
                }
                ',' => {
                    self.bump();
                    self.push(TokenKind::Comma);
                }
                '"' => self.quoted()?,
                _ => self.literal(),
            }
        }
        Ok(self.tokens)
    }

    fn expression(&mut self) -> Result<()> {
        let start = self.line;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(';') if self.chars.peek() == Some(&';') => {
                    self.bump();
                    break;
                }
                Some(c) => text.push(c),
                None => return Err(syntax_error(start, "expression is missing its closing ';;'")),
            }
        }
        self.tokens.push(Token {
            kind: TokenKind::Expression(text.trim().to_string()),
            line: start,
        });
        Ok(())
    }

    fn quoted(&mut self) -> Result<()> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => break,
                },
                Some('"') => {
                    self.tokens.push(Token {
                        kind: TokenKind::Quoted(text),
                        line: start,
                    });
                    return Ok(());
                }
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(syntax_error(start, "unterminated string"))
    }

    fn literal(&mut self) {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, ':' | '{' | '}' | '[' | ']' | ',' | '"' | '#') {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.push(TokenKind::Literal(text));
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|t| t.line).unwrap_or(1)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        match self.next() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(syntax_error(token.line, format!("expected {}", what))),
            None => Err(syntax_error(self.last_line(), format!("expected {} before end of input", what))),
        }
    }

    /// Pairs until `}` (when nested) or end of input
    fn pairs(&mut self, nested: bool) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        loop {
            let token = match self.peek() {
                None if nested => {
                    return Err(syntax_error(self.last_line(), "missing closing '}'"));
                }
                None => return Ok(map),
                Some(token) => token.clone(),
            };

            match token.kind {
                TokenKind::RightBrace if nested => {
                    self.position += 1;
                    return Ok(map);
                }
                TokenKind::Literal(key) => {
                    self.position += 1;
                    self.expect(TokenKind::Colon, &format!("':' after '{}'", key))?;
                    let value = self.value(token.line)?;
                    insert(&mut map, key, value);
                }
                _ => return Err(syntax_error(token.line, "expected a key")),
            }
        }
    }

    fn value(&mut self, line: usize) -> Result<Value> {
        let token = self
            .next()
            .ok_or_else(|| syntax_error(line, "expected a value"))?;

        match token.kind {
            TokenKind::Expression(text) | TokenKind::Quoted(text) => Ok(Value::String(text)),
            TokenKind::Literal(text) => {
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LeftBrace)) {
                    self.position += 1;
                    let body = self.pairs(true)?;
                    let mut block = Map::new();
                    block.insert("name".to_string(), Value::String(text));
                    block.extend(body);
                    Ok(Value::Object(block))
                } else {
                    Ok(Value::String(text))
                }
            }
            TokenKind::LeftBrace => Ok(Value::Object(self.pairs(true)?)),
            TokenKind::LeftBracket => self.list(token.line),
            _ => Err(syntax_error(token.line, "expected a value")),
        }
    }

    fn list(&mut self, line: usize) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            let token = self
                .next()
                .ok_or_else(|| syntax_error(line, "missing closing ']'"))?;
            match token.kind {
                TokenKind::RightBracket => return Ok(Value::Array(items)),
                TokenKind::Literal(text) | TokenKind::Quoted(text) => {
                    items.push(Value::String(text));
                    match self.next().map(|t| t.kind) {
                        Some(TokenKind::Comma) => {}
                        Some(TokenKind::RightBracket) => return Ok(Value::Array(items)),
                        _ => return Err(syntax_error(token.line, "expected ',' or ']' in list")),
                    }
                }
                _ => return Err(syntax_error(token.line, "expected a list item")),
            }
        }
    }
}

/// Repeated keys accumulate under their plural; everything else is last-wins
fn insert(map: &mut Map<String, Value>, key: String, value: Value) {
    match plural_of(&key) {
        Some(plural) => {
            let entry = map
                .entry(plural.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(value);
            }
        }
        None => {
            map.insert(key, value);
        }
    }
}

/// Parse LookML text into a document
pub fn load(text: &str) -> Result<Value> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser { tokens, position: 0 };
    Ok(Value::Object(parser.pairs(false)?))
}

/// Parse a LookML file into a document
pub fn load_file(path: &std::path::Path) -> Result<Value> {
    tracing::info!("Parsing data from LookML file {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|e| DbteaError::io(path, e))?;
    load(&text).map_err(|mut e| {
        e.detail = format!("{}: {}", path.display(), e.detail);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::dump;
    use dbtea_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const VIEW: &str = r#"
# Generated by dbtea
view: orders {
  sql_table_name: analytics.orders ;;
  label: "Orders Table"

  dimension: id {
    primary_key: yes
    type: number
    sql: ${TABLE}.id ;;
  }

  dimension_group: created {
    type: time
    timeframes: [raw, date, "week"]
    sql: CASE WHEN ${TABLE}.created_at > '2020-01-01'
         THEN ${TABLE}.created_at END ;;
  }

  measure: count {
    type: count
    drill_fields: [id]
  }
}
"#;

    #[test]
    fn parses_view_file() {
        let document = load(VIEW).unwrap();

        assert_eq!(
            document,
            json!({"views": [{
                "name": "orders",
                "sql_table_name": "analytics.orders",
                "label": "Orders Table",
                "dimensions": [
                    {"name": "id", "primary_key": "yes", "type": "number", "sql": "${TABLE}.id"}
                ],
                "dimension_groups": [{
                    "name": "created",
                    "type": "time",
                    "timeframes": ["raw", "date", "week"],
                    "sql": "CASE WHEN ${TABLE}.created_at > '2020-01-01'\n         THEN ${TABLE}.created_at END"
                }],
                "measures": [
                    {"name": "count", "type": "count", "drill_fields": ["id"]}
                ]
            }]})
        );
    }

    #[test]
    fn dumped_documents_parse_back() {
        let document = json!({
            "connection": "warehouse",
            "includes": ["/views/*.view.lkml"],
            "explores": [{"name": "orders", "label": "Orders", "joins": [{"name": "users", "sql_on": "${orders.user_id} = ${users.id}"}]}]
        });

        assert_eq!(load(&dump(&document)).unwrap(), document);
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let err = load("view: orders {\n  sql_table_name: orders ;;\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.name, "invalid-lookml-syntax");
        assert!(err.detail.contains("missing closing '}'"));
    }

    #[test]
    fn unterminated_expression_reports_line() {
        let err = load("view: orders {\n  sql_table_name: orders\n}\n").unwrap_err();
        assert!(err.detail.starts_with("line 2"));
    }

    #[test]
    fn missing_colon_is_rejected() {
        let err = load("view orders {}").unwrap_err();
        assert!(err.detail.contains("':' after 'view'"));
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert_eq!(load("  # nothing here\n").unwrap(), json!({}));
    }
}
