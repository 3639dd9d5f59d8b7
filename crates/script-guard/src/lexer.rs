//! Tokenizer for generated scripts.
//!
//! Produces the logical-line structure of the language (`Newline`, `Indent`,
//! `Dedent`) and tags every token with the physical line it starts on. A
//! `Newline` token carries the line on which its logical line ends, so a
//! statement's span is `first token line ..= Newline line`.

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Number,
    /// String literal, prefix and quotes included in the text.
    Str,
    Op,
    Newline,
    Indent,
    Dedent,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based physical line.
    pub line: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }
}

const OPS_3: [&str; 5] = ["**=", "//=", ">>=", "<<=", "..."];
const OPS_2: [&str; 19] = [
    "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "@=", ":=",
];
const OPS_1: &str = "+-*/%@&|^~<>()[]{},:.;=";

/// Tokenize a whole script.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(src).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    depth: usize,
    indents: Vec<usize>,
    tokens: Vec<Token>,
    at_line_start: bool,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            depth: 0,
            indents: vec![0],
            tokens: Vec::new(),
            at_line_start: true,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, line: usize) {
        self.tokens.push(Token {
            kind,
            text: text.into(),
            line,
        });
    }

    /// Consume one line break (`\n`, `\r\n` or `\r`) if present.
    fn eat_line_break(&mut self) -> bool {
        match self.peek(0) {
            Some('\r') => {
                self.pos += 1;
                if self.peek(0) == Some('\n') {
                    self.pos += 1;
                }
                true
            }
            Some('\n') => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' || c == '\r' {
                break;
            }
            self.pos += 1;
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        loop {
            if self.at_line_start && self.depth == 0 {
                if !self.indentation()? {
                    break;
                }
                continue;
            }
            let Some(c) = self.peek(0) else { break };
            match c {
                ' ' | '\t' | '\x0c' => self.pos += 1,
                '#' => self.skip_comment(),
                '\n' | '\r' => {
                    self.eat_line_break();
                    if self.depth == 0 {
                        self.push(TokenKind::Newline, "", self.line);
                        self.at_line_start = true;
                    }
                    self.line += 1;
                }
                '\\' => {
                    self.pos += 1;
                    if !self.eat_line_break() {
                        return Err(ParseError::syntax(
                            self.line,
                            "unexpected character after line continuation character",
                        ));
                    }
                    self.line += 1;
                }
                '"' | '\'' => {
                    let start = self.pos;
                    self.string(start)?;
                }
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
                c if c.is_alphabetic() || c == '_' => self.name_or_prefixed_string()?,
                _ => self.operator()?,
            }
        }

        if self.depth > 0 {
            return Err(ParseError::syntax(
                self.line,
                "unexpected end of input in multi-line statement",
            ));
        }
        let needs_newline = matches!(
            self.tokens.last(),
            Some(t) if !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent)
        );
        if needs_newline {
            self.push(TokenKind::Newline, "", self.line);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, "", self.line);
        }
        self.push(TokenKind::End, "", self.line);
        Ok(self.tokens)
    }

    /// Measure indentation at the start of a line and emit Indent/Dedent.
    /// Returns false at end of input.
    fn indentation(&mut self) -> Result<bool, ParseError> {
        let mut width = 0;
        while let Some(c) = self.peek(0) {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.pos += 1;
        }
        match self.peek(0) {
            None => return Ok(false),
            Some('#') => {
                self.skip_comment();
                if self.eat_line_break() {
                    self.line += 1;
                }
                return Ok(true);
            }
            Some('\n') | Some('\r') => {
                self.eat_line_break();
                self.line += 1;
                return Ok(true);
            }
            _ => {}
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent, "", self.line);
        } else if width < current {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.push(TokenKind::Dedent, "", self.line);
            }
            if self.indents.last().copied() != Some(width) {
                return Err(ParseError::syntax(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        self.at_line_start = false;
        Ok(true)
    }

    fn string(&mut self, start: usize) -> Result<(), ParseError> {
        let first_line = self.line;
        let quote = self.chars[self.pos];
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };
        loop {
            let Some(c) = self.peek(0) else {
                return Err(ParseError::syntax(first_line, "unterminated string literal"));
            };
            match c {
                '\\' => {
                    self.pos += 1;
                    if self.eat_line_break() {
                        self.line += 1;
                    } else if self.peek(0).is_some() {
                        self.pos += 1;
                    }
                }
                '\n' | '\r' => {
                    if !triple {
                        return Err(ParseError::syntax(first_line, "unterminated string literal"));
                    }
                    self.eat_line_break();
                    self.line += 1;
                }
                c if c == quote => {
                    if !triple {
                        self.pos += 1;
                        break;
                    }
                    if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                        self.pos += 3;
                        break;
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Str, text, first_line);
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        let hex = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x') | Some('X'));
        while let Some(c) = self.peek(0) {
            let exponent_sign = (c == '+' || c == '-')
                && !hex
                && matches!(self.chars.get(self.pos.wrapping_sub(1)), Some('e') | Some('E'));
            if c.is_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Number, text, self.line);
    }

    fn name_or_prefixed_string(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let is_prefix = word.len() <= 2 && word.chars().all(|p| "rRbBuUfF".contains(p));
        if is_prefix && matches!(self.peek(0), Some('"') | Some('\'')) {
            return self.string(start);
        }
        self.push(TokenKind::Name, word, self.line);
        Ok(())
    }

    fn operator(&mut self) -> Result<(), ParseError> {
        let rest: String = self.chars[self.pos..(self.pos + 3).min(self.chars.len())]
            .iter()
            .collect();
        let op = OPS_3
            .iter()
            .chain(OPS_2.iter())
            .find(|op| rest.starts_with(*op))
            .map(|op| op.to_string())
            .or_else(|| {
                rest.chars()
                    .next()
                    .filter(|c| OPS_1.contains(*c))
                    .map(String::from)
            });
        let Some(op) = op else {
            let c = rest.chars().next().unwrap_or(' ');
            return Err(ParseError::syntax(self.line, format!("invalid character '{}'", c)));
        };
        match op.as_str() {
            "(" | "[" | "{" => self.depth += 1,
            ")" | "]" | "}" => {
                if self.depth == 0 {
                    return Err(ParseError::syntax(self.line, format!("unmatched '{}'", op)));
                }
                self.depth -= 1;
            }
            _ => {}
        }
        self.pos += op.chars().count();
        self.push(TokenKind::Op, op, self.line);
        Ok(())
    }
}
