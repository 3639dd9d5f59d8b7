//! Statement and expression parser for generated scripts.
//!
//! Validates syntax and records what sanitization needs: every name the script
//! binds, every call whose callee is a bare name, and the span and kind of every
//! logical line. No tree is built; expressions only keep enough shape to bind
//! assignment targets.

use std::collections::BTreeSet;

use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const AUG_ASSIGN: [&str; 13] = [
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Compound-statement clause that opens a logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    If,
    Elif,
    Else,
    While,
    For,
    Try,
    Except,
    Finally,
    With,
    Def,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// One or more `;`-separated simple statements.
    Simple,
    Decorator,
    Header(Clause),
}

/// One logical line of the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub first_line: usize,
    pub last_line: usize,
    pub kind: LineKind,
    /// A header whose body follows the colon on the same line.
    pub inline_body: bool,
}

/// A call of the form `name(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareCall {
    pub name: String,
    pub line: usize,
    /// Index into `ScriptOutline::lines` of the enclosing logical line.
    pub logical: usize,
}

/// What the parser learned about a script.
#[derive(Debug, Clone, Default)]
pub struct ScriptOutline {
    /// Every name the script binds, in any binding form.
    pub bound: BTreeSet<String>,
    /// Bare-name calls in source order.
    pub calls: Vec<BareCall>,
    pub lines: Vec<LogicalLine>,
}

/// Parse `src` and outline it.
pub fn outline(src: &str) -> Result<ScriptOutline, ParseError> {
    let mut parser = Parser {
        toks: tokenize(src)?,
        pos: 0,
        out: ScriptOutline::default(),
        current: 0,
    };
    parser.file()?;
    Ok(parser.out)
}

/// Expression shape, kept only as far as target binding needs.
#[derive(Debug, Clone)]
enum Expr {
    Name(String, usize),
    Seq(Vec<Expr>),
    Starred(Box<Expr>),
    Other,
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
    out: ScriptOutline,
    current: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    // ── Token helpers ───────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.toks.len() - 1;
        &self.toks[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::End {
            self.pos += 1;
        }
        tok
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    fn at_kw(&self, kw: &str) -> bool {
        self.peek().is_name(kw)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        Err(ParseError::syntax(self.peek().line, message))
    }

    fn expect_op(&mut self, op: &str) -> PResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            self.error(format!("expected '{}'", op))
        }
    }

    fn expect_kw(&mut self, kw: &str) -> PResult<()> {
        if self.eat_kw(kw) {
            Ok(())
        } else {
            self.error(format!("expected '{}'", kw))
        }
    }

    fn at_identifier(&self) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Name && !is_keyword(&t.text)
    }

    fn identifier(&mut self) -> PResult<String> {
        if self.at_identifier() {
            Ok(self.advance().text)
        } else {
            self.error("expected a name")
        }
    }

    fn bind(&mut self, name: impl Into<String>) {
        self.out.bound.insert(name.into());
    }

    fn bind_target(&mut self, target: Expr) {
        match target {
            Expr::Name(name, _) => self.bind(name),
            Expr::Seq(items) => items.into_iter().for_each(|t| self.bind_target(t)),
            Expr::Starred(inner) => self.bind_target(*inner),
            Expr::Other => {}
        }
    }

    /// True where an expression list must stop.
    fn at_expr_end(&self) -> bool {
        let t = self.peek();
        match t.kind {
            TokenKind::Newline | TokenKind::End => true,
            TokenKind::Op => {
                matches!(t.text.as_str(), ";" | "=" | ")" | "]" | "}" | ":")
                    || AUG_ASSIGN.contains(&t.text.as_str())
            }
            _ => false,
        }
    }

    // ── Logical lines ───────────────────────────────────────────────────────

    fn begin(&mut self, kind: LineKind) {
        let line = self.peek().line;
        self.out.lines.push(LogicalLine {
            first_line: line,
            last_line: line,
            kind,
            inline_body: false,
        });
        self.current = self.out.lines.len() - 1;
    }

    fn end_line(&mut self) -> PResult<()> {
        if self.peek().kind != TokenKind::Newline {
            return self.error("invalid syntax");
        }
        let tok = self.advance();
        if let Some(line) = self.out.lines.get_mut(self.current) {
            line.last_line = tok.line;
        }
        Ok(())
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn file(&mut self) -> PResult<()> {
        while self.peek().kind != TokenKind::End {
            self.statement()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> PResult<()> {
        match self.peek().kind {
            TokenKind::Indent => return self.error("unexpected indent"),
            TokenKind::Dedent | TokenKind::Newline => return self.error("invalid syntax"),
            _ => {}
        }
        if self.at_op("@") {
            return self.decorated();
        }
        let word = self.peek().text.clone();
        let async_target = self.peek_at(1).text.clone();
        match word.as_str() {
            "if" => self.if_stmt(),
            "while" => self.while_stmt(),
            "for" => self.for_stmt(),
            "try" => self.try_stmt(),
            "with" => self.with_stmt(),
            "def" => self.funcdef(),
            "class" => self.classdef(),
            "async" if async_target == "def" => self.funcdef(),
            "async" if async_target == "for" => self.for_stmt(),
            "async" if async_target == "with" => self.with_stmt(),
            "match" if self.is_match_statement() => Err(ParseError::Unsupported {
                line: self.peek().line,
                keyword: "match".to_string(),
            }),
            _ => {
                self.begin(LineKind::Simple);
                self.simple_stmts()
            }
        }
    }

    /// `match` is a soft keyword: a statement only if the logical line ends in `:`.
    fn is_match_statement(&self) -> bool {
        let next = self.peek_at(1);
        if next.kind == TokenKind::Newline || next.is_op("=") || next.is_op(".") {
            return false;
        }
        let mut i = self.pos;
        while i + 1 < self.toks.len() && self.toks[i + 1].kind != TokenKind::Newline {
            i += 1;
        }
        self.toks[i].is_op(":")
    }

    fn simple_stmts(&mut self) -> PResult<()> {
        loop {
            self.small_stmt()?;
            if self.eat_op(";") && self.peek().kind != TokenKind::Newline {
                continue;
            }
            break;
        }
        self.end_line()
    }

    fn suite(&mut self) -> PResult<()> {
        self.expect_op(":")?;
        if self.peek().kind != TokenKind::Newline {
            if let Some(line) = self.out.lines.get_mut(self.current) {
                line.inline_body = true;
            }
            return self.simple_stmts();
        }
        self.end_line()?;
        if self.peek().kind != TokenKind::Indent {
            return self.error("expected an indented block");
        }
        self.advance();
        while !matches!(self.peek().kind, TokenKind::Dedent | TokenKind::End) {
            self.statement()?;
        }
        self.advance();
        Ok(())
    }

    fn else_clause(&mut self) -> PResult<()> {
        if self.at_kw("else") {
            self.begin(LineKind::Header(Clause::Else));
            self.advance();
            self.suite()?;
        }
        Ok(())
    }

    fn if_stmt(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::If));
        self.advance();
        self.named_test()?;
        self.suite()?;
        while self.at_kw("elif") {
            self.begin(LineKind::Header(Clause::Elif));
            self.advance();
            self.named_test()?;
            self.suite()?;
        }
        self.else_clause()
    }

    fn while_stmt(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::While));
        self.advance();
        self.named_test()?;
        self.suite()?;
        self.else_clause()
    }

    fn for_stmt(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::For));
        self.eat_kw("async");
        self.expect_kw("for")?;
        let target = self.target_list()?;
        self.bind_target(target);
        self.expect_kw("in")?;
        self.star_expressions()?;
        self.suite()?;
        self.else_clause()
    }

    fn try_stmt(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::Try));
        self.advance();
        self.suite()?;
        let mut handlers = 0;
        while self.at_kw("except") {
            self.begin(LineKind::Header(Clause::Except));
            self.advance();
            self.eat_op("*");
            if !self.at_op(":") {
                self.test()?;
                if self.eat_kw("as") {
                    let name = self.identifier()?;
                    self.bind(name);
                }
            }
            self.suite()?;
            handlers += 1;
        }
        if handlers > 0 {
            self.else_clause()?;
        }
        let mut finally = false;
        if self.at_kw("finally") {
            self.begin(LineKind::Header(Clause::Finally));
            self.advance();
            self.suite()?;
            finally = true;
        }
        if handlers == 0 && !finally {
            return self.error("expected 'except' or 'finally' block");
        }
        Ok(())
    }

    fn with_stmt(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::With));
        self.eat_kw("async");
        self.expect_kw("with")?;
        if self.at_op("(") {
            let saved_pos = self.pos;
            let saved_out = self.out.clone();
            let parenthesized = (|| -> PResult<()> {
                self.advance();
                self.with_items(true)?;
                self.expect_op(")")?;
                if self.at_op(":") {
                    Ok(())
                } else {
                    self.error("expected ':'")
                }
            })();
            if parenthesized.is_err() {
                self.pos = saved_pos;
                self.out = saved_out;
                self.with_items(false)?;
            }
        } else {
            self.with_items(false)?;
        }
        self.suite()
    }

    fn with_items(&mut self, parenthesized: bool) -> PResult<()> {
        loop {
            self.test()?;
            if self.eat_kw("as") {
                let target = self.target_item()?;
                self.bind_target(target);
            }
            if !self.eat_op(",") {
                break;
            }
            if parenthesized && self.at_op(")") {
                break;
            }
        }
        Ok(())
    }

    fn decorated(&mut self) -> PResult<()> {
        while self.at_op("@") {
            self.begin(LineKind::Decorator);
            self.advance();
            self.named_test()?;
            self.end_line()?;
        }
        let word = self.peek().text.clone();
        match word.as_str() {
            "def" | "async" => self.funcdef(),
            "class" => self.classdef(),
            _ => self.error("decorator must precede a function or class"),
        }
    }

    fn skip_type_params(&mut self) -> PResult<()> {
        if self.eat_op("[") {
            loop {
                self.eat_op("*");
                self.eat_op("**");
                self.identifier()?;
                if self.eat_op(":") {
                    self.test()?;
                }
                if !self.eat_op(",") || self.at_op("]") {
                    break;
                }
            }
            self.expect_op("]")?;
        }
        Ok(())
    }

    fn funcdef(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::Def));
        self.eat_kw("async");
        self.expect_kw("def")?;
        let name = self.identifier()?;
        self.bind(name);
        self.skip_type_params()?;
        self.expect_op("(")?;
        self.params(")", true)?;
        self.expect_op(")")?;
        if self.eat_op("->") {
            self.test()?;
        }
        self.suite()
    }

    fn classdef(&mut self) -> PResult<()> {
        self.begin(LineKind::Header(Clause::Class));
        self.advance();
        let name = self.identifier()?;
        self.bind(name);
        self.skip_type_params()?;
        if self.eat_op("(") {
            self.call_args()?;
        }
        self.suite()
    }

    /// Parameter list up to (not including) `close`; every parameter name is bound.
    fn params(&mut self, close: &str, annotated: bool) -> PResult<()> {
        while !self.at_op(close) {
            if self.eat_op("/") {
                // positional-only marker
            } else if self.eat_op("**") {
                let name = self.identifier()?;
                self.bind(name);
                self.annotation(annotated)?;
            } else if self.eat_op("*") {
                if self.at_identifier() {
                    let name = self.identifier()?;
                    self.bind(name);
                    self.annotation(annotated)?;
                }
            } else {
                let name = self.identifier()?;
                self.bind(name);
                self.annotation(annotated)?;
                if self.eat_op("=") {
                    self.test()?;
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(())
    }

    fn annotation(&mut self, annotated: bool) -> PResult<()> {
        if annotated && self.eat_op(":") {
            self.test()?;
        }
        Ok(())
    }

    fn small_stmt(&mut self) -> PResult<()> {
        let word = self.peek().text.clone();
        if self.peek().kind != TokenKind::Name {
            return self.expr_stmt();
        }
        match word.as_str() {
            "pass" | "break" | "continue" => {
                self.advance();
                Ok(())
            }
            "return" => {
                self.advance();
                if !self.at_expr_end() {
                    self.star_expressions()?;
                }
                Ok(())
            }
            "raise" => {
                self.advance();
                if !self.at_expr_end() {
                    self.test()?;
                    if self.eat_kw("from") {
                        self.test()?;
                    }
                }
                Ok(())
            }
            "global" | "nonlocal" => {
                self.advance();
                loop {
                    let name = self.identifier()?;
                    self.bind(name);
                    if !self.eat_op(",") {
                        break;
                    }
                }
                Ok(())
            }
            "del" => {
                self.advance();
                self.target_list().map(|_| ())
            }
            "assert" => {
                self.advance();
                self.test()?;
                if self.eat_op(",") {
                    self.test()?;
                }
                Ok(())
            }
            "import" => self.import_name(),
            "from" => self.import_from(),
            _ => self.expr_stmt(),
        }
    }

    fn dotted_name(&mut self) -> PResult<Vec<String>> {
        let mut parts = vec![self.identifier()?];
        while self.eat_op(".") {
            parts.push(self.identifier()?);
        }
        Ok(parts)
    }

    fn import_name(&mut self) -> PResult<()> {
        self.advance();
        loop {
            let parts = self.dotted_name()?;
            if self.eat_kw("as") {
                let alias = self.identifier()?;
                self.bind(alias);
            } else if let Some(first) = parts.into_iter().next() {
                self.bind(first);
            }
            if !self.eat_op(",") {
                return Ok(());
            }
        }
    }

    fn import_from(&mut self) -> PResult<()> {
        self.advance();
        let mut relative = false;
        while self.eat_op(".") || self.eat_op("...") {
            relative = true;
        }
        if !self.at_kw("import") || !relative {
            self.dotted_name()?;
        }
        self.expect_kw("import")?;
        if self.eat_op("*") {
            return Ok(());
        }
        let paren = self.eat_op("(");
        loop {
            let name = self.identifier()?;
            if self.eat_kw("as") {
                let alias = self.identifier()?;
                self.bind(alias);
            } else {
                self.bind(name);
            }
            if !self.eat_op(",") || (paren && self.at_op(")")) {
                break;
            }
        }
        if paren {
            self.expect_op(")")?;
        }
        Ok(())
    }

    fn rhs(&mut self) -> PResult<Expr> {
        if self.at_kw("yield") {
            self.yield_expr()?;
            Ok(Expr::Other)
        } else {
            self.star_expressions()
        }
    }

    fn expr_stmt(&mut self) -> PResult<()> {
        let first = self.rhs()?;
        if self.at_op("=") {
            let mut targets = vec![first];
            while self.eat_op("=") {
                targets.push(self.rhs()?);
            }
            targets.pop();
            for target in targets {
                self.bind_target(target);
            }
        } else if AUG_ASSIGN.contains(&self.peek().text.as_str()) && self.peek().kind == TokenKind::Op {
            self.advance();
            self.bind_target(first);
            self.rhs()?;
        } else if self.eat_op(":") {
            self.test()?;
            self.bind_target(first);
            if self.eat_op("=") {
                self.rhs()?;
            }
        }
        Ok(())
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn star_expressions(&mut self) -> PResult<Expr> {
        let first = self.star_named()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_expr_end() || self.at_kw("in") {
                break;
            }
            items.push(self.star_named()?);
        }
        Ok(Expr::Seq(items))
    }

    fn star_named(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            return Ok(Expr::Starred(Box::new(self.bitor()?)));
        }
        self.named_test()
    }

    /// `test`, or an assignment expression `name := test`.
    fn named_test(&mut self) -> PResult<Expr> {
        if self.at_identifier() && self.peek_at(1).is_op(":=") {
            let name = self.advance().text;
            self.advance();
            self.bind(name);
            self.test()?;
            return Ok(Expr::Other);
        }
        self.test()
    }

    fn test(&mut self) -> PResult<Expr> {
        if self.at_kw("lambda") {
            self.lambdef()?;
            return Ok(Expr::Other);
        }
        let e = self.or_test()?;
        if self.eat_kw("if") {
            self.or_test()?;
            self.expect_kw("else")?;
            self.test()?;
            return Ok(Expr::Other);
        }
        Ok(e)
    }

    fn lambdef(&mut self) -> PResult<()> {
        self.advance();
        self.params(":", false)?;
        self.expect_op(":")?;
        self.test().map(|_| ())
    }

    fn or_test(&mut self) -> PResult<Expr> {
        let mut e = self.and_test()?;
        while self.eat_kw("or") {
            self.and_test()?;
            e = Expr::Other;
        }
        Ok(e)
    }

    fn and_test(&mut self) -> PResult<Expr> {
        let mut e = self.not_test()?;
        while self.eat_kw("and") {
            self.not_test()?;
            e = Expr::Other;
        }
        Ok(e)
    }

    fn not_test(&mut self) -> PResult<Expr> {
        if self.eat_kw("not") {
            self.not_test()?;
            return Ok(Expr::Other);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut e = self.bitor()?;
        loop {
            let t = self.peek();
            let is_cmp = t.kind == TokenKind::Op
                && matches!(t.text.as_str(), "<" | ">" | "==" | ">=" | "<=" | "!=");
            if is_cmp || self.at_kw("in") {
                self.advance();
            } else if self.at_kw("not") && self.peek_at(1).is_name("in") {
                self.advance();
                self.advance();
            } else if self.at_kw("is") {
                self.advance();
                self.eat_kw("not");
            } else {
                return Ok(e);
            }
            self.bitor()?;
            e = Expr::Other;
        }
    }

    /// Left-associative binary level over `ops`, descending into `next`.
    fn binary(&mut self, ops: &[&str], next: fn(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        let mut e = next(self)?;
        while self.peek().kind == TokenKind::Op && ops.contains(&self.peek().text.as_str()) {
            self.advance();
            next(self)?;
            e = Expr::Other;
        }
        Ok(e)
    }

    fn bitor(&mut self) -> PResult<Expr> {
        self.binary(&["|"], Self::bitxor)
    }

    fn bitxor(&mut self) -> PResult<Expr> {
        self.binary(&["^"], Self::bitand)
    }

    fn bitand(&mut self) -> PResult<Expr> {
        self.binary(&["&"], Self::shift)
    }

    fn shift(&mut self) -> PResult<Expr> {
        self.binary(&["<<", ">>"], Self::arith)
    }

    fn arith(&mut self) -> PResult<Expr> {
        self.binary(&["+", "-"], Self::term)
    }

    fn term(&mut self) -> PResult<Expr> {
        self.binary(&["*", "/", "//", "%", "@"], Self::factor)
    }

    fn factor(&mut self) -> PResult<Expr> {
        if self.eat_op("+") || self.eat_op("-") || self.eat_op("~") {
            self.factor()?;
            return Ok(Expr::Other);
        }
        self.power()
    }

    fn power(&mut self) -> PResult<Expr> {
        let e = if self.eat_kw("await") {
            self.primary()?;
            Expr::Other
        } else {
            self.primary()?
        };
        if self.eat_op("**") {
            self.factor()?;
            return Ok(Expr::Other);
        }
        Ok(e)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let mut e = self.atom()?;
        loop {
            if self.at_op("(") {
                if let Expr::Name(name, line) = &e {
                    self.out.calls.push(BareCall {
                        name: name.clone(),
                        line: *line,
                        logical: self.current,
                    });
                }
                self.advance();
                self.call_args()?;
                e = Expr::Other;
            } else if self.eat_op("[") {
                self.subscripts()?;
                self.expect_op("]")?;
                e = Expr::Other;
            } else if self.eat_op(".") {
                if self.peek().kind != TokenKind::Name {
                    return self.error("expected an attribute name");
                }
                self.advance();
                e = Expr::Other;
            } else {
                return Ok(e);
            }
        }
    }

    fn atom(&mut self) -> PResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Name => match tok.text.as_str() {
                "None" | "True" | "False" => {
                    self.advance();
                    Ok(Expr::Other)
                }
                word if is_keyword(word) => self.error(format!("unexpected keyword '{}'", word)),
                _ => {
                    self.advance();
                    Ok(Expr::Name(tok.text, tok.line))
                }
            },
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Other)
            }
            TokenKind::Str => {
                while self.peek().kind == TokenKind::Str {
                    self.advance();
                }
                Ok(Expr::Other)
            }
            TokenKind::Op => match tok.text.as_str() {
                "..." => {
                    self.advance();
                    Ok(Expr::Other)
                }
                "(" => {
                    self.advance();
                    self.paren_atom()
                }
                "[" => {
                    self.advance();
                    self.list_atom()
                }
                "{" => {
                    self.advance();
                    self.brace_atom()?;
                    Ok(Expr::Other)
                }
                _ => self.error("invalid syntax"),
            },
            _ => self.error("invalid syntax"),
        }
    }

    fn paren_atom(&mut self) -> PResult<Expr> {
        if self.eat_op(")") {
            return Ok(Expr::Seq(Vec::new()));
        }
        if self.at_kw("yield") {
            self.yield_expr()?;
            self.expect_op(")")?;
            return Ok(Expr::Other);
        }
        let first = self.star_named()?;
        if self.at_comp_for() {
            self.comp_for()?;
            self.expect_op(")")?;
            return Ok(Expr::Other);
        }
        if !self.eat_op(",") {
            self.expect_op(")")?;
            return Ok(first);
        }
        let mut items = vec![first];
        while !self.at_op(")") {
            items.push(self.star_named()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok(Expr::Seq(items))
    }

    fn list_atom(&mut self) -> PResult<Expr> {
        if self.eat_op("]") {
            return Ok(Expr::Seq(Vec::new()));
        }
        let first = self.star_named()?;
        if self.at_comp_for() {
            self.comp_for()?;
            self.expect_op("]")?;
            return Ok(Expr::Other);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.star_named()?);
        }
        self.expect_op("]")?;
        Ok(Expr::Seq(items))
    }

    fn brace_atom(&mut self) -> PResult<()> {
        if self.eat_op("}") {
            return Ok(());
        }
        let is_dict = if self.eat_op("**") {
            self.bitor()?;
            true
        } else {
            self.star_named()?;
            if self.eat_op(":") {
                self.test()?;
                true
            } else {
                false
            }
        };
        if self.at_comp_for() {
            self.comp_for()?;
            return self.expect_op("}");
        }
        while self.eat_op(",") {
            if self.at_op("}") {
                break;
            }
            if is_dict {
                if self.eat_op("**") {
                    self.bitor()?;
                } else {
                    self.test()?;
                    self.expect_op(":")?;
                    self.test()?;
                }
            } else {
                self.star_named()?;
            }
        }
        self.expect_op("}")
    }

    fn at_comp_for(&self) -> bool {
        self.at_kw("for") || (self.at_kw("async") && self.peek_at(1).is_name("for"))
    }

    fn comp_for(&mut self) -> PResult<()> {
        while self.at_comp_for() {
            self.eat_kw("async");
            self.expect_kw("for")?;
            let target = self.target_list()?;
            self.bind_target(target);
            self.expect_kw("in")?;
            self.or_test()?;
            while self.eat_kw("if") {
                if self.at_kw("lambda") {
                    self.lambdef()?;
                } else {
                    self.or_test()?;
                }
            }
        }
        Ok(())
    }

    /// Targets of `for`, `del` and comprehensions; stops before `in`.
    fn target_list(&mut self) -> PResult<Expr> {
        let first = self.target_item()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_kw("in") || self.at_expr_end() {
                break;
            }
            items.push(self.target_item()?);
        }
        Ok(Expr::Seq(items))
    }

    fn target_item(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            return Ok(Expr::Starred(Box::new(self.bitor()?)));
        }
        self.bitor()
    }

    /// Call arguments after the opening paren, through the closing one.
    fn call_args(&mut self) -> PResult<()> {
        loop {
            if self.eat_op(")") {
                return Ok(());
            }
            if self.eat_op("*") || self.eat_op("**") {
                self.test()?;
            } else if self.at_identifier() && self.peek_at(1).is_op("=") {
                self.advance();
                self.advance();
                self.test()?;
            } else {
                self.named_test()?;
                if self.at_comp_for() {
                    self.comp_for()?;
                }
            }
            if !self.eat_op(",") {
                return self.expect_op(")");
            }
        }
    }

    fn subscripts(&mut self) -> PResult<()> {
        loop {
            if !self.at_op(":") {
                if self.eat_op("*") {
                    self.bitor()?;
                } else {
                    self.named_test()?;
                }
            }
            if self.eat_op(":") {
                if !self.at_op(":") && !self.at_op("]") && !self.at_op(",") {
                    self.test()?;
                }
                if self.eat_op(":") && !self.at_op("]") && !self.at_op(",") {
                    self.test()?;
                }
            }
            if !self.eat_op(",") || self.at_op("]") {
                return Ok(());
            }
        }
    }

    fn yield_expr(&mut self) -> PResult<()> {
        self.advance();
        if self.eat_kw("from") {
            self.test()?;
        } else if !self.at_expr_end() {
            self.star_expressions()?;
        }
        Ok(())
    }
}
