//! Script dialect run by `MockKernel::execute`.
//!
//! Covers the slice of generated-script surface the pipeline tests need:
//! assignments, expression statements, `try`/`except`/`else`/`finally`,
//! `if`/`elif`/`else`, imports and `pass`. Every `except` clause catches every
//! error. Anything outside the dialect raises `NotImplementedError`.
//!
//! Callables: `box(w, d, h)`, `workplane(*items)`, `build_part(x)`,
//! `build_sketch(x)`, `compound(*shapes)`, `fuse(a, b)`, `opaque(type_name)`,
//! `print(...)`, `len(x)`, plus every shim in the request. Shape methods:
//! `.translate((x, y, z))`, `.fillet(r)`, `.chamfer(d)`, `.fuse(other)`.
//! Workplane methods: `.val()`, `.vals()`. Attributes: `.part`, `.sketch`.

use std::collections::HashMap;
use std::fmt;

use crate::mock_kernel::MockKernel;
use crate::traits::Kernel;
use crate::types::*;

/// An error raised by the running script.
#[derive(Debug)]
struct Raised {
    kind: &'static str,
    message: String,
    /// 1-based; 0 until a statement claims it.
    line: usize,
}

impl Raised {
    fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: 0,
        }
    }

    fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self {
            kind: "SyntaxError",
            message: message.into(),
            line,
        }
    }

    fn at(mut self, line: usize) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "Traceback (line {}): {}: {}", self.line, self.kind, self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(String, Value)>),
    Shape(ShapeHandle),
    Workplane(Vec<Value>),
    BuildPart(Box<Value>),
    BuildSketch(Box<Value>),
    Opaque(String),
    /// A no-op callable.
    Shim,
}

impl Value {
    fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Shape(_) => "Solid",
            Value::Workplane(_) => "Workplane",
            Value::BuildPart(_) => "BuildPart",
            Value::BuildSketch(_) => "BuildSketch",
            Value::Opaque(name) => name,
            Value::Shim => "function",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) | Value::Workplane(v) => !v.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            _ => true,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn into_candidate(self) -> Candidate {
        fn all(items: Vec<Value>) -> Vec<Candidate> {
            items.into_iter().map(Value::into_candidate).collect()
        }
        match self {
            Value::None => Candidate::Absent,
            Value::Bool(b) => Candidate::Bool(b),
            Value::Int(i) => Candidate::Int(i),
            Value::Float(x) => Candidate::Float(x),
            Value::Str(s) => Candidate::Text(s),
            Value::Bytes(b) => Candidate::Bytes(b),
            Value::List(v) | Value::Tuple(v) => Candidate::Sequence(all(v)),
            Value::Set(v) => Candidate::Set(all(v)),
            Value::Dict(d) => Candidate::Mapping(
                d.into_iter()
                    .map(|(k, v)| (k, v.into_candidate()))
                    .collect(),
            ),
            Value::Shape(h) => Candidate::shape(h),
            Value::Workplane(v) => Candidate::workplane(all(v)),
            Value::BuildPart(v) => Candidate::build_part(v.into_candidate()),
            Value::BuildSketch(v) => Candidate::build_sketch(v.into_candidate()),
            Value::Opaque(name) => Candidate::opaque(name),
            Value::Shim => Candidate::opaque("function"),
        }
    }
}

// ── Lines and blocks ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Line {
    no: usize,
    indent: usize,
    text: String,
}

fn indent_width(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Strip the comment from one physical line and report its bracket balance.
fn scan_line(raw: &str, no: usize) -> Result<(String, i32), Raised> {
    let chars: Vec<char> = raw.chars().collect();
    let mut code = String::with_capacity(raw.len());
    let mut depth = 0;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '#' {
            break;
        }
        if c == '"' || c == '\'' {
            let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
            let width = if triple { 3 } else { 1 };
            let start = i;
            i += width;
            loop {
                if i >= chars.len() {
                    return Err(Raised::syntax("unterminated string literal", no));
                }
                if chars[i] == '\\' {
                    i += 2;
                    continue;
                }
                if chars[i] == c && (!triple || (i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c)) {
                    i += width;
                    break;
                }
                i += 1;
            }
            code.extend(&chars[start..i.min(chars.len())]);
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        code.push(c);
        i += 1;
    }
    Ok((code, depth))
}

/// Join physical lines into logical lines (open brackets and backslashes continue).
fn logical_lines(src: &str) -> Result<Vec<Line>, Raised> {
    let mut out = Vec::new();
    let mut pending: Option<Line> = None;
    let mut depth = 0;
    for (idx, raw) in src.lines().enumerate() {
        let (code, delta) = scan_line(raw, idx + 1)?;
        let mut trimmed = code.trim().to_string();
        let backslash = trimmed.ends_with('\\');
        if backslash {
            trimmed.pop();
        }
        match pending.as_mut() {
            Some(p) => {
                p.text.push(' ');
                p.text.push_str(trimmed.trim());
            }
            None => {
                if trimmed.is_empty() {
                    continue;
                }
                pending = Some(Line {
                    no: idx + 1,
                    indent: indent_width(raw),
                    text: trimmed.trim().to_string(),
                });
            }
        }
        depth += delta;
        if depth <= 0 && !backslash {
            depth = 0;
            if let Some(line) = pending.take() {
                out.push(line);
            }
        }
    }
    if let Some(line) = pending {
        return Err(Raised::syntax("unexpected end of input", line.no));
    }
    Ok(out)
}

#[derive(Debug)]
enum Stmt {
    Simple {
        line: usize,
        text: String,
    },
    If {
        arms: Vec<(usize, String, Vec<Stmt>)>,
        orelse: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<Vec<Stmt>>,
        orelse: Vec<Stmt>,
        finally: Vec<Stmt>,
    },
}

fn first_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

/// The text between a compound keyword and its trailing colon.
fn header_body(line: &Line, keyword: &str) -> Result<String, Raised> {
    let text = line.text.trim_end();
    match text.strip_suffix(':') {
        Some(head) => Ok(head[keyword.len()..].trim().to_string()),
        None => Err(Raised::syntax(
            format!("expected ':' after '{}'", keyword),
            line.no,
        )),
    }
}

struct BlockParser<'a> {
    lines: &'a [Line],
    pos: usize,
}

impl<'a> BlockParser<'a> {
    fn block(&mut self, indent: usize) -> Result<Vec<Stmt>, Raised> {
        let lines = self.lines;
        let mut out = Vec::new();
        while let Some(line) = lines.get(self.pos) {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(Raised::syntax("unexpected indent", line.no));
            }
            self.pos += 1;
            out.push(self.statement(line)?);
        }
        Ok(out)
    }

    fn suite(&mut self, header: &Line) -> Result<Vec<Stmt>, Raised> {
        let lines = self.lines;
        match lines.get(self.pos) {
            Some(next) if next.indent > header.indent => self.block(next.indent),
            _ => Err(Raised::syntax("expected an indented block", header.no)),
        }
    }

    /// The next line if it continues the compound statement headed by `header`.
    fn sibling(&self, header: &Line) -> Option<&'a Line> {
        self.lines
            .get(self.pos)
            .filter(|next| next.indent == header.indent)
    }

    fn statement(&mut self, line: &Line) -> Result<Stmt, Raised> {
        match first_word(&line.text) {
            "if" => {
                let cond = header_body(line, "if")?;
                let body = self.suite(line)?;
                let mut arms = vec![(line.no, cond, body)];
                let mut orelse = Vec::new();
                while let Some(next) = self.sibling(line) {
                    match first_word(&next.text) {
                        "elif" => {
                            self.pos += 1;
                            let cond = header_body(next, "elif")?;
                            let body = self.suite(next)?;
                            arms.push((next.no, cond, body));
                        }
                        "else" => {
                            self.pos += 1;
                            header_body(next, "else")?;
                            orelse = self.suite(next)?;
                            break;
                        }
                        _ => break,
                    }
                }
                Ok(Stmt::If { arms, orelse })
            }
            "try" => {
                header_body(line, "try")?;
                let body = self.suite(line)?;
                let mut handlers = Vec::new();
                let mut orelse = Vec::new();
                let mut finally = Vec::new();
                while let Some(next) = self.sibling(line) {
                    match first_word(&next.text) {
                        "except" => {
                            self.pos += 1;
                            header_body(next, "except")?;
                            handlers.push(self.suite(next)?);
                        }
                        "else" if !handlers.is_empty() => {
                            self.pos += 1;
                            header_body(next, "else")?;
                            orelse = self.suite(next)?;
                        }
                        "finally" => {
                            self.pos += 1;
                            header_body(next, "finally")?;
                            finally = self.suite(next)?;
                            break;
                        }
                        _ => break,
                    }
                }
                if handlers.is_empty() && finally.is_empty() {
                    return Err(Raised::syntax("expected 'except' or 'finally' block", line.no));
                }
                Ok(Stmt::Try {
                    body,
                    handlers,
                    orelse,
                    finally,
                })
            }
            "elif" | "else" | "except" | "finally" => {
                Err(Raised::syntax("invalid syntax", line.no))
            }
            kw @ ("def" | "class" | "for" | "while" | "with" | "async" | "match" | "return"
            | "yield" | "del" | "global" | "nonlocal" | "assert" | "lambda") => Err(Raised {
                kind: "NotImplementedError",
                message: format!("'{}' is not supported by the mock kernel", kw),
                line: line.no,
            }),
            _ => Ok(Stmt::Simple {
                line: line.no,
                text: line.text.clone(),
            }),
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Name(String),
    Sym(char),
}

fn read_string(chars: &[char], mut i: usize) -> Result<(String, usize), Raised> {
    let quote = chars[i];
    let triple = i + 2 < chars.len() && chars[i + 1] == quote && chars[i + 2] == quote;
    i += if triple { 3 } else { 1 };
    let mut s = String::new();
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(Raised::new("SyntaxError", "unterminated string literal"));
        };
        if c == '\\' {
            let escaped = chars.get(i + 1).copied().unwrap_or('\\');
            s.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                return Ok((s, i + 1));
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return Ok((s, i + 3));
            }
        }
        s.push(c);
        i += 1;
    }
}

fn tokenize(src: &str) -> Result<Vec<Tok>, Raised> {
    let chars: Vec<char> = src.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            let mut float = false;
            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_digit() || d == '_' {
                    i += 1;
                } else if d == '.' || d == 'e' || d == 'E' {
                    float = true;
                    i += 1;
                    if (d == 'e' || d == 'E') && matches!(chars.get(i), Some('+') | Some('-')) {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            let bad = || Raised::new("SyntaxError", format!("invalid number literal '{}'", text));
            if float {
                toks.push(Tok::Float(text.parse().map_err(|_| bad())?));
            } else {
                toks.push(Tok::Int(text.parse().map_err(|_| bad())?));
            }
        } else if c == '"' || c == '\'' {
            let (s, next) = read_string(&chars, i)?;
            toks.push(Tok::Str(s));
            i = next;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let is_prefix = word.len() <= 2 && word.chars().all(|p| "rRbBuUfF".contains(p));
            if is_prefix && matches!(chars.get(i), Some('"') | Some('\'')) {
                let (s, next) = read_string(&chars, i)?;
                i = next;
                if word.contains(['b', 'B']) {
                    toks.push(Tok::Bytes(s.into_bytes()));
                } else {
                    toks.push(Tok::Str(s));
                }
            } else {
                toks.push(Tok::Name(word));
            }
        } else if "()[]{},.:+-*/=".contains(c) {
            if c == '=' && chars.get(i + 1) == Some(&'=') {
                return Err(Raised::new("NotImplementedError", "comparisons are not supported"));
            }
            toks.push(Tok::Sym(c));
            i += 1;
        } else {
            return Err(Raised::new("SyntaxError", format!("unexpected character '{}'", c)));
        }
    }
    Ok(toks)
}

struct Cursor {
    toks: Vec<Tok>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.toks.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat(&mut self, sym: char) -> bool {
        if self.peek() == Some(&Tok::Sym(sym)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, sym: char) -> Result<(), Raised> {
        if self.eat(sym) {
            Ok(())
        } else {
            Err(Raised::new("SyntaxError", format!("expected '{}'", sym)))
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.toks.len()
    }
}

/// Index of a top-level `=` that makes `text` an assignment.
fn find_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth -= 1,
                b'=' if depth == 0 => {
                    let next_eq = bytes.get(i + 1) == Some(&b'=');
                    let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                    if !next_eq && !b"=!<>".contains(&prev) {
                        return Some(i);
                    }
                    if next_eq {
                        i += 1;
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

// ── Interpreter ─────────────────────────────────────────────────────────────

struct Interp<'k> {
    kernel: &'k mut MockKernel,
    env: HashMap<String, Value>,
    shims: Vec<String>,
}

impl<'k> Interp<'k> {
    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), Raised> {
        for stmt in stmts {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), Raised> {
        match stmt {
            Stmt::Simple { line, text } => self.exec_simple(text).map_err(|e| e.at(*line)),
            Stmt::If { arms, orelse } => {
                for (line, cond, body) in arms {
                    let v = self.eval(cond).map_err(|e| e.at(*line))?;
                    if v.truthy() {
                        return self.exec_block(body);
                    }
                }
                self.exec_block(orelse)
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finally,
            } => {
                let outcome = match self.exec_block(body) {
                    Ok(()) => self.exec_block(orelse),
                    Err(raised) => match handlers.first() {
                        Some(handler) => self.exec_block(handler),
                        None => Err(raised),
                    },
                };
                self.exec_block(finally)?;
                outcome
            }
        }
    }

    fn exec_simple(&mut self, text: &str) -> Result<(), Raised> {
        let keyword = first_word(text);
        if text == "pass" || keyword == "import" || keyword == "from" {
            return Ok(());
        }
        if keyword == "raise" {
            let what = text["raise".len()..].trim();
            return Err(Raised::new("RuntimeError", what));
        }
        if let Some(eq) = find_assign(text) {
            let value = self.eval(&text[eq + 1..])?;
            return self.assign(text[..eq].trim(), value);
        }
        self.eval(text).map(|_| ())
    }

    /// Bind a plain name, a parenthesized name, or a flat tuple of names.
    fn assign(&mut self, target: &str, value: Value) -> Result<(), Raised> {
        let target = target
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(target)
            .trim();
        let names: Vec<&str> = target.split(',').map(str::trim).filter(|n| !n.is_empty()).collect();
        if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
            return Err(Raised::new(
                "NotImplementedError",
                format!("unsupported assignment target '{}'", bad),
            ));
        }
        if !target.contains(',') {
            if let Some(name) = names.first() {
                self.env.insert(name.to_string(), value);
            }
            return Ok(());
        }
        let items = match value {
            Value::List(items) | Value::Tuple(items) => items,
            other => {
                return Err(Raised::new(
                    "TypeError",
                    format!("cannot unpack non-iterable {} object", other.type_name()),
                ))
            }
        };
        if items.len() != names.len() {
            return Err(Raised::new(
                "ValueError",
                format!("expected {} values to unpack, got {}", names.len(), items.len()),
            ));
        }
        for (name, item) in names.into_iter().zip(items) {
            self.env.insert(name.to_string(), item);
        }
        Ok(())
    }

    fn eval(&mut self, src: &str) -> Result<Value, Raised> {
        let mut cur = Cursor {
            toks: tokenize(src)?,
            pos: 0,
        };
        let first = self.expr(&mut cur)?;
        let value = if cur.eat(',') {
            let mut items = vec![first];
            while !cur.done() {
                items.push(self.expr(&mut cur)?);
                if !cur.eat(',') {
                    break;
                }
            }
            Value::Tuple(items)
        } else {
            first
        };
        if !cur.done() {
            return Err(Raised::new("SyntaxError", "invalid syntax"));
        }
        Ok(value)
    }

    fn expr(&mut self, cur: &mut Cursor) -> Result<Value, Raised> {
        let mut lhs = self.term(cur)?;
        loop {
            let op = match cur.peek() {
                Some(Tok::Sym(c @ ('+' | '-'))) => *c,
                _ => break,
            };
            cur.pos += 1;
            let rhs = self.term(cur)?;
            lhs = binop(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn term(&mut self, cur: &mut Cursor) -> Result<Value, Raised> {
        let mut lhs = self.unary(cur)?;
        loop {
            let op = match cur.peek() {
                Some(Tok::Sym(c @ ('*' | '/'))) => *c,
                _ => break,
            };
            cur.pos += 1;
            let rhs = self.unary(cur)?;
            lhs = binop(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self, cur: &mut Cursor) -> Result<Value, Raised> {
        if cur.eat('-') {
            return match self.unary(cur)? {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(Raised::new(
                    "TypeError",
                    format!("bad operand type for unary -: '{}'", other.type_name()),
                )),
            };
        }
        if cur.eat('+') {
            return self.unary(cur);
        }
        self.postfix(cur)
    }

    fn postfix(&mut self, cur: &mut Cursor) -> Result<Value, Raised> {
        let callee = match (cur.peek(), cur.peek_at(1)) {
            (Some(Tok::Name(name)), Some(Tok::Sym('('))) => Some(name.clone()),
            _ => None,
        };
        let mut value = match callee {
            Some(name) => {
                cur.pos += 2;
                let args = self.args(cur)?;
                self.call_named(&name, args)?
            }
            None => self.atom(cur)?,
        };
        loop {
            if cur.eat('.') {
                let Some(Tok::Name(attr)) = cur.next() else {
                    return Err(Raised::new("SyntaxError", "expected attribute name"));
                };
                if cur.eat('(') {
                    let args = self.args(cur)?;
                    value = self.call_method(value, &attr, args)?;
                } else {
                    value = get_attr(value, &attr)?;
                }
            } else if cur.eat('(') {
                let _ = self.args(cur)?;
                value = match value {
                    Value::Shim => Value::None,
                    other => {
                        return Err(Raised::new(
                            "TypeError",
                            format!("'{}' object is not callable", other.type_name()),
                        ))
                    }
                };
            } else {
                return Ok(value);
            }
        }
    }

    /// Arguments after an opening paren; keyword values follow the positionals.
    fn args(&mut self, cur: &mut Cursor) -> Result<Vec<Value>, Raised> {
        let mut positional = Vec::new();
        let mut keyword = Vec::new();
        while !cur.eat(')') {
            if matches!((cur.peek(), cur.peek_at(1)), (Some(Tok::Name(_)), Some(Tok::Sym('=')))) {
                cur.pos += 2;
                keyword.push(self.expr(cur)?);
            } else {
                positional.push(self.expr(cur)?);
            }
            if !cur.eat(',') {
                cur.expect(')')?;
                break;
            }
        }
        positional.extend(keyword);
        Ok(positional)
    }

    fn items(&mut self, cur: &mut Cursor, close: char) -> Result<Vec<Value>, Raised> {
        let mut items = Vec::new();
        while !cur.eat(close) {
            items.push(self.expr(cur)?);
            if !cur.eat(',') {
                cur.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn atom(&mut self, cur: &mut Cursor) -> Result<Value, Raised> {
        match cur.next() {
            Some(Tok::Int(i)) => Ok(Value::Int(i)),
            Some(Tok::Float(x)) => Ok(Value::Float(x)),
            Some(Tok::Str(mut s)) => {
                while let Some(Tok::Str(more)) = cur.peek() {
                    s.push_str(more);
                    cur.pos += 1;
                }
                Ok(Value::Str(s))
            }
            Some(Tok::Bytes(b)) => Ok(Value::Bytes(b)),
            Some(Tok::Name(name)) => match name.as_str() {
                "None" => Ok(Value::None),
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                _ => self.lookup(&name),
            },
            Some(Tok::Sym('(')) => {
                if cur.eat(')') {
                    return Ok(Value::Tuple(Vec::new()));
                }
                let first = self.expr(cur)?;
                if cur.eat(')') {
                    return Ok(first);
                }
                cur.expect(',')?;
                let mut items = vec![first];
                items.extend(self.items(cur, ')')?);
                Ok(Value::Tuple(items))
            }
            Some(Tok::Sym('[')) => Ok(Value::List(self.items(cur, ']')?)),
            Some(Tok::Sym('{')) => {
                if cur.eat('}') {
                    return Ok(Value::Dict(Vec::new()));
                }
                let first = self.expr(cur)?;
                if !cur.eat(':') {
                    let mut items = vec![first];
                    if cur.eat(',') {
                        items.extend(self.items(cur, '}')?);
                    } else {
                        cur.expect('}')?;
                    }
                    return Ok(Value::Set(items));
                }
                let mut entries = vec![(dict_key(first)?, self.expr(cur)?)];
                while cur.eat(',') {
                    if cur.eat('}') {
                        return Ok(Value::Dict(entries));
                    }
                    let key = self.expr(cur)?;
                    cur.expect(':')?;
                    entries.push((dict_key(key)?, self.expr(cur)?));
                }
                cur.expect('}')?;
                Ok(Value::Dict(entries))
            }
            _ => Err(Raised::new("SyntaxError", "invalid syntax")),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, Raised> {
        if let Some(v) = self.env.get(name) {
            return Ok(v.clone());
        }
        if self.shims.iter().any(|s| s == name) {
            return Ok(Value::Shim);
        }
        Err(name_error(name))
    }

    fn call_named(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Raised> {
        if let Some(bound) = self.env.get(name) {
            return match bound {
                Value::Shim => Ok(Value::None),
                other => Err(Raised::new(
                    "TypeError",
                    format!("'{}' object is not callable", other.type_name()),
                )),
            };
        }
        if self.shims.iter().any(|s| s == name) {
            return Ok(Value::None);
        }
        match name {
            "box" => {
                let dims = numbers(name, &args, 3)?;
                let h = self
                    .kernel
                    .make_box(dims[0], dims[1], dims[2])
                    .map_err(|m| Raised::new("ValueError", m))?;
                Ok(Value::Shape(h))
            }
            "workplane" => Ok(Value::Workplane(args)),
            "build_part" => Ok(Value::BuildPart(Box::new(single(name, args)?))),
            "build_sketch" => Ok(Value::BuildSketch(Box::new(single(name, args)?))),
            "compound" => {
                let handles = args
                    .iter()
                    .map(|a| shape_of(a, name))
                    .collect::<Result<Vec<_>, _>>()?;
                let h = self.kernel.make_compound(&handles).map_err(kernel_raised)?;
                Ok(Value::Shape(h))
            }
            "fuse" => {
                if args.len() != 2 {
                    return Err(arity(name, 2, args.len()));
                }
                let a = shape_of(&args[0], name)?;
                let b = shape_of(&args[1], name)?;
                Ok(Value::Shape(self.kernel.boolean_fuse(&a, &b).map_err(kernel_raised)?))
            }
            "opaque" => match single(name, args)? {
                Value::Str(type_name) => Ok(Value::Opaque(type_name)),
                other => Err(Raised::new(
                    "TypeError",
                    format!("opaque() expects a str, got '{}'", other.type_name()),
                )),
            },
            "print" => Ok(Value::None),
            "len" => match single(name, args)? {
                Value::List(v) | Value::Tuple(v) | Value::Set(v) => Ok(Value::Int(v.len() as i64)),
                Value::Dict(d) => Ok(Value::Int(d.len() as i64)),
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                other => Err(Raised::new(
                    "TypeError",
                    format!("object of type '{}' has no len()", other.type_name()),
                )),
            },
            _ => Err(name_error(name)),
        }
    }

    fn call_method(&mut self, recv: Value, method: &str, args: Vec<Value>) -> Result<Value, Raised> {
        match (&recv, method) {
            (Value::Shape(h), "translate") => {
                if args.len() != 1 {
                    return Err(Raised::new(
                        "TypeError",
                        format!("translate() takes 1 positional argument but {} were given", args.len()),
                    ));
                }
                let v = match &args[0] {
                    Value::Tuple(items) | Value::List(items) => numbers("translate", items, 3)?,
                    other => {
                        return Err(Raised::new(
                            "TypeError",
                            format!("translate() expects a 3-tuple, got '{}'", other.type_name()),
                        ))
                    }
                };
                let moved = self
                    .kernel
                    .translated(h, [v[0], v[1], v[2]])
                    .map_err(kernel_raised)?;
                Ok(Value::Shape(moved))
            }
            (Value::Shape(h), op @ ("fillet" | "chamfer")) => {
                let size = numbers(op, &args, 1)?[0];
                let out = self
                    .kernel
                    .edge_op(h, op, size)
                    .map_err(|m| Raised::new("RuntimeError", m))?;
                Ok(Value::Shape(out))
            }
            (Value::Shape(h), "fuse") => {
                let other = shape_of(&single("fuse", args)?, "fuse")?;
                Ok(Value::Shape(self.kernel.boolean_fuse(h, &other).map_err(kernel_raised)?))
            }
            (Value::Workplane(items), "val") => Ok(items.first().cloned().unwrap_or(Value::None)),
            (Value::Workplane(items), "vals") => Ok(Value::List(items.clone())),
            _ => Err(no_attribute(&recv, method)),
        }
    }
}

fn get_attr(value: Value, attr: &str) -> Result<Value, Raised> {
    match (value, attr) {
        (Value::BuildPart(part), "part") => Ok(*part),
        (Value::BuildSketch(sketch), "sketch") => Ok(*sketch),
        (other, _) => Err(no_attribute(&other, attr)),
    }
}

fn binop(op: char, lhs: Value, rhs: Value) -> Result<Value, Raised> {
    match (op, &lhs, &rhs) {
        ('+', Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{}{}", a, b))),
        ('+', Value::List(a), Value::List(b)) => {
            let mut joined = a.clone();
            joined.extend(b.iter().cloned());
            return Ok(Value::List(joined));
        }
        ('+' | '-' | '*', Value::Int(a), Value::Int(b)) => {
            let out = match op {
                '+' => a.checked_add(*b),
                '-' => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            return out
                .map(Value::Int)
                .ok_or_else(|| Raised::new("OverflowError", "integer overflow"));
        }
        _ => {}
    }
    let (Some(a), Some(b)) = (lhs.number(), rhs.number()) else {
        return Err(Raised::new(
            "TypeError",
            format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op,
                lhs.type_name(),
                rhs.type_name()
            ),
        ));
    };
    match op {
        '+' => Ok(Value::Float(a + b)),
        '-' => Ok(Value::Float(a - b)),
        '*' => Ok(Value::Float(a * b)),
        _ if b == 0.0 => Err(Raised::new("ZeroDivisionError", "division by zero")),
        _ => Ok(Value::Float(a / b)),
    }
}

fn dict_key(key: Value) -> Result<String, Raised> {
    match key {
        Value::Str(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(Raised::new(
            "TypeError",
            format!("unsupported dict key type '{}'", other.type_name()),
        )),
    }
}

fn numbers(func: &str, args: &[Value], n: usize) -> Result<Vec<f64>, Raised> {
    if args.len() != n {
        return Err(arity(func, n, args.len()));
    }
    args.iter()
        .map(|a| {
            a.number().ok_or_else(|| {
                Raised::new(
                    "TypeError",
                    format!("{}() expects numbers, got '{}'", func, a.type_name()),
                )
            })
        })
        .collect()
}

fn single(func: &str, mut args: Vec<Value>) -> Result<Value, Raised> {
    if args.len() != 1 {
        return Err(arity(func, 1, args.len()));
    }
    Ok(args.remove(0))
}

fn shape_of(value: &Value, func: &str) -> Result<ShapeHandle, Raised> {
    match value {
        Value::Shape(h) => Ok(h.clone()),
        other => Err(Raised::new(
            "TypeError",
            format!("{}() expects a shape, got '{}'", func, other.type_name()),
        )),
    }
}

fn arity(func: &str, expected: usize, given: usize) -> Raised {
    Raised::new(
        "TypeError",
        format!("{}() takes {} argument(s) but {} were given", func, expected, given),
    )
}

fn name_error(name: &str) -> Raised {
    Raised::new("NameError", format!("name '{}' is not defined", name))
}

fn no_attribute(value: &Value, attr: &str) -> Raised {
    Raised::new(
        "AttributeError",
        format!("'{}' object has no attribute '{}'", value.type_name(), attr),
    )
}

fn kernel_raised(err: KernelError) -> Raised {
    Raised::new("RuntimeError", err.to_string())
}

fn run_program(kernel: &mut MockKernel, request: &ExecRequest) -> Result<HashMap<String, Value>, Raised> {
    let lines = logical_lines(&request.script)?;
    let mut parser = BlockParser {
        lines: &lines,
        pos: 0,
    };
    let program = parser.block(0)?;
    let mut interp = Interp {
        kernel,
        env: HashMap::new(),
        shims: request.shims.clone(),
    };
    interp.exec_block(&program)?;
    Ok(interp.env)
}

/// Run `request.script` against `kernel` and collect its bindings.
pub(crate) fn run(kernel: &mut MockKernel, request: &ExecRequest) -> Result<Namespace, KernelError> {
    let env = run_program(kernel, request).map_err(|raised| KernelError::ScriptRaised {
        trace: raised.to_string(),
    })?;
    let bindings = env
        .into_iter()
        .filter(|(_, v)| !matches!(v, Value::Shim))
        .map(|(k, v)| (k, v.into_candidate()))
        .collect();
    Ok(Namespace { bindings })
}
