//! Physical-line scanner that tracks bracket, string and backslash
//! continuations without parsing.
//!
//! Used where a pass must work on scripts the parser rejects.

/// One physical line as seen by [`LineScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    /// The line with comments removed and string contents blanked to spaces.
    /// Quotes are kept so the code keeps its shape.
    pub code: String,
    /// The line began inside an unfinished statement.
    pub continued: bool,
    /// The statement is still unfinished at the end of the line.
    pub open: bool,
}

#[derive(Debug, Default)]
pub struct LineScanner {
    depth: usize,
    triple: Option<char>,
    backslash: bool,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&mut self, line: &str) -> ScannedLine {
        let continued = self.depth > 0 || self.triple.is_some() || self.backslash;
        self.backslash = false;

        let chars: Vec<char> = line.chars().collect();
        let mut code = String::with_capacity(line.len());
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = self.triple {
                if c == q && chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                    code.extend([q, q, q]);
                    self.triple = None;
                    i += 3;
                } else {
                    if c == '\\' && i + 1 < chars.len() {
                        code.push(' ');
                        i += 1;
                    }
                    code.push(' ');
                    i += 1;
                }
                continue;
            }
            match c {
                '#' => break,
                '"' | '\'' => {
                    if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        code.extend([c, c, c]);
                        self.triple = Some(c);
                        i += 3;
                        continue;
                    }
                    code.push(c);
                    i += 1;
                    while i < chars.len() && chars[i] != c {
                        if chars[i] == '\\' && i + 1 < chars.len() {
                            code.push(' ');
                            i += 1;
                        }
                        code.push(' ');
                        i += 1;
                    }
                    if i < chars.len() {
                        code.push(c);
                        i += 1;
                    }
                }
                '(' | '[' | '{' => {
                    self.depth += 1;
                    code.push(c);
                    i += 1;
                }
                ')' | ']' | '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    code.push(c);
                    i += 1;
                }
                _ => {
                    code.push(c);
                    i += 1;
                }
            }
        }
        // A code line with a dangling backslash joins the next one.
        if self.triple.is_none() && code.trim_end().ends_with('\\') {
            self.backslash = true;
        }

        ScannedLine {
            code,
            continued,
            open: self.depth > 0 || self.triple.is_some() || self.backslash,
        }
    }
}

/// Indentation width of a line; a tab counts as four columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Leading whitespace of a line, verbatim.
pub fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Byte offsets where `name` occurs as a whole identifier in `code`.
pub fn find_word<'a>(code: &'a str, name: &'a str) -> impl Iterator<Item = usize> + 'a {
    code.match_indices(name).filter_map(move |(at, _)| {
        let before = code[..at].chars().next_back();
        let after = code[at + name.len()..].chars().next();
        let is_ident = |c: char| c.is_alphanumeric() || c == '_';
        if before.map_or(false, is_ident) || after.map_or(false, is_ident) {
            None
        } else {
            Some(at)
        }
    })
}
