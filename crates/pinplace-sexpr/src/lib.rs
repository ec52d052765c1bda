//! S-expression reader and writer for the subset of KiCad files pinplace touches.
//!
//! Reading is used for `.kicad_sym` symbol libraries (pin tables); writing is
//! used for the minimal `.kicad_sch` records (symbols, wires, labels). Atoms keep
//! their exact textual form so numbers survive a read/write cycle unchanged.

use std::fmt;

/// An S-expression value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sexpr {
    /// Unquoted atom (`pin`, `passive`, `2.54`)
    Symbol(String),
    /// Quoted atom (`"R"`, `"~"`)
    String(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    pub fn symbol(s: impl Into<String>) -> Self {
        Sexpr::Symbol(s.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Sexpr::String(s.into())
    }

    pub fn list(items: Vec<Sexpr>) -> Self {
        Sexpr::List(items)
    }

    /// A numeric atom in the canonical coordinate form, see [`format_number`].
    pub fn number(value: f64) -> Self {
        Sexpr::Symbol(format_number(value))
    }

    /// Build a `(tag item...)` list.
    pub fn tagged(tag: &str, items: impl IntoIterator<Item = Sexpr>) -> Self {
        let mut list = vec![Sexpr::symbol(tag)];
        list.extend(items);
        Sexpr::List(list)
    }

    /// Get the atom value if this is an atom (symbol or string)
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) | Sexpr::String(s) => Some(s),
            Sexpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_atom()?.parse().ok()
    }

    /// The leading symbol of a list, e.g. `pin` for `(pin passive line ...)`.
    pub fn tag(&self) -> Option<&str> {
        match self.as_list()?.first()? {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    /// Item at `index` of a list (the tag is index 0).
    pub fn get(&self, index: usize) -> Option<&Sexpr> {
        self.as_list()?.get(index)
    }

    /// First direct child list carrying `tag`.
    pub fn find(&self, tag: &str) -> Option<&Sexpr> {
        self.as_list()?.iter().find(|item| item.is_tagged(tag))
    }

    /// All direct child lists carrying `tag`, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Sexpr> + 'a {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter(move |item| item.is_tagged(tag))
    }

    /// Atom value of the first `(tag value)` child.
    pub fn child_atom(&self, tag: &str) -> Option<&str> {
        self.find(tag)?.get(1)?.as_atom()
    }
}

/// Format a coordinate or angle the way KiCad writes them: at most four
/// decimals, no trailing zeros, and never `-0`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

/// Errors that can occur during parsing. Offsets are byte positions in the input.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedEof,
    UnexpectedChar { found: char, offset: usize },
    UnexpectedCloseParen { offset: usize },
    UnclosedList { opened_at: usize },
    UnterminatedString { opened_at: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "Unexpected end of input"),
            ParseError::UnexpectedChar { found, offset } => {
                write!(f, "Unexpected '{found}' at byte {offset}")
            }
            ParseError::UnexpectedCloseParen { offset } => {
                write!(f, "Unbalanced ')' at byte {offset}")
            }
            ParseError::UnclosedList { opened_at } => {
                write!(f, "List opened at byte {opened_at} is never closed")
            }
            ParseError::UnterminatedString { opened_at } => {
                write!(f, "String starting at byte {opened_at} is never terminated")
            }
        }
    }
}

impl std::error::Error for ParseError {}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.input.len()
    }

    fn read(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.read_list(),
            Some(')') => Err(ParseError::UnexpectedCloseParen { offset: self.pos }),
            Some('"') => self.read_string(),
            Some(_) => Ok(self.read_symbol()),
        }
    }

    fn read_list(&mut self) -> Result<Sexpr, ParseError> {
        let opened_at = self.pos;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::UnclosedList { opened_at }),
                Some(')') => {
                    self.bump();
                    return Ok(Sexpr::List(items));
                }
                Some(_) => items.push(self.read()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Sexpr, ParseError> {
        let opened_at = self.pos;
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { opened_at }),
                Some('"') => return Ok(Sexpr::String(text)),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString { opened_at }),
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                },
                Some(ch) => text.push(ch),
            }
        }
    }

    fn read_symbol(&mut self) -> Sexpr {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                break;
            }
            self.bump();
        }
        Sexpr::Symbol(self.input[start..self.pos].to_string())
    }
}

/// Parse exactly one S-expression. Trailing non-trivia input is an error.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("Parsing S-expression from {} bytes of input", input.len());
    let mut reader = Reader::new(input);
    let sexpr = reader.read()?;
    if !reader.at_end() {
        let offset = reader.pos;
        let found = reader.peek().unwrap_or(' ');
        return Err(ParseError::UnexpectedChar { found, offset });
    }
    Ok(sexpr)
}

/// Format an S-expression with two-space indentation. Short records such as
/// `(at 1 2 0)` or `(xy 1 2)` stay on one line.
pub fn format_sexpr(sexpr: &Sexpr, indent_level: usize) -> String {
    let mut out = String::new();
    write_sexpr(&mut out, sexpr, indent_level);
    out
}

fn write_sexpr(out: &mut String, sexpr: &Sexpr, level: usize) {
    match sexpr {
        Sexpr::Symbol(s) => out.push_str(s),
        Sexpr::String(s) => {
            out.push('"');
            out.push_str(&escape_string(s));
            out.push('"');
        }
        Sexpr::List(items) if is_inline(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_sexpr(out, item, level);
            }
            out.push(')');
        }
        Sexpr::List(items) => {
            out.push('(');
            let mut rest = items.iter().peekable();
            // Leading atoms stay on the opening line: `(label "VIN"`
            while let Some(item) = rest.next_if(|item| item.as_atom().is_some()) {
                if !out.ends_with('(') {
                    out.push(' ');
                }
                write_sexpr(out, item, level);
            }
            for item in rest {
                out.push('\n');
                out.push_str(&"  ".repeat(level + 1));
                write_sexpr(out, item, level + 1);
            }
            out.push('\n');
            out.push_str(&"  ".repeat(level));
            out.push(')');
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result
}

fn is_inline(items: &[Sexpr]) -> bool {
    if items.iter().all(|item| item.as_atom().is_some()) {
        return true;
    }
    // `(pts (xy ..) (xy ..))` and `(font (size ..))` read best on one line
    match items.first().and_then(Sexpr::as_atom) {
        Some("pts" | "font" | "stroke") => items
            .iter()
            .skip(1)
            .all(|item| item.as_list().is_some_and(|l| l.iter().all(|i| i.as_atom().is_some()))),
        _ => false,
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_sexpr(self, 0))
    }
}
