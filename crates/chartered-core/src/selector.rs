//! Minimal CSS selector engine
//!
//! Supports selector lists (`a, button, .clickable`) of compound selectors built
//! from an optional tag name, `#id`, `.class`, and attribute tests (`[attr]`,
//! `[attr="v"]`, `[attr^="v"]`). Combinators are rejected: every selector the
//! site uses targets elements by their own properties only.

use std::fmt;

use crate::{Error, Result};

/// Read access to the element properties a selector can test
pub trait ElementView {
    /// Lowercase tag name
    fn tag(&self) -> &str;
    /// Attribute value, if present
    fn attr(&self, name: &str) -> Option<&str>;
    /// Whether the class list contains `class`
    fn has_class(&self, class: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Id(String),
    Class(String),
    Attr { name: String, op: AttrOp },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    parts: Vec<Simple>,
}

impl Compound {
    fn matches(&self, el: &dyn ElementView) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.parts.iter().all(|part| match part {
            Simple::Id(id) => el.attr("id") == Some(id.as_str()),
            Simple::Class(class) => el.has_class(class),
            Simple::Attr { name, op } => match (el.attr(name), op) {
                (None, _) => false,
                (Some(_), AttrOp::Exists) => true,
                (Some(value), AttrOp::Equals(expected)) => value == expected,
                (Some(value), AttrOp::Prefix(prefix)) => value.starts_with(prefix.as_str()),
            },
        })
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Selector matching a single element id
    pub fn id(id: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                tag: None,
                parts: vec![Simple::Id(id.to_string())],
            }],
        }
    }

    /// Whether any alternative of the list matches the element
    pub fn matches(&self, el: &dyn ElementView) -> bool {
        self.alternatives.iter().any(|c| c.matches(el))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &compound.tag {
                Some(tag) => f.write_str(tag)?,
                None if compound.parts.is_empty() => f.write_str("*")?,
                None => {}
            }
            for part in &compound.parts {
                match part {
                    Simple::Id(id) => write!(f, "#{}", id)?,
                    Simple::Class(class) => write!(f, ".{}", class)?,
                    Simple::Attr { name, op } => match op {
                        AttrOp::Exists => write!(f, "[{}]", name)?,
                        AttrOp::Equals(v) => write!(f, "[{}=\"{}\"]", name, v)?,
                        AttrOp::Prefix(v) => write!(f, "[{}^=\"{}\"]", name, v)?,
                    },
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::selector(self.input, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<Selector> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.compound()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(c) => {
                    return Err(self.error(format!("unsupported combinator near `{}`", c)));
                }
            }
        }
        Ok(Selector { alternatives })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                universal = true;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Id(self.ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Class(self.ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.parts.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if !universal && compound.tag.is_none() && compound.parts.is_empty() {
            return Err(self.error("empty selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Result<Simple> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => AttrOp::Exists,
            Some('=') => {
                self.pos += 1;
                AttrOp::Equals(self.value()?)
            }
            Some('^') => {
                self.pos += 1;
                if self.peek() != Some('=') {
                    return Err(self.error("expected `=` after `^`"));
                }
                self.pos += 1;
                AttrOp::Prefix(self.value()?)
            }
            _ => return Err(self.error("unsupported attribute operator")),
        };
        self.skip_ws();
        if self.peek() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        self.pos += 1;
        Ok(Simple::Attr { name, op })
    }

    fn value(&mut self) -> Result<String> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(value)
            }
            _ => self.ident(),
        }
    }
}
