//! PEP 440 version numbers: parsing, normalized display, and ordering.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version must not be empty")]
    Empty,
    #[error("invalid version '{input}': {reason}")]
    Invalid { input: String, reason: &'static str },
}

/// Pre-release phase. Variant order is the PEP 440 sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// One dot-separated segment of a local version label (`+ubuntu.1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSegment {
    Number(u64),
    Text(String),
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Numeric segments always sort above alphanumeric ones.
            (Self::Number(_), Self::Text(_)) => Ordering::Greater,
            (Self::Text(_), Self::Number(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A parsed PEP 440 version.
///
/// Equality and ordering follow PEP 440, so `1.0` and `1.0.0` compare equal
/// even though they display differently.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Vec<LocalSegment>,
}

impl Version {
    /// Parse a version string, accepting the alternative spellings PEP 440
    /// allows (`1.0alpha1`, `1.0-1`, `v1.0`, `1.0.DEV2`).
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }
        let lower = trimmed.to_ascii_lowercase();
        let invalid = |reason| VersionError::Invalid {
            input: trimmed.to_owned(),
            reason,
        };

        let mut c = Cursor::new(&lower);
        c.eat("v");

        let first = c.number().ok_or_else(|| invalid("expected a release number"))?;
        let (epoch, mut release) = if c.eat("!") {
            let n = c
                .number()
                .ok_or_else(|| invalid("expected a release number after the epoch"))?;
            (first, vec![n])
        } else {
            (0, vec![first])
        };
        while c.peek() == Some(b'.') && c.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            c.advance(1);
            let n = c.number().ok_or_else(|| invalid("release segment too large"))?;
            release.push(n);
        }

        let pre = c.pre_release();
        let post = c.post_release();
        let dev = c.dev_release();
        let local = if c.eat("+") {
            c.local_label().ok_or_else(|| invalid("malformed local version label"))?
        } else {
            Vec::new()
        };

        if !c.at_end() {
            return Err(invalid("unexpected trailing characters"));
        }

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// The version without its local label.
    pub fn public(&self) -> Self {
        Self {
            local: Vec::new(),
            ..self.clone()
        }
    }

    /// Epoch and release only, with every suffix dropped.
    pub fn base(&self) -> Self {
        Self {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    fn pre_key(&self) -> Bound<(PreKind, u64)> {
        match (self.pre, self.post, self.dev) {
            // 1.0.dev0 sorts before 1.0a0
            (None, None, Some(_)) => Bound::NegInf,
            (Some(pre), _, _) => Bound::Value(pre),
            _ => Bound::PosInf,
        }
    }

    fn post_key(&self) -> Bound<u64> {
        self.post.map_or(Bound::NegInf, Bound::Value)
    }

    fn dev_key(&self) -> Bound<u64> {
        self.dev.map_or(Bound::PosInf, Bound::Value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    NegInf,
    Value(T),
    PosInf,
}

fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{n}", kind.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            s: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.s.get(self.pos + offset).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.s.len());
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn eat(&mut self, lit: &str) -> bool {
        if self.s[self.pos..].starts_with(lit.as_bytes()) {
            self.advance(lit.len());
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, lits: &[&'static str]) -> Option<&'static str> {
        lits.iter().copied().find(|lit| self.eat(lit))
    }

    fn eat_separator(&mut self) -> bool {
        if matches!(self.peek(), Some(b'-' | b'_' | b'.')) {
            self.advance(1);
            true
        } else {
            false
        }
    }

    /// Consume a run of digits. Leaves the cursor untouched on overflow.
    fn number(&mut self) -> Option<u64> {
        let start = self.pos;
        let mut end = start;
        while self.s.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end == start {
            return None;
        }
        let digits = std::str::from_utf8(&self.s[start..end]).ok()?;
        let n = digits.parse().ok()?;
        self.pos = end;
        Some(n)
    }

    /// An optional number, possibly preceded by a separator (`a.1`, `post-2`).
    fn optional_number(&mut self) -> Option<u64> {
        let save = self.pos;
        self.eat_separator();
        let n = self.number();
        if n.is_none() {
            self.pos = save;
        }
        n
    }

    fn pre_release(&mut self) -> Option<(PreKind, u64)> {
        let save = self.pos;
        self.eat_separator();
        let kind = match self.eat_any(&["alpha", "a", "beta", "b", "rc", "c", "preview", "pre"]) {
            Some("alpha" | "a") => PreKind::Alpha,
            Some("beta" | "b") => PreKind::Beta,
            Some(_) => PreKind::Rc,
            None => {
                self.pos = save;
                return None;
            }
        };
        Some((kind, self.optional_number().unwrap_or(0)))
    }

    fn post_release(&mut self) -> Option<u64> {
        // Implicit form: 1.0-1
        if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.advance(1);
            return self.number();
        }
        let save = self.pos;
        self.eat_separator();
        if self.eat_any(&["post", "rev", "r"]).is_some() {
            Some(self.optional_number().unwrap_or(0))
        } else {
            self.pos = save;
            None
        }
    }

    fn dev_release(&mut self) -> Option<u64> {
        let save = self.pos;
        self.eat_separator();
        if self.eat("dev") {
            Some(self.optional_number().unwrap_or(0))
        } else {
            self.pos = save;
            None
        }
    }

    fn local_label(&mut self) -> Option<Vec<LocalSegment>> {
        let rest = std::str::from_utf8(&self.s[self.pos..]).ok()?;
        let mut segments = Vec::new();
        for part in rest.split(['.', '-', '_']) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return None;
            }
            segments.push(match part.parse() {
                Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => LocalSegment::Number(n),
                _ => LocalSegment::Text(part.to_owned()),
            });
        }
        self.pos = self.s.len();
        Some(segments)
    }
}
