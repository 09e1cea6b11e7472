//! Version constraint grammar: `*` or comma-separated PEP 440 clauses.

use crate::version::{Version, VersionError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("version constraint must not be empty")]
    Empty,
    #[error("empty clause in constraint '{0}'")]
    EmptyClause(String),
    #[error("'*' cannot be combined with other clauses in '{0}'")]
    MixedWildcard(String),
    #[error("missing comparison operator in '{0}' (did you mean '=={0}'?)")]
    MissingOperator(String),
    #[error("unknown comparison operator in '{0}'")]
    UnknownOperator(String),
    #[error("missing version after operator in '{0}'")]
    MissingVersion(String),
    #[error("invalid version in clause '{clause}': {source}")]
    InvalidVersion {
        clause: String,
        #[source]
        source: VersionError,
    },
    #[error("wildcard versions are only allowed with '==' and '!=': '{0}'")]
    WildcardNotAllowed(String),
    #[error("wildcard prefix must be a plain release in '{0}'")]
    InvalidWildcard(String),
    #[error("'~=' requires at least two release segments: '{0}'")]
    CompatibleTooShort(String),
    #[error("local version labels are only allowed with '==' and '!=': '{0}'")]
    LocalNotAllowed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Compatible,
    Arbitrary,
}

impl Operator {
    // Longest spellings first so `===` wins over `==` and `<=` over `<`.
    const SPELLINGS: [(&'static str, Operator); 8] = [
        ("===", Operator::Arbitrary),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("~=", Operator::Compatible),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
        }
    }

    fn strip(clause: &str) -> Option<(Self, &str)> {
        Self::SPELLINGS
            .iter()
            .find_map(|(spelling, op)| clause.strip_prefix(spelling).map(|rest| (*op, rest)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a clause compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Exact(Version),
    /// `==1.2.*` style prefix; holds the release before `.*`.
    Prefix(Version),
    /// Operand of `===`, compared as a string.
    Arbitrary(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Prefix(v) => write!(f, "{v}.*"),
            Self::Arbitrary(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub operator: Operator,
    pub target: Target,
}

impl Clause {
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        let text = text.trim();
        let Some((operator, rest)) = Operator::strip(text) else {
            return Err(if text.starts_with(|c: char| c.is_ascii_digit()) {
                ConstraintError::MissingOperator(text.to_owned())
            } else {
                ConstraintError::UnknownOperator(text.to_owned())
            });
        };
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(ConstraintError::MissingVersion(text.to_owned()));
        }
        if operator == Operator::Arbitrary {
            return Ok(Self {
                operator,
                target: Target::Arbitrary(rest.to_owned()),
            });
        }

        let parse_version = |s: &str| {
            Version::parse(s).map_err(|source| ConstraintError::InvalidVersion {
                clause: text.to_owned(),
                source,
            })
        };

        if let Some(prefix) = rest.strip_suffix(".*") {
            if !matches!(operator, Operator::Equal | Operator::NotEqual) {
                return Err(ConstraintError::WildcardNotAllowed(text.to_owned()));
            }
            let version = parse_version(prefix)?;
            if version != version.base() || !version.local.is_empty() || version.is_postrelease()
            {
                return Err(ConstraintError::InvalidWildcard(text.to_owned()));
            }
            return Ok(Self {
                operator,
                target: Target::Prefix(version),
            });
        }
        if rest.contains('*') {
            return Err(ConstraintError::WildcardNotAllowed(text.to_owned()));
        }

        let version = parse_version(rest)?;
        if operator == Operator::Compatible && version.release.len() < 2 {
            return Err(ConstraintError::CompatibleTooShort(text.to_owned()));
        }
        if !version.local.is_empty() && !matches!(operator, Operator::Equal | Operator::NotEqual)
        {
            return Err(ConstraintError::LocalNotAllowed(text.to_owned()));
        }
        Ok(Self {
            operator,
            target: Target::Exact(version),
        })
    }

    /// The operand as written after normalization, without the operator.
    pub fn version_text(&self) -> String {
        self.target.to_string()
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        match (&self.target, self.operator) {
            (Target::Arbitrary(s), _) => candidate.to_string().eq_ignore_ascii_case(s),
            (Target::Prefix(prefix), Operator::Equal) => prefix_matches(candidate, prefix),
            (Target::Prefix(prefix), Operator::NotEqual) => !prefix_matches(candidate, prefix),
            (Target::Exact(spec), Operator::Equal) => exact_matches(candidate, spec),
            (Target::Exact(spec), Operator::NotEqual) => !exact_matches(candidate, spec),
            (Target::Exact(spec), Operator::LessEqual) => candidate.public() <= *spec,
            (Target::Exact(spec), Operator::GreaterEqual) => candidate.public() >= *spec,
            (Target::Exact(spec), Operator::Less) => {
                candidate < spec
                    && !(!spec.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base() == spec.base())
            }
            (Target::Exact(spec), Operator::Greater) => {
                let same_base = candidate.base() == spec.base();
                candidate > spec
                    && !(!spec.is_postrelease() && candidate.is_postrelease() && same_base)
                    && !(!candidate.local.is_empty() && same_base)
            }
            (Target::Exact(spec), Operator::Compatible) => {
                let mut prefix = spec.base();
                prefix.release.pop();
                candidate.public() >= *spec && prefix_matches(candidate, &prefix)
            }
            _ => false,
        }
    }
}

fn exact_matches(candidate: &Version, spec: &Version) -> bool {
    if spec.local.is_empty() {
        candidate.public() == *spec
    } else {
        candidate == spec
    }
}

fn prefix_matches(candidate: &Version, prefix: &Version) -> bool {
    candidate.epoch == prefix.epoch
        && prefix
            .release
            .iter()
            .enumerate()
            .all(|(i, seg)| candidate.release.get(i).copied().unwrap_or(0) == *seg)
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.target)
    }
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `*`: any release.
    Any,
    /// All clauses must hold.
    Clauses(Vec<Clause>),
}

impl VersionConstraint {
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::Empty);
        }
        if trimmed == "*" {
            return Ok(Self::Any);
        }
        let mut clauses = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(ConstraintError::EmptyClause(trimmed.to_owned()));
            }
            if part == "*" {
                return Err(ConstraintError::MixedWildcard(trimmed.to_owned()));
            }
            clauses.push(Clause::parse(part)?);
        }
        Ok(Self::Clauses(clauses))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn clauses(&self) -> &[Clause] {
        match self {
            Self::Any => &[],
            Self::Clauses(c) => c,
        }
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.clauses().iter().all(|c| c.matches(candidate))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Clauses(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{clause}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
