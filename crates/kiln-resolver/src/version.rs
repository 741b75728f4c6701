//! Semantic version parsing, identifiers, and precedence ordering.
//!
//! Versions follow `MAJOR.MINOR.PATCH[-PRE][+BUILD]`:
//! - Core components are decimal `u64`s with no leading zeros
//! - Pre-release identifiers are numeric or alphanumeric and affect ordering
//! - A version without pre-release identifiers sorts after one with them
//! - Build metadata is kept for display but ignored by `Eq`, `Ord` and `Hash`

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One dot-separated component of a pre-release or build-metadata string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::AlphaNumeric(_)) => Ordering::Less,
            (Identifier::AlphaNumeric(_), Identifier::Numeric(_)) => Ordering::Greater,
            (Identifier::AlphaNumeric(a), Identifier::AlphaNumeric(b)) => {
                a.as_bytes().cmp(b.as_bytes())
            }
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::AlphaNumeric(s) => f.write_str(s),
        }
    }
}

/// A parsed semantic version.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<Identifier>,
    pub build: Vec<Identifier>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: Vec::new(),
        }
    }

    /// Parse a version string, reporting the failing component on error.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let fail = |component, reason| VersionParseError {
            input: input.to_string(),
            component,
            reason,
        };

        let (rest, build) = match input.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (input, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let mut parts = core.split('.');
        let major = parse_numeric(parts.next()).map_err(|r| fail(Component::Major, r))?;
        let minor = parse_numeric(parts.next()).map_err(|r| fail(Component::Minor, r))?;
        let patch = parse_numeric(parts.next()).map_err(|r| fail(Component::Patch, r))?;
        let trailing: Vec<&str> = parts.collect();
        if !trailing.is_empty() {
            return Err(fail(
                Component::Patch,
                Reason::UnexpectedTrailing(format!(".{}", trailing.join("."))),
            ));
        }

        let pre = match pre {
            Some(text) => parse_identifiers(text, Component::PreRelease)
                .map_err(|r| fail(Component::PreRelease, r))?,
            None => Vec::new(),
        };
        let build = match build {
            Some(text) => parse_identifiers(text, Component::Build)
                .map_err(|r| fail(Component::Build, r))?,
            None => Vec::new(),
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// The same version with pre-release and build metadata stripped.
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch)
    }

    /// The same version without build metadata, as a constraint may spell it.
    pub fn without_build(&self) -> Self {
        Self {
            build: Vec::new(),
            ..self.clone()
        }
    }
}

/// Compare two pre-release sequences. An empty sequence (a release) is greatest.
pub(crate) fn cmp_pre(a: &[Identifier], b: &[Identifier]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // Lexicographic slice order: first differing identifier decides,
        // otherwise the shorter sequence is less.
        (false, false) => a.cmp(b),
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| cmp_pre(&self.pre, &other.pre))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            f.write_str("-")?;
            write_identifiers(f, &self.pre)?;
        }
        if !self.build.is_empty() {
            f.write_str("+")?;
            write_identifiers(f, &self.build)?;
        }
        Ok(())
    }
}

pub(crate) fn write_identifiers(f: &mut fmt::Formatter<'_>, ids: &[Identifier]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            f.write_str(".")?;
        }
        write!(f, "{id}")?;
    }
    Ok(())
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The grammar component a version parse failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Major,
    Minor,
    Patch,
    PreRelease,
    Build,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Major => "major version",
            Component::Minor => "minor version",
            Component::Patch => "patch version",
            Component::PreRelease => "pre-release",
            Component::Build => "build metadata",
        })
    }
}

/// Why a version component was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Missing,
    LeadingZero,
    EmptyIdentifier,
    OutOfRange,
    InvalidCharacter(char),
    UnexpectedTrailing(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Missing => f.write_str("is missing"),
            Reason::LeadingZero => f.write_str("has a leading zero"),
            Reason::EmptyIdentifier => f.write_str("contains an empty identifier"),
            Reason::OutOfRange => f.write_str("does not fit in 64 bits"),
            Reason::InvalidCharacter(c) => write!(f, "contains invalid character `{c}`"),
            Reason::UnexpectedTrailing(rest) => {
                write!(f, "is followed by unexpected input `{rest}`")
            }
        }
    }
}

/// A malformed version string.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("invalid version `{input}`: {component} {reason}")]
#[diagnostic(
    code(kiln::version::parse),
    help("versions look like MAJOR.MINOR.PATCH[-PRE][+BUILD], e.g. 1.4.0-rc.1")
)]
pub struct VersionParseError {
    pub input: String,
    pub component: Component,
    pub reason: Reason,
}

pub(crate) fn parse_numeric(part: Option<&str>) -> Result<u64, Reason> {
    let part = match part {
        Some(p) if !p.is_empty() => p,
        _ => return Err(Reason::Missing),
    };
    if let Some(c) = part.chars().find(|c| !c.is_ascii_digit()) {
        return Err(Reason::InvalidCharacter(c));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(Reason::LeadingZero);
    }
    part.parse::<u64>().map_err(|_| Reason::OutOfRange)
}

pub(crate) fn parse_identifiers(text: &str, component: Component) -> Result<Vec<Identifier>, Reason> {
    text.split('.')
        .map(|token| parse_identifier(token, component))
        .collect()
}

fn parse_identifier(token: &str, component: Component) -> Result<Identifier, Reason> {
    if token.is_empty() {
        return Err(Reason::EmptyIdentifier);
    }
    if let Some(c) = token
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
    {
        return Err(Reason::InvalidCharacter(c));
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Identifier::AlphaNumeric(token.to_string()));
    }

    let leading_zero = token.len() > 1 && token.starts_with('0');
    match component {
        Component::PreRelease => {
            if leading_zero {
                return Err(Reason::LeadingZero);
            }
            token
                .parse::<u64>()
                .map(Identifier::Numeric)
                .map_err(|_| Reason::OutOfRange)
        }
        // Build metadata may carry leading zeros or huge digit runs; keep those verbatim.
        _ => match token.parse::<u64>() {
            Ok(n) if !leading_zero => Ok(Identifier::Numeric(n)),
            _ => Ok(Identifier::AlphaNumeric(token.to_string())),
        },
    }
}
