//! Version constraints: comparator parsing and interval matching.
//!
//! A [`Constraint`] is an OR (`||`) of comparator sets; a comparator set is an
//! AND of comparators separated by whitespace, `,` or the keyword `and`.
//!
//! Supported comparators: `=1.2.3`, `>1.2`, `>=1`, `<2.0.0`, `<=1.4`, `^1.2.3`,
//! `~1.2`, wildcards (`*`, `1.*`, `1.2.x`) and hyphen ranges (`1.2 - 2.0`).
//! A bare version such as `1.2.3` means `^1.2.3`.
//!
//! Pre-release versions only match a non-empty comparator set when one of its
//! comparators names a pre-release of the same `major.minor.patch`, so
//! `^1.0.0` never selects `2.0.0-alpha` or `1.5.0-rc.1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

use crate::version::{
    cmp_pre, parse_identifiers, parse_numeric, write_identifiers, Component, Identifier, Reason,
    Version,
};

/// Comparison operator of a single comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exact,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Caret,
    Tilde,
    Wildcard,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Exact => "=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Caret => "^",
            Op::Tilde => "~",
            Op::Wildcard => "",
        }
    }
}

/// One `(operator, version)` clause. `minor` and `patch` are `None` when the
/// component was omitted or written as a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre: Vec<Identifier>,
}

impl Comparator {
    /// A comparator matching exactly `version` (build metadata is ignored).
    pub fn exact(version: &Version) -> Self {
        Self {
            op: Op::Exact,
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre: version.pre.clone(),
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Exact | Op::Wildcard => self.matches_exact(version),
            Op::Greater => self.matches_greater(version),
            Op::GreaterEq => self.matches_exact(version) || self.matches_greater(version),
            Op::Less => self.matches_less(version),
            Op::LessEq => self.matches_exact(version) || self.matches_less(version),
            Op::Tilde => self.matches_tilde(version),
            Op::Caret => self.matches_caret(version),
        }
    }

    fn matches_exact(&self, v: &Version) -> bool {
        v.major == self.major
            && self.minor.map_or(true, |m| v.minor == m)
            && self.patch.map_or(true, |p| v.patch == p)
            && v.pre == self.pre
    }

    fn matches_greater(&self, v: &Version) -> bool {
        if v.major != self.major {
            return v.major > self.major;
        }
        match self.minor {
            None => return false,
            Some(minor) if v.minor != minor => return v.minor > minor,
            Some(_) => {}
        }
        match self.patch {
            None => return false,
            Some(patch) if v.patch != patch => return v.patch > patch,
            Some(_) => {}
        }
        cmp_pre(&v.pre, &self.pre) == Ordering::Greater
    }

    fn matches_less(&self, v: &Version) -> bool {
        if v.major != self.major {
            return v.major < self.major;
        }
        match self.minor {
            None => return false,
            Some(minor) if v.minor != minor => return v.minor < minor,
            Some(_) => {}
        }
        match self.patch {
            None => return false,
            Some(patch) if v.patch != patch => return v.patch < patch,
            Some(_) => {}
        }
        cmp_pre(&v.pre, &self.pre) == Ordering::Less
    }

    fn matches_tilde(&self, v: &Version) -> bool {
        if v.major != self.major {
            return false;
        }
        if self.minor.is_some_and(|minor| v.minor != minor) {
            return false;
        }
        if let Some(patch) = self.patch {
            if v.patch != patch {
                return v.patch > patch;
            }
        }
        cmp_pre(&v.pre, &self.pre) != Ordering::Less
    }

    fn matches_caret(&self, v: &Version) -> bool {
        if v.major != self.major {
            return false;
        }
        let Some(minor) = self.minor else {
            return true;
        };
        let Some(patch) = self.patch else {
            return if self.major > 0 {
                v.minor >= minor
            } else {
                v.minor == minor
            };
        };

        if self.major > 0 {
            if v.minor != minor {
                return v.minor > minor;
            }
            if v.patch != patch {
                return v.patch > patch;
            }
        } else if minor > 0 {
            if v.minor != minor {
                return false;
            }
            if v.patch != patch {
                return v.patch > patch;
            }
        } else if v.minor != minor || v.patch != patch {
            return false;
        }
        cmp_pre(&v.pre, &self.pre) != Ordering::Less
    }

    /// Whether this comparator opts a pre-release of `v`'s release line in.
    fn allows_prerelease_of(&self, v: &Version) -> bool {
        !self.pre.is_empty()
            && self.major == v.major
            && self.minor == Some(v.minor)
            && self.patch == Some(v.patch)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op.as_str())?;
        write!(f, "{}", self.major)?;
        match (self.minor, self.op) {
            (Some(minor), _) => write!(f, ".{minor}")?,
            (None, Op::Wildcard) => return f.write_str(".*"),
            (None, _) => return Ok(()),
        }
        match (self.patch, self.op) {
            (Some(patch), _) => write!(f, ".{patch}")?,
            (None, Op::Wildcard) => return f.write_str(".*"),
            (None, _) => return Ok(()),
        }
        if !self.pre.is_empty() {
            f.write_str("-")?;
            write_identifiers(f, &self.pre)?;
        }
        Ok(())
    }
}

/// A conjunction of comparators. An empty set matches every version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComparatorSet {
    pub comparators: Vec<Comparator>,
}

impl ComparatorSet {
    pub fn matches(&self, version: &Version) -> bool {
        if self.comparators.is_empty() {
            return true;
        }
        if !self.comparators.iter().all(|c| c.matches(version)) {
            return false;
        }
        !version.is_prerelease()
            || self
                .comparators
                .iter()
                .any(|c| c.allows_prerelease_of(version))
    }
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comparators.is_empty() {
            return f.write_str("*");
        }
        for (i, c) in self.comparators.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A version predicate: the OR of one or more comparator sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub sets: Vec<ComparatorSet>,
}

impl Constraint {
    /// Parse a constraint expression such as `>=1.2, <2 || ^3.0.0-rc.1`.
    pub fn parse(input: &str) -> Result<Self, ConstraintParseError> {
        if input.trim().is_empty() {
            return Err(ConstraintParseError::new(input, input, ConstraintErrorKind::Empty));
        }
        let sets = input
            .split("||")
            .map(|alternative| parse_set(input, alternative))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sets })
    }

    /// Matches every version.
    pub fn any() -> Self {
        Self {
            sets: vec![ComparatorSet::default()],
        }
    }

    /// Matches exactly `version`.
    pub fn exact(version: &Version) -> Self {
        Self {
            sets: vec![ComparatorSet {
                comparators: vec![Comparator::exact(version)],
            }],
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set.matches(version))
    }

    /// The highest version among `candidates` satisfying this constraint.
    pub fn best_match<'a, I>(&self, candidates: I) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        candidates.into_iter().filter(|v| self.matches(v)).max()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{set}")?;
        }
        Ok(())
    }
}

impl FromStr for Constraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::parse(s)
    }
}

/// What was wrong with a constraint token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintErrorKind {
    Empty,
    EmptyAlternative,
    MissingVersion,
    UnexpectedOperator,
    BuildMetadata,
    WildcardWithOperator,
    MisplacedWildcard,
    PartialPreRelease,
    DanglingHyphen,
    InvalidComponent { component: Component, reason: Reason },
}

impl fmt::Display for ConstraintErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("is empty"),
            Self::EmptyAlternative => f.write_str("has an empty alternative around `||`"),
            Self::MissingVersion => f.write_str("has an operator without a version"),
            Self::UnexpectedOperator => f.write_str("has an unexpected operator"),
            Self::BuildMetadata => f.write_str("may not carry build metadata"),
            Self::WildcardWithOperator => {
                f.write_str("combines an operator with a wildcard major version")
            }
            Self::MisplacedWildcard => f.write_str("has a number after a wildcard"),
            Self::PartialPreRelease => {
                f.write_str("has a pre-release on a partial version")
            }
            Self::DanglingHyphen => f.write_str("is an incomplete hyphen range"),
            Self::InvalidComponent { component, reason } => write!(f, "{component} {reason}"),
        }
    }
}

/// A malformed constraint expression, pointing at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("invalid constraint `{input}`: `{token}` {kind}")]
#[diagnostic(
    code(kiln::constraint::parse),
    help("use comparators like `^1.2`, `~1.2.3`, `>=1.0, <2.0` or `1.*`, joined with `||`")
)]
pub struct ConstraintParseError {
    pub input: String,
    pub token: String,
    pub kind: ConstraintErrorKind,
}

impl ConstraintParseError {
    fn new(input: &str, token: &str, kind: ConstraintErrorKind) -> Self {
        Self {
            input: input.to_string(),
            token: token.trim().to_string(),
            kind,
        }
    }
}

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "^", "~"];

fn parse_set(input: &str, text: &str) -> Result<ComparatorSet, ConstraintParseError> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty() && *t != "and")
        .collect();
    if tokens.is_empty() {
        return Err(ConstraintParseError::new(
            input,
            "||",
            ConstraintErrorKind::EmptyAlternative,
        ));
    }

    let mut comparators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let mut token = tokens[i].to_string();
        if token == "-" {
            return Err(ConstraintParseError::new(
                input,
                "-",
                ConstraintErrorKind::DanglingHyphen,
            ));
        }
        // `>= 1.2` is written with the operator detached from its version.
        if OPERATORS.contains(&tokens[i]) {
            let Some(next) = tokens.get(i + 1) else {
                return Err(ConstraintParseError::new(
                    input,
                    tokens[i],
                    ConstraintErrorKind::MissingVersion,
                ));
            };
            token.push_str(next);
            i += 1;
        }

        if tokens.get(i + 1) == Some(&"-") {
            let Some(upper) = tokens.get(i + 2) else {
                return Err(ConstraintParseError::new(
                    input,
                    &format!("{token} -"),
                    ConstraintErrorKind::DanglingHyphen,
                ));
            };
            comparators.extend(parse_hyphen_range(input, &token, upper)?);
            i += 3;
            continue;
        }

        if let Some(comparator) = parse_comparator(input, &token)? {
            comparators.push(comparator);
        }
        i += 1;
    }

    Ok(ComparatorSet { comparators })
}

fn parse_hyphen_range(
    input: &str,
    lower: &str,
    upper: &str,
) -> Result<Vec<Comparator>, ConstraintParseError> {
    let mut out = Vec::with_capacity(2);
    for (token, op) in [(lower, Op::GreaterEq), (upper, Op::LessEq)] {
        if token.starts_with(|c: char| OPERATORS.iter().any(|o| o.starts_with(c))) {
            return Err(ConstraintParseError::new(
                input,
                token,
                ConstraintErrorKind::UnexpectedOperator,
            ));
        }
        // A wildcard bound leaves that side of the range open.
        if let Some(mut comparator) = parse_comparator(input, token)? {
            comparator.op = op;
            out.push(comparator);
        }
    }
    Ok(out)
}

fn split_operator(token: &str) -> (Option<Op>, &str) {
    let table = [
        (">=", Op::GreaterEq),
        ("<=", Op::LessEq),
        (">", Op::Greater),
        ("<", Op::Less),
        ("=", Op::Exact),
        ("^", Op::Caret),
        ("~", Op::Tilde),
    ];
    for (prefix, op) in table {
        if let Some(rest) = token.strip_prefix(prefix) {
            return (Some(op), rest);
        }
    }
    (None, token)
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}

fn parse_comparator(input: &str, token: &str) -> Result<Option<Comparator>, ConstraintParseError> {
    let err = |kind| ConstraintParseError::new(input, token, kind);

    let (op, rest) = split_operator(token);
    if rest.is_empty() {
        return Err(err(ConstraintErrorKind::MissingVersion));
    }
    if rest.starts_with(['>', '<', '=', '^', '~']) {
        return Err(err(ConstraintErrorKind::UnexpectedOperator));
    }
    if rest.contains('+') {
        return Err(err(ConstraintErrorKind::BuildMetadata));
    }

    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let components = [Component::Major, Component::Minor, Component::Patch];
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > components.len() {
        return Err(err(ConstraintErrorKind::InvalidComponent {
            component: Component::Patch,
            reason: Reason::UnexpectedTrailing(format!(".{}", parts[3..].join("."))),
        }));
    }

    let mut numbers: [Option<u64>; 3] = [None; 3];
    let mut wildcard = false;
    for (idx, part) in parts.iter().enumerate() {
        if is_wildcard(part) {
            wildcard = true;
            continue;
        }
        if wildcard {
            return Err(err(ConstraintErrorKind::MisplacedWildcard));
        }
        let n = parse_numeric(Some(part)).map_err(|reason| {
            err(ConstraintErrorKind::InvalidComponent {
                component: components[idx],
                reason,
            })
        })?;
        numbers[idx] = Some(n);
    }

    let pre = match pre {
        Some(_) if numbers[2].is_none() => {
            return Err(err(ConstraintErrorKind::PartialPreRelease));
        }
        Some(text) => parse_identifiers(text, Component::PreRelease).map_err(|reason| {
            err(ConstraintErrorKind::InvalidComponent {
                component: Component::PreRelease,
                reason,
            })
        })?,
        None => Vec::new(),
    };

    let [major, minor, patch] = numbers;
    let Some(major) = major else {
        return match op {
            None => Ok(None),
            Some(_) => Err(err(ConstraintErrorKind::WildcardWithOperator)),
        };
    };
    let op = match op {
        Some(op) => op,
        None if wildcard => Op::Wildcard,
        None => Op::Caret,
    };

    Ok(Some(Comparator {
        op,
        major,
        minor,
        patch,
        pre,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn assert_matches(constraint: &str, yes: &[&str], no: &[&str]) {
        let parsed = c(constraint);
        for s in yes {
            assert!(parsed.matches(&v(s)), "`{constraint}` should match {s}");
        }
        for s in no {
            assert!(!parsed.matches(&v(s)), "`{constraint}` should reject {s}");
        }
    }

    #[test]
    fn exact() {
        assert_matches("=1.2.3", &["1.2.3", "1.2.3+build"], &["1.2.4", "1.2.3-rc.1"]);
        assert_matches("=1.2", &["1.2.0", "1.2.99"], &["1.3.0", "1.1.9"]);
    }

    #[test]
    fn ordering_operators() {
        assert_matches(">1.2.3", &["1.2.4", "2.0.0"], &["1.2.3", "1.0.0"]);
        assert_matches(">=1.2.3", &["1.2.3", "9.0.0"], &["1.2.2"]);
        assert_matches("<1.2.3", &["1.2.2", "0.1.0"], &["1.2.3", "1.3.0"]);
        assert_matches("<=1.2.3", &["1.2.3", "1.0.0"], &["1.2.4"]);
        assert_matches(">1.2", &["1.3.0"], &["1.2.9"]);
        assert_matches("<=1.2", &["1.2.9"], &["1.3.0"]);
    }

    #[test]
    fn caret() {
        assert_matches("^1.2.3", &["1.2.3", "1.9.0", "1.2.10"], &["2.0.0", "1.2.2"]);
        assert_matches("^0.2.3", &["0.2.3", "0.2.9"], &["0.3.0", "0.2.2"]);
        assert_matches("^0.0.3", &["0.0.3"], &["0.0.4", "0.0.2"]);
        assert_matches("^1.2", &["1.2.0", "1.7.1"], &["1.1.9", "2.0.0"]);
        assert_matches("^0.2", &["0.2.0", "0.2.8"], &["0.3.0"]);
        assert_matches("^1", &["1.0.0", "1.99.0"], &["2.0.0", "0.9.0"]);
    }

    #[test]
    fn bare_version_is_caret() {
        assert_eq!(c("1.2.3"), c("^1.2.3"));
        assert_matches("1.2.3", &["1.5.0"], &["2.0.0"]);
    }

    #[test]
    fn tilde() {
        assert_matches("~1.2.3", &["1.2.3", "1.2.9"], &["1.3.0", "1.2.2"]);
        assert_matches("~1.2", &["1.2.0", "1.2.7"], &["1.3.0"]);
        assert_matches("~1", &["1.0.0", "1.9.9"], &["2.0.0"]);
    }

    #[test]
    fn wildcards() {
        assert_matches("*", &["0.0.1", "99.0.0", "1.0.0-alpha"], &[]);
        assert_matches("1.*", &["1.0.0", "1.8.2"], &["2.0.0", "0.9.0"]);
        assert_matches("1.2.x", &["1.2.0", "1.2.5"], &["1.3.0"]);
        assert_matches("1.X.X", &["1.4.4"], &["2.0.0"]);
    }

    #[test]
    fn and_sets() {
        assert_matches(">=1.2, <1.5", &["1.2.0", "1.4.9"], &["1.5.0", "1.1.0"]);
        assert_matches(">= 1.2 < 1.5", &["1.3.0"], &["1.5.0"]);
        assert_matches(">=1.2.3 and <2.0.0", &["1.9.0"], &["2.0.0"]);
    }

    #[test]
    fn or_sets() {
        assert_matches("^1.2 || ^3.0", &["1.4.0", "3.2.0"], &["2.0.0", "4.0.0"]);
        assert_matches("=1.0.0 || >=2.0.0 <2.1.0", &["1.0.0", "2.0.5"], &["1.0.1", "2.1.0"]);
    }

    #[test]
    fn hyphen_range() {
        assert_matches("1.2.3 - 2.3.4", &["1.2.3", "2.3.4"], &["1.2.2", "2.3.5"]);
        assert_matches("1.2 - 2.3", &["1.2.0", "2.3.9"], &["2.4.0"]);
        assert_matches("1.2.0 - *", &["7.0.0"], &["1.1.0"]);
    }

    #[test]
    fn prerelease_gating() {
        assert_matches("^1.0.0", &["1.5.0"], &["2.0.0-alpha", "1.5.0-rc.1"]);
        assert_matches(">=1.0.0-beta", &["1.0.0-beta", "1.0.0-rc.1", "1.0.0", "1.2.0"], &[
            "1.2.0-beta",
            "1.0.0-alpha",
        ]);
        assert_matches("~2.1.0-rc.1", &["2.1.0-rc.2", "2.1.3"], &["2.1.0-rc.0", "2.1.3-beta"]);
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(c("^1.2.3").to_string(), "^1.2.3");
        assert_eq!(c(">= 1.2 , < 2").to_string(), ">=1.2, <2");
        assert_eq!(c("1.*").to_string(), "1.*");
        assert_eq!(c("1.2.x").to_string(), "1.2.*");
        assert_eq!(c("*").to_string(), "*");
        assert_eq!(c("^1 ||  ~2.3").to_string(), "^1 || ~2.3");
        assert_eq!(c("1.0.0 - 2.0.0").to_string(), ">=1.0.0, <=2.0.0");
    }

    #[test]
    fn display_reparses_to_same_constraint() {
        for s in ["^1.2.3", ">=1.0.0-rc.1, <2", "~0.3 || 1.*", "=4.5.6"] {
            let parsed = c(s);
            assert_eq!(c(&parsed.to_string()), parsed);
        }
    }

    #[test]
    fn exact_constructor_pins_version() {
        let pinned = Constraint::exact(&v("1.1.0"));
        assert!(pinned.matches(&v("1.1.0")));
        assert!(!pinned.matches(&v("1.1.1")));
        assert_eq!(pinned.to_string(), "=1.1.0");
    }

    #[test]
    fn best_match_picks_highest() {
        let versions = [v("1.0.0"), v("1.4.0"), v("2.0.0"), v("1.3.9")];
        assert_eq!(c("^1").best_match(&versions), Some(&v("1.4.0")));
        assert_eq!(c(">=3").best_match(&versions), None);
    }

    #[test]
    fn errors_name_offending_token() {
        let err = Constraint::parse(">=1.2, <>2").unwrap_err();
        assert_eq!(err.token, "<>2");
        assert_eq!(err.kind, ConstraintErrorKind::UnexpectedOperator);

        let err = Constraint::parse("^1.02").unwrap_err();
        assert_eq!(err.token, "^1.02");
        assert_eq!(
            err.kind,
            ConstraintErrorKind::InvalidComponent {
                component: Component::Minor,
                reason: Reason::LeadingZero,
            }
        );
    }

    #[test]
    fn error_cases() {
        let kind = |s: &str| Constraint::parse(s).unwrap_err().kind;
        assert_eq!(kind(""), ConstraintErrorKind::Empty);
        assert_eq!(kind("^1 ||"), ConstraintErrorKind::EmptyAlternative);
        assert_eq!(kind(">="), ConstraintErrorKind::MissingVersion);
        assert_eq!(kind("1.0.0+build"), ConstraintErrorKind::BuildMetadata);
        assert_eq!(kind(">=*"), ConstraintErrorKind::WildcardWithOperator);
        assert_eq!(kind("1.*.3"), ConstraintErrorKind::MisplacedWildcard);
        assert_eq!(kind("1.2-beta"), ConstraintErrorKind::PartialPreRelease);
        assert_eq!(kind("1.0.0 -"), ConstraintErrorKind::DanglingHyphen);
        assert_eq!(kind(">=1.0.0 - 2.0.0"), ConstraintErrorKind::UnexpectedOperator);
    }

    #[test]
    fn error_message_mentions_token() {
        let err = Constraint::parse("^1.2, ~banana").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`~banana`"), "got: {msg}");
        assert!(msg.contains("major version"), "got: {msg}");
    }
}
