use std::collections::HashSet;

use regex::Regex;

/// The four rule kinds, in the fixed order they are refreshed and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Exact-equal forbidden passwords (lowercased on load and on compare).
    Match,
    /// Forbidden substrings (lowercased on load and on compare).
    Contains,
    /// Forbid-if-matches regular expressions (raw, case-sensitive).
    Regex,
    /// Require-all regular expressions: deny if any does NOT match.
    ForbidRegex,
}

impl RuleKind {
    /// Fixed refresh/check order: Match, Contains, Regex, ForbidRegex.
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Match,
        RuleKind::Contains,
        RuleKind::Regex,
        RuleKind::ForbidRegex,
    ];

    /// Short role name used in log records and error messages.
    pub fn role(self) -> &'static str {
        match self {
            RuleKind::Match => "match",
            RuleKind::Contains => "contains",
            RuleKind::Regex => "regex",
            RuleKind::ForbidRegex => "forbid-regex",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.role())
    }
}

/// Exact-match forbidden passwords, lowercased, unique.
pub type MatchPayload = HashSet<String>;
/// Forbidden substrings, lowercased, in file order.
pub type ContainsPayload = Vec<String>;
/// Compiled regular expressions, in file order.
pub type RegexPayload = Vec<Regex>;

/// Identity attribute labels, in the fixed order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityLabel {
    FullName,
    GivenName,
    Surname,
    Login,
}

impl IdentityLabel {
    pub const ALL: [IdentityLabel; 4] = [
        IdentityLabel::FullName,
        IdentityLabel::GivenName,
        IdentityLabel::Surname,
        IdentityLabel::Login,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdentityLabel::FullName => "full name",
            IdentityLabel::GivenName => "given name",
            IdentityLabel::Surname => "surname",
            IdentityLabel::Login => "login",
        }
    }
}

impl std::fmt::Display for IdentityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity attributes of the account holder, fetched from the directory
/// per evaluation and discarded afterwards. Any attribute may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub login: Option<String>,
}

impl Identity {
    /// Present attributes in the fixed check order:
    /// full name, given name, surname, login.
    pub fn attributes(&self) -> impl Iterator<Item = (IdentityLabel, &str)> {
        [
            (IdentityLabel::FullName, self.full_name.as_deref()),
            (IdentityLabel::GivenName, self.given_name.as_deref()),
            (IdentityLabel::Surname, self.surname.as_deref()),
            (IdentityLabel::Login, self.login.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
    }
}

/// Why a candidate password was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The lowercased password contains this forbidden substring.
    /// The substring itself is only logged on the security channel.
    ContainsPoisonSubstring(String),
    /// The lowercased password equals an entry of the forbidden-password list.
    MatchesForbiddenPassword,
    /// The raw password matches this forbid-if-matches pattern.
    MatchesForbiddenPattern(String),
    /// The raw password fails to match this require-all pattern.
    FailsRequiredPattern(String),
    /// The lowercased password contains the value of this identity attribute.
    ContainsIdentityAttribute(IdentityLabel),
}

impl std::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Deliberately omits the substring; it goes to the security channel.
            ForbiddenReason::ContainsPoisonSubstring(_) => {
                f.write_str("contains a forbidden substring")
            }
            ForbiddenReason::MatchesForbiddenPassword => {
                f.write_str("matches an entry in the forbidden password list")
            }
            ForbiddenReason::MatchesForbiddenPattern(pattern) => {
                write!(f, "matches forbidden pattern `{pattern}`")
            }
            ForbiddenReason::FailsRequiredPattern(pattern) => {
                write!(f, "does not match required pattern `{pattern}`")
            }
            ForbiddenReason::ContainsIdentityAttribute(label) => {
                write!(f, "contains the user's {label}")
            }
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(ForbiddenReason),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}
