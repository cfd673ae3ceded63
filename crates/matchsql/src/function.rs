//! Names of the fuzzy match filter functions.

use std::str::FromStr;

/// What a filter function tests for, independent of case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Equals,
    Starts,
    Ends,
    Contains,
    Regexp,
}

/// One of the supported filter functions.
///
/// Every match kind comes in a case-sensitive and a case-insensitive (`CI`) form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
)]
pub enum FunctionName {
    #[strum(serialize = "existsEquals")]
    ExistsEquals,
    #[strum(serialize = "existsEqualsCI")]
    ExistsEqualsCI,
    #[strum(serialize = "existsStarts")]
    ExistsStarts,
    #[strum(serialize = "existsStartsCI")]
    ExistsStartsCI,
    #[strum(serialize = "existsEnds")]
    ExistsEnds,
    #[strum(serialize = "existsEndsCI")]
    ExistsEndsCI,
    #[strum(serialize = "existsContains")]
    ExistsContains,
    #[strum(serialize = "existsContainsCI")]
    ExistsContainsCI,
    #[strum(serialize = "existsRegexp")]
    ExistsRegexp,
    #[strum(serialize = "existsRegexpCI")]
    ExistsRegexpCI,
}

impl FunctionName {
    /// Looks up a function by its name in the query language.
    pub fn lookup(name: &str) -> Option<Self> {
        FunctionName::from_str(name).ok()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn kind(self) -> MatchKind {
        match self {
            FunctionName::ExistsEquals | FunctionName::ExistsEqualsCI => MatchKind::Equals,
            FunctionName::ExistsStarts | FunctionName::ExistsStartsCI => MatchKind::Starts,
            FunctionName::ExistsEnds | FunctionName::ExistsEndsCI => MatchKind::Ends,
            FunctionName::ExistsContains | FunctionName::ExistsContainsCI => MatchKind::Contains,
            FunctionName::ExistsRegexp | FunctionName::ExistsRegexpCI => MatchKind::Regexp,
        }
    }

    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            FunctionName::ExistsEqualsCI
                | FunctionName::ExistsStartsCI
                | FunctionName::ExistsEndsCI
                | FunctionName::ExistsContainsCI
                | FunctionName::ExistsRegexpCI
        )
    }
}
