//! Property-based tests for the filter compiler.
//!
//! The regex side of each property is executed with `regex-lite` against the same
//! NUL-joined encoding the generated SQL builds, and compared with a direct
//! evaluation of the filter over the list elements.
use matchsql::pattern::{build_regex, encode_elements, matches_empty_element};
use matchsql::sql::{Expr, Schema, SqlConverter};
use matchsql::{Error, ExprType, FunctionName, FuzzyMatch, MatchKind, MatchOptions, SENTINEL};
use proptest::prelude::*;
use regex_lite::Regex;

mod strategies {
    use super::*;

    /// List elements over a small alphabet that includes regex metacharacters
    pub fn elements() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-cA-C.*]{0,4}", 0..5)
    }

    pub fn candidates() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-cA-C.*]{0,3}", 1..4)
    }

    /// Candidates that are valid patterns matching only themselves
    pub fn literal_patterns() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-c]{0,3}", 1..4)
    }

    /// Escapes that spell the sentinel in a raw pattern
    pub fn sentinel_escape() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![r"\x00", r"\x{0}", r"\x{000}", r"\0", r"\00", r"\000"])
    }

    /// Functions whose candidates are matched literally
    pub fn literal_function() -> impl Strategy<Value = FunctionName> {
        prop::sample::select(vec![
            FunctionName::ExistsEquals,
            FunctionName::ExistsEqualsCI,
            FunctionName::ExistsStarts,
            FunctionName::ExistsStartsCI,
            FunctionName::ExistsEnds,
            FunctionName::ExistsEndsCI,
            FunctionName::ExistsContains,
            FunctionName::ExistsContainsCI,
        ])
    }

    /// A string-typed operand: a column or a literal
    pub fn scalar_operand() -> impl Strategy<Value = Expr> {
        prop_oneof![
            Just(Expr::ident("name")),
            "[a-z]{0,5}".prop_map(|s| Expr::string(&s)),
        ]
    }

    /// A list-typed operand: a column or a literal list
    pub fn collection_operand() -> impl Strategy<Value = Expr> {
        prop_oneof![
            Just(Expr::ident("tags")),
            prop::collection::vec("[a-z]{0,5}", 1..4)
                .prop_map(|values| Expr::strings(values.iter().map(String::as_str))),
        ]
    }
}

/// Evaluates a filter directly over the list elements.
fn expected_match(function: FunctionName, elements: &[String], candidates: &[String]) -> bool {
    let normalize = |s: &str| {
        if function.is_case_insensitive() {
            s.to_ascii_lowercase()
        } else {
            s.to_string()
        }
    };

    elements.iter().any(|element| {
        let element = normalize(element);
        candidates.iter().any(|candidate| {
            let candidate = normalize(candidate);
            match function.kind() {
                MatchKind::Equals | MatchKind::Regexp => element == candidate,
                MatchKind::Starts => element.starts_with(&candidate),
                MatchKind::Ends => element.ends_with(&candidate),
                MatchKind::Contains => element.contains(&candidate),
            }
        })
    })
}

/// Evaluates the generated SQL for a list target: the optional non-empty guard
/// followed by the regex over the encoded elements.
fn regex_match(function: FunctionName, elements: &[String], candidates: &[String]) -> bool {
    let opts = MatchOptions::for_function(function);
    let regex = build_regex(candidates, opts).unwrap();
    let guarded = matches_empty_element(candidates, opts);
    (!guarded || !elements.is_empty()) && Regex::new(&regex).unwrap().is_match(&encode_elements(elements))
}

fn converter() -> SqlConverter {
    let schema = Schema::new()
        .column("name", ExprType::String)
        .column("tags", ExprType::list(ExprType::String));
    SqlConverter::new(schema, None).with_extension(FuzzyMatch::new(None))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Anchors and escaping keep every candidate scoped to a single element
    #[test]
    fn literal_matches_respect_element_boundaries(
        function in strategies::literal_function(),
        elements in strategies::elements(),
        candidates in strategies::candidates(),
    ) {
        prop_assert_eq!(
            regex_match(function, &elements, &candidates),
            expected_match(function, &elements, &candidates),
            "{} elements={:?} candidates={:?}", function, elements, candidates
        );
    }

    /// Raw patterns are anchored to whole elements
    #[test]
    fn regexp_matches_whole_elements(
        ci in any::<bool>(),
        elements in strategies::elements(),
        patterns in strategies::literal_patterns(),
    ) {
        let function = if ci { FunctionName::ExistsRegexpCI } else { FunctionName::ExistsRegexp };
        prop_assert_eq!(
            regex_match(function, &elements, &patterns),
            expected_match(function, &elements, &patterns)
        );
    }

    /// The case-insensitive flag leads the regex exactly for the CI functions
    #[test]
    fn case_insensitive_flag_only_for_ci_functions(
        function in strategies::literal_function(),
        candidates in strategies::candidates(),
    ) {
        let regex = build_regex(&candidates, MatchOptions::for_function(function)).unwrap();
        prop_assert_eq!(regex.starts_with("(?i)"), function.is_case_insensitive());
    }

    /// No candidate containing the sentinel ever compiles
    #[test]
    fn sentinel_in_candidate_is_rejected(
        function in strategies::literal_function(),
        prefix in "[a-c]{0,3}",
        suffix in "[a-c]{0,3}",
    ) {
        let candidate = format!("{}{}{}", prefix, SENTINEL, suffix);
        let result = build_regex(&[candidate.clone()], MatchOptions::for_function(function));
        prop_assert_eq!(result, Err(Error::SentinelInValue(candidate)));
    }

    /// Raw patterns naming the sentinel by escape never compile
    #[test]
    fn escaped_sentinel_in_pattern_is_rejected(
        ci in any::<bool>(),
        prefix in "[a-c]{0,3}",
        escape in strategies::sentinel_escape(),
        suffix in "[a-c]{0,3}",
    ) {
        let function = if ci { FunctionName::ExistsRegexpCI } else { FunctionName::ExistsRegexp };
        let pattern = format!("{}{}{}", prefix, escape, suffix);
        let result = build_regex(&[pattern.clone()], MatchOptions::for_function(function));
        prop_assert_eq!(result, Err(Error::SentinelInValue(pattern)));
    }

    /// equals(list, string) compiles to the same SQL as equals(string, list)
    #[test]
    fn equals_is_symmetric(
        ci in any::<bool>(),
        scalar in strategies::scalar_operand(),
        collection in strategies::collection_operand(),
    ) {
        let function = if ci { "existsEqualsCI" } else { "existsEquals" };
        let forward = converter()
            .convert(&Expr::call(function, collection.clone(), vec![scalar.clone()]))
            .unwrap();
        let backward = converter()
            .convert(&Expr::call(function, scalar, vec![collection]))
            .unwrap();
        prop_assert_eq!(forward, backward);
    }
}
