// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field matching: tokens × field groups → one flat OR.
//!
//! Supplying several phrases widens the search: an entity matches when ANY
//! phrase matches ANY of the target's field groups.

use super::field_group::FieldGroup;
use super::query_builder::{Query, QueryBuilder};
use super::token::SearchToken;

/// Predicate for a single token against a single group.
pub fn token_predicate(token: &SearchToken, group: &FieldGroup) -> Query {
    match token {
        SearchToken::Exact(text) => Query::exact(group.fields, text.clone()),
        SearchToken::Fuzzy(text) => Query::contains(group.fields, text.clone()),
    }
}

/// Combine every `(token, group)` predicate with OR.
///
/// No tokens means no name constraint, so the result matches everything.
pub fn match_predicate(tokens: &[SearchToken], groups: &[FieldGroup]) -> Query {
    if tokens.is_empty() {
        return Query::match_all();
    }
    tokens
        .iter()
        .flat_map(|token| groups.iter().map(move |group| token_predicate(token, group)))
        .fold(QueryBuilder::new(), QueryBuilder::push)
        .build_or()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::User;
    use crate::search::field_group::USER_NAME_GROUPS;
    use crate::search::query_builder::QueryNode;
    use crate::search::token::parse_tokens;

    fn users() -> Vec<User> {
        vec![
            User::new(1, "Alice", "Smith"),
            User::new(2, "Bob", "Jones").with_nickname("bobby"),
            User::new(3, "Carol", "Alice").with_middle_name("Anne"),
            User::new(4, "Dan", "Brown"),
        ]
    }

    fn matching_ids(query: &Query) -> Vec<i64> {
        users().iter().filter(|u| query.matches(*u)).map(|u| u.id).collect()
    }

    #[test]
    fn test_one_predicate_per_token_and_group() {
        let tokens = parse_tokens(&["a", "\"b\""]);
        let query = match_predicate(&tokens, USER_NAME_GROUPS);
        match query.root {
            QueryNode::Or(nodes) => assert_eq!(nodes.len(), 2 * USER_NAME_GROUPS.len()),
            _ => panic!("Expected Or node"),
        }
    }

    #[test]
    fn test_empty_tokens_match_everything() {
        let query = match_predicate(&[], USER_NAME_GROUPS);
        assert_eq!(query.root, QueryNode::MatchAll);
        assert_eq!(matching_ids(&query), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_fuzzy_matches_any_group() {
        let query = match_predicate(&parse_tokens(&["alice"]), USER_NAME_GROUPS);
        // Alice Smith by first name, Carol Anne Alice by last name
        assert_eq!(matching_ids(&query), vec![1, 3]);
    }

    #[test]
    fn test_nickname_group() {
        let query = match_predicate(&parse_tokens(&["BOBB"]), USER_NAME_GROUPS);
        assert_eq!(matching_ids(&query), vec![2]);
    }

    #[test]
    fn test_exact_requires_whole_group_value() {
        let quoted = match_predicate(&parse_tokens(&["\"Alice\""]), USER_NAME_GROUPS);
        assert!(matching_ids(&quoted).is_empty());

        let full = match_predicate(&parse_tokens(&["\"Alice Smith\""]), USER_NAME_GROUPS);
        assert_eq!(matching_ids(&full), vec![1]);
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        let query = match_predicate(&parse_tokens(&["\"alice smith\""]), USER_NAME_GROUPS);
        assert!(matching_ids(&query).is_empty());
    }

    #[test]
    fn test_multiple_terms_are_a_union() {
        let query = match_predicate(&parse_tokens(&["Smith", "Jones"]), USER_NAME_GROUPS);
        assert_eq!(matching_ids(&query), vec![1, 2]);
    }
}
