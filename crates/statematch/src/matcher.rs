//! Subset matching between a pattern and an observed document.
//!
//! The matcher is a pure function over two [`TreeValue`]s. The pattern only
//! needs to mention the fields it cares about; lists match existentially and
//! injectively via maximum bipartite matching so that two pattern elements can
//! never be satisfied by the same observed element.

use crate::value::TreeValue;

/// Decide whether `observed` satisfies the partial specification `pattern`.
///
/// Non-match is the sole failure signal; a variant mismatch (for example a
/// pattern scalar against an observed map) is a clean `false`, never an error.
#[must_use]
pub fn matches(pattern: &TreeValue, observed: &TreeValue) -> bool {
    match (pattern, observed) {
        (TreeValue::Map(pattern), TreeValue::Map(observed)) => pattern
            .iter()
            .all(|(key, want)| observed.get(key).is_some_and(|have| matches(want, have))),
        (TreeValue::List(pattern), TreeValue::List(observed)) => list_matches(pattern, observed),
        (TreeValue::Map(_) | TreeValue::List(_), _) => false,
        // Scalars, including scalar-vs-container mismatches
        _ => pattern == observed,
    }
}

/// Existential, injective list matching.
///
/// Every pattern element must be satisfied by a distinct observed element;
/// order is irrelevant and extra observed elements are ignored. Decided by
/// maximum bipartite matching with augmenting paths: greedy first-fit is not
/// enough, because an observed element that satisfies two pattern elements
/// must be reassignable when only one of them has an alternative.
fn list_matches(pattern: &[TreeValue], observed: &[TreeValue]) -> bool {
    if pattern.len() > observed.len() {
        return false;
    }

    // Compatibility edges: pattern[i] can be satisfied by observed[j].
    let compatible: Vec<Vec<usize>> = pattern
        .iter()
        .map(|want| {
            observed
                .iter()
                .enumerate()
                .filter(|(_, have)| matches(want, have))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    // assigned[j] is the pattern element currently holding observed[j].
    let mut assigned: Vec<Option<usize>> = vec![None; observed.len()];
    for i in 0..pattern.len() {
        let mut visited = vec![false; observed.len()];
        if !augment(i, &compatible, &mut assigned, &mut visited) {
            return false;
        }
    }
    true
}

/// Try to assign pattern element `i` to some observed element, displacing
/// earlier assignments along an augmenting path where necessary.
fn augment(
    i: usize,
    compatible: &[Vec<usize>],
    assigned: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &j in &compatible[i] {
        if visited[j] {
            continue;
        }
        visited[j] = true;

        match assigned[j] {
            None => {
                assigned[j] = Some(i);
                return true;
            }
            Some(holder) => {
                if augment(holder, compatible, assigned, visited) {
                    assigned[j] = Some(i);
                    return true;
                }
            }
        }
    }
    false
}
