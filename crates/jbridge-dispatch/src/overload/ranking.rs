//! Ranking of viable overload candidates.
//!
//! The comparator is two-level: a candidate with fewer bad-or-worse argument
//! qualities beats one with more, and on a tie the higher sum of per-argument
//! qualities wins. A true tie at both levels is reported as ambiguous - a
//! distinct outcome from no-match, because the caller's remedy differs
//! (select a signature explicitly vs. fix the arguments).

use jbridge_core::{BridgeError, Result, Value, render_args};
use jbridge_registry::{MethodDescriptor, MethodGroup, TypeRegistry};

use super::{CallShape, CandidateMatch, DispatchCtx};
use crate::convert::Quality;

/// Select the best candidate from the viable list.
pub(crate) fn find_best(
    viable: Vec<CandidateMatch>,
    group: &MethodGroup,
    args: &[Value],
    ctx: &DispatchCtx<'_>,
) -> Result<CandidateMatch> {
    if viable.is_empty() {
        return Err(BridgeError::NoMatch {
            name: group.name.clone(),
            args: render_args(args),
        });
    }

    let mut best_index = 0;
    let mut tied: Vec<usize> = vec![0];
    for index in 1..viable.len() {
        match compare(&viable[index], &viable[best_index]) {
            std::cmp::Ordering::Greater => {
                best_index = index;
                tied.clear();
                tied.push(index);
            }
            std::cmp::Ordering::Equal => tied.push(index),
            std::cmp::Ordering::Less => {}
        }
    }

    if tied.len() > 1 {
        let candidates = tied
            .iter()
            .map(|&i| format_signature(&viable[i].method, ctx.registry))
            .collect::<Vec<_>>()
            .join(" and ");
        return Err(BridgeError::Ambiguous {
            name: group.name.clone(),
            args: render_args(args),
            candidates,
        });
    }

    let best = viable.into_iter().nth(best_index).ok_or_else(|| {
        BridgeError::Internal {
            message: "ranking lost its best candidate".into(),
        }
    })?;

    // The winner satisfied both variadic interpretations; the caller has to
    // disambiguate (e.g. by passing the tail elements separately or selecting
    // a signature explicitly).
    if best.shape == CallShape::VarargAmbiguous {
        let signature = format_signature(&best.method, ctx.registry);
        return Err(BridgeError::Ambiguous {
            name: group.name.clone(),
            args: render_args(args),
            candidates: format!(
                "{signature} taking the argument as the lone tail element and \
                 {signature} taking it as the whole tail array"
            ),
        });
    }

    Ok(best)
}

/// Two-level comparison: fewer bad-or-worse arguments first, then the higher
/// quality sum.
fn compare(a: &CandidateMatch, b: &CandidateMatch) -> std::cmp::Ordering {
    bad_count(b)
        .cmp(&bad_count(a))
        .then_with(|| total(a).cmp(&total(b)))
}

fn bad_count(candidate: &CandidateMatch) -> usize {
    candidate
        .qualities
        .iter()
        .filter(|q| **q <= Quality::Bad)
        .count()
}

fn total(candidate: &CandidateMatch) -> u32 {
    candidate.qualities.iter().map(|q| q.score()).sum()
}

/// Render a signature for diagnostics: `f(int, java.lang.String)`, with a
/// variadic tail shown as `int...`.
pub fn format_signature(method: &MethodDescriptor, registry: &TypeRegistry) -> String {
    let mut params: Vec<String> = method
        .params
        .iter()
        .map(|&p| registry.name_of(p))
        .collect();
    if method.variadic {
        if let Some(last) = params.last_mut() {
            if let Some(component) = last.strip_suffix("[]") {
                *last = format!("{component}...");
            }
        }
    }
    format!("{}({})", method.name, params.join(", "))
}
