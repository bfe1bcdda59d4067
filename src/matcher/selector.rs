//! Policy selection against a record
//!
//! Policies are checked in the order given. Evaluation is lenient: a policy
//! whose condition cannot be evaluated is skipped, never selected.

use crate::condition::{evaluate, ConditionNode, Record};
use crate::registry::FieldRegistry;

/// Anything carrying an optional root condition
///
/// A policy without a condition applies to every record.
pub trait Conditioned {
    fn condition(&self) -> Option<&ConditionNode>;
}

impl Conditioned for ConditionNode {
    fn condition(&self) -> Option<&ConditionNode> {
        Some(self)
    }
}

impl Conditioned for Option<ConditionNode> {
    fn condition(&self) -> Option<&ConditionNode> {
        self.as_ref()
    }
}

impl<T: Conditioned + ?Sized> Conditioned for &T {
    fn condition(&self) -> Option<&ConditionNode> {
        (**self).condition()
    }
}

/// Whether a single policy applies to the record
#[inline]
pub fn matches<P, R>(policy: &P, record: &R, registry: &FieldRegistry) -> bool
where
    P: Conditioned + ?Sized,
    R: Record + ?Sized,
{
    evaluate(policy.condition(), record, registry)
}

/// First policy, in order, whose condition matches
pub fn first_match<'a, P, R>(
    policies: &'a [P],
    record: &R,
    registry: &FieldRegistry,
) -> Option<&'a P>
where
    P: Conditioned,
    R: Record + ?Sized,
{
    let selected = policies
        .iter()
        .position(|policy| matches(policy, record, registry));

    match selected {
        Some(index) => {
            log::debug!("policy {} of {} matched", index, policies.len());
            policies.get(index)
        }
        None => {
            log::debug!("no policy of {} matched", policies.len());
            None
        }
    }
}

/// Every policy whose condition matches, in input order
pub fn all_matches<'a, P, R>(policies: &'a [P], record: &R, registry: &FieldRegistry) -> Vec<&'a P>
where
    P: Conditioned,
    R: Record + ?Sized,
{
    let matched: Vec<&P> = policies
        .iter()
        .filter(|policy| matches(*policy, record, registry))
        .collect();

    log::debug!("{} of {} policies matched", matched.len(), policies.len());
    matched
}
