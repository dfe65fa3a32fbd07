use std::collections::{BTreeMap, HashMap};

/// Supplies values for [`Parameter`](super::Evaluation::Parameter)s during evaluation.
///
/// Implemented for slices and vectors (indexed by parameter ID) and for maps keyed by parameter
/// ID.
pub trait Context<N> {
    /// The value bound to the parameter, if any.
    fn parameter(&self, id: u16) -> Option<N>;
}

impl<N: Clone> Context<N> for [N] {
    fn parameter(&self, id: u16) -> Option<N> {
        self.get(id as usize).cloned()
    }
}

impl<N: Clone> Context<N> for Vec<N> {
    fn parameter(&self, id: u16) -> Option<N> {
        self.as_slice().parameter(id)
    }
}

impl<N: Clone, const LEN: usize> Context<N> for [N; LEN] {
    fn parameter(&self, id: u16) -> Option<N> {
        self.as_slice().parameter(id)
    }
}

impl<N: Clone, S: std::hash::BuildHasher> Context<N> for HashMap<u16, N, S> {
    fn parameter(&self, id: u16) -> Option<N> {
        self.get(&id).cloned()
    }
}

impl<N: Clone> Context<N> for BTreeMap<u16, N> {
    fn parameter(&self, id: u16) -> Option<N> {
        self.get(&id).cloned()
    }
}
