//! Overload resolution
//!
//! Matching is exact: same length, same identity at every position. No
//! widening, no inheritance-based matching and no converter fallback.
//! Callers wanting looser matching convert their arguments first and
//! retry.

use std::sync::Arc;

use rtti_sdk::TypeIdentity;

use crate::descriptor::Signature;

impl<S: Signature + ?Sized> Signature for Arc<S> {
    fn parameter_types(&self) -> &[TypeIdentity] {
        (**self).parameter_types()
    }
}

/// Check if a parameter list accepts exactly the given argument types
pub fn signatures_match(candidate: &[TypeIdentity], args: &[TypeIdentity]) -> bool {
    candidate.len() == args.len() && candidate.iter().zip(args).all(|(p, a)| p == a)
}

/// Check if any existing overload has the same parameter list as `new`
pub fn is_already_registered<'a, N, E>(new: &N, existing: impl IntoIterator<Item = &'a E>) -> bool
where
    N: Signature + ?Sized,
    E: Signature + 'a,
{
    existing
        .into_iter()
        .any(|candidate| signatures_match(candidate.parameter_types(), new.parameter_types()))
}

/// First candidate whose parameter list matches `args` exactly
pub fn select<'a, S>(candidates: impl IntoIterator<Item = &'a S>, args: &[TypeIdentity]) -> Option<&'a S>
where
    S: Signature + 'a,
{
    candidates
        .into_iter()
        .find(|candidate| signatures_match(candidate.parameter_types(), args))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeIdentity = TypeIdentity::from_raw(1);
    const TEXT: TypeIdentity = TypeIdentity::from_raw(2);

    struct Overload(Vec<TypeIdentity>);

    impl Signature for Overload {
        fn parameter_types(&self) -> &[TypeIdentity] {
            &self.0
        }
    }

    #[test]
    fn test_signatures_match_exactly() {
        assert!(signatures_match(&[], &[]));
        assert!(signatures_match(&[INT, TEXT], &[INT, TEXT]));
        assert!(!signatures_match(&[INT, TEXT], &[TEXT, INT]));
        assert!(!signatures_match(&[INT], &[INT, INT]));
    }

    #[test]
    fn test_select_by_arguments() {
        let overloads = vec![Overload(vec![INT]), Overload(vec![INT, INT])];
        assert_eq!(select(&overloads, &[INT]).map(|o| o.0.len()), Some(1));
        assert_eq!(select(&overloads, &[INT, INT]).map(|o| o.0.len()), Some(2));
        assert!(select(&overloads, &[TEXT]).is_none());
    }

    #[test]
    fn test_duplicate_detection() {
        let existing = vec![Overload(vec![]), Overload(vec![INT])];
        assert!(is_already_registered(&Overload(vec![INT]), &existing));
        assert!(!is_already_registered(&Overload(vec![TEXT]), &existing));
    }

    #[test]
    fn test_arc_candidates() {
        let overloads = vec![Arc::new(Overload(vec![TEXT]))];
        assert!(select(&overloads, &[TEXT]).is_some());
    }
}
