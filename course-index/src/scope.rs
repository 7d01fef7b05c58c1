//! Retrieval scope computation.
//!
//! The scope decides which units' chunks are eligible for a query:
//! unit-exact when the course is non-additive, the ordered prefix of
//! published units when it is. A student on unit 5 can then draw on
//! material from units 1–5 but never units 6+.

use crate::errors::IndexError;
use crate::metadata::CourseUnits;

/// The unit scope actually used by one retrieval, kept for transparency in
/// chat responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalScope {
    pub course_id: String,
    /// Units eligible for this query, in declared course order.
    pub units: Vec<String>,
}

impl RetrievalScope {
    /// An empty scope, used when a chat turn degrades to general-knowledge
    /// mode without retrieval.
    pub fn empty(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            units: Vec::new(),
        }
    }
}

/// Computes the retrieval scope for `unit_name` under the course's policy.
///
/// Only published units participate. If `additive_retrieval` is false the
/// scope is exactly `{unit_name}`; otherwise it is the ordered prefix of
/// published units up to and including `unit_name`.
///
/// # Errors
/// Returns [`IndexError::UnitNotAvailable`] if `unit_name` is not in the
/// published unit list.
pub fn compute_scope(
    course_id: &str,
    unit_name: &str,
    course: &CourseUnits,
) -> Result<RetrievalScope, IndexError> {
    let published: Vec<&str> = course
        .units
        .iter()
        .filter(|u| u.is_published)
        .map(|u| u.name.as_str())
        .collect();

    let position = published.iter().position(|name| *name == unit_name);
    let Some(position) = position else {
        return Err(IndexError::UnitNotAvailable {
            course_id: course_id.to_string(),
            unit_name: unit_name.to_string(),
        });
    };

    let units = if course.additive_retrieval {
        published[..=position]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        vec![unit_name.to_string()]
    };

    Ok(RetrievalScope {
        course_id: course_id.to_string(),
        units,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::UnitInfo;

    fn course(additive: bool, units: &[(&str, bool)]) -> CourseUnits {
        CourseUnits {
            units: units
                .iter()
                .map(|(name, published)| UnitInfo {
                    name: name.to_string(),
                    is_published: *published,
                })
                .collect(),
            additive_retrieval: additive,
        }
    }

    #[test]
    fn non_additive_scope_is_single_unit() {
        let c = course(false, &[("U1", true), ("U2", true), ("U3", true)]);
        let scope = compute_scope("c1", "U2", &c).unwrap();
        assert_eq!(scope.units, vec!["U2"]);
    }

    #[test]
    fn additive_scope_is_ordered_prefix() {
        let c = course(true, &[("U1", true), ("U2", true), ("U3", true), ("U4", true)]);
        let scope = compute_scope("c1", "U3", &c).unwrap();
        assert_eq!(scope.units, vec!["U1", "U2", "U3"]);
    }

    #[test]
    fn additive_scope_skips_unpublished_prefix_units() {
        let c = course(true, &[("U1", true), ("U2", false), ("U3", true)]);
        let scope = compute_scope("c1", "U3", &c).unwrap();
        assert_eq!(scope.units, vec!["U1", "U3"]);
    }

    #[test]
    fn additive_scope_never_includes_later_units() {
        let c = course(true, &[("U1", true), ("U2", true), ("U3", true)]);
        let scope = compute_scope("c1", "U1", &c).unwrap();
        assert_eq!(scope.units, vec!["U1"]);
    }

    #[test]
    fn unpublished_unit_is_rejected() {
        let c = course(true, &[("U1", true), ("U2", false)]);
        let err = compute_scope("c1", "U2", &c).unwrap_err();
        assert!(matches!(err, IndexError::UnitNotAvailable { .. }));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let c = course(false, &[("U1", true)]);
        let err = compute_scope("c1", "U9", &c).unwrap_err();
        assert!(matches!(err, IndexError::UnitNotAvailable { .. }));
    }

    #[test]
    fn scope_monotonicity_over_published_prefix() {
        let names = ["U1", "U2", "U3", "U4", "U5"];
        let c = course(true, &names.map(|n| (n, true)));
        for (k, name) in names.iter().enumerate() {
            let scope = compute_scope("c1", name, &c).unwrap();
            assert_eq!(scope.units, names[..=k].to_vec());
        }
    }
}
