//! Filter construction for Qdrant queries.
//!
//! All filters are an AND of equality/any-of predicates on payload fields
//! (`course_id`, `unit_name`, `document_id`).

use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, RepeatedStrings, condition::ConditionOneOf,
    r#match::MatchValue,
};

use crate::scope::RetrievalScope;

/// Builds the AND filter for a retrieval scope: `course_id` equality plus
/// `unit_name` equality (single unit) or any-of (unit set).
pub(crate) fn scope_filter(scope: &RetrievalScope) -> Filter {
    let mut must = vec![keyword_eq("course_id", &scope.course_id)];

    match scope.units.as_slice() {
        [] => {}
        [single] => must.push(keyword_eq("unit_name", single)),
        many => must.push(keyword_any("unit_name", many)),
    }

    Filter {
        must,
        ..Default::default()
    }
}

/// Filter matching every chunk of one document.
pub(crate) fn document_filter(document_id: &str) -> Filter {
    Filter {
        must: vec![keyword_eq("document_id", document_id)],
        ..Default::default()
    }
}

/// Filter matching every chunk of one course.
pub(crate) fn course_filter(course_id: &str) -> Filter {
    Filter {
        must: vec![keyword_eq("course_id", course_id)],
        ..Default::default()
    }
}

fn keyword_eq(field: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}

fn keyword_any(field: &str, values: &[String]) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keywords(RepeatedStrings {
                    strings: values.to_vec(),
                })),
            }),
            ..Default::default()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_filter_is_an_and_of_course_and_units() {
        let scope = RetrievalScope {
            course_id: "c1".into(),
            units: vec!["U1".into(), "U2".into()],
        };
        let f = scope_filter(&scope);
        assert_eq!(f.must.len(), 2);
        assert!(f.should.is_empty());
    }

    #[test]
    fn single_unit_uses_keyword_equality() {
        let scope = RetrievalScope {
            course_id: "c1".into(),
            units: vec!["U1".into()],
        };
        let f = scope_filter(&scope);
        let cond = &f.must[1];
        let ConditionOneOf::Field(fc) = cond.condition_one_of.as_ref().unwrap() else {
            panic!("expected field condition");
        };
        assert!(matches!(
            fc.r#match.as_ref().unwrap().match_value,
            Some(MatchValue::Keyword(_))
        ));
    }

    #[test]
    fn unit_set_uses_keywords_any_of() {
        let scope = RetrievalScope {
            course_id: "c1".into(),
            units: vec!["U1".into(), "U2".into(), "U3".into()],
        };
        let f = scope_filter(&scope);
        let ConditionOneOf::Field(fc) = f.must[1].condition_one_of.as_ref().unwrap() else {
            panic!("expected field condition");
        };
        match &fc.r#match.as_ref().unwrap().match_value {
            Some(MatchValue::Keywords(set)) => assert_eq!(set.strings.len(), 3),
            other => panic!("expected keywords match, got {other:?}"),
        }
    }
}
