//! Read-only contract with the external metadata store.
//!
//! The metadata store is the system of record for documents and course
//! structure. This crate consumes two queries and never writes back;
//! consistency between the store and the vector index is eventual and
//! repaired asynchronously by the reconciler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::IndexError;

pub mod http;

/// One unit of a course, in declared order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitInfo {
    pub name: String,
    pub is_published: bool,
}

/// Course scoping structure consumed on every retrieval call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseUnits {
    /// Ordered list of units as declared by the course.
    pub units: Vec<UnitInfo>,
    /// When true, a unit's retrieval scope includes all prior published
    /// units ("additive retrieval").
    pub additive_retrieval: bool,
}

/// Read-only client of the metadata store.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Returns the live document ids for a course.
    ///
    /// # Errors
    /// Returns [`IndexError::Metadata`] when the store is unreachable.
    async fn document_ids_for_course(&self, course_id: &str) -> Result<Vec<String>, IndexError>;

    /// Returns the course's ordered unit list and retrieval policy.
    ///
    /// # Errors
    /// Returns [`IndexError::Metadata`] when the store is unreachable.
    async fn course_units(&self, course_id: &str) -> Result<CourseUnits, IndexError>;
}
