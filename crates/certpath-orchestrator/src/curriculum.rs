//! The certification curriculum catalog.
//!
//! A read-only mapping from certification name to its ordered topics.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CertPathError, Result};

/// Certification tracks shipped with CertPath, in traversal order.
const BUILTIN_CURRICULA: &[(&str, &[&str])] = &[
    (
        "AWS Cloud Practitioner",
        &[
            "Cloud Concepts",
            "Security & Compliance",
            "Technology",
            "Billing & Pricing",
        ],
    ),
    (
        "AWS Solutions Architect Associate",
        &[
            "Design Resilient Architectures",
            "Design Secure Architectures",
            "Design Cost-Optimized Architectures",
        ],
    ),
];

/// An ordered sequence of topics for one certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Curriculum {
    /// The certification this curriculum belongs to.
    pub certification: String,
    /// Topic names in traversal order.
    pub topics: Vec<String>,
}

impl Curriculum {
    /// Number of topics in the curriculum.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if the curriculum has no topics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Returns the topic at `index`, if in bounds.
    #[must_use]
    pub fn topic(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }
}

/// Registered curricula keyed by certification name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    curricula: BTreeMap<String, Arc<Curriculum>>,
}

impl Catalog {
    /// Builds the catalog of built-in certification tracks.
    ///
    /// # Examples
    ///
    /// ```
    /// use certpath_orchestrator::Catalog;
    ///
    /// let catalog = Catalog::builtin();
    /// let curriculum = catalog.topics_for("AWS Cloud Practitioner").unwrap();
    /// assert_eq!(curriculum.topic(0), Some("Cloud Concepts"));
    /// ```
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_CURRICULA
                .iter()
                .map(|(name, topics)| (*name, topics.iter().copied())),
        )
    }

    /// Builds a catalog from `(certification, topics)` pairs.
    ///
    /// A later entry for the same certification replaces an earlier one.
    pub fn from_entries<N, I, T>(entries: impl IntoIterator<Item = (N, I)>) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let curricula = entries
            .into_iter()
            .map(|(name, topics)| {
                let certification = name.into();
                let curriculum = Curriculum {
                    certification: certification.clone(),
                    topics: topics.into_iter().map(Into::into).collect(),
                };
                (certification, Arc::new(curriculum))
            })
            .collect();
        Self { curricula }
    }

    /// Looks up the curriculum for `certification`.
    ///
    /// # Errors
    ///
    /// Returns `CertPathError::UnknownCertification` if the name is not
    /// registered, and `CertPathError::EmptyCurriculum` if it has no topics.
    pub fn topics_for(&self, certification: &str) -> Result<Arc<Curriculum>> {
        let curriculum = self
            .curricula
            .get(certification)
            .ok_or_else(|| CertPathError::unknown_certification(certification))?;

        if curriculum.is_empty() {
            return Err(CertPathError::empty_curriculum(certification));
        }

        Ok(Arc::clone(curriculum))
    }

    /// Registered certification names, sorted.
    pub fn certifications(&self) -> impl Iterator<Item = &str> {
        self.curricula.keys().map(String::as_str)
    }

    /// Registered curricula, sorted by certification name.
    pub fn curricula(&self) -> impl Iterator<Item = &Curriculum> {
        self.curricula.values().map(AsRef::as_ref)
    }
}
