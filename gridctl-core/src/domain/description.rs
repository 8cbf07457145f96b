//! Job description domain types
//!
//! A job description is produced by an external description-language parser.
//! The supervisor only needs the resource requirements (for brokering), the
//! source document (to hand to the submitter) and the ordered set of
//! alternative descriptions a document may declare.

use serde::{Deserialize, Serialize};

use crate::domain::job::JobOutputs;

/// Resource requirements a target must satisfy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequirements {
    /// Application environments that must be installed
    pub application_environments: Vec<String>,
    pub queue: Option<String>,
    /// Number of slots (cores) requested
    pub slots: Option<u32>,
    pub main_memory_mb: Option<u64>,
    pub wall_time_secs: Option<u64>,
}

/// One concrete job description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    pub name: Option<String>,
    pub requirements: JobRequirements,
    /// Output stream names declared by the description
    pub outputs: JobOutputs,
    /// Source document the description was parsed from
    pub document: String,
}

/// A job description together with its declared alternatives
///
/// Variant 0 is the original description, followed by the alternatives in
/// document order. `selected` indexes the variant currently in use; moving
/// between variants never reorders the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionSet {
    variants: Vec<JobDescription>,
    selected: usize,
}

impl DescriptionSet {
    pub fn new(original: JobDescription) -> Self {
        Self {
            variants: vec![original],
            selected: 0,
        }
    }

    pub fn with_alternatives(
        original: JobDescription,
        alternatives: impl IntoIterator<Item = JobDescription>,
    ) -> Self {
        let mut set = Self::new(original);
        set.variants.extend(alternatives);
        set
    }

    /// Appends an alternative after all existing ones
    pub fn add_alternative(&mut self, alternative: JobDescription) {
        self.variants.push(alternative);
    }

    /// Description currently selected
    pub fn selected(&self) -> &JobDescription {
        &self.variants[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Selects the original description again
    pub fn use_original(&mut self) {
        self.selected = 0;
    }

    /// Moves to the next alternative
    ///
    /// Returns `false` and keeps the current selection when no alternative is left.
    pub fn use_next_alternative(&mut self) -> bool {
        if self.selected + 1 < self.variants.len() {
            self.selected += 1;
            true
        } else {
            false
        }
    }

    pub fn alternatives(&self) -> &[JobDescription] {
        &self.variants[1..]
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Always `false`: a set holds at least the original description
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
