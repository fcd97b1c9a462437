//! Collected validation output.
//!
//! Validators never stop at the first defect. Each one returns a
//! [`ValidationResult`] over its own issue enum; issues become strings only
//! when displayed or serialized.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// Errors and warnings from one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult<K> {
    pub errors: Vec<K>,
    pub warnings: Vec<K>,
}

impl<K> Default for ValidationResult<K> {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<K> ValidationResult<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors were recorded. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn fail(&mut self, issue: K) {
        self.errors.push(issue);
    }

    pub(crate) fn warn(&mut self, issue: K) {
        self.warnings.push(issue);
    }

    /// Append another result with a compatible issue type.
    pub fn merge<J: Into<K>>(&mut self, other: ValidationResult<J>) {
        self.errors.extend(other.errors.into_iter().map(Into::into));
        self.warnings.extend(other.warnings.into_iter().map(Into::into));
    }
}

impl<K: fmt::Display> ValidationResult<K> {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

impl<K: fmt::Display> fmt::Display for ValidationResult<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.errors {
            writeln!(f, "error: {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "warning: {w}")?;
        }
        Ok(())
    }
}

impl<K: fmt::Display> Serialize for ValidationResult<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ValidationResult", 3)?;
        s.serialize_field("valid", &self.is_valid())?;
        s.serialize_field("errors", &self.error_messages())?;
        s.serialize_field("warnings", &self.warning_messages())?;
        s.end()
    }
}
