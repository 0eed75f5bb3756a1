use crate::document::EditStep;

/// Result of applying a command
#[derive(Debug, Clone)]
pub struct Patch {
    /// Position map of the edit, to be fed to anything tracking positions
    pub step: EditStep,
    /// Range of the new document touched by the edit
    pub changed: std::ops::Range<usize>,
    pub version: u64,
}
