pub mod document;
pub mod spellcheck;

// Re-export key types for easier usage
pub use document::{Cmd, Document, EditStep, Patch};
pub use spellcheck::{
    Checker, CheckerError, EngineConfig, ResolvedAnnotation, SpellCheckEngine, SpellCheckSession,
};
