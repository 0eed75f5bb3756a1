/*!
 * # Incremental Spell-Check Annotations
 *
 * Checks run asynchronously against a snapshot of the document while the
 * user keeps typing. By the time a result arrives its offsets describe a
 * document that no longer exists, so every piece of state here exists to
 * carry old offsets forward to the current document.
 *
 * ## Pipeline
 *
 * 1. [`projection::project`] flattens the document into plain text plus an
 *    [`OffsetMap`] from text offsets back to document positions.
 * 2. [`SpellCheckEngine::issue`] registers a request under a fresh
 *    [`RequestId`] and hands the text to a [`Checker`].
 * 3. Every edit goes through [`SpellCheckEngine::on_edit`], which appends its
 *    [`EditStep`](crate::document::EditStep) to the [`EditDelta`] of each
 *    pending request and remaps the annotations on screen.
 * 4. [`SpellCheckEngine::on_result`] resolves the checker's spans through the
 *    request's offset map and delta, then swaps in the new annotation set.
 *
 * ## Staleness
 *
 * Correctness rests on one rule: a result is applied only while its request
 * id is pending. Ids are never reused, so late, duplicated or evicted results
 * are dropped without touching anything.
 *
 * ## Example
 *
 * ```rust
 * use std::time::Instant;
 * use tmbedit_engine::document::{Cmd, Document};
 * use tmbedit_engine::spellcheck::{
 *     Checker, CustomWords, EngineConfig, SpellCheckEngine, WordListChecker,
 * };
 *
 * let checker = WordListChecker::from_words(["the", "quick", "fox"], CustomWords::new());
 * let mut engine = SpellCheckEngine::new(EngineConfig::default());
 * engine.checker_ready();
 *
 * let mut doc = Document::from_plain_text("Teh quick fox");
 * let ticket = engine.issue(&doc, Instant::now()).unwrap();
 *
 * // The user types while the check runs
 * let patch = doc.apply(Cmd::InsertText { at: 1, text: "X".to_string() }).unwrap();
 * engine.on_edit(&patch.step, Instant::now());
 *
 * let spans = checker.check(&ticket.text).unwrap();
 * engine.on_result(ticket.id, &spans, doc.size());
 *
 * let teh = &engine.annotations()[0];
 * assert_eq!(doc.text_between(teh.range()), "Teh");
 * ```
 */

pub mod checker;
pub mod delta;
pub mod dictionary;
pub mod engine;
pub mod lifecycle;
pub mod projection;
pub mod resolve;
pub mod session;

pub use checker::{Checker, CheckerError, ErrorSpan, WordListChecker};
pub use delta::EditDelta;
pub use dictionary::{CustomWords, normalize_quotes};
pub use engine::{CheckTicket, CheckerStatus, EngineConfig, ResultDisposition, SpellCheckEngine};
pub use lifecycle::{CheckRequest, Debouncer, PendingRequests, RequestId};
pub use projection::{OffsetMap, OffsetMapEntry, Projection, project};
pub use resolve::{AnnotationSet, ResolvedAnnotation, resolve};
pub use session::{CheckOutcome, SpellCheckSession};
