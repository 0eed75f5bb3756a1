use std::time::{Duration, Instant};

use crate::document::{Document, EditStep};
use crate::spellcheck::checker::{CheckerError, ErrorSpan};
use crate::spellcheck::dictionary::CustomWords;
use crate::spellcheck::lifecycle::{Debouncer, PendingRequests, RequestId};
use crate::spellcheck::projection::project;
use crate::spellcheck::resolve::{AnnotationSet, ResolvedAnnotation, resolve};

/// Timing knobs of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period after the last edit before a check is issued
    pub debounce: Duration,
    /// How long an issued check may stay unanswered
    pub pending_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            pending_timeout: Duration::from_secs(30),
        }
    }
}

/// Availability of the checker backing an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerStatus {
    Uninitialized,
    Ready,
    Failed(String),
}

/// Text to hand to the checker for one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub id: RequestId,
    pub text: String,
}

/// What happened to a checker result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultDisposition {
    /// The result replaced the annotation set
    Applied { annotations: usize, dropped: usize },
    /// The request was already consumed or evicted; nothing changed
    Stale,
}

/// Spell-check state of one editor session.
///
/// All methods take the current time from the caller and never block. The
/// caller forwards every document edit to [`SpellCheckEngine::on_edit`] and
/// every checker answer to [`SpellCheckEngine::on_result`]; the engine keeps
/// annotations aligned with the document in between.
#[derive(Debug)]
pub struct SpellCheckEngine {
    config: EngineConfig,
    status: CheckerStatus,
    pending: PendingRequests,
    annotations: AnnotationSet,
    debouncer: Debouncer,
    custom_words: CustomWords,
}

impl SpellCheckEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_custom_words(config, CustomWords::new())
    }

    /// Start with a previously saved set of accepted words.
    pub fn with_custom_words(config: EngineConfig, custom_words: CustomWords) -> Self {
        Self {
            config,
            status: CheckerStatus::Uninitialized,
            pending: PendingRequests::new(),
            annotations: AnnotationSet::new(),
            debouncer: Debouncer::new(config.debounce),
            custom_words,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> &CheckerStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == CheckerStatus::Ready
    }

    pub fn checker_ready(&mut self) {
        if self.status != CheckerStatus::Ready {
            log::info!("Spell checker ready");
        }
        self.status = CheckerStatus::Ready;
    }

    /// Mark the checker unusable; the engine shows nothing until it is ready again.
    pub fn checker_failed(&mut self, error: &CheckerError) {
        let message = error.to_string();
        if self.status != CheckerStatus::Failed(message.clone()) {
            log::error!("Spell checker unavailable: {message}");
        }
        self.status = CheckerStatus::Failed(message);
        self.annotations.clear();
        self.pending.clear();
        self.debouncer.cancel();
    }

    /// Project the document and register a new request for it.
    ///
    /// Returns `None` while no checker is ready.
    pub fn issue(&mut self, doc: &Document, now: Instant) -> Option<CheckTicket> {
        if !self.is_ready() {
            log::debug!("Not issuing a check: checker is {:?}", self.status);
            return None;
        }
        self.debouncer.cancel();

        let projection = project(doc);
        let id = self.pending.issue(projection.map, now);
        log::debug!(
            "Issued check {id} over {} chars ({} pending)",
            projection.text.chars().count(),
            self.pending.len()
        );
        Some(CheckTicket {
            id,
            text: projection.text,
        })
    }

    /// Record an edit that was just applied to the document.
    pub fn on_edit(&mut self, step: &EditStep, now: Instant) {
        if step.is_identity() {
            return;
        }
        self.pending.record_edit(step);
        self.annotations.remap(step);
        if self.is_ready() {
            self.debouncer.arm(now);
        }
    }

    /// Expire overdue requests and issue a check if the debounce window elapsed.
    pub fn poll(&mut self, doc: &Document, now: Instant) -> Option<CheckTicket> {
        self.evict_expired(now);
        if self.debouncer.fire(now) {
            self.issue(doc, now)
        } else {
            None
        }
    }

    /// Apply a checker answer if its request is still pending.
    pub fn on_result(&mut self, id: RequestId, spans: &[ErrorSpan], doc_size: usize) -> ResultDisposition {
        let Some(request) = self.pending.take(id) else {
            log::debug!("Dropping stale result for check {id}");
            return ResultDisposition::Stale;
        };

        let custom_words = &self.custom_words;
        let spans: Vec<ErrorSpan> = spans
            .iter()
            .filter(|span| !custom_words.is_excluded(&span.word))
            .cloned()
            .collect();
        let resolved = resolve(&spans, &request.delta, &request.offset_map, doc_size);
        let dropped = spans.len() - resolved.len();
        let annotations = resolved.len();

        log::debug!("Applied check {id}: {annotations} misspellings, {dropped} dropped");
        self.annotations.replace_all(resolved);
        ResultDisposition::Applied {
            annotations,
            dropped,
        }
    }

    /// Forget a request whose check failed; current annotations stay.
    pub fn on_check_failed(&mut self, id: RequestId, error: &CheckerError) {
        if self.pending.take(id).is_some() {
            log::warn!("Check {id} failed: {error}");
        }
    }

    pub fn evict_expired(&mut self, now: Instant) -> Vec<RequestId> {
        let evicted = self.pending.evict_older_than(now, self.config.pending_timeout);
        for id in &evicted {
            log::warn!(
                "Check {id} unanswered after {:?}, giving up on it",
                self.config.pending_timeout
            );
        }
        evicted
    }

    /// Accept a word and re-check right away.
    ///
    /// Existing annotations for the word disappear immediately; the returned
    /// ticket, if any, must be sent to a checker that already knows the word.
    pub fn add_word(&mut self, word: &str, doc: &Document, now: Instant) -> Option<CheckTicket> {
        if self.custom_words.add(word) {
            log::info!("Added '{word}' to custom words");
        }
        let retracted = self.annotations.retract_excluded(&self.custom_words);
        if retracted > 0 {
            log::debug!("Retracted {retracted} annotations for '{word}'");
        }
        self.debouncer.cancel();
        self.issue(doc, now)
    }

    pub fn custom_words(&self) -> &CustomWords {
        &self.custom_words
    }

    pub fn annotations(&self) -> &[ResolvedAnnotation] {
        self.annotations.as_slice()
    }

    /// Annotation under a caret, for context menus.
    pub fn annotation_at(&self, pos: usize) -> Option<&ResolvedAnnotation> {
        self.annotations.at(pos)
    }

    pub fn misspelled_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains(id)
    }

    /// When the next debounced check is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}
