use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::document::{Document, EditStep};
use crate::spellcheck::checker::{Checker, CheckerError, ErrorSpan};
use crate::spellcheck::dictionary::CustomWords;
use crate::spellcheck::engine::{CheckTicket, EngineConfig, ResultDisposition, SpellCheckEngine};
use crate::spellcheck::lifecycle::RequestId;

/// A finished checker call, sent back from a blocking worker.
#[derive(Debug)]
pub struct CheckOutcome {
    pub id: RequestId,
    pub result: Result<Vec<ErrorSpan>, CheckerError>,
}

/// Drives a [`SpellCheckEngine`] against a checker on tokio's blocking pool.
///
/// Checks run off the control thread; their outcomes queue on a channel and
/// are only applied when the owner drains it, so every edit made while a
/// check was running has already reached the engine by then.
pub struct SpellCheckSession<C: Checker + 'static> {
    engine: SpellCheckEngine,
    checker: Option<Arc<C>>,
    runtime: Handle,
    completed_tx: mpsc::UnboundedSender<CheckOutcome>,
    completed_rx: mpsc::UnboundedReceiver<CheckOutcome>,
    in_flight: usize,
}

impl<C: Checker + 'static> std::fmt::Debug for SpellCheckSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellCheckSession")
            .field("status", self.engine.status())
            .field("pending", &self.engine.pending_count())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl<C: Checker + 'static> SpellCheckSession<C> {
    pub fn new(config: EngineConfig, runtime: Handle) -> Self {
        Self::with_custom_words(config, CustomWords::new(), runtime)
    }

    pub fn with_custom_words(config: EngineConfig, custom_words: CustomWords, runtime: Handle) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            engine: SpellCheckEngine::with_custom_words(config, custom_words),
            checker: None,
            runtime,
            completed_tx,
            completed_rx,
            in_flight: 0,
        }
    }

    /// Hand over the outcome of checker initialization.
    ///
    /// A failure leaves the session running with spell checking disabled.
    pub fn init(&mut self, checker: Result<C, CheckerError>) {
        match checker {
            Ok(checker) => {
                self.checker = Some(Arc::new(checker));
                self.engine.checker_ready();
            }
            Err(e) => {
                self.checker = None;
                self.engine.checker_failed(&e);
            }
        }
    }

    pub fn engine(&self) -> &SpellCheckEngine {
        &self.engine
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn on_edit(&mut self, step: &EditStep, now: Instant) {
        self.engine.on_edit(step, now);
    }

    /// Check the document right away, skipping the debounce window.
    pub fn check_now(&mut self, doc: &Document, now: Instant) -> Option<RequestId> {
        let ticket = self.engine.issue(doc, now)?;
        self.dispatch(ticket)
    }

    /// Start a check if the debounce window elapsed.
    pub fn poll(&mut self, doc: &Document, now: Instant) -> Option<RequestId> {
        let ticket = self.engine.poll(doc, now)?;
        self.dispatch(ticket)
    }

    /// Accept a word in both the engine and the checker, then re-check.
    pub fn add_word(&mut self, word: &str, doc: &Document, now: Instant) -> Option<RequestId> {
        if let Some(checker) = &self.checker {
            checker.add_word(word);
        }
        let ticket = self.engine.add_word(word, doc, now)?;
        self.dispatch(ticket)
    }

    /// Apply every outcome that has already arrived.
    pub fn drain_completed(&mut self, doc: &Document) -> Vec<(RequestId, Option<ResultDisposition>)> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.completed_rx.try_recv() {
            let id = outcome.id;
            applied.push((id, self.apply(outcome, doc)));
        }
        applied
    }

    /// Wait for the next outcome and apply it.
    ///
    /// Returns `None` straight away when no check is running.
    pub async fn next_completed(&mut self, doc: &Document) -> Option<(RequestId, Option<ResultDisposition>)> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.completed_rx.recv().await?;
        let id = outcome.id;
        Some((id, self.apply(outcome, doc)))
    }

    /// Replacement candidates for a word, best first.
    ///
    /// Lookup failures are logged and yield no suggestions.
    pub async fn suggestions(&self, word: &str) -> Vec<String> {
        let Some(checker) = self.checker.clone() else {
            return Vec::new();
        };
        let word = word.to_string();
        let lookup = self.runtime.spawn_blocking(move || checker.suggest(&word));
        match lookup.await {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                log::warn!("Suggestion lookup failed: {e}");
                Vec::new()
            }
            Err(e) => {
                log::warn!("Suggestion worker did not finish: {e}");
                Vec::new()
            }
        }
    }

    fn apply(&mut self, outcome: CheckOutcome, doc: &Document) -> Option<ResultDisposition> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome.result {
            Ok(spans) => Some(self.engine.on_result(outcome.id, &spans, doc.size())),
            Err(e) => {
                self.engine.on_check_failed(outcome.id, &e);
                None
            }
        }
    }

    fn dispatch(&mut self, ticket: CheckTicket) -> Option<RequestId> {
        let CheckTicket { id, text } = ticket;
        let Some(checker) = self.checker.clone() else {
            self.engine.on_check_failed(id, &CheckerError::NotInitialized);
            return None;
        };

        let completed_tx = self.completed_tx.clone();
        self.runtime.spawn_blocking(move || {
            let result = checker.check(&text);
            // The receiver only goes away with the session
            let _ = completed_tx.send(CheckOutcome { id, result });
        });
        self.in_flight += 1;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Cmd;
    use crate::spellcheck::checker::WordListChecker;
    use pretty_assertions::assert_eq;

    fn session() -> SpellCheckSession<WordListChecker> {
        let mut session = SpellCheckSession::new(EngineConfig::default(), Handle::current());
        session.init(Ok(WordListChecker::from_words(
            ["the", "quick", "fox", "and"],
            CustomWords::new(),
        )));
        session
    }

    #[tokio::test]
    async fn test_check_round_trip() {
        let doc = Document::from_plain_text("Teh quick fox");
        let mut session = session();

        let id = session.check_now(&doc, Instant::now()).unwrap();
        let (done, disposition) = session.next_completed(&doc).await.unwrap();

        assert_eq!(done, id);
        assert_eq!(
            disposition,
            Some(ResultDisposition::Applied {
                annotations: 1,
                dropped: 0
            })
        );
        assert_eq!(session.engine().annotations()[0].range(), 1..4);
        assert!(session.next_completed(&doc).await.is_none());
    }

    #[tokio::test]
    async fn test_edits_during_check_are_applied_first() {
        let mut doc = Document::from_plain_text("Teh quick fox");
        let mut session = session();
        let now = Instant::now();

        session.check_now(&doc, now).unwrap();
        let patch = doc
            .apply(Cmd::InsertText {
                at: 1,
                text: "X".to_string(),
            })
            .unwrap();
        session.on_edit(&patch.step, now);

        session.next_completed(&doc).await.unwrap();

        let annotation = &session.engine().annotations()[0];
        assert_eq!(annotation.range(), 2..5);
        assert_eq!(doc.text_between(annotation.range()), "Teh");
    }

    #[tokio::test]
    async fn test_failed_init_disables_checking() {
        let doc = Document::from_plain_text("Teh");
        let mut session: SpellCheckSession<WordListChecker> =
            SpellCheckSession::new(EngineConfig::default(), Handle::current());
        session.init(Err(CheckerError::DictionaryNotFound("/nowhere/en_US.dic".into())));

        assert_eq!(session.check_now(&doc, Instant::now()), None);
        assert!(session.suggestions("teh").await.is_empty());
        assert!(session.engine().annotations().is_empty());
    }

    #[tokio::test]
    async fn test_add_word_reaches_checker() {
        let doc = Document::from_plain_text("Kevin and kevin");
        let mut session = session();

        session.add_word("Kevin", &doc, Instant::now()).unwrap();
        session.next_completed(&doc).await.unwrap();

        let words: Vec<_> = session.engine().annotations().iter().map(|a| a.word.as_str()).collect();
        assert_eq!(words, vec!["kevin"]);
    }

    #[tokio::test]
    async fn test_drain_applies_arrived_outcomes() {
        let doc = Document::from_plain_text("Teh quick fox");
        let mut session = session();
        let now = Instant::now();

        let first = session.check_now(&doc, now).unwrap();
        let second = session.check_now(&doc, now).unwrap();
        assert_eq!(session.in_flight(), 2);

        let mut drained = Vec::new();
        while drained.len() < 2 {
            drained.extend(session.drain_completed(&doc).into_iter().map(|(id, _)| id));
            tokio::task::yield_now().await;
        }
        drained.sort();

        assert_eq!(drained, vec![first, second]);
        assert_eq!(session.in_flight(), 0);
        assert_eq!(session.engine().pending_count(), 0);
        assert_eq!(session.engine().misspelled_count(), 1);
    }

    #[tokio::test]
    async fn test_suggestions_run_on_blocking_pool() {
        let session = session();
        assert_eq!(session.suggestions("teh").await, vec!["the".to_string()]);
    }
}
