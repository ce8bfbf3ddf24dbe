//! Published recognition state and change notification.
//!
//! `StateStore` owns what a front end shows: the extracted text, the user's
//! edited copy, the confidence score and whether a recognition is running.
//! Every change is broadcast as a [`StateEvent`] in the order it is applied.

use crate::error::OcrError;
use crate::reducer::RecognitionResult;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishedState {
    pub extracted_text: String,
    pub edited_text: String,
    pub confidence: f32,
    pub is_processing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    ProcessingStarted,
    ResultPublished(RecognitionResult),
    /// Carries the error's display text
    RecognitionFailed(String),
    TextEdited(String),
}

pub struct StateStore {
    state: Mutex<PublishedState>,
    events: broadcast::Sender<StateEvent>,
}

impl StateStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(PublishedState::default()),
            events,
        }
    }

    pub fn snapshot(&self) -> PublishedState {
        self.lock().clone()
    }

    /// Receive every event applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Mark a recognition as running.
    ///
    /// Returns `None` if one is already in flight. The returned guard must be
    /// finished with [`ProcessingGuard::publish`] or [`ProcessingGuard::fail`];
    /// dropping it early clears the flag as a failure.
    pub fn begin_processing(&self) -> Option<ProcessingGuard<'_>> {
        let mut state = self.lock();
        if state.is_processing {
            return None;
        }
        state.is_processing = true;
        self.emit(StateEvent::ProcessingStarted);
        Some(ProcessingGuard {
            store: self,
            finished: false,
        })
    }

    /// Replace the edited copy of the text; the extracted text is kept.
    pub fn edit_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.lock();
        state.edited_text = text.clone();
        self.emit(StateEvent::TextEdited(text));
    }

    fn lock(&self) -> MutexGuard<'_, PublishedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Called with the state lock held so events go out in application order.
    fn emit(&self, event: StateEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that this caller owns the running recognition.
pub struct ProcessingGuard<'a> {
    store: &'a StateStore,
    finished: bool,
}

impl ProcessingGuard<'_> {
    /// Replace the published result and clear the processing flag.
    pub fn publish(mut self, result: &RecognitionResult) {
        let mut state = self.store.lock();
        state.extracted_text = result.combined_text.clone();
        state.edited_text = result.combined_text.clone();
        state.confidence = result.average_confidence;
        state.is_processing = false;
        self.store.emit(StateEvent::ResultPublished(result.clone()));
        self.finished = true;
    }

    /// Clear the processing flag, leaving the previous result in place.
    pub fn fail(mut self, error: &OcrError) {
        self.finish_with_failure(error.to_string());
    }

    fn finish_with_failure(&mut self, message: String) {
        let mut state = self.store.lock();
        state.is_processing = false;
        self.store.emit(StateEvent::RecognitionFailed(message));
        self.finished = true;
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Recognition abandoned before completion");
            self.finish_with_failure("recognition abandoned".to_string());
        }
    }
}
