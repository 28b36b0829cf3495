//! Destinations for diagnostics produced while decoding.
//!
//! Decoding reports through a shared [`DiagnosticSink`] instead of returning
//! diagnostics, so that one sink can gather the problems of many blocks
//! decoded concurrently.

use crate::diagnostic::{DiagnosticKind, DiagnosticMessage};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Receives errors and warnings.
///
/// Implementations must accept reports from several threads at once and
/// should not block for long.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: DiagnosticMessage);

    /// Report `diagnostic` as an error, whatever kind it was built with.
    fn error(&self, diagnostic: DiagnosticMessage) {
        self.report(diagnostic.with_kind(DiagnosticKind::Error));
    }

    /// Report `diagnostic` as a warning.
    fn warning(&self, diagnostic: DiagnosticMessage) {
        self.report(diagnostic.with_kind(DiagnosticKind::Warning));
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn report(&self, diagnostic: DiagnosticMessage) {
        (**self).report(diagnostic);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A sink that keeps every diagnostic in memory.
///
/// # Example
///
/// ```rust
/// use apidoc_error_reporting::{DiagnosticCollector, DiagnosticMessage, DiagnosticSink};
///
/// let sink = DiagnosticCollector::new();
/// sink.warning(DiagnosticMessage::error("Unknown element"));
/// assert!(!sink.has_errors());
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Mutex<Vec<DiagnosticMessage>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything collected so far, in report order.
    pub fn diagnostics(&self) -> Vec<DiagnosticMessage> {
        lock(&self.diagnostics).clone()
    }

    /// Take all collected diagnostics, leaving the collector empty.
    pub fn take_diagnostics(&self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut *lock(&self.diagnostics))
    }

    pub fn len(&self) -> usize {
        lock(&self.diagnostics).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.diagnostics).is_empty()
    }

    /// Check if any errors (not warnings) have been collected.
    pub fn has_errors(&self) -> bool {
        lock(&self.diagnostics).iter().any(DiagnosticMessage::is_error)
    }

    pub fn errors(&self) -> Vec<DiagnosticMessage> {
        self.of_kind(DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> Vec<DiagnosticMessage> {
        self.of_kind(DiagnosticKind::Warning)
    }

    fn of_kind(&self, kind: DiagnosticKind) -> Vec<DiagnosticMessage> {
        lock(&self.diagnostics)
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, diagnostic: DiagnosticMessage) {
        lock(&self.diagnostics).push(diagnostic);
    }
}

/// Category of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Error,
    Warning,
    Info,
    Success,
}

/// One entry handed to a [`MessageHandler`] callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    /// The structured diagnostic, for messages that came from one
    pub diagnostic: Option<DiagnosticMessage>,
}

/// Number of messages that may wait in the queue before senders block.
pub const MESSAGE_QUEUE_CAPACITY: usize = 100;

/// Asynchronous sink: a bounded queue drained by one consumer thread.
///
/// Every message is passed to the handler function in the order it was
/// queued. [`MessageHandler::stop`] returns once everything queued before
/// it has been handled.
pub struct MessageHandler {
    sender: Mutex<Option<SyncSender<Message>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MessageHandler {
    pub fn new<F>(mut handler: F) -> Self
    where
        F: FnMut(Message) + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<Message>(MESSAGE_QUEUE_CAPACITY);
        let worker = thread::spawn(move || {
            for message in receiver {
                handler(message);
            }
        });

        MessageHandler {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a plain text message.
    pub fn message(&self, kind: MessageKind, text: impl Into<String>) {
        self.send(Message {
            kind,
            text: text.into(),
            diagnostic: None,
        });
    }

    /// Close the queue and wait for the consumer to finish.
    ///
    /// Messages sent after `stop` are dropped. Calling it twice is harmless.
    pub fn stop(&self) {
        lock(&self.sender).take();
        if let Some(worker) = lock(&self.worker).take() {
            if worker.join().is_err() {
                tracing::debug!("message handler callback panicked");
            }
        }
    }

    fn send(&self, message: Message) {
        // Clone out of the lock so a full queue only blocks this sender.
        let sender = lock(&self.sender).clone();
        match sender {
            Some(sender) => {
                if sender.send(message).is_err() {
                    tracing::debug!("message handler consumer is gone, message dropped");
                }
            }
            None => tracing::debug!(text = %message.text, "message handler stopped, message dropped"),
        }
    }
}

impl DiagnosticSink for MessageHandler {
    fn report(&self, diagnostic: DiagnosticMessage) {
        let kind = match diagnostic.kind {
            DiagnosticKind::Error => MessageKind::Error,
            DiagnosticKind::Warning => MessageKind::Warning,
            DiagnosticKind::Info | DiagnosticKind::Note => MessageKind::Info,
        };
        self.send(Message {
            kind,
            text: diagnostic.to_text(None),
            diagnostic: Some(diagnostic),
        });
    }
}

impl Drop for MessageHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandler")
            .field("running", &lock(&self.sender).is_some())
            .finish()
    }
}
