// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Runs the session state machine against real collaborators
//!
//! User actions are applied synchronously. Requests run as tasks on the
//! current runtime and report back through a channel; their completions are
//! fed through [`transition`] like any other event, so the ticket check in the
//! pipeline decides whether they count.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::Classifier;
use crate::intake::SelectedFile;
use crate::pipeline::{ClassificationResult, RequestStatus, Ticket};
use crate::preview::{BlobStore, PreviewStore};
use crate::session::{transition, Effect, Event, Session};
use crate::view::{format_confidence, Mode, ResultView, SessionView};
use crate::Result;

/// A finished request on its way back to the session
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<ClassificationResult>,
}

pub struct Controller<S: PreviewStore = BlobStore> {
    session: Session,
    previews: S,
    classifier: Arc<dyn Classifier>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: HashMap<Ticket, JoinHandle<()>>,
}

impl Controller<BlobStore> {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self::with_store(classifier, BlobStore::new())
    }
}

impl<S: PreviewStore> Controller<S> {
    pub fn with_store(classifier: Arc<dyn Classifier>, previews: S) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            previews,
            classifier,
            completions_tx,
            completions_rx,
            in_flight: HashMap::new(),
        }
    }

    pub fn select_files(&mut self, files: Vec<SelectedFile>) {
        self.dispatch(Event::FilesSelected(files));
    }

    pub fn clear(&mut self) {
        self.dispatch(Event::Clear);
    }

    pub fn retry(&mut self) {
        self.dispatch(Event::Retry);
    }

    /// Apply one event and run the effects it produced, in order
    pub fn dispatch(&mut self, event: Event) {
        let session = std::mem::take(&mut self.session);
        let (session, effects) = transition(session, event);
        self.session = session;
        for effect in effects {
            self.run(effect);
        }
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Ticket> {
        let completion = match self.completions_rx.try_recv() {
            Ok(completion) => completion,
            Err(_) if self.in_flight.is_empty() => return None,
            Err(_) => self.completions_rx.recv().await?,
        };

        let ticket = completion.ticket;
        let current = self.session.pending() == Some(ticket);
        self.in_flight.remove(&ticket);
        self.dispatch(Event::Completed {
            ticket,
            outcome: completion.outcome,
        });

        if current {
            if let Some(result) = self.session.result() {
                info!(
                    "Request {} classified as {} ({})",
                    ticket,
                    result.label,
                    format_confidence(result.confidence)
                );
            }
        }
        Some(ticket)
    }

    /// Process completions until the current request has resolved
    pub async fn settle(&mut self) -> RequestStatus {
        while self.session.status() == RequestStatus::InFlight {
            if self.next_completion().await.is_none() {
                break;
            }
        }
        self.session.status()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn previews(&self) -> &S {
        &self.previews
    }

    pub fn view(&self) -> SessionView {
        let preview_url = self.session
            .preview()
            .and_then(|p| self.previews.url(p.id()))
            .map(String::from);

        SessionView {
            mode: if self.session.has_image() { Mode::Image } else { Mode::NoImage },
            status: self.session.status(),
            preview_url,
            file_name: self.session.selected_file().map(|f| f.name().to_string()),
            result: self.session.result().map(ResultView::from),
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::PublishPreview(resource) => {
                self.previews.publish(&resource);
            }
            Effect::ReleasePreview(id) => {
                self.previews.release(id);
            }
            Effect::Submit { ticket, file } => {
                info!("Submitting {} as request {}", file.name(), ticket);
                let classifier = Arc::clone(&self.classifier);
                let tx = self.completions_tx.clone();
                let handle = tokio::spawn(async move {
                    let outcome = classifier.classify(&file).await;
                    // Receiver gone means the controller was dropped
                    let _ = tx.send(Completion { ticket, outcome });
                });
                self.in_flight.insert(ticket, handle);
            }
            Effect::Cancel(ticket) => {
                if let Some(handle) = self.in_flight.remove(&ticket) {
                    debug!("Aborting request {}", ticket);
                    handle.abort();
                }
            }
            Effect::ReportFailure { ticket, error } => {
                error!(
                    "Request {} failed ({} error): {}",
                    ticket,
                    error.failure_class(),
                    error
                );
            }
            Effect::DiscardStale(ticket) => {
                debug!("Discarding stale response for request {}", ticket);
            }
        }
    }
}

impl<S: PreviewStore> Drop for Controller<S> {
    fn drop(&mut self) {
        let session = std::mem::take(&mut self.session);
        for effect in session.teardown() {
            self.run(effect);
        }
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct Fixed(f64);

    #[async_trait]
    impl Classifier for Fixed {
        async fn classify(&self, _file: &SelectedFile) -> Result<ClassificationResult> {
            Ok(ClassificationResult { label: "Healthy".to_string(), confidence: self.0 })
        }
    }

    /// Never answers until notified
    struct Gated(Arc<Notify>);

    #[async_trait]
    impl Classifier for Gated {
        async fn classify(&self, _file: &SelectedFile) -> Result<ClassificationResult> {
            self.0.notified().await;
            Ok(ClassificationResult { label: "Late_Blight".to_string(), confidence: 0.8734 })
        }
    }

    fn jpeg(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_scenario_through_controller() {
        let mut controller = Controller::new(Arc::new(Fixed(0.95)));
        controller.select_files(vec![jpeg("f1.jpg")]);

        let view = controller.view();
        assert!(view.busy());
        assert_eq!(view.mode, Mode::Image);
        assert!(view.preview_url.as_deref().is_some_and(|u| u.starts_with("blob:")));

        assert_eq!(controller.settle().await, RequestStatus::Succeeded);
        let shown = controller.view().result.map(|r| r.to_string());
        assert_eq!(shown.as_deref(), Some("Healthy, 95.00%"));

        controller.clear();
        let view = controller.view();
        assert_eq!(view.status, RequestStatus::Idle);
        assert_eq!(view.mode, Mode::NoImage);
        assert!(view.preview_url.is_none());
        assert!(view.result.is_none());
        assert_eq!(controller.previews().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_clear_aborts_in_flight() {
        let gate = Arc::new(Notify::new());
        let mut controller = Controller::new(Arc::new(Gated(Arc::clone(&gate))));
        controller.select_files(vec![jpeg("f1.jpg")]);
        controller.clear();
        gate.notify_waiters();

        assert_eq!(controller.next_completion().await, None);
        assert_eq!(controller.session().status(), RequestStatus::Idle);
        assert!(controller.session().result().is_none());
    }

    #[tokio::test]
    async fn test_previews_never_pile_up() {
        let mut controller = Controller::new(Arc::new(Fixed(0.5)));
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            controller.select_files(vec![jpeg(name)]);
            assert_eq!(controller.previews().outstanding(), 1);
        }
        controller.select_files(Vec::new());
        assert_eq!(controller.previews().outstanding(), 0);
    }
}
