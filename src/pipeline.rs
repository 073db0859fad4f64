// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Submission pipeline: one classification request per published preview
//!
//! Every request is stamped with a [`Ticket`]. Only a completion carrying the
//! ticket of the request currently in flight may touch status or result;
//! anything else is discarded, which is what keeps a slow response for an
//! earlier selection from overwriting a newer one.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::intake::SelectedFile;
use crate::{Result, SmartScanError};

/// Identifies one submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the current interaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::InFlight => "in flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A successful classification, stored exactly as the service sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// Fraction in [0, 1]
    pub confidence: f64,
}

/// Side effects requested by the pipeline, in the order they must run
#[derive(Debug)]
pub enum PipelineEffect {
    Submit { ticket: Ticket, file: SelectedFile },
    /// The request is no longer wanted; aborting it is optional
    Cancel(Ticket),
    Report { ticket: Ticket, error: SmartScanError },
    Discard(Ticket),
}

#[derive(Debug, Default)]
pub struct SubmissionPipeline {
    status: RequestStatus,
    result: Option<ClassificationResult>,
    /// Ticket of the request in flight; `Some` exactly when status is InFlight
    pending: Option<Ticket>,
    /// File of the current selection, kept for retry
    file: Option<SelectedFile>,
    next_ticket: u64,
}

impl SubmissionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn pending(&self) -> Option<Ticket> {
        self.pending
    }

    /// A new preview went live: forget the previous cycle and submit `file`
    pub fn on_preview_published(&mut self, file: SelectedFile) -> Vec<PipelineEffect> {
        let mut effects: Vec<_> = self.abandon().into_iter().collect();
        self.result = None;
        self.file = Some(file.clone());
        effects.push(self.submit(file));
        effects
    }

    /// Re-submit the current file after a failure. No-op in any other state.
    pub fn retry(&mut self) -> Vec<PipelineEffect> {
        if self.status != RequestStatus::Failed {
            debug!("Retry ignored while {}", self.status);
            return Vec::new();
        }
        match self.file.clone() {
            Some(file) => vec![self.submit(file)],
            None => Vec::new(),
        }
    }

    /// Apply the outcome of request `ticket`, if it is still the current one
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<ClassificationResult>,
    ) -> Vec<PipelineEffect> {
        if self.pending != Some(ticket) {
            return vec![PipelineEffect::Discard(ticket)];
        }
        self.pending = None;

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.status = RequestStatus::Succeeded;
                Vec::new()
            }
            Err(error) => {
                self.result = None;
                self.status = RequestStatus::Failed;
                vec![PipelineEffect::Report { ticket, error }]
            }
        }
    }

    /// Back to Idle with no result and no interest in any pending request
    pub fn reset(&mut self) -> Vec<PipelineEffect> {
        let effects = self.abandon().into_iter().collect();
        self.status = RequestStatus::Idle;
        self.result = None;
        self.file = None;
        effects
    }

    fn abandon(&mut self) -> Option<PipelineEffect> {
        self.pending.take().map(PipelineEffect::Cancel)
    }

    fn submit(&mut self, file: SelectedFile) -> PipelineEffect {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);
        self.status = RequestStatus::InFlight;
        PipelineEffect::Submit { ticket, file }
    }
}
