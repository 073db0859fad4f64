// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The interaction state machine
//!
//! [`transition`] takes the current [`Session`] and one [`Event`] and returns
//! the next session plus the [`Effect`]s to perform, in order. It does no
//! I/O; the controller executes the effects.

use crate::intake::{FileIntake, IntakeEvent, SelectedFile};
use crate::pipeline::{
    ClassificationResult, PipelineEffect, RequestStatus, SubmissionPipeline, Ticket,
};
use crate::preview::{PreviewChange, PreviewId, PreviewLifecycle, PreviewResource};
use crate::{Result, SmartScanError};

/// Something the user or the network did
#[derive(Debug)]
pub enum Event {
    /// Files handed over by the drop zone, possibly none
    FilesSelected(Vec<SelectedFile>),
    Clear,
    Retry,
    Completed {
        ticket: Ticket,
        outcome: Result<ClassificationResult>,
    },
}

/// Work the caller must carry out after a transition
#[derive(Debug)]
pub enum Effect {
    PublishPreview(PreviewResource),
    ReleasePreview(PreviewId),
    Submit { ticket: Ticket, file: SelectedFile },
    Cancel(Ticket),
    ReportFailure { ticket: Ticket, error: SmartScanError },
    DiscardStale(Ticket),
}

impl From<PreviewChange> for Effect {
    fn from(change: PreviewChange) -> Self {
        match change {
            PreviewChange::Published(resource) => Self::PublishPreview(resource),
            PreviewChange::Released(id) => Self::ReleasePreview(id),
        }
    }
}

impl From<PipelineEffect> for Effect {
    fn from(effect: PipelineEffect) -> Self {
        match effect {
            PipelineEffect::Submit { ticket, file } => Self::Submit { ticket, file },
            PipelineEffect::Cancel(ticket) => Self::Cancel(ticket),
            PipelineEffect::Report { ticket, error } => Self::ReportFailure { ticket, error },
            PipelineEffect::Discard(ticket) => Self::DiscardStale(ticket),
        }
    }
}

/// Selection, preview and request state for one interaction
#[derive(Debug, Default)]
pub struct Session {
    intake: FileIntake,
    previews: PreviewLifecycle,
    pipeline: SubmissionPipeline,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.intake.selected()
    }

    pub fn preview(&self) -> Option<&PreviewResource> {
        self.previews.current()
    }

    pub fn status(&self) -> RequestStatus {
        self.pipeline.status()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.pipeline.result()
    }

    pub fn pending(&self) -> Option<Ticket> {
        self.pipeline.pending()
    }

    /// False in "no image" mode
    pub fn has_image(&self) -> bool {
        self.intake.selected().is_some()
    }

    /// Effects that release everything the session still holds
    pub fn teardown(mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.previews.teardown().into_iter().map(Effect::from).collect();
        effects.extend(self.pipeline.reset().into_iter().map(Effect::from));
        effects
    }
}

pub fn transition(mut session: Session, event: Event) -> (Session, Vec<Effect>) {
    let mut effects: Vec<Effect> = Vec::new();

    match event {
        Event::FilesSelected(files) => {
            let intake = session.intake.select_files(files);
            apply_intake(&mut session, intake, &mut effects);
        }
        Event::Clear => {
            let intake = session.intake.clear();
            apply_intake(&mut session, intake, &mut effects);
        }
        Event::Retry => {
            effects.extend(session.pipeline.retry().into_iter().map(Effect::from));
        }
        Event::Completed { ticket, outcome } => {
            effects.extend(session.pipeline.complete(ticket, outcome).into_iter().map(Effect::from));
        }
    }

    (session, effects)
}

fn apply_intake(session: &mut Session, intake: IntakeEvent, effects: &mut Vec<Effect>) {
    let changes = session.previews.apply(&intake);
    let published = changes.iter().any(|c| matches!(c, PreviewChange::Published(_)));
    effects.extend(changes.into_iter().map(Effect::from));

    let pipeline = match intake {
        IntakeEvent::Selected(file) if published => session.pipeline.on_preview_published(file),
        IntakeEvent::Selected(_) => Vec::new(),
        IntakeEvent::Cleared => session.pipeline.reset(),
    };
    effects.extend(pipeline.into_iter().map(Effect::from));
}
