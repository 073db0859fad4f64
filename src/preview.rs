// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Preview lifecycle: one renderable handle per selection, always released

use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::intake::{IntakeEvent, SelectedFile};

/// Identifies one preview allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(u64);

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

/// A locally renderable view of a selected file's bytes
#[derive(Clone, PartialEq, Eq)]
pub struct PreviewResource {
    id: PreviewId,
    mime: String,
    bytes: Arc<[u8]>,
}

impl PreviewResource {
    fn derive(id: PreviewId, file: &SelectedFile) -> Self {
        Self {
            id,
            mime: file.mime().to_string(),
            bytes: file.shared_bytes(),
        }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Inline `data:` URL for renderers that cannot resolve blob handles
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, general_purpose::STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for PreviewResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewResource")
            .field("id", &self.id)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Ordered instructions for whoever owns the actual preview handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewChange {
    Published(PreviewResource),
    Released(PreviewId),
}

/// Tracks the single current preview
#[derive(Debug, Default)]
pub struct PreviewLifecycle {
    current: Option<PreviewResource>,
    next_id: u64,
}

impl PreviewLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to intake. A replacement is published before the old handle is
    /// released, and the old handle is released exactly once.
    pub fn apply(&mut self, event: &IntakeEvent) -> Vec<PreviewChange> {
        match event {
            IntakeEvent::Selected(file) => {
                let id = PreviewId(self.next_id);
                self.next_id += 1;
                let fresh = PreviewResource::derive(id, file);
                let previous = self.current.replace(fresh.clone());

                let mut changes = vec![PreviewChange::Published(fresh)];
                if let Some(previous) = previous {
                    changes.push(PreviewChange::Released(previous.id));
                }
                changes
            }
            IntakeEvent::Cleared => self.teardown().into_iter().collect(),
        }
    }

    /// Drop the current preview, if any
    pub fn teardown(&mut self) -> Option<PreviewChange> {
        self.current.take().map(|p| PreviewChange::Released(p.id))
    }

    pub fn current(&self) -> Option<&PreviewResource> {
        self.current.as_ref()
    }
}

/// Owner of the real, revocable preview handles
pub trait PreviewStore {
    /// Allocate a handle for `resource` and return its URL
    fn publish(&mut self, resource: &PreviewResource) -> String;

    /// Revoke a handle. Returns false if it was not live.
    fn release(&mut self, id: PreviewId) -> bool;

    fn url(&self, id: PreviewId) -> Option<&str>;

    /// Number of handles allocated and not yet released
    fn outstanding(&self) -> usize;
}

/// In-memory store minting `blob:` URLs
#[derive(Debug, Default)]
pub struct BlobStore {
    live: HashMap<PreviewId, String>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewStore for BlobStore {
    fn publish(&mut self, resource: &PreviewResource) -> String {
        let url = format!("blob:smartscan/{}", Uuid::new_v4());
        debug!("Publishing {} as {}", resource.id(), url);
        self.live.insert(resource.id(), url.clone());
        url
    }

    fn release(&mut self, id: PreviewId) -> bool {
        match self.live.remove(&id) {
            Some(url) => {
                debug!("Revoked {} ({})", id, url);
                true
            }
            None => {
                warn!("Release of {} which is not live", id);
                false
            }
        }
    }

    fn url(&self, id: PreviewId) -> Option<&str> {
        self.live.get(&id).map(String::as_str)
    }

    fn outstanding(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(name: &str) -> IntakeEvent {
        IntakeEvent::Selected(SelectedFile::new(name, "image/png", vec![1, 2, 3]))
    }

    fn drive(store: &mut BlobStore, changes: Vec<PreviewChange>) {
        for change in changes {
            match change {
                PreviewChange::Published(p) => {
                    store.publish(&p);
                }
                PreviewChange::Released(id) => {
                    assert!(store.release(id), "double or unknown release of {}", id);
                }
            }
        }
    }

    #[test]
    fn test_publish_before_release() {
        let mut lifecycle = PreviewLifecycle::new();
        let first = lifecycle.apply(&select("a.png"));
        assert!(matches!(first.as_slice(), [PreviewChange::Published(_)]));

        let second = lifecycle.apply(&select("b.png"));
        match second.as_slice() {
            [PreviewChange::Published(p), PreviewChange::Released(old)] => {
                assert_ne!(p.id(), *old);
                assert_eq!(lifecycle.current().map(|c| c.id()), Some(p.id()));
            }
            other => panic!("unexpected changes: {:?}", other),
        }
    }

    #[test]
    fn test_at_most_one_outstanding() {
        let mut lifecycle = PreviewLifecycle::new();
        let mut store = BlobStore::new();
        let events = [
            select("a.png"),
            select("b.png"),
            IntakeEvent::Cleared,
            IntakeEvent::Cleared,
            select("c.png"),
            select("d.png"),
            select("e.png"),
        ];

        for event in &events {
            drive(&mut store, lifecycle.apply(event));
            assert!(store.outstanding() <= 1);
            assert_eq!(store.outstanding(), usize::from(lifecycle.current().is_some()));
        }

        drive(&mut store, lifecycle.teardown().into_iter().collect());
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn test_clear_without_preview_is_noop() {
        let mut lifecycle = PreviewLifecycle::new();
        assert!(lifecycle.apply(&IntakeEvent::Cleared).is_empty());
    }

    #[test]
    fn test_data_url() {
        let mut lifecycle = PreviewLifecycle::new();
        lifecycle.apply(&select("a.png"));
        let url = lifecycle.current().unwrap().data_url();
        assert_eq!(url, "data:image/png;base64,AQID");
    }

    #[test]
    fn test_blob_store_urls() {
        let mut lifecycle = PreviewLifecycle::new();
        let mut store = BlobStore::new();
        lifecycle.apply(&select("a.png"));
        let preview = lifecycle.current().unwrap().clone();

        let url = store.publish(&preview);
        assert!(url.starts_with("blob:smartscan/"));
        assert_eq!(store.url(preview.id()), Some(url.as_str()));
        assert!(store.release(preview.id()));
        assert!(!store.release(preview.id()));
        assert_eq!(store.url(preview.id()), None);
    }
}
