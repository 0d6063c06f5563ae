//! Playlist: ordered segments plus their index-aligned resource states

pub mod segment;
pub mod source;

pub use segment::{build, ParseError, Segment};
pub use source::{FsPlaylistSource, PlaylistSource};

use crate::media::{HandleStatus, MediaError, MediaHandle, ResourceLocation};
use crate::playback::ledger::DurationLedger;
use parlo_common::events::{ContentKind, LoadState};
use serde::{Deserialize, Serialize};

/// Identity of a playlist: one content item in one language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaylistKey {
    pub kind: ContentKind,
    pub content_id: String,
    pub language: String,
}

impl PlaylistKey {
    pub fn new(kind: ContentKind, content_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind,
            content_id: content_id.into(),
            language: language.into(),
        }
    }
}

impl std::fmt::Display for PlaylistKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.content_id, self.language)
    }
}

/// Per-segment audio resource
///
/// Mutated only by the resource resolver (load fields) and the playback
/// controller (handle transport).
pub struct ResourceState {
    pub(crate) handle: Option<Box<dyn MediaHandle>>,
    pub(crate) load_state: LoadState,
    pub(crate) attempts: usize,
    pub(crate) location: Option<ResourceLocation>,
    /// Why the fallback chain was exhausted (Failed only)
    pub(crate) failure: Option<MediaError>,
}

impl ResourceState {
    pub fn pending() -> Self {
        Self {
            handle: None,
            load_state: LoadState::Pending,
            attempts: 0,
            location: None,
            failure: None,
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Fallback candidates opened, including the one that succeeded
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn failure(&self) -> Option<&MediaError> {
        self.failure.as_ref()
    }

    /// Location the handle was opened from (Loaded only)
    pub fn location(&self) -> Option<&ResourceLocation> {
        self.location.as_ref()
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.handle.as_ref().and_then(|h| h.duration_seconds())
    }

    pub fn handle(&self) -> Option<&dyn MediaHandle> {
        self.handle.as_deref()
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut (dyn MediaHandle + 'static)> {
        self.handle.as_deref_mut()
    }

    /// Transport status; a segment without a handle is always idle
    pub fn status(&self) -> HandleStatus {
        self.handle
            .as_ref()
            .map(|h| h.status())
            .unwrap_or(HandleStatus::Idle)
    }
}

impl std::fmt::Debug for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceState")
            .field("load_state", &self.load_state)
            .field("attempts", &self.attempts)
            .field("failure", &self.failure)
            .field("location", &self.location)
            .field("status", &self.status())
            .field("duration_seconds", &self.duration_seconds())
            .finish()
    }
}

/// Ordered segments for one (content, language) pair
///
/// Invariant: `segments`, `resources` and the ledger always have the same
/// length.
#[derive(Debug)]
pub struct Playlist {
    key: PlaylistKey,
    segments: Vec<Segment>,
    resources: Vec<ResourceState>,
    ledger: DurationLedger,
}

impl Playlist {
    pub fn new(key: PlaylistKey, segments: Vec<Segment>) -> Self {
        let len = segments.len();
        Self {
            key,
            segments,
            resources: (0..len).map(|_| ResourceState::pending()).collect(),
            ledger: DurationLedger::new(len),
        }
    }

    pub fn key(&self) -> &PlaylistKey {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn resources(&self) -> &[ResourceState] {
        &self.resources
    }

    pub fn resource(&self, index: usize) -> Option<&ResourceState> {
        self.resources.get(index)
    }

    pub(crate) fn resource_mut(&mut self, index: usize) -> Option<&mut ResourceState> {
        self.resources.get_mut(index)
    }

    pub(crate) fn resources_mut(&mut self) -> &mut [ResourceState] {
        &mut self.resources
    }

    pub fn ledger(&self) -> &DurationLedger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut DurationLedger {
        &mut self.ledger
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.ledger.total_seconds()
    }

    pub fn is_failed(&self, index: usize) -> bool {
        self.resources
            .get(index)
            .map_or(false, |r| r.load_state == LoadState::Failed)
    }

    /// All segments reached Loaded or Failed
    pub fn is_settled(&self) -> bool {
        self.resources.iter().all(|r| r.load_state.is_terminal())
    }

    pub fn count_in(&self, state: LoadState) -> usize {
        self.resources.iter().filter(|r| r.load_state == state).count()
    }

    /// Serializable description for API consumers
    pub fn view(&self) -> PlaylistView {
        PlaylistView {
            key: self.key.clone(),
            total_seconds: self.total_duration_seconds(),
            segments: self
                .segments
                .iter()
                .zip(&self.resources)
                .map(|(segment, resource)| SegmentView {
                    segment: segment.clone(),
                    load_state: resource.load_state,
                    attempts: resource.attempts,
                    error: resource.failure.as_ref().map(|e| e.to_string()),
                    duration_seconds: resource.duration_seconds(),
                    location: resource.location.as_ref().map(|l| l.relative_path.clone()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistView {
    #[serde(flatten)]
    pub key: PlaylistKey,
    pub total_seconds: f64,
    pub segments: Vec<SegmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentView {
    #[serde(flatten)]
    pub segment: Segment,
    pub load_state: LoadState,
    pub attempts: usize,
    pub duration_seconds: Option<f64>,
    pub location: Option<String>,
    pub error: Option<String>,
}
