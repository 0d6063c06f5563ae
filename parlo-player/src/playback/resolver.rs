//! Resource resolver: segment index → playable handle
//!
//! Candidates come from one fallback table rendered through the configured
//! location template. Each failure advances `attempts`; when the table is
//! exhausted the segment is `Failed` for good and resolution yields `None`
//! instead of an error.
//!
//! Canonical fallback order:
//! 1. primary format, playlist language
//! 2. secondary format, playlist language
//! 3. primary format, fallback language
//! 4. secondary format, fallback language

use crate::error::Error;
use crate::media::{MediaBackend, MediaError, MediaHandle, ResourceLocation};
use crate::playlist::{Playlist, PlaylistKey};
use futures::stream::{self, StreamExt};
use parlo_common::config::MediaConfig;
use parlo_common::events::LoadState;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageChoice {
    Playlist,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackStep {
    pub format: FormatChoice,
    pub language: LanguageChoice,
}

pub const FALLBACK_TABLE: [FallbackStep; 4] = [
    FallbackStep {
        format: FormatChoice::Primary,
        language: LanguageChoice::Playlist,
    },
    FallbackStep {
        format: FormatChoice::Secondary,
        language: LanguageChoice::Playlist,
    },
    FallbackStep {
        format: FormatChoice::Primary,
        language: LanguageChoice::Fallback,
    },
    FallbackStep {
        format: FormatChoice::Secondary,
        language: LanguageChoice::Fallback,
    },
];

/// Upper bound on open attempts per segment
pub const MAX_ATTEMPTS: usize = FALLBACK_TABLE.len();

/// Renders resource locations from the media config
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    media: MediaConfig,
}

impl ResourceLocator {
    pub fn new(media: MediaConfig) -> Self {
        Self { media }
    }

    pub fn render(&self, key: &PlaylistKey, index: usize, step: FallbackStep) -> ResourceLocation {
        let format = match step.format {
            FormatChoice::Primary => &self.media.primary_format,
            FormatChoice::Secondary => &self.media.secondary_format,
        };
        let language = match step.language {
            LanguageChoice::Playlist => &key.language,
            LanguageChoice::Fallback => &self.media.fallback_language,
        };

        let relative_path = self
            .media
            .location_template
            .replace("{kind}", key.kind.dir_name())
            .replace("{content}", &key.content_id)
            .replace("{lang}", language)
            .replace("{index}", &format!("{:03}", index))
            .replace("{ext}", format);

        ResourceLocation {
            relative_path,
            format: format.clone(),
            language: language.clone(),
        }
    }

    /// Distinct candidates in fallback order
    ///
    /// Steps that render to an already-listed location (playlist language equal
    /// to the fallback language, or equal formats) are dropped.
    pub fn candidates(&self, key: &PlaylistKey, index: usize) -> Vec<ResourceLocation> {
        let mut out: Vec<ResourceLocation> = Vec::with_capacity(MAX_ATTEMPTS);
        for step in FALLBACK_TABLE {
            let location = self.render(key, index, step);
            if !out.contains(&location) {
                out.push(location);
            }
        }
        out
    }
}

/// Result of walking the fallback chain for one segment
pub struct Resolution {
    pub index: usize,
    /// Candidates tried, including the successful one
    pub attempts: usize,
    pub outcome: Result<(ResourceLocation, Box<dyn MediaHandle>), MediaError>,
}

pub struct ResourceResolver {
    backend: Arc<dyn MediaBackend>,
    locator: ResourceLocator,
    concurrency: usize,
}

impl ResourceResolver {
    pub fn new(backend: Arc<dyn MediaBackend>, media: MediaConfig) -> Self {
        let concurrency = media.preload_concurrency.max(1);
        Self {
            backend,
            locator: ResourceLocator::new(media),
            concurrency,
        }
    }

    /// Walk the fallback chain for one segment without touching any state
    pub async fn resolve_segment(&self, key: &PlaylistKey, index: usize) -> Resolution {
        let candidates = self.locator.candidates(key, index);
        let attempts = candidates.len();
        let mut last_error =
            MediaError::NotFound(format!("no candidate locations for segment {}", index));

        for (attempt, location) in candidates.into_iter().enumerate() {
            match self.backend.open(&location, index).await {
                Ok(handle) => {
                    debug!(
                        "Segment {} resolved on attempt {}: {}",
                        index,
                        attempt + 1,
                        location.relative_path
                    );
                    return Resolution {
                        index,
                        attempts: attempt + 1,
                        outcome: Ok((location, handle)),
                    };
                }
                Err(e) => {
                    debug!(
                        "Segment {} attempt {} failed ({}): {}",
                        index,
                        attempt + 1,
                        location.relative_path,
                        e
                    );
                    last_error = e;
                }
            }
        }

        let exhausted = MediaError::Exhausted {
            attempts,
            last: Box::new(last_error),
        };
        warn!(
            "{}",
            Error::ResourceLoad {
                index,
                source: exhausted.clone(),
            }
        );

        Resolution {
            index,
            attempts,
            outcome: Err(exhausted),
        }
    }

    /// Resolve one segment of `playlist` in place
    ///
    /// A `Loaded` segment returns its existing handle; a `Failed` one returns
    /// `None` without another attempt.
    pub async fn resolve<'p>(
        &self,
        playlist: &'p mut Playlist,
        index: usize,
    ) -> Option<&'p mut (dyn MediaHandle + 'static)> {
        let state = playlist.resource(index)?.load_state();
        if state == LoadState::Pending {
            let key = playlist.key().clone();
            let resolution = self.resolve_segment(&key, index).await;
            apply(playlist, resolution);
        }
        playlist.resource_mut(index)?.handle_mut()
    }

    /// Resolve every pending segment
    ///
    /// Segments load independently, up to the configured concurrency. Each
    /// completion is applied to the playlist and reported as
    /// `(settled, total)`. Returns once every segment is Loaded or Failed.
    pub async fn preload<F>(&self, playlist: &mut Playlist, mut progress: F)
    where
        F: FnMut(usize, usize),
    {
        let total = playlist.len();
        let key = playlist.key().clone();
        let pending: Vec<usize> = playlist
            .resources()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.load_state() == LoadState::Pending)
            .map(|(i, _)| i)
            .collect();

        info!("Preloading {} of {} segments for {}", pending.len(), total, key);

        let mut settled = total - pending.len();
        let key_ref = &key;
        let mut resolutions = stream::iter(pending)
            .map(|index| self.resolve_segment(key_ref, index))
            .buffer_unordered(self.concurrency);

        while let Some(resolution) = resolutions.next().await {
            apply(playlist, resolution);
            settled += 1;
            progress(settled, total);
        }

        info!(
            "Preload settled for {}: {} loaded, {} failed, {:.3}s total",
            key,
            playlist.count_in(LoadState::Loaded),
            playlist.count_in(LoadState::Failed),
            playlist.total_duration_seconds()
        );
    }
}

/// Write a resolution into the playlist's resource state and ledger
fn apply(playlist: &mut Playlist, resolution: Resolution) {
    let index = resolution.index;
    let Some(resource) = playlist.resource_mut(index) else {
        return;
    };

    resource.attempts = resolution.attempts;
    match resolution.outcome {
        Ok((location, handle)) => {
            let duration = handle.duration_seconds();
            resource.handle = Some(handle);
            resource.location = Some(location);
            resource.failure = None;
            resource.load_state = LoadState::Loaded;
            match duration {
                Some(seconds) => playlist.ledger_mut().record_duration(index, seconds),
                None => playlist.ledger_mut().clear_duration(index),
            }
        }
        Err(error) => {
            resource.handle = None;
            resource.location = None;
            resource.failure = Some(error);
            resource.load_state = LoadState::Failed;
            playlist.ledger_mut().clear_duration(index);
        }
    }
}
