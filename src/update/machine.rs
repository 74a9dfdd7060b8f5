// ABOUTME: Generic update struct parameterized by state marker.
// ABOUTME: Owns the run's configuration, versions, and scratch layout.

use crate::config::Config;
use crate::layout::TempLayout;
use crate::oracle::{InstalledVersion, UpdateCandidate};
use crate::types::VersionTag;

use super::state::Planned;

/// An update in progress, parameterized by its current state.
///
/// Transitions consume the value, so a step can only run after the one
/// before it succeeded, and rollback is only reachable once a snapshot exists.
#[derive(Debug)]
pub struct Update<S> {
    pub(crate) config: Config,
    pub(crate) layout: TempLayout,
    pub(crate) current: InstalledVersion,
    pub(crate) candidate: UpdateCandidate,
    pub(crate) state: S,
}

impl Update<Planned> {
    /// Start an update from `current` to `candidate`.
    pub fn new(config: Config, current: InstalledVersion, candidate: UpdateCandidate) -> Self {
        let layout = TempLayout::new(config.temp_location.clone());
        Update {
            config,
            layout,
            current,
            candidate,
            state: Planned,
        }
    }
}

impl<S> Update<S> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &TempLayout {
        &self.layout
    }

    /// Installed version before this update (None on first install).
    pub fn from_version(&self) -> Option<&VersionTag> {
        self.current.tag()
    }

    pub fn to_version(&self) -> &VersionTag {
        &self.candidate.version
    }

    pub fn candidate(&self) -> &UpdateCandidate {
        &self.candidate
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}
