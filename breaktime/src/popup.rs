//! Keeps at most one popup surface alive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Opaque window identifier handed out by a `WindowHost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Distance from the right edge of the screen.
    pub margin_x: u32,
    /// Distance from the bottom edge of the screen.
    pub margin_y: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 420,
            height: 650,
            margin_x: 20,
            margin_y: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Exists,
    Gone,
}

/// The host windowing system. `closed(handle)` arrives separately, as an event.
pub trait WindowHost {
    fn create_surface(&mut self, config: &SurfaceConfig) -> Result<SurfaceHandle, HostError>;
    fn surface_status(&self, handle: SurfaceHandle) -> SurfaceStatus;
    fn focus_surface(&mut self, handle: SurfaceHandle) -> Result<(), HostError>;
    fn remove_surface(&mut self, handle: SurfaceHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyOpen(SurfaceHandle),
    Created(SurfaceHandle),
}

impl EnsureOutcome {
    pub fn handle(self) -> SurfaceHandle {
        match self {
            Self::AlreadyOpen(h) | Self::Created(h) => h,
        }
    }
}

#[derive(Debug)]
pub struct PopupCoordinator<W: WindowHost> {
    host: W,
    config: SurfaceConfig,
    handle: Option<SurfaceHandle>,
}

impl<W: WindowHost> PopupCoordinator<W> {
    pub fn new(host: W, config: SurfaceConfig) -> Self {
        Self {
            host,
            config,
            handle: None,
        }
    }

    pub fn handle(&self) -> Option<SurfaceHandle> {
        self.handle
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn host(&self) -> &W {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut W {
        &mut self.host
    }

    /// Focuses the tracked surface if the host still has it, otherwise creates a new one.
    pub fn ensure_surface(&mut self) -> Result<EnsureOutcome, HostError> {
        if let Some(handle) = self.handle {
            if self.host.surface_status(handle) == SurfaceStatus::Exists {
                match self.host.focus_surface(handle) {
                    Ok(()) => return Ok(EnsureOutcome::AlreadyOpen(handle)),
                    Err(err) => {
                        tracing::warn!(%handle, error = %err, "focus failed, treating popup as gone");
                    }
                }
            } else {
                tracing::debug!(%handle, "dropping stale popup handle");
            }
            self.handle = None;
        }

        let handle = self.host.create_surface(&self.config)?;
        tracing::info!(%handle, "popup created");
        self.handle = Some(handle);
        Ok(EnsureOutcome::Created(handle))
    }

    /// Returns true when `handle` was the tracked surface.
    pub fn on_closed(&mut self, handle: SurfaceHandle) -> bool {
        if self.handle == Some(handle) {
            self.handle = None;
            true
        } else {
            tracing::debug!(%handle, "ignoring close of untracked popup");
            false
        }
    }

    pub fn remove(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.host.remove_surface(handle);
        }
    }
}
