//! Motion permission precondition
//!
//! Some platforms require an explicit user consent prompt before motion data
//! flows; others grant access implicitly. This is checked by the caller before
//! enabling a listener and is never consulted by the detector itself.

use crate::error::ShakeError;
use serde::{Deserialize, Serialize};

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Platform grants motion access without a prompt
    NotRequired,
}

impl PermissionState {
    pub fn allows_access(&self) -> bool {
        !matches!(self, PermissionState::Denied)
    }
}

/// Platform hook for requesting motion-sensor access
pub trait MotionPermission {
    fn request(&self) -> PermissionState;
}

/// Platforms with ambient motion access
#[derive(Debug, Default, Clone, Copy)]
pub struct AmbientPermission;

impl MotionPermission for AmbientPermission {
    fn request(&self) -> PermissionState {
        PermissionState::NotRequired
    }
}

/// A permission answer decided up front (host-cached consent, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub PermissionState);

impl MotionPermission for FixedPermission {
    fn request(&self) -> PermissionState {
        self.0
    }
}

/// Request permission and fail with `PermissionDenied` unless access is allowed
pub fn ensure_permission(permission: &dyn MotionPermission) -> Result<PermissionState, ShakeError> {
    let state = permission.request();
    if state.allows_access() {
        Ok(state)
    } else {
        log::warn!("Motion sensor permission denied");
        Err(ShakeError::PermissionDenied)
    }
}
