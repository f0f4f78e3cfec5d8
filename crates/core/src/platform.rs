//! Hooks into the host platform.
//!
//! The engine never talks to a camera, a microphone or a UI toolkit. The
//! host hands it opaque handles instead:
//!
//! - [`PlatformContext`]: source of a [`Preferences`] store. Forwarded to the
//!   AAC and H.264 tracks, which cache codec probing results in it.
//! - [`SurfaceHandle`]: the preview surface a video track renders into.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Host platform hook supplied to the [`SessionBuilder`](crate::SessionBuilder).
pub trait PlatformContext: Send + Sync {
    /// Preferences store derived from this context.
    fn preferences(&self) -> Preferences;
}

/// Shared string key/value store handed to codec tracks.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct Preferences {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        tracing::trace!(key, %value, "preference stored");
        self.entries.write().insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("entries", &self.len())
            .finish()
    }
}

/// A [`PlatformContext`] backed by an in-process [`Preferences`] store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContext {
    preferences: Preferences,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformContext for InMemoryContext {
    fn preferences(&self) -> Preferences {
        self.preferences.clone()
    }
}

/// Opaque handle to a host preview surface.
///
/// The engine only stores and forwards it; the host recovers its concrete
/// type through [`downcast_ref`](Self::downcast_ref).
#[derive(Clone)]
pub struct SurfaceHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl SurfaceHandle {
    pub fn new<T: Any + Send + Sync>(surface: T) -> Self {
        Self {
            inner: Arc::new(surface),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether two handles refer to the same surface.
    pub fn same_surface(&self, other: &SurfaceHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_are_shared_between_clones() {
        let ctx = InMemoryContext::new();
        let a = ctx.preferences();
        let b = ctx.preferences();
        a.put("aac-44100", "44100");
        assert_eq!(b.get("aac-44100").as_deref(), Some("44100"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn surface_downcast() {
        let surface = SurfaceHandle::new(42u32);
        assert_eq!(surface.downcast_ref::<u32>(), Some(&42));
        assert!(surface.downcast_ref::<String>().is_none());
        assert!(surface.same_surface(&surface.clone()));
        assert!(!surface.same_surface(&SurfaceHandle::new(42u32)));
    }
}
