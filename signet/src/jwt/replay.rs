//! Replay protection for tokens carrying a `jti` claim
//!
//! A token with a JWT ID may be accepted only once. The caller supplies a
//! [`ReplayGuard`] that remembers which identifiers have already been
//! seen; the library itself keeps no global state.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use super::{JwtId, JwtIdRef};

/// Records which JWT IDs have been used
pub trait ReplayGuard {
    /// Whether `jti` has already been used
    fn is_used(&self, jti: &JwtIdRef) -> bool;

    /// Records `jti` as used
    fn mark_used(&self, jti: &JwtIdRef);

    /// Records `jti` as used, returning `false` if it was already used
    ///
    /// Implementations backed by shared storage should override this to
    /// check and record in a single step.
    fn try_claim(&self, jti: &JwtIdRef) -> bool {
        if self.is_used(jti) {
            false
        } else {
            self.mark_used(jti);
            true
        }
    }
}

impl<T> ReplayGuard for &'_ T
where
    T: ReplayGuard + ?Sized,
{
    #[inline]
    fn is_used(&self, jti: &JwtIdRef) -> bool {
        T::is_used(self, jti)
    }

    #[inline]
    fn mark_used(&self, jti: &JwtIdRef) {
        T::mark_used(self, jti)
    }

    #[inline]
    fn try_claim(&self, jti: &JwtIdRef) -> bool {
        T::try_claim(self, jti)
    }
}

impl<T> ReplayGuard for Box<T>
where
    T: ReplayGuard + ?Sized,
{
    #[inline]
    fn is_used(&self, jti: &JwtIdRef) -> bool {
        T::is_used(self, jti)
    }

    #[inline]
    fn mark_used(&self, jti: &JwtIdRef) {
        T::mark_used(self, jti)
    }

    #[inline]
    fn try_claim(&self, jti: &JwtIdRef) -> bool {
        T::try_claim(self, jti)
    }
}

impl<T> ReplayGuard for Arc<T>
where
    T: ReplayGuard + ?Sized,
{
    #[inline]
    fn is_used(&self, jti: &JwtIdRef) -> bool {
        T::is_used(self, jti)
    }

    #[inline]
    fn mark_used(&self, jti: &JwtIdRef) {
        T::mark_used(self, jti)
    }

    #[inline]
    fn try_claim(&self, jti: &JwtIdRef) -> bool {
        T::try_claim(self, jti)
    }
}

/// A replay guard built from a pair of closures
///
/// ```
/// use std::{cell::RefCell, collections::HashSet};
/// use signet::jwt::{replay, JwtId, ReplayGuard};
///
/// let seen = RefCell::new(HashSet::new());
/// let guard = replay::from_fns(
///     |jti| { seen.borrow_mut().insert(jti.to_owned()); },
///     |jti| seen.borrow().contains(jti),
/// );
///
/// let jti = JwtId::new(String::from("a1"));
/// assert!(guard.try_claim(&jti));
/// assert!(!guard.try_claim(&jti));
/// ```
pub struct FnReplayGuard<M, U> {
    mark_used: M,
    is_used: U,
}

/// Builds a replay guard from a recording closure and a lookup closure
pub fn from_fns<M, U>(mark_used: M, is_used: U) -> FnReplayGuard<M, U>
where
    M: Fn(&JwtIdRef),
    U: Fn(&JwtIdRef) -> bool,
{
    FnReplayGuard { mark_used, is_used }
}

impl<M, U> fmt::Debug for FnReplayGuard<M, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FnReplayGuard").finish_non_exhaustive()
    }
}

impl<M, U> ReplayGuard for FnReplayGuard<M, U>
where
    M: Fn(&JwtIdRef),
    U: Fn(&JwtIdRef) -> bool,
{
    fn is_used(&self, jti: &JwtIdRef) -> bool {
        (self.is_used)(jti)
    }

    fn mark_used(&self, jti: &JwtIdRef) {
        (self.mark_used)(jti)
    }
}

/// A process-local replay guard
///
/// Identifiers are remembered for the lifetime of the guard.
#[derive(Debug, Default)]
pub struct InMemoryReplayGuard {
    seen: Mutex<HashSet<JwtId>>,
}

impl InMemoryReplayGuard {
    /// An empty guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of identifiers recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen().len()
    }

    /// Whether no identifiers have been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen().is_empty()
    }

    fn seen(&self) -> std::sync::MutexGuard<'_, HashSet<JwtId>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReplayGuard for InMemoryReplayGuard {
    fn is_used(&self, jti: &JwtIdRef) -> bool {
        self.seen().contains(jti)
    }

    fn mark_used(&self, jti: &JwtIdRef) {
        self.seen().insert(jti.to_owned());
    }

    fn try_claim(&self, jti: &JwtIdRef) -> bool {
        self.seen().insert(jti.to_owned())
    }
}
