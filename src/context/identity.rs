//! # Identity context: an immutable, append-only overlay.
//!
//! Values are stored in `Arc<str>` so cloning a [`Context`] (which happens on every spawn
//! and every channel send) is a handful of reference-count bumps.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Routine name reported when no routine has been assigned.
pub const NO_NAME_ROUTINE: &str = "noname";

/// Routine name assigned by [`Context::root`].
pub const ROOT_ROUTINE: &str = "root";

/// One user-supplied key-value, linked to the overlay it was derived from.
#[derive(Debug)]
struct Overlay {
    key: Arc<str>,
    value: Arc<str>,
    next: Option<Arc<Overlay>>,
}

/// Identity and lineage of the routine currently executing.
///
/// ### Defaults
/// - [`routine`](Self::routine): `"noname"`
/// - [`parent_routine`](Self::parent_routine): `""`
/// - [`sender`](Self::sender): `""`
///
/// ### Example
/// ```
/// use funcy::Context;
///
/// let root = Context::root();
/// let child = root.derive_child("worker");
///
/// assert_eq!(child.routine(), "worker");
/// assert_eq!(child.parent_routine(), "root");
/// assert_eq!(root.routine(), "root"); // ancestors are untouched
/// ```
#[derive(Clone, Default)]
pub struct Context {
    routine: Option<Arc<str>>,
    parent: Option<Arc<str>>,
    sender: Option<Arc<str>>,
    values: Option<Arc<Overlay>>,
    token: CancellationToken,
}

impl Context {
    /// Creates an empty context with a fresh cancellation token.
    ///
    /// Its routine reads as [`NO_NAME_ROUTINE`].
    pub fn background() -> Self {
        Self::default()
    }

    /// Creates a context whose routine is [`ROOT_ROUTINE`].
    pub fn root() -> Self {
        Self {
            routine: Some(Arc::from(ROOT_ROUTINE)),
            ..Self::default()
        }
    }

    /// Returns the current routine name, or `"noname"`.
    pub fn routine(&self) -> &str {
        self.routine.as_deref().unwrap_or(NO_NAME_ROUTINE)
    }

    /// Returns the name of the routine that spawned the current one, or `""`.
    pub fn parent_routine(&self) -> &str {
        self.parent.as_deref().unwrap_or_default()
    }

    /// Returns the routine that placed this context's value onto a channel, or `""`.
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or_default()
    }

    /// Looks up a user-supplied value; the most recent overlay wins.
    pub fn value(&self, key: &str) -> Option<&str> {
        let mut node = self.values.as_deref();
        while let Some(overlay) = node {
            if &*overlay.key == key {
                return Some(&overlay.value);
            }
            node = overlay.next.as_deref();
        }
        None
    }

    /// Returns the cancellation token shared along this execution path.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shorthand for `self.token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the execution path has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Returns a context for a child routine named `name`.
    ///
    /// The child's parent is this context's [`routine`](Self::routine) (the sentinel if unset);
    /// sender, values and token are inherited unchanged.
    pub fn derive_child(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            parent: Some(Arc::from(self.routine())),
            routine: Some(name.into()),
            ..self.clone()
        }
    }

    /// Returns a copy of this context with `sender` replaced.
    pub fn derive_sender(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            sender: Some(name.into()),
            ..self.clone()
        }
    }

    /// Returns a copy of this context with one more key-value overlaid.
    pub fn with_value(&self, key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        Self {
            values: Some(Arc::new(Overlay {
                key: key.into(),
                value: value.into(),
                next: self.values.clone(),
            })),
            ..self.clone()
        }
    }

    /// Returns a copy whose token is a child of this one.
    ///
    /// Cancelling the returned context does not cancel `self`; cancelling `self` cancels both.
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            ..self.clone()
        }
    }

    /// Returns a copy that observes `token` instead of the inherited one.
    pub fn with_token(&self, token: CancellationToken) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("routine", &self.routine())
            .field("parent", &self.parent_routine())
            .field("sender", &self.sender())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_keys_read_as_defaults() {
        let ctx = Context::background();
        assert_eq!(ctx.routine(), NO_NAME_ROUTINE);
        assert_eq!(ctx.parent_routine(), "");
        assert_eq!(ctx.sender(), "");
        assert_eq!(ctx.value("missing"), None);
    }

    #[test]
    fn test_child_records_parent_lineage() {
        let root = Context::root();
        let child = root.derive_child("a");
        let grandchild = child.derive_child("b");

        assert_eq!(child.parent_routine(), ROOT_ROUTINE);
        assert_eq!(grandchild.routine(), "b");
        assert_eq!(grandchild.parent_routine(), "a");
        assert_eq!(root.routine(), ROOT_ROUTINE);
        assert_eq!(root.parent_routine(), "");
    }

    #[test]
    fn test_child_of_unnamed_context_gets_sentinel_parent() {
        let child = Context::background().derive_child("worker");
        assert_eq!(child.parent_routine(), NO_NAME_ROUTINE);
    }

    #[test]
    fn test_sender_overlay_keeps_everything_else() {
        let ctx = Context::root()
            .with_value("tenant", "acme")
            .derive_child("producer");
        let stamped = ctx.derive_sender("producer");

        assert_eq!(stamped.sender(), "producer");
        assert_eq!(stamped.routine(), "producer");
        assert_eq!(stamped.parent_routine(), ROOT_ROUTINE);
        assert_eq!(stamped.value("tenant"), Some("acme"));
        assert_eq!(ctx.sender(), "");
    }

    #[test]
    fn test_latest_value_shadows_earlier_one() {
        let base = Context::background().with_value("k", "1");
        let shadowed = base.with_value("k", "2");
        assert_eq!(shadowed.value("k"), Some("2"));
        assert_eq!(base.value("k"), Some("1"));
    }

    #[test]
    fn test_with_cancel_is_isolated_from_parent() {
        let parent = Context::root();
        let child = parent.with_cancel();

        child.token().cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let sibling = parent.with_cancel();
        parent.token().cancel();
        assert!(sibling.is_cancelled());
    }

    #[test]
    fn test_derived_contexts_share_token() {
        let parent = Context::root();
        let child = parent.derive_child("w").derive_sender("w");
        parent.token().cancel();
        assert!(child.is_cancelled());
    }
}
