use std::collections::HashMap;

/// Identifies one rendering context (one window surface).
///
/// Vertex-input bindings are per context; two windows drawing the same scene each need
/// their own.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ContextId(pub u64);

impl From<winit::window::WindowId> for ContextId {
    fn from(id: winit::window::WindowId) -> Self {
        ContextId(u64::from(id))
    }
}

/// Whether a context's binding is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingState<B> {
    /// Entry exists but has to be (re)built before the next draw.
    Unconfigured,
    Configured(B),
}

impl<B> BindingState<B> {
    #[inline]
    pub fn is_configured(&self) -> bool {
        matches!(self, BindingState::Configured(_))
    }
}

/// Per-context binding cache for one primitive buffer.
///
/// Any reallocation of a buffer the bindings read from makes *every* context stale, not
/// only the one that happened to trigger it. `invalidate_all` drops them all; each
/// context rebuilds lazily on its next draw.
pub struct BindingCache<B> {
    entries: HashMap<ContextId, BindingState<B>>,
}

impl<B> BindingCache<B> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `context` as unconfigured if unseen.
    pub fn ensure(&mut self, context: ContextId) {
        self.entries
            .entry(context)
            .or_insert(BindingState::Unconfigured);
    }

    /// Marks every known context unconfigured and drops their bindings.
    pub fn invalidate_all(&mut self) {
        for state in self.entries.values_mut() {
            *state = BindingState::Unconfigured;
        }
    }

    /// Returns the binding for `context`, building it with `build` if missing or stale.
    pub fn get_or_configure(&mut self, context: ContextId, build: impl FnOnce() -> B) -> &B {
        let state = self
            .entries
            .entry(context)
            .or_insert(BindingState::Unconfigured);

        if !state.is_configured() {
            log::trace!("configuring binding for context {:?}", context);
            *state = BindingState::Configured(build());
        }

        match state {
            BindingState::Configured(binding) => binding,
            BindingState::Unconfigured => unreachable!("binding configured above"),
        }
    }

    pub fn state(&self, context: ContextId) -> Option<&BindingState<B>> {
        self.entries.get(&context)
    }

    pub fn is_configured(&self, context: ContextId) -> bool {
        self.entries
            .get(&context)
            .is_some_and(BindingState::is_configured)
    }

    /// Drops the entry for a context that went away.
    pub fn forget(&mut self, context: ContextId) {
        self.entries.remove(&context);
    }

    /// Number of known contexts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B> Default for BindingCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ContextId = ContextId(1);
    const B: ContextId = ContextId(2);

    #[test]
    fn ensure_registers_unconfigured() {
        let mut cache = BindingCache::<u32>::new();
        cache.ensure(A);
        assert_eq!(cache.state(A), Some(&BindingState::Unconfigured));
        assert!(!cache.is_configured(A));
        assert_eq!(cache.state(B), None);
    }

    #[test]
    fn configure_is_lazy_and_cached() {
        let mut cache = BindingCache::new();
        let mut builds = 0;

        assert_eq!(
            *cache.get_or_configure(A, || {
                builds += 1;
                10
            }),
            10
        );
        assert_eq!(
            *cache.get_or_configure(A, || {
                builds += 1;
                20
            }),
            10
        );
        assert_eq!(builds, 1);
    }

    #[test]
    fn invalidate_all_resets_every_context() {
        let mut cache = BindingCache::new();
        cache.get_or_configure(A, || 1);
        cache.get_or_configure(B, || 2);
        assert!(cache.is_configured(A) && cache.is_configured(B));

        cache.invalidate_all();
        assert!(!cache.is_configured(A));
        assert!(!cache.is_configured(B));
        assert_eq!(cache.len(), 2);

        assert_eq!(*cache.get_or_configure(B, || 3), 3);
        assert!(!cache.is_configured(A));
    }

    #[test]
    fn forget_removes_context() {
        let mut cache = BindingCache::new();
        cache.get_or_configure(A, || 1);
        cache.forget(A);
        assert!(cache.is_empty());
    }
}
