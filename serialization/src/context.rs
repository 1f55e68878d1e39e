//! Per-call state threaded through every read, write, copy and validation.

use std::cell::Cell;

use crate::error::{Result, SerializationError};
use crate::node::NodeMark;
use crate::serializer::SerializerRegistry;

/// Answer of a [`PrototypeIndex`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrototypeLookup {
    Known,
    Unknown,
    /// The kind has not been loaded yet; references cannot be checked.
    NotLoaded,
}

/// Resolves document references (`ProtoId`) while reading and validating.
pub trait PrototypeIndex: Send + Sync {
    fn lookup(&self, kind: &str, id: &str) -> PrototypeLookup;
}

/// Options and overrides for a single serialization call.
///
/// Contexts are cheap to build and are passed by reference down the whole
/// call tree. Overrides registered here take precedence over the manager's
/// registry for the duration of the call.
#[derive(Default)]
pub struct SerializationContext<'a> {
    overrides: Option<&'a SerializerRegistry>,
    prototypes: Option<&'a dyn PrototypeIndex>,
    skip_hooks: bool,
    strict: Option<bool>,
    depth: Cell<usize>,
}

impl<'a> SerializationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: &'a SerializerRegistry) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_prototypes(mut self, prototypes: &'a dyn PrototypeIndex) -> Self {
        self.prototypes = Some(prototypes);
        self
    }

    /// Do not run after-read hooks.
    pub fn skip_hooks(mut self, skip: bool) -> Self {
        self.skip_hooks = skip;
        self
    }

    /// Override the manager's unknown-field policy for this call.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn overrides(&self) -> Option<&'a SerializerRegistry> {
        self.overrides
    }

    pub fn prototypes(&self) -> Option<&'a dyn PrototypeIndex> {
        self.prototypes
    }

    pub fn hooks_skipped(&self) -> bool {
        self.skip_hooks
    }

    pub fn strict_override(&self) -> Option<bool> {
        self.strict
    }

    /// Current nesting depth of the read or validation in progress.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    pub(crate) fn descend(&self, limit: usize, mark: NodeMark) -> Result<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > limit {
            return Err(SerializationError::DepthLimitExceeded { limit, mark });
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

pub(crate) struct DepthGuard<'c> {
    depth: &'c Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_guard_unwinds() {
        let ctx = SerializationContext::new();
        {
            let _a = ctx.descend(2, NodeMark::default()).unwrap();
            let _b = ctx.descend(2, NodeMark::default()).unwrap();
            assert_eq!(ctx.depth(), 2);
            assert!(ctx.descend(2, NodeMark::default()).is_err());
        }
        assert_eq!(ctx.depth(), 0);
    }
}
