//! Failure classification: matching a raised kind to a registered handler.
//!
//! Matching is a pure function over the handler list and the raised
//! [`FailureKind`]; it holds no state and is safe to call concurrently. The
//! strategy is pluggable: the default walks the explicit kind hierarchy and
//! picks the most specific ancestor, breaking ties by registration order.

use switchyard_core::FailureKind;

use crate::route::HandlerEntry;

/// Strategy for selecting the handler that owns a raised failure.
pub trait HandlerMatcher: Send + Sync {
    /// Select the best entry for `raised`, or `None` when no entry matches
    /// (which sends the exchange down the default dead-letter path,
    /// unhandled).
    fn select<'a>(
        &self,
        handlers: &'a [HandlerEntry],
        raised: &FailureKind,
    ) -> Option<&'a HandlerEntry>;
}

/// Default matcher: nearest-ancestor (including exact) match wins; among
/// equally specific entries, the first registered wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyMatcher;

impl HandlerMatcher for HierarchyMatcher {
    fn select<'a>(
        &self,
        handlers: &'a [HandlerEntry],
        raised: &FailureKind,
    ) -> Option<&'a HandlerEntry> {
        let mut best: Option<&HandlerEntry> = None;
        for entry in handlers {
            if !raised.is_a(entry.kind()) {
                continue;
            }
            // Strictly deeper replaces; equal depth keeps the earlier entry.
            if best.is_none_or(|current| entry.kind().depth() > current.kind().depth()) {
                best = Some(entry);
            }
        }
        best
    }
}
