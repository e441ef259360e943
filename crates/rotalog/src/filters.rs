//! Filters for routing `tracing` output into the rotating files

use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};

const SELF_TARGET: &str = "rotalog";

/// Filter that keeps the logger's own lifecycle events out of a layer that
/// writes into the logger, which would otherwise feed back into itself
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfEventFilter;

impl SelfEventFilter {
    pub fn new() -> Self {
        Self
    }

    fn is_own(meta: &Metadata<'_>) -> bool {
        meta.target().starts_with(SELF_TARGET)
    }
}

impl<S> Filter<S> for SelfEventFilter
where
    S: Subscriber,
{
    fn enabled(&self, meta: &Metadata<'_>, _ctx: &Context<'_, S>) -> bool {
        !Self::is_own(meta)
    }

    fn callsite_enabled(&self, meta: &'static Metadata<'static>) -> tracing::subscriber::Interest {
        if Self::is_own(meta) {
            tracing::subscriber::Interest::never()
        } else {
            tracing::subscriber::Interest::sometimes()
        }
    }
}
