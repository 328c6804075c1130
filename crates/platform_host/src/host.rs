//! Host service bundle injected into the lifecycle runtime.

use std::rc::Rc;

use crate::{
    AlertService, ContentFetcher, NoopAlertService, NoopContentFetcher, NoopProgressIndicator,
    ProgressIndicator,
};

/// Runtime-selected host service bundle injected into the lifecycle runtime.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `desktop_runtime`, which keeps the runtime decoupled from browser adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Manifest and controller content retrieval.
    pub fetcher: Rc<dyn ContentFetcher>,
    /// Transient progress indicator surface.
    pub progress: Rc<dyn ProgressIndicator>,
    /// User-facing alert surface.
    pub alerts: Rc<dyn AlertService>,
}

impl HostServices {
    /// Creates a bundle from concrete services.
    pub fn new(
        fetcher: Rc<dyn ContentFetcher>,
        progress: Rc<dyn ProgressIndicator>,
        alerts: Rc<dyn AlertService>,
    ) -> Self {
        Self {
            fetcher,
            progress,
            alerts,
        }
    }

    /// Creates a bundle that fetches nothing and displays nothing.
    pub fn noop() -> Self {
        Self::new(
            Rc::new(NoopContentFetcher),
            Rc::new(NoopProgressIndicator),
            Rc::new(NoopAlertService),
        )
    }

    /// Replaces the fetcher, keeping the other services.
    pub fn with_fetcher(mut self, fetcher: Rc<dyn ContentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::{FetchError, MemoryContentFetcher};

    #[test]
    fn noop_bundle_fetches_nothing_until_a_fetcher_is_swapped_in() {
        let services = HostServices::noop();
        assert!(matches!(
            block_on(services.fetcher.fetch_text("/boss/app/io.bithead.notes/manifest")),
            Err(FetchError::NotFound { .. })
        ));

        let fetcher = MemoryContentFetcher::default();
        fetcher.insert_text("/boss/app/io.bithead.notes/manifest", "{}");
        let services = services.with_fetcher(Rc::new(fetcher));
        assert_eq!(
            block_on(services.fetcher.fetch_text("/boss/app/io.bithead.notes/manifest"))
                .expect("fetch"),
            "{}"
        );
    }
}
