//! Transient progress indicator contracts and the cancellable progress handle.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use futures::future::LocalBoxFuture;

/// Caller-supplied async callback run when the user stops a progress indicator.
pub type ProgressStopCallback = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

struct ProgressInner {
    title: String,
    on_stop: Option<ProgressStopCallback>,
    stop_armed: Cell<bool>,
    stopped: Cell<bool>,
}

/// Handle for one displayed progress indicator.
///
/// A handle created with a stop action can be stopped at most once; later attempts are ignored.
/// Stopping never aborts the underlying work, it only marks the pending result as unwanted.
#[derive(Clone)]
pub struct ProgressHandle {
    inner: Rc<ProgressInner>,
}

impl ProgressHandle {
    /// Creates a handle without a stop action.
    pub fn new(title: impl Into<String>) -> Self {
        Self::build(title.into(), None)
    }

    /// Creates a handle whose stop action runs `on_stop`.
    pub fn with_stop(title: impl Into<String>, on_stop: ProgressStopCallback) -> Self {
        Self::build(title.into(), Some(on_stop))
    }

    fn build(title: String, on_stop: Option<ProgressStopCallback>) -> Self {
        let stop_armed = on_stop.is_some();
        Self {
            inner: Rc::new(ProgressInner {
                title,
                on_stop,
                stop_armed: Cell::new(stop_armed),
                stopped: Cell::new(false),
            }),
        }
    }

    /// Returns the indicator title.
    pub fn title(&self) -> &str {
        &self.inner.title
    }

    /// Returns whether the stop action is still available.
    pub fn can_stop(&self) -> bool {
        self.inner.stop_armed.get()
    }

    /// Returns whether the stop action has been triggered.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    /// Triggers the stop action and awaits the caller callback.
    ///
    /// Returns `false` when the handle has no stop action or was already stopped.
    pub async fn stop(&self) -> bool {
        if !self.inner.stop_armed.replace(false) {
            return false;
        }
        self.inner.stopped.set(true);
        if let Some(on_stop) = self.inner.on_stop.clone() {
            on_stop().await;
        }
        true
    }
}

impl std::fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHandle")
            .field("title", &self.inner.title)
            .field("can_stop", &self.can_stop())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Host surface that displays progress indicators.
pub trait ProgressIndicator {
    /// Displays `progress`.
    fn show(&self, progress: &ProgressHandle);

    /// Removes `progress` from display.
    fn close(&self, progress: &ProgressHandle);
}

#[derive(Debug, Clone, Copy, Default)]
/// Progress surface that displays nothing.
pub struct NoopProgressIndicator;

impl ProgressIndicator for NoopProgressIndicator {
    fn show(&self, _progress: &ProgressHandle) {}

    fn close(&self, _progress: &ProgressHandle) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Display transition recorded by [`MemoryProgressIndicator`].
pub enum ProgressEvent {
    /// An indicator was shown.
    Shown(String),
    /// An indicator was closed.
    Closed(String),
}

#[derive(Debug, Clone, Default)]
/// Progress surface that records transitions and keeps handles of open indicators.
pub struct MemoryProgressIndicator {
    events: Rc<RefCell<Vec<ProgressEvent>>>,
    open: Rc<RefCell<Vec<ProgressHandle>>>,
}

impl MemoryProgressIndicator {
    /// Returns every recorded transition in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.borrow().clone()
    }

    /// Returns handles that are currently displayed.
    pub fn open_handles(&self) -> Vec<ProgressHandle> {
        self.open.borrow().clone()
    }
}

impl ProgressIndicator for MemoryProgressIndicator {
    fn show(&self, progress: &ProgressHandle) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Shown(progress.title().to_string()));
        self.open.borrow_mut().push(progress.clone());
    }

    fn close(&self, progress: &ProgressHandle) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Closed(progress.title().to_string()));
        self.open
            .borrow_mut()
            .retain(|open| !Rc::ptr_eq(&open.inner, &progress.inner));
    }
}
