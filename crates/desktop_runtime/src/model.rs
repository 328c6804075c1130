//! Runtime state: loaded applications, their windows, and deferred controller callbacks.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
};

use desktop_app_contract::{
    ApplicationDelegate, ApplicationDescriptor, ApplicationId, ApplicationLifecycleEvent,
    ApplicationManifest, MenuFragmentId, ScriptId, WindowDelegate, WindowId,
    WindowLifecycleEvent,
};

use crate::{
    effects::ShellEffect, menu_binder::MenuBinder, registry::Registry, window_stack::WindowStack,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Lifecycle phase of one window.
pub enum WindowPhase {
    /// Entry exists but is not attached to the display tree.
    Created,
    /// Controller attached, chrome and menu wired.
    Initialized,
    /// Container attached to the display tree.
    Shown,
    /// Terminal.
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Which application, if any, holds foreground.
pub enum Foreground {
    #[default]
    /// No application is focused.
    None,
    /// The given application is focused.
    Application(ApplicationId),
}

impl Foreground {
    /// Returns the focused application.
    pub fn application(&self) -> Option<&ApplicationId> {
        match self {
            Self::None => None,
            Self::Application(id) => Some(id),
        }
    }

    /// Returns whether `id` holds foreground.
    pub fn is(&self, id: &ApplicationId) -> bool {
        self.application() == Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identity of one loaded application instance.
pub struct ApplicationInstance {
    /// Application id.
    pub application_id: ApplicationId,
    /// Monotonic instance number; a re-opened application gets a new one.
    pub instance_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Read-only view of a window for queries.
pub struct WindowSnapshot {
    /// Window id.
    pub id: WindowId,
    /// Owning application.
    pub application_id: ApplicationId,
    /// Manifest controller the window was created from.
    pub controller_name: String,
    /// Modal windows stay outside the stack.
    pub modal: bool,
    /// Adopted from an existing container rather than created.
    pub pre_existing: bool,
    /// Zero-based stacking position; `None` for unstacked windows.
    pub position: Option<usize>,
    /// Current lifecycle phase.
    pub phase: WindowPhase,
    /// Whether the window is shown unfocused.
    pub blurred: bool,
    /// Script id of the attached controller, if any.
    pub script_id: Option<ScriptId>,
    /// Window menu fragment, if the controller supplied one.
    pub menu: Option<MenuFragmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Downloaded controller content and its manifest flags.
pub(crate) struct ControllerDefinition {
    pub name: String,
    pub renderer: String,
    pub singleton: bool,
    pub modal: bool,
    pub markup: String,
}

#[derive(Clone)]
pub(crate) struct AttachedController {
    pub script_id: ScriptId,
    pub delegate: Rc<dyn WindowDelegate>,
}

impl std::fmt::Debug for AttachedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedController")
            .field("script_id", &self.script_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WindowEntry {
    pub id: WindowId,
    pub application_id: ApplicationId,
    pub controller_name: String,
    pub modal: bool,
    pub pre_existing: bool,
    pub position: Option<usize>,
    pub phase: WindowPhase,
    pub blurred: bool,
    pub markup: String,
    pub menu: Option<MenuFragmentId>,
    pub controller: Option<AttachedController>,
}

impl WindowEntry {
    /// Whether the window takes part in the ordered stack.
    pub fn stacked(&self) -> bool {
        !self.modal && !self.pre_existing
    }

    pub fn delegate(&self) -> Option<Rc<dyn WindowDelegate>> {
        self.controller.as_ref().map(|c| c.delegate.clone())
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            id: self.id.clone(),
            application_id: self.application_id.clone(),
            controller_name: self.controller_name.clone(),
            modal: self.modal,
            pre_existing: self.pre_existing,
            position: self.position,
            phase: self.phase,
            blurred: self.blurred,
            script_id: self.controller.as_ref().map(|c| c.script_id.clone()),
            menu: self.menu.clone(),
        }
    }
}

pub(crate) struct LoadedApplication {
    pub descriptor: ApplicationDescriptor,
    pub instance_id: u64,
    pub manifest: ApplicationManifest,
    pub controllers: HashMap<String, ControllerDefinition>,
    pub windows: BTreeMap<WindowId, WindowEntry>,
    pub delegate: Option<Rc<dyn ApplicationDelegate>>,
}

impl LoadedApplication {
    pub fn instance(&self) -> ApplicationInstance {
        ApplicationInstance {
            application_id: self.descriptor.id.clone(),
            instance_id: self.instance_id,
        }
    }

    pub fn quit_automatically(&self) -> bool {
        self.descriptor.quit_automatically || self.manifest.application.quit_automatically
    }
}

/// Runtime state owned by one lifecycle manager.
#[derive(Default)]
pub(crate) struct LifecycleState {
    pub registry: Registry,
    pub applications: BTreeMap<ApplicationId, LoadedApplication>,
    pub stack: WindowStack,
    pub menus: MenuBinder,
    pub foreground: Foreground,
    pub closing: BTreeSet<ApplicationId>,
    pub opening: BTreeSet<ApplicationId>,
    pub effects: Vec<ShellEffect>,
    next_instance: u64,
}

impl LifecycleState {
    pub fn next_instance_id(&mut self) -> u64 {
        self.next_instance += 1;
        self.next_instance
    }

    pub fn owner_of(&self, window_id: &WindowId) -> Option<&ApplicationId> {
        self.applications
            .values()
            .find(|app| app.windows.contains_key(window_id))
            .map(|app| &app.descriptor.id)
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&WindowEntry> {
        self.applications
            .values()
            .find_map(|app| app.windows.get(window_id))
    }

    pub fn window_mut(&mut self, window_id: &WindowId) -> Option<&mut WindowEntry> {
        self.applications
            .values_mut()
            .find_map(|app| app.windows.get_mut(window_id))
    }

    pub fn window_exists(&self, raw: &str) -> bool {
        self.window(&WindowId::new(raw)).is_some()
    }

    pub fn snapshot(&self, window_id: &WindowId) -> Option<WindowSnapshot> {
        self.window(window_id).map(WindowEntry::snapshot)
    }

    /// Highest stacked window owned by `application_id`.
    pub fn top_window_of(&self, application_id: &ApplicationId) -> Option<WindowId> {
        let app = self.applications.get(application_id)?;
        self.stack
            .top_matching(|id| app.windows.contains_key(id))
            .cloned()
    }
}

/// Controller callback collected under a state borrow and delivered after it is released.
pub(crate) enum LifecycleCall {
    Window(Rc<dyn WindowDelegate>, WindowLifecycleEvent),
    Application(Rc<dyn ApplicationDelegate>, ApplicationLifecycleEvent),
}

impl LifecycleCall {
    pub fn window(window: &WindowEntry, event: WindowLifecycleEvent) -> Option<Self> {
        window
            .delegate()
            .map(|delegate| Self::Window(delegate, event))
    }

    pub fn application(app: &LoadedApplication, event: ApplicationLifecycleEvent) -> Option<Self> {
        app.delegate
            .clone()
            .map(|delegate| Self::Application(delegate, event))
    }

    pub fn deliver(self) {
        match self {
            Self::Window(delegate, event) => delegate.on_lifecycle(event),
            Self::Application(delegate, event) => delegate.on_lifecycle(event),
        }
    }
}

/// Delivers `calls` in order. Callers must not hold a state borrow.
pub(crate) fn deliver(calls: Vec<LifecycleCall>) {
    for call in calls {
        call.deliver();
    }
}
