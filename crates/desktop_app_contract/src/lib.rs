//! Shared contract types between the desktop lifecycle runtime and installable applications.
//!
//! Applications are described by an [`ApplicationDescriptor`] in the shell catalog and by an
//! [`ApplicationManifest`] downloaded on first open. Behavior is supplied through the
//! [`WindowDelegate`] and [`ApplicationDelegate`] traits, constructed by factories the host
//! registers ahead of time and invoked with typed [`ControllerContext`] / [`ApplicationContext`]
//! values.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{collections::BTreeMap, rc::Rc};

use serde::{Deserialize, Serialize};

/// Stable identifier for an app package/module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` conforms to the `segment.segment...` policy.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected namespaced dotted segments"
            ))
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for compile-time/runtime trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 120 {
        return false;
    }

    let mut count = 0usize;
    for part in raw.split('.') {
        count += 1;
        if part.is_empty() || part.len() > 32 {
            return false;
        }
        let bytes = part.as_bytes();
        if !bytes[0].is_ascii_lowercase() {
            return false;
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return false;
        }
        if part.ends_with('-') {
            return false;
        }
    }

    count >= 2
}

/// Session-unique identifier for a runtime-managed window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(String);

impl WindowId {
    /// Wraps a generated window token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier a controller constructor is bound under for one window instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScriptId(String);

impl ScriptId {
    /// Wraps a generated script-association token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Immutable catalog entry for an installable application.
pub struct ApplicationDescriptor {
    /// Canonical app id.
    pub id: ApplicationId,
    /// Human-readable display name.
    pub display_name: String,
    /// Optional icon reference.
    pub icon: Option<String>,
    /// System applications are always running and never foregrounded.
    pub system: bool,
    /// Passive applications can be switched to but never become foreground.
    pub passive: bool,
    /// Close the application when its last window closes.
    pub quit_automatically: bool,
}

impl ApplicationDescriptor {
    /// Creates a regular (non-system, non-passive) descriptor.
    pub fn new(id: ApplicationId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            icon: None,
            system: false,
            passive: false,
            quit_automatically: false,
        }
    }

    /// Marks the descriptor as a system application.
    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    /// Marks the descriptor as a passive application.
    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    /// Marks the descriptor to quit when its last window closes.
    pub fn quit_automatically(mut self) -> Self {
        self.quit_automatically = true;
        self
    }

    /// Returns whether the application may hold foreground state.
    pub const fn can_hold_foreground(&self) -> bool {
        !self.system && !self.passive
    }
}

/// Manifest downloaded from `app/{id}/application.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationManifest {
    /// Application-level metadata.
    pub application: ApplicationInfo,
    /// Declared controllers keyed by controller name.
    #[serde(default)]
    pub controllers: BTreeMap<String, ControllerDeclaration>,
}

impl ApplicationManifest {
    /// Returns the declaration for `name` when the manifest lists it.
    pub fn controller(&self, name: &str) -> Option<&ControllerDeclaration> {
        self.controllers.get(name)
    }
}

/// The `application` block of an [`ApplicationManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    /// Application id; must match the id the manifest was requested for.
    pub id: ApplicationId,
    /// Display name.
    pub name: String,
    /// Optional icon reference.
    #[serde(default)]
    pub icon: Option<String>,
    /// Package version string.
    #[serde(default)]
    pub version: String,
    /// Entry-point controller name.
    pub main: String,
    /// Whether the application controller declares its own menus.
    #[serde(default)]
    pub menu: bool,
    /// Close the application when its last window closes.
    #[serde(default)]
    pub quit_automatically: bool,
}

/// One entry of the manifest `controllers` map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerDeclaration {
    /// Content renderer extension; the runtime default applies when absent.
    #[serde(default)]
    pub renderer: Option<String>,
    /// At most one open window for this controller.
    #[serde(default)]
    pub singleton: bool,
    /// Windows render above the ordered stack.
    #[serde(default)]
    pub modal: bool,
}

/// Identifier of a menu fragment contributed to the shared system bar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MenuFragmentId(String);

impl MenuFragmentId {
    /// Creates a fragment id from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MenuFragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
/// Action performed when a menu item is activated.
pub enum MenuAction {
    /// Close the owning application.
    Quit,
    /// Switch to the owning application.
    SwitchTo,
    /// Forward a named command to the application controller.
    Command(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry of a [`MenuFragment`].
pub struct MenuItem {
    /// Item label.
    pub label: String,
    /// Activation action.
    pub action: MenuAction,
}

impl MenuItem {
    /// Creates a menu item.
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A group of menu items shown and hidden as a unit.
pub struct MenuFragment {
    /// Fragment id.
    pub id: MenuFragmentId,
    /// Ordered items.
    pub items: Vec<MenuItem>,
}

impl MenuFragment {
    /// Creates a fragment from its id and items.
    pub fn new(id: MenuFragmentId, items: Vec<MenuItem>) -> Self {
        Self { id, items }
    }

    /// Synthesized single-entry menu offering only a quit action.
    pub fn quit_only(application_id: &ApplicationId, display_name: &str, quit_label: &str) -> Self {
        Self::new(
            MenuFragmentId::new(format!("{application_id}.menu")),
            vec![MenuItem::new(
                format!("{quit_label} {display_name}"),
                MenuAction::Quit,
            )],
        )
    }

    /// Synthesized "switch to me" affordance shown while the application is blurred.
    pub fn switch_affordance(application_id: &ApplicationId, display_name: &str) -> Self {
        Self::new(
            MenuFragmentId::new(format!("{application_id}.switcher")),
            vec![MenuItem::new(display_name, MenuAction::SwitchTo)],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Menu contributions of one application.
pub struct ApplicationMenus {
    /// Fragment visible while the application is focused.
    pub focused: MenuFragment,
    /// Fragment visible while the application is blurred.
    pub switcher: Option<MenuFragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Lifecycle events delivered to a window controller.
pub enum WindowLifecycleEvent {
    /// Controller attached to its window.
    ViewDidLoad,
    /// Window attached to the display tree.
    ViewDidAppear,
    /// Window became the focused top-most window.
    DidFocusWindow,
    /// Window lost focus.
    DidBlurWindow,
    /// Window close sequence started; the controller is unregistered right after.
    ViewWillUnload,
}

impl WindowLifecycleEvent {
    /// Returns a stable string token for logging and test hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::ViewDidLoad => "view-did-load",
            Self::ViewDidAppear => "view-did-appear",
            Self::DidFocusWindow => "did-focus-window",
            Self::DidBlurWindow => "did-blur-window",
            Self::ViewWillUnload => "view-will-unload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Lifecycle events delivered to an application controller.
pub enum ApplicationLifecycleEvent {
    /// Application finished loading.
    DidStart,
    /// Application became foreground.
    DidFocus,
    /// Application lost foreground.
    DidBlur,
    /// Application closed.
    DidStop,
}

impl ApplicationLifecycleEvent {
    /// Returns a stable string token for logging and test hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::DidStart => "did-start",
            Self::DidFocus => "did-focus",
            Self::DidBlur => "did-blur",
            Self::DidStop => "did-stop",
        }
    }
}

/// Behavior attached to one window.
pub trait WindowDelegate {
    /// Receives window lifecycle events.
    fn on_lifecycle(&self, _event: WindowLifecycleEvent) {}

    /// Menu fragment shown while this window is the focused top-most window.
    fn menu(&self) -> Option<MenuFragment> {
        None
    }
}

/// Behavior attached to an application as a whole.
pub trait ApplicationDelegate {
    /// Receives application lifecycle events.
    fn on_lifecycle(&self, _event: ApplicationLifecycleEvent) {}

    /// Declared focused/switch menus; synthesized ones are used when `None`.
    fn menus(&self) -> Option<ApplicationMenus> {
        None
    }

    /// Controllers to present when the application controller is the entry point.
    fn launch_windows(&self) -> Vec<String> {
        Vec::new()
    }

    /// Handles a [`MenuAction::Command`] activated in one of the application's menus.
    fn perform_command(&self, _command: &str) {}
}

type WindowLookup = Rc<dyn Fn(&WindowId) -> Option<Rc<dyn WindowDelegate>>>;
type ApplicationLookup = Rc<dyn Fn() -> Option<Rc<dyn ApplicationDelegate>>>;
type WindowListing = Rc<dyn Fn() -> Vec<WindowId>>;

/// Read access to sibling controllers of the same application.
#[derive(Clone)]
pub struct ControllerAccessor {
    window: WindowLookup,
    application: ApplicationLookup,
    windows: WindowListing,
}

impl ControllerAccessor {
    /// Creates an accessor from runtime-provided lookups.
    pub fn new(window: WindowLookup, application: ApplicationLookup, windows: WindowListing) -> Self {
        Self {
            window,
            application,
            windows,
        }
    }

    /// Creates an accessor that resolves nothing.
    pub fn detached() -> Self {
        Self::new(
            Rc::new(|_: &WindowId| -> Option<Rc<dyn WindowDelegate>> { None }),
            Rc::new(|| -> Option<Rc<dyn ApplicationDelegate>> { None }),
            Rc::new(|| -> Vec<WindowId> { Vec::new() }),
        )
    }

    /// Returns the controller attached to `window_id`.
    pub fn window_controller(&self, window_id: &WindowId) -> Option<Rc<dyn WindowDelegate>> {
        (self.window)(window_id)
    }

    /// Returns the application-level controller.
    pub fn application_controller(&self) -> Option<Rc<dyn ApplicationDelegate>> {
        (self.application)()
    }

    /// Returns the ids of the application's open windows.
    pub fn window_ids(&self) -> Vec<WindowId> {
        (self.windows)()
    }
}

/// Context passed to a window controller factory.
#[derive(Clone)]
pub struct ControllerContext {
    /// Window the controller is attached to.
    pub window_id: WindowId,
    /// Owning application.
    pub application_id: ApplicationId,
    /// Manifest controller name.
    pub controller_name: String,
    /// Script id the constructor was bound under.
    pub script_id: ScriptId,
    /// Sibling controller lookups.
    pub controllers: ControllerAccessor,
}

/// Context passed to an application controller factory.
#[derive(Clone)]
pub struct ApplicationContext {
    /// Application being loaded.
    pub application_id: ApplicationId,
    /// Parsed manifest.
    pub manifest: ApplicationManifest,
    /// Controller lookups.
    pub controllers: ControllerAccessor,
}

/// Constructor for a window controller.
pub type WindowControllerFactory = Rc<dyn Fn(ControllerContext) -> Rc<dyn WindowDelegate>>;

/// Constructor for an application controller.
pub type ApplicationControllerFactory =
    Rc<dyn Fn(ApplicationContext) -> Rc<dyn ApplicationDelegate>>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn application_id_requires_dotted_namespaces() {
        assert!(ApplicationId::new("io.bithead.boss").is_ok());
        assert!(ApplicationId::new("app.a").is_ok());
        assert!(ApplicationId::new("calculator").is_err());
        assert!(ApplicationId::new("System.calc").is_err());
        assert!(ApplicationId::new("system..calc").is_err());
    }

    #[test]
    fn manifest_parses_optional_fields_with_defaults() {
        let manifest: ApplicationManifest = serde_json::from_value(json!({
            "application": {
                "id": "io.bithead.notes",
                "name": "Notes",
                "version": "1.0.0",
                "main": "Main",
                "quitAutomatically": true
            },
            "controllers": {
                "Main": { "renderer": "html" },
                "About": { "singleton": true, "modal": true }
            }
        }))
        .expect("manifest");

        assert_eq!(manifest.application.id.as_str(), "io.bithead.notes");
        assert!(manifest.application.quit_automatically);
        assert!(!manifest.application.menu);
        assert_eq!(manifest.application.icon, None);
        let about = manifest.controller("About").expect("about");
        assert!(about.singleton && about.modal);
        assert_eq!(about.renderer, None);
        assert!(manifest.controller("Missing").is_none());
    }

    #[test]
    fn synthesized_fragments_are_namespaced_by_application() {
        let id = ApplicationId::trusted("io.bithead.notes");
        let quit = MenuFragment::quit_only(&id, "Notes", "Quit");
        assert_eq!(quit.id.as_str(), "io.bithead.notes.menu");
        assert_eq!(quit.items, vec![MenuItem::new("Quit Notes", MenuAction::Quit)]);

        let switcher = MenuFragment::switch_affordance(&id, "Notes");
        assert_eq!(switcher.id.as_str(), "io.bithead.notes.switcher");
        assert_eq!(switcher.items[0].action, MenuAction::SwitchTo);
    }

    #[test]
    fn detached_accessor_resolves_nothing() {
        let accessor = ControllerAccessor::detached();
        assert!(accessor
            .window_controller(&WindowId::new("Abc12345"))
            .is_none());
        assert!(accessor.application_controller().is_none());
        assert!(accessor.window_ids().is_empty());
    }

    #[test]
    fn descriptor_foreground_eligibility() {
        let id = ApplicationId::trusted("app.a");
        assert!(ApplicationDescriptor::new(id.clone(), "A").can_hold_foreground());
        assert!(!ApplicationDescriptor::new(id.clone(), "A")
            .passive()
            .can_hold_foreground());
        assert!(!ApplicationDescriptor::new(id, "A").system().can_hold_foreground());
    }
}
