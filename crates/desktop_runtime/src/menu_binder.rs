//! Visibility of application and window menu fragments in the shared system bar.

use std::collections::{BTreeMap, BTreeSet};

use desktop_app_contract::{
    ApplicationDescriptor, ApplicationId, ApplicationMenus, MenuFragment, MenuFragmentId, WindowId,
};
use leptos::logging;

use crate::effects::ShellEffect;

#[derive(Debug, Clone, Default)]
/// Tracks the bound application's focused menu, blurred applications' switch affordances, and
/// per-window fragments.
pub struct MenuBinder {
    applications: BTreeMap<ApplicationId, ApplicationMenus>,
    windows: BTreeMap<WindowId, MenuFragment>,
    bound: Option<ApplicationId>,
    visible: BTreeSet<MenuFragmentId>,
}

impl MenuBinder {
    /// Attaches the menus of a freshly loaded application.
    ///
    /// Missing declarations are synthesized: a quit-only focused menu, and a switch affordance for
    /// active applications. Passive applications get no switch affordance; system applications
    /// attach nothing. A switch affordance starts visible since the application starts blurred.
    pub fn attach_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
        declared: Option<ApplicationMenus>,
        quit_label: &str,
        effects: &mut Vec<ShellEffect>,
    ) -> bool {
        if descriptor.system {
            logging::log!("system application `{}` attaches no menus", descriptor.id);
            return false;
        }

        let (focused, switcher) = match declared {
            Some(menus) => (menus.focused, menus.switcher),
            None => (
                MenuFragment::quit_only(&descriptor.id, &descriptor.display_name, quit_label),
                None,
            ),
        };
        let switcher = if descriptor.passive {
            None
        } else {
            Some(switcher.unwrap_or_else(|| {
                MenuFragment::switch_affordance(&descriptor.id, &descriptor.display_name)
            }))
        };

        if let Some(switcher) = &switcher {
            self.show(&switcher.id, effects);
        }
        self.applications
            .insert(descriptor.id.clone(), ApplicationMenus { focused, switcher });
        true
    }

    /// Hides and forgets every fragment of `id`.
    pub fn detach_application(&mut self, id: &ApplicationId, effects: &mut Vec<ShellEffect>) {
        let Some(menus) = self.applications.remove(id) else {
            return;
        };
        self.hide(&menus.focused.id, effects);
        if let Some(switcher) = &menus.switcher {
            self.hide(&switcher.id, effects);
        }
        if self.bound.as_ref() == Some(id) {
            self.bound = None;
        }
    }

    /// Shows the focused menu of `id` in place of the bound application's.
    ///
    /// Idempotent when `id` is already bound; returns `false` for unattached applications.
    pub fn bind(&mut self, id: &ApplicationId, effects: &mut Vec<ShellEffect>) -> bool {
        if self.bound.as_ref() == Some(id) {
            return true;
        }
        let Some(menus) = self.applications.get(id).cloned() else {
            return false;
        };

        if let Some(previous) = self.bound.take() {
            if let Some(previous_menus) = self.applications.get(&previous).cloned() {
                self.hide(&previous_menus.focused.id, effects);
            }
        }
        self.show(&menus.focused.id, effects);
        if let Some(switcher) = &menus.switcher {
            self.hide(&switcher.id, effects);
        }
        self.bound = Some(id.clone());
        true
    }

    /// Hides the focused menu of `id` when bound, and shows its switch affordance.
    pub fn blur(&mut self, id: &ApplicationId, effects: &mut Vec<ShellEffect>) {
        let Some(menus) = self.applications.get(id).cloned() else {
            return;
        };
        if self.bound.as_ref() == Some(id) {
            self.hide(&menus.focused.id, effects);
            self.bound = None;
        }
        if let Some(switcher) = &menus.switcher {
            self.show(&switcher.id, effects);
        }
    }

    /// Registers the fragment contributed by a window.
    pub fn attach_window_fragment(
        &mut self,
        window_id: &WindowId,
        fragment: MenuFragment,
        visible: bool,
        effects: &mut Vec<ShellEffect>,
    ) {
        if visible {
            self.show(&fragment.id, effects);
        }
        self.windows.insert(window_id.clone(), fragment);
    }

    /// Toggles a window fragment together with the window's focus.
    pub fn set_window_fragment_visible(
        &mut self,
        window_id: &WindowId,
        visible: bool,
        effects: &mut Vec<ShellEffect>,
    ) {
        let Some(fragment_id) = self.windows.get(window_id).map(|f| f.id.clone()) else {
            return;
        };
        if visible {
            self.show(&fragment_id, effects);
        } else {
            self.hide(&fragment_id, effects);
        }
    }

    /// Hides and forgets the fragment of a closing window.
    pub fn detach_window_fragment(&mut self, window_id: &WindowId, effects: &mut Vec<ShellEffect>) {
        if let Some(fragment) = self.windows.remove(window_id) {
            self.hide(&fragment.id, effects);
        }
    }

    /// Application whose focused menu is visible.
    pub fn bound(&self) -> Option<&ApplicationId> {
        self.bound.as_ref()
    }

    /// Attached menus of `id`.
    pub fn menus(&self, id: &ApplicationId) -> Option<&ApplicationMenus> {
        self.applications.get(id)
    }

    /// Returns whether a fragment is visible.
    pub fn is_visible(&self, id: &MenuFragmentId) -> bool {
        self.visible.contains(id)
    }

    /// Visible fragments ordered by id.
    pub fn visible(&self) -> Vec<MenuFragmentId> {
        self.visible.iter().cloned().collect()
    }

    fn show(&mut self, id: &MenuFragmentId, effects: &mut Vec<ShellEffect>) {
        if self.visible.insert(id.clone()) {
            effects.push(ShellEffect::ShowMenu(id.clone()));
        }
    }

    fn hide(&mut self, id: &MenuFragmentId, effects: &mut Vec<ShellEffect>) {
        if self.visible.remove(id) {
            effects.push(ShellEffect::HideMenu(id.clone()));
        }
    }
}
