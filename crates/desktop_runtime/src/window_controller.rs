//! Per-window lifecycle: `Created -> Initialized -> Shown -> Closed`.
//!
//! Every function mutates [`LifecycleState`] synchronously and returns the controller callbacks
//! it produced; callers deliver them once the state borrow is released.

use desktop_app_contract::{ApplicationId, MenuFragment, WindowId, WindowLifecycleEvent};
use leptos::logging;
use platform_host::generate_unique_object_id;

use crate::{
    controllers::ControllerRegistry,
    effects::{ShellEffect, WindowChrome, WindowLayer},
    error::LifecycleError,
    model::{AttachedController, LifecycleCall, LifecycleState, WindowEntry, WindowPhase},
    window_stack::StackTransition,
};

/// Parameters of a window about to be created.
pub(crate) struct WindowRequest {
    pub controller_name: String,
    pub modal: bool,
    pub pre_existing: bool,
    pub markup: String,
}

/// Result of the second close phase.
pub(crate) struct ClosedWindow {
    pub application_id: ApplicationId,
    pub application_empty: bool,
    pub calls: Vec<LifecycleCall>,
}

/// Creates a window entry for a loaded application under a fresh session-unique id.
pub(crate) fn create(
    state: &mut LifecycleState,
    application_id: &ApplicationId,
    request: WindowRequest,
) -> Result<WindowId, LifecycleError> {
    if !state.applications.contains_key(application_id) {
        return Err(LifecycleError::NotLoaded(application_id.clone()));
    }
    let window_id = WindowId::new(generate_unique_object_id(|candidate| {
        state.window_exists(candidate)
    }));
    let entry = WindowEntry {
        id: window_id.clone(),
        application_id: application_id.clone(),
        controller_name: request.controller_name,
        modal: request.modal,
        pre_existing: request.pre_existing,
        position: None,
        phase: WindowPhase::Created,
        blurred: false,
        markup: request.markup,
        menu: None,
        controller: None,
    };
    let app = state
        .applications
        .get_mut(application_id)
        .ok_or_else(|| LifecycleError::NotLoaded(application_id.clone()))?;
    app.windows.insert(window_id.clone(), entry);
    Ok(window_id)
}

/// Attaches the controller, wires chrome and menu, and stacks and focuses the window.
///
/// Runs once per window; later calls return no callbacks.
pub(crate) fn initialize(
    state: &mut LifecycleState,
    window_id: &WindowId,
    controller: Option<AttachedController>,
    menu: Option<MenuFragment>,
) -> Vec<LifecycleCall> {
    let mut calls = Vec::new();
    let Some(window) = state.window_mut(window_id) else {
        return calls;
    };
    if window.phase != WindowPhase::Created {
        logging::warn!("window `{window_id}` is already initialized");
        return calls;
    }

    window.controller = controller;
    window.phase = WindowPhase::Initialized;
    window.menu = menu.as_ref().map(|fragment| fragment.id.clone());
    let stacked = window.stacked();
    let modal = window.modal;
    calls.extend(LifecycleCall::window(window, WindowLifecycleEvent::ViewDidLoad));

    if stacked {
        state.effects.push(ShellEffect::InstallChrome {
            window_id: window_id.clone(),
            chrome: WindowChrome::default(),
        });
    }
    if let Some(fragment) = menu {
        let LifecycleState { menus, effects, .. } = &mut *state;
        menus.attach_window_fragment(window_id, fragment, false, effects);
    }

    if stacked {
        calls.extend(focus(state, window_id));
    } else if modal {
        let LifecycleState { menus, effects, .. } = &mut *state;
        menus.set_window_fragment_visible(window_id, true, effects);
        if let Some(window) = state.window(window_id) {
            calls.extend(LifecycleCall::window(
                window,
                WindowLifecycleEvent::DidFocusWindow,
            ));
        }
    }
    calls
}

/// Attaches the window container to the display tree; allowed once.
pub(crate) fn show(state: &mut LifecycleState, window_id: &WindowId) -> Vec<LifecycleCall> {
    let Some(window) = state.window_mut(window_id) else {
        return Vec::new();
    };
    if window.phase != WindowPhase::Initialized {
        logging::warn!(
            "ignoring show for window `{window_id}` in phase {:?}",
            window.phase
        );
        return Vec::new();
    }

    window.phase = WindowPhase::Shown;
    let layer = if window.modal {
        WindowLayer::Modal
    } else if window.pre_existing {
        WindowLayer::Existing
    } else {
        WindowLayer::Stacked(window.position.unwrap_or_default())
    };
    let effect = ShellEffect::AttachWindow {
        window_id: window_id.clone(),
        application_id: window.application_id.clone(),
        markup: window.markup.clone(),
        layer,
    };
    let call = LifecycleCall::window(window, WindowLifecycleEvent::ViewDidAppear);
    state.effects.push(effect);
    call.into_iter().collect()
}

/// Raises a stacked window to the top and focuses it, blurring the previous top window.
///
/// Windows outside the stack produce no transition.
pub(crate) fn focus(state: &mut LifecycleState, window_id: &WindowId) -> Vec<LifecycleCall> {
    let stacked = state.window(window_id).is_some_and(WindowEntry::stacked);
    if !stacked {
        return Vec::new();
    }
    let transition = if state.stack.contains(window_id) {
        state.stack.focus(window_id)
    } else {
        let blurred = state.stack.top().cloned();
        state.stack.push(window_id.clone());
        StackTransition {
            blurred,
            focused: Some(window_id.clone()),
        }
    };
    sync_positions(state);
    apply_transition(state, transition)
}

/// Raises the highest window of `application_id`.
pub(crate) fn raise_application(
    state: &mut LifecycleState,
    application_id: &ApplicationId,
) -> Vec<LifecycleCall> {
    match state.top_window_of(application_id) {
        Some(window_id) => focus(state, &window_id),
        None => Vec::new(),
    }
}

/// First close phase: marks the window closed and returns its `ViewWillUnload` callback.
///
/// Returns `None` for unknown windows and windows whose close already started.
pub(crate) fn begin_close(
    state: &mut LifecycleState,
    window_id: &WindowId,
) -> Option<Vec<LifecycleCall>> {
    let window = state.window_mut(window_id)?;
    if window.phase == WindowPhase::Closed {
        return None;
    }
    window.phase = WindowPhase::Closed;
    Some(
        LifecycleCall::window(window, WindowLifecycleEvent::ViewWillUnload)
            .into_iter()
            .collect(),
    )
}

/// Second close phase: unregisters the controller, detaches menu and container, and restacks.
pub(crate) fn finish_close(
    state: &mut LifecycleState,
    controllers: &mut ControllerRegistry,
    window_id: &WindowId,
) -> Option<ClosedWindow> {
    let application_id = state.owner_of(window_id)?.clone();
    let app = state.applications.get_mut(&application_id)?;
    let window = app.windows.remove(window_id)?;
    let application_empty = app.windows.is_empty();

    if let Some(controller) = &window.controller {
        controllers.unbind(&controller.script_id);
    }
    {
        let LifecycleState { menus, effects, .. } = &mut *state;
        menus.detach_window_fragment(window_id, effects);
    }
    state.effects.push(ShellEffect::DetachWindow {
        window_id: window_id.clone(),
    });

    let mut calls = Vec::new();
    if window.stacked() && state.stack.remove(window_id) {
        sync_positions(state);
        let transition = state.stack.focus_top();
        calls.extend(apply_transition(state, transition));
    }
    Some(ClosedWindow {
        application_id,
        application_empty,
        calls,
    })
}

fn apply_transition(state: &mut LifecycleState, transition: StackTransition) -> Vec<LifecycleCall> {
    let mut calls = Vec::new();
    if let Some(blurred) = transition.blurred.as_ref() {
        if transition.focused.as_ref() != Some(blurred) {
            calls.extend(set_blurred(state, blurred, true));
        }
    }
    if let Some(focused) = transition.focused.as_ref() {
        calls.extend(set_blurred(state, focused, false));
    }
    calls
}

fn set_blurred(
    state: &mut LifecycleState,
    window_id: &WindowId,
    blurred: bool,
) -> Option<LifecycleCall> {
    let window = state.window_mut(window_id)?;
    window.blurred = blurred;
    let event = if blurred {
        WindowLifecycleEvent::DidBlurWindow
    } else {
        WindowLifecycleEvent::DidFocusWindow
    };
    let call = LifecycleCall::window(window, event);

    state.effects.push(ShellEffect::SetWindowBlurred {
        window_id: window_id.clone(),
        blurred,
    });
    let LifecycleState { menus, effects, .. } = &mut *state;
    menus.set_window_fragment_visible(window_id, !blurred, effects);
    call
}

fn sync_positions(state: &mut LifecycleState) {
    let positions: Vec<(WindowId, usize)> = state
        .stack
        .iter()
        .map(|w| (w.id.clone(), w.position))
        .collect();
    for (window_id, position) in positions {
        let Some(window) = state.window_mut(&window_id) else {
            continue;
        };
        if window.position != Some(position) {
            window.position = Some(position);
            state.effects.push(ShellEffect::SetStackPosition {
                window_id,
                position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use desktop_app_contract::{
        ApplicationDescriptor, ApplicationInfo, ApplicationManifest, MenuFragmentId, ScriptId,
        WindowDelegate,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{deliver, LoadedApplication};

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<WindowLifecycleEvent>>,
    }

    impl WindowDelegate for Recorder {
        fn on_lifecycle(&self, event: WindowLifecycleEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    fn app_id() -> ApplicationId {
        ApplicationId::trusted("app.a")
    }

    fn state_with_app() -> LifecycleState {
        let mut state = LifecycleState::default();
        let manifest = ApplicationManifest {
            application: ApplicationInfo {
                id: app_id(),
                name: "A".to_string(),
                icon: None,
                version: String::new(),
                main: "Main".to_string(),
                menu: false,
                quit_automatically: false,
            },
            controllers: Default::default(),
        };
        state.applications.insert(
            app_id(),
            LoadedApplication {
                descriptor: ApplicationDescriptor::new(app_id(), "A"),
                instance_id: 1,
                manifest,
                controllers: HashMap::new(),
                windows: Default::default(),
                delegate: None,
            },
        );
        state
    }

    fn open(
        state: &mut LifecycleState,
        modal: bool,
        menu: Option<&str>,
    ) -> (WindowId, Rc<Recorder>) {
        let window_id = create(
            state,
            &app_id(),
            WindowRequest {
                controller_name: "Main".to_string(),
                modal,
                pre_existing: false,
                markup: "<p/>".to_string(),
            },
        )
        .expect("create");
        let recorder = Rc::new(Recorder::default());
        let controller = AttachedController {
            script_id: ScriptId::new(format!("S{}", window_id)),
            delegate: recorder.clone(),
        };
        let menu = menu.map(|raw| MenuFragment::new(MenuFragmentId::new(raw), Vec::new()));
        deliver(initialize(state, &window_id, Some(controller), menu));
        deliver(show(state, &window_id));
        (window_id, recorder)
    }

    #[test]
    fn new_window_blurs_previous_top_and_follows_lifecycle_order() {
        let mut state = state_with_app();
        let (first, first_rec) = open(&mut state, false, Some("first.menu"));
        let (second, second_rec) = open(&mut state, false, None);

        assert_eq!(
            first_rec.events.borrow().clone(),
            vec![
                WindowLifecycleEvent::ViewDidLoad,
                WindowLifecycleEvent::DidFocusWindow,
                WindowLifecycleEvent::ViewDidAppear,
                WindowLifecycleEvent::DidBlurWindow,
            ]
        );
        assert_eq!(
            second_rec.events.borrow().clone(),
            vec![
                WindowLifecycleEvent::ViewDidLoad,
                WindowLifecycleEvent::DidFocusWindow,
                WindowLifecycleEvent::ViewDidAppear,
            ]
        );
        assert_eq!(state.stack.order(), vec![first.clone(), second.clone()]);
        assert!(state.window(&first).expect("first").blurred);
        assert!(!state.menus.is_visible(&MenuFragmentId::new("first.menu")));
        assert_eq!(state.window(&second).expect("second").position, Some(1));
    }

    #[test]
    fn show_runs_once() {
        let mut state = state_with_app();
        let (window_id, recorder) = open(&mut state, false, None);
        state.effects.clear();

        assert!(show(&mut state, &window_id).is_empty());
        assert!(state.effects.is_empty());
        assert_eq!(
            recorder
                .events
                .borrow()
                .iter()
                .filter(|e| **e == WindowLifecycleEvent::ViewDidAppear)
                .count(),
            1
        );
    }

    #[test]
    fn modal_windows_skip_chrome_and_stack() {
        let mut state = state_with_app();
        let (window_id, recorder) = open(&mut state, true, Some("modal.menu"));

        assert!(state.stack.is_empty());
        assert!(!state
            .effects
            .iter()
            .any(|e| matches!(e, ShellEffect::InstallChrome { .. })));
        assert!(state.effects.contains(&ShellEffect::AttachWindow {
            window_id: window_id.clone(),
            application_id: app_id(),
            markup: "<p/>".to_string(),
            layer: WindowLayer::Modal,
        }));
        assert!(state.menus.is_visible(&MenuFragmentId::new("modal.menu")));
        assert_eq!(
            recorder.events.borrow()[1],
            WindowLifecycleEvent::DidFocusWindow
        );
    }

    #[test]
    fn close_detaches_and_refocuses_top() {
        let mut state = state_with_app();
        let mut registry = ControllerRegistry::default();
        let (first, first_rec) = open(&mut state, false, None);
        let (second, second_rec) = open(&mut state, false, Some("second.menu"));
        let (third, _) = open(&mut state, false, None);
        deliver(focus(&mut state, &second));

        let calls = begin_close(&mut state, &second).expect("begin");
        deliver(calls);
        assert!(begin_close(&mut state, &second).is_none());
        let closed = finish_close(&mut state, &mut registry, &second).expect("finish");
        deliver(closed.calls);

        assert!(!closed.application_empty);
        assert_eq!(state.stack.order(), vec![first.clone(), third.clone()]);
        assert_eq!(state.window(&third).expect("third").position, Some(1));
        assert!(!state.window(&third).expect("third").blurred);
        assert!(state.window(&first).expect("first").blurred);
        assert!(!state.menus.is_visible(&MenuFragmentId::new("second.menu")));
        assert!(state.effects.contains(&ShellEffect::DetachWindow {
            window_id: second.clone(),
        }));
        assert_eq!(
            second_rec.events.borrow().last(),
            Some(&WindowLifecycleEvent::ViewWillUnload)
        );
        assert_eq!(
            first_rec.events.borrow().last(),
            Some(&WindowLifecycleEvent::DidBlurWindow)
        );
        assert!(finish_close(&mut state, &mut registry, &second).is_none());
    }

    #[test]
    fn closing_last_window_reports_empty_application() {
        let mut state = state_with_app();
        let mut registry = ControllerRegistry::default();
        let (window_id, _) = open(&mut state, false, None);

        deliver(begin_close(&mut state, &window_id).expect("begin"));
        let closed = finish_close(&mut state, &mut registry, &window_id).expect("finish");

        assert!(closed.application_empty);
        assert_eq!(closed.application_id, app_id());
        assert!(closed.calls.is_empty());
        assert!(state.stack.is_empty());
    }

    #[test]
    fn create_requires_loaded_application() {
        let mut state = LifecycleState::default();
        let err = create(
            &mut state,
            &app_id(),
            WindowRequest {
                controller_name: "Main".to_string(),
                modal: false,
                pre_existing: false,
                markup: String::new(),
            },
        )
        .expect_err("not loaded");
        assert_eq!(err, LifecycleError::NotLoaded(app_id()));
    }
}
