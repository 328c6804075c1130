//! Application-level orchestration: open, close, switch and window entry points.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use desktop_app_contract::{
    ApplicationContext, ApplicationControllerFactory, ApplicationDelegate, ApplicationDescriptor,
    ApplicationId, ApplicationLifecycleEvent, ApplicationManifest, ApplicationMenus,
    ControllerAccessor, ControllerContext, MenuAction, MenuFragmentId, WindowControllerFactory,
    WindowDelegate, WindowId,
};
use leptos::logging;
use platform_host::{HostServices, ProgressHandle, ProgressStopCallback};

use crate::{
    config::ShellConfig,
    controllers::ControllerRegistry,
    effects::ShellEffect,
    error::LifecycleError,
    loader,
    model::{
        deliver, ApplicationInstance, AttachedController, ControllerDefinition, Foreground,
        LifecycleCall, LifecycleState, LoadedApplication, WindowPhase, WindowSnapshot,
    },
    registry::{parse_catalog, RegistrationReport, RegistryError},
    window_controller::{self, WindowRequest},
};

struct ManagerInner {
    config: ShellConfig,
    host: HostServices,
    state: RefCell<LifecycleState>,
    controllers: RefCell<ControllerRegistry>,
}

/// Everything downloaded for an application before any of it is registered.
struct PreparedApplication {
    descriptor: ApplicationDescriptor,
    manifest: ApplicationManifest,
    definitions: HashMap<String, ControllerDefinition>,
    windows: Vec<String>,
    delegate: Option<Rc<dyn ApplicationDelegate>>,
    menus: Option<ApplicationMenus>,
}

enum OpenStart {
    Loaded(ApplicationInstance),
    Load(ApplicationDescriptor),
}

/// Entry point for every application-level operation.
///
/// The manager is a cheap cloneable handle over single-threaded state. State is never borrowed
/// across an `.await` or while a controller callback runs, so controllers may call back into the
/// manager from any lifecycle event.
#[derive(Clone)]
pub struct ApplicationLifecycleManager {
    inner: Rc<ManagerInner>,
}

impl ApplicationLifecycleManager {
    /// Creates a manager with an empty catalog.
    pub fn new(config: ShellConfig, host: HostServices) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                config,
                host,
                state: RefCell::new(LifecycleState::default()),
                controllers: RefCell::new(ControllerRegistry::default()),
            }),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    /// Replaces the non-system catalog entries.
    pub fn register_catalog(&self, catalog: Vec<ApplicationDescriptor>) -> RegistrationReport {
        self.with_state(|state| state.registry.register(catalog))
    }

    /// Parses a catalog document and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the document cannot be parsed; the catalog is unchanged.
    pub fn register_catalog_json(&self, raw: &str) -> Result<RegistrationReport, RegistryError> {
        let catalog = parse_catalog(raw)?;
        Ok(self.register_catalog(catalog))
    }

    /// Registers the constructor of window controller `name` for `application_id`.
    pub fn register_window_controller(
        &self,
        application_id: ApplicationId,
        name: impl Into<String>,
        factory: WindowControllerFactory,
    ) {
        self.inner
            .controllers
            .borrow_mut()
            .register_window(application_id, name, factory);
    }

    /// Registers the application-level constructor for `application_id`.
    pub fn register_application_controller(
        &self,
        application_id: ApplicationId,
        factory: ApplicationControllerFactory,
    ) {
        self.inner
            .controllers
            .borrow_mut()
            .register_application(application_id, factory);
    }

    /// Opens `id`, or brings an already loaded instance forward.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotInstalled`], [`LifecycleError::LoadFailure`],
    /// [`LifecycleError::ControllerMissing`], or the suppressed
    /// [`LifecycleError::AlreadyLoading`] or [`LifecycleError::AlreadyClosing`]. A failed open
    /// registers nothing.
    pub async fn open(&self, id: &ApplicationId) -> Result<ApplicationInstance, LifecycleError> {
        self.open_with(id, None).await
    }

    /// Opens `id` with a progress indicator the user can stop.
    ///
    /// Stopping runs `on_stop` once; the pending load completes but is discarded with the
    /// suppressed [`LifecycleError::Cancelled`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::open`], plus [`LifecycleError::Cancelled`].
    pub async fn open_cancellable(
        &self,
        id: &ApplicationId,
        on_stop: ProgressStopCallback,
    ) -> Result<ApplicationInstance, LifecycleError> {
        self.open_with(id, Some(on_stop)).await
    }

    /// Opens `id` and alerts the user about surfaced errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open`].
    pub async fn launch(&self, id: &ApplicationId) -> Result<ApplicationInstance, LifecycleError> {
        let result = self.open(id).await;
        if let Err(err) = &result {
            if !err.is_suppressed() {
                self.inner.host.alerts.alert(&err.to_string());
            }
        }
        result
    }

    async fn open_with(
        &self,
        id: &ApplicationId,
        on_stop: Option<ProgressStopCallback>,
    ) -> Result<ApplicationInstance, LifecycleError> {
        let descriptor = match self.begin_open(id)? {
            OpenStart::Loaded(instance) => return Ok(instance),
            OpenStart::Load(descriptor) => descriptor,
        };

        logging::log!("opening application `{id}`");
        let title = format!(
            "{} {}",
            self.inner.config.loading_title, descriptor.display_name
        );
        let progress = match on_stop {
            Some(on_stop) => ProgressHandle::with_stop(title, on_stop),
            None => ProgressHandle::new(title),
        };
        self.inner.host.progress.show(&progress);

        let result = match self.prepare(descriptor, &progress).await {
            Ok(prepared) => Ok(self.register(prepared)),
            Err(err) => Err(err),
        };

        self.inner.host.progress.close(&progress);
        self.with_state(|state| state.opening.remove(id));
        match &result {
            Ok(instance) => logging::log!(
                "opened application `{id}` (instance {})",
                instance.instance_id
            ),
            Err(err) if err.is_suppressed() => logging::log!("open of `{id}` skipped: {err}"),
            Err(err) => logging::error!("open of `{id}` failed: {err}"),
        }
        result
    }

    fn begin_open(&self, id: &ApplicationId) -> Result<OpenStart, LifecycleError> {
        let loaded = self.with_state(|state| {
            if state.closing.contains(id) {
                return Err(LifecycleError::AlreadyClosing(id.clone()));
            }
            Ok(state
                .applications
                .get(id)
                .map(|app| (app.instance(), app.descriptor.passive)))
        })?;
        if let Some((instance, passive)) = loaded {
            if passive {
                let calls = self.with_state(|state| window_controller::raise_application(state, id));
                deliver(calls);
            } else {
                self.activate(id);
            }
            return Ok(OpenStart::Loaded(instance));
        }

        self.with_state(|state| {
            let descriptor = state
                .registry
                .get(id)
                .cloned()
                .ok_or_else(|| LifecycleError::NotInstalled(id.clone()))?;
            if !state.opening.insert(id.clone()) {
                return Err(LifecycleError::AlreadyLoading(id.clone()));
            }
            Ok(OpenStart::Load(descriptor))
        })
    }

    async fn prepare(
        &self,
        descriptor: ApplicationDescriptor,
        progress: &ProgressHandle,
    ) -> Result<PreparedApplication, LifecycleError> {
        let id = descriptor.id.clone();
        let config = &self.inner.config;
        let fetcher = self.inner.host.fetcher.clone();

        let manifest = loader::fetch_manifest(config, fetcher.as_ref(), &id).await?;
        ensure_running(&id, progress)?;

        let app_controller = config.application_controller.as_str();
        let mut definitions = HashMap::new();
        let mut delegate = None;
        if manifest.controller(app_controller).is_some() {
            let definition =
                loader::fetch_controller(config, fetcher.as_ref(), &id, &manifest, app_controller)
                    .await?;
            ensure_running(&id, progress)?;
            definitions.insert(definition.name.clone(), definition);

            let factory = self.inner.controllers.borrow().application(&id);
            delegate = factory.map(|factory| {
                factory(ApplicationContext {
                    application_id: id.clone(),
                    manifest: manifest.clone(),
                    controllers: self.accessor(&id),
                })
            });
        }
        let menus = delegate.as_ref().and_then(|delegate| delegate.menus());

        let entry = manifest.application.main.clone();
        let delegate_chooses = entry == app_controller;
        let requested = if delegate_chooses {
            delegate
                .as_ref()
                .map(|delegate| delegate.launch_windows())
                .unwrap_or_default()
        } else {
            vec![entry]
        };

        let mut windows = Vec::with_capacity(requested.len());
        for name in requested {
            if !definitions.contains_key(&name) {
                let fetched =
                    loader::fetch_controller(config, fetcher.as_ref(), &id, &manifest, &name)
                        .await;
                ensure_running(&id, progress)?;
                match fetched {
                    Ok(definition) => {
                        definitions.insert(name.clone(), definition);
                    }
                    Err(err) if delegate_chooses => {
                        logging::warn!("skipping window `{name}` requested by `{id}`: {err}");
                        continue;
                    }
                    Err(err) => return Err(err),
                }
            }
            windows.push(name);
        }

        Ok(PreparedApplication {
            descriptor,
            manifest,
            definitions,
            windows,
            delegate,
            menus,
        })
    }

    fn register(&self, prepared: PreparedApplication) -> ApplicationInstance {
        let PreparedApplication {
            descriptor,
            manifest,
            definitions,
            windows,
            delegate,
            menus,
        } = prepared;
        let id = descriptor.id.clone();
        let launch: Vec<ControllerDefinition> = windows
            .iter()
            .filter_map(|name| definitions.get(name).cloned())
            .collect();

        let instance = self.with_state(|state| {
            let instance_id = state.next_instance_id();
            state.effects.push(ShellEffect::CreateWindowGroup {
                application_id: id.clone(),
            });
            let LifecycleState { menus: binder, effects, .. } = &mut *state;
            binder.attach_application(&descriptor, menus, &self.inner.config.quit_label, effects);
            let app = LoadedApplication {
                descriptor: descriptor.clone(),
                instance_id,
                manifest,
                controllers: definitions,
                windows: BTreeMap::new(),
                delegate: delegate.clone(),
            };
            let instance = app.instance();
            state.applications.insert(id.clone(), app);
            instance
        });

        for definition in &launch {
            if let Err(err) = self.present_definition(&id, definition) {
                logging::warn!("could not present `{}` for `{id}`: {err}", definition.name);
            }
        }

        // A launch window may have quit the application already.
        if !self.is_loaded(&id) {
            logging::log!("application `{id}` closed while launching");
            return instance;
        }
        if let Some(delegate) = &delegate {
            delegate.on_lifecycle(ApplicationLifecycleEvent::DidStart);
        }
        if descriptor.can_hold_foreground() {
            self.activate(&id);
        }
        instance
    }

    /// Closes `id` and every window it owns.
    ///
    /// Returns `false` when `id` is not loaded or its close is already underway.
    pub fn close(&self, id: &ApplicationId) -> bool {
        let window_ids = self.with_state(|state| {
            if !state.applications.contains_key(id) || !state.closing.insert(id.clone()) {
                return None;
            }
            let LifecycleState { menus, effects, .. } = &mut *state;
            menus.detach_application(id, effects);
            state
                .applications
                .get(id)
                .map(|app| app.windows.keys().cloned().collect::<Vec<_>>())
        });
        let Some(window_ids) = window_ids else {
            return false;
        };

        logging::log!("closing application `{id}`");
        for window_id in &window_ids {
            self.close_window(window_id);
        }

        // Windows whose own close started before the application close.
        let calls = self.with_state(|state| {
            let remaining: Vec<WindowId> = state
                .applications
                .get(id)
                .map(|app| app.windows.keys().cloned().collect())
                .unwrap_or_default();
            let mut controllers = self.inner.controllers.borrow_mut();
            let mut calls = Vec::new();
            for window_id in remaining {
                if let Some(closed) =
                    window_controller::finish_close(state, &mut controllers, &window_id)
                {
                    calls.extend(closed.calls);
                }
            }
            calls
        });
        deliver(calls);

        let delegate = self.with_state(|state| {
            state
                .applications
                .get(id)
                .and_then(|app| app.delegate.clone())
        });
        if let Some(delegate) = delegate {
            delegate.on_lifecycle(ApplicationLifecycleEvent::DidStop);
        }

        self.with_state(|state| {
            state.applications.remove(id);
            state.closing.remove(id);
            state.effects.push(ShellEffect::RemoveWindowGroup {
                application_id: id.clone(),
            });
            if state.foreground.is(id) {
                state.foreground = Foreground::None;
            }
        });
        true
    }

    /// Makes `id` the foreground application, or raises the top window of a passive one.
    ///
    /// # Errors
    ///
    /// Alerts the user and returns [`LifecycleError::NotLoaded`] when `id` is not running.
    pub fn switch(&self, id: &ApplicationId) -> Result<(), LifecycleError> {
        if !self.is_loaded(id) {
            let err = LifecycleError::NotLoaded(id.clone());
            self.inner.host.alerts.alert(&err.to_string());
            return Err(err);
        }
        self.activate(id);
        Ok(())
    }

    fn activate(&self, id: &ApplicationId) {
        let calls = self.with_state(|state| {
            let mut calls = Vec::new();
            let Some((system, passive)) = state
                .applications
                .get(id)
                .map(|app| (app.descriptor.system, app.descriptor.passive))
            else {
                return calls;
            };
            if system {
                logging::log!("system application `{id}` never takes foreground");
                return calls;
            }
            if state.closing.contains(id) {
                logging::log!("application `{id}` is closing; foreground unchanged");
                return calls;
            }
            if passive || state.foreground.is(id) {
                return window_controller::raise_application(state, id);
            }

            if let Foreground::Application(previous) = state.foreground.clone() {
                let LifecycleState { menus, effects, .. } = &mut *state;
                menus.blur(&previous, effects);
                if let Some(app) = state.applications.get(&previous) {
                    calls.extend(LifecycleCall::application(
                        app,
                        ApplicationLifecycleEvent::DidBlur,
                    ));
                }
            }
            let LifecycleState { menus, effects, .. } = &mut *state;
            menus.bind(id, effects);
            state.foreground = Foreground::Application(id.clone());
            calls.extend(window_controller::raise_application(state, id));
            if let Some(app) = state.applications.get(id) {
                calls.extend(LifecycleCall::application(
                    app,
                    ApplicationLifecycleEvent::DidFocus,
                ));
            }
            calls
        });
        deliver(calls);
    }

    /// Opens a new window of controller `name` in a loaded application.
    ///
    /// A `singleton` controller that already has an open window focuses that window instead.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotLoaded`], [`LifecycleError::ControllerMissing`] or
    /// [`LifecycleError::LoadFailure`].
    pub async fn load_controller(
        &self,
        application_id: &ApplicationId,
        name: &str,
    ) -> Result<WindowId, LifecycleError> {
        let (manifest, cached) = self.with_state(|state| {
            if state.closing.contains(application_id) {
                return Err(LifecycleError::NotLoaded(application_id.clone()));
            }
            let app = state
                .applications
                .get(application_id)
                .ok_or_else(|| LifecycleError::NotLoaded(application_id.clone()))?;
            Ok((app.manifest.clone(), app.controllers.get(name).cloned()))
        })?;
        let declaration =
            manifest
                .controller(name)
                .ok_or_else(|| LifecycleError::ControllerMissing {
                    application_id: application_id.clone(),
                    controller: name.to_string(),
                })?;
        if declaration.singleton {
            if let Some(existing) = self.focus_singleton(application_id, name)? {
                return Ok(existing);
            }
        }

        let definition = match cached {
            Some(definition) => definition,
            None => {
                let fetcher = self.inner.host.fetcher.clone();
                let definition = loader::fetch_controller(
                    &self.inner.config,
                    fetcher.as_ref(),
                    application_id,
                    &manifest,
                    name,
                )
                .await?;
                self.with_state(|state| {
                    let app = state
                        .applications
                        .get_mut(application_id)
                        .ok_or_else(|| LifecycleError::NotLoaded(application_id.clone()))?;
                    app.controllers
                        .insert(name.to_string(), definition.clone());
                    Ok(())
                })?;
                definition
            }
        };

        if definition.singleton {
            if let Some(existing) = self.focus_singleton(application_id, name)? {
                return Ok(existing);
            }
        }
        self.present_definition(application_id, &definition)
    }

    fn focus_singleton(
        &self,
        application_id: &ApplicationId,
        name: &str,
    ) -> Result<Option<WindowId>, LifecycleError> {
        let existing = self.with_state(|state| {
            state.applications.get(application_id).and_then(|app| {
                app.windows
                    .values()
                    .find(|w| w.controller_name == name && w.phase != WindowPhase::Closed)
                    .map(|w| w.id.clone())
            })
        });
        match existing {
            Some(window_id) => {
                self.focus_window(&window_id)?;
                Ok(Some(window_id))
            }
            None => Ok(None),
        }
    }

    /// Adopts a container that already exists in the host page; it gets no chrome and is not
    /// stacked.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotLoaded`] when `application_id` is not running.
    pub fn attach_existing_window(
        &self,
        application_id: &ApplicationId,
        controller_name: &str,
        markup: impl Into<String>,
    ) -> Result<WindowId, LifecycleError> {
        self.present(
            application_id,
            WindowRequest {
                controller_name: controller_name.to_string(),
                modal: false,
                pre_existing: true,
                markup: markup.into(),
            },
        )
    }

    fn present_definition(
        &self,
        application_id: &ApplicationId,
        definition: &ControllerDefinition,
    ) -> Result<WindowId, LifecycleError> {
        logging::log!(
            "presenting `{}` ({}) for `{application_id}`",
            definition.name,
            definition.renderer
        );
        self.present(
            application_id,
            WindowRequest {
                controller_name: definition.name.clone(),
                modal: definition.modal,
                pre_existing: false,
                markup: definition.markup.clone(),
            },
        )
    }

    fn present(
        &self,
        application_id: &ApplicationId,
        request: WindowRequest,
    ) -> Result<WindowId, LifecycleError> {
        let controller_name = request.controller_name.clone();
        let window_id =
            self.with_state(|state| window_controller::create(state, application_id, request))?;

        let script_id = self
            .inner
            .controllers
            .borrow_mut()
            .bind(application_id, &controller_name);
        let controller = script_id.and_then(|script_id| {
            let factory = self.inner.controllers.borrow().resolve(&script_id)?;
            let delegate = factory(ControllerContext {
                window_id: window_id.clone(),
                application_id: application_id.clone(),
                controller_name: controller_name.clone(),
                script_id: script_id.clone(),
                controllers: self.accessor(application_id),
            });
            Some(AttachedController {
                script_id,
                delegate,
            })
        });
        let menu = controller
            .as_ref()
            .and_then(|controller| controller.delegate.menu());

        let calls = self.with_state(|state| {
            window_controller::initialize(state, &window_id, controller, menu)
        });
        deliver(calls);
        let calls = self.with_state(|state| window_controller::show(state, &window_id));
        deliver(calls);
        Ok(window_id)
    }

    /// Closes one window through its own close path.
    ///
    /// Closing the last window of a `quit_automatically` application closes the application.
    /// Returns `false` for unknown windows and windows already closing.
    pub fn close_window(&self, window_id: &WindowId) -> bool {
        let Some(calls) = self.with_state(|state| window_controller::begin_close(state, window_id))
        else {
            return false;
        };
        deliver(calls);

        let closed = self.with_state(|state| {
            window_controller::finish_close(
                state,
                &mut self.inner.controllers.borrow_mut(),
                window_id,
            )
        });
        let Some(closed) = closed else {
            return true;
        };
        deliver(closed.calls);

        if closed.application_empty && self.should_quit(&closed.application_id) {
            logging::log!(
                "last window of `{}` closed; quitting",
                closed.application_id
            );
            self.close(&closed.application_id);
        }
        true
    }

    fn should_quit(&self, id: &ApplicationId) -> bool {
        self.with_state(|state| {
            !state.closing.contains(id)
                && state
                    .applications
                    .get(id)
                    .is_some_and(|app| app.windows.is_empty() && app.quit_automatically())
        })
    }

    /// Focuses a window on user activation, switching its application to foreground first.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::WindowNotFound`] for unknown windows.
    pub fn focus_window(&self, window_id: &WindowId) -> Result<(), LifecycleError> {
        let (owner, needs_switch) = self
            .with_state(|state| {
                let owner = state.owner_of(window_id)?.clone();
                let app = state.applications.get(&owner)?;
                let needs_switch =
                    app.descriptor.can_hold_foreground() && !state.foreground.is(&owner);
                Some((owner, needs_switch))
            })
            .ok_or_else(|| LifecycleError::WindowNotFound(window_id.clone()))?;

        if needs_switch {
            self.activate(&owner);
        }
        let calls = self.with_state(|state| window_controller::focus(state, window_id));
        deliver(calls);
        Ok(())
    }

    /// Performs a menu item activated in one of `id`'s menus.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotLoaded`] when `id` is not running.
    pub fn perform_menu_action(
        &self,
        id: &ApplicationId,
        action: &MenuAction,
    ) -> Result<(), LifecycleError> {
        match action {
            MenuAction::Quit => {
                if self.close(id) || self.is_loaded(id) {
                    Ok(())
                } else {
                    Err(LifecycleError::NotLoaded(id.clone()))
                }
            }
            MenuAction::SwitchTo => self.switch(id),
            MenuAction::Command(command) => {
                let delegate = self
                    .with_state(|state| {
                        state
                            .applications
                            .get(id)
                            .map(|app| app.delegate.clone())
                    })
                    .ok_or_else(|| LifecycleError::NotLoaded(id.clone()))?;
                match delegate {
                    Some(delegate) => delegate.perform_command(command),
                    None => logging::warn!("`{id}` has no controller for command `{command}`"),
                }
                Ok(())
            }
        }
    }

    /// Takes every pending display-tree intent.
    pub fn drain_effects(&self) -> Vec<ShellEffect> {
        self.with_state(|state| std::mem::take(&mut state.effects))
    }

    /// Loaded instance of `id`.
    pub fn instance(&self, id: &ApplicationId) -> Option<ApplicationInstance> {
        self.with_state(|state| state.applications.get(id).map(LoadedApplication::instance))
    }

    /// Returns whether `id` is loaded.
    pub fn is_loaded(&self, id: &ApplicationId) -> bool {
        self.with_state(|state| state.applications.contains_key(id))
    }

    /// Current foreground state.
    pub fn foreground(&self) -> Foreground {
        self.with_state(|state| state.foreground.clone())
    }

    /// Every loaded instance, ordered by id.
    pub fn loaded_applications(&self) -> Vec<ApplicationInstance> {
        self.with_state(|state| {
            state
                .applications
                .values()
                .map(LoadedApplication::instance)
                .collect()
        })
    }

    /// Open windows of `id`.
    pub fn windows(&self, id: &ApplicationId) -> Vec<WindowSnapshot> {
        self.with_state(|state| {
            state
                .applications
                .get(id)
                .map(|app| app.windows.values().map(|w| w.snapshot()).collect())
                .unwrap_or_default()
        })
    }

    /// Snapshot of one window.
    pub fn window(&self, window_id: &WindowId) -> Option<WindowSnapshot> {
        self.with_state(|state| state.snapshot(window_id))
    }

    /// Stacked windows from back to front.
    pub fn stack_order(&self) -> Vec<WindowId> {
        self.with_state(|state| state.stack.order())
    }

    /// Menu fragments currently visible in the system bar.
    pub fn visible_menus(&self) -> Vec<MenuFragmentId> {
        self.with_state(|state| state.menus.visible())
    }

    /// Non-system catalog entries.
    pub fn catalog(&self) -> Vec<ApplicationDescriptor> {
        self.with_state(|state| state.registry.list())
    }

    /// Catalog entry of `id`, system entries included.
    pub fn descriptor(&self, id: &ApplicationId) -> Option<ApplicationDescriptor> {
        self.with_state(|state| state.registry.get(id).cloned())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LifecycleState) -> T) -> T {
        f(&mut self.inner.state.borrow_mut())
    }

    fn accessor(&self, application_id: &ApplicationId) -> ControllerAccessor {
        let weak = Rc::downgrade(&self.inner);

        let window = {
            let weak = weak.clone();
            let application_id = application_id.clone();
            move |window_id: &WindowId| -> Option<Rc<dyn WindowDelegate>> {
                let inner = weak.upgrade()?;
                let state = inner.state.try_borrow().ok()?;
                let delegate = state
                    .applications
                    .get(&application_id)?
                    .windows
                    .get(window_id)?
                    .delegate();
                delegate
            }
        };
        let application = {
            let weak = weak.clone();
            let application_id = application_id.clone();
            move || -> Option<Rc<dyn ApplicationDelegate>> {
                let inner = weak.upgrade()?;
                let state = inner.state.try_borrow().ok()?;
                let delegate = state.applications.get(&application_id)?.delegate.clone();
                delegate
            }
        };
        let windows = {
            let application_id = application_id.clone();
            move || -> Vec<WindowId> {
                let Some(inner) = weak.upgrade() else {
                    return Vec::new();
                };
                let Ok(state) = inner.state.try_borrow() else {
                    return Vec::new();
                };
                let ids = state
                    .applications
                    .get(&application_id)
                    .map(|app| app.windows.keys().cloned().collect())
                    .unwrap_or_default();
                ids
            }
        };

        ControllerAccessor::new(Rc::new(window), Rc::new(application), Rc::new(windows))
    }
}

fn ensure_running(id: &ApplicationId, progress: &ProgressHandle) -> Result<(), LifecycleError> {
    if progress.is_stopped() {
        Err(LifecycleError::Cancelled(id.clone()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{MemoryAlertService, MemoryContentFetcher, NoopProgressIndicator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn manager() -> (ApplicationLifecycleManager, MemoryContentFetcher, MemoryAlertService) {
        let fetcher = MemoryContentFetcher::default();
        let alerts = MemoryAlertService::default();
        let manager = ApplicationLifecycleManager::new(
            ShellConfig::default(),
            HostServices::new(
                Rc::new(fetcher.clone()),
                Rc::new(NoopProgressIndicator),
                Rc::new(alerts.clone()),
            ),
        );
        (manager, fetcher, alerts)
    }

    fn install(manager: &ApplicationLifecycleManager, fetcher: &MemoryContentFetcher, raw: &str) {
        let id = ApplicationId::trusted(raw);
        manager.register_catalog(vec![ApplicationDescriptor::new(id.clone(), raw)]);
        fetcher.insert_json(
            manager.config().manifest_path(&id),
            &json!({
                "application": { "id": raw, "name": raw, "main": "Main" },
                "controllers": { "Main": {} }
            }),
        );
        fetcher.insert_text(
            manager.config().controller_path(&id, "Main", None),
            "<main/>",
        );
    }

    #[test]
    fn open_registers_window_group_window_and_foreground() {
        let (manager, fetcher, _) = manager();
        install(&manager, &fetcher, "app.a");
        let id = ApplicationId::trusted("app.a");

        let instance = block_on(manager.open(&id)).expect("open");

        assert_eq!(instance.application_id, id);
        assert_eq!(manager.foreground(), Foreground::Application(id.clone()));
        let effects = manager.drain_effects();
        assert_eq!(
            effects.first(),
            Some(&ShellEffect::CreateWindowGroup {
                application_id: id.clone()
            })
        );
        assert_eq!(manager.windows(&id).len(), 1);
        assert!(manager.drain_effects().is_empty());
    }

    #[test]
    fn launch_alerts_surfaced_errors_only() {
        let (manager, _, alerts) = manager();
        let err = block_on(manager.launch(&ApplicationId::trusted("app.missing")))
            .expect_err("not installed");

        assert_eq!(
            err,
            LifecycleError::NotInstalled(ApplicationId::trusted("app.missing"))
        );
        assert_eq!(alerts.messages(), vec![err.to_string()]);
    }

    #[test]
    fn switch_to_unloaded_application_alerts() {
        let (manager, _, alerts) = manager();
        let id = ApplicationId::trusted("app.a");

        assert_eq!(manager.switch(&id), Err(LifecycleError::NotLoaded(id)));
        assert_eq!(alerts.messages().len(), 1);
    }

    #[test]
    fn catalog_json_registration() {
        let (manager, _, _) = manager();
        let report = manager
            .register_catalog_json(r#"{ "app.a": { "name": "A" }, "app.dock": { "name": "Dock", "system": true } }"#)
            .expect("catalog");

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(manager.catalog().len(), 1);
        assert!(manager
            .descriptor(&ApplicationId::trusted("app.dock"))
            .expect("dock")
            .system);
    }
}
