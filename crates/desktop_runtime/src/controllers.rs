//! Registry of controller constructors and their per-window script bindings.

use std::collections::HashMap;

use desktop_app_contract::{
    ApplicationControllerFactory, ApplicationId, ScriptId, WindowControllerFactory,
};
use platform_host::generate_unique_object_id;

#[derive(Default)]
/// Constructors registered ahead of time, keyed by application and manifest controller name.
///
/// Every window instance binds its constructor under a freshly generated [`ScriptId`]; the
/// binding is released when the window unregisters its controller.
pub struct ControllerRegistry {
    windows: HashMap<(ApplicationId, String), WindowControllerFactory>,
    applications: HashMap<ApplicationId, ApplicationControllerFactory>,
    bound: HashMap<ScriptId, WindowControllerFactory>,
}

impl ControllerRegistry {
    /// Registers the constructor for controller `name` of `application_id`.
    pub fn register_window(
        &mut self,
        application_id: ApplicationId,
        name: impl Into<String>,
        factory: WindowControllerFactory,
    ) {
        self.windows.insert((application_id, name.into()), factory);
    }

    /// Registers the application-level constructor of `application_id`.
    pub fn register_application(
        &mut self,
        application_id: ApplicationId,
        factory: ApplicationControllerFactory,
    ) {
        self.applications.insert(application_id, factory);
    }

    /// Returns the application-level constructor of `application_id`.
    pub fn application(&self, application_id: &ApplicationId) -> Option<ApplicationControllerFactory> {
        self.applications.get(application_id).cloned()
    }

    /// Binds the constructor of `name` under a new script id.
    ///
    /// Returns `None` when no constructor is registered; such windows render content only.
    pub fn bind(&mut self, application_id: &ApplicationId, name: &str) -> Option<ScriptId> {
        let factory = self
            .windows
            .get(&(application_id.clone(), name.to_string()))?
            .clone();
        let token = generate_unique_object_id(|candidate| {
            self.bound.contains_key(&ScriptId::new(candidate))
        });
        let script_id = ScriptId::new(token);
        self.bound.insert(script_id.clone(), factory);
        Some(script_id)
    }

    /// Returns the constructor bound under `script_id`.
    pub fn resolve(&self, script_id: &ScriptId) -> Option<WindowControllerFactory> {
        self.bound.get(script_id).cloned()
    }

    /// Releases a script binding.
    pub fn unbind(&mut self, script_id: &ScriptId) -> bool {
        self.bound.remove(script_id).is_some()
    }

    /// Number of live script bindings.
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use desktop_app_contract::{
        ControllerAccessor, ControllerContext, WindowDelegate, WindowId,
    };
    use platform_host::is_object_id;

    use super::*;

    struct Plain;

    impl WindowDelegate for Plain {}

    #[test]
    fn bindings_are_unique_per_window_instance() {
        let mut registry = ControllerRegistry::default();
        let app = ApplicationId::trusted("app.a");
        registry.register_window(
            app.clone(),
            "Main",
            Rc::new(|_ctx: ControllerContext| -> Rc<dyn WindowDelegate> { Rc::new(Plain) }),
        );

        let first = registry.bind(&app, "Main").expect("first");
        let second = registry.bind(&app, "Main").expect("second");
        assert_ne!(first, second);
        assert!(is_object_id(first.as_str()));
        assert_eq!(registry.bound_count(), 2);

        let factory = registry.resolve(&first).expect("factory");
        let _delegate = factory(ControllerContext {
            window_id: WindowId::new("Wabc1234"),
            application_id: app.clone(),
            controller_name: "Main".to_string(),
            script_id: first.clone(),
            controllers: ControllerAccessor::detached(),
        });

        assert!(registry.unbind(&first));
        assert!(!registry.unbind(&first));
        assert!(registry.resolve(&first).is_none());
        assert_eq!(registry.bound_count(), 1);
    }

    #[test]
    fn unknown_constructors_do_not_bind() {
        let mut registry = ControllerRegistry::default();
        assert!(registry
            .bind(&ApplicationId::trusted("app.a"), "Main")
            .is_none());
        assert!(registry.application(&ApplicationId::trusted("app.a")).is_none());
    }
}
