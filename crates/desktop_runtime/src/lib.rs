//! Application and window lifecycle runtime for the desktop shell.
//!
//! [`ApplicationLifecycleManager`] loads application manifests and controllers through the
//! injected [`platform_host::HostServices`], keeps the ordered window stack and system-bar menus
//! consistent, and enforces a single foreground application. Rendering surfaces consume the
//! resulting [`ShellEffect`] queue.

pub mod config;
mod controllers;
pub mod effects;
pub mod error;
mod loader;
pub mod manager;
pub mod menu_binder;
pub mod model;
pub mod registry;
mod window_controller;
pub mod window_stack;

pub use config::{ConfigError, ShellConfig};
pub use effects::{ShellEffect, WindowChrome, WindowLayer};
pub use error::LifecycleError;
pub use manager::ApplicationLifecycleManager;
pub use model::{ApplicationInstance, Foreground, WindowPhase, WindowSnapshot};
pub use registry::{parse_catalog, RegistrationRejection, RegistrationReport, Registry, RegistryError};
pub use window_stack::{StackTransition, WindowStack};
