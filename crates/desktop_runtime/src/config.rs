//! Shell configuration loaded from TOML.

use desktop_app_contract::ApplicationId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default root prefix for application content.
pub const DEFAULT_CONTENT_ROOT: &str = "/boss";
/// Default controller content renderer.
pub const DEFAULT_RENDERER: &str = "html";
/// Manifest controller name reserved for the application-level controller.
pub const DEFAULT_APPLICATION_CONTROLLER: &str = "Application";

#[derive(Debug, Error)]
/// Configuration parse failures.
pub enum ConfigError {
    /// The TOML document could not be parsed into [`ShellConfig`].
    #[error("invalid shell config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Lifecycle runtime configuration.
pub struct ShellConfig {
    /// Path prefix every manifest and controller request is issued under.
    pub content_root: String,
    /// Renderer used when a controller declaration names none.
    pub default_renderer: String,
    /// Manifest controller name of the application-level controller.
    pub application_controller: String,
    /// Label prefix of synthesized quit menus.
    pub quit_label: String,
    /// Progress indicator title prefix while an application loads.
    pub loading_title: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            content_root: DEFAULT_CONTENT_ROOT.to_string(),
            default_renderer: DEFAULT_RENDERER.to_string(),
            application_controller: DEFAULT_APPLICATION_CONTROLLER.to_string(),
            quit_label: "Quit".to_string(),
            loading_title: "Loading".to_string(),
        }
    }
}

impl ShellConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is not valid TOML for this shape.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn root(&self) -> &str {
        self.content_root.trim_end_matches('/')
    }

    /// Path of the manifest for `application_id`.
    pub fn manifest_path(&self, application_id: &ApplicationId) -> String {
        format!("{}/app/{application_id}/application.json", self.root())
    }

    /// Path of the content for controller `name` rendered by `renderer`.
    pub fn controller_path(
        &self,
        application_id: &ApplicationId,
        name: &str,
        renderer: Option<&str>,
    ) -> String {
        let renderer = renderer.unwrap_or(&self.default_renderer);
        format!(
            "{}/app/{application_id}/controller/{name}.{renderer}",
            self.root()
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_paths_follow_content_layout() {
        let config = ShellConfig::default();
        let id = ApplicationId::trusted("io.bithead.notes");
        assert_eq!(
            config.manifest_path(&id),
            "/boss/app/io.bithead.notes/application.json"
        );
        assert_eq!(
            config.controller_path(&id, "Main", None),
            "/boss/app/io.bithead.notes/controller/Main.html"
        );
        assert_eq!(
            config.controller_path(&id, "Main", Some("json")),
            "/boss/app/io.bithead.notes/controller/Main.json"
        );
    }

    #[test]
    fn toml_overrides_keep_unset_defaults() {
        let config = ShellConfig::from_toml_str(
            r#"
content_root = "/os/"
quit_label = "Exit"
"#,
        )
        .expect("config");

        assert_eq!(config.content_root, "/os/");
        assert_eq!(config.quit_label, "Exit");
        assert_eq!(config.default_renderer, "html");
        assert_eq!(
            config.manifest_path(&ApplicationId::trusted("app.a")),
            "/os/app/app.a/application.json"
        );
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(ShellConfig::from_toml_str("content_root = [").is_err());
    }
}
