//! Manifest and controller content retrieval.

use desktop_app_contract::{ApplicationId, ApplicationManifest};
use platform_host::{fetch_checked_with, fetch_json_with, ContentFetcher};

use crate::{config::ShellConfig, error::LifecycleError, model::ControllerDefinition};

/// Downloads and validates the manifest of `application_id`.
pub(crate) async fn fetch_manifest(
    config: &ShellConfig,
    fetcher: &dyn ContentFetcher,
    application_id: &ApplicationId,
) -> Result<ApplicationManifest, LifecycleError> {
    let path = config.manifest_path(application_id);
    let manifest: ApplicationManifest = fetch_json_with(fetcher, &path)
        .await
        .map_err(|err| LifecycleError::load_failure(application_id, err))?;

    if &manifest.application.id != application_id {
        return Err(LifecycleError::load_failure(
            application_id,
            format!(
                "manifest at {path} declares application `{}`",
                manifest.application.id
            ),
        ));
    }
    Ok(manifest)
}

/// Downloads the content of controller `name` as declared by `manifest`.
pub(crate) async fn fetch_controller(
    config: &ShellConfig,
    fetcher: &dyn ContentFetcher,
    application_id: &ApplicationId,
    manifest: &ApplicationManifest,
    name: &str,
) -> Result<ControllerDefinition, LifecycleError> {
    let declaration =
        manifest
            .controller(name)
            .ok_or_else(|| LifecycleError::ControllerMissing {
                application_id: application_id.clone(),
                controller: name.to_string(),
            })?;
    let renderer = declaration
        .renderer
        .clone()
        .unwrap_or_else(|| config.default_renderer.clone());
    let path = config.controller_path(application_id, name, Some(&renderer));
    let markup = fetch_checked_with(fetcher, &path)
        .await
        .map_err(|err| LifecycleError::load_failure(application_id, err))?;

    Ok(ControllerDefinition {
        name: name.to_string(),
        renderer,
        singleton: declaration.singleton,
        modal: declaration.modal,
        markup,
    })
}
