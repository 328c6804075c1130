//! Catalog of installable applications.

use std::collections::BTreeMap;

use desktop_app_contract::{ApplicationDescriptor, ApplicationId};
use leptos::logging;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reason a catalog entry was dropped by [`Registry::register`].
pub enum RegistrationRejection {
    /// The id is already registered as a system application.
    SystemIdTaken,
    /// The entry is marked system but the id is registered as a user application.
    PromotionDenied,
    /// The id appears more than once in the supplied catalog.
    Duplicate,
}

impl RegistrationRejection {
    const fn reason(self) -> &'static str {
        match self {
            Self::SystemIdTaken => "id belongs to a system application",
            Self::PromotionDenied => "user application cannot be promoted to system",
            Self::Duplicate => "id listed more than once",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of one [`Registry::register`] call.
pub struct RegistrationReport {
    /// Ids applied by the replacement, in catalog order.
    pub accepted: Vec<ApplicationId>,
    /// Ids dropped with their rejection reason, in catalog order.
    pub rejected: Vec<(ApplicationId, RegistrationRejection)>,
}

#[derive(Debug, Error)]
/// Catalog document failures.
pub enum RegistryError {
    /// The catalog is not a JSON object of application entries.
    #[error("invalid application catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
/// Installed applications keyed by id; system entries survive catalog replacement.
pub struct Registry {
    entries: BTreeMap<ApplicationId, ApplicationDescriptor>,
}

impl Registry {
    /// Replaces every non-system entry with `catalog`, keeping system entries.
    ///
    /// Rejected entries are logged and dropped; the accepted set is applied in one replacement.
    pub fn register(&mut self, catalog: Vec<ApplicationDescriptor>) -> RegistrationReport {
        let mut next: BTreeMap<ApplicationId, ApplicationDescriptor> = self
            .entries
            .iter()
            .filter(|(_, descriptor)| descriptor.system)
            .map(|(id, descriptor)| (id.clone(), descriptor.clone()))
            .collect();
        let mut report = RegistrationReport::default();

        for descriptor in catalog {
            let rejection = match self.entries.get(&descriptor.id) {
                Some(existing) if existing.system => Some(RegistrationRejection::SystemIdTaken),
                Some(_) if descriptor.system => Some(RegistrationRejection::PromotionDenied),
                _ if next.contains_key(&descriptor.id) => Some(RegistrationRejection::Duplicate),
                _ => None,
            };

            match rejection {
                Some(rejection) => {
                    logging::warn!(
                        "rejected application `{}`: {}",
                        descriptor.id,
                        rejection.reason()
                    );
                    report.rejected.push((descriptor.id, rejection));
                }
                None => {
                    report.accepted.push(descriptor.id.clone());
                    next.insert(descriptor.id.clone(), descriptor);
                }
            }
        }

        self.entries = next;
        report
    }

    /// Non-system descriptors, ordered by id.
    pub fn list(&self) -> Vec<ApplicationDescriptor> {
        self.entries
            .values()
            .filter(|descriptor| !descriptor.system)
            .cloned()
            .collect()
    }

    /// Returns the descriptor registered under `id`.
    pub fn get(&self, id: &ApplicationId) -> Option<&ApplicationDescriptor> {
        self.entries.get(id)
    }

    /// Returns whether `id` is registered.
    pub fn contains(&self, id: &ApplicationId) -> bool {
        self.entries.contains_key(id)
    }

    /// Every registered id, system entries included.
    pub fn ids(&self) -> Vec<ApplicationId> {
        self.entries.keys().cloned().collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    system: bool,
    #[serde(default)]
    passive: bool,
    #[serde(default)]
    quit_automatically: bool,
}

/// Parses a catalog document of the form `{ "<id>": { "name": ..., ... } }`.
///
/// Entries whose key is not a valid application id are logged and skipped.
///
/// # Errors
///
/// Returns [`RegistryError::Parse`] when the document is not a map of catalog entries.
pub fn parse_catalog(raw: &str) -> Result<Vec<ApplicationDescriptor>, RegistryError> {
    let entries: BTreeMap<String, CatalogEntry> = serde_json::from_str(raw)?;
    let mut descriptors = Vec::with_capacity(entries.len());
    for (raw_id, entry) in entries {
        let id = match ApplicationId::new(raw_id) {
            Ok(id) => id,
            Err(err) => {
                logging::warn!("skipping catalog entry: {err}");
                continue;
            }
        };
        descriptors.push(ApplicationDescriptor {
            id,
            display_name: entry.name,
            icon: entry.icon,
            system: entry.system,
            passive: entry.passive,
            quit_automatically: entry.quit_automatically,
        });
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(raw: &str) -> ApplicationId {
        ApplicationId::trusted(raw)
    }

    fn user(raw: &str) -> ApplicationDescriptor {
        ApplicationDescriptor::new(id(raw), raw)
    }

    #[test]
    fn replacement_preserves_system_entries_and_rejects_promotion() {
        let mut registry = Registry::default();
        registry.register(vec![user("app.a"), user("app.b").system()]);

        let report = registry.register(vec![user("app.a").system(), user("app.c")]);

        assert_eq!(registry.ids(), vec![id("app.b"), id("app.c")]);
        assert_eq!(report.accepted, vec![id("app.c")]);
        assert_eq!(
            report.rejected,
            vec![(id("app.a"), RegistrationRejection::PromotionDenied)]
        );
    }

    #[test]
    fn system_ids_cannot_be_replaced() {
        let mut registry = Registry::default();
        registry.register(vec![user("app.shell").system()]);

        let report = registry.register(vec![user("app.shell"), user("app.shell").system()]);

        assert_eq!(
            report.rejected,
            vec![
                (id("app.shell"), RegistrationRejection::SystemIdTaken),
                (id("app.shell"), RegistrationRejection::SystemIdTaken),
            ]
        );
        assert!(registry.get(&id("app.shell")).expect("system").system);
    }

    #[test]
    fn new_system_ids_and_duplicates() {
        let mut registry = Registry::default();
        let report = registry.register(vec![
            user("app.dock").system(),
            user("app.a"),
            user("app.a").passive(),
        ]);

        assert_eq!(report.accepted, vec![id("app.dock"), id("app.a")]);
        assert_eq!(
            report.rejected,
            vec![(id("app.a"), RegistrationRejection::Duplicate)]
        );
        assert!(!registry.get(&id("app.a")).expect("app.a").passive);
    }

    #[test]
    fn list_hides_system_entries() {
        let mut registry = Registry::default();
        registry.register(vec![user("app.z"), user("app.dock").system(), user("app.a")]);

        let listed: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(listed, vec![id("app.a"), id("app.z")]);
        assert!(registry.get(&id("app.missing")).is_none());
    }

    #[test]
    fn parse_catalog_reads_flags_and_skips_invalid_ids() {
        let descriptors = parse_catalog(
            r#"{
                "io.bithead.notes": { "name": "Notes", "icon": "notes.svg", "quitAutomatically": true },
                "io.bithead.dock": { "name": "Dock", "system": true },
                "Bad Id": { "name": "Broken" }
            }"#,
        )
        .expect("catalog");

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].id, id("io.bithead.dock"));
        assert!(descriptors[0].system);
        assert_eq!(descriptors[1].display_name, "Notes");
        assert_eq!(descriptors[1].icon.as_deref(), Some("notes.svg"));
        assert!(descriptors[1].quit_automatically);
    }

    #[test]
    fn parse_catalog_rejects_malformed_documents() {
        assert!(matches!(
            parse_catalog("[1, 2]"),
            Err(RegistryError::Parse(_))
        ));
    }
}
