#![forbid(unsafe_code)]

//! The settings-page variant.
//!
//! The classic admin page renders the same schemas as the block editor,
//! but commits through an explicit submit: the posted form is decoded
//! into a nested value map, sanitized against the schemas, and saved as a
//! new snapshot in the versioning store.

pub mod sanitize;
pub mod submission;

use bform_backend::OptionStore;
use bform_render::{Node, RenderContext};
use bform_schema::registry::AttributeEncoding;
use bform_schema::{FieldSchema, ValueMap};
use bform_store::{Persisted, ValueStore};
use bform_versions::{VersionError, VersionStore};
use bform_widgets::{NullLookup, ViewLookup, WidgetSet, render_form};
use thiserror::Error;

pub use sanitize::sanitize;
pub use submission::{SubmissionError, decode_form};

/// Why a settings operation failed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// One settings instance: schemas plus its versioned store.
pub struct SettingsSession<K> {
    fields: Vec<FieldSchema>,
    versions: VersionStore<K>,
    widgets: WidgetSet,
}

impl<K: OptionStore> SettingsSession<K> {
    #[must_use]
    pub fn new(fields: Vec<FieldSchema>, versions: VersionStore<K>) -> Self {
        Self {
            fields,
            versions,
            widgets: WidgetSet::standard(),
        }
    }

    /// Render the form over the active snapshot's values.
    pub fn view(&self) -> Result<Node, SettingsError> {
        self.view_with(&NullLookup)
    }

    /// Render with host-resolved display state (asset previews etc.).
    pub fn view_with(&self, lookup: &dyn ViewLookup) -> Result<Node, SettingsError> {
        let store = self.current_store()?;
        Ok(render_form(
            &self.fields,
            &store,
            RenderContext::SettingsPage,
            &self.widgets,
            lookup,
        ))
    }

    /// The active snapshot's values as a value store (read-only view).
    pub fn current_store(&self) -> Result<ValueStore, SettingsError> {
        let values = self.versions.active_value()?;
        Ok(ValueStore::load(
            AttributeEncoding::PerField,
            Persisted::PerField(values),
        ))
    }

    /// Handle one form submission: decode, sanitize, snapshot.
    ///
    /// Nothing is persisted when decoding fails; sanitization never fails
    /// (bad values degrade to defaults).
    pub fn submit(
        &mut self,
        prefix: &str,
        pairs: &[(String, String)],
        timestamp: i64,
        author: &str,
    ) -> Result<ValueMap, SettingsError> {
        let raw = decode_form(prefix, pairs)?;
        let clean = sanitize(&self.fields, &raw);
        self.versions.save(&clean, timestamp, author)?;
        tracing::debug!(
            target: "bform.settings",
            instance = %self.versions.instance(),
            timestamp,
            fields = clean.len(),
            "settings saved"
        );
        Ok(clean)
    }

    pub fn restore(&mut self, timestamp: i64) -> Result<(), SettingsError> {
        Ok(self.versions.restore(timestamp)?)
    }

    pub fn delete(&mut self, timestamp: i64) -> Result<(), SettingsError> {
        Ok(self.versions.delete(timestamp)?)
    }

    /// The version manager's "clear history" action.
    pub fn clear_history(&mut self) -> Result<(), SettingsError> {
        Ok(self.versions.prune_all_but_active()?)
    }

    #[must_use]
    pub fn versions(&self) -> &VersionStore<K> {
        &self.versions
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bform_backend::memory::MemoryOptions;
    use bform_schema::{FieldType, Value};

    fn fields() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("site_title", FieldType::Text).with_default("".into()),
            FieldSchema::new("columns", FieldType::Range).with_range(1.0, 6.0, 1.0),
            FieldSchema::new("links", FieldType::Repeater)
                .with_row_bounds(0, 2)
                .with_sub_fields([
                    FieldSchema::new("label", FieldType::Text),
                    FieldSchema::new("url", FieldType::Text),
                ]),
        ]
    }

    fn session() -> SettingsSession<MemoryOptions> {
        SettingsSession::new(
            fields(),
            VersionStore::new(MemoryOptions::new(), "settings_main"),
        )
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn submit_decodes_sanitizes_and_snapshots() {
        let mut session = session();
        let posted = pairs(&[
            ("opts[site_title]", "Hello"),
            ("opts[columns]", "99"),
            ("opts[links][0][label]", "Home"),
            ("opts[links][0][url]", "/"),
            ("opts[links][1][label]", "About"),
            ("opts[links][1][url]", "/about"),
        ]);
        let clean = session.submit("opts", &posted, 100, "admin").unwrap();

        assert_eq!(clean.get("site_title"), Some(&Value::text("Hello")));
        // Out-of-range number clamps to the max.
        assert_eq!(clean.get("columns"), Some(&Value::Number(6.0)));
        let rows = clean.get("links").and_then(Value::as_rows).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("url"), Some(&Value::text("/about")));

        assert_eq!(session.versions().active_timestamp().unwrap(), Some(100));
        let store = session.current_store().unwrap();
        assert_eq!(store.get("site_title"), Some(&Value::text("Hello")));
    }

    #[test]
    fn each_submit_is_a_new_snapshot() {
        let mut session = session();
        session
            .submit("opts", &pairs(&[("opts[site_title]", "one")]), 100, "a")
            .unwrap();
        session
            .submit("opts", &pairs(&[("opts[site_title]", "two")]), 200, "b")
            .unwrap();

        assert_eq!(session.versions().versions().unwrap().len(), 2);
        session.restore(100).unwrap();
        let store = session.current_store().unwrap();
        assert_eq!(store.get("site_title"), Some(&Value::text("one")));
    }

    #[test]
    fn version_manager_guards_flow_through() {
        let mut session = session();
        session
            .submit("opts", &pairs(&[("opts[site_title]", "one")]), 100, "a")
            .unwrap();
        session
            .submit("opts", &pairs(&[("opts[site_title]", "two")]), 200, "a")
            .unwrap();

        assert!(session.delete(200).is_err(), "active is protected");
        session.delete(100).unwrap();
        assert!(session.delete(200).is_err(), "sole snapshot is protected");

        session
            .submit("opts", &pairs(&[("opts[site_title]", "three")]), 300, "a")
            .unwrap();
        session.clear_history().unwrap();
        let versions = session.versions().versions().unwrap();
        assert_eq!(versions.len(), 1);
        assert!(versions.contains_key(&300));
    }

    #[test]
    fn malformed_submission_persists_nothing() {
        let mut session = session();
        let posted = pairs(&[("opts[links][not_a_number][label]", "x")]);
        assert!(matches!(
            session.submit("opts", &posted, 100, "a"),
            Err(SettingsError::Submission(_))
        ));
        assert_eq!(session.versions().versions().unwrap().len(), 0);
    }

    #[test]
    fn settings_form_renders_active_values() {
        let mut session = session();
        session
            .submit("opts", &pairs(&[("opts[site_title]", "Live")]), 100, "a")
            .unwrap();
        let tree = session.view().unwrap();
        let inputs = tree.find_all(|n| {
            matches!(
                n,
                Node::Control {
                    control: bform_render::Control::TextInput { .. },
                    ..
                }
            )
        });
        assert!(inputs.iter().any(|n| matches!(
            n,
            Node::Control {
                control: bform_render::Control::TextInput { value, .. },
                ..
            } if value == "Live"
        )));
    }
}
