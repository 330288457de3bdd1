//! Reconciliation engine
//!
//! Converges the registry towards the subjects declared in a kafka file.
//! Subjects are processed one at a time, in declaration order:
//!
//! ```text
//! absent from registry ──────────────────────────────▶ CREATE (register)
//! present ─▶ latest == desired ──────────────────────▶ NOOP
//!          └▶ latest != desired ─▶ compatible ───────▶ UPDATE (register)
//!                                └▶ incompatible ────▶ abort the run
//! ```
//!
//! In dry-run mode the register calls are skipped; every read-only call,
//! including compatibility testing, still happens.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::schema_diff;
use crate::equality::schemas_equal;
use crate::error::{Result, SchemaError};
use crate::kafka_file::KafkaFile;
use crate::registry::RegistryGateway;
use crate::schema::{SchemaType, Subject};
use crate::source::load_subjects;

/// What reconciliation did (or would do) for a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Create,
    Update,
    Noop,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::Noop => "NOOP",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for a single subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileAction {
    /// Action taken
    #[serde(rename = "action")]
    pub action_type: ActionType,
    /// Subject the action concerns
    pub subject: String,
    /// Type of the desired schema
    pub schema_type: SchemaType,
    /// Id returned by the registry, when a schema was actually registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<i64>,
    /// Registered-to-desired diff, for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl ReconcileAction {
    fn new(action_type: ActionType, subject: &Subject) -> Self {
        Self {
            action_type,
            subject: subject.name.clone(),
            schema_type: subject.schema_type,
            schema_id: None,
            diff: None,
        }
    }
}

/// Drives a registry gateway towards a desired subject list
pub struct Reconciler<G> {
    gateway: G,
    dry_run: bool,
}

impl<G: RegistryGateway> Reconciler<G> {
    /// Create a reconciler; in dry-run mode nothing is registered
    pub fn new(gateway: G, dry_run: bool) -> Self {
        Self { gateway, dry_run }
    }

    /// Compute, and unless dry-run apply, the action for every subject
    ///
    /// Stops at the first error; no partial action list is returned.
    pub fn reconcile(&self, subjects: &[Subject]) -> Result<Vec<ReconcileAction>> {
        let existing: HashSet<String> = self
            .gateway
            .list_subjects()
            .map_err(SchemaError::ListSubjects)?
            .into_iter()
            .collect();

        tracing::info!(
            desired = subjects.len(),
            existing = existing.len(),
            dry_run = self.dry_run,
            "reconciling subjects"
        );

        let mut actions = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let action = self.reconcile_subject(subject, existing.contains(&subject.name))?;
            tracing::info!(
                subject = %action.subject,
                schema_type = %action.schema_type,
                action = %action.action_type,
                dry_run = self.dry_run,
                "reconciled subject"
            );
            actions.push(action);
        }

        Ok(actions)
    }

    fn reconcile_subject(&self, subject: &Subject, exists: bool) -> Result<ReconcileAction> {
        if !exists {
            let mut action = ReconcileAction::new(ActionType::Create, subject);
            action.schema_id = self.register(subject)?;
            return Ok(action);
        }

        let latest = self
            .gateway
            .latest_schema(&subject.name)
            .map_err(|e| SchemaError::registry(&subject.name, e))?;

        let equal = schemas_equal(&latest, &subject.schema, subject.schema_type).map_err(|source| {
            SchemaError::SchemaParse {
                subject: subject.name.clone(),
                schema_type: subject.schema_type,
                source,
            }
        })?;
        if equal {
            return Ok(ReconcileAction::new(ActionType::Noop, subject));
        }

        let compatible = self
            .gateway
            .test_compatibility(&subject.name, &subject.schema, subject.schema_type)
            .map_err(|e| SchemaError::registry(&subject.name, e))?;
        if !compatible {
            tracing::warn!(subject = %subject.name, "schema is not compatible with latest version");
            return Err(SchemaError::Incompatible(subject.name.clone()));
        }

        let mut action = ReconcileAction::new(ActionType::Update, subject);
        action.diff = Some(schema_diff(
            &subject.name,
            &latest,
            &subject.schema,
            subject.schema_type,
        ));
        action.schema_id = self.register(subject)?;
        Ok(action)
    }

    fn register(&self, subject: &Subject) -> Result<Option<i64>> {
        if self.dry_run {
            return Ok(None);
        }
        let id = self
            .gateway
            .register_schema(&subject.name, &subject.schema, subject.schema_type)
            .map_err(|e| SchemaError::registry(&subject.name, e))?;
        tracing::debug!(subject = %subject.name, id, "registered schema");
        Ok(Some(id))
    }
}

/// Reconcile every subject declared by `file`, resolving schema paths against `base_dir`
///
/// Schema files are all read before the registry is contacted, so
/// configuration and I/O errors never leave a half-applied run.
pub fn reconcile_schemas<G: RegistryGateway>(
    file: &KafkaFile,
    base_dir: &Path,
    gateway: G,
    dry_run: bool,
) -> Result<Vec<ReconcileAction>> {
    let subjects = load_subjects(file, base_dir)?;
    Reconciler::new(gateway, dry_run).reconcile(&subjects)
}
