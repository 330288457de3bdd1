//! Reconciliation Tests
//!
//! Drives the reconciler against an in-memory registry that records every
//! call, and checks which calls were (and were not) issued.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use schema_gitops::{
    reconcile_schemas, ActionType, KafkaFile, ReconcileAction, Reconciler, RegistryError,
    RegistryGateway, SchemaError, SchemaType, Subject, SubjectRole,
};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    List,
    Latest(String),
    Compatibility(String),
    Register(String, String),
}

/// In-memory registry that records calls
#[derive(Default)]
struct RecordingRegistry {
    latest: HashMap<String, String>,
    incompatible: Vec<String>,
    unreachable: bool,
    calls: RefCell<Vec<Call>>,
}

impl RecordingRegistry {
    fn with_subject(mut self, subject: &str, schema: &str) -> Self {
        self.latest.insert(subject.to_string(), schema.to_string());
        self
    }

    fn incompatible(mut self, subject: &str) -> Self {
        self.incompatible.push(subject.to_string());
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn registered(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Register(subject, _) => Some(subject),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }
}

impl RegistryGateway for RecordingRegistry {
    fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        self.calls.borrow_mut().push(Call::List);
        if self.unreachable {
            return Err(RegistryError::UnexpectedResponse("connection refused".to_string()));
        }
        Ok(self.latest.keys().cloned().collect())
    }

    fn latest_schema(&self, subject: &str) -> Result<String, RegistryError> {
        self.calls.borrow_mut().push(Call::Latest(subject.to_string()));
        self.latest.get(subject).cloned().ok_or_else(|| RegistryError::Api {
            status: 404,
            error_code: Some(40401),
            message: format!("Subject '{}' not found.", subject),
        })
    }

    fn test_compatibility(
        &self,
        subject: &str,
        _schema: &str,
        _schema_type: SchemaType,
    ) -> Result<bool, RegistryError> {
        self.calls.borrow_mut().push(Call::Compatibility(subject.to_string()));
        Ok(!self.incompatible.iter().any(|s| s == subject))
    }

    fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        _schema_type: SchemaType,
    ) -> Result<i64, RegistryError> {
        self.calls
            .borrow_mut()
            .push(Call::Register(subject.to_string(), schema.to_string()));
        Ok(100 + self.registered().len() as i64)
    }
}

fn subject(topic: &str, role: SubjectRole, schema_type: SchemaType, body: &str) -> Subject {
    Subject::new(topic, role, schema_type, body, "unused")
}

fn summary(actions: &[ReconcileAction]) -> Vec<(ActionType, &str)> {
    actions
        .iter()
        .map(|a| (a.action_type, a.subject.as_str()))
        .collect()
}

fn write_orders_tree(dir: &Path, value_file: &str, value_body: &str) {
    fs::write(
        dir.join("kafka.yaml"),
        format!(
            "apiVersion: v1\ntopics:\n  orders:\n    schemas:\n      key: schemas/int.avsc\n      value: schemas/{}\n",
            value_file
        ),
    )
    .unwrap();
    fs::create_dir_all(dir.join("schemas")).unwrap();
    fs::write(dir.join("schemas/int.avsc"), "{\"type\":\"int\"}").unwrap();
    fs::write(dir.join("schemas").join(value_file), value_body).unwrap();
}

fn run(dir: &Path, registry: &RecordingRegistry, dry_run: bool) -> schema_gitops::Result<Vec<ReconcileAction>> {
    let file = KafkaFile::load(dir.join("kafka.yaml"))?;
    reconcile_schemas(&file, dir, registry, dry_run)
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_empty_registry_creates_both_subjects() {
    let dir = tempdir().unwrap();
    write_orders_tree(dir.path(), "order.json", "{\"type\":\"object\"}\n");
    let registry = RecordingRegistry::default();

    let actions = run(dir.path(), &registry, false).unwrap();

    assert_eq!(
        summary(&actions),
        vec![(ActionType::Create, "orders-key"), (ActionType::Create, "orders-value")]
    );
    assert_eq!(registry.registered(), vec!["orders-key", "orders-value"]);
    assert_eq!(registry.count(|c| matches!(c, Call::Latest(_) | Call::Compatibility(_))), 0);
    assert_eq!(actions[0].schema_id, Some(101));
    assert_eq!(actions[1].schema_id, Some(102));
}

#[test]
fn test_reformatted_avro_is_noop() {
    let dir = tempdir().unwrap();
    write_orders_tree(dir.path(), "order.json", "{\"type\":\"object\"}");
    fs::write(dir.path().join("schemas/int.avsc"), "{\"type\": \"int\"}\n").unwrap();
    let registry = RecordingRegistry::default()
        .with_subject("orders-key", "{\"type\":\"int\"}")
        .with_subject("orders-value", "{ \"type\" : \"object\" }");

    let actions = run(dir.path(), &registry, false).unwrap();

    assert_eq!(
        summary(&actions),
        vec![(ActionType::Noop, "orders-key"), (ActionType::Noop, "orders-value")]
    );
    assert!(registry.registered().is_empty());
    assert_eq!(registry.count(|c| matches!(c, Call::Compatibility(_))), 0);
}

#[test]
fn test_incompatible_protobuf_aborts_run() {
    let dir = tempdir().unwrap();
    write_orders_tree(
        dir.path(),
        "order.proto",
        "syntax = \"proto3\";\nmessage Order { string id = 1; }\n",
    );
    let registry = RecordingRegistry::default()
        .with_subject("orders-value", "syntax = \"proto3\";\nmessage Order { int64 id = 1; }")
        .incompatible("orders-value");

    let err = run(dir.path(), &registry, false).unwrap_err();

    assert!(matches!(err, SchemaError::Incompatible(ref s) if s == "orders-value"));
    assert!(err.to_string().contains("orders-value"));
    // orders-key is new and comes first, so it was already registered
    assert_eq!(registry.registered(), vec!["orders-key"]);
}

#[test]
fn test_incompatible_with_existing_key_registers_nothing() {
    let dir = tempdir().unwrap();
    write_orders_tree(dir.path(), "order.proto", "message Order { string id = 1; }");
    let registry = RecordingRegistry::default()
        .with_subject("orders-key", "{\"type\":\"int\"}")
        .with_subject("orders-value", "message Order { int64 id = 1; }")
        .incompatible("orders-value");

    let err = run(dir.path(), &registry, false).unwrap_err();
    assert_eq!(err.subject(), Some("orders-value"));
    assert!(registry.registered().is_empty());
}

// =============================================================================
// Engine properties
// =============================================================================

#[test]
fn test_absent_subject_never_fetches_or_checks() {
    let registry = RecordingRegistry::default().with_subject("other-value", "\"string\"");
    let subjects = [subject("orders", SubjectRole::Value, SchemaType::Avro, "\"string\"")];

    let actions = Reconciler::new(&registry, false).reconcile(&subjects).unwrap();

    assert_eq!(summary(&actions), vec![(ActionType::Create, "orders-value")]);
    assert_eq!(
        registry.calls(),
        vec![
            Call::List,
            Call::Register("orders-value".to_string(), "\"string\"".to_string()),
        ]
    );
}

#[test]
fn test_compatible_change_is_update() {
    let registry = RecordingRegistry::default().with_subject("orders-value", "{\"type\":\"string\"}");
    let subjects = [subject("orders", SubjectRole::Value, SchemaType::Json, "{\"type\":\"object\"}")];

    let actions = Reconciler::new(&registry, false).reconcile(&subjects).unwrap();

    assert_eq!(summary(&actions), vec![(ActionType::Update, "orders-value")]);
    assert_eq!(
        registry.calls(),
        vec![
            Call::List,
            Call::Latest("orders-value".to_string()),
            Call::Compatibility("orders-value".to_string()),
            Call::Register("orders-value".to_string(), "{\"type\":\"object\"}".to_string()),
        ]
    );
    assert!(actions[0].diff.is_some());
}

#[test]
fn test_incompatible_stops_all_later_mutations() {
    let registry = RecordingRegistry::default()
        .with_subject("orders-value", "\"string\"")
        .incompatible("orders-value");
    let subjects = [
        subject("orders", SubjectRole::Key, SchemaType::Avro, "\"int\""),
        subject("orders", SubjectRole::Value, SchemaType::Avro, "\"bytes\""),
        subject("payments", SubjectRole::Key, SchemaType::Avro, "\"int\""),
        subject("payments", SubjectRole::Value, SchemaType::Avro, "\"bytes\""),
    ];

    let err = Reconciler::new(&registry, false).reconcile(&subjects).unwrap_err();

    assert!(matches!(err, SchemaError::Incompatible(ref s) if s == "orders-value"));
    assert_eq!(registry.registered(), vec!["orders-key"]);
    assert!(!registry.calls().iter().any(|c| match c {
        Call::Latest(s) | Call::Compatibility(s) | Call::Register(s, _) => s.starts_with("payments"),
        Call::List => false,
    }));
}

#[test]
fn test_list_is_fetched_once() {
    let registry = RecordingRegistry::default()
        .with_subject("a-key", "\"int\"")
        .with_subject("a-value", "\"int\"");
    let subjects = [
        subject("a", SubjectRole::Key, SchemaType::Avro, "\"int\""),
        subject("a", SubjectRole::Value, SchemaType::Avro, "\"int\""),
        subject("b", SubjectRole::Key, SchemaType::Avro, "\"int\""),
    ];

    Reconciler::new(&registry, false).reconcile(&subjects).unwrap();
    assert_eq!(registry.count(|c| *c == Call::List), 1);
}

#[test]
fn test_dry_run_matches_active_run_without_registering() {
    let build = || {
        RecordingRegistry::default()
            .with_subject("orders-key", "\"int\"")
            .with_subject("orders-value", "{\"type\":\"string\"}")
    };
    let subjects = [
        subject("orders", SubjectRole::Key, SchemaType::Avro, "\"int\""),
        subject("orders", SubjectRole::Value, SchemaType::Json, "{\"type\":\"object\"}"),
        subject("payments", SubjectRole::Key, SchemaType::Protobuf, "message Key {}"),
    ];

    let dry = build();
    let dry_actions = Reconciler::new(&dry, true).reconcile(&subjects).unwrap();
    let active = build();
    let active_actions = Reconciler::new(&active, false).reconcile(&subjects).unwrap();

    assert_eq!(summary(&dry_actions), summary(&active_actions));
    assert_eq!(
        summary(&dry_actions),
        vec![
            (ActionType::Noop, "orders-key"),
            (ActionType::Update, "orders-value"),
            (ActionType::Create, "payments-key"),
        ]
    );
    assert!(dry.registered().is_empty());
    assert_eq!(dry.count(|c| *c == Call::List), 1);
    assert_eq!(dry.count(|c| matches!(c, Call::Latest(_))), 2);
    assert_eq!(dry.count(|c| matches!(c, Call::Compatibility(_))), 1);
    assert_eq!(active.registered(), vec!["orders-value", "payments-key"]);
}

#[test]
fn test_dry_run_still_reports_incompatibility() {
    let registry = RecordingRegistry::default()
        .with_subject("orders-value", "\"string\"")
        .incompatible("orders-value");
    let subjects = [subject("orders", SubjectRole::Value, SchemaType::Avro, "\"bytes\"")];

    let err = Reconciler::new(&registry, true).reconcile(&subjects).unwrap_err();
    assert!(matches!(err, SchemaError::Incompatible(_)));
}

#[test]
fn test_registry_failure_is_tagged_and_fatal() {
    let registry = RecordingRegistry {
        unreachable: true,
        ..Default::default()
    };
    let subjects = [subject("orders", SubjectRole::Key, SchemaType::Avro, "\"int\"")];

    let err = Reconciler::new(&registry, false).reconcile(&subjects).unwrap_err();
    assert!(matches!(err, SchemaError::ListSubjects(_)));
    assert_eq!(registry.calls(), vec![Call::List]);
}

#[test]
fn test_unparseable_desired_schema_is_fatal() {
    let registry = RecordingRegistry::default().with_subject("orders-key", "\"int\"");
    let subjects = [
        subject("orders", SubjectRole::Key, SchemaType::Avro, "{\"type\": int"),
        subject("payments", SubjectRole::Key, SchemaType::Avro, "\"int\""),
    ];

    let err = Reconciler::new(&registry, false).reconcile(&subjects).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::SchemaParse { ref subject, schema_type: SchemaType::Avro, .. } if subject == "orders-key"
    ));
    assert!(registry.registered().is_empty());
}

#[test]
fn test_configuration_errors_precede_registry_calls() {
    let dir = tempdir().unwrap();
    write_orders_tree(dir.path(), "order.xsd", "<schema/>");
    let registry = RecordingRegistry::default();

    let err = run(dir.path(), &registry, false).unwrap_err();
    assert!(err.is_configuration());
    assert!(registry.calls().is_empty());

    let dir = tempdir().unwrap();
    write_orders_tree(dir.path(), "order.json", "{}");
    fs::remove_file(dir.path().join("schemas/int.avsc")).unwrap();
    let err = run(dir.path(), &registry, false).unwrap_err();
    assert!(matches!(err, SchemaError::SchemaRead { .. }));
    assert!(registry.calls().is_empty());
}

#[test]
fn test_fixture_kafka_file() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let file = KafkaFile::load(fixtures.join("kafka.yaml")).unwrap();
    let registry = RecordingRegistry::default()
        .with_subject("orders-key", "{\"type\":\"int\"}")
        .with_subject("payments-value", "syntax = \"proto3\";\n\nmessage Payment {\n  string id = 1;\n}");

    let actions = reconcile_schemas(&file, &fixtures, &registry, true).unwrap();

    assert_eq!(
        summary(&actions),
        vec![
            (ActionType::Noop, "orders-key"),
            (ActionType::Create, "orders-value"),
            (ActionType::Create, "payments-key"),
            (ActionType::Update, "payments-value"),
        ]
    );
    assert!(registry.registered().is_empty());
}
