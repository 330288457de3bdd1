//! Kafka GitOps for schemas
//!
//! Reconciles the key/value schemas declared in a kafka file against a
//! Confluent Schema Registry. The kafka file is the source of truth; the
//! registry is converged towards it with the smallest set of registrations.
//!
//! ## Features
//!
//! - **Semantic comparison**: JSON and Avro schemas are compared structurally,
//!   Protobuf schemas textually
//! - **Registry-arbitrated compatibility**: every update is checked by the
//!   registry first, and an incompatible schema aborts the whole run
//! - **Dry run**: report what would change, still validating compatibility
//! - **Deterministic output**: actions follow kafka file order
//!
//! ## Layout
//!
//! ```text
//! deploy/
//! ├── kafka.yaml
//! └── schemas/
//!     ├── int.avsc
//!     ├── order.json
//!     └── payment.proto
//! ```

pub mod config;
pub mod diff;
pub mod equality;
pub mod error;
pub mod kafka_file;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod schema;
pub mod source;

pub use config::{GitopsConfig, OutputStyle, ReportFormat};
pub use equality::schemas_equal;
pub use error::{Result, SchemaError};
pub use kafka_file::{KafkaFile, TopicDeclaration};
pub use reconcile::{reconcile_schemas, ActionType, ReconcileAction, Reconciler};
pub use registry::{RegistryAuth, RegistryError, RegistryGateway, SchemaRegistryClient};
pub use report::{ActionSummary, ReportOptions};
pub use schema::{SchemaType, Subject, SubjectRole};
pub use source::load_subjects;
