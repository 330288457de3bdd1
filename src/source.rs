//! Desired subjects from the kafka file and the schema files it references

use std::fs;
use std::path::Path;

use crate::error::{Result, SchemaError};
use crate::kafka_file::KafkaFile;
use crate::schema::{SchemaType, Subject, SubjectRole};

/// Build the desired subject list, two subjects per topic (key, then value)
///
/// Fails on the first unsupported extension or unreadable file; no partial
/// list is ever returned.
pub fn load_subjects(file: &KafkaFile, base_dir: &Path) -> Result<Vec<Subject>> {
    let mut subjects = Vec::with_capacity(file.topics.len() * 2);

    for topic in &file.topics {
        for (role, relative) in [(SubjectRole::Key, &topic.key), (SubjectRole::Value, &topic.value)] {
            let path = base_dir.join(relative);
            let schema_type = SchemaType::from_path(&path)?;
            let body = fs::read_to_string(&path).map_err(|source| SchemaError::SchemaRead {
                path: path.clone(),
                source,
            })?;

            tracing::debug!(
                topic = %topic.name,
                role = role.suffix(),
                schema_type = %schema_type,
                path = %path.display(),
                "loaded schema file"
            );

            subjects.push(Subject::new(&topic.name, role, schema_type, &body, path));
        }
    }

    Ok(subjects)
}
