use serde::Deserialize;
use serde_json::Value;

/// Error envelope the service returns with a 400 status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

/// The `GET {base}/imports` envelope. Entries are unexpanded: id and href
/// only, kept raw so callers can build session objects from them.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportList {
    pub imports: Vec<Value>,
}

/// The single-session envelope returned on create/update and on an expanded
/// `GET {base}/imports/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportEnvelope {
    pub import: Value,
}

/// Typed view over one import session record.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    pub id: u64,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Value>,
}

/// Typed view over one task record.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Task-creation responses come back as `{"task": {...}}` for a single file
/// and `{"tasks": [...]}` for several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskResponse {
    Single { task: Value },
    Multiple { tasks: Vec<Value> },
}

impl TaskResponse {
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            TaskResponse::Single { task } => vec![task],
            TaskResponse::Multiple { tasks } => tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope() {
        let e: ErrorResponse = serde_json::from_str(r#"{"errors":["bad crs","no srs"]}"#).unwrap();
        assert_eq!(e.errors, vec!["bad crs", "no srs"]);
    }

    #[test]
    fn test_import_list_unexpanded() {
        let body = r#"{"imports":[{"id":0,"href":"http://x/imports/0"},{"id":1,"href":"http://x/imports/1"}]}"#;
        let list: ImportList = serde_json::from_str(body).unwrap();
        assert_eq!(list.imports.len(), 2);
        let rec: ImportRecord = serde_json::from_value(list.imports[0].clone()).unwrap();
        assert_eq!(rec.id, 0);
        assert_eq!(rec.href, "http://x/imports/0");
        assert!(rec.state.is_none());
        assert!(rec.tasks.is_empty());
    }

    #[test]
    fn test_import_envelope_expanded() {
        let body = r#"{"import":{"id":3,"href":"http://x/imports/3","state":"PENDING","tasks":[{"id":0,"href":"http://x/imports/3/tasks/0","state":"READY"}]}}"#;
        let env: ImportEnvelope = serde_json::from_str(body).unwrap();
        let rec: ImportRecord = serde_json::from_value(env.import).unwrap();
        assert_eq!(rec.id, 3);
        assert_eq!(rec.state.as_deref(), Some("PENDING"));
        assert_eq!(rec.tasks.len(), 1);
        let task: TaskRecord = serde_json::from_value(rec.tasks[0].clone()).unwrap();
        assert_eq!(task.id, 0);
        assert_eq!(task.state.as_deref(), Some("READY"));
    }

    #[test]
    fn test_task_response_both_forms() {
        let single: TaskResponse = serde_json::from_str(r#"{"task":{"id":0}}"#).unwrap();
        assert_eq!(single.into_vec().len(), 1);
        let multiple: TaskResponse = serde_json::from_str(r#"{"tasks":[{"id":0},{"id":1}]}"#).unwrap();
        assert_eq!(multiple.into_vec().len(), 2);
    }
}
