//! The task-list application: a `TasksApp` root with a `tasklists` child,
//! both persisted as one local snapshot under `app`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use mvs_persist::{FileLocalStore, StandardPersistence};
use mvs_schema::{default_object, DirSchemaResolver, InMemorySchemaResolver, SchemaLookup, SchemaResolver};
use mvs_store::{BasicElement, ModelRegistry, StoreContext, StoreNode};
use mvs_types::{Mapping, ModelDescriptor, StorageModes, StoreConfig};
use serde_json::{json, Value};

use crate::cli::DemoArgs;

pub const APP_STORE: &str = "app";
pub const LIST_STORE: &str = "tasklists";

const SUMMARY: &str = "tasklists.title & ': ' & $string($count(tasklists.tasks[completed = true])) \
                       & '/' & $string($count(tasklists.tasks)) & ' done'";

pub fn schemas() -> InMemorySchemaResolver {
    InMemorySchemaResolver::new()
        .with_schema(
            "TaskItem",
            json!({"type": "object", "properties": {
                "task": {"type": "string"},
                "details": {"type": "string"},
                "completed": {"type": "boolean"},
                "dateCompleted": {"type": "number"}
            }}),
        )
        .with_schema(
            "TaskList",
            json!({"type": "object", "properties": {
                "title": {"type": "string"},
                "description": {"type": "string"},
                "tasks": {"type": "array", "items": {"$ref": "TaskItem"}}
            }}),
        )
        .with_schema(
            "TasksApp",
            json!({"type": "object", "properties": {
                "tasklists": {"$ref": "TaskList"}
            }}),
        )
}

pub fn models() -> ModelRegistry {
    ModelRegistry::new()
        .with_model(
            "TasksApp",
            ModelDescriptor::new()
                .with_class("TasksApp")
                .with_ref_schema("TaskList")
                .with_ref_schema("TaskItem")
                .with_mapping(Mapping::expression("summary", SUMMARY)),
        )
        .with_model(
            "TaskList",
            ModelDescriptor::new()
                .with_class("TaskList")
                .with_ref_schema("TaskItem")
                .with_mapping(Mapping::key("title", "title"))
                .with_mapping(Mapping::key("description", "description"))
                .with_mapping(Mapping::key("tasks", "tasks"))
                .with_mapping(Mapping::expression("remaining", "$count(tasks[completed = false])")),
        )
}

/// The mounted application.
pub struct TasksApp {
    pub app: StoreNode,
    pub list: StoreNode,
    pub app_element: Rc<RefCell<BasicElement>>,
    pub list_element: Rc<RefCell<BasicElement>>,
}

impl TasksApp {
    pub fn mount(ctx: Rc<StoreContext>) -> anyhow::Result<Self> {
        let app_element = BasicElement::new("TasksApp")
            .with_storage_modes(StorageModes::LOCAL)
            .shared();
        let list_element = BasicElement::new("TaskList")
            .with_storage_modes(StorageModes::LOCAL)
            .shared();
        let app = StoreNode::root(APP_STORE, app_element.clone(), ctx)?;
        let list = StoreNode::child(LIST_STORE, list_element.clone(), &app)?;
        Ok(Self {
            app,
            list,
            app_element,
            list_element,
        })
    }

    /// A new task item with schema defaults and the next free id.
    pub fn new_task(&self, task: &str) -> anyhow::Result<Value> {
        let ctx = self.app.context();
        let mut item = match ctx.schemas().resolve("TaskItem")? {
            Some(schema) => default_object(&schema, &SchemaLookup::new(ctx.schemas(), &[])),
            None => json!({}),
        };
        item["value"] = json!(self.next_id()?);
        item["task"] = json!(task);
        Ok(item)
    }

    fn next_id(&self) -> anyhow::Result<String> {
        let tasks = self.list.get_state("tasks")?;
        let max = tasks
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|t| t.get("value")?.as_str()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string())
    }

    pub fn complete(&self, id: &str) -> anyhow::Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.list.update_item(
            "tasks",
            json!({"value": id, "completed": true, "dateCompleted": now}),
        )?;
        Ok(())
    }

    pub fn property(&self, element: &Rc<RefCell<BasicElement>>, name: &str) -> Value {
        element.borrow().get(name).cloned().unwrap_or(Value::Null)
    }
}

pub fn context(config: StoreConfig, dir: &Path, schema_dir: Option<&Path>) -> Rc<StoreContext> {
    let schemas: Arc<dyn SchemaResolver> = match schema_dir {
        Some(dir) => Arc::new(DirSchemaResolver::new(dir)),
        None => Arc::new(schemas()),
    };
    let persistence = StandardPersistence::local_only(Arc::new(FileLocalStore::new(dir)));
    StoreContext::new(config, schemas, Arc::new(persistence))
        .with_models(models())
        .shared()
}

/// Apply the requested edits and return the mounted application.
pub fn run(args: &DemoArgs, config: StoreConfig) -> anyhow::Result<TasksApp> {
    let dir = args.dir.clone().unwrap_or_else(|| config.local_dir.clone());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating snapshot directory {}", dir.display()))?;
    let ctx = context(config, &dir, args.schemas.as_deref());
    let tasks = TasksApp::mount(ctx)?;

    if args.reset {
        tasks.list.reset_state(true)?;
    }
    if let Some(title) = &args.title {
        tasks.list.update_value("title", json!(title))?;
    }
    if let Some(description) = &args.description {
        tasks.list.update_value("description", json!(description))?;
    }
    for task in &args.tasks {
        let item = tasks.new_task(task)?;
        tasks.list.add_item("tasks", item)?;
    }
    for id in &args.complete {
        tasks.complete(id)?;
    }
    for id in &args.remove {
        tasks.list.remove_item("tasks", &json!({"value": id}))?;
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &Path) -> DemoArgs {
        DemoArgs {
            title: None,
            description: None,
            tasks: Vec::new(),
            complete: Vec::new(),
            remove: Vec::new(),
            reset: false,
            dir: Some(dir.to_path_buf()),
            schemas: None,
        }
    }

    #[test]
    fn fresh_app_has_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app = run(&args(dir.path()), StoreConfig::default()).unwrap();
        assert_eq!(
            app.app.state().unwrap(),
            json!({"tasklists": {"title": "", "description": "", "tasks": []}})
        );
        assert_eq!(app.property(&app.list_element, "remaining"), json!(0));
        assert_eq!(app.property(&app.app_element, "summary"), json!(": 0/0 done"));
    }

    #[test]
    fn edits_persist_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = args(dir.path());
        first.title = Some("Groceries".into());
        first.tasks = vec!["milk".into(), "eggs".into()];
        run(&first, StoreConfig::default()).unwrap();

        let mut second = args(dir.path());
        second.complete = vec!["1".into()];
        second.tasks = vec!["bread".into()];
        let app = run(&second, StoreConfig::default()).unwrap();

        let tasks = app.list.get_state("tasks").unwrap();
        let ids: Vec<_> = tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["value"].clone())
            .collect();
        assert_eq!(ids, vec![json!("1"), json!("2"), json!("3")]);
        assert_eq!(tasks[0]["completed"], json!(true));
        assert_eq!(app.property(&app.list_element, "remaining"), json!(2));
        assert_eq!(
            app.property(&app.app_element, "summary"),
            json!("Groceries: 1/3 done")
        );
    }

    #[test]
    fn reset_clears_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = args(dir.path());
        first.tasks = vec!["milk".into()];
        run(&first, StoreConfig::default()).unwrap();

        let mut second = args(dir.path());
        second.reset = true;
        let app = run(&second, StoreConfig::default()).unwrap();
        assert_eq!(app.list.get_state("tasks").unwrap(), json!([]));
    }
}
