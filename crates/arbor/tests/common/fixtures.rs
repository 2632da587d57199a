use arbor::types::{array, boolean, identifier, map, model, string};
use arbor::Factory;
use serde_json::{json, Value};

pub fn todo() -> Factory {
    model("Todo")
        .prop("id", identifier())
        .prop("title", string())
        .prop_default("done", boolean(), json!(false))
        .into_factory()
}

pub fn store() -> Factory {
    model("Store")
        .prop("todos", array(todo()))
        .prop_default("tags", map(string()), json!({}))
        .into_factory()
}

pub fn todo_snapshot(id: &str, title: &str) -> Value {
    json!({"id": id, "title": title, "done": false})
}

pub fn store_snapshot(todos: &[(&str, &str)]) -> Value {
    let todos: Vec<Value> = todos
        .iter()
        .map(|(id, title)| todo_snapshot(id, title))
        .collect();
    json!({"todos": todos, "tags": {}})
}
