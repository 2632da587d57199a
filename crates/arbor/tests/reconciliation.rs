mod common;

use arbor::patch::apply_patches_to_snapshot;
use arbor::types::{array, identifier, model, string, union};
use arbor::{Error, Patch, Tree};
use common::fixtures::{store, store_snapshot, todo_snapshot};
use common::{init_tracing, Recorder};
use serde_json::json;

#[test]
fn unmoved_elements_keep_identity_and_emit_only_field_patches() {
    init_tracing();
    let mut tree = Tree::new();
    let root = tree
        .create(&store(), Some(store_snapshot(&[("a", "milk"), ("b", "eggs")])))
        .unwrap();
    let a = tree.resolve(root, "/todos/0").unwrap();
    let b = tree.resolve(root, "/todos/1").unwrap();
    let recorder = Recorder::attach(&mut tree, root);

    tree.apply_snapshot(root, &store_snapshot(&[("a", "milk"), ("b", "bread")]))
        .unwrap();

    assert_eq!(
        recorder.take(),
        vec![Patch::replace("/todos/1/title", json!("bread"))]
    );
    assert_eq!(tree.resolve(root, "/todos/0").unwrap(), a);
    assert_eq!(tree.resolve(root, "/todos/1").unwrap(), b);
}

#[test]
fn unknown_identifiers_get_fresh_instances() {
    let mut tree = Tree::new();
    let root = tree
        .create(&store(), Some(store_snapshot(&[("a", "milk"), ("b", "eggs")])))
        .unwrap();
    let a = tree.resolve(root, "/todos/0").unwrap();
    let b = tree.resolve(root, "/todos/1").unwrap();
    let recorder = Recorder::attach(&mut tree, root);

    tree.apply_snapshot(root, &store_snapshot(&[("a", "milk"), ("c", "jam")]))
        .unwrap();

    assert_eq!(
        recorder.take(),
        vec![
            Patch::remove("/todos/1"),
            Patch::add("/todos/1", todo_snapshot("c", "jam")),
        ]
    );
    let c = tree.resolve(root, "/todos/1").unwrap();
    assert_ne!(c, b);
    assert_eq!(tree.resolve(root, "/todos/0").unwrap(), a);
    assert_eq!(tree.get_parent(b).unwrap(), None);
}

#[test]
fn reordering_moves_existing_nodes() {
    let mut tree = Tree::new();
    let initial = store_snapshot(&[("a", "1"), ("b", "2"), ("c", "3")]);
    let root = tree.create(&store(), Some(initial.clone())).unwrap();
    let ids: Vec<_> = (0..3)
        .map(|i| tree.resolve(root, &format!("/todos/{i}")).unwrap())
        .collect();
    let recorder = Recorder::attach(&mut tree, root);

    let reordered = store_snapshot(&[("c", "3"), ("a", "1"), ("b", "2")]);
    tree.apply_snapshot(root, &reordered).unwrap();

    assert_eq!(tree.resolve(root, "/todos/0").unwrap(), ids[2]);
    assert_eq!(tree.resolve(root, "/todos/1").unwrap(), ids[0]);
    assert_eq!(tree.resolve(root, "/todos/2").unwrap(), ids[1]);
    assert_eq!(tree.get_path(ids[2]).unwrap(), "/todos/0");

    let mut replayed = initial;
    apply_patches_to_snapshot(&mut replayed, &recorder.take()).unwrap();
    assert_eq!(replayed, reordered);
}

#[test]
fn duplicate_live_identifiers_fail_before_any_change() {
    let mut tree = Tree::new();
    let root = tree
        .create(&store(), Some(store_snapshot(&[("a", "milk"), ("b", "eggs")])))
        .unwrap();
    let todos = tree.resolve(root, "/todos").unwrap();
    tree.array_push(todos, todo_snapshot("a", "again")).unwrap();
    let before = tree.get_snapshot(root).unwrap();
    let recorder = Recorder::attach(&mut tree, root);

    let err = tree
        .apply_snapshot(root, &store_snapshot(&[("b", "changed")]))
        .unwrap_err();

    assert_eq!(
        err,
        Error::UniquenessViolation {
            identifier: "a".into(),
            path: "/todos/2".into(),
        }
    );
    assert!(recorder.is_empty());
    assert_eq!(tree.get_snapshot(root).unwrap(), before);
}

#[test]
fn invalid_snapshots_are_rejected_up_front() {
    let mut tree = Tree::new();
    let initial = store_snapshot(&[("a", "milk")]);
    let root = tree.create(&store(), Some(initial.clone())).unwrap();
    let recorder = Recorder::attach(&mut tree, root);

    let err = tree
        .apply_snapshot(root, &json!({"todos": [{"id": "a", "title": 3}]}))
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert!(recorder.is_empty());
    assert_eq!(tree.get_snapshot(root).unwrap(), initial);
}

#[test]
fn elements_without_identifier_are_replaced_wholesale() {
    let mut tree = Tree::new();
    let list = tree.create(&array(string()), Some(json!(["a", "b"]))).unwrap();
    let recorder = Recorder::attach(&mut tree, list);

    tree.apply_snapshot(list, &json!(["a", "c"])).unwrap();

    assert_eq!(
        recorder.ops(),
        ["remove /1", "remove /0", "add /0", "add /1"]
    );
    assert_eq!(tree.get_snapshot(list).unwrap(), json!(["a", "c"]));
}

#[test]
fn polymorphic_elements_reuse_only_matching_shapes() {
    let circle = model("Circle")
        .prop("id", identifier())
        .prop("radius", string())
        .into_factory();
    let square = model("Square")
        .prop("id", identifier())
        .prop("side", string())
        .into_factory();
    let shapes = array(union([circle, square]));
    let mut tree = Tree::new();
    let list = tree
        .create(&shapes, Some(json!([{"id": 1, "radius": "2"}])))
        .unwrap();
    let first = tree.resolve(list, "/0").unwrap();

    tree.apply_snapshot(list, &json!([{"id": 1, "side": "4"}])).unwrap();

    let replaced = tree.resolve(list, "/0").unwrap();
    assert_ne!(replaced, first);
    assert_eq!(tree.get_factory(replaced).unwrap().name(), "Square");

    tree.apply_snapshot(list, &json!([{"id": 1, "side": "5"}])).unwrap();
    assert_eq!(tree.resolve(list, "/0").unwrap(), replaced);
}

#[test]
fn whole_float_identifiers_match_integer_ones() {
    let mut tree = Tree::new();
    let root = tree
        .create(
            &store(),
            Some(json!({"todos": [{"id": 1, "title": "milk", "done": false}], "tags": {}})),
        )
        .unwrap();
    let first = tree.resolve(root, "/todos/0").unwrap();

    tree.apply_snapshot(
        root,
        &json!({"todos": [{"id": 1.0, "title": "oat milk", "done": false}], "tags": {}}),
    )
    .unwrap();

    assert_eq!(tree.resolve(root, "/todos/0").unwrap(), first);
    assert_eq!(
        tree.get(first, "/title").unwrap(),
        arbor::Child::Value(json!("oat milk"))
    );
}

#[test]
fn whole_float_duplicates_violate_uniqueness() {
    let mut tree = Tree::new();
    let root = tree
        .create(
            &store(),
            Some(json!({"todos": [{"id": 1, "title": "milk", "done": false}], "tags": {}})),
        )
        .unwrap();
    let todos = tree.resolve(root, "/todos").unwrap();
    tree.array_push(todos, json!({"id": 1.0, "title": "again", "done": false}))
        .unwrap();
    let before = tree.get_snapshot(root).unwrap();

    let err = tree
        .apply_snapshot(root, &store_snapshot(&[("b", "eggs")]))
        .unwrap_err();

    assert_eq!(
        err,
        Error::UniquenessViolation {
            identifier: "1".into(),
            path: "/todos/1".into(),
        }
    );
    assert_eq!(tree.get_snapshot(root).unwrap(), before);
}
