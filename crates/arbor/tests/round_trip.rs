mod common;

use arbor::patch::apply_patches_to_snapshot;
use arbor::types::{array, integer};
use arbor::Tree;
use common::fixtures::{store, todo_snapshot};
use common::Recorder;
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
enum Edit {
    Set(usize, i64),
    Splice(usize, usize, Vec<i64>),
    Push(i64),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), -50i64..50).prop_map(|(i, v)| Edit::Set(i, v)),
        (any::<usize>(), 0usize..4, prop::collection::vec(-50i64..50, 0..4))
            .prop_map(|(i, n, vs)| Edit::Splice(i, n, vs)),
        (-50i64..50).prop_map(Edit::Push),
    ]
}

/// Keep first occurrences only, so generated id lists are unique.
fn unique(ids: Vec<u8>) -> Vec<u8> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn todos_snapshot(ids: &[u8], title_salt: u8) -> Value {
    let todos: Vec<Value> = ids
        .iter()
        .map(|id| todo_snapshot(&id.to_string(), &format!("t{}", (id ^ title_salt) % 3)))
        .collect();
    json!({"todos": todos, "tags": {}})
}

proptest! {
    #[test]
    fn replaying_emitted_patches_reproduces_every_edit(
        initial in prop::collection::vec(-50i64..50, 0..8),
        edits in prop::collection::vec(edit(), 1..12),
    ) {
        let mut tree = Tree::new();
        let list = tree.create(&array(integer()), Some(json!(initial))).unwrap();
        let recorder = Recorder::attach(&mut tree, list);

        for edit in edits {
            let before = tree.get_snapshot(list).unwrap();
            let len = tree.array_len(list).unwrap();
            match edit {
                Edit::Set(i, v) if len > 0 => tree.array_set(list, i % len, json!(v)).unwrap(),
                Edit::Set(..) => continue,
                Edit::Splice(i, n, vs) => {
                    let added = vs.into_iter().map(|v| json!(v).into()).collect();
                    tree.array_splice(list, i % (len + 1), n, added).unwrap();
                }
                Edit::Push(v) => tree.array_push(list, json!(v)).unwrap(),
            }
            let mut replayed = before;
            apply_patches_to_snapshot(&mut replayed, &recorder.take()).unwrap();
            prop_assert_eq!(replayed, tree.get_snapshot(list).unwrap());
        }
    }

    #[test]
    fn reconciliation_keeps_surviving_nodes_and_round_trips(
        before_ids in prop::collection::vec(0u8..8, 0..7),
        after_ids in prop::collection::vec(0u8..8, 0..7),
        salt in 0u8..4,
    ) {
        let before_ids = unique(before_ids);
        let after_ids = unique(after_ids);
        let initial = todos_snapshot(&before_ids, 0);
        let target = todos_snapshot(&after_ids, salt);

        let mut tree = Tree::new();
        let root = tree.create(&store(), Some(initial.clone())).unwrap();
        let nodes: Vec<_> = (0..before_ids.len())
            .map(|i| tree.resolve(root, &format!("/todos/{i}")).unwrap())
            .collect();
        let recorder = Recorder::attach(&mut tree, root);

        tree.apply_snapshot(root, &target).unwrap();

        prop_assert_eq!(tree.get_snapshot(root).unwrap(), target.clone());
        for (pos, id) in after_ids.iter().enumerate() {
            let live = tree.resolve(root, &format!("/todos/{pos}")).unwrap();
            if let Some(old) = before_ids.iter().position(|b| b == id) {
                prop_assert_eq!(live, nodes[old]);
            }
        }
        let mut replayed = initial;
        apply_patches_to_snapshot(&mut replayed, &recorder.take()).unwrap();
        prop_assert_eq!(replayed, target);
    }
}
