#![allow(dead_code)]

pub mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;

use arbor::{NodeId, Patch, Tree};
use tracing_subscriber::EnvFilter;

/// Install a test-scoped subscriber. `RUST_LOG=arbor=trace` shows every
/// emitted patch.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Patches seen by one listener.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Patch>>>);

impl Recorder {
    pub fn attach(tree: &mut Tree, node: NodeId) -> Self {
        let recorder = Self::default();
        let sink = recorder.0.clone();
        tree.on_patch(node, move |patch| sink.borrow_mut().push(patch.clone()))
            .expect("listener attaches to a live node");
        recorder
    }

    pub fn take(&self) -> Vec<Patch> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// `"op path"` per patch, the shape most assertions care about.
    pub fn ops(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .map(|p| format!("{} {}", p.op, p.path))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
