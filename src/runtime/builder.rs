use serde_json::Value;
use uuid::Uuid;

use crate::runtime::execution::ExecutionTree;

/// Assembles execution trees in the shape the runtime would have produced
/// them, for tests and for seeding repositories. Mirrors the definition-side
/// builder: `scope`/`concurrent` open a level, `up` closes it.
pub struct ExecutionTreeBuilder {
    tree: ExecutionTree,
    stack: Vec<Uuid>,
    last: Uuid,
}

impl ExecutionTreeBuilder {
    pub fn new(definition_id: &str) -> Self {
        let tree = ExecutionTree::new(definition_id);
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
            last: root,
        }
    }

    fn top(&self) -> Uuid {
        *self.stack.last().expect("builder stack is never empty")
    }

    /// Opens a scope execution for the given scope activity.
    pub fn scope(mut self, activity_id: &str) -> Self {
        let id = self.tree.add_child(self.top(), |e| {
            e.is_scope = true;
            e.scope_activity = Some(activity_id.to_string());
        });
        self.stack.push(id);
        self.last = id;
        self
    }

    /// Opens a concurrent (non-scope) branch execution.
    pub fn concurrent(mut self) -> Self {
        let id = self.tree.add_child(self.top(), |e| {
            e.is_concurrent = true;
        });
        self.stack.push(id);
        self.last = id;
        self
    }

    /// A concurrent branch that is itself the leaf: the compacted shape of
    /// a fork branch whose activity is not a scope.
    pub fn concurrent_leaf(mut self, activity_id: &str) -> Self {
        let id = self.tree.add_child(self.top(), |e| {
            e.is_concurrent = true;
            e.current_activity = Some(activity_id.to_string());
        });
        self.last = id;
        self
    }

    /// A non-scope leaf at the given activity.
    pub fn leaf(mut self, activity_id: &str) -> Self {
        let id = self.tree.add_child(self.top(), |e| {
            e.current_activity = Some(activity_id.to_string());
        });
        self.last = id;
        self
    }

    /// A leaf that is its own scope (boundary event host, scope task).
    pub fn scope_leaf(mut self, activity_id: &str) -> Self {
        let id = self.tree.add_child(self.top(), |e| {
            e.is_scope = true;
            e.current_activity = Some(activity_id.to_string());
            e.scope_activity = Some(activity_id.to_string());
        });
        self.last = id;
        self
    }

    /// Marks the instance root itself as the leaf; the shape of a process
    /// with a single non-scope activity and no concurrency.
    pub fn root_leaf(mut self, activity_id: &str) -> Self {
        let root = self.tree.root();
        if let Some(e) = self.tree.execution_mut(root) {
            e.current_activity = Some(activity_id.to_string());
        }
        self.last = root;
        self
    }

    /// Closes the innermost open scope or concurrent branch.
    pub fn up(mut self) -> Self {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self
    }

    /// Sets a local variable on the most recently added execution.
    pub fn with_variable(mut self, name: &str, value: Value) -> Self {
        self.tree.set_variable_local(self.last, name, value);
        self
    }

    /// Attaches a user task to the most recently added execution.
    pub fn with_task(mut self) -> Self {
        self.tree.attach_task(self.last);
        self
    }

    /// Attaches a job to the most recently added execution.
    pub fn with_job(mut self) -> Self {
        self.tree.attach_job(self.last);
        self
    }

    pub fn build(self) -> ExecutionTree {
        self.tree
    }
}
