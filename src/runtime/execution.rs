use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use uuid::Uuid;

/// A variable local to one execution. Identity (the id) survives migration
/// whenever the variable is merely reparented; only the documented overwrite
/// case replaces a value while keeping the pre-existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInstance {
    pub id: Uuid,
    pub name: String,
    pub value: Value,
    pub owning_execution: Uuid,
}

/// A user task record attached to a leaf execution. Migration never
/// recreates tasks; only the execution reference moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: Uuid,
    pub execution: Uuid,
}

/// A job record (timer, async continuation) attached to an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInstance {
    pub id: Uuid,
    pub execution: Uuid,
}

/// One node of a live instance's execution tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
    /// Set on leaf/active executions: the activity this execution sits at.
    pub current_activity: Option<String>,
    /// For scope executions: the scope activity this execution was created
    /// for. `None` on the instance root (the process scope) and on
    /// concurrent branch executions.
    pub scope_activity: Option<String>,
    pub is_scope: bool,
    /// A sibling branch of a fork that was not allocated its own scope.
    pub is_concurrent: bool,
    pub variables: HashMap<String, VariableInstance>,
    pub task: Option<TaskInstance>,
    pub job: Option<JobInstance>,
}

impl Execution {
    fn new(id: Uuid, parent: Option<Uuid>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            current_activity: None,
            scope_activity: None,
            is_scope: false,
            is_concurrent: false,
            variables: HashMap::new(),
            task: None,
            job: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of execution records for one process instance. Parent/child
/// relations are explicit id fields; structural edits go through the
/// mutators below so the tree stays consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTree {
    pub instance_id: Uuid,
    pub definition_id: String,
    root: Uuid,
    executions: HashMap<Uuid, Execution>,
}

impl ExecutionTree {
    /// A fresh tree containing only the instance root, which is itself the
    /// process scope.
    pub fn new(definition_id: &str) -> Self {
        let instance_id = Uuid::new_v4();
        let mut root = Execution::new(instance_id, None);
        root.is_scope = true;

        let mut executions = HashMap::new();
        executions.insert(instance_id, root);

        Self {
            instance_id,
            definition_id: definition_id.to_string(),
            root: instance_id,
            executions,
        }
    }

    pub fn root(&self) -> Uuid {
        self.root
    }

    pub fn execution(&self, id: Uuid) -> Option<&Execution> {
        self.executions.get(&id)
    }

    pub fn execution_mut(&mut self, id: Uuid) -> Option<&mut Execution> {
        self.executions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// Depth-first walk in child order; deterministic for a given tree.
    pub fn walk(&self) -> Vec<&Execution> {
        let mut out = Vec::with_capacity(self.executions.len());
        self.collect(self.root, &mut out);
        out
    }

    fn collect<'a>(&'a self, id: Uuid, out: &mut Vec<&'a Execution>) {
        if let Some(execution) = self.executions.get(&id) {
            out.push(execution);
            for child in &execution.children {
                self.collect(*child, out);
            }
        }
    }

    /// Childless executions currently sitting at the given activity.
    pub fn leaves_at(&self, activity_id: &str) -> Vec<Uuid> {
        self.walk()
            .into_iter()
            .filter(|e| e.is_leaf() && e.current_activity.as_deref() == Some(activity_id))
            .map(|e| e.id)
            .collect()
    }

    /// The scope execution created for the given scope activity, if one
    /// exists in the tree.
    pub fn scope_execution_for(&self, activity_id: &str) -> Option<Uuid> {
        self.walk()
            .into_iter()
            .find(|e| e.scope_activity.as_deref() == Some(activity_id))
            .map(|e| e.id)
    }

    /// Every variable instance with the given name, across all executions.
    pub fn variables_named(&self, name: &str) -> Vec<&VariableInstance> {
        self.walk()
            .into_iter()
            .filter_map(|e| e.variables.get(name))
            .collect()
    }

    // --- mutators ---

    pub fn add_child(&mut self, parent: Uuid, configure: impl FnOnce(&mut Execution)) -> Uuid {
        let id = Uuid::new_v4();
        let mut execution = Execution::new(id, Some(parent));
        configure(&mut execution);
        self.executions.insert(id, execution);
        if let Some(parent_execution) = self.executions.get_mut(&parent) {
            parent_execution.children.push(id);
        }
        id
    }

    /// Moves `child` under `new_parent`, appending it to the new parent's
    /// child list.
    pub fn reparent(&mut self, child: Uuid, new_parent: Uuid) {
        let old_parent = self.executions.get(&child).and_then(|e| e.parent);
        if let Some(old_parent) = old_parent {
            if let Some(p) = self.executions.get_mut(&old_parent) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(e) = self.executions.get_mut(&child) {
            e.parent = Some(new_parent);
        }
        if let Some(p) = self.executions.get_mut(&new_parent) {
            p.children.push(child);
        }
    }

    /// Removes an execution, splicing its children into its parent's child
    /// list at the removed node's position. Attachments are expected to be
    /// drained by the caller beforehand.
    pub fn remove_splice(&mut self, id: Uuid) -> Option<Execution> {
        let execution = self.executions.remove(&id)?;
        let children = execution.children.clone();

        if let Some(parent_id) = execution.parent {
            if let Some(parent) = self.executions.get_mut(&parent_id) {
                if let Some(position) = parent.children.iter().position(|c| *c == id) {
                    parent.children.remove(position);
                    for (offset, child) in children.iter().enumerate() {
                        parent.children.insert(position + offset, *child);
                    }
                } else {
                    parent.children.extend(children.iter().copied());
                }
            }
            for child in &children {
                if let Some(c) = self.executions.get_mut(child) {
                    c.parent = Some(parent_id);
                }
            }
        }

        Some(execution)
    }

    /// Sets a local variable, creating the instance if the name is new and
    /// replacing the value (keeping the record's identity) if it is not.
    pub fn set_variable_local(&mut self, execution_id: Uuid, name: &str, value: Value) -> Option<Uuid> {
        let execution = self.executions.get_mut(&execution_id)?;
        if let Some(existing) = execution.variables.get_mut(name) {
            existing.value = value;
            Some(existing.id)
        } else {
            let instance = VariableInstance {
                id: Uuid::new_v4(),
                name: name.to_string(),
                value,
                owning_execution: execution_id,
            };
            let id = instance.id;
            execution.variables.insert(name.to_string(), instance);
            Some(id)
        }
    }

    pub fn attach_task(&mut self, execution_id: Uuid) -> Option<Uuid> {
        let execution = self.executions.get_mut(&execution_id)?;
        let task = TaskInstance { id: Uuid::new_v4(), execution: execution_id };
        let id = task.id;
        execution.task = Some(task);
        Some(id)
    }

    pub fn attach_job(&mut self, execution_id: Uuid) -> Option<Uuid> {
        let execution = self.executions.get_mut(&execution_id)?;
        let job = JobInstance { id: Uuid::new_v4(), execution: execution_id };
        let id = job.id;
        execution.job = Some(job);
        Some(id)
    }
}
