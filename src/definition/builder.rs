use std::collections::HashMap;
use crate::definition::{Activity, BehaviorKind, EventKind, ProcessDefinition};

/// Programmatic construction of process definition trees, mainly used by
/// tests and embedders that do not go through the YAML loader.
pub struct ProcessDefinitionBuilder {
    id: String,
    activities: Vec<Activity>,
    scope_stack: Vec<String>,
}

impl ProcessDefinitionBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            activities: Vec::new(),
            scope_stack: Vec::new(),
        }
    }

    /// Generic entry point; the named helpers below cover the common kinds.
    pub fn activity(mut self, id: &str, behavior: BehaviorKind, is_scope: bool) -> Self {
        self.push(id, behavior, is_scope, None);
        self
    }

    pub fn user_task(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::UserTask, false, None);
        self
    }

    /// A user task that is itself a scope (e.g. because it carries an
    /// attached boundary event or local input mappings).
    pub fn scope_user_task(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::UserTask, true, None);
        self
    }

    pub fn receive_task(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::ReceiveTask, false, None);
        self
    }

    pub fn message_catch_event(mut self, id: &str) -> Self {
        self.push(
            id,
            BehaviorKind::IntermediateCatchEvent { event: EventKind::Message },
            false,
            None,
        );
        self
    }

    pub fn parallel_multi_instance(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::ParallelMultiInstance, true, None);
        self
    }

    pub fn sequential_multi_instance(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::SequentialMultiInstance, true, None);
        self
    }

    /// An activity kind outside the migration allow-list (script task,
    /// service task, ...).
    pub fn unsupported(mut self, id: &str, type_name: &str) -> Self {
        self.push(
            id,
            BehaviorKind::Other { type_name: type_name.to_string() },
            false,
            None,
        );
        self
    }

    /// Opens a subprocess scope; subsequent activities nest inside it until
    /// [`Self::done`] is called.
    pub fn sub_process(mut self, id: &str) -> Self {
        self.push(id, BehaviorKind::SubProcess, true, None);
        self.scope_stack.push(id.to_string());
        self
    }

    /// Closes the innermost open subprocess.
    pub fn done(mut self) -> Self {
        self.scope_stack.pop();
        self
    }

    /// Attaches a boundary event to `host`. The event lives in the host's
    /// flow scope, not inside the host.
    pub fn boundary_event(mut self, id: &str, host: &str, event: EventKind) -> Self {
        self.push(
            id,
            BehaviorKind::BoundaryEvent { event },
            false,
            Some(host.to_string()),
        );
        self
    }

    fn push(&mut self, id: &str, behavior: BehaviorKind, is_scope: bool, host: Option<String>) {
        self.activities.push(Activity {
            id: id.to_string(),
            behavior,
            is_scope,
            parent: self.scope_stack.last().cloned(),
            host_activity: host,
            children: Vec::new(),
        });
    }

    pub fn build(self) -> ProcessDefinition {
        let mut activities: HashMap<String, Activity> = HashMap::new();
        let mut roots = Vec::new();
        let mut child_lists: HashMap<String, Vec<String>> = HashMap::new();

        for activity in &self.activities {
            match &activity.parent {
                Some(parent) => child_lists
                    .entry(parent.clone())
                    .or_default()
                    .push(activity.id.clone()),
                None => roots.push(activity.id.clone()),
            }
        }

        for mut activity in self.activities {
            activity.children = child_lists.remove(&activity.id).unwrap_or_default();
            activities.insert(activity.id.clone(), activity);
        }

        ProcessDefinition::from_parts(self.id, activities, roots)
    }
}
