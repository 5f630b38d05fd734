use std::collections::{HashMap, HashSet};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::definition::{Activity, ProcessDefinition};
use crate::migration::error::MigrationError;
use crate::migration::plan::MigrationPlan;
use crate::runtime::execution::ExecutionTree;

/// One structural edit of the execution arena. The rewrite is computed as a
/// batch of these and either applies completely or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeEdit {
    RemoveScope { execution: Uuid, merged_into: Uuid },
    CreateScope { execution: Uuid, parent: Uuid, activity_id: String },
    ReparentExecution { execution: Uuid, to: Uuid },
    MoveVariable { variable: Uuid, from: Uuid, to: Uuid },
    OverwriteVariable { variable: Uuid, execution: Uuid, name: String },
    RelocateTask { task: Uuid, to: Uuid },
    RelocateJob { job: Uuid, to: Uuid },
    UpdateLeafActivity { execution: Uuid, from: String, to: String },
}

/// What a migration did to one instance, in application order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub instance_id: Uuid,
    pub edits: Vec<TreeEdit>,
}

/// Per-leaf working state, captured against the unmodified tree.
struct LeafContext {
    leaf: Uuid,
    source_activity: String,
    target_activity: String,
    source_is_scope: bool,
    target_is_scope: bool,
    source_chain: Vec<String>,
    target_chain: Vec<String>,
    /// Ancestor scope executions of the leaf, outermost first, excluding the
    /// instance root and the leaf itself. Lines up positionally with
    /// `source_chain`.
    ancestors: Vec<Uuid>,
    /// Execution currently holding the leaf's activity pointer, task and
    /// job. Starts at the leaf and follows compaction merges.
    holder: Uuid,
    /// Structural leaf position; follows compaction and expansion.
    position: Uuid,
}

/// Applies a migration plan to one instance's execution tree.
///
/// The rewrite happens on a clone of the arena: Phase A removes scope
/// executions without an identically-positioned counterpart in the target
/// chain and merges their attachments outward, Phase B creates the target
/// scopes that have no surviving execution, then leaves are repointed and
/// tasks/jobs relocated. Any validation failure aborts before the first
/// write; the input tree is never touched.
pub struct MigrationExecutor<'a> {
    plan: &'a MigrationPlan,
    source: &'a ProcessDefinition,
    target: &'a ProcessDefinition,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(
        plan: &'a MigrationPlan,
        source: &'a ProcessDefinition,
        target: &'a ProcessDefinition,
    ) -> Self {
        Self { plan, source, target }
    }

    pub fn apply(
        &self,
        tree: &ExecutionTree,
    ) -> Result<(ExecutionTree, MigrationReport), MigrationError> {
        let mut contexts = self.collect_contexts(tree)?;

        // Fatal conflicts are detected for the entire batch before any
        // mutation happens.
        self.check_variable_conflicts(tree, &contexts)?;

        let mut work = tree.clone();
        let mut edits = Vec::new();

        // Phase A: leaf scope collapse. A leaf that stops being a scope is
        // removed and its attachments merge into the direct parent, which
        // takes over as the leaf.
        for ctx in contexts.iter_mut() {
            if ctx.source_is_scope && !ctx.target_is_scope {
                let parent = work
                    .execution(ctx.leaf)
                    .and_then(|e| e.parent)
                    .ok_or_else(|| inconsistent(tree, "scope leaf without a parent"))?;
                merge_attachments(&mut work, ctx.leaf, parent, &mut edits);
                work.remove_splice(ctx.leaf);
                edits.push(TreeEdit::RemoveScope { execution: ctx.leaf, merged_into: parent });
                ctx.holder = parent;
                ctx.position = parent;
            }
        }

        // Phase A: ancestor scope removal, innermost first so parent links
        // stay valid while merging outward. Ancestors shared between sibling
        // leaves are removed once.
        let mut removals: Vec<(usize, Uuid)> = Vec::new();
        let mut removal_set = HashSet::new();
        for ctx in &contexts {
            for (depth, scope_id) in ctx.ancestors.iter().enumerate() {
                if ctx.target_chain.get(depth) != ctx.source_chain.get(depth)
                    && removal_set.insert(*scope_id)
                {
                    removals.push((depth, *scope_id));
                }
            }
        }
        removals.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, scope_id) in removals {
            let parent = work
                .execution(scope_id)
                .and_then(|e| e.parent)
                .ok_or_else(|| inconsistent(tree, "scope execution without a parent"))?;
            merge_attachments(&mut work, scope_id, parent, &mut edits);
            work.remove_splice(scope_id);
            edits.push(TreeEdit::RemoveScope { execution: scope_id, merged_into: parent });

            // A collapsed leaf may already have merged into this scope; its
            // context follows the merge outward.
            for ctx in contexts.iter_mut() {
                if ctx.holder == scope_id {
                    ctx.holder = parent;
                }
                if ctx.position == scope_id {
                    ctx.position = parent;
                }
            }
        }

        // Phase B: expansion plus leaf update, per leaf. Scope executions
        // created for the same (parent, activity) pair are shared between
        // sibling branches.
        let mut created: HashMap<(Uuid, String), Uuid> = HashMap::new();
        for ctx in contexts.iter_mut() {
            self.expand_and_repoint(&mut work, ctx, &mut created, &mut edits)?;
        }

        work.definition_id = self.plan.target_definition_id.clone();

        let report = MigrationReport { instance_id: tree.instance_id, edits };
        Ok((work, report))
    }

    fn collect_contexts(&self, tree: &ExecutionTree) -> Result<Vec<LeafContext>, MigrationError> {
        let mut contexts = Vec::new();

        for execution in tree.walk() {
            if !execution.is_leaf() {
                continue;
            }
            let Some(source_id) = execution.current_activity.as_deref() else {
                continue;
            };
            // Leaves at unmapped activities are left untouched.
            let Some(target_id) = self.plan.target_for(source_id) else {
                continue;
            };

            let source_activity = self.lookup(tree, self.source, source_id)?;
            let target_activity = self.lookup(tree, self.target, target_id)?;

            let mut ancestors = Vec::new();
            let mut cursor = execution.parent;
            while let Some(id) = cursor {
                let ancestor = tree
                    .execution(id)
                    .ok_or_else(|| inconsistent(tree, "dangling parent reference"))?;
                if id != tree.root() && ancestor.is_scope {
                    ancestors.push(id);
                }
                cursor = ancestor.parent;
            }
            ancestors.reverse();

            let source_chain = self.source.flow_scope_chain(source_id);
            if ancestors.len() != source_chain.len() {
                return Err(inconsistent(
                    tree,
                    &format!(
                        "activity '{}' has {} ancestor scopes in the definition but {} scope \
                         executions in the tree",
                        source_id,
                        source_chain.len(),
                        ancestors.len()
                    ),
                ));
            }
            for (depth, ancestor_id) in ancestors.iter().enumerate() {
                let held = tree
                    .execution(*ancestor_id)
                    .and_then(|e| e.scope_activity.as_deref());
                if held != Some(source_chain[depth].as_str()) {
                    return Err(inconsistent(
                        tree,
                        &format!(
                            "scope execution {} sits at '{}' but the definition nests \
                             activity '{}' in '{}'",
                            ancestor_id,
                            held.unwrap_or("<none>"),
                            source_id,
                            source_chain[depth]
                        ),
                    ));
                }
            }

            contexts.push(LeafContext {
                leaf: execution.id,
                source_activity: source_id.to_string(),
                target_activity: target_id.to_string(),
                source_is_scope: source_activity.is_scope,
                target_is_scope: target_activity.is_scope,
                source_chain,
                target_chain: self.target.flow_scope_chain(target_id),
                ancestors,
                holder: execution.id,
                position: execution.id,
            });
        }

        Ok(contexts)
    }

    fn lookup<'d>(
        &self,
        tree: &ExecutionTree,
        definition: &'d ProcessDefinition,
        activity_id: &str,
    ) -> Result<&'d Activity, MigrationError> {
        definition.activity(activity_id).ok_or_else(|| {
            inconsistent(
                tree,
                &format!(
                    "plan references activity '{}' unknown to definition '{}'",
                    activity_id, definition.id
                ),
            )
        })
    }

    /// The adjacent leaf/concurrent-parent merge is rejected while a merge
    /// into a non-adjacent ancestor scope silently overwrites (see
    /// `merge_attachments`). The asymmetry reproduces observed engine
    /// behavior and is deliberately not smoothed out here.
    fn check_variable_conflicts(
        &self,
        tree: &ExecutionTree,
        contexts: &[LeafContext],
    ) -> Result<(), MigrationError> {
        for ctx in contexts {
            if !ctx.source_is_scope || ctx.target_is_scope {
                continue;
            }
            let Some(leaf) = tree.execution(ctx.leaf) else {
                continue;
            };
            let Some(parent_id) = leaf.parent else {
                continue;
            };
            let Some(parent) = tree.execution(parent_id) else {
                continue;
            };
            if !parent.is_concurrent {
                continue;
            }

            let mut names: Vec<&String> = leaf.variables.keys().collect();
            names.sort();
            for name in names {
                if parent.variables.contains_key(name) {
                    return Err(MigrationError::VariableConflict {
                        name: name.clone(),
                        scope_execution: ctx.leaf,
                        parent_execution: parent_id,
                    });
                }
            }
        }
        Ok(())
    }

    fn expand_and_repoint(
        &self,
        work: &mut ExecutionTree,
        ctx: &mut LeafContext,
        created: &mut HashMap<(Uuid, String), Uuid>,
        edits: &mut Vec<TreeEdit>,
    ) -> Result<(), MigrationError> {
        let mut cursor = work.root();

        for (depth, target_scope) in ctx.target_chain.iter().enumerate() {
            // A surviving identically-positioned scope execution is reused.
            if ctx.source_chain.get(depth) == Some(target_scope) {
                if let Some(&ancestor) = ctx.ancestors.get(depth) {
                    if work.execution(ancestor).is_some() {
                        cursor = ancestor;
                        continue;
                    }
                }
            }

            let key = (cursor, target_scope.clone());
            let scope_exec = match created.get(&key) {
                Some(&existing) => existing,
                None => {
                    let id = work.add_child(cursor, |e| {
                        e.is_scope = true;
                        e.scope_activity = Some(target_scope.clone());
                    });
                    edits.push(TreeEdit::CreateScope {
                        execution: id,
                        parent: cursor,
                        activity_id: target_scope.clone(),
                    });
                    created.insert(key, id);
                    id
                }
            };

            if ctx.position == cursor {
                // The leaf was compacted into this execution; the new scope
                // continues the leaf chain downward.
                ctx.position = scope_exec;
            } else {
                let branch_top = path_child(work, cursor, ctx.position)?;
                if branch_top != scope_exec {
                    work.reparent(branch_top, scope_exec);
                    edits.push(TreeEdit::ReparentExecution { execution: branch_top, to: scope_exec });
                }
            }
            cursor = scope_exec;
        }

        // A leaf that becomes a scope gets a fresh, variable-empty scope
        // execution; local variables stay behind as concurrent locals so a
        // later tree expansion can re-localize them.
        if ctx.target_is_scope && !ctx.source_is_scope {
            let id = work.add_child(ctx.position, |e| {
                e.is_scope = true;
                e.scope_activity = Some(ctx.target_activity.clone());
            });
            edits.push(TreeEdit::CreateScope {
                execution: id,
                parent: ctx.position,
                activity_id: ctx.target_activity.clone(),
            });
            ctx.position = id;
        }

        // Leaf update: activity pointer, scope marker, task/job relocation.
        if ctx.holder != ctx.position {
            relocate_attachments(work, ctx.holder, ctx.position, edits);
            if let Some(holder) = work.execution_mut(ctx.holder) {
                holder.current_activity = None;
            }
        }
        if let Some(leaf) = work.execution_mut(ctx.position) {
            leaf.current_activity = Some(ctx.target_activity.clone());
            if ctx.target_is_scope {
                leaf.scope_activity = Some(ctx.target_activity.clone());
            }
        }
        edits.push(TreeEdit::UpdateLeafActivity {
            execution: ctx.position,
            from: ctx.source_activity.clone(),
            to: ctx.target_activity.clone(),
        });

        Ok(())
    }
}

/// Drains variables, task and job from `from` into `to`. A same-name
/// variable on the merge target keeps its record identity and takes the
/// incoming value; everything else is reparented, never duplicated.
fn merge_attachments(
    work: &mut ExecutionTree,
    from: Uuid,
    to: Uuid,
    edits: &mut Vec<TreeEdit>,
) {
    let (variables, task, job) = {
        let Some(source) = work.execution_mut(from) else {
            return;
        };
        (
            std::mem::take(&mut source.variables),
            source.task.take(),
            source.job.take(),
        )
    };

    let mut incoming: Vec<_> = variables.into_values().collect();
    incoming.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(target) = work.execution_mut(to) {
        for mut variable in incoming {
            match target.variables.get_mut(&variable.name) {
                Some(existing) => {
                    existing.value = variable.value;
                    edits.push(TreeEdit::OverwriteVariable {
                        variable: existing.id,
                        execution: to,
                        name: variable.name,
                    });
                }
                None => {
                    variable.owning_execution = to;
                    edits.push(TreeEdit::MoveVariable { variable: variable.id, from, to });
                    target.variables.insert(variable.name.clone(), variable);
                }
            }
        }

        if let Some(mut task) = task {
            task.execution = to;
            edits.push(TreeEdit::RelocateTask { task: task.id, to });
            target.task = Some(task);
        }
        if let Some(mut job) = job {
            job.execution = to;
            edits.push(TreeEdit::RelocateJob { job: job.id, to });
            target.job = Some(job);
        }
    }
}

/// Moves task and job records (identity preserved) onto the final leaf.
fn relocate_attachments(
    work: &mut ExecutionTree,
    from: Uuid,
    to: Uuid,
    edits: &mut Vec<TreeEdit>,
) {
    let (task, job) = {
        let Some(source) = work.execution_mut(from) else {
            return;
        };
        (source.task.take(), source.job.take())
    };

    if let Some(target) = work.execution_mut(to) {
        if let Some(mut task) = task {
            task.execution = to;
            edits.push(TreeEdit::RelocateTask { task: task.id, to });
            target.task = Some(task);
        }
        if let Some(mut job) = job {
            job.execution = to;
            edits.push(TreeEdit::RelocateJob { job: job.id, to });
            target.job = Some(job);
        }
    }
}

/// The child of `ancestor` lying on the path down to `descendant`.
fn path_child(
    work: &ExecutionTree,
    ancestor: Uuid,
    descendant: Uuid,
) -> Result<Uuid, MigrationError> {
    let mut current = descendant;
    loop {
        let parent = work
            .execution(current)
            .and_then(|e| e.parent)
            .ok_or_else(|| inconsistent(work, "execution detached from the tree"))?;
        if parent == ancestor {
            return Ok(current);
        }
        current = parent;
    }
}

fn inconsistent(tree: &ExecutionTree, details: &str) -> MigrationError {
    MigrationError::InconsistentTree {
        instance_id: tree.instance_id,
        details: details.to_string(),
    }
}
