use async_trait::async_trait;
use anyhow::Result;
use dashmap::DashMap;
use uuid::Uuid;

use crate::runtime::execution::ExecutionTree;

/// Transactional access to the execution/variable/task/job records of live
/// process instances. The migration engine reads a full tree, computes its
/// batch of edits in memory and commits the rewritten tree as one atomic
/// unit; a failed commit leaves the stored tree untouched.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn load(&self, instance_id: Uuid) -> Result<Option<ExecutionTree>>;

    /// Atomically replaces the stored tree for `tree.instance_id`. Also used
    /// to seed new instances.
    async fn commit(&self, tree: ExecutionTree) -> Result<()>;

    async fn remove(&self, instance_id: Uuid) -> Result<()>;
}

// --- In-Memory Implementation ---

pub struct InMemoryExecutionRepository {
    trees: DashMap<Uuid, ExecutionTree>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self { trees: DashMap::new() }
    }
}

impl Default for InMemoryExecutionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn load(&self, instance_id: Uuid) -> Result<Option<ExecutionTree>> {
        Ok(self.trees.get(&instance_id).map(|t| t.value().clone()))
    }

    async fn commit(&self, tree: ExecutionTree) -> Result<()> {
        self.trees.insert(tree.instance_id, tree);
        Ok(())
    }

    async fn remove(&self, instance_id: Uuid) -> Result<()> {
        self.trees.remove(&instance_id);
        Ok(())
    }
}
