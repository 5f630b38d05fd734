use async_trait::async_trait;
use anyhow::Result;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::runtime::execution::ExecutionTree;
use crate::runtime::repository::ExecutionRepository;

/// Redis-backed execution tree storage. Each instance is one JSON value
/// under its own key, so a commit is a single SET and therefore atomic on
/// the Redis side.
pub struct RedisExecutionRepository {
    client: redis::Client,
}

impl RedisExecutionRepository {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn tree_key(&self, instance_id: Uuid) -> String {
        format!("flowmig:inst:{}:tree", instance_id)
    }
}

#[async_trait]
impl ExecutionRepository for RedisExecutionRepository {
    async fn load(&self, instance_id: Uuid) -> Result<Option<ExecutionTree>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.tree_key(instance_id)).await?;

        if let Some(json) = raw {
            let tree: ExecutionTree = serde_json::from_str(&json)?;
            Ok(Some(tree))
        } else {
            Ok(None)
        }
    }

    async fn commit(&self, tree: ExecutionTree) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(&tree)?;
        let _: () = conn.set(self.tree_key(tree.instance_id), serialized).await?;
        Ok(())
    }

    async fn remove(&self, instance_id: Uuid) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.tree_key(instance_id)).await?;
        Ok(())
    }
}
