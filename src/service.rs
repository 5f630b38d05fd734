use std::sync::Arc;
use anyhow::{Result, anyhow};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::definition::ProcessDefinition;
use crate::migration::executor::{MigrationExecutor, MigrationReport};
use crate::migration::generator::InstructionGenerator;
use crate::migration::plan::MigrationPlan;
use crate::migration::validation::PlanValidator;
use crate::runtime::repository::ExecutionRepository;

/// Front door of the migration subsystem: holds the definition registry,
/// the execution repository and per-instance locks, and wires generator,
/// validator and executor together.
pub struct MigrationService {
    definitions: DashMap<String, Arc<ProcessDefinition>>,
    repository: Arc<dyn ExecutionRepository>,
    // Pessimistic single-writer access per instance; the rewrite must not
    // race task completion, job execution or another migration.
    instance_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    generator: InstructionGenerator,
    validator: PlanValidator,
}

impl MigrationService {
    pub fn new(repository: Arc<dyn ExecutionRepository>) -> Self {
        Self {
            definitions: DashMap::new(),
            repository,
            instance_locks: DashMap::new(),
            generator: InstructionGenerator::default(),
            validator: PlanValidator::default(),
        }
    }

    pub fn register_definition(&self, definition: ProcessDefinition) {
        self.definitions.insert(definition.id.clone(), Arc::new(definition));
    }

    fn definition(&self, id: &str) -> Result<Arc<ProcessDefinition>> {
        self.definitions
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| anyhow!("Process definition not found: {}", id))
    }

    /// Generates a plan by mapping equal activities. Never fails on missing
    /// matches; an empty plan is a valid outcome.
    pub fn generate_plan(&self, source_id: &str, target_id: &str) -> Result<MigrationPlan> {
        let source = self.definition(source_id)?;
        let target = self.definition(target_id)?;
        let plan = self.generator.generate(&source, &target);

        info!(
            source = %source_id,
            target = %target_id,
            instructions = plan.instructions().len(),
            "Generated migration plan"
        );
        Ok(plan)
    }

    /// Validates a manually assembled plan against both definitions. This is
    /// where unsupported activities, unknown ids and misaligned scope chains
    /// surface; generated plans do not need it.
    pub fn validate_plan(&self, plan: &MigrationPlan) -> Result<()> {
        let source = self.definition(&plan.source_definition_id)?;
        let target = self.definition(&plan.target_definition_id)?;
        self.validator.validate(plan, &source, &target)?;
        Ok(())
    }

    /// Applies a plan to one live instance: lock, load, rewrite, commit.
    /// Either the full rewrite is committed or the stored tree stays as it
    /// was; validation failures surface before any write.
    pub async fn migrate(&self, plan: &MigrationPlan, instance_id: Uuid) -> Result<MigrationReport> {
        let source = self.definition(&plan.source_definition_id)?;
        let target = self.definition(&plan.target_definition_id)?;

        let lock = self
            .instance_locks
            .entry(instance_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        let tree = self
            .repository
            .load(instance_id)
            .await?
            .ok_or_else(|| anyhow!("Process instance not found: {}", instance_id))?;

        if tree.definition_id != plan.source_definition_id {
            warn!(
                instance_id = %instance_id,
                expected = %plan.source_definition_id,
                actual = %tree.definition_id,
                "Instance is not running the plan's source definition"
            );
            return Err(anyhow!(
                "Instance {} runs definition '{}', not '{}'",
                instance_id,
                tree.definition_id,
                plan.source_definition_id
            ));
        }

        let executor = MigrationExecutor::new(plan, &source, &target);
        let (migrated, report) = executor.apply(&tree)?;

        self.repository.commit(migrated).await?;

        info!(
            instance_id = %instance_id,
            edits = report.edits.len(),
            target = %plan.target_definition_id,
            "Migrated process instance"
        );
        Ok(report)
    }
}
