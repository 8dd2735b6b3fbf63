use metrics::counter;
use uuid::Uuid;

use crate::models::Project;
use crate::store::{RecordStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    IsDefault,
}

/// Writes `project` and, when it is flagged default, moves the flag onto it.
///
/// The row is written unflagged, every default flag is cleared, then the target is flagged,
/// all inside one project transaction. Concurrent writers are serialized by the store, so the
/// last committed writer holds the flag. Returns `false` when an update targets a missing project.
pub async fn apply_default_invariant_on_write(
    store: &dyn RecordStore,
    project: &Project,
    mode: WriteMode,
) -> StoreResult<bool> {
    let mut tx = store.begin_project_tx().await?;

    let unflagged = Project {
        is_default: false,
        ..project.clone()
    };
    match mode {
        WriteMode::Create => tx.insert_project(&unflagged).await?,
        WriteMode::Update => {
            if !tx.update_project(&unflagged).await? {
                return Ok(false);
            }
        }
    }

    if project.is_default {
        let cleared = tx.clear_default_flags().await?;
        tx.set_default_flag(project.project_id).await?;
        tracing::info!(
            project_id = %project.project_id,
            cleared,
            "Moved default project flag"
        );
        counter!("project_default_swaps_total").increment(1);
    }

    tx.commit().await?;
    Ok(true)
}

/// Deletes the project unless it carries the default flag at the time of the delete.
pub async fn refuse_delete_if_default(
    store: &dyn RecordStore,
    project_id: Uuid,
) -> StoreResult<DeleteOutcome> {
    if store.delete_project_unless_default(project_id).await? {
        return Ok(DeleteOutcome::Deleted);
    }

    match store.find_project(project_id).await? {
        None => Ok(DeleteOutcome::NotFound),
        Some(_) => {
            tracing::warn!(project_id = %project_id, "Refused to delete the default project");
            Ok(DeleteOutcome::IsDefault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRecordStore;
    use std::sync::Arc;

    fn project(name: &str, is_default: bool) -> Project {
        Project {
            project_id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            response_object: "ticket".to_string(),
            default_response_text: String::new(),
            is_default,
        }
    }

    async fn defaults(store: &InMemoryRecordStore) -> Vec<Uuid> {
        store
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_default)
            .map(|p| p.project_id)
            .collect()
    }

    #[tokio::test]
    async fn last_default_writer_holds_the_flag() {
        let store = InMemoryRecordStore::new();
        let a = project("A", true);
        let b = project("B", true);
        let mut c = project("C", false);

        assert!(apply_default_invariant_on_write(&store, &a, WriteMode::Create).await.unwrap());
        assert!(apply_default_invariant_on_write(&store, &b, WriteMode::Create).await.unwrap());
        apply_default_invariant_on_write(&store, &c, WriteMode::Create).await.unwrap();
        assert_eq!(defaults(&store).await, vec![b.project_id]);

        c.is_default = true;
        assert!(apply_default_invariant_on_write(&store, &c, WriteMode::Update).await.unwrap());
        assert_eq!(defaults(&store).await, vec![c.project_id]);
    }

    #[tokio::test]
    async fn concurrent_default_writes_leave_exactly_one_default() {
        let store = Arc::new(InMemoryRecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let p = project(&format!("P{}", i), true);
                    apply_default_invariant_on_write(store.as_ref(), &p, WriteMode::Create)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list_projects().await.unwrap().len(), 8);
        assert_eq!(defaults(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_project_reports_false() {
        let store = InMemoryRecordStore::new();
        let ghost = project("Ghost", true);

        assert!(!apply_default_invariant_on_write(&store, &ghost, WriteMode::Update).await.unwrap());
        assert!(defaults(&store).await.is_empty());
    }

    #[tokio::test]
    async fn deleting_the_default_project_is_refused() {
        let store = InMemoryRecordStore::new();
        let default = project("Default", true);
        let other = project("Other", false);
        apply_default_invariant_on_write(&store, &default, WriteMode::Create).await.unwrap();
        apply_default_invariant_on_write(&store, &other, WriteMode::Create).await.unwrap();

        assert_eq!(
            refuse_delete_if_default(&store, default.project_id).await.unwrap(),
            DeleteOutcome::IsDefault
        );
        assert!(store.find_project(default.project_id).await.unwrap().is_some());
        assert_eq!(
            refuse_delete_if_default(&store, other.project_id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            refuse_delete_if_default(&store, other.project_id).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }
}
