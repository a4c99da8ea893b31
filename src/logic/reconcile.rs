use thiserror::Error;
use validator::ValidationErrors;

use crate::logic::patch::{PatchDocument, PatchError};
use crate::logic::validate::validate_point_of_interest;
use crate::model::{Id, PointOfInterest, PointOfInterestForUpdateDto};
use crate::store::repository::CityInfoRepository;
use crate::store::traits::CityInfoStore;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("City {0} was not found")]
    CityNotFound(Id),
    #[error("Point of interest {point_id} was not found in city {city_id}")]
    PointNotFound { city_id: Id, point_id: Id },
    #[error(transparent)]
    InvalidPatch(#[from] PatchError),
    #[error("The patched point of interest is not valid")]
    Validation(ValidationErrors),
    #[error("The patched point of interest could not be saved")]
    Persistence,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Applies patch documents to stored points of interest.
///
/// The document is applied to an edit view built from the stored values, the
/// whole candidate is validated, and only a fully valid candidate is written
/// back and committed. Nothing here guards against a concurrent writer
/// changing the point between the read and the commit: the last commit wins.
pub struct PatchReconciler;

impl PatchReconciler {
    pub async fn partially_update<S: CityInfoStore>(
        repo: &mut CityInfoRepository<'_, S>,
        city_id: Id,
        point_id: Id,
        document: &PatchDocument,
    ) -> Result<PointOfInterest, ReconcileError> {
        if !repo.city_exists(city_id).await? {
            return Err(ReconcileError::CityNotFound(city_id));
        }

        let mut point = repo
            .get_point_of_interest(city_id, point_id)
            .await?
            .ok_or(ReconcileError::PointNotFound { city_id, point_id })?;

        if document.is_empty() {
            log::debug!(
                "Empty patch document for point of interest {} in city {}",
                point_id,
                city_id
            );
        }

        let baseline = PointOfInterestForUpdateDto::from(&point);
        let candidate = document.apply_to(&baseline)?;

        validate_point_of_interest(&candidate).map_err(ReconcileError::Validation)?;

        point.apply_update(candidate);
        repo.update_point_of_interest(point.clone());

        if !repo.commit().await {
            return Err(ReconcileError::Persistence);
        }

        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::patch::PatchOperation;
    use crate::model::City;
    use crate::store::memory::InMemoryStore;
    use crate::store::traits::{CityStore, PointOfInterestStore};

    async fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_city(
                City::new("Buenos Aires".to_string(), None).with_points(vec![
                    PointOfInterest::new(
                        "Obelisco".to_string(),
                        Some("New Name".to_string()),
                    ),
                ]),
            )
            .await
            .unwrap();
        store
            .insert_city(City::new("Resistencia".to_string(), None))
            .await
            .unwrap();
        store
    }

    async fn stored_point(store: &InMemoryStore) -> PointOfInterest {
        store.get_point_of_interest(1, 1).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_patch_updates_only_mentioned_field() {
        let store = store().await;
        let mut repo = CityInfoRepository::new(&store);
        let document = PatchDocument::new(vec![PatchOperation::replace("/name", "Obelisk")]);

        let point = PatchReconciler::partially_update(&mut repo, 1, 1, &document)
            .await
            .unwrap();

        assert_eq!(point.name, "Obelisk");
        let stored = stored_point(&store).await;
        assert_eq!(stored.name, "Obelisk");
        assert_eq!(stored.description.as_deref(), Some("New Name"));
    }

    #[tokio::test]
    async fn test_empty_document_still_commits_unchanged_values() {
        let store = store().await;
        let before = stored_point(&store).await;
        let mut repo = CityInfoRepository::new(&store);

        let point = PatchReconciler::partially_update(&mut repo, 1, 1, &PatchDocument::default())
            .await
            .unwrap();

        assert_eq!(point, before);
        assert_eq!(stored_point(&store).await, before);
    }

    #[tokio::test]
    async fn test_empty_document_surfaces_commit_failure() {
        let store = store().await;
        store.set_fail_saves(true);
        let mut repo = CityInfoRepository::new(&store);

        let result =
            PatchReconciler::partially_update(&mut repo, 1, 1, &PatchDocument::default()).await;
        assert!(matches!(result, Err(ReconcileError::Persistence)));
    }

    #[tokio::test]
    async fn test_name_equal_to_description_leaves_storage_unchanged() {
        let store = store().await;
        let before = stored_point(&store).await;
        let mut repo = CityInfoRepository::new(&store);
        let document = PatchDocument::new(vec![PatchOperation::replace("/name", "New Name")]);

        let result = PatchReconciler::partially_update(&mut repo, 1, 1, &document).await;

        match result {
            Err(ReconcileError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("description"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(stored_point(&store).await, before);
    }

    #[tokio::test]
    async fn test_equality_is_checked_after_all_operations() {
        let store = store().await;
        let mut repo = CityInfoRepository::new(&store);
        // Description moves away from "New Name" first, then name takes the new description
        let document = PatchDocument::new(vec![
            PatchOperation::replace("/description", "Tall monument"),
            PatchOperation::replace("/name", "Tall monument"),
        ]);

        let result = PatchReconciler::partially_update(&mut repo, 1, 1, &document).await;
        assert!(matches!(result, Err(ReconcileError::Validation(_))));
    }

    #[tokio::test]
    async fn test_valid_fields_are_not_written_when_another_fails() {
        let store = store().await;
        let before = stored_point(&store).await;
        let mut repo = CityInfoRepository::new(&store);
        let document = PatchDocument::new(vec![
            PatchOperation::replace("/description", "A fine description"),
            PatchOperation::replace("/name", "n".repeat(51)),
        ]);

        let result = PatchReconciler::partially_update(&mut repo, 1, 1, &document).await;
        assert!(matches!(result, Err(ReconcileError::Validation(_))));
        assert_eq!(stored_point(&store).await, before);
    }

    #[tokio::test]
    async fn test_point_under_other_city_is_not_found() {
        let store = store().await;
        let mut repo = CityInfoRepository::new(&store);

        let result =
            PatchReconciler::partially_update(&mut repo, 2, 1, &PatchDocument::default()).await;
        assert!(matches!(
            result,
            Err(ReconcileError::PointNotFound {
                city_id: 2,
                point_id: 1
            })
        ));

        let result =
            PatchReconciler::partially_update(&mut repo, 42, 1, &PatchDocument::default()).await;
        assert!(matches!(result, Err(ReconcileError::CityNotFound(42))));
    }

    #[tokio::test]
    async fn test_invalid_path_is_reported_before_validation() {
        let store = store().await;
        let before = stored_point(&store).await;
        let mut repo = CityInfoRepository::new(&store);
        let document = PatchDocument::new(vec![
            PatchOperation::replace("/name", "Obelisk"),
            PatchOperation::replace("/cityId", "2"),
        ]);

        let result = PatchReconciler::partially_update(&mut repo, 1, 1, &document).await;
        assert!(matches!(
            result,
            Err(ReconcileError::InvalidPatch(PatchError::UnknownField { .. }))
        ));
        assert_eq!(stored_point(&store).await, before);
    }
}
