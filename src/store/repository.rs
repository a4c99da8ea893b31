use anyhow::Result;

use crate::model::{City, Id, PointOfInterest};
use crate::store::traits::{CityInfoStore, PendingChange};

/// Per-request gateway to the store.
///
/// Reads go straight through. Mutations are queued and only reach the store
/// when [`commit`](Self::commit) is called, as a single unit of work.
pub struct CityInfoRepository<'a, S: CityInfoStore> {
    store: &'a S,
    pending: Vec<PendingChange>,
    inserted: Vec<PointOfInterest>,
}

impl<'a, S: CityInfoStore> CityInfoRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pending: Vec::new(),
            inserted: Vec::new(),
        }
    }

    pub async fn city_exists(&self, city_id: Id) -> Result<bool> {
        self.store.city_exists(city_id).await
    }

    pub async fn get_cities(&self) -> Result<Vec<City>> {
        self.store.get_cities().await
    }

    pub async fn get_city(&self, city_id: Id, include_points: bool) -> Result<Option<City>> {
        self.store.get_city(city_id, include_points).await
    }

    pub async fn get_points_of_interest(&self, city_id: Id) -> Result<Vec<PointOfInterest>> {
        self.store.get_points_of_interest(city_id).await
    }

    pub async fn get_point_of_interest(
        &self,
        city_id: Id,
        point_id: Id,
    ) -> Result<Option<PointOfInterest>> {
        self.store.get_point_of_interest(city_id, point_id).await
    }

    pub fn add_point_of_interest(&mut self, city_id: Id, point: PointOfInterest) {
        self.pending.push(PendingChange::InsertPoint { city_id, point });
    }

    pub fn update_point_of_interest(&mut self, point: PointOfInterest) {
        self.pending.push(PendingChange::UpdatePoint(point));
    }

    pub fn delete_point_of_interest(&mut self, point: PointOfInterest) {
        self.pending.push(PendingChange::DeletePoint(point));
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush every queued mutation. Returns false if the store rejected the unit
    /// of work, in which case none of it was applied. The queue is emptied
    /// either way.
    pub async fn commit(&mut self) -> bool {
        let changes = std::mem::take(&mut self.pending);
        match self.store.save_changes(&changes).await {
            Ok(inserted) => {
                self.inserted = inserted;
                true
            }
            Err(e) => {
                log::error!("Commit of {} change(s) failed: {:#}", changes.len(), e);
                self.inserted.clear();
                false
            }
        }
    }

    /// Points inserted by the last successful commit, with their generated ids
    pub fn inserted_points(&self) -> &[PointOfInterest] {
        &self.inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::traits::CityStore;

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_city(
                City::new("Buenos Aires".to_string(), None).with_points(vec![
                    PointOfInterest::new("Obelisco".to_string(), None),
                ]),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_mutations_are_invisible_until_commit() {
        let store = seeded_store().await;
        let mut repo = CityInfoRepository::new(&store);

        repo.add_point_of_interest(1, PointOfInterest::new("Pink House".to_string(), None));
        assert!(repo.has_pending_changes());
        assert_eq!(repo.get_points_of_interest(1).await.unwrap().len(), 1);

        assert!(repo.commit().await);
        assert!(!repo.has_pending_changes());
        assert_eq!(repo.get_points_of_interest(1).await.unwrap().len(), 2);

        let inserted = repo.inserted_points();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].name, "Pink House");
        assert_eq!(inserted[0].city_id, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_reports_false_and_drops_queue() {
        let store = seeded_store().await;
        store.set_fail_saves(true);
        let mut repo = CityInfoRepository::new(&store);

        let point = repo.get_point_of_interest(1, 1).await.unwrap().unwrap();
        repo.delete_point_of_interest(point);

        assert!(!repo.commit().await);
        assert!(!repo.has_pending_changes());
        assert!(repo.inserted_points().is_empty());
        assert!(repo.get_point_of_interest(1, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_commit_succeeds() {
        let store = seeded_store().await;
        let mut repo = CityInfoRepository::new(&store);
        assert!(repo.commit().await);
    }
}
