use anyhow::{anyhow, bail, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::model::{City, Id, PointOfInterest};
use crate::store::traits::{CityStore, PendingChange, PointOfInterestStore, UnitOfWorkStore};

#[derive(Debug, Clone)]
struct MemoryState {
    /// Each city owns its points, so dropping a city drops its points
    cities: Vec<City>,
    next_city_id: Id,
    next_point_id: Id,
}

impl MemoryState {
    fn city(&self, city_id: Id) -> Option<&City> {
        self.cities.iter().find(|c| c.id == city_id)
    }

    fn points_mut(&mut self, city_id: Id) -> Option<&mut Vec<PointOfInterest>> {
        self.cities
            .iter_mut()
            .find(|c| c.id == city_id)
            .map(|c| c.points_of_interest.get_or_insert_with(Vec::new))
    }

    fn apply(&mut self, change: &PendingChange) -> Result<Option<PointOfInterest>> {
        match change {
            PendingChange::InsertPoint { city_id, point } => {
                let id = self.next_point_id;
                let points = self
                    .points_mut(*city_id)
                    .ok_or_else(|| anyhow!("City {} does not exist", city_id))?;
                let mut inserted = point.clone();
                inserted.id = id;
                inserted.city_id = *city_id;
                points.push(inserted.clone());
                self.next_point_id += 1;
                Ok(Some(inserted))
            }
            PendingChange::UpdatePoint(point) => {
                let stored = self
                    .points_mut(point.city_id)
                    .and_then(|points| points.iter_mut().find(|p| p.id == point.id))
                    .ok_or_else(|| anyhow!("Point of interest {} does not exist", point.id))?;
                stored.name = point.name.clone();
                stored.description = point.description.clone();
                Ok(None)
            }
            PendingChange::DeletePoint(point) => {
                let points = self
                    .points_mut(point.city_id)
                    .ok_or_else(|| anyhow!("City {} does not exist", point.city_id))?;
                let before = points.len();
                points.retain(|p| p.id != point.id);
                if points.len() == before {
                    bail!("Point of interest {} does not exist", point.id);
                }
                Ok(None)
            }
        }
    }
}

/// Process-local store. One instance is created at start-up and shared through
/// an `Arc`; nothing here is global.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fail_saves: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                cities: Vec::new(),
                next_city_id: 1,
                next_point_id: 1,
            }),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make every following `save_changes` fail without touching the data
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CityStore for InMemoryStore {
    async fn city_exists(&self, city_id: Id) -> Result<bool> {
        Ok(self.state.read().city(city_id).is_some())
    }

    async fn get_cities(&self) -> Result<Vec<City>> {
        let state = self.state.read();
        let mut cities: Vec<City> = state.cities.iter().map(City::without_points).collect();
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cities)
    }

    async fn get_city(&self, city_id: Id, include_points: bool) -> Result<Option<City>> {
        let state = self.state.read();
        let Some(city) = state.city(city_id) else {
            return Ok(None);
        };

        if include_points {
            let points = city.points_of_interest.clone().unwrap_or_default();
            Ok(Some(city.without_points().with_points(points)))
        } else {
            Ok(Some(city.without_points()))
        }
    }

    async fn insert_city(&self, city: City) -> Result<City> {
        let mut state = self.state.write();

        let city_id = state.next_city_id;
        state.next_city_id += 1;

        let mut points = Vec::new();
        for point in city.points_of_interest.unwrap_or_default() {
            points.push(PointOfInterest {
                id: state.next_point_id,
                city_id,
                ..point
            });
            state.next_point_id += 1;
        }

        let stored = City {
            id: city_id,
            name: city.name,
            description: city.description,
            points_of_interest: Some(points),
        };
        state.cities.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait::async_trait]
impl PointOfInterestStore for InMemoryStore {
    async fn get_points_of_interest(&self, city_id: Id) -> Result<Vec<PointOfInterest>> {
        let state = self.state.read();
        Ok(state
            .city(city_id)
            .and_then(|c| c.points_of_interest.clone())
            .unwrap_or_default())
    }

    async fn get_point_of_interest(
        &self,
        city_id: Id,
        point_id: Id,
    ) -> Result<Option<PointOfInterest>> {
        let state = self.state.read();
        Ok(state
            .city(city_id)
            .and_then(|c| c.points_of_interest.as_ref())
            .and_then(|points| {
                points
                    .iter()
                    .find(|p| p.id == point_id && p.belongs_to(city_id))
            })
            .cloned())
    }
}

#[async_trait::async_trait]
impl UnitOfWorkStore for InMemoryStore {
    async fn save_changes(&self, changes: &[PendingChange]) -> Result<Vec<PointOfInterest>> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("In-memory store is configured to reject saves");
        }

        let mut state = self.state.write();

        // Work on a copy so a failing change leaves the live state untouched
        let mut working = state.clone();
        let mut inserted = Vec::new();
        for change in changes {
            if let Some(point) = working.apply(change)? {
                inserted.push(point);
            }
        }

        *state = working;
        Ok(inserted)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_two_cities() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_city(
                City::new("Resistencia".to_string(), None).with_points(vec![
                    PointOfInterest::new("Cathedral".to_string(), None),
                ]),
            )
            .await
            .unwrap();
        store
            .insert_city(
                City::new("Corrientes".to_string(), None).with_points(vec![
                    PointOfInterest::new("Costanera".to_string(), None),
                ]),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_point_lookup_checks_owning_city() {
        let store = store_with_two_cities().await;

        let cathedral = store.get_point_of_interest(1, 1).await.unwrap();
        assert_eq!(cathedral.unwrap().name, "Cathedral");

        // Point 1 exists, but not under city 2
        assert!(store.get_point_of_interest(2, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cities_are_listed_by_name_without_points() {
        let store = store_with_two_cities().await;

        let cities = store.get_cities().await.unwrap();
        let names: Vec<_> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Corrientes", "Resistencia"]);
        assert!(cities.iter().all(|c| c.points_of_interest.is_none()));

        let city = store.get_city(1, true).await.unwrap().unwrap();
        assert_eq!(city.points_of_interest.unwrap().len(), 1);
        let city = store.get_city(1, false).await.unwrap().unwrap();
        assert!(city.points_of_interest.is_none());
    }

    #[tokio::test]
    async fn test_save_changes_is_all_or_nothing() {
        let store = store_with_two_cities().await;

        let changes = vec![
            PendingChange::InsertPoint {
                city_id: 1,
                point: PointOfInterest::new("Democracy Park".to_string(), None),
            },
            PendingChange::DeletePoint(PointOfInterest {
                id: 99,
                name: "Missing".to_string(),
                description: None,
                city_id: 1,
            }),
        ];

        assert!(store.save_changes(&changes).await.is_err());
        assert_eq!(store.get_points_of_interest(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_changes_assigns_ids_to_inserted_points() {
        let store = store_with_two_cities().await;

        let inserted = store
            .save_changes(&[PendingChange::InsertPoint {
                city_id: 2,
                point: PointOfInterest::new("Bridge".to_string(), None),
            }])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].id, 3);
        assert_eq!(inserted[0].city_id, 2);
        assert!(store.get_point_of_interest(2, 3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failing_saves_leave_data_untouched() {
        let store = store_with_two_cities().await;
        store.set_fail_saves(true);

        let cathedral = store.get_point_of_interest(1, 1).await.unwrap().unwrap();
        let result = store
            .save_changes(&[PendingChange::DeletePoint(cathedral)])
            .await;

        assert!(result.is_err());
        assert!(store.get_point_of_interest(1, 1).await.unwrap().is_some());
    }
}
