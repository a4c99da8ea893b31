use crate::model::{City, Id, PointOfInterest};
use anyhow::Result;

/// A mutation queued by the repository until the next commit
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    InsertPoint { city_id: Id, point: PointOfInterest },
    UpdatePoint(PointOfInterest),
    DeletePoint(PointOfInterest),
}

#[async_trait::async_trait]
pub trait CityStore: Send + Sync {
    async fn city_exists(&self, city_id: Id) -> Result<bool>;
    /// All cities ordered by name, points of interest not loaded
    async fn get_cities(&self) -> Result<Vec<City>>;
    async fn get_city(&self, city_id: Id, include_points: bool) -> Result<Option<City>>;
    /// Insert a city together with any points it carries (used for seeding)
    async fn insert_city(&self, city: City) -> Result<City>;
}

#[async_trait::async_trait]
pub trait PointOfInterestStore: Send + Sync {
    async fn get_points_of_interest(&self, city_id: Id) -> Result<Vec<PointOfInterest>>;
    /// Only returns the point when it belongs to `city_id`
    async fn get_point_of_interest(
        &self,
        city_id: Id,
        point_id: Id,
    ) -> Result<Option<PointOfInterest>>;
}

#[async_trait::async_trait]
pub trait UnitOfWorkStore: Send + Sync {
    /// Apply every change or none of them. Returns the inserted points with their
    /// generated ids, in the order they were queued.
    async fn save_changes(&self, changes: &[PendingChange]) -> Result<Vec<PointOfInterest>>;
    /// Cheap connectivity check
    async fn ping(&self) -> Result<()>;
}

pub trait CityInfoStore: CityStore + PointOfInterestStore + UnitOfWorkStore + Send + Sync {}
impl<T: CityStore + PointOfInterestStore + UnitOfWorkStore> CityInfoStore for T {}
