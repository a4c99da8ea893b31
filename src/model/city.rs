use crate::model::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    /// `None` when the points were not loaded with the city
    pub points_of_interest: Option<Vec<PointOfInterest>>,
}

impl City {
    /// A transient city; the store assigns the id on insert
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: 0,
            name,
            description,
            points_of_interest: None,
        }
    }

    pub fn with_points(mut self, points: Vec<PointOfInterest>) -> Self {
        self.points_of_interest = Some(points);
        self
    }

    /// Copy of the city with its points left unloaded
    pub fn without_points(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            points_of_interest: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub city_id: Id, // Owning city
}

impl PointOfInterest {
    /// A transient point; id and owning city are set when it is added to a city
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: 0,
            name,
            description,
            city_id: 0,
        }
    }

    pub fn belongs_to(&self, city_id: Id) -> bool {
        self.city_id == city_id
    }
}
