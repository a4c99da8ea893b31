//! Field-by-field conversions between stored entities and transport DTOs.

use crate::model::{
    City, CityDto, CityWithoutPointsOfInterestDto, PointOfInterest,
    PointOfInterestDto, PointOfInterestForCreationDto, PointOfInterestForUpdateDto,
};

impl From<&City> for CityWithoutPointsOfInterestDto {
    fn from(city: &City) -> Self {
        Self {
            id: city.id,
            name: city.name.clone(),
            description: city.description.clone(),
        }
    }
}

impl From<&City> for CityDto {
    fn from(city: &City) -> Self {
        Self {
            id: city.id,
            name: city.name.clone(),
            description: city.description.clone(),
            points_of_interest: city
                .points_of_interest
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(PointOfInterestDto::from)
                .collect(),
        }
    }
}

impl From<&PointOfInterest> for PointOfInterestDto {
    fn from(point: &PointOfInterest) -> Self {
        Self {
            id: point.id,
            name: point.name.clone(),
            description: point.description.clone(),
        }
    }
}

/// Baseline for a patch document
impl From<&PointOfInterest> for PointOfInterestForUpdateDto {
    fn from(point: &PointOfInterest) -> Self {
        Self {
            name: Some(point.name.clone()),
            description: point.description.clone(),
        }
    }
}

impl From<PointOfInterestForCreationDto> for PointOfInterest {
    fn from(dto: PointOfInterestForCreationDto) -> Self {
        PointOfInterest::new(dto.name, dto.description)
    }
}

impl PointOfInterest {
    /// Overwrites every editable field with the values of a validated update body
    pub fn apply_update(&mut self, update: PointOfInterestForUpdateDto) {
        self.name = update.name.unwrap_or_default();
        self.description = update.description;
    }
}
