use crate::model::Id;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

/// City with its points of interest
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDto {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterestDto>,
}

impl CityDto {
    pub fn number_of_points_of_interest(&self) -> usize {
        self.points_of_interest.len()
    }
}

// The point count is derived from the collection, so it is written out by hand
impl Serialize for CityDto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CityDto", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field(
            "numberOfPointsOfInterest",
            &self.number_of_points_of_interest(),
        )?;
        state.serialize_field("pointsOfInterest", &self.points_of_interest)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityWithoutPointsOfInterestDto {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterestDto {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

/// Request body of `POST .../pointsofinterest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterestForCreationDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "The name must be between 1 and 50 characters."))]
    pub name: String,
    #[validate(length(max = 200, message = "The description can't be longer than 200 characters."))]
    pub description: Option<String>,
}

/// Request body of `PUT .../pointsofinterest/{id}` and the target of patch documents.
///
/// Both fields are optional so that a patch `remove` can unset them; a missing
/// name is then caught by validation rather than by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterestForUpdateDto {
    #[validate(
        required(message = "You should provide a name value."),
        length(min = 1, max = 50, message = "The name must be between 1 and 50 characters.")
    )]
    pub name: Option<String>,
    #[validate(length(max = 200, message = "The description can't be longer than 200 characters."))]
    pub description: Option<String>,
}

/// Read access to the editable fields shared by the create and update bodies
pub trait EditablePointFields {
    fn name(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
}

impl EditablePointFields for PointOfInterestForCreationDto {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl EditablePointFields for PointOfInterestForUpdateDto {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_dto_serializes_point_count() {
        let city = CityDto {
            id: 1,
            name: "Buenos Aires".to_string(),
            description: Some("The Paris of South America".to_string()),
            points_of_interest: vec![
                PointOfInterestDto {
                    id: 1,
                    name: "Obelisco".to_string(),
                    description: None,
                },
                PointOfInterestDto {
                    id: 2,
                    name: "Pink House".to_string(),
                    description: Some("The government house".to_string()),
                },
            ],
        };

        let json = serde_json::to_value(&city).unwrap();
        assert_eq!(json["numberOfPointsOfInterest"], 2);
        assert_eq!(json["pointsOfInterest"][1]["name"], "Pink House");
        assert_eq!(json["description"], "The Paris of South America");
    }

    #[test]
    fn test_creation_dto_missing_name_defaults_to_empty() {
        let dto: PointOfInterestForCreationDto =
            serde_json::from_str(r#"{"description": "Only a description"}"#).unwrap();
        assert_eq!(dto.name, "");
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_dto_requires_name() {
        let dto = PointOfInterestForUpdateDto {
            name: None,
            description: Some("Something".to_string()),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_update_dto_length_limits() {
        let dto = PointOfInterestForUpdateDto {
            name: Some("n".repeat(51)),
            description: Some("d".repeat(201)),
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
    }
}
