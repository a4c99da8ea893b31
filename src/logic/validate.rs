use validator::{Validate, ValidationError, ValidationErrors};

use crate::model::EditablePointFields;

pub const NAME_EQUALS_DESCRIPTION: &str =
    "The provided description should be different from the name";

/// Field rules from the DTO's `#[validate]` attributes plus the cross-field
/// rule that a point's name and description must differ. All failures are
/// collected; the cross-field failure is reported on `description`.
pub fn validate_point_of_interest<T>(dto: &T) -> Result<(), ValidationErrors>
where
    T: Validate + EditablePointFields,
{
    let mut errors = match dto.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    if dto.name() == dto.description() {
        errors.add(
            "description",
            ValidationError::new("name_equals_description")
                .with_message(NAME_EQUALS_DESCRIPTION.into()),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
