use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// JSON body extractor that treats an empty body and a literal `null` alike.
///
/// Handlers get `None` for both and decide how to reject it; malformed JSON is
/// turned into a 400 here instead of axum's 415/422 rejections.
#[derive(Debug)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        parse_body(&bytes).map(OptionalJson)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<Option<T>>(bytes)
        .map_err(|e| ApiError::BadRequest(format!("The request body is not valid: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointOfInterestForCreationDto;

    #[test]
    fn test_empty_and_null_bodies_are_none() {
        assert!(parse_body::<PointOfInterestForCreationDto>(b"").unwrap().is_none());
        assert!(parse_body::<PointOfInterestForCreationDto>(b"  \n").unwrap().is_none());
        assert!(parse_body::<PointOfInterestForCreationDto>(b"null").unwrap().is_none());
    }

    #[test]
    fn test_valid_body_is_parsed() {
        let dto = parse_body::<PointOfInterestForCreationDto>(
            br#"{"name": "Obelisco", "description": "Big Obelisk"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(dto.name, "Obelisco");
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let result = parse_body::<PointOfInterestForCreationDto>(b"{\"name\": ");
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
