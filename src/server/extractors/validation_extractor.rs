use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::server::error::Error;

/// deserializes a JSON body and runs validator checks, rejecting with 422 on
/// rule violations and 400 on undecodable payloads
pub struct ValidationExtractor<T>(pub T);

impl<S, T> FromRequest<S> for ValidationExtractor<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| Error::BadRequest(err.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}
