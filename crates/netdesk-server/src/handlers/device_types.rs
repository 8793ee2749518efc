//! `GET /device-types`: the read-only device-type catalogue.

use axum::{Json, extract::State};
use netdesk_core::{directory::DeviceType, store::ProvisioningStore};

use crate::{AppState, Store, auth::Caller, error::ResourceError};

pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<DeviceType>>, ResourceError> {
  let types = state
    .store
    .list_device_types()
    .await
    .map_err(ResourceError::failed("An error occurred while loading device types."))?;
  Ok(Json(types))
}
