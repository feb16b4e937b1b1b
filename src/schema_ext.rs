//! OpenAPI stand-ins for foreign types that do not implement `ToSchema`.
//! Models point at them with `#[schema(value_type = ...)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// RFC 3339 timestamp in UTC
#[derive(Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, format = "date-time", example = "2024-03-14T09:26:53Z")]
pub struct DateTimeWrapper(pub DateTime<Utc>);

/// Account identifier
#[derive(Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, format = "uuid", example = "7f9c24e8-3b12-4fef-91e8-1a2b3c4d5e6f")]
pub struct UuidWrapper(pub Uuid);
