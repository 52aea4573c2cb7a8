//! Store background types.

use serde::{Deserialize, Serialize};

use super::id::BackgroundId;

/// A storefront background image. At most one is active at a time; the
/// backend answers `GET /backgrounds/active` with 404 when none is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub id: BackgroundId,
    pub name: String,
    pub image_url: String,
    pub is_active: bool,
}
