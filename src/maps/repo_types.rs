use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

/// Tile service protocol of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "WMS")]
    Wms,
    #[serde(rename = "WMTS")]
    Wmts,
    #[serde(rename = "XYZ")]
    Xyz,
}

impl LayerType {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Wms => "WMS",
            LayerType::Wmts => "WMTS",
            LayerType::Xyz => "XYZ",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown layer type: {0}")]
pub struct UnknownLayerType(String);

impl FromStr for LayerType {
    type Err = UnknownLayerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WMS" => Ok(LayerType::Wms),
            "WMTS" => Ok(LayerType::Wmts),
            "XYZ" => Ok(LayerType::Xyz),
            other => Err(UnknownLayerType(other.to_string())),
        }
    }
}

impl TryFrom<String> for LayerType {
    type Error = UnknownLayerType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Catalog entry describing a tile source.
#[derive(Debug, Clone, FromRow)]
pub struct GeoLayer {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub layer_type: LayerType,
    pub url: String,
    pub params: Option<serde_json::Value>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGeoLayer {
    pub name: String,
    pub description: Option<String>,
    pub layer_type: LayerType,
    pub url: String,
    pub params: serde_json::Value,
    pub is_public: bool,
}

/// A user's personalized binding to a catalog entry.
#[derive(Debug, Clone, FromRow)]
pub struct UserLayer {
    pub id: i64,
    pub user_id: i64,
    pub geo_layer_id: i64,
    pub name: Option<String>,
    pub is_favorite: bool,
    pub feature_collection: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUserLayer {
    pub user_id: i64,
    pub geo_layer_id: i64,
    pub name: Option<String>,
    pub is_favorite: bool,
    pub feature_collection: Option<serde_json::Value>,
}

/// Fields to change on a user layer; `None` leaves the column untouched,
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct UserLayerPatch {
    pub name: Option<Option<String>>,
    pub is_favorite: Option<bool>,
    pub feature_collection: Option<Option<serde_json::Value>>,
}

/// User layer joined with the catalog entry it references.
#[derive(Debug, Clone, FromRow)]
pub struct UserLayerDetailRow {
    pub id: i64,
    pub name: Option<String>,
    pub is_favorite: bool,
    pub feature_collection: Option<serde_json::Value>,
    pub geo_layer_id: i64,
    pub geo_name: String,
    #[sqlx(try_from = "String")]
    pub geo_layer_type: LayerType,
    pub geo_url: String,
    pub geo_params: Option<serde_json::Value>,
}
