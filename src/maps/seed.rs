use serde_json::json;
use tracing::info;

use crate::db::StoreResult;
use crate::maps::repo::LayerRepo;
use crate::maps::repo_types::{LayerType, NewGeoLayer};

/// The three public layers every fresh catalog starts with.
pub fn default_layers() -> Vec<NewGeoLayer> {
    vec![
        NewGeoLayer {
            name: "OpenStreetMap".into(),
            description: Some("Standard OpenStreetMap tile layer".into()),
            layer_type: LayerType::Xyz,
            url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            params: json!({
                "attribution": "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
            }),
            is_public: true,
        },
        NewGeoLayer {
            name: "USGS Topo".into(),
            description: Some("USGS Topographic Map".into()),
            layer_type: LayerType::Wms,
            url: "https://basemap.nationalmap.gov/arcgis/services/USGSTopo/MapServer/WMSServer"
                .into(),
            params: json!({
                "layers": "0",
                "format": "image/png",
                "transparent": true
            }),
            is_public: true,
        },
        NewGeoLayer {
            name: "NASA GIBS ModisTerraTrueColor".into(),
            description: Some("NASA MODIS Terra True Color imagery".into()),
            layer_type: LayerType::Wmts,
            url: "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Terra_CorrectedReflectance_TrueColor/default/{Time}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.jpg".into(),
            params: json!({
                "format": "image/jpeg",
                "time": "2023-01-01",
                "tileMatrixSet": "GoogleMapsCompatible_Level9"
            }),
            is_public: true,
        },
    ]
}

/// Populates an empty catalog; a no-op once any entry exists.
pub async fn seed_default_layers(layers: &dyn LayerRepo) -> StoreResult<usize> {
    let inserted = layers.seed_if_empty(&default_layers()).await?;
    if inserted > 0 {
        info!(inserted, "seeded default geo layers");
    } else {
        info!("geo layer catalog already populated; skipping seed");
    }
    Ok(inserted)
}
