use serde::{Deserialize, Deserializer, Serialize};

use crate::maps::repo_types::{GeoLayer, LayerType, UserLayerDetailRow, UserLayerPatch};

/// Public projection of a catalog entry.
#[derive(Debug, Serialize)]
pub struct GeoLayerView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub layer_type: LayerType,
    pub url: String,
    pub params: Option<serde_json::Value>,
}

impl From<GeoLayer> for GeoLayerView {
    fn from(g: GeoLayer) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            layer_type: g.layer_type,
            url: g.url,
            params: g.params,
        }
    }
}

/// Catalog summary nested in a user layer.
#[derive(Debug, Serialize)]
pub struct GeoLayerSummary {
    pub id: i64,
    pub name: String,
    pub layer_type: LayerType,
    pub url: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct UserLayerView {
    pub id: i64,
    pub name: String,
    pub is_favorite: bool,
    pub geo_layer: GeoLayerSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_collection: Option<serde_json::Value>,
}

impl From<UserLayerDetailRow> for UserLayerView {
    fn from(r: UserLayerDetailRow) -> Self {
        Self {
            id: r.id,
            name: r.name.unwrap_or_else(|| r.geo_name.clone()),
            is_favorite: r.is_favorite,
            geo_layer: GeoLayerSummary {
                id: r.geo_layer_id,
                name: r.geo_name,
                layer_type: r.geo_layer_type,
                url: r.geo_url,
                params: r.geo_params,
            },
            feature_collection: r.feature_collection.filter(|fc| !is_empty_document(fc)),
        }
    }
}

/// Null and empty containers/strings carry no user-drawn features.
pub(crate) fn is_empty_document(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
pub struct AddUserLayerRequest {
    #[serde(default)]
    pub geo_layer_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub feature_collection: Option<serde_json::Value>,
}

/// Partial update body. Absent keys stay `None`; an explicit `null` becomes `Some(None)`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserLayerRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub feature_collection: Option<Option<serde_json::Value>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateUserLayerRequest> for UserLayerPatch {
    fn from(req: UpdateUserLayerRequest) -> Self {
        Self {
            name: req.name,
            is_favorite: req.is_favorite,
            feature_collection: req.feature_collection,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail_row(name: Option<&str>, fc: Option<serde_json::Value>) -> UserLayerDetailRow {
        UserLayerDetailRow {
            id: 5,
            name: name.map(str::to_string),
            is_favorite: true,
            feature_collection: fc,
            geo_layer_id: 1,
            geo_name: "OpenStreetMap".into(),
            geo_layer_type: LayerType::Xyz,
            geo_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            geo_params: Some(json!({"attribution": "osm"})),
        }
    }

    #[test]
    fn update_body_distinguishes_absent_from_null() {
        let req: UpdateUserLayerRequest = serde_json::from_value(json!({"is_favorite": true})).unwrap();
        assert_eq!(req.name, None);
        assert_eq!(req.feature_collection, None);
        assert_eq!(req.is_favorite, Some(true));

        let req: UpdateUserLayerRequest =
            serde_json::from_value(json!({"name": null, "feature_collection": null})).unwrap();
        assert_eq!(req.name, Some(None));
        assert_eq!(req.feature_collection, Some(None));
        assert_eq!(req.is_favorite, None);

        let req: UpdateUserLayerRequest = serde_json::from_value(json!({"name": "Mine"})).unwrap();
        assert_eq!(req.name, Some(Some("Mine".to_string())));
    }

    #[test]
    fn add_body_defaults_optional_fields() {
        let req: AddUserLayerRequest = serde_json::from_value(json!({"geo_layer_id": 1})).unwrap();
        assert_eq!(req.geo_layer_id, Some(1));
        assert!(req.name.is_none());
        assert!(req.is_favorite.is_none());
        assert!(req.feature_collection.is_none());
    }

    #[test]
    fn view_falls_back_to_catalog_name() {
        let view = UserLayerView::from(detail_row(None, None));
        assert_eq!(view.name, "OpenStreetMap");
        let view = UserLayerView::from(detail_row(Some("My base map"), None));
        assert_eq!(view.name, "My base map");
        assert_eq!(view.geo_layer.name, "OpenStreetMap");
    }

    #[test]
    fn view_omits_empty_feature_collection() {
        let json = serde_json::to_value(UserLayerView::from(detail_row(None, None))).unwrap();
        assert!(json.get("feature_collection").is_none());

        let json = serde_json::to_value(UserLayerView::from(detail_row(None, Some(json!({}))))).unwrap();
        assert!(json.get("feature_collection").is_none());

        let fc = json!({"type": "FeatureCollection", "features": []});
        let json = serde_json::to_value(UserLayerView::from(detail_row(None, Some(fc.clone())))).unwrap();
        assert_eq!(json["feature_collection"], fc);
        assert_eq!(json["geo_layer"]["layer_type"], "XYZ");
    }
}
