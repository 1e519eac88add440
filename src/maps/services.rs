use std::sync::Arc;

use tracing::{info, warn};

use crate::db::StoreError;
use crate::error::{ApiError, ApiResult};
use crate::maps::dto::{AddUserLayerRequest, GeoLayerView, UpdateUserLayerRequest, UserLayerView};
use crate::maps::repo::LayerRepo;
use crate::maps::repo_types::{NewUserLayer, UserLayerPatch};

/// Catalog browsing and per-user layer collections.
#[derive(Clone)]
pub struct MapsService {
    layers: Arc<dyn LayerRepo>,
}

impl MapsService {
    pub fn new(layers: Arc<dyn LayerRepo>) -> Self {
        Self { layers }
    }

    pub async fn list_public_layers(&self) -> ApiResult<Vec<GeoLayerView>> {
        let layers = self.layers.list_public_layers().await?;
        Ok(layers.into_iter().map(GeoLayerView::from).collect())
    }

    /// Private entries are reported exactly like absent ones.
    pub async fn get_layer(&self, id: i64) -> ApiResult<GeoLayerView> {
        match self.layers.find_geo_layer(id).await? {
            Some(layer) if layer.is_public => Ok(layer.into()),
            _ => Err(ApiError::not_found("Layer not found")),
        }
    }

    pub async fn list_user_layers(&self, user_id: i64) -> ApiResult<Vec<UserLayerView>> {
        let rows = self.layers.list_user_layers(user_id).await?;
        Ok(rows.into_iter().map(UserLayerView::from).collect())
    }

    /// Any existing catalog entry may be referenced, public or private.
    pub async fn add_user_layer(&self, user_id: i64, req: AddUserLayerRequest) -> ApiResult<i64> {
        let geo_layer = match req.geo_layer_id {
            Some(id) => self.layers.find_geo_layer(id).await?,
            None => None,
        };
        let Some(geo_layer) = geo_layer else {
            warn!(user_id, geo_layer_id = ?req.geo_layer_id, "geo layer not found");
            return Err(ApiError::not_found("Geo layer not found"));
        };

        let created = self
            .layers
            .insert_user_layer(NewUserLayer {
                user_id,
                geo_layer_id: geo_layer.id,
                name: req.name,
                is_favorite: req.is_favorite.unwrap_or(false),
                feature_collection: req.feature_collection,
            })
            .await
            .map_err(|e| match e {
                // catalog entry deleted after the lookup
                StoreError::ForeignKeyViolation(_) => ApiError::not_found("Geo layer not found"),
                other => other.into(),
            })?;

        info!(user_id, id = created.id, geo_layer_id = geo_layer.id, "user layer added");
        Ok(created.id)
    }

    pub async fn update_user_layer(
        &self,
        user_id: i64,
        id: i64,
        req: UpdateUserLayerRequest,
    ) -> ApiResult<()> {
        let patch = UserLayerPatch::from(req);
        match self.layers.update_user_layer(user_id, id, &patch).await? {
            Some(_) => {
                info!(user_id, id, "user layer updated");
                Ok(())
            }
            None => {
                warn!(user_id, id, "user layer not found or not owned");
                Err(ApiError::not_found("Layer not found"))
            }
        }
    }

    pub async fn delete_user_layer(&self, user_id: i64, id: i64) -> ApiResult<()> {
        if self.layers.delete_user_layer(user_id, id).await? {
            info!(user_id, id, "user layer deleted");
            Ok(())
        } else {
            warn!(user_id, id, "user layer not found or not owned");
            Err(ApiError::not_found("Layer not found"))
        }
    }
}
