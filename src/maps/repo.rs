use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::StoreResult;
use crate::maps::repo_types::{
    GeoLayer, NewGeoLayer, NewUserLayer, UserLayer, UserLayerDetailRow, UserLayerPatch,
};

#[async_trait]
pub trait LayerRepo: Send + Sync {
    /// Catalog entries with `is_public = true`, in storage order.
    async fn list_public_layers(&self) -> StoreResult<Vec<GeoLayer>>;

    /// Any catalog entry by id, public or not.
    async fn find_geo_layer(&self, id: i64) -> StoreResult<Option<GeoLayer>>;

    async fn insert_geo_layer(&self, layer: NewGeoLayer) -> StoreResult<GeoLayer>;

    /// Deletes a catalog entry together with every user layer referencing it.
    async fn delete_geo_layer(&self, id: i64) -> StoreResult<bool>;

    /// Inserts `layers` only when the catalog is empty; returns how many were inserted.
    async fn seed_if_empty(&self, layers: &[NewGeoLayer]) -> StoreResult<usize>;

    async fn list_user_layers(&self, user_id: i64) -> StoreResult<Vec<UserLayerDetailRow>>;

    /// A missing catalog entry yields `StoreError::ForeignKeyViolation`.
    async fn insert_user_layer(&self, layer: NewUserLayer) -> StoreResult<UserLayer>;

    /// Applies `patch` to the layer only if `user_id` owns it.
    async fn update_user_layer(
        &self,
        user_id: i64,
        id: i64,
        patch: &UserLayerPatch,
    ) -> StoreResult<Option<UserLayer>>;

    /// Deletes the layer only if `user_id` owns it.
    async fn delete_user_layer(&self, user_id: i64, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgLayerRepo {
    db: PgPool,
}

impl PgLayerRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const GEO_LAYER_COLUMNS: &str =
    "id, name, description, layer_type, url, params, is_public, created_at";

const USER_LAYER_COLUMNS: &str =
    "id, user_id, geo_layer_id, name, is_favorite, feature_collection, created_at";

async fn insert_geo_layer_tx(
    tx: &mut Transaction<'_, Postgres>,
    layer: &NewGeoLayer,
) -> StoreResult<GeoLayer> {
    let row = sqlx::query_as::<_, GeoLayer>(&format!(
        r#"
        INSERT INTO geo_layers (name, description, layer_type, url, params, is_public)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {GEO_LAYER_COLUMNS}
        "#
    ))
    .bind(&layer.name)
    .bind(&layer.description)
    .bind(layer.layer_type.as_str())
    .bind(&layer.url)
    .bind(&layer.params)
    .bind(layer.is_public)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

#[async_trait]
impl LayerRepo for PgLayerRepo {
    async fn list_public_layers(&self) -> StoreResult<Vec<GeoLayer>> {
        let rows = sqlx::query_as::<_, GeoLayer>(&format!(
            r#"
            SELECT {GEO_LAYER_COLUMNS}
            FROM geo_layers
            WHERE is_public = TRUE
            ORDER BY id
            "#
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_geo_layer(&self, id: i64) -> StoreResult<Option<GeoLayer>> {
        let row = sqlx::query_as::<_, GeoLayer>(&format!(
            "SELECT {GEO_LAYER_COLUMNS} FROM geo_layers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_geo_layer(&self, layer: NewGeoLayer) -> StoreResult<GeoLayer> {
        let mut tx = self.db.begin().await?;
        let row = insert_geo_layer_tx(&mut tx, &layer).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_geo_layer(&self, id: i64) -> StoreResult<bool> {
        // user_layers rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM geo_layers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn seed_if_empty(&self, layers: &[NewGeoLayer]) -> StoreResult<usize> {
        let mut tx = self.db.begin().await?;
        // serializes concurrent seeders; plain reads are not blocked
        sqlx::query("LOCK TABLE geo_layers IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM geo_layers")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        for layer in layers {
            insert_geo_layer_tx(&mut tx, layer).await?;
        }
        tx.commit().await?;
        Ok(layers.len())
    }

    async fn list_user_layers(&self, user_id: i64) -> StoreResult<Vec<UserLayerDetailRow>> {
        let rows = sqlx::query_as::<_, UserLayerDetailRow>(
            r#"
            SELECT ul.id, ul.name, ul.is_favorite, ul.feature_collection,
                   g.id AS geo_layer_id, g.name AS geo_name, g.layer_type AS geo_layer_type,
                   g.url AS geo_url, g.params AS geo_params
              FROM user_layers ul
              JOIN geo_layers g ON g.id = ul.geo_layer_id
             WHERE ul.user_id = $1
             ORDER BY ul.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_user_layer(&self, layer: NewUserLayer) -> StoreResult<UserLayer> {
        let row = sqlx::query_as::<_, UserLayer>(&format!(
            r#"
            INSERT INTO user_layers (user_id, geo_layer_id, name, is_favorite, feature_collection)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_LAYER_COLUMNS}
            "#
        ))
        .bind(layer.user_id)
        .bind(layer.geo_layer_id)
        .bind(&layer.name)
        .bind(layer.is_favorite)
        .bind(&layer.feature_collection)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_user_layer(
        &self,
        user_id: i64,
        id: i64,
        patch: &UserLayerPatch,
    ) -> StoreResult<Option<UserLayer>> {
        let row = sqlx::query_as::<_, UserLayer>(&format!(
            r#"
            UPDATE user_layers
               SET name = CASE WHEN $3 THEN $4 ELSE name END,
                   is_favorite = COALESCE($5, is_favorite),
                   feature_collection = CASE WHEN $6 THEN $7 ELSE feature_collection END
             WHERE id = $1 AND user_id = $2
            RETURNING {USER_LAYER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.name.is_some())
        .bind(patch.name.clone().flatten())
        .bind(patch.is_favorite)
        .bind(patch.feature_collection.is_some())
        .bind(patch.feature_collection.clone().flatten())
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_user_layer(&self, user_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_layers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
