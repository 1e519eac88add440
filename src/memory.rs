//! In-memory implementation of the repository traits used by tests.
//!
//! Mirrors the Postgres schema constraints: unique username/email, the
//! user layer foreign key on the catalog, cascade on catalog delete and
//! owner-scoped update/delete.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{NewUser, User};
use crate::db::{StoreError, StoreResult};
use crate::maps::repo::LayerRepo;
use crate::maps::repo_types::{
    GeoLayer, NewGeoLayer, NewUserLayer, UserLayer, UserLayerDetailRow, UserLayerPatch,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    geo_layers: Vec<GeoLayer>,
    user_layers: Vec<UserLayer>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_geo_layer(&mut self, layer: &NewGeoLayer) -> GeoLayer {
        let row = GeoLayer {
            id: self.next_id(),
            name: layer.name.clone(),
            description: layer.description.clone(),
            layer_type: layer.layer_type,
            url: layer.url.clone(),
            params: Some(layer.params.clone()),
            is_public: layer.is_public,
            created_at: OffsetDateTime::now_utc(),
        };
        self.geo_layers.push(row.clone());
        row
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn user_layer_count(&self) -> usize {
        self.tables().user_layers.len()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool> {
        Ok(self
            .tables()
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables();
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let row = User {
            id: t.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl LayerRepo for MemoryStore {
    async fn list_public_layers(&self) -> StoreResult<Vec<GeoLayer>> {
        Ok(self
            .tables()
            .geo_layers
            .iter()
            .filter(|g| g.is_public)
            .cloned()
            .collect())
    }

    async fn find_geo_layer(&self, id: i64) -> StoreResult<Option<GeoLayer>> {
        Ok(self.tables().geo_layers.iter().find(|g| g.id == id).cloned())
    }

    async fn insert_geo_layer(&self, layer: NewGeoLayer) -> StoreResult<GeoLayer> {
        Ok(self.tables().insert_geo_layer(&layer))
    }

    async fn delete_geo_layer(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.tables();
        let before = t.geo_layers.len();
        t.geo_layers.retain(|g| g.id != id);
        if t.geo_layers.len() == before {
            return Ok(false);
        }
        t.user_layers.retain(|ul| ul.geo_layer_id != id);
        Ok(true)
    }

    async fn seed_if_empty(&self, layers: &[NewGeoLayer]) -> StoreResult<usize> {
        let mut t = self.tables();
        if !t.geo_layers.is_empty() {
            return Ok(0);
        }
        for layer in layers {
            t.insert_geo_layer(layer);
        }
        Ok(layers.len())
    }

    async fn list_user_layers(&self, user_id: i64) -> StoreResult<Vec<UserLayerDetailRow>> {
        let t = self.tables();
        let rows = t
            .user_layers
            .iter()
            .filter(|ul| ul.user_id == user_id)
            .filter_map(|ul| {
                let g = t.geo_layers.iter().find(|g| g.id == ul.geo_layer_id)?;
                Some(UserLayerDetailRow {
                    id: ul.id,
                    name: ul.name.clone(),
                    is_favorite: ul.is_favorite,
                    feature_collection: ul.feature_collection.clone(),
                    geo_layer_id: g.id,
                    geo_name: g.name.clone(),
                    geo_layer_type: g.layer_type,
                    geo_url: g.url.clone(),
                    geo_params: g.params.clone(),
                })
            })
            .collect();
        Ok(rows)
    }

    async fn insert_user_layer(&self, layer: NewUserLayer) -> StoreResult<UserLayer> {
        let mut t = self.tables();
        if !t.geo_layers.iter().any(|g| g.id == layer.geo_layer_id) {
            return Err(StoreError::ForeignKeyViolation(
                "user_layers_geo_layer_id_fkey".into(),
            ));
        }
        let row = UserLayer {
            id: t.next_id(),
            user_id: layer.user_id,
            geo_layer_id: layer.geo_layer_id,
            name: layer.name,
            is_favorite: layer.is_favorite,
            feature_collection: layer.feature_collection,
            created_at: OffsetDateTime::now_utc(),
        };
        t.user_layers.push(row.clone());
        Ok(row)
    }

    async fn update_user_layer(
        &self,
        user_id: i64,
        id: i64,
        patch: &UserLayerPatch,
    ) -> StoreResult<Option<UserLayer>> {
        let mut t = self.tables();
        let Some(row) = t
            .user_layers
            .iter_mut()
            .find(|ul| ul.id == id && ul.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            row.name = name.clone();
        }
        if let Some(is_favorite) = patch.is_favorite {
            row.is_favorite = is_favorite;
        }
        if let Some(fc) = &patch.feature_collection {
            row.feature_collection = fc.clone();
        }
        Ok(Some(row.clone()))
    }

    async fn delete_user_layer(&self, user_id: i64, id: i64) -> StoreResult<bool> {
        let mut t = self.tables();
        let before = t.user_layers.len();
        t.user_layers.retain(|ul| !(ul.id == id && ul.user_id == user_id));
        Ok(t.user_layers.len() < before)
    }
}
