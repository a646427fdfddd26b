//! Backend access used by the page.
//!
//! The page only talks to a [`DataGateway`]; [`SqliteGateway`] serves the data
//! out of the local database.

use std::future::Future;

use sqlx::SqlitePool;

use crate::data::{ImageSource, NewReview, Restaurant, Review};
use crate::db;
use crate::map::{MapHandle, Marker};

pub trait DataGateway {
    /// `Ok(None)` when the backend has no restaurant with this id.
    fn fetch_restaurant_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = anyhow::Result<Option<Restaurant>>> + Send;

    fn fetch_reviews_by_restaurant_id(
        &self,
        id: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<Review>>> + Send;

    /// Persist a review, resolving to the stored copy with its assigned id.
    fn publish_review(
        &self,
        id: i64,
        review: NewReview,
    ) -> impl Future<Output = anyhow::Result<Review>> + Send;

    fn image_url_for_restaurant(&self, restaurant: &Restaurant) -> ImageSource;

    fn map_marker_for_restaurant(&self, restaurant: &Restaurant, map: &mut MapHandle);
}

/// Page URL of a restaurant, relative to the site root.
pub fn url_for_restaurant(restaurant: &Restaurant) -> String {
    format!("./restaurant.html?id={}", restaurant.id)
}

#[derive(Clone)]
pub struct SqliteGateway {
    db_pool: SqlitePool,
    image_base: String,
}

impl SqliteGateway {
    pub fn new(db_pool: SqlitePool, image_base: impl Into<String>) -> Self {
        let image_base = image_base.into().trim_end_matches('/').to_string();
        Self {
            db_pool,
            image_base,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }
}

impl DataGateway for SqliteGateway {
    async fn fetch_restaurant_by_id(&self, id: i64) -> anyhow::Result<Option<Restaurant>> {
        db::get_restaurant(&self.db_pool, id).await
    }

    async fn fetch_reviews_by_restaurant_id(&self, id: i64) -> anyhow::Result<Vec<Review>> {
        db::get_reviews(&self.db_pool, id).await
    }

    async fn publish_review(&self, id: i64, review: NewReview) -> anyhow::Result<Review> {
        anyhow::ensure!(
            review.restaurant_id == id,
            "review belongs to restaurant {}, not {id}",
            review.restaurant_id
        );
        db::add_review(&self.db_pool, review).await
    }

    fn image_url_for_restaurant(&self, restaurant: &Restaurant) -> ImageSource {
        let stem = restaurant
            .photograph
            .clone()
            .unwrap_or_else(|| restaurant.id.to_string());
        let sized = |width: u32| format!("{}/{stem}-{width}.jpg", self.image_base);

        ImageSource {
            src: sized(800),
            srcset: format!("{} 400w, {} 800w", sized(400), sized(800)),
        }
    }

    fn map_marker_for_restaurant(&self, restaurant: &Restaurant, map: &mut MapHandle) {
        map.add_marker(Marker {
            position: restaurant.latlng,
            title: restaurant.name.clone(),
            alt: restaurant.name.clone(),
            url: url_for_restaurant(restaurant),
        });
    }
}
