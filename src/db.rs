use anyhow::Context;
use derive_builder::Builder;
use sqlx::sqlite::SqlitePool;

use crate::data::{LatLng, NewReview, OperatingHours, Restaurant, Review};

const SCHEMA: [&str; 2] = [
    r#"
CREATE TABLE IF NOT EXISTS restaurant (
    id              INTEGER PRIMARY KEY,
    name            TEXT NOT NULL,
    address         TEXT NOT NULL,
    cuisine_type    TEXT NOT NULL,
    lat             REAL NOT NULL,
    lng             REAL NOT NULL,
    operating_hours TEXT,
    photograph      TEXT
)"#,
    r#"
CREATE TABLE IF NOT EXISTS review (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    restaurant_id INTEGER NOT NULL REFERENCES restaurant (id),
    name          TEXT NOT NULL,
    rating        INTEGER NOT NULL,
    comments      TEXT NOT NULL,
    created_at    INTEGER NOT NULL
)"#,
];

pub async fn init_schema(db_conn: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(db_conn)
            .await
            .context("fail to create tables")?;
    }
    Ok(())
}

#[derive(Builder)]
pub struct NewRestaurantProps {
    #[builder(setter(into, strip_option), default)]
    id: Option<i64>,
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    address: String,
    #[builder(setter(into))]
    cuisine_type: String,
    latlng: LatLng,
    #[builder(setter(strip_option), default)]
    operating_hours: Option<OperatingHours>,
    #[builder(setter(into, strip_option), default)]
    photograph: Option<String>,
}

impl TryFrom<Restaurant> for NewRestaurantProps {
    type Error = anyhow::Error;

    fn try_from(r: Restaurant) -> anyhow::Result<Self> {
        let mut builder = NewRestaurantPropsBuilder::default();
        builder
            .id(r.id)
            .name(r.name)
            .address(r.address)
            .cuisine_type(r.cuisine_type)
            .latlng(r.latlng);
        if let Some(hours) = r.operating_hours {
            builder.operating_hours(hours);
        }
        if let Some(photograph) = r.photograph {
            builder.photograph(photograph);
        }
        builder
            .build()
            .with_context(|| format!("incomplete restaurant {}", r.id))
    }
}

pub async fn add_restaurant(
    db_conn: &SqlitePool,
    prop: NewRestaurantProps,
) -> anyhow::Result<i64> {
    let NewRestaurantProps {
        id,
        name,
        address,
        cuisine_type,
        latlng,
        operating_hours,
        photograph,
    } = prop;

    let hours = operating_hours
        .map(|hours| serde_json::to_string(&hours))
        .transpose()
        .context("fail to encode operating hours")?;

    let id = sqlx::query(
        r#"
INSERT INTO restaurant
    (id, name, address, cuisine_type, lat, lng, operating_hours, photograph)
VALUES
    (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id)
    .bind(&name)
    .bind(address)
    .bind(cuisine_type)
    .bind(latlng.lat)
    .bind(latlng.lng)
    .bind(hours)
    .bind(photograph)
    .execute(db_conn)
    .await
    .with_context(|| format!("fail to add new restaurant {name}"))?
    .last_insert_rowid();

    Ok(id)
}

/// Insert every restaurant that is not stored yet, returns how many were added.
pub async fn import_restaurants(
    db_conn: &SqlitePool,
    restaurants: Vec<Restaurant>,
) -> anyhow::Result<usize> {
    let mut added = 0;
    for restaurant in restaurants {
        if get_restaurant(db_conn, restaurant.id).await?.is_some() {
            tracing::debug!("restaurant {} already stored, skip", restaurant.id);
            continue;
        }
        add_restaurant(db_conn, restaurant.try_into()?).await?;
        added += 1;
    }
    Ok(added)
}

#[derive(sqlx::FromRow)]
struct RestaurantRow {
    id: i64,
    name: String,
    address: String,
    cuisine_type: String,
    lat: f64,
    lng: f64,
    operating_hours: Option<String>,
    photograph: Option<String>,
}

impl TryFrom<RestaurantRow> for Restaurant {
    type Error = anyhow::Error;

    fn try_from(row: RestaurantRow) -> anyhow::Result<Self> {
        let operating_hours = row
            .operating_hours
            .as_deref()
            .map(serde_json::from_str::<OperatingHours>)
            .transpose()
            .with_context(|| format!("corrupted operating hours of restaurant {}", row.id))?;

        Ok(Restaurant {
            id: row.id,
            name: row.name,
            address: row.address,
            cuisine_type: row.cuisine_type,
            latlng: LatLng {
                lat: row.lat,
                lng: row.lng,
            },
            operating_hours,
            photograph: row.photograph,
        })
    }
}

pub async fn get_restaurant(
    db_conn: &SqlitePool,
    id: i64,
) -> anyhow::Result<Option<Restaurant>> {
    let row = sqlx::query_as::<_, RestaurantRow>(
        r#"
SELECT id, name, address, cuisine_type, lat, lng, operating_hours, photograph
FROM restaurant
WHERE id = ?"#,
    )
    .bind(id)
    .fetch_optional(db_conn)
    .await
    .with_context(|| format!("fail to get restaurant {id}"))?;

    row.map(Restaurant::try_from).transpose()
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    restaurant_id: i64,
    name: String,
    rating: i64,
    comments: String,
    created_at: i64,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: Some(row.id),
            restaurant_id: row.restaurant_id,
            name: row.name,
            rating: row.rating.clamp(0, u8::MAX as i64) as u8,
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

/// Reviews of a restaurant in insertion order.
pub async fn get_reviews(
    db_conn: &SqlitePool,
    restaurant_id: i64,
) -> anyhow::Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        r#"
SELECT id, restaurant_id, name, rating, comments, created_at
FROM review
WHERE restaurant_id = ?
ORDER BY id"#,
    )
    .bind(restaurant_id)
    .fetch_all(db_conn)
    .await
    .with_context(|| format!("fail to get reviews of restaurant {restaurant_id}"))?;

    Ok(rows.into_iter().map(Review::from).collect())
}

pub async fn add_review(db_conn: &SqlitePool, review: NewReview) -> anyhow::Result<Review> {
    let id = sqlx::query(
        r#"
INSERT INTO review
    (restaurant_id, name, rating, comments, created_at)
VALUES
    (?, ?, ?, ?, ?)"#,
    )
    .bind(review.restaurant_id)
    .bind(&review.name)
    .bind(review.rating as i64)
    .bind(&review.comments)
    .bind(review.created_at)
    .execute(db_conn)
    .await
    .with_context(|| format!("fail to add review from {}", review.name))?
    .last_insert_rowid();

    let mut stored = review.pending();
    stored.id = Some(id);
    Ok(stored)
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}
