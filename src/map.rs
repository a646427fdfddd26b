//! Map widget state handed to the client side map library.

use serde::Serialize;

use crate::data::{LatLng, Restaurant};
use crate::error::PageError;

pub const DEFAULT_TILE_URL: &str =
    "https://api.tiles.mapbox.com/v4/{id}/{z}/{x}/{y}.jpg70?access_token={mapboxToken}";

pub const DEFAULT_ATTRIBUTION: &str = concat!(
    r#"Map data &copy; <a href="https://www.openstreetmap.org/">OpenStreetMap</a> contributors, "#,
    r#"<a href="https://creativecommons.org/licenses/by-sa/2.0/">CC-BY-SA</a>, "#,
    r#"Imagery © <a href="https://www.mapbox.com/">Mapbox</a>"#,
);

/// Static tile provider settings.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub tile_url: String,
    pub access_token: String,
    pub tile_id: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            access_token: String::new(),
            tile_id: "mapbox.streets".to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            max_zoom: 18,
            zoom: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayer {
    pub url_template: String,
    pub id: String,
    pub mapbox_token: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl TileLayer {
    /// Tile URL with the `{id}` and `{mapboxToken}` placeholders filled in,
    /// leaving `{z}`, `{x}` and `{y}` to the widget.
    pub fn resolved_url(&self) -> String {
        self.url_template
            .replace("{id}", &self.id)
            .replace("{mapboxToken}", &self.mapbox_token)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub title: String,
    pub alt: String,
    pub url: String,
}

/// The map of one page: created once per render and owned by the loaded page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapHandle {
    pub center: LatLng,
    pub zoom: u8,
    pub scroll_wheel_zoom: bool,
    pub tile_layer: TileLayer,
    pub markers: Vec<Marker>,
}

impl MapHandle {
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
}

/// Create the map centered on the restaurant.
pub fn init_map(restaurant: &Restaurant, config: &MapConfig) -> Result<MapHandle, PageError> {
    let LatLng { lat, lng } = restaurant.latlng;
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(PageError::MapInit(format!("latitude {lat} is out of range")));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(PageError::MapInit(format!("longitude {lng} is out of range")));
    }
    if config.zoom > config.max_zoom {
        return Err(PageError::MapInit(format!(
            "zoom {} exceeds max zoom {}",
            config.zoom, config.max_zoom
        )));
    }

    Ok(MapHandle {
        center: restaurant.latlng,
        zoom: config.zoom,
        scroll_wheel_zoom: false,
        tile_layer: TileLayer {
            url_template: config.tile_url.clone(),
            id: config.tile_id.clone(),
            mapbox_token: config.access_token.clone(),
            max_zoom: config.max_zoom,
            attribution: config.attribution.clone(),
        },
        markers: Vec::new(),
    })
}
