use crate::data::Restaurant;
use crate::error::PageError;
use crate::gateway::DataGateway;
use crate::map::{init_map, MapConfig, MapHandle};
use crate::query::resolve_restaurant_id;
use crate::render::{
    fill_breadcrumb, fill_restaurant_html, fill_reviews_html, BreadcrumbView, RestaurantView,
    ReviewListView,
};

/// A restaurant page that went through the main fill.
#[derive(Debug)]
pub struct LoadedPage {
    pub restaurant: Restaurant,
    /// `None` when the map could not be created
    pub map: Option<MapHandle>,
}

/// Drives the rendering of one restaurant page.
pub struct PageBootstrap<'a, G> {
    gateway: &'a G,
    map_config: &'a MapConfig,
}

impl<'a, G: DataGateway> PageBootstrap<'a, G> {
    pub fn new(gateway: &'a G, map_config: &'a MapConfig) -> Self {
        Self {
            gateway,
            map_config,
        }
    }

    /// Render the page at `url` into `view`.
    ///
    /// Every failure is logged and only skips the steps depending on it, a
    /// `None` result means the view was left unrendered.
    pub async fn load<V>(&self, url: &str, view: &mut V) -> Option<LoadedPage>
    where
        V: RestaurantView + ReviewListView + BreadcrumbView,
    {
        let restaurant = match self.fetch_restaurant_from_url(url).await {
            Ok(restaurant) => restaurant,
            Err(e) => {
                tracing::error!("{e}");
                return None;
            }
        };

        let image = self.gateway.image_url_for_restaurant(&restaurant);
        fill_restaurant_html(view, &restaurant, image);

        let map = match self.init_map(&restaurant) {
            Ok(map) => {
                view.set_map(&map);
                Some(map)
            }
            Err(e) => {
                tracing::error!("restaurant {}: {e}", restaurant.id);
                None
            }
        };

        fill_breadcrumb(view, &restaurant);

        if let Err(e) = self.fill_reviews(restaurant.id, view).await {
            tracing::error!("{e}");
        }

        tracing::debug!("rendered restaurant {}", restaurant.id);
        Some(LoadedPage { restaurant, map })
    }

    async fn fetch_restaurant_from_url(&self, url: &str) -> Result<Restaurant, PageError> {
        let id = resolve_restaurant_id(url)?;
        match self.gateway.fetch_restaurant_by_id(id).await {
            Ok(Some(restaurant)) => Ok(restaurant),
            Ok(None) => Err(PageError::RestaurantNotFound(id)),
            Err(e) => Err(PageError::fetch_failed("restaurant", e)),
        }
    }

    fn init_map(&self, restaurant: &Restaurant) -> Result<MapHandle, PageError> {
        let mut map = init_map(restaurant, self.map_config)?;
        self.gateway.map_marker_for_restaurant(restaurant, &mut map);
        Ok(map)
    }

    async fn fill_reviews<V: ReviewListView>(
        &self,
        id: i64,
        view: &mut V,
    ) -> Result<(), PageError> {
        let reviews = self
            .gateway
            .fetch_reviews_by_restaurant_id(id)
            .await
            .map_err(|e| PageError::fetch_failed("reviews", e))?;
        fill_reviews_html(view, &reviews);
        Ok(())
    }
}
