//! Rendering of the restaurant page.
//!
//! The fill functions only talk to the view traits, [`HtmlPage`] turns those
//! calls into the HTML document served to the browser.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::data::{ImageSource, OperatingHours, Restaurant, Review};
use crate::map::MapHandle;

pub const IMAGE_SIZES: &str = "(min-width: 840px) 800px, calc(100vw - 40px)";
pub const REVIEWS_TITLE: &str = "Reviews";
pub const NO_REVIEWS: &str = "No reviews yet!";

pub const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
pub const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Paints the map from `data-map` and posts the review form in place,
/// appending the returned item to `#reviews-list`.
const PAGE_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', () => {
  const mapElement = document.getElementById('map');
  if (window.L && mapElement.dataset.map) {
    const state = JSON.parse(mapElement.dataset.map);
    const map = L.map(mapElement, {
      center: [state.center.lat, state.center.lng],
      zoom: state.zoom,
      scrollWheelZoom: state.scrollWheelZoom
    });
    const tiles = state.tileLayer;
    L.tileLayer(tiles.urlTemplate, {
      id: tiles.id,
      mapboxToken: tiles.mapboxToken,
      maxZoom: tiles.maxZoom,
      attribution: tiles.attribution
    }).addTo(map);
    state.markers.forEach((marker) => {
      L.marker([marker.position.lat, marker.position.lng], {title: marker.title, alt: marker.alt})
        .addTo(map)
        .on('click', () => { window.location.href = marker.url; });
    });
  }

  const form = document.getElementById('review-form');
  form.addEventListener('submit', (event) => {
    event.preventDefault();
    fetch(form.action, {
      method: 'POST',
      headers: {'X-Requested-With': 'fetch'},
      body: new URLSearchParams(new FormData(form))
    })
      .then((resp) => resp.ok ? resp.text() : Promise.reject(new Error(resp.statusText)))
      .then((item) => {
        document.getElementById('reviews-list').insertAdjacentHTML('beforeend', item);
        form.reset();
      })
      .catch((err) => console.error(err));
  });
});
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantImage {
    pub src: String,
    pub srcset: String,
    pub sizes: &'static str,
    pub alt: String,
}

/// One review as shown in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub name: String,
    pub date: String,
    pub rating: String,
    pub comments: String,
}

pub trait RestaurantView {
    fn set_name(&mut self, name: &str);
    fn set_address(&mut self, address: &str);
    fn set_cuisine(&mut self, cuisine: &str);
    fn set_image(&mut self, image: RestaurantImage);
    fn append_hours_row(&mut self, day: &str, hours: &str);
    fn set_map(&mut self, map: &MapHandle);
}

pub trait ReviewListView {
    fn append_reviews_title(&mut self, title: &str);
    fn show_no_reviews(&mut self, placeholder: &str);
    fn append_review(&mut self, review: ReviewItem);
}

pub trait BreadcrumbView {
    fn append_breadcrumb(&mut self, name: &str);
}

/// Fill name, address, image, cuisine and operating hours.
pub fn fill_restaurant_html<V: RestaurantView>(
    view: &mut V,
    restaurant: &Restaurant,
    image: ImageSource,
) {
    view.set_name(&restaurant.name);
    view.set_address(&restaurant.address);
    view.set_image(RestaurantImage {
        src: image.src,
        srcset: image.srcset,
        sizes: IMAGE_SIZES,
        alt: restaurant.name.clone(),
    });
    view.set_cuisine(&restaurant.cuisine_type);

    if let Some(hours) = &restaurant.operating_hours {
        fill_restaurant_hours_html(view, hours);
    }
}

/// One row per day, in the order of the mapping.
pub fn fill_restaurant_hours_html<V: RestaurantView>(view: &mut V, hours: &OperatingHours) {
    for (day, time) in hours {
        view.append_hours_row(day, time);
    }
}

pub fn fill_reviews_html<V: ReviewListView>(view: &mut V, reviews: &[Review]) {
    view.append_reviews_title(REVIEWS_TITLE);

    if reviews.is_empty() {
        view.show_no_reviews(NO_REVIEWS);
        return;
    }
    for review in reviews {
        view.append_review(create_review_item(review));
    }
}

pub fn create_review_item(review: &Review) -> ReviewItem {
    ReviewItem {
        name: review.name.clone(),
        date: format_review_date(review.created_at),
        rating: format!("Rating: {}", review.rating),
        comments: review.comments.clone(),
    }
}

/// Format a millisecond timestamp like `9/30/2017, 12:19:27 PM` (UTC).
pub fn format_review_date(created_at: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(created_at) {
        Some(date) => date.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Add the restaurant name to the breadcrumb, once per call.
pub fn fill_breadcrumb<V: BreadcrumbView>(view: &mut V, restaurant: &Restaurant) {
    view.append_breadcrumb(&restaurant.name);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    /// trusted markup written out as is
    Raw(&'static str),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn raw(mut self, markup: &'static str) -> Self {
        self.children.push(Node::Raw(markup));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn set_attr(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    pub fn tag(&self) -> &str {
        self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) | Node::Raw(_) => None,
        })
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Raw(_) => {}
                Node::Element(e) => out.push_str(&e.text_content()),
            }
        }
        out
    }

    fn is_void(&self) -> bool {
        matches!(self.tag, "img" | "input" | "meta" | "link" | "br")
    }

    pub fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {name}=\"{}\"", escape_html(value));
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(&escape_html(text)),
                Node::Raw(markup) => out.push_str(markup),
                Node::Element(e) => e.write_html(out),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Build the `<li>` of one review.
pub fn review_element(review: ReviewItem) -> Element {
    Element::new("li")
        .class("comment-container")
        .child(Element::new("p").class("comment-reviewer").text(review.name))
        .child(Element::new("p").class("comment-date").text(review.date))
        .child(Element::new("p").class("comment-rating").text(review.rating))
        .child(Element::new("p").class("comment-comments").text(review.comments))
}

/// The restaurant page with the elements the scripts fill in.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub breadcrumb: Element,
    pub name: Element,
    pub address: Element,
    pub image: Element,
    pub cuisine: Element,
    pub hours: Element,
    pub reviews_container: Element,
    pub reviews_list: Element,
    pub map: Element,
    form_action: String,
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlPage {
    pub fn new() -> Self {
        Self {
            breadcrumb: Element::new("ul")
                .id("breadcrumb")
                .child(Element::new("li").child(Element::new("a").attr("href", "/").text("Home"))),
            name: Element::new("h1").id("restaurant-name"),
            address: Element::new("p").id("restaurant-address"),
            image: Element::new("img").id("restaurant-img"),
            cuisine: Element::new("p").id("restaurant-cuisine"),
            hours: Element::new("table").id("restaurant-hours"),
            reviews_container: Element::new("section").id("reviews-container"),
            reviews_list: Element::new("ul").id("reviews-list"),
            map: Element::new("div").id("map").attr("role", "application"),
            form_action: "reviews".to_string(),
        }
    }

    /// Post the review form for the given restaurant.
    pub fn set_restaurant_id(&mut self, id: i64) {
        self.form_action = format!("reviews?id={id}");
    }

    fn review_form(&self) -> Element {
        let mut rating = Element::new("select").attr("name", "rating").id("review-rating");
        for value in 1..=5 {
            rating.push(
                Element::new("option")
                    .attr("value", value.to_string())
                    .text(value.to_string()),
            );
        }

        Element::new("form")
            .id("review-form")
            .attr("method", "post")
            .attr("action", self.form_action.clone())
            .child(Element::new("label").attr("for", "review-name").text("Name"))
            .child(
                Element::new("input")
                    .id("review-name")
                    .attr("name", "name")
                    .attr("type", "text")
                    .attr("required", "required"),
            )
            .child(Element::new("label").attr("for", "review-rating").text("Rating"))
            .child(rating)
            .child(Element::new("label").attr("for", "review-text").text("Comments"))
            .child(Element::new("textarea").id("review-text").attr("name", "text"))
            .child(Element::new("button").attr("type", "submit").text("Add review"))
    }

    pub fn to_html(&self) -> String {
        let mut reviews = self.reviews_container.clone();
        reviews.push(self.reviews_list.clone());
        reviews.push(self.review_form());

        let restaurant = Element::new("section")
            .id("restaurant-container")
            .child(self.name.clone())
            .child(self.image.clone())
            .child(self.cuisine.clone())
            .child(self.address.clone())
            .child(self.hours.clone());

        let body = Element::new("body")
            .child(Element::new("nav").child(self.breadcrumb.clone()))
            .child(
                Element::new("main")
                    .id("maincontent")
                    .child(Element::new("section").id("map-container").child(self.map.clone()))
                    .child(restaurant)
                    .child(reviews),
            )
            .child(Element::new("script").attr("src", LEAFLET_JS))
            .child(Element::new("script").raw(PAGE_SCRIPT));

        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(
                Element::new("meta")
                    .attr("name", "viewport")
                    .attr("content", "width=device-width, initial-scale=1.0"),
            )
            .child(Element::new("link").attr("rel", "stylesheet").attr("href", LEAFLET_CSS))
            .child(Element::new("title").text("Restaurant Info"));

        let html = Element::new("html").attr("lang", "en").child(head).child(body);
        format!("<!DOCTYPE html>{}", html.to_html())
    }
}

impl RestaurantView for HtmlPage {
    fn set_name(&mut self, name: &str) {
        self.name.set_text(name);
    }

    fn set_address(&mut self, address: &str) {
        self.address.set_text(address);
    }

    fn set_cuisine(&mut self, cuisine: &str) {
        self.cuisine.set_text(cuisine);
    }

    fn set_image(&mut self, image: RestaurantImage) {
        self.image.set_attr("class", "restaurant-img");
        self.image.set_attr("src", image.src);
        self.image.set_attr("srcset", image.srcset);
        self.image.set_attr("sizes", image.sizes);
        self.image.set_attr("alt", image.alt);
    }

    fn append_hours_row(&mut self, day: &str, hours: &str) {
        self.hours.push(
            Element::new("tr")
                .child(Element::new("td").text(day))
                .child(Element::new("td").text(hours)),
        );
    }

    fn set_map(&mut self, map: &MapHandle) {
        match serde_json::to_string(map) {
            Ok(json) => self.map.set_attr("data-map", json),
            Err(e) => tracing::error!("fail to encode map: {e}"),
        }
    }
}

impl ReviewListView for HtmlPage {
    fn append_reviews_title(&mut self, title: &str) {
        self.reviews_container
            .push(Element::new("h2").class("comments-title").text(title));
    }

    fn show_no_reviews(&mut self, placeholder: &str) {
        self.reviews_container.push(Element::new("p").text(placeholder));
    }

    fn append_review(&mut self, review: ReviewItem) {
        self.reviews_list.push(review_element(review));
    }
}

impl BreadcrumbView for HtmlPage {
    fn append_breadcrumb(&mut self, name: &str) {
        self.breadcrumb.push(Element::new("li").text(name));
    }
}

/// Review items rendered outside a full page, e.g. in answer to a form post.
#[derive(Debug, Clone, Default)]
pub struct ReviewListFragment {
    pub items: Vec<Element>,
}

impl ReviewListFragment {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            item.write_html(&mut out);
        }
        out
    }
}

impl ReviewListView for ReviewListFragment {
    fn append_reviews_title(&mut self, title: &str) {
        self.items
            .push(Element::new("h2").class("comments-title").text(title));
    }

    fn show_no_reviews(&mut self, placeholder: &str) {
        self.items.push(Element::new("p").text(placeholder));
    }

    fn append_review(&mut self, review: ReviewItem) {
        self.items.push(review_element(review));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LatLng;

    fn restaurant() -> Restaurant {
        let mut hours = OperatingHours::new();
        hours.insert("Monday".into(), "9:00-17:00".into());
        Restaurant {
            id: 2,
            name: "Emily".into(),
            address: "919 Fulton St, Brooklyn, NY 11238".into(),
            cuisine_type: "Pizza".into(),
            latlng: LatLng {
                lat: 40.683555,
                lng: -73.966393,
            },
            operating_hours: Some(hours),
            photograph: None,
        }
    }

    fn image() -> ImageSource {
        ImageSource {
            src: "/img/2-800.jpg".into(),
            srcset: "/img/2-400.jpg 400w, /img/2-800.jpg 800w".into(),
        }
    }

    fn review(name: &str, rating: u8) -> Review {
        Review {
            id: Some(1),
            restaurant_id: 2,
            name: name.into(),
            rating,
            comments: format!("{name} liked it"),
            created_at: 1_504_095_567_183,
        }
    }

    #[test]
    fn one_row_per_day() {
        let mut page = HtmlPage::new();
        fill_restaurant_html(&mut page, &restaurant(), image());

        let rows: Vec<_> = page.hours.children().collect();
        assert_eq!(rows.len(), 1);
        let cells: Vec<_> = rows[0].children().map(Element::text_content).collect();
        assert_eq!(cells, ["Monday", "9:00-17:00"]);
    }

    #[test]
    fn fills_summary_and_image() {
        let mut page = HtmlPage::new();
        fill_restaurant_html(&mut page, &restaurant(), image());

        assert_eq!(page.name.text_content(), "Emily");
        assert_eq!(page.cuisine.text_content(), "Pizza");
        assert_eq!(page.address.text_content(), "919 Fulton St, Brooklyn, NY 11238");
        assert_eq!(page.image.get_attr("src"), Some("/img/2-800.jpg"));
        assert_eq!(page.image.get_attr("sizes"), Some(IMAGE_SIZES));
        assert_eq!(page.image.get_attr("alt"), Some("Emily"));
        assert_eq!(page.image.get_attr("class"), Some("restaurant-img"));
    }

    #[test]
    fn missing_hours_leave_table_empty() {
        let mut page = HtmlPage::new();
        let restaurant = Restaurant {
            operating_hours: None,
            ..restaurant()
        };
        fill_restaurant_html(&mut page, &restaurant, image());
        assert_eq!(page.hours.children().count(), 0);
    }

    #[test]
    fn no_reviews_placeholder() {
        let mut page = HtmlPage::new();
        fill_reviews_html(&mut page, &[]);

        let texts: Vec<_> = page
            .reviews_container
            .children()
            .map(Element::text_content)
            .collect();
        assert_eq!(texts, [REVIEWS_TITLE, NO_REVIEWS]);
        assert_eq!(page.reviews_list.children().count(), 0);
    }

    #[test]
    fn reviews_in_gateway_order() {
        let mut page = HtmlPage::new();
        let reviews = [review("Steve", 4), review("Morgan", 5), review("Jason", 3)];
        fill_reviews_html(&mut page, &reviews);

        let items: Vec<_> = page.reviews_list.children().collect();
        assert_eq!(items.len(), 3);
        let first: Vec<_> = items[0].children().map(Element::text_content).collect();
        assert_eq!(
            first,
            ["Steve", "8/30/2017, 12:19:27 PM", "Rating: 4", "Steve liked it"]
        );
        let names: Vec<_> = items
            .iter()
            .map(|li| li.children().next().unwrap().text_content())
            .collect();
        assert_eq!(names, ["Steve", "Morgan", "Jason"]);
        // the placeholder is only shown for an empty list
        assert_eq!(page.reviews_container.children().count(), 1);
    }

    #[test]
    fn breadcrumb_appends_every_call() {
        let mut page = HtmlPage::new();
        fill_breadcrumb(&mut page, &restaurant());
        assert_eq!(page.breadcrumb.children().count(), 2);
        assert_eq!(
            page.breadcrumb.children().last().unwrap().text_content(),
            "Emily"
        );

        fill_breadcrumb(&mut page, &restaurant());
        assert_eq!(page.breadcrumb.children().count(), 3);
    }

    #[test]
    fn dates() {
        assert_eq!(format_review_date(0), "1/1/1970, 12:00:00 AM");
        assert_eq!(format_review_date(1_504_095_567_183), "8/30/2017, 12:19:27 PM");
        assert_eq!(format_review_date(i64::MAX), "Invalid Date");
    }

    #[test]
    fn text_is_escaped() {
        let mut page = HtmlPage::new();
        page.set_name("<script>alert(1)</script> & co");
        let html = page.to_html();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn document_has_form_fields() {
        let mut page = HtmlPage::new();
        page.set_restaurant_id(2);
        let html = page.to_html();
        assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\">"));
        assert!(html.contains(r#"<form id="review-form" method="post" action="reviews?id=2">"#));
        for field in [r#"name="name""#, r#"name="rating""#, r#"name="text""#] {
            assert!(html.contains(field), "missing {field}");
        }
        assert!(html.contains(r#"<img id="restaurant-img">"#));
    }

    #[test]
    fn document_paints_map_and_posts_in_place() {
        let html = HtmlPage::new().to_html();
        assert!(html.contains(&format!(r#"<link rel="stylesheet" href="{LEAFLET_CSS}">"#)));
        assert!(html.contains(&format!(r#"<script src="{LEAFLET_JS}"></script>"#)));
        // the inline script is written unescaped
        assert!(html.contains("JSON.parse(mapElement.dataset.map)"));
        assert!(html.contains("scrollWheelZoom: state.scrollWheelZoom"));
        assert!(html.contains("event.preventDefault();"));
        assert!(html.contains(
            "getElementById('reviews-list').insertAdjacentHTML('beforeend', item)"
        ));
    }

    #[test]
    fn fragment_renders_list_items() {
        let mut fragment = ReviewListFragment::default();
        fragment.append_review(create_review_item(&review("Steve", 4)));
        assert_eq!(
            fragment.to_html(),
            concat!(
                r#"<li class="comment-container">"#,
                r#"<p class="comment-reviewer">Steve</p>"#,
                r#"<p class="comment-date">8/30/2017, 12:19:27 PM</p>"#,
                r#"<p class="comment-rating">Rating: 4</p>"#,
                r#"<p class="comment-comments">Steve liked it</p>"#,
                "</li>"
            )
        );
    }
}
