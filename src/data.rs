use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Day name to opening hours, kept in the order the gateway delivered them.
pub type OperatingHours = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub latlng: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<OperatingHours>,
    /// file stem of the photo, without size suffix and extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photograph: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// assigned by the gateway, absent until the review is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
    /// milliseconds since the unix epoch
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// A review built from the submission form, not persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl NewReview {
    /// The review as it is shown before the gateway assigns an id.
    pub fn pending(&self) -> Review {
        Review {
            id: None,
            restaurant_id: self.restaurant_id,
            name: self.name.clone(),
            rating: self.rating,
            comments: self.comments.clone(),
            created_at: self.created_at,
        }
    }
}

/// `src` and `srcset` of a restaurant photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub src: String,
    pub srcset: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restaurant_keeps_hours_order() {
        let json = r#"{
            "id": 1,
            "name": "Mission Chinese Food",
            "address": "171 E Broadway, New York, NY 10002",
            "cuisine_type": "Asian",
            "latlng": { "lat": 40.713829, "lng": -73.989667 },
            "operating_hours": {
                "Sunday": "5:30 pm - 11:00 pm",
                "Monday": "5:30 pm - 11:00 pm",
                "Tuesday": "5:30 pm - 12:00 am"
            },
            "photograph": "1"
        }"#;
        let restaurant: Restaurant = serde_json::from_str(json).unwrap();
        let days: Vec<_> = restaurant
            .operating_hours
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(days, ["Sunday", "Monday", "Tuesday"]);
    }

    #[test]
    fn review_uses_camel_case_timestamp() {
        let json = r#"{"restaurant_id": 3, "name": "Steve", "rating": 4,
            "comments": "Good", "createdAt": 1504095567183}"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.id, None);
        assert_eq!(review.created_at, 1504095567183);

        let out = serde_json::to_value(&review).unwrap();
        assert!(out.get("id").is_none());
        assert_eq!(out["createdAt"], 1504095567183i64);
    }
}
