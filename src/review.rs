use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::data::{NewReview, Review};
use crate::error::PageError;
use crate::gateway::DataGateway;
use crate::render::{create_review_item, ReviewListView};

/// Fields of the review form.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewForm {
    pub name: String,
    pub rating: String,
    pub text: String,
}

impl ReviewForm {
    /// Build the pending review, stamped with the current time.
    pub fn into_review(self, restaurant_id: i64) -> Result<NewReview, PageError> {
        let rating: u8 = self.rating.trim().parse().map_err(|_| {
            PageError::InvalidReview(format!("rating {:?} is not a number", self.rating))
        })?;
        if !(1..=5).contains(&rating) {
            return Err(PageError::InvalidReview(format!(
                "rating {rating} is not between 1 and 5"
            )));
        }

        Ok(NewReview {
            restaurant_id,
            name: self.name,
            rating,
            comments: self.text,
            created_at: Utc::now().timestamp_millis(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
}

/// Shows submitted reviews right away and persists them in the background.
///
/// Nothing is rolled back when persisting fails, and the shown entry never
/// learns the id the gateway assigned.
#[derive(Clone)]
pub struct ReviewSubmitter<G> {
    gateway: G,
    in_flight: Arc<AtomicUsize>,
}

impl<G> ReviewSubmitter<G>
where
    G: DataGateway + Clone + Send + Sync + 'static,
{
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> SubmissionState {
        if self.in_flight.load(Ordering::SeqCst) == 0 {
            SubmissionState::Idle
        } else {
            SubmissionState::Submitting
        }
    }

    /// Append the review to `view` and spawn its persistence.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit<V: ReviewListView>(
        &self,
        restaurant_id: i64,
        form: ReviewForm,
        view: &mut V,
    ) -> Result<JoinHandle<Option<Review>>, PageError> {
        let review = form.into_review(restaurant_id)?;
        view.append_review(create_review_item(&review.pending()));

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let gateway = self.gateway.clone();
        let in_flight = self.in_flight.clone();
        Ok(tokio::spawn(async move {
            let result = gateway.publish_review(restaurant_id, review).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            match result {
                Ok(stored) => {
                    tracing::info!("update done");
                    Some(stored)
                }
                Err(e) => {
                    tracing::error!("fail to publish review of restaurant {restaurant_id}: {e:#}");
                    None
                }
            }
        }))
    }
}
