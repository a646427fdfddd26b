use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("No restaurant id in URL")]
    MissingId,

    #[error("restaurant id {0:?} is not a number")]
    InvalidId(String),

    #[error("restaurant {0} not found")]
    RestaurantNotFound(i64),

    #[error("fail to fetch {what}: {reason}")]
    FetchFailed { what: &'static str, reason: String },

    #[error("fail to initialize map: {0}")]
    MapInit(String),

    #[error("invalid review: {0}")]
    InvalidReview(String),
}

impl PageError {
    pub(crate) fn fetch_failed(what: &'static str, err: anyhow::Error) -> Self {
        Self::FetchFailed {
            what,
            reason: format!("{err:#}"),
        }
    }
}
