use std::str::FromStr;

use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse};
use anyhow::Context;
use restaurant_info::{
    config::Config,
    data::Restaurant,
    db as db_api,
    error::PageError,
    gateway::SqliteGateway,
    map::MapConfig,
    page::PageBootstrap,
    query::resolve_restaurant_id,
    render::{HtmlPage, ReviewListFragment},
    review::{ReviewForm, ReviewSubmitter},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

pub(super) struct ApiState {
    gateway: SqliteGateway,
    submitter: ReviewSubmitter<SqliteGateway>,
    map: MapConfig,
}

impl ApiState {
    pub(super) fn with_gateway(gateway: SqliteGateway, map: MapConfig) -> Self {
        Self {
            submitter: ReviewSubmitter::new(gateway.clone()),
            gateway,
            map,
        }
    }

    pub(super) async fn new(config: &Config) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("invalid database url {}", config.database_url))?
            .create_if_missing(true);
        let db_pool = SqlitePool::connect_with(options)
            .await
            .context("fail to open database")?;
        let gateway = SqliteGateway::new(db_pool, &config.image_base_url);
        db_api::init_schema(gateway.pool()).await?;

        if let Some(path) = &config.seed_file {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("fail to read seed file {}", path.display()))?;
            let restaurants: Vec<Restaurant> =
                serde_json::from_str(&raw).context("fail to parse seed file")?;
            let added = db_api::import_restaurants(gateway.pool(), restaurants).await?;
            tracing::info!("imported {added} restaurants from {}", path.display());
        }

        Ok(Self::with_gateway(gateway, config.map.clone()))
    }
}

#[derive(serde::Serialize)]
struct ErrJsonResp {
    message: String,
}

fn error_response(err: PageError) -> HttpResponse {
    let body = ErrJsonResp {
        message: err.to_string(),
    };
    match err {
        PageError::MissingId | PageError::InvalidId(_) | PageError::InvalidReview(_) => {
            HttpResponse::BadRequest().json(body)
        }
        PageError::RestaurantNotFound(_) => HttpResponse::NotFound().json(body),
        PageError::FetchFailed { .. } | PageError::MapInit(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[actix_web::get("/healthz")]
pub(super) async fn healthz() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[actix_web::get("/restaurant.html")]
pub(super) async fn restaurant_page(data: web::Data<ApiState>, req: HttpRequest) -> HttpResponse {
    let url = req.uri().to_string();
    let mut page = HtmlPage::new();

    let bootstrap = PageBootstrap::new(&data.gateway, &data.map);
    if let Some(loaded) = bootstrap.load(&url, &mut page).await {
        page.set_restaurant_id(loaded.restaurant.id);
    }

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page.to_html())
}

/// Set by the page script when it posts the review form in place.
const REQUESTED_WITH_FETCH: (&str, &str) = ("X-Requested-With", "fetch");

fn posted_in_place(req: &HttpRequest) -> bool {
    req.headers()
        .get(REQUESTED_WITH_FETCH.0)
        .is_some_and(|value| value == REQUESTED_WITH_FETCH.1)
}

/// Answers the page script with the new `<li>`; a plain form post gets the
/// whole page back with the review appended to its list.
#[actix_web::post("/reviews")]
pub(super) async fn add_review(
    data: web::Data<ApiState>,
    req: HttpRequest,
    form: web::Form<ReviewForm>,
) -> HttpResponse {
    let url = req.uri().to_string();
    let id = match resolve_restaurant_id(&url) {
        Ok(id) => id,
        Err(err) => return error_response(err),
    };

    let body = if posted_in_place(&req) {
        let mut fragment = ReviewListFragment::default();
        match data.submitter.submit(id, form.into_inner(), &mut fragment) {
            Ok(_) => fragment.to_html(),
            Err(err) => return rejected(&data, id, err),
        }
    } else {
        let mut page = HtmlPage::new();
        let bootstrap = PageBootstrap::new(&data.gateway, &data.map);
        if bootstrap.load(&url, &mut page).await.is_none() {
            return error_response(PageError::RestaurantNotFound(id));
        }
        page.set_restaurant_id(id);
        match data.submitter.submit(id, form.into_inner(), &mut page) {
            Ok(_) => page.to_html(),
            Err(err) => return rejected(&data, id, err),
        }
    };

    tracing::debug!(
        "review for restaurant {id} accepted, submitter {:?}",
        data.submitter.state()
    );
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

fn rejected(data: &ApiState, id: i64, err: PageError) -> HttpResponse {
    tracing::warn!(
        "rejected review for restaurant {id} (submitter {:?}): {err}",
        data.submitter.state()
    );
    error_response(err)
}
