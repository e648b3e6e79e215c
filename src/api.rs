use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, get, post, web};
use chrono::NaiveDate;
use log::error;
use serde::Deserialize;

use crate::ingest::Ingestor;
use crate::query::RateQueryService;
use crate::store::DEFAULT_RECENT_LIMIT;

pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub query: RateQueryService,
}

/// Storage failures surface as a bare 500; details only go to the log.
#[derive(Debug)]
pub struct ApiError;

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Internal server error")
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Request failed: {err:#}");
        ApiError
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerParams {
    sort_by: Option<String>,
}

/// `date` once, `currencies` either comma separated, repeated, or both.
#[derive(Debug, PartialEq)]
struct SearchParams {
    date: NaiveDate,
    currencies: Vec<String>,
}

impl SearchParams {
    fn from_query(query: &str) -> Result<Self, String> {
        let pairs = web::Query::<Vec<(String, String)>>::from_query(query)
            .map_err(|err| err.to_string())?
            .into_inner();

        let mut date = None;
        let mut currencies = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "date" => {
                    let parsed = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                        .map_err(|_| format!("Invalid date {value:?}, expected YYYY-MM-DD"))?;
                    date = Some(parsed);
                }
                "currencies" => currencies.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|code| !code.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }

        let date = date.ok_or("Missing date parameter")?;
        if currencies.is_empty() {
            return Err("Missing currencies parameter".to_string());
        }
        Ok(Self { date, currencies })
    }
}

#[derive(Debug, Deserialize)]
struct LatestParams {
    code: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    amount: f64,
    to: String,
}

#[post("/start-parsing")]
async fn start_parsing(state: web::Data<AppState>) -> HttpResponse {
    state.ingestor.trigger().await;
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Rates parsing started in the worker pool. Check the logs for results.")
}

#[get("/answer")]
async fn answer(
    state: web::Data<AppState>,
    params: web::Query<AnswerParams>,
) -> Result<HttpResponse, ApiError> {
    let sort_by = params.sort_by.as_deref().unwrap_or("date");
    let rates = state.query.list_sorted(sort_by).await?;
    Ok(HttpResponse::Ok().json(rates))
}

#[get("/answer/search")]
async fn search(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let params = match SearchParams::from_query(req.query_string()) {
        Ok(params) => params,
        Err(reason) => {
            return Ok(HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(reason));
        }
    };
    let rates = state
        .query
        .find_by_date_and_codes(params.date, &params.currencies)
        .await?;
    Ok(HttpResponse::Ok().json(rates))
}

#[get("/answer/latest")]
async fn latest(
    state: web::Data<AppState>,
    params: web::Query<LatestParams>,
) -> Result<HttpResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let rates = state.query.most_recent(&params.code, limit).await?;
    Ok(HttpResponse::Ok().json(rates))
}

#[get("/answer/dates")]
async fn dates(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let stored_dates = state.query.available_dates().await?;
    Ok(HttpResponse::Ok().json(stored_dates))
}

#[get("/convert")]
async fn convert(
    state: web::Data<AppState>,
    params: web::Query<ConvertParams>,
) -> Result<HttpResponse, ApiError> {
    let conversion = state.query.convert(params.amount, &params.to).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(conversion.to_string()))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(start_parsing)
        .service(answer)
        .service(search)
        .service(latest)
        .service(dates)
        .service(convert);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency_rate::{CurrencyRate, NewCurrencyRate};
    use crate::error::FetchError;
    use crate::feed_client::FeedSource;
    use crate::store::{MemoryRateStore, RateStore};
    use crate::worker_pool::WorkerPool;
    use actix_web::{App, test};
    use async_trait::async_trait;

    struct FailingFeed;

    #[async_trait]
    impl FeedSource for FailingFeed {
        async fn fetch(&self) -> Result<String, FetchError> {
            Err(FetchError::Transport {
                status: Some(500),
                reason: "Internal Server Error".to_string(),
            })
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RateStore for BrokenStore {
        async fn insert(&self, _rate: NewCurrencyRate) -> anyhow::Result<CurrencyRate> {
            anyhow::bail!("connection refused")
        }
        async fn find_all(&self) -> anyhow::Result<Vec<CurrencyRate>> {
            anyhow::bail!("connection refused")
        }
        async fn find_by_date_and_codes(
            &self,
            _date: NaiveDate,
            _codes: &[String],
        ) -> anyhow::Result<Vec<CurrencyRate>> {
            anyhow::bail!("connection refused")
        }
        async fn find_most_recent_by_code(
            &self,
            _code: &str,
            _limit: usize,
        ) -> anyhow::Result<Vec<CurrencyRate>> {
            anyhow::bail!("connection refused")
        }
    }

    fn state(store: Arc<dyn RateStore>) -> web::Data<AppState> {
        let ingestor = Ingestor::new(
            Arc::new(FailingFeed),
            Arc::clone(&store),
            WorkerPool::new(1, 1),
        );
        web::Data::new(AppState {
            ingestor: Arc::new(ingestor),
            query: RateQueryService::new(store, "RUB"),
        })
    }

    async fn seeded_store() -> Arc<dyn RateStore> {
        let store = MemoryRateStore::new();
        for (code, rate, day) in [("USD", 90.5, 1), ("EUR", 100.52, 1), ("USD", 91.0, 2)] {
            store
                .insert(NewCurrencyRate {
                    char_code: code.to_string(),
                    name: format!("{code} name"),
                    rate,
                    date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[actix_web::test]
    async fn start_parsing_succeeds_even_when_the_feed_fails() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(MemoryRateStore::new())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/start-parsing").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn answer_returns_sorted_json() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get().uri("/answer?sortBy=RATE").to_request();
        let rates: Vec<CurrencyRate> = test::call_and_read_body_json(&app, req).await;
        let values: Vec<_> = rates.iter().map(|r| r.rate).collect();
        assert_eq!(values, vec![100.52, 91.0, 90.5]);

        let req = test::TestRequest::get().uri("/answer").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(r#""charCode":"USD""#));
        assert!(body.contains(r#""date":"2024-06-02""#));
    }

    #[actix_web::test]
    async fn search_filters_by_date_and_codes() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get()
            .uri("/answer/search?date=2024-06-01&currencies=USD,EUR,CNY")
            .to_request();
        let rates: Vec<CurrencyRate> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rates.len(), 2);
        assert!(rates.iter().all(|r| r.date == NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[actix_web::test]
    async fn search_params_accept_comma_list_and_repeated_keys() {
        let params =
            SearchParams::from_query("date=2024-06-01&currencies=USD,EUR&currencies=CNY").unwrap();
        assert_eq!(
            params,
            SearchParams {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                currencies: vec!["USD".to_string(), "EUR".to_string(), "CNY".to_string()],
            }
        );

        assert!(SearchParams::from_query("currencies=USD").is_err());
        assert!(SearchParams::from_query("date=2024-06-01").is_err());
        assert!(SearchParams::from_query("date=2024-13-01&currencies=USD").is_err());
    }

    #[actix_web::test]
    async fn search_accepts_repeated_currencies() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get()
            .uri("/answer/search?date=2024-06-01&currencies=USD&currencies=EUR")
            .to_request();
        let rates: Vec<CurrencyRate> = test::call_and_read_body_json(&app, req).await;
        let mut codes: Vec<_> = rates.iter().map(|r| r.char_code.as_str()).collect();
        codes.sort();
        assert_eq!(codes, vec!["EUR", "USD"]);
    }

    #[actix_web::test]
    async fn search_rejects_bad_date() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get()
            .uri("/answer/search?date=01.06.2024&currencies=USD")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn latest_and_dates() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get().uri("/answer/latest?code=USD&limit=1").to_request();
        let rates: Vec<CurrencyRate> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, 91.0);

        let req = test::TestRequest::get().uri("/answer/dates").to_request();
        let stored_dates: Vec<NaiveDate> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            stored_dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
            ]
        );
    }

    #[actix_web::test]
    async fn convert_returns_text() {
        let app =
            test::init_service(App::new().app_data(state(seeded_store().await)).configure(configure))
                .await;

        let req = test::TestRequest::get().uri("/convert?amount=182&to=USD").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "182.00 RUB = 2.00 USD (rate: 1 USD = 91.0000 RUB)");

        let req = test::TestRequest::get().uri("/convert?amount=10&to=XYZ").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(body, "Rate for currency XYZ not found");
    }

    #[actix_web::test]
    async fn storage_failure_is_a_plain_500() {
        let app = test::init_service(
            App::new().app_data(state(Arc::new(BrokenStore))).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/answer").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = test::read_body(resp).await;
        assert_eq!(body, "Internal server error");
    }
}
