use std::sync::Arc;

use actix_web::{
    http::{header::HeaderMap, StatusCode},
    middleware::NormalizePath,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use orderflow_engine::{MetricsApi, OrderFlowApi, OrderManagement, OrderQueue};
use serde_json::Value;

use crate::routes::configure_order_routes;

/// The app data and routes the server would set up, around the given store and queue.
pub fn configure<B>(db: Arc<B>, queue: OrderQueue<B>) -> impl FnOnce(&mut ServiceConfig)
where B: OrderManagement + 'static
{
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(Arc::clone(&db), queue)))
            .app_data(web::Data::new(MetricsApi::new(db)));
        configure_order_routes::<B>(cfg);
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {}", self.body))
    }
}

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(path: &str, body: &str, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    let req = TestRequest::post()
        .uri(path)
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_string());
    call(req, configure).await
}

async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    let app = App::new().wrap(NormalizePath::trim()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    TestResponse { status, headers, body }
}
