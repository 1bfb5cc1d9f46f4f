//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every store call is async for this reason, and the order processor
//! runs on its own task rather than inside a handler.
//!
//! Order matters when registering the order routes: `/orders/metrics` must be registered before
//! `/orders/{order_id}`, otherwise "metrics" is treated as an order id. Use [`configure_order_routes`].
use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    get,
    web,
    web::ServiceConfig,
    HttpRequest,
    HttpResponse,
    Responder,
};
use log::*;
use orderflow_engine::{
    db_types::OrderId,
    order_objects::OrderQueryFilter,
    MetricsApi,
    OrderFlowApi,
    OrderManagement,
};

use crate::{data_objects::NewOrderRequest, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Registers the order and queue routes, along with the body and query parsers that turn malformed input into
/// JSON error responses.
///
/// The caller is responsible for supplying `OrderFlowApi<B>` and `MetricsApi<B>` as app data.
pub fn configure_order_routes<B>(cfg: &mut ServiceConfig)
where B: OrderManagement + 'static
{
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(CreateOrderRoute::<B>::new())
        .service(ListOrdersRoute::<B>::new())
        .service(OrderMetricsRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(QueueStatusRoute::<B>::new());
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Rejecting request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        debug!("💻️ Rejecting query string. {err}");
        ServerError::InvalidQuery(err.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
/// Route handler for submitting a new order.
///
/// The order is stored as `PENDING` and queued for processing. The stored order is returned with `201 Created`; poll
/// `/orders/{order_id}` to follow its progress.
pub async fn create_order<B: OrderManagement>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner().into_new_order().map_err(|e| {
        debug!("💻️ Order rejected. {e}");
        ServerError::ValidationError(e)
    })?;
    trace!("💻️ POST new order {}", order.order_id);
    let order = api.create_order(order).await.map_err(|e| {
        debug!("💻️ Could not create order. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(list_orders => Get "/orders" impl OrderManagement);
/// Route handler for listing orders, oldest first. Accepts optional `status` and `user_id` filters.
pub async fn list_orders<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    trace!("💻️ GET orders. {query}");
    let orders = api.list_orders(query).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_metrics => Get "/orders/metrics" impl OrderManagement);
pub async fn order_metrics<B: OrderManagement>(api: web::Data<MetricsApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET order metrics");
    let metrics = api.compute_metrics().await.map_err(|e| {
        warn!("💻️ Could not compute order metrics. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(metrics))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order_by_id({order_id})");
    let order = api.fetch_order(&order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Queue  ----------------------------------------------------
route!(queue_status => Get "/queue" impl OrderManagement);
pub async fn queue_status<B: OrderManagement>(api: web::Data<OrderFlowApi<B>>) -> impl Responder {
    let stats = api.queue().stats();
    trace!("💻️ GET queue status: {stats:?}");
    HttpResponse::Ok().json(stats)
}
