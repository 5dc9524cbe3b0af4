//! OpenAPI specification for Courier, generated from route
//! handlers and wire types with `utoipa`'s `ApiDoc` derive.

use crate::server::AppState;
use crate::types::*;
use axum::Router;
use courier_common::types::EventEnvelope;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Courier",
        description = "
# Courier

In-process publish/subscribe broker. Producers publish event envelopes
over HTTP; subscribers receive them over a WebSocket stream scoped to a
channel.

## Usage Pattern

1. Connect `GET /subscribe/{channel}` to receive events for that channel.
2. Producers `POST /publish` with `{channel, data}` (or the legacy
   `POST /publish/{channel}` form).
3. `GET /health` and `GET /stats` expose operational state.
        ",
        version = "0.1.0",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::routes::publish::publish,
        crate::routes::publish::publish_legacy,
        crate::routes::health::health,
        crate::routes::stats::stats,
        crate::routes::subscribe::subscribe,
    ),
    components(schemas(
        PublishRequest,
        PublishResponse,
        ErrorResponse,
        HealthResponse,
        StatsResponse,
        ChannelStats,
        EventEnvelope,
    )),
    tags(
        (name = "ingress", description = "Publish endpoints"),
        (name = "control", description = "Health and statistics"),
        (name = "streaming", description = "Subscriber WebSocket stream"),
    )
)]
pub struct ApiDoc;

pub fn docs_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
}
