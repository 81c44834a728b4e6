use async_graphql::http::GraphiQLSource;
use axum::{
    extract::Extension,
    response::{Html, IntoResponse},
    Json,
};

use crate::app::schema::AppSchema;
use crate::context::RequestContext;

/// Run one GraphQL operation as the caller resolved by the auth middleware.
pub async fn execute(
    Extension(schema): Extension<AppSchema>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request.data(context)).await)
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
