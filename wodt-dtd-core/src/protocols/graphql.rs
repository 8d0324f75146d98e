use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Object, Request as GqlRequest, Schema, Variables};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use tracing::error;

use crate::dtd::DtdManager;

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(manager: Arc<dyn DtdManager>) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).data(manager).finish()
}

#[derive(serde::Deserialize)]
struct HttpGraphQLRequest {
    query: String,
    #[serde(default)]
    variables: serde_json::Value,
    #[serde(default, rename = "operationName")]
    operation_name: Option<String>,
}

pub async fn handle(req: Request<Body>, schema: SchemaType) -> Result<Response<Body>, hyper::Error> {
    match *req.method() {
        Method::GET => Ok(respond(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            Body::from("GraphQL endpoint. Send POST /graphql with {query, variables, operationName}."),
        )),
        Method::POST => {
            let body = hyper::body::to_bytes(req.into_body()).await?;
            let parsed: HttpGraphQLRequest = match serde_json::from_slice(&body) {
                Ok(v) => v,
                Err(_) => {
                    return Ok(respond(StatusCode::BAD_REQUEST, "text/plain", Body::from("invalid graphql http request")));
                }
            };

            let mut gql = GqlRequest::new(parsed.query);
            if let Some(op) = parsed.operation_name {
                gql = gql.operation_name(op);
            }
            if !parsed.variables.is_null() {
                if let Ok(vars) = serde_json::from_value::<Variables>(parsed.variables) {
                    gql = gql.variables(vars);
                }
            }

            let resp = schema.execute(gql).await;
            match serde_json::to_vec(&resp) {
                Ok(out) => Ok(respond(StatusCode::OK, "application/json", Body::from(out))),
                Err(e) => {
                    error!(error=%e, "graphql response serialization failed");
                    Ok(respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", Body::from("serialization failed")))
                }
            }
        }
        _ => Ok(respond(StatusCode::METHOD_NOT_ALLOWED, "text/plain", Body::from("method not allowed"))),
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: Body) -> Response<Body> {
    let mut r = Response::new(body);
    *r.status_mut() = status;
    r.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    r
}

fn manager<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<dyn DtdManager>> {
    ctx.data::<Arc<dyn DtdManager>>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The current descriptor, as Thing Description JSON.
    async fn dtd(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let thing = manager(ctx)?.dtd()?;
        Ok(thing.to_json()?)
    }

    async fn action_ids(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        Ok(manager(ctx)?.available_action_ids().into_iter().collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn add_property(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.add_property(&name))
    }

    async fn remove_property(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.remove_property(&name))
    }

    async fn add_relationship(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.add_relationship(&name))
    }

    async fn remove_relationship(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.remove_relationship(&name))
    }

    async fn add_action(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.add_action(&name))
    }

    async fn remove_action(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.remove_action(&name))
    }

    async fn add_event(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        manager(ctx)?.add_event(&name)?;
        Ok(true)
    }

    async fn remove_event(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<bool> {
        Ok(manager(ctx)?.remove_event(&name)?)
    }
}
