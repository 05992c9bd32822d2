// server/src/api.rs
//! HTTP surface over the graph store.
//!
//! Thin warp filters around the store and the analysis engines. Handlers
//! validate before any write and reply with the taxonomy error as
//! `{"error": ...}`; store I/O runs under a timeout so a wedged filesystem
//! produces an error response instead of a hanging request.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use graph_engine::assessment::assess;
use graph_engine::merge::merge;
use graph_engine::store::GraphStore;
use models::errors::{GraphError, GraphResult};
use models::graph::Graph;
use models::links::Link;
use models::nodes::Node;

/// Unified return type of every API handler
type ApiReply = Result<WithStatus<Json>, Rejection>;

#[derive(Deserialize)]
struct NodeBody {
    node: Node,
}

#[derive(Deserialize)]
struct LinkBody {
    link: Link,
}

// Helper to inject the store into warp filters
fn with_store(
    store: Arc<GraphStore>,
) -> impl Filter<Extract = (Arc<GraphStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// The full route tree. `timeout` bounds every store operation.
pub fn routes(
    store: Arc<GraphStore>,
    timeout: Duration,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let body_limit = warp::body::content_length_limit(10 * 1024 * 1024);

    let get_graph = warp::get()
        .and(warp::path("graph"))
        .and(warp::path::end())
        .and(with_store(store.clone()))
        .and_then(move |s| get_graph(s, timeout));

    let replace_graph = warp::post()
        .and(warp::path("graph"))
        .and(warp::path::end())
        .and(body_limit)
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(move |g, s| replace_graph(g, s, timeout));

    let add_node = warp::post()
        .and(warp::path("node"))
        .and(warp::path::end())
        .and(body_limit)
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(move |b, s| add_node(b, s, timeout));

    let add_link = warp::post()
        .and(warp::path("link"))
        .and(warp::path::end())
        .and(body_limit)
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(move |b, s| add_link(b, s, timeout));

    let analyze = warp::post()
        .and(warp::path("analyze"))
        .and(warp::path::end())
        .and(body_limit)
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(move |p, s| analyze(p, s, timeout));

    let diseases = warp::get()
        .and(warp::path("diseases"))
        .and(warp::path::end())
        .and(with_store(store.clone()))
        .and_then(move |s| list_diseases(s, timeout));

    let disease = warp::get()
        .and(warp::path!("disease" / String))
        .and(with_store(store.clone()))
        .and_then(move |name, s| disease_detail(name, s, timeout));

    let symptoms = warp::get()
        .and(warp::path("symptoms"))
        .and(warp::path::end())
        .and(with_store(store))
        .and_then(move |s| list_symptoms(s, timeout));

    get_graph
        .or(replace_graph)
        .or(add_node)
        .or(add_link)
        .or(analyze)
        .or(diseases)
        .or(disease)
        .or(symptoms)
        .recover(handle_rejection)
}

/// Bound a store future so a stuck filesystem surfaces as an IO error.
async fn bounded<T, F>(timeout: Duration, fut: F) -> GraphResult<T>
where
    F: std::future::Future<Output = GraphResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(GraphError::Io("storage operation timed out".to_string())),
    }
}

fn error_reply(err: &GraphError, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "error": err.to_string() })), status)
}

/// Mutation endpoints answer 400 for every caller mistake, including
/// missing endpoints, and 500 only for persistence failures.
fn mutation_status(err: &GraphError) -> StatusCode {
    match err {
        GraphError::Schema(_)
        | GraphError::Validation(_)
        | GraphError::Conflict(_)
        | GraphError::NotFound(_) => StatusCode::BAD_REQUEST,
        GraphError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ack(message: &str) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "success": true, "message": message })),
        StatusCode::OK,
    )
}

async fn get_graph(store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, async { Ok(store.graph().await) }).await {
        Ok(graph) => Ok(warp::reply::with_status(warp::reply::json(&graph), StatusCode::OK)),
        Err(e) => {
            error!("failed to read knowledge graph: {}", e);
            Ok(error_reply(&e, StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

async fn replace_graph(new_graph: Graph, store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, store.replace(new_graph)).await {
        Ok(()) => {
            info!("knowledge graph replaced");
            Ok(ack("Knowledge graph updated successfully"))
        }
        Err(e) => Ok(error_reply(&e, mutation_status(&e))),
    }
}

async fn add_node(body: NodeBody, store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, store.add_node(body.node)).await {
        Ok(()) => Ok(ack("Node added successfully")),
        Err(e) => Ok(error_reply(&e, mutation_status(&e))),
    }
}

async fn add_link(body: LinkBody, store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, store.add_link(body.link)).await {
        Ok(()) => Ok(ack("Relationship added successfully")),
        Err(e) => Ok(error_reply(&e, mutation_status(&e))),
    }
}

/// Run one analysis: merge the stored ground truth with the posted
/// prediction and score it. The prediction is never persisted.
async fn analyze(prediction: Graph, store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    let ground_truth = match bounded(timeout, async { Ok(store.graph().await) }).await {
        Ok(graph) => graph,
        Err(e) => return Ok(error_reply(&e, StatusCode::INTERNAL_SERVER_ERROR)),
    };

    let combined = match merge(&ground_truth, &prediction) {
        Ok(combined) => combined,
        Err(e) => return Ok(error_reply(&e, mutation_status(&e))),
    };
    let report = match assess(&ground_truth, &prediction) {
        Ok(report) => report,
        Err(e) => return Ok(error_reply(&e, mutation_status(&e))),
    };

    info!(
        "analysis for '{}': {} combined nodes, accuracy {:.2}",
        report.metrics.predicted_disease,
        combined.node_count(),
        report.metrics.reasoning_accuracy
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({
            "success": true,
            "data": {
                "combined_graph": combined,
                "assessment": report.metrics,
            }
        })),
        StatusCode::OK,
    ))
}

async fn list_diseases(store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, async { Ok(store.diseases().await) }).await {
        Ok(diseases) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "success": true, "diseases": diseases })),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(&e, StatusCode::INTERNAL_SERVER_ERROR)),
    }
}

async fn disease_detail(name: String, store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, store.disease_connections(&name)).await {
        Ok(connections) => {
            let connections: Vec<_> = connections
                .iter()
                .map(|l| {
                    json!({
                        "target": l.target,
                        "relationship": l.relationship,
                        "weight": l.weight,
                    })
                })
                .collect();
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({
                    "success": true,
                    "disease": name,
                    "connections": connections,
                })),
                StatusCode::OK,
            ))
        }
        Err(e @ GraphError::NotFound(_)) => Ok(error_reply(&e, StatusCode::NOT_FOUND)),
        Err(e) => Ok(error_reply(&e, StatusCode::INTERNAL_SERVER_ERROR)),
    }
}

async fn list_symptoms(store: Arc<GraphStore>, timeout: Duration) -> ApiReply {
    match bounded(timeout, async { Ok(store.symptoms().await) }).await {
        Ok(symptoms) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "success": true, "symptoms": symptoms })),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(&e, StatusCode::INTERNAL_SERVER_ERROR)),
    }
}

/// Shape warp's own rejections (bad JSON, wrong method, unknown path) into
/// the same `{"error": ...}` envelope the handlers use.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        status,
    ))
}
