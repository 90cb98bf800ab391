//! Scheduled task routes: `/api/ecs`
//!
//! `GET` returns the task catalog grouped by client. `POST` launches one or
//! more task definitions on Fargate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use roamhq_core::tasks::{ClientGroup, TASK_PREFIX, group_tasks_by_client};

use crate::config::EcsPlacement;
use crate::ecs::{LaunchReport, RunTaskRequest, launch_all};
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/ecs` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_catalog).post(run_tasks))
}

// ── Request / Response types ─────────────────────────────────────────

/// A client group with the placement needed to launch its tasks.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub group: ClientGroup,
    #[serde(flatten)]
    pub placement: EcsPlacement,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunTasksRequest {
    pub tasks: Option<Vec<String>>,
    pub task_definition: Option<String>,
    pub cluster: String,
    pub region: String,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: bool,
}

impl RunTasksRequest {
    /// Expand into one launch request per task definition.
    ///
    /// `tasks` wins over a lone `taskDefinition`.
    fn into_launches(self) -> Result<Vec<RunTaskRequest>, AppError> {
        let task_definitions = match (self.tasks, self.task_definition) {
            (Some(tasks), _) => tasks,
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        };

        if self.cluster.is_empty() || self.region.is_empty() || task_definitions.is_empty() {
            return Err(AppError::BadRequest(
                "Missing required fields: cluster, region, or tasks".to_owned(),
            ));
        }

        Ok(task_definitions
            .into_iter()
            .map(|task_definition| RunTaskRequest {
                cluster: self.cluster.clone(),
                region: self.region.clone(),
                task_definition,
                subnets: self.subnets.clone(),
                security_groups: self.security_groups.clone(),
                assign_public_ip: self.assign_public_ip,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
pub struct RunTasksResponse {
    pub success: bool,
    pub partial: bool,
    pub results: LaunchReport,
    pub message: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// List scheduled task definitions grouped by client.
async fn list_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let gateway = state.ecs_gateway()?;
    let arns = gateway
        .list_task_definitions(&state.placement.region)
        .await?;

    let groups = group_tasks_by_client(arns.iter().filter(|arn| arn.contains(TASK_PREFIX)));

    let catalog = groups
        .into_iter()
        .map(|group| CatalogEntry {
            group,
            placement: state.placement.clone(),
        })
        .collect();

    Ok(Json(catalog))
}

/// Launch a batch of task definitions.
async fn run_tasks(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunTasksRequest>,
) -> Result<(StatusCode, Json<RunTasksResponse>), AppError> {
    let launches = body.into_launches()?;
    let gateway = state.ecs_gateway()?;

    info!(count = launches.len(), "launching scheduled tasks");
    let report = launch_all(gateway, launches).await;

    let status = if report.all_succeeded() {
        StatusCode::OK
    } else if report.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(RunTasksResponse {
            success: report.all_succeeded(),
            partial: report.is_partial(),
            message: report.message(),
            results: report,
        }),
    ))
}
