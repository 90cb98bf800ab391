//! ECS gateway — listing and launching scheduled task definitions.
//!
//! [`EcsGateway`] is the seam between the HTTP routes and AWS. The
//! production [`AwsEcsGateway`] talks to the ECS API with static credentials;
//! tests substitute an in-memory implementation.
//!
//! Batch launches run every task concurrently and report each outcome
//! separately, in request order, so one bad task definition never hides the
//! others.

use std::sync::Arc;
use std::time::Duration;

use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::operation::run_task::RunTaskOutput;
use aws_sdk_ecs::types::{AssignPublicIp, AwsVpcConfiguration, LaunchType, NetworkConfiguration};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Per-call timeout for ECS API requests.
const ECS_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for `ListTaskDefinitions`.
const LIST_PAGE_SIZE: i32 = 100;

/// Errors from the ECS gateway.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// Listing task definitions failed.
    #[error("failed to list task definitions: {reason}")]
    List { reason: String },

    /// The run request could not be turned into an ECS call.
    #[error("invalid run request: {reason}")]
    InvalidRequest { reason: String },

    /// ECS did not start the task.
    #[error("{reason}")]
    Launch { reason: String },
}

/// Everything needed to start one task on Fargate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTaskRequest {
    pub cluster: String,
    pub region: String,
    pub task_definition: String,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: bool,
}

/// Access to the ECS API.
#[async_trait::async_trait]
pub trait EcsGateway: Send + Sync + 'static {
    /// Return every task-definition ARN in `region`, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::List`] if any page fails.
    async fn list_task_definitions(&self, region: &str) -> Result<Vec<String>, EcsError>;

    /// Start one task and return its task ARN.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Launch`] if ECS reports a failure or the call
    /// fails, and [`EcsError::InvalidRequest`] if the request is malformed.
    async fn run_task(&self, request: &RunTaskRequest) -> Result<String, EcsError>;
}

/// A task that ECS accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedTask {
    pub success: bool,
    pub task_definition: String,
    pub task_arn: String,
}

/// A task that did not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTask {
    pub task_definition: String,
    pub error: String,
}

/// Outcome of a batch launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaunchReport {
    pub successful: Vec<LaunchedTask>,
    pub failed: Vec<FailedTask>,
}

impl LaunchReport {
    /// Number of tasks attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.successful.len().saturating_add(self.failed.len())
    }

    /// Every task started.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Some, but not all, tasks started.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.successful.is_empty() && !self.failed.is_empty()
    }

    /// Operator-facing summary line.
    #[must_use]
    pub fn message(&self) -> String {
        if self.all_succeeded() {
            format!("All {} task(s) started successfully", self.successful.len())
        } else if self.is_partial() {
            format!(
                "{} of {} task(s) started successfully",
                self.successful.len(),
                self.total()
            )
        } else {
            "All tasks failed to start".to_owned()
        }
    }
}

/// Launch every request concurrently and collect the outcomes in order.
pub async fn launch_all(
    gateway: Arc<dyn EcsGateway>,
    requests: Vec<RunTaskRequest>,
) -> LaunchReport {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let gateway = Arc::clone(&gateway);
            let task_definition = request.task_definition.clone();
            let handle = tokio::spawn(async move { gateway.run_task(&request).await });
            (task_definition, handle)
        })
        .collect();

    let mut report = LaunchReport::default();
    for (task_definition, handle) in handles {
        match handle.await {
            Ok(Ok(task_arn)) => {
                info!(task_definition = %task_definition, task_arn = %task_arn, "task started");
                report.successful.push(LaunchedTask {
                    success: true,
                    task_definition,
                    task_arn,
                });
            }
            Ok(Err(e)) => {
                warn!(task_definition = %task_definition, error = %e, "task failed to start");
                report.failed.push(FailedTask {
                    task_definition,
                    error: e.to_string(),
                });
            }
            Err(join_err) => {
                warn!(task_definition = %task_definition, error = %join_err, "task launch aborted");
                report.failed.push(FailedTask {
                    task_definition,
                    error: format!("task launch aborted: {join_err}"),
                });
            }
        }
    }

    report
}

/// ECS gateway backed by the AWS SDK.
pub struct AwsEcsGateway {
    credentials: Credentials,
}

impl AwsEcsGateway {
    /// Build a gateway from a static access key pair.
    #[must_use]
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            credentials: Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "roamhq-console",
            ),
        }
    }

    /// Build a client for one region. Run requests name their own region,
    /// so clients are not cached.
    fn client(&self, region: &str) -> aws_sdk_ecs::Client {
        let provider = SharedCredentialsProvider::new(self.credentials.clone());
        let config = aws_sdk_ecs::Config::builder()
            .region(aws_sdk_ecs::config::Region::new(region.to_owned()))
            .credentials_provider(provider)
            .behavior_version_latest()
            .build();
        aws_sdk_ecs::Client::from_conf(config)
    }
}

impl std::fmt::Debug for AwsEcsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsEcsGateway").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl EcsGateway for AwsEcsGateway {
    async fn list_task_definitions(&self, region: &str) -> Result<Vec<String>, EcsError> {
        let client = self.client(region);
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let request = client
                .list_task_definitions()
                .set_next_token(next_token.take())
                .max_results(LIST_PAGE_SIZE)
                .send();

            let page = tokio::time::timeout(ECS_CALL_TIMEOUT, request)
                .await
                .map_err(|_| EcsError::List {
                    reason: format!("timed out after {}s", ECS_CALL_TIMEOUT.as_secs()),
                })?
                .map_err(|e| EcsError::List {
                    reason: DisplayErrorContext(&e).to_string(),
                })?;

            arns.extend(page.task_definition_arns().iter().cloned());

            match page.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        debug!(region, count = arns.len(), "listed task definitions");
        Ok(arns)
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<String, EcsError> {
        let assign_public_ip = if request.assign_public_ip {
            AssignPublicIp::Enabled
        } else {
            AssignPublicIp::Disabled
        };

        let vpc = AwsVpcConfiguration::builder()
            .set_subnets(Some(request.subnets.clone()))
            .set_security_groups(Some(request.security_groups.clone()))
            .assign_public_ip(assign_public_ip)
            .build()
            .map_err(|e| EcsError::InvalidRequest {
                reason: e.to_string(),
            })?;

        let call = self
            .client(&request.region)
            .run_task()
            .cluster(&request.cluster)
            .task_definition(&request.task_definition)
            .launch_type(LaunchType::Fargate)
            .network_configuration(
                NetworkConfiguration::builder()
                    .awsvpc_configuration(vpc)
                    .build(),
            )
            .send();

        let output = tokio::time::timeout(ECS_CALL_TIMEOUT, call)
            .await
            .map_err(|_| EcsError::Launch {
                reason: format!("timed out after {}s", ECS_CALL_TIMEOUT.as_secs()),
            })?
            .map_err(|e| EcsError::Launch {
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        launch_outcome(&output)
    }
}

/// Interpret a `RunTask` response: the first started task wins, otherwise
/// the first reported failure.
fn launch_outcome(output: &RunTaskOutput) -> Result<String, EcsError> {
    if let Some(task) = output.tasks().first() {
        return Ok(task.task_arn().unwrap_or_default().to_owned());
    }

    let reason = match output.failures().first() {
        Some(failure) => failure.reason().unwrap_or("Failed to start task"),
        None => "Unknown error occurred",
    };

    Err(EcsError::Launch {
        reason: reason.to_owned(),
    })
}
