use crate::domain::OperatorService;
use crate::http::{run_http_server, ApiState, HttpServerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DeviceApi {
    state: ApiState,
    config: HttpServerConfig,
}

impl DeviceApi {
    pub fn new(operator_service: Arc<OperatorService>, config: HttpServerConfig) -> Self {
        debug!("Initializing device API module");
        Self {
            state: ApiState { operator_service },
            config,
        }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| Box::pin(async move { run_http_server(self.config, self.state, ctx).await })
    }
}
