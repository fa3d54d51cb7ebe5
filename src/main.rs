use lambda_runtime::{Error, service_fn};
use payments_gateway::config::GatewayConfig;
use payments_gateway::gateway::Gateway;
use payments_gateway::handler::function_handler;
use payments_gateway::http::ReqwestUpstream;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Use Lambda runtime's built-in tracing subscriber for CloudWatch Logs
    lambda_runtime::tracing::init_default_subscriber();

    let config = GatewayConfig::from_env()?;
    let client = ReqwestUpstream::from_config(&config)?;
    let gateway = Arc::new(Gateway::new(config, client));

    lambda_runtime::run(service_fn(move |event| {
        let gateway = Arc::clone(&gateway);
        async move { function_handler(&*gateway, event).await }
    }))
    .await
}
