use lambda_runtime::tracing::{debug, warn};
use lambda_runtime::{Context, Diagnostic, LambdaEvent};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::gateway::{Gateway, translator};
use crate::http::UpstreamClient;
use crate::models::{GatewayError, HttpApiEvent, ProxyResponse};

/// Time kept back from the Lambda deadline to write the response.
const DEADLINE_MARGIN: Duration = Duration::from_millis(250);

/// Remaining time before the invocation deadline, minus a safety margin.
///
/// Returns `None` if the context carries no deadline (as in tests).
#[must_use]
pub fn remaining_budget(context: &Context, now: SystemTime) -> Option<Duration> {
    if context.deadline == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(context.deadline);
    let remaining = deadline.duration_since(now).unwrap_or(Duration::ZERO);
    Some(remaining.saturating_sub(DEADLINE_MARGIN))
}

/// Lambda event handler. Translates an HTTP API event into one upstream call.
///
/// Every gateway failure is answered with an HTTP error envelope, so the
/// handler itself does not fail.
///
/// # Errors
///
/// The `Diagnostic` error type is kept for the runtime contract; no path
/// currently returns it.
pub async fn function_handler<C: UpstreamClient>(
    gateway: &Gateway<C>,
    event: LambdaEvent<Value>,
) -> Result<ProxyResponse, Diagnostic> {
    let (payload, context) = event.into_parts();
    debug!(request_id = %context.request_id, "Received event");

    let event: HttpApiEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Event is not an HTTP API request");
            return Ok(translator::error_response(&GatewayError::MalformedRequest(
                "Request could not be read".to_string(),
            )));
        }
    };

    let budget = remaining_budget(&context, SystemTime::now());
    Ok(gateway.handle(event, budget).await)
}
