pub mod error;
pub mod proxy;
pub mod request;

pub use error::{ErrorBody, ErrorEnvelope, GatewayError, UpstreamFailure};
pub use proxy::{HttpApiEvent, ProxyResponse};
pub use request::{InboundRequest, QueryParams, TransformedRequest, UpstreamResponse};
