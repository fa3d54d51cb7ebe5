//! Endpoint resolution.
//!
//! Maps the logical resource path a caller uses onto the path the upstream
//! processor expects. Lookup order: exact match, longest prefix match for
//! sub-resources, then pass-through.

use reqwest::Method;

use crate::models::GatewayError;

/// Logical resources known to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Health,
    PublicConnectors,
    Payments,
    PaymentsList,
    Refunds,
    RefundsList,
    Disputes,
    DisputesList,
    Connectors,
    Tokens,
    Customers,
    Payouts,
    PayoutsList,
    ApiKeys,
}

/// Static binding of a logical path to its upstream counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointMapping {
    pub resource: Resource,
    pub logical: &'static str,
    pub canonical: &'static str,
    /// Methods accepted on the mapping itself
    pub methods: &'static [&'static str],
    pub requires_auth: bool,
    /// Upstream only accepts `POST` with a JSON filter body for listing
    pub list_via_post: bool,
}

const fn mapping(
    resource: Resource,
    logical: &'static str,
    canonical: &'static str,
    methods: &'static [&'static str],
    requires_auth: bool,
    list_via_post: bool,
) -> EndpointMapping {
    EndpointMapping {
        resource,
        logical,
        canonical,
        methods,
        requires_auth,
        list_via_post,
    }
}

const READ: &[&str] = &["GET"];
const READ_WRITE: &[&str] = &["GET", "POST"];
const READ_WRITE_DELETE: &[&str] = &["GET", "POST", "DELETE"];

/// Extra methods accepted on sub-resources such as `payments/{id}/cancel`
const SUB_RESOURCE: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

const HEALTH: EndpointMapping = mapping(Resource::Health, "health", "health", &["GET", "HEAD"], false, false);
const PUBLIC_CONNECTORS: EndpointMapping =
    mapping(Resource::PublicConnectors, "connectors/public", "connectors/list", READ, false, false);
const PAYMENTS: EndpointMapping = mapping(Resource::Payments, "payments", "payments", READ_WRITE, true, false);
const PAYMENTS_LIST: EndpointMapping =
    mapping(Resource::PaymentsList, "payments/list", "payments/list", READ_WRITE, true, true);
const REFUNDS: EndpointMapping = mapping(Resource::Refunds, "refunds", "refunds", READ_WRITE, true, false);
const REFUNDS_LIST: EndpointMapping =
    mapping(Resource::RefundsList, "refunds/list", "refunds/list", READ_WRITE, true, true);
const DISPUTES: EndpointMapping = mapping(Resource::Disputes, "disputes", "disputes", READ_WRITE, true, false);
const DISPUTES_LIST: EndpointMapping =
    mapping(Resource::DisputesList, "disputes/list", "disputes/list", READ, true, false);
const CONNECTORS: EndpointMapping =
    mapping(Resource::Connectors, "connectors", "account/connectors", READ_WRITE_DELETE, true, false);
const TOKENS: EndpointMapping = mapping(Resource::Tokens, "tokens", "payment_methods", READ_WRITE_DELETE, true, false);
const CUSTOMERS: EndpointMapping =
    mapping(Resource::Customers, "customers", "customers", READ_WRITE_DELETE, true, false);
const PAYOUTS: EndpointMapping = mapping(Resource::Payouts, "payouts", "payouts", READ_WRITE, true, false);
const PAYOUTS_LIST: EndpointMapping =
    mapping(Resource::PayoutsList, "payouts/list", "payouts/list", READ_WRITE, true, true);
const API_KEYS: EndpointMapping = mapping(Resource::ApiKeys, "api_keys", "api_keys", READ_WRITE_DELETE, true, false);

pub static ENDPOINTS: &[EndpointMapping] = &[
    HEALTH,
    PUBLIC_CONNECTORS,
    PAYMENTS,
    PAYMENTS_LIST,
    REFUNDS,
    REFUNDS_LIST,
    DISPUTES,
    DISPUTES_LIST,
    CONNECTORS,
    TOKENS,
    CUSTOMERS,
    PAYOUTS,
    PAYOUTS_LIST,
    API_KEYS,
];

impl Resource {
    /// The static table entry for this resource.
    #[must_use]
    pub const fn mapping(self) -> &'static EndpointMapping {
        match self {
            Self::Health => &HEALTH,
            Self::PublicConnectors => &PUBLIC_CONNECTORS,
            Self::Payments => &PAYMENTS,
            Self::PaymentsList => &PAYMENTS_LIST,
            Self::Refunds => &REFUNDS,
            Self::RefundsList => &REFUNDS_LIST,
            Self::Disputes => &DISPUTES,
            Self::DisputesList => &DISPUTES_LIST,
            Self::Connectors => &CONNECTORS,
            Self::Tokens => &TOKENS,
            Self::Customers => &CUSTOMERS,
            Self::Payouts => &PAYOUTS,
            Self::PayoutsList => &PAYOUTS_LIST,
            Self::ApiKeys => &API_KEYS,
        }
    }
}

/// How a logical path matched the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Exact(Resource),
    SubResource(Resource),
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub route: Route,
    pub canonical_path: String,
    pub requires_auth: bool,
}

impl ResolvedEndpoint {
    /// True if a `GET` on this endpoint has to be sent as a `POST` listing.
    #[must_use]
    pub fn lists_via_post(&self) -> bool {
        matches!(self.route, Route::Exact(resource) if resource.mapping().list_via_post)
    }
}

/// Resolves a logical path against the endpoint table.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedRequest`] if the path is empty or the
/// method is not accepted by the matched resource.
pub fn resolve(logical_path: &str, method: &Method) -> Result<ResolvedEndpoint, GatewayError> {
    if logical_path.is_empty() || logical_path.split('/').any(str::is_empty) {
        return Err(GatewayError::MalformedRequest(
            "Request path does not name a resource".to_string(),
        ));
    }

    if let Some(found) = ENDPOINTS.iter().find(|m| m.logical == logical_path) {
        ensure_method(found, found.methods, method)?;
        return Ok(ResolvedEndpoint {
            route: Route::Exact(found.resource),
            canonical_path: found.canonical.to_string(),
            requires_auth: found.requires_auth,
        });
    }

    let longest_prefix = ENDPOINTS
        .iter()
        .filter_map(|m| {
            logical_path
                .strip_prefix(m.logical)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| (m, rest))
        })
        .max_by_key(|(m, _)| m.logical.len());

    if let Some((found, rest)) = longest_prefix {
        let accepted = [found.methods, SUB_RESOURCE].concat();
        ensure_method(found, &accepted, method)?;
        return Ok(ResolvedEndpoint {
            route: Route::SubResource(found.resource),
            canonical_path: format!("{}/{rest}", found.canonical),
            requires_auth: found.requires_auth,
        });
    }

    Ok(ResolvedEndpoint {
        route: Route::PassThrough,
        canonical_path: logical_path.to_string(),
        requires_auth: true,
    })
}

fn ensure_method(
    found: &EndpointMapping,
    accepted: &[&str],
    method: &Method,
) -> Result<(), GatewayError> {
    if accepted.contains(&method.as_str()) {
        Ok(())
    } else {
        Err(GatewayError::MalformedRequest(format!(
            "Method {method} is not supported on '{}'",
            found.logical
        )))
    }
}
