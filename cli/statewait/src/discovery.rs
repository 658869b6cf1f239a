//! Resource discovery.
//!
//! Resolves the requested kind to a concrete API resource at runtime using
//! the Kubernetes discovery API, so CRDs work the same as built-in kinds.
//! The result is a dynamically-typed `Api` scoped to the right namespace.

use kube::api::DynamicObject;
use kube::discovery::{ApiGroup, Discovery, Scope};
use kube::{Api, Client};
use tracing::debug;

use crate::args::Args;
use crate::error::WaitError;

/// Resolve the kind named by `args` to an `Api<DynamicObject>`.
///
/// Runs discovery over the recommended resources of every API group and
/// applies the CLI filters. Exactly one candidate must remain: none or
/// several is fatal, with a hint to narrow the filters in the latter case.
pub async fn resolve_api(client: &Client, args: &Args) -> Result<Api<DynamicObject>, WaitError> {
    let discovery = Discovery::new(client.clone()).run().await?;

    let mut found: Vec<_> = discovery
        .groups()
        .flat_map(ApiGroup::recommended_resources)
        .filter(|(api_resource, _)| args.filter_resource(api_resource))
        .collect();

    if found.len() > 1 {
        return Err(WaitError::AmbiguousApiResource(args.kind.clone()));
    }
    let Some((api_resource, capabilities)) = found.pop() else {
        return Err(WaitError::NoApiResource(args.kind.clone()));
    };

    debug!(
        "resolved kind {} to {} ({:?} scope)",
        args.kind, api_resource.api_version, capabilities.scope
    );

    let api = match capabilities.scope {
        Scope::Cluster => Api::all_with(client.clone(), &api_resource),
        Scope::Namespaced => Api::namespaced_with(
            client.clone(),
            args.namespace
                .as_deref()
                .unwrap_or_else(|| client.default_namespace()),
            &api_resource,
        ),
    };
    Ok(api)
}
