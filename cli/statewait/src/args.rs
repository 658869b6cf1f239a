//! Command line interface.
//!
//! Parses the target selection, the pattern source and the deadline, and
//! turns them into the [`Target`] list the controller watches. Resource kind
//! discovery can be narrowed with the `--group`/`--api-version`/`--plural`
//! filters when a kind name is ambiguous across API groups.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;
use kube::api::ApiResource;

/// Wait until Kubernetes resources match a partial state pattern.
///
/// The pattern is a YAML document listing only the fields that must be
/// present; the tool blocks until every target's live state satisfies it,
/// then exits 0. Exit code 1 means the deadline elapsed, 2 means a fatal
/// error (bad pattern, unknown kind, permission denied).
#[derive(Parser, Debug)]
#[command(name = "statewait", version, about)]
pub struct Args {
    /// Kind of the resource in PascalCase, e.g. `Deployment` or `ReplicaSet`.
    pub kind: String,

    /// Names of the resources to wait for. Each name becomes an independent
    /// target; all of them must match before the run succeeds.
    #[arg(required_unless_present = "selector")]
    pub names: Vec<String>,

    /// Label selector forming one target over a set of resources,
    /// e.g. `app=web,tier=frontend`. The target matches as soon as any
    /// selected resource satisfies the pattern.
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Namespace where the resources live.
    /// Ignored for cluster-wide resources.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Resource group. Can be used to narrow down search results when discovering available resources.
    #[arg(long)]
    pub group: Option<String>,

    /// Resource group version. Can be used to narrow down search results when discovering available resources.
    #[arg(long)]
    pub group_version: Option<String>,

    /// Resource apiVersion. Can be used to narrow down search results when discovering available resources.
    #[arg(long)]
    pub api_version: Option<String>,

    /// Resource plural name. Can be used to narrow down search results when discovering available resources.
    #[arg(long)]
    pub plural: Option<String>,

    /// Deadline for the whole run, in seconds.
    #[arg(short, long, default_value_t = 300)]
    pub timeout: u64,

    /// Path to the YAML file containing the state pattern.
    /// Omit or pass '-' to read from standard input.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl Args {
    /// Whether a discovered API resource satisfies the discovery filters.
    pub fn filter_resource(&self, api_resource: &ApiResource) -> bool {
        self.kind == api_resource.kind
            && self
                .group
                .as_ref()
                .is_none_or(|g| *g == api_resource.group)
            && self
                .group_version
                .as_ref()
                .is_none_or(|v| *v == api_resource.version)
            && self
                .api_version
                .as_ref()
                .is_none_or(|av| *av == api_resource.api_version)
            && self
                .plural
                .as_ref()
                .is_none_or(|p| *p == api_resource.plural)
    }

    /// The targets this invocation watches: one per name, plus one for the
    /// label selector when given.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .names
            .iter()
            .map(|name| Target {
                kind: self.kind.clone(),
                selector: TargetSelector::Name(name.clone()),
            })
            .collect();
        if let Some(selector) = &self.selector {
            targets.push(Target {
                kind: self.kind.clone(),
                selector: TargetSelector::Labels(selector.clone()),
            });
        }
        targets
    }
}

/// How a target picks its resources: a single name, or a label selector
/// yielding a set.
#[derive(Debug, Clone)]
pub enum TargetSelector {
    /// Exactly one resource by `metadata.name`
    Name(String),
    /// Every resource matching a label selector
    Labels(String),
}

/// One resource (or resource set) being watched for a match.
///
/// Constructed from CLI input and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Target {
    /// PascalCase kind, e.g. `Deployment`
    pub kind: String,
    /// Name or label selector
    pub selector: TargetSelector,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            TargetSelector::Name(name) => write!(f, "{}/{}", self.kind, name),
            TargetSelector::Labels(labels) => write!(f, "{}[{}]", self.kind, labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn deployment_resource() -> ApiResource {
        ApiResource {
            group: "apps".to_string(),
            version: "v1".to_string(),
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            plural: "deployments".to_string(),
        }
    }

    #[test]
    fn test_filter_matches_on_kind_alone() {
        let args = Args::parse_from(["statewait", "Deployment", "web"]);
        assert!(args.filter_resource(&deployment_resource()));
    }

    #[test]
    fn test_filter_rejects_other_kinds() {
        let args = Args::parse_from(["statewait", "ReplicaSet", "web"]);
        assert!(!args.filter_resource(&deployment_resource()));
    }

    #[test]
    fn test_filter_narrows_by_group_and_plural() {
        let args = Args::parse_from([
            "statewait",
            "Deployment",
            "web",
            "--group",
            "apps",
            "--plural",
            "deployments",
        ]);
        assert!(args.filter_resource(&deployment_resource()));

        let wrong_group =
            Args::parse_from(["statewait", "Deployment", "web", "--group", "extensions"]);
        assert!(!wrong_group.filter_resource(&deployment_resource()));
    }

    #[test]
    fn test_targets_one_per_name_plus_selector() {
        let args = Args::parse_from([
            "statewait",
            "Deployment",
            "web",
            "api",
            "--selector",
            "app=batch",
        ]);
        let targets = args.targets();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].to_string(), "Deployment/web");
        assert_eq!(targets[1].to_string(), "Deployment/api");
        assert_eq!(targets[2].to_string(), "Deployment[app=batch]");
    }

    #[test]
    fn test_selector_alone_is_accepted() {
        let args = Args::parse_from(["statewait", "Pod", "--selector", "app=web"]);
        assert_eq!(args.targets().len(), 1);
    }

    #[test]
    fn test_kind_without_name_or_selector_is_rejected() {
        assert!(Args::try_parse_from(["statewait", "Pod"]).is_err());
    }
}
