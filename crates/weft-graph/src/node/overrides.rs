//! Post-declaration node overrides.
//!
//! An override call is validated as a whole before anything is written, so
//! a failing call leaves the node untouched. Fields that are not set keep
//! their current value.

use std::collections::BTreeMap;

use derive_builder::Builder;
use jiff::SignedDuration;

use super::{Alias, Node, NodeMetadata};
use crate::TRACING_TARGET;
use crate::dnsify::dnsify;
use crate::entity::TaskConfig;
use crate::error::{GraphError, GraphResult};
use crate::promise::{Param, impl_param_from};
use crate::resources::{Accelerator, ResourceRequirements, Resources, SharedMemory};
use crate::template::PodTemplate;

/// New execution deadline of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Timeout {
    /// Removes the deadline (zero duration).
    Clear,
    Seconds(i64),
    Duration(SignedDuration),
    /// A duration in any format `jiff` parses, such as `"1h 30m"` or `"PT90S"`.
    Text(String),
}

impl Timeout {
    fn resolve(self) -> GraphResult<SignedDuration> {
        let duration = match self {
            Self::Clear => return Ok(SignedDuration::ZERO),
            Self::Seconds(seconds) => SignedDuration::from_secs(seconds),
            Self::Duration(duration) => duration,
            Self::Text(text) => text.trim().parse::<SignedDuration>().map_err(|_| {
                GraphError::invalid_value(format!(
                    "timeout should be a duration or integer seconds, got `{text}`"
                ))
            })?,
        };
        if duration.is_negative() {
            return Err(GraphError::invalid_value(format!(
                "timeout cannot be negative, got {duration}"
            )));
        }
        Ok(duration)
    }
}

impl From<i64> for Timeout {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<SignedDuration> for Timeout {
    fn from(duration: SignedDuration) -> Self {
        Self::Duration(duration)
    }
}

impl From<&str> for Timeout {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Caching policy with a mandatory version when used in overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachePolicy {
    pub version: Option<String>,
    pub serialize: bool,
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }
}

/// Cache override: a plain switch or a full policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cache {
    Enabled(bool),
    Policy(CachePolicy),
}

impl_param_from!(Cache);

impl From<bool> for Param<Cache> {
    fn from(enabled: bool) -> Self {
        Self::Value(Cache::Enabled(enabled))
    }
}

impl From<CachePolicy> for Param<Cache> {
    fn from(policy: CachePolicy) -> Self {
        Self::Value(Cache::Policy(policy))
    }
}

/// Fields to change on a node; see [`Node::with_overrides`].
///
/// `cache_serialize` and `cache_version` are the legacy spelling of a
/// [`CachePolicy`] and cannot be combined with one.
#[derive(Debug, Clone, Default, Builder)]
#[builder(
    name = "OverridesBuilder",
    pattern = "owned",
    default,
    setter(into, strip_option)
)]
pub struct Overrides {
    /// New node id, converted to a DNS label.
    node_name: Option<Param<String>>,
    /// Output aliases; replaces the existing set.
    aliases: Option<BTreeMap<String, String>>,
    requests: Option<Resources>,
    limits: Option<Resources>,
    /// Requests and limits in one; exclusive with `requests` and `limits`.
    resources: Option<Resources>,
    timeout: Option<Timeout>,
    retries: Option<Param<u32>>,
    interruptible: Option<Param<bool>>,
    /// Display name in node metadata.
    name: Option<String>,
    task_config: Option<TaskConfig>,
    container_image: Option<Param<String>>,
    accelerator: Option<Param<Accelerator>>,
    cache: Option<Param<Cache>>,
    cache_serialize: Option<Param<bool>>,
    cache_version: Option<Param<String>>,
    shared_memory: Option<Param<SharedMemory>>,
    pod_template: Option<Param<PodTemplate>>,
}

impl Overrides {
    pub fn builder() -> OverridesBuilder {
        OverridesBuilder::default()
    }
}

impl From<OverridesBuilderError> for GraphError {
    fn from(error: OverridesBuilderError) -> Self {
        GraphError::invalid_value(error.to_string())
    }
}

/// Metadata writes, applied to the node or to an array map's sub-node.
#[derive(Debug, Default)]
struct MetadataUpdate {
    name: Option<String>,
    timeout: Option<SignedDuration>,
    retries: Option<u32>,
    interruptible: Option<bool>,
    cacheable: Option<bool>,
    cache_version: Option<String>,
    cache_serializable: Option<bool>,
}

impl MetadataUpdate {
    fn apply(self, metadata: &mut NodeMetadata) {
        if let Some(name) = self.name {
            metadata.name = name;
        }
        if let Some(timeout) = self.timeout {
            metadata.timeout = Some(timeout);
        }
        if let Some(retries) = self.retries {
            metadata.retries.retries = retries;
        }
        if let Some(interruptible) = self.interruptible {
            metadata.interruptible = Some(interruptible);
        }
        if let Some(cacheable) = self.cacheable {
            metadata.cacheable = cacheable;
        }
        if let Some(version) = self.cache_version {
            metadata.cache_version = Some(version);
        }
        if let Some(serializable) = self.cache_serializable {
            metadata.cache_serializable = serializable;
        }
    }
}

/// A validated override call, ready to be written.
#[derive(Debug, Default)]
struct Validated {
    id: Option<String>,
    aliases: Option<Vec<Alias>>,
    resources: Option<ResourceRequirements>,
    task_config: Option<TaskConfig>,
    container_image: Option<String>,
    accelerator: Option<Accelerator>,
    shared_memory: Option<SharedMemory>,
    pod_template: Option<PodTemplate>,
    metadata: MetadataUpdate,
}

fn check<T>(param: Option<Param<T>>, location: &str) -> GraphResult<Option<T>> {
    param.map(|p| p.assert_not_promise(location)).transpose()
}

impl Overrides {
    fn validate(self, node: &Node) -> GraphResult<Validated> {
        let mut validated = Validated::default();

        if let Some(node_name) = check(self.node_name, "node_name")? {
            let id = dnsify(&node_name);
            if id.is_empty() {
                return Err(GraphError::invalid_value(format!(
                    "node name `{node_name}` has no characters usable in a node id"
                )));
            }
            validated.id = Some(id);
        }

        validated.aliases = self.aliases.map(Node::alias_map);
        validated.resources =
            Self::validate_resources(node, self.resources, self.requests, self.limits)?;

        if let Some(config) = self.task_config {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id,
                "Task config override is beta and may change"
            );
            match node.run_entity.task_config() {
                Some(current) if current.is_same_type(&config) => {}
                current => {
                    return Err(GraphError::invalid_value(format!(
                        "cannot change the type of the task config from {} to {}",
                        current.as_ref().map_or("none", TaskConfig::type_name),
                        config.type_name()
                    )));
                }
            }
            validated.task_config = Some(config);
        }

        validated.container_image = check(self.container_image, "container_image")?;
        validated.accelerator = check(self.accelerator, "accelerator")?;
        validated.shared_memory = check(self.shared_memory, "shared_memory")?;
        validated.pod_template = check(self.pod_template, "pod_template")?;

        let metadata = &mut validated.metadata;
        metadata.name = self.name;
        metadata.timeout = self.timeout.map(Timeout::resolve).transpose()?;
        metadata.retries = check(self.retries, "retries")?;
        metadata.interruptible = check(self.interruptible, "interruptible")?;

        let cache_version = check(self.cache_version, "cache_version")?;
        let cache_serialize = check(self.cache_serialize, "cache_serialize")?;
        match check(self.cache, "cache")? {
            None => {}
            Some(Cache::Enabled(true)) if cache_version.is_none() => {
                return Err(GraphError::invalid_value(
                    "must specify a cache version when enabling the cache in an override",
                ));
            }
            Some(Cache::Enabled(enabled)) => metadata.cacheable = Some(enabled),
            Some(Cache::Policy(policy)) => {
                if cache_serialize.is_some() || cache_version.is_some() {
                    return Err(GraphError::invalid_value(
                        "cache_serialize and cache_version cannot be combined with a cache policy, \
                         set them on the policy instead",
                    ));
                }
                let Some(version) = policy.version else {
                    return Err(GraphError::invalid_value(
                        "must specify a cache version when overriding the cache policy",
                    ));
                };
                metadata.cacheable = Some(true);
                metadata.cache_version = Some(version);
                metadata.cache_serializable = Some(policy.serialize);
                return Ok(validated);
            }
        }
        metadata.cache_version = cache_version;
        metadata.cache_serializable = cache_serialize;

        Ok(validated)
    }

    fn validate_resources(
        node: &Node,
        resources: Option<Resources>,
        requests: Option<Resources>,
        limits: Option<Resources>,
    ) -> GraphResult<Option<ResourceRequirements>> {
        let requirements = match (resources, requests, limits) {
            (None, None, None) => return Ok(None),
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(GraphError::invalid_value(
                    "resources cannot be used together with requests or limits, set only resources",
                ));
            }
            (Some(resources), None, None) => resources.split()?,
            (None, requests, limits) => ResourceRequirements {
                requests: match requests {
                    Some(requests) => requests.to_entries("resources.requests")?,
                    None => Vec::new(),
                },
                limits: match limits {
                    Some(limits) => limits.to_entries("resources.limits")?,
                    None => Vec::new(),
                },
            },
        };

        if requirements.limits.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id,
                node_name = %node.metadata.name,
                "Requests overridden without specifying limits, requests are clamped to the original limits"
            );
        }
        Ok(Some(requirements))
    }
}

impl Node {
    /// Applies `overrides` after validating all of them.
    ///
    /// Promises in static fields fail with an assertion error; conflicting
    /// or malformed values fail with a value error. Array map nodes write
    /// metadata to the sub-node metadata of their run entity.
    #[tracing::instrument(name = "node.with_overrides", skip_all, fields(node_id = %self.id))]
    pub fn with_overrides(&mut self, overrides: Overrides) -> GraphResult<&mut Self> {
        let validated = overrides.validate(self)?;

        if let Some(id) = validated.id {
            self.id = id;
        }
        if let Some(aliases) = validated.aliases {
            self.aliases = aliases;
        }
        if let Some(resources) = validated.resources {
            self.resources = Some(resources);
        }
        if let Some(config) = validated.task_config {
            self.run_entity.set_task_config(config);
        }
        if let Some(image) = validated.container_image {
            self.container_image = Some(image);
        }
        if let Some(accelerator) = validated.accelerator {
            self.extended_resources.gpu_accelerator = Some(accelerator);
        }
        if let Some(shared_memory) = validated.shared_memory {
            self.extended_resources.shared_memory = Some(shared_memory);
        }
        if let Some(pod_template) = validated.pod_template {
            self.pod_template = Some(pod_template);
        }

        if self.run_entity.is_array_map() {
            self.run_entity
                .update_sub_node_metadata(|metadata| validated.metadata.apply(metadata));
        } else {
            validated.metadata.apply(&mut self.metadata);
        }

        tracing::debug!(target: TRACING_TARGET, node_id = %self.id, "Applied node overrides");
        Ok(self)
    }
}
