//! Compute resources and extended resources of a node.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{GraphError, GraphResult};
use crate::promise::{Param, Promise, impl_param_from};

/// Resource kinds, in their serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(AsRefStr, Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceName {
    Cpu,
    Memory,
    Gpu,
    EphemeralStorage,
}

/// One resource quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: ResourceName,
    pub value: String,
}

impl ResourceEntry {
    pub fn new(name: ResourceName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Resource requests and limits as attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: Vec<ResourceEntry>,
    pub limits: Vec<ResourceEntry>,
}

/// A quantity, or a `(request, limit)` pair when overriding `resources`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Single(Param<String>),
    Bounded(Param<String>, Param<String>),
}

impl From<&str> for ResourceValue {
    fn from(value: &str) -> Self {
        Self::Single(value.into())
    }
}

impl From<String> for ResourceValue {
    fn from(value: String) -> Self {
        Self::Single(value.into())
    }
}

impl From<Promise> for ResourceValue {
    fn from(promise: Promise) -> Self {
        Self::Single(promise.into())
    }
}

impl<R, L> From<(R, L)> for ResourceValue
where
    R: Into<Param<String>>,
    L: Into<Param<String>>,
{
    fn from((request, limit): (R, L)) -> Self {
        Self::Bounded(request.into(), limit.into())
    }
}

/// Author-facing resource quantities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    pub cpu: Option<ResourceValue>,
    pub mem: Option<ResourceValue>,
    pub gpu: Option<ResourceValue>,
    pub ephemeral_storage: Option<ResourceValue>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cpu(mut self, cpu: impl Into<ResourceValue>) -> Self {
        self.cpu = Some(cpu.into());
        self
    }

    #[must_use]
    pub fn with_mem(mut self, mem: impl Into<ResourceValue>) -> Self {
        self.mem = Some(mem.into());
        self
    }

    #[must_use]
    pub fn with_gpu(mut self, gpu: impl Into<ResourceValue>) -> Self {
        self.gpu = Some(gpu.into());
        self
    }

    #[must_use]
    pub fn with_ephemeral_storage(mut self, storage: impl Into<ResourceValue>) -> Self {
        self.ephemeral_storage = Some(storage.into());
        self
    }

    fn fields(&self) -> [(ResourceName, Option<&ResourceValue>); 4] {
        [
            (ResourceName::Cpu, self.cpu.as_ref()),
            (ResourceName::Memory, self.mem.as_ref()),
            (ResourceName::Gpu, self.gpu.as_ref()),
            (ResourceName::EphemeralStorage, self.ephemeral_storage.as_ref()),
        ]
    }

    /// Flattens single quantities into entries for `requests` or `limits`.
    pub(crate) fn to_entries(&self, location: &str) -> GraphResult<Vec<ResourceEntry>> {
        let mut entries = Vec::new();
        for (name, value) in self.fields() {
            match value {
                None => {}
                Some(ResourceValue::Single(quantity)) => {
                    let quantity = quantity.clone().assert_not_promise(location)?;
                    entries.push(ResourceEntry::new(name, quantity));
                }
                Some(ResourceValue::Bounded(..)) => {
                    return Err(GraphError::invalid_value(format!(
                        "{location} takes single quantities; a (request, limit) pair for {name} \
                         is only accepted in resources"
                    )));
                }
            }
        }
        Ok(entries)
    }

    /// Splits quantities into requests and limits.
    ///
    /// A single quantity is a request; a pair contributes to both sides.
    pub(crate) fn split(&self) -> GraphResult<ResourceRequirements> {
        let mut requirements = ResourceRequirements::default();
        for (name, value) in self.fields() {
            match value {
                None => {}
                Some(ResourceValue::Single(request)) => {
                    let request = request.clone().assert_not_promise("resources.requests")?;
                    requirements.requests.push(ResourceEntry::new(name, request));
                }
                Some(ResourceValue::Bounded(request, limit)) => {
                    let request = request.clone().assert_not_promise("resources.requests")?;
                    let limit = limit.clone().assert_not_promise("resources.limits")?;
                    requirements.requests.push(ResourceEntry::new(name, request));
                    requirements.limits.push(ResourceEntry::new(name, limit));
                }
            }
        }
        Ok(requirements)
    }
}

/// A GPU device, optionally partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accelerator {
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_size: Option<String>,
}

impl Accelerator {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            partition_size: None,
        }
    }

    #[must_use]
    pub fn with_partition_size(mut self, size: impl Into<String>) -> Self {
        self.partition_size = Some(size.into());
        self
    }
}

/// Shared memory mounted into the task container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedMemory {
    /// Sized by the platform.
    Default,
    /// An explicit quantity such as `128Mi`.
    Size(String),
}

impl From<&str> for SharedMemory {
    fn from(size: &str) -> Self {
        Self::Size(size.to_owned())
    }
}

impl_param_from!(Accelerator, SharedMemory);

/// Resources beyond CPU and memory quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_accelerator: Option<Accelerator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_memory: Option<SharedMemory>,
}

impl ExtendedResources {
    pub fn is_empty(&self) -> bool {
        self.gpu_accelerator.is_none() && self.shared_memory.is_none()
    }
}
