//! Deferred node outputs and the static-value guard.

use std::fmt;

use crate::error::{GraphError, GraphResult};
use crate::node::NodeHandle;

/// An output of another node, only known once that node has run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Promise {
    node: NodeHandle,
    var: String,
}

impl Promise {
    pub fn new(node: NodeHandle, var: impl Into<String>) -> Self {
        Self {
            node,
            var: var.into(),
        }
    }

    /// The producing node.
    #[inline]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// The output variable name.
    #[inline]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl fmt::Display for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise({}.{})", self.node, self.var)
    }
}

/// A value that is either known now or promised by another node.
///
/// Static node configuration only ever accepts the former; see
/// [`Param::assert_not_promise`].
#[derive(Debug, Clone, PartialEq)]
pub enum Param<T> {
    Value(T),
    Promise(Promise),
}

impl<T> Param<T> {
    /// Returns the static value, failing with an assertion error for
    /// promises. `location` names the configuration field in the message.
    pub fn assert_not_promise(self, location: &str) -> GraphResult<T> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Promise(promise) => Err(GraphError::assertion(format!(
                "cannot use a promise in the {location} value: {promise}"
            ))),
        }
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, Self::Promise(_))
    }
}

impl<T> From<Promise> for Param<T> {
    fn from(promise: Promise) -> Self {
        Self::Promise(promise)
    }
}

macro_rules! impl_param_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for $crate::promise::Param<$ty> {
                fn from(value: $ty) -> Self {
                    Self::Value(value)
                }
            }
        )*
    };
}

pub(crate) use impl_param_from;

impl_param_from!(bool, u32, String);

impl From<&str> for Param<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_owned())
    }
}
