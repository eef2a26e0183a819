//! The transformer contract.

use std::fmt::Debug;

use async_trait::async_trait;
use weft_core::Result;
use weft_core::literal::{Literal, LiteralType};

use crate::context::TransformContext;
use crate::host::{HostType, HostValue};

/// Converts between one family of host types and literals.
///
/// Implementations must only perform storage I/O inside
/// [`to_literal`](Self::to_literal) and in lazy materializers they attach to
/// returned values; type lookups never touch storage.
#[async_trait]
pub trait TypeTransformer: Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Literal type produced for `host_type`.
    fn get_literal_type(&self, host_type: &HostType) -> Result<LiteralType>;

    /// Converts `value`, declared as `host_type`, into a literal of `expected`.
    async fn to_literal(
        &self,
        ctx: &TransformContext,
        value: &HostValue,
        host_type: &HostType,
        expected: &LiteralType,
    ) -> Result<Literal>;

    /// Converts `literal` back into a host value of `expected`.
    async fn to_host_value(
        &self,
        ctx: &TransformContext,
        literal: &Literal,
        expected: &HostType,
    ) -> Result<HostValue>;

    /// Reverse lookup: the host type this transformer produces for
    /// `literal_type`, or a lookup error if it does not claim it.
    fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType>;
}
