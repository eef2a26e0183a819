//! Transformers for scalar host types.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use weft_core::literal::{Literal, LiteralType, LiteralTypeKind, Primitive, Scalar, SimpleType};
use weft_core::{Error, Result};

use crate::context::TransformContext;
use crate::host::{HostType, HostValue};
use crate::transformer::TypeTransformer;

/// Maps one scalar host type onto one simple literal type.
#[derive(Debug, Clone)]
pub struct PrimitiveTransformer {
    simple: SimpleType,
    host_type: HostType,
}

impl PrimitiveTransformer {
    pub fn new(simple: SimpleType, host_type: HostType) -> Self {
        Self { simple, host_type }
    }

    /// Transformers for `()`, `i64`, `f64`, `String`, `bool`, timestamps
    /// and signed durations.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(SimpleType::None, HostType::of::<()>()),
            Self::new(SimpleType::Integer, HostType::of::<i64>()),
            Self::new(SimpleType::Float, HostType::of::<f64>()),
            Self::new(SimpleType::String, HostType::of::<String>()),
            Self::new(SimpleType::Boolean, HostType::of::<bool>()),
            Self::new(SimpleType::Datetime, HostType::of::<Timestamp>()),
            Self::new(SimpleType::Duration, HostType::of::<SignedDuration>()),
        ]
    }

    /// The host type this transformer serves.
    pub fn host_type(&self) -> &HostType {
        &self.host_type
    }

    fn mismatch(&self, found: &str) -> Error {
        Error::type_mismatch().with_message(format!(
            "expected a {} value for {}, found {found}",
            self.simple, self.host_type
        ))
    }
}

#[async_trait]
impl TypeTransformer for PrimitiveTransformer {
    fn name(&self) -> &str {
        self.simple.as_ref()
    }

    fn get_literal_type(&self, _host_type: &HostType) -> Result<LiteralType> {
        Ok(LiteralType::simple(self.simple))
    }

    async fn to_literal(
        &self,
        _ctx: &TransformContext,
        value: &HostValue,
        _host_type: &HostType,
        _expected: &LiteralType,
    ) -> Result<Literal> {
        let literal = match (self.simple, value) {
            (SimpleType::None, HostValue::None) => Literal::none(),
            (SimpleType::Integer, HostValue::Int(v)) => Literal::primitive(*v),
            (SimpleType::Float, HostValue::Float(v)) => Literal::primitive(*v),
            (SimpleType::String, HostValue::Str(v)) => Literal::primitive(v.clone()),
            (SimpleType::Boolean, HostValue::Bool(v)) => Literal::primitive(*v),
            (SimpleType::Datetime, HostValue::Datetime(v)) => Literal::primitive(*v),
            (SimpleType::Duration, HostValue::Duration(v)) => Literal::primitive(*v),
            (_, other) => return Err(self.mismatch(other.kind_name())),
        };
        Ok(literal)
    }

    async fn to_host_value(
        &self,
        _ctx: &TransformContext,
        literal: &Literal,
        _expected: &HostType,
    ) -> Result<HostValue> {
        let value = match (self.simple, literal.as_scalar()) {
            (SimpleType::None, Some(Scalar::NoneType(_))) => HostValue::None,
            (_, Some(Scalar::Primitive(primitive))) => match (self.simple, primitive) {
                (SimpleType::Integer, Primitive::Integer(v)) => HostValue::Int(*v),
                (SimpleType::Float, Primitive::FloatValue(v)) => HostValue::Float(*v),
                (SimpleType::String, Primitive::StringValue(v)) => HostValue::Str(v.clone()),
                (SimpleType::Boolean, Primitive::Boolean(v)) => HostValue::Bool(*v),
                (SimpleType::Datetime, Primitive::Datetime(v)) => HostValue::Datetime(*v),
                (SimpleType::Duration, Primitive::Duration(v)) => HostValue::Duration(*v),
                _ => return Err(self.mismatch(literal.tag_name())),
            },
            _ => return Err(self.mismatch(literal.tag_name())),
        };
        Ok(value)
    }

    fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType> {
        match literal_type.kind {
            LiteralTypeKind::Simple(simple) if simple == self.simple => Ok(self.host_type.clone()),
            _ => Err(Error::lookup().with_message(format!(
                "transformer `{}` cannot reverse {literal_type:?}",
                self.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use weft_core::ErrorKind;

    use super::*;
    use crate::testing::TestBed;

    #[tokio::test]
    async fn integer_round_trip() {
        let bed = TestBed::new();
        let transformer = PrimitiveTransformer::new(SimpleType::Integer, HostType::of::<i64>());
        let host_type = HostType::of::<i64>();
        let expected = transformer.get_literal_type(&host_type).unwrap();

        let literal = transformer
            .to_literal(&bed.ctx, &HostValue::Int(5), &host_type, &expected)
            .await
            .unwrap();
        assert!(expected.accepts(&literal));
        let back = transformer
            .to_host_value(&bed.ctx, &literal, &host_type)
            .await
            .unwrap();
        assert_eq!(back, HostValue::Int(5));
    }

    #[tokio::test]
    async fn mismatched_values_are_type_errors() {
        let bed = TestBed::new();
        let transformer = PrimitiveTransformer::new(SimpleType::Boolean, HostType::of::<bool>());
        let host_type = HostType::of::<bool>();
        let expected = transformer.get_literal_type(&host_type).unwrap();

        let err = transformer
            .to_literal(&bed.ctx, &HostValue::Str("yes".into()), &host_type, &expected)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = transformer
            .to_host_value(&bed.ctx, &Literal::primitive(1_i64), &host_type)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn guesses_its_own_simple_type_only() {
        let transformer = PrimitiveTransformer::new(SimpleType::Float, HostType::of::<f64>());
        assert_eq!(
            transformer
                .guess_host_type(&LiteralType::simple(SimpleType::Float))
                .unwrap(),
            HostType::of::<f64>()
        );
        assert!(
            transformer
                .guess_host_type(&LiteralType::simple(SimpleType::Integer))
                .is_err()
        );
    }
}
