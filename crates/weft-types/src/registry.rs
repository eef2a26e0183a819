//! Transformer registry with ordered resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use weft_core::literal::{Literal, LiteralType};
use weft_core::{Error, Result};

use crate::TRACING_TARGET;
use crate::context::TransformContext;
use crate::file::FileTransformer;
use crate::host::{Capability, HostType, HostValue};
use crate::opaque::OpaqueTransformer;
use crate::primitive::PrimitiveTransformer;
use crate::transformer::TypeTransformer;

/// Key a transformer is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// Exact type name, or the name of a generic origin.
    Type(String),
    /// Structural capability.
    Capability(Capability),
}

impl TypeKey {
    pub fn of(host_type: &HostType) -> Self {
        Self::Type(host_type.name().to_owned())
    }
}

impl From<&HostType> for TypeKey {
    fn from(host_type: &HostType) -> Self {
        Self::of(host_type)
    }
}

impl From<HostType> for TypeKey {
    fn from(host_type: HostType) -> Self {
        Self::of(&host_type)
    }
}

impl From<Capability> for TypeKey {
    fn from(capability: Capability) -> Self {
        Self::Capability(capability)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => f.write_str(name),
            Self::Capability(capability) => write!(f, "<{capability}>"),
        }
    }
}

/// Maps host types to transformers.
///
/// Resolution tries, in order: the exact type name, the generic origin,
/// each declared capability, then the opaque fallback. Registries are plain
/// values; populate one before authoring and share it read-only.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    transformers: HashMap<TypeKey, Arc<dyn TypeTransformer>>,
    fallback: Arc<dyn TypeTransformer>,
}

impl TypeRegistry {
    /// An empty registry with only the opaque fallback.
    pub fn new() -> Self {
        Self {
            transformers: HashMap::new(),
            fallback: Arc::new(OpaqueTransformer::new()),
        }
    }

    /// A registry with the file and primitive transformers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            Arc::new(FileTransformer::new()),
            [
                TypeKey::of(&HostType::file()),
                TypeKey::of(&HostType::path_like()),
                TypeKey::Capability(Capability::PathLike),
            ],
        );
        for primitive in PrimitiveTransformer::defaults() {
            let key = TypeKey::of(primitive.host_type());
            registry.register(Arc::new(primitive), [key]);
        }
        registry
    }

    /// Registers `transformer` under every key, replacing earlier entries.
    pub fn register<I>(&mut self, transformer: Arc<dyn TypeTransformer>, keys: I)
    where
        I: IntoIterator<Item = TypeKey>,
    {
        for key in keys {
            if let Some(previous) = self.transformers.insert(key.clone(), transformer.clone()) {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %key,
                    previous = previous.name(),
                    transformer = transformer.name(),
                    "Replaced registered transformer"
                );
            }
        }
    }

    /// Registers `transformer` under every key, failing without changes if
    /// any key is already taken.
    pub fn register_unique<I>(&mut self, transformer: Arc<dyn TypeTransformer>, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let keys: Vec<TypeKey> = keys.into_iter().collect();
        if let Some(key) = keys.iter().find(|key| self.transformers.contains_key(key)) {
            return Err(Error::configuration().with_message(format!(
                "a transformer for `{key}` is already registered"
            )));
        }
        self.register(transformer, keys);
        Ok(())
    }

    /// Resolves the transformer for `host_type`; never fails.
    pub fn get_transformer(&self, host_type: &HostType) -> &Arc<dyn TypeTransformer> {
        let exact = TypeKey::of(host_type);
        if let Some(transformer) = self.transformers.get(&exact) {
            return transformer;
        }
        if let Some(origin) = host_type.origin() {
            if let Some(transformer) = self.transformers.get(&TypeKey::Type(origin.to_owned())) {
                return transformer;
            }
        }
        for capability in host_type.capabilities() {
            if let Some(transformer) = self.transformers.get(&TypeKey::Capability(*capability)) {
                return transformer;
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            host_type = %host_type,
            "No transformer registered, using the opaque fallback"
        );
        &self.fallback
    }

    pub fn get_literal_type(&self, host_type: &HostType) -> Result<LiteralType> {
        self.get_transformer(host_type).get_literal_type(host_type)
    }

    /// Converts `value` and checks the literal against the declared type.
    pub async fn to_literal(
        &self,
        ctx: &TransformContext,
        value: &HostValue,
        host_type: &HostType,
    ) -> Result<Literal> {
        let transformer = self.get_transformer(host_type);
        let expected = transformer.get_literal_type(host_type)?;
        let literal = transformer.to_literal(ctx, value, host_type, &expected).await?;
        if !expected.accepts(&literal) {
            return Err(Error::type_mismatch().with_message(format!(
                "transformer `{}` produced a {} literal that does not match {expected:?}",
                transformer.name(),
                literal.tag_name()
            )));
        }
        Ok(literal)
    }

    pub async fn to_host_value(
        &self,
        ctx: &TransformContext,
        literal: &Literal,
        expected: &HostType,
    ) -> Result<HostValue> {
        self.get_transformer(expected)
            .to_host_value(ctx, literal, expected)
            .await
    }

    /// Reverse lookup; exactly one transformer must claim `literal_type`.
    pub fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType> {
        let mut seen: Vec<*const ()> = Vec::new();
        let mut claims: Vec<(&str, HostType)> = Vec::new();

        let candidates = self.transformers.values().chain(std::iter::once(&self.fallback));
        for transformer in candidates {
            let ptr = Arc::as_ptr(transformer) as *const ();
            if seen.contains(&ptr) {
                continue;
            }
            seen.push(ptr);
            if let Ok(host_type) = transformer.guess_host_type(literal_type) {
                claims.push((transformer.name(), host_type));
            }
        }

        match claims.len() {
            0 => Err(Error::lookup().with_message(format!(
                "no transformer can reverse {literal_type:?}"
            ))),
            1 => Ok(claims.remove(0).1),
            _ => {
                let mut names: Vec<&str> = claims.iter().map(|(name, _)| *name).collect();
                names.sort_unstable();
                Err(Error::lookup().with_message(format!(
                    "ambiguous reverse lookup for {literal_type:?}: claimed by {}",
                    names.join(", ")
                )))
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use weft_core::ErrorKind;
    use weft_core::literal::{BlobDimensionality, SimpleType};

    use super::*;
    use crate::opaque::OPAQUE_FORMAT;
    use crate::testing::{TestBed, write_file};

    /// Claims every blob type, to provoke ambiguity.
    #[derive(Debug)]
    struct GreedyBlob;

    #[async_trait]
    impl TypeTransformer for GreedyBlob {
        fn name(&self) -> &str {
            "greedy"
        }

        fn get_literal_type(&self, _host_type: &HostType) -> Result<LiteralType> {
            Ok(LiteralType::blob("", BlobDimensionality::Single))
        }

        async fn to_literal(
            &self,
            _ctx: &TransformContext,
            _value: &HostValue,
            _host_type: &HostType,
            _expected: &LiteralType,
        ) -> Result<Literal> {
            Ok(Literal::primitive(1_i64))
        }

        async fn to_host_value(
            &self,
            _ctx: &TransformContext,
            _literal: &Literal,
            _expected: &HostType,
        ) -> Result<HostValue> {
            Ok(HostValue::None)
        }

        fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType> {
            literal_type
                .as_blob()
                .map(|_| HostType::new("Greedy"))
                .ok_or_else(Error::lookup)
        }
    }

    #[test]
    fn resolution_order() {
        let registry = TypeRegistry::with_defaults();

        assert_eq!(registry.get_transformer(&HostType::of::<i64>()).name(), "INTEGER");
        assert_eq!(
            registry
                .get_transformer(&HostType::file_with_extension("csv"))
                .name(),
            "file"
        );
        assert_eq!(registry.get_transformer(&HostType::path()).name(), "file");
        assert_eq!(
            registry.get_transformer(&HostType::new("my::Model")).name(),
            "opaque"
        );
    }

    #[test]
    fn exact_registration_beats_origin() {
        let mut registry = TypeRegistry::with_defaults();
        let csv = HostType::file_with_extension("csv");
        registry.register(Arc::new(GreedyBlob), [TypeKey::of(&csv)]);

        assert_eq!(registry.get_transformer(&csv).name(), "greedy");
        assert_eq!(
            registry
                .get_transformer(&HostType::file_with_extension("json"))
                .name(),
            "file"
        );
    }

    #[test]
    fn unique_registration_rejects_duplicates() {
        let mut registry = TypeRegistry::with_defaults();
        let err = registry
            .register_unique(
                Arc::new(GreedyBlob),
                [TypeKey::of(&HostType::new("Fresh")), TypeKey::of(&HostType::file())],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            registry.get_transformer(&HostType::new("Fresh")).name(),
            "opaque"
        );

        registry
            .register_unique(Arc::new(GreedyBlob), [TypeKey::of(&HostType::new("Fresh"))])
            .unwrap();
        assert_eq!(registry.get_transformer(&HostType::new("Fresh")).name(), "greedy");
    }

    #[test]
    fn guess_host_type_is_unique_or_fails() {
        let mut registry = TypeRegistry::with_defaults();

        let csv = LiteralType::blob("csv", BlobDimensionality::Single);
        assert_eq!(
            registry.guess_host_type(&csv).unwrap(),
            HostType::file_with_extension("csv")
        );
        let opaque = LiteralType::blob(OPAQUE_FORMAT, BlobDimensionality::Single);
        assert_eq!(registry.guess_host_type(&opaque).unwrap(), HostType::opaque());
        assert_eq!(
            registry
                .guess_host_type(&LiteralType::simple(SimpleType::Boolean))
                .unwrap(),
            HostType::of::<bool>()
        );

        let multipart = LiteralType::blob("csv", BlobDimensionality::Multipart);
        assert_eq!(
            registry.guess_host_type(&multipart).unwrap_err().kind(),
            ErrorKind::Lookup
        );

        registry.register(Arc::new(GreedyBlob), [TypeKey::of(&HostType::new("Greedy"))]);
        let err = registry.guess_host_type(&csv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(err.message.unwrap().contains("file, greedy"));
    }

    #[tokio::test]
    async fn unregistered_types_fall_back_to_opaque() {
        let bed = TestBed::new();
        let registry = TypeRegistry::with_defaults();
        let host_type = HostType::new("my::Config");

        let literal = registry
            .to_literal(&bed.ctx, &HostValue::Str("payload".into()), &host_type)
            .await
            .unwrap();
        assert_eq!(literal.as_blob().unwrap().blob_type().format, OPAQUE_FORMAT);

        let back = registry
            .to_host_value(&bed.ctx, &literal, &host_type)
            .await
            .unwrap();
        assert_eq!(back.as_opaque().unwrap().decode::<String>().unwrap(), "payload");
    }

    #[tokio::test]
    async fn literal_must_match_declared_type() {
        let bed = TestBed::new();
        let mut registry = TypeRegistry::new();
        let host_type = HostType::new("Liar");
        registry.register(Arc::new(GreedyBlob), [TypeKey::of(&host_type)]);

        let err = registry
            .to_literal(&bed.ctx, &HostValue::Int(1), &host_type)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[tokio::test]
    async fn file_values_round_trip_through_the_registry() {
        let bed = TestBed::new();
        let registry = TypeRegistry::with_defaults();
        let path = write_file(bed.dir.path(), "data.csv", b"id\n1\n");
        let csv = HostType::file_with_extension("csv");

        let literal = registry
            .to_literal(&bed.ctx, &HostValue::Path(path), &csv)
            .await
            .unwrap();
        assert_eq!(bed.access.put_count(), 1);

        let value = registry
            .to_host_value(&bed.ctx, &literal, &csv)
            .await
            .unwrap()
            .into_file()
            .unwrap();
        assert_eq!(bed.access.get_count(), 0);
        let local = value.download().await.unwrap();
        assert_eq!(tokio::fs::read(local).await.unwrap(), b"id\n1\n");
        assert_eq!(bed.access.get_count(), 1);
    }
}
