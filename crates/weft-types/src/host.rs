//! Host-side type descriptors and values.

use std::fmt;
use std::path::PathBuf;

use derive_more::From;
use jiff::{SignedDuration, Timestamp};
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{AsRefStr, Display, EnumString};
use weft_core::{Error, Result};

use crate::file::FileValue;

/// Type name shared by every file type, parameterized or not.
pub const FILE_TYPE: &str = "File";

/// Type name of the untyped path-like capability.
pub const PATH_LIKE_TYPE: &str = "PathLike";

/// Type name of the opaque placeholder returned by reverse lookups.
pub const OPAQUE_TYPE: &str = "Opaque";

/// Structural capabilities a host type may declare.
///
/// The registry falls back to capability keys when neither the exact type
/// nor its generic origin has a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Anything that can be interpreted as a filesystem path.
    PathLike,
}

/// Describes a host type the registry can resolve a transformer for.
///
/// `name` is the exact key. Parameterized types also carry the `origin`
/// they were instantiated from and their parameters, e.g. `File[csv]` has
/// origin `File` and parameter `csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostType {
    name: String,
    origin: Option<String>,
    params: Vec<String>,
    capabilities: Vec<Capability>,
}

impl HostType {
    /// Creates a plain host type with the given exact name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            params: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Host type named after the Rust type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Instantiates the generic `origin` with `params`.
    pub fn generic<I, S>(origin: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origin = origin.into();
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        Self {
            name: format!("{}[{}]", origin, params.join(", ")),
            origin: Some(origin),
            params,
            capabilities: Vec::new(),
        }
    }

    /// The untyped file type.
    pub fn file() -> Self {
        Self::new(FILE_TYPE)
    }

    /// A file type fixed to `extension`; an empty extension is untyped.
    pub fn file_with_extension(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        if extension.is_empty() {
            return Self::file();
        }
        Self::generic(FILE_TYPE, [extension])
    }

    /// The untyped path-like capability type.
    pub fn path_like() -> Self {
        Self::new(PATH_LIKE_TYPE).with_capability(Capability::PathLike)
    }

    /// [`PathBuf`], which is path-like.
    pub fn path() -> Self {
        Self::of::<PathBuf>().with_capability(Capability::PathLike)
    }

    /// Placeholder for values stored with the opaque codec.
    pub fn opaque() -> Self {
        Self::new(OPAQUE_TYPE)
    }

    /// Declares a structural capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Returns `true` for `File` and every `File[..]` instantiation.
    pub fn is_file(&self) -> bool {
        self.name == FILE_TYPE || self.origin.as_deref() == Some(FILE_TYPE)
    }

    /// Extension fixed by a file type, empty when untyped.
    pub fn file_extension(&self) -> &str {
        match self.origin.as_deref() {
            Some(FILE_TYPE) => self.params.first().map(String::as_str).unwrap_or_default(),
            _ => "",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A value encoded with the opaque codec, tagged with its host type name.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueObject {
    pub type_name: String,
    pub value: ciborium::Value,
}

impl OpaqueObject {
    /// Captures `value` in the codec's data model.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        let value = ciborium::Value::serialized(value).map_err(|err| {
            Error::serialization()
                .with_message(format!("cannot encode {}: {err}", std::any::type_name::<T>()))
        })?;
        Ok(Self {
            type_name: std::any::type_name::<T>().to_owned(),
            value,
        })
    }

    /// Rebuilds a typed value from the captured data.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.value.deserialized().map_err(|err| {
            Error::serialization().with_message(format!(
                "cannot decode {} as {}: {err}",
                self.type_name,
                std::any::type_name::<T>()
            ))
        })
    }
}

/// A value on the host side of the marshalling boundary.
#[derive(Debug, Clone, PartialEq, From)]
pub enum HostValue {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Datetime(Timestamp),
    Duration(SignedDuration),
    /// A structured local path.
    Path(PathBuf),
    File(FileValue),
    Opaque(OpaqueObject),
}

impl HostValue {
    /// Short description of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "str",
            Self::Datetime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Path(_) => "path",
            Self::File(_) => "file",
            Self::Opaque(_) => "opaque",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_file(&self) -> Option<&FileValue> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn into_file(self) -> Option<FileValue> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueObject> {
        match self {
            Self::Opaque(object) => Some(object),
            _ => None,
        }
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Model {
        name: String,
        weights: Vec<f32>,
    }

    #[test]
    fn file_types_carry_origin_and_extension() {
        let csv = HostType::file_with_extension("csv");
        assert_eq!(csv.name(), "File[csv]");
        assert_eq!(csv.origin(), Some(FILE_TYPE));
        assert_eq!(csv.file_extension(), "csv");
        assert!(csv.is_file());

        assert_eq!(HostType::file_with_extension(""), HostType::file());
        assert_eq!(HostType::file().file_extension(), "");
        assert!(!HostType::path_like().is_file());
    }

    #[test]
    fn capabilities_are_deduplicated() {
        let ty = HostType::path_like().with_capability(Capability::PathLike);
        assert_eq!(ty.capabilities(), &[Capability::PathLike]);
        assert!(HostType::path().has_capability(Capability::PathLike));
        assert_eq!(Capability::PathLike.as_ref(), "path_like");
    }

    #[test]
    fn opaque_object_round_trip() {
        let model = Model {
            name: "resnet".into(),
            weights: vec![0.5, 1.5],
        };
        let object = OpaqueObject::encode(&model).unwrap();
        assert!(object.type_name.ends_with("Model"));
        assert_eq!(object.decode::<Model>().unwrap(), model);
        assert!(object.decode::<u8>().is_err());
    }

    #[test]
    fn host_value_conversions() {
        assert_eq!(HostValue::from(3_i64), HostValue::Int(3));
        assert_eq!(HostValue::from("x"), HostValue::Str("x".into()));
        assert_eq!(HostValue::from(PathBuf::from("/a")).kind_name(), "path");
        assert!(HostValue::None.is_none());
    }
}
