//! File values and their blob transformer.

mod mime;
mod record;
mod transformer;
mod value;

pub use record::{FileRecord, MSGPACK_TAG};
pub use transformer::FileTransformer;
pub use value::{FileValue, RemotePath};
