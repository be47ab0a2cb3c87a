//! Object encoding and decoding.
//!
//! A [`ResourceStore`](crate::store::ResourceStore) never sees typed objects
//! directly: the [`ObjectCodec`] it is constructed with turns them into the
//! dynamic payload stored under `object`, and back.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CodecError;

/// Converts between a typed object and its stored JSON payload.
pub trait ObjectCodec: Send + Sync {
    /// The decoded object type.
    type Object: Send + Sync;

    /// Encodes an object into the payload that is indexed.
    fn encode(&self, object: &Self::Object) -> Result<Value, CodecError>;

    /// Decodes a stored payload.
    fn decode(&self, value: Value) -> Result<Self::Object, CodecError>;
}

/// Identity codec over [`serde_json::Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ObjectCodec for JsonCodec {
    type Object = Value;

    fn encode(&self, object: &Value) -> Result<Value, CodecError> {
        Ok(object.clone())
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }
}

/// Codec for any serde type.
pub struct SerdeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ObjectCodec for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Object = T;

    fn encode(&self, object: &T) -> Result<Value, CodecError> {
        serde_json::to_value(object).map_err(|e| CodecError::Encode {
            message: e.to_string(),
        })
    }

    fn decode(&self, value: Value) -> Result<T, CodecError> {
        Ok(serde_json::from_value(value)?)
    }
}
