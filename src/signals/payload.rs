/*!
 * Signal Payload
 * Tagged value passed from emitter to every slot
 */

use crate::core::errors::{BusError, BusResult};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Opaque shared reference carried by pointer payloads and slot contexts
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// Payload discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadType {
    Void,
    Int,
    Float,
    Double,
    String,
    Pointer,
    Custom,
}

/// Value delivered with an emission
///
/// Borrowed variants let synchronous emission avoid copying; buffering
/// collaborators call [`Payload::into_owned`] to keep a value past the call.
/// A custom blob's destructor is its `Drop`.
#[derive(Clone, Default)]
pub enum Payload<'a> {
    #[default]
    Void,
    Int(i32),
    Float(f32),
    Double(f64),
    Str(Option<Cow<'a, str>>),
    Pointer(Option<Opaque>),
    Custom(Cow<'a, [u8]>),
}

impl<'a> Payload<'a> {
    pub fn string(value: &'a str) -> Self {
        Payload::Str(Some(Cow::Borrowed(value)))
    }

    pub fn custom(bytes: &'a [u8]) -> Self {
        Payload::Custom(Cow::Borrowed(bytes))
    }

    pub fn pointer<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Payload::Pointer(Some(value))
    }

    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::Void => PayloadType::Void,
            Payload::Int(_) => PayloadType::Int,
            Payload::Float(_) => PayloadType::Float,
            Payload::Double(_) => PayloadType::Double,
            Payload::Str(_) => PayloadType::String,
            Payload::Pointer(_) => PayloadType::Pointer,
            Payload::Custom(_) => PayloadType::Custom,
        }
    }

    /// Integer value, or `default` if the payload holds anything else
    #[inline]
    pub fn int_or(&self, default: i32) -> i32 {
        match self {
            Payload::Int(value) => *value,
            _ => default,
        }
    }

    #[inline]
    pub fn float_or(&self, default: f32) -> f32 {
        match self {
            Payload::Float(value) => *value,
            _ => default,
        }
    }

    #[inline]
    pub fn double_or(&self, default: f64) -> f64 {
        match self {
            Payload::Double(value) => *value,
            _ => default,
        }
    }

    pub fn try_int(&self) -> BusResult<i32> {
        match self {
            Payload::Int(value) => Ok(*value),
            other => Err(other.mismatch(PayloadType::Int)),
        }
    }

    pub fn try_float(&self) -> BusResult<f32> {
        match self {
            Payload::Float(value) => Ok(*value),
            other => Err(other.mismatch(PayloadType::Float)),
        }
    }

    pub fn try_double(&self) -> BusResult<f64> {
        match self {
            Payload::Double(value) => Ok(*value),
            other => Err(other.mismatch(PayloadType::Double)),
        }
    }

    /// String value; `None` for a null string or a non-string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(Some(value)) => Some(value.as_ref()),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Opaque> {
        match self {
            Payload::Pointer(Some(value)) => Some(value),
            _ => None,
        }
    }

    /// Pointer payload viewed as `T`
    pub fn downcast_pointer<T: Any>(&self) -> Option<&T> {
        self.as_pointer()?.downcast_ref::<T>()
    }

    /// Blob bytes; the size is the slice length
    pub fn as_custom(&self) -> Option<&[u8]> {
        match self {
            Payload::Custom(bytes) => Some(bytes.as_ref()),
            _ => None,
        }
    }

    /// Detach from borrowed data so the payload can outlive the emitting call
    pub fn into_owned(self) -> Payload<'static> {
        match self {
            Payload::Void => Payload::Void,
            Payload::Int(value) => Payload::Int(value),
            Payload::Float(value) => Payload::Float(value),
            Payload::Double(value) => Payload::Double(value),
            Payload::Str(value) => Payload::Str(value.map(|s| Cow::Owned(s.into_owned()))),
            Payload::Pointer(value) => Payload::Pointer(value),
            Payload::Custom(bytes) => Payload::Custom(Cow::Owned(bytes.into_owned())),
        }
    }

    fn mismatch(&self, expected: PayloadType) -> BusError {
        BusError::InvalidPayloadType {
            expected,
            found: self.payload_type(),
        }
    }
}

impl From<i32> for Payload<'_> {
    fn from(value: i32) -> Self {
        Payload::Int(value)
    }
}

impl From<f32> for Payload<'_> {
    fn from(value: f32) -> Self {
        Payload::Float(value)
    }
}

impl From<f64> for Payload<'_> {
    fn from(value: f64) -> Self {
        Payload::Double(value)
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(value: &'a str) -> Self {
        Payload::string(value)
    }
}

impl From<String> for Payload<'_> {
    fn from(value: String) -> Self {
        Payload::Str(Some(Cow::Owned(value)))
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Void => f.write_str("Void"),
            Payload::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Payload::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Payload::Double(value) => f.debug_tuple("Double").field(value).finish(),
            Payload::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Payload::Pointer(value) => f
                .debug_tuple("Pointer")
                .field(&value.as_ref().map(Arc::as_ptr))
                .finish(),
            Payload::Custom(bytes) => f.debug_struct("Custom").field("size", &bytes.len()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trip() {
        let payload = Payload::Int(42);
        assert_eq!(payload.int_or(0), 42);
        assert_eq!(payload.try_int().unwrap(), 42);
    }

    #[test]
    fn test_mismatch_returns_default() {
        let payload = Payload::Int(42);
        assert_eq!(payload.float_or(1.5), 1.5);
        assert_eq!(payload.double_or(-1.0), -1.0);
        assert_eq!(payload.as_str(), None);
    }

    #[test]
    fn test_try_mismatch_error() {
        let err = Payload::Double(2.0).try_int().unwrap_err();
        assert_eq!(
            err,
            BusError::InvalidPayloadType {
                expected: PayloadType::Int,
                found: PayloadType::Double,
            }
        );
    }

    #[test]
    fn test_try_float_and_double() {
        assert_eq!(Payload::Float(1.5).try_float(), Ok(1.5));
        assert_eq!(Payload::Double(2.25).try_double(), Ok(2.25));

        assert_eq!(
            Payload::Int(3).try_float().unwrap_err(),
            BusError::InvalidPayloadType {
                expected: PayloadType::Float,
                found: PayloadType::Int,
            }
        );
        assert_eq!(
            Payload::Float(1.5).try_double().unwrap_err(),
            BusError::InvalidPayloadType {
                expected: PayloadType::Double,
                found: PayloadType::Float,
            }
        );
    }

    #[test]
    fn test_null_string() {
        let payload = Payload::Str(None);
        assert_eq!(payload.payload_type(), PayloadType::String);
        assert_eq!(payload.as_str(), None);
    }

    #[test]
    fn test_pointer_downcast() {
        let payload = Payload::pointer(Arc::new(7u64));
        assert_eq!(payload.downcast_pointer::<u64>(), Some(&7));
        assert_eq!(payload.downcast_pointer::<u32>(), None);
    }

    #[test]
    fn test_into_owned_detaches() {
        let text = String::from("hello");
        let owned = Payload::string(&text).into_owned();
        drop(text);
        assert_eq!(owned.as_str(), Some("hello"));
        assert!(matches!(owned, Payload::Str(Some(Cow::Owned(_)))));

        let blob = Payload::custom(&[1, 2, 3]).into_owned();
        assert_eq!(blob.as_custom(), Some(&[1u8, 2, 3][..]));
    }
}
