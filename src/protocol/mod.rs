//! The legacy APNs binary wire protocol: constants, primitive codec, the
//! JSON payload, and the Command 0/1/2 notification encoders.

pub mod codec;
pub mod constants;
pub mod frame;
pub mod payload;

pub use constants::*;
pub use frame::{encode_enhanced, encode_legacy, Frame, Notification};
pub use payload::{Alert, Payload, PayloadBuilder, StructuredAlert};
