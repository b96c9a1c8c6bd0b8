//! Typed mapping of APNs error-response status bytes.

use serde::{Deserialize, Serialize};

/// Status byte carried by an APNs error-response frame (`0x08 status identifier`).
///
/// The reference implementation never names these; the mapping below is the
/// one Apple's legacy binary provider API documentation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum ApnsStatus {
    NoErrors,
    Processing,
    MissingDeviceToken,
    MissingTopic,
    MissingPayload,
    InvalidTokenSize,
    InvalidTopicSize,
    InvalidPayloadSize,
    InvalidToken,
    Shutdown,
    /// Any status byte not covered by the documented table above (includes
    /// the reference's undocumented "None" code 255).
    Unknown(u8),
}

impl From<u8> for ApnsStatus {
    fn from(byte: u8) -> Self {
        match byte {
            0 => ApnsStatus::NoErrors,
            1 => ApnsStatus::Processing,
            2 => ApnsStatus::MissingDeviceToken,
            3 => ApnsStatus::MissingTopic,
            4 => ApnsStatus::MissingPayload,
            5 => ApnsStatus::InvalidTokenSize,
            6 => ApnsStatus::InvalidTopicSize,
            7 => ApnsStatus::InvalidPayloadSize,
            8 => ApnsStatus::InvalidToken,
            10 => ApnsStatus::Shutdown,
            other => ApnsStatus::Unknown(other),
        }
    }
}

impl From<ApnsStatus> for u8 {
    fn from(status: ApnsStatus) -> Self {
        match status {
            ApnsStatus::NoErrors => 0,
            ApnsStatus::Processing => 1,
            ApnsStatus::MissingDeviceToken => 2,
            ApnsStatus::MissingTopic => 3,
            ApnsStatus::MissingPayload => 4,
            ApnsStatus::InvalidTokenSize => 5,
            ApnsStatus::InvalidTopicSize => 6,
            ApnsStatus::InvalidPayloadSize => 7,
            ApnsStatus::InvalidToken => 8,
            ApnsStatus::Shutdown => 10,
            ApnsStatus::Unknown(byte) => byte,
        }
    }
}

/// The payload delivered to a registered response listener when APNs reports
/// a terminal failure for a previously sent notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: ApnsStatus,
    pub identifier: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for (byte, status) in [
            (0u8, ApnsStatus::NoErrors),
            (1, ApnsStatus::Processing),
            (2, ApnsStatus::MissingDeviceToken),
            (3, ApnsStatus::MissingTopic),
            (4, ApnsStatus::MissingPayload),
            (5, ApnsStatus::InvalidTokenSize),
            (6, ApnsStatus::InvalidTopicSize),
            (7, ApnsStatus::InvalidPayloadSize),
            (8, ApnsStatus::InvalidToken),
            (10, ApnsStatus::Shutdown),
        ] {
            assert_eq!(ApnsStatus::from(byte), status);
            assert_eq!(u8::from(status), byte);
        }
    }

    #[test]
    fn unknown_code_falls_through() {
        assert_eq!(ApnsStatus::from(255), ApnsStatus::Unknown(255));
        assert_eq!(u8::from(ApnsStatus::Unknown(255)), 255);
    }
}
