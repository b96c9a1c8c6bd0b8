//! Wire encoding for Command 0 (legacy), Command 1 (enhanced), and
//! Command 2 (frame) notifications.

use crate::protocol::codec::{pack_u16_be, pack_u32_be, pack_u8, set_u32_be};
use crate::protocol::constants::{
    COMMAND_ENHANCED, COMMAND_FRAME, COMMAND_LEGACY, ITEM_TAG_EXPIRY, ITEM_TAG_IDENTIFIER,
    ITEM_TAG_PAYLOAD, ITEM_TAG_PRIORITY, ITEM_TAG_TOKEN,
};
use crate::protocol::payload::Payload;

/// Encode a Command 0 (legacy) notification: `command token_length token payload_length payload`.
pub fn encode_legacy(token: &[u8; 32], payload: &Payload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 2 + 32 + 2 + payload.len());
    pack_u8(&mut buf, COMMAND_LEGACY);
    pack_u16_be(&mut buf, token.len() as u16);
    buf.extend_from_slice(token);
    pack_u16_be(&mut buf, payload.len() as u16);
    buf.extend_from_slice(payload.json());
    buf
}

/// Encode a Command 1 (enhanced) notification:
/// `command identifier expiry token_length token payload_length payload`.
pub fn encode_enhanced(identifier: u32, expiry: u32, token: &[u8; 32], payload: &Payload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 4 + 4 + 2 + 32 + 2 + payload.len());
    pack_u8(&mut buf, COMMAND_ENHANCED);
    pack_u32_be(&mut buf, identifier);
    pack_u32_be(&mut buf, expiry);
    pack_u16_be(&mut buf, token.len() as u16);
    buf.extend_from_slice(token);
    pack_u16_be(&mut buf, payload.len() as u16);
    buf.extend_from_slice(payload.json());
    buf
}

/// One notification queued into a [`Frame`].
#[derive(Debug, Clone)]
pub struct Notification<'a> {
    pub token: [u8; 32],
    pub payload: &'a Payload,
    pub identifier: u32,
    pub expiry: u32,
    pub priority: u8,
}

/// A Command 2 frame: an ordered sequence of notifications plus the
/// serialized Command 2 bytes.
///
/// The reference implementation builds exactly one frame per notification
/// and back-patches that notification's own 4-byte frame-length prefix after
/// writing its items — this type reproduces that quirk faithfully: each
/// `add()` call appends a fully self-contained, independently length-prefixed
/// item group rather than growing one shared length.
#[derive(Debug, Default)]
pub struct Frame<'a> {
    buf: Vec<u8>,
    notifications: Vec<Notification<'a>>,
}

impl<'a> Frame<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one notification as its own length-prefixed item group.
    pub fn add(&mut self, notification: &Notification<'a>) {
        pack_u8(&mut self.buf, COMMAND_FRAME);
        let length_pos = self.buf.len();
        pack_u32_be(&mut self.buf, 0); // placeholder, back-patched below
        let body_start = self.buf.len();

        pack_u8(&mut self.buf, ITEM_TAG_TOKEN);
        pack_u16_be(&mut self.buf, notification.token.len() as u16);
        self.buf.extend_from_slice(&notification.token);

        pack_u8(&mut self.buf, ITEM_TAG_PAYLOAD);
        pack_u16_be(&mut self.buf, notification.payload.len() as u16);
        self.buf.extend_from_slice(notification.payload.json());

        pack_u8(&mut self.buf, ITEM_TAG_IDENTIFIER);
        pack_u16_be(&mut self.buf, 4);
        pack_u32_be(&mut self.buf, notification.identifier);

        pack_u8(&mut self.buf, ITEM_TAG_EXPIRY);
        pack_u16_be(&mut self.buf, 4);
        pack_u32_be(&mut self.buf, notification.expiry);

        pack_u8(&mut self.buf, ITEM_TAG_PRIORITY);
        pack_u16_be(&mut self.buf, 1);
        pack_u8(&mut self.buf, notification.priority);

        let body_len = (self.buf.len() - body_start) as u32;
        set_u32_be(&mut self.buf, length_pos, body_len);
        self.notifications.push(notification.clone());
    }

    /// The encoded bytes ready to write to the gateway socket.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The notifications queued into this frame, in send order. Used by
    /// `GatewayClient` to populate its send-history from the same records
    /// that were encoded onto the wire.
    pub fn items(&self) -> impl Iterator<Item = &Notification<'a>> {
        self.notifications.iter()
    }

    /// Number of notifications queued into this frame.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::Reader;

    fn token() -> [u8; 32] {
        crate::protocol::codec::decode_token_hex(
            "99036da8fa94117c2ac999fdb3fa7275f42cc5fa851e2cccc1ad03937c7ed8d1",
        )
        .unwrap()
    }

    #[test]
    fn legacy_notification_layout() {
        let tok = token();
        let payload = Payload::builder().alert("hi").build().unwrap();
        let buf = encode_legacy(&tok, &payload);

        let mut r = Reader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), COMMAND_LEGACY);
        assert_eq!(r.read_u16_be().unwrap(), 32);
        assert_eq!(r.read_bytes(32).unwrap(), &tok[..]);
        let payload_len = r.read_u16_be().unwrap() as usize;
        assert_eq!(r.read_bytes(payload_len).unwrap(), payload.json());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn enhanced_notification_layout() {
        let tok = token();
        let payload = Payload::builder().badge(3).build().unwrap();
        let buf = encode_enhanced(42, 1_700_000_000, &tok, &payload);

        let mut r = Reader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), COMMAND_ENHANCED);
        assert_eq!(r.read_u32_be().unwrap(), 42);
        assert_eq!(r.read_u32_be().unwrap(), 1_700_000_000);
        assert_eq!(r.read_u16_be().unwrap(), 32);
        assert_eq!(r.read_bytes(32).unwrap(), &tok[..]);
        let payload_len = r.read_u16_be().unwrap() as usize;
        assert_eq!(r.read_bytes(payload_len).unwrap(), payload.json());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn single_item_frame_round_trips() {
        let tok = token();
        let payload = Payload::builder().alert("hi").build().unwrap();
        let notif = Notification {
            token: tok,
            payload: &payload,
            identifier: 7,
            expiry: 0,
            priority: 10,
        };
        let mut frame = Frame::new();
        frame.add(&notif);
        assert_eq!(frame.len(), 1);

        let mut r = Reader::new(frame.bytes());
        assert_eq!(r.read_u8().unwrap(), COMMAND_FRAME);
        let frame_len = r.read_u32_be().unwrap() as usize;
        assert_eq!(frame_len, r.remaining());

        assert_eq!(r.read_u8().unwrap(), ITEM_TAG_TOKEN);
        assert_eq!(r.read_u16_be().unwrap(), 32);
        assert_eq!(r.read_bytes(32).unwrap(), &tok[..]);

        assert_eq!(r.read_u8().unwrap(), ITEM_TAG_PAYLOAD);
        let plen = r.read_u16_be().unwrap() as usize;
        assert_eq!(r.read_bytes(plen).unwrap(), payload.json());

        assert_eq!(r.read_u8().unwrap(), ITEM_TAG_IDENTIFIER);
        assert_eq!(r.read_u16_be().unwrap(), 4);
        assert_eq!(r.read_u32_be().unwrap(), 7);

        assert_eq!(r.read_u8().unwrap(), ITEM_TAG_EXPIRY);
        assert_eq!(r.read_u16_be().unwrap(), 4);
        assert_eq!(r.read_u32_be().unwrap(), 0);

        assert_eq!(r.read_u8().unwrap(), ITEM_TAG_PRIORITY);
        assert_eq!(r.read_u16_be().unwrap(), 1);
        assert_eq!(r.read_u8().unwrap(), 10);

        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn three_item_frame_has_three_independent_length_prefixes() {
        let tok = token();
        let payload = Payload::builder().alert("hi").build().unwrap();
        let mut frame = Frame::new();
        for id in 0..3u32 {
            frame.add(&Notification {
                token: tok,
                payload: &payload,
                identifier: id,
                expiry: 0,
                priority: 10,
            });
        }
        assert_eq!(frame.len(), 3);

        // Walk all three independently-prefixed command-2 groups.
        let mut r = Reader::new(frame.bytes());
        for expected_id in 0..3u32 {
            assert_eq!(r.read_u8().unwrap(), COMMAND_FRAME);
            let frame_len = r.read_u32_be().unwrap() as usize;
            let before = r.remaining();
            assert_eq!(r.read_u8().unwrap(), ITEM_TAG_TOKEN);
            assert_eq!(r.read_u16_be().unwrap(), 32);
            r.read_bytes(32).unwrap();
            assert_eq!(r.read_u8().unwrap(), ITEM_TAG_PAYLOAD);
            let plen = r.read_u16_be().unwrap() as usize;
            r.read_bytes(plen).unwrap();
            assert_eq!(r.read_u8().unwrap(), ITEM_TAG_IDENTIFIER);
            assert_eq!(r.read_u16_be().unwrap(), 4);
            assert_eq!(r.read_u32_be().unwrap(), expected_id);
            assert_eq!(r.read_u8().unwrap(), ITEM_TAG_EXPIRY);
            assert_eq!(r.read_u16_be().unwrap(), 4);
            r.read_u32_be().unwrap();
            assert_eq!(r.read_u8().unwrap(), ITEM_TAG_PRIORITY);
            assert_eq!(r.read_u16_be().unwrap(), 1);
            r.read_u8().unwrap();
            assert_eq!(before - r.remaining(), frame_len);
        }
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn empty_frame_is_empty() {
        let frame = Frame::new();
        assert!(frame.is_empty());
        assert!(frame.bytes().is_empty());
    }
}
