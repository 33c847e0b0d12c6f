// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Network message shapes
//!
//! Every message starts with a 16 byte ASCII tag. Handshake messages are
//! the bare tag; game state and command messages carry a UTF-8 payload
//! after it. Transport and reliability belong to the embedding
//! application.

use crate::error::NetError;

/// Length of a message tag in bytes
pub const TAG_LENGTH: usize = 16;

const MSG_CANCEL: &[u8; TAG_LENGTH] = b"DFTD-cancel!    ";
const MSG_ASK: &[u8; TAG_LENGTH] = b"DFTD-ask?       ";
const MSG_OFFER: &[u8; TAG_LENGTH] = b"DFTD-offer!     ";
const MSG_JOIN: &[u8; TAG_LENGTH] = b"DFTD-join?      ";
const MSG_JOINED: &[u8; TAG_LENGTH] = b"DFTD-joined!    ";
const MSG_INIT: &[u8; TAG_LENGTH] = b"DFTD-init!      ";
const MSG_READY: &[u8; TAG_LENGTH] = b"DFTD-ready!     ";
const MSG_START: &[u8; TAG_LENGTH] = b"DFTD-start!     ";
const MSG_GAMESTATE: &[u8; TAG_LENGTH] = b"DFTD-gamestate: ";
const MSG_COMMAND: &[u8; TAG_LENGTH] = b"DFTD-command:   ";

/// A decoded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Abort the session setup
    Cancel,
    /// Look for servers
    Ask,
    /// Server answer to `Ask`
    Offer,
    /// Request to join a server
    Join,
    /// Join accepted
    Joined,
    /// Server starts sending the initial state
    Init,
    /// Client finished loading
    Ready,
    /// Simulation starts
    Start,
    /// Full world state, as written by [`persistence::save`](crate::persistence::save)
    GameState(String),
    /// A serialized player command
    Command(String),
}

impl Message {
    fn tag(&self) -> &'static [u8; TAG_LENGTH] {
        match self {
            Message::Cancel => MSG_CANCEL,
            Message::Ask => MSG_ASK,
            Message::Offer => MSG_OFFER,
            Message::Join => MSG_JOIN,
            Message::Joined => MSG_JOINED,
            Message::Init => MSG_INIT,
            Message::Ready => MSG_READY,
            Message::Start => MSG_START,
            Message::GameState(_) => MSG_GAMESTATE,
            Message::Command(_) => MSG_COMMAND,
        }
    }

    /// Encode as tag followed by the payload, if any
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.tag().to_vec();
        if let Message::GameState(p) | Message::Command(p) = self {
            out.extend_from_slice(p.as_bytes());
        }
        out
    }

    /// Decode a received message
    ///
    /// Handshake messages must be exactly [`TAG_LENGTH`] bytes long.
    pub fn decode(bytes: &[u8]) -> Result<Message, NetError> {
        if bytes.len() < TAG_LENGTH {
            return Err(NetError::WrongLength(bytes.len(), TAG_LENGTH));
        }
        let (tag, payload) = bytes.split_at(TAG_LENGTH);
        let text = || String::from_utf8(payload.to_vec()).map_err(|_| NetError::InvalidPayload);
        let bare = |m: Message| {
            if payload.is_empty() {
                Ok(m)
            } else {
                Err(NetError::WrongLength(bytes.len(), TAG_LENGTH))
            }
        };
        match tag {
            t if t == MSG_CANCEL => bare(Message::Cancel),
            t if t == MSG_ASK => bare(Message::Ask),
            t if t == MSG_OFFER => bare(Message::Offer),
            t if t == MSG_JOIN => bare(Message::Join),
            t if t == MSG_JOINED => bare(Message::Joined),
            t if t == MSG_INIT => bare(Message::Init),
            t if t == MSG_READY => bare(Message::Ready),
            t if t == MSG_START => bare(Message::Start),
            t if t == MSG_GAMESTATE => Ok(Message::GameState(text()?)),
            t if t == MSG_COMMAND => Ok(Message::Command(text()?)),
            other => Err(NetError::UnknownTag(String::from_utf8_lossy(other).into_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::persistence;
    use crate::world::World;

    #[test]
    fn test_tags_are_fixed_length() {
        for m in [Message::Cancel, Message::Start, Message::GameState(String::new())] {
            assert_eq!(m.tag().len(), TAG_LENGTH);
        }
        assert_eq!(Message::Ask.encode(), b"DFTD-ask?       ".to_vec());
    }

    #[test]
    fn test_payload_messages() {
        let m = Message::Command("throttle 0.5".into());
        let bytes = m.encode();
        assert_eq!(&bytes[..TAG_LENGTH], b"DFTD-command:   ");
        assert_eq!(Message::decode(&bytes), Ok(m));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Message::decode(b"DFTD"), Err(NetError::WrongLength(4, TAG_LENGTH)));
        assert_eq!(
            Message::decode(b"DFTD-start!     extra"),
            Err(NetError::WrongLength(21, TAG_LENGTH))
        );
        assert!(matches!(Message::decode(b"DFTD-hello!     "), Err(NetError::UnknownTag(_))));
        let mut bad = MSG_GAMESTATE.to_vec();
        bad.push(0xff);
        assert_eq!(Message::decode(&bad), Err(NetError::InvalidPayload));
    }

    #[test]
    fn test_game_state_carries_save() {
        let world = World::new(SimConfig::default()).unwrap();
        let blob = persistence::save(&world, "sync").unwrap();
        let received = Message::decode(&Message::GameState(blob).encode()).unwrap();
        let Message::GameState(state) = received else {
            panic!("expected game state");
        };
        let restored = persistence::load(&state, SimConfig::default()).unwrap();
        assert_eq!(restored.time(), world.time());
    }
}
