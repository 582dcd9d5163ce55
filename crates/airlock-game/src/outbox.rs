//! Outbound packets produced by one operation.

use airlock_protocol::{ClientId, Packet, PacketType, Recipient, Status};
use serde_json::Value;

/// The packets an operation wants delivered, in order, with their
/// recipients.
///
/// Operations only fill the outbox; [`Game::deliver`](crate::Game::deliver)
/// routes it once the state transition is complete.
#[derive(Debug, Default)]
pub struct Outbox {
    items: Vec<(Recipient, Packet)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: Recipient, packet: Packet) {
        self.items.push((recipient, packet));
    }

    /// Queues a packet for one client.
    pub fn send_to(&mut self, client: ClientId, packet: Packet) {
        self.push(Recipient::Client(client), packet);
    }

    /// Queues a packet for every named client.
    pub fn broadcast(&mut self, packet: Packet) {
        self.push(Recipient::All, packet);
    }

    /// Queues a packet for every named client but one.
    pub fn broadcast_except(&mut self, client: ClientId, packet: Packet) {
        self.push(Recipient::AllExcept(client), packet);
    }

    /// Appends everything from `other`, preserving order.
    pub fn extend(&mut self, other: Outbox) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Recipient, Packet)> {
        self.items.iter()
    }
}

impl IntoIterator for Outbox {
    type Item = (Recipient, Packet);
    type IntoIter = std::vec::IntoIter<(Recipient, Packet)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// The direct answer to a request: a status and optional arguments.
///
/// The dispatcher turns it into a packet of the same type as the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub arguments: Option<Value>,
}

impl Reply {
    pub fn ok() -> Self {
        Status::Ok.into()
    }

    pub fn ok_with(arguments: Value) -> Self {
        Self {
            status: Status::Ok,
            arguments: Some(arguments),
        }
    }

    /// Attaches arguments whatever the status.
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn into_packet(self, kind: PacketType) -> Packet {
        Packet {
            kind,
            status: self.status,
            arguments: self.arguments,
        }
    }
}

impl From<Status> for Reply {
    fn from(status: Status) -> Self {
        Self {
            status,
            arguments: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_outbox_keeps_push_order() {
        let mut out = Outbox::new();
        out.send_to(ClientId(1), Packet::new(PacketType::Info, Status::Ok));
        out.broadcast(Packet::new(PacketType::GameStatus, Status::Ok));
        out.broadcast_except(ClientId(1), Packet::new(PacketType::Chat, Status::Ok));

        let recipients: Vec<_> = out.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            recipients,
            vec![
                Recipient::Client(ClientId(1)),
                Recipient::All,
                Recipient::AllExcept(ClientId(1)),
            ]
        );
    }

    #[test]
    fn test_outbox_extend_appends() {
        let mut first = Outbox::new();
        first.broadcast(Packet::new(PacketType::Info, Status::Ok));
        let mut second = Outbox::new();
        second.broadcast(Packet::new(PacketType::Chat, Status::Ok));

        first.extend(second);

        let kinds: Vec<_> = first.into_iter().map(|(_, p)| p.kind).collect();
        assert_eq!(kinds, vec![PacketType::Info, PacketType::Chat]);
    }

    #[test]
    fn test_reply_into_packet_keeps_request_type() {
        let packet = Reply::ok_with(json!({"task": 3})).into_packet(PacketType::Task);
        assert_eq!(packet.kind, PacketType::Task);
        assert_eq!(packet.status, Status::Ok);
        assert_eq!(packet.arguments, Some(json!({"task": 3})));
    }

    #[test]
    fn test_reply_from_status_has_no_arguments() {
        let reply = Reply::from(Status::WrongRole);
        assert_eq!(reply.status, Status::WrongRole);
        assert!(reply.arguments.is_none());
    }
}
