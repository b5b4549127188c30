mod test_join_announces_presence;

use huddle_core::RoomId;
use huddle_core::destinations::{chat_topic, participants_topic};

use crate::utils::ROOM;

pub fn participants() -> String {
    participants_topic(&RoomId::from(ROOM))
}

pub fn chat() -> String {
    chat_topic(&RoomId::from(ROOM))
}
