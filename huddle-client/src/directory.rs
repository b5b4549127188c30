use crate::error::DirectoryError;
use async_trait::async_trait;
use huddle_core::RoomId;
use serde::{Deserialize, Serialize};

pub const INVITE_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub room_name: String,
    #[serde(default)]
    pub invite_link: Option<String>,
    pub invite_code: String,
}

/// Room looked up by invite code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitedRoom {
    pub room_id: RoomId,
    pub room_name: String,
    pub invite_code: String,
}

/// Room metadata service next to the relay.
#[async_trait(?Send)]
pub trait RoomDirectory {
    async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, DirectoryError>;

    async fn create_room(&self, name: &str) -> Result<CreatedRoom, DirectoryError>;

    async fn invite_code_exists(&self, code: &str) -> Result<bool, DirectoryError>;

    async fn resolve_invite_code(&self, code: &str) -> Result<InvitedRoom, DirectoryError>;
}

/// Invite codes are exactly six ASCII digits.
pub fn validate_invite_code(code: &str) -> Result<&str, DirectoryError> {
    let code = code.trim();
    if code.len() == INVITE_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(DirectoryError::InvalidInviteCode(code.to_string()))
    }
}

/// Validates the code, checks it exists, then resolves it to a room.
pub async fn find_room_by_invite(
    directory: &dyn RoomDirectory,
    code: &str,
) -> Result<InvitedRoom, DirectoryError> {
    let code = validate_invite_code(code)?;
    if !directory.invite_code_exists(code).await? {
        return Err(DirectoryError::NotFound(code.to_string()));
    }
    directory.resolve_invite_code(code).await
}
