//! 사용자 응답 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::users::user::{Avatar, User};

/// 사용자 응답 (비밀번호 해시와 토큰 epoch는 포함하지 않습니다)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<Avatar>,
    pub is_active: bool,
    pub is_verified: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let User {
            id,
            email,
            name,
            phone,
            avatar,
            is_active,
            is_verified,
            version,
            created_at,
            updated_at,
            ..
        } = user;

        Self {
            id,
            email,
            name,
            phone,
            avatar,
            is_active,
            is_verified,
            version,
            created_at,
            updated_at,
        }
    }
}
