use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached user identity, stored verbatim under the `USER_CREDENTIALS`
/// credential entry as a flat JSON object.
///
/// This is an immutable value object: the session replaces it wholesale on
/// login/refresh, it is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub phone: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub verified: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Last four digits of the phone number, for display contexts that must
    /// not show the full number.
    pub fn phone_suffix(&self) -> &str {
        let digits = self.phone.as_str();
        if digits.len() >= 4 {
            &digits[digits.len() - 4..]
        } else {
            digits
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserRecord {
        UserRecord {
            id: "u_1001".to_string(),
            phone: "13800138000".to_string(),
            nickname: "测试用户一".to_string(),
            avatar: Some("https://cdn.example.com/avatar/1001.png".to_string()),
            verified: true,
            created_at: "2024-03-01T08:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_wire_format_uses_camel_case_created_at() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_round_trip() {
        let user = sample();
        let json = serde_json::to_string(&user).unwrap();
        let back: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_phone_suffix() {
        assert_eq!(sample().phone_suffix(), "8000");
        let short = UserRecord {
            phone: "138".to_string(),
            ..sample()
        };
        assert_eq!(short.phone_suffix(), "138");
    }
}
