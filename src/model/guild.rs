use serde::{Deserialize, Deserializer, Serialize};

/// Permission bit granting "Manage Server" on a guild.
pub const MANAGE_GUILD: u64 = 0x20;

/// One of the caller's guilds, as reported by the identity provider.
///
/// `bot_exists` and `manage_server` are derived per request by
/// cross-referencing the cached guild list against store existence checks;
/// they are never persisted with meaningful values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserGuild {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    /// Permission bitset. Current Discord API versions serialise this as a
    /// decimal string; older payloads carry an integer. Both are accepted.
    #[serde(deserialize_with = "permissions_from_string_or_number")]
    pub permissions: u64,
    #[serde(default)]
    pub bot_exists: bool,
    #[serde(default)]
    pub manage_server: bool,
}

impl UserGuild {
    pub fn can_manage_server(&self) -> bool {
        self.permissions & MANAGE_GUILD != 0
    }
}

fn permissions_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_accepts_decimal_string() {
        let guild: UserGuild = serde_json::from_value(serde_json::json!({
            "id": "641782804849491979",
            "name": "Cool Guild",
            "icon": null,
            "permissions": "2147483679",
        }))
        .unwrap();

        assert_eq!(guild.permissions, 2147483679);
        assert!(guild.can_manage_server());
    }

    #[test]
    fn permissions_accepts_integer() {
        let guild: UserGuild = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Old Payload",
            "icon": "abc",
            "permissions": 8,
        }))
        .unwrap();

        assert_eq!(guild.permissions, 8);
        assert!(!guild.can_manage_server());
    }

    #[test]
    fn permissions_rejects_garbage_string() {
        let result: Result<UserGuild, _> = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Bad",
            "icon": null,
            "permissions": "not-a-number",
        }));

        assert!(result.is_err());
    }
}
