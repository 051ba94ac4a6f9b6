//! Inbound action payload.
//!
//! Clients are not trusted to send well-formed bodies. Every field is optional
//! and parsed leniently; anything unusable becomes "no action".

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    #[serde(default, deserialize_with = "lenient_index")]
    #[schemars(with = "Option<u32>")]
    pub button_index: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_untrusted")]
    #[schemars(with = "Option<UntrustedData>")]
    pub untrusted_data: Option<UntrustedData>,
}

/// Caller-supplied frame context. Nothing here is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedData {
    #[serde(default, deserialize_with = "lenient_index")]
    #[schemars(with = "Option<u32>")]
    pub fid: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub pfp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    #[schemars(with = "Option<u32>")]
    pub button_index: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub state: Option<String>,
}

/// Who pressed the button, as far as the caller claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameUser {
    pub fid: Option<u32>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp: Option<String>,
}

impl ActionPayload {
    /// Parses a request body. A body that is not a JSON object is an empty payload.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn with_action(button_index: u32, state: Option<String>) -> Self {
        Self {
            button_index: Some(button_index),
            state,
            untrusted_data: None,
        }
    }

    /// The pressed button. The top-level field wins over `untrustedData`.
    pub fn action(&self) -> Option<u32> {
        self.button_index
            .or_else(|| self.untrusted_data.as_ref()?.button_index)
    }

    /// The state token, if a non-empty one was sent.
    pub fn token(&self) -> Option<&str> {
        let top = self.state.as_deref().filter(|s| !s.trim().is_empty());
        top.or_else(|| {
            self.untrusted_data
                .as_ref()?
                .state
                .as_deref()
                .filter(|s| !s.trim().is_empty())
        })
    }

    /// The caller's claimed wallet, only if it looks like an Ethereum address.
    pub fn caller_address(&self) -> Option<&str> {
        let address = self.untrusted_data.as_ref()?.address.as_deref()?;
        is_eth_address(address).then_some(address)
    }

    pub fn user(&self) -> FrameUser {
        match &self.untrusted_data {
            Some(data) => FrameUser {
                fid: data.fid,
                username: data.username.clone(),
                display_name: data.display_name.clone(),
                pfp: data.pfp.clone(),
            },
            None => FrameUser::default(),
        }
    }
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_eth_address(candidate: &str) -> bool {
    candidate
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_untrusted<'de, D>(deserializer: D) -> Result<Option<UntrustedData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
