//! Domain types for the Pocket v3 API.
//!
//! # Design
//! Token types are newtypes so a request token can never be passed where an
//! access token is expected. `SavedItem` models the handful of fields the
//! client reads and keeps everything else in `extra`, which re-serializes
//! untouched. `SavedItems` is keyed by item id and ordered by it; the
//! provider's own ordering is not preserved by its JSON object anyway.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Application credentials issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub redirect_uri: String,
}

impl Credentials {
    pub fn new(consumer_key: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            redirect_uri: redirect_uri.into(),
        }
    }
}

/// Short-lived, single-use token representing an unauthorized session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Long-lived token granted once the user authorized the app.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    token: String,
    username: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

// The token itself stays out of logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Which saved items to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    #[default]
    Unread,
    Archive,
    All,
}

/// Ordering requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Newest,
    Oldest,
    Title,
    Site,
}

/// How many fields the provider returns per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailType {
    Simple,
    Complete,
}

macro_rules! keyword_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(
                        "unknown {}: {other} (expected one of: {})",
                        stringify!($ty),
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

keyword_enum!(ItemState { Unread => "unread", Archive => "archive", All => "all" });
keyword_enum!(Sort { Newest => "newest", Oldest => "oldest", Title => "title", Site => "site" });
keyword_enum!(DetailType { Simple => "simple", Complete => "complete" });

/// Options for one call to the retrieval endpoint.
///
/// `state`, `count` and `offset` are always sent. `sort` and `detail_type`
/// are omitted from the body when unset so the provider applies its own
/// defaults; whatever is set is sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveQuery {
    pub state: ItemState,
    pub count: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<DetailType>,
}

impl RetrieveQuery {
    pub const DEFAULT_COUNT: u32 = 100;

    pub const fn with_state(mut self, state: ItemState) -> Self {
        self.state = state;
        self
    }

    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub const fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub const fn with_detail_type(mut self, detail_type: DetailType) -> Self {
        self.detail_type = Some(detail_type);
        self
    }

    /// The same query advanced by one page. Paging is left to the caller.
    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.count),
            ..self.clone()
        }
    }
}

impl Default for RetrieveQuery {
    fn default() -> Self {
        Self {
            state: ItemState::default(),
            count: Self::DEFAULT_COUNT,
            offset: 0,
            sort: None,
            detail_type: None,
        }
    }
}

/// A bookmarked resource as returned by `v3/get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    /// Key of the item in the provider's `list` object.
    #[serde(rename = "item_id", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "option_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_added: Option<String>,
    /// Every other provider field, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedItem {
    /// Resolved title, then the title the user saved, then a placeholder.
    pub fn display_title(&self) -> &str {
        [&self.resolved_title, &self.given_title]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|title| !title.is_empty())
            .unwrap_or("Untitled")
    }

    /// Resolved URL, falling back to the URL the user saved.
    pub fn display_url(&self) -> Option<&str> {
        [&self.resolved_url, &self.given_url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|url| !url.is_empty())
    }

    /// `time_added` as a timestamp. The provider sends `"0"` for "never".
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        let seconds: i64 = self.time_added.as_deref()?.parse().ok()?;
        if seconds == 0 {
            return None;
        }
        Utc.timestamp_opt(seconds, 0).single()
    }
}

/// Saved items keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SavedItems(BTreeMap<String, SavedItem>);

impl SavedItems {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SavedItem> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedItem> {
        self.0.values()
    }

    /// Flatten into a sequence ordered by id.
    pub fn into_vec(self) -> Vec<SavedItem> {
        self.0.into_values().collect()
    }

    /// Decode the provider's `list` value. An absent list arrives as `null`
    /// and an empty one as `[]`; both mean no items.
    pub(crate) fn from_list(list: Option<Value>) -> Result<Self, serde_json::Error> {
        let entries = match list {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Array(values)) if values.is_empty() => return Ok(Self::default()),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                return Err(serde::de::Error::invalid_type(
                    unexpected(&other),
                    &"an object keyed by item id",
                ))
            }
        };

        entries
            .into_iter()
            .map(|(id, value)| {
                let mut item: SavedItem = serde_json::from_value(value)?;
                item.id.clone_from(&id);
                Ok((id, item))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl FromIterator<SavedItem> for SavedItems {
    fn from_iter<I: IntoIterator<Item = SavedItem>>(iter: I) -> Self {
        Self(iter.into_iter().map(|item| (item.id.clone(), item)).collect())
    }
}

impl IntoIterator for SavedItems {
    type Item = SavedItem;
    type IntoIter = std::collections::btree_map::IntoValues<String, SavedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

fn unexpected(value: &Value) -> serde::de::Unexpected<'_> {
    use serde::de::Unexpected;
    match value {
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::String(s) => Unexpected::Str(s),
        Value::Number(_) => Unexpected::Other("number"),
        Value::Array(_) => Unexpected::Seq,
        Value::Null => Unexpected::Unit,
        Value::Object(_) => Unexpected::Map,
    }
}

/// Pocket sends numeric fields as strings, but not consistently.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    option_string_or_number(deserializer).map(Option::unwrap_or_default)
}

fn option_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}
