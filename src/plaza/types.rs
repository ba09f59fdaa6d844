//! Topic feed wire types and the decoded domain records
//!
//! The feed is XML; the wire structs below mirror its nesting and stay
//! private to this module's deserialization step. Downstream code sees only
//! [`CommunityRecord`] and [`PersonRecord`] with blobs already
//! base64-decoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::Deserialize;

use super::{PlazaError, PlazaResult};

/// Feed root element.
#[derive(Debug, Deserialize)]
pub(crate) struct TopicFeed {
    #[serde(default)]
    pub has_error: u8,
    #[serde(default)]
    pub topics: Topics,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Topics {
    #[serde(default, rename = "topic")]
    pub entries: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Topic {
    pub community_id: u64,
    #[serde(default)]
    pub title_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub people: People,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct People {
    #[serde(default, rename = "person")]
    pub entries: Vec<Person>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Person {
    #[serde(default)]
    pub posts: Posts,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Posts {
    #[serde(default, rename = "post")]
    pub entries: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Post {
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub mii: String,
}

/// One community: icon blob plus the people placed around it.
#[derive(Debug, Clone)]
pub struct CommunityRecord {
    pub id: u64,
    pub title_id: String,
    pub name: String,
    /// Icon image blob (TGA or PNG), already base64-decoded.
    pub icon: Bytes,
    pub people: Vec<PersonRecord>,
}

/// One person: display name plus the raw avatar descriptor blob, decoded
/// from base64 but otherwise opaque until a `DescriptorDecoder` runs.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub screen_name: String,
    pub descriptor_blob: Bytes,
}

/// Decode a base64 blob, tolerating the whitespace the feed embeds.
pub(crate) fn decode_blob(encoded: &str) -> PlazaResult<Bytes> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(|e| PlazaError::Encoding { reason: e.to_string() })
}
