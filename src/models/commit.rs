use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format the server uses for [`Commit::date`].
pub const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
    pub email: String,
}

impl Commit {
    /// Author time parsed from `date`, or `None` if the server changed format.
    pub fn authored_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, COMMIT_DATE_FORMAT).ok()
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// Pagination cursor for `/commits`.
///
/// `index` is 1-based. Absent fields use the server default; an index of 0
/// asks for the whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl Pager {
    pub fn page(index: u32, size: u32) -> Self {
        Self {
            index: Some(index),
            size: Some(size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitsQuery {
    #[serde(rename = "id")]
    pub repository_id: i64,
    #[serde(default)]
    pub pager: Pager,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitsResult {
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<Commit>,
}

impl CommitsResult {
    pub fn page_count(&self, size: u32) -> u64 {
        if size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(size))
    }
}

/// The server encodes an empty page as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Commit>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Commit>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Restore `files` to their content at commit `hash`.
///
/// An empty file set restores the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertRequest {
    #[serde(rename = "id")]
    pub repository_id: i64,
    pub hash: String,
    #[serde(rename = "file")]
    pub files: BTreeSet<String>,
}

impl RevertRequest {
    pub fn new<I, S>(repository_id: i64, hash: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repository_id,
            hash: hash.into(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}
