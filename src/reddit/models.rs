//! Serde models for the slice of the Reddit listing API we consume.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One subreddit post, trimmed to the fields the stats service consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub ups: Option<i64>,
    #[serde(default)]
    pub created_utc: f64,
}

impl Post {
    /// Creation time as a UTC timestamp; epoch if the field is out of range.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.created_utc as i64, 0)
            .single()
            .unwrap_or_default()
    }
}

/// The `{"kind": ..., "data": ...}` wrapper around every listing child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: Post,
}

/// Paging envelope inside a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// Top-level listing response (`/r/{subreddit}/new.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: ListingData,
}
