//! Subreddit statistics aggregation
//!
//! Summarizes every fetched listing into the top-upvoted post and the most
//! prolific author, keeps the latest summary readable, and broadcasts each
//! update to subscribers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::reddit::models::{Listing, Post};

const STATS_CHANNEL_CAPACITY: usize = 64;

/// Summary of one listing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubredditStats {
    /// Post with the highest upvote count
    pub top_post: Option<Post>,
    /// Author with the most posts in the listing
    pub top_author: Option<String>,
    /// Number of posts processed
    pub post_count: usize,
    /// When this summary was computed
    pub updated_at: DateTime<Utc>,
}

/// Aggregates listings and publishes each new summary.
pub struct StatsService {
    latest: Mutex<Option<SubredditStats>>,
    updates: broadcast::Sender<SubredditStats>,
}

impl StatsService {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(STATS_CHANNEL_CAPACITY);
        Self {
            latest: Mutex::new(None),
            updates,
        }
    }

    /// Recompute statistics from a fresh listing and publish the result.
    ///
    /// Posts without an author are skipped for the author tally but still
    /// compete for the top-upvoted slot.
    pub fn update(&self, listing: &Listing) -> SubredditStats {
        let mut authors: BTreeMap<&str, usize> = BTreeMap::new();
        let mut top_post: Option<&Post> = None;

        for thing in &listing.data.children {
            let post = &thing.data;

            match post.author.as_deref() {
                Some(author) if !author.is_empty() => {
                    *authors.entry(author).or_insert(0) += 1;
                }
                _ => {
                    tracing::debug!(post = %post.id, "skipping post without author");
                }
            }

            let ups = post.ups.unwrap_or(0);
            if top_post.map_or(true, |current| ups > current.ups.unwrap_or(0)) {
                top_post = Some(post);
            }
        }

        let stats = SubredditStats {
            top_post: top_post.cloned(),
            top_author: authors
                .iter()
                .max_by(|a, b| a.1.cmp(b.1))
                .map(|(name, _)| (*name).to_string()),
            post_count: listing.data.children.len(),
            updated_at: Utc::now(),
        };

        tracing::info!(
            posts = stats.post_count,
            top_author = stats.top_author.as_deref().unwrap_or("-"),
            "subreddit stats updated"
        );

        *self.latest.lock() = Some(stats.clone());
        // Published outside the lock; nobody blocks a reader.
        let _ = self.updates.send(stats.clone());
        stats
    }

    /// Most recent summary, if any listing has been processed.
    pub fn latest(&self) -> Option<SubredditStats> {
        self.latest.lock().clone()
    }

    /// Subscribe to summary updates.
    pub fn subscribe(&self) -> broadcast::Receiver<SubredditStats> {
        self.updates.subscribe()
    }
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::models::{ListingData, Thing};

    fn post(id: &str, author: Option<&str>, ups: Option<i64>) -> Thing {
        Thing {
            kind: Some("t3".to_string()),
            data: Post {
                id: id.to_string(),
                title: Some(format!("title {id}")),
                author: author.map(str::to_string),
                ups,
                created_utc: 1700000000.0,
            },
        }
    }

    fn listing(children: Vec<Thing>) -> Listing {
        Listing {
            kind: Some("Listing".to_string()),
            data: ListingData {
                children,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_top_post_by_upvotes() {
        let service = StatsService::new();
        let stats = service.update(&listing(vec![
            post("a", Some("alice"), Some(10)),
            post("b", Some("bob"), Some(99)),
            post("c", Some("carol"), Some(3)),
        ]));

        assert_eq!(stats.top_post.unwrap().id, "b");
        assert_eq!(stats.post_count, 3);
    }

    #[test]
    fn test_top_author_by_post_count() {
        let service = StatsService::new();
        let stats = service.update(&listing(vec![
            post("a", Some("alice"), Some(1)),
            post("b", Some("bob"), Some(2)),
            post("c", Some("alice"), Some(3)),
        ]));

        assert_eq!(stats.top_author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_authorless_posts_skipped_for_author_tally() {
        let service = StatsService::new();
        let stats = service.update(&listing(vec![
            post("a", None, Some(50)),
            post("b", Some(""), Some(40)),
            post("c", Some("carol"), Some(3)),
        ]));

        assert_eq!(stats.top_author.as_deref(), Some("carol"));
        // The anonymous post still wins the upvote race.
        assert_eq!(stats.top_post.unwrap().id, "a");
    }

    #[test]
    fn test_empty_listing_yields_empty_stats() {
        let service = StatsService::new();
        let stats = service.update(&listing(vec![]));

        assert!(stats.top_post.is_none());
        assert!(stats.top_author.is_none());
        assert_eq!(stats.post_count, 0);
    }

    #[test]
    fn test_latest_reflects_last_update() {
        let service = StatsService::new();
        assert!(service.latest().is_none());

        service.update(&listing(vec![post("a", Some("alice"), Some(1))]));
        service.update(&listing(vec![post("b", Some("bob"), Some(2))]));

        let latest = service.latest().unwrap();
        assert_eq!(latest.top_author.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_update_broadcasts_to_subscribers() {
        let service = StatsService::new();
        let mut updates = service.subscribe();

        service.update(&listing(vec![post("a", Some("alice"), Some(1))]));

        let received = updates.recv().await.unwrap();
        assert_eq!(received.top_author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_ups_counts_as_zero() {
        let service = StatsService::new();
        let stats = service.update(&listing(vec![
            post("a", Some("alice"), None),
            post("b", Some("bob"), Some(1)),
        ]));

        assert_eq!(stats.top_post.unwrap().id, "b");
    }
}
