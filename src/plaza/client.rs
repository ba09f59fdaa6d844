//! Feed client and availability polling

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::types::{decode_blob, CommunityRecord, PersonRecord, TopicFeed};
use super::{PlazaError, PlazaResult};

pub struct PlazaClient {
    http: reqwest::Client,
    feed_url: Url,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl PlazaClient {
    pub fn new(
        http: reqwest::Client,
        feed_url: Url,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self { http, feed_url, poll_interval, max_poll_attempts }
    }

    /// Fetch and decode the topic feed once.
    pub async fn fetch_communities(&self) -> PlazaResult<Vec<CommunityRecord>> {
        debug!("fetching plaza feed from {}", self.feed_url);
        let body = self
            .http
            .get(self.feed_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let feed: TopicFeed = quick_xml::de::from_str(&body)
            .map_err(|e| PlazaError::Feed { reason: e.to_string() })?;
        if feed.has_error != 0 {
            return Err(PlazaError::Feed { reason: "feed reported an error".into() });
        }

        let mut communities = Vec::with_capacity(feed.topics.entries.len());
        for topic in feed.topics.entries {
            let icon = match decode_blob(&topic.icon) {
                Ok(icon) => icon,
                Err(e) => {
                    warn!("community {} icon blob unusable: {e}", topic.community_id);
                    bytes::Bytes::new()
                }
            };

            let mut people = Vec::new();
            for person in topic.people.entries {
                // the feed nests each person's avatar inside their latest post
                let Some(post) = person.posts.entries.into_iter().next() else {
                    continue;
                };
                match decode_blob(&post.mii) {
                    Ok(descriptor_blob) => people.push(PersonRecord {
                        screen_name: post.screen_name,
                        descriptor_blob,
                    }),
                    Err(e) => {
                        warn!("skipping person `{}`: {e}", post.screen_name);
                    }
                }
            }

            communities.push(CommunityRecord {
                id: topic.community_id,
                title_id: topic.title_id,
                name: topic.name,
                icon,
                people,
            });
        }

        info!("plaza feed delivered {} communities", communities.len());
        Ok(communities)
    }

    /// Poll the feed at a fixed short interval until it yields data.
    ///
    /// Retries transport and decode failures alike; gives up with
    /// [`PlazaError::DataUnavailable`] once the configured attempt cap is
    /// reached so a dead service cannot stall startup forever.
    pub async fn poll_until_available(&self) -> PlazaResult<Vec<CommunityRecord>> {
        for attempt in 1..=self.max_poll_attempts {
            match self.fetch_communities().await {
                Ok(communities) if !communities.is_empty() => return Ok(communities),
                Ok(_) => {
                    debug!("plaza feed empty (attempt {attempt}/{})", self.max_poll_attempts);
                }
                Err(e) => {
                    debug!(
                        "plaza feed unavailable (attempt {attempt}/{}): {e}",
                        self.max_poll_attempts
                    );
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(PlazaError::DataUnavailable { attempts: self.max_poll_attempts })
    }
}
