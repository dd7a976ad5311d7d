//! Request bodies for the `/sync/*` endpoints
//!
//! A [`SyncPayload`] is derived deterministically from a [`MediaEvent`]:
//! the same event always serializes to the same bytes.

use serde::Serialize;
use trakthook_core::domain::{MediaDetails, MediaEvent, ProviderIds};

/// External ids as Trakt expects them; absent ids are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraktIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
}

impl From<&ProviderIds> for TraktIds {
    fn from(ids: &ProviderIds) -> Self {
        Self {
            tmdb: ids.tmdb,
            tvdb: ids.tvdb,
            imdb: ids.imdb.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeEntry {
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonEntry {
    pub number: u32,
    pub episodes: Vec<EpisodeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowEntry {
    pub title: String,
    pub ids: TraktIds,
    pub seasons: Vec<SeasonEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieEntry {
    pub title: String,
    /// Serialized as `null` when unknown
    pub year: Option<i32>,
    pub ids: TraktIds,
}

/// `{"shows": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeSyncPayload {
    pub shows: Vec<ShowEntry>,
}

/// `{"movies": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieSyncPayload {
    pub movies: Vec<MovieEntry>,
}

/// Body for history, collection and favorites requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyncPayload {
    Episode(EpisodeSyncPayload),
    Movie(MovieSyncPayload),
}

impl SyncPayload {
    /// Builds the body for `event`
    ///
    /// `resolved_title` (a canonical title found via search) takes
    /// precedence over the title reported by the media server.
    pub fn build(event: &MediaEvent, resolved_title: Option<&str>) -> Self {
        let ids = TraktIds::from(event.ids());
        match event.details() {
            MediaDetails::Episode {
                series_name,
                season,
                episode_number,
                ..
            } => SyncPayload::Episode(EpisodeSyncPayload {
                shows: vec![ShowEntry {
                    title: resolved_title.unwrap_or(series_name).to_string(),
                    ids,
                    seasons: vec![SeasonEntry {
                        number: *season,
                        episodes: vec![EpisodeEntry {
                            number: *episode_number,
                        }],
                    }],
                }],
            }),
            MediaDetails::Movie { title, year } => SyncPayload::Movie(MovieSyncPayload {
                movies: vec![MovieEntry {
                    title: resolved_title.unwrap_or(title).to_string(),
                    year: *year,
                    ids,
                }],
            }),
        }
    }
}
