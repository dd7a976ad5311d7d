//! Media event domain types
//!
//! [`MediaEvent`] is the canonical record built once per inbound webhook.
//! It is immutable: the normalizer constructs it, the sync layer reads it,
//! and it is dropped when the webhook reply has been produced.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// EventKind
// ============================================================================

/// Webhook event kinds the bridge reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "playback.start")]
    PlaybackStart,
    #[serde(rename = "playback.stop")]
    PlaybackStop,
    #[serde(rename = "playback.progress")]
    PlaybackProgress,
    #[serde(rename = "playback.pause")]
    PlaybackPause,
    #[serde(rename = "playback.unpause")]
    PlaybackUnpause,
    #[serde(rename = "item.markplayed")]
    MarkPlayed,
    #[serde(rename = "item.markunplayed")]
    MarkUnplayed,
    #[serde(rename = "item.rate")]
    Rate,
}

impl EventKind {
    /// Every supported event kind, in the order advertised to operators
    pub const ALL: [EventKind; 8] = [
        EventKind::PlaybackStart,
        EventKind::PlaybackStop,
        EventKind::PlaybackProgress,
        EventKind::PlaybackPause,
        EventKind::PlaybackUnpause,
        EventKind::MarkPlayed,
        EventKind::MarkUnplayed,
        EventKind::Rate,
    ];

    /// Returns the wire name used by the media server
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlaybackStart => "playback.start",
            EventKind::PlaybackStop => "playback.stop",
            EventKind::PlaybackProgress => "playback.progress",
            EventKind::PlaybackPause => "playback.pause",
            EventKind::PlaybackUnpause => "playback.unpause",
            EventKind::MarkPlayed => "item.markplayed",
            EventKind::MarkUnplayed => "item.markunplayed",
            EventKind::Rate => "item.rate",
        }
    }

    /// Returns the handler category this event is routed to
    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::MarkPlayed | EventKind::MarkUnplayed => EventCategory::PlayedStatus,
            EventKind::Rate => EventCategory::Favorite,
            EventKind::PlaybackStart
            | EventKind::PlaybackStop
            | EventKind::PlaybackProgress
            | EventKind::PlaybackPause
            | EventKind::PlaybackUnpause => EventCategory::Playback,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::UnsupportedEvent(s.to_string()))
    }
}

/// Handler families an event is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Playback lifecycle (start, stop, progress, pause, unpause)
    Playback,
    /// Manual played / unplayed marking
    PlayedStatus,
    /// Favorite toggling (reported as a rating event)
    Favorite,
}

// ============================================================================
// MediaType
// ============================================================================

/// Kind of media item an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Episode,
    Movie,
}

impl MediaType {
    /// Returns the lowercase name (`episode` / `movie`)
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Episode => "episode",
            MediaType::Movie => "movie",
        }
    }

    /// Maps the media server's `Item.Type` value (`Episode`, `Movie`)
    pub fn from_item_type(item_type: &str) -> Result<Self, DomainError> {
        match item_type {
            "Episode" => Ok(MediaType::Episode),
            "Movie" => Ok(MediaType::Movie),
            other => Err(DomainError::UnsupportedMediaType(other.to_string())),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ProviderIds
// ============================================================================

/// External identifiers used by the tracking service to match an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIds {
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
    pub imdb: Option<String>,
}

impl ProviderIds {
    /// Returns true when no identifier is known
    pub fn is_empty(&self) -> bool {
        self.tmdb.is_none() && self.tvdb.is_none() && self.imdb.is_none()
    }
}

// ============================================================================
// MediaEvent
// ============================================================================

/// Type-specific fields of a media event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum MediaDetails {
    Episode {
        series_name: String,
        season: u32,
        episode_number: u32,
        title: String,
    },
    Movie {
        title: String,
        year: Option<i32>,
    },
}

/// Canonical record of a single inbound webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEvent {
    event_kind: EventKind,
    ids: ProviderIds,
    details: MediaDetails,
    is_played: bool,
    is_favorite: bool,
}

impl MediaEvent {
    /// Creates a new event; `is_played` is derived from the event kind
    pub fn new(
        event_kind: EventKind,
        ids: ProviderIds,
        details: MediaDetails,
        is_favorite: bool,
    ) -> Self {
        Self {
            event_kind,
            ids,
            details,
            is_played: event_kind == EventKind::MarkPlayed,
            is_favorite,
        }
    }

    pub fn event_kind(&self) -> EventKind {
        self.event_kind
    }

    pub fn ids(&self) -> &ProviderIds {
        &self.ids
    }

    pub fn details(&self) -> &MediaDetails {
        &self.details
    }

    pub fn is_played(&self) -> bool {
        self.is_played
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Returns the media type, always consistent with [`MediaEvent::details`]
    pub fn media_type(&self) -> MediaType {
        match self.details {
            MediaDetails::Episode { .. } => MediaType::Episode,
            MediaDetails::Movie { .. } => MediaType::Movie,
        }
    }

    /// Title used when searching the tracker: the series for episodes,
    /// the movie title otherwise
    pub fn search_title(&self) -> &str {
        match &self.details {
            MediaDetails::Episode { series_name, .. } => series_name,
            MediaDetails::Movie { title, .. } => title,
        }
    }
}

impl fmt::Display for MediaEvent {
    /// Formats as `Series S01E02` or `Title (2010)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            MediaDetails::Episode {
                series_name,
                season,
                episode_number,
                ..
            } => write!(f, "{} S{:02}E{:02}", series_name, season, episode_number),
            MediaDetails::Movie {
                title,
                year: Some(year),
            } => write!(f, "{} ({})", title, year),
            MediaDetails::Movie { title, year: None } => f.write_str(title),
        }
    }
}
