//! Media server webhook payload and normalizer
//!
//! [`WebhookPayload`] mirrors the subset of the media server's webhook JSON
//! that the bridge reads. [`normalize`] turns it into a [`MediaEvent`], or
//! `None` when the event should be ignored.
//!
//! # Parsing Strategy
//!
//! 1. The payload is decoded leniently: every field is optional, and a
//!    `null` or wrongly typed field falls back to its default
//! 2. Unknown event kinds and item types yield `None` (ignored, not error)
//! 3. Provider ids may arrive as strings or numbers; unusable values are dropped
//! 4. Year derivation never fails; an unparseable date gives `year = None`

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::errors::DomainError;
use super::event::{EventKind, MediaDetails, MediaEvent, MediaType, ProviderIds};

/// Top-level webhook payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "Event", default, deserialize_with = "lenient")]
    pub event: String,
    #[serde(rename = "Item", default, deserialize_with = "lenient")]
    pub item: WebhookItem,
    #[serde(rename = "PlaybackPositionTicks", default, deserialize_with = "lenient")]
    pub playback_position_ticks: Option<f64>,
}

/// The `Item` object of a webhook payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookItem {
    #[serde(rename = "Type", default, deserialize_with = "lenient")]
    pub item_type: String,
    #[serde(rename = "Name", default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "SeriesName", default, deserialize_with = "lenient")]
    pub series_name: Option<String>,
    #[serde(rename = "ParentIndexNumber", default, deserialize_with = "lenient")]
    pub parent_index_number: Option<u32>,
    #[serde(rename = "IndexNumber", default, deserialize_with = "lenient")]
    pub index_number: Option<u32>,
    /// Number or numeric string; interpreted by the normalizer
    #[serde(rename = "ProductionYear", default)]
    pub production_year: Option<Value>,
    #[serde(rename = "PremiereDate", default, deserialize_with = "lenient")]
    pub premiere_date: Option<String>,
    #[serde(rename = "RunTimeTicks", default, deserialize_with = "lenient")]
    pub run_time_ticks: Option<f64>,
    #[serde(rename = "ProviderIds", default, deserialize_with = "lenient")]
    pub provider_ids: RawProviderIds,
    #[serde(rename = "UserData", default, deserialize_with = "lenient")]
    pub user_data: Option<UserData>,
}

/// Provider ids as sent by the media server (strings or numbers)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProviderIds {
    #[serde(rename = "Tmdb", default)]
    pub tmdb: Option<Value>,
    #[serde(rename = "Tvdb", default)]
    pub tvdb: Option<Value>,
    #[serde(rename = "Imdb", default)]
    pub imdb: Option<Value>,
}

/// Per-user item state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserData {
    #[serde(rename = "IsFavorite", default, deserialize_with = "lenient")]
    pub is_favorite: Option<bool>,
}

/// Decodes a field, falling back to its default when the value is `null`
/// or has an unexpected type
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match T::deserialize(&value) {
        Ok(decoded) => Ok(decoded),
        Err(e) => {
            if !value.is_null() {
                debug!(error = %e, "Ignoring webhook field with unexpected type");
            }
            Ok(T::default())
        }
    }
}

impl WebhookPayload {
    /// Decodes a payload from already-parsed JSON
    ///
    /// Fields of an unexpected type fall back to their defaults. Returns
    /// `None` only when the payload is not a JSON object; such payloads are
    /// ignored upstream.
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            debug!("Webhook payload is not a JSON object");
            return None;
        }
        match WebhookPayload::deserialize(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(error = %e, "Webhook payload has unexpected shape");
                None
            }
        }
    }

    /// Watched percentage for playback events
    ///
    /// Missing position counts as 0 and missing runtime as 1 tick. Returns
    /// `None` when the runtime is not positive, in which case no progress
    /// threshold applies.
    pub fn progress_percent(&self) -> Option<f64> {
        let position = self.playback_position_ticks.unwrap_or(0.0);
        let runtime = self.item.run_time_ticks.unwrap_or(1.0);
        if runtime > 0.0 {
            Some(position / runtime * 100.0)
        } else {
            None
        }
    }
}

/// Maps a raw webhook payload into a canonical [`MediaEvent`]
///
/// Returns `None` when the event kind is not supported or the item is
/// neither an `Episode` nor a `Movie`.
pub fn normalize(payload: &WebhookPayload) -> Option<MediaEvent> {
    let event_kind = match payload.event.parse::<EventKind>() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(error = %e, "Ignoring webhook");
            return None;
        }
    };

    let item = &payload.item;
    let media_type = match MediaType::from_item_type(&item.item_type) {
        Ok(media_type) => media_type,
        Err(e) => {
            debug!(event = %event_kind, error = %e, "Ignoring webhook");
            return None;
        }
    };

    let ids = ProviderIds {
        tmdb: numeric_id("Tmdb", item.provider_ids.tmdb.as_ref()),
        tvdb: numeric_id("Tvdb", item.provider_ids.tvdb.as_ref()),
        imdb: string_id(item.provider_ids.imdb.as_ref()),
    };

    let title = item.name.clone().unwrap_or_default();
    let details = match media_type {
        MediaType::Episode => MediaDetails::Episode {
            series_name: item.series_name.clone().unwrap_or_default(),
            season: item.parent_index_number.unwrap_or(0),
            episode_number: item.index_number.unwrap_or(0),
            title,
        },
        MediaType::Movie => MediaDetails::Movie {
            title,
            year: movie_year(item),
        },
    };

    let is_favorite = item
        .user_data
        .as_ref()
        .and_then(|u| u.is_favorite)
        .unwrap_or(false);

    Some(MediaEvent::new(event_kind, ids, details, is_favorite))
}

/// Year of a movie: a non-zero `ProductionYear`, else the first four
/// characters of `PremiereDate`
fn movie_year(item: &WebhookItem) -> Option<i32> {
    if let Some(year) = production_year(item.production_year.as_ref()) {
        return Some(year);
    }

    let prefix: String = item
        .premiere_date
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(4)
        .collect();

    if prefix.is_empty() {
        return None;
    }
    prefix.trim().parse::<i32>().ok()
}

/// A non-zero `ProductionYear` given as a number or numeric string
fn production_year(value: Option<&Value>) -> Option<i32> {
    let year = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    if year == 0 {
        return None;
    }
    i32::try_from(year).ok()
}

/// Interprets a Tmdb/Tvdb id, dropping values that are not integers
fn numeric_id(provider: &'static str, value: Option<&Value>) -> Option<u64> {
    let parsed = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Null => return None,
        _ => None,
    };

    if parsed.is_none() {
        let err = DomainError::InvalidProviderId {
            provider,
            value: value.map(|v| v.to_string()).unwrap_or_default(),
        };
        debug!(error = %err, "Dropping provider id");
    }
    parsed
}

/// Interprets an Imdb id; empty strings count as absent
fn string_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
