use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::parse_instant;

/// One configured tile. Immutable for the whole session; only its derived state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub id: String,
    pub title: String,
    #[serde(alias = "rarity_label")]
    pub rarity: String,
    /// Raw timestamp as written in the configuration. May be malformed.
    pub reveal_at: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

fn default_icon() -> String {
    "*".to_string()
}

impl TileDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        rarity: impl Into<String>,
        reveal_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            rarity: rarity.into(),
            reveal_at: reveal_at.into(),
            icon: default_icon(),
            content_url: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = Some(url.into());
        self
    }

    /// Parses `reveal_at` on demand. Nothing is cached on the descriptor.
    pub fn reveal_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.reveal_at)
    }

    pub fn rarity_tag(&self) -> RarityTag {
        RarityTag::from_label(&self.rarity)
    }
}

/// Styling bucket derived from the free-form rarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTag {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl RarityTag {
    /// Case-insensitive match on the label; anything unrecognised is styled as `Common`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "uncommon" => Self::Uncommon,
            "rare" => Self::Rare,
            "epic" => Self::Epic,
            "legendary" => Self::Legendary,
            "mythic" | "mythical" => Self::Mythic,
            _ => Self::Common,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }
}

impl fmt::Display for RarityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a revealed tile displays. Chosen once per deployment, never per tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Each tile's `content_url`, falling back to its icon when absent.
    StaticUrl,
    /// Images uploaded by the user and kept in the local image store.
    UserUpload,
    #[default]
    IconOnly,
}

impl ContentMode {
    pub fn accepts_uploads(self) -> bool {
        self == Self::UserUpload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_tag_ignores_case_and_whitespace() {
        assert_eq!(RarityTag::from_label(" LEGENDARY "), RarityTag::Legendary);
        assert_eq!(RarityTag::from_label("Epic"), RarityTag::Epic);
        assert_eq!(RarityTag::from_label("shiny"), RarityTag::Common);
    }

    #[test]
    fn descriptor_defaults_icon_and_accepts_rarity_label_alias() {
        let tile: TileDescriptor = serde_json::from_str(
            r#"{"id":"a","title":"A","rarity_label":"Rare","reveal_at":"2025-01-01T00:00:00Z"}"#,
        )
        .expect("descriptor JSON should parse");
        assert_eq!(tile.icon, "*");
        assert_eq!(tile.rarity, "Rare");
        assert_eq!(tile.content_url, None);
    }

    #[test]
    fn only_user_upload_mode_accepts_uploads() {
        assert!(ContentMode::UserUpload.accepts_uploads());
        assert!(!ContentMode::StaticUrl.accepts_uploads());
        assert!(!ContentMode::default().accepts_uploads());
    }
}
