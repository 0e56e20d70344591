use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Kind of asset a record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Image, ContentType::Video];

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
        }
    }

    /// Plural form used in user-facing messages
    #[inline]
    #[must_use]
    pub fn plural(&self) -> &'static str {
        match self {
            ContentType::Image => "images",
            ContentType::Video => "videos",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

/// Category information attached to product images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMeta {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub content_type: ContentType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MediaMeta>,
}

impl MediaRecord {
    pub fn new(
        content_type: ContentType,
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
        meta: Option<MediaMeta>,
    ) -> Self {
        Self {
            content_type,
            title: title.into(),
            description: description.into(),
            link: link.into(),
            meta,
        }
    }

    /// Copy of this record with a different link
    #[must_use]
    pub fn with_link(&self, link: String) -> Self {
        Self {
            link,
            ..self.clone()
        }
    }
}

/// Immutable, ordered sequence of media records.
///
/// A record's position in the catalog is its identity: the partition index
/// and the embedding table both refer to records by position.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<MediaRecord>,
}

impl Catalog {
    #[inline]
    #[must_use]
    pub fn new(records: Vec<MediaRecord>) -> Self {
        Self { records }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<&MediaRecord> {
        self.records.get(position)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MediaRecord> {
        self.records.iter()
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn count(&self, content_type: ContentType) -> usize {
        self.records
            .iter()
            .filter(|r| r.content_type == content_type)
            .count()
    }
}

impl Index<usize> for Catalog {
    type Output = MediaRecord;

    fn index(&self, position: usize) -> &MediaRecord {
        &self.records[position]
    }
}

impl From<Vec<MediaRecord>> for Catalog {
    fn from(records: Vec<MediaRecord>) -> Self {
        Self::new(records)
    }
}
