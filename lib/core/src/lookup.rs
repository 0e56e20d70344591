use crate::catalog::{ContentType, MediaRecord};
use crate::link::{resize, validate_size, DEFAULT_IMAGE_SIZE};
use crate::retriever::{Retriever, Stage};
use crate::selection::{parse_selector, select, RequestedIndex};
use crate::{Error, Result};

/// One lookup as received from a caller
#[derive(Debug, Clone, Default)]
pub struct LookupRequest<'a> {
    /// Free text, possibly carrying a legacy `___<index>` suffix
    pub description: &'a str,
    /// Explicit index; takes precedence over an embedded suffix
    pub index: Option<RequestedIndex>,
    /// Requested image size; ignored for videos
    pub size: Option<i64>,
}

/// The record chosen for a lookup
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub content_type: ContentType,
    /// Query text after the legacy suffix was stripped
    pub query: String,
    pub requested_index: RequestedIndex,
    /// Position in the result list actually used
    pub index: usize,
    /// Snapped image size (images only)
    pub size: Option<u32>,
    pub total_matches: usize,
    pub stage: Stage,
    pub score: Option<f64>,
    pub catalog_position: usize,
    /// Catalog record; for images the link carries the requested size
    pub record: MediaRecord,
}

impl Retriever {
    /// Resolve a description to one record of the given type
    pub fn lookup(&self, content_type: ContentType, request: &LookupRequest<'_>) -> Result<LookupOutcome> {
        let selector = parse_selector(request.description);
        let requested_index = request
            .index
            .clone()
            .or(selector.index)
            .unwrap_or_default();

        let retrieval = self.retrieve(selector.query, content_type)?;
        let (chosen, index) = select(&retrieval.results, &requested_index)
            .ok_or(Error::NotFound(content_type))?;

        let stored = &self.catalog()[chosen.position];
        let (record, size) = match content_type {
            ContentType::Image => {
                let requested = request.size.unwrap_or(i64::from(DEFAULT_IMAGE_SIZE));
                let link = resize(&stored.link, requested).into_owned();
                (stored.with_link(link), Some(validate_size(requested)))
            }
            ContentType::Video => (stored.clone(), None),
        };

        tracing::debug!(
            content_type = %content_type,
            query = selector.query,
            stage = ?retrieval.stage,
            matches = retrieval.len(),
            index,
            "lookup resolved"
        );

        Ok(LookupOutcome {
            content_type,
            query: selector.query.to_string(),
            requested_index,
            index,
            size,
            total_matches: retrieval.len(),
            stage: retrieval.stage,
            score: chosen.score,
            catalog_position: chosen.position,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::sync::Arc;

    fn retriever() -> Retriever {
        let catalog = Catalog::new(vec![
            MediaRecord::new(ContentType::Image, "red shoe", "red shoe", "http://i/a._AC_UL320_.jpg", None),
            MediaRecord::new(ContentType::Image, "blue shoe", "blue shoe", "http://i/b._AC_UL320_.jpg", None),
            MediaRecord::new(ContentType::Image, "green hat", "green hat", "http://i/c._AC_UL320_.jpg", None),
            MediaRecord::new(ContentType::Video, "flower", "yellow flower blooming", "http://v/f.mp4", None),
        ]);
        Retriever::lexical(Arc::new(catalog))
    }

    #[test]
    fn test_legacy_suffix_selects_index() {
        let outcome = retriever()
            .lookup(ContentType::Image, &LookupRequest { description: "shoe___1", ..Default::default() })
            .unwrap();
        assert_eq!(outcome.query, "shoe");
        assert_eq!(outcome.record.title, "blue shoe");
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.total_matches, 3);
        assert_eq!(outcome.record.link, "http://i/b._AC_UL720_.jpg");
        assert_eq!(outcome.size, Some(720));
    }

    #[test]
    fn test_explicit_index_wins_and_wraps() {
        let outcome = retriever()
            .lookup(
                ContentType::Image,
                &LookupRequest {
                    description: "shoe___1",
                    index: Some(RequestedIndex::from(-1)),
                    size: Some(400),
                },
            )
            .unwrap();
        assert_eq!(outcome.requested_index.as_i64(), Some(-1));
        assert_eq!(outcome.index, 2);
        assert_eq!(outcome.record.title, "green hat");
        assert_eq!(outcome.record.link, "http://i/c._AC_UL320_.jpg");
        assert_eq!(outcome.size, Some(320));
    }

    #[test]
    fn test_oversized_suffix_wraps() {
        let outcome = retriever()
            .lookup(
                ContentType::Image,
                &LookupRequest { description: "shoe___10000000000000000001", ..Default::default() },
            )
            .unwrap();
        assert_eq!(outcome.requested_index.to_string(), "10000000000000000001");
        assert_eq!(outcome.index, 2);
        assert_eq!(outcome.record.title, "green hat");
    }

    #[test]
    fn test_video_link_untouched() {
        let outcome = retriever()
            .lookup(
                ContentType::Video,
                &LookupRequest { description: "yellow-flower", index: None, size: Some(160) },
            )
            .unwrap();
        assert_eq!(outcome.record.link, "http://v/f.mp4");
        assert_eq!(outcome.size, None);
    }
}
