// media-social/src/csv_parser.rs
// ============================================================================
// Module: Channel CSV Row Parsing
// Description: Parses one channel object's rows into content-item upserts.
// Purpose: Implement the §10 "Row parsing" rule: required columns, optional
//          engagement columns, and skip-and-count for malformed rows.
// Dependencies: csv, media-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`parse_channel_csv`] never fails the whole object on a bad row: a row
//! missing a required column, or whose `posted_at` does not parse, is
//! skipped and counted in [`ParsedCsv::malformed_row_count`] rather than
//! aborting the scan.

use media_core::core::content::SourceType;
use media_core::interfaces::ContentItemUpsert;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Maximum post text length kept as `content`/`title` source.
const MAX_TEXT_LEN: usize = 4000;
/// Maximum title length derived from the post text.
const MAX_TITLE_LEN: usize = 140;

/// Result of parsing one channel object's CSV body.
#[derive(Debug, Default, Clone)]
pub struct ParsedCsv {
    /// Rows successfully parsed into an upsert.
    pub items: Vec<ContentItemUpsert>,
    /// Rows skipped because a required column was missing, empty, or malformed.
    pub malformed_row_count: u32,
}

/// Parses one channel's CSV body (required: `post_id, channel, author,
/// posted_at, text`; optional: `url, likes, shares, comments, sentiment_hint`).
#[must_use]
pub fn parse_channel_csv(bytes: &[u8]) -> ParsedCsv {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return ParsedCsv::default(),
    };
    let index_of = |name: &str| headers.iter().position(|header| header == name);
    let (Some(post_id_idx), Some(channel_idx), Some(author_idx), Some(posted_at_idx), Some(text_idx)) =
        (index_of("post_id"), index_of("channel"), index_of("author"), index_of("posted_at"), index_of("text"))
    else {
        return ParsedCsv::default();
    };
    let url_idx = index_of("url");
    let likes_idx = index_of("likes");
    let shares_idx = index_of("shares");
    let comments_idx = index_of("comments");
    let sentiment_hint_idx = index_of("sentiment_hint");

    let mut outcome = ParsedCsv::default();
    for result in reader.records() {
        let Ok(record) = result else {
            outcome.malformed_row_count += 1;
            continue;
        };
        let post_id = record.get(post_id_idx).unwrap_or("").trim();
        let channel = record.get(channel_idx).unwrap_or("").trim();
        let author = record.get(author_idx).unwrap_or("").trim();
        let posted_at_raw = record.get(posted_at_idx).unwrap_or("").trim();
        let text = record.get(text_idx).unwrap_or("").trim();
        if post_id.is_empty() || channel.is_empty() || author.is_empty() || text.is_empty() {
            outcome.malformed_row_count += 1;
            continue;
        }
        let Ok(posted_at) = OffsetDateTime::parse(posted_at_raw, &Rfc3339) else {
            outcome.malformed_row_count += 1;
            continue;
        };

        let url = url_idx.and_then(|idx| record.get(idx)).map(str::trim).filter(|value| !value.is_empty());
        let canonical_url = url.map(str::to_string).unwrap_or_else(|| format!("social://{channel}/{post_id}"));

        let mut metadata = serde_json::Map::new();
        metadata.insert("author".to_string(), Value::from(author));
        if let Some(likes) = likes_idx.and_then(|idx| record.get(idx)).and_then(|raw| raw.trim().parse::<i64>().ok()) {
            metadata.insert("likes".to_string(), Value::from(likes));
        }
        if let Some(shares) = shares_idx.and_then(|idx| record.get(idx)).and_then(|raw| raw.trim().parse::<i64>().ok()) {
            metadata.insert("shares".to_string(), Value::from(shares));
        }
        if let Some(comments) = comments_idx.and_then(|idx| record.get(idx)).and_then(|raw| raw.trim().parse::<i64>().ok()) {
            metadata.insert("comments".to_string(), Value::from(comments));
        }
        if let Some(hint) = sentiment_hint_idx.and_then(|idx| record.get(idx)).map(str::trim).filter(|value| !value.is_empty()) {
            metadata.insert("sentimentHint".to_string(), Value::from(hint));
        }

        let truncated_text = truncate(text, MAX_TEXT_LEN);
        let title = truncate(text, MAX_TITLE_LEN);

        outcome.items.push(ContentItemUpsert {
            canonical_url,
            source_type: SourceType::Social,
            term_id: None,
            provider: channel.to_string(),
            source_name: Some(channel.to_string()),
            source_id: Some(post_id.to_string()),
            title,
            summary: None,
            content: Some(truncated_text),
            image_url: None,
            language: None,
            category: None,
            published_at: Some(posted_at),
            source_score: None,
            raw_payload_s3_key: None,
            metadata: Value::Object(metadata),
        });
    }
    outcome
}

/// Truncates `value` to at most `max_len` characters.
fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len { value.to_string() } else { value.chars().take(max_len).collect() }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::parse_channel_csv;

    const HEADER: &str = "post_id,channel,author,posted_at,text,url,likes,shares,comments,sentiment_hint\n";

    #[test]
    fn parses_a_well_formed_row() {
        let body = format!(
            "{HEADER}p1,twitter,@analyst,2026-07-20T10:00:00Z,Great service today,,12,3,1,positive\n"
        );
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.malformed_row_count, 0);
        let item = &outcome.items[0];
        assert_eq!(item.canonical_url, "social://twitter/p1");
        assert_eq!(item.provider, "twitter");
        assert_eq!(item.metadata.get("likes").and_then(serde_json::Value::as_i64), Some(12));
    }

    #[test]
    fn prefers_an_explicit_url_over_the_synthesized_one() {
        let body = format!("{HEADER}p1,twitter,@analyst,2026-07-20T10:00:00Z,hi,https://x.com/p/1,,,,\n");
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.items[0].canonical_url, "https://x.com/p/1");
    }

    #[test]
    fn skips_rows_missing_a_required_column_value() {
        let body = format!("{HEADER},twitter,@analyst,2026-07-20T10:00:00Z,hi,,,,,\n");
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.items.len(), 0);
        assert_eq!(outcome.malformed_row_count, 1);
    }

    #[test]
    fn skips_rows_with_an_unparseable_timestamp() {
        let body = format!("{HEADER}p1,twitter,@analyst,not-a-date,hi,,,,,\n");
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.malformed_row_count, 1);
    }

    #[test]
    fn malformed_rows_do_not_abort_the_rest_of_the_object() {
        let body = format!(
            "{HEADER}p1,twitter,@analyst,not-a-date,hi,,,,,\np2,twitter,@analyst,2026-07-20T10:00:00Z,hi,,,,,\n"
        );
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.malformed_row_count, 1);
    }

    #[test]
    fn missing_required_header_yields_an_empty_result() {
        let body = "post_id,author,posted_at,text\np1,@a,2026-07-20T10:00:00Z,hi\n";
        let outcome = parse_channel_csv(body.as_bytes());
        assert_eq!(outcome.items.len(), 0);
        assert_eq!(outcome.malformed_row_count, 0);
    }
}
