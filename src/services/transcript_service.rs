use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Transcript;
use crate::database::DatabaseError;

/// Longest language tag the column holds (`en`, `pt-BR`, `zh-Hant-TW`).
pub const MAX_LANGUAGE_CHARS: usize = 10;

/// Transcript payload from the transcription worker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTranscript {
    #[serde(default)]
    pub content_item_id: String,
    #[serde(default)]
    pub full_text: String,
    pub summary: Option<String>,
    pub word_timestamps: Option<Vec<Map<String, Value>>>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidTranscript {
    pub content_item_id: Uuid,
    pub full_text: String,
    pub summary: Option<String>,
    pub word_timestamps: Option<Value>,
    pub language: Option<String>,
}

impl NewTranscript {
    pub fn validate(self) -> Result<ValidTranscript, String> {
        if self.content_item_id.trim().is_empty() || self.full_text.trim().is_empty() {
            return Err("content_item_id and full_text are required".to_string());
        }
        let content_item_id =
            Uuid::parse_str(self.content_item_id.trim()).map_err(|_| "Invalid content_item_id".to_string())?;

        let language = trimmed(self.language.as_deref());
        if matches!(&language, Some(tag) if tag.chars().count() > MAX_LANGUAGE_CHARS) {
            return Err(format!("language must be at most {} characters", MAX_LANGUAGE_CHARS));
        }

        Ok(ValidTranscript {
            content_item_id,
            full_text: self.full_text,
            summary: trimmed(self.summary.as_deref()),
            word_timestamps: self
                .word_timestamps
                .map(|words| Value::Array(words.into_iter().map(Value::Object).collect())),
            language,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Clone)]
pub struct TranscriptService {
    pool: PgPool,
}

impl TranscriptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a transcript for an existing content item. The insert selects
    /// from `content_items`, so an unknown item writes nothing.
    pub async fn create(&self, transcript: &ValidTranscript) -> Result<Transcript, DatabaseError> {
        let created = sqlx::query_as::<_, Transcript>(
            r#"
            INSERT INTO transcripts (public_id, content_item_id, full_text, summary, word_timestamps, language)
            SELECT $1, ci.public_id, $3, $4, $5, $6
            FROM content_items ci
            WHERE ci.public_id = $2
            RETURNING public_id, content_item_id, full_text, summary, word_timestamps, language, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(transcript.content_item_id)
        .bind(&transcript.full_text)
        .bind(&transcript.summary)
        .bind(&transcript.word_timestamps)
        .bind(&transcript.language)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Content item not found".to_string()))?;

        tracing::info!(
            id = %created.public_id,
            content_item_id = %created.content_item_id,
            chars = created.full_text.len(),
            "transcript stored"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(body: Value) -> NewTranscript {
        serde_json::from_value(body).expect("payload")
    }

    #[test]
    fn test_required_fields() {
        let err = payload(json!({"full_text": "hello"})).validate().unwrap_err();
        assert_eq!(err, "content_item_id and full_text are required");

        let err = payload(json!({"content_item_id": "8f0c4d0e-3b1a-4c59-9f0e-2d5a1f7c9b11", "full_text": "  "}))
            .validate()
            .unwrap_err();
        assert_eq!(err, "content_item_id and full_text are required");

        let err = payload(json!({"content_item_id": "item-7", "full_text": "hello"})).validate().unwrap_err();
        assert_eq!(err, "Invalid content_item_id");
    }

    #[test]
    fn test_optional_fields_are_normalized() {
        let valid = payload(json!({
            "content_item_id": " 8f0c4d0e-3b1a-4c59-9f0e-2d5a1f7c9b11 ",
            "full_text": "hello world",
            "summary": "   ",
            "language": " en ",
            "word_timestamps": [{"word": "hello", "start": 0.0, "end": 0.4}]
        }))
        .validate()
        .expect("valid");

        assert_eq!(valid.content_item_id.to_string(), "8f0c4d0e-3b1a-4c59-9f0e-2d5a1f7c9b11");
        assert_eq!(valid.summary, None);
        assert_eq!(valid.language.as_deref(), Some("en"));
        assert_eq!(valid.word_timestamps, Some(json!([{"word": "hello", "start": 0.0, "end": 0.4}])));
    }

    #[test]
    fn test_language_length_is_bounded() {
        let err = payload(json!({
            "content_item_id": "8f0c4d0e-3b1a-4c59-9f0e-2d5a1f7c9b11",
            "full_text": "hola",
            "language": "spanish-latam"
        }))
        .validate()
        .unwrap_err();
        assert_eq!(err, "language must be at most 10 characters");
    }

    #[test]
    fn test_word_timestamps_must_be_objects() {
        let parsed: Result<NewTranscript, _> = serde_json::from_value(json!({
            "content_item_id": "8f0c4d0e-3b1a-4c59-9f0e-2d5a1f7c9b11",
            "full_text": "hola",
            "word_timestamps": ["hola"]
        }));
        assert!(parsed.is_err());
    }
}
