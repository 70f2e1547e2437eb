use color_eyre::Result;
use libsql::params;

use super::helpers::{query_all, query_flag, query_one, query_optional};
use super::models::PassageModel;
use super::Db;

/// Structured fields parsed out of a human-readable reference such as
/// `"John 3:16-17"`. All fields stay `None` when the reference does not
/// follow the `Book Chapter:Verse[-Verse]` shape.
#[derive(Debug, Default, PartialEq)]
struct ParsedReference {
    book: Option<String>,
    chapter: Option<i64>,
    verse_start: Option<i64>,
    verse_end: Option<i64>,
}

fn parse_reference(reference: &str) -> ParsedReference {
    let Some((book, rest)) = reference.trim().rsplit_once(' ') else {
        return ParsedReference::default();
    };
    let Some((chapter, verses)) = rest.split_once(':') else {
        return ParsedReference::default();
    };
    let Ok(chapter) = chapter.parse::<i64>() else {
        return ParsedReference::default();
    };

    let (start, end) = match verses.split_once('-') {
        Some((start, end)) => (start.parse::<i64>().ok(), end.parse::<i64>().ok()),
        None => (verses.parse::<i64>().ok(), None),
    };
    let Some(start) = start else {
        return ParsedReference::default();
    };

    ParsedReference {
        book: Some(book.to_string()),
        chapter: Some(chapter),
        verse_start: Some(start),
        verse_end: end,
    }
}

impl Db {
    /// Create a passage. Returns `None` when the reference is already taken.
    pub async fn create_passage(
        &self,
        reference: &str,
        text: &str,
        translation: &str,
        difficulty_level: i64,
    ) -> Result<Option<PassageModel>> {
        let conn = self.db.connect()?;

        let taken = query_flag(
            &conn,
            "SELECT 1 FROM passages WHERE reference = ?",
            params![reference],
        )
        .await?;
        if taken {
            return Ok(None);
        }

        let parsed = parse_reference(reference);
        let word_count = text.split_whitespace().count() as i64;

        let passage: PassageModel = query_one(
            &conn,
            r#"INSERT INTO passages
                   (reference, text, translation, book, chapter, verse_start, verse_end,
                    difficulty_level, word_count)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id, reference, text, translation, book, chapter, verse_start,
                         verse_end, difficulty_level, word_count, is_active"#,
            params![
                reference,
                text,
                translation,
                parsed.book,
                parsed.chapter,
                parsed.verse_start,
                parsed.verse_end,
                difficulty_level,
                word_count
            ],
        )
        .await?;

        tracing::info!("new passage created: id={}, reference={reference}", passage.id);
        Ok(Some(passage))
    }

    pub async fn get_passage(&self, passage_id: i64) -> Result<Option<PassageModel>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"SELECT id, reference, text, translation, book, chapter, verse_start,
                      verse_end, difficulty_level, word_count, is_active
               FROM passages WHERE id = ?"#,
            params![passage_id],
        )
        .await
    }

    pub async fn list_passages(&self, include_inactive: bool) -> Result<Vec<PassageModel>> {
        let conn = self.db.connect()?;
        if include_inactive {
            query_all(
                &conn,
                r#"SELECT id, reference, text, translation, book, chapter, verse_start,
                          verse_end, difficulty_level, word_count, is_active
                   FROM passages ORDER BY reference"#,
                (),
            )
            .await
        } else {
            query_all(
                &conn,
                r#"SELECT id, reference, text, translation, book, chapter, verse_start,
                          verse_end, difficulty_level, word_count, is_active
                   FROM passages WHERE is_active = 1 ORDER BY reference"#,
                (),
            )
            .await
        }
    }

    pub async fn random_passage(&self) -> Result<Option<PassageModel>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"SELECT id, reference, text, translation, book, chapter, verse_start,
                      verse_end, difficulty_level, word_count, is_active
               FROM passages WHERE is_active = 1 ORDER BY RANDOM() LIMIT 1"#,
            (),
        )
        .await
    }

    /// Edit a passage's text, translation or difficulty. The reference is the
    /// passage's identity and cannot change. Returns the updated row, or
    /// `None` when the passage does not exist.
    pub async fn update_passage(
        &self,
        passage_id: i64,
        text: Option<&str>,
        translation: Option<&str>,
        difficulty_level: Option<i64>,
    ) -> Result<Option<PassageModel>> {
        let Some(existing) = self.get_passage(passage_id).await? else {
            return Ok(None);
        };

        let text = text.unwrap_or(&existing.text);
        let translation = translation.unwrap_or(&existing.translation);
        let difficulty_level = difficulty_level.unwrap_or(existing.difficulty_level);
        let word_count = text.split_whitespace().count() as i64;

        let conn = self.db.connect()?;
        conn.execute(
            r#"UPDATE passages
               SET text = ?, translation = ?, difficulty_level = ?, word_count = ?
               WHERE id = ?"#,
            params![text, translation, difficulty_level, word_count, passage_id],
        )
        .await?;

        tracing::info!("passage {passage_id} updated");
        self.get_passage(passage_id).await
    }

    /// Retire a passage from practice without touching its attempt history.
    pub async fn deactivate_passage(&self, passage_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        let affected = conn
            .execute(
                "UPDATE passages SET is_active = 0 WHERE id = ?",
                params![passage_id],
            )
            .await?;

        if affected > 0 {
            tracing::info!("passage {passage_id} deactivated");
        }
        Ok(affected > 0)
    }
}
