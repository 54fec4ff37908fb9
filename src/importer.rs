// src/importer.rs

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Reader, Xlsx};
use url::Url;

use crate::error::AppError;

pub const COL_MAIN_TOPIC: &str = "Main Topic";
pub const COL_SUB_TOPIC: &str = "SubTopic";
pub const COL_VIDEO_LINK: &str = "Youtube Video Link";
pub const COL_DESCRIPTION: &str = "Short Description";

/// Duration is not in the sheet; it would need a video-platform lookup.
const DEFAULT_DURATION_LABEL: &str = "0:00";
const DEFAULT_TRANSCRIPT: &str = "Transcript not available.";

/// One data row of the catalog sheet, keyed by the header row.
#[derive(Debug, Clone)]
pub struct CourseRow {
    pub main_topic: String,
    pub sub_topic: String,
    pub video_link: String,
    pub description: String,
}

/// A course assembled from grouped rows, ready for insertion.
#[derive(Debug, PartialEq)]
pub struct ImportedCourse {
    pub title: String,
    pub description: String,
    pub lessons: Vec<ImportedLesson>,
}

#[derive(Debug, PartialEq)]
pub struct ImportedLesson {
    /// 1-based position within the course; the unlock order.
    pub ordinal: i64,
    pub title: String,
    pub duration_label: String,
    pub video_ref: String,
    pub transcript: String,
}

/// Reads the first worksheet of an xlsx workbook into rows.
/// The first row must be a header naming at least the topic columns.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<CourseRow>, AppError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| AppError::BadRequest(format!("Unreadable workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| AppError::BadRequest("Workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| AppError::BadRequest(format!("Failed to read sheet: {}", e)))?;

    let mut rows_iter = range.rows();

    let headers: Vec<String> = match rows_iter.next() {
        Some(row) => row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let column = |name: &str| headers.iter().position(|h| h == name);

    let main_topic_col = column(COL_MAIN_TOPIC)
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' column", COL_MAIN_TOPIC)))?;
    let sub_topic_col = column(COL_SUB_TOPIC)
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' column", COL_SUB_TOPIC)))?;
    let video_col = column(COL_VIDEO_LINK);
    let description_col = column(COL_DESCRIPTION);

    let cell_text = |row: &[calamine::Data], idx: Option<usize>| {
        idx.and_then(|i| row.get(i))
            .map(|cell| cell.to_string().trim().to_string())
            .unwrap_or_default()
    };

    let rows = rows_iter
        .map(|row| CourseRow {
            main_topic: cell_text(row, Some(main_topic_col)),
            sub_topic: cell_text(row, Some(sub_topic_col)),
            video_link: cell_text(row, video_col),
            description: cell_text(row, description_col),
        })
        .collect();

    Ok(rows)
}

/// Groups rows into courses by Main Topic, preserving sheet order for both
/// courses and lessons. Rows without a main topic are skipped. Lesson
/// ordinals restart at 1 within each course.
pub fn group_rows(rows: Vec<CourseRow>) -> Vec<ImportedCourse> {
    let mut courses: Vec<ImportedCourse> = Vec::new();
    let mut index_by_title: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.main_topic.is_empty() {
            continue;
        }

        let idx = *index_by_title
            .entry(row.main_topic.clone())
            .or_insert_with(|| {
                let description = if row.description.is_empty() {
                    format!("A course on {}", row.main_topic)
                } else {
                    row.description.clone()
                };
                courses.push(ImportedCourse {
                    title: row.main_topic.clone(),
                    description,
                    lessons: Vec::new(),
                });
                courses.len() - 1
            });

        let course = &mut courses[idx];
        course.lessons.push(ImportedLesson {
            ordinal: course.lessons.len() as i64 + 1,
            title: row.sub_topic,
            duration_label: DEFAULT_DURATION_LABEL.to_string(),
            video_ref: extract_video_id(&row.video_link),
            transcript: DEFAULT_TRANSCRIPT.to_string(),
        });
    }

    courses
}

/// Pulls the video id out of the standard hosting URL forms:
/// `youtube.com/watch?v=ID` and the `youtu.be/ID` short link.
/// Anything else yields an empty reference rather than a failed import.
pub fn extract_video_id(link: &str) -> String {
    let Ok(parsed) = Url::parse(link) else {
        return String::new();
    };

    match parsed.host_str() {
        Some("youtu.be") => parsed.path().trim_start_matches('/').to_string(),
        Some(host) if host.contains("youtube.com") => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(main: &str, sub: &str, link: &str, desc: &str) -> CourseRow {
        CourseRow {
            main_topic: main.to_string(),
            sub_topic: sub.to_string(),
            video_link: link.to_string(),
            description: desc.to_string(),
        }
    }

    #[test]
    fn extracts_watch_url_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=mHvV_Tv8HDQ"),
            "mHvV_Tv8HDQ"
        );
    }

    #[test]
    fn extracts_short_link_id() {
        assert_eq!(extract_video_id("https://youtu.be/WXof7bg_Zys"), "WXof7bg_Zys");
    }

    #[test]
    fn unparseable_links_yield_empty_ref() {
        assert_eq!(extract_video_id("not a url"), "");
        assert_eq!(extract_video_id("https://example.com/watch?v=zzz"), "");
        assert_eq!(extract_video_id("https://www.youtube.com/playlist?list=x"), "");
    }

    #[test]
    fn groups_rows_by_main_topic_in_sheet_order() {
        let courses = group_rows(vec![
            row("Electronics", "Modulation", "https://youtu.be/a1", "Signals."),
            row("Quantum", "States", "https://youtu.be/b1", ""),
            row("Electronics", "Multiplexing", "https://youtu.be/a2", "ignored"),
        ]);

        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].title, "Electronics");
        assert_eq!(courses[0].description, "Signals.");
        assert_eq!(courses[0].lessons.len(), 2);
        assert_eq!(courses[1].title, "Quantum");
        assert_eq!(courses[1].description, "A course on Quantum");
    }

    #[test]
    fn ordinals_are_contiguous_per_course() {
        let courses = group_rows(vec![
            row("A", "one", "", ""),
            row("B", "uno", "", ""),
            row("A", "two", "", ""),
            row("A", "three", "", ""),
        ]);

        let ordinals: Vec<i64> = courses[0].lessons.iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, [1, 2, 3]);
        assert_eq!(courses[1].lessons[0].ordinal, 1);
    }

    #[test]
    fn rows_without_main_topic_are_skipped() {
        let courses = group_rows(vec![
            row("", "orphan", "", ""),
            row("A", "kept", "", ""),
        ]);
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].lessons.len(), 1);
    }
}
