//! Rule sets for every page of the server and the entity builders on top.

use super::rules::{FieldRule, Locator, RuleSet, Source};
use super::table::Row;
use super::Page;
use crate::error::Result;
use crate::model::{Category, Class, ClassEvent, ClassSummary, Student};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const fn cell(table: usize, row: usize, column: usize) -> Locator {
    Locator::Cell { table, row, column }
}

/// Tables of the student page holding label/value pairs.
const STUDENT_DETAIL_TABLES: usize = 3;
/// Table of the student page holding the enrollment history.
const CLASS_EVENT_TABLE: usize = 3;

static CLASS_ROW: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "class summary",
        vec![
            FieldRule::new(
                "link",
                Locator::Column(0),
                r"(?s)clazzInstance\.id=(\d+)&(?:amp;)?clazz\.id=(\d+)[^>]*>(.*?)</a>",
                3,
            ),
            FieldRule::new("code", Locator::Column(1), r"(?s)^(.*)$", 1),
            FieldRule::new("status", Locator::Column(3), r"(?s)^(.*)$", 1),
        ],
    )
});

static CATEGORY_LINKS: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "category link",
        vec![FieldRule::new(
            "id",
            Locator::Document,
            r"/edu/base/clazz/viewClazz\.action\?clazz\.id=(\d+)",
            1,
        )
        .many()],
    )
});

static CATEGORY: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "category",
        vec![FieldRule::new("name", cell(0, 2, 1), r"(?s)^(.+)$", 1)],
    )
});

static CLASS: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "class",
        vec![
            FieldRule::new("name", cell(0, 1, 1), r"(?s)^(.+)$", 1),
            FieldRule::new("category", cell(0, 1, 3), r"(?s)^(.*)$", 1),
            FieldRule::new("room", cell(0, 2, 1), r"(?s)^(.*)$", 1),
            FieldRule::new(
                "teachers",
                Locator::Document,
                r#"(?s)<span class="teacher">(.*?)</span>"#,
                1,
            )
            .many(),
            FieldRule::new(
                "periods",
                Locator::Document,
                r#"(?s)<span class="period">(.*?)</span>"#,
                1,
            )
            .many(),
        ],
    )
});

static STUDENT_ROW: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "student summary",
        vec![
            FieldRule::new("id", Locator::Column(0), r"student\.id=(\d+)", 1),
            FieldRule::new("name", Locator::Column(0), r"(?s)<a[^>]*>(.*?)</a>", 1),
            FieldRule::new("phone", Locator::Column(1), r"(?s)^(.*)$", 1),
        ],
    )
});

static STUDENT: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "student",
        vec![
            FieldRule::new("name", cell(0, 1, 1), r"(?s)^(.+)$", 1),
            // The contact cell reads "<phone>/<relation>".
            FieldRule::new("phone", cell(1, 1, 1), r"(?s)^([^/]*)", 1),
        ],
    )
});

static CLASS_EVENT_ROW: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "class event",
        vec![
            FieldRule::new(
                "class",
                Locator::Column(0),
                r"(?s)clazzInstance\.id=(\d+).*?clazz\.id=(\d+)[^>]*>(.*?)</a>",
                3,
            ),
            FieldRule::new(
                "status",
                Locator::Column(2),
                r"(?s)^\s*(\D*?)\s*(\d{4}-\d{2}-\d{2})(?:\s*00:00:00\.0)?(?:\s|&nbsp;)*(\d{4}-\d{2}-\d{2})?",
                3,
            ),
        ],
    )
});

static SEARCH_RESULTS: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "student search",
        vec![FieldRule::new(
            "id",
            Locator::Document,
            r"/edu/student/basicinfo/viewstudent\.action\?student\.id=(\d+)",
            1,
        )
        .many()],
    )
});

pub fn parse_class_row(row: &Row) -> Result<ClassSummary> {
    let fields = CLASS_ROW.apply(&Source::row(row))?;

    Ok(ClassSummary {
        id: fields.group("link", 0),
        category_id: fields.group("link", 1),
        // The server appends the start timestamp to some class names.
        name: fields.group("link", 2).replace(" 00:00:00.0", "").trim().to_string(),
        code: fields.text("code"),
        status: fields.text("status"),
    })
}

/// Category ids linked from the listing page, first occurrence order.
pub fn parse_category_ids(page: &Page) -> Result<Vec<String>> {
    let fields = CATEGORY_LINKS.apply(&page.source())?;
    Ok(dedup(fields.all("id")))
}

pub fn parse_category(id: &str, page: &Page) -> Result<Category> {
    let fields = CATEGORY.apply(&page.source())?;

    Ok(Category {
        id: id.to_string(),
        name: fields.text("name"),
    })
}

pub fn parse_class(summary: &ClassSummary, page: &Page) -> Result<Class> {
    let fields = CLASS.apply(&page.source())?;

    Ok(Class {
        id: summary.id.clone(),
        name: fields.text("name"),
        category: Category {
            id: summary.category_id.clone(),
            name: fields.text("category"),
        },
        teachers: fields.all("teachers"),
        room: fields.text("room"),
        periods: fields.all("periods"),
    })
}

/// A student listing row; `details` stay empty until the profile is fetched.
pub fn parse_student_row(row: &Row) -> Result<Student> {
    let fields = STUDENT_ROW.apply(&Source::row(row))?;

    Ok(Student {
        id: fields.text("id"),
        name: fields.text("name"),
        phone_number: fields.text("phone"),
        details: HashMap::new(),
    })
}

pub fn parse_student(id: &str, page: &Page) -> Result<Student> {
    let fields = STUDENT.apply(&page.source())?;

    Ok(Student {
        id: id.to_string(),
        name: fields.text("name"),
        phone_number: fields.text("phone"),
        details: parse_details(page),
    })
}

/// Label/value cell pairs of the profile tables.
fn parse_details(page: &Page) -> HashMap<String, String> {
    let mut details = HashMap::new();

    for table in page.tables().iter().take(STUDENT_DETAIL_TABLES) {
        for row in table {
            for pair in row.chunks_exact(2) {
                let label = pair[0].text();
                let label = label.trim_end_matches([':', '：']).trim();
                if label.is_empty() {
                    continue;
                }
                details
                    .entry(label.to_string())
                    .or_insert_with(|| pair[1].text());
            }
        }
    }

    details
}

pub fn parse_class_events(page: &Page) -> Result<Vec<ClassEvent>> {
    let Some(table) = page.tables().get(CLASS_EVENT_TABLE) else {
        return Ok(Vec::new());
    };

    table
        .iter()
        .skip(1)
        .map(|row| {
            let fields = CLASS_EVENT_ROW.apply(&Source::row(row))?;
            let end_date = fields.group("status", 2);

            Ok(ClassEvent {
                class_instance_id: fields.group("class", 0),
                class_id: fields.group("class", 1),
                class_name: fields.group("class", 2),
                status: fields.group("status", 0),
                begin_date: fields.group("status", 1),
                end_date: (!end_date.is_empty()).then_some(end_date),
            })
        })
        .collect()
}

/// Student ids on a search result page.
pub fn parse_search_results(page: &Page) -> Result<Vec<String>> {
    let fields = SEARCH_RESULTS.apply(&page.source())?;
    Ok(dedup(fields.all("id")))
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
