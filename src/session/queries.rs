use super::{Endpoint, Session};
use crate::error::{Result, SessionError};
use crate::model::{Category, Class, ClassEvent, ClassSummary, Student};
use crate::scraper::{records, Page};
use crate::walker::pagination::{parse_rows, PAGE_SIZE};
use crate::{log_debug, log_info};

/// Search modes of the student search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Name,
    PhoneNumber,
}

impl SearchBy {
    fn as_form_value(self) -> &'static str {
        match self {
            SearchBy::Name => "byName",
            // The server files phone numbers under its e-mail search.
            SearchBy::PhoneNumber => "byEmail",
        }
    }
}

impl Session {
    /// Classes of the category/class listing page, in page order.
    pub async fn list_classes(&self) -> Result<Vec<ClassSummary>> {
        let page = Page::new(self.fetch(Endpoint::ListCategoryAndClass, &[]).await?);
        class_summaries(&page)
    }

    /// Categories linked from the listing page together with its classes.
    pub async fn list_categories_and_classes(
        &self,
    ) -> Result<(Vec<Category>, Vec<ClassSummary>)> {
        let page = Page::new(self.fetch(Endpoint::ListCategoryAndClass, &[]).await?);

        let mut categories = Vec::new();
        for id in records::parse_category_ids(&page)? {
            categories.push(self.get_category(&id).await?);
        }
        let classes = class_summaries(&page)?;

        log_info!(
            "[session] Found {} categories and {} classes",
            categories.len(),
            classes.len()
        );
        Ok((categories, classes))
    }

    pub async fn get_category(&self, id: &str) -> Result<Category> {
        let body = self.fetch(Endpoint::ViewCategory, &[("clazz.id", id)]).await?;
        records::parse_category(id, &Page::new(body))
    }

    /// Full class details for a listing row.
    pub async fn get_class(&self, summary: &ClassSummary) -> Result<Class> {
        let body = self
            .fetch(Endpoint::ViewClass, &[("clazzInstance.id", summary.id.as_str())])
            .await?;
        records::parse_class(summary, &Page::new(body))
    }

    pub async fn get_student(&self, id: &str) -> Result<Student> {
        let body = self.fetch(Endpoint::ViewStudent, &[("student.id", id)]).await?;
        records::parse_student(id, &Page::new(body))
    }

    /// Enrollment history of a student, oldest first.
    pub async fn get_class_events(&self, student_id: &str) -> Result<Vec<ClassEvent>> {
        let body = self
            .fetch(Endpoint::ViewStudent, &[("student.id", student_id)])
            .await?;
        records::parse_class_events(&Page::new(body))
    }

    /// Ids of the students matching a search.
    pub async fn search_students(&self, by: SearchBy, value: &str) -> Result<Vec<String>> {
        if value.trim().is_empty() {
            return Err(SessionError::EmptySearchValue.into());
        }

        let page_size = PAGE_SIZE.to_string();
        let body = self
            .post(
                Endpoint::StudentSearch,
                &[
                    ("searchName", ""),
                    ("studentTraining.id", ""),
                    ("action", "search"),
                    ("searchBy", by.as_form_value()),
                    ("searchValue", value),
                    ("pageEntity.pageRecords", page_size.as_str()),
                    ("dispatcher", "search"),
                    ("studentTrainingName", ""),
                ],
            )
            .await?;

        let ids = records::parse_search_results(&Page::new(body))?;
        log_debug!("[session] Search {:?} {:?} matched {} students", by, value, ids.len());
        Ok(ids)
    }

    pub async fn search_students_by_name(&self, name: &str) -> Result<Vec<String>> {
        self.search_students(SearchBy::Name, name).await
    }

    pub async fn search_students_by_phone_number(&self, phone: &str) -> Result<Vec<String>> {
        self.search_students(SearchBy::PhoneNumber, phone).await
    }
}

/// Every table of the listing page holds one category's classes under a
/// header row.
fn class_summaries(page: &Page) -> Result<Vec<ClassSummary>> {
    let listing = Endpoint::ListCategoryAndClass.path();
    let mut classes = Vec::new();
    for table in page.tables() {
        classes.extend(parse_rows(listing, 1, table, records::parse_class_row)?);
    }
    Ok(classes)
}
