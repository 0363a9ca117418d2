use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A class as listed on the category/class listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    /// Class instance id, the key of every class request.
    pub id: String,
    pub category_id: String,
    pub name: String,
    /// Human readable class number.
    pub code: String,
    /// Enrollment status, e.g. "可报名".
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub teachers: Vec<String>,
    pub room: String,
    pub periods: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    /// Every labelled value of the profile page, e.g. ID card number.
    pub details: HashMap<String, String>,
}

/// One entry of a student's enrollment history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassEvent {
    pub class_instance_id: String,
    pub class_id: String,
    pub class_name: String,
    /// e.g. "转入", "转出".
    pub status: String,
    pub begin_date: String,
    pub end_date: Option<String>,
}
