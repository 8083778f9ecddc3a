use std::fmt;

use serde_json::Value;

/// Named collections (tables) of the clinic store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Appointments,
    Banners,
    ClinicInfo,
    Flashcards,
    AdminSettings,
    Notifications,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Appointments => "appointments",
            Collection::Banners => "banners",
            Collection::ClinicInfo => "clinic_info",
            Collection::Flashcards => "flashcards",
            Collection::AdminSettings => "admin_settings",
            Collection::Notifications => "notifications",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            Collection::Patients => "Patient",
            Collection::Appointments => "Appointment",
            Collection::Banners => "Banner",
            Collection::ClinicInfo => "Clinic info",
            Collection::Flashcards => "Flashcard",
            Collection::AdminSettings => "Settings",
            Collection::Notifications => "Notification",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn any_of<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(field.to_string(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(field.to_string(), value.into())
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _)
            | Filter::In(field, _)
            | Filter::Gte(field, _)
            | Filter::Lte(field, _) => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_asc(mut self, field: &str) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
            descending: false,
        });
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first() -> Self {
        Self::new().order_desc("created_at")
    }
}
