// src/models/individual.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of `individual_registrations` that take part in duplicate detection.
/// A field group over a new column needs a new variant here first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    IdentificationNumber1,
    IdentificationNumber2,
    IdentificationNumber3,
    PhoneNumber1,
    PhoneNumber2,
    PhoneNumber3,
    Email1,
    Email2,
    Email3,
    FirstName,
    MiddleName,
    LastName,
    NativeName,
    FullName,
    FreeField1,
    FreeField2,
    FreeField3,
    FreeField4,
    FreeField5,
}

/// How a column's raw value is normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Phone,
    Email,
    Text,
}

impl Column {
    pub const ALL: [Column; 19] = [
        Column::IdentificationNumber1,
        Column::IdentificationNumber2,
        Column::IdentificationNumber3,
        Column::PhoneNumber1,
        Column::PhoneNumber2,
        Column::PhoneNumber3,
        Column::Email1,
        Column::Email2,
        Column::Email3,
        Column::FirstName,
        Column::MiddleName,
        Column::LastName,
        Column::NativeName,
        Column::FullName,
        Column::FreeField1,
        Column::FreeField2,
        Column::FreeField3,
        Column::FreeField4,
        Column::FreeField5,
    ];

    /// Database column name. Only these static names are ever spliced into SQL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::IdentificationNumber1 => "identification_number_1",
            Column::IdentificationNumber2 => "identification_number_2",
            Column::IdentificationNumber3 => "identification_number_3",
            Column::PhoneNumber1 => "phone_number_1",
            Column::PhoneNumber2 => "phone_number_2",
            Column::PhoneNumber3 => "phone_number_3",
            Column::Email1 => "email_1",
            Column::Email2 => "email_2",
            Column::Email3 => "email_3",
            Column::FirstName => "first_name",
            Column::MiddleName => "middle_name",
            Column::LastName => "last_name",
            Column::NativeName => "native_name",
            Column::FullName => "full_name",
            Column::FreeField1 => "free_field_1",
            Column::FreeField2 => "free_field_2",
            Column::FreeField3 => "free_field_3",
            Column::FreeField4 => "free_field_4",
            Column::FreeField5 => "free_field_5",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::PhoneNumber1 | Column::PhoneNumber2 | Column::PhoneNumber3 => ColumnKind::Phone,
            Column::Email1 | Column::Email2 | Column::Email3 => ColumnKind::Email,
            _ => ColumnKind::Text,
        }
    }

    /// Applies the same normalization the registry applies on write.
    pub fn normalize(&self, raw: &str) -> String {
        match self.kind() {
            ColumnKind::Phone => normalize_phone(raw),
            ColumnKind::Email => normalize_email(raw),
            ColumnKind::Text => trim_value(raw).to_string(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps ASCII digits only.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_email(email: &str) -> String {
    trim_value(email).to_lowercase()
}

fn trim_value(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

/// A registered (or to-be-registered) individual, restricted to the
/// attributes duplicate detection cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Individual {
    pub id: String,
    pub country_id: String,
    pub identification_number_1: String,
    pub identification_number_2: String,
    pub identification_number_3: String,
    pub phone_number_1: String,
    pub phone_number_2: String,
    pub phone_number_3: String,
    pub email_1: String,
    pub email_2: String,
    pub email_3: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub native_name: String,
    pub full_name: String,
    pub free_field_1: String,
    pub free_field_2: String,
    pub free_field_3: String,
    pub free_field_4: String,
    pub free_field_5: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Individual {
    /// Raw stored value of a column.
    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::IdentificationNumber1 => &self.identification_number_1,
            Column::IdentificationNumber2 => &self.identification_number_2,
            Column::IdentificationNumber3 => &self.identification_number_3,
            Column::PhoneNumber1 => &self.phone_number_1,
            Column::PhoneNumber2 => &self.phone_number_2,
            Column::PhoneNumber3 => &self.phone_number_3,
            Column::Email1 => &self.email_1,
            Column::Email2 => &self.email_2,
            Column::Email3 => &self.email_3,
            Column::FirstName => &self.first_name,
            Column::MiddleName => &self.middle_name,
            Column::LastName => &self.last_name,
            Column::NativeName => &self.native_name,
            Column::FullName => &self.full_name,
            Column::FreeField1 => &self.free_field_1,
            Column::FreeField2 => &self.free_field_2,
            Column::FreeField3 => &self.free_field_3,
            Column::FreeField4 => &self.free_field_4,
            Column::FreeField5 => &self.free_field_5,
        }
    }

    fn value_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::IdentificationNumber1 => &mut self.identification_number_1,
            Column::IdentificationNumber2 => &mut self.identification_number_2,
            Column::IdentificationNumber3 => &mut self.identification_number_3,
            Column::PhoneNumber1 => &mut self.phone_number_1,
            Column::PhoneNumber2 => &mut self.phone_number_2,
            Column::PhoneNumber3 => &mut self.phone_number_3,
            Column::Email1 => &mut self.email_1,
            Column::Email2 => &mut self.email_2,
            Column::Email3 => &mut self.email_3,
            Column::FirstName => &mut self.first_name,
            Column::MiddleName => &mut self.middle_name,
            Column::LastName => &mut self.last_name,
            Column::NativeName => &mut self.native_name,
            Column::FullName => &mut self.full_name,
            Column::FreeField1 => &mut self.free_field_1,
            Column::FreeField2 => &mut self.free_field_2,
            Column::FreeField3 => &mut self.free_field_3,
            Column::FreeField4 => &mut self.free_field_4,
            Column::FreeField5 => &mut self.free_field_5,
        }
    }

    /// Normalized value of a column, `None` when it is empty after normalization.
    pub fn normalized_value(&self, column: Column) -> Option<String> {
        let normalized = column.normalize(self.value(column));
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }

    /// Rewrites every dedup column into its normalized form, in place.
    pub fn normalize(&mut self) {
        for column in Column::ALL {
            let normalized = column.normalize(self.value(column));
            *self.value_mut(column) = normalized;
        }
        self.id = trim_value(&self.id).to_string();
        self.country_id = trim_value(&self.country_id).to_string();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Builder-style setter used by callers assembling records column by column.
    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        *self.value_mut(column) = value.into();
        self
    }
}
