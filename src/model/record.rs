//! Employee record type.

use serde::{Deserialize, Serialize};

/// A single employee record as found in a dataset.
///
/// All five fields are required. `age` is unsigned, so a negative or
/// non-numeric age fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Full name
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,

    /// Postal address
    pub address: String,
}

impl Record {
    /// Create a new record.
    pub fn new(
        name: impl Into<String>,
        age: u32,
        email: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            email: email.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }

    /// Cell texts in column order: name, age, email, phone, address.
    pub fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.age.to_string(),
            self.email.clone(),
            self.phone.clone(),
            self.address.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cells_order() {
        let record = Record::new("Ana", 31, "ana@example.com", "+381 11 123", "Main 1");
        assert_eq!(
            record.cells(),
            [
                "Ana".to_string(),
                "31".to_string(),
                "ana@example.com".to_string(),
                "+381 11 123".to_string(),
                "Main 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_age_formatting_has_no_padding() {
        let record = Record::new("B", 7, "", "", "");
        assert_eq!(record.cells()[1], "7");

        let record = Record::new("C", 1000, "", "", "");
        assert_eq!(record.cells()[1], "1000");
    }

    #[test]
    fn test_record_deserialize() {
        let json = r#"{"name":"Ana","age":31,"email":"a@b.c","phone":"1","address":"X"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Ana");
        assert_eq!(record.age, 31);
    }

    #[test]
    fn test_record_missing_field() {
        let json = r#"{"name":"Ana","age":31,"email":"a@b.c","phone":"1"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn test_record_non_numeric_age() {
        let json = r#"{"name":"Ana","age":"old","email":"a@b.c","phone":"1","address":"X"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn test_record_negative_age() {
        let json = r#"{"name":"Ana","age":-1,"email":"a@b.c","phone":"1","address":"X"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }
}
