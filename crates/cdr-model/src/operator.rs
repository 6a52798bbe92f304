use serde::{Deserialize, Serialize};

/// An operator line and the person staffing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub phone_number: String,
    pub name: String,
}

impl Operator {
    pub fn new(phone_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            name: name.into(),
        }
    }
}
