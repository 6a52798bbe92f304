//! Static operator directory.

use cdr_model::Operator;

const DIRECTORY: &[(&str, &str)] = &[
    ("101", "Иванов Иван"),
    ("102", "Петрова Мария"),
    ("103", "Васильева Анастасия"),
    ("104", "Смирнов Михаил"),
];

/// Operators known to the call center, ordered by line number.
pub fn operators() -> Vec<Operator> {
    DIRECTORY
        .iter()
        .map(|(phone, name)| Operator::new(*phone, *name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_is_ordered_and_unique() {
        let list = operators();
        assert_eq!(list.len(), 4);
        assert!(list.windows(2).all(|pair| pair[0].phone_number < pair[1].phone_number));
        assert_eq!(list[0].name, "Иванов Иван");
    }
}
