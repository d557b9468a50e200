use std::cmp::Ordering;

/// A comparable cell value used for client-side sorting.
///
/// Missing values sort first; text compares case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Missing,
    Flag(bool),
    Number(i64),
    Text(String),
}

impl SortValue {
    pub fn text(value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if value.is_empty() {
            Self::Missing
        } else {
            Self::Text(value.to_lowercase())
        }
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, Self::text)
    }
}

/// Sort on one property, as sent to the server (`orderby=property ASC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortParam {
    pub property: String,
    pub ascending: bool,
}

impl SortParam {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ascending: true,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ascending: false,
        }
    }

    /// Server `orderby` clause.
    pub fn to_order_by(&self) -> String {
        format!(
            "{} {}",
            self.property,
            if self.ascending { "ASC" } else { "DESC" }
        )
    }

    /// Apply the direction to an ascending ordering.
    pub fn direct(&self, ordering: Ordering) -> Ordering {
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }

    /// The sort after the operator selects `property`: same column flips
    /// direction, another column starts ascending.
    pub fn toggle(current: Option<&SortParam>, property: &str) -> SortParam {
        match current {
            Some(sort) if sort.property == property => SortParam {
                property: sort.property.clone(),
                ascending: !sort.ascending,
            },
            _ => SortParam::asc(property),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_same_column() {
        let first = SortParam::toggle(None, "username");
        assert!(first.ascending);
        let second = SortParam::toggle(Some(&first), "username");
        assert!(!second.ascending);
        let other = SortParam::toggle(Some(&second), "status");
        assert_eq!(other, SortParam::asc("status"));
    }

    #[test]
    fn order_by_clause() {
        assert_eq!(SortParam::desc("lastChangeDate").to_order_by(), "lastChangeDate DESC");
    }

    #[test]
    fn text_ignores_case_and_missing_sorts_first() {
        assert_eq!(SortValue::text("Bellini"), SortValue::text("bellini"));
        assert!(SortValue::Missing < SortValue::text("a"));
        assert_eq!(SortValue::text(""), SortValue::Missing);
    }
}
