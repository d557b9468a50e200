/// Paging, sorting and filtering parameters of a search call.
///
/// `page` is 1-based, as on the wire. `order_by` uses the server syntax
/// `"property ASC"`; several clauses are comma-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    pub order_by: Option<String>,
    pub fiql: Option<String>,
    pub realm: Option<String>,
    pub keyword: Option<String>,
    pub details: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            order_by: None,
            fiql: None,
            realm: None,
            keyword: None,
            details: false,
        }
    }
}

impl ListQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn fiql(mut self, fiql: impl Into<String>) -> Self {
        self.fiql = Some(fiql.into());
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// The same query asking only for the total count.
    pub fn count_only(&self) -> Self {
        Self {
            page: 1,
            size: 0,
            order_by: None,
            ..self.clone()
        }
    }

    /// Render as query-string pairs.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("details", self.details.to_string()),
        ];
        if let Some(ref order_by) = self.order_by {
            params.push(("orderby", order_by.clone()));
        }
        if let Some(ref fiql) = self.fiql {
            params.push(("fiql", fiql.clone()));
        }
        if let Some(ref realm) = self.realm {
            params.push(("realm", realm.clone()));
        }
        if let Some(ref keyword) = self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_only_drops_paging_and_sort() {
        let q = ListQuery::default()
            .page(3)
            .size(25)
            .order_by("username ASC")
            .fiql("username==a*");
        let count = q.count_only();
        assert_eq!(count.page, 1);
        assert_eq!(count.size, 0);
        assert_eq!(count.order_by, None);
        assert_eq!(count.fiql.as_deref(), Some("username==a*"));
    }

    #[test]
    fn page_is_never_zero() {
        assert_eq!(ListQuery::default().page(0).page, 1);
    }
}
