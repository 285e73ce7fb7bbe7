use oasis_core::{Document, OasisError, Query};
use serde_json::{Map, Value};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 100;

/// Sort applied when the caller does not ask for one.
pub const DEFAULT_SORT: &str = "-created_at";

const RESERVED: [&str; 4] = ["page", "sort", "limit", "fields"];
const OPERATORS: [&str; 7] = ["gt", "gte", "lt", "lte", "ne", "in", "nin"];

/// Filtering, sorting, field selection and pagination for a list read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub filter: Document,
    /// Comma-separated field names; a leading `-` sorts descending.
    pub sort: Option<String>,
    /// Comma-separated field names to include, or `-field` to exclude.
    pub fields: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_page(mut self, page: u64, limit: i64) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Parse decoded query-string pairs such as `status=confirmed`,
    /// `regular_price[gte]=200`, `sort=-regular_price,name` or `page=2`.
    ///
    /// Numeric and boolean values are converted; `in`/`nin` take a comma list.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, OasisError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, raw) in pairs {
            match key {
                "page" => params.page = Some(parse_number(key, raw)?),
                "limit" => params.limit = Some(parse_number(key, raw)?),
                "sort" => params.sort = Some(raw.to_string()),
                "fields" => params.fields = Some(raw.to_string()),
                _ => params.insert_condition(key, raw)?,
            }
        }
        Ok(params)
    }

    fn insert_condition(&mut self, key: &str, raw: &str) -> Result<(), OasisError> {
        let Some((field, rest)) = key.split_once('[') else {
            self.filter.insert(key.to_string(), scalar(raw));
            return Ok(());
        };
        let op = rest
            .strip_suffix(']')
            .filter(|op| OPERATORS.contains(op))
            .ok_or_else(|| OasisError::Validation(format!("unsupported filter '{key}'")))?;
        if RESERVED.contains(&field) {
            return Err(OasisError::Validation(format!("cannot filter on '{field}'")));
        }

        let value = match op {
            "in" | "nin" => Value::Array(raw.split(',').map(|v| scalar(v.trim())).collect()),
            _ => scalar(raw),
        };
        let entry = self
            .filter
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(conditions) => {
                conditions.insert(format!("${op}"), value);
                Ok(())
            }
            _ => Err(OasisError::Validation(format!(
                "'{field}' has both an exact value and an operator"
            ))),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
    }

    /// Build the read query against `collection`.
    ///
    /// Fails with [`OasisError::Validation`] when `page` and `limit` put the
    /// offset past `u64::MAX`.
    pub fn to_query(&self, collection: &str) -> Result<Query, OasisError> {
        let limit = self.limit();
        let page = self.page();
        let skip = (page - 1).checked_mul(limit as u64).ok_or_else(|| {
            OasisError::Validation(format!("page {page} with limit {limit} is out of range"))
        })?;
        let mut query = Query::find(collection, self.filter.clone())
            .sort(sort_document(self.sort.as_deref().unwrap_or(DEFAULT_SORT)))
            .limit(limit);
        if skip > 0 {
            query = query.skip(skip);
        }
        if let Some(fields) = self.fields.as_deref() {
            let projection = projection_document(fields);
            if !projection.is_empty() {
                query = query.select(projection);
            }
        }
        Ok(query)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, OasisError> {
    raw.trim()
        .parse()
        .map_err(|_| OasisError::Validation(format!("'{key}' must be a number, got '{raw}'")))
}

fn scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn field_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|f| !f.is_empty() && *f != "-")
}

/// `"-regular_price,name"` becomes `{ "regular_price": -1, "name": 1 }`.
fn sort_document(list: &str) -> Document {
    field_list(list)
        .map(|f| match f.strip_prefix('-') {
            Some(name) => (name.to_string(), Value::from(-1)),
            None => (f.to_string(), Value::from(1)),
        })
        .collect()
}

/// `"name,max_capacity"` includes fields, `"-description"` excludes them.
fn projection_document(list: &str) -> Document {
    field_list(list)
        .map(|f| match f.strip_prefix('-') {
            Some(name) => (name.to_string(), Value::from(0)),
            None => (f.to_string(), Value::from(1)),
        })
        .collect()
}
