//! Equality filters, multi-key sort and offset/limit over JSON documents.

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    /// Parse `name`, `+name` or `-name`.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some(field) = spec.strip_prefix('-') {
            Self { field: field.to_string(), direction: Direction::Desc }
        } else {
            let field = spec.strip_prefix('+').unwrap_or(spec);
            Self { field: field.to_string(), direction: Direction::Asc }
        }
    }
}

/// A query over one collection.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub sort: Vec<SortKey>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: &str) -> Self {
        self.filters.push((field.to_string(), value.to_string()));
        self
    }

    pub fn sort_by(mut self, field: &str, direction: Direction) -> Self {
        self.sort.push(SortKey { field: field.to_string(), direction });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every filter matches the document's top-level field.
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| field_as_string(doc, field).as_deref() == Some(expected.as_str()))
    }

    /// Order two documents by the sort keys, in sequence.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.sort {
            let ord = compare_values(a.get(&key.field), b.get(&key.field));
            let ord = match key.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Scalar field rendered the way it appears in a query string.
fn field_as_string(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_key_parse() {
        assert_eq!(SortKey::parse("name").direction, Direction::Asc);
        assert_eq!(SortKey::parse("+name").field, "name");
        let desc = SortKey::parse("-pack");
        assert_eq!(desc.field, "pack");
        assert_eq!(desc.direction, Direction::Desc);
    }

    #[test]
    fn filters_match_strings_and_booleans() {
        let doc = json!({"name": "a", "enabled": true, "parameters": {"x": 1}});
        assert!(Query::new().filter("name", "a").matches(&doc));
        assert!(Query::new().filter("enabled", "true").matches(&doc));
        assert!(!Query::new().filter("name", "b").matches(&doc));
        assert!(!Query::new().filter("missing", "a").matches(&doc));
        assert!(!Query::new().filter("parameters", "x").matches(&doc));
    }

    #[test]
    fn multi_key_sort() {
        let mut docs = vec![
            json!({"pack": "b", "name": "1"}),
            json!({"pack": "a", "name": "2"}),
            json!({"pack": "a", "name": "1"}),
        ];
        let q = Query::new().sort_by("pack", Direction::Asc).sort_by("name", Direction::Desc);
        docs.sort_by(|x, y| q.compare(x, y));
        assert_eq!(docs[0], json!({"pack": "a", "name": "2"}));
        assert_eq!(docs[1], json!({"pack": "a", "name": "1"}));
        assert_eq!(docs[2], json!({"pack": "b", "name": "1"}));
    }
}
