use std::collections::BTreeMap;

/// A typed attribute value stored in a table row.
///
/// Numbers keep their decimal string form, the way the wire format carries
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    N(String),
    Bool(bool),
    Null,
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One row of the single table.
///
/// `user_key` is the partition key of the user index. Rows that carry it are
/// visible to [`Table::query_user_index`](super::Table::query_user_index)
/// under the same sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub pk: String,
    pub sk: String,
    pub user_key: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
            user_key: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_user_key(mut self, user_key: impl Into<String>) -> Self {
        self.user_key = Some(user_key.into());
        self
    }

    /// Sets a string attribute.
    pub fn with_s(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a string attribute when `value` is present.
    pub fn with_optional_s(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with_s(name, v),
            None => self,
        }
    }

    pub fn with_bool(mut self, name: &str, value: bool) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeValue::Bool(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}
