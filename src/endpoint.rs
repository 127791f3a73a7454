//! Endpoint descriptors.

use std::collections::BTreeMap;

/// Describes one logical query: a path relative to the API base URL and its
/// query parameters.
///
/// Descriptors are produced by resource collaborators such as
/// [`Stock`](crate::Stock) and consumed once per query. The executor never
/// mutates them; the credential token is merged into a copy of the
/// parameters at request time.
///
/// # Examples
///
/// ```
/// use iexcloud::EndpointDescriptor;
///
/// let descriptor = EndpointDescriptor::new("stock/market/batch")
///     .with_param("symbols", "AAPL,MSFT")
///     .with_param("types", "quote");
///
/// assert_eq!(descriptor.path(), "stock/market/batch");
/// assert_eq!(descriptor.param("types"), Some("quote"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointDescriptor {
    path: String,
    params: BTreeMap<String, String>,
}

impl EndpointDescriptor {
    /// Creates a descriptor for `path`, without parameters.
    ///
    /// A leading `/` is dropped; the path is always appended below the
    /// versioned base URL.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = match path.strip_prefix('/') {
            Some(stripped) => stripped.to_string(),
            None => path,
        };
        Self {
            path,
            params: BTreeMap::new(),
        }
    }

    /// Adds a query parameter, replacing any previous value under `key`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// The path suffix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Looks up one query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_slash_dropped() {
        assert_eq!(EndpointDescriptor::new("/stock/aapl/quote").path(), "stock/aapl/quote");
        assert_eq!(EndpointDescriptor::new("stock/aapl/quote").path(), "stock/aapl/quote");
    }

    #[test]
    fn test_param_names_unique() {
        let descriptor = EndpointDescriptor::new("x")
            .with_param("range", "1m")
            .with_params(vec![("range".to_string(), "5y".to_string())]);

        assert_eq!(descriptor.params().len(), 1);
        assert_eq!(descriptor.param("range"), Some("5y"));
    }
}
