use crate::params::QueryParams;
use crate::settings::Settings;
use reqwest::Url;

/// Everything that goes into one query POST.
///
/// Parameters are bound to literals when the request is created, so the
/// caller's values are consumed exactly once.
///
/// # Examples
///
/// ```rust
/// use clickhouse_link::{QueryParams, QueryRequest};
///
/// let params = QueryParams::new().with("i", 10);
/// let request = QueryRequest::new("SELECT {i:Int64}", Some("ArrowStream"), Some(&params));
///
/// assert_eq!(request.query, "SELECT {i:Int64} FORMAT ArrowStream");
/// let fields = request.form_fields();
/// assert_eq!(fields[1], ("param_i".to_string(), "10".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Query text, including any appended `FORMAT` directive
    pub query: String,

    /// `(param_<name>, literal)` pairs in caller order
    pub params: Vec<(String, String)>,
}

impl QueryRequest {
    pub fn new(query: &str, format: Option<&str>, params: Option<&QueryParams>) -> Self {
        let query = match format {
            Some(format) => format!("{} FORMAT {}", query, format),
            None => query.to_string(),
        };
        let params = params
            .map(|p| p.form_fields().collect())
            .unwrap_or_default();
        Self { query, params }
    }

    /// Multipart form fields: `query` first, then each bound parameter
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(1 + self.params.len());
        fields.push(("query".to_string(), self.query.clone()));
        fields.extend(self.params.iter().cloned());
        fields
    }
}

/// Append settings to `base` as URL query pairs. Empty settings leave the
/// URL untouched.
pub fn settings_url(base: &Url, settings: Option<&Settings>) -> Url {
    let mut url = base.clone();
    if let Some(settings) = settings.filter(|s| !s.is_empty()) {
        url.query_pairs_mut().extend_pairs(settings.iter());
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_format_or_params() {
        let request = QueryRequest::new("SELECT 1 FORMAT JSONEachRow", None, None);
        assert_eq!(
            request.form_fields(),
            vec![("query".to_string(), "SELECT 1 FORMAT JSONEachRow".to_string())]
        );
    }

    #[test]
    fn test_params_follow_query_field() {
        let params = QueryParams::new().with("s", "10").with("t", ("a", "b"));
        let request = QueryRequest::new("SELECT {s:String}, {t:Tuple(String, String)}", None, Some(&params));
        let fields = request.form_fields();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].0, "query");
        assert_eq!(fields[1], ("param_s".to_string(), "10".to_string()));
        assert_eq!(fields[2], ("param_t".to_string(), "('a', 'b')".to_string()));
    }

    #[test]
    fn test_settings_url() {
        let base = Url::parse("http://localhost:8123/").unwrap();
        assert_eq!(settings_url(&base, None), base);
        assert_eq!(settings_url(&base, Some(&Settings::new())), base);

        let settings = Settings::new().with("limit", 1).with("max_threads", 2);
        assert_eq!(
            settings_url(&base, Some(&settings)).as_str(),
            "http://localhost:8123/?limit=1&max_threads=2"
        );
    }

    #[test]
    fn test_settings_url_encodes_values() {
        let base = Url::parse("http://localhost:8123/").unwrap();
        let settings = Settings::new().with("log_comment", "a b&c");
        assert_eq!(
            settings_url(&base, Some(&settings)).as_str(),
            "http://localhost:8123/?log_comment=a+b%26c"
        );
    }
}
