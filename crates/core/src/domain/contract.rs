use crate::domain::error::ValidationError;
use crate::domain::report::{BasicInfo, NewsItem, Recommendation, Report};
use crate::time::timestamp::parse_report_timestamp;
use serde_json::{Map, Value};

const MAX_TICKER_LEN: usize = 16;

// Strings the upstream generator writes when it has no data for a field.
const SENTINELS: [&str; 5] = ["n/a", "na", "unknown", "none", "-"];

/// Returns true when `s` stands in for "no data".
pub fn is_sentinel(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || SENTINELS.iter().any(|sentinel| s.eq_ignore_ascii_case(sentinel))
}

/// Trims and upper-cases a ticker, rejecting anything that isn't a short symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, String> {
    let ticker = raw.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err("ticker must be non-empty".to_string());
    }
    if ticker.chars().count() > MAX_TICKER_LEN {
        return Err(format!(
            "ticker must be at most {MAX_TICKER_LEN} characters (got {ticker:?})"
        ));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_')))
    {
        return Err(format!("ticker contains invalid character {c:?}"));
    }
    Ok(ticker)
}

/// Validates one raw record of a batch into a [`Report`].
///
/// Every violated field is reported, not only the first one.
pub fn validate_record(
    index: usize,
    raw: &Value,
    naive_utc_offset_secs: i32,
) -> Result<Report, Vec<ValidationError>> {
    let mut v = RecordValidator {
        index,
        ticker: None,
        errors: Vec::new(),
    };

    let Some(obj) = raw.as_object() else {
        v.push("record", format!("expected a JSON object (got {})", kind(raw)));
        return Err(v.errors);
    };

    let ticker = v
        .required_str(obj, "ticker")
        .and_then(|s| normalize_ticker(s).map_err(|e| v.push("ticker", e)).ok());
    v.ticker = ticker.clone();

    let timestamp = v.required_str(obj, "timestamp").and_then(|s| {
        parse_report_timestamp(s, naive_utc_offset_secs)
            .map_err(|e| v.push("timestamp", e))
            .ok()
    });

    let basic_info = v.basic_info(obj);
    let news = v.news(obj);

    let recommendation = v.required_str(obj, "recommendation").and_then(|s| {
        s.parse::<Recommendation>()
            .map_err(|e| v.push("recommendation", e))
            .ok()
    });

    let confidence = v.required_f64(obj, "confidence").and_then(|c| {
        if (0.0..=1.0).contains(&c) {
            Some(c)
        } else {
            v.push(
                "confidence",
                format!("confidence must be between 0 and 1 (got {c})"),
            );
            None
        }
    });

    let reason = v.required_str(obj, "reason").and_then(|s| {
        let s = s.trim();
        if s.is_empty() {
            v.push("reason", "reason must be non-empty");
            None
        } else {
            Some(s.to_string())
        }
    });

    let chart_image = v.optional_text(obj.get("chart_image"), "chart_image");

    if !v.errors.is_empty() {
        return Err(v.errors);
    }

    match (
        ticker,
        timestamp,
        basic_info,
        news,
        recommendation,
        confidence,
        reason,
    ) {
        (
            Some(ticker),
            Some(timestamp),
            Some(basic_info),
            Some(news),
            Some(recommendation),
            Some(confidence),
            Some(reason),
        ) => Ok(Report {
            ticker,
            timestamp,
            basic_info,
            news,
            recommendation,
            confidence,
            reason,
            chart_image,
        }),
        _ => {
            // Every `None` above records an error, so this is unreachable in practice.
            v.push("record", "incomplete record");
            Err(v.errors)
        }
    }
}

struct RecordValidator {
    index: usize,
    ticker: Option<String>,
    errors: Vec<ValidationError>,
}

impl RecordValidator {
    fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(ValidationError {
            index: self.index,
            ticker: self.ticker.clone(),
            field: field.into(),
            reason: reason.into(),
        });
    }

    fn required_str<'a>(&mut self, obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
        match obj.get(field) {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Null) | None => {
                self.push(field, "missing required field");
                None
            }
            Some(other) => {
                self.push(field, format!("expected a string (got {})", kind(other)));
                None
            }
        }
    }

    fn required_f64(&mut self, obj: &Map<String, Value>, field: &str) -> Option<f64> {
        self.number_at(obj.get(field), field)
    }

    fn number_at(&mut self, value: Option<&Value>, path: &str) -> Option<f64> {
        match value {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(x) if x.is_finite() => Some(x),
                _ => {
                    self.push(path, "number is not finite");
                    None
                }
            },
            Some(Value::Null) | None => {
                self.push(path, "missing required field");
                None
            }
            Some(other) => {
                self.push(path, format!("expected a number (got {})", kind(other)));
                None
            }
        }
    }

    fn non_negative_at(&mut self, value: Option<&Value>, path: &str) -> Option<f64> {
        let x = self.number_at(value, path)?;
        if x < 0.0 {
            self.push(path, format!("must be >= 0 (got {x})"));
            return None;
        }
        Some(x)
    }

    /// Free text where sentinels, empty strings and null all mean "absent".
    fn optional_text(&mut self, value: Option<&Value>, path: &str) -> Option<String> {
        match value {
            Some(Value::String(s)) if is_sentinel(s) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Null) | None => None,
            Some(other) => {
                self.push(path, format!("expected a string or null (got {})", kind(other)));
                None
            }
        }
    }

    fn basic_info(&mut self, obj: &Map<String, Value>) -> Option<BasicInfo> {
        let info = match obj.get("basic_info") {
            Some(Value::Object(info)) => info,
            Some(Value::Null) | None => {
                self.push("basic_info", "missing required field");
                return None;
            }
            Some(other) => {
                self.push(
                    "basic_info",
                    format!("expected an object (got {})", kind(other)),
                );
                return None;
            }
        };

        let company_name = self.optional_text(info.get("company_name"), "basic_info.company_name");
        let sector = self.optional_text(info.get("sector"), "basic_info.sector");
        let industry = self.optional_text(info.get("industry"), "basic_info.industry");
        let current_price =
            self.non_negative_at(info.get("current_price"), "basic_info.current_price");
        let avg_price = self.non_negative_at(info.get("avg_price"), "basic_info.avg_price");
        let profit_loss = self.number_at(info.get("profit_loss"), "basic_info.profit_loss");

        Some(BasicInfo {
            company_name,
            sector,
            industry,
            current_price: current_price?,
            avg_price: avg_price?,
            profit_loss: profit_loss?,
        })
    }

    fn news(&mut self, obj: &Map<String, Value>) -> Option<Vec<NewsItem>> {
        let items = match obj.get("news") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Some(Vec::new()),
            Some(other) => {
                self.push("news", format!("expected an array (got {})", kind(other)));
                return None;
            }
        };

        let before = self.errors.len();
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let Some(item) = item.as_object() else {
                self.push(
                    format!("news[{i}]"),
                    format!("expected an object (got {})", kind(item)),
                );
                continue;
            };
            let news_item = NewsItem {
                title: self.optional_text(item.get("title"), &format!("news[{i}].title")),
                publisher: self
                    .optional_text(item.get("publisher"), &format!("news[{i}].publisher")),
                link: self.optional_text(item.get("link"), &format!("news[{i}].link")),
            };
            if !news_item.is_placeholder() {
                out.push(news_item);
            }
        }

        (self.errors.len() == before).then_some(out)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::timestamp::DEFAULT_NAIVE_UTC_OFFSET_SECS;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn rklb() -> Value {
        json!({
            "ticker": "RKLB",
            "timestamp": "2026-01-22T11:35:21.863855",
            "basic_info": {
                "company_name": "Rocket Lab Corporation",
                "sector": "Industrials",
                "industry": "Aerospace & Defense",
                "current_price": 168.96,
                "avg_price": 62.12,
                "profit_loss": 35.99
            },
            "news": [
                {"title": "N/A", "publisher": "N/A", "link": "N/A"},
                {"title": "N/A", "publisher": "N/A", "link": "N/A"}
            ],
            "recommendation": "SELL",
            "confidence": 0.8,
            "reason": "take profit at +35.99%",
            "chart_image": null
        })
    }

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_producer_shaped_record() {
        let report = validate_record(0, &rklb(), DEFAULT_NAIVE_UTC_OFFSET_SECS).unwrap();
        assert_eq!(report.ticker, "RKLB");
        assert_eq!(report.recommendation, Recommendation::Sell);
        assert_eq!(report.basic_info.company_name.as_deref(), Some("Rocket Lab Corporation"));
        assert_eq!(report.basic_info.profit_loss, 35.99);
        assert!(report.news.is_empty(), "placeholder news must be dropped");
        assert_eq!(report.chart_image, None);
        assert_eq!(
            report.timestamp,
            Utc.with_ymd_and_hms(2026, 1, 22, 2, 35, 21).unwrap()
                + chrono::Duration::microseconds(863_855)
        );
    }

    #[test]
    fn sentinel_basic_info_becomes_absent() {
        let mut raw = rklb();
        raw["basic_info"]["sector"] = json!("unknown");
        raw["basic_info"]["industry"] = json!("  ");
        let report = validate_record(0, &raw, 0).unwrap();
        assert_eq!(report.basic_info.sector, None);
        assert_eq!(report.basic_info.industry, None);
    }

    #[test]
    fn keeps_partially_filled_news_in_order() {
        let mut raw = rklb();
        raw["news"] = json!([
            {"title": "Neutron update", "publisher": "N/A", "link": "N/A"},
            {"title": "N/A", "publisher": "N/A", "link": "N/A"},
            {"title": "Backlog grows", "publisher": "Wire", "link": "https://example.com/a"}
        ]);
        let report = validate_record(0, &raw, 0).unwrap();
        assert_eq!(report.news.len(), 2);
        assert_eq!(report.news[0].title.as_deref(), Some("Neutron update"));
        assert_eq!(report.news[0].publisher, None);
        assert_eq!(report.news[1].link.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut raw = rklb();
        raw["confidence"] = json!(1.5);
        let errors = validate_record(3, &raw, 0).unwrap_err();
        assert_eq!(fields(&errors), vec!["confidence"]);
        assert_eq!(errors[0].ticker.as_deref(), Some("RKLB"));
        assert_eq!(errors[0].index, 3);
    }

    #[test]
    fn rejects_unknown_recommendation() {
        let mut raw = rklb();
        raw["recommendation"] = json!("MAYBE");
        let errors = validate_record(0, &raw, 0).unwrap_err();
        assert_eq!(fields(&errors), vec!["recommendation"]);
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let mut raw = rklb();
        raw["timestamp"] = json!("22/01/2026");
        let errors = validate_record(0, &raw, 0).unwrap_err();
        assert_eq!(fields(&errors), vec!["timestamp"]);
    }

    #[test]
    fn collects_every_field_error() {
        let mut raw = rklb();
        raw["ticker"] = json!(" rklb ");
        raw["basic_info"]["current_price"] = json!(-1.0);
        raw["basic_info"]["avg_price"] = json!("62.12");
        raw["reason"] = json!("");
        raw["chart_image"] = json!(42);
        let errors = validate_record(0, &raw, 0).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                "basic_info.current_price",
                "basic_info.avg_price",
                "reason",
                "chart_image"
            ]
        );
        assert!(errors.iter().all(|e| e.ticker.as_deref() == Some("RKLB")));
    }

    #[test]
    fn missing_ticker_leaves_error_ticker_empty() {
        let mut raw = rklb();
        raw.as_object_mut().unwrap().remove("ticker");
        let errors = validate_record(0, &raw, 0).unwrap_err();
        assert_eq!(fields(&errors), vec!["ticker"]);
        assert_eq!(errors[0].ticker, None);
    }

    #[test]
    fn negative_profit_loss_is_allowed() {
        let mut raw = rklb();
        raw["basic_info"]["profit_loss"] = json!(-70.95);
        let report = validate_record(0, &raw, 0).unwrap();
        assert_eq!(report.basic_info.profit_loss, -70.95);
    }

    #[test]
    fn rejects_non_object_record() {
        let errors = validate_record(7, &json!([1, 2]), 0).unwrap_err();
        assert_eq!(fields(&errors), vec!["record"]);
    }

    #[test]
    fn normalize_ticker_rules() {
        assert_eq!(normalize_ticker(" iOnQ ").unwrap(), "IONQ");
        assert_eq!(normalize_ticker("KRX:005930").unwrap(), "KRX:005930");
        assert!(normalize_ticker("").is_err());
        assert!(normalize_ticker("BRK B").is_err());
        assert!(normalize_ticker("ABCDEFGHIJKLMNOPQ").is_err());
    }
}
