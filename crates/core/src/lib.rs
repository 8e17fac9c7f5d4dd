pub mod domain;
pub mod ingest;
pub mod storage;
pub mod summary;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::time::timestamp::DEFAULT_NAIVE_UTC_OFFSET_SECS;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub reports_path: Option<String>,
        pub naive_utc_offset_secs: i32,
        pub strict_ingest: bool,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let naive_utc_offset_secs = match get("REPORT_NAIVE_UTC_OFFSET_SECS") {
                Some(s) => parse_naive_utc_offset(&s)?,
                None => DEFAULT_NAIVE_UTC_OFFSET_SECS,
            };

            Ok(Self {
                sentry_dsn: get("SENTRY_DSN"),
                reports_path: get("REPORTS_PATH").filter(|s| !s.trim().is_empty()),
                naive_utc_offset_secs,
                strict_ingest: get("REPORT_INGEST_STRICT")
                    .map(|s| parse_flag(&s))
                    .unwrap_or(false),
            })
        }

        pub fn require_reports_path(&self) -> anyhow::Result<&str> {
            self.reports_path
                .as_deref()
                .context("REPORTS_PATH is required")
        }

        pub fn ingest_options(&self) -> crate::storage::IngestOptions {
            crate::storage::IngestOptions {
                strict: self.strict_ingest,
                naive_utc_offset_secs: self.naive_utc_offset_secs,
            }
        }
    }

    fn parse_naive_utc_offset(s: &str) -> anyhow::Result<i32> {
        let secs = s
            .trim()
            .parse::<i32>()
            .with_context(|| format!("REPORT_NAIVE_UTC_OFFSET_SECS is not an integer: {s}"))?;
        anyhow::ensure!(
            secs.unsigned_abs() < 24 * 3600,
            "REPORT_NAIVE_UTC_OFFSET_SECS must be within +/-86399 (got {secs})"
        );
        Ok(secs)
    }

    fn parse_flag(s: &str) -> bool {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings_from(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let vars: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| vars.get(key).cloned())
        }

        #[test]
        fn defaults_when_env_is_empty() {
            let settings = settings_from(&[]).unwrap();
            assert_eq!(settings.naive_utc_offset_secs, DEFAULT_NAIVE_UTC_OFFSET_SECS);
            assert_eq!(settings.reports_path, None);
            assert!(!settings.strict_ingest);
        }

        #[test]
        fn reads_offset_path_and_strict_flag() {
            let settings = settings_from(&[
                ("REPORT_NAIVE_UTC_OFFSET_SECS", " -18000 "),
                ("REPORTS_PATH", "dashboard/data.js"),
                ("REPORT_INGEST_STRICT", "true"),
            ])
            .unwrap();
            assert_eq!(settings.naive_utc_offset_secs, -18000);
            assert_eq!(settings.reports_path.as_deref(), Some("dashboard/data.js"));
            assert!(settings.strict_ingest);
            assert!(settings.ingest_options().strict);
        }

        #[test]
        fn blank_reports_path_is_unset() {
            let settings = settings_from(&[("REPORTS_PATH", "  ")]).unwrap();
            assert!(settings.require_reports_path().is_err());
        }

        #[test]
        fn rejects_out_of_range_offset() {
            assert!(settings_from(&[("REPORT_NAIVE_UTC_OFFSET_SECS", "86400")]).is_err());
            assert!(settings_from(&[("REPORT_NAIVE_UTC_OFFSET_SECS", "-86400")]).is_err());
            assert_eq!(parse_naive_utc_offset("86399").unwrap(), 86399);
        }

        #[test]
        fn rejects_i32_min_offset_without_overflow() {
            let err = settings_from(&[("REPORT_NAIVE_UTC_OFFSET_SECS", "-2147483648")]).unwrap_err();
            assert!(err.to_string().contains("must be within"));
        }

        #[test]
        fn rejects_non_integer_offset() {
            let err = settings_from(&[("REPORT_NAIVE_UTC_OFFSET_SECS", "+9h")]).unwrap_err();
            assert!(err.to_string().contains("not an integer"));
        }

        #[test]
        fn parse_flag_accepts_common_truthy_values() {
            assert!(parse_flag("1"));
            assert!(parse_flag(" TRUE "));
            assert!(parse_flag("yes"));
            assert!(!parse_flag("0"));
            assert!(!parse_flag("false"));
            assert!(!parse_flag(""));
        }
    }
}
