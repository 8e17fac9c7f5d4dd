use crate::domain::{Recommendation, Report};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Portfolio-level roll-up of the stored reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total: usize,
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    pub average_profit_loss: Option<f64>,
    /// SELL recommendations hold a strict majority of the portfolio.
    pub rebalance_advised: bool,
    pub latest_timestamp: Option<DateTime<Utc>>,
}

impl PortfolioSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a Report>) -> Self {
        let (mut buy, mut sell, mut hold) = (0, 0, 0);
        let mut profit_loss_sum = 0.0;
        let mut latest_timestamp: Option<DateTime<Utc>> = None;

        for report in reports {
            match report.recommendation {
                Recommendation::Buy => buy += 1,
                Recommendation::Sell => sell += 1,
                Recommendation::Hold => hold += 1,
            }
            profit_loss_sum += report.basic_info.profit_loss;
            latest_timestamp = latest_timestamp.max(Some(report.timestamp));
        }

        let total = buy + sell + hold;
        Self {
            total,
            buy,
            sell,
            hold,
            average_profit_loss: (total > 0).then(|| profit_loss_sum / total as f64),
            rebalance_advised: sell * 2 > total,
            latest_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BasicInfo;
    use chrono::TimeZone;

    fn report(ticker: &str, hour: u32, recommendation: Recommendation, profit_loss: f64) -> Report {
        Report {
            ticker: ticker.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 22, hour, 0, 0).unwrap(),
            basic_info: BasicInfo {
                company_name: None,
                sector: None,
                industry: None,
                current_price: 100.0,
                avg_price: 90.0,
                profit_loss,
            },
            news: Vec::new(),
            recommendation,
            confidence: 0.7,
            reason: "test".to_string(),
            chart_image: None,
        }
    }

    #[test]
    fn empty_portfolio() {
        let summary = PortfolioSummary::from_reports(std::iter::empty());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_profit_loss, None);
        assert_eq!(summary.latest_timestamp, None);
        assert!(!summary.rebalance_advised);
    }

    #[test]
    fn counts_and_averages() {
        let reports = [
            report("RKLB", 2, Recommendation::Sell, 36.0),
            report("OKLO", 5, Recommendation::Sell, -42.0),
            report("SILC", 3, Recommendation::Hold, -33.0),
            report("GGLL", 1, Recommendation::Buy, 3.0),
        ];
        let summary = PortfolioSummary::from_reports(&reports);
        assert_eq!((summary.buy, summary.sell, summary.hold), (1, 2, 1));
        assert_eq!(summary.average_profit_loss, Some(-9.0));
        assert_eq!(
            summary.latest_timestamp,
            Some(Utc.with_ymd_and_hms(2026, 1, 22, 5, 0, 0).unwrap())
        );
        // 2 of 4 is not a majority.
        assert!(!summary.rebalance_advised);
    }

    #[test]
    fn sell_majority_advises_rebalance() {
        let reports = [
            report("OKLO", 1, Recommendation::Sell, -42.0),
            report("DFLI", 1, Recommendation::Sell, -70.0),
            report("CPA", 1, Recommendation::Hold, 15.0),
        ];
        assert!(PortfolioSummary::from_reports(&reports).rebalance_advised);
    }
}
