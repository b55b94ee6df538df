use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const REFRESH_HOUR: i64 = 9;

/// Cron strings the scheduler answers to, and the cycle each one runs.
const TRIGGERS: [(&str, Trigger); 2] = [
    ("0 9 * * *", Trigger::RefreshFeeds),
    ("0 * * * *", Trigger::SearchNews),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Daily at 09:00 UTC: one `rss_atom` work item per feed source.
    RefreshFeeds,
    /// Hourly: one `searcher` work item per selected keyword.
    SearchNews,
}

impl Trigger {
    pub const ALL: [Trigger; 2] = [Trigger::RefreshFeeds, Trigger::SearchNews];

    pub fn from_cron(cron: &str) -> Option<Self> {
        let cron = cron.trim();
        TRIGGERS
            .iter()
            .find(|(expr, _)| *expr == cron)
            .map(|(_, trigger)| *trigger)
    }

    pub fn cron(&self) -> &'static str {
        match self {
            Trigger::RefreshFeeds => TRIGGERS[0].0,
            Trigger::SearchNews => TRIGGERS[1].0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::RefreshFeeds => "refresh_feeds",
            Trigger::SearchNews => "search_news",
        }
    }

    /// First fire time strictly after `after`, in UTC.
    pub fn next_fire(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let secs = after.timestamp();
        let next = match self {
            Trigger::SearchNews => (secs.div_euclid(HOUR) + 1) * HOUR,
            Trigger::RefreshFeeds => {
                let today = secs.div_euclid(DAY) * DAY + REFRESH_HOUR * HOUR;
                if today > secs {
                    today
                } else {
                    today + DAY
                }
            }
        };
        let whole_second = after - Duration::nanoseconds(i64::from(after.timestamp_subsec_nanos()));
        whole_second + Duration::seconds(next - secs)
    }
}
