use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};
use tracing::debug;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapCell {
    pub day: &'static str,
    pub hour: u8,
    pub count: u32,
}

/// Day-of-week and hour-of-day histograms over a batch of sale timestamps,
/// plus the full 7x24 heatmap. All seven day buckets and all 24 hour buckets
/// are always present, zeroes included.
#[derive(Debug, Clone)]
pub struct TimePattern {
    pub day_of_week: [u32; 7],
    pub hour_of_day: [u32; 24],
    pub heatmap: Vec<HeatmapCell>,
    pub parsed: usize,
    pub skipped: usize,
}

impl TimePattern {
    pub fn day_count(&self, day: &str) -> u32 {
        DAY_NAMES
            .iter()
            .position(|d| *d == day)
            .map(|i| self.day_of_week[i])
            .unwrap_or(0)
    }
}

/// Buckets UTC timestamps into a fixed display timezone given as a whole-hour
/// offset. The offset is configuration, not the runtime's local zone; the
/// source data's home market sits at UTC+9.
pub struct TimePatternAnalyzer {
    utc_offset_hours: i32,
}

impl TimePatternAnalyzer {
    pub fn new(utc_offset_hours: i32) -> Self {
        Self { utc_offset_hours }
    }

    /// Unparseable inputs are skipped and tallied; they never abort the
    /// batch. Invariant: the day, hour and heatmap totals all equal `parsed`.
    pub fn analyze(&self, timestamps: &[String]) -> TimePattern {
        let mut day_of_week = [0u32; 7];
        let mut hour_of_day = [0u32; 24];
        let mut grid = [[0u32; 24]; 7];
        let mut parsed = 0usize;
        let mut skipped = 0usize;

        for raw in timestamps {
            let Some(utc) = parse_timestamp(raw) else {
                debug!("skipping unparseable timestamp: {raw}");
                skipped += 1;
                continue;
            };

            let display_hour =
                (utc.hour() as i32 + self.utc_offset_hours).rem_euclid(24) as usize;
            let shifted = utc + Duration::hours(self.utc_offset_hours as i64);
            let day_index = shifted.weekday().num_days_from_sunday() as usize;

            day_of_week[day_index] += 1;
            hour_of_day[display_hour] += 1;
            grid[day_index][display_hour] += 1;
            parsed += 1;
        }

        let heatmap = DAY_NAMES
            .iter()
            .enumerate()
            .flat_map(|(di, day)| {
                (0..24).map(move |hour| HeatmapCell {
                    day,
                    hour: hour as u8,
                    count: grid[di][hour],
                })
            })
            .collect();

        TimePattern {
            day_of_week,
            hour_of_day,
            heatmap,
            parsed,
            skipped,
        }
    }
}

/// RFC 3339 first, then the backend's bare `YYYY-MM-DD HH:MM:SS` form
/// interpreted as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_sunday_evening_lands_on_monday_midnight_in_plus_nine() {
        let analyzer = TimePatternAnalyzer::new(9);
        let pattern = analyzer.analyze(&["2024-01-07T15:00:00Z".to_string()]);

        // 15:00 UTC + 9 = 00:00 the next day.
        assert_eq!(pattern.hour_of_day[0], 1);
        assert_eq!(pattern.day_count("Monday"), 1);
        assert_eq!(pattern.day_count("Sunday"), 0);
        assert_eq!(pattern.heatmap.iter().map(|c| c.count).sum::<u32>(), 1);
    }

    #[test]
    fn invalid_strings_are_skipped_not_fatal() {
        let analyzer = TimePatternAnalyzer::new(9);
        let pattern = analyzer.analyze(&[
            "not a date".to_string(),
            "2024-01-07T15:00:00Z".to_string(),
            "".to_string(),
        ]);

        assert_eq!(pattern.parsed, 1);
        assert_eq!(pattern.skipped, 2);
        assert_eq!(pattern.day_of_week.iter().sum::<u32>(), 1);
    }

    #[test]
    fn totals_agree_across_all_three_aggregates() {
        let analyzer = TimePatternAnalyzer::new(9);
        let inputs: Vec<String> = vec![
            "2024-03-01T02:30:00Z".to_string(),
            "2024-03-01T23:10:00Z".to_string(),
            "2024-03-02 08:00:00".to_string(),
            "garbage".to_string(),
            "2024-03-03T18:45:00+00:00".to_string(),
        ];
        let pattern = analyzer.analyze(&inputs);

        let day_total: u32 = pattern.day_of_week.iter().sum();
        let hour_total: u32 = pattern.hour_of_day.iter().sum();
        let heat_total: u32 = pattern.heatmap.iter().map(|c| c.count).sum();
        assert_eq!(day_total, pattern.parsed as u32);
        assert_eq!(hour_total, pattern.parsed as u32);
        assert_eq!(heat_total, pattern.parsed as u32);
        assert_eq!(pattern.parsed, 4);
        assert_eq!(pattern.skipped, 1);
    }

    #[test]
    fn heatmap_always_carries_all_168_cells() {
        let analyzer = TimePatternAnalyzer::new(9);
        let pattern = analyzer.analyze(&[]);
        assert_eq!(pattern.heatmap.len(), 7 * 24);
        assert!(pattern.heatmap.iter().all(|c| c.count == 0));
    }

    #[test]
    fn negative_offset_wraps_backwards() {
        let analyzer = TimePatternAnalyzer::new(-5);
        // 02:00 UTC Monday - 5h = 21:00 Sunday.
        let pattern = analyzer.analyze(&["2024-01-08T02:00:00Z".to_string()]);
        assert_eq!(pattern.hour_of_day[21], 1);
        assert_eq!(pattern.day_count("Sunday"), 1);
    }

    #[test]
    fn offset_zero_keeps_utc_buckets() {
        let analyzer = TimePatternAnalyzer::new(0);
        let pattern = analyzer.analyze(&["2024-01-07T15:00:00Z".to_string()]);
        assert_eq!(pattern.hour_of_day[15], 1);
        assert_eq!(pattern.day_count("Sunday"), 1);
    }
}
