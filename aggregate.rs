use crate::structs::{AggregatedReading, Measurement};

/// Reduce a validated batch to its per-channel medians and latest timestamp.
/// Returns `None` for an empty batch.
pub fn aggregate(batch: &[Measurement]) -> Option<AggregatedReading> {
    let timestamp = batch.iter().map(|m| m.timestamp).max()?;
    Some(AggregatedReading {
        temperature: median(batch.iter().map(|m| m.temperature))?,
        pressure: median(batch.iter().map(|m| m.pressure))?,
        humidity: median(batch.iter().map(|m| m.humidity))?,
        timestamp,
    })
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.into_iter().collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn m(temperature: f64, pressure: f64, humidity: f64, sec: u32) -> Measurement {
        Measurement {
            temperature,
            pressure,
            humidity,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, sec).unwrap(),
            sensor_latency: Duration::from_millis(1),
        }
    }

    #[test]
    fn medians_and_latest_timestamp() {
        let batch = vec![
            m(20.5, 1013.2, 45.2, 7),
            m(20.6, 1013.3, 45.3, 9),
            m(20.4, 1013.1, 45.1, 8),
        ];
        let agg = aggregate(&batch).unwrap();
        assert_eq!(agg.temperature, 20.5);
        assert_eq!(agg.pressure, 1013.2);
        assert_eq!(agg.humidity, 45.2);
        assert_eq!(agg.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 9).unwrap());
    }

    #[test]
    fn even_count_averages_middle_pair() {
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median([7.0]), Some(7.0));
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn median_ignores_outlier() {
        assert_eq!(median([20.1, 20.2, 85.0, 20.0, 20.3]), Some(20.2));
    }

    #[test]
    fn empty_batch_has_no_aggregate() {
        assert!(aggregate(&[]).is_none());
    }
}
