//! Three-slot sliding window of recent samples.

use serde::Serialize;

use crate::types::Timestamp;

/// Number of samples kept for the rate estimate.
pub const WINDOW_LEN: usize = 3;

/// A single `(temperature, timestamp)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub temperature: f64,
    pub at: Timestamp,
}

/// Fixed-capacity window of the most recent samples, oldest first.
///
/// Pushing shifts every slot one step towards the front and writes the new
/// sample into the last slot, evicting the oldest once full. Slots that were
/// never written stay `None`, which is how cold start is detected.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    slots: [Option<Sample>; WINDOW_LEN],
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, temperature: f64, at: Timestamp) {
        self.slots.rotate_left(1);
        self.slots[WINDOW_LEN - 1] = Some(Sample { temperature, at });
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots[WINDOW_LEN - 1].is_none()
    }

    pub fn is_full(&self) -> bool {
        self.slots[0].is_some()
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.slots.iter().flatten()
    }

    /// Temperature change per second between the oldest and newest slot.
    ///
    /// `None` until the window is full, and when the two timestamps do not
    /// move forward (identical or out-of-order pushes). Negative values are
    /// returned as-is.
    pub fn rate_of_change(&self) -> Option<f64> {
        let [Some(oldest), _, Some(newest)] = self.slots else {
            return None;
        };

        let elapsed_secs = (newest.at - oldest.at).num_milliseconds() as f64 / 1000.0;
        if elapsed_secs <= 0.0 {
            return None;
        }

        Some((newest.temperature - oldest.temperature) / elapsed_secs)
    }

    /// The rate of change if it is strictly positive.
    ///
    /// A flat or falling temperature never signals warming.
    pub fn warming_rate(&self) -> Option<f64> {
        self.rate_of_change().filter(|rate| *rate > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap()
    }

    fn temps(window: &SampleWindow) -> Vec<f64> {
        window.samples().map(|s| s.temperature).collect()
    }

    #[test]
    fn empty_window_has_no_rate() {
        let window = SampleWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.rate_of_change(), None);
    }

    #[test]
    fn cold_start_has_no_rate() {
        let mut window = SampleWindow::new();
        window.push(20.0, t0());
        window.push(21.0, t0() + Duration::minutes(1));

        assert_eq!(window.len(), 2);
        assert!(!window.is_full());
        assert_eq!(window.rate_of_change(), None);
    }

    #[test]
    fn keeps_the_last_three_in_order() {
        let mut window = SampleWindow::new();
        for (i, t) in [20.0, 21.0, 22.0, 23.0].into_iter().enumerate() {
            window.push(t, t0() + Duration::minutes(i as i64));
        }

        assert_eq!(window.len(), 3);
        assert_eq!(temps(&window), vec![21.0, 22.0, 23.0]);
    }

    #[test]
    fn rate_spans_oldest_to_newest() {
        let mut window = SampleWindow::new();
        window.push(55.0, t0());
        window.push(57.5, t0() + Duration::minutes(3));
        window.push(60.0, t0() + Duration::minutes(6));

        let rate = window.rate_of_change().unwrap();
        assert!((rate - 5.0 / 360.0).abs() < 1e-12);
        assert_eq!(window.warming_rate(), Some(rate));
    }

    #[test]
    fn identical_timestamps_are_unavailable() {
        let mut window = SampleWindow::new();
        for t in [50.0, 55.0, 60.0] {
            window.push(t, t0());
        }

        assert!(window.is_full());
        assert_eq!(window.rate_of_change(), None);
    }

    #[test]
    fn falling_rate_is_inspectable_but_not_warming() {
        let mut window = SampleWindow::new();
        window.push(60.0, t0());
        window.push(58.0, t0() + Duration::minutes(1));
        window.push(56.0, t0() + Duration::minutes(2));

        assert!(window.rate_of_change().unwrap() < 0.0);
        assert_eq!(window.warming_rate(), None);
    }

    #[test]
    fn flat_rate_is_not_warming() {
        let mut window = SampleWindow::new();
        for i in 0..3 {
            window.push(30.0, t0() + Duration::minutes(i));
        }

        assert_eq!(window.rate_of_change(), Some(0.0));
        assert_eq!(window.warming_rate(), None);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity_and_tracks_latest(
            pushes in proptest::collection::vec(-40.0f64..120.0, 0..20)
        ) {
            let mut window = SampleWindow::new();
            for (i, t) in pushes.iter().enumerate() {
                window.push(*t, t0() + Duration::seconds(i as i64 * 10));
            }

            prop_assert!(window.len() <= WINDOW_LEN);
            prop_assert_eq!(window.len(), pushes.len().min(WINDOW_LEN));

            let expected: Vec<f64> = pushes
                .iter()
                .skip(pushes.len().saturating_sub(WINDOW_LEN))
                .copied()
                .collect();
            prop_assert_eq!(temps(&window), expected);
        }
    }
}
