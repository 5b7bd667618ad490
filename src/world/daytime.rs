use std::time::{Duration, Instant};

use glam::Vec3;

use crate::constants::HOURS_PER_DAY;

/// Daylight intensity the sky switches to when the clock reaches `hour`.
/// Hours not listed keep the previous value.
pub fn target_daylight(hour: u8, min_light: f32, max_light: f32) -> Option<f32> {
    match hour {
        18 => Some(0.8 * max_light),
        20 => Some(0.6 * max_light),
        21 => Some(0.4 * max_light),
        22 => Some(0.2 * max_light),
        23 => Some(min_light),
        5 => Some(0.4 * max_light),
        6 => Some(0.6 * max_light),
        7 => Some(0.8 * max_light),
        8 => Some(max_light),
        _ => None,
    }
}

/// Sky tint for a daylight intensity.
pub fn daylight_color(daylight: f32) -> Vec3 {
    Vec3::new(daylight * 0.55, daylight * 0.85, daylight * 0.99)
}

/// In-world clock. One hour passes every `interval` of wall time.
#[derive(Debug)]
pub struct DayCycle {
    hour: u8,
    daylight: f32,
    min_light: f32,
    max_light: f32,
    interval: Duration,
    last_tick: Instant,
}

impl DayCycle {
    pub fn new(start_hour: u8, interval: Duration, min_light: f32, max_light: f32, now: Instant) -> Self {
        Self {
            hour: start_hour % HOURS_PER_DAY,
            daylight: max_light,
            min_light,
            max_light,
            interval,
            last_tick: now,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn daylight(&self) -> f32 {
        self.daylight
    }

    /// Moves the clock forward one hour. Returns the new daylight if it
    /// changed.
    pub fn advance_hour(&mut self) -> Option<f32> {
        self.hour = (self.hour + 1) % HOURS_PER_DAY;
        self.apply_hour()
    }

    /// Jumps the clock to `hour` and applies that hour's daylight, if any.
    pub fn set_hour(&mut self, hour: u8) -> Option<f32> {
        self.hour = hour % HOURS_PER_DAY;
        self.apply_hour()
    }

    /// Advances one hour if a full interval has elapsed since the last tick.
    pub fn update(&mut self, now: Instant) -> Option<f32> {
        if now.saturating_duration_since(self.last_tick) < self.interval {
            return None;
        }
        self.last_tick = now;
        self.advance_hour()
    }

    fn apply_hour(&mut self) -> Option<f32> {
        let target = target_daylight(self.hour, self.min_light, self.max_light)?;
        if target == self.daylight {
            return None;
        }
        self.daylight = target;
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(start_hour: u8) -> DayCycle {
        DayCycle::new(start_hour, Duration::from_secs(30), 0.1, 1.0, Instant::now())
    }

    #[test]
    fn test_full_day_sequence() {
        let mut day = cycle(17);
        assert_eq!(day.daylight(), 1.0);

        let mut seen = Vec::new();
        for _ in 0..24 {
            day.advance_hour();
            seen.push((day.hour(), day.daylight()));
        }

        assert_eq!(seen[0], (18, 0.8));
        assert_eq!(seen[1], (19, 0.8));
        assert_eq!(seen[2], (20, 0.6));
        assert_eq!(seen[5], (23, 0.1));
        assert_eq!(seen[6], (0, 0.1));
        assert_eq!(seen[12], (6, 0.6));
        assert_eq!(seen[15], (9, 1.0));
        assert_eq!(seen[23], (17, 1.0));
    }

    #[test]
    fn test_unchanged_daylight_reports_nothing() {
        let mut day = cycle(17);
        assert_eq!(day.advance_hour(), Some(0.8));
        // 19h has no entry
        assert_eq!(day.advance_hour(), None);
        assert_eq!(day.set_hour(8), Some(1.0));
        assert_eq!(day.set_hour(8), None);
    }

    #[test]
    fn test_update_waits_for_interval() {
        let start = Instant::now();
        let mut day = DayCycle::new(17, Duration::from_secs(30), 0.1, 1.0, start);
        assert_eq!(day.update(start + Duration::from_secs(10)), None);
        assert_eq!(day.hour(), 17);
        assert_eq!(day.update(start + Duration::from_secs(30)), Some(0.8));
        assert_eq!(day.hour(), 18);
        assert_eq!(day.update(start + Duration::from_secs(40)), None);
        assert_eq!(day.hour(), 18);
    }

    #[test]
    fn test_daylight_color() {
        let color = daylight_color(1.0);
        assert_eq!(color, Vec3::new(0.55, 0.85, 0.99));
        assert_eq!(daylight_color(0.0), Vec3::ZERO);
    }
}
