use std::time::Duration;

/// Formats a duration as `HH:MM:SS.mmm`. Hours grow past two digits as needed.
pub fn time_str(sec: f64) -> String {
    let total_ms = Duration::from_secs_f64(sec.max(0.0)).as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1000 % 60;
    let millis = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Seconds covered by `samples` at `rate` Hz.
pub fn samples_to_secs(samples: u64, rate: u32) -> f64 {
    if rate == 0 {
        0.0
    } else {
        samples as f64 / rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(time_str(0.0), "00:00:00.000");
        assert_eq!(time_str(3723.25), "01:02:03.250");
        assert_eq!(time_str(360_000.0), "100:00:00.000");
        assert_eq!(time_str(samples_to_secs(44100 * 90, 44100)), "00:01:30.000");
    }
}
