//! Tick placement for time and frequency axes.

/// Candidate time tick intervals in seconds: 1-2-5 steps below ten seconds,
/// then the spacings people read off a clock.
const TICK_INTERVALS: [f64; 18] = [
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0,
];

/// Label for a time tick. Whole-second intervals read `m:ss`, finer ones
/// show fractional seconds.
pub fn format_time_label(seconds: f64, interval: f64) -> String {
    if interval >= 1.0 {
        let total = seconds.round() as u64;
        return format!("{}:{:02}", total / 60, total % 60);
    }
    let decimals = if interval >= 0.1 { 1 } else { 2 };
    format!("{seconds:.decimals$}s")
}

/// Tick times in `[0, duration)` for a time axis `axis_px` pixels long.
///
/// Starts from the theme's `preferred` interval. When that gives fewer than
/// two ticks or packs labels closer than `min_spacing_px`, the smallest nice
/// interval keeping labels at least that far apart is used instead.
pub fn time_ticks(duration: f64, preferred: f64, axis_px: f64, min_spacing_px: f64) -> (f64, Vec<f64>) {
    if duration <= 0.0 || axis_px <= 0.0 {
        return (preferred, Vec::new());
    }
    let px_per_sec = axis_px / duration;
    let min_interval = min_spacing_px / px_per_sec;

    let fits = |interval: f64| interval > 0.0 && interval >= min_interval && duration / interval >= 1.0;
    let interval = if fits(preferred) {
        preferred
    } else {
        TICK_INTERVALS
            .into_iter()
            .find(|&i| i >= min_interval)
            .unwrap_or(TICK_INTERVALS[TICK_INTERVALS.len() - 1])
    };

    let end = duration - interval * 1e-6;
    let ticks = (0..).map(|i| i as f64 * interval).take_while(|&t| t < end).collect();
    (interval, ticks)
}

const FREQ_STEPS: [f64; 12] = [
    10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1_000.0, 2_000.0, 2_500.0, 5_000.0, 10_000.0, 20_000.0,
];

/// Evenly stepped frequency ticks in `(0, max_freq]`, at most `max_ticks` of them.
pub fn freq_ticks(max_freq: f64, max_ticks: usize) -> Vec<f64> {
    if max_freq <= 0.0 || max_ticks == 0 {
        return Vec::new();
    }
    let step = FREQ_STEPS
        .into_iter()
        .find(|&s| max_freq / s <= max_ticks as f64)
        .unwrap_or(FREQ_STEPS[FREQ_STEPS.len() - 1]);
    (1..)
        .map(|i| i as f64 * step)
        .take_while(|&f| f <= max_freq + 1e-6)
        .collect()
}
