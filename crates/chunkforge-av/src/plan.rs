//! Chunk planning.
//!
//! Partitions a media duration into ordered, possibly-overlapping time
//! windows. Pure arithmetic: nothing here touches the filesystem or spawns a
//! process, so plans can be computed and checked before any media tool runs.

use chunkforge_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One planned sub-clip: `[start, end)` in seconds, 1-based `index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkWindow {
    /// Position in the plan, starting at 1.
    pub index: u32,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds (exclusive).
    pub end: f64,
}

impl ChunkWindow {
    /// Window length in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Validated chunk length and overlap.
///
/// Construction enforces `chunk_length > 0` and `0 <= overlap < chunk_length`,
/// which guarantees every step of the planner moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanParams {
    chunk_length: f64,
    overlap: f64,
}

impl PlanParams {
    /// Default chunk length in seconds.
    pub const DEFAULT_CHUNK_LENGTH: f64 = 60.0;
    /// Default overlap in seconds.
    pub const DEFAULT_OVERLAP: f64 = 10.0;

    /// Validate and build plan parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPlanParameters`] when the chunk length is not a
    /// positive finite number, or the overlap is negative, non-finite, or not
    /// strictly smaller than the chunk length.
    pub fn new(chunk_length: f64, overlap: f64) -> Result<Self> {
        if !chunk_length.is_finite() || chunk_length <= 0.0 {
            return Err(Error::invalid_plan(format!(
                "chunk length must be a positive number of seconds, got {chunk_length}"
            )));
        }
        if !overlap.is_finite() || overlap < 0.0 {
            return Err(Error::invalid_plan(format!(
                "overlap must be zero or a positive number of seconds, got {overlap}"
            )));
        }
        if overlap >= chunk_length {
            return Err(Error::invalid_plan(format!(
                "overlap ({overlap}s) must be smaller than chunk length ({chunk_length}s)"
            )));
        }

        Ok(Self {
            chunk_length,
            overlap,
        })
    }

    /// Chunk length in seconds.
    pub fn chunk_length(&self) -> f64 {
        self.chunk_length
    }

    /// Overlap between consecutive chunks in seconds.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> f64 {
        self.chunk_length - self.overlap
    }
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            chunk_length: Self::DEFAULT_CHUNK_LENGTH,
            overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

fn check_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(Error::invalid_plan(format!(
            "duration must be a positive number of seconds, got {duration}"
        )));
    }
    Ok(())
}

/// Number of windows [`plan`] would produce, without allocating them.
pub fn window_count(duration: f64, params: &PlanParams) -> Result<usize> {
    check_duration(duration)?;

    if duration <= params.chunk_length {
        return Ok(1);
    }

    let step = params.step();
    let too_many = || {
        Error::invalid_plan(format!(
            "{duration}s split into {}s chunks with {}s overlap yields too many windows",
            params.chunk_length, params.overlap
        ))
    };

    // Index of the last window: the first start from which one chunk reaches
    // the end. The division only estimates it; the loops settle it with the
    // same arithmetic `plan` uses for window starts.
    let estimate = ((duration - params.chunk_length) / step).ceil();
    if !estimate.is_finite() || estimate >= u32::MAX as f64 {
        return Err(too_many());
    }

    let mut last = estimate as usize;
    while duration - last as f64 * step > params.chunk_length {
        last += 1;
    }
    while last > 0 && duration - (last - 1) as f64 * step <= params.chunk_length {
        last -= 1;
    }

    if last >= u32::MAX as usize {
        return Err(too_many());
    }

    Ok(last + 1)
}

/// Compute the ordered chunk windows for `duration`.
///
/// Windows start at `0` and advance by `chunk_length - overlap`. Every window
/// but the last spans exactly `chunk_length`; the last ends exactly at
/// `duration`. A duration no longer than one chunk yields a single window.
///
/// # Example
///
/// ```
/// use chunkforge_av::plan::{plan, PlanParams};
///
/// let params = PlanParams::new(60.0, 10.0)?;
/// let windows = plan(300.0, &params)?;
/// assert_eq!(windows.len(), 6);
/// assert_eq!((windows[1].start, windows[1].end), (50.0, 110.0));
/// assert_eq!(windows[5].end, 300.0);
/// # Ok::<(), chunkforge_common::Error>(())
/// ```
pub fn plan(duration: f64, params: &PlanParams) -> Result<Vec<ChunkWindow>> {
    let count = window_count(duration, params)?;
    let step = params.step();

    let windows = (0..count)
        .map(|i| {
            // Multiply instead of accumulating so error does not drift.
            let start = i as f64 * step;
            let end = if i + 1 == count {
                duration
            } else {
                start + params.chunk_length
            };
            ChunkWindow {
                index: i as u32 + 1,
                start,
                end,
            }
        })
        .collect();

    Ok(windows)
}

/// Like [`plan`], but rejects plans with more than `max_windows` windows
/// before allocating any of them.
pub fn plan_with_limit(
    duration: f64,
    params: &PlanParams,
    max_windows: Option<usize>,
) -> Result<Vec<ChunkWindow>> {
    let count = window_count(duration, params)?;
    if let Some(max) = max_windows {
        if count > max {
            return Err(Error::invalid_plan(format!(
                "{count} chunks would exceed the limit of {max}; use a longer chunk duration"
            )));
        }
    }
    plan(duration, params)
}

/// Validate raw parameters and plan in one call.
pub fn plan_windows(duration: f64, chunk_length: f64, overlap: f64) -> Result<Vec<ChunkWindow>> {
    let params = PlanParams::new(chunk_length, overlap)?;
    plan(duration, &params)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn bounds(windows: &[ChunkWindow]) -> Vec<(f64, f64)> {
        windows.iter().map(|w| (w.start, w.end)).collect()
    }

    #[test]
    fn five_minutes_in_one_minute_chunks() {
        let windows = plan_windows(300.0, 60.0, 10.0).unwrap();
        assert_eq!(
            bounds(&windows),
            vec![
                (0.0, 60.0),
                (50.0, 110.0),
                (100.0, 160.0),
                (150.0, 210.0),
                (200.0, 260.0),
                (250.0, 300.0),
            ]
        );
        let indices: Vec<u32> = windows.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn short_video_yields_single_window() {
        let windows = plan_windows(45.0, 60.0, 10.0).unwrap();
        assert_eq!(bounds(&windows), vec![(0.0, 45.0)]);
        assert_eq!(windows[0].index, 1);
    }

    #[test]
    fn duration_equal_to_chunk_is_one_window() {
        let windows = plan_windows(60.0, 60.0, 10.0).unwrap();
        assert_eq!(bounds(&windows), vec![(0.0, 60.0)]);
    }

    #[test]
    fn overlap_equal_to_chunk_is_rejected() {
        let err = plan_windows(100.0, 30.0, 30.0).unwrap_err();
        assert!(matches!(err, Error::InvalidPlanParameters(_)));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(PlanParams::new(0.0, 0.0).is_err());
        assert!(PlanParams::new(-5.0, 0.0).is_err());
        assert!(PlanParams::new(f64::NAN, 0.0).is_err());
        assert!(PlanParams::new(30.0, -1.0).is_err());
        assert!(PlanParams::new(30.0, 31.0).is_err());
        assert!(PlanParams::new(f64::INFINITY, 1.0).is_err());

        let params = PlanParams::default();
        assert!(plan(0.0, &params).is_err());
        assert!(plan(-3.0, &params).is_err());
        assert!(plan(f64::NAN, &params).is_err());
    }

    #[test]
    fn no_sliver_window_after_exact_fit() {
        // 110 = 60 + 50: the second window already ends at the duration.
        let windows = plan_windows(110.0, 60.0, 10.0).unwrap();
        assert_eq!(bounds(&windows), vec![(0.0, 60.0), (50.0, 110.0)]);

        // 105 must not produce a trailing [100, 105] window.
        let windows = plan_windows(105.0, 60.0, 10.0).unwrap();
        assert_eq!(bounds(&windows), vec![(0.0, 60.0), (50.0, 105.0)]);
    }

    #[test]
    fn zero_overlap_tiles_the_timeline() {
        let windows = plan_windows(25.0, 10.0, 0.0).unwrap();
        assert_eq!(
            bounds(&windows),
            vec![(0.0, 10.0), (10.0, 20.0), (20.0, 25.0)]
        );
    }

    #[test]
    fn window_count_matches_plan() {
        let params = PlanParams::new(7.5, 2.5).unwrap();
        for duration in [0.1, 7.5, 7.6, 12.5, 100.0, 3599.97] {
            let count = window_count(duration, &params).unwrap();
            assert_eq!(count, plan(duration, &params).unwrap().len(), "{duration}");
        }
    }

    #[test]
    fn window_limit_is_checked_before_planning() {
        let params = PlanParams::new(0.25, 0.0).unwrap();
        let err = plan_with_limit(1e9, &params, Some(10_000)).unwrap_err();
        assert!(matches!(err, Error::InvalidPlanParameters(_)));

        let params = PlanParams::default();
        assert_eq!(plan_with_limit(300.0, &params, Some(6)).unwrap().len(), 6);
        assert!(plan_with_limit(300.0, &params, Some(5)).is_err());
        assert_eq!(plan_with_limit(300.0, &params, None).unwrap().len(), 6);
    }

    #[test]
    fn too_many_windows_is_rejected() {
        let params = PlanParams::new(1e-6, 0.0).unwrap();
        assert!(window_count(1e9, &params).is_err());
    }

    #[test]
    fn plan_properties_hold() {
        let cases = [
            (1.0, 60.0, 10.0),
            (61.0, 60.0, 10.0),
            (299.9, 60.0, 10.0),
            (3600.0, 45.0, 15.0),
            (12.34, 1.5, 0.25),
            (0.5, 0.1, 0.09),
            (5000.0, 120.0, 0.0),
            (987.654, 33.3, 11.1),
            (110.00000001, 60.0, 10.0),
            (2e6 + 1e-4, 1e6, 0.0),
        ];

        for (duration, chunk, overlap) in cases {
            let windows = plan_windows(duration, chunk, overlap).unwrap();
            let ctx = format!("duration={duration} chunk={chunk} overlap={overlap}");

            assert!(!windows.is_empty(), "{ctx}");
            assert_eq!(windows[0].start, 0.0, "{ctx}");
            assert_eq!(windows.last().unwrap().end, duration, "{ctx}");

            let last = windows.last().unwrap();
            assert!(last.length() <= chunk, "{ctx}");

            for (i, w) in windows.iter().enumerate() {
                assert_eq!(w.index as usize, i + 1, "{ctx}");
                assert!(w.length() > 0.0, "{ctx}");
                assert!(w.length() <= chunk + TOLERANCE, "{ctx}");
                assert!(w.end <= duration, "{ctx}");
            }

            for pair in windows.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(a.start < b.start, "{ctx}");
                assert!((a.length() - chunk).abs() < TOLERANCE, "{ctx}");
                assert!(((a.end - b.start) - overlap).abs() < TOLERANCE, "{ctx}");
                // No gap between consecutive windows.
                assert!(b.start <= a.end, "{ctx}");
            }
        }
    }

    #[test]
    fn duration_just_past_a_step_gets_its_own_window() {
        let windows = plan_windows(110.00000001, 60.0, 10.0).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(bounds(&windows[..2]), vec![(0.0, 60.0), (50.0, 110.0)]);
        assert_eq!((windows[2].start, windows[2].end), (100.0, 110.00000001));

        let windows = plan_windows(2e6 + 1e-4, 1e6, 0.0).unwrap();
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.length() <= 1e6));
        assert_eq!(windows[2].start, 2e6);
    }
}
