use crate::aggregator::TIMER_MARKER;
#[cfg(feature = "simd_acceleration")]
use memchr::memmem::Finder;

/// Substring shared by every error marker token.
const ERROR_MARKER_CORE: &str = "rror";

/// Cheap line-level rejection ahead of tokenization.
///
/// A line can only contribute to the aggregate if it contains `[Timer]`, and can
/// only be echoed if it contains one of the error markers, all of which contain
/// `rror`. Lines with neither substring are skipped without splitting.
pub struct LinePrefilter {
    #[cfg(feature = "simd_acceleration")]
    timer: Finder<'static>,
    #[cfg(feature = "simd_acceleration")]
    error: Finder<'static>,
}

impl Default for LinePrefilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePrefilter {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "simd_acceleration")]
            timer: Finder::new(TIMER_MARKER),
            #[cfg(feature = "simd_acceleration")]
            error: Finder::new(ERROR_MARKER_CORE),
        }
    }

    /// Returns false only when the line cannot hold a timer record or an error marker.
    pub fn may_match(&self, line: &str) -> bool {
        #[cfg(feature = "simd_acceleration")]
        {
            // SIMD path - memchr picks the best vector routine at runtime
            let bytes = line.as_bytes();
            self.timer.find(bytes).is_some() || self.error.find(bytes).is_some()
        }

        #[cfg(not(feature = "simd_acceleration"))]
        {
            line.contains(TIMER_MARKER) || line.contains(ERROR_MARKER_CORE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ERROR_MARKERS;

    #[test]
    fn test_prefilter_accepts_timer_lines() {
        let filter = LinePrefilter::new();

        assert!(filter.may_match("[Timer] 100 ms"));
        assert!(filter.may_match("query 3 [Timer] 100 ms"));
    }

    #[test]
    fn test_prefilter_accepts_every_error_marker() {
        let filter = LinePrefilter::new();

        for marker in ERROR_MARKERS {
            let line = format!("worker 3 {} lost connection", marker);
            assert!(filter.may_match(&line), "marker {} was rejected", marker);
        }
    }

    #[test]
    fn test_prefilter_rejects_unrelated_lines() {
        let filter = LinePrefilter::new();

        assert!(!filter.may_match("worker 3 finished query 12"));
        assert!(!filter.may_match(""));
        assert!(!filter.may_match("[timer] 100 ms"));
    }
}
