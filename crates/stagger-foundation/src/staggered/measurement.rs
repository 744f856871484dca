//! Measurement feedback: rendered heights flowing back into aggregate state.

use smallvec::SmallVec;

use super::height_tracker::COLUMN_HINT;

/// Aggregate measurement snapshot: header, footer, and per-column totals.
///
/// Recomputed whenever any constituent height changes and delivered through
/// the controller's `on_measure` callback. There is no ordering requirement
/// between header, footer, and column updates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasureResult {
    pub header: f32,
    pub footer: f32,
    pub columns: SmallVec<[f32; COLUMN_HINT]>,
}

impl MeasureResult {
    /// Header plus footer plus the tallest column.
    pub fn content_height(&self) -> f32 {
        let tallest = self.columns.iter().copied().fold(0.0_f32, f32::max);
        self.header + self.footer + tallest
    }
}

/// Height changes smaller than this are treated as re-layout noise.
const HEIGHT_EPSILON: f32 = 0.001;

/// Header/footer accumulator feeding [`MeasureResult`].
#[derive(Clone, Debug, Default)]
pub(crate) struct MeasureAggregate {
    header: f32,
    footer: f32,
}

impl MeasureAggregate {
    /// Returns true when the stored value actually changed.
    pub(crate) fn set_header(&mut self, height: f32) -> bool {
        if (self.header - height).abs() <= HEIGHT_EPSILON {
            return false;
        }
        self.header = height;
        true
    }

    pub(crate) fn set_footer(&mut self, height: f32) -> bool {
        if (self.footer - height).abs() <= HEIGHT_EPSILON {
            return false;
        }
        self.footer = height;
        true
    }

    pub(crate) fn snapshot(&self, columns: &[f32]) -> MeasureResult {
        MeasureResult {
            header: self.header,
            footer: self.footer,
            columns: SmallVec::from_slice(columns),
        }
    }
}

/// Validates a height reported by the measurement host.
///
/// Negative and non-finite values are anomalies; they are dropped rather
/// than clamped so a bad report can never perturb totals. Zero is
/// legitimate: content can render at zero height.
pub(crate) fn sanitize_height(height: f32) -> Option<f32> {
    if height.is_finite() && height >= 0.0 {
        Some(height)
    } else {
        log::warn!("dropping invalid measured height {height}");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_negative_and_non_finite() {
        assert_eq!(sanitize_height(10.0), Some(10.0));
        assert_eq!(sanitize_height(0.0), Some(0.0));
        assert_eq!(sanitize_height(-1.0), None);
        assert_eq!(sanitize_height(f32::NAN), None);
        assert_eq!(sanitize_height(f32::INFINITY), None);
    }

    #[test]
    fn aggregate_detects_real_changes_only() {
        let mut aggregate = MeasureAggregate::default();
        assert!(aggregate.set_header(20.0));
        assert!(!aggregate.set_header(20.0));
        assert!(!aggregate.set_header(20.0005));
        assert!(aggregate.set_footer(5.0));

        let result = aggregate.snapshot(&[30.0, 10.0]);
        assert_eq!(result.header, 20.0);
        assert_eq!(result.footer, 5.0);
        assert_eq!(result.columns.as_slice(), &[30.0, 10.0]);
        assert_eq!(result.content_height(), 55.0);
    }
}
