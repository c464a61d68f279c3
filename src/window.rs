use crate::error::RangeError;

/// Frame-selection policy: the whole video, or an explicit inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePolicy {
    Full,
    Range,
}

/// An inclusive frame range `[start, end]` validated against the probed video.
///
/// Resolved exactly once per run and passed by value to every downstream
/// stage, so extraction and table assembly cannot disagree on the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    start: u32,
    end: u32,
}

impl FrameWindow {
    /// Resolve a policy against the probed frame count. `bounds` is required
    /// for [`FramePolicy::Range`] and ignored for [`FramePolicy::Full`].
    pub fn resolve(
        policy: FramePolicy,
        total_frames: u32,
        bounds: Option<(u32, u32)>,
    ) -> Result<Self, RangeError> {
        let max_frame = total_frames.saturating_sub(1);
        match policy {
            FramePolicy::Full => Ok(Self {
                start: 0,
                end: max_frame,
            }),
            FramePolicy::Range => {
                let (start, end) = bounds.unwrap_or((0, max_frame));
                if start <= end && end <= max_frame {
                    Ok(Self { start, end })
                } else {
                    Err(RangeError {
                        start,
                        end,
                        max_frame,
                    })
                }
            }
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, frame: u32) -> bool {
        self.start <= frame && frame <= self.end
    }

    /// Number of frame indices the window spans.
    pub fn frame_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_policy_spans_whole_video() {
        let window = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();
        assert_eq!(window.start(), 0);
        assert_eq!(window.end(), 9);
        assert_eq!(window.frame_count(), 10);
    }

    #[test]
    fn range_policy_validates_against_total() {
        let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((2, 4))).unwrap();
        assert!(window.contains(2) && window.contains(4));
        assert!(!window.contains(5));

        // end beyond the last decodable frame
        let err = FrameWindow::resolve(FramePolicy::Range, 3, Some((2, 4))).unwrap_err();
        assert_eq!(err.max_frame, 2);

        // inverted bounds
        assert!(FrameWindow::resolve(FramePolicy::Range, 10, Some((5, 3))).is_err());
    }

    #[test]
    fn single_frame_window() {
        let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((7, 7))).unwrap();
        assert_eq!(window.frame_count(), 1);
        assert!(window.contains(7));
    }
}
