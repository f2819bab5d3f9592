use crate::error::FrameTableError;

/// Frame centers (nm) reachable by the production grating setup.
const PRODUCTION_FRAMES: [f64; 50] = [
    500.000, 526.977, 553.640, 579.991, 606.036, 631.776, 657.216, 682.360, 707.210, 731.770,
    756.044, 780.035, 803.746, 827.180, 850.341, 873.232, 895.856, 918.216, 940.315, 962.156,
    983.743, 1005.078, 1026.164, 1047.004, 1067.601, 1087.958, 1108.077, 1127.962, 1147.614,
    1167.038, 1186.235, 1205.208, 1223.959, 1242.492, 1260.809, 1278.912, 1296.804, 1314.488,
    1331.965, 1349.238, 1366.310, 1383.182, 1399.858, 1416.339, 1432.628, 1448.727, 1464.639,
    1480.364, 1495.907, 1511.268,
];

// ---------------------------------------------------------------------------
// FrameTable
// ---------------------------------------------------------------------------

/// Immutable, strictly increasing list of frame center wavelengths (nm).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    centers: Vec<f64>,
}

impl FrameTable {
    /// Validate and wrap a list of frame centers.
    pub fn new(centers: Vec<f64>) -> Result<Self, FrameTableError> {
        if centers.is_empty() {
            return Err(FrameTableError::Empty);
        }
        for (index, c) in centers.iter().enumerate() {
            if !c.is_finite() {
                return Err(FrameTableError::NonFinite { index });
            }
        }
        for (index, pair) in centers.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(FrameTableError::NotIncreasing {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(Self { centers })
    }

    /// The production table, 500.000 nm through 1511.268 nm.
    pub fn production() -> Self {
        Self {
            centers: PRODUCTION_FRAMES.to_vec(),
        }
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Exact membership test (bitwise float equality).
    pub fn contains(&self, center: f64) -> bool {
        self.centers.iter().any(|c| c.to_bits() == center.to_bits())
    }

    /// Select the minimal run of frames covering `[wavelength_start, wavelength_end]`.
    ///
    /// The first frame is the last one whose successor still lies above the
    /// start; the last frame is the first one whose predecessor still lies
    /// below the end. A reversed range is swapped. The plan is never empty.
    pub fn plan_sweep(&self, wavelength_start: f64, wavelength_end: f64) -> SweepPlan {
        let (lo, hi) = if wavelength_start > wavelength_end {
            (wavelength_end, wavelength_start)
        } else {
            (wavelength_start, wavelength_end)
        };
        let t = &self.centers;

        let mut first = 0;
        while first + 1 < t.len() && t[first + 1] <= lo {
            first += 1;
        }

        let mut last = t.len() - 1;
        while last > first && t[last - 1] >= hi {
            last -= 1;
        }

        SweepPlan::new(t[first..=last].to_vec())
    }
}

// ---------------------------------------------------------------------------
// SweepPlan
// ---------------------------------------------------------------------------

/// Where a plan's cursor stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    InProgress,
    Exhausted,
}

/// Ordered frames for one sweep plus the cursor of the next frame to serve.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    frames: Vec<f64>,
    cursor: usize,
}

impl SweepPlan {
    fn new(frames: Vec<f64>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn frames(&self) -> &[f64] {
        &self.frames
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }

    pub fn state(&self) -> SweepState {
        if self.cursor < self.frames.len() {
            SweepState::InProgress
        } else {
            SweepState::Exhausted
        }
    }

    /// Frame at the cursor, without advancing.
    pub fn peek(&self) -> Option<f64> {
        self.frames.get(self.cursor).copied()
    }

    /// Serve the frame at the cursor and advance. `None` once exhausted.
    pub fn next_frame(&mut self) -> Option<f64> {
        let center = self.peek()?;
        self.cursor += 1;
        Some(center)
    }
}

impl Iterator for SweepPlan {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for SweepPlan {}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(centers: &[f64]) -> FrameTable {
        FrameTable::new(centers.to_vec()).unwrap()
    }

    #[test]
    fn rejects_invalid_tables() {
        assert_eq!(FrameTable::new(vec![]), Err(FrameTableError::Empty));
        assert_eq!(
            FrameTable::new(vec![1.0, f64::NAN]),
            Err(FrameTableError::NonFinite { index: 1 })
        );
        assert!(matches!(
            FrameTable::new(vec![1.0, 2.0, 2.0]),
            Err(FrameTableError::NotIncreasing { index: 2, .. })
        ));
    }

    #[test]
    fn production_table_is_valid() {
        let t = FrameTable::production();
        assert_eq!(t.len(), 50);
        assert!(FrameTable::new(t.centers().to_vec()).is_ok());
        assert_eq!(t.centers()[0], 500.0);
        assert_eq!(t.centers()[49], 1511.268);
    }

    #[test]
    fn interior_range_keeps_bracketing_frames() {
        let t = table(&[500.0, 600.0, 700.0, 800.0]);
        let plan = t.plan_sweep(550.0, 750.0);
        assert_eq!(plan.frames(), &[500.0, 600.0, 700.0, 800.0]);
        assert_eq!(plan.cursor(), 0);
    }

    #[test]
    fn range_on_frame_centers_is_tight() {
        let t = table(&[500.0, 600.0, 700.0, 800.0, 900.0]);
        assert_eq!(t.plan_sweep(600.0, 700.0).frames(), &[600.0, 700.0]);
        assert_eq!(t.plan_sweep(610.0, 690.0).frames(), &[600.0, 700.0]);
        assert_eq!(t.plan_sweep(600.0, 600.0).frames(), &[600.0]);
    }

    #[test]
    fn out_of_table_ranges_clamp_to_endpoints() {
        let t = table(&[500.0, 600.0, 700.0]);
        assert_eq!(t.plan_sweep(100.0, 2000.0).frames(), &[500.0, 600.0, 700.0]);
        assert_eq!(t.plan_sweep(100.0, 200.0).frames(), &[500.0]);
        assert_eq!(t.plan_sweep(900.0, 1000.0).frames(), &[700.0]);
    }

    #[test]
    fn reversed_range_is_swapped() {
        let t = table(&[500.0, 600.0, 700.0, 800.0]);
        assert_eq!(t.plan_sweep(750.0, 550.0), t.plan_sweep(550.0, 750.0));
    }

    #[test]
    fn single_frame_table() {
        let t = table(&[632.8]);
        assert_eq!(t.plan_sweep(0.0, 10_000.0).frames(), &[632.8]);
    }

    #[test]
    fn plan_is_minimal_but_covering() {
        let t = FrameTable::production();
        let c = t.centers();
        let ranges = [
            (500.0, 1511.268),
            (512.3, 513.0),
            (700.0, 900.0),
            (731.77, 731.77),
            (1000.0, 1500.0),
            (1495.907, 1511.268),
        ];
        for (ws, we) in ranges {
            let plan = t.plan_sweep(ws, we);
            let first = c.iter().position(|&x| x == plan.frames()[0]).unwrap();
            let last = first + plan.len() - 1;
            assert_eq!(&c[first..=last], plan.frames(), "contiguous for {ws}..{we}");
            if first > 0 {
                assert!(c[first - 1] <= ws, "predecessor below start for {ws}..{we}");
            }
            if last + 1 < c.len() {
                assert!(c[last + 1] >= we, "successor above end for {ws}..{we}");
            }
            assert!(c[first] <= ws || first == 0);
            assert!(c[last] >= we || last == c.len() - 1);
        }
    }

    #[test]
    fn next_frame_drains_then_stays_exhausted() {
        let t = table(&[500.0, 600.0, 700.0, 800.0]);
        let mut plan = t.plan_sweep(550.0, 650.0);
        assert_eq!(plan.frames(), &[500.0, 600.0, 700.0]);
        assert_eq!(plan.state(), SweepState::InProgress);
        assert_eq!(plan.next_frame(), Some(500.0));
        assert_eq!(plan.next_frame(), Some(600.0));
        assert_eq!(plan.remaining(), 1);
        assert_eq!(plan.next_frame(), Some(700.0));
        assert_eq!(plan.state(), SweepState::Exhausted);
        for _ in 0..3 {
            assert_eq!(plan.next_frame(), None);
        }
        assert_eq!(plan.cursor(), 3);
    }

    #[test]
    fn replanning_starts_fresh() {
        let t = table(&[500.0, 600.0, 700.0, 800.0]);
        let mut plan = t.plan_sweep(500.0, 800.0);
        while plan.next_frame().is_some() {}
        plan = t.plan_sweep(700.0, 800.0);
        assert_eq!(plan.cursor(), 0);
        assert_eq!(plan.collect::<Vec<_>>(), vec![700.0, 800.0]);
    }

    #[test]
    fn iterator_reports_exact_size() {
        let t = table(&[1.0, 2.0, 3.0, 4.0]);
        let mut plan = t.plan_sweep(1.0, 4.0);
        assert_eq!(plan.len(), 4);
        plan.next_frame();
        assert_eq!(plan.size_hint(), (3, Some(3)));
    }
}
