use danmaku_protocol::Viewport;

use super::overlay::OverlayKey;

/// Occupancy memory for one horizontal lane.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    /// Clock time the lane last accepted an overlay; `None` after init/clear.
    pub last_emission: Option<f64>,
    /// Current x of the most recently emitted overlay in this lane.
    pub leading_edge_x: f64,
    /// Width of that overlay (0 while the lane is empty).
    pub occupant_width: f64,
    occupant: Option<OverlayKey>,
}

impl Lane {
    fn empty(viewport_width: f64) -> Self {
        Self {
            last_emission: None,
            leading_edge_x: viewport_width,
            occupant_width: 0.0,
            occupant: None,
        }
    }

    /// Right end of the latest occupant.
    pub fn trailing_edge(&self) -> f64 {
        self.leading_edge_x + self.occupant_width
    }

    pub fn occupant(&self) -> Option<OverlayKey> {
        self.occupant
    }
}

/// Lane selection thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocPolicy {
    pub min_gap: f64,
    pub staleness_ms: f64,
}

/// The lane table for one viewport geometry.
#[derive(Debug, Clone)]
pub struct LaneTable {
    lanes: Vec<Lane>,
    viewport_width: f64,
    lane_height: f64,
}

impl LaneTable {
    pub fn new(viewport: &Viewport, lane_height: f64) -> Self {
        let count = if lane_height > 0.0 && viewport.height > 0.0 {
            (viewport.height / lane_height).floor() as usize
        } else {
            0
        };
        Self {
            lanes: vec![Lane::empty(viewport.width); count],
            viewport_width: viewport.width,
            lane_height,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    /// Pick a lane for an overlay of `width` entering at the right edge now.
    ///
    /// Lanes are scanned in index order and the first eligible one wins. A
    /// lane is eligible when it is unused, when its latest occupant has moved
    /// far enough left to leave `width + min_gap` of room, or when it has not
    /// accepted anything for longer than the staleness threshold. With no
    /// eligible lane the overlay goes to lane 0 and may overlap.
    pub fn allocate(
        &mut self,
        key: OverlayKey,
        width: f64,
        now: f64,
        policy: &AllocPolicy,
    ) -> usize {
        let room_needed = self.viewport_width - (width + policy.min_gap);
        let chosen = self.lanes.iter().position(|lane| match lane.last_emission {
            None => true,
            Some(last) => {
                lane.trailing_edge() <= room_needed || now - last > policy.staleness_ms
            }
        });

        let index = chosen.unwrap_or_else(|| {
            tracing::debug!(width, lanes = self.lanes.len(), "no free lane, overlapping lane 0");
            0
        });

        if let Some(lane) = self.lanes.get_mut(index) {
            lane.last_emission = Some(now);
            lane.leading_edge_x = self.viewport_width;
            lane.occupant_width = width;
            lane.occupant = Some(key);
        }
        index
    }

    /// Follow an overlay's movement. Only the lane's latest occupant moves the
    /// leading edge; lanes that no longer exist are ignored.
    pub fn track(&mut self, index: usize, key: OverlayKey, x: f64) {
        if let Some(lane) = self.lanes.get_mut(index)
            && lane.occupant == Some(key)
        {
            lane.leading_edge_x = x;
        }
    }

    /// The latest occupant changed width (re-measured after a like update).
    pub fn resize(&mut self, index: usize, key: OverlayKey, width: f64) {
        if let Some(lane) = self.lanes.get_mut(index)
            && lane.occupant == Some(key)
        {
            lane.occupant_width = width;
        }
    }

    /// Forget all occupancy, keeping the geometry.
    pub fn reset(&mut self) {
        let width = self.viewport_width;
        for lane in &mut self.lanes {
            *lane = Lane::empty(width);
        }
    }

    /// Text baseline for a glyph of `glyph_size` centered in lane `index`.
    pub fn baseline(&self, index: usize, glyph_size: f64) -> f64 {
        index as f64 * self.lane_height + self.lane_height / 2.0 + glyph_size / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: AllocPolicy = AllocPolicy {
        min_gap: 50.0,
        staleness_ms: 3000.0,
    };

    fn table() -> LaneTable {
        LaneTable::new(&Viewport::new(800.0, 300.0), 30.0)
    }

    #[test]
    fn lane_count_floors() {
        assert_eq!(table().len(), 10);
        assert_eq!(LaneTable::new(&Viewport::new(800.0, 299.0), 30.0).len(), 9);
        assert!(LaneTable::new(&Viewport::new(800.0, 20.0), 30.0).is_empty());
    }

    #[test]
    fn busy_lane_is_skipped() {
        let mut lanes = table();
        assert_eq!(lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY), 0);
        assert_eq!(lanes.allocate(OverlayKey(1), 50.0, 0.0, &POLICY), 1);
        assert_eq!(lanes.allocate(OverlayKey(2), 50.0, 0.0, &POLICY), 2);
    }

    #[test]
    fn lane_reopens_once_occupant_clears_room() {
        let mut lanes = table();
        lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY);
        // Trailing edge at 300 leaves room for exactly 800 - 300 - 50 = 450.
        lanes.track(0, OverlayKey(0), 200.0);
        assert_eq!(lanes.allocate(OverlayKey(1), 450.0, 10.0, &POLICY), 0);

        let mut lanes = table();
        lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY);
        lanes.track(0, OverlayKey(0), 200.0);
        assert_eq!(lanes.allocate(OverlayKey(1), 451.0, 10.0, &POLICY), 1);
    }

    #[test]
    fn stale_lane_is_reused_regardless_of_geometry() {
        let mut lanes = LaneTable::new(&Viewport::new(800.0, 60.0), 30.0);
        lanes.allocate(OverlayKey(0), 2000.0, 0.0, &POLICY);
        lanes.allocate(OverlayKey(1), 2000.0, 0.0, &POLICY);
        // Both busy: falls back to lane 0, refreshing its emission time.
        assert_eq!(lanes.allocate(OverlayKey(2), 2000.0, 2000.0, &POLICY), 0);
        // Exactly at the threshold lane 1 is not stale yet.
        assert_eq!(lanes.allocate(OverlayKey(3), 10.0, 3000.0, &POLICY), 0);
        assert_eq!(lanes.allocate(OverlayKey(4), 10.0, 3000.5, &POLICY), 1);
    }

    #[test]
    fn full_table_falls_back_to_lane_zero() {
        let mut lanes = LaneTable::new(&Viewport::new(800.0, 90.0), 30.0);
        for key in 0..3 {
            lanes.allocate(OverlayKey(key), 100.0, 0.0, &POLICY);
        }
        assert_eq!(lanes.allocate(OverlayKey(3), 100.0, 1.0, &POLICY), 0);
        assert_eq!(lanes.lanes()[0].occupant(), Some(OverlayKey(3)));
    }

    #[test]
    fn only_latest_occupant_moves_leading_edge() {
        let mut lanes = LaneTable::new(&Viewport::new(800.0, 30.0), 30.0);
        lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY);
        lanes.allocate(OverlayKey(1), 100.0, 0.0, &POLICY);
        lanes.track(0, OverlayKey(0), 10.0);
        assert!((lanes.lanes()[0].leading_edge_x - 800.0).abs() < f64::EPSILON);
        lanes.track(0, OverlayKey(1), 797.0);
        assert!((lanes.lanes()[0].leading_edge_x - 797.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_table_still_returns_lane_zero() {
        let mut lanes = LaneTable::new(&Viewport::new(800.0, 10.0), 30.0);
        assert_eq!(lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY), 0);
        lanes.track(0, OverlayKey(0), 5.0);
    }

    #[test]
    fn reset_forgets_occupancy() {
        let mut lanes = table();
        lanes.allocate(OverlayKey(0), 100.0, 0.0, &POLICY);
        lanes.track(0, OverlayKey(0), 400.0);
        lanes.reset();
        for lane in lanes.lanes() {
            assert_eq!(lane.last_emission, None);
            assert!((lane.leading_edge_x - 800.0).abs() < f64::EPSILON);
            assert_eq!(lane.occupant(), None);
        }
    }

    #[test]
    fn baseline_centers_glyph() {
        let lanes = table();
        assert!((lanes.baseline(0, 24.0) - 27.0).abs() < f64::EPSILON);
        assert!((lanes.baseline(2, 24.0) - 87.0).abs() < f64::EPSILON);
    }
}
