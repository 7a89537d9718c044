//! Linear interpolation between two lattice states.
//!
//! The segment is straight in (station, lateral) coordinates and follows the
//! reference line's curvature once mapped to world coordinates.

use crate::common::{PlanningEnvironment, Point2D};

/// One interpolated point of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPoint {
    pub s: f64,
    pub l: f64,
    pub time: f64,
    pub position: Point2D,
}

/// Segment between two (s, l) states spanning `duration` seconds from `start_time`
pub struct Segment<'a, E: ?Sized> {
    env: &'a E,
    from: (f64, f64),
    to: (f64, f64),
    start_time: f64,
    duration: f64,
    nseg: usize,
}

impl<'a, E: ?Sized> Clone for Segment<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: ?Sized> Copy for Segment<'a, E> {}

impl<'a, E> Segment<'a, E>
where
    E: PlanningEnvironment + ?Sized,
{
    pub fn new(
        env: &'a E,
        from: (f64, f64),
        to: (f64, f64),
        start_time: f64,
        duration: f64,
        nseg: usize,
    ) -> Self {
        Self {
            env,
            from,
            to,
            start_time,
            duration,
            nseg: nseg.max(1),
        }
    }

    pub fn nseg(&self) -> usize {
        self.nseg
    }

    /// The `nseg + 1` points from `from` to `to`, both ends included.
    ///
    /// Points are computed on demand; clone the iterator to walk it again.
    pub fn points(&self) -> SegmentPoints<'a, E> {
        SegmentPoints {
            segment: *self,
            index: 0,
        }
    }

    fn point_at(&self, index: usize) -> SegmentPoint {
        let ratio = index as f64 / self.nseg as f64;
        // endpoint taken verbatim, shared with the next segment
        let (s, l) = if index == self.nseg {
            self.to
        } else {
            (
                self.from.0 + (self.to.0 - self.from.0) * ratio,
                self.from.1 + (self.to.1 - self.from.1) * ratio,
            )
        };
        SegmentPoint {
            s,
            l,
            time: self.start_time + self.duration * ratio,
            position: self.env.to_cartesian(s, l),
        }
    }
}

/// Lazy iterator over the points of a [`Segment`]
pub struct SegmentPoints<'a, E: ?Sized> {
    segment: Segment<'a, E>,
    index: usize,
}

impl<'a, E: ?Sized> Clone for SegmentPoints<'a, E> {
    fn clone(&self) -> Self {
        Self {
            segment: self.segment,
            index: self.index,
        }
    }
}

impl<'a, E> Iterator for SegmentPoints<'a, E>
where
    E: PlanningEnvironment + ?Sized,
{
    type Item = SegmentPoint;

    fn next(&mut self) -> Option<SegmentPoint> {
        if self.index > self.segment.nseg {
            return None;
        }
        let p = self.segment.point_at(self.index);
        self.index += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.segment.nseg + 1).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, E> ExactSizeIterator for SegmentPoints<'a, E> where E: PlanningEnvironment + ?Sized {}
