//! Tolerance comparison between two runs over the same particles
//!
//! CPU strategies are compared bit-for-bit. The GPU may contract multiply-adds,
//! which shifts the last bits and then compounds through bounces, so it is
//! held to [`Deviation::is_acceptable`] instead.

use std::fmt;

use particle_physics::Particle;

/// Position or velocity drift past which a particle counts as diverged
pub const GPU_TOLERANCE: f32 = 1e-2;

/// Percentage of particles allowed to drift past the tolerance
const MAX_DIVERGED_PERCENT: usize = 1;

/// How far one particle array has drifted from another
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Deviation {
    /// Particles present in both arrays
    pub compared: usize,
    /// Particles present in only one of them
    pub unmatched: usize,
    /// Position or velocity further apart than the tolerance
    pub diverged: usize,
    /// Mass or color differs. These are never written by the step.
    pub corrupted: usize,
    pub max_position_error: f32,
}

impl Deviation {
    pub fn between(a: &[Particle], b: &[Particle], tolerance: f32) -> Self {
        let mut deviation = Self {
            compared: a.len().min(b.len()),
            unmatched: a.len().abs_diff(b.len()),
            ..Self::default()
        };

        for (p, q) in a.iter().zip(b) {
            let position_error = p.position().distance(q.position());
            deviation.max_position_error = deviation.max_position_error.max(position_error);

            if position_error > tolerance || p.velocity().distance(q.velocity()) > tolerance {
                deviation.diverged += 1;
            }
            if p.mass != q.mass || p.color != q.color {
                deviation.corrupted += 1;
            }
        }

        deviation
    }

    /// Same particles with identical attributes, and at most 1% of them drifted
    pub fn is_acceptable(&self) -> bool {
        self.unmatched == 0
            && self.corrupted == 0
            && self.diverged * 100 <= self.compared * MAX_DIVERGED_PERCENT
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} particles diverged, max position error {:.4}",
            self.diverged, self.compared, self.max_position_error
        )?;
        if self.unmatched > 0 {
            write!(f, ", {} unmatched", self.unmatched)?;
        }
        if self.corrupted > 0 {
            write!(f, ", {} with changed mass or color", self.corrupted)?;
        }
        Ok(())
    }
}
