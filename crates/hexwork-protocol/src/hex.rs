use serde::{Deserialize, Serialize};

/// Axial coordinates for a hex grid (q, r). The implicit cube coordinate is `s = -q - r`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

/// Cube coordinates; `q + r + s == 0` for every valid hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeHex {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

/// Rectangular storage address using the "odd-r" layout: odd rows are shoved right by half a hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetCoord {
    pub col: i32,
    pub row: i32,
}

/// Fractional cube coordinate, produced by pixel picking and linear interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractionalHex {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl Hex {
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    pub const DIRECTIONS: [Hex; 6] = [
        Hex { q: 1, r: 0 },  // East
        Hex { q: 1, r: -1 }, // Northeast
        Hex { q: 0, r: -1 }, // Northwest
        Hex { q: -1, r: 0 }, // West
        Hex { q: -1, r: 1 }, // Southwest
        Hex { q: 0, r: 1 },  // Southeast
    ];

    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    #[inline]
    pub const fn to_cube(self) -> CubeHex {
        CubeHex {
            q: self.q,
            r: self.r,
            s: self.s(),
        }
    }

    #[inline]
    pub const fn from_cube(cube: CubeHex) -> Self {
        Self {
            q: cube.q,
            r: cube.r,
        }
    }

    #[inline]
    pub const fn to_offset(self) -> OffsetCoord {
        OffsetCoord {
            col: self.q + (self.r - (self.r & 1)) / 2,
            row: self.r,
        }
    }

    #[inline]
    pub const fn from_offset(offset: OffsetCoord) -> Self {
        Self {
            q: offset.col - (offset.row - (offset.row & 1)) / 2,
            r: offset.row,
        }
    }

    /// Neighbor in direction `dir` (taken modulo 6).
    #[inline]
    pub fn neighbor(self, dir: usize) -> Hex {
        self + Self::DIRECTIONS[dir % 6]
    }

    pub fn neighbors(self) -> impl Iterator<Item = Hex> {
        Self::DIRECTIONS.into_iter().map(move |d| self + d)
    }

    #[inline]
    pub fn distance(self, other: Hex) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s() - other.s()).abs()) / 2
    }

    #[inline]
    pub fn is_adjacent(self, other: Hex) -> bool {
        self.distance(other) == 1
    }

    /// All hexes at exactly `radius` distance, in a deterministic ring order.
    pub fn ring(self, radius: i32) -> impl Iterator<Item = Hex> {
        RingIter::new(self, radius)
    }

    /// All hexes with distance `<= radius` (center included), in a deterministic order.
    pub fn range(self, radius: i32) -> impl Iterator<Item = Hex> {
        RangeIter::new(self, radius)
    }

    /// Packs both axes into one integer key for hashing and compact sets.
    #[inline]
    pub const fn pack(self) -> u64 {
        ((self.q as u32 as u64) << 32) | (self.r as u32 as u64)
    }

    #[inline]
    pub const fn unpack(key: u64) -> Self {
        Self {
            q: (key >> 32) as u32 as i32,
            r: key as u32 as i32,
        }
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

impl std::ops::Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex {
            q: self.q + other.q,
            r: self.r + other.r,
        }
    }
}

impl std::ops::Sub for Hex {
    type Output = Hex;

    fn sub(self, other: Hex) -> Hex {
        Hex {
            q: self.q - other.q,
            r: self.r - other.r,
        }
    }
}

impl std::ops::Mul<i32> for Hex {
    type Output = Hex;

    fn mul(self, rhs: i32) -> Self::Output {
        Hex {
            q: self.q * rhs,
            r: self.r * rhs,
        }
    }
}

impl From<CubeHex> for Hex {
    fn from(cube: CubeHex) -> Self {
        Hex::from_cube(cube)
    }
}

impl From<OffsetCoord> for Hex {
    fn from(offset: OffsetCoord) -> Self {
        Hex::from_offset(offset)
    }
}

impl FractionalHex {
    pub fn new(q: f64, r: f64) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Nearest valid hex. The component with the largest rounding error is
    /// recomputed from the other two so that `q + r + s == 0` holds.
    pub fn round(self) -> Hex {
        let mut q = self.q.round();
        let mut r = self.r.round();
        let s = self.s.round();

        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (s - self.s).abs();

        if dq > dr && dq > ds {
            q = -r - s;
        } else if dr > ds {
            r = -q - s;
        }

        Hex {
            q: q as i32,
            r: r as i32,
        }
    }
}

struct RingIter {
    radius: i32,
    side: usize,
    step: i32,
    current: Hex,
    done: bool,
}

impl RingIter {
    fn new(center: Hex, radius: i32) -> Self {
        let current = if radius > 0 {
            center + Hex::DIRECTIONS[4] * radius
        } else {
            center
        };
        Self {
            radius,
            side: 0,
            step: 0,
            current,
            done: radius < 0,
        }
    }
}

impl Iterator for RingIter {
    type Item = Hex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let out = self.current;
        if self.radius == 0 {
            self.done = true;
            return Some(out);
        }

        self.current = out + Hex::DIRECTIONS[self.side];
        self.step += 1;
        if self.step >= self.radius {
            self.step = 0;
            self.side += 1;
            self.done = self.side >= 6;
        }
        Some(out)
    }
}

struct RangeIter {
    center: Hex,
    radius: i32,
    dq: i32,
    dr: i32,
    dr_max: i32,
}

impl RangeIter {
    fn new(center: Hex, radius: i32) -> Self {
        let radius = radius.max(0);
        let dq = -radius;
        let (dr, dr_max) = dr_bounds(dq, radius);
        Self {
            center,
            radius,
            dq,
            dr,
            dr_max,
        }
    }
}

impl Iterator for RangeIter {
    type Item = Hex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dq > self.radius {
            return None;
        }

        let out = Hex {
            q: self.center.q + self.dq,
            r: self.center.r + self.dr,
        };

        self.dr += 1;
        if self.dr > self.dr_max {
            self.dq += 1;
            let (dr_min, dr_max) = dr_bounds(self.dq, self.radius);
            self.dr = dr_min;
            self.dr_max = dr_max;
        }

        Some(out)
    }
}

#[inline]
fn dr_bounds(dq: i32, radius: i32) -> (i32, i32) {
    // max(|dq|, |dr|, |dq + dr|) <= radius
    let dr_min = (-radius).max(-dq - radius);
    let dr_max = radius.min(-dq + radius);
    (dr_min, dr_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_half_cube_manhattan() {
        let a = Hex::new(0, 0);
        let b = Hex::new(3, -1);
        assert_eq!(a.distance(b), 3);
        assert_eq!(b.distance(a), 3);
        assert_eq!(a.distance(a), 0);
    }

    #[test]
    fn neighbors_follow_direction_order() {
        let center = Hex::new(2, 3);
        let neighbors: Vec<_> = center.neighbors().collect();
        assert_eq!(neighbors.len(), 6);
        assert_eq!(neighbors[0], Hex::new(3, 3));
        assert_eq!(neighbors[3], Hex::new(1, 3));
        assert!(neighbors.iter().all(|n| center.distance(*n) == 1));
        assert_eq!(center.neighbor(7), neighbors[1]);
    }

    #[test]
    fn range_counts_match_redblob_formula() {
        let center = Hex::new(0, 0);
        for radius in 0..=4 {
            let hexes: Vec<_> = center.range(radius).collect();
            let expected = 1 + 3 * radius * (radius + 1);
            assert_eq!(hexes.len() as i32, expected);
            assert!(hexes.contains(&center));
            assert!(hexes.iter().all(|h| center.distance(*h) <= radius));
        }
    }

    #[test]
    fn ring_has_six_times_radius_members() {
        let center = Hex::new(-1, 4);
        assert_eq!(center.ring(0).collect::<Vec<_>>(), vec![center]);
        for radius in 1..=3 {
            let ring: Vec<_> = center.ring(radius).collect();
            assert_eq!(ring.len() as i32, 6 * radius);
            assert!(ring.iter().all(|h| center.distance(*h) == radius));
        }
    }

    #[test]
    fn offset_round_trip_for_negative_rows() {
        for r in -5..=5 {
            for q in -5..=5 {
                let hex = Hex::new(q, r);
                assert_eq!(Hex::from_offset(hex.to_offset()), hex);
            }
        }
        assert_eq!(Hex::new(0, 1).to_offset(), OffsetCoord { col: 0, row: 1 });
        assert_eq!(Hex::new(-1, 2).to_offset(), OffsetCoord { col: 0, row: 2 });
    }

    #[test]
    fn cube_conversion_keeps_zero_sum() {
        let cube = Hex::new(4, -7).to_cube();
        assert_eq!(cube.q + cube.r + cube.s, 0);
        assert_eq!(Hex::from(cube), Hex::new(4, -7));
    }

    #[test]
    fn fractional_round_picks_nearest() {
        assert_eq!(FractionalHex::new(0.1, 0.1).round(), Hex::new(0, 0));
        assert_eq!(FractionalHex::new(0.9, -0.1).round(), Hex::new(1, 0));
        // q error dominates and gets recomputed from r and s.
        assert_eq!(FractionalHex::new(1.45, 0.3).round(), Hex::new(2, 0));
        assert_eq!(FractionalHex::new(0.6, 0.6).round(), Hex::new(1, 0));
    }

    #[test]
    fn pack_unpack_preserves_sign() {
        for hex in [Hex::new(0, 0), Hex::new(-3, 7), Hex::new(i32::MIN, i32::MAX)] {
            assert_eq!(Hex::unpack(hex.pack()), hex);
        }
        assert_ne!(Hex::new(1, 0).pack(), Hex::new(0, 1).pack());
    }
}
