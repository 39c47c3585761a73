//! Marching-squares case classification.
//!
//! A grid cell's four corners are compared against the iso-value and
//! packed into a 4-bit [`CaseId`]. Corner `a` (top-left) contributes bit
//! 8, `b` (top-right) bit 4, `c` (bottom-right) bit 2 and `d`
//! (bottom-left) bit 1. A corner exactly at the iso-value counts as
//! above.

/// Bit set when the top-left corner is at or above the iso-value.
pub const A_BIT: u8 = 8;
/// Bit set when the top-right corner is at or above the iso-value.
pub const B_BIT: u8 = 4;
/// Bit set when the bottom-right corner is at or above the iso-value.
pub const C_BIT: u8 = 2;
/// Bit set when the bottom-left corner is at or above the iso-value.
pub const D_BIT: u8 = 1;

/// One of the 16 marching-squares cases, always in `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseId(u8);

impl CaseId {
    /// No corner above the iso-value.
    pub const EMPTY: Self = Self(0);
    /// Every corner above the iso-value.
    pub const FULL: Self = Self(15);

    /// Wrap raw case bits. Returns `None` for values above 15.
    #[must_use]
    pub const fn new(bits: u8) -> Option<Self> {
        if bits <= 15 { Some(Self(bits)) } else { None }
    }

    /// The raw case bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The named topological shape of this case.
    #[must_use]
    pub const fn shape(self) -> CellShape {
        match self.0 {
            0 => CellShape::Empty,
            1 => CellShape::BottomLeft,
            2 => CellShape::BottomRight,
            3 => CellShape::Bottom,
            4 => CellShape::TopRight,
            5 => CellShape::TopRightBottomLeft,
            6 => CellShape::Right,
            7 => CellShape::AllButTopLeft,
            8 => CellShape::TopLeft,
            9 => CellShape::Left,
            10 => CellShape::TopLeftBottomRight,
            11 => CellShape::AllButTopRight,
            12 => CellShape::Top,
            13 => CellShape::AllButBottomRight,
            14 => CellShape::AllButBottomLeft,
            _ => CellShape::Full,
        }
    }

    /// Whether this is one of the two ambiguous diagonal cases (5, 10).
    #[must_use]
    pub const fn is_saddle(self) -> bool {
        matches!(self.0, 5 | 10)
    }

    /// Whether the iso-line crosses this cell at all.
    #[must_use]
    pub const fn is_crossed(self) -> bool {
        self.0 != Self::EMPTY.0 && self.0 != Self::FULL.0
    }
}

/// Named marching-squares shapes, one per [`CaseId`].
///
/// Names describe which corners lie at or above the iso-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellShape {
    /// No corner above.
    Empty = 0,
    /// Only `d` above.
    BottomLeft = 1,
    /// Only `c` above.
    BottomRight = 2,
    /// `c` and `d` above.
    Bottom = 3,
    /// Only `b` above.
    TopRight = 4,
    /// `b` and `d` above (saddle).
    TopRightBottomLeft = 5,
    /// `b` and `c` above.
    Right = 6,
    /// All but `a` above.
    AllButTopLeft = 7,
    /// Only `a` above.
    TopLeft = 8,
    /// `a` and `d` above.
    Left = 9,
    /// `a` and `c` above (saddle).
    TopLeftBottomRight = 10,
    /// All but `b` above.
    AllButTopRight = 11,
    /// `a` and `b` above.
    Top = 12,
    /// All but `c` above.
    AllButBottomRight = 13,
    /// All but `d` above.
    AllButBottomLeft = 14,
    /// Every corner above.
    Full = 15,
}

/// Classify a cell from its corner values.
#[must_use]
pub fn classify(a: f64, b: f64, c: f64, d: f64, iso: f64) -> CaseId {
    let mut bits = 0;
    if a >= iso {
        bits |= A_BIT;
    }
    if b >= iso {
        bits |= B_BIT;
    }
    if c >= iso {
        bits |= C_BIT;
    }
    if d >= iso {
        bits |= D_BIT;
    }
    CaseId(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_below_is_empty() {
        assert_eq!(classify(1.0, 2.0, 3.0, 4.0, 10.0), CaseId::EMPTY);
    }

    #[test]
    fn all_above_is_full() {
        assert_eq!(classify(11.0, 12.0, 13.0, 14.0, 10.0), CaseId::FULL);
    }

    #[test]
    fn corner_at_threshold_counts_as_above() {
        assert_eq!(classify(10.0, 0.0, 0.0, 0.0, 10.0).bits(), A_BIT);
    }

    #[test]
    fn bit_order_matches_corners() {
        assert_eq!(classify(20.0, 0.0, 0.0, 0.0, 10.0).bits(), 8);
        assert_eq!(classify(0.0, 20.0, 0.0, 0.0, 10.0).bits(), 4);
        assert_eq!(classify(0.0, 0.0, 20.0, 0.0, 10.0).bits(), 2);
        assert_eq!(classify(0.0, 0.0, 0.0, 20.0, 10.0).bits(), 1);
    }

    #[test]
    fn every_combination_maps_to_its_bits() {
        for bits in 0..16u8 {
            let v = |bit: u8| if bits & bit != 0 { 1.0 } else { 0.0 };
            let case = classify(v(A_BIT), v(B_BIT), v(C_BIT), v(D_BIT), 0.5);
            assert_eq!(case.bits(), bits);
            assert_eq!(case.shape() as u8, bits);
        }
    }

    #[test]
    fn saddles_are_five_and_ten() {
        let saddles: Vec<u8> = (0..16u8)
            .filter_map(CaseId::new)
            .filter(|c| c.is_saddle())
            .map(CaseId::bits)
            .collect();
        assert_eq!(saddles, vec![5, 10]);
    }

    #[test]
    fn crossed_excludes_empty_and_full() {
        assert!(!CaseId::EMPTY.is_crossed());
        assert!(!CaseId::FULL.is_crossed());
        assert_eq!(
            (0..16u8)
                .filter_map(CaseId::new)
                .filter(|c| c.is_crossed())
                .count(),
            14
        );
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(CaseId::new(16).is_none());
        assert_eq!(CaseId::new(15), Some(CaseId::FULL));
    }

    #[test]
    fn named_shapes() {
        assert_eq!(CaseId::new(5).map(CaseId::shape), Some(CellShape::TopRightBottomLeft));
        assert_eq!(CaseId::new(10).map(CaseId::shape), Some(CellShape::TopLeftBottomRight));
        assert_eq!(CaseId::new(3).map(CaseId::shape), Some(CellShape::Bottom));
    }
}
