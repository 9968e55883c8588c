//! Decoded view of the `vtype` CSR.

/// Decoded `vtype` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VType {
    /// Selected element width in bits.
    pub sew: usize,
    /// LMUL as `lmul_num / lmul_den`.
    pub lmul_num: usize,
    pub lmul_den: usize,
    /// Tail agnostic
    pub vta: bool,
    /// Mask agnostic
    pub vma: bool,
    /// Illegal value
    pub vill: bool,
}

const VILL: VType = VType {
    sew: 8,
    lmul_num: 1,
    lmul_den: 1,
    vta: false,
    vma: false,
    vill: true,
};

impl VType {
    /// `vill` is bit XLEN-1.
    pub const VILL_BIT: usize = 1 << (usize::BITS - 1);

    /// Decode a raw `vtype`. Reserved SEW or LMUL encodings read as `vill`.
    pub fn decode(raw: usize) -> Self {
        if raw & Self::VILL_BIT != 0 {
            return VILL;
        }
        let sew = match (raw >> 3) & 0x7 {
            0 => 8,
            1 => 16,
            2 => 32,
            3 => 64,
            _ => return VILL,
        };
        let (lmul_num, lmul_den) = match raw & 0x7 {
            0 => (1, 1),
            1 => (2, 1),
            2 => (4, 1),
            3 => (8, 1),
            5 => (1, 8),
            6 => (1, 4),
            7 => (1, 2),
            _ => return VILL,
        };
        VType {
            sew,
            lmul_num,
            lmul_den,
            vta: raw >> 6 & 0x1 == 1,
            vma: raw >> 7 & 0x1 == 1,
            vill: false,
        }
    }

    /// Encode back to the raw CSR value.
    pub fn bits(&self) -> usize {
        if self.vill {
            return Self::VILL_BIT;
        }
        let vsew = self.sew.trailing_zeros() as usize - 3;
        let vlmul = match (self.lmul_num, self.lmul_den) {
            (1, 8) => 5,
            (1, 4) => 6,
            (1, 2) => 7,
            (num, _) => num.trailing_zeros() as usize,
        };
        usize::from(self.vma) << 7 | usize::from(self.vta) << 6 | vsew << 3 | vlmul
    }

    /// VLMAX = LMUL * VLEN / SEW for a register length of `vlenb` bytes.
    pub fn vlmax(&self, vlenb: usize) -> usize {
        if self.vill {
            return 0;
        }
        vlenb * 8 * self.lmul_num / (self.sew * self.lmul_den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_e32_m1_ta() {
        let vtype = VType::decode(0b0101_0000);
        assert_eq!(vtype.sew, 32);
        assert_eq!((vtype.lmul_num, vtype.lmul_den), (1, 1));
        assert!(vtype.vta);
        assert!(!vtype.vma);
        assert!(!vtype.vill);
        assert_eq!(vtype.bits(), 0b0101_0000);
        assert_eq!(vtype.vlmax(16), 4);
    }

    #[test]
    fn decode_e8_m8_ta_ma() {
        let vtype = VType::decode(0xc3);
        assert_eq!(vtype.sew, 8);
        assert_eq!(vtype.lmul_num, 8);
        assert_eq!(vtype.vlmax(16), 128);
        assert_eq!(vtype.bits(), 0xc3);
    }

    #[test]
    fn fractional_lmul() {
        let vtype = VType::decode(0b00_1111);
        assert_eq!(vtype.sew, 16);
        assert_eq!((vtype.lmul_num, vtype.lmul_den), (1, 2));
        assert_eq!(vtype.vlmax(32), 8);
        assert_eq!(vtype.bits(), 0b00_1111);
    }

    #[test]
    fn reserved_encodings_are_vill() {
        assert!(VType::decode(VType::VILL_BIT).vill);
        // vsew = 4
        assert!(VType::decode(0b10_0000).vill);
        // vlmul = 4
        assert!(VType::decode(0b100).vill);
        assert_eq!(VType::decode(0b100).vlmax(16), 0);
        assert_eq!(VType::decode(0b100).bits(), VType::VILL_BIT);
    }
}
