//! Bit projections of a raw instruction word.
//!
//! Every immediate is sign extended from bit 31 of the word itself (U has
//! nothing below its sign bit to extend into).

use crate::config::arch_config::{SignedWordType, WordType};

#[inline]
pub const fn opcode(ins: u32) -> u8 {
    (ins & 0x7f) as u8
}

#[inline]
pub const fn rd(ins: u32) -> u8 {
    ((ins >> 7) & 0x1f) as u8
}

#[inline]
pub const fn rs1(ins: u32) -> u8 {
    ((ins >> 15) & 0x1f) as u8
}

#[inline]
pub const fn rs2(ins: u32) -> u8 {
    ((ins >> 20) & 0x1f) as u8
}

#[inline]
pub const fn funct3(ins: u32) -> u8 {
    ((ins >> 12) & 0x7) as u8
}

#[inline]
pub const fn funct7(ins: u32) -> u8 {
    (ins >> 25) as u8
}

/// `ins[31:20]`
#[inline]
pub const fn imm_i(ins: u32) -> WordType {
    ((ins as SignedWordType) >> 20) as WordType
}

/// `ins[31:25] | ins[11:7]`
#[inline]
pub const fn imm_s(ins: u32) -> WordType {
    (((ins as SignedWordType) >> 20) as WordType & !0x1f) | ((ins >> 7) & 0x1f)
}

/// `ins[31] | ins[7] | ins[30:25] | ins[11:8] | 0`
#[inline]
pub const fn imm_b(ins: u32) -> WordType {
    (((ins as SignedWordType) >> 19) as WordType & !0xfff)
        | ((ins << 4) & 0x800)
        | ((ins >> 20) & 0x7e0)
        | ((ins >> 7) & 0x1e)
}

/// `ins[31:12] << 12`
#[inline]
pub const fn imm_u(ins: u32) -> WordType {
    ins & 0xffff_f000
}

/// `ins[31] | ins[19:12] | ins[20] | ins[30:21] | 0`
#[inline]
pub const fn imm_j(ins: u32) -> WordType {
    (((ins as SignedWordType) >> 11) as WordType & !0xf_ffff)
        | (ins & 0xf_f000)
        | ((ins >> 9) & 0x800)
        | ((ins >> 20) & 0x7fe)
}

/// Shift amount of the immediate shifts, shares its position with `rs2`.
#[inline]
pub const fn shamt(ins: u32) -> u8 {
    rs2(ins)
}

#[inline]
pub const fn csr(ins: u32) -> u16 {
    (ins >> 20) as u16
}


#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha12Rng;

    use super::*;

    /// Sign extend the low `bits` bits of `value`.
    fn sext(value: u32, bits: u32) -> u32 {
        let shift = 32 - bits;
        (((value << shift) as i32) >> shift) as u32
    }

    #[test]
    fn test_register_fields() {
        // add x3, x1, x2
        let ins = 0x002081b3;
        assert_eq!(opcode(ins), 0x33);
        assert_eq!(rd(ins), 3);
        assert_eq!(rs1(ins), 1);
        assert_eq!(rs2(ins), 2);
        assert_eq!(funct3(ins), 0);
        assert_eq!(funct7(ins), 0);
        // sub
        assert_eq!(funct7(0x402081b3), 0x20);
        assert_eq!(csr(0x30529073), 0x305);
    }

    #[test]
    fn test_known_immediates() {
        assert_eq!(imm_i(0xffb18113), (-5i32) as u32); // addi x2, x3, -5
        assert_eq!(imm_s(0xfe112c23), (-8i32) as u32); // sw x1, -8(x2)
        assert_eq!(imm_b(0xf8c318e3), (-112i32) as u32); // bne x6, x12, -112
        assert_eq!(imm_u(0x123450b7), 0x12345000); // lui x1, 0x12345
        assert_eq!(imm_j(0xf81ff06f), (-128i32) as u32); // jal x0, -128
        assert_eq!(shamt(0x4027d793), 2); // srai a5, a5, 2
    }

    #[test]
    fn test_sign_bit_propagates() {
        let mut rng = ChaCha12Rng::seed_from_u64(0x5eed);
        for _ in 0..1000 {
            let ins = rng.random::<u32>() | 0x8000_0000;
            assert!((imm_i(ins) as i32) < 0, "I {ins:#x}");
            assert!((imm_s(ins) as i32) < 0, "S {ins:#x}");
            assert!((imm_b(ins) as i32) < 0, "B {ins:#x}");
            assert!((imm_j(ins) as i32) < 0, "J {ins:#x}");
            // U keeps the word's top bits untouched.
            assert_eq!(imm_u(ins) >> 12, ins >> 12);

            let ins = ins & 0x7fff_ffff;
            assert!((imm_i(ins) as i32) >= 0);
            assert!((imm_s(ins) as i32) >= 0);
            assert!((imm_b(ins) as i32) >= 0);
            assert!((imm_j(ins) as i32) >= 0);
        }
    }

    #[test]
    fn test_encode_then_extract() {
        let mut rng = ChaCha12Rng::seed_from_u64(0721);
        for _ in 0..1000 {
            let imm12 = rng.random_range(0..=0xfff);
            assert_eq!(imm_i(encode::i(0x13, 0, 1, 2, imm12)), sext(imm12, 12));
            assert_eq!(imm_s(encode::s(0x23, 2, 1, 2, imm12)), sext(imm12, 12));

            let imm13 = rng.random_range(0..=0xfff) << 1;
            assert_eq!(imm_b(encode::b(0x63, 1, 1, 2, imm13)), sext(imm13, 13));

            let imm21 = rng.random_range(0..=0xf_ffff) << 1;
            assert_eq!(imm_j(encode::j(0x6f, 1, imm21)), sext(imm21, 21));

            let imm32 = rng.random::<u32>() & 0xffff_f000;
            assert_eq!(imm_u(encode::u(0x37, 1, imm32)), imm32);
        }
    }

    #[test]
    fn test_low_bit_of_branch_offsets_is_zero() {
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let ins = rng.random::<u32>();
            assert_eq!(imm_b(ins) & 1, 0);
            assert_eq!(imm_j(ins) & 1, 0);
        }
    }
}
