//! Forward error control codes used inside DMR bursts
//!
//! * Golay(20,8): slot type
//! * Hamming(7,4): CACH TACT bits
//! * Hamming(15,11) and Hamming(13,9): rows and columns of the
//!   BPTC(196,96) product code which carries data payloads
//! * Reed-Solomon(12,9) over GF(2⁸): full link control
//!
//! The demodulator hands us hard-decision bits. These codes are
//! used to validate them and to repair the few errors each code
//! can repair.

use crate::bits::{BitBuffer, BitFieldErr};

/// Golay generator polynomial x¹¹+x¹⁰+x⁶+x⁵+x⁴+x²+1
const GOLAY_GENERATOR: u32 = 0xC75;

/// Maximum number of bit errors Golay(20,8) corrects
pub const GOLAY2087_MAX_ERRORS: u32 = 3;

/// Golay(20,8) parity for `data`
///
/// Returns the twelve parity bits: eleven remainder bits of
/// the (23,12) cyclic code followed by an even overall parity
/// bit.
pub fn golay2087_parity(data: u8) -> u16 {
    let mut rem = (data as u32) << 11;
    for bit in (11..19).rev() {
        if rem & (1 << bit) != 0 {
            rem ^= GOLAY_GENERATOR << (bit - 11);
        }
    }

    let overall = (data.count_ones() + rem.count_ones()) & 1;
    ((rem << 1) | overall) as u16
}

/// Golay(20,8) codeword for `data`, data bits first
pub fn golay2087_encode(data: u8) -> u32 {
    ((data as u32) << 12) | golay2087_parity(data) as u32
}

/// Decode a 20-bit Golay(20,8) codeword
///
/// Returns the data byte and the number of bits corrected, or
/// `None` if the word is more than three bit errors away from
/// every codeword.
pub fn golay2087_decode(word: u32) -> Option<(u8, u32)> {
    let word = word & 0xF_FFFF;
    let received = (word >> 12) as u8;
    let errors = (golay2087_encode(received) ^ word).count_ones();
    if errors == 0 {
        return Some((received, 0));
    }

    // 256 candidates; the minimum distance is 8, so at most one
    // codeword lies within three bits of the input
    (0..=255u8)
        .map(|data| (data, (golay2087_encode(data) ^ word).count_ones()))
        .find(|&(_, errors)| errors <= GOLAY2087_MAX_ERRORS)
}

/// Hamming(7,4) parity for the low nibble of `data`
///
/// Data bits are taken MSB first: `d0` is bit 3.
pub fn hamming74_parity(data: u8) -> u8 {
    let d = |i: u8| (data >> (3 - i)) & 1;
    let p0 = d(0) ^ d(1) ^ d(2);
    let p1 = d(1) ^ d(2) ^ d(3);
    let p2 = d(0) ^ d(1) ^ d(3);
    (p0 << 2) | (p1 << 1) | p2
}

/// Hamming(15,11) parity bits for a row of eleven data bits
fn hamming15113_parity(d: &[bool]) -> [bool; 4] {
    [
        d[0] ^ d[1] ^ d[2] ^ d[3] ^ d[5] ^ d[7] ^ d[8],
        d[1] ^ d[2] ^ d[3] ^ d[4] ^ d[6] ^ d[8] ^ d[9],
        d[2] ^ d[3] ^ d[4] ^ d[5] ^ d[7] ^ d[9] ^ d[10],
        d[0] ^ d[1] ^ d[2] ^ d[4] ^ d[6] ^ d[7] ^ d[10],
    ]
}

/// Hamming(13,9) parity bits for a column of nine data bits
fn hamming1393_parity(d: &[bool]) -> [bool; 4] {
    [
        d[0] ^ d[1] ^ d[3] ^ d[5] ^ d[6],
        d[0] ^ d[1] ^ d[2] ^ d[4] ^ d[6] ^ d[7],
        d[0] ^ d[1] ^ d[2] ^ d[3] ^ d[5] ^ d[7] ^ d[8],
        d[0] ^ d[2] ^ d[4] ^ d[5] ^ d[8],
    ]
}

// Outcome of a single-error-correcting Hamming decode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HammingOutcome {
    Clean,
    Corrected,
    Uncorrectable,
}

// Repair at most one bit error in `word`
//
// The last four bits of `word` are parity over the rest,
// computed by `parity`. All of the codes we use have
// distinct, non-zero syndromes for every single-bit error.
fn hamming_correct(word: &mut [bool], parity: fn(&[bool]) -> [bool; 4]) -> HammingOutcome {
    let data_len = word.len() - 4;
    let syndrome = |w: &[bool]| parity(&w[..data_len]) != w[data_len..];

    if !syndrome(&*word) {
        return HammingOutcome::Clean;
    }

    for i in 0..word.len() {
        word[i] = !word[i];
        if !syndrome(&*word) {
            return HammingOutcome::Corrected;
        }
        word[i] = !word[i];
    }

    HammingOutcome::Uncorrectable
}

/// Number of bits in a BPTC(196,96) codeword
pub const BPTC_CODEWORD_BITS: usize = 196;

/// Number of payload bits in a BPTC(196,96) codeword
pub const BPTC_PAYLOAD_BITS: usize = 96;

const BPTC_ROWS: usize = 13;
const BPTC_COLUMNS: usize = 15;
const BPTC_DATA_ROWS: usize = 9;
const BPTC_DATA_COLUMNS: usize = 11;

/// A decoded BPTC(196,96) payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BptcBlock {
    /// The 96 payload bits
    pub payload: BitBuffer,

    /// Reserved bits R(2), R(1), R(0), MSB first
    pub reserved: u8,

    /// Number of bits repaired by the row and column codes
    pub corrected: u32,

    /// True if some row or column could not be repaired
    pub uncorrectable: bool,
}

// Position of a matrix cell within the deinterleaved codeword.
// Bit 0 is the spare R(3) bit.
fn bptc_cell(row: usize, column: usize) -> usize {
    1 + row * BPTC_COLUMNS + column
}

// Interleaved (on-air) position of a deinterleaved bit
fn bptc_interleave(index: usize) -> usize {
    (index * 181) % BPTC_CODEWORD_BITS
}

/// Decode a BPTC(196,96) codeword
///
/// The `codeword` holds the 196 info bits exactly as they
/// appear in the burst (interleaved).
pub fn bptc196x96_decode(codeword: &BitBuffer) -> Result<BptcBlock, BitFieldErr> {
    if codeword.len() != BPTC_CODEWORD_BITS {
        return Err(BitFieldErr::WrongLength {
            expected: BPTC_CODEWORD_BITS,
            actual: codeword.len(),
        });
    }

    let mut deinterleaved = [false; BPTC_CODEWORD_BITS];
    for (i, bit) in deinterleaved.iter_mut().enumerate() {
        *bit = codeword.get(bptc_interleave(i))?;
    }

    let mut matrix = [[false; BPTC_COLUMNS]; BPTC_ROWS];
    for (r, row) in matrix.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = deinterleaved[bptc_cell(r, c)];
        }
    }

    let mut corrected = 0;
    let mut uncorrectable = false;
    let mut tally = |outcome| match outcome {
        HammingOutcome::Clean => {}
        HammingOutcome::Corrected => corrected += 1,
        HammingOutcome::Uncorrectable => uncorrectable = true,
    };

    // columns first, then data rows
    for c in 0..BPTC_COLUMNS {
        let mut column: Vec<bool> = matrix.iter().map(|row| row[c]).collect();
        tally(hamming_correct(&mut column, hamming1393_parity));
        for (row, bit) in matrix.iter_mut().zip(column) {
            row[c] = bit;
        }
    }
    for row in matrix.iter_mut().take(BPTC_DATA_ROWS) {
        tally(hamming_correct(row, hamming15113_parity));
    }

    let reserved = (matrix[0][0] as u8) << 2 | (matrix[0][1] as u8) << 1 | matrix[0][2] as u8;
    let payload = matrix
        .iter()
        .take(BPTC_DATA_ROWS)
        .enumerate()
        .flat_map(|(r, row)| {
            let first = if r == 0 { 3 } else { 0 };
            row[first..BPTC_DATA_COLUMNS].iter().copied()
        })
        .collect();

    Ok(BptcBlock {
        payload,
        reserved,
        corrected,
        uncorrectable,
    })
}

/// Encode 96 payload bits as an interleaved BPTC(196,96) codeword
///
/// `reserved` supplies R(2), R(1), R(0) in its three low bits.
pub fn bptc196x96_encode(payload: &BitBuffer, reserved: u8) -> Result<BitBuffer, BitFieldErr> {
    if payload.len() != BPTC_PAYLOAD_BITS {
        return Err(BitFieldErr::WrongLength {
            expected: BPTC_PAYLOAD_BITS,
            actual: payload.len(),
        });
    }

    let mut matrix = [[false; BPTC_COLUMNS]; BPTC_ROWS];
    matrix[0][0] = reserved & 0b100 != 0;
    matrix[0][1] = reserved & 0b010 != 0;
    matrix[0][2] = reserved & 0b001 != 0;

    let mut bits = payload.iter();
    for (r, row) in matrix.iter_mut().enumerate().take(BPTC_DATA_ROWS) {
        let first = if r == 0 { 3 } else { 0 };
        for cell in row[first..BPTC_DATA_COLUMNS].iter_mut() {
            *cell = bits.next().unwrap_or(false);
        }
        let parity = hamming15113_parity(&row[..BPTC_DATA_COLUMNS]);
        row[BPTC_DATA_COLUMNS..].copy_from_slice(&parity);
    }
    for c in 0..BPTC_COLUMNS {
        let column: Vec<bool> = matrix.iter().take(BPTC_DATA_ROWS).map(|row| row[c]).collect();
        let parity = hamming1393_parity(&column);
        for (row, bit) in matrix.iter_mut().skip(BPTC_DATA_ROWS).zip(parity) {
            row[c] = bit;
        }
    }

    let mut deinterleaved = [false; BPTC_CODEWORD_BITS];
    for (r, row) in matrix.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            deinterleaved[bptc_cell(r, c)] = cell;
        }
    }

    let mut codeword = BitBuffer::zeroed(BPTC_CODEWORD_BITS);
    for (i, &bit) in deinterleaved.iter().enumerate() {
        codeword.set(bptc_interleave(i), bit)?;
    }
    Ok(codeword)
}

/// Reed-Solomon(12,9) generator coefficients, x⁰ first
const RS129_GENERATOR: [u8; 4] = [64, 56, 14, 1];

// Multiply in GF(2⁸) with the primitive polynomial x⁸+x⁴+x³+x²+1
fn gf256_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1D;
        }
        b >>= 1;
    }
    product
}

/// Reed-Solomon(12,9) parity bytes for nine data bytes
///
/// The bytes are returned in transmission order.
pub fn rs129_parity(data: &[u8; 9]) -> [u8; 3] {
    let mut parity = [0u8; 3];
    for &byte in data {
        let feedback = byte ^ parity[2];
        parity[2] = parity[1] ^ gf256_mul(RS129_GENERATOR[2], feedback);
        parity[1] = parity[0] ^ gf256_mul(RS129_GENERATOR[1], feedback);
        parity[0] = gf256_mul(RS129_GENERATOR[0], feedback);
    }
    [parity[2], parity[1], parity[0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golay2087_parity() {
        assert_eq!(golay2087_parity(0x00), 0x000);
        assert_eq!(golay2087_parity(0x01), 0x8EB);
        assert_eq!(golay2087_parity(0x02), 0x93E);

        // linear code
        assert_eq!(
            golay2087_parity(0x03),
            golay2087_parity(0x01) ^ golay2087_parity(0x02)
        );

        // every codeword has even weight
        for data in 0..=255u8 {
            assert_eq!(golay2087_encode(data).count_ones() % 2, 0);
        }
    }

    #[test]
    fn test_golay2087_decode() {
        let word = golay2087_encode(0x13);
        assert_eq!(golay2087_decode(word), Some((0x13, 0)));
        assert_eq!(golay2087_decode(word ^ 0x8_0001), Some((0x13, 2)));
        assert_eq!(golay2087_decode(word ^ 0x4_0810), Some((0x13, 3)));

        // four errors are never decoded back to the original
        let decoded = golay2087_decode(word ^ 0xF_0000);
        assert_ne!(decoded.map(|(data, _)| data), Some(0x13));
    }

    #[test]
    fn test_hamming74() {
        assert_eq!(hamming74_parity(0b0000), 0b000);
        assert_eq!(hamming74_parity(0b1000), 0b101);
        assert_eq!(hamming74_parity(0b0001), 0b011);
        assert_eq!(hamming74_parity(0b1111), 0b111);
    }

    #[test]
    fn test_hamming_correct() {
        let mut row = [true, false, true, true, false, false, true, false, true, true, false];
        let parity = hamming15113_parity(&row);
        let mut word: Vec<bool> = row.iter().copied().chain(parity).collect();
        assert_eq!(
            hamming_correct(&mut word, hamming15113_parity),
            HammingOutcome::Clean
        );

        for i in 0..15 {
            let mut bad = word.clone();
            bad[i] = !bad[i];
            assert_eq!(
                hamming_correct(&mut bad, hamming15113_parity),
                HammingOutcome::Corrected
            );
            assert_eq!(bad, word);
        }

        row[0] = !row[0];
        let column: Vec<bool> = row[..9].to_vec();
        let parity = hamming1393_parity(&column);
        let word: Vec<bool> = column.iter().copied().chain(parity).collect();
        for i in 0..13 {
            let mut bad = word.clone();
            bad[i] = !bad[i];
            assert_eq!(
                hamming_correct(&mut bad, hamming1393_parity),
                HammingOutcome::Corrected
            );
            assert_eq!(bad, word);
        }
    }

    #[test]
    fn test_bptc_interleave_is_a_permutation() {
        let mut seen = [false; BPTC_CODEWORD_BITS];
        for i in 0..BPTC_CODEWORD_BITS {
            seen[bptc_interleave(i)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_bptc196x96() {
        let payload = BitBuffer::from_hex("BC0600050003000001EE5A17").unwrap();
        let codeword = bptc196x96_encode(&payload, 0b101).unwrap();
        assert_eq!(codeword.len(), BPTC_CODEWORD_BITS);

        let block = bptc196x96_decode(&codeword).unwrap();
        assert_eq!(block.payload, payload);
        assert_eq!(block.reserved, 0b101);
        assert_eq!(block.corrected, 0);
        assert!(!block.uncorrectable);

        // scattered single errors are repaired
        let mut damaged = codeword.clone();
        for i in [3usize, 77, 100] {
            damaged.set(i, !damaged.get(i).unwrap()).unwrap();
        }
        let block = bptc196x96_decode(&damaged).unwrap();
        assert_eq!(block.payload, payload);
        assert!(block.corrected >= 3);

        assert!(bptc196x96_decode(&BitBuffer::zeroed(195)).is_err());
        assert!(bptc196x96_encode(&BitBuffer::zeroed(95), 0).is_err());
    }

    // Info bits of a repeater idle burst, as published in the
    // MMDVMHost DMR_IDLE_DATA template, and the idle fill bits
    // they carry
    const IDLE_CODEWORD: &str = "53C25EABA8671DC7383BD9363F6E465171B48CA6D4FC610B4";
    const IDLE_PAYLOAD: &str = "FF83DF1732094ED1E7CD8A91";

    #[test]
    fn test_bptc196x96_known_idle() {
        let codeword = BitBuffer::from_hex(IDLE_CODEWORD).unwrap();
        assert_eq!(codeword.len(), BPTC_CODEWORD_BITS);

        let block = bptc196x96_decode(&codeword).unwrap();
        assert_eq!(IDLE_PAYLOAD, &block.payload.to_hex_string());
        assert_eq!(block.reserved, 0);
        assert_eq!(block.corrected, 0);
        assert!(!block.uncorrectable);

        let payload = BitBuffer::from_hex(IDLE_PAYLOAD).unwrap();
        assert_eq!(bptc196x96_encode(&payload, 0).unwrap(), codeword);
    }

    // Evaluate a codeword, first byte highest degree, at αᵏ
    fn rs129_syndrome(codeword: &[u8], k: u32) -> u8 {
        let mut alpha = 1u8;
        for _ in 0..k {
            alpha = gf256_mul(alpha, 2);
        }
        codeword
            .iter()
            .fold(0u8, |acc, &byte| gf256_mul(acc, alpha) ^ byte)
    }

    #[test]
    fn test_rs129_known_parity() {
        const VECTORS: &[([u8; 9], [u8; 3])] = &[
            ([0x00, 0x00, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x01], [0x46, 0xD7, 0xC4]),
            ([0x00, 0x10, 0x20, 0x00, 0x0C, 0x30, 0x2F, 0x9B, 0xE5], [0x4C, 0x42, 0xCC]),
            ([0x00, 0x00, 0x00, 0x00, 0x79, 0x7C, 0x2F, 0x52, 0x32], [0xF7, 0xA9, 0xD9]),
        ];
        for (data, expect) in VECTORS {
            let parity = rs129_parity(data);
            assert_eq!(&parity, expect);

            // every codeword has roots at α, α², and α³
            let codeword: Vec<u8> = data.iter().chain(parity.iter()).copied().collect();
            for k in 1..=3 {
                assert_eq!(rs129_syndrome(&codeword, k), 0, "{:02X?} α^{}", data, k);
            }
        }
    }

    #[test]
    fn test_rs129() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(rs129_parity(&data), [0, 0, 0]);

        let data = [0x00, 0x10, 0x20, 0x00, 0x0C, 0x30, 0x2F, 0x9B, 0xE5];
        let parity = rs129_parity(&data);
        assert_ne!(parity, [0, 0, 0]);

        let mut bad = data;
        bad[4] ^= 0x01;
        assert_ne!(rs129_parity(&bad), parity);
    }
}
