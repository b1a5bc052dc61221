//! CRC-CCITT for DMR data blocks
//!
//! DMR protects CSBKs and data headers with a 16-bit CCITT CRC
//! (polynomial 0x1021, zero preset, inverted output). The CRC is
//! transmitted MSB first after the block's data bits and XORed
//! with a mask that identifies the block type.

use crc::{Algorithm, Crc};

use crate::bits::{BitBuffer, BitFieldErr};

/// CRC-16/GSM parameters, which match the DMR CRC-CCITT
const CRC_CCITT_DMR: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0x0000,
    refin: false,
    refout: false,
    xorout: 0xFFFF,
    check: 0xCE3C,
    residue: 0x1D0F,
};

const DMR_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_CCITT_DMR);

/// CRC mask for control signalling blocks
pub const CSBK_CRC_MASK: u16 = 0xA5A5;

/// Compute the CRC-CCITT over the first `len` bits of `block`
///
/// `len` must be a whole number of bytes.
pub fn ccitt16(block: &BitBuffer, len: usize) -> Result<u16, BitFieldErr> {
    if len % 8 != 0 || len > block.len() {
        return Err(BitFieldErr::WrongLength {
            expected: len,
            actual: block.len(),
        });
    }

    let bytes = block.to_bytes();
    Ok(DMR_CCITT.checksum(&bytes[..len / 8]))
}

/// Check a block which ends with a masked CRC-CCITT
///
/// The last 16 bits of `block` are the CRC, XORed with `mask`.
pub fn ccitt16_check(block: &BitBuffer, mask: u16) -> Result<bool, BitFieldErr> {
    let data_len = data_len(block)?;
    let received = block.get_int(&crc_field(data_len))? as u16;
    Ok(ccitt16(block, data_len)? ^ mask == received)
}

/// Compute and store the masked CRC-CCITT in the last 16 bits of `block`
pub fn ccitt16_seal(block: &mut BitBuffer, mask: u16) -> Result<(), BitFieldErr> {
    let data_len = data_len(block)?;
    let crc = ccitt16(block, data_len)? ^ mask;
    block.set_int(&crc_field(data_len), crc as u64)
}

fn data_len(block: &BitBuffer) -> Result<usize, BitFieldErr> {
    if block.len() < 24 || block.len() % 8 != 0 {
        return Err(BitFieldErr::WrongLength {
            expected: 96,
            actual: block.len(),
        });
    }
    Ok(block.len() - 16)
}

fn crc_field(data_len: usize) -> Vec<usize> {
    (data_len..data_len + 16).collect()
}
