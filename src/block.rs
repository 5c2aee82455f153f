/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Padding byte used for data blocks (zero).
pub const DATA_PAD_BYTE: u8 = 0x00;

/// Returns the number of FITS blocks required to hold `num_bytes` bytes.
///
/// A FITS file is organized in units of 2880 bytes. This computes the ceiling
/// division: 0 bytes requires 0 blocks, 1 byte requires 1 block, 2880 bytes
/// requires 1 block, 2881 bytes requires 2 blocks, etc.
pub const fn blocks_needed(num_bytes: usize) -> usize {
    if num_bytes == 0 {
        return 0;
    }
    num_bytes.div_ceil(BLOCK_SIZE)
}

/// Returns the total byte length (in whole blocks) required to hold `num_bytes`.
///
/// This is simply `blocks_needed(num_bytes) * BLOCK_SIZE`.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    blocks_needed(num_bytes) * BLOCK_SIZE
}

/// Copies `src` into the beginning of `dest` and fills the remaining bytes of
/// `dest` with `pad_byte`.
///
/// `dest` must be at least as large as `src`. This is a general-purpose helper
/// used by the header and data padding routines.
///
/// # Panics
///
/// Panics if `dest.len() < src.len()`.
fn copy_and_pad(dest: &mut [u8], src: &[u8], pad_byte: u8) {
    let len = src.len();
    dest[..len].copy_from_slice(src);
    let remaining = &mut dest[len..];
    let mut i = 0;
    while i < remaining.len() {
        remaining[i] = pad_byte;
        i += 1;
    }
}

/// Writes `src` into `dest`, padding any trailing bytes in the final block with
/// ASCII spaces (0x20) as required for FITS header blocks.
///
/// `dest` must have length equal to `padded_byte_len(src.len())`.
///
/// # Panics
///
/// Panics if `dest` is not the correct padded length.
pub fn pad_header_blocks(dest: &mut [u8], src: &[u8]) {
    assert_eq!(
        dest.len(),
        padded_byte_len(src.len()),
        "dest length must equal the padded block length of src"
    );
    copy_and_pad(dest, src, HEADER_PAD_BYTE);
}

/// Writes `src` into `dest`, padding any trailing bytes in the final block with
/// zero bytes (0x00) as required for FITS data blocks.
///
/// `dest` must have length equal to `padded_byte_len(src.len())`.
///
/// # Panics
///
/// Panics if `dest` is not the correct padded length.
pub fn pad_data_blocks(dest: &mut [u8], src: &[u8]) {
    assert_eq!(
        dest.len(),
        padded_byte_len(src.len()),
        "dest length must equal the padded block length of src"
    );
    copy_and_pad(dest, src, DATA_PAD_BYTE);
}

/// Reads exactly one 2880-byte block from `src` starting at the given block
/// index and copies it into `dest`.
///
/// # Panics
///
/// Panics if `dest.len() != BLOCK_SIZE` or if `src` does not contain enough
/// bytes for the requested block.
pub fn read_block(dest: &mut [u8; BLOCK_SIZE], src: &[u8], block_index: usize) {
    let start = block_index * BLOCK_SIZE;
    let end = start + BLOCK_SIZE;
    assert!(
        src.len() >= end,
        "src does not contain block {}",
        block_index
    );
    dest.copy_from_slice(&src[start..end]);
}

/// Writes exactly one 2880-byte block from `block` into `dest` at the given
/// block index.
///
/// # Panics
///
/// Panics if `dest` does not have enough room to hold the block at the
/// requested index.
pub fn write_block(dest: &mut [u8], block: &[u8; BLOCK_SIZE], block_index: usize) {
    let start = block_index * BLOCK_SIZE;
    let end = start + BLOCK_SIZE;
    assert!(
        dest.len() >= end,
        "dest does not have room for block {}",
        block_index
    );
    dest[start..end].copy_from_slice(block);
}
