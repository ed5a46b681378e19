//! Hand-assembled SAS7BDAT byte streams for integration tests. No fixture
//! files are checked in; every dataset here is built byte-by-byte against
//! the documented header/subheader/page layout so the tests stay
//! self-contained.

const MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC2, 0xEA, 0x81, 0x60,
    0xB3, 0x14, 0x11, 0xCF, 0xBD, 0x92, 0x08, 0x00, 0x09, 0xC7, 0x31, 0x8C, 0x18, 0x1F, 0x10, 0x11,
];

const HEADER_LEN: usize = 288;
const PAGE_LEN: usize = 2048;

/// A tiny 64-bit little-endian, uncompressed dataset with two columns
/// (`num`: numeric, `str`: character) and two rows:
///   (3.5,   "ab")
///   (-2.25, "xyz")
pub fn two_column_dataset() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + 2 * PAGE_LEN);
    bytes.extend(header());
    bytes.extend(meta_page());
    bytes.extend(data_page());
    bytes
}

fn header() -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_LEN];
    buf[0..32].copy_from_slice(&MAGIC);
    buf[32] = b'3'; // 64-bit
    buf[35] = 0; // no extra alignment block
    buf[37] = 0x01; // little-endian
    buf[39] = b'1'; // unix
    buf[70] = 20; // UTF-8
    buf[196..200].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
    buf[200..204].copy_from_slice(&(PAGE_LEN as u32).to_le_bytes());
    buf[204..208].copy_from_slice(&2u32.to_le_bytes()); // page_count
    buf
}

fn put_u16(page: &mut [u8], at: usize, value: u16) {
    page[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(page: &mut [u8], at: usize, value: u64) {
    page[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn put_descriptor(page: &mut [u8], index: usize, offset: u64, length: u64) {
    let base = 40 + index * 24;
    put_u64(page, base, offset);
    put_u64(page, base + 8, length);
    page[base + 16] = 0; // compression_flag
    page[base + 17] = 0; // subtype_flag
}

/// Page 0: a Meta page carrying RowSize, ColumnSize, ColumnText, ColumnName
/// and ColumnAttributes subheaders for the two columns above.
fn meta_page() -> Vec<u8> {
    let mut page = vec![0u8; PAGE_LEN];
    put_u16(&mut page, 32, 0x0000); // page type: meta
    put_u16(&mut page, 34, 0); // block_count (unused on meta pages)
    put_u16(&mut page, 36, 5); // subheader_count

    const ROW_SIZE_OFF: u64 = 160;
    const ROW_SIZE_LEN: u64 = 720;
    const COLUMN_SIZE_OFF: u64 = 880;
    const COLUMN_SIZE_LEN: u64 = 16;
    const COLUMN_TEXT_OFF: u64 = 896;
    const COLUMN_TEXT_LEN: u64 = 64;
    const COLUMN_NAME_OFF: u64 = 960;
    const COLUMN_NAME_LEN: u64 = 48;
    const COLUMN_ATTRS_OFF: u64 = 1008;
    const COLUMN_ATTRS_LEN: u64 = 64;

    put_descriptor(&mut page, 0, ROW_SIZE_OFF, ROW_SIZE_LEN);
    put_descriptor(&mut page, 1, COLUMN_SIZE_OFF, COLUMN_SIZE_LEN);
    put_descriptor(&mut page, 2, COLUMN_TEXT_OFF, COLUMN_TEXT_LEN);
    put_descriptor(&mut page, 3, COLUMN_NAME_OFF, COLUMN_NAME_LEN);
    put_descriptor(&mut page, 4, COLUMN_ATTRS_OFF, COLUMN_ATTRS_LEN);

    // RowSize body.
    let row_size = ROW_SIZE_OFF as usize;
    page[row_size..row_size + 8].copy_from_slice(&[0, 0, 0, 0, 0xF7, 0xF7, 0xF7, 0xF7]);
    put_u64(&mut page, row_size + 40, 16); // row_length
    put_u64(&mut page, row_size + 48, 2); // row_count
    put_u64(&mut page, row_size + 72, 2); // col_count_p1
    put_u64(&mut page, row_size + 80, 0); // col_count_p2
    put_u64(&mut page, row_size + 120, 0); // mix_page_row_count
    put_u16(&mut page, row_size + 682, 0); // lcs
    put_u16(&mut page, row_size + 706, 0); // lcp

    // ColumnSize body.
    let column_size = COLUMN_SIZE_OFF as usize;
    page[column_size..column_size + 8].copy_from_slice(&[0, 0, 0, 0, 0xF6, 0xF6, 0xF6, 0xF6]);
    put_u64(&mut page, column_size + 8, 2); // column_count

    // ColumnText body: an 8-byte signature, then a text block holding the
    // column names "num" and "str" at fixed offsets.
    let column_text = COLUMN_TEXT_OFF as usize;
    page[column_text..column_text + 8]
        .copy_from_slice(&[0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    let block_len: u16 = 56;
    put_u16(&mut page, column_text + 8, block_len);
    let block = column_text + 8; // start of the text block itself
    page[block + 12..block + 20].copy_from_slice(b"        "); // blank creator-proc marker
    page[block + 32..block + 35].copy_from_slice(b"num");
    page[block + 40..block + 43].copy_from_slice(b"str");

    // ColumnName body: two 8-byte entries (idx, name_offset, name_length, pad).
    let column_name = COLUMN_NAME_OFF as usize;
    page[column_name..column_name + 8].copy_from_slice(&[0xFF; 8]);
    put_u16(&mut page, column_name + 16, 0); // idx
    put_u16(&mut page, column_name + 18, 32); // name_offset (into the text block)
    put_u16(&mut page, column_name + 20, 3); // name_length
    put_u16(&mut page, column_name + 24, 0); // idx
    put_u16(&mut page, column_name + 26, 40); // name_offset
    put_u16(&mut page, column_name + 28, 3); // name_length

    // ColumnAttributes body: two 16-byte entries (offset, length, storage).
    let column_attrs = COLUMN_ATTRS_OFF as usize;
    page[column_attrs..column_attrs + 8]
        .copy_from_slice(&[0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    put_u64(&mut page, column_attrs + 16, 0); // column 0 offset
    page[column_attrs + 24..column_attrs + 28].copy_from_slice(&8u32.to_le_bytes()); // length
    page[column_attrs + 30] = 1; // numeric
    put_u64(&mut page, column_attrs + 32, 8); // column 1 offset
    page[column_attrs + 40..column_attrs + 44].copy_from_slice(&8u32.to_le_bytes()); // length
    page[column_attrs + 46] = 2; // character

    page
}

/// Page 1: a Data page with two 16-byte rows: `(3.5, "ab")`, `(-2.25, "xyz")`.
fn data_page() -> Vec<u8> {
    let mut page = vec![0u8; PAGE_LEN];
    put_u16(&mut page, 32, 0x0100); // page type: data
    put_u16(&mut page, 34, 2); // block_count (row count on a data page)
    put_u16(&mut page, 36, 0); // subheader_count

    let row0 = 40;
    page[row0..row0 + 8].copy_from_slice(&3.5f64.to_le_bytes());
    page[row0 + 8..row0 + 16].copy_from_slice(b"ab      ");

    let row1 = row0 + 16;
    page[row1..row1 + 8].copy_from_slice(&(-2.25f64).to_le_bytes());
    page[row1 + 8..row1 + 16].copy_from_slice(b"xyz     ");

    page
}
