pub mod byteorder;
pub mod compression;
pub mod encoding;
pub mod field;
pub mod header;
pub mod page;
pub mod projection;
pub mod row;
pub mod subheader;
pub mod type_inference;
