//! Writer (C7): serializes a canonicalized, bundled tree into the DeCAF
//! on-disk byte layout described in §6 — magic, archive checksum, meta
//! header, listing header, bundle header, then the concatenated zstd
//! frames of the data section.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::bundle;
use crate::codec;
use crate::error::DecafError;
use crate::hash::xxh3_64;
use crate::listing::{Listing, ListingBuilder, sort_listings};
use crate::tree::TreeSource;

/// `0x66616365646D6169` little-endian spells `"iamdecaf"`.
pub const MAGIC: u64 = 0x6661_6365_646D_6169;

pub const PREFIX_SIZE: u64 = 16;
pub const META_HEADER_SIZE: u64 = 24;
pub const BUNDLE_RECORD_SIZE: u64 = 24;
pub const LISTING_FIXED_SIZE: u64 = 35;

pub fn encode_listing(listing: &Listing) -> Vec<u8> {
    let path_bytes = listing.path.as_bytes();
    let total_length = LISTING_FIXED_SIZE + path_bytes.len() as u64;
    let mut buf = Vec::with_capacity(total_length as usize);
    buf.extend_from_slice(&(total_length as u16).to_le_bytes());
    buf.extend_from_slice(&listing.bundle_index.to_le_bytes());
    buf.extend_from_slice(&listing.bundle_offset.to_le_bytes());
    buf.extend_from_slice(&listing.content_size.to_le_bytes());
    buf.extend_from_slice(&listing.checksum.to_le_bytes());
    buf.push(listing.mode.as_byte());
    buf.extend_from_slice(path_bytes);
    buf
}

pub fn encode_bundle_record(offset_in_data_section: u64, compressed_size: u64, uncompressed_checksum: u64) -> [u8; 24] {
    let mut buf = [0u8; 24];
    buf[0..8].copy_from_slice(&offset_in_data_section.to_le_bytes());
    buf[8..16].copy_from_slice(&compressed_size.to_le_bytes());
    buf[16..24].copy_from_slice(&uncompressed_checksum.to_le_bytes());
    buf
}

/// Builds the full archive byte sequence for everything reachable from
/// `source`. Bundle compression is dispatched across `rayon`'s thread pool;
/// the canonical order is fixed before dispatch, so results are written
/// back by index and the output is identical regardless of completion
/// order.
pub fn write_archive(source: &dyn TreeSource) -> Result<Vec<u8>, DecafError> {
    let mut listings = ListingBuilder::build(source)?;
    sort_listings(&mut listings);

    let packed = bundle::pack(&mut listings);
    debug!(listings = listings.len(), bundles = packed.len(), "packed tree into bundles");

    let compressed: Vec<Vec<u8>> = packed
        .par_iter()
        .map(|b| codec::compress(&b.uncompressed))
        .collect::<Result<_, _>>()?;

    let mut bundle_header = Vec::with_capacity(compressed.len() * BUNDLE_RECORD_SIZE as usize);
    let mut data_section = Vec::new();
    let mut offset = 0u64;
    for (slab, bytes) in packed.iter().zip(compressed.iter()) {
        bundle_header.extend_from_slice(&encode_bundle_record(offset, bytes.len() as u64, slab.uncompressed_checksum));
        data_section.extend_from_slice(bytes);
        offset += bytes.len() as u64;
    }

    let mut listing_header = Vec::new();
    for listing in &listings {
        listing_header.extend_from_slice(&encode_listing(listing));
    }

    let mut rest = Vec::with_capacity(
        META_HEADER_SIZE as usize + listing_header.len() + bundle_header.len() + data_section.len(),
    );
    rest.extend_from_slice(&(listing_header.len() as u64).to_le_bytes());
    rest.extend_from_slice(&(listings.len() as u64).to_le_bytes());
    rest.extend_from_slice(&(packed.len() as u64).to_le_bytes());
    rest.extend_from_slice(&listing_header);
    rest.extend_from_slice(&bundle_header);
    rest.extend_from_slice(&data_section);

    let archive_checksum = xxh3_64(&rest);

    let mut out = Vec::with_capacity(PREFIX_SIZE as usize + rest.len());
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&archive_checksum.to_le_bytes());
    out.extend_from_slice(&rest);

    trace!(archive_bytes = out.len(), "assembled archive");
    Ok(out)
}
