//! Reader (C8): parses and verifies a DeCAF archive, never trusting a
//! length field before checking it against the buffer it indexes into.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::archive::{BUNDLE_RECORD_SIZE, LISTING_FIXED_SIZE, MAGIC, META_HEADER_SIZE, PREFIX_SIZE};
use crate::codec;
use crate::error::DecafError;
use crate::hash::xxh3_64;
use crate::listing::Mode;
use crate::tree::TreeSink;

struct ParsedListing {
    path: String,
    mode: Mode,
    bundle_index: u64,
    bundle_offset: u64,
    content_size: u64,
    checksum: u64,
}

struct BundleSpec {
    offset_in_data_section: u64,
    compressed_size: u64,
    uncompressed_checksum: u64,
}

fn decode_bundle_record(record: &[u8]) -> BundleSpec {
    BundleSpec {
        offset_in_data_section: u64::from_le_bytes(record[0..8].try_into().unwrap()),
        compressed_size: u64::from_le_bytes(record[8..16].try_into().unwrap()),
        uncompressed_checksum: u64::from_le_bytes(record[16..24].try_into().unwrap()),
    }
}

/// Parses the listing header, advancing by each record's own declared
/// `total_length`. Rejects a record that would read past the header.
fn decode_listings(listing_header: &[u8], listing_count: u64) -> Result<Vec<ParsedListing>, DecafError> {
    let mut listings = Vec::with_capacity(listing_count as usize);
    let mut cursor = 0usize;
    for _ in 0..listing_count {
        if cursor + 2 > listing_header.len() {
            return Err(DecafError::Truncated);
        }
        let total_length = u16::from_le_bytes(listing_header[cursor..cursor + 2].try_into().unwrap()) as usize;
        if total_length < LISTING_FIXED_SIZE as usize || cursor + total_length > listing_header.len() {
            return Err(DecafError::Truncated);
        }
        let record = &listing_header[cursor..cursor + total_length];
        let bundle_index = u64::from_le_bytes(record[2..10].try_into().unwrap());
        let bundle_offset = u64::from_le_bytes(record[10..18].try_into().unwrap());
        let content_size = u64::from_le_bytes(record[18..26].try_into().unwrap());
        let checksum = u64::from_le_bytes(record[26..34].try_into().unwrap());
        let mode = Mode::from_byte(record[34])?;
        let path_bytes = &record[35..];
        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| DecafError::InvalidPath { path: String::from_utf8_lossy(path_bytes).into_owned() })?
            .to_string();

        listings.push(ParsedListing { path, mode, bundle_index, bundle_offset, content_size, checksum });
        cursor += total_length;
    }
    Ok(listings)
}

/// Parses, verifies, and materializes an archive via `sink`. Every fatal
/// condition in §7 is surfaced as the matching `DecafError` variant; no
/// partial state is reported back to the caller beyond what the sink
/// itself already wrote.
pub fn read_archive(bytes: &[u8], sink: &mut dyn TreeSink) -> Result<(), DecafError> {
    if (bytes.len() as u64) < PREFIX_SIZE + META_HEADER_SIZE {
        return Err(DecafError::Truncated);
    }

    let magic = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    if magic != MAGIC {
        return Err(DecafError::BadMagic);
    }

    let archive_checksum = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    let rest = &bytes[16..];
    if xxh3_64(rest) != archive_checksum {
        return Err(DecafError::BadArchiveChecksum);
    }

    let listing_header_size = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
    let listing_count = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
    let bundle_count = u64::from_le_bytes(bytes[32..40].try_into().unwrap());

    let len = bytes.len() as u64;
    let listing_header_start = PREFIX_SIZE + META_HEADER_SIZE;
    let bundle_header_start = listing_header_start.checked_add(listing_header_size).ok_or(DecafError::Truncated)?;
    let bundle_header_size = BUNDLE_RECORD_SIZE.checked_mul(bundle_count).ok_or(DecafError::Truncated)?;
    let data_section_start = bundle_header_start.checked_add(bundle_header_size).ok_or(DecafError::Truncated)?;
    if bundle_header_start > len || data_section_start > len {
        return Err(DecafError::Truncated);
    }

    let listing_header = &bytes[listing_header_start as usize..bundle_header_start as usize];
    let listings = decode_listings(listing_header, listing_count)?;
    debug!(listing_count, bundle_count, "parsed headers");

    // Listings are parsed before bundles are decompressed so each
    // decompress call can be bounded by the total content size assigned to
    // that bundle, rather than trusting an unbounded zstd frame.
    let mut expected_uncompressed = vec![0u64; bundle_count as usize];
    for listing in &listings {
        if listing.bundle_index >= bundle_count {
            return Err(DecafError::Truncated);
        }
        let end = listing
            .bundle_offset
            .checked_add(listing.content_size)
            .ok_or(DecafError::Truncated)?;
        let slot = &mut expected_uncompressed[listing.bundle_index as usize];
        *slot = (*slot).max(end);
    }

    let bundle_header = &bytes[bundle_header_start as usize..data_section_start as usize];
    let mut bundle_specs = Vec::with_capacity(bundle_count as usize);
    for i in 0..bundle_count as usize {
        bundle_specs.push(decode_bundle_record(&bundle_header[i * 24..i * 24 + 24]));
    }

    let data_section = &bytes[data_section_start as usize..];
    let data_len = data_section.len() as u64;

    let decompressed: Vec<Vec<u8>> = bundle_specs
        .par_iter()
        .zip(expected_uncompressed.par_iter())
        .enumerate()
        .map(|(index, (spec, &expected))| -> Result<Vec<u8>, DecafError> {
            let end = spec
                .offset_in_data_section
                .checked_add(spec.compressed_size)
                .ok_or(DecafError::Truncated)?;
            if end > data_len {
                return Err(DecafError::Truncated);
            }
            let slice = &data_section[spec.offset_in_data_section as usize..end as usize];
            let decompressed = codec::decompress(slice, expected as usize)?;
            if xxh3_64(&decompressed) != spec.uncompressed_checksum {
                return Err(DecafError::BadBundleChecksum { index: index as u64 });
            }
            Ok(decompressed)
        })
        .collect::<Result<_, _>>()?;
    trace!(bundles_decompressed = decompressed.len(), "verified bundle checksums");

    for listing in &listings {
        if !matches!(listing.mode, Mode::Normal | Mode::Executable) {
            continue;
        }
        let bundle = &decompressed[listing.bundle_index as usize];
        let start = listing.bundle_offset as usize;
        let end = start + listing.content_size as usize;
        if end > bundle.len() {
            return Err(DecafError::Truncated);
        }
        let content = &bundle[start..end];
        if xxh3_64(content) != listing.checksum {
            return Err(DecafError::BadContentChecksum { path: listing.path.clone() });
        }
    }

    for listing in &listings {
        sink.make_dirs_for(&listing.path)?;
        match listing.mode {
            Mode::BareDirectory => sink.create_bare_dir(&listing.path)?,
            Mode::Link => {
                let bundle = &decompressed[listing.bundle_index as usize];
                let start = listing.bundle_offset as usize;
                let end = start + listing.content_size as usize;
                if end > bundle.len() {
                    return Err(DecafError::Truncated);
                }
                let target = std::str::from_utf8(&bundle[start..end])
                    .map_err(|_| DecafError::InvalidPath { path: listing.path.clone() })?;
                sink.create_symlink(target, &listing.path)?;
            }
            Mode::Normal | Mode::Executable => {
                let bundle = &decompressed[listing.bundle_index as usize];
                let start = listing.bundle_offset as usize;
                let end = start + listing.content_size as usize;
                let mode_bits = if listing.mode == Mode::Executable { 0o755 } else { 0o644 };
                sink.create_file(&listing.path, mode_bits, &bundle[start..end])?;
            }
        }
    }

    Ok(())
}
