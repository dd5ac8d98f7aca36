//! Bundle packer (C6): greedy bin-packing of listing content into
//! ~10 MiB uncompressed slabs, in a single pass over canonically ordered
//! listings.

use crate::hash::xxh3_64;
use crate::listing::Listing;

/// Target size, uncompressed, per bundle.
pub const TARGET: u64 = 10 * 1024 * 1024;

/// One packed, not-yet-compressed bundle: its concatenated content in
/// canonical order, plus the checksum over that content.
pub struct PackedBundle {
    pub uncompressed: Vec<u8>,
    pub uncompressed_checksum: u64,
}

/// Assigns `bundle_index`/`bundle_offset` on each listing (mutating them in
/// place, in canonical order) and returns the packed bundles in index order.
/// `listings` must already be in canonical order (§4.5) — the packer does
/// not sort.
pub fn pack(listings: &mut [Listing]) -> Vec<PackedBundle> {
    if listings.is_empty() {
        return Vec::new();
    }

    let mut bundles: Vec<Vec<u8>> = vec![Vec::new()];
    let mut cur_index: u64 = 0;
    let mut cur_size: u64 = 0;

    for listing in listings.iter_mut() {
        if cur_size >= TARGET {
            cur_index += 1;
            cur_size = 0;
            bundles.push(Vec::new());
        }
        listing.bundle_offset = cur_size;
        listing.bundle_index = cur_index;
        cur_size += listing.content_size;
        bundles[cur_index as usize].extend_from_slice(&listing.content);
    }

    bundles
        .into_iter()
        .map(|uncompressed| {
            let uncompressed_checksum = xxh3_64(&uncompressed);
            PackedBundle { uncompressed, uncompressed_checksum }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{ListingBuilder, sort_listings};
    use crate::tree::MemTree;

    #[test]
    fn empty_input_no_bundles() {
        let mut listings: Vec<Listing> = Vec::new();
        assert!(pack(&mut listings).is_empty());
    }

    #[test]
    fn single_large_file_gets_its_own_bundle() {
        let big = vec![7u8; (TARGET as usize) + 1];
        let tree = MemTree::new().with_file("a", &big, false);
        let mut listings = ListingBuilder::build(&tree).unwrap();
        sort_listings(&mut listings);
        let bundles = pack(&mut listings);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].uncompressed.len(), big.len());
        assert_eq!(listings[0].bundle_index, 0);
        assert_eq!(listings[0].bundle_offset, 0);
    }

    #[test]
    fn bundle_boundary_starts_new_bundle_once_full() {
        // Canonical order: b (4 bytes) < a (TARGET bytes) < c (TARGET+1 bytes).
        // Placing "a" tips the running bundle over TARGET, so the next
        // listing ("c") starts a fresh bundle rather than "a" itself.
        let tree = MemTree::new()
            .with_file("b", b"tail", false)
            .with_file("a", &vec![1u8; TARGET as usize], false)
            .with_file("c", &vec![2u8; (TARGET as usize) + 1], false);
        let mut listings = ListingBuilder::build(&tree).unwrap();
        sort_listings(&mut listings);
        let bundles = pack(&mut listings);
        assert_eq!(bundles.len(), 2);
        let a = listings.iter().find(|l| l.path == "a").unwrap();
        let b = listings.iter().find(|l| l.path == "b").unwrap();
        let c = listings.iter().find(|l| l.path == "c").unwrap();
        assert_eq!(b.bundle_index, 0);
        assert_eq!(a.bundle_index, 0);
        assert_eq!(a.bundle_offset, b.content_size);
        assert_eq!(c.bundle_index, 1);
        assert_eq!(c.bundle_offset, 0);
    }

    #[test]
    fn contiguous_offsets_within_a_bundle() {
        let tree = MemTree::new().with_file("a", b"xx", false).with_file("bb", b"yyyy", false);
        let mut listings = ListingBuilder::build(&tree).unwrap();
        sort_listings(&mut listings);
        let bundles = pack(&mut listings);
        assert_eq!(bundles.len(), 1);
        assert_eq!(listings[0].bundle_offset, 0);
        assert_eq!(listings[1].bundle_offset, listings[0].content_size);
    }
}
