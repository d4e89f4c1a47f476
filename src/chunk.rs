// ABOUTME: Fixed-size chunking of ordered sequences
// ABOUTME: Used to cut rows into INSERT batches and statements into files

/// Split `items` into consecutive slices of `size` elements
///
/// Every slice holds exactly `size` items except possibly the last, which
/// holds the remainder. An empty input yields no slices.
///
/// `size` must be positive; callers validate batch sizes before exporting.
///
/// # Examples
///
/// ```
/// # use sqldatadump::chunk::chunk_slices;
/// let chunks = chunk_slices(&[1, 2, 3, 4, 5], 2);
/// assert_eq!(chunks, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
/// ```
pub fn chunk_slices<T>(items: &[T], size: usize) -> Vec<&[T]> {
    debug_assert!(size > 0, "chunk size must be positive");
    items.chunks(size.max(1)).collect()
}

/// Owned variant of [`chunk_slices`]
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    chunk_slices(items, size)
        .into_iter()
        .map(<[T]>::to_vec)
        .collect()
}
