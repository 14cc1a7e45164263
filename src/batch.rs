/// Regroup `iter` into chunks of `size`, pulling lazily. The last chunk may be
/// short; an empty chunk is never produced.
pub fn batched<I: Iterator>(mut iter: I, size: usize) -> impl Iterator<Item = Vec<I::Item>> {
    std::iter::from_fn(move || {
        let batch: Vec<I::Item> = iter.by_ref().take(size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    })
}
