use rand::Rng;

/// Picks an integer in `0..range`, never returning `excluded`.
///
/// Returns [`None`] if there is nothing to pick from.
pub fn random_excluding<R: Rng + ?Sized>(rng: &mut R, range: usize, excluded: usize) -> Option<usize> {
    let skips = excluded < range;
    let size = if skips { range - 1 } else { range };
    if size == 0 {
        return None;
    }

    let n = rng.gen_range(0..size);
    Some(if skips && n >= excluded { n + 1 } else { n })
}
