//! Random color sequence the group has to reproduce.

use rand::Rng;

use crate::state::game::Color;

/// Produce `length` independent uniform draws from the color alphabet.
///
/// Repeats and adjacent duplicates are allowed.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Vec<Color> {
    (0..length).map(|_| Color::random(rng)).collect()
}

/// Copy `sequence` and append exactly one more uniform draw.
pub fn extend<R: Rng + ?Sized>(rng: &mut R, sequence: &[Color]) -> Vec<Color> {
    let mut next = Vec::with_capacity(sequence.len() + 1);
    next.extend_from_slice(sequence);
    next.push(Color::random(rng));
    next
}
