//! Small in-place helpers used between filtering stages.

use crate::error::{KernelError, Result};

/// Square every element in place.
pub fn square_in_place(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v *= *v;
    }
}

/// Overwrite `dest[offset..offset + src.len()]` with `src`.
///
/// Fails without touching `dest` when the range does not fit.
pub fn write_at(dest: &mut [f64], src: &[f64], offset: usize) -> Result<()> {
    let dest_len = dest.len();
    let out_of_bounds = || KernelError::WriteOutOfBounds {
        offset,
        len: src.len(),
        dest_len,
    };
    let end = offset.checked_add(src.len()).ok_or_else(out_of_bounds)?;
    if end > dest_len {
        return Err(out_of_bounds());
    }
    dest[offset..end].copy_from_slice(src);
    Ok(())
}

/// Minimum and maximum of a non-empty slice, in one pass.
///
/// The first element seeds both bounds; NaNs after it never compare and are
/// skipped.
pub fn range(values: &[f64]) -> Result<(f64, f64)> {
    let (&first, rest) = values.split_first().ok_or(KernelError::EmptyRange)?;
    let mut min = first;
    let mut max = first;
    for &v in rest {
        if v < min {
            min = v;
        } else if v > max {
            max = v;
        }
    }
    Ok((min, max))
}
