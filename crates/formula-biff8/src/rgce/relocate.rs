//! Final pass: resolve logical jump targets into byte distances.

use super::emit::{Emitted, JumpKind};
use crate::error::EncodeRgceError;

/// Distance written into a jump field at `field` that targets byte offset `target`.
pub(super) fn jump_distance(kind: JumpKind, field: usize, target: usize) -> i64 {
    let field = field as i64;
    let target = target as i64;
    match kind {
        JumpKind::If | JumpKind::Mem => target - (field + 2),
        JumpKind::Goto => target - (field + 2) - 1,
        JumpKind::Choose => target - field,
    }
}

/// Overwrite every pending jump field with its final distance.
pub(super) fn relocate(out: &mut Emitted<'_>) -> Result<(), EncodeRgceError> {
    for (&field, fixup) in &out.fixups {
        let target = out.offsets[fixup.target];
        let distance = jump_distance(fixup.kind, field, target);
        let value = u16::try_from(distance).map_err(|_| EncodeRgceError::JumpOffsetOverflow {
            index: fixup.source,
            offset: distance,
        })?;
        out.rgce[field..field + 2].copy_from_slice(&value.to_le_bytes());
    }
    log::debug!(
        "relocated {} jump field(s) in {} byte rgce",
        out.fixups.len(),
        out.rgce.len()
    );
    Ok(())
}
