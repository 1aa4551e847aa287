use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid length: {count} registers do not divide into {width}-byte values")]
    InvalidLength { count: usize, width: u8 },

    #[error("Unsupported width: {0}, expected 1, 2, 4 or 8")]
    UnsupportedWidth(u8),
}

/// How four registers fold into one 64-bit value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuadAssembly {
    /// `(r0 << 48) | (r1 << 32) | (r0 << 16) | r3` — the first word is
    /// repeated where the third belongs. Almost certainly a defect in the
    /// decoder being mirrored, but deployed devices encode against it, so
    /// it stays the default. Pick [`QuadAssembly::AllWords`] for the layout
    /// that uses all four words.
    FirstWordReuse,

    /// `(r0 << 48) | (r1 << 32) | (r2 << 16) | r3`, all four words in order.
    AllWords,
}

/// Reassembles big-endian register words into values of `width` bytes.
///
/// Each output element is the assembled bit pattern zero-extended to u64;
/// reinterpret as needed (`f32::from_bits(v as u32)` for floats). The first
/// register of a group supplies the high-order bits ("big-register" order).
/// 64-bit values use [`QuadAssembly::FirstWordReuse`]; see
/// [`convert_registers_with`] to choose.
pub fn convert_registers(regs: &[u16], width: u8) -> Result<Vec<u64>, CodecError> {
    convert_registers_with(regs, width, QuadAssembly::FirstWordReuse)
}

pub fn convert_registers_with(
    regs: &[u16],
    width: u8,
    quad: QuadAssembly,
) -> Result<Vec<u64>, CodecError> {
    match width {
        1 => Ok(split_bytes(regs)),
        2 => Ok(regs.iter().map(|&r| r as u64).collect()),
        4 => {
            if regs.len() % 2 != 0 {
                return Err(CodecError::InvalidLength { count: regs.len(), width });
            }
            Ok(regs
                .chunks_exact(2)
                .map(|pair| ((pair[0] as u64) << 16) | pair[1] as u64)
                .collect())
        }
        8 => {
            if regs.len() % 4 != 0 {
                return Err(CodecError::InvalidLength { count: regs.len(), width });
            }
            Ok(regs.chunks_exact(4).map(|q| assemble_quad(q, quad)).collect())
        }
        _ => Err(CodecError::UnsupportedWidth(width)),
    }
}

// High byte first, the only place byte order inside a register is exposed.
fn split_bytes(regs: &[u16]) -> Vec<u64> {
    let mut out = Vec::with_capacity(regs.len() * 2);
    for &r in regs {
        out.push((r >> 8) as u64);
        out.push((r & 0xFF) as u64);
    }
    out
}

fn assemble_quad(q: &[u16], quad: QuadAssembly) -> u64 {
    let third = match quad {
        QuadAssembly::FirstWordReuse => q[0],
        QuadAssembly::AllWords => q[2],
    };
    ((q[0] as u64) << 48) | ((q[1] as u64) << 32) | ((third as u64) << 16) | q[3] as u64
}

/// Pairs of registers as unsigned 32-bit values, high word first.
pub fn registers_to_u32(regs: &[u16]) -> Result<Vec<u32>, CodecError> {
    Ok(convert_registers(regs, 4)?.into_iter().map(|v| v as u32).collect())
}

/// Pairs of registers as IEEE 754 single-precision floats, high word first.
pub fn registers_to_f32(regs: &[u16]) -> Result<Vec<f32>, CodecError> {
    Ok(convert_registers(regs, 4)?
        .into_iter()
        .map(|v| f32::from_bits(v as u32))
        .collect())
}
