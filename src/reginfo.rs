//! Register-file information derived from a resolved subtarget.
//!
//! Register allocation does not consult feature bits directly; it reads the
//! masks computed here once at subtarget construction. Bit i of a mask marks
//! register i of that bank as allocatable.

use crate::subtarget::SubtargetConfig;

const ALL_REGS: u32 = 0xffff_ffff;
/// Even-numbered registers only. With 32-bit float registers, doubles live
/// in even/odd pairs and the allocator must not hand out odd halves.
const EVEN_REGS: u32 = 0x5555_5555;
/// Accumulator bank: four DSP accumulators, or just the plain hi/lo pair.
const DSP_ACCUMULATORS: u32 = 0xf;
const HILO_ONLY: u32 = 0x1;

/// Offset of the global-data anchor register from the start of the small
/// data section.
const SMALL_SECTION_GP_OFFSET: i64 = 0x7ff0;

/// Allocatable-register masks and the global-data anchor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegInfo {
    /// General-purpose bank. All 32 registers exist on every family member.
    pub gpr_mask: u32,
    /// Coprocessor banks 0 through 3: system control, float, vector, and
    /// the accumulator bank.
    pub cpr_mask: [u32; 4],
    /// Anchor value for small-section addressing, zero when unused.
    pub gp_value: i64,
}

impl RegInfo {
    pub(crate) fn from_config(config: &SubtargetConfig) -> RegInfo {
        let float_mask = if config.single_float || config.fp64 {
            // Either every register is a self-contained single, or the
            // registers are 64 bits wide; both make all 32 allocatable.
            ALL_REGS
        } else {
            EVEN_REGS
        };
        let vector_mask = if config.has_vfpu { ALL_REGS } else { 0 };
        let accum_mask = if config.has_dsp {
            DSP_ACCUMULATORS
        } else {
            HILO_ONLY
        };
        let gp_value = if config.use_small_section {
            SMALL_SECTION_GP_OFFSET
        } else {
            0
        };

        RegInfo {
            gpr_mask: ALL_REGS,
            cpr_mask: [0, float_mask, vector_mask, accum_mask],
            gp_value,
        }
    }

    /// True when the float bank is restricted to even register numbers.
    pub fn fpr_even_only(&self) -> bool {
        self.cpr_mask[1] == EVEN_REGS
    }
}
