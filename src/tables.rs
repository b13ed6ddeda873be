//! Static subtarget tables: feature tokens, CPU baselines and per-CPU
//! itineraries.
//!
//! Both lookup tables are binary-searched, so entries must stay sorted by
//! name. The `implies` masks are transitive closures; a token's mask already
//! contains everything its implications imply.

use crate::features::{Feature, FeatureDesc, FeatureEffect};
use crate::itinerary::{FuncUnit, InstrStage, ItinClass, ItineraryTable};
use crate::subtarget::Abi;

const V1_IMPLIES: u64 = Feature::CondMov.mask() | Feature::BitCount.mask();
const V1R2_IMPLIES: u64 = Feature::V1.mask()
    | V1_IMPLIES
    | Feature::SextInReg.mask()
    | Feature::Swap.mask()
    | Feature::FpIdx.mask();
const V2_IMPLIES: u64 = Feature::V1.mask()
    | V1_IMPLIES
    | Feature::Gp64.mask()
    | Feature::Fp64.mask()
    | Feature::FpIdx.mask();
const V2R2_IMPLIES: u64 = Feature::V2.mask() | V2_IMPLIES | Feature::V1r2.mask() | V1R2_IMPLIES;
const DSPR2_IMPLIES: u64 = Feature::Dsp.mask();
const ABI64_IMPLIES: u64 = Feature::Gp64.mask();

/// Feature token table, sorted by token name.
pub(crate) static FEATURES: &[FeatureDesc] = &[
    FeatureDesc {
        name: "bitcount",
        effect: FeatureEffect::Toggle(Feature::BitCount),
        implies: 0,
    },
    FeatureDesc {
        name: "condmov",
        effect: FeatureEffect::Toggle(Feature::CondMov),
        implies: 0,
    },
    FeatureDesc {
        name: "dsp",
        effect: FeatureEffect::Toggle(Feature::Dsp),
        implies: 0,
    },
    FeatureDesc {
        name: "dspr2",
        effect: FeatureEffect::Toggle(Feature::DspR2),
        implies: DSPR2_IMPLIES,
    },
    FeatureDesc {
        name: "eabi",
        effect: FeatureEffect::SelectAbi(Abi::Eabi),
        implies: 0,
    },
    FeatureDesc {
        name: "fp64",
        effect: FeatureEffect::Toggle(Feature::Fp64),
        implies: 0,
    },
    FeatureDesc {
        name: "fpidx",
        effect: FeatureEffect::Toggle(Feature::FpIdx),
        implies: 0,
    },
    FeatureDesc {
        name: "gp64",
        effect: FeatureEffect::Toggle(Feature::Gp64),
        implies: 0,
    },
    FeatureDesc {
        name: "micro",
        effect: FeatureEffect::Toggle(Feature::MicroMode),
        implies: 0,
    },
    FeatureDesc {
        name: "n32",
        effect: FeatureEffect::SelectAbi(Abi::N32),
        implies: ABI64_IMPLIES,
    },
    FeatureDesc {
        name: "n64",
        effect: FeatureEffect::SelectAbi(Abi::N64),
        implies: ABI64_IMPLIES,
    },
    FeatureDesc {
        name: "o32",
        effect: FeatureEffect::SelectAbi(Abi::O32),
        implies: 0,
    },
    FeatureDesc {
        name: "reduced",
        effect: FeatureEffect::Toggle(Feature::ReducedMode),
        implies: 0,
    },
    FeatureDesc {
        name: "seinreg",
        effect: FeatureEffect::Toggle(Feature::SextInReg),
        implies: 0,
    },
    FeatureDesc {
        name: "single-float",
        effect: FeatureEffect::Toggle(Feature::SingleFloat),
        implies: 0,
    },
    FeatureDesc {
        name: "swap",
        effect: FeatureEffect::Toggle(Feature::Swap),
        implies: 0,
    },
    FeatureDesc {
        name: "v1",
        effect: FeatureEffect::Toggle(Feature::V1),
        implies: V1_IMPLIES,
    },
    FeatureDesc {
        name: "v1r2",
        effect: FeatureEffect::Toggle(Feature::V1r2),
        implies: V1R2_IMPLIES,
    },
    FeatureDesc {
        name: "v2",
        effect: FeatureEffect::Toggle(Feature::V2),
        implies: V2_IMPLIES,
    },
    FeatureDesc {
        name: "v2r2",
        effect: FeatureEffect::Toggle(Feature::V2r2),
        implies: V2R2_IMPLIES,
    },
    FeatureDesc {
        name: "vfpu",
        effect: FeatureEffect::Toggle(Feature::Vfpu),
        implies: 0,
    },
];

/// One processor model: its baseline feature closure and timing data.
#[derive(Debug)]
pub(crate) struct CpuEntry {
    pub name: &'static str,
    pub baseline: u64,
    pub itinerary: &'static ItineraryTable,
}

/// CPU the resolver falls back to for empty or unrecognized CPU names.
pub(crate) const DEFAULT_CPU: &str = "v1-generic";

/// Processor table, sorted by CPU name.
pub(crate) static CPUS: &[CpuEntry] = &[
    CpuEntry {
        name: "v1-generic",
        baseline: Feature::V1.mask() | V1_IMPLIES,
        itinerary: &GENERIC_ITINERARY,
    },
    CpuEntry {
        name: "v1r2-generic",
        baseline: Feature::V1r2.mask() | V1R2_IMPLIES,
        itinerary: &GENERIC_ITINERARY,
    },
    CpuEntry {
        name: "v2-generic",
        baseline: Feature::V2.mask() | V2_IMPLIES,
        itinerary: &GENERIC_ITINERARY,
    },
    CpuEntry {
        name: "v2r2-generic",
        baseline: Feature::V2r2.mask() | V2R2_IMPLIES,
        itinerary: &GENERIC_ITINERARY,
    },
    CpuEntry {
        name: "vx100c",
        baseline: Feature::V1r2.mask() | V1R2_IMPLIES | Feature::MicroMode.mask(),
        itinerary: &VX100C_ITINERARY,
    },
    CpuEntry {
        name: "vx200",
        baseline: Feature::V1r2.mask() | V1R2_IMPLIES | Feature::Dsp.mask(),
        itinerary: &VX200_ITINERARY,
    },
    CpuEntry {
        name: "vx500",
        baseline: Feature::V2r2.mask()
            | V2R2_IMPLIES
            | Feature::Vfpu.mask()
            | Feature::Dsp.mask()
            | Feature::DspR2.mask(),
        itinerary: &VX500_ITINERARY,
    },
];

/// The fallback model. It sorts first, so this is simply the table head.
pub(crate) fn default_cpu() -> &'static CpuEntry {
    &CPUS[0]
}

pub(crate) fn find_feature(name: &str) -> Option<&'static FeatureDesc> {
    FEATURES
        .binary_search_by(|desc| desc.name.cmp(name))
        .ok()
        .map(|idx| &FEATURES[idx])
}

pub(crate) fn find_cpu(name: &str) -> Option<&'static CpuEntry> {
    CPUS.binary_search_by(|entry| entry.name.cmp(name))
        .ok()
        .map(|idx| &CPUS[idx])
}

const fn stage(cycles: u8, units: FuncUnit) -> InstrStage {
    InstrStage { cycles, units }
}

const NO_STAGES: &[InstrStage] = &[];

/// In-order single-issue model shared by the generic CPUs.
pub(crate) static GENERIC_ITINERARY: ItineraryTable = ItineraryTable {
    name: "generic",
    issue_width: 1,
    entries: [
        &[stage(1, FuncUnit::ALU0)],  // Alu
        &[stage(3, FuncUnit::AGU)],   // Load
        &[stage(1, FuncUnit::AGU)],   // Store
        &[stage(1, FuncUnit::ALU0)],  // Branch
        &[stage(17, FuncUnit::MDU)],  // Mul
        &[stage(38, FuncUnit::MDU)],  // Div
        &[stage(4, FuncUnit::FPU)],   // FpAdd
        &[stage(7, FuncUnit::FPU)],   // FpMulS
        &[stage(8, FuncUnit::FPU)],   // FpMulD
        &[stage(23, FuncUnit::FPU)],  // FpDivS
        &[stage(36, FuncUnit::FPU)],  // FpDivD
        &[stage(4, FuncUnit::FPU)],   // FpCvt
        &[stage(2, FuncUnit::FPU)],   // FpMove
        &[stage(3, FuncUnit::AGU)],   // FpLoad
        &[stage(1, FuncUnit::AGU)],   // FpStore
        NO_STAGES,                    // DspAlu
        NO_STAGES,                    // DspMul
        NO_STAGES,                    // Pseudo
    ],
};

/// Area-optimized core with an iterative multiplier.
pub(crate) static VX100C_ITINERARY: ItineraryTable = ItineraryTable {
    name: "vx100c",
    issue_width: 1,
    entries: [
        &[stage(1, FuncUnit::ALU0)],  // Alu
        &[stage(2, FuncUnit::AGU)],   // Load
        &[stage(1, FuncUnit::AGU)],   // Store
        &[stage(1, FuncUnit::ALU0)],  // Branch
        &[stage(32, FuncUnit::MDU)],  // Mul
        &[stage(64, FuncUnit::MDU)],  // Div
        &[stage(4, FuncUnit::FPU)],   // FpAdd
        &[stage(7, FuncUnit::FPU)],   // FpMulS
        &[stage(9, FuncUnit::FPU)],   // FpMulD
        &[stage(23, FuncUnit::FPU)],  // FpDivS
        &[stage(36, FuncUnit::FPU)],  // FpDivD
        &[stage(4, FuncUnit::FPU)],   // FpCvt
        &[stage(2, FuncUnit::FPU)],   // FpMove
        &[stage(2, FuncUnit::AGU)],   // FpLoad
        &[stage(1, FuncUnit::AGU)],   // FpStore
        NO_STAGES,                    // DspAlu
        NO_STAGES,                    // DspMul
        NO_STAGES,                    // Pseudo
    ],
};

/// Single-issue core with a pipelined multiplier and a DSP unit.
pub(crate) static VX200_ITINERARY: ItineraryTable = ItineraryTable {
    name: "vx200",
    issue_width: 1,
    entries: [
        &[stage(1, FuncUnit::ALU0)],                      // Alu
        &[stage(3, FuncUnit::AGU)],                       // Load
        &[stage(1, FuncUnit::AGU)],                       // Store
        &[stage(1, FuncUnit::ALU0)],                      // Branch
        &[stage(5, FuncUnit::MDU)],                       // Mul
        &[stage(25, FuncUnit::MDU)],                      // Div
        &[stage(4, FuncUnit::FPU)],                       // FpAdd
        &[stage(6, FuncUnit::FPU)],                       // FpMulS
        &[stage(7, FuncUnit::FPU)],                       // FpMulD
        &[stage(20, FuncUnit::FPU)],                      // FpDivS
        &[stage(32, FuncUnit::FPU)],                      // FpDivD
        &[stage(4, FuncUnit::FPU)],                       // FpCvt
        &[stage(2, FuncUnit::FPU)],                       // FpMove
        &[stage(3, FuncUnit::AGU)],                       // FpLoad
        &[stage(1, FuncUnit::AGU)],                       // FpStore
        &[stage(1, FuncUnit::DSPU)],                      // DspAlu
        &[stage(4, FuncUnit::DSPU.with(FuncUnit::MDU))],  // DspMul
        NO_STAGES,                                        // Pseudo
    ],
};

/// Dual-issue core; plain ALU operations can go down either pipe.
pub(crate) static VX500_ITINERARY: ItineraryTable = ItineraryTable {
    name: "vx500",
    issue_width: 2,
    entries: [
        &[stage(1, FuncUnit::ALU0.with(FuncUnit::ALU1))],  // Alu
        &[stage(2, FuncUnit::AGU)],                        // Load
        &[stage(1, FuncUnit::AGU)],                        // Store
        &[stage(1, FuncUnit::ALU0)],                       // Branch
        &[stage(4, FuncUnit::MDU)],                        // Mul
        &[stage(17, FuncUnit::MDU)],                       // Div
        &[stage(3, FuncUnit::FPU)],                        // FpAdd
        &[stage(4, FuncUnit::FPU)],                        // FpMulS
        &[stage(5, FuncUnit::FPU)],                        // FpMulD
        &[stage(12, FuncUnit::FPU)],                       // FpDivS
        &[stage(19, FuncUnit::FPU)],                       // FpDivD
        &[stage(3, FuncUnit::FPU)],                        // FpCvt
        &[stage(1, FuncUnit::FPU)],                        // FpMove
        &[stage(2, FuncUnit::AGU)],                        // FpLoad
        &[stage(1, FuncUnit::AGU)],                        // FpStore
        &[stage(1, FuncUnit::DSPU)],                       // DspAlu
        &[stage(2, FuncUnit::DSPU)],                       // DspMul
        NO_STAGES,                                         // Pseudo
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_table_is_sorted() {
        for pair in FEATURES.windows(2) {
            assert!(
                pair[0].name < pair[1].name,
                "feature table out of order at '{}'",
                pair[1].name
            );
        }
    }

    #[test]
    fn test_cpu_table_is_sorted() {
        for pair in CPUS.windows(2) {
            assert!(
                pair[0].name < pair[1].name,
                "cpu table out of order at '{}'",
                pair[1].name
            );
        }
    }

    #[test]
    fn test_lookups() {
        assert!(find_feature("v2r2").is_some());
        assert!(find_feature("single-float").is_some());
        assert!(find_feature("mips16").is_none());
        assert!(find_cpu("vx500").is_some());
        assert!(find_cpu(DEFAULT_CPU).is_some());
        assert!(find_cpu("").is_none());
    }

    #[test]
    fn test_default_cpu_heads_the_table() {
        assert_eq!(default_cpu().name, DEFAULT_CPU);
    }

    #[test]
    fn test_implication_masks_are_transitive() {
        // v2r2 reaches all the way down to the v1 baseline capabilities.
        assert_ne!(V2R2_IMPLIES & Feature::V1.mask(), 0);
        assert_ne!(V2R2_IMPLIES & Feature::CondMov.mask(), 0);
        assert_ne!(V2R2_IMPLIES & Feature::SextInReg.mask(), 0);
        assert_ne!(V2R2_IMPLIES & Feature::Gp64.mask(), 0);
        assert_ne!(DSPR2_IMPLIES & Feature::Dsp.mask(), 0);
    }

    #[test]
    fn test_cpu_baselines_carry_their_arch_bit() {
        let cases = [
            ("v1-generic", Feature::V1),
            ("v1r2-generic", Feature::V1r2),
            ("v2-generic", Feature::V2),
            ("v2r2-generic", Feature::V2r2),
            ("vx100c", Feature::V1r2),
            ("vx200", Feature::V1r2),
            ("vx500", Feature::V2r2),
        ];
        for (name, arch_bit) in cases {
            let entry = find_cpu(name).unwrap();
            assert_ne!(
                entry.baseline & arch_bit.mask(),
                0,
                "{name} baseline is missing its architecture bit"
            );
        }
    }
}
