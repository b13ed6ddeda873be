// Feature-string handling. A subtarget is configured from a CPU name plus a
// comma-separated list of feature tokens, each optionally prefixed with '+'
// (enable) or '-' (disable). Tokens apply left to right on top of the CPU
// baseline. Enabling a feature pulls in everything it implies; disabling one
// also disables every still-enabled feature that implies it, so the set can
// never claim an extension whose prerequisites are gone.

//! Feature tokens and the bit-level resolution engine.

use crate::subtarget::Abi;
use crate::tables;

/// One hardware capability tracked by the subtarget. Each feature owns a bit
/// in [`FeatureBits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Feature {
    /// Baseline 32-bit ISA.
    V1 = 0,
    /// Revision 2 of the 32-bit ISA.
    V1r2,
    /// 64-bit ISA.
    V2,
    /// Revision 2 of the 64-bit ISA.
    V2r2,
    /// 64-bit general-purpose registers.
    Gp64,
    /// 64-bit floating-point registers.
    Fp64,
    /// Only single-precision float hardware is present.
    SingleFloat,
    /// Vector floating-point unit.
    Vfpu,
    /// Sign-extend-in-register instructions.
    SextInReg,
    /// Conditional-move instructions.
    CondMov,
    /// Byte-swap instructions.
    Swap,
    /// Bit-count instructions.
    BitCount,
    /// Indexed floating-point loads and stores.
    FpIdx,
    /// DSP extension, revision 1.
    Dsp,
    /// DSP extension, revision 2.
    DspR2,
    /// Compressed (reduced) instruction encoding.
    ReducedMode,
    /// Alternative compressed encoding.
    MicroMode,
}

impl Feature {
    pub const COUNT: usize = 17;

    /// The bit this feature occupies in a [`FeatureBits`] word.
    pub const fn mask(self) -> u64 {
        1u64 << self as u8
    }
}

/// Fixed-size bitset over [`Feature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureBits(u64);

impl FeatureBits {
    pub const fn empty() -> FeatureBits {
        FeatureBits(0)
    }

    pub const fn from_mask(mask: u64) -> FeatureBits {
        FeatureBits(mask)
    }

    pub const fn mask(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, feature: Feature) -> bool {
        self.0 & feature.mask() != 0
    }

    /// True if any bit of `mask` is set.
    pub const fn intersects(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0 |= feature.mask();
    }

    pub fn remove(&mut self, feature: Feature) {
        self.0 &= !feature.mask();
    }

    pub fn insert_mask(&mut self, mask: u64) {
        self.0 |= mask;
    }

    pub fn remove_mask(&mut self, mask: u64) {
        self.0 &= !mask;
    }
}

/// Direction of a feature token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Enable,
    Disable,
}

/// Split a feature string into `(polarity, name)` tokens.
///
/// Tokens are comma-separated; surrounding whitespace is trimmed and empty
/// tokens are skipped, so `""`, `","` and `" +v2 , gp64 "` all parse the way
/// one would expect. A token without a prefix enables its feature.
pub fn parse_tokens(features: &str) -> impl Iterator<Item = (Polarity, &str)> {
    features
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if let Some(name) = token.strip_prefix('+') {
                (Polarity::Enable, name)
            } else if let Some(name) = token.strip_prefix('-') {
                (Polarity::Disable, name)
            } else {
                (Polarity::Enable, token)
            }
        })
}

/// What a recognized feature token does to the working set.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FeatureEffect {
    /// Sets or clears a capability bit.
    Toggle(Feature),
    /// Selects an ABI. ABIs occupy a single slot rather than bits; the last
    /// selection in the string wins.
    SelectAbi(Abi),
}

/// Table entry describing one feature token.
#[derive(Debug)]
pub(crate) struct FeatureDesc {
    pub name: &'static str,
    pub effect: FeatureEffect,
    /// Transitive closure of the capability bits this token switches on in
    /// addition to its own.
    pub implies: u64,
}

/// Working state while a feature string is applied.
pub(crate) struct FeatureSet {
    bits: FeatureBits,
    /// Bits asserted by an explicit token, as opposed to inherited from the
    /// CPU baseline. ABI defaulting consults this to tell the two apart.
    token_bits: u64,
    explicit_abi: Option<Abi>,
}

impl FeatureSet {
    pub(crate) fn from_baseline(mask: u64) -> FeatureSet {
        FeatureSet {
            bits: FeatureBits::from_mask(mask),
            token_bits: 0,
            explicit_abi: None,
        }
    }

    pub(crate) fn bits(&self) -> FeatureBits {
        self.bits
    }

    pub(crate) fn token_bits(&self) -> u64 {
        self.token_bits
    }

    pub(crate) fn explicit_abi(&self) -> Option<Abi> {
        self.explicit_abi
    }

    /// Apply an enable token: set the feature's bit and the closure of bits
    /// it implies. An ABI token overwrites the ABI slot instead.
    pub(crate) fn enable(&mut self, desc: &FeatureDesc) {
        match desc.effect {
            FeatureEffect::Toggle(feature) => {
                let mask = feature.mask() | desc.implies;
                self.bits.insert_mask(mask);
                self.token_bits |= mask;
            }
            FeatureEffect::SelectAbi(abi) => {
                self.explicit_abi = Some(abi);
                self.bits.insert_mask(desc.implies);
                self.token_bits |= desc.implies;
            }
        }
    }

    /// Apply a disable token: clear the feature's bit, then keep clearing
    /// still-enabled features that imply a cleared bit until nothing changes.
    /// Disabling an ABI token clears the slot only if that ABI is the one
    /// currently selected.
    pub(crate) fn disable(&mut self, desc: &FeatureDesc) {
        match desc.effect {
            FeatureEffect::Toggle(feature) => {
                let mut cleared = feature.mask();
                self.bits.remove_mask(cleared);
                loop {
                    let mut dependents = 0u64;
                    for other in tables::FEATURES {
                        if let FeatureEffect::Toggle(bit) = other.effect {
                            if self.bits.contains(bit) && other.implies & cleared != 0 {
                                dependents |= bit.mask();
                            }
                        }
                    }
                    if dependents == 0 {
                        break;
                    }
                    self.bits.remove_mask(dependents);
                    cleared |= dependents;
                }
                self.token_bits &= !cleared;
            }
            FeatureEffect::SelectAbi(abi) => {
                if self.explicit_abi == Some(abi) {
                    self.explicit_abi = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(features: &str) -> Vec<(Polarity, &str)> {
        parse_tokens(features).collect()
    }

    #[test]
    fn test_token_grammar() {
        assert_eq!(collect(""), vec![]);
        assert_eq!(collect(","), vec![]);
        assert_eq!(collect("+v2"), vec![(Polarity::Enable, "v2")]);
        assert_eq!(collect("-dsp"), vec![(Polarity::Disable, "dsp")]);
        assert_eq!(collect("gp64"), vec![(Polarity::Enable, "gp64")]);
        assert_eq!(
            collect(" +v2 , -dsp ,, reduced "),
            vec![
                (Polarity::Enable, "v2"),
                (Polarity::Disable, "dsp"),
                (Polarity::Enable, "reduced"),
            ]
        );
    }

    #[test]
    fn test_bitset_basics() {
        let mut bits = FeatureBits::empty();
        assert!(bits.is_empty());
        bits.insert(Feature::Dsp);
        assert!(bits.contains(Feature::Dsp));
        assert!(!bits.contains(Feature::DspR2));
        assert!(bits.intersects(Feature::Dsp.mask() | Feature::Vfpu.mask()));
        bits.remove(Feature::Dsp);
        assert!(bits.is_empty());
    }

    #[test]
    fn test_enable_pulls_in_implications() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("v2r2").unwrap());
        let bits = set.bits();
        for feature in [
            Feature::V2r2,
            Feature::V2,
            Feature::V1r2,
            Feature::V1,
            Feature::Gp64,
            Feature::Fp64,
            Feature::CondMov,
            Feature::BitCount,
            Feature::SextInReg,
            Feature::Swap,
            Feature::FpIdx,
        ] {
            assert!(bits.contains(feature), "v2r2 should imply {feature:?}");
        }
        assert!(!bits.contains(Feature::Dsp));
    }

    #[test]
    fn test_disable_clears_dependents() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("dspr2").unwrap());
        assert!(set.bits().contains(Feature::Dsp));
        set.disable(tables::find_feature("dsp").unwrap());
        assert!(!set.bits().contains(Feature::Dsp));
        assert!(!set.bits().contains(Feature::DspR2));
    }

    #[test]
    fn test_disable_base_arch_clears_whole_chain() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("v2r2").unwrap());
        set.disable(tables::find_feature("v1").unwrap());
        let bits = set.bits();
        assert!(!bits.contains(Feature::V1));
        assert!(!bits.contains(Feature::V1r2));
        assert!(!bits.contains(Feature::V2));
        assert!(!bits.contains(Feature::V2r2));
        // Implied leaf capabilities are not dependents; they stay on.
        assert!(bits.contains(Feature::CondMov));
        assert!(bits.contains(Feature::BitCount));
    }

    #[test]
    fn test_enable_then_disable_is_a_no_op_on_that_bit() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("gp64").unwrap());
        set.disable(tables::find_feature("gp64").unwrap());
        assert!(!set.bits().contains(Feature::Gp64));
        assert_eq!(set.token_bits() & Feature::Gp64.mask(), 0);
    }

    #[test]
    fn test_abi_slot_last_selection_wins() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("n64").unwrap());
        set.enable(tables::find_feature("n32").unwrap());
        assert_eq!(set.explicit_abi(), Some(Abi::N32));
        // Both selections implied 64-bit registers along the way.
        assert!(set.bits().contains(Feature::Gp64));
    }

    #[test]
    fn test_abi_disable_only_clears_matching_selection() {
        let mut set = FeatureSet::from_baseline(0);
        set.enable(tables::find_feature("n64").unwrap());
        set.disable(tables::find_feature("o32").unwrap());
        assert_eq!(set.explicit_abi(), Some(Abi::N64));
        set.disable(tables::find_feature("n64").unwrap());
        assert_eq!(set.explicit_abi(), None);
    }
}
