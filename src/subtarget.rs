// Subtarget resolution. A subtarget is the answer to "what exact hardware am
// I compiling this module for": architecture revision, ABI, register widths,
// optional extensions and encoding modes. It is resolved once from the CPU
// name and feature string, then queried all over the backend. Resolution is
// deterministic and never fails; bad input degrades to documented fallbacks
// with a warning. The one mutation point is reset_subtarget, which re-derives
// the per-function encoding modes and leaves every other field untouched.

//! The resolved subtarget and its query surface.

use std::fmt;

use crate::features::{Feature, FeatureSet, Polarity, parse_tokens};
use crate::itinerary::InstrItineraries;
use crate::machine::{
    CodegenOptions, FunctionInfo, ModeRequest, OptLevel, ReducedOverride, RelocModel,
    TargetMachine,
};
use crate::reginfo::RegInfo;
use crate::tables;
use crate::triple::Triple;

/// Architecture revision. The order is the capability order: each revision
/// is a superset of the ones before it, except that V2 does not include the
/// revision-2 extensions of V1r2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArchVersion {
    V1,
    V1r2,
    V2,
    V2r2,
}

impl fmt::Display for ArchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArchVersion::V1 => "v1",
            ArchVersion::V1r2 => "v1r2",
            ArchVersion::V2 => "v2",
            ArchVersion::V2r2 => "v2r2",
        })
    }
}

/// Application binary interface. Exactly one concrete ABI is selected by the
/// end of resolution; `Unknown` exists only as the pre-resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    Unknown,
    O32,
    N32,
    N64,
    Eabi,
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Abi::Unknown => "unknown",
            Abi::O32 => "o32",
            Abi::N32 => "n32",
            Abi::N64 => "n64",
            Abi::Eabi => "eabi",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endianness::Little => "little",
            Endianness::Big => "big",
        })
    }
}

/// Anti-dependency breaking mode for the post-RA scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiDepMode {
    None,
    Critical,
    All,
}

/// Register class the post-RA scheduler treats as the critical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegClassKind {
    Gpr32,
    Gpr64,
}

/// Post-register-allocation scheduling policy for this subtarget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRaSchedPolicy {
    pub enabled: bool,
    pub anti_dep: AntiDepMode,
    pub critical_path: RegClassKind,
}

/// The resolved subtarget state, as plain data.
///
/// Equality compares every field, so resolution determinism and the
/// "reset touches only the mode fields" contract are directly checkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtargetConfig {
    pub arch_version: ArchVersion,
    pub abi: Abi,
    pub endian: Endianness,
    /// 64-bit general-purpose registers.
    pub gp64: bool,
    /// 64-bit floating-point registers.
    pub fp64: bool,
    /// Only single-precision float hardware.
    pub single_float: bool,
    pub has_vfpu: bool,
    pub has_sext_in_reg: bool,
    pub has_cond_mov: bool,
    pub has_swap: bool,
    pub has_bit_count: bool,
    pub has_fp_idx: bool,
    pub has_dsp: bool,
    pub has_dspr2: bool,
    /// Module-default reduced-encoding mode, from the feature string.
    pub reduced_mode_default: bool,
    /// Reduced-encoding mode of the function currently being compiled.
    pub reduced_mode_current: bool,
    pub micro_mode_default: bool,
    pub micro_mode_current: bool,
    /// Module-wide forced answer for reduced-mode queries.
    pub reduced_override: ReducedOverride,
    /// Anchor global data in the small data section.
    pub use_small_section: bool,
    pub linux_like: bool,
    pub sandboxed: bool,
    pub reloc_model: RelocModel,
}

/// Apply the module-wide override to a stored reduced-mode value. Every
/// reduced-mode query funnels through here, so a forced override pins the
/// answer no matter what reset_subtarget writes.
pub(crate) fn resolve_reduced_mode(directive: ReducedOverride, current: bool) -> bool {
    match directive {
        ReducedOverride::NoOverride => current,
        ReducedOverride::ForceOn => true,
        ReducedOverride::ForceOff => false,
    }
}

/// Resolve CPU name and feature string into a config. Pure: same inputs,
/// same output, no state outside the static tables.
fn resolve_config(
    triple: &Triple,
    cpu: &str,
    features: &str,
    little_endian: bool,
    reloc: RelocModel,
    options: &CodegenOptions,
) -> (SubtargetConfig, &'static tables::CpuEntry) {
    let entry = if cpu.is_empty() {
        tables::default_cpu()
    } else {
        match tables::find_cpu(cpu) {
            Some(entry) => entry,
            None => {
                log::warn!(
                    "unrecognized cpu '{cpu}', falling back to '{}'",
                    tables::DEFAULT_CPU
                );
                tables::default_cpu()
            }
        }
    };

    let mut set = FeatureSet::from_baseline(entry.baseline);
    for (polarity, name) in parse_tokens(features) {
        match tables::find_feature(name) {
            Some(desc) => match polarity {
                Polarity::Enable => set.enable(desc),
                Polarity::Disable => set.disable(desc),
            },
            None => log::warn!("ignoring unrecognized feature token '{name}'"),
        }
    }

    let mut bits = set.bits();
    let token_bits = set.token_bits();

    // An explicit ABI selection outranks the register-width default.
    let abi = match set.explicit_abi() {
        Some(abi) => abi,
        None if bits.contains(Feature::Gp64) => Abi::N64,
        None => Abi::O32,
    };
    if matches!(abi, Abi::O32 | Abi::Eabi)
        && bits.contains(Feature::Gp64)
        && token_bits & Feature::Gp64.mask() == 0
    {
        // Baseline-only 64-bit registers yield to an explicitly requested
        // 32-bit ABI. A gp64 asserted by its own token stays.
        bits.remove(Feature::Gp64);
    }
    if matches!(abi, Abi::N32 | Abi::N64) && !bits.contains(Feature::Gp64) {
        log::warn!("abi '{abi}' requires 64-bit general registers, re-enabling gp64");
        bits.insert(Feature::Gp64);
    }

    // Architecture revision is the highest surviving version bit.
    let arch_version = if bits.contains(Feature::V2r2) {
        ArchVersion::V2r2
    } else if bits.contains(Feature::V2) {
        ArchVersion::V2
    } else if bits.contains(Feature::V1r2) {
        ArchVersion::V1r2
    } else {
        ArchVersion::V1
    };

    let endian = if little_endian {
        Endianness::Little
    } else {
        Endianness::Big
    };
    let linux_like = triple.is_os_linux();
    let sandboxed = triple.is_os_sandbox();
    // Small-section addressing needs absolute anchors, so it is limited to
    // statically relocated non-Linux targets.
    let use_small_section = !linux_like && reloc == RelocModel::Static;

    let reduced = bits.contains(Feature::ReducedMode);
    let micro = bits.contains(Feature::MicroMode);

    let config = SubtargetConfig {
        arch_version,
        abi,
        endian,
        gp64: bits.contains(Feature::Gp64),
        fp64: bits.contains(Feature::Fp64),
        single_float: bits.contains(Feature::SingleFloat),
        has_vfpu: bits.contains(Feature::Vfpu),
        has_sext_in_reg: bits.contains(Feature::SextInReg),
        has_cond_mov: bits.contains(Feature::CondMov),
        has_swap: bits.contains(Feature::Swap),
        has_bit_count: bits.contains(Feature::BitCount),
        has_fp_idx: bits.contains(Feature::FpIdx),
        has_dsp: bits.contains(Feature::Dsp),
        has_dspr2: bits.contains(Feature::DspR2),
        reduced_mode_default: reduced,
        reduced_mode_current: reduced,
        micro_mode_default: micro,
        micro_mode_current: micro,
        reduced_override: options.reduced_override,
        use_small_section,
        linux_like,
        sandboxed,
        reloc_model: reloc,
    };
    (config, entry)
}

fn assert_consistent(config: &SubtargetConfig) {
    assert!(
        config.abi != Abi::Unknown,
        "subtarget resolution left the ABI unset"
    );
    if matches!(config.abi, Abi::N32 | Abi::N64) {
        assert!(
            config.gp64,
            "abi '{}' selected without 64-bit general registers",
            config.abi
        );
    }
}

/// A resolved subtarget, borrowing the machine that configured it.
///
/// Policy that is shared module-wide (size optimization, mixed-mode
/// permission) is read through the machine borrow rather than copied, so a
/// subtarget always answers with the machine's current policy.
pub struct Subtarget<'tm> {
    triple: Triple,
    cpu: &'static str,
    config: SubtargetConfig,
    reginfo: RegInfo,
    itineraries: InstrItineraries,
    /// Resolved reduced mode as of the last construction or reset. The
    /// changed flag returned by reset_subtarget is computed against this.
    prev_reduced_mode: bool,
    machine: &'tm TargetMachine,
}

impl<'tm> Subtarget<'tm> {
    /// Resolve a subtarget from configuration strings.
    ///
    /// Never fails: unknown CPU names and feature tokens degrade to the
    /// documented fallbacks with a warning.
    pub fn new(
        triple: &str,
        cpu: &str,
        features: &str,
        little_endian: bool,
        reloc: RelocModel,
        machine: &'tm TargetMachine,
    ) -> Subtarget<'tm> {
        let triple = Triple::parse(triple);
        let (config, entry) =
            resolve_config(&triple, cpu, features, little_endian, reloc, machine.options());
        assert_consistent(&config);

        let reginfo = RegInfo::from_config(&config);
        let itineraries = InstrItineraries::new(entry.itinerary);
        let prev_reduced_mode =
            resolve_reduced_mode(config.reduced_override, config.reduced_mode_current);

        log::debug!(
            "resolved subtarget: cpu={} arch={} abi={} endian={} gp64={} fp64={} reduced={} micro={}",
            entry.name,
            config.arch_version,
            config.abi,
            config.endian,
            config.gp64,
            config.fp64,
            config.reduced_mode_current,
            config.micro_mode_current,
        );

        Subtarget {
            triple,
            cpu: entry.name,
            config,
            reginfo,
            itineraries,
            prev_reduced_mode,
            machine,
        }
    }

    /// The resolved CPU name, after any fallback.
    pub fn cpu(&self) -> &str {
        self.cpu
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn config(&self) -> &SubtargetConfig {
        &self.config
    }

    pub fn reg_info(&self) -> &RegInfo {
        &self.reginfo
    }

    pub fn instr_itineraries(&self) -> InstrItineraries {
        self.itineraries
    }

    // Architecture revision queries. Every family member is at least V1.

    pub fn arch_version(&self) -> ArchVersion {
        self.config.arch_version
    }

    pub fn has_v1(&self) -> bool {
        true
    }

    /// True only for the revision-2 ISAs. V2 predates the revision-2
    /// extensions, so it does not qualify.
    pub fn has_v1r2(&self) -> bool {
        matches!(
            self.config.arch_version,
            ArchVersion::V1r2 | ArchVersion::V2r2
        )
    }

    pub fn has_v2(&self) -> bool {
        self.config.arch_version >= ArchVersion::V2
    }

    pub fn has_v2r2(&self) -> bool {
        self.config.arch_version == ArchVersion::V2r2
    }

    // ABI and register-width queries.

    pub fn abi(&self) -> Abi {
        self.config.abi
    }

    pub fn is_abi_o32(&self) -> bool {
        self.config.abi == Abi::O32
    }

    pub fn is_abi_n32(&self) -> bool {
        self.config.abi == Abi::N32
    }

    pub fn is_abi_n64(&self) -> bool {
        self.config.abi == Abi::N64
    }

    pub fn is_abi_eabi(&self) -> bool {
        self.config.abi == Abi::Eabi
    }

    pub fn is_gp64bit(&self) -> bool {
        self.config.gp64
    }

    pub fn is_gp32bit(&self) -> bool {
        !self.config.gp64
    }

    pub fn is_fp64bit(&self) -> bool {
        self.config.fp64
    }

    pub fn is_single_float(&self) -> bool {
        self.config.single_float
    }

    pub fn is_not_single_float(&self) -> bool {
        !self.config.single_float
    }

    // Optional-extension queries.

    pub fn has_vfpu(&self) -> bool {
        self.config.has_vfpu
    }

    pub fn has_sext_in_reg(&self) -> bool {
        self.config.has_sext_in_reg
    }

    pub fn has_cond_mov(&self) -> bool {
        self.config.has_cond_mov
    }

    pub fn has_swap(&self) -> bool {
        self.config.has_swap
    }

    pub fn has_bit_count(&self) -> bool {
        self.config.has_bit_count
    }

    pub fn has_fp_idx(&self) -> bool {
        self.config.has_fp_idx
    }

    pub fn has_dsp(&self) -> bool {
        self.config.has_dsp
    }

    pub fn has_dspr2(&self) -> bool {
        self.config.has_dspr2
    }

    // Environment queries.

    pub fn is_little_endian(&self) -> bool {
        self.config.endian == Endianness::Little
    }

    pub fn is_linux(&self) -> bool {
        self.config.linux_like
    }

    pub fn is_sandboxed(&self) -> bool {
        self.config.sandboxed
    }

    pub fn is_not_sandboxed(&self) -> bool {
        !self.config.sandboxed
    }

    pub fn use_small_section(&self) -> bool {
        self.config.use_small_section
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.config.reloc_model
    }

    // Encoding-mode queries. The override directive is applied at query
    // time, never baked into the stored fields.

    pub fn in_reduced_mode(&self) -> bool {
        resolve_reduced_mode(self.config.reduced_override, self.config.reduced_mode_current)
    }

    /// The module-default reduced mode, before any per-function reset.
    pub fn reduced_mode_default(&self) -> bool {
        self.config.reduced_mode_default
    }

    pub fn in_micro_mode(&self) -> bool {
        self.config.micro_mode_current
    }

    /// True when the current function uses the full-width encoding.
    pub fn has_standard_encoding(&self) -> bool {
        !self.in_reduced_mode()
    }

    /// Whether reduced and standard functions may coexist in this module.
    /// Size optimization implies permission, since it flips individual
    /// functions on its own.
    pub fn allows_mixed_modes(&self) -> bool {
        let options = self.machine.options();
        options.allow_mixed_modes || options.space_optimized
    }

    /// Module-wide optimize-for-size policy, read through the machine.
    pub fn space_optimized(&self) -> bool {
        self.machine.options().space_optimized
    }

    /// Post-RA scheduling is worth the compile time only at the highest
    /// optimization level. The critical path is the widest GPR class.
    pub fn post_ra_scheduling(&self) -> PostRaSchedPolicy {
        PostRaSchedPolicy {
            enabled: self.machine.options().opt_level >= OptLevel::Aggressive,
            anti_dep: AntiDepMode::None,
            critical_path: if self.has_v2() {
                RegClassKind::Gpr64
            } else {
                RegClassKind::Gpr32
            },
        }
    }

    /// Re-derive the per-function encoding modes for `func`.
    ///
    /// Precedence for the reduced mode: an explicit request on the function
    /// wins; otherwise, under size optimization, functions stay out of
    /// reduced mode exactly when they use floating point; otherwise the
    /// module default applies. The micro mode follows the function's request
    /// or falls back to its module default. No other field changes.
    ///
    /// Returns true when the resolved reduced mode differs from the mode in
    /// effect before the call, which is when mode-dependent caches must be
    /// invalidated.
    pub fn reset_subtarget(&mut self, func: &FunctionInfo) -> bool {
        let options = self.machine.options();

        self.config.reduced_mode_current = match func.mode_request() {
            Some(ModeRequest::Reduced) => true,
            Some(ModeRequest::Standard) => false,
            None if options.space_optimized => !func.uses_float(),
            None => self.config.reduced_mode_default,
        };
        self.config.micro_mode_current = func
            .micro_request()
            .unwrap_or(self.config.micro_mode_default);

        let resolved = self.in_reduced_mode();
        let changed = resolved != self.prev_reduced_mode;
        self.prev_reduced_mode = resolved;

        log::debug!(
            "reset subtarget for '{}': reduced={} micro={} changed={}",
            func.name(),
            resolved,
            self.config.micro_mode_current,
            changed,
        );
        changed
    }
}

impl fmt::Debug for Subtarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtarget")
            .field("cpu", &self.cpu)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TargetMachine;

    fn machine(cpu: &str, features: &str) -> TargetMachine {
        TargetMachine::new(
            "varc-unknown-linux-gnu",
            cpu,
            features,
            RelocModel::Static,
            CodegenOptions::default(),
        )
    }

    #[test]
    fn test_override_pins_the_answer() {
        assert!(!resolve_reduced_mode(ReducedOverride::NoOverride, false));
        assert!(resolve_reduced_mode(ReducedOverride::NoOverride, true));
        assert!(resolve_reduced_mode(ReducedOverride::ForceOn, false));
        assert!(resolve_reduced_mode(ReducedOverride::ForceOn, true));
        assert!(!resolve_reduced_mode(ReducedOverride::ForceOff, false));
        assert!(!resolve_reduced_mode(ReducedOverride::ForceOff, true));
    }

    #[test]
    fn test_empty_cpu_takes_family_baseline() {
        let m = machine("", "");
        let st = m.subtarget();
        assert_eq!(st.cpu(), "v1-generic");
        assert_eq!(st.arch_version(), ArchVersion::V1);
        assert_eq!(st.abi(), Abi::O32);
        assert!(st.has_v1());
        assert!(!st.has_v1r2());
        assert!(st.has_cond_mov());
        assert!(st.has_bit_count());
        assert!(!st.has_sext_in_reg());
    }

    #[test]
    fn test_unknown_cpu_falls_back() {
        let m = machine("vx9000", "");
        let st = m.subtarget();
        assert_eq!(st.cpu(), "v1-generic");
        assert_eq!(st.arch_version(), ArchVersion::V1);
    }

    #[test]
    fn test_unknown_token_is_ignored() {
        let m = machine("v1-generic", "+hyperthreading");
        let st = m.subtarget();
        assert_eq!(st.config(), machine("v1-generic", "").subtarget().config());
    }

    #[test]
    fn test_v2_defaults_to_n64() {
        let m = machine("v2-generic", "");
        let st = m.subtarget();
        assert_eq!(st.arch_version(), ArchVersion::V2);
        assert_eq!(st.abi(), Abi::N64);
        assert!(st.is_gp64bit());
        assert!(st.is_fp64bit());
        assert!(st.has_v2());
        assert!(!st.has_v2r2());
        // V2 predates the revision-2 extensions.
        assert!(!st.has_v1r2());
    }

    #[test]
    fn test_explicit_o32_narrows_baseline_registers() {
        let m = machine("v2-generic", "+o32");
        let st = m.subtarget();
        assert_eq!(st.abi(), Abi::O32);
        assert!(!st.is_gp64bit());
        // Only the register width yields; the FPU width stays.
        assert!(st.is_fp64bit());
        assert_eq!(st.arch_version(), ArchVersion::V2);
    }

    #[test]
    fn test_token_asserted_gp64_survives_o32() {
        let m = machine("v1-generic", "+gp64,+o32");
        let st = m.subtarget();
        assert_eq!(st.abi(), Abi::O32);
        assert!(st.is_gp64bit());
    }

    #[test]
    fn test_wide_abi_reasserts_required_registers() {
        let m = machine("v1-generic", "+n32,-gp64");
        let st = m.subtarget();
        assert_eq!(st.abi(), Abi::N32);
        assert!(st.is_gp64bit());
    }

    #[test]
    fn test_micro_default_comes_from_cpu() {
        let m = machine("vx100c", "");
        let st = m.subtarget();
        assert!(st.in_micro_mode());
        assert!(!st.in_reduced_mode());
        assert!(st.has_standard_encoding());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let m = machine("vx500", "+single-float,-dspr2");
        let first = m.subtarget().config().clone();
        let second = m.subtarget().config().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_space_optimized_policy() {
        let options = CodegenOptions {
            space_optimized: true,
            ..Default::default()
        };
        let m = TargetMachine::new(
            "varc-unknown-linux-gnu",
            "v1-generic",
            "",
            RelocModel::Static,
            options,
        );
        let mut st = m.subtarget();
        assert!(!st.in_reduced_mode());

        let lean = FunctionInfo::new("lean");
        assert!(st.reset_subtarget(&lean));
        assert!(st.in_reduced_mode());

        let fp_heavy = FunctionInfo::new("fp_heavy").with_uses_float(true);
        assert!(st.reset_subtarget(&fp_heavy));
        assert!(!st.in_reduced_mode());
        assert!(st.allows_mixed_modes());
    }

    #[test]
    fn test_reset_leaves_everything_else_alone() {
        let m = machine("vx500", "");
        let mut st = m.subtarget();
        let before = st.config().clone();

        st.reset_subtarget(&FunctionInfo::new("f").with_mode_request(ModeRequest::Reduced));

        let mut after = st.config().clone();
        after.reduced_mode_current = before.reduced_mode_current;
        after.micro_mode_current = before.micro_mode_current;
        assert_eq!(before, after);
    }

    #[test]
    fn test_post_ra_policy() {
        let m = machine("v2r2-generic", "");
        let st = m.subtarget();
        let policy = st.post_ra_scheduling();
        assert!(!policy.enabled, "default opt level keeps post-RA off");
        assert_eq!(policy.anti_dep, AntiDepMode::None);
        assert_eq!(policy.critical_path, RegClassKind::Gpr64);

        let options = CodegenOptions {
            opt_level: OptLevel::Aggressive,
            ..Default::default()
        };
        let m = TargetMachine::new(
            "varc-unknown-linux-gnu",
            "v1-generic",
            "",
            RelocModel::Static,
            options,
        );
        let policy = m.subtarget().post_ra_scheduling();
        assert!(policy.enabled);
        assert_eq!(policy.critical_path, RegClassKind::Gpr32);
    }
}
