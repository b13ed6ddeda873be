// The machine layer owns everything that outlives a single function: the
// parsed triple, the configuration strings, module-wide codegen policy and
// the registry of per-function descriptors. Subtargets borrow the machine
// and read policy through that borrow, so a subtarget can never outlive the
// machine that configured it.

//! Module-level target state and per-function descriptors.

use std::fmt;

use hashbrown::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::subtarget::Subtarget;
use crate::triple::Triple;

/// Relocation model the module is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocModel {
    #[default]
    Static,
    Pic,
    DynamicNoPic,
}

impl fmt::Display for RelocModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelocModel::Static => "static",
            RelocModel::Pic => "pic",
            RelocModel::DynamicNoPic => "dynamic-no-pic",
        })
    }
}

/// Optimization level. Ordered, so policy code can compare levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptLevel {
    None,
    Default,
    Aggressive,
}

impl Default for OptLevel {
    fn default() -> Self {
        OptLevel::Default
    }
}

/// Module-wide override for the reduced-encoding mode. When forced, every
/// mode query answers the forced value regardless of per-function state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReducedOverride {
    #[default]
    NoOverride,
    ForceOn,
    ForceOff,
}

/// Codegen policy shared by every subtarget of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodegenOptions {
    pub opt_level: OptLevel,
    /// Optimize for size: functions without float usage default to the
    /// reduced encoding.
    pub space_optimized: bool,
    /// Permit reduced and standard functions in the same module.
    pub allow_mixed_modes: bool,
    pub reduced_override: ReducedOverride,
}

/// Per-function encoding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Reduced,
    Standard,
}

/// What the front end recorded about one function: its encoding requests
/// and whether it touches floating point.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    name: String,
    mode_request: Option<ModeRequest>,
    micro_request: Option<bool>,
    uses_float: bool,
}

impl FunctionInfo {
    /// A descriptor with no requests; the function takes module defaults.
    pub fn new(name: impl Into<String>) -> FunctionInfo {
        FunctionInfo {
            name: name.into(),
            mode_request: None,
            micro_request: None,
            uses_float: false,
        }
    }

    /// Build a descriptor from textual function attributes.
    ///
    /// Recognized: `reduced`, `no-reduced`, `micro`, `no-micro` and
    /// `uses-float`. Anything else is ignored. Requesting both directions
    /// of the same mode is rejected.
    pub fn from_attrs(name: impl Into<String>, attrs: &[&str]) -> ConfigResult<FunctionInfo> {
        let name = name.into();
        let mut want_reduced = false;
        let mut want_standard = false;
        let mut want_micro = false;
        let mut want_no_micro = false;
        let mut uses_float = false;

        for attr in attrs {
            match *attr {
                "reduced" => want_reduced = true,
                "no-reduced" => want_standard = true,
                "micro" => want_micro = true,
                "no-micro" => want_no_micro = true,
                "uses-float" => uses_float = true,
                other => log::debug!("function '{name}': ignoring attribute '{other}'"),
            }
        }

        if (want_reduced && want_standard) || (want_micro && want_no_micro) {
            return Err(ConfigError::ConflictingModeRequest { function: name });
        }

        let mode_request = if want_reduced {
            Some(ModeRequest::Reduced)
        } else if want_standard {
            Some(ModeRequest::Standard)
        } else {
            None
        };
        let micro_request = if want_micro {
            Some(true)
        } else if want_no_micro {
            Some(false)
        } else {
            None
        };

        Ok(FunctionInfo {
            name,
            mode_request,
            micro_request,
            uses_float,
        })
    }

    pub fn with_mode_request(mut self, request: ModeRequest) -> FunctionInfo {
        self.mode_request = Some(request);
        self
    }

    pub fn with_micro_request(mut self, micro: bool) -> FunctionInfo {
        self.micro_request = Some(micro);
        self
    }

    pub fn with_uses_float(mut self, uses_float: bool) -> FunctionInfo {
        self.uses_float = uses_float;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode_request(&self) -> Option<ModeRequest> {
        self.mode_request
    }

    pub fn micro_request(&self) -> Option<bool> {
        self.micro_request
    }

    pub fn uses_float(&self) -> bool {
        self.uses_float
    }
}

/// Module-level target state: triple, configuration strings, codegen policy
/// and the function registry.
pub struct TargetMachine {
    triple: Triple,
    cpu: String,
    features: String,
    reloc: RelocModel,
    options: CodegenOptions,
    functions: HashMap<String, FunctionInfo>,
}

impl TargetMachine {
    pub fn new(
        triple: &str,
        cpu: &str,
        features: &str,
        reloc: RelocModel,
        options: CodegenOptions,
    ) -> TargetMachine {
        TargetMachine {
            triple: Triple::parse(triple),
            cpu: cpu.to_string(),
            features: features.to_string(),
            reloc,
            options,
            functions: HashMap::new(),
        }
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// CPU name as configured, before any fallback applies.
    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn features(&self) -> &str {
        &self.features
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.reloc
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    pub fn is_little_endian(&self) -> bool {
        self.triple.is_little_endian()
    }

    /// Register a function descriptor. Names are unique per machine.
    pub fn add_function(&mut self, info: FunctionInfo) -> ConfigResult<()> {
        if self.functions.contains_key(info.name()) {
            return Err(ConfigError::DuplicateFunction {
                name: info.name().to_string(),
            });
        }
        self.functions.insert(info.name().to_string(), info);
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    /// Registered descriptors, in no particular order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.values()
    }

    /// Resolve the subtarget for this machine's configuration strings.
    pub fn subtarget(&self) -> Subtarget<'_> {
        Subtarget::new(
            self.triple.raw(),
            &self.cpu,
            &self.features,
            self.is_little_endian(),
            self.reloc,
            self,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_function_rejected() {
        let mut machine = TargetMachine::new(
            "varc-unknown-linux-gnu",
            "v1-generic",
            "",
            RelocModel::Static,
            CodegenOptions::default(),
        );
        machine.add_function(FunctionInfo::new("f")).unwrap();
        let err = machine.add_function(FunctionInfo::new("f")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateFunction { name } if name == "f"
        ));
        assert!(machine.function("f").is_some());
        assert!(machine.function("g").is_none());
    }

    #[test]
    fn test_attrs_round_trip() {
        let info = FunctionInfo::from_attrs("f", &["reduced", "uses-float"]).unwrap();
        assert_eq!(info.mode_request(), Some(ModeRequest::Reduced));
        assert_eq!(info.micro_request(), None);
        assert!(info.uses_float());

        let info = FunctionInfo::from_attrs("g", &["no-reduced", "no-micro"]).unwrap();
        assert_eq!(info.mode_request(), Some(ModeRequest::Standard));
        assert_eq!(info.micro_request(), Some(false));
        assert!(!info.uses_float());
    }

    #[test]
    fn test_unknown_attrs_ignored() {
        let info = FunctionInfo::from_attrs("f", &["inline-hint", "cold"]).unwrap();
        assert_eq!(info.mode_request(), None);
        assert_eq!(info.micro_request(), None);
    }

    #[test]
    fn test_conflicting_attrs_rejected() {
        let err = FunctionInfo::from_attrs("f", &["reduced", "no-reduced"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingModeRequest { function } if function == "f"
        ));
        assert!(FunctionInfo::from_attrs("g", &["micro", "no-micro"]).is_err());
    }

    #[test]
    fn test_opt_level_ordering() {
        assert!(OptLevel::None < OptLevel::Default);
        assert!(OptLevel::Default < OptLevel::Aggressive);
        assert_eq!(OptLevel::default(), OptLevel::Default);
    }
}
