//! VARC subtarget configuration.
//!
//! This crate resolves the per-module hardware configuration for the VARC
//! processor family: which ISA revision to target, which ABI, how wide the
//! register files are, which optional extensions exist, and which instruction
//! encoding each function uses. The rest of a backend asks those questions
//! constantly; everything here is resolved once per module and answered from
//! plain fields.
//!
//! # Primary Usage
//!
//! ```
//! use varc::{CodegenOptions, RelocModel, TargetMachine};
//!
//! // Module-level target state from the front end's configuration strings.
//! let machine = TargetMachine::new(
//!     "varc64el-unknown-linux-gnuabi64",
//!     "v2-generic",
//!     "+vfpu",
//!     RelocModel::Pic,
//!     CodegenOptions::default(),
//! );
//!
//! // Resolve once, query everywhere.
//! let subtarget = machine.subtarget();
//! assert!(subtarget.has_v2());
//! assert!(subtarget.is_abi_n64());
//! assert!(subtarget.has_vfpu());
//! ```
//!
//! # Architecture
//!
//! - [`machine`] - Module-level state: triple, codegen policy, functions
//! - [`subtarget`] - The resolved configuration and its query surface
//! - [`features`] - Feature tokens and the bit-level resolution engine
//! - [`triple`] - Target triple parsing
//! - [`reginfo`] - Allocatable-register masks derived from the config
//! - [`itinerary`] - Per-CPU instruction timing data

pub mod error;
pub mod features;
pub mod itinerary;
pub mod machine;
pub mod reginfo;
pub mod subtarget;
pub mod triple;

mod tables;

// Re-export the everyday types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use features::{Feature, FeatureBits, Polarity, parse_tokens};
pub use itinerary::{FuncUnit, InstrItineraries, InstrStage, ItinClass, ItineraryTable};
pub use machine::{
    CodegenOptions, FunctionInfo, ModeRequest, OptLevel, ReducedOverride, RelocModel,
    TargetMachine,
};
pub use reginfo::RegInfo;
pub use subtarget::{
    Abi, AntiDepMode, ArchVersion, Endianness, PostRaSchedPolicy, RegClassKind, Subtarget,
    SubtargetConfig,
};
pub use triple::Triple;
