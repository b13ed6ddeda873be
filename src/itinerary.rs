//! Instruction itineraries.
//!
//! An itinerary describes, per instruction class, which functional units an
//! instruction occupies and for how many cycles. The scheduler consumes this
//! through [`InstrItineraries`], a read-only view over the static table that
//! belongs to the selected CPU. All queries are pure and constant-time.

use std::fmt;

/// Bitmask of functional units a pipeline stage occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncUnit(u8);

impl FuncUnit {
    pub const ALU0: FuncUnit = FuncUnit(1 << 0);
    pub const ALU1: FuncUnit = FuncUnit(1 << 1);
    /// Address generation for loads and stores.
    pub const AGU: FuncUnit = FuncUnit(1 << 2);
    /// Multiply/divide unit.
    pub const MDU: FuncUnit = FuncUnit(1 << 3);
    pub const FPU: FuncUnit = FuncUnit(1 << 4);
    pub const DSPU: FuncUnit = FuncUnit(1 << 5);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Union of two unit masks. A stage that can issue on either ALU of a
    /// dual-issue core is written `ALU0.with(ALU1)`.
    pub const fn with(self, other: FuncUnit) -> FuncUnit {
        FuncUnit(self.0 | other.0)
    }

    pub const fn contains(self, other: FuncUnit) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Scheduling class an instruction belongs to. Indexes the per-CPU stage
/// tables, so the discriminant order is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ItinClass {
    Alu = 0,
    Load,
    Store,
    Branch,
    Mul,
    Div,
    FpAdd,
    FpMulS,
    FpMulD,
    FpDivS,
    FpDivD,
    FpCvt,
    FpMove,
    FpLoad,
    FpStore,
    DspAlu,
    DspMul,
    Pseudo,
}

impl ItinClass {
    pub const COUNT: usize = 18;
}

/// One pipeline stage: the units it occupies and for how many cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrStage {
    pub cycles: u8,
    pub units: FuncUnit,
}

/// Static per-CPU itinerary data. Each entry is the stage sequence for one
/// [`ItinClass`]; an empty sequence means the CPU has no timing data for
/// that class.
#[derive(Debug)]
pub struct ItineraryTable {
    pub name: &'static str,
    /// Instructions the core can issue per cycle.
    pub issue_width: u8,
    pub entries: [&'static [InstrStage]; ItinClass::COUNT],
}

/// Read-only itinerary view handed out by the subtarget.
#[derive(Debug, Clone, Copy)]
pub struct InstrItineraries {
    table: &'static ItineraryTable,
}

impl InstrItineraries {
    pub(crate) fn new(table: &'static ItineraryTable) -> InstrItineraries {
        InstrItineraries { table }
    }

    /// Name of the CPU model this itinerary describes.
    pub fn cpu(&self) -> &'static str {
        self.table.name
    }

    pub fn issue_width(&self) -> u8 {
        self.table.issue_width
    }

    /// Stage sequence for an instruction class. Empty when the CPU carries
    /// no timing data for the class.
    pub fn stages(&self, class: ItinClass) -> &'static [InstrStage] {
        self.table.entries[class as usize]
    }

    /// Worst-case completion latency for an instruction class, in cycles:
    /// the sum of its stage cycles. Zero for classes without timing data.
    pub fn latency(&self, class: ItinClass) -> u32 {
        self.stages(class)
            .iter()
            .map(|stage| u32::from(stage.cycles))
            .sum()
    }

    /// True when the table carries no timing data at all.
    pub fn is_empty(&self) -> bool {
        self.table.entries.iter().all(|stages| stages.is_empty())
    }
}

impl fmt::Display for InstrItineraries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "itinerary '{}' (issue width {})",
            self.table.name, self.table.issue_width
        )
    }
}
