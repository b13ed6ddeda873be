//! Target triple parsing for the VARC family.
//!
//! A triple names the architecture, vendor, operating system and environment
//! the module is compiled for, in the usual `arch-vendor-os-env` shape.
//! Parsing never fails: unrecognized components degrade to `Unknown` so that
//! a malformed triple still yields a usable (if conservative) subtarget.

use std::fmt;

/// Architecture component. The family comes in four spellings that encode
/// register width and byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Unknown,
    /// 32-bit, big-endian.
    Varc,
    /// 32-bit, little-endian.
    Varcel,
    /// 64-bit, big-endian.
    Varc64,
    /// 64-bit, little-endian.
    Varc64el,
}

impl Arch {
    fn from_name(name: &str) -> Option<Arch> {
        match name {
            "varc" => Some(Arch::Varc),
            "varcel" => Some(Arch::Varcel),
            "varc64" => Some(Arch::Varc64),
            "varc64el" => Some(Arch::Varc64el),
            "unknown" => Some(Arch::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Unknown => "unknown",
            Arch::Varc => "varc",
            Arch::Varcel => "varcel",
            Arch::Varc64 => "varc64",
            Arch::Varc64el => "varc64el",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Unknown,
    Pc,
}

impl Vendor {
    fn from_name(name: &str) -> Option<Vendor> {
        match name {
            "unknown" => Some(Vendor::Unknown),
            "pc" => Some(Vendor::Pc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Unknown => "unknown",
            Vendor::Pc => "pc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Unknown,
    Linux,
    /// Sandboxed execution environment with a restricted syscall surface.
    Sandbox,
    /// Bare-metal, no operating system.
    Bare,
}

impl Os {
    fn from_name(name: &str) -> Option<Os> {
        match name {
            "unknown" => Some(Os::Unknown),
            "linux" => Some(Os::Linux),
            "sandbox" => Some(Os::Sandbox),
            "none" => Some(Os::Bare),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Os::Unknown => "unknown",
            Os::Linux => "linux",
            Os::Sandbox => "sandbox",
            Os::Bare => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Env {
    Unknown,
    Gnu,
    GnuAbi64,
    GnuAbiN32,
    Musl,
    Eabi,
}

impl Env {
    fn from_name(name: &str) -> Option<Env> {
        match name {
            "unknown" => Some(Env::Unknown),
            "gnu" => Some(Env::Gnu),
            "gnuabi64" => Some(Env::GnuAbi64),
            "gnuabin32" => Some(Env::GnuAbiN32),
            "musl" => Some(Env::Musl),
            "eabi" => Some(Env::Eabi),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Env::Unknown => "unknown",
            Env::Gnu => "gnu",
            Env::GnuAbi64 => "gnuabi64",
            Env::GnuAbiN32 => "gnuabin32",
            Env::Musl => "musl",
            Env::Eabi => "eabi",
        }
    }
}

/// A parsed target triple.
///
/// The original spelling is retained alongside the parsed components, so a
/// triple can always be echoed back exactly as the user wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    raw: String,
    arch: Arch,
    vendor: Vendor,
    os: Os,
    env: Env,
}

impl Triple {
    /// Parse a triple string. Never fails; unknown components parse to the
    /// `Unknown` variant of their slot.
    ///
    /// The vendor component may be omitted (`varc-linux-gnu`); if the second
    /// component names a known operating system, the remaining components
    /// shift accordingly.
    pub fn parse(s: &str) -> Triple {
        let parts: Vec<&str> = s.split('-').collect();

        let arch = parts
            .first()
            .copied()
            .and_then(Arch::from_name)
            .unwrap_or(Arch::Unknown);

        let mut vendor = Vendor::Unknown;
        let mut os = Os::Unknown;
        let mut env = Env::Unknown;

        let mut idx = 1;
        if parts.len() > 1 {
            if let Some(v) = Vendor::from_name(parts[1]) {
                vendor = v;
                idx = 2;
            } else if Os::from_name(parts[1]).is_none() {
                // Unrecognized vendor; the slot is still consumed.
                idx = 2;
            }
        }
        if parts.len() > idx {
            os = Os::from_name(parts[idx]).unwrap_or(Os::Unknown);
            idx += 1;
        }
        if parts.len() > idx {
            env = Env::from_name(parts[idx]).unwrap_or(Env::Unknown);
            idx += 1;
        }
        if parts.len() > idx {
            log::debug!("ignoring extra components in target triple '{s}'");
        }

        Triple {
            raw: s.to_string(),
            arch,
            vendor,
            os,
            env,
        }
    }

    /// The triple exactly as it was given to [`Triple::parse`].
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn env(&self) -> Env {
        self.env
    }

    /// Byte order implied by the architecture spelling. The family is
    /// big-endian by default; only the `el` spellings are little-endian.
    pub fn is_little_endian(&self) -> bool {
        matches!(self.arch, Arch::Varcel | Arch::Varc64el)
    }

    /// True for the 64-bit spellings of the architecture.
    pub fn is_arch_64bit(&self) -> bool {
        matches!(self.arch, Arch::Varc64 | Arch::Varc64el)
    }

    pub fn is_os_linux(&self) -> bool {
        self.os == Os::Linux
    }

    pub fn is_os_sandbox(&self) -> bool {
        self.os == Os::Sandbox
    }

    pub fn is_os_bare(&self) -> bool {
        self.os == Os::Bare
    }
}

impl fmt::Display for Triple {
    /// Canonical `arch-vendor-os` form, with the environment appended when
    /// one was recognized.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.arch.as_str(),
            self.vendor.as_str(),
            self.os.as_str()
        )?;
        if self.env != Env::Unknown {
            write!(f, "-{}", self.env.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_triple() {
        let t = Triple::parse("varc64el-unknown-linux-gnuabi64");
        assert_eq!(t.arch(), Arch::Varc64el);
        assert_eq!(t.vendor(), Vendor::Unknown);
        assert_eq!(t.os(), Os::Linux);
        assert_eq!(t.env(), Env::GnuAbi64);
        assert!(t.is_little_endian());
        assert!(t.is_arch_64bit());
        assert!(t.is_os_linux());
    }

    #[test]
    fn test_vendor_omitted() {
        let t = Triple::parse("varc-linux-gnu");
        assert_eq!(t.arch(), Arch::Varc);
        assert_eq!(t.vendor(), Vendor::Unknown);
        assert_eq!(t.os(), Os::Linux);
        assert_eq!(t.env(), Env::Gnu);
        assert!(!t.is_little_endian());
        assert!(!t.is_arch_64bit());
    }

    #[test]
    fn test_arch_only() {
        let t = Triple::parse("varcel");
        assert_eq!(t.arch(), Arch::Varcel);
        assert_eq!(t.os(), Os::Unknown);
        assert!(t.is_little_endian());
        assert!(!t.is_os_linux());
    }

    #[test]
    fn test_unknown_components_degrade() {
        let t = Triple::parse("m68k-commodore-amigaos");
        assert_eq!(t.arch(), Arch::Unknown);
        assert_eq!(t.vendor(), Vendor::Unknown);
        assert_eq!(t.os(), Os::Unknown);
        assert!(!t.is_little_endian());
        assert_eq!(t.raw(), "m68k-commodore-amigaos");
    }

    #[test]
    fn test_empty_string() {
        let t = Triple::parse("");
        assert_eq!(t.arch(), Arch::Unknown);
        assert_eq!(t.os(), Os::Unknown);
    }

    #[test]
    fn test_sandbox_and_bare() {
        assert!(Triple::parse("varc-unknown-sandbox").is_os_sandbox());
        assert!(Triple::parse("varc64-none").is_os_bare());
    }

    #[test]
    fn test_display_canonical() {
        let t = Triple::parse("varc64-pc-linux-musl");
        assert_eq!(t.to_string(), "varc64-pc-linux-musl");
        let t = Triple::parse("varcel");
        assert_eq!(t.to_string(), "varcel-unknown-unknown");
    }
}
