//! Target architectures and their aliases.

/// Architectures a component can be built for.
///
/// ARM is declared but currently short-circuited in the pipeline driver; see
/// [`crate::pipeline::build_component`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Arm,
}

impl Arch {
    /// Build order. One architecture at a time, sequentially.
    pub const ALL: [Arch; 2] = [Arch::X86_64, Arch::Arm];

    /// Canonical name used in directory paths (`build/<arch>/`).
    pub fn canonical(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
        }
    }

    /// Suffix used in flag keys (`buildFiasco.x86_64`, `buildFiasco.ARM`).
    pub fn flag_suffix(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm => "ARM",
        }
    }

    /// GNU target triplet passed to `configure`-style scripts.
    pub fn triplet(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64-linux-gnu",
            Arch::Arm => "arm-linux-gnueabihf",
        }
    }

    /// Parse a canonical name or a common alias.
    pub fn from_name(name: &str) -> Option<Arch> {
        match name.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Some(Arch::X86_64),
            "arm" | "armhf" | "armv7" | "gnueabihf" => Some(Arch::Arm),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}
