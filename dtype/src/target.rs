//! Backend identifiers.
//!
//! A [`Target`] names the hardware family a schedule is synthesized for. Scheduling code
//! only compares targets for identity; the name is forwarded verbatim to native backends.

use std::fmt;

use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum ParseTargetError {
    #[snafu(display("empty target name"))]
    EmptyTarget,

    #[snafu(display("invalid character {ch:?} in target name {name:?}"))]
    InvalidCharacter { name: String, ch: char },
}

/// Backend family identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Cuda,
    Rocm,
    OpenCl,
    Metal,
    Vulkan,
    Llvm,
    /// Any other backend, stored lowercase.
    Custom(String),
}

impl Target {
    /// Parse a target name.
    ///
    /// Matching is case-insensitive and ignores target options after the first
    /// whitespace (`"cuda -arch=sm_80"` is `Cuda`):
    /// - "cuda", "nvptx", "gpu" -> `Target::Cuda`
    /// - "rocm", "amdgpu" -> `Target::Rocm`
    /// - anything else made of `[a-z0-9_-]` -> `Target::Custom`
    pub fn parse(s: &str) -> Result<Self, ParseTargetError> {
        let name = s.split_whitespace().next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return EmptyTargetSnafu.fail();
        }
        if let Some(ch) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-')) {
            return InvalidCharacterSnafu { name, ch }.fail();
        }

        Ok(match name.as_str() {
            "cuda" | "nvptx" | "gpu" => Self::Cuda,
            "rocm" | "amdgpu" => Self::Rocm,
            "opencl" => Self::OpenCl,
            "metal" => Self::Metal,
            "vulkan" | "spirv" => Self::Vulkan,
            "llvm" | "cpu" => Self::Llvm,
            _ => Self::Custom(name),
        })
    }

    /// Canonical backend name handed to native schedule generators.
    pub fn name(&self) -> &str {
        match self {
            Self::Cuda => "cuda",
            Self::Rocm => "rocm",
            Self::OpenCl => "opencl",
            Self::Metal => "metal",
            Self::Vulkan => "vulkan",
            Self::Llvm => "llvm",
            Self::Custom(name) => name,
        }
    }

    /// Whether the backend exposes a block/thread execution hierarchy.
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Cuda | Self::Rocm | Self::OpenCl | Self::Metal | Self::Vulkan)
    }
}

impl std::str::FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
