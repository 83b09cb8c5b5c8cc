//! Host platform probing.
//!
//! Reports the host operating system family and, best-effort, the number of
//! logical processors. Probing never fails the build: every failure mode
//! collapses to `None`.

use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::util::process::ProcessBuilder;

const NPROC_ARGS: &[&str] = &[];
const SYSCTL_ARGS: &[&str] = &["-n", "hw.ncpu"];

/// Closed classification of the host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OsFamily {
    Linux,
    Darwin,
    Windows,
    /// Any other Unix-like host (BSDs, illumos, ...).
    OtherPosix,
}

impl OsFamily {
    /// Detect the host family. Unknown platforms map to `OtherPosix`.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Classify a `std::env::consts::OS` style name.
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::Darwin,
            "windows" => OsFamily::Windows,
            _ => OsFamily::OtherPosix,
        }
    }

    /// Returns the lowercase identifier for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Darwin => "darwin",
            OsFamily::Windows => "windows",
            OsFamily::OtherPosix => "posix",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, OsFamily::Windows)
    }

    /// File suffix of a loadable extension module on this family.
    pub fn module_suffix(&self) -> &'static str {
        match self {
            OsFamily::Windows => ".pyd",
            OsFamily::Linux | OsFamily::Darwin | OsFamily::OtherPosix => ".so",
        }
    }

    /// The command that prints the logical CPU count, if this family has one.
    pub fn cpu_count_command(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            OsFamily::Linux => Some(("nproc", NPROC_ARGS)),
            OsFamily::Darwin => Some(("sysctl", SYSCTL_ARGS)),
            OsFamily::Windows | OsFamily::OtherPosix => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(OsFamily::Linux),
            "darwin" | "macos" => Ok(OsFamily::Darwin),
            "windows" => Ok(OsFamily::Windows),
            "posix" | "other-posix" => Ok(OsFamily::OtherPosix),
            _ => Err(format!(
                "invalid OS family '{}'; expected 'linux', 'darwin', 'windows', or 'posix'",
                s
            )),
        }
    }
}

/// Facts about the host, computed once per build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostFacts {
    pub os_family: OsFamily,
    /// Absent when probing failed or is unsupported on this family.
    pub logical_cpus: Option<NonZeroUsize>,
    /// Pointer width of the host in bits.
    pub pointer_width: u32,
}

impl HostFacts {
    /// Probe the running host.
    pub fn probe() -> Self {
        let os_family = OsFamily::detect();
        let logical_cpus = detect_logical_cpu_count(os_family);
        let host = HostFacts {
            os_family,
            logical_cpus,
            pointer_width: host_pointer_width(),
        };
        tracing::debug!(
            "host: os={} cpus={:?} pointer_width={}",
            host.os_family,
            host.logical_cpus,
            host.pointer_width
        );
        host
    }

    /// Host facts for a given family with no CPU information.
    pub fn new(os_family: OsFamily) -> Self {
        HostFacts {
            os_family,
            logical_cpus: None,
            pointer_width: host_pointer_width(),
        }
    }

    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.logical_cpus = NonZeroUsize::new(cpus);
        self
    }

    pub fn with_pointer_width(mut self, bits: u32) -> Self {
        self.pointer_width = bits;
        self
    }

    pub fn is_64bit(&self) -> bool {
        self.pointer_width >= 64
    }
}

/// Pointer width of the running binary in bits.
pub fn host_pointer_width() -> u32 {
    usize::BITS
}

/// Detect the number of logical CPUs for a host family.
///
/// Only Linux and Darwin are probed. Any failure yields `None`.
pub fn detect_logical_cpu_count(family: OsFamily) -> Option<NonZeroUsize> {
    let (program, args) = family.cpu_count_command()?;
    run_cpu_probe(program, args)
}

/// Run a CPU-count utility and parse its output.
pub fn run_cpu_probe(program: &str, args: &[&str]) -> Option<NonZeroUsize> {
    if program.is_empty() {
        return None;
    }

    let output = match ProcessBuilder::new(program).args(args).exec() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("CPU count probe `{}` unavailable: {:#}", program, e);
            return None;
        }
    };

    if !output.status.success() {
        tracing::warn!(
            "CPU count probe `{}` exited with {:?}",
            program,
            output.status.code()
        );
        return None;
    }

    let count = parse_cpu_count(&String::from_utf8_lossy(&output.stdout));
    if count.is_none() {
        tracing::warn!("CPU count probe `{}` printed no usable count", program);
    }
    count
}

/// Parse a CPU count from utility output, ignoring surrounding whitespace.
pub fn parse_cpu_count(output: &str) -> Option<NonZeroUsize> {
    output.trim().parse::<NonZeroUsize>().ok()
}
