//! Error diffusion kernel definitions.

use serde::{Deserialize, Serialize};

/// An error diffusion kernel.
///
/// Each entry is a `(dx, dy, weight)` offset to a neighbour that has not
/// been visited yet. A neighbour receives `error * weight / divisor`.
/// `max_dy` sizes the error buffer: `max_dy + 1` rows.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub entries: &'static [(i32, i32, u8)],
    pub divisor: u8,
    pub max_dy: usize,
}

/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    max_dy: 1,
};

/// ```text
///    X   2
///    1   1
/// ```
pub const SIERRA_LITE: Kernel = Kernel {
    entries: &[(1, 0, 2), (-1, 1, 1), (0, 1, 1)],
    divisor: 4,
    max_dy: 1,
};

/// Propagates 6/8 of the error; the rest is dropped.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[
        (1, 0, 1),
        (2, 0, 1),
        (-1, 1, 1),
        (0, 1, 1),
        (1, 1, 1),
        (0, 2, 1),
    ],
    divisor: 8,
    max_dy: 2,
};

/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1
/// ```
pub const JARVIS_JUDICE_NINKE: Kernel = Kernel {
    entries: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
    max_dy: 2,
};

/// Selectable diffusion kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffusionKernel {
    #[default]
    FloydSteinberg,
    SierraLite,
    Atkinson,
    JarvisJudiceNinke,
}

impl DiffusionKernel {
    /// Weight table for this kernel.
    pub fn kernel(self) -> &'static Kernel {
        match self {
            DiffusionKernel::FloydSteinberg => &FLOYD_STEINBERG,
            DiffusionKernel::SierraLite => &SIERRA_LITE,
            DiffusionKernel::Atkinson => &ATKINSON,
            DiffusionKernel::JarvisJudiceNinke => &JARVIS_JUDICE_NINKE,
        }
    }
}
