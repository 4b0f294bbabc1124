//! Front-end configuration shared by every file in a compilation.

/// How much the driver prints besides diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Diagnostics only.
    Quiet,
    /// Per-file progress lines.
    #[default]
    Info,
    /// Progress plus token and tree dumps.
    Debug,
}

#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    pub disable_colors: bool,
    pub verbosity: Verbosity,
}

impl CompilerConfig {
    pub fn colors_enabled(&self) -> bool {
        !self.disable_colors
    }

    pub fn shows(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }
}
