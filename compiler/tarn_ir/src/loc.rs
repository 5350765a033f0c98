//! Source locations.

use std::fmt;

use crate::{Name, StringInterner};

/// Filename, line and column of a syntax tree node.
///
/// Lines and columns are 1-based; `SourceLoc::DUMMY` (all zero) marks
/// runtime-generated code such as builtins.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SourceLoc {
    pub file: Name,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    /// Location for code with no source (builtins, bootstrap).
    pub const DUMMY: SourceLoc = SourceLoc {
        file: Name::EMPTY,
        line: 0,
        column: 0,
    };

    #[inline]
    pub const fn new(file: Name, line: u32, column: u32) -> Self {
        SourceLoc { file, line, column }
    }

    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.line == 0
    }

    /// Render as `file:line:col` using the interner that owns `file`.
    pub fn display<'a>(&self, interner: &'a StringInterner) -> DisplayLoc<'a> {
        DisplayLoc {
            loc: *self,
            interner,
        }
    }
}

impl fmt::Debug for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}:{}", self.file, self.line, self.column)
    }
}

/// `Display` adapter returned by [`SourceLoc::display`].
pub struct DisplayLoc<'a> {
    loc: SourceLoc,
    interner: &'a StringInterner,
}

impl fmt::Display for DisplayLoc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_dummy() {
            return write!(f, "<builtin>");
        }
        let file = self.interner.lookup(self.loc.file);
        let file = if file.is_empty() { "<input>" } else { file };
        write!(f, "{}:{}:{}", file, self.loc.line, self.loc.column)
    }
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::SourceLoc;
    crate::static_assert_size!(SourceLoc, 12);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_file() {
        let interner = StringInterner::new();
        let file = interner.intern("main.tn");
        let loc = SourceLoc::new(file, 3, 7);
        assert_eq!(loc.display(&interner).to_string(), "main.tn:3:7");
    }

    #[test]
    fn test_display_dummy() {
        let interner = StringInterner::new();
        assert_eq!(SourceLoc::DUMMY.display(&interner).to_string(), "<builtin>");
    }

    #[test]
    fn test_display_anonymous_file() {
        let interner = StringInterner::new();
        let loc = SourceLoc::new(Name::EMPTY, 1, 1);
        assert_eq!(loc.display(&interner).to_string(), "<input>:1:1");
    }
}
