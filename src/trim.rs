/// Which ends of a token to trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimSide {
    None,
    Start,
    End,
    StartEnd,
}

impl TrimSide {
    /// Returns `true` for [`Start`](TrimSide::Start) and
    /// [`StartEnd`](TrimSide::StartEnd).
    pub fn has_start(self) -> bool {
        matches!(self, TrimSide::Start | TrimSide::StartEnd)
    }

    /// Returns `true` for [`End`](TrimSide::End) and
    /// [`StartEnd`](TrimSide::StartEnd).
    pub fn has_end(self) -> bool {
        matches!(self, TrimSide::End | TrimSide::StartEnd)
    }
}

/// Which bytes count as whitespace when trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhiteSpace {
    /// Only `' '`.
    Minimal,
    /// `' '`, `'\n'`, `'\r'`, `'\t'`, `'\v'` and `'\f'`.
    Maximal,
}

impl WhiteSpace {
    /// Returns `true` if `b` is whitespace in this class.
    pub fn contains(self, b: u8) -> bool {
        match self {
            WhiteSpace::Minimal => b == b' ',
            WhiteSpace::Maximal => matches!(b, b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c),
        }
    }
}

/// Describes how a reader trims the tokens it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrimOptions {
    /// The ends to trim.
    pub side: TrimSide,
    /// The bytes to trim.
    pub class: WhiteSpace,
}

impl TrimOptions {
    /// Leaves tokens as they are.
    pub const NONE: TrimOptions = TrimOptions::new(TrimSide::None, WhiteSpace::Maximal);

    /// Trims leading spaces.
    pub const MIN_START: TrimOptions = TrimOptions::new(TrimSide::Start, WhiteSpace::Minimal);
    /// Trims trailing spaces.
    pub const MIN_END: TrimOptions = TrimOptions::new(TrimSide::End, WhiteSpace::Minimal);
    /// Trims spaces on both ends.
    pub const MIN: TrimOptions = TrimOptions::new(TrimSide::StartEnd, WhiteSpace::Minimal);

    /// Trims leading whitespace of the [`Maximal`](WhiteSpace::Maximal) class.
    pub const MAX_START: TrimOptions = TrimOptions::new(TrimSide::Start, WhiteSpace::Maximal);
    /// Trims trailing whitespace of the [`Maximal`](WhiteSpace::Maximal) class.
    pub const MAX_END: TrimOptions = TrimOptions::new(TrimSide::End, WhiteSpace::Maximal);
    /// Trims whitespace of the [`Maximal`](WhiteSpace::Maximal) class on both
    /// ends. The header field readers trim this way by default.
    pub const MAX: TrimOptions = TrimOptions::new(TrimSide::StartEnd, WhiteSpace::Maximal);

    pub const fn new(side: TrimSide, class: WhiteSpace) -> TrimOptions {
        TrimOptions { side, class }
    }

    /// Returns `true` if `b` belongs to this option's whitespace class,
    /// whatever the side.
    pub fn contains(&self, b: u8) -> bool {
        self.class.contains(b)
    }

    /// See [`TrimSide::has_start`].
    pub fn has_start(&self) -> bool {
        self.side.has_start()
    }

    pub fn has_end(&self) -> bool {
        self.side.has_end()
    }

    /// Trims `bytes` according to these options.
    pub fn trim<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let start = if self.has_start() {
            bytes.iter().position(|&b| !self.contains(b)).unwrap_or(bytes.len())
        } else {
            0
        };
        let end = if self.has_end() {
            bytes[start..]
                .iter()
                .rposition(|&b| !self.contains(b))
                .map_or(start, |idx| start + idx + 1)
        } else {
            bytes.len()
        };
        &bytes[start..end]
    }
}

impl Default for TrimOptions {
    fn default() -> Self {
        TrimOptions::NONE
    }
}
