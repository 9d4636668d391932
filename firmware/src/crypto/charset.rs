//! Fixed character classes a password is drawn from.

/// Character classes in draw order. The order and contents are part of the derivation: changing
/// either changes every password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CharClass {
    Upper = 0,
    Lower = 1,
    Digits = 2,
    Minus = 3,
    Underline = 4,
    Symbols = 5,
    Brackets = 6,
    Space = 7,
}

pub const CLASS_COUNT: usize = 8;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const MINUS: &[u8] = b"-";
const UNDERLINE: &[u8] = b"_";
const SYMBOLS: &[u8] = b"!\"#$%&'*+,./:;=?@\\^`|~";
const BRACKETS: &[u8] = b"()<>[]{}";
const SPACE: &[u8] = b" ";

impl CharClass {
    pub const ALL: [CharClass; CLASS_COUNT] = [
        CharClass::Upper,
        CharClass::Lower,
        CharClass::Digits,
        CharClass::Minus,
        CharClass::Underline,
        CharClass::Symbols,
        CharClass::Brackets,
        CharClass::Space,
    ];

    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            CharClass::Upper => UPPER,
            CharClass::Lower => LOWER,
            CharClass::Digits => DIGITS,
            CharClass::Minus => MINUS,
            CharClass::Underline => UNDERLINE,
            CharClass::Symbols => SYMBOLS,
            CharClass::Brackets => BRACKETS,
            CharClass::Space => SPACE,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Class a byte belongs to, if any.
    pub fn of(byte: u8) -> Option<CharClass> {
        CharClass::ALL
            .into_iter()
            .find(|class| class.alphabet().contains(&byte))
    }
}

/// Bit set of enabled classes, bit `n` for `CharClass::ALL[n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetMask(u8);

impl SetMask {
    pub const ALL: Self = Self(0xFF);
    pub const NONE: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, class: CharClass) -> bool {
        self.0 & class.bit() != 0
    }

    pub const fn with(self, class: CharClass) -> Self {
        Self(self.0 | class.bit())
    }

    pub const fn without(self, class: CharClass) -> Self {
        Self(self.0 & !class.bit())
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn classes(self) -> impl Iterator<Item = CharClass> {
        CharClass::ALL
            .into_iter()
            .filter(move |class| self.contains(*class))
    }
}

impl Default for SetMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Minimum number of characters each class must contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinimumCounts([u8; CLASS_COUNT]);

impl MinimumCounts {
    /// One uppercase, one lowercase, one digit and one symbol.
    pub const DEFAULT: Self = Self([1, 1, 1, 0, 0, 1, 0, 0]);

    pub const fn new(counts: [u8; CLASS_COUNT]) -> Self {
        Self(counts)
    }

    pub const fn get(&self, class: CharClass) -> u8 {
        self.0[class.index()]
    }

    pub const fn as_array(&self) -> [u8; CLASS_COUNT] {
        self.0
    }

    /// Minimums of the classes enabled in `mask`, zero elsewhere.
    pub fn masked(&self, mask: SetMask) -> [u8; CLASS_COUNT] {
        let mut counts = [0u8; CLASS_COUNT];
        for class in mask.classes() {
            counts[class.index()] = self.get(class);
        }
        counts
    }

    /// Total characters the enabled classes demand.
    pub fn required(&self, mask: SetMask) -> usize {
        self.masked(mask).iter().map(|&count| usize::from(count)).sum()
    }
}

impl Default for MinimumCounts {
    fn default() -> Self {
        Self::DEFAULT
    }
}
