use crate::generator::{CaptureGroup, CaptureGroupHandler, Generator};
use crate::{Error, XorShift64};
use rand::RngCore;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use tracing::debug;

/// Default value of [`GeneratorArgs::max_unbounded_repeat`].
///
/// This matches the largest repetition count most regex engines accept.
pub const DEFAULT_MAX_UNBOUNDED_REPEAT: u32 = 1000;

/// Dialect flags selecting how a pattern is parsed.
///
/// Flags combine with `|`:
///
/// ```
/// use regen::Flags;
///
/// let flags = Flags::CASE_INSENSITIVE | Flags::PERL;
/// assert!(flags.contains(Flags::PERL));
/// assert!(!flags.contains(Flags::ASCII));
/// assert_eq!(flags.to_string(), "CASE_INSENSITIVE | PERL");
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Letters match both upper and lower case (`(?i)`).
    pub const CASE_INSENSITIVE: Self = Self(1 << 0);
    /// `^` and `$` match at line boundaries (`(?m)`).
    pub const MULTI_LINE: Self = Self(1 << 1);
    /// `.` also matches `\n` (`(?s)`).
    pub const DOT_MATCHES_NEW_LINE: Self = Self(1 << 2);
    /// Swaps greedy and lazy repetition (`(?U)`).
    pub const SWAP_GREED: Self = Self(1 << 3);
    /// Whitespace and `#` comments in the pattern are ignored (`(?x)`).
    pub const IGNORE_WHITESPACE: Self = Self(1 << 4);
    /// The pattern is a literal string, not a regex.
    pub const LITERAL: Self = Self(1 << 5);
    /// Unicode mode is off: `\d`, `\s`, `\w` and POSIX classes are ASCII, and
    /// `.` matches single bytes, which are generated as Latin-1 characters.
    pub const ASCII: Self = Self(1 << 6);
    /// Unicode general category and script classes. Not supported;
    /// [`GeneratorArgs::initialize()`] rejects it.
    pub const UNICODE_CLASSES: Self = Self(1 << 7);
    /// The Perl dialect: `\d`, `\s`, `\w` and their negations are ASCII
    /// classes. Everything else stays in Unicode mode, so `.`, `\D` and `[^a]`
    /// still cover all scalar values.
    pub const PERL: Self = Self(1 << 8);

    const UNSUPPORTED: Self = Self::UNICODE_CLASSES;

    const NAMES: [(Self, &'static str); 9] = [
        (Self::CASE_INSENSITIVE, "CASE_INSENSITIVE"),
        (Self::MULTI_LINE, "MULTI_LINE"),
        (Self::DOT_MATCHES_NEW_LINE, "DOT_MATCHES_NEW_LINE"),
        (Self::SWAP_GREED, "SWAP_GREED"),
        (Self::IGNORE_WHITESPACE, "IGNORE_WHITESPACE"),
        (Self::LITERAL, "LITERAL"),
        (Self::ASCII, "ASCII"),
        (Self::UNICODE_CLASSES, "UNICODE_CLASSES"),
        (Self::PERL, "PERL"),
    ];

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Checks if every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Tunable parameters of string generation.
///
/// Every field is optional; [`GeneratorArgs::default()`] is a valid
/// configuration. The arguments must be [initialized](Self::initialize)
/// before a [`Generator`] can use them, which [`Regex::compile()`] does
/// automatically.
///
/// [`Regex::compile()`]: crate::Regex::compile
///
/// # Examples
///
/// ```
/// let args = regen::GeneratorArgs::default()
///     .with_flags(regen::Flags::PERL)
///     .with_max_unbounded_repeat(10)
///     .with_seed(7);
/// let regex = regen::Regex::compile(r"\d+", args).unwrap();
/// let sample = regex.generate();
/// assert!((1..=10).contains(&sample.len()));
/// assert!(sample.bytes().all(|b| b.is_ascii_digit()));
/// ```
pub struct GeneratorArgs {
    /// Dialect flags used when parsing the pattern.
    pub flags: Flags,
    /// Lower bound substituted for repetitions without an upper bound
    /// (`x*`, `x+`, `x{n,}`). The pattern's own minimum wins if larger.
    pub min_unbounded_repeat: u32,
    /// Upper bound substituted for repetitions without an upper bound.
    pub max_unbounded_repeat: u32,
    capture_group_handler: Option<Box<dyn CaptureGroupHandler>>,
    rng: Option<RefCell<Box<dyn RngCore>>>,
    initialized: bool,
}

impl Default for GeneratorArgs {
    fn default() -> Self {
        Self {
            flags: Flags::NONE,
            min_unbounded_repeat: 0,
            max_unbounded_repeat: DEFAULT_MAX_UNBOUNDED_REPEAT,
            capture_group_handler: None,
            rng: None,
            initialized: false,
        }
    }
}

impl fmt::Debug for GeneratorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorArgs")
            .field("flags", &self.flags)
            .field("min_unbounded_repeat", &self.min_unbounded_repeat)
            .field("max_unbounded_repeat", &self.max_unbounded_repeat)
            .field(
                "capture_group_handler",
                &self.capture_group_handler.is_some(),
            )
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl GeneratorArgs {
    /// Sets the dialect flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets [`min_unbounded_repeat`](Self::min_unbounded_repeat).
    #[must_use]
    pub fn with_min_unbounded_repeat(mut self, min: u32) -> Self {
        self.min_unbounded_repeat = min;
        self
    }

    /// Sets [`max_unbounded_repeat`](Self::max_unbounded_repeat).
    #[must_use]
    pub fn with_max_unbounded_repeat(mut self, max: u32) -> Self {
        self.max_unbounded_repeat = max;
        self
    }

    /// Uses `rng` as the random source for every generation.
    ///
    /// Two arguments sharing a seeded source produce identical strings for
    /// the same pattern.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Some(RefCell::new(Box::new(rng)));
        self
    }

    /// Uses an [`XorShift64`] seeded with `seed` as the random source.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(XorShift64::new(seed))
    }

    /// Intercepts the generation of every capture group with a closure.
    ///
    /// See [`CaptureGroupHandler`] for the meaning of the arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// let args = regen::GeneratorArgs::default()
    ///     .with_capture_group_handler(|group, _generator, _args| {
    ///         format!("<{}>", group.name)
    ///     });
    /// let regex = regen::Regex::compile("id=(?P<id>[0-9]+)", args).unwrap();
    /// assert_eq!(regex.generate(), "id=<id>");
    /// ```
    #[must_use]
    pub fn with_capture_group_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CaptureGroup<'_>, &Generator<'_>, &GeneratorArgs) -> String + 'static,
    {
        self.capture_group_handler = Some(Box::new(handler));
        self
    }

    /// Intercepts the generation of every capture group with `handler`.
    pub fn set_capture_group_handler(&mut self, handler: impl CaptureGroupHandler + 'static) {
        self.capture_group_handler = Some(Box::new(handler));
    }

    /// Returns the configured capture group handler, if any.
    pub fn capture_group_handler(&self) -> Option<&dyn CaptureGroupHandler> {
        self.capture_group_handler.as_deref()
    }

    /// Validates the arguments and resolves the random source.
    ///
    /// If no random source was supplied, an [`XorShift64`] seeded from the
    /// wall clock is installed and kept for all later generations. Calling
    /// this again after success changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFlags`] if [`Flags::UNICODE_CLASSES`] is
    /// requested.
    ///
    /// # Panics
    ///
    /// Panics if `min_unbounded_repeat > max_unbounded_repeat`. This is a bug
    /// in the caller, not a property of the input.
    pub fn initialize(&mut self) -> Result<(), Error> {
        let unsupported = self.flags & Flags::UNSUPPORTED;
        if !unsupported.is_empty() {
            return Err(Error::UnsupportedFlags(unsupported));
        }

        assert!(
            self.min_unbounded_repeat <= self.max_unbounded_repeat,
            "min_unbounded_repeat({}) > max_unbounded_repeat({})",
            self.min_unbounded_repeat,
            self.max_unbounded_repeat,
        );

        if self.initialized {
            return Ok(());
        }

        let defaulted = self.rng.is_none();
        if defaulted {
            self.rng = Some(RefCell::new(Box::new(XorShift64::from_time())));
        }
        self.initialized = true;

        debug!(
            flags = %self.flags,
            min_unbounded_repeat = self.min_unbounded_repeat,
            max_unbounded_repeat = self.max_unbounded_repeat,
            time_seeded = defaulted,
            "initialized generator args"
        );
        Ok(())
    }

    /// Checks if [`initialize()`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Borrows the random source.
    ///
    /// # Panics
    ///
    /// Panics if the arguments have not been initialized, or if the source is
    /// already borrowed.
    pub fn rng(&self) -> RefMut<'_, Box<dyn RngCore>> {
        assert!(self.initialized, "GeneratorArgs has not been initialized");
        self.rng
            .as_ref()
            .expect("initialized args always have a random source")
            .borrow_mut()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initialize_default() {
        let mut args = GeneratorArgs::default();
        assert!(!args.is_initialized());
        args.initialize().unwrap();
        assert!(args.is_initialized());
    }

    #[test]
    fn test_unicode_classes_not_supported() {
        let mut args = GeneratorArgs::default().with_flags(Flags::UNICODE_CLASSES | Flags::PERL);
        assert_eq!(
            args.initialize(),
            Err(Error::UnsupportedFlags(Flags::UNICODE_CLASSES))
        );
        assert!(!args.is_initialized());
    }

    #[test]
    #[should_panic(expected = "min_unbounded_repeat(2) > max_unbounded_repeat(1)")]
    fn test_invalid_repeat_bounds() {
        let mut args = GeneratorArgs::default()
            .with_min_unbounded_repeat(2)
            .with_max_unbounded_repeat(1);
        let _ = args.initialize();
    }

    #[test]
    fn test_equal_repeat_bounds() {
        let mut args = GeneratorArgs::default()
            .with_min_unbounded_repeat(1)
            .with_max_unbounded_repeat(1);
        args.initialize().unwrap();
    }

    #[test]
    #[should_panic(expected = "GeneratorArgs has not been initialized")]
    fn test_rng_before_initialize() {
        let args = GeneratorArgs::default().with_seed(0);
        let _ = args.rng();
    }

    #[test]
    fn test_rng_after_initialize() {
        let mut args = GeneratorArgs::default();
        args.initialize().unwrap();
        let _ = args.rng().next_u64();
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut args = GeneratorArgs::default().with_seed(5);
        args.initialize().unwrap();
        args.initialize().unwrap();

        let mut expected = XorShift64::new(5);
        assert_eq!(args.rng().next_u64(), expected.next_u64());
        args.initialize().unwrap();
        assert_eq!(args.rng().next_u64(), expected.next_u64());
    }

    #[test]
    fn test_flags() {
        assert_eq!(Flags::default(), Flags::NONE);
        assert_eq!(Flags::NONE.to_string(), "NONE");
        assert!(!Flags::PERL.contains(Flags::ASCII));
        assert_eq!(
            (Flags::PERL | Flags::ASCII).to_string(),
            "ASCII | PERL"
        );

        let mut flags = Flags::MULTI_LINE;
        flags |= Flags::LITERAL;
        assert!(flags.contains(Flags::MULTI_LINE));
        assert!(flags.contains(Flags::LITERAL));
        assert!(!flags.contains(Flags::MULTI_LINE | Flags::ASCII));
        assert_eq!((flags & Flags::LITERAL).bits(), Flags::LITERAL.bits());
        assert_eq!(flags.to_string(), "MULTI_LINE | LITERAL");
    }
}
