#![warn(missing_docs, clippy::pedantic)]

//! Generates random strings following the rule of a regular expression, for
//! synthesizing test data.
//!
//! ```
//! use regen::{GeneratorArgs, Regex};
//!
//! // a fixed seed makes the samples reproducible
//! let args = GeneratorArgs::default().with_seed(42);
//! let regex = Regex::compile(r"[0-9]{4}-[0-9]{2}-[0-9]{2}", args).unwrap();
//!
//! let matcher = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
//! for sample in regex.samples().take(3) {
//!     assert!(matcher.is_match(&sample));
//! }
//! ```
//!
//! Capture groups can be intercepted to label or rewrite parts of the output:
//!
//! ```
//! # #[cfg(feature = "unicode")] {
//! use regen::{Flags, GeneratorArgs, Regex};
//!
//! let args = GeneratorArgs::default()
//!     .with_flags(Flags::PERL)
//!     .with_capture_group_handler(|group, generator, _args| {
//!         format!("{} (e.g. {})", group.name, generator.generate())
//!     });
//! let regex = Regex::compile(r"Hello, (?P<name>[A-Z][a-z]{2,10})", args).unwrap();
//! assert!(regex.generate().starts_with("Hello, name (e.g. "));
//! # }
//! ```

#![allow(clippy::must_use_candidate)]

mod args;
mod error;
mod generator;
mod parse;
mod rng;

pub use crate::args::{Flags, GeneratorArgs, DEFAULT_MAX_UNBOUNDED_REPEAT};
pub use crate::error::Error;
pub use crate::generator::{CaptureGroup, CaptureGroupHandler, Generator};
pub use crate::rng::XorShift64;

use regex_syntax::hir::Hir;
use std::iter;
use tracing::debug;

/// A parsed regex together with the arguments used to generate from it.
#[derive(Debug)]
pub struct Regex {
    hir: Hir,
    args: GeneratorArgs,
}

impl Regex {
    /// Compiles a regex pattern for string generation.
    ///
    /// `args.flags` selects the dialect the pattern is parsed with, and `args`
    /// is [initialized](GeneratorArgs::initialize) before parsing.
    ///
    /// ```
    /// let args = regen::GeneratorArgs::default().with_max_unbounded_repeat(100);
    /// let regex = regen::Regex::compile("a{4,}", args).unwrap();
    /// // this will generate a string between 4 to 100 characters long.
    /// let len = regex.generate().len();
    /// assert!((4..=100).contains(&len));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments request unsupported flags, if the
    /// pattern is not a valid regex, or if it uses Unicode general category or
    /// script classes (`\pL`, `\p{Greek}`, ...).
    ///
    /// # Panics
    ///
    /// Panics if `args.min_unbounded_repeat > args.max_unbounded_repeat`.
    pub fn compile(pattern: &str, mut args: GeneratorArgs) -> Result<Self, Error> {
        args.initialize()?;
        let hir = parse::parse(pattern, args.flags)?;
        debug!(pattern, "compiled pattern");
        Ok(Self { hir, args })
    }

    /// Wraps an already parsed regex for string generation.
    ///
    /// The [`Hir`] object can be obtained using [`regex_syntax::ParserBuilder`].
    /// `args.flags` is not consulted since parsing has already happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments request unsupported flags.
    ///
    /// # Panics
    ///
    /// Panics if `args.min_unbounded_repeat > args.max_unbounded_repeat`.
    pub fn with_hir(hir: Hir, mut args: GeneratorArgs) -> Result<Self, Error> {
        args.initialize()?;
        Ok(Self { hir, args })
    }

    /// Returns the parsed regex.
    pub fn hir(&self) -> &Hir {
        &self.hir
    }

    /// Returns the initialized arguments.
    pub fn args(&self) -> &GeneratorArgs {
        &self.args
    }

    /// Returns a generator over the whole regex.
    pub fn generator(&self) -> Generator<'_> {
        Generator::new(&self.hir, &self.args)
    }

    /// Generates a random string matching the regex.
    pub fn generate(&self) -> String {
        self.generator().generate()
    }

    /// Returns an endless iterator of generated strings.
    pub fn samples(&self) -> impl Iterator<Item = String> + '_ {
        iter::repeat_with(move || self.generate())
    }
}

/// Generates one string matching `pattern` using the default arguments.
///
/// ```
/// let sample = regen::generate("[ab]{5}").unwrap();
/// assert!(regex::Regex::new("^[ab]{5}$").unwrap().is_match(&sample));
/// ```
///
/// # Errors
///
/// Returns an error if the pattern cannot be compiled, see
/// [`Regex::compile()`].
pub fn generate(pattern: &str) -> Result<String, Error> {
    Ok(Regex::compile(pattern, GeneratorArgs::default())?.generate())
}
