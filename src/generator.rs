use crate::GeneratorArgs;
use rand::Rng;
use regex_syntax::hir::{self, Hir, HirKind};
use std::fmt;
use tracing::trace;

/// Metadata of a capture group, passed to a [`CaptureGroupHandler`].
#[derive(Clone, Copy, Debug)]
pub struct CaptureGroup<'a> {
    /// Position of the group among all capture groups of the pattern,
    /// counting opening parentheses from the left and starting at 0.
    pub index: usize,
    /// Name of the group, or `""` if it is unnamed.
    pub name: &'a str,
    /// The tree inside the group's parentheses.
    pub hir: &'a Hir,
}

/// Replaces the default generation of capture groups.
///
/// When [`GeneratorArgs`] carries a handler, every capture group reached
/// during generation calls [`generate_group()`](Self::generate_group) exactly
/// once, in left-to-right order, and the returned string is used verbatim in
/// place of the group. `generator` is bound to the group's contents, so the
/// handler can sample it any number of times, including zero.
///
/// Closures of the matching signature implement this trait.
///
/// # Examples
///
/// ```
/// use regen::{CaptureGroup, CaptureGroupHandler, Generator, GeneratorArgs, Regex};
///
/// struct Upper;
///
/// impl CaptureGroupHandler for Upper {
///     fn generate_group(&self, _: &CaptureGroup<'_>, generator: &Generator<'_>, _: &GeneratorArgs) -> String {
///         generator.generate().to_uppercase()
///     }
/// }
///
/// let mut args = GeneratorArgs::default();
/// args.set_capture_group_handler(Upper);
/// let regex = Regex::compile("a(b)c", args).unwrap();
/// assert_eq!(regex.generate(), "aBc");
/// ```
pub trait CaptureGroupHandler {
    /// Produces the string standing in for one occurrence of `group`.
    fn generate_group(
        &self,
        group: &CaptureGroup<'_>,
        generator: &Generator<'_>,
        args: &GeneratorArgs,
    ) -> String;
}

impl<F> CaptureGroupHandler for F
where
    F: Fn(&CaptureGroup<'_>, &Generator<'_>, &GeneratorArgs) -> String,
{
    fn generate_group(
        &self,
        group: &CaptureGroup<'_>,
        generator: &Generator<'_>,
        args: &GeneratorArgs,
    ) -> String {
        self(group, generator, args)
    }
}

/// Generates strings matching one node of a parsed regex.
///
/// A generator only borrows its tree and arguments, so it is cheap to create
/// for any subtree.
///
/// # Examples
///
/// ```
/// let hir = regex_syntax::Parser::new().parse("[ab]{5}").unwrap();
/// let mut args = regen::GeneratorArgs::default();
/// args.initialize().unwrap();
///
/// let generator = regen::Generator::new(&hir, &args);
/// let sample = generator.generate();
/// assert_eq!(sample.len(), 5);
/// assert!(sample.bytes().all(|b| b == b'a' || b == b'b'));
/// ```
#[derive(Clone, Copy)]
pub struct Generator<'a> {
    hir: &'a Hir,
    args: &'a GeneratorArgs,
}

impl fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("hir", &self.hir)
            .field("args", &self.args)
            .finish()
    }
}

impl fmt::Display for Generator<'_> {
    /// Displays the regex this generator follows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.hir, f)
    }
}

impl<'a> Generator<'a> {
    /// Binds a tree to a set of arguments.
    ///
    /// # Panics
    ///
    /// Panics if `args` has not been [initialized](GeneratorArgs::initialize).
    pub fn new(hir: &'a Hir, args: &'a GeneratorArgs) -> Self {
        assert!(
            args.is_initialized(),
            "GeneratorArgs has not been initialized"
        );
        Self { hir, args }
    }

    /// Returns the tree this generator follows.
    pub fn hir(&self) -> &'a Hir {
        self.hir
    }

    /// Returns the arguments this generator draws from.
    pub fn args(&self) -> &'a GeneratorArgs {
        self.args
    }

    /// Generates a random string matching the tree.
    ///
    /// Anchors and word boundaries generate nothing, so `a^b` produces `ab`
    /// even though no string matches it.
    ///
    /// # Panics
    ///
    /// Panics if the tree contains a character class matching nothing, since
    /// no string can satisfy it.
    pub fn generate(&self) -> String {
        let mut output = String::new();
        self.eval(&mut output);
        output
    }

    fn child(&self, hir: &'a Hir) -> Self {
        Self {
            hir,
            args: self.args,
        }
    }

    fn eval(&self, output: &mut String) {
        match self.hir.kind() {
            HirKind::Empty | HirKind::Look(_) => {}
            HirKind::Literal(hir::Literal(bytes)) => eval_literal(output, bytes),
            HirKind::Class(hir::Class::Unicode(class)) => {
                output.push(self.eval_unicode_class(class));
            }
            HirKind::Class(hir::Class::Bytes(class)) => {
                output.push(char::from(self.eval_byte_class(class)));
            }
            HirKind::Repetition(rep) => self.eval_repetition(output, rep),
            HirKind::Capture(cap) => self.eval_capture(output, cap),
            HirKind::Concat(hirs) => {
                for hir in hirs {
                    self.child(hir).eval(output);
                }
            }
            HirKind::Alternation(hirs) => {
                let index = self.args.rng().random_range(0..hirs.len());
                self.child(&hirs[index]).eval(output);
            }
        }
    }

    fn eval_unicode_class(&self, class: &hir::ClassUnicode) -> char {
        let ranges = class.ranges().iter().flat_map(|range| {
            let start = u32::from(range.start());
            let end = u32::from(range.end());
            // skip the surrogate gap.
            if start <= 0xd7ff && 0xe000 <= end {
                [Some((start, 0xd7ff)), Some((0xe000, end))]
            } else {
                [Some((start, end)), None]
            }
        });
        let code = self.pick(ranges.flatten());
        char::from_u32(code).expect("valid char")
    }

    #[allow(clippy::cast_possible_truncation)]
    fn eval_byte_class(&self, class: &hir::ClassBytes) -> u8 {
        let ranges = class
            .ranges()
            .iter()
            .map(|range| (u32::from(range.start()), u32::from(range.end())));
        self.pick(ranges) as u8
    }

    /// Picks a value uniformly from the union of disjoint inclusive ranges, so
    /// wider ranges are proportionally more likely.
    fn pick(&self, ranges: impl Iterator<Item = (u32, u32)> + Clone) -> u32 {
        let total: u32 = ranges.clone().map(|(start, end)| end - start + 1).sum();
        assert!(
            total > 0,
            "cannot generate a string for a character class matching nothing"
        );

        let mut offset = self.args.rng().random_range(0..total);
        for (start, end) in ranges {
            let width = end - start + 1;
            if offset < width {
                return start + offset;
            }
            offset -= width;
        }
        unreachable!("offset is below the total width")
    }

    fn eval_repetition(&self, output: &mut String, rep: &'a hir::Repetition) {
        let (lower, upper) = match rep.max {
            Some(max) => (rep.min, max),
            None => {
                let lower = rep.min.max(self.args.min_unbounded_repeat);
                (lower, self.args.max_unbounded_repeat.max(lower))
            }
        };
        let count = self.args.rng().random_range(lower..=upper);

        let sub = self.child(&rep.sub);
        for _ in 0..count {
            sub.eval(output);
        }
    }

    fn eval_capture(&self, output: &mut String, cap: &'a hir::Capture) {
        let sub = self.child(&cap.sub);
        match self.args.capture_group_handler() {
            None => sub.eval(output),
            Some(handler) => {
                let group = CaptureGroup {
                    index: cap.index.saturating_sub(1) as usize,
                    name: cap.name.as_deref().unwrap_or(""),
                    hir: &cap.sub,
                };
                trace!(
                    index = group.index,
                    name = group.name,
                    "invoking capture group handler"
                );
                output.push_str(&handler.generate_group(&group, &sub, self.args));
            }
        }
    }
}

fn eval_literal(output: &mut String, bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(s) => output.push_str(s),
        Err(_) => output.extend(bytes.iter().copied().map(char::from)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn initialized_args() -> GeneratorArgs {
        let mut args = GeneratorArgs::default().with_seed(0);
        args.initialize().unwrap();
        args
    }

    #[test]
    #[should_panic(expected = "GeneratorArgs has not been initialized")]
    fn test_new_requires_initialized_args() {
        let hir = Hir::empty();
        let args = GeneratorArgs::default();
        let _ = Generator::new(&hir, &args);
    }

    #[test]
    #[should_panic(expected = "character class matching nothing")]
    fn test_no_match_is_fatal() {
        let hir = Hir::fail();
        let args = initialized_args();
        let _ = Generator::new(&hir, &args).generate();
    }

    #[test]
    fn test_surrogate_gap_is_skipped() {
        let class = hir::ClassUnicode::new([hir::ClassUnicodeRange::new('\u{d7fe}', '\u{e001}')]);
        let hir = Hir::class(hir::Class::Unicode(class));
        let args = initialized_args();
        let generator = Generator::new(&hir, &args);

        let mut seen = [false; 4];
        for _ in 0..999 {
            let c = generator.generate().chars().next().unwrap();
            match c {
                '\u{d7fe}' => seen[0] = true,
                '\u{d7ff}' => seen[1] = true,
                '\u{e000}' => seen[2] = true,
                '\u{e001}' => seen[3] = true,
                c => panic!("unexpected char {c:?}"),
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_class_choice_is_weighted_by_width() {
        // one range of width 1, one of width 99.
        let class = hir::ClassUnicode::new([
            hir::ClassUnicodeRange::new('a', 'a'),
            hir::ClassUnicodeRange::new('\u{100}', '\u{162}'),
        ]);
        let hir = Hir::class(hir::Class::Unicode(class));
        let args = initialized_args();
        let generator = Generator::new(&hir, &args);

        let narrow = (0..10_000)
            .filter(|_| generator.generate() == "a")
            .count();
        // expected 100, 99.9999% interval of Binomial(10000, 0.01).
        assert!((55..160).contains(&narrow), "narrow range hit {narrow} times");
    }

    #[test]
    fn test_invalid_utf8_literal_as_latin1() {
        let hir = Hir::literal(&b"a\xe9"[..]);
        let args = initialized_args();
        assert_eq!(Generator::new(&hir, &args).generate(), "a\u{e9}");
    }

    #[test]
    fn test_display() {
        let hir = regex_syntax::Parser::new().parse("ba[rz]").unwrap();
        let args = initialized_args();
        assert_eq!(Generator::new(&hir, &args).to_string(), hir.to_string());
    }
}
