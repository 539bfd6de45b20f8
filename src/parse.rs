//! Turns pattern text into a [`Hir`] according to the dialect [`Flags`].

use crate::{Error, Flags};
use regex_syntax::ast::{self, Ast, ClassSetItem, Span, Visitor};
use regex_syntax::hir::{translate::TranslatorBuilder, Hir};
use std::borrow::Cow;

/// Parses `pattern` with the given flags.
///
/// Unicode general category and script classes (`\pL`, `\p{Greek}`, ...)
/// are rejected before translation. Under [`Flags::PERL`] the Perl classes
/// are replaced by their ASCII counterparts while the rest of the pattern
/// stays in Unicode mode.
pub(crate) fn parse(pattern: &str, flags: Flags) -> Result<Hir, Error> {
    let text = if flags.contains(Flags::LITERAL) {
        Cow::Owned(regex_syntax::escape(pattern))
    } else {
        Cow::Borrowed(pattern)
    };

    let mut ast = ast::parse::ParserBuilder::new()
        .ignore_whitespace(flags.contains(Flags::IGNORE_WHITESPACE))
        .build()
        .parse(&text)
        .map_err(|e| Error::syntax(pattern, e))?;

    ast::visit(&ast, RejectUnicodeClasses { pattern: &text })?;
    if flags.contains(Flags::PERL) {
        ascii_perl_classes(&mut ast);
    }

    let unicode = !flags.contains(Flags::ASCII);
    TranslatorBuilder::new()
        .unicode(unicode)
        // with Unicode off `.` covers every byte, which is not valid UTF-8 on
        // its own. Such bytes are generated as Latin-1 characters instead.
        .utf8(unicode)
        .case_insensitive(flags.contains(Flags::CASE_INSENSITIVE))
        .multi_line(flags.contains(Flags::MULTI_LINE))
        .dot_matches_new_line(flags.contains(Flags::DOT_MATCHES_NEW_LINE))
        .swap_greed(flags.contains(Flags::SWAP_GREED))
        .build()
        .translate(&text, &ast)
        .map_err(|e| Error::syntax(pattern, e))
}

/// Rewrites `\d`, `\s`, `\w` (and negations) into `[[:digit:]]`,
/// `[[:space:]]`, `[[:word:]]` (and `[[:^digit:]]`, ...), inside and outside
/// brackets. Negated classes are then complemented over all scalar values.
fn ascii_perl_classes(ast: &mut Ast) {
    match ast {
        Ast::ClassPerl(perl) => {
            *ast = Ast::class_bracketed(ast::ClassBracketed {
                span: perl.span,
                negated: false,
                kind: ast::ClassSet::Item(ClassSetItem::Ascii(to_ascii(perl))),
            });
        }
        Ast::ClassBracketed(class) => ascii_perl_class_set(&mut class.kind),
        Ast::Repetition(rep) => ascii_perl_classes(&mut rep.ast),
        Ast::Group(group) => ascii_perl_classes(&mut group.ast),
        Ast::Alternation(alt) => alt.asts.iter_mut().for_each(ascii_perl_classes),
        Ast::Concat(concat) => concat.asts.iter_mut().for_each(ascii_perl_classes),
        Ast::Empty(_)
        | Ast::Flags(_)
        | Ast::Literal(_)
        | Ast::Dot(_)
        | Ast::Assertion(_)
        | Ast::ClassUnicode(_) => {}
    }
}

fn ascii_perl_class_set(set: &mut ast::ClassSet) {
    match set {
        ast::ClassSet::Item(item) => ascii_perl_class_set_item(item),
        ast::ClassSet::BinaryOp(op) => {
            ascii_perl_class_set(&mut op.lhs);
            ascii_perl_class_set(&mut op.rhs);
        }
    }
}

fn ascii_perl_class_set_item(item: &mut ClassSetItem) {
    match item {
        ClassSetItem::Perl(perl) => *item = ClassSetItem::Ascii(to_ascii(perl)),
        ClassSetItem::Bracketed(class) => ascii_perl_class_set(&mut class.kind),
        ClassSetItem::Union(union) => {
            union.items.iter_mut().for_each(ascii_perl_class_set_item);
        }
        ClassSetItem::Empty(_)
        | ClassSetItem::Literal(_)
        | ClassSetItem::Range(_)
        | ClassSetItem::Ascii(_)
        | ClassSetItem::Unicode(_) => {}
    }
}

fn to_ascii(perl: &ast::ClassPerl) -> ast::ClassAscii {
    let kind = match perl.kind {
        ast::ClassPerlKind::Digit => ast::ClassAsciiKind::Digit,
        ast::ClassPerlKind::Space => ast::ClassAsciiKind::Space,
        ast::ClassPerlKind::Word => ast::ClassAsciiKind::Word,
    };
    ast::ClassAscii {
        span: perl.span,
        kind,
        negated: perl.negated,
    }
}

struct RejectUnicodeClasses<'p> {
    pattern: &'p str,
}

impl RejectUnicodeClasses<'_> {
    fn reject(&self, span: &Span) -> Error {
        Error::UnsupportedClass {
            class: self.pattern[span.start.offset..span.end.offset].to_owned(),
        }
    }
}

impl Visitor for RejectUnicodeClasses<'_> {
    type Output = ();
    type Err = Error;

    fn finish(self) -> Result<(), Error> {
        Ok(())
    }

    fn visit_pre(&mut self, ast: &Ast) -> Result<(), Error> {
        match ast {
            Ast::ClassUnicode(class) => Err(self.reject(&class.span)),
            _ => Ok(()),
        }
    }

    fn visit_class_set_item_pre(&mut self, item: &ClassSetItem) -> Result<(), Error> {
        match item {
            ClassSetItem::Unicode(class) => Err(self.reject(&class.span)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use regex_syntax::hir::{Class, HirKind, Literal, Look};

    fn unicode_class_contains(hir: &Hir, c: char) -> bool {
        match hir.kind() {
            HirKind::Class(Class::Unicode(class)) => class
                .ranges()
                .iter()
                .any(|r| r.start() <= c && c <= r.end()),
            kind => panic!("expected a unicode class, got {kind:?}"),
        }
    }

    #[test]
    #[cfg(feature = "unicode")]
    fn test_default_flags() {
        let hir = parse(".", Flags::NONE).unwrap();
        assert!(!unicode_class_contains(&hir, '\n'));
        assert!(unicode_class_contains(&hir, '\u{10ffff}'));
    }

    #[test]
    #[cfg(feature = "unicode")]
    fn test_dot_matches_new_line() {
        let hir = parse(".", Flags::DOT_MATCHES_NEW_LINE).unwrap();
        assert!(unicode_class_contains(&hir, '\n'));
    }

    #[test]
    fn test_multi_line() {
        let hir = parse("^", Flags::MULTI_LINE).unwrap();
        assert_eq!(hir.kind(), &HirKind::Look(Look::StartLF));
        let hir = parse("^", Flags::NONE).unwrap();
        assert_eq!(hir.kind(), &HirKind::Look(Look::Start));
    }

    #[test]
    fn test_swap_greed() {
        match parse("a*", Flags::SWAP_GREED).unwrap().kind() {
            HirKind::Repetition(rep) => assert!(!rep.greedy),
            kind => panic!("expected a repetition, got {kind:?}"),
        }
    }

    #[test]
    fn test_ignore_whitespace_and_literal() {
        let hir = parse("a b # comment", Flags::IGNORE_WHITESPACE).unwrap();
        assert_eq!(hir.kind(), &HirKind::Literal(Literal(Box::from(&b"ab"[..]))));

        let hir = parse("a.b*", Flags::LITERAL).unwrap();
        assert_eq!(hir.kind(), &HirKind::Literal(Literal(Box::from(&b"a.b*"[..]))));
    }

    #[test]
    fn test_perl_classes_are_ascii() {
        match parse(r"\d", Flags::PERL).unwrap().kind() {
            HirKind::Class(Class::Unicode(class)) => {
                assert_eq!(class.ranges().len(), 1);
                assert_eq!(class.ranges()[0].start(), '0');
                assert_eq!(class.ranges()[0].end(), '9');
            }
            kind => panic!("expected a unicode class, got {kind:?}"),
        }
        assert_eq!(
            parse(r"[\w]", Flags::PERL).unwrap(),
            parse("[0-9A-Za-z_]", Flags::NONE).unwrap()
        );
        assert_eq!(
            parse(r"[^\s]", Flags::PERL).unwrap(),
            parse(r"[^\t\n\x0B\f\r ]", Flags::NONE).unwrap()
        );
    }

    #[test]
    fn test_perl_keeps_unicode_mode() {
        let hir = parse(r"\D", Flags::PERL).unwrap();
        assert!(!unicode_class_contains(&hir, '5'));
        assert!(unicode_class_contains(&hir, '\u{10ffff}'));

        let hir = parse(r"(?:a[\W])+", Flags::PERL).unwrap();
        match hir.kind() {
            HirKind::Repetition(rep) => match rep.sub.kind() {
                HirKind::Concat(hirs) => {
                    assert!(!unicode_class_contains(&hirs[1], '_'));
                    assert!(unicode_class_contains(&hirs[1], '\u{e9}'));
                }
                kind => panic!("expected a concatenation, got {kind:?}"),
            },
            kind => panic!("expected a repetition, got {kind:?}"),
        }
    }

    #[test]
    fn test_ascii_is_byte_mode() {
        match parse(r"\d", Flags::ASCII).unwrap().kind() {
            HirKind::Class(Class::Bytes(class)) => {
                assert_eq!(class.ranges().len(), 1);
                assert_eq!(class.ranges()[0].start(), b'0');
                assert_eq!(class.ranges()[0].end(), b'9');
            }
            kind => panic!("expected a byte class, got {kind:?}"),
        }
    }

    #[test]
    fn test_unicode_classes_rejected() {
        assert_eq!(
            parse(r"x\pL", Flags::NONE),
            Err(Error::UnsupportedClass {
                class: r"\pL".to_owned()
            })
        );
        assert_eq!(
            parse(r"[a\P{Greek}]", Flags::NONE),
            Err(Error::UnsupportedClass {
                class: r"\P{Greek}".to_owned()
            })
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("a{2,1}", Flags::NONE).unwrap_err();
        assert!(matches!(err, Error::Syntax { ref pattern, .. } if pattern == "a{2,1}"));
    }
}
