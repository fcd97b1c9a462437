//! Archive layout: which entry path belongs to which document slot.
//!
//! One table drives both directions. Exact names are looked up first; the
//! pattern rules must be pairwise disjoint, which [`check_rules`] verifies the
//! first time the table is used.

use std::sync::OnceLock;

pub const MANIFEST: &str = "manifest.json";
pub const CONTENT_HTML: &str = "content/index.html";
pub const CONTENT_CSS: &str = "content/styles/main.css";
pub const CONTENT_SCRIPT: &str = "content/scripts/main.js";
pub const CONTENT_FALLBACK: &str = "content/static/fallback.html";
pub const CONTENT_PREFIX: &str = "content/";
pub const SIGNATURE_CONTENT: &str = "signatures/content.sig";
pub const SIGNATURE_MANIFEST: &str = "signatures/manifest.sig";

pub const IMAGES_PREFIX: &str = "assets/images/";
pub const FONTS_PREFIX: &str = "assets/fonts/";
pub const DATA_PREFIX: &str = "assets/data/";
pub const SIGNATURES_PREFIX: &str = "signatures/";
pub const SIGNATURE_SUFFIX: &str = ".sig";
pub const MODULES_PREFIX: &str = "wasm/";
pub const MODULE_SUFFIX: &str = ".wasm";

/// Logical place an archive entry occupies in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Manifest,
    Html,
    Css,
    Script,
    Fallback,
    ContentSignature,
    ManifestSignature,
    Image,
    Font,
    Data,
    ModuleSignature,
    Module,
}

/// How a slot's entries are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Exactly this path.
    Exact(&'static str),
    /// `<prefix><name>`.
    Prefix(&'static str),
    /// `<prefix><name><suffix>`.
    Wrapped(&'static str, &'static str),
    /// `<name><suffix>` with no directory component.
    RootSuffix(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct SlotRule {
    pub slot: Slot,
    pub pattern: Pattern,
}

const fn rule(slot: Slot, pattern: Pattern) -> SlotRule {
    SlotRule { slot, pattern }
}

/// The archive layout.
pub const SLOT_RULES: &[SlotRule] = &[
    rule(Slot::Manifest, Pattern::Exact(MANIFEST)),
    rule(Slot::Html, Pattern::Exact(CONTENT_HTML)),
    rule(Slot::Css, Pattern::Exact(CONTENT_CSS)),
    rule(Slot::Script, Pattern::Exact(CONTENT_SCRIPT)),
    rule(Slot::Fallback, Pattern::Exact(CONTENT_FALLBACK)),
    rule(Slot::ContentSignature, Pattern::Exact(SIGNATURE_CONTENT)),
    rule(Slot::ManifestSignature, Pattern::Exact(SIGNATURE_MANIFEST)),
    rule(Slot::Image, Pattern::Prefix(IMAGES_PREFIX)),
    rule(Slot::Font, Pattern::Prefix(FONTS_PREFIX)),
    rule(Slot::Data, Pattern::Prefix(DATA_PREFIX)),
    rule(
        Slot::ModuleSignature,
        Pattern::Wrapped(SIGNATURES_PREFIX, SIGNATURE_SUFFIX),
    ),
    rule(Slot::Module, Pattern::Wrapped(MODULES_PREFIX, MODULE_SUFFIX)),
    rule(Slot::Module, Pattern::RootSuffix(MODULE_SUFFIX)),
];

/// An entry path resolved to its slot and the name inside that slot
/// (empty for exact slots).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub slot: Slot,
    pub name: &'a str,
}

impl Pattern {
    fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        let name = match *self {
            Self::Exact(p) => return (path == p).then_some(""),
            Self::Prefix(prefix) => path.strip_prefix(prefix)?,
            Self::Wrapped(prefix, suffix) => path.strip_prefix(prefix)?.strip_suffix(suffix)?,
            Self::RootSuffix(suffix) => {
                if path.contains('/') {
                    return None;
                }
                path.strip_suffix(suffix)?
            }
        };
        (!name.is_empty()).then_some(name)
    }

    fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Directory prefix every match starts with ("" for root-level rules).
    fn anchor(&self) -> &'static str {
        match *self {
            Self::Exact(p) => p,
            Self::Prefix(p) | Self::Wrapped(p, _) => p,
            Self::RootSuffix(_) => "",
        }
    }
}

/// Verify exact names are unique and pattern rules cannot match the same path.
pub fn check_rules(rules: &[SlotRule]) -> Result<(), String> {
    for (i, a) in rules.iter().enumerate() {
        for b in &rules[i + 1..] {
            match (a.pattern, b.pattern) {
                (Pattern::Exact(x), Pattern::Exact(y)) if x == y => {
                    return Err(format!("exact path '{x}' listed twice"));
                }
                (pa, pb) if !pa.is_exact() && !pb.is_exact() && patterns_overlap(pa, pb) => {
                    return Err(format!(
                        "rules for {:?} and {:?} can match the same path",
                        a.slot, b.slot
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn patterns_overlap(a: Pattern, b: Pattern) -> bool {
    match (a, b) {
        (Pattern::RootSuffix(_), Pattern::RootSuffix(_)) => true,
        // Root rules only see paths without '/'.
        (Pattern::RootSuffix(_), other) | (other, Pattern::RootSuffix(_)) => {
            !other.anchor().ends_with('/')
        }
        _ => {
            let (x, y) = (a.anchor(), b.anchor());
            x.starts_with(y) || y.starts_with(x)
        }
    }
}

fn rules() -> &'static [SlotRule] {
    static CHECKED: OnceLock<()> = OnceLock::new();
    CHECKED.get_or_init(|| {
        if let Err(e) = check_rules(SLOT_RULES) {
            tracing::error!(error = %e, "ambiguous archive layout");
            debug_assert!(false, "ambiguous archive layout: {e}");
        }
    });
    SLOT_RULES
}

/// Find the slot for an archive entry. Unknown paths return `None`.
pub fn classify(path: &str) -> Option<Classified<'_>> {
    let table = rules();
    let exact = table
        .iter()
        .filter(|r| r.pattern.is_exact())
        .find_map(|r| r.pattern.capture(path).map(|name| (r.slot, name)));
    let found = exact.or_else(|| {
        table
            .iter()
            .filter(|r| !r.pattern.is_exact())
            .find_map(|r| r.pattern.capture(path).map(|name| (r.slot, name)))
    });
    found.map(|(slot, name)| Classified { slot, name })
}

/// Archive path for a named entry of `slot`; the first rule for the slot wins.
pub fn path_for(slot: Slot, name: &str) -> String {
    let pattern = rules()
        .iter()
        .find(|r| r.slot == slot)
        .map(|r| r.pattern)
        .unwrap_or(Pattern::Exact(""));
    match pattern {
        Pattern::Exact(p) => p.to_string(),
        Pattern::Prefix(prefix) => format!("{prefix}{name}"),
        Pattern::Wrapped(prefix, suffix) => format!("{prefix}{name}{suffix}"),
        Pattern::RootSuffix(suffix) => format!("{name}{suffix}"),
    }
}
