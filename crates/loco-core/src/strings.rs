//! String ids, formatting and the user string allocator.
//!
//! Templates use `{}` for "next argument" and `{pop}` to discard one
//! argument. A string-id argument is expanded recursively and consumes the
//! arguments that follow it, so one argument list can feed nested templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a built-in template or a user string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StringId(pub u16);

/// First id handed out for user strings.
pub const USER_STRINGS_START: u16 = 0x8000;
/// Number of user string slots.
pub const MAX_USER_STRINGS: u16 = 2048;
/// Built-in ids handed out to loaded objects start here.
pub const OBJECT_STRINGS_START: u16 = 0x2000;

impl StringId {
    pub const EMPTY: StringId = StringId(0);
    pub const NEW_COMPANY: StringId = StringId(1);
    pub const NEW_OWNER: StringId = StringId(2);

    /// Name prefixes for AI companies, indexed by prefix number.
    pub const AI_NAME_PREFIXES: [StringId; 13] = [
        StringId(0x100),
        StringId(0x101),
        StringId(0x102),
        StringId(0x103),
        StringId(0x104),
        StringId(0x105),
        StringId(0x106),
        StringId(0x107),
        StringId(0x108),
        StringId(0x109),
        StringId(0x10A),
        StringId(0x10B),
        StringId(0x10C),
    ];

    /// Name suffix templates for AI companies, indexed by playstyle.
    pub const AI_PLAYSTYLE_NAMES: [StringId; 13] = [
        StringId(0x120),
        StringId(0x121),
        StringId(0x122),
        StringId(0x123),
        StringId(0x124),
        StringId(0x125),
        StringId(0x126),
        StringId(0x127),
        StringId(0x128),
        StringId(0x129),
        StringId(0x12A),
        StringId(0x12B),
        StringId(0x12C),
    ];

    pub fn is_user(self) -> bool {
        (USER_STRINGS_START..USER_STRINGS_START + MAX_USER_STRINGS).contains(&self.0)
    }

    /// The template that follows this one. Objects register their plain name
    /// first and the numbered variant right after it.
    pub fn next(self) -> StringId {
        StringId(self.0.wrapping_add(1))
    }
}

const BUILTIN_TEMPLATES: &[(u16, &str)] = &[
    (0, ""),
    (1, "New Company"),
    (2, "New Owner"),
    (0x100, "Ebony"),
    (0x101, "Silver"),
    (0x102, "Ivory"),
    (0x103, "Indigo"),
    (0x104, "Sapphire"),
    (0x105, "Emerald"),
    (0x106, "Golden"),
    (0x107, "Amber"),
    (0x108, "Bronze"),
    (0x109, "Burgundy"),
    (0x10A, "Scarlet"),
    (0x10B, "{}"),
    (0x10C, "{pop}{}"),
    (0x120, "{} Transport"),
    (0x121, "{} Express"),
    (0x122, "{} Lines"),
    (0x123, "{} Tracks"),
    (0x124, "{} Coaches"),
    (0x125, "{} Air"),
    (0x126, "{} Rail"),
    (0x127, "{} Carts"),
    (0x128, "{} Trains"),
    (0x129, "{} Haulage"),
    (0x12A, "{} Shipping"),
    (0x12B, "{} Freight"),
    (0x12C, "{} Trucks"),
];

/// One formatting argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatArg {
    String(StringId),
    Number(i64),
}

/// Text lookup and user string allocation.
pub trait StringTable {
    /// Expand `template` with `args`.
    fn format_string(&self, template: StringId, args: &[FormatArg]) -> String;

    /// Store `text` in a free user slot. With `unique`, fails when another
    /// user string already holds the same text. `None` when no slot is used.
    fn user_string_allocate(&mut self, text: &str, unique: bool) -> Option<StringId>;

    /// Release a user string. Non-user ids are ignored.
    fn empty_user_string(&mut self, id: StringId);

    /// Text of `id` with no arguments.
    fn resolve(&self, id: StringId) -> String {
        self.format_string(id, &[])
    }
}

/// In-memory string table with the built-in company naming templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStringTable {
    templates: BTreeMap<u16, String>,
    user: Vec<Option<String>>,
    next_object_id: u16,
}

impl Default for MemoryStringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStringTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_USER_STRINGS)
    }

    /// A table with fewer user slots, handy for exhausting the allocator.
    pub fn with_capacity(user_slots: u16) -> Self {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|(id, text)| (*id, (*text).to_string()))
            .collect();
        Self {
            templates,
            user: vec![None; usize::from(user_slots.min(MAX_USER_STRINGS))],
            next_object_id: OBJECT_STRINGS_START,
        }
    }

    /// Register a template under a fresh built-in id.
    pub fn intern(&mut self, template: impl Into<String>) -> StringId {
        let id = self.next_object_id;
        self.next_object_id = self.next_object_id.wrapping_add(1);
        self.templates.insert(id, template.into());
        StringId(id)
    }

    /// Register an object name and its numbered variant (`"{name} {n}"`) at
    /// consecutive ids; returns the plain name's id.
    pub fn intern_object_name(&mut self, name: &str) -> StringId {
        let id = self.intern(name);
        self.intern(format!("{name} {{}}"));
        id
    }

    /// Number of user slots in use.
    pub fn user_strings_in_use(&self) -> usize {
        self.user.iter().filter(|s| s.is_some()).count()
    }

    fn raw(&self, id: StringId) -> Option<&str> {
        if id.is_user() {
            let slot = usize::from(id.0 - USER_STRINGS_START);
            self.user.get(slot).and_then(|s| s.as_deref())
        } else {
            self.templates.get(&id.0).map(String::as_str)
        }
    }

    fn expand<'a, I>(&self, id: StringId, args: &mut I, out: &mut String, depth: u8)
    where
        I: Iterator<Item = &'a FormatArg>,
    {
        let Some(template) = self.raw(id) else {
            return;
        };
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            rest = &rest[open..];
            if let Some(tail) = rest.strip_prefix("{}") {
                match args.next() {
                    Some(FormatArg::Number(n)) => out.push_str(&n.to_string()),
                    Some(FormatArg::String(nested)) if depth < 8 => {
                        self.expand(*nested, args, out, depth + 1)
                    }
                    _ => {}
                }
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("{pop}") {
                args.next();
                rest = tail;
            } else {
                out.push('{');
                rest = &rest[1..];
            }
        }
        out.push_str(rest);
    }
}

impl StringTable for MemoryStringTable {
    fn format_string(&self, template: StringId, args: &[FormatArg]) -> String {
        let mut out = String::new();
        let mut it = args.iter();
        self.expand(template, &mut it, &mut out, 0);
        out
    }

    fn user_string_allocate(&mut self, text: &str, unique: bool) -> Option<StringId> {
        if unique && self.user.iter().flatten().any(|s| s == text) {
            return None;
        }
        let slot = self.user.iter().position(Option::is_none)?;
        self.user[slot] = Some(text.to_string());
        Some(StringId(USER_STRINGS_START + slot as u16))
    }

    fn empty_user_string(&mut self, id: StringId) {
        if !id.is_user() {
            return;
        }
        if let Some(slot) = self.user.get_mut(usize::from(id.0 - USER_STRINGS_START)) {
            *slot = None;
        }
    }
}
