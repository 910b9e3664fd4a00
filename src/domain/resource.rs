//! Resource type identity: URL slugs, slug resolution and categories
//!
//! A fully-qualified type such as `0x1::coin::CoinStore<0x1::libra_coin::LibraCoin>`
//! is reduced to its module and type name (`coin`, `CoinStore`), followed by
//! the name of each generic argument, and rendered as
//! `coin-coin-store-libra-coin`.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::types::Resource;

/// Legacy slugs that predate the module-qualified form, mapped to the
/// type fragment they used to point at.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("balance", "::coin::coinstore"),
    ("coin-store", "::coin::coinstore"),
    ("ancestry", "::ancestry::tree"),
    ("vouches", "::vouch::myvouches"),
    ("receipts", "::receipts::userreceipts"),
    ("slow-wallet", "::slow_wallet::slowwallet"),
];

/// Ordered categorization rules; the first rule with a matching fragment wins.
const CATEGORY_RULES: &[(ResourceCategory, &[&str])] = &[
    (
        ResourceCategory::Validating,
        &["validator", "stake", "proof_of_fee", "jail", "bid"],
    ),
    (
        ResourceCategory::Social,
        &["vouch", "ancestry", "community", "donor", "page_rank", "receipts"],
    ),
    (
        ResourceCategory::Assets,
        &["coin", "fungible", "token", "balance", "fee"],
    ),
    (
        ResourceCategory::Account,
        &["account", "wallet", "pledge", "activity"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceCategory {
    Account,
    Assets,
    Validating,
    Social,
    Other,
}

impl ResourceCategory {
    /// Display order
    pub const ALL: [ResourceCategory; 5] = [
        ResourceCategory::Account,
        ResourceCategory::Assets,
        ResourceCategory::Validating,
        ResourceCategory::Social,
        ResourceCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceCategory::Account => "Account",
            ResourceCategory::Assets => "Assets",
            ResourceCategory::Validating => "Validating",
            ResourceCategory::Social => "Social",
            ResourceCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Split a type into `(module, name)`, ignoring generic arguments.
fn type_parts(full_type: &str) -> (Option<&str>, &str) {
    let base = full_type.split('<').next().unwrap_or_default().trim();
    let mut segments = base.rsplit("::");
    let name = segments.next().unwrap_or_default();
    (segments.next(), name)
}

/// Top-level generic arguments, e.g. `["0x1::a::B", "u64"]` for `T<0x1::a::B, u64>`.
fn generic_args(full_type: &str) -> Vec<&str> {
    let (Some(open), Some(close)) = (full_type.find('<'), full_type.rfind('>')) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    let inner = &full_type[open + 1..close];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    args.retain(|arg| !arg.is_empty());
    args
}

fn to_kebab_case(name: &str) -> String {
    let chars: Vec<char> = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('-') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out.trim_end_matches('-').to_string()
}

/// Slug for a resource type: lower-cased module, then the kebab-cased name,
/// then the kebab-cased name of each generic argument.
pub fn resource_type_to_slug(full_type: &str) -> String {
    let mut slug = base_slug(full_type);
    for arg in generic_args(full_type) {
        let part = to_kebab_case(type_parts(arg).1);
        if part.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&part);
    }
    slug
}

fn base_slug(full_type: &str) -> String {
    let (module, name) = type_parts(full_type);
    let name = to_kebab_case(name);
    match module {
        Some(module) if !module.is_empty() => {
            let module: String = module
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_ascii_lowercase();
            if name.is_empty() {
                module
            } else {
                format!("{module}-{name}")
            }
        }
        _ => name,
    }
}

/// Resolve a slug back to one of `known_types`.
///
/// Rules are tried in order and the first candidate (in input order)
/// satisfying the first matching rule is returned: exact slug, legacy
/// alias, de-duplicated segments, keyword subset, substring.
pub fn slug_to_resource_type<'a, T: AsRef<str>>(known_types: &'a [T], slug: &str) -> Option<&'a str> {
    let slug = slug.trim().to_ascii_lowercase();
    if slug.is_empty() {
        return None;
    }
    let candidates = || known_types.iter().map(|t| t.as_ref());

    if let Some(found) = candidates().find(|t| resource_type_to_slug(t) == slug) {
        return Some(found);
    }

    if let Some((_, fragment)) = LEGACY_ALIASES.iter().find(|(alias, _)| *alias == slug) {
        if let Some(found) = candidates().find(|t| t.to_ascii_lowercase().contains(fragment)) {
            return Some(found);
        }
    }

    let tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();
    let mut unique: Vec<&str> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        if !unique.contains(token) {
            unique.push(token);
        }
    }

    if unique.len() < tokens.len() {
        let wanted: BTreeSet<&str> = unique.iter().copied().collect();
        let found = candidates().find(|t| {
            let their_slug = resource_type_to_slug(t);
            let theirs: BTreeSet<&str> = their_slug.split('-').filter(|s| !s.is_empty()).collect();
            theirs == wanted
        });
        if found.is_some() {
            return found;
        }
        let module = unique.join("_");
        let found = candidates().find(|t| {
            type_parts(t)
                .0
                .is_some_and(|m| m.eq_ignore_ascii_case(&module))
        });
        if found.is_some() {
            return found;
        }
    }

    if let Some(found) = candidates().find(|t| {
        let lower = t.to_ascii_lowercase();
        tokens.iter().all(|token| lower.contains(token))
    }) {
        return Some(found);
    }

    candidates().find(|t| {
        let theirs = resource_type_to_slug(t);
        !theirs.is_empty() && (theirs.contains(&slug) || slug.contains(&theirs))
    })
}

pub fn categorize_resource_type(full_type: &str) -> ResourceCategory {
    let lower = full_type.to_ascii_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| lower.contains(f)))
        .map(|(category, _)| *category)
        .unwrap_or(ResourceCategory::Other)
}

/// Partition types into categories in display order, members sorted.
///
/// Every category except `Other` is always present; `Other` only when it
/// has members, and then last.
pub fn categorize_resource_types<T: AsRef<str>>(types: &[T]) -> Vec<(ResourceCategory, Vec<String>)> {
    let mut buckets: Vec<(ResourceCategory, BTreeSet<String>)> = ResourceCategory::ALL
        .iter()
        .map(|c| (*c, BTreeSet::new()))
        .collect();

    for t in types {
        let category = categorize_resource_type(t.as_ref());
        if let Some((_, members)) = buckets.iter_mut().find(|(c, _)| *c == category) {
            members.insert(t.as_ref().to_string());
        }
    }

    buckets
        .into_iter()
        .filter(|(c, members)| *c != ResourceCategory::Other || !members.is_empty())
        .map(|(c, members)| (c, members.into_iter().collect()))
        .collect()
}

/// Sorted, de-duplicated resource types of an account.
pub fn resource_type_index(resources: &[Resource]) -> Vec<String> {
    resources
        .iter()
        .map(|r| r.type_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
