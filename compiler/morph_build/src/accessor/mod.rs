//! Value accessing pipeline.
//!
//! For one destination member, the strategies below are tried in order and
//! the first that locates a source wins:
//!
//! 1. custom resolver registered for the member
//! 2. property or field with a matching converted name
//! 3. zero-argument `Get<Name>` method (not for projections)
//! 4. flattened path through nested class members
//! 5. key lookup in a string-keyed dictionary source
//!
//! Strategies only *locate* a source; the builder emits nodes for the winning
//! [`Access`]. Keeping lookup pure lets record construction probe every
//! constructor before committing to one.

use morph_config::{NameMatchingStrategy, Settings, ADAPT_IGNORE, ADAPT_MEMBER};
use morph_ir::{HostFn, MapKind, Name, NameConverter, TypeId, Value};
use morph_types::{MemberKind, MemberModel, TypeKind, TypeRegistry};
use smallvec::SmallVec;

/// Where a destination member's value comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum Access {
    /// Custom resolvers registered for the member.
    Custom,
    /// A readable source member.
    Member { name: Name, ty: TypeId },
    /// A getter method; called with the source as receiver.
    Method { func: HostFn, ty: TypeId },
    /// A chain of member reads, each step typed.
    Flatten {
        path: SmallVec<[(Name, TypeId); 4]>,
    },
    /// Dictionary lookup. `matcher` converts each key before comparison.
    Dictionary {
        key: Name,
        matcher: Option<NameConverter>,
        ty: TypeId,
    },
}

/// One destination slot to resolve.
#[derive(Copy, Clone)]
pub struct AccessRequest<'a> {
    pub source_ty: TypeId,
    pub member: &'a MemberModel,
    pub settings: &'a Settings,
    pub kind: MapKind,
    /// Compare converted names case-insensitively (constructor parameters).
    pub ignore_case: bool,
}

type Strategy = fn(&TypeRegistry, &AccessRequest<'_>) -> Option<Access>;

const PIPELINE: [(&str, Strategy); 5] = [
    ("custom", custom_resolver),
    ("member", property_or_field),
    ("get-method", get_method),
    ("flatten", flatten),
    ("dictionary", dictionary),
];

/// Run the pipeline. Returns the winning strategy's name with its access.
pub fn locate(registry: &TypeRegistry, req: &AccessRequest<'_>) -> Option<(&'static str, Access)> {
    PIPELINE
        .iter()
        .find_map(|&(name, strategy)| strategy(registry, req).map(|access| (name, access)))
}

fn custom_resolver(_: &TypeRegistry, req: &AccessRequest<'_>) -> Option<Access> {
    req.settings
        .has_resolver(req.member.name)
        .then_some(Access::Custom)
}

fn property_or_field(registry: &TypeRegistry, req: &AccessRequest<'_>) -> Option<Access> {
    let source_ty = registry.unwrap_nullable(req.source_ty);
    let strategy = req.settings.name_matching();
    let members = readable_members(registry, source_ty, req.settings);

    // An explicit source name on the destination member is matched verbatim.
    if let Some(alias) = alias_of(registry, req.member) {
        return members
            .iter()
            .find(|m| registry.text(m.name) == alias)
            .map(|m| Access::Member {
                name: m.name,
                ty: m.ty,
            });
    }

    let wanted = strategy.convert_destination(registry.text(req.member.name));
    members
        .iter()
        .find(|m| {
            let name = alias_of(registry, m).unwrap_or_else(|| registry.text(m.name));
            same_name(&strategy.convert_source(name), &wanted, req.ignore_case)
        })
        .map(|m| Access::Member {
            name: m.name,
            ty: m.ty,
        })
}

fn get_method(registry: &TypeRegistry, req: &AccessRequest<'_>) -> Option<Access> {
    if req.kind == MapKind::Projection {
        return None;
    }
    let source_ty = registry.unwrap_nullable(req.source_ty);
    let getter = format!("Get{}", registry.text(req.member.name));
    let method = registry.method(source_ty, registry.name(&getter))?;
    Some(Access::Method {
        func: method.func.clone(),
        ty: method.returns,
    })
}

fn flatten(registry: &TypeRegistry, req: &AccessRequest<'_>) -> Option<Access> {
    let strategy = req.settings.name_matching();
    let wanted = strategy.convert_destination(registry.text(req.member.name));
    let mut path = SmallVec::new();
    let source_ty = registry.unwrap_nullable(req.source_ty);
    if flatten_path(registry, req, &strategy, source_ty, &wanted, &mut path) && path.len() > 1 {
        Some(Access::Flatten { path })
    } else {
        None
    }
}

/// Depth-first search for `wanted` as a concatenation of converted member
/// names, descending only into class-shaped members.
fn flatten_path(
    registry: &TypeRegistry,
    req: &AccessRequest<'_>,
    strategy: &NameMatchingStrategy,
    ty: TypeId,
    wanted: &str,
    path: &mut SmallVec<[(Name, TypeId); 4]>,
) -> bool {
    let members = readable_members(registry, ty, req.settings);
    for member in &members {
        if same_name(
            &strategy.convert_source(registry.text(member.name)),
            wanted,
            req.ignore_case,
        ) {
            path.push((member.name, member.ty));
            return true;
        }
    }
    for member in &members {
        let nested = registry.unwrap_nullable(member.ty);
        if !registry.is_class(nested) {
            continue;
        }
        let prefix = strategy.convert_source(registry.text(member.name));
        let Some(rest) = strip_prefix(wanted, &prefix, req.ignore_case) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        path.push((member.name, member.ty));
        if flatten_path(registry, req, strategy, nested, rest, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn dictionary(registry: &TypeRegistry, req: &AccessRequest<'_>) -> Option<Access> {
    let source_ty = registry.unwrap_nullable(req.source_ty);
    let Some(TypeKind::Dictionary { key, value }) = registry.kind(source_ty) else {
        return None;
    };
    if *key != TypeId::STR {
        return None;
    }
    let strategy = req.settings.name_matching();
    let name = registry.text(req.member.name);
    if strategy.is_exact() && !req.ignore_case {
        return Some(Access::Dictionary {
            key: req.member.name,
            matcher: None,
            ty: *value,
        });
    }
    // Flexible lookup: keys go through the source-side converter and are
    // compared against the converted destination name.
    let mut wanted = strategy.convert_destination(name);
    let mut matcher = strategy.source.clone();
    if req.ignore_case {
        wanted = wanted.to_lowercase();
        let inner = matcher;
        matcher = NameConverter::custom(format!("{}+lower", inner.label()), move |k| {
            inner.apply(k).to_lowercase()
        });
    }
    Some(Access::Dictionary {
        key: registry.name(&wanted),
        matcher: Some(matcher),
        ty: *value,
    })
}

// === Helpers ===

/// Readable members of a class visible under the settings, excluding
/// members annotated `AdaptIgnore`.
pub fn readable_members(
    registry: &TypeRegistry,
    ty: TypeId,
    settings: &Settings,
) -> Vec<MemberModel> {
    let ignore = registry.name(ADAPT_IGNORE);
    let visibility = settings.visibility();
    registry
        .members(ty)
        .iter()
        .filter(|m| {
            m.readable
                && m.kind != MemberKind::CtorParam
                && m.is_visible(visibility)
                && m.annotation(ignore).is_none()
        })
        .cloned()
        .collect()
}

/// Source name declared through `AdaptMember(name = ...)`.
fn alias_of<'r>(registry: &'r TypeRegistry, member: &MemberModel) -> Option<&'r str> {
    let annotation = member.annotation(registry.name(ADAPT_MEMBER))?;
    match annotation.arg(registry.name("name")) {
        Some(Value::Str(alias)) => Some(registry.text(registry.name(alias))),
        _ => None,
    }
}

fn same_name(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn strip_prefix<'w>(wanted: &'w str, prefix: &str, ignore_case: bool) -> Option<&'w str> {
    if prefix.is_empty() || wanted.len() < prefix.len() || !wanted.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = wanted.split_at(prefix.len());
    same_name(head, prefix, ignore_case).then_some(rest)
}
