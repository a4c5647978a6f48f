//! Field plans for record shapes.
//!
//! A shape's declared fields are flattened into the list of emittable
//! object members: tags are parsed, embedded aggregates are hoisted level
//! by level, and fields competing for one output key are resolved or
//! dropped. The resulting plan is a pure function of the shape, cached
//! process-wide under the shape's address.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;

use crate::value::{FieldKind, Shape};

/// One emittable field of a record type.
#[derive(Debug, Clone)]
pub(crate) struct FieldPlan {
    /// Output key, not yet string-encoded.
    pub key: String,
    /// Index path from the record root through embedded aggregates.
    pub path: Vec<usize>,
    /// Skip the field when its value is empty.
    pub omit_empty: bool,
    /// Re-emit the encoded field value as a JSON string.
    pub quote: bool,
}

/// A plan entry still carrying its conflict-resolution rank.
struct Candidate {
    plan: FieldPlan,
    tagged: bool,
    depth: usize,
}

/// Characters allowed in a tag-supplied key name.
fn key_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9$%\-_/]+$").expect("invalid regex"))
}

/// Parsed form of a field tag.
struct Tag<'a> {
    name: Option<&'a str>,
    omit_empty: bool,
    quote: bool,
    skip: bool,
}

fn parse_tag(tag: &str) -> Tag<'_> {
    if tag == "-" {
        return Tag {
            name: None,
            omit_empty: false,
            quote: false,
            skip: true,
        };
    }
    let (name, options) = match tag.split_once(',') {
        Some((name, options)) => (name, options),
        None => (tag, ""),
    };
    // an out-of-alphabet key name falls back to the source field name
    let name = if !name.is_empty() && key_pattern().is_match(name) {
        Some(name)
    } else {
        None
    };
    let mut omit_empty = false;
    let mut quote = false;
    for option in options.split(',') {
        match option {
            "omitempty" => omit_empty = true,
            "string" => quote = true,
            _ => {}
        }
    }
    Tag {
        name,
        omit_empty,
        quote,
        skip: false,
    }
}

/// Returns the cached plan for a shape, computing it on first encounter.
/// Racing computations of the same plan are harmless; the first insert
/// wins and later ones are dropped.
pub(crate) fn plan_for(shape: &'static Shape) -> Arc<Vec<FieldPlan>> {
    let identity = shape as *const Shape as usize;
    if let Ok(cache) = cache().read() {
        if let Some(plan) = cache.get(&identity) {
            return Arc::clone(plan);
        }
    }
    let plan = Arc::new(build_plan(shape));
    match cache().write() {
        Ok(mut cache) => Arc::clone(cache.entry(identity).or_insert(plan)),
        Err(_) => plan,
    }
}

type PlanCache = RwLock<HashMap<usize, Arc<Vec<FieldPlan>>>>;

fn cache() -> &'static PlanCache {
    static CACHE: OnceLock<PlanCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Flattens a shape breadth-first. A shape already flattened at a
/// shallower depth never re-enters, which also bounds recursion through
/// self-referential shape graphs.
fn build_plan(shape: &'static Shape) -> Vec<FieldPlan> {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut level: Vec<(&'static Shape, Vec<usize>)> = vec![(shape, Vec::new())];
    let mut depth = 0;

    while !level.is_empty() {
        level.retain(|(shape, _)| !visited.contains(&(*shape as *const Shape as usize)));
        let mut next: Vec<(&'static Shape, Vec<usize>)> = Vec::new();

        for (shape, path) in &level {
            for (index, field) in shape.fields.iter().enumerate() {
                let tag = parse_tag(field.tag);
                if tag.skip {
                    continue;
                }
                let mut field_path = path.clone();
                field_path.push(index);
                if let FieldKind::Embedded(inner) = field.kind {
                    if tag.name.is_none() {
                        next.push((inner, field_path));
                        continue;
                    }
                }
                candidates.push(Candidate {
                    plan: FieldPlan {
                        key: tag.name.unwrap_or(field.name).to_string(),
                        path: field_path,
                        omit_empty: tag.omit_empty,
                        quote: tag.quote,
                    },
                    tagged: tag.name.is_some(),
                    depth,
                });
            }
        }

        for (shape, _) in &level {
            visited.insert(*shape as *const Shape as usize);
        }
        level = next;
        depth += 1;
    }

    resolve(candidates)
}

/// Groups candidates by output key and keeps at most one per group.
fn resolve(mut candidates: Vec<Candidate>) -> Vec<FieldPlan> {
    candidates.sort_by(|a, b| {
        a.plan
            .key
            .cmp(&b.plan.key)
            .then(a.depth.cmp(&b.depth))
            .then(b.tagged.cmp(&a.tagged))
    });

    let mut plans = Vec::with_capacity(candidates.len());
    let mut start = 0;
    while start < candidates.len() {
        let mut end = start + 1;
        while end < candidates.len() && candidates[end].plan.key == candidates[start].plan.key {
            end += 1;
        }
        if let Some(winner) = dominant(&candidates[start..end]) {
            plans.push(winner.plan.clone());
        }
        start = end;
    }
    plans
}

/// Applies the conflict rules to a group sharing one output key:
/// shallower fields dominate deeper ones outright; among the shallowest,
/// a lone tagged field beats untagged ones; any remaining tie drops the
/// key with no error.
fn dominant(group: &[Candidate]) -> Option<&Candidate> {
    // the group arrives sorted by depth, tagged first within a depth
    let shallow: Vec<&Candidate> = group
        .iter()
        .filter(|candidate| candidate.depth == group[0].depth)
        .collect();
    let tagged: Vec<&Candidate> = shallow
        .iter()
        .copied()
        .filter(|candidate| candidate.tagged)
        .collect();
    let pool = if tagged.is_empty() { &shallow } else { &tagged };
    if pool.len() == 1 {
        Some(pool[0])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldDef;

    #[test]
    fn tag_grammar() {
        assert!(parse_tag("-").skip);
        let named = parse_tag("n,string");
        assert_eq!(named.name, Some("n"));
        assert!(named.quote);
        assert!(!named.omit_empty);

        let bare_options = parse_tag(",omitempty");
        assert_eq!(bare_options.name, None);
        assert!(bare_options.omit_empty);

        // unknown options are ignored, invalid key names fall back
        assert_eq!(parse_tag("slr,random").name, Some("slr"));
        assert_eq!(parse_tag("bad key").name, None);
        assert_eq!(parse_tag("ok$%-_/9").name, Some("ok$%-_/9"));
    }

    static INNER: Shape = Shape {
        name: "Inner",
        fields: &[FieldDef {
            name: "S",
            tag: "",
            kind: FieldKind::Plain,
        }],
    };

    static OUTER: Shape = Shape {
        name: "Outer",
        fields: &[
            FieldDef {
                name: "Inner",
                tag: "",
                kind: FieldKind::Embedded(&INNER),
            },
            FieldDef {
                name: "S",
                tag: "",
                kind: FieldKind::Plain,
            },
        ],
    };

    #[test]
    fn shallow_field_dominates_embedded() {
        let plan = plan_for(&OUTER);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].key, "S");
        assert_eq!(plan[0].path, vec![1]);
    }

    static TWIN_A: Shape = Shape {
        name: "TwinA",
        fields: &[FieldDef {
            name: "S",
            tag: "",
            kind: FieldKind::Plain,
        }],
    };

    static TWIN_B: Shape = Shape {
        name: "TwinB",
        fields: &[FieldDef {
            name: "S",
            tag: "",
            kind: FieldKind::Plain,
        }],
    };

    static TWINS: Shape = Shape {
        name: "Twins",
        fields: &[
            FieldDef {
                name: "TwinA",
                tag: "",
                kind: FieldKind::Embedded(&TWIN_A),
            },
            FieldDef {
                name: "TwinB",
                tag: "",
                kind: FieldKind::Embedded(&TWIN_B),
            },
        ],
    };

    #[test]
    fn equal_depth_ties_are_dropped() {
        assert!(plan_for(&TWINS).is_empty());
    }

    static TAGGED: Shape = Shape {
        name: "Tagged",
        fields: &[FieldDef {
            name: "XXX",
            tag: "S",
            kind: FieldKind::Plain,
        }],
    };

    static MIXED: Shape = Shape {
        name: "Mixed",
        fields: &[
            FieldDef {
                name: "TwinA",
                tag: "",
                kind: FieldKind::Embedded(&TWIN_A),
            },
            FieldDef {
                name: "Tagged",
                tag: "",
                kind: FieldKind::Embedded(&TAGGED),
            },
        ],
    };

    #[test]
    fn tagged_field_beats_untagged() {
        let plan = plan_for(&MIXED);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].path, vec![1, 0]);
    }

    static NAMED_EMBED: Shape = Shape {
        name: "NamedEmbed",
        fields: &[FieldDef {
            name: "Inner",
            tag: "inner",
            kind: FieldKind::Embedded(&INNER),
        }],
    };

    #[test]
    fn named_embedded_aggregate_is_not_flattened() {
        let plan = plan_for(&NAMED_EMBED);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].key, "inner");
        assert_eq!(plan[0].path, vec![0]);
    }

    static LOOP: Shape = Shape {
        name: "Loop",
        fields: &[
            FieldDef {
                name: "Id",
                tag: "id",
                kind: FieldKind::Plain,
            },
            FieldDef {
                name: "Loop",
                tag: "",
                kind: FieldKind::Embedded(&LOOP),
            },
        ],
    };

    #[test]
    fn self_referential_shapes_terminate() {
        let plan = plan_for(&LOOP);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].key, "id");
    }
}
