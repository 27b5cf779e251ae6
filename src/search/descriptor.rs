//! Per-entity search configuration.
//!
//! An [`EntityDescriptor`] is everything the entity-agnostic layers need to know
//! about one entity type: which fields exist and how they are indexed, which
//! field(s) bare query terms bind to, the legacy query rewrites that entity
//! still honours, and the HTML/XML renderer pair.

use crate::model::{EntityType, ResultPage};
use crate::render::{self, RenderOptions};

/// Renders one page of hits for one output format.
pub type RenderFn = fn(&ResultPage, &RenderOptions) -> String;

/// How a field is analyzed by the index and by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Tokenized, lowercased and accent-folded free text.
    Text,
    /// Exact-match identifier (MBIDs, disc ids); stored dashless and lowercase.
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

const fn ident(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Identifier,
    }
}

/// Legacy `field:<ordinal>` codes and the tokens they stand for.
#[derive(Debug, Clone, Copy)]
pub struct OrdinalRemap {
    pub field: &'static str,
    pub entries: &'static [(u32, &'static str)],
}

impl OrdinalRemap {
    pub fn lookup(&self, ordinal: u32) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == ordinal)
            .map(|(_, name)| *name)
    }
}

/// Static description of one searchable entity type.
pub struct EntityDescriptor {
    pub entity: EntityType,
    /// Fields bare terms are searched in; the first is the primary one.
    pub default_fields: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    pub remaps: &'static [OrdinalRemap],
    /// Renamed prefixes (`artype:` became `type:`).
    pub prefix_aliases: &'static [(&'static str, &'static str)],
    /// Fields whose values lose leading zeros (`barcode:0123` means `barcode:123`).
    pub strip_leading_zeros: &'static [&'static str],
    pub render_html: RenderFn,
    pub render_xml: RenderFn,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `prefix:` binds a term to an indexed field of this entity.
    pub fn recognizes(&self, prefix: &str) -> bool {
        self.field(prefix).is_some()
    }
}

impl std::fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity)
            .field("default_fields", &self.default_fields)
            .finish_non_exhaustive()
    }
}

const ARTIST_TYPES: &[(u32, &str)] = &[(0, "unknown"), (1, "person"), (2, "group")];

const RELEASE_TYPES: &[(u32, &str)] = &[
    (0, "other"),
    (1, "album"),
    (2, "single"),
    (3, "ep"),
    (4, "compilation"),
    (5, "soundtrack"),
    (6, "spokenword"),
    (7, "interview"),
    (8, "audiobook"),
    (9, "live"),
    (10, "remix"),
    (11, "other"),
];

const RELEASE_STATUSES: &[(u32, &str)] = &[
    (1, "official"),
    (2, "promotion"),
    (3, "bootleg"),
    (4, "pseudo-release"),
];

const LABEL_TYPES: &[(u32, &str)] = &[
    (0, "unknown"),
    (1, "distributor"),
    (2, "holding"),
    (3, "production"),
    (4, "original production"),
    (5, "reissue production"),
    (6, "publisher"),
    (7, "bootleg production"),
];

pub static ARTIST: EntityDescriptor = EntityDescriptor {
    entity: EntityType::Artist,
    default_fields: &["artist"],
    fields: &[
        text("artist"),
        text("sortname"),
        text("alias"),
        text("begin"),
        text("end"),
        text("type"),
        ident("arid"),
        text("comment"),
    ],
    remaps: &[OrdinalRemap {
        field: "type",
        entries: ARTIST_TYPES,
    }],
    prefix_aliases: &[("artype", "type")],
    strip_leading_zeros: &[],
    render_html: render::artist::html,
    render_xml: render::artist::xml,
};

pub static RELEASE: EntityDescriptor = EntityDescriptor {
    entity: EntityType::Release,
    default_fields: &["release"],
    fields: &[
        text("release"),
        ident("reid"),
        text("artist"),
        ident("arid"),
        text("type"),
        text("status"),
        text("tracks"),
        text("discids"),
        text("lang"),
        text("script"),
        text("asin"),
        text("date"),
        text("country"),
        text("label"),
        text("catno"),
        text("barcode"),
    ],
    remaps: &[
        OrdinalRemap {
            field: "type",
            entries: RELEASE_TYPES,
        },
        OrdinalRemap {
            field: "status",
            entries: RELEASE_STATUSES,
        },
    ],
    prefix_aliases: &[],
    strip_leading_zeros: &["barcode"],
    render_html: render::release::html,
    render_xml: render::release::xml,
};

pub static RELEASE_GROUP: EntityDescriptor = EntityDescriptor {
    entity: EntityType::ReleaseGroup,
    default_fields: &["releasegroup"],
    fields: &[
        text("releasegroup"),
        ident("rgid"),
        text("artist"),
        ident("arid"),
        text("type"),
    ],
    remaps: &[OrdinalRemap {
        field: "type",
        entries: RELEASE_TYPES,
    }],
    prefix_aliases: &[],
    strip_leading_zeros: &[],
    render_html: render::release_group::html,
    render_xml: render::release_group::xml,
};

pub static LABEL: EntityDescriptor = EntityDescriptor {
    entity: EntityType::Label,
    default_fields: &["label"],
    fields: &[
        text("label"),
        text("sortname"),
        text("alias"),
        text("begin"),
        text("end"),
        text("type"),
        ident("laid"),
        text("comment"),
        text("code"),
    ],
    remaps: &[OrdinalRemap {
        field: "type",
        entries: LABEL_TYPES,
    }],
    prefix_aliases: &[],
    strip_leading_zeros: &["code"],
    render_html: render::label::html,
    render_xml: render::label::xml,
};

pub static TRACK: EntityDescriptor = EntityDescriptor {
    entity: EntityType::Track,
    default_fields: &["track"],
    fields: &[
        text("track"),
        ident("trid"),
        text("artist"),
        ident("arid"),
        text("sortname"),
        text("release"),
        ident("reid"),
        text("tnum"),
        text("tracks"),
        text("dur"),
        text("qdur"),
        text("type"),
    ],
    remaps: &[OrdinalRemap {
        field: "type",
        entries: RELEASE_TYPES,
    }],
    prefix_aliases: &[],
    strip_leading_zeros: &[],
    render_html: render::track::html,
    render_xml: render::track::xml,
};

pub static CDSTUB: EntityDescriptor = EntityDescriptor {
    entity: EntityType::CdStub,
    default_fields: &["artist", "title"],
    fields: &[
        text("title"),
        text("artist"),
        ident("discid"),
        text("tracks"),
        text("barcode"),
        text("comment"),
    ],
    remaps: &[],
    prefix_aliases: &[],
    strip_leading_zeros: &["barcode"],
    render_html: render::cdstub::html,
    render_xml: render::cdstub::xml,
};

pub static FREEDB: EntityDescriptor = EntityDescriptor {
    entity: EntityType::FreeDb,
    default_fields: &["artist", "title"],
    fields: &[
        text("artist"),
        text("title"),
        ident("discid"),
        text("cat"),
        text("year"),
        text("tracks"),
    ],
    remaps: &[],
    prefix_aliases: &[],
    strip_leading_zeros: &[],
    render_html: render::freedb::html,
    render_xml: render::freedb::xml,
};

pub static ANNOTATION: EntityDescriptor = EntityDescriptor {
    entity: EntityType::Annotation,
    default_fields: &["text"],
    fields: &[text("text"), text("name"), text("type"), ident("mbid")],
    remaps: &[],
    prefix_aliases: &[],
    strip_leading_zeros: &[],
    render_html: render::annotation::html,
    render_xml: render::annotation::xml,
};

/// Descriptor for `entity`.
pub fn descriptor(entity: EntityType) -> &'static EntityDescriptor {
    match entity {
        EntityType::Artist => &ARTIST,
        EntityType::Release => &RELEASE,
        EntityType::ReleaseGroup => &RELEASE_GROUP,
        EntityType::Label => &LABEL,
        EntityType::Track => &TRACK,
        EntityType::CdStub => &CDSTUB,
        EntityType::FreeDb => &FREEDB,
        EntityType::Annotation => &ANNOTATION,
    }
}
