// ── Domain model ──
//
// The console works directly on the REST wire types; this module adds
// the traits and enums that let generic directories and wizards handle
// every kind uniformly.

mod entity;
mod kind;

pub use entity::Entity;
pub use kind::EntityKind;

pub use idcon_api::{
    AccessToken, Application, Attr, AttrSchemaType, CIPHER_ALGORITHMS, ConfParam, DerSchema,
    Domain, ENCRYPTED_DECODE_CONVERSION_PATTERN, Group, IMPLEMENTATION_TYPES, Implementation,
    ImplementationEngine, Membership, PagedResult, PlainSchema, Privilege, PropagationStatus,
    ProvisioningResult, Realm, Role, SchemaType, SelfInfo, StatusType, User, Versioned,
    VirSchema,
};
