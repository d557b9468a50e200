//! Entitlement names checked before offering an action.

pub const USER_SEARCH: &str = "USER_SEARCH";
pub const USER_READ: &str = "USER_READ";
pub const USER_CREATE: &str = "USER_CREATE";
pub const USER_UPDATE: &str = "USER_UPDATE";
pub const USER_DELETE: &str = "USER_DELETE";

pub const GROUP_SEARCH: &str = "GROUP_SEARCH";
pub const GROUP_READ: &str = "GROUP_READ";
pub const GROUP_CREATE: &str = "GROUP_CREATE";
pub const GROUP_UPDATE: &str = "GROUP_UPDATE";
pub const GROUP_DELETE: &str = "GROUP_DELETE";

pub const ROLE_LIST: &str = "ROLE_LIST";
pub const ROLE_READ: &str = "ROLE_READ";
pub const ROLE_CREATE: &str = "ROLE_CREATE";
pub const ROLE_UPDATE: &str = "ROLE_UPDATE";
pub const ROLE_DELETE: &str = "ROLE_DELETE";

pub const REALM_SEARCH: &str = "REALM_SEARCH";
pub const REALM_CREATE: &str = "REALM_CREATE";
pub const REALM_UPDATE: &str = "REALM_UPDATE";
pub const REALM_DELETE: &str = "REALM_DELETE";

pub const SCHEMA_CREATE: &str = "SCHEMA_CREATE";
pub const SCHEMA_UPDATE: &str = "SCHEMA_UPDATE";
pub const SCHEMA_DELETE: &str = "SCHEMA_DELETE";

pub const APPLICATION_LIST: &str = "APPLICATION_LIST";
pub const APPLICATION_CREATE: &str = "APPLICATION_CREATE";
pub const APPLICATION_UPDATE: &str = "APPLICATION_UPDATE";
pub const APPLICATION_DELETE: &str = "APPLICATION_DELETE";

pub const IMPLEMENTATION_LIST: &str = "IMPLEMENTATION_LIST";
pub const IMPLEMENTATION_CREATE: &str = "IMPLEMENTATION_CREATE";
pub const IMPLEMENTATION_UPDATE: &str = "IMPLEMENTATION_UPDATE";
pub const IMPLEMENTATION_DELETE: &str = "IMPLEMENTATION_DELETE";

/// Domains and configuration parameters.
pub const KEYMASTER: &str = "KEYMASTER";
