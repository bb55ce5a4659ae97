use std::fmt;

use serde::Serialize;

/// Resources guarded by the provider's policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Category,
    Product,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Category => "category",
            Resource::Product => "product",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Resource::Category),
            "product" => Ok(Resource::Product),
            other => Err(format!("unknown resource: {other}")),
        }
    }
}

/// Actions on a resource. `Read` targets one item, `Reads` the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Read,
    Reads,
    Create,
    Update,
    Delete,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Reads => "reads",
            Scope::Create => "create",
            Scope::Update => "update",
            Scope::Delete => "delete",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Scope::Read),
            "reads" => Ok(Scope::Reads),
            "create" => Ok(Scope::Create),
            "update" => Ok(Scope::Update),
            "delete" => Ok(Scope::Delete),
            other => Err(format!("unknown scope: {other}")),
        }
    }
}

/// A possibly partial `(resource, scope)` declaration.
///
/// Groups usually declare only the resource and handlers only the scope;
/// the resolver merges the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub resource: Option<Resource>,
    pub scope: Option<Scope>,
}

impl PermissionRequirement {
    pub const fn new(resource: Resource, scope: Scope) -> Self {
        Self {
            resource: Some(resource),
            scope: Some(scope),
        }
    }

    pub const fn resource(resource: Resource) -> Self {
        Self {
            resource: Some(resource),
            scope: None,
        }
    }

    pub const fn scope(scope: Scope) -> Self {
        Self {
            resource: None,
            scope: Some(scope),
        }
    }

    /// Both fields present, or nothing.
    pub fn complete(&self) -> Option<Permission> {
        match (self.resource, self.scope) {
            (Some(resource), Some(scope)) => Some(Permission { resource, scope }),
            _ => None,
        }
    }
}

/// A fully populated requirement, ready to be sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Permission {
    pub resource: Resource,
    pub scope: Scope,
}

impl Permission {
    /// Provider query string, `resource#scope`.
    pub fn query(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.resource, self.scope)
    }
}

/// Declarations attached to a route group or to a single handler.
///
/// Repeating a declaration on the same target replaces the earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub exempt: Option<bool>,
    pub permission: Option<PermissionRequirement>,
}

impl Metadata {
    pub const fn new() -> Self {
        Self {
            exempt: None,
            permission: None,
        }
    }

    pub fn require_permission(mut self, requirement: PermissionRequirement) -> Self {
        self.permission = Some(requirement);
        self
    }

    pub fn mark_public(mut self) -> Self {
        self.exempt = Some(true);
        self
    }
}
