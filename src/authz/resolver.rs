use super::metadata::{Metadata, Permission, PermissionRequirement};

/// Outcome of combining a group's and a handler's declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedOutcome {
    /// Skip authorization for this route.
    Exempt,
    Requirement(Permission),
    /// Nothing declared, or only half a requirement after merging.
    Unresolved,
}

/// Compute the effective requirement of a handler registered in a group.
///
/// Order of evaluation:
/// 1. exemption, nearest declaration first (handler, then group)
/// 2. split declaration: group resource + handler scope
/// 3. nearest full declaration (handler, then group), fields not merged
/// 4. anything left incomplete is unresolved
pub fn resolve(group: &Metadata, handler: &Metadata) -> ResolvedOutcome {
    if handler.exempt.or(group.exempt).unwrap_or(false) {
        return ResolvedOutcome::Exempt;
    }

    let group_req = group.permission;
    let handler_req = handler.permission;
    let combined = handler_req.or(group_req);

    let split = match (
        group_req.and_then(|req| req.resource),
        handler_req.and_then(|req| req.scope),
    ) {
        (Some(resource), Some(scope)) => Some(PermissionRequirement {
            resource: Some(resource),
            scope: Some(scope),
        }),
        _ => None,
    };

    match split.or(combined).and_then(|req| req.complete()) {
        Some(permission) => ResolvedOutcome::Requirement(permission),
        None => ResolvedOutcome::Unresolved,
    }
}
