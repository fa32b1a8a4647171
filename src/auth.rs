//! Role-based guard for service endpoints.
//!
//! A [`RoleGuard`] is declared with the roles an endpoint accepts. The
//! super-admin role is always accepted as well. Hosting services call
//! [`RoleGuard::authorize`] (or wrap the handler with [`RoleGuard::run`])
//! with the caller's claims at request time.

use crate::types::*;
use crate::utils::StringValidator;
use std::future::Future;

/// Role that passes every guard
pub const SUPER_ADMIN_ROLE: &str = "SuperAdmin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    roles: Vec<String>,
}

impl RoleGuard {
    /// Guard accepting `roles` plus the super-admin role.
    ///
    /// Duplicates are dropped; declaration order is kept with super-admin last.
    pub fn new<I, S>(roles: I) -> NexusResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut accepted: Vec<String> = Vec::new();
        for role in roles {
            let role = StringValidator::not_blank(role, "role")?.trim().to_string();
            if role.contains(',') {
                return Err(NexusError::Validation(format!("role '{}' cannot contain ','", role)));
            }
            if role.eq_ignore_ascii_case(SUPER_ADMIN_ROLE) {
                continue;
            }
            if !accepted.iter().any(|r| r.eq_ignore_ascii_case(&role)) {
                accepted.push(role);
            }
        }
        accepted.push(SUPER_ADMIN_ROLE.to_string());
        Ok(Self { roles: accepted })
    }

    pub fn super_admin_only() -> Self {
        Self {
            roles: vec![SUPER_ADMIN_ROLE.to_string()],
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Comma-joined role list, the form web frameworks expect
    pub fn role_list(&self) -> String {
        self.roles.join(",")
    }

    pub fn allows(&self, claims: &CallerClaims) -> bool {
        claims.is_authenticated() && self.roles.iter().any(|role| claims.has_role(role))
    }

    pub fn authorize(&self, claims: &CallerClaims) -> NexusResult<()> {
        if !claims.is_authenticated() {
            return Err(NexusError::Unauthenticated);
        }
        if self.allows(claims) {
            Ok(())
        } else {
            log::warn!(
                "caller {} denied; requires one of [{}]",
                claims.subject().unwrap_or("<unknown>"),
                self.role_list()
            );
            Err(NexusError::Forbidden {
                allowed: self.role_list(),
            })
        }
    }

    /// Run `handler` only if the caller is authorized
    pub async fn run<F, Fut, T>(&self, claims: &CallerClaims, handler: F) -> NexusResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NexusResult<T>>,
    {
        self.authorize(claims)?;
        handler().await
    }
}

/// What the hosting framework knows about the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerClaims {
    subject: Option<String>,
    roles: Vec<String>,
}

impl CallerClaims {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated<I, S>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: Some(subject.into()),
            roles: roles
                .into_iter()
                .map(Into::into)
                .map(|r: String| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Claims for `subject` with roles parsed from a comma-separated header value
    pub fn from_role_header(subject: impl Into<String>, header: &str) -> Self {
        Self::authenticated(subject, header.split(','))
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    /// Role names compare ASCII case-insensitively
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}
