use crate::error::Error;
use crate::middleware::auth::Claims;

pub const ADMIN_ROLE: &str = "admin";

/// The caller as resolved by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Option<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case(ADMIN_ROLE))
            .unwrap_or(false)
    }
}

impl TryFrom<&Claims> for CurrentUser {
    type Error = Error;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))?;
        Ok(Self {
            id,
            role: claims.role.clone(),
        })
    }
}
