//! access.rs
//! Comprobaciones de permisos como funciones simples: propiedad + rol.
//! La identidad la aporta la aplicación que nos llama (cabeceras), aquí no se autentica.

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::error::AccessDenied;

pub const ACTOR_ID_HEADER: &str = "X-Actor-Id";
pub const ACTOR_ROLE_HEADER: &str = "X-Actor-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Staff,
    Superuser,
}

impl Role {
    fn from_header(value: &str) -> Role {
        match value.trim().to_ascii_lowercase().as_str() {
            "superuser" => Role::Superuser,
            "staff" => Role::Staff,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Option<String>,
    pub role: Role,
}

impl Actor {
    fn owns(&self, owner_id: Option<&str>) -> bool {
        matches!((self.id.as_deref(), owner_id), (Some(me), Some(owner)) if me == owner)
    }

    /// Staff y superusuarios ven todo; `None` significa sin filtro.
    pub fn list_scope(&self) -> Option<&str> {
        match self.role {
            Role::Staff | Role::Superuser => None,
            // Un anónimo filtra por "" y no ve nada.
            Role::User => Some(self.id.as_deref().unwrap_or("")),
        }
    }
}

#[cfg(test)]
impl Actor {
    pub fn user(id: &str) -> Self {
        Actor {
            id: Some(id.to_string()),
            role: Role::User,
        }
    }

    pub fn anonymous() -> Self {
        Actor {
            id: None,
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let actor = Actor {
            id: header(ACTOR_ID_HEADER),
            role: header(ACTOR_ROLE_HEADER)
                .map(|r| Role::from_header(&r))
                .unwrap_or(Role::User),
        };
        ready(Ok(actor))
    }
}

pub fn can_view(actor: &Actor, owner_id: Option<&str>) -> Result<(), AccessDenied> {
    if matches!(actor.role, Role::Staff | Role::Superuser) || actor.owns(owner_id) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Editar o borrar destinatarios y campañas: dueño o superusuario.
pub fn can_modify(actor: &Actor, owner_id: Option<&str>) -> Result<(), AccessDenied> {
    if actor.role == Role::Superuser || actor.owns(owner_id) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Las plantillas solo las edita su dueño.
pub fn can_edit_template(actor: &Actor, owner_id: Option<&str>) -> Result<(), AccessDenied> {
    if actor.owns(owner_id) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// El historial de envíos solo exige una identidad.
pub fn can_read_logs(actor: &Actor) -> Result<(), AccessDenied> {
    if actor.id.is_some() {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}
