//! Citizen-facing content: boletim filing and the public listings.

use std::sync::Arc;

use crate::{
    models::{Announcement, Boletim, BoletimStatus, Capability, Concurso},
    services::{
        permissions::{authorize, is_global, Actor},
        store::{AnnouncementAudience, PortalStore},
        ServiceError,
    },
};

#[derive(Clone)]
pub struct PortalService {
    store: Arc<dyn PortalStore>,
}

impl PortalService {
    pub fn new(store: Arc<dyn PortalStore>) -> Self {
        Self { store }
    }

    /// Any active account may file a boletim.
    #[tracing::instrument(skip(self, actor, description), fields(identity_id = %actor.id()))]
    pub async fn file_boletim(
        &self,
        actor: &Actor,
        kind: String,
        description: String,
        location: String,
    ) -> Result<Boletim, ServiceError> {
        if kind.trim().is_empty() || description.trim().is_empty() {
            return Err(ServiceError::Validation(
                "tipo and descricao must not be empty".to_string(),
            ));
        }

        let boletim = Boletim::new(actor.id(), kind, description, location);
        self.store.insert_boletim(&boletim).await?;

        tracing::info!(boletim_id = %boletim.boletim_id, "Boletim filed");
        Ok(boletim)
    }

    /// Queue of boletins for officers who can assume them.
    pub async fn list_boletins(
        &self,
        actor: &Actor,
        status: Option<BoletimStatus>,
    ) -> Result<Vec<Boletim>, ServiceError> {
        authorize(actor, &[Capability::PodeAssumirBo])?;
        Ok(self.store.list_boletins(status).await?)
    }

    /// Anonymous callers and civil accounts see general announcements. An
    /// active officer also sees their corporation's; staff and dev see all.
    pub async fn announcements(
        &self,
        actor: Option<&Actor>,
    ) -> Result<Vec<Announcement>, ServiceError> {
        let audience = match actor {
            Some(actor) if is_global(actor) => AnnouncementAudience::All,
            Some(actor) if actor.identity.is_policial() && actor.identity.is_active() => {
                match actor.corporation() {
                    Some(sigla) => AnnouncementAudience::Corporation(sigla.to_string()),
                    None => AnnouncementAudience::General,
                }
            }
            _ => AnnouncementAudience::General,
        };
        Ok(self.store.list_announcements(&audience).await?)
    }

    pub async fn open_concursos(&self) -> Result<Vec<Concurso>, ServiceError> {
        Ok(self.store.list_concursos(true).await?)
    }
}
