use std::collections::HashSet;
use std::sync::Arc;

use learn_core::model::{
    JournalSchema, Program, ProgramId, ProgramSlug, Unit, UnitId, UnitType, slugify, unique_slug,
};
use storage::repository::{ProgramRepository, StorageError, UnitRepository};
use tracing::info;

use crate::Clock;
use crate::error::CatalogError;

/// Authoring input for a new unit.
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub unit_type: UnitType,
    pub unit_index: u32,
    pub title: String,
    pub journal: JournalSchema,
}

/// Admin-side authoring of programs and their units.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    programs: Arc<dyn ProgramRepository>,
    units: Arc<dyn UnitRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        programs: Arc<dyn ProgramRepository>,
        units: Arc<dyn UnitRepository>,
    ) -> Self {
        Self {
            clock,
            programs,
            units,
        }
    }

    /// Create a draft program whose slug is derived from the title.
    ///
    /// A taken slug gets a numeric suffix.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Slug` if the title yields no slug,
    /// `CatalogError::Program` for validation failures and
    /// `CatalogError::Storage` if persistence fails.
    pub async fn create_program(
        &self,
        title: &str,
        description: Option<String>,
    ) -> Result<Program, CatalogError> {
        let base = slugify(title)?;
        let taken: HashSet<String> = self
            .programs
            .list_programs(u32::MAX)
            .await?
            .iter()
            .map(|p| p.slug().as_str().to_owned())
            .collect();
        let slug = unique_slug(&base, |candidate| taken.contains(candidate));

        let program = Program::new(ProgramId::new(0), slug, title, description, self.clock.now())?;
        let id = self.programs.insert_program(&program).await?;
        info!(program = %program.slug(), "program created");
        Ok(program.with_id(id))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProgramNotFound` or `CatalogError::Storage`.
    pub async fn get_program(&self, slug: &ProgramSlug) -> Result<Program, CatalogError> {
        self.programs
            .get_program(slug)
            .await?
            .ok_or_else(|| CatalogError::ProgramNotFound(slug.to_string()))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProgramNotFound` or `CatalogError::Storage`.
    pub async fn publish_program(&self, slug: &ProgramSlug) -> Result<Program, CatalogError> {
        let mut program = self.get_program(slug).await?;
        program.publish();
        self.programs.update_program(&program).await?;
        info!(program = %slug, "program published");
        Ok(program)
    }

    /// Add a draft unit to a program.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateUnit` when `(type, index)` is taken,
    /// `CatalogError::Unit` for validation failures and
    /// `CatalogError::ProgramNotFound` for an unknown slug.
    pub async fn add_unit(
        &self,
        slug: &ProgramSlug,
        new_unit: NewUnit,
    ) -> Result<Unit, CatalogError> {
        self.get_program(slug).await?;
        let unit_type = new_unit.unit_type;
        let index = new_unit.unit_index;
        let unit = Unit::new(
            UnitId::new(0),
            slug.clone(),
            unit_type,
            index,
            new_unit.title,
            new_unit.journal,
        )?;
        let id = match self.units.insert_unit(&unit).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => {
                return Err(CatalogError::DuplicateUnit { unit_type, index });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(unit.with_id(id))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::UnitNotFound` or `CatalogError::Storage`.
    pub async fn publish_unit(&self, id: UnitId) -> Result<Unit, CatalogError> {
        let mut unit = self
            .units
            .get_unit(id)
            .await?
            .ok_or(CatalogError::UnitNotFound(id))?;
        unit.publish();
        self.units.update_unit(&unit).await?;
        Ok(unit)
    }

    /// Published `day` units of a program, ordered by index.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn published_days(&self, slug: &ProgramSlug) -> Result<Vec<Unit>, CatalogError> {
        let units = self.units.list_units(slug).await?;
        Ok(units.into_iter().filter(Unit::is_published_day).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service() -> CatalogService {
        let repo = InMemoryRepository::new();
        CatalogService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        )
    }

    fn day(index: u32) -> NewUnit {
        NewUnit {
            unit_type: UnitType::Day,
            unit_index: index,
            title: format!("Jour {index}"),
            journal: JournalSchema::default(),
        }
    }

    #[tokio::test]
    async fn duplicate_titles_get_distinct_slugs() {
        let svc = service();
        let a = svc.create_program("Éveil du matin", None).await.unwrap();
        let b = svc.create_program("Éveil du matin", None).await.unwrap();
        assert_eq!(a.slug().as_str(), "eveil-du-matin");
        assert_eq!(b.slug().as_str(), "eveil-du-matin-2");
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn duplicate_day_index_is_rejected() {
        let svc = service();
        let program = svc.create_program("Souffle", None).await.unwrap();
        svc.add_unit(program.slug(), day(1)).await.unwrap();
        let err = svc.add_unit(program.slug(), day(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateUnit {
                unit_type: UnitType::Day,
                index: 1
            }
        ));
    }

    #[tokio::test]
    async fn only_published_days_are_listed() {
        let svc = service();
        let program = svc.create_program("Souffle", None).await.unwrap();
        let d1 = svc.add_unit(program.slug(), day(1)).await.unwrap();
        svc.add_unit(program.slug(), day(2)).await.unwrap();
        let intro = svc
            .add_unit(
                program.slug(),
                NewUnit {
                    unit_type: UnitType::Intro,
                    unit_index: 1,
                    title: "Bienvenue".into(),
                    journal: JournalSchema::default(),
                },
            )
            .await
            .unwrap();
        svc.publish_unit(d1.id()).await.unwrap();
        svc.publish_unit(intro.id()).await.unwrap();

        let days = svc.published_days(program.slug()).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].unit_index(), 1);
    }

    #[tokio::test]
    async fn unknown_program_is_reported() {
        let svc = service();
        let slug = ProgramSlug::parse("inconnu").unwrap();
        assert!(matches!(
            svc.add_unit(&slug, day(1)).await,
            Err(CatalogError::ProgramNotFound(_))
        ));
    }
}
